//! Identity-provider port.
//!
//! The provider owns authentication and profile data. This service only
//! asks it one question: given a user id, who is this and what role
//! metadata do they carry.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::IdentityApiConfig;
use crate::db::memory::{DEMO_EMPLOYEE_USER_ID, DEMO_MANAGER_USER_ID};
use crate::error::AppError;

/// Normalized profile of a provider user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentityProfile {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    /// Role metadata; list metadata is joined with ", ".
    pub role: Option<String>,
    pub team: Option<String>,
    /// Public metadata, when non-empty.
    pub metadata: Option<Value>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider answered with status {0}")]
    Status(u16),
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        AppError::Identity(e.to_string())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the provider does not know the user.
    async fn fetch_user(&self, user_id: &str) -> Result<Option<IdentityProfile>, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct ProviderEmail {
    id: String,
    email_address: String,
}

/// User payload as served by the provider's backend API.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ProviderEmail>,
    #[serde(default)]
    public_metadata: Map<String, Value>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn role_from_metadata(metadata: &Map<String, Value>) -> Option<String> {
    match metadata.get("role")? {
        Value::String(role) if !role.trim().is_empty() => Some(role.clone()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.trim().is_empty()).then_some(joined)
        }
        _ => None,
    }
}

impl From<ProviderUser> for IdentityProfile {
    fn from(user: ProviderUser) -> Self {
        let primary_email = user
            .primary_email_address_id
            .as_deref()
            .and_then(|id| user.email_addresses.iter().find(|e| e.id == id))
            .or_else(|| user.email_addresses.first())
            .map(|e| e.email_address.clone());

        let full_name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .filter_map(|part| non_empty(part))
            .collect::<Vec<_>>()
            .join(" ");

        let display_name = non_empty(Some(full_name.as_str()))
            .or(non_empty(user.username.as_deref()))
            .or(non_empty(primary_email.as_deref()))
            .unwrap_or(user.id.as_str())
            .to_string();

        let email = primary_email
            .clone()
            .or_else(|| user.username.clone())
            .unwrap_or_else(|| user.id.clone());

        let team = user
            .public_metadata
            .get("team")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);

        IdentityProfile {
            role: role_from_metadata(&user.public_metadata),
            team,
            metadata: (!user.public_metadata.is_empty())
                .then(|| Value::Object(user.public_metadata.clone())),
            user_id: user.id,
            display_name,
            email,
            photo_url: user.image_url,
        }
    }
}

/// Provider backend API client.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    config: IdentityApiConfig,
}

impl HttpIdentityProvider {
    pub fn new(config: IdentityApiConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[tracing::instrument(name = "identity_fetch_user", skip(self))]
    async fn fetch_user(&self, user_id: &str) -> Result<Option<IdentityProfile>, IdentityError> {
        let url = format!("{}/users/{}", self.config.base_url, user_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user: ProviderUser = response.json().await?;
                Ok(Some(user.into()))
            }
            status => Err(IdentityError::Status(status.as_u16())),
        }
    }
}

/// Fixed in-process directory, used when no provider API is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, IdentityProfile>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, profile: IdentityProfile) -> Self {
        self.users.insert(profile.user_id.clone(), profile);
        self
    }

    /// Directory matching the seeded demo employees.
    pub fn demo() -> Self {
        Self::new()
            .with_member(DEMO_EMPLOYEE_USER_ID, "Kayley Manfredi", Some("Employee"))
            .with_member(DEMO_MANAGER_USER_ID, "Chris Manfredi", Some("Time Off Manager"))
    }

    /// Convenience for a user with just a name and role.
    pub fn with_member(self, user_id: &str, display_name: &str, role: Option<&str>) -> Self {
        self.with_user(IdentityProfile {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            email: format!("{user_id}@example.com"),
            role: role.map(str::to_string),
            ..IdentityProfile::default()
        })
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<IdentityProfile>, IdentityError> {
        Ok(self.users.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> IdentityProfile {
        serde_json::from_value::<ProviderUser>(value).unwrap().into()
    }

    #[test]
    fn prefers_full_name_and_primary_email() {
        let profile = parse(json!({
            "id": "user_1",
            "first_name": "Jordan",
            "last_name": "Lee",
            "username": "jlee",
            "image_url": "https://img/jlee.png",
            "primary_email_address_id": "em_2",
            "email_addresses": [
                {"id": "em_1", "email_address": "old@company.com"},
                {"id": "em_2", "email_address": "jordan@company.com"}
            ],
            "public_metadata": {"role": "Engineering Manager", "team": "Platform"}
        }));

        assert_eq!(profile.display_name, "Jordan Lee");
        assert_eq!(profile.email, "jordan@company.com");
        assert_eq!(profile.role.as_deref(), Some("Engineering Manager"));
        assert_eq!(profile.team.as_deref(), Some("Platform"));
        assert!(profile.metadata.is_some());
    }

    #[test]
    fn falls_back_to_username_then_id() {
        let profile = parse(json!({"id": "user_2", "username": "priya"}));
        assert_eq!(profile.display_name, "priya");
        assert_eq!(profile.email, "priya");
        assert_eq!(profile.role, None);
        assert_eq!(profile.metadata, None);

        let bare = parse(json!({"id": "user_3"}));
        assert_eq!(bare.display_name, "user_3");
        assert_eq!(bare.email, "user_3");
    }

    #[test]
    fn list_roles_are_joined() {
        let profile = parse(json!({
            "id": "user_4",
            "public_metadata": {"role": ["employee", "people ops"]}
        }));
        assert_eq!(profile.role.as_deref(), Some("employee, people ops"));
    }

    #[actix_web::test]
    async fn static_directory_answers_known_users_only() {
        let provider = StaticIdentityProvider::new().with_member("user_5", "Nina Chen", None);
        assert!(provider.fetch_user("user_5").await.unwrap().is_some());
        assert!(provider.fetch_user("user_6").await.unwrap().is_none());
    }
}
