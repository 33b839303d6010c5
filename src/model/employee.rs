use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const DEFAULT_EMPLOYEE_ROLE: &str = "employee";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "0b5c3a52-57c8-4ef6-9f8c-3b6e2a7f11d0",
        "externalId": "user_2abc",
        "fullName": "Jordan Lee",
        "email": "jordan.lee@company.com",
        "role": "Engineering Manager",
        "photoUrl": null,
        "team": "Platform",
        "createdAt": "2025-10-01T09:00:00Z",
        "updatedAt": "2025-10-01T09:00:00Z"
    })
)]
pub struct Employee {
    pub id: String,
    /// identity-provider user id
    pub external_id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub photo_url: Option<String>,
    pub team: Option<String>,
    #[schema(value_type = Object, nullable = true)]
    pub metadata: Option<Value>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// Values written on every identity sync. `role`, `team` and `metadata` only
/// overwrite existing values when present.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeUpsert {
    pub external_id: String,
    pub full_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub role: Option<String>,
    pub team: Option<String>,
    pub metadata: Option<Value>,
}

impl EmployeeUpsert {
    /// Role used when a brand-new row is inserted.
    pub fn role_for_insert(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_EMPLOYEE_ROLE)
    }

    /// Apply this upsert to an existing row.
    pub fn apply_to(&self, employee: &mut Employee, now: DateTime<Utc>) {
        employee.full_name = self.full_name.clone();
        employee.email = self.email.clone();
        employee.photo_url = self.photo_url.clone();
        if let Some(role) = &self.role {
            employee.role = role.clone();
        }
        if let Some(team) = &self.team {
            employee.team = Some(team.clone());
        }
        if let Some(metadata) = &self.metadata {
            employee.metadata = Some(metadata.clone());
        }
        employee.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Employee {
        let at = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Employee {
            id: "emp-1".into(),
            external_id: "user_1".into(),
            full_name: "Old Name".into(),
            email: "old@company.com".into(),
            role: "Director".into(),
            photo_url: Some("https://img/old.png".into()),
            team: Some("Sales".into()),
            metadata: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn upsert_keeps_role_and_team_when_provider_has_none() {
        let mut employee = existing();
        let upsert = EmployeeUpsert {
            external_id: "user_1".into(),
            full_name: "New Name".into(),
            email: "new@company.com".into(),
            photo_url: None,
            role: None,
            team: None,
            metadata: None,
        };
        let now = Utc::now();
        upsert.apply_to(&mut employee, now);

        assert_eq!(employee.full_name, "New Name");
        assert_eq!(employee.email, "new@company.com");
        assert_eq!(employee.photo_url, None);
        assert_eq!(employee.role, "Director");
        assert_eq!(employee.team.as_deref(), Some("Sales"));
        assert_eq!(employee.updated_at, now);
        assert_eq!(upsert.role_for_insert(), DEFAULT_EMPLOYEE_ROLE);
    }
}
