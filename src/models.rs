use serde::{Deserialize, Serialize};

/// Session token claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// identity-provider user id
    pub sub: String,
    pub exp: usize,
    /// Present when the provider tracks sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}
