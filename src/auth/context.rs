use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::error::AppError;

/// Caller identity for one inbound request.
///
/// Built once by [`crate::auth::middleware::auth_middleware`] and read by
/// handlers through extraction; never reconstructed from headers inline.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    /// identity-provider user id
    pub user_id: String,
    pub session_id: Option<String>,
    /// Caller is allow-listed and explicitly asked to act as a manager.
    pub manager_override: bool,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
            manager_override: false,
        }
    }

    pub fn with_manager_override(mut self) -> Self {
        self.manager_override = true;
        self
    }
}

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthContext>()
                .cloned()
                .ok_or_else(|| AppError::Authentication("Authentication required.".into())),
        )
    }
}
