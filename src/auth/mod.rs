pub mod context;
pub mod identity;
pub mod jwt;
pub mod middleware;

pub use context::AuthContext;
pub use identity::{HttpIdentityProvider, IdentityProfile, IdentityProvider, StaticIdentityProvider};
