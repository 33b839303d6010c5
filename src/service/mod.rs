//! Workflow services shared by the HTTP handlers.

use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::db::Stores;
use crate::utils::view_cache::ViewCache;

pub mod requests;
pub mod transition;
pub mod users;

/// Everything a workflow needs: stores, identity provider, view cache and
/// configuration.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub identity: Arc<dyn IdentityProvider>,
    pub views: ViewCache,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(stores: Stores, identity: Arc<dyn IdentityProvider>, config: Config) -> Self {
        Self {
            stores,
            identity,
            views: ViewCache::new(),
            config: Arc::new(config),
        }
    }
}
