use moka::future::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::model::RequestView;

/// Dashboard overview page.
pub const OVERVIEW_VIEW: &str = "/";
/// Team calendar page.
pub const CALENDAR_VIEW: &str = "/time-off";

/// Pages whose content derives from the request list.
pub const REQUEST_VIEWS: [&str; 2] = [OVERVIEW_VIEW, CALENDAR_VIEW];

/// Upper bound on how long a page may be served without a reload.
const VIEW_TTL: Duration = Duration::from_secs(60);

/// Rendered request lists keyed by the page path that shows them.
///
/// Every invalidation bumps a generation counter. A list loaded before an
/// invalidation is never stored after it.
#[derive(Clone)]
pub struct ViewCache {
    inner: Cache<String, Arc<Vec<RequestView>>>,
    generation: Arc<AtomicU64>,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(16)
                .time_to_live(VIEW_TTL)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, path: &str) -> Option<Arc<Vec<RequestView>>> {
        self.inner.get(path).await
    }

    /// Take this before loading the data to be cached.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `views` unless an invalidation happened since `generation`.
    ///
    /// Returns whether the page was kept.
    pub async fn put_if_current(
        &self,
        path: &str,
        views: Arc<Vec<RequestView>>,
        generation: u64,
    ) -> bool {
        if self.generation() != generation {
            tracing::debug!(path, "Discarding request list loaded before a write");
            return false;
        }
        self.inner.insert(path.to_string(), views).await;
        // an invalidation may have slipped in between the check and the insert
        if self.generation() != generation {
            self.inner.invalidate(path).await;
            return false;
        }
        true
    }

    /// Drop the given pages.
    pub async fn invalidate(&self, paths: &[&str]) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let futures: Vec<_> = paths.iter().map(|p| self.inner.invalidate(*p)).collect();
        futures::future::join_all(futures).await;
        tracing::debug!(?paths, "Invalidated cached views");
    }

    /// Drop every page that lists requests.
    pub async fn invalidate_request_views(&self) {
        self.invalidate(&REQUEST_VIEWS).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn invalidation_clears_both_request_pages() {
        let cache = ViewCache::new();
        let generation = cache.generation();
        assert!(cache.put_if_current(OVERVIEW_VIEW, Arc::new(Vec::new()), generation).await);
        assert!(cache.put_if_current(CALENDAR_VIEW, Arc::new(Vec::new()), generation).await);
        assert!(cache.put_if_current("/employees", Arc::new(Vec::new()), generation).await);

        cache.invalidate_request_views().await;

        assert!(cache.get(OVERVIEW_VIEW).await.is_none());
        assert!(cache.get(CALENDAR_VIEW).await.is_none());
        assert!(cache.get("/employees").await.is_some());
    }

    #[actix_web::test]
    async fn list_loaded_before_a_write_is_not_stored() {
        let cache = ViewCache::new();
        let before_write = cache.generation();

        cache.invalidate_request_views().await;

        assert!(!cache.put_if_current(OVERVIEW_VIEW, Arc::new(Vec::new()), before_write).await);
        assert!(cache.get(OVERVIEW_VIEW).await.is_none());

        let fresh = cache.generation();
        assert!(cache.put_if_current(OVERVIEW_VIEW, Arc::new(Vec::new()), fresh).await);
        assert!(cache.get(OVERVIEW_VIEW).await.is_some());
    }
}
