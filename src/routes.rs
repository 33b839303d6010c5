use crate::{
    api::{calendar, employee, health, requests, users},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, middleware::from_fn, web};
use std::sync::Arc;

// Helper to build a per-scope limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            tracing::warn!(requests_per_min, "Invalid rate limit, using governor defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let write_limiter = Arc::new(build_limiter(config.rate_write_per_min));

    cfg.service(health::health);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // caller identity
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/requests")
                    // POST /requests
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(write_limiter.clone())
                            .to(requests::create_request),
                    )
                    // GET /requests
                    .service(web::resource("").route(web::get().to(requests::list_requests)))
                    // PATCH /requests/{id}
                    .service(
                        web::resource("/{id}")
                            .guard(guard::Patch())
                            .wrap(write_limiter.clone())
                            .to(requests::update_status),
                    )
                    // GET /requests/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(requests::get_request)),
                    )
                    // GET /requests/{id}/approvals
                    .service(
                        web::resource("/{id}/approvals")
                            .route(web::get().to(requests::list_approvals)),
                    ),
            )
            .service(web::resource("/calendar").route(web::get().to(calendar::calendar)))
            .service(
                web::resource("/users/sync")
                    .wrap(write_limiter)
                    .route(web::post().to(users::sync_user)),
            )
            .service(web::resource("/employees").route(web::get().to(employee::list_employees))),
    );
}
