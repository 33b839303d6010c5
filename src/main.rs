use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

use timeoff::auth::jwt::issue_session_token;
use timeoff::auth::{HttpIdentityProvider, IdentityProvider, StaticIdentityProvider};
use timeoff::config::Config;
use timeoff::db::init_db;
use timeoff::db::memory::{DEMO_EMPLOYEE_USER_ID, DEMO_MANAGER_USER_ID};
use timeoff::{AppState, configure_app};

use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

const DEMO_TOKEN_TTL_SECS: usize = 12 * 60 * 60;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Server starting...");

    let stores = init_db(&config)
        .await
        .context("Failed to initialise storage")?;

    let identity: Arc<dyn IdentityProvider> = match &config.identity_api {
        Some(api) => Arc::new(
            HttpIdentityProvider::new(api.clone()).context("Failed to build identity client")?,
        ),
        None => {
            warn!("IDENTITY_API_URL not set, using the built-in demo directory");
            Arc::new(StaticIdentityProvider::demo())
        }
    };

    if config.seed_demo_data {
        for user_id in [DEMO_EMPLOYEE_USER_ID, DEMO_MANAGER_USER_ID] {
            let token = issue_session_token(user_id, &config.jwt_secret, DEMO_TOKEN_TTL_SECS)?;
            info!(user_id, token = %token, "Demo session token");
        }
    }

    let server_addr = config.server_addr.clone();
    let state = AppState::new(stores, identity, config);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .configure(|cfg| configure_app(cfg, state))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
