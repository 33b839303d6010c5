#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{
    App,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::NormalizePath,
    test::TestRequest,
};
use timeoff::auth::StaticIdentityProvider;
use timeoff::auth::jwt::issue_session_token;
use timeoff::config::Config;
use timeoff::db::{MemoryStore, Stores};
use timeoff::{AppState, configure_app};

pub const SECRET: &str = "integration-secret";
pub const MANAGER: &str = "user_jordan";
pub const EMPLOYEE: &str = "user_priya";
pub const OPS_ADMIN: &str = "user_ops";

pub fn state_with(store: Arc<MemoryStore>) -> AppState {
    let identity = StaticIdentityProvider::demo()
        .with_member(MANAGER, "Jordan Lee", Some("Engineering Manager"))
        .with_member(EMPLOYEE, "Priya Patel", Some("QA Analyst"));
    let mut config = Config::for_tests(SECRET);
    config.manager_override_user_ids = vec![OPS_ADMIN.to_string()];

    AppState::new(
        Stores {
            requests: store.clone(),
            employees: store,
        },
        Arc::new(identity),
        config,
    )
}

pub fn state() -> AppState {
    state_with(Arc::new(MemoryStore::with_demo_data()))
}

pub fn app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(NormalizePath::trim())
        .configure(|cfg| configure_app(cfg, state))
}

fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

pub fn bearer(user_id: &str) -> String {
    let token = issue_session_token(user_id, SECRET, 3600).unwrap();
    format!("Bearer {token}")
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).peer_addr(peer())
}

pub fn post(uri: &str) -> TestRequest {
    TestRequest::post().uri(uri).peer_addr(peer())
}

pub fn patch(uri: &str) -> TestRequest {
    TestRequest::patch().uri(uri).peer_addr(peer())
}

pub fn as_user(req: TestRequest, user_id: &str) -> TestRequest {
    req.insert_header(("Authorization", bearer(user_id)))
}
