mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

use common::{EMPLOYEE, app, as_user, get, post, state};

#[actix_web::test]
async fn anonymous_sync_is_rejected() {
    let app = test::init_service(app(state())).await;

    let resp = test::call_service(&app, post("/api/users/sync").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "error", "message": "Not authenticated." }));
}

#[actix_web::test]
async fn known_user_gets_an_employee_row() {
    let app = test::init_service(app(state())).await;

    let resp = test::call_service(&app, as_user(post("/api/users/sync"), EMPLOYEE).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["employee"]["externalId"], EMPLOYEE);
    assert_eq!(body["employee"]["fullName"], "Priya Patel");
    assert_eq!(body["employee"]["role"], "QA Analyst");

    // a second sync refreshes the same row
    let again: Value = test::call_and_read_body_json(
        &app,
        as_user(post("/api/users/sync"), EMPLOYEE).to_request(),
    )
    .await;
    assert_eq!(again["employee"]["id"], body["employee"]["id"]);

    let listed: Value = test::call_and_read_body_json(&app, get("/api/employees").to_request()).await;
    let employees = listed["employees"].as_array().unwrap();
    assert_eq!(
        employees
            .iter()
            .filter(|e| e["externalId"] == EMPLOYEE)
            .count(),
        1
    );
}

#[actix_web::test]
async fn user_unknown_to_the_provider_cannot_sync() {
    let app = test::init_service(app(state())).await;

    let resp = test::call_service(
        &app,
        as_user(post("/api/users/sync"), "user_ghost").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "error", "message": "Unable to sync user." }));
}
