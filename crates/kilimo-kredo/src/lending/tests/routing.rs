use super::common::*;
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::lending::repository::StoreProfileRepository;
use crate::lending::router::{list_handler, ListQuery};
use crate::lending::service::LendingService;
use crate::lending::store::MemoryStore;

fn json_request(method: &str, uri: &str, payload: &Value) -> Request<axum::body::Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<axum::body::Body> {
    Request::get(uri)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

fn profile_payload() -> Value {
    serde_json::to_value(profile_submission()).expect("profile json")
}

fn loan_payload(amount: u64) -> Value {
    json!({
        "amount": amount,
        "purpose": "seeds_and_fertilizer",
        "duration_months": 12,
        "seasonal_expense": 45000,
        "expected_yield_kg": 48000.0,
    })
}

#[tokio::test]
async fn profile_route_assesses_and_returns_the_profile() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request("PUT", "/api/v1/profile", &profile_payload()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["assessment"]["assessment"]["score"], json!(850));
    assert_eq!(payload["assessment"]["assessment"]["risk_tier"], json!("Low"));

    let response = router
        .oneshot(get_request("/api/v1/profile"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["name"], json!("Grace Wanjiru"));
}

#[tokio::test]
async fn profile_route_reports_missing_profile() {
    let (service, _, _) = build_service();

    let response = router_with_service(service)
        .oneshot(get_request("/api/v1/profile"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn profile_route_rejects_incomplete_forms() {
    let (service, _, _) = build_service();
    let mut payload = profile_payload();
    payload["phone"] = json!("");

    let response = router_with_service(service)
        .oneshot(json_request("PUT", "/api/v1/profile", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("phone"));
}

#[tokio::test]
async fn assessment_route_scores_raw_inputs() {
    let (service, _, _) = build_service();
    let input = serde_json::to_value(high_scoring_input()).expect("input json");

    let response = router_with_service(service)
        .oneshot(json_request("POST", "/api/v1/assessments", &input))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["score"], json!(850));
    assert_eq!(payload["interest_rate"], json!(8));
    assert_eq!(payload["loan_limit"], json!(500_000));
    assert_eq!(payload["components"].as_array().map(Vec::len), Some(8));
}

#[tokio::test]
async fn assessment_route_rejects_invalid_inputs() {
    let (service, _, _) = build_service();
    let input = serde_json::to_value(defaulter_input()).expect("input json");

    let response = router_with_service(service)
        .oneshot(json_request("POST", "/api/v1/assessments", &input))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn assessment_route_rejects_negative_loan_counts() {
    let (service, _, _) = build_service();
    let mut input = serde_json::to_value(high_scoring_input()).expect("input json");
    input["previous_loans"] = json!(-1);

    let response = router_with_service(service)
        .oneshot(json_request("POST", "/api/v1/assessments", &input))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_route_requires_a_profile() {
    let (service, _, _) = build_service();

    let response = router_with_service(service)
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            &loan_payload(50_000),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn application_lifecycle_over_http() {
    let (service, _) = service_with_profile();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            &loan_payload(75_000),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    assert_eq!(created["status"], json!("pending"));
    let id = created["application_id"]
        .as_str()
        .expect("application id")
        .to_string();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/applications/{id}/review"),
            &json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], json!("under_review"));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/applications/{id}/decision"),
            &json!({ "decision": "approved", "comments": "good standing", "adjusted_rate": 10.0 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let decided = read_json_body(response).await;
    assert_eq!(decided["status"], json!("approved"));
    assert_eq!(decided["decision"]["approved_amount"], json!(75_000));
    assert_eq!(decided["decision"]["approved_rate"], json!(10.0));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/applications/{id}/decision"),
            &json!({ "decision": "rejected", "comments": "second thoughts" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(get_request(&format!("/api/v1/applications/{id}")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], json!("approved"));

    let response = router
        .oneshot(get_request("/api/v1/applications/stats"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let stats = read_json_body(response).await;
    assert_eq!(stats["total"], json!(1));
    assert_eq!(stats["approved"], json!(1));
    assert_eq!(stats["approved_amount"], json!(75_000));
}

#[tokio::test]
async fn decision_route_validates_before_lookup() {
    let (service, _) = service_with_profile();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications/APP-MISSING/decision",
            &json!({ "decision": "approved", "comments": "" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/applications/APP-MISSING/decision",
            &json!({ "decision": "approved", "comments": "fine" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_route_filters_by_status() {
    let (service, _) = service_with_profile();
    let service = Arc::new(service);
    let first = service.submit(loan_request(30_000)).expect("first");
    service.submit(loan_request(40_000)).expect("second");
    service.start_review(&first.application_id).expect("review");
    let router = crate::lending::lending_router(service);

    let response = router
        .clone()
        .oneshot(get_request("/api/v1/applications?status=under-review"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(
        listed[0]["application_id"],
        json!(first.application_id.0.clone())
    );

    let response = router
        .clone()
        .oneshot(get_request("/api/v1/applications?status=all"))
        .await
        .expect("route executes");
    assert_eq!(
        read_json_body(response).await.as_array().map(Vec::len),
        Some(2)
    );

    let response = router
        .oneshot(get_request("/api/v1/applications?status=archived"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_handler_reports_unavailable_storage() {
    let service = Arc::new(LendingService::new(
        Arc::new(StoreProfileRepository::new(Arc::new(MemoryStore::default()))),
        Arc::new(UnavailableApplications),
        Arc::new(FixedEnvironment::new(lush_environment())),
        engine(),
    ));

    let response = list_handler::<MemoryProfiles, UnavailableApplications, FixedEnvironment>(
        State(service),
        Query(ListQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
