use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{accepting_resolver, company, tenant_header, Envelope, TestContext};

#[tokio::test]
async fn test_list_rejects_inverted_date_window() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .get("/api/schedules")
        .add_query_param("startDate", "2024-03-10")
        .add_query_param("endDate", "2024-03-01")
        .add_header(tenant_header(), company("acmecorp"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Envelope = response.json();
    assert!(!body.success);
    assert!(body.message.contains("startDate"));
}

#[tokio::test]
async fn test_list_rejects_unparseable_date() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .get("/api/schedules")
        .add_query_param("startDate", "next tuesday")
        .add_header(tenant_header(), company("acmecorp"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .post("/api/schedules")
        .add_header(tenant_header(), company("acmecorp"))
        .json(&json!({ "schoolName": "Hillside Primary" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Envelope = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_create_recurring_without_weekdays_is_rejected() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .post("/api/schedules")
        .add_header(tenant_header(), company("acmecorp"))
        .json(&json!({
            "schoolName": "Hillside Primary",
            "className": "Robotics",
            "startTime": "09:00:00",
            "endTime": "10:00:00",
            "is_recurring": true,
            "weekdays": [],
            "recurrenceStartDate": "2024-01-01",
            "recurrenceEndDate": "2024-01-31"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Envelope = response.json();
    assert!(body.message.starts_with("Validation error"));
}

#[tokio::test]
async fn test_create_rejects_out_of_range_weekday() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .post("/api/schedules")
        .add_header(tenant_header(), company("acmecorp"))
        .json(&json!({
            "schoolName": "Hillside Primary",
            "className": "Robotics",
            "startTime": "09:00:00",
            "endTime": "10:00:00",
            "isRecurring": true,
            "weekdays": [0, 8],
            "recurrenceStartDate": "2024-01-01",
            "recurrenceEndDate": "2024-01-31"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_requires_tenant() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .post("/api/schedules")
        .json(&json!({
            "schoolName": "Hillside Primary",
            "className": "Robotics",
            "startTime": "09:00:00",
            "endTime": "10:00:00",
            "date": "2024-01-08"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_rejects_unknown_scope() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .delete("/api/schedules/12")
        .add_query_param("type", "everything")
        .add_header(tenant_header(), company("acmecorp"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_requires_date() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .put("/api/schedules/12/date")
        .add_header(tenant_header(), company("acmecorp"))
        .json(&json!({ "isCopy": true }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
