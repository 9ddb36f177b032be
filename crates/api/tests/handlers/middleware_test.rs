use axum::{http::StatusCode, response::IntoResponse};
use classbook_api::middleware::error_handling::AppError;
use classbook_core::errors::ScheduleError;
use classbook_db::tenant::TenantScope;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::test_utils::{accepting_resolver, company, tenant_header, Envelope, MockResolver, TestContext};

#[rstest]
#[case::not_found(ScheduleError::NotFound("Schedule with ID 9 not found".into()), StatusCode::NOT_FOUND)]
#[case::validation(ScheduleError::Validation("bad input".into()), StatusCode::BAD_REQUEST)]
#[case::conflict(ScheduleError::Conflict("taken".into()), StatusCode::BAD_REQUEST)]
#[case::authentication(ScheduleError::Authentication("no tenant".into()), StatusCode::UNAUTHORIZED)]
#[case::tenant(ScheduleError::Tenant("no partition".into()), StatusCode::INTERNAL_SERVER_ERROR)]
#[case::database(ScheduleError::Database(eyre::eyre!("connection reset")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: ScheduleError, #[case] expected: StatusCode) {
    assert_eq!(AppError(error).status(), expected);
}

#[tokio::test]
async fn test_error_handling_internal() {
    let error = ScheduleError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    let response = AppError(error).into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_health_is_untenanted() {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().never();
    let server = TestContext::new(resolver).server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Envelope = response.json();
    assert!(body.success);
    assert_eq!(body.data.unwrap()["status"], "ok");
}

#[tokio::test]
async fn test_missing_tenant_header_is_unauthorized() {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().never();
    let server = TestContext::new(resolver).server();

    let response = server.get("/api/schedules").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Envelope = response.json();
    assert!(!body.success);
    assert!(body.message.contains("x-company-code"));
    assert_eq!(body.data, None);
}

#[tokio::test]
async fn test_malformed_tenant_code_is_bad_request() {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().never();
    let server = TestContext::new(resolver).server();

    let response = server
        .get("/api/schedules")
        .add_header(tenant_header(), company("acme-01"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Envelope = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_tenant_code_is_resolved_case_insensitively() {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .withf(|code| code.as_str() == "acmecorp")
        .times(1)
        .returning(|code| Ok(TenantScope::new(code.clone())));
    let server = TestContext::new(resolver).server();

    // Rejected by query validation after the tenant has been resolved.
    let response = server
        .get("/api/schedules")
        .add_query_param("startDate", "2024-02-01")
        .add_query_param("endDate", "2024-01-01")
        .add_header(tenant_header(), company("AcmeCorp"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_partition_failure_is_server_error() {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .returning(|code| Err(ScheduleError::Tenant(format!("could not prepare data partition for {code}"))));
    let server = TestContext::new(resolver).server();

    let response = server
        .get("/api/schedules/1")
        .add_header(tenant_header(), company("acmecorp"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Envelope = response.json();
    assert!(!body.success);
    assert!(body.message.contains("acmecorp"));
}

#[tokio::test]
async fn test_non_numeric_id_uses_error_envelope() {
    let server = TestContext::new(accepting_resolver()).server();

    let response = server
        .get("/api/schedules/abc")
        .add_header(tenant_header(), company("acmecorp"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Envelope = response.json();
    assert!(!body.success);
}
