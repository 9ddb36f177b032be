use axum::{routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::{response::ApiResponse, ApiState};

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

#[derive(Serialize)]
struct VersionInfo {
    version: &'static str,
}

async fn health_check() -> ApiResponse<HealthStatus> {
    ApiResponse::ok("Service is healthy", HealthStatus { status: "ok" })
}

async fn version() -> ApiResponse<VersionInfo> {
    ApiResponse::ok(
        "Service version",
        VersionInfo {
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
}
