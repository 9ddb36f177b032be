//! # Classbook API
//!
//! HTTP surface of the multi-tenant class scheduling service. Every schedule
//! route is tenant-scoped: the company code arrives in a request header set
//! by the authenticating gateway and is resolved to the tenant's storage
//! partition before any handler runs.
//!
//! ## Architecture
//!
//! - **Routes**: endpoint structure under `/api`
//! - **Handlers**: request processing on top of `classbook_db::scheduling`
//! - **Middleware**: tenant resolution and error-to-envelope mapping
//! - **Notify**: per-tenant change event fan-out for the event stream
//! - **Config**: environment-driven settings

/// Configuration module for API settings
pub mod config;
/// Request handlers for schedule operations
pub mod handlers;
/// Tenant extraction and error handling
pub mod middleware;
/// Per-tenant change event fan-out
pub mod notify;
/// Shared response envelope
pub mod response;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use classbook_db::tenant::{PgTenantRegistry, TenantResolver};
use eyre::{Result, WrapErr};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::notify::ConnectionRegistry;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Maps company codes onto provisioned tenant partitions
    pub tenants: Arc<dyn TenantResolver>,
    /// Subscribers to schedule change events, keyed by tenant
    pub registry: ConnectionRegistry,
    /// Header carrying the caller's company code
    pub tenant_header: HeaderName,
}

impl ApiState {
    /// State backed by PostgreSQL schemas for tenant partitions.
    pub fn new(db_pool: PgPool, tenant_header: HeaderName) -> Self {
        let tenants = Arc::new(PgTenantRegistry::new(db_pool.clone()));
        Self {
            db_pool,
            tenants,
            registry: ConnectionRegistry::new(),
            tenant_header,
        }
    }
}

/// Builds the application router over the given state, without the
/// server-level layers.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::schedule::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String], tenant_header: &HeaderName) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .wrap_err_with(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            tenant_header.clone(),
        ])
        .allow_origin(origins)
        .allow_credentials(true))
}

/// Starts the API server with the provided configuration and database connection
///
/// Installs the tracing subscriber, wires the routes and layers, and serves
/// until the listener fails.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::new(db_pool, config.tenant_header.clone()));
    let app = app(state);

    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins, &config.tenant_header)?),
        None => app,
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
