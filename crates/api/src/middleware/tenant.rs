//! # Tenant resolution
//!
//! Every schedule route takes a [`TenantContext`]. Extracting it reads the
//! company code from the configured header, validates it and asks the
//! [`TenantResolver`](classbook_db::tenant::TenantResolver) for the matching
//! partition, provisioning it on first use.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use classbook_core::{errors::ScheduleError, models::tenant::TenantCode};
use classbook_db::tenant::TenantScope;
use tracing::debug;

use super::error_handling::AppError;
use crate::ApiState;

/// The caller's tenant partition for the current request.
#[derive(Debug, Clone)]
pub struct TenantContext(pub TenantScope);

impl TenantContext {
    pub fn scope(&self) -> &TenantScope {
        &self.0
    }

    pub fn code(&self) -> &TenantCode {
        self.0.code()
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let header = &state.tenant_header;
        let raw = parts.headers.get(header).ok_or_else(|| {
            ScheduleError::Authentication(format!("missing {} header", header))
        })?;
        let raw = raw.to_str().map_err(|_| {
            ScheduleError::Validation(format!("{} header must be plain text", header))
        })?;

        let code = TenantCode::parse(raw)?;
        let scope = state.tenants.resolve(&code).await?;
        debug!("Request scoped to tenant {}", code);

        Ok(TenantContext(scope))
    }
}
