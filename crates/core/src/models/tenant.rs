use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ScheduleError, ScheduleResult};

pub const MIN_TENANT_CODE_LEN: usize = 6;
pub const MAX_TENANT_CODE_LEN: usize = 32;

/// Company code identifying one tenant.
///
/// Only ASCII letters and digits are accepted, so the canonical (lower case)
/// form can be embedded in a schema name without further escaping. Schema
/// identifiers are still quoted wherever they reach SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantCode(String);

impl TenantCode {
    pub fn parse(raw: &str) -> ScheduleResult<Self> {
        let raw = raw.trim();
        if raw.len() < MIN_TENANT_CODE_LEN || raw.len() > MAX_TENANT_CODE_LEN {
            return Err(ScheduleError::Validation(format!(
                "company code must be {MIN_TENANT_CODE_LEN}-{MAX_TENANT_CODE_LEN} characters"
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ScheduleError::Validation(
                "company code may only contain letters and digits".to_string(),
            ));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the PostgreSQL schema holding this tenant's tables (unquoted).
    pub fn schema_name(&self) -> String {
        format!("tenant_{}", self.0)
    }
}

impl FromStr for TenantCode {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for TenantCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for TenantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quotes a PostgreSQL identifier, doubling any embedded quote characters.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
