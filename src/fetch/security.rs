use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_list};
use crate::{
    domain::{ApiPath, Filter, Query},
    error::ClientError,
    models::ScanResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityScansQuery {
    pub project_id: Filter,
    pub scan_type: Filter,
    pub min_severity: Filter,
    pub limit: u32,
}

impl SecurityScansQuery {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: impl Into<Filter>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn scan_type(mut self, scan_type: impl Into<Filter>) -> Self {
        self.scan_type = scan_type.into();
        self
    }

    pub fn min_severity(mut self, severity: impl Into<Filter>) -> Self {
        self.min_severity = severity.into();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for SecurityScansQuery {
    fn default() -> Self {
        Self {
            project_id: Filter::All,
            scan_type: Filter::All,
            min_severity: Filter::All,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Resource for SecurityScansQuery {
    type Output = Vec<ScanResult>;

    const OPERATION: &'static str = "security_scans";
    const TTL: Duration = Duration::from_secs(60);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/security/scan-results")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
            .with_filter("project_id", &self.project_id)
            .with_filter("scan_type", &self.scan_type)
            .with_filter("min_severity", &self.min_severity)
            .with("limit", self.limit)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "scan_results")
    }
}
