use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_list};
use crate::{
    domain::{ApiPath, Filter, Query},
    error::ClientError,
    models::{AuditLogEntry, GovernanceAlert},
};

/// SLA violations and policy alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceAlertsQuery {
    pub alert_type: Filter,
    pub min_severity: Filter,
    pub limit: u32,
}

impl GovernanceAlertsQuery {
    pub const DEFAULT_LIMIT: u32 = 25;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert_type(mut self, alert_type: impl Into<Filter>) -> Self {
        self.alert_type = alert_type.into();
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

impl Default for GovernanceAlertsQuery {
    fn default() -> Self {
        Self {
            alert_type: Filter::All,
            min_severity: Filter::All,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Resource for GovernanceAlertsQuery {
    type Output = Vec<GovernanceAlert>;

    const OPERATION: &'static str = "governance_alerts";
    const TTL: Duration = Duration::from_secs(60);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/governance/alerts")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
            .with_filter("alert_type", &self.alert_type)
            .with_filter("min_severity", &self.min_severity)
            .with("limit", self.limit)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "alerts")
    }
}

/// Append-only audit trail, cached the longest of the live views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogsQuery {
    pub project_id: Filter,
    pub source_event_type: Filter,
    pub limit: u32,
}

impl AuditLogsQuery {
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: impl Into<Filter>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn source_event_type(mut self, event_type: impl Into<Filter>) -> Self {
        self.source_event_type = event_type.into();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for AuditLogsQuery {
    fn default() -> Self {
        Self {
            project_id: Filter::All,
            source_event_type: Filter::All,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Resource for AuditLogsQuery {
    type Output = Vec<AuditLogEntry>;

    const OPERATION: &'static str = "audit_logs";
    const TTL: Duration = Duration::from_secs(300);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/governance/audit-logs")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
            .with_filter("project_id", &self.project_id)
            .with_filter("source_event_type", &self.source_event_type)
            .with("limit", self.limit)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "audit_logs")
    }
}
