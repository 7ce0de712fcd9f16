//! Typed shapes of the backend payloads.
//!
//! Every field is optional or defaulted: the backend owns these documents and
//! the dashboard only displays them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

/// Agents silent for longer than this are shown as stale.
pub const AGENT_STALE_AFTER: Duration = Duration::minutes(5);
pub const TASK_SUMMARY_LIMIT: usize = 150;

/// Parses the backend's ISO-8601 timestamps. Naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&format!("{raw}Z"), &Rfc3339))
        .ok()
}

/// An explicit `null` reads as the empty value, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub last_activity_ts: Option<String>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        !self.status.as_deref().is_some_and(|s| {
            s.eq_ignore_ascii_case("archived") || s.eq_ignore_ascii_case("inactive")
        })
    }

    pub fn last_activity(&self) -> Option<OffsetDateTime> {
        self.last_activity_ts.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagNode {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub task_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagDefinition {
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: Vec<DagNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineExecution {
    #[serde(deserialize_with = "null_as_default")]
    pub dag_id: String,
    pub project_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub message: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub dag: Option<DagDefinition>,
}

impl PipelineExecution {
    /// Finished-successfully, running and queued executions cannot be rerun.
    pub fn can_rerun(&self) -> bool {
        !matches!(
            self.status.as_str(),
            "COMPLETED_SUCCESS" | "RUNNING" | "QUEUED"
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status.as_str(), "RUNNING" | "STARTED")
    }

    pub fn is_failed(&self) -> bool {
        self.status == "FAILED"
    }

    pub fn description(&self) -> Option<&str> {
        self.dag
            .as_ref()
            .and_then(|d| d.description.as_deref())
            .or(self.message.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub task_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub message: Option<String>,
    pub result_summary: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl TaskStatus {
    pub fn summary(&self) -> String {
        let text = self
            .message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(self.result_summary.as_deref())
            .unwrap_or_default();
        text.chars().take(TASK_SUMMARY_LIMIT).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub dag_id: String,
    pub project_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub task_statuses: Vec<TaskStatus>,
    pub dag: Option<DagDefinition>,
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: Vec<DagNode>,
}

impl DagDetails {
    /// DAG structure, stored either with the definition or at the top level.
    pub fn structure(&self) -> &[DagNode] {
        match &self.dag {
            Some(def) if !def.nodes.is_empty() => &def.nodes,
            _ => &self.nodes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub deployment_id: Option<String>,
    pub request_id: Option<String>,
    pub project_id: Option<String>,
    pub service_name: Option<String>,
    pub target_environment: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub commit_sha: Option<String>,
    pub deployment_url: Option<String>,
    pub logs_url: Option<String>,
    pub completed_at: Option<String>,
    pub timestamp: Option<String>,
}

impl Deployment {
    pub fn can_rollback(&self) -> bool {
        matches!(self.status.as_str(), "SUCCESSFUL" | "FAILED")
    }

    pub fn is_successful(&self) -> bool {
        self.status == "SUCCESSFUL"
    }

    pub fn short_commit(&self) -> Option<&str> {
        self.commit_sha
            .as_deref()
            .map(|sha| sha.get(..7).unwrap_or(sha))
    }

    /// Completion time, falling back to the event timestamp.
    pub fn finished_at(&self) -> Option<OffsetDateTime> {
        self.completed_at
            .as_deref()
            .or(self.timestamp.as_deref())
            .and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCapability {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentEndpoint {
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    #[serde(deserialize_with = "null_as_default")]
    pub agent_id: String,
    pub agent_type: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub capabilities: Vec<AgentCapability>,
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<AgentEndpoint>,
    pub last_seen_timestamp: Option<String>,
    pub metadata: Option<Value>,
}

impl Agent {
    /// Unknown last-seen times are not treated as stale.
    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        self.last_seen_timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|seen| now - seen > AGENT_STALE_AFTER)
    }

    pub fn is_online(&self, now: OffsetDateTime) -> bool {
        let reachable = self.status.as_deref().is_some_and(|s| {
            !s.is_empty()
                && !["offline", "error", "unreachable", "stopped"]
                    .iter()
                    .any(|bad| s.eq_ignore_ascii_case(bad))
        });
        reachable && !self.is_stale(now)
    }
}

/// Registered agent count, total and per agent type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistrySummary {
    pub total_registered: usize,
    pub types: BTreeMap<String, usize>,
}

impl AgentRegistrySummary {
    pub fn from_agents(agents: &[Agent]) -> Self {
        let mut types = BTreeMap::new();
        for agent in agents {
            let kind = agent.agent_type.as_deref().unwrap_or("Unknown");
            *types.entry(kind.to_string()).or_insert(0) += 1;
        }
        Self {
            total_registered: agents.len(),
            types,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Finding {
    pub finding_id: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub line_number: Option<u64>,
    pub rule_id: Option<String>,
    pub tool_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanResult {
    pub triggering_event_id: Option<String>,
    pub project_id: Option<String>,
    pub scan_type: Option<String>,
    pub tool_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub timestamp: Option<String>,
    pub summary: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceAlert {
    pub alert_id: Option<String>,
    /// Set on SLA violations.
    pub event_type: Option<String>,
    /// Set on policy alerts.
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    pub timestamp: Option<String>,
    pub context_summary: Option<Value>,
    pub event_details: Option<Value>,
}

impl GovernanceAlert {
    pub fn kind(&self) -> Option<&str> {
        self.event_type.as_deref().or(self.alert_type.as_deref())
    }

    pub fn is_critical(&self) -> bool {
        self.severity
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("critical"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLogEntry {
    pub audit_id: Option<String>,
    pub timestamp: Option<String>,
    pub source_event_type: Option<String>,
    pub project_id: Option<String>,
    pub user_or_actor: Option<String>,
    pub action_description: Option<String>,
}

/// Build-system configuration document, global or for one project.
pub type BuildConfig = Map<String, Value>;
