use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_list};
use crate::{
    domain::{ApiPath, Query},
    error::ClientError,
    models::Agent,
};

/// Every agent known to the registry, with its last heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentsQuery;

impl Resource for AgentsQuery {
    type Output = Vec<Agent>;

    const OPERATION: &'static str = "agents";
    const TTL: Duration = Duration::from_secs(15);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/agents")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "agents")
    }
}
