use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_document};
use crate::{
    domain::{ApiPath, Query},
    error::ClientError,
    models::Health,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthQuery;

impl Resource for HealthQuery {
    type Output = Health;

    const OPERATION: &'static str = "health";
    const TTL: Duration = Duration::from_secs(60);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/health")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_document(payload)
    }
}
