//! # Partition Execution Scope
//!
//! Every query a request issues runs either against the single partition
//! identified by the series date or across all partitions. The choice is
//! made once per deployment mode and applied uniformly to count, data,
//! existence, and latest-date queries alike.

use std::env;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Environment variable selecting the deployment mode.
pub const DEPLOYMENT_MODE_VAR: &str = "API_ENV";

/// Deployment mode of the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentMode {
    /// Default: partition-scoped queries keyed by the series date.
    Production,
    /// Staging: a single logical date partition is not guaranteed to
    /// exist, so queries run cross-partition.
    Staging,
}

impl Default for DeploymentMode {
    fn default() -> Self {
        DeploymentMode::Production
    }
}

impl DeploymentMode {
    /// Read the mode from the environment. Any value other than
    /// `STAGING` means production.
    pub fn from_env() -> Self {
        match env::var(DEPLOYMENT_MODE_VAR) {
            Ok(value) if value == "STAGING" => DeploymentMode::Staging,
            _ => DeploymentMode::Production,
        }
    }
}

/// How a query is routed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionScope {
    /// Scoped to the shard holding this partition key value.
    Partition(String),
    /// Scanned across all shards.
    CrossPartition,
}

impl ExecutionScope {
    /// Select the scope for one request's series date.
    pub fn for_request(mode: DeploymentMode, date: NaiveDate) -> Self {
        match mode {
            DeploymentMode::Production => {
                ExecutionScope::Partition(date.format("%Y-%m-%d").to_string())
            }
            DeploymentMode::Staging => ExecutionScope::CrossPartition,
        }
    }
}
