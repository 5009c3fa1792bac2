//! Runtime settings
//!
//! Environment-level configuration applied uniformly to every request:
//! the deployment mode, the maximum rows per response page, and the
//! count-cache capacity.

use std::env;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::store::DeploymentMode;

/// Environment variable overriding the page size.
pub const MAX_PAGE_SIZE_VAR: &str = "MAX_ITEMS_PER_RESPONSE";

/// Runtime settings for the query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Partition-scoped (production) vs cross-partition (staging).
    #[serde(default)]
    pub deployment_mode: DeploymentMode,

    /// Maximum rows per response page (default: 1000).
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Count cache capacity (default: 2048).
    #[serde(default = "default_cache_capacity")]
    pub count_cache_capacity: usize,
}

fn default_max_page_size() -> usize {
    1000
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deployment_mode: DeploymentMode::default(),
            max_page_size: default_max_page_size(),
            count_cache_capacity: default_cache_capacity(),
        }
    }
}

impl Settings {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            deployment_mode: DeploymentMode::from_env(),
            max_page_size: env::var(MAX_PAGE_SIZE_VAR)
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(default_max_page_size),
            count_cache_capacity: default_cache_capacity(),
        }
    }

    /// Settings with a specific page size.
    pub fn with_max_page_size(max_page_size: usize) -> Self {
        Self {
            max_page_size,
            ..Default::default()
        }
    }
}
