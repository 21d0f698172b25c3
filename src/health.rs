//! Per-provider health counters surfaced on `/health`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderHealthSnapshot {
    pub last_success: Option<DateTime<Utc>>,
    pub consecutive_upstream_errors: usize,
    pub normalization_errors: usize,
}

/// Health of one provider domain. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct ProviderHealth {
    pub last_success: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub consecutive_upstream_errors: Arc<RwLock<usize>>,
    pub normalization_errors: Arc<RwLock<usize>>,
}

impl ProviderHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_success(&self) {
        *self.last_success.write().await = Some(Utc::now());
        *self.consecutive_upstream_errors.write().await = 0;
    }

    pub async fn record_upstream_error(&self) {
        *self.consecutive_upstream_errors.write().await += 1;
    }

    pub async fn record_normalization_error(&self) {
        *self.normalization_errors.write().await += 1;
    }

    pub async fn snapshot(&self) -> ProviderHealthSnapshot {
        ProviderHealthSnapshot {
            last_success: *self.last_success.read().await,
            consecutive_upstream_errors: *self.consecutive_upstream_errors.read().await,
            normalization_errors: *self.normalization_errors.read().await,
        }
    }
}
