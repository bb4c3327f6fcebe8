use serde::{Deserialize, Serialize};

use crate::services::errors::{MigrationError, MigrationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub datasets: DatasetConfig,
    pub concurrency: ConcurrencyConfig,
    pub execution: ExecutionMode,
    pub retry: RetryConfig,
    pub network: NetworkConfig,
}

/// Dataset identifiers resolved at deployment time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Append-only log that receives one row per attempted transfer
    pub audit_log_dataset_id: String,
    /// Periodic export of report schedules and their owners
    pub scheduled_reports_dataset_id: String,
}

/// How the registered kinds are driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One kind at a time, in registry order
    Sequential,
    /// Up to `max_kinds` kinds in flight at once
    Concurrent { max_kinds: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Per-item mutation calls in flight within one page
    pub max_concurrent_transfers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Sequential
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transfers: 4,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 60_000,
            connect_timeout_ms: 10_000,
            user_agent: "ownership-migrator/1.0".to_string(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            datasets: DatasetConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            execution: ExecutionMode::default(),
            retry: RetryConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Configuration with the two deployment dataset ids and defaults elsewhere
    pub fn new(audit_log_dataset_id: &str, scheduled_reports_dataset_id: &str) -> Self {
        Self {
            datasets: DatasetConfig {
                audit_log_dataset_id: audit_log_dataset_id.to_string(),
                scheduled_reports_dataset_id: scheduled_reports_dataset_id.to_string(),
            },
            ..Self::default()
        }
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_max_concurrent_transfers(mut self, max: usize) -> Self {
        self.concurrency.max_concurrent_transfers = max;
        self
    }

    pub fn validate(&self) -> MigrationResult<()> {
        if self.datasets.audit_log_dataset_id.trim().is_empty() {
            return Err(invalid("datasets.audit_log_dataset_id", ""));
        }

        if self.datasets.scheduled_reports_dataset_id.trim().is_empty() {
            return Err(invalid("datasets.scheduled_reports_dataset_id", ""));
        }

        if self.concurrency.max_concurrent_transfers == 0 {
            return Err(invalid("concurrency.max_concurrent_transfers", "0"));
        }

        if let ExecutionMode::Concurrent { max_kinds: 0 } = self.execution {
            return Err(invalid("execution.max_kinds", "0"));
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "0"));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(invalid(
                "retry.base_delay_ms",
                &self.retry.base_delay_ms.to_string(),
            ));
        }

        if self.network.request_timeout_ms == 0 {
            return Err(invalid("network.request_timeout_ms", "0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> MigrationError {
    MigrationError::Configuration {
        field: field.to_string(),
        value: value.to_string(),
    }
}
