//! Ownership Migration
//!
//! Moves everything a departing principal owns to a successor, one resource
//! kind at a time, and leaves an append-only audit trail of every attempt.
//!
//! # Architecture
//!
//! - **Paginator**: offset pagination driven until a short or empty page
//! - **Kinds**: one listing and one transfer shape per resource kind, described
//!   as request templates and kept in an ordered registry
//! - **Audit**: per-kind batches of fifty CSV lines appended best-effort
//! - **Orchestrator**: runs every kind, isolating failures at the kind boundary
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use migrator::migration::MigrationOrchestrator;
//! use migrator::services::client::{ClientCredentials, DomoClient, RetryPolicy};
//! use migrator::services::config::MigrationConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MigrationConfig::new("audit-dataset-id", "report-schedules-dataset-id");
//! let client = DomoClient::new(
//!     "https://acme.domo.com",
//!     ClientCredentials::DeveloperToken("token".to_string()),
//!     &config.network,
//!     RetryPolicy::from(&config.retry),
//! )?;
//! let orchestrator = MigrationOrchestrator::from_config(Arc::new(client), config)?;
//! let summary = orchestrator.transfer_content(&42.into(), &99.into()).await?;
//! assert!(summary.kinds.len() > 0);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod kinds;
pub mod orchestrator;
pub mod paginator;
pub mod progress;
pub mod types;

pub use audit::{AuditBatch, AuditLogger, AuditSink, DatasetAuditSink, AUDIT_BATCH_SIZE};
pub use kinds::{KindRegistry, ResourceKind, TransferScope};
pub use orchestrator::MigrationOrchestrator;
pub use paginator::{Cursor, Page};
pub use progress::*;
pub use types::*;
