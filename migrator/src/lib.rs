//! Ownership migration for departing platform users.
//!
//! `services` holds the platform transport, configuration and error types;
//! `migration` holds the paginator, kind catalog, audit logger and orchestrator.

pub mod migration;
pub mod services;

pub use migration::{MigrationOrchestrator, MigrationSummary, PrincipalId};
pub use services::config::MigrationConfig;
pub use services::errors::{MigrationError, MigrationResult};
