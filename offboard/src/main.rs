use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use migrator::migration::MigrationOrchestrator;
use migrator::services::client::{ClientCredentials, DomoClient, RetryPolicy};
use migrator::services::config::{ExecutionMode, MigrationConfig};
use migrator::PrincipalId;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Move everything a departing user owns to their successor.
#[derive(Parser, Debug)]
#[command(name = "offboard", version)]
struct Args {
    /// Instance base URL, e.g. https://acme.domo.com
    #[arg(long, env = "DOMO_INSTANCE")]
    instance: String,

    #[arg(long, env = "DOMO_DEVELOPER_TOKEN", hide_env_values = true)]
    token: String,

    /// Dataset receiving the audit log
    #[arg(long, env = "MIGRATION_AUDIT_DATASET_ID")]
    audit_dataset_id: String,

    /// Dataset exporting report schedules
    #[arg(long, env = "MIGRATION_SCHEDULED_REPORTS_DATASET_ID")]
    scheduled_reports_dataset_id: String,

    /// Kinds migrated at once; 1 runs them one after another
    #[arg(long, default_value_t = 1)]
    concurrent_kinds: usize,

    /// Items of one kind transferred at once
    #[arg(long, default_value_t = 4)]
    concurrent_transfers: usize,

    /// Revoke sessions and delete the source user after a complete run
    #[arg(long)]
    delete_source: bool,

    #[arg(long)]
    log_json: bool,

    source_user_id: String,

    new_owner_id: String,
}

impl Args {
    fn config(&self) -> MigrationConfig {
        let execution = match self.concurrent_kinds {
            0 | 1 => ExecutionMode::Sequential,
            max_kinds => ExecutionMode::Concurrent { max_kinds },
        };
        MigrationConfig::new(&self.audit_dataset_id, &self.scheduled_reports_dataset_id)
            .with_execution(execution)
            .with_max_concurrent_transfers(self.concurrent_transfers)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = args.config();
    let client = DomoClient::new(
        &args.instance,
        ClientCredentials::DeveloperToken(args.token.clone()),
        &config.network,
        RetryPolicy::from(&config.retry),
    )
    .context("building platform client")?;
    let orchestrator = MigrationOrchestrator::from_config(Arc::new(client), config)
        .context("invalid migration configuration")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current page");
            let _ = cancel_tx.send(true);
        }
    });

    let source = PrincipalId::from(args.source_user_id.as_str());
    let new_owner = PrincipalId::from(args.new_owner_id.as_str());
    let summary = orchestrator
        .transfer_content_with_cancel(&source, &new_owner, cancel_rx)
        .await
        .context("migration aborted")?;

    info!(
        transferred = summary.total_transferred(),
        not_transferred = summary.total_not_transferred(),
        failed_transfers = summary.total_failed(),
        failed_kinds = ?summary.failed_kinds(),
        audit_records_dropped = summary.audit.records_dropped,
        cancelled = summary.cancelled,
        "Migration finished"
    );

    if args.delete_source {
        orchestrator
            .delete_source_if_complete(&summary)
            .await
            .context("deleting the source user")?;
    }

    Ok(())
}
