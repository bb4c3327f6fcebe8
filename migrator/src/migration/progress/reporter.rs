//! Progress reporting abstraction for migration runs

use tracing::{info, warn};

use crate::migration::types::{KindReport, KindTag, MigrationSummary, TransferContext};

/// Trait for reporting migration progress
pub trait ProgressReporter: Send + Sync {
    fn run_started(&self, ctx: &TransferContext, kinds: usize);
    fn kind_started(&self, kind: KindTag);
    fn kind_finished(&self, report: &KindReport);
    fn run_finished(&self, summary: &MigrationSummary);
}

/// Reports through `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn run_started(&self, ctx: &TransferContext, kinds: usize) {
        info!(
            source = %ctx.source_user_id,
            new_owner = %ctx.new_owner_id,
            source_name = %ctx.source_display_name,
            kinds,
            "Ownership migration started"
        );
    }

    fn kind_started(&self, kind: KindTag) {
        info!(kind = %kind, "Migrating kind");
    }

    fn kind_finished(&self, report: &KindReport) {
        match &report.enumeration_error {
            Some(error) => warn!(
                kind = %report.kind,
                discovered = report.discovered,
                transferred = report.transferred,
                not_transferred = report.not_transferred,
                error = %error,
                "Kind finished with an incomplete listing"
            ),
            None => info!(
                kind = %report.kind,
                discovered = report.discovered,
                transferred = report.transferred,
                not_transferred = report.not_transferred,
                failed = report.failed,
                cancelled = report.cancelled,
                "Kind finished"
            ),
        }
    }

    fn run_finished(&self, summary: &MigrationSummary) {
        let failed = summary.failed_kinds();
        if summary.is_complete() {
            info!(
                transferred = summary.total_transferred(),
                not_transferred = summary.total_not_transferred(),
                audit_records = summary.audit.records_written,
                audit_dropped = summary.audit.records_dropped,
                "Ownership migration finished"
            );
        } else {
            warn!(
                transferred = summary.total_transferred(),
                not_transferred = summary.total_not_transferred(),
                failed_transfers = summary.total_failed(),
                failed_kinds = ?failed,
                cancelled = summary.cancelled,
                audit_dropped = summary.audit.records_dropped,
                "Ownership migration finished incomplete; re-run to retry"
            );
        }
    }
}
