//! Drives every registered kind for one `(source, new owner)` pair.
//!
//! Kinds are isolated from each other: a listing failure ends that kind only,
//! and whatever was discovered before it is still transferred and audited.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::audit::{AuditBatch, AuditLogger, DatasetAuditSink};
use super::kinds::{KindRegistry, ResourceKind, TransferScope};
use super::paginator;
use super::progress::{ProgressReporter, TracingProgressReporter};
use super::types::{
    ItemOutcome, KindReport, MigrationSummary, PrincipalId, ResourceRef, TransferContext,
    TransferOutcome,
};
use crate::services::client::{accounts, Transport};
use crate::services::config::{ExecutionMode, MigrationConfig};
use crate::services::errors::{MigrationError, MigrationResult};

const DEFAULT_UNSUPPORTED_NOTE: &str = "Ownership transfer is not supported for this kind";
const CANCELLED_NOTE: &str = "Cancelled before transfer";

pub struct MigrationOrchestrator {
    transport: Arc<dyn Transport>,
    registry: KindRegistry,
    audit: AuditLogger,
    config: MigrationConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl MigrationOrchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: KindRegistry,
        audit: AuditLogger,
        config: MigrationConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            audit,
            config,
            reporter: Arc::new(TracingProgressReporter),
        }
    }

    /// Standard kinds, auditing into the configured dataset
    pub fn from_config(transport: Arc<dyn Transport>, config: MigrationConfig) -> MigrationResult<Self> {
        config.validate()?;
        let registry = KindRegistry::standard()?;
        let sink = DatasetAuditSink::new(transport.clone(), &config.datasets.audit_log_dataset_id);
        Ok(Self::new(transport, registry, AuditLogger::new(Arc::new(sink)), config))
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Reassign everything `source_user_id` owns to `new_owner_id`
    pub async fn transfer_content(
        &self,
        source_user_id: &PrincipalId,
        new_owner_id: &PrincipalId,
    ) -> MigrationResult<MigrationSummary> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.transfer_content_with_cancel(source_user_id, new_owner_id, cancel_rx)
            .await
    }

    /// As [`transfer_content`](Self::transfer_content), stopping between kinds
    /// and between pages once `cancel` reads `true`
    #[instrument(skip(self, cancel), fields(source = %source_user_id, new_owner = %new_owner_id))]
    pub async fn transfer_content_with_cancel(
        &self,
        source_user_id: &PrincipalId,
        new_owner_id: &PrincipalId,
        cancel: watch::Receiver<bool>,
    ) -> MigrationResult<MigrationSummary> {
        validate_principal("source_user_id", source_user_id)?;
        validate_principal("new_owner_id", new_owner_id)?;

        let ctx = self.build_context(source_user_id, new_owner_id).await;
        self.reporter.run_started(&ctx, self.registry.len());

        let kinds = match self.config.execution {
            ExecutionMode::Sequential => {
                let mut reports = Vec::with_capacity(self.registry.len());
                for kind in self.registry.iter() {
                    reports.push(self.run_kind(kind.as_ref(), &ctx, &cancel).await);
                }
                reports
            }
            ExecutionMode::Concurrent { max_kinds } => {
                let ctx = &ctx;
                let cancel = &cancel;
                let mut reports: Vec<(usize, KindReport)> = stream::iter(self.registry.iter().enumerate())
                    .map(|(index, kind)| async move { (index, self.run_kind(kind.as_ref(), ctx, cancel).await) })
                    .buffer_unordered(max_kinds.max(1))
                    .collect()
                    .await;
                reports.sort_by_key(|(index, _)| *index);
                reports.into_iter().map(|(_, report)| report).collect()
            }
        };

        let summary = MigrationSummary {
            source_user_id: source_user_id.clone(),
            new_owner_id: new_owner_id.clone(),
            cancelled: kinds.iter().any(|report| report.cancelled),
            kinds,
            audit: self.audit.stats(),
        };
        self.reporter.run_finished(&summary);
        Ok(summary)
    }

    /// Revoke the source's sessions and delete it, but only after a run that
    /// left nothing behind. Returns whether the account was deleted.
    #[instrument(skip_all, fields(source = %summary.source_user_id))]
    pub async fn delete_source_if_complete(&self, summary: &MigrationSummary) -> MigrationResult<bool> {
        if !summary.is_complete() {
            warn!(
                failed_kinds = ?summary.failed_kinds(),
                failed_transfers = summary.total_failed(),
                cancelled = summary.cancelled,
                "Source still owns content; not deleting it"
            );
            return Ok(false);
        }

        let source = &summary.source_user_id;
        accounts::revoke_sessions(self.transport.as_ref(), source).await?;
        accounts::delete_user(self.transport.as_ref(), source).await?;
        Ok(true)
    }

    async fn build_context(&self, source: &PrincipalId, new_owner: &PrincipalId) -> TransferContext {
        let source_display_name = match accounts::fetch_display_name(self.transport.as_ref(), source).await {
            Ok(Some(name)) => name,
            Ok(None) => source.to_string(),
            Err(e) => {
                warn!(error = %e, "Display name lookup failed; tagging with the user id");
                source.to_string()
            }
        };

        TransferContext {
            source_user_id: source.clone(),
            new_owner_id: new_owner.clone(),
            source_display_name,
            scheduled_reports_dataset_id: self.config.datasets.scheduled_reports_dataset_id.clone(),
        }
    }

    /// Enumerate, transfer and audit one kind. Never fails: problems land in the report.
    #[instrument(skip_all, fields(kind = %kind.tag()))]
    async fn run_kind(
        &self,
        kind: &dyn ResourceKind,
        ctx: &TransferContext,
        cancel: &watch::Receiver<bool>,
    ) -> KindReport {
        let tag = kind.tag();
        let mut report = KindReport::new(tag);
        if *cancel.borrow() {
            report.cancelled = true;
            info!("Cancelled before start");
            return report;
        }

        self.reporter.kind_started(tag);
        let mut batch = self.audit.batch(&ctx.source_user_id, &ctx.new_owner_id, tag);
        let mut deferred: Vec<ResourceRef> = Vec::new();

        let transport = self.transport.as_ref();
        let pages = paginator::pages(kind.page_size(), |cursor| kind.list_page(transport, ctx, cursor));
        futures::pin_mut!(pages);

        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    debug!(page = page.cursor.page_index(), items = page.items.len(), "Listed page");
                    report.discovered += page.items.len();
                    match kind.scope() {
                        TransferScope::PerPage => {
                            self.transfer_items(kind, ctx, page.items, &mut batch, &mut report)
                                .await
                        }
                        TransferScope::FullResultSet => deferred.extend(page.items),
                    }
                }
                Err(e) => {
                    error!(
                        discovered = report.discovered,
                        temporary = e.is_temporary(),
                        error = %e,
                        "Listing failed; transferring what was discovered"
                    );
                    report.enumeration_error = Some(e.to_string());
                    break;
                }
            }

            if *cancel.borrow() {
                report.cancelled = true;
                info!(discovered = report.discovered, "Cancelled between pages");
                break;
            }
        }

        if report.cancelled {
            let outcomes: Vec<ItemOutcome> = deferred
                .into_iter()
                .map(|item| ItemOutcome::new(item, TransferOutcome::not_transferred(CANCELLED_NOTE)))
                .collect();
            self.record(&outcomes, &mut batch, &mut report).await;
        } else {
            self.transfer_items(kind, ctx, deferred, &mut batch, &mut report)
                .await;
        }

        batch.finish().await;
        self.reporter.kind_finished(&report);
        report
    }

    async fn transfer_items(
        &self,
        kind: &dyn ResourceKind,
        ctx: &TransferContext,
        items: Vec<ResourceRef>,
        batch: &mut AuditBatch<'_>,
        report: &mut KindReport,
    ) {
        if items.is_empty() {
            return;
        }

        let outcomes = if kind.supports_transfer() {
            kind.transfer(
                self.transport.as_ref(),
                ctx,
                items,
                self.config.concurrency.max_concurrent_transfers,
            )
            .await
        } else {
            let note = kind.unsupported_note().unwrap_or(DEFAULT_UNSUPPORTED_NOTE);
            items
                .into_iter()
                .map(|item| ItemOutcome::new(item, TransferOutcome::not_transferred(note)))
                .collect()
        };

        self.record(&outcomes, batch, report).await;
    }

    async fn record(&self, outcomes: &[ItemOutcome], batch: &mut AuditBatch<'_>, report: &mut KindReport) {
        for item in outcomes {
            report.count(&item.outcome);
        }
        batch.record_outcomes(outcomes).await;
    }
}

/// Ids are interpolated into paths and query text, so only a conservative
/// character set is accepted
fn validate_principal(field: &str, id: &PrincipalId) -> MigrationResult<()> {
    let raw = id.as_str();
    if raw.is_empty() {
        return Err(MigrationError::Validation {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if let Some(c) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-')))
    {
        return Err(MigrationError::Validation {
            field: field.to_string(),
            message: format!("unsupported character {:?}", c),
        });
    }

    Ok(())
}
