//! Best-effort, append-only audit trail of every transfer attempt.
//!
//! Lines accumulate per kind in an [`AuditBatch`] and are appended to the
//! sink fifty at a time. A failed append is logged and counted, never raised.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::types::{AuditRecord, AuditStats, ItemOutcome, KindTag, PrincipalId, TransferStatus};
use crate::services::client::{HttpMethod, RequestBody, Transport};
use crate::services::errors::{MigrationError, MigrationResult};

/// Records per append call
pub const AUDIT_BATCH_SIZE: usize = 50;

/// Durable destination for audit lines
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append pre-serialized CSV lines in order, as one remote call
    async fn append(&self, lines: &[String]) -> MigrationResult<()>;
}

/// Appends to a platform dataset through its data upload endpoint
pub struct DatasetAuditSink {
    transport: Arc<dyn Transport>,
    dataset_id: String,
}

impl DatasetAuditSink {
    pub fn new(transport: Arc<dyn Transport>, dataset_id: &str) -> Self {
        Self {
            transport,
            dataset_id: dataset_id.to_string(),
        }
    }
}

#[async_trait]
impl AuditSink for DatasetAuditSink {
    async fn append(&self, lines: &[String]) -> MigrationResult<()> {
        let path = format!(
            "/api/data/v1/datasources/{}/data?updateMethod=APPEND",
            self.dataset_id
        );
        let mut csv = lines.join("\n");
        csv.push('\n');

        self.transport
            .request_once(HttpMethod::Put, &path, Some(&RequestBody::Csv(csv)))
            .await
            .map_err(|e| MigrationError::AuditWrite {
                records: lines.len(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AuditCounters {
    batches_written: AtomicU64,
    records_written: AtomicU64,
    batches_dropped: AtomicU64,
    records_dropped: AtomicU64,
}

/// Shared by every kind of a run; each kind records through its own batch
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    counters: AuditCounters,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            counters: AuditCounters::default(),
        }
    }

    /// Start buffering records for one kind of one run
    pub fn batch(
        &self,
        source_user_id: &PrincipalId,
        new_owner_id: &PrincipalId,
        kind: KindTag,
    ) -> AuditBatch<'_> {
        AuditBatch {
            logger: self,
            source_user_id: source_user_id.clone(),
            new_owner_id: new_owner_id.clone(),
            kind,
            pending: Vec::with_capacity(AUDIT_BATCH_SIZE),
        }
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            batches_written: self.counters.batches_written.load(Ordering::Relaxed),
            records_written: self.counters.records_written.load(Ordering::Relaxed),
            batches_dropped: self.counters.batches_dropped.load(Ordering::Relaxed),
            records_dropped: self.counters.records_dropped.load(Ordering::Relaxed),
        }
    }

    async fn flush(&self, kind: KindTag, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }

        let count = lines.len() as u64;
        match self.sink.append(&lines).await {
            Ok(()) => {
                self.counters.batches_written.fetch_add(1, Ordering::Relaxed);
                self.counters.records_written.fetch_add(count, Ordering::Relaxed);
                debug!(kind = %kind, records = count, "Audit batch appended");
            }
            Err(e) => {
                self.counters.batches_dropped.fetch_add(1, Ordering::Relaxed);
                self.counters.records_dropped.fetch_add(count, Ordering::Relaxed);
                error!(kind = %kind, records = count, error = %e, "Audit batch dropped");
            }
        }
    }
}

/// Pending audit lines of one kind. Call [`AuditBatch::finish`] to flush the tail.
pub struct AuditBatch<'a> {
    logger: &'a AuditLogger,
    source_user_id: PrincipalId,
    new_owner_id: PrincipalId,
    kind: KindTag,
    pending: Vec<String>,
}

impl AuditBatch<'_> {
    /// One record per resource id, all with the same status and note
    pub async fn record(&mut self, resource_ids: &[String], status: TransferStatus, notes: Option<&str>) {
        let timestamp = Utc::now();
        for id in resource_ids {
            let record = AuditRecord {
                source_user_id: self.source_user_id.clone(),
                new_owner_id: self.new_owner_id.clone(),
                kind: self.kind,
                resource_id: id.clone(),
                timestamp,
                status,
                notes: notes.map(str::to_string),
            };
            self.push(record.to_csv_line()).await;
        }
    }

    /// One record per outcome, in the order given
    pub async fn record_outcomes(&mut self, outcomes: &[ItemOutcome]) {
        for item in outcomes {
            self.record(
                std::slice::from_ref(&item.resource.id),
                item.outcome.status,
                item.outcome.note.as_deref(),
            )
            .await;
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Flush whatever is left
    pub async fn finish(mut self) {
        let lines = std::mem::take(&mut self.pending);
        self.logger.flush(self.kind, lines).await;
    }

    async fn push(&mut self, line: String) {
        self.pending.push(line);
        if self.pending.len() >= AUDIT_BATCH_SIZE {
            let lines = std::mem::replace(&mut self.pending, Vec::with_capacity(AUDIT_BATCH_SIZE));
            self.logger.flush(self.kind, lines).await;
        }
    }
}

impl Drop for AuditBatch<'_> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                kind = %self.kind,
                records = self.pending.len(),
                "Audit batch dropped before it was flushed"
            );
        }
    }
}
