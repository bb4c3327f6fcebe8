//! Domain types shared by the paginator, kind handlers, audit logger and orchestrator.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque platform user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// JSON form used in request bodies: numeric ids stay numbers
    pub fn to_json(&self) -> Value {
        scalar_json(&self.0)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for PrincipalId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Numeric-looking identifiers are sent as JSON numbers, everything else as strings
pub(crate) fn scalar_json(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(number) if number.to_string() == raw => Value::from(number),
        _ => Value::String(raw.to_string()),
    }
}

/// Stable kind tags. These are the join key of the audit log and must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KindTag {
    Dataset,
    Dataflow,
    Account,
    BeastModeFormula,
    Card,
    Page,
    DataApp,
    Alert,
    ScheduledReport,
    Publication,
    CustomApp,
    Project,
    Goal,
    Group,
    WorkflowModel,
    TaskCenterQueue,
    TaskCenterTask,
    CodeEnginePackage,
    Approval,
    ApprovalTemplate,
    AiModel,
    AiProject,
    JupyterWorkspace,
    Fileset,
    Repository,
}

impl KindTag {
    /// Every tag, in the order the standard registry runs them
    pub const ALL: [KindTag; 25] = [
        KindTag::Dataset,
        KindTag::Dataflow,
        KindTag::Account,
        KindTag::BeastModeFormula,
        KindTag::Card,
        KindTag::Page,
        KindTag::DataApp,
        KindTag::Alert,
        KindTag::ScheduledReport,
        KindTag::Publication,
        KindTag::CustomApp,
        KindTag::Project,
        KindTag::Goal,
        KindTag::Group,
        KindTag::WorkflowModel,
        KindTag::TaskCenterQueue,
        KindTag::TaskCenterTask,
        KindTag::CodeEnginePackage,
        KindTag::Approval,
        KindTag::ApprovalTemplate,
        KindTag::AiModel,
        KindTag::AiProject,
        KindTag::JupyterWorkspace,
        KindTag::Fileset,
        KindTag::Repository,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KindTag::Dataset => "DATASET",
            KindTag::Dataflow => "DATAFLOW",
            KindTag::Account => "ACCOUNT",
            KindTag::BeastModeFormula => "BEAST_MODE_FORMULA",
            KindTag::Card => "CARD",
            KindTag::Page => "PAGE",
            KindTag::DataApp => "DATA_APP",
            KindTag::Alert => "ALERT",
            KindTag::ScheduledReport => "SCHEDULED_REPORT",
            KindTag::Publication => "PUBLICATION",
            KindTag::CustomApp => "CUSTOM_APP",
            KindTag::Project => "PROJECT",
            KindTag::Goal => "GOAL",
            KindTag::Group => "GROUP",
            KindTag::WorkflowModel => "WORKFLOW_MODEL",
            KindTag::TaskCenterQueue => "TASK_CENTER_QUEUE",
            KindTag::TaskCenterTask => "TASK_CENTER_TASK",
            KindTag::CodeEnginePackage => "CODE_ENGINE_PACKAGE",
            KindTag::Approval => "APPROVAL",
            KindTag::ApprovalTemplate => "APPROVAL_TEMPLATE",
            KindTag::AiModel => "AI_MODEL",
            KindTag::AiProject => "AI_PROJECT",
            KindTag::JupyterWorkspace => "JUPYTER_WORKSPACE",
            KindTag::Fileset => "FILESET",
            KindTag::Repository => "REPOSITORY",
        }
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The minimal identity needed to re-query and mutate one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub id: String,
    pub kind: KindTag,
    /// Enclosing resource for kinds addressed through a parent (tasks live in queues)
    pub parent_id: Option<String>,
    /// Lifecycle state as listed, used by skip rules
    pub state: Option<String>,
}

impl ResourceRef {
    pub fn new(kind: KindTag, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            state: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Transferred,
    NotTransferred,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Transferred => "TRANSFERRED",
            TransferStatus::NotTransferred => "NOT_TRANSFERRED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one transfer attempt, fixed once computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub status: TransferStatus,
    pub note: Option<String>,
    /// A mutation was attempted and rejected, as opposed to a deliberate skip
    pub failed: bool,
}

impl TransferOutcome {
    pub fn transferred() -> Self {
        Self {
            status: TransferStatus::Transferred,
            note: None,
            failed: false,
        }
    }

    /// Left alone on purpose: unsupported kind, skip rule, cancellation
    pub fn not_transferred(note: impl Into<String>) -> Self {
        Self {
            status: TransferStatus::NotTransferred,
            note: Some(note.into()),
            failed: false,
        }
    }

    /// A transfer call failed; the source still owns the resource
    pub fn failed(note: impl Into<String>) -> Self {
        Self {
            failed: true,
            ..Self::not_transferred(note)
        }
    }

    pub fn is_transferred(&self) -> bool {
        self.status == TransferStatus::Transferred
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub resource: ResourceRef,
    pub outcome: TransferOutcome,
}

impl ItemOutcome {
    pub fn new(resource: ResourceRef, outcome: TransferOutcome) -> Self {
        Self { resource, outcome }
    }
}

/// Everything a kind needs to know about the run it is part of
#[derive(Debug, Clone)]
pub struct TransferContext {
    pub source_user_id: PrincipalId,
    pub new_owner_id: PrincipalId,
    /// Used for provenance tags; falls back to the source id
    pub source_display_name: String,
    pub scheduled_reports_dataset_id: String,
}

impl TransferContext {
    /// Reassigning to the source itself: owner-set removals must be skipped
    pub fn is_self_transfer(&self) -> bool {
        self.source_user_id == self.new_owner_id
    }
}

/// One row of the audit log: `userId,newOwnerId,type,id,date,status,notes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub source_user_id: PrincipalId,
    pub new_owner_id: PrincipalId,
    pub kind: KindTag,
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: TransferStatus,
    pub notes: Option<String>,
}

impl AuditRecord {
    pub fn to_csv_line(&self) -> String {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        [
            self.source_user_id.as_str(),
            self.new_owner_id.as_str(),
            self.kind.as_str(),
            self.resource_id.as_str(),
            timestamp.as_str(),
            self.status.as_str(),
            self.notes.as_deref().unwrap_or(""),
        ]
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Per-kind result of one run, for operational logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindReport {
    pub kind: KindTag,
    pub discovered: usize,
    pub transferred: usize,
    pub not_transferred: usize,
    /// Subset of `not_transferred` whose transfer calls failed
    pub failed: usize,
    pub enumeration_error: Option<String>,
    pub cancelled: bool,
}

impl KindReport {
    pub fn new(kind: KindTag) -> Self {
        Self {
            kind,
            discovered: 0,
            transferred: 0,
            not_transferred: 0,
            failed: 0,
            enumeration_error: None,
            cancelled: false,
        }
    }

    pub fn count(&mut self, outcome: &TransferOutcome) {
        match outcome.status {
            TransferStatus::Transferred => self.transferred += 1,
            TransferStatus::NotTransferred => self.not_transferred += 1,
        }
        if outcome.failed {
            self.failed += 1;
        }
    }

    /// Everything was listed and no transfer call failed
    pub fn is_complete(&self) -> bool {
        self.enumeration_error.is_none() && !self.cancelled && self.failed == 0
    }
}

/// Audit counters at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub batches_written: u64,
    pub records_written: u64,
    pub batches_dropped: u64,
    pub records_dropped: u64,
}

/// In-memory summary of one run. The durable output is the audit log.
#[derive(Debug, Clone)]
pub struct MigrationSummary {
    pub source_user_id: PrincipalId,
    pub new_owner_id: PrincipalId,
    /// Registry order
    pub kinds: Vec<KindReport>,
    pub audit: AuditStats,
    pub cancelled: bool,
}

impl MigrationSummary {
    pub fn report(&self, kind: KindTag) -> Option<&KindReport> {
        self.kinds.iter().find(|report| report.kind == kind)
    }

    pub fn failed_kinds(&self) -> Vec<KindTag> {
        self.kinds
            .iter()
            .filter(|report| report.enumeration_error.is_some())
            .map(|report| report.kind)
            .collect()
    }

    pub fn total_transferred(&self) -> usize {
        self.kinds.iter().map(|report| report.transferred).sum()
    }

    pub fn total_not_transferred(&self) -> usize {
        self.kinds.iter().map(|report| report.not_transferred).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.kinds.iter().map(|report| report.failed).sum()
    }

    /// Every kind enumerated to the end, no transfer call failed and nothing
    /// was cancelled
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.kinds.iter().all(KindReport::is_complete)
    }
}
