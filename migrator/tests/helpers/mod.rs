//! Shared fixtures: an in-memory platform that records every request.

#![allow(dead_code)]

use async_trait::async_trait;
use migrator::migration::kinds::{
    DeclarativeKind, ItemsSelector, RequestTemplate, TransferPlan, TransferStep,
};
use migrator::migration::{AuditLogger, DatasetAuditSink, KindRegistry, KindTag, MigrationOrchestrator};
use migrator::services::client::{ClientError, ClientResult, HttpMethod, RequestBody, Transport};
use migrator::services::config::MigrationConfig;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const AUDIT_DATASET: &str = "audit-ds";
pub const REPORTS_DATASET: &str = "reports-ds";
pub const AUDIT_PATH: &str = "/api/data/v1/datasources/audit-ds/data";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<RequestBody>,
}

impl RecordedCall {
    pub fn json(&self) -> Option<&Value> {
        self.body.as_ref().and_then(RequestBody::as_json)
    }

    pub fn is_audit_append(&self) -> bool {
        self.method == HttpMethod::Put && self.path.starts_with(AUDIT_PATH)
    }

    /// Value of a query string parameter
    pub fn query(&self, name: &str) -> Option<usize> {
        let (_, query) = self.path.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value.parse().ok())
    }
}

type Handler = Box<dyn Fn(&RecordedCall) -> ClientResult<Value> + Send + Sync>;

/// Requests are answered by the most recently registered rule whose method
/// matches and whose path prefix matches; anything else gets `null`.
#[derive(Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<RecordedCall>>,
    rules: Mutex<Vec<(HttpMethod, String, Arc<Handler>)>>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(
        &self,
        method: HttpMethod,
        prefix: &str,
        handler: impl Fn(&RecordedCall) -> ClientResult<Value> + Send + Sync + 'static,
    ) {
        self.rules
            .lock()
            .unwrap()
            .push((method, prefix.to_string(), Arc::new(Box::new(handler) as Handler)));
    }

    pub fn respond(&self, method: HttpMethod, prefix: &str, value: Value) {
        self.on(method, prefix, move |_| Ok(value.clone()));
    }

    pub fn fail(&self, method: HttpMethod, prefix: &str, status: u16) {
        self.on(method, prefix, move |call| Err(failure(call, status)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: HttpMethod, prefix: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.path.starts_with(prefix))
            .collect()
    }

    /// CSV lines of every audit append, one inner vector per append call
    pub fn audit_appends(&self) -> Vec<Vec<String>> {
        self.calls()
            .iter()
            .filter(|call| call.is_audit_append())
            .filter_map(|call| call.body.as_ref().and_then(RequestBody::as_csv))
            .map(|csv| csv.lines().map(str::to_string).collect())
            .collect()
    }

    pub fn audit_lines(&self) -> Vec<String> {
        self.audit_appends().into_iter().flatten().collect()
    }
}

pub fn failure(call: &RecordedCall, status: u16) -> ClientError {
    ClientError::RequestFailed {
        method: call.method,
        path: call.path.clone(),
        status,
        body: "simulated failure".to_string(),
    }
}

#[async_trait]
impl Transport for MockPlatform {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> ClientResult<Value> {
        let call = RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        };
        self.calls.lock().unwrap().push(call.clone());

        let handler = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(rule_method, prefix, _)| *rule_method == method && path.starts_with(prefix.as_str()))
            .map(|(_, _, handler)| handler.clone());

        match handler {
            Some(handler) => (handler.as_ref())(&call),
            None => Ok(Value::Null),
        }
    }
}

pub fn config() -> MigrationConfig {
    MigrationConfig::new(AUDIT_DATASET, REPORTS_DATASET)
}

/// Orchestrator over the standard catalog
pub fn standard_orchestrator(platform: &Arc<MockPlatform>) -> MigrationOrchestrator {
    MigrationOrchestrator::from_config(platform.clone(), config()).unwrap()
}

/// Orchestrator over a custom registry, auditing into the mock platform
pub fn orchestrator_with(
    platform: &Arc<MockPlatform>,
    registry: KindRegistry,
    config: MigrationConfig,
) -> MigrationOrchestrator {
    let sink = DatasetAuditSink::new(platform.clone(), AUDIT_DATASET);
    MigrationOrchestrator::new(platform.clone(), registry, AuditLogger::new(Arc::new(sink)), config)
}

/// A root-array listing with a single per-item owner PUT
pub fn simple_kind(
    tag: KindTag,
    page_size: usize,
    list: &'static str,
    transfer: &'static str,
) -> DeclarativeKind {
    DeclarativeKind::new(
        tag,
        page_size,
        RequestTemplate::get(list),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            transfer,
            json!({ "owner": "{newOwnerId}" }),
        ))]),
    )
}

/// Listing handler serving `total` ids named `{prefix}{n}` by offset and limit
pub fn paged_ids(
    prefix: &'static str,
    total: usize,
) -> impl Fn(&RecordedCall) -> ClientResult<Value> + Send + Sync + 'static {
    move |call: &RecordedCall| {
        let offset = call.query("offset").unwrap_or(0);
        let limit = call.query("limit").unwrap_or(50);
        let end = (offset + limit).min(total);
        let items: Vec<Value> = (offset.min(total)..end)
            .map(|i| json!({ "id": format!("{}{}", prefix, i) }))
            .collect();
        Ok(Value::Array(items))
    }
}

/// Fields of one audit CSV line that contains no quoted commas
pub fn fields(line: &str) -> Vec<&str> {
    line.split(',').collect()
}
