//! End-to-end runs of the orchestrator against an in-memory platform

mod helpers;

use async_trait::async_trait;
use helpers::*;
use migrator::migration::{
    Cursor, ItemOutcome, KindRegistry, KindTag, PrincipalId, ResourceKind, ResourceRef,
    TransferContext,
};
use migrator::services::client::{HttpMethod, Transport};
use migrator::services::config::ExecutionMode;
use migrator::{MigrationError, MigrationResult};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{}{}", prefix, i)).collect()
}

fn audited_ids(lines: &[String]) -> Vec<String> {
    lines.iter().map(|line| fields(line)[3].to_string()).collect()
}

#[tokio::test]
async fn test_two_datasets_are_reassigned_and_audited() {
    let platform = MockPlatform::new();
    platform.respond(
        HttpMethod::Post,
        "/api/data/ui/v3/datasources/search",
        json!({ "dataSources": [{ "id": "D1" }, { "id": "D2" }] }),
    );

    let summary = standard_orchestrator(&platform)
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    for id in ["D1", "D2"] {
        let path = format!("/api/data/v3/datasources/{}/responsibleUser", id);
        let puts = platform.calls_to(HttpMethod::Put, &path);
        assert_eq!(puts.len(), 1, "{}", path);
        assert_eq!(puts[0].json(), Some(&json!({ "responsibleUserId": 99 })));
    }

    let lines = platform.audit_lines();
    assert_eq!(lines.len(), 2);
    for (line, id) in lines.iter().zip(["D1", "D2"]) {
        let row = fields(line);
        assert_eq!(row.len(), 7, "{}", line);
        assert_eq!(&row[..4], &["42", "99", "DATASET", id]);
        assert!(row[4].ends_with('Z'));
        assert_eq!(row[5], "TRANSFERRED");
        assert_eq!(row[6], "");
    }

    let report = summary.report(KindTag::Dataset).unwrap();
    assert_eq!((report.discovered, report.transferred), (2, 2));
    assert_eq!(summary.total_transferred(), 2);
    assert_eq!(summary.kinds.len(), 25);
    assert!(summary.is_complete());
    assert_eq!(summary.audit.records_written, 2);
}

#[tokio::test]
async fn test_dataset_provenance_tag_uses_display_name() {
    let platform = MockPlatform::new();
    platform.respond(
        HttpMethod::Get,
        "/api/content/v2/users/42",
        json!({ "id": 42, "displayName": "Ada Lovelace" }),
    );
    platform.respond(
        HttpMethod::Post,
        "/api/data/ui/v3/datasources/search",
        json!({ "dataSources": [{ "id": "D1" }] }),
    );
    platform.respond(
        HttpMethod::Get,
        "/api/data/ui/v3/datasources/D1/tags",
        json!(["finance", "From Grace Hopper"]),
    );

    standard_orchestrator(&platform)
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let writes = platform.calls_to(HttpMethod::Post, "/api/data/ui/v3/datasources/D1/tags");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].json(), Some(&json!(["finance", "From Ada Lovelace"])));
}

#[tokio::test]
async fn test_publication_is_listed_but_never_mutated() {
    let platform = MockPlatform::new();
    platform.respond(
        HttpMethod::Get,
        "/api/publish/v2/publications/summaries",
        json!([{ "id": "P1" }]),
    );

    let summary = standard_orchestrator(&platform)
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let lines = platform.audit_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("42,99,PUBLICATION,P1,"));
    assert!(lines[0].contains(",NOT_TRANSFERRED,"));
    assert!(!lines[0].ends_with(",NOT_TRANSFERRED,"));

    let touches_p1 = platform
        .calls()
        .into_iter()
        .filter(|call| !call.is_audit_append())
        .any(|call| {
            call.path.contains("P1")
                || call.json().map_or(false, |body| body.to_string().contains("P1"))
        });
    assert!(!touches_p1);

    let report = summary.report(KindTag::Publication).unwrap();
    assert_eq!((report.transferred, report.not_transferred), (0, 1));
}

#[tokio::test]
async fn test_failing_audit_log_never_blocks_migration() {
    let platform = MockPlatform::new();
    platform.fail(HttpMethod::Put, AUDIT_PATH, 503);
    platform.respond(
        HttpMethod::Post,
        "/api/data/ui/v3/datasources/search",
        json!({ "dataSources": [{ "id": "D1" }, { "id": "D2" }] }),
    );
    platform.respond(HttpMethod::Get, "/api/social/v4/alerts", json!([{ "id": 5 }]));

    let summary = standard_orchestrator(&platform)
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    assert_eq!(
        platform
            .calls_to(HttpMethod::Put, "/api/data/v3/datasources/")
            .len(),
        2
    );
    let patches = platform.calls_to(HttpMethod::Patch, "/api/social/v4/alerts/5");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].json(), Some(&json!({ "owner": 99 })));

    assert_eq!(summary.total_transferred(), 3);
    assert_eq!(summary.audit.records_written, 0);
    assert_eq!(summary.audit.records_dropped, 3);
    assert_eq!(summary.audit.batches_dropped, 2);
}

fn three_kinds() -> KindRegistry {
    KindRegistry::new()
        .with(Arc::new(simple_kind(
            KindTag::Goal,
            20,
            "/api/goals?owner={sourceUserId}&limit={limit}&offset={offset}",
            "/api/goals/{id}",
        )))
        .unwrap()
        .with(Arc::new(simple_kind(
            KindTag::Alert,
            20,
            "/api/alerts?owner={sourceUserId}&limit={limit}&offset={offset}",
            "/api/alerts/{id}",
        )))
        .unwrap()
        .with(Arc::new(simple_kind(
            KindTag::Project,
            20,
            "/api/projects?owner={sourceUserId}&limit={limit}&offset={offset}",
            "/api/projects/{id}",
        )))
        .unwrap()
}

#[tokio::test]
async fn test_one_kind_failing_does_not_stop_the_others() {
    let platform = MockPlatform::new();
    platform.on(HttpMethod::Get, "/api/goals", paged_ids("g", 3));
    platform.fail(HttpMethod::Get, "/api/alerts", 500);
    platform.on(HttpMethod::Get, "/api/projects", paged_ids("p", 2));

    let summary = orchestrator_with(&platform, three_kinds(), config())
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    assert_eq!(platform.calls_to(HttpMethod::Put, "/api/goals/").len(), 3);
    assert_eq!(platform.calls_to(HttpMethod::Put, "/api/projects/").len(), 2);
    assert_eq!(audited_ids(&platform.audit_lines()), vec!["g0", "g1", "g2", "p0", "p1"]);

    assert_eq!(summary.failed_kinds(), vec![KindTag::Alert]);
    let alert = summary.report(KindTag::Alert).unwrap();
    assert!(alert.enumeration_error.as_deref().unwrap().contains("ALERT"));
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn test_items_found_before_a_listing_failure_are_still_transferred() {
    let platform = MockPlatform::new();
    let pages = paged_ids("g", 10);
    platform.on(HttpMethod::Get, "/api/goals", move |call| {
        if call.query("offset") == Some(2) {
            Err(failure(call, 502))
        } else {
            pages(call)
        }
    });

    let kind = simple_kind(
        KindTag::Goal,
        2,
        "/api/goals?owner={sourceUserId}&limit={limit}&offset={offset}",
        "/api/goals/{id}",
    )
    .full_result_set();
    let registry = KindRegistry::new().with(Arc::new(kind)).unwrap();

    let summary = orchestrator_with(&platform, registry, config())
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let report = summary.report(KindTag::Goal).unwrap();
    assert_eq!((report.discovered, report.transferred), (2, 2));
    assert!(report.enumeration_error.as_deref().unwrap().contains("offset 2"));
    assert_eq!(audited_ids(&platform.audit_lines()), vec!["g0", "g1"]);
}

#[tokio::test]
async fn test_audit_flushes_in_batches_of_fifty_in_discovery_order() {
    let platform = MockPlatform::new();
    platform.on(HttpMethod::Get, "/api/cards", paged_ids("c", 125));
    let registry = KindRegistry::new()
        .with(Arc::new(simple_kind(
            KindTag::Card,
            50,
            "/api/cards?limit={limit}&offset={offset}",
            "/api/cards/{id}",
        )))
        .unwrap();

    orchestrator_with(&platform, registry, config())
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let appends = platform.audit_appends();
    let sizes: Vec<usize> = appends.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![50, 50, 25]);
    assert_eq!(audited_ids(&platform.audit_lines()), ids("c", 0..125));
    assert_eq!(platform.calls_to(HttpMethod::Get, "/api/cards").len(), 3);
}

#[tokio::test]
async fn test_cancelled_before_start_touches_nothing() {
    let platform = MockPlatform::new();
    let (_tx, rx) = watch::channel(true);

    let summary = standard_orchestrator(&platform)
        .transfer_content_with_cancel(&PrincipalId::from(42), &PrincipalId::from(99), rx)
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert!(summary.kinds.iter().all(|report| report.cancelled));
    assert!(platform.audit_appends().is_empty());
    assert!(platform
        .calls()
        .iter()
        .all(|call| call.path.starts_with("/api/content/v2/users/42")));
}

#[tokio::test]
async fn test_cancel_between_pages_flushes_what_was_done() {
    let platform = MockPlatform::new();
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);
    let pages = paged_ids("c", 5);
    platform.on(HttpMethod::Get, "/api/cards", move |call| {
        let _ = tx.send(true);
        pages(call)
    });

    let registry = KindRegistry::new()
        .with(Arc::new(simple_kind(
            KindTag::Card,
            2,
            "/api/cards?limit={limit}&offset={offset}",
            "/api/cards/{id}",
        )))
        .unwrap()
        .with(Arc::new(simple_kind(
            KindTag::Goal,
            20,
            "/api/goals?limit={limit}&offset={offset}",
            "/api/goals/{id}",
        )))
        .unwrap();

    let summary = orchestrator_with(&platform, registry, config())
        .transfer_content_with_cancel(&PrincipalId::from(42), &PrincipalId::from(99), rx)
        .await
        .unwrap();

    assert!(summary.cancelled);
    let cards = summary.report(KindTag::Card).unwrap();
    assert!(cards.cancelled);
    assert_eq!((cards.discovered, cards.transferred), (2, 2));
    assert_eq!(audited_ids(&platform.audit_lines()), vec!["c0", "c1"]);

    assert!(summary.report(KindTag::Goal).unwrap().cancelled);
    assert!(platform.calls_to(HttpMethod::Get, "/api/goals").is_empty());
    assert_eq!(platform.calls_to(HttpMethod::Get, "/api/cards").len(), 1);
}

#[tokio::test]
async fn test_cancel_during_a_full_listing_audits_what_was_seen() {
    let platform = MockPlatform::new();
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);
    let pages = paged_ids("g", 5);
    platform.on(HttpMethod::Get, "/api/goals", move |call| {
        let _ = tx.send(true);
        pages(call)
    });

    let kind = simple_kind(
        KindTag::Goal,
        2,
        "/api/goals?limit={limit}&offset={offset}",
        "/api/goals/{id}",
    )
    .full_result_set();
    let registry = KindRegistry::new().with(Arc::new(kind)).unwrap();

    let summary = orchestrator_with(&platform, registry, config())
        .transfer_content_with_cancel(&PrincipalId::from(42), &PrincipalId::from(99), rx)
        .await
        .unwrap();

    let goals = summary.report(KindTag::Goal).unwrap();
    assert!(goals.cancelled);
    assert_eq!((goals.discovered, goals.transferred, goals.not_transferred), (2, 0, 2));
    assert!(platform.calls_to(HttpMethod::Put, "/api/goals/").is_empty());

    let lines = platform.audit_lines();
    assert_eq!(audited_ids(&lines), vec!["g0", "g1"]);
    assert!(lines
        .iter()
        .all(|line| line.ends_with(",NOT_TRANSFERRED,Cancelled before transfer")));
}

#[tokio::test]
async fn test_concurrent_kinds_report_in_registry_order() {
    let platform = MockPlatform::new();
    platform.respond(
        HttpMethod::Post,
        "/api/data/ui/v3/datasources/search",
        json!({ "dataSources": [{ "id": "D1" }, { "id": "D2" }] }),
    );
    platform.respond(HttpMethod::Get, "/api/workflow/v1/models", json!([{ "id": "wf" }]));
    let config = config().with_execution(ExecutionMode::Concurrent { max_kinds: 6 });

    let summary = migrator::MigrationOrchestrator::from_config(platform.clone(), config)
        .unwrap()
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let order: Vec<KindTag> = summary.kinds.iter().map(|report| report.kind).collect();
    assert_eq!(order, KindTag::ALL.to_vec());
    assert_eq!(summary.total_transferred(), 3);

    // Each kind flushes its own batch
    let appends = platform.audit_appends();
    assert_eq!(appends.len(), 2);
    for append in appends {
        let kinds: std::collections::HashSet<&str> =
            append.iter().map(|line| fields(line)[2]).collect();
        assert_eq!(kinds.len(), 1);
    }
}

#[tokio::test]
async fn test_self_transfer_keeps_the_owner() {
    let platform = MockPlatform::new();
    platform.respond(
        HttpMethod::Post,
        "/api/search/v1/query",
        json!({ "searchObjects": [{ "databaseId": 7 }] }),
    );

    let summary = standard_orchestrator(&platform)
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(42))
        .await
        .unwrap();

    let added = platform.calls_to(HttpMethod::Post, "/api/content/v1/cards/owners/add");
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].json().unwrap()["cardIds"], json!([7]));
    assert!(platform
        .calls_to(HttpMethod::Post, "/api/content/v1/cards/owners/remove")
        .is_empty());
    assert_eq!(summary.report(KindTag::Card).unwrap().transferred, 1);
}

#[tokio::test]
async fn test_invalid_principals_are_rejected_up_front() {
    let platform = MockPlatform::new();
    let orchestrator = standard_orchestrator(&platform);

    let err = orchestrator
        .transfer_content(&PrincipalId::from(""), &PrincipalId::from(99))
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::Validation { .. }));

    let err = orchestrator
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from("99/../admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::Validation { .. }));
    assert!(platform.calls().is_empty());
}

/// Listing-only kind that must never reach `transfer`
struct ListOnlyKind;

#[async_trait]
impl ResourceKind for ListOnlyKind {
    fn tag(&self) -> KindTag {
        KindTag::Publication
    }

    fn page_size(&self) -> usize {
        20
    }

    fn unsupported_note(&self) -> Option<&str> {
        Some("successor must co-own the published content")
    }

    async fn list_page(
        &self,
        _transport: &dyn Transport,
        _ctx: &TransferContext,
        cursor: Cursor,
    ) -> MigrationResult<Vec<ResourceRef>> {
        if cursor.offset == 0 {
            Ok(vec![ResourceRef::new(KindTag::Publication, "P9")])
        } else {
            Ok(Vec::new())
        }
    }

    async fn transfer(
        &self,
        _transport: &dyn Transport,
        _ctx: &TransferContext,
        _items: Vec<ResourceRef>,
        _max_concurrent: usize,
    ) -> Vec<ItemOutcome> {
        panic!("unsupported kinds are never handed to transfer")
    }
}

#[tokio::test]
async fn test_unsupported_kinds_are_audited_by_the_orchestrator() {
    let platform = MockPlatform::new();
    let registry = KindRegistry::new().with(Arc::new(ListOnlyKind)).unwrap();

    let summary = orchestrator_with(&platform, registry, config())
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let lines = platform.audit_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(",NOT_TRANSFERRED,successor must co-own the published content"));
    assert_eq!(summary.total_not_transferred(), 1);
}

fn goals_only() -> KindRegistry {
    KindRegistry::new()
        .with(Arc::new(simple_kind(
            KindTag::Goal,
            20,
            "/api/goals?owner={sourceUserId}&limit={limit}&offset={offset}",
            "/api/goals/{id}",
        )))
        .unwrap()
}

#[tokio::test]
async fn test_failed_transfers_keep_the_source_account() {
    let platform = MockPlatform::new();
    platform.on(HttpMethod::Get, "/api/goals", paged_ids("g", 3));
    platform.fail(HttpMethod::Put, "/api/goals/", 400);
    let orchestrator = orchestrator_with(&platform, goals_only(), config());

    let summary = orchestrator
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    let goals = summary.report(KindTag::Goal).unwrap();
    assert_eq!((goals.not_transferred, goals.failed), (3, 3));
    assert!(goals.enumeration_error.is_none());
    assert!(!summary.is_complete());

    assert!(!orchestrator.delete_source_if_complete(&summary).await.unwrap());
    assert!(platform.calls_to(HttpMethod::Delete, "/api/identity").is_empty());
}

#[tokio::test]
async fn test_skipped_items_do_not_block_source_deletion() {
    let platform = MockPlatform::new();
    platform.on(HttpMethod::Get, "/api/goals", paged_ids("g", 2));
    let registry = goals_only().with(Arc::new(ListOnlyKind)).unwrap();
    let orchestrator = orchestrator_with(&platform, registry, config());

    let summary = orchestrator
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();

    assert_eq!(summary.total_not_transferred(), 1);
    assert_eq!(summary.total_failed(), 0);
    assert!(summary.is_complete());

    assert!(orchestrator.delete_source_if_complete(&summary).await.unwrap());
    let deletes: Vec<String> = platform
        .calls_to(HttpMethod::Delete, "/api/identity")
        .into_iter()
        .map(|call| call.path)
        .collect();
    assert_eq!(
        deletes,
        vec!["/api/identity/v1/users/42/sessions", "/api/identity/v1/users/42"]
    );
}
