//! Re-running a transfer against a stateful backend converges instead of drifting

mod helpers;

use helpers::*;
use migrator::migration::{KindRegistry, KindTag, PrincipalId, ResourceRef, TransferContext};
use migrator::services::client::HttpMethod;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
struct Dataset {
    owner: i64,
    tags: Vec<String>,
}

type Store = Arc<Mutex<BTreeMap<String, Dataset>>>;

fn dataset_id(call_path: &str) -> String {
    call_path
        .trim_start_matches("/api/data/v3/datasources/")
        .trim_start_matches("/api/data/ui/v3/datasources/")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Wire a dataset backend holding `count` datasets owned by user 42
fn dataset_backend(platform: &Arc<MockPlatform>, count: usize) -> Store {
    let store: Store = Arc::new(Mutex::new(
        (0..count)
            .map(|i| {
                (
                    format!("DS{:03}", i),
                    Dataset {
                        owner: 42,
                        tags: vec!["finance".to_string()],
                    },
                )
            })
            .collect(),
    ));

    let search = store.clone();
    platform.on(HttpMethod::Post, "/api/data/ui/v3/datasources/search", move |call| {
        let body = call.json().cloned().unwrap_or(Value::Null);
        let owner = body["filters"][0]["value"].as_i64().unwrap_or_default();
        let offset = body["offset"].as_u64().unwrap_or(0) as usize;
        let count = body["count"].as_u64().unwrap_or(50) as usize;
        let page: Vec<Value> = search
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, dataset)| dataset.owner == owner)
            .skip(offset)
            .take(count)
            .map(|(id, _)| json!({ "id": id }))
            .collect();
        Ok(json!({ "dataSources": page }))
    });

    let owners = store.clone();
    platform.on(HttpMethod::Put, "/api/data/v3/datasources/", move |call| {
        let owner = call.json().and_then(|body| body["responsibleUserId"].as_i64());
        if let (Some(dataset), Some(owner)) =
            (owners.lock().unwrap().get_mut(&dataset_id(&call.path)), owner)
        {
            dataset.owner = owner;
        }
        Ok(Value::Null)
    });

    let read_tags = store.clone();
    platform.on(HttpMethod::Get, "/api/data/ui/v3/datasources/", move |call| {
        let tags = read_tags
            .lock()
            .unwrap()
            .get(&dataset_id(&call.path))
            .map(|dataset| json!(dataset.tags))
            .unwrap_or(Value::Null);
        Ok(tags)
    });

    let write_tags = store.clone();
    platform.on(HttpMethod::Post, "/api/data/ui/v3/datasources/DS", move |call| {
        let tags: Vec<String> = call
            .json()
            .and_then(|body| serde_json::from_value(body.clone()).ok())
            .unwrap_or_default();
        if let Some(dataset) = write_tags.lock().unwrap().get_mut(&dataset_id(&call.path)) {
            dataset.tags = tags;
        }
        Ok(Value::Null)
    });

    store
}

fn context() -> TransferContext {
    TransferContext {
        source_user_id: PrincipalId::from(42),
        new_owner_id: PrincipalId::from(99),
        source_display_name: "Ada Lovelace".to_string(),
        scheduled_reports_dataset_id: REPORTS_DATASET.to_string(),
    }
}

fn tag_writes(platform: &MockPlatform) -> usize {
    platform
        .calls_to(HttpMethod::Post, "/api/data/ui/v3/datasources/DS")
        .len()
}

#[tokio::test]
async fn test_transferring_a_dataset_twice_is_a_no_op() {
    let platform = MockPlatform::new();
    let store = dataset_backend(&platform, 1);
    let registry = KindRegistry::standard().unwrap();
    let kind = registry.get(KindTag::Dataset).unwrap();
    let items = vec![ResourceRef::new(KindTag::Dataset, "DS000")];

    let first = kind.transfer(platform.as_ref(), &context(), items.clone(), 4).await;
    assert!(first[0].outcome.is_transferred());
    let after_first = store.lock().unwrap().clone();

    let second = kind.transfer(platform.as_ref(), &context(), items, 4).await;
    assert!(second[0].outcome.is_transferred());
    let after_second = store.lock().unwrap().clone();

    assert_eq!(after_first, after_second);
    assert_eq!(
        after_second["DS000"],
        Dataset {
            owner: 99,
            tags: vec!["finance".to_string(), "From Ada Lovelace".to_string()],
        }
    );
    // Only the first pass needed to touch the tags
    assert_eq!(tag_writes(&platform), 1);
}

#[tokio::test]
async fn test_second_run_finds_nothing_left_to_move() {
    let platform = MockPlatform::new();
    let store = dataset_backend(&platform, 120);
    let registry = KindRegistry::new()
        .with(KindRegistry::standard().unwrap().get(KindTag::Dataset).unwrap().clone())
        .unwrap();
    let orchestrator = orchestrator_with(&platform, registry, config());

    let first = orchestrator
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();
    let report = first.report(KindTag::Dataset).unwrap();
    assert_eq!((report.discovered, report.transferred), (120, 120));
    assert!(store.lock().unwrap().values().all(|dataset| dataset.owner == 99));
    assert_eq!(platform.audit_lines().len(), 120);

    let second = orchestrator
        .transfer_content(&PrincipalId::from(42), &PrincipalId::from(99))
        .await
        .unwrap();
    let report = second.report(KindTag::Dataset).unwrap();
    assert_eq!((report.discovered, report.transferred), (0, 0));
    assert_eq!(platform.audit_lines().len(), 120);
    assert_eq!(tag_writes(&platform), 120);
}
