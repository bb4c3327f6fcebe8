//! The standard platform kinds.
//!
//! Registration order follows [`KindTag::ALL`](crate::migration::types::KindTag::ALL).
//! Owner-filtered listings transfer the full result set, listings backed by a
//! static export transfer page by page.

mod automation;
mod content;
mod data;
mod science;

use serde_json::{json, Value};

use super::declarative::DeclarativeKind;

/// Global search body listing one entity type owned by the source
fn search_query(entity: &str) -> Value {
    json!({
        "count": "{limit}",
        "offset": "{offset}",
        "combineResults": false,
        "query": "*",
        "filters": [{
            "facetType": "user",
            "filterType": "term",
            "field": "owned_by_id",
            "value": "{sourceUserId}"
        }],
        "entityList": [[entity]]
    })
}

pub fn standard_kinds() -> Vec<DeclarativeKind> {
    vec![
        data::dataset(),
        data::dataflow(),
        data::account(),
        data::beast_mode_formula(),
        content::card(),
        content::page(),
        content::data_app(),
        content::alert(),
        content::scheduled_report(),
        content::publication(),
        content::custom_app(),
        content::project(),
        content::goal(),
        content::group(),
        automation::workflow_model(),
        automation::task_center_queue(),
        automation::task_center_task(),
        automation::code_engine_package(),
        automation::approval(),
        automation::approval_template(),
        science::ai_model(),
        science::ai_project(),
        science::jupyter_workspace(),
        science::fileset(),
        science::repository(),
    ]
}
