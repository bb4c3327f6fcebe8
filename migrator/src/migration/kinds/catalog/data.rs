//! Datasets, dataflows, connector accounts and Beast Mode formulas

use serde_json::json;

use super::search_query;
use crate::migration::kinds::declarative::{DeclarativeKind, TransferPlan, TransferStep};
use crate::migration::kinds::template::{ItemsSelector, RequestTemplate};
use crate::migration::types::KindTag;

pub(super) fn dataset() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Dataset,
        50,
        RequestTemplate::post(
            "/api/data/ui/v3/datasources/search",
            json!({
                "entities": ["DATASET"],
                "filters": [{
                    "filterType": "term",
                    "field": "owned_by_id",
                    "value": "{sourceUserId}",
                    "not": false
                }],
                "combineResults": true,
                "query": "*",
                "count": "{limit}",
                "offset": "{offset}",
                "sort": {
                    "isRelevance": false,
                    "fieldSorts": [{ "field": "create_date", "sortOrder": "ASC" }]
                }
            }),
        ),
        ItemsSelector::field("/dataSources", "/id"),
        TransferPlan::PerItem(vec![
            TransferStep::Call(RequestTemplate::put(
                "/api/data/v3/datasources/{id}/responsibleUser",
                json!({ "responsibleUserId": "{newOwnerId}" }),
            )),
            TransferStep::ReplaceTag {
                read: RequestTemplate::get("/api/data/ui/v3/datasources/{id}/tags"),
                tags_pointer: "",
                write: RequestTemplate::post("/api/data/ui/v3/datasources/{id}/tags", json!("{tags}")),
            },
        ]),
    )
    .full_result_set()
}

pub(super) fn dataflow() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Dataflow,
        50,
        RequestTemplate::post("/api/search/v1/query", search_query("dataflow")),
        ItemsSelector::field("/searchObjects", "/databaseId"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/dataprocessing/v1/dataflows/{id}/patch",
            json!({ "responsibleUserId": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn account() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Account,
        50,
        RequestTemplate::get("/api/data/v1/accounts?ownerId={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![
            TransferStep::Call(RequestTemplate::post(
                "/api/data/v1/accounts/share/{id}",
                json!({ "type": "USER", "id": "{newOwnerId}", "accessLevel": "OWNER" }),
            )),
            TransferStep::RevokePrevious(RequestTemplate::delete(
                "/api/data/v1/accounts/share/{id}/users/{sourceUserId}",
            )),
        ]),
    )
    .full_result_set()
}

pub(super) fn beast_mode_formula() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::BeastModeFormula,
        100,
        RequestTemplate::post(
            "/api/query/v1/functions/search",
            json!({
                "filters": [{ "field": "owner", "idList": ["{sourceUserId}"] }],
                "sort": { "field": "name", "ascending": true },
                "limit": "{limit}",
                "offset": "{offset}"
            }),
        ),
        ItemsSelector::field("/results", "/id"),
        TransferPlan::Bulk(vec![TransferStep::Call(RequestTemplate::post(
            "/api/query/v1/functions/bulk/owner",
            json!({ "functionIds": "{ids}", "owner": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}
