//! AI models and projects, Jupyter workspaces, filesets and version-control repositories

use serde_json::json;

use crate::migration::kinds::declarative::{DeclarativeKind, TransferPlan, TransferStep};
use crate::migration::kinds::template::{ItemsSelector, RequestTemplate};
use crate::migration::types::KindTag;

fn owned_search() -> serde_json::Value {
    json!({
        "limit": "{limit}",
        "offset": "{offset}",
        "filters": [{ "type": "OWNER", "values": ["{sourceUserId}"] }],
        "sortFieldMap": { "CREATED": "DESC" }
    })
}

pub(super) fn ai_model() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::AiModel,
        50,
        RequestTemplate::post("/api/datascience/ml/v1/search/models", owned_search()),
        ItemsSelector::field("/models", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::post(
            "/api/datascience/ml/v1/entity/{id}/ownership",
            json!({ "userId": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn ai_project() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::AiProject,
        50,
        RequestTemplate::post("/api/datascience/ml/v1/search/projects", owned_search()),
        ItemsSelector::field("/projects", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::post(
            "/api/datascience/ml/v1/projects/{id}/ownership",
            json!({ "userId": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn jupyter_workspace() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::JupyterWorkspace,
        50,
        RequestTemplate::get(
            "/api/datascienceoss/v1/workspaces?ownerId={sourceUserId}&limit={limit}&offset={offset}",
        ),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/datascienceoss/v1/workspaces/{id}/ownership",
            json!({ "newOwnerId": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn fileset() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Fileset,
        50,
        RequestTemplate::post(
            "/api/files/v1/filesets/search?offset={offset}&limit={limit}",
            json!({
                "fieldSort": [{ "field": "created", "order": "DESC" }],
                "filters": [{ "field": "owner", "value": ["{sourceUserId}"], "not": false, "operator": "IN" }],
                "dateFilters": []
            }),
        ),
        ItemsSelector::field("/fileSets", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::post(
            "/api/files/v1/filesets/{id}/ownership",
            json!({ "userId": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn repository() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Repository,
        50,
        RequestTemplate::post(
            "/api/version/v1/repositories/search",
            json!({
                "query": {
                    "offset": "{offset}",
                    "limit": "{limit}",
                    "fieldSearchMap": {},
                    "sort": "lastCommit",
                    "order": "desc",
                    "filters": { "userId": ["{sourceUserId}"] }
                }
            }),
        ),
        ItemsSelector::field("/repositories", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/version/v1/repositories/{id}",
            json!({ "repositoryPermissionUpdate": { "userId": "{newOwnerId}" } }),
        ))]),
    )
    .full_result_set()
}
