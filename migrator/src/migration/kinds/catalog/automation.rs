//! Workflows, task center, Code Engine and approvals

use serde_json::json;

use crate::migration::kinds::declarative::{DeclarativeKind, TransferPlan, TransferStep};
use crate::migration::kinds::template::{ItemsSelector, RequestTemplate};
use crate::migration::types::KindTag;

const SENT_BACK_NOTE: &str =
    "Approval was sent back to its submitter and cannot change hands until resubmitted";

pub(super) fn workflow_model() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::WorkflowModel,
        50,
        RequestTemplate::get("/api/workflow/v1/models?owner={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/workflow/v1/models/{id}/owner",
            json!({ "owner": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn task_center_queue() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::TaskCenterQueue,
        50,
        RequestTemplate::get("/api/queues/v1/?owner={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/queues/v1/{id}/owner",
            json!({ "owner": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

/// Open tasks assigned to the source; tasks are addressed through their queue
pub(super) fn task_center_task() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::TaskCenterTask,
        100,
        RequestTemplate::post(
            "/api/queues/v1/tasks/list?limit={limit}&offset={offset}",
            json!({
                "assignedTo": ["{sourceUserId}"],
                "status": ["OPEN"]
            }),
        ),
        ItemsSelector::field("", "/id").with_parent("/queueId"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/queues/v1/{parentId}/tasks/{id}/assign",
            json!({ "userId": "{newOwnerId}", "type": "USER" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn code_engine_package() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::CodeEnginePackage,
        50,
        RequestTemplate::get("/api/codeengine/v2/packages?owner={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/codeengine/v2/packages/{id}",
            json!({ "owner": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

/// Pending approvals submitted by the source
pub(super) fn approval() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Approval,
        20,
        RequestTemplate::post(
            "/api/synapse/approval/v1/approvals/search",
            json!({
                "submitterId": "{sourceUserId}",
                "status": ["PENDING", "SENTBACK"],
                "limit": "{limit}",
                "offset": "{offset}"
            }),
        ),
        ItemsSelector::field("/approvals", "/id").with_state("/status"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/synapse/approval/v1/approvals/{id}/submitter",
            json!({ "submitterId": "{newOwnerId}" }),
        ))]),
    )
    .with_skip_rule("SENTBACK", SENT_BACK_NOTE)
    .full_result_set()
}

pub(super) fn approval_template() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::ApprovalTemplate,
        50,
        RequestTemplate::get(
            "/api/synapse/approval/v1/templates?ownerId={sourceUserId}&limit={limit}&offset={offset}",
        ),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/synapse/approval/v1/templates/{id}/owner",
            json!({ "ownerId": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}
