//! Cards, pages, apps, alerts, reports, publications, projects, goals and groups

use serde_json::json;

use super::search_query;
use crate::migration::kinds::declarative::{DeclarativeKind, TransferPlan, TransferStep};
use crate::migration::kinds::template::{ItemsSelector, RequestTemplate};
use crate::migration::types::KindTag;

const PUBLICATION_NOTE: &str = "Domo Everywhere publications can only be reassigned once the new \
owner co-owns every published page, card and dataset; transfer manually";

pub(super) fn card() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Card,
        50,
        RequestTemplate::post("/api/search/v1/query", search_query("card")),
        ItemsSelector::field("/searchObjects", "/databaseId"),
        TransferPlan::Bulk(vec![
            TransferStep::Call(RequestTemplate::post(
                "/api/content/v1/cards/owners/add",
                json!({
                    "cardIds": "{ids}",
                    "cardOwners": [{ "id": "{newOwnerId}", "type": "USER" }],
                    "note": "",
                    "sendEmail": false
                }),
            )),
            TransferStep::RevokePrevious(RequestTemplate::post(
                "/api/content/v1/cards/owners/remove",
                json!({
                    "cardIds": "{ids}",
                    "cardOwners": [{ "id": "{sourceUserId}", "type": "USER" }]
                }),
            )),
        ]),
    )
    .full_result_set()
}

pub(super) fn page() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Page,
        50,
        RequestTemplate::post(
            "/api/content/v1/pages/adminsummary?limit={limit}&skip={offset}",
            json!({
                "ownerIds": ["{sourceUserId}"],
                "orderBy": "pageTitle",
                "ascending": true
            }),
        ),
        ItemsSelector::field("/pageAdminSummaries", "/pageId"),
        TransferPlan::Bulk(vec![
            TransferStep::Call(RequestTemplate::put(
                "/api/content/v1/pages/bulk/owners",
                json!({
                    "owners": [{ "id": "{newOwnerId}", "type": "USER" }],
                    "pageIds": "{ids}"
                }),
            )),
            TransferStep::RevokePrevious(RequestTemplate::post(
                "/api/content/v1/pages/bulk/owners/remove",
                json!({
                    "owners": [{ "id": "{sourceUserId}", "type": "USER" }],
                    "pageIds": "{ids}"
                }),
            )),
        ]),
    )
    .full_result_set()
}

pub(super) fn data_app() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::DataApp,
        30,
        RequestTemplate::post(
            "/api/content/v1/dataapps/adminsummary?limit={limit}&skip={offset}",
            json!({
                "ownerIds": ["{sourceUserId}"],
                "orderBy": "title",
                "ascending": true
            }),
        ),
        ItemsSelector::field("/dataAppAdminSummaries", "/dataAppId"),
        TransferPlan::Bulk(vec![
            TransferStep::Call(RequestTemplate::post(
                "/api/content/v1/dataapps/bulk/owners",
                json!({
                    "owners": [{ "id": "{newOwnerId}", "type": "USER" }],
                    "dataAppIds": "{ids}"
                }),
            )),
            TransferStep::RevokePrevious(RequestTemplate::post(
                "/api/content/v1/dataapps/bulk/owners/remove",
                json!({
                    "owners": [{ "id": "{sourceUserId}", "type": "USER" }],
                    "dataAppIds": "{ids}"
                }),
            )),
        ]),
    )
    .full_result_set()
}

pub(super) fn alert() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Alert,
        50,
        RequestTemplate::get("/api/social/v4/alerts?ownerId={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::patch(
            "/api/social/v4/alerts/{id}",
            json!({ "owner": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

/// Report schedules do not expose their owner through a listing endpoint, so
/// they are read from the periodic export dataset. The export does not change
/// as schedules are reassigned, so offsets stay stable.
pub(super) fn scheduled_report() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::ScheduledReport,
        100,
        RequestTemplate::post(
            "/api/query/v1/execute/{scheduledReportsDatasetId}",
            json!({
                "sql": "SELECT `Schedule ID` FROM table WHERE `Owner ID` = '{sourceUserId}' \
                        ORDER BY `Schedule ID` LIMIT {limit} OFFSET {offset}"
            }),
        ),
        ItemsSelector::rows("/rows", 0),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/content/v1/reportschedules/{id}",
            json!({ "ownerId": "{newOwnerId}" }),
        ))]),
    )
}

pub(super) fn publication() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Publication,
        50,
        RequestTemplate::get(
            "/api/publish/v2/publications/summaries?ownerId={sourceUserId}&limit={limit}&offset={offset}",
        ),
        ItemsSelector::field("", "/id"),
        TransferPlan::Unsupported {
            note: PUBLICATION_NOTE,
        },
    )
}

pub(super) fn custom_app() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::CustomApp,
        30,
        RequestTemplate::get(
            "/api/apps/v1/designs?owner={sourceUserId}&checkAdminAuthority=true&deleted=false&limit={limit}&skip={offset}",
        ),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/apps/v1/designs/{id}/owner",
            json!({ "owner": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn project() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Project,
        50,
        RequestTemplate::get("/api/content/v1/projects?owner={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/content/v1/projects/{id}",
            json!({ "ownedBy": "{newOwnerId}" }),
        ))]),
    )
    .full_result_set()
}

/// Goals keep a single owner list; replacing it drops the source as well
pub(super) fn goal() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Goal,
        50,
        RequestTemplate::get("/api/social/v2/objectives?ownerId={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/id"),
        TransferPlan::PerItem(vec![TransferStep::Call(RequestTemplate::put(
            "/api/social/v2/objectives/{id}/owners",
            json!({ "ownerIds": ["{newOwnerId}"] }),
        ))]),
    )
    .full_result_set()
}

pub(super) fn group() -> DeclarativeKind {
    DeclarativeKind::new(
        KindTag::Group,
        100,
        RequestTemplate::get("/api/content/v2/groups/grouplist?owner={sourceUserId}&limit={limit}&offset={offset}"),
        ItemsSelector::field("", "/groupId"),
        TransferPlan::PerItem(vec![
            TransferStep::Call(RequestTemplate::put(
                "/api/content/v2/groups/access",
                json!([{
                    "groupId": "{id}",
                    "addOwners": [{ "type": "USER", "id": "{newOwnerId}" }],
                    "removeOwners": []
                }]),
            )),
            TransferStep::RevokePrevious(RequestTemplate::put(
                "/api/content/v2/groups/access",
                json!([{
                    "groupId": "{id}",
                    "addOwners": [],
                    "removeOwners": [{ "type": "USER", "id": "{sourceUserId}" }]
                }]),
            )),
        ]),
    )
    .full_result_set()
}
