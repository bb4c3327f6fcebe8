//! Principal lookups and the post-migration account cleanup calls.

use tracing::{info, instrument};

use super::errors::ClientResult;
use super::types::HttpMethod;
use super::Transport;
use crate::migration::types::PrincipalId;

/// Display name of a principal, if the platform reports one
#[instrument(skip(transport), err)]
pub async fn fetch_display_name(
    transport: &dyn Transport,
    user: &PrincipalId,
) -> ClientResult<Option<String>> {
    let path = format!("/api/content/v2/users/{}?includeDetails=false", user);
    let response = transport.request(HttpMethod::Get, &path, None).await?;

    Ok(response
        .get("displayName")
        .and_then(|name| name.as_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string))
}

/// Invalidate every active session of a principal
#[instrument(skip(transport), err)]
pub async fn revoke_sessions(transport: &dyn Transport, user: &PrincipalId) -> ClientResult<()> {
    let path = format!("/api/identity/v1/users/{}/sessions", user);
    transport.request(HttpMethod::Delete, &path, None).await?;
    info!(%user, "Revoked sessions");
    Ok(())
}

/// Delete a principal's account
#[instrument(skip(transport), err)]
pub async fn delete_user(transport: &dyn Transport, user: &PrincipalId) -> ClientResult<()> {
    let path = format!("/api/identity/v1/users/{}", user);
    transport.request(HttpMethod::Delete, &path, None).await?;
    info!(%user, "Deleted user");
    Ok(())
}
