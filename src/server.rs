//! projgrant HTTP Server
//!
//! REST surface over the authorizer and grant management.
//!
//! Endpoints:
//!   GET    /health                              - Liveness
//!   POST   /authorize                           - Decide for an explicit principal (caller needs project.read)
//!   GET    /projects/:project/groups            - List grants (project.read)
//!   PUT    /projects/:project/groups/:group     - Set a group's role (groups.manage)
//!   DELETE /projects/:project/groups/:group     - Revoke a group (groups.manage)
//!   DELETE /projects/:project/grants            - Purge all grants (project.archive)
//!
//! The caller is read from gateway headers (`X-Principal-Id`, `X-Principal-Roles`,
//! `X-Principal-Groups`). A request without `X-Principal-Id` is unauthenticated.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::authorizer::Authorizer;
use crate::constants::{HEADER_PRINCIPAL_GROUPS, HEADER_PRINCIPAL_ID, HEADER_PRINCIPAL_ROLES};
use crate::error::Error;
use crate::gate::AuthorizationDecision;
use crate::groups::GroupDirectory;
use crate::permission::Permission;
use crate::principal::Principal;
use crate::read::{Grant, GrantSource};
use crate::role::Role;
use crate::write;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeRequest {
    #[serde(default)]
    principal: Option<Principal>,
    project_id: String,
    permission: String,
}

#[derive(Debug, Deserialize)]
struct SetRoleRequest {
    role: String,
}

#[derive(Debug, Serialize)]
struct SetRoleResponse {
    role: Role,
    previous: Option<Role>,
}

#[derive(Debug, Serialize)]
struct RevokeResponse {
    removed: bool,
}

#[derive(Debug, Serialize)]
struct PurgeResponse {
    removed: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// ============================================================================
// Helpers
// ============================================================================

fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::Denied { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::FORBIDDEN),
        Error::InvalidRole(_) | Error::InvalidPermission(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    }
    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Principal asserted by the gateway, if any
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let id = header(HEADER_PRINCIPAL_ID).map(str::trim).filter(|s| !s.is_empty())?;
    Some(Principal {
        identifier: id.to_string(),
        roles: header(HEADER_PRINCIPAL_ROLES).map(split_list).unwrap_or_default(),
        group_ids: header(HEADER_PRINCIPAL_GROUPS).map(split_list),
    })
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn post_authorize<D: GroupDirectory, G: GrantSource>(
    State(auth): State<Arc<Authorizer<D, G>>>,
    headers: HeaderMap,
    Json(req): Json<AuthorizeRequest>,
) -> Result<(StatusCode, Json<AuthorizationDecision>), ApiError> {
    // the asking caller must be able to see the project it asks about
    let caller = principal_from_headers(&headers);
    write::require(&*auth, caller.as_ref(), &req.project_id, Permission::ProjectRead)
        .await
        .map_err(error_response)?;
    let d = auth
        .authorize_named(req.principal.as_ref(), &req.project_id, &req.permission)
        .await
        .map_err(error_response)?;
    let status = StatusCode::from_u16(d.status_code).unwrap_or(StatusCode::FORBIDDEN);
    Ok((status, Json(d)))
}

async fn list_groups<D: GroupDirectory, G: GrantSource>(
    State(auth): State<Arc<Authorizer<D, G>>>,
    headers: HeaderMap,
    Path(project): Path<String>,
) -> ApiResult<Vec<Grant>> {
    let actor = principal_from_headers(&headers);
    write::list_project_groups(&*auth, actor.as_ref(), &project)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn put_group<D: GroupDirectory, G: GrantSource>(
    State(auth): State<Arc<Authorizer<D, G>>>,
    headers: HeaderMap,
    Path((project, group)): Path<(String, String)>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<SetRoleResponse> {
    let actor = principal_from_headers(&headers);
    let (role, previous) = write::set_group_role_named(&*auth, actor.as_ref(), &project, &group, &req.role)
        .await
        .map_err(error_response)?;
    Ok(Json(SetRoleResponse { role, previous }))
}

async fn delete_group<D: GroupDirectory, G: GrantSource>(
    State(auth): State<Arc<Authorizer<D, G>>>,
    headers: HeaderMap,
    Path((project, group)): Path<(String, String)>,
) -> ApiResult<RevokeResponse> {
    let actor = principal_from_headers(&headers);
    let removed = write::revoke_group(&*auth, actor.as_ref(), &project, &group)
        .await
        .map_err(error_response)?;
    Ok(Json(RevokeResponse { removed }))
}

async fn delete_grants<D: GroupDirectory, G: GrantSource>(
    State(auth): State<Arc<Authorizer<D, G>>>,
    headers: HeaderMap,
    Path(project): Path<String>,
) -> ApiResult<PurgeResponse> {
    let actor = principal_from_headers(&headers);
    let removed = write::purge_project(&*auth, actor.as_ref(), &project)
        .await
        .map_err(error_response)?;
    Ok(Json(PurgeResponse { removed }))
}

// ============================================================================
// Router
// ============================================================================

pub fn router<D, G>(auth: Arc<Authorizer<D, G>>) -> Router
where
    D: GroupDirectory + 'static,
    G: GrantSource + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/authorize", post(post_authorize::<D, G>))
        .route("/projects/:project/groups", get(list_groups::<D, G>))
        .route(
            "/projects/:project/groups/:group",
            put(put_group::<D, G>).delete(delete_group::<D, G>),
        )
        .route("/projects/:project/grants", delete(delete_grants::<D, G>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(auth)
}
