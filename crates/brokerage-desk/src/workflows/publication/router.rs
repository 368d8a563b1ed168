use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ActorRole, ListingId};
use super::legacy::LegacyAuthorizationLookup;
use super::repository::PublicationStore;
use super::service::{PublicationError, PublicationErrorKind, PublicationService};

/// Header carrying the caller's back-office role, set by the authenticating proxy.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Router builder exposing listing authorization and publication endpoints.
pub fn publication_router<S, L>(service: Arc<PublicationService<S, L>>) -> Router
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/:listing_id/authorization",
            get(authorization_handler::<S, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/publication",
            get(decision_handler::<S, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/publish",
            post(publish_handler::<S, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/unpublish",
            post(unpublish_handler::<S, L>),
        )
        .with_state(service)
}

pub(crate) async fn authorization_handler<S, L>(
    State(service): State<Arc<PublicationService<S, L>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    match service.evaluate(&ListingId(listing_id)) {
        Ok(state) => (StatusCode::OK, axum::Json(state)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decision_handler<S, L>(
    State(service): State<Arc<PublicationService<S, L>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    match service.can_publish(&ListingId(listing_id)) {
        Ok(decision) => (StatusCode::OK, axum::Json(decision)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn publish_handler<S, L>(
    State(service): State<Arc<PublicationService<S, L>>>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    let Some(role) = actor_role(&headers) else {
        return missing_role_response();
    };

    match service.publish(&ListingId(listing_id), role) {
        Ok(change) => (StatusCode::OK, axum::Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn unpublish_handler<S, L>(
    State(service): State<Arc<PublicationService<S, L>>>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    let Some(role) = actor_role(&headers) else {
        return missing_role_response();
    };

    match service.unpublish(&ListingId(listing_id), role) {
        Ok(change) => (StatusCode::OK, axum::Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

fn actor_role(headers: &HeaderMap) -> Option<ActorRole> {
    headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(ActorRole::parse)
}

fn missing_role_response() -> Response {
    let payload = json!({
        "error": "missing or unrecognized actor role",
    });
    (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
}

pub(crate) fn status_for(kind: PublicationErrorKind) -> StatusCode {
    match kind {
        PublicationErrorKind::NotFound => StatusCode::NOT_FOUND,
        PublicationErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        PublicationErrorKind::NotPublishable => StatusCode::CONFLICT,
        PublicationErrorKind::StoreFailure => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(err: PublicationError) -> Response {
    let status = status_for(err.kind());
    let payload = match &err {
        PublicationError::NotPublishable { reasons, .. } => json!({
            "error": err.to_string(),
            "reasons": reasons,
        }),
        other => json!({
            "error": other.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
