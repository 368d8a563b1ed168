use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{
    ActorRole, AuthorizationState, ListingId, ListingStatus, PublicationChange,
    PublicationDecision,
};
use super::gate::{AuthorizationGate, PublicationPolicy, REASON_NOT_FOUND};
use super::legacy::{LegacyAuthorizationLookup, TieredLegacyResolver};
use super::repository::{LegacyDocumentStore, PublicationStore, StoreError};
use crate::config::PublicationConfig;

/// Reason reported when a listing has no media attached.
pub const REASON_NO_MEDIA: &str = "at least one photo is required";

/// Service exposing evaluation and the publish/unpublish status writes.
pub struct PublicationService<S, L> {
    store: Arc<S>,
    gate: AuthorizationGate<S, L>,
    default_policy: PublicationPolicy,
}

impl<S> PublicationService<S, TieredLegacyResolver<S>>
where
    S: PublicationStore + LegacyDocumentStore + 'static,
{
    /// Service backed by the tiered legacy lookup over the same store.
    pub fn standard(store: Arc<S>, config: &PublicationConfig) -> Self {
        let legacy = Arc::new(TieredLegacyResolver::new(store.clone()));
        Self::new(store, legacy, config)
    }
}

impl<S, L> PublicationService<S, L>
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    pub fn new(store: Arc<S>, legacy: Arc<L>, config: &PublicationConfig) -> Self {
        let gate = AuthorizationGate::new(store.clone(), legacy, config.document_fetch_limit);
        Self {
            store,
            gate,
            default_policy: PublicationPolicy {
                digital_authorization_required: config.digital_authorization_required,
            },
        }
    }

    /// Current authorization state of a listing.
    pub fn evaluate(&self, listing_id: &ListingId) -> Result<AuthorizationState, PublicationError> {
        let policy = self.policy()?;
        self.gate.evaluate(listing_id, policy)
    }

    /// Whether the listing may go public right now, with every failing precondition listed.
    pub fn can_publish(
        &self,
        listing_id: &ListingId,
    ) -> Result<PublicationDecision, PublicationError> {
        let authorization = self.evaluate(listing_id)?;
        let media_count = self.store.media_count(listing_id)?;

        let mut reasons = Vec::new();
        if media_count == 0 {
            reasons.push(REASON_NO_MEDIA.to_string());
        }
        if !authorization.has_authorization {
            reasons.push(
                authorization
                    .reason
                    .clone()
                    .unwrap_or_else(|| REASON_NOT_FOUND.to_string()),
            );
        }

        Ok(PublicationDecision {
            allowed: reasons.is_empty(),
            reasons,
            media_count,
            authorization,
        })
    }

    /// Make the listing visible on the public site after re-checking eligibility.
    pub fn publish(
        &self,
        listing_id: &ListingId,
        role: ActorRole,
    ) -> Result<PublicationChange, PublicationError> {
        ensure_role(role)?;

        let decision = self.can_publish(listing_id)?;
        if !decision.allowed {
            warn!(listing = %listing_id, reasons = ?decision.reasons, "publish refused");
            return Err(PublicationError::NotPublishable {
                listing_id: listing_id.clone(),
                reasons: decision.reasons,
            });
        }

        self.write_status(listing_id, ListingStatus::Active, role)
    }

    /// Return the listing to draft. No authorization precondition applies.
    pub fn unpublish(
        &self,
        listing_id: &ListingId,
        role: ActorRole,
    ) -> Result<PublicationChange, PublicationError> {
        ensure_role(role)?;

        self.store
            .fetch_listing(listing_id)?
            .ok_or_else(|| PublicationError::NotFound(listing_id.clone()))?;

        self.write_status(listing_id, ListingStatus::Draft, role)
    }

    fn policy(&self) -> Result<PublicationPolicy, PublicationError> {
        match self.store.digital_authorization_required() {
            Ok(required) => Ok(PublicationPolicy {
                digital_authorization_required: required,
            }),
            Err(err) if err.is_schema_absent() => {
                debug!(%err, "settings unavailable, using configured publication policy");
                Ok(self.default_policy)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_status(
        &self,
        listing_id: &ListingId,
        status: ListingStatus,
        role: ActorRole,
    ) -> Result<PublicationChange, PublicationError> {
        match self.store.set_status(listing_id, status) {
            Ok(()) => {}
            Err(StoreError::RowNotFound) => {
                return Err(PublicationError::NotFound(listing_id.clone()))
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            listing = %listing_id,
            status = status.label(),
            role = role.label(),
            "listing publication status updated"
        );
        Ok(PublicationChange {
            listing_id: listing_id.clone(),
            status,
        })
    }
}

fn ensure_role(role: ActorRole) -> Result<(), PublicationError> {
    if role.can_publish() {
        Ok(())
    } else {
        Err(PublicationError::PermissionDenied(role))
    }
}

/// Error raised by the publication service.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PublicationError {
    #[error("listing {0} not found")]
    NotFound(ListingId),
    #[error("role {} may not change publication status", .0.label())]
    PermissionDenied(ActorRole),
    #[error("listing {listing_id} cannot be published: {}", .reasons.join("; "))]
    NotPublishable {
        listing_id: ListingId,
        reasons: Vec<String>,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification so callers can tell "not allowed" from "data unavailable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationErrorKind {
    NotFound,
    PermissionDenied,
    NotPublishable,
    StoreFailure,
}

impl PublicationError {
    pub fn kind(&self) -> PublicationErrorKind {
        match self {
            PublicationError::NotFound(_) => PublicationErrorKind::NotFound,
            PublicationError::PermissionDenied(_) => PublicationErrorKind::PermissionDenied,
            PublicationError::NotPublishable { .. } => PublicationErrorKind::NotPublishable,
            PublicationError::Store(_) => PublicationErrorKind::StoreFailure,
        }
    }
}
