use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{
    AuthorizationSource, AuthorizationState, DocumentInstance, ListingId, Snapshot,
};
use super::facts::FactExtractor;
use super::legacy::{LegacyAuthorizationLookup, LegacyResolution};
use super::mismatch;
use super::repository::{CommissionStore, DocumentInstanceStore, ListingStore, StoreError};
use super::service::PublicationError;
use super::signatures::{SignatureAmbiguity, SignatureLookup, SignatureStateTracker};

pub const REASON_DIGITAL_REQUIRED: &str = "digital authorization required";
pub const REASON_DATA_CHANGED: &str = "data changed after signature — resend required";
pub const REASON_NOT_SIGNED: &str = "not yet signed";
pub const REASON_NOT_FOUND: &str = "authorization not found";
pub const REASON_UNKNOWN: &str = "authorization status unknown";

/// Status reported when the instance storage could not be read at all.
const STATUS_UNKNOWN: &str = "unknown";

/// Per-evaluation policy, resolved by the caller before each evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationPolicy {
    pub digital_authorization_required: bool,
}

/// Combines listing facts, signature state, and legacy evidence into an authorization verdict.
pub struct AuthorizationGate<S, L> {
    facts: FactExtractor<S>,
    signatures: SignatureStateTracker<S>,
    legacy: Arc<L>,
}

impl<S, L> AuthorizationGate<S, L>
where
    S: ListingStore + CommissionStore + DocumentInstanceStore,
    L: LegacyAuthorizationLookup,
{
    pub fn new(store: Arc<S>, legacy: Arc<L>, fetch_limit: usize) -> Self {
        Self {
            facts: FactExtractor::new(store.clone()),
            signatures: SignatureStateTracker::new(store, fetch_limit),
            legacy,
        }
    }

    pub fn evaluate(
        &self,
        listing_id: &ListingId,
        policy: PublicationPolicy,
    ) -> Result<AuthorizationState, PublicationError> {
        let current = self.facts.extract(listing_id)?;
        let lookup = self.signatures.latest(listing_id)?;
        let state = decide_authorization(
            listing_id,
            &lookup,
            &current,
            policy,
            self.legacy.as_ref(),
        )?;

        debug!(
            listing = %listing_id,
            authorized = state.has_authorization,
            source = ?state.source,
            reason = state.reason.as_deref(),
            "authorization evaluated"
        );
        Ok(state)
    }
}

/// Decision table for authorization; the first matching rule wins.
pub(crate) fn decide_authorization<L>(
    listing_id: &ListingId,
    lookup: &SignatureLookup,
    current: &Snapshot,
    policy: PublicationPolicy,
    legacy: &L,
) -> Result<AuthorizationState, StoreError>
where
    L: LegacyAuthorizationLookup + ?Sized,
{
    let schema_absent = lookup.ambiguity == Some(SignatureAmbiguity::SchemaAbsent);

    match &lookup.authoritative_signed {
        None if policy.digital_authorization_required => {
            let mut state = AuthorizationState::denied(REASON_DIGITAL_REQUIRED);
            state.status = reported_status(lookup.latest_pending.as_ref(), schema_absent);
            Ok(state)
        }
        Some(signed) => Ok(signed_state(listing_id, signed, current)),
        None => {
            if let Some(pending) = &lookup.latest_pending {
                let mut state = AuthorizationState::denied(REASON_NOT_SIGNED);
                state.status = Some(pending.status.label().to_string());
                state.document_instance_id = Some(pending.id.clone());
                return Ok(state);
            }

            let resolution = legacy.resolve(listing_id)?;
            let mut state = match resolution {
                LegacyResolution::Found(_) => AuthorizationState {
                    has_authorization: true,
                    source: AuthorizationSource::Legacy,
                    reason: None,
                    ..AuthorizationState::denied(REASON_NOT_FOUND)
                },
                LegacyResolution::NotFound => AuthorizationState::denied(REASON_NOT_FOUND),
                LegacyResolution::Unavailable => AuthorizationState::denied(REASON_UNKNOWN),
            };
            if schema_absent {
                state.status = Some(STATUS_UNKNOWN.to_string());
            }
            Ok(state)
        }
    }
}

fn signed_state(
    listing_id: &ListingId,
    signed: &DocumentInstance,
    current: &Snapshot,
) -> AuthorizationState {
    let stored = signed.snapshot.as_ref();
    let unchanged = mismatch::matches(stored, current);
    let changed_fields: Vec<String> = mismatch::differences(stored, current)
        .into_iter()
        .map(|field| field.label().to_string())
        .collect();

    if !unchanged {
        warn!(
            listing = %listing_id,
            instance = %signed.id.0,
            snapshot_recorded = stored.is_some(),
            fields = ?changed_fields,
            "listing drifted from signed authorization"
        );
    }

    AuthorizationState {
        has_authorization: unchanged,
        source: if unchanged {
            AuthorizationSource::Digital
        } else {
            AuthorizationSource::None
        },
        status: Some(signed.status.label().to_string()),
        document_instance_id: Some(signed.id.clone()),
        signed_at: signed.signed_at,
        data_changed_after_signature: !unchanged,
        changed_fields,
        reason: if unchanged {
            None
        } else {
            Some(REASON_DATA_CHANGED.to_string())
        },
    }
}

fn reported_status(pending: Option<&DocumentInstance>, schema_absent: bool) -> Option<String> {
    match pending {
        Some(instance) => Some(instance.status.label().to_string()),
        None if schema_absent => Some(STATUS_UNKNOWN.to_string()),
        None => None,
    }
}
