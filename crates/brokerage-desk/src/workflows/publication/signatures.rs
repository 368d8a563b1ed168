use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::{DocumentInstance, DocumentStatus, ListingId, AUTHORIZATION_TEMPLATES};
use super::repository::{DocumentInstanceStore, StoreError};

/// Number of instances inspected per evaluation unless configured otherwise.
pub const DEFAULT_FETCH_LIMIT: usize = 20;

/// Why the tracker could not give a definitive answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAmbiguity {
    /// The instance storage could not be queried in the shape the tracker expects.
    SchemaAbsent,
}

/// What the e-signature records say about a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureLookup {
    pub authoritative_signed: Option<DocumentInstance>,
    /// Most recent instance when nothing is signed. Never grants authorization.
    pub latest_pending: Option<DocumentInstance>,
    pub ambiguity: Option<SignatureAmbiguity>,
}

impl SignatureLookup {
    fn schema_absent() -> Self {
        Self {
            ambiguity: Some(SignatureAmbiguity::SchemaAbsent),
            ..Self::default()
        }
    }
}

/// Recency ordering for document instances: `signed_at` descending with unsigned
/// rows after every signed one, then `updated_at` descending.
pub fn recency_order(left: &DocumentInstance, right: &DocumentInstance) -> Ordering {
    let by_signature = match (left.signed_at, right.signed_at) {
        (Some(l), Some(r)) => r.cmp(&l),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_signature.then_with(|| right.updated_at.cmp(&left.updated_at))
}

/// Picks the authoritative authorization instance for a listing.
pub struct SignatureStateTracker<S> {
    store: Arc<S>,
    limit: usize,
}

impl<S> SignatureStateTracker<S>
where
    S: DocumentInstanceStore,
{
    pub fn new(store: Arc<S>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    pub fn latest(&self, listing_id: &ListingId) -> Result<SignatureLookup, StoreError> {
        let mut instances =
            match self
                .store
                .recent_instances(listing_id, AUTHORIZATION_TEMPLATES, self.limit)
            {
                Ok(instances) => instances,
                Err(err) if err.is_schema_absent() => {
                    warn!(listing = %listing_id, %err, "document instances unavailable");
                    return Ok(SignatureLookup::schema_absent());
                }
                Err(err) => return Err(err),
            };

        instances.retain(DocumentInstance::is_authorization);
        instances.sort_by(recency_order);
        instances.truncate(self.limit);

        let authoritative_signed = instances
            .iter()
            .find(|instance| instance.status == DocumentStatus::Signed)
            .cloned();

        let latest_pending = match authoritative_signed {
            Some(_) => None,
            None => instances.into_iter().next(),
        };

        debug!(
            listing = %listing_id,
            signed = authoritative_signed.as_ref().map(|instance| instance.id.0.as_str()),
            pending = latest_pending.as_ref().map(|instance| instance.status.label()),
            "signature state resolved"
        );

        Ok(SignatureLookup {
            authoritative_signed,
            latest_pending,
            ambiguity: None,
        })
    }
}
