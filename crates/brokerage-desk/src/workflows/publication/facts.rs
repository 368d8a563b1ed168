use std::sync::Arc;

use tracing::debug;

use super::domain::{Address, Listing, ListingId, Snapshot, SnapshotAddress};
use super::mismatch::{round_cents, round_hundredths, tidy};
use super::repository::{CommissionStore, ListingStore};
use super::service::PublicationError;

/// Commission applied when neither a settings record nor an inline value exists.
pub const DEFAULT_COMMISSION_PERCENT: f64 = 6.0;

/// Reads the current listing facts that an authorization document covers.
pub struct FactExtractor<S> {
    store: Arc<S>,
}

impl<S> FactExtractor<S>
where
    S: ListingStore + CommissionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Build the canonical snapshot for a listing as it is stored right now.
    pub fn extract(&self, listing_id: &ListingId) -> Result<Snapshot, PublicationError> {
        let listing = self
            .store
            .fetch_listing(listing_id)?
            .ok_or_else(|| PublicationError::NotFound(listing_id.clone()))?;

        let commission = self.effective_commission(&listing)?;
        Ok(Snapshot::capture(&listing, commission))
    }

    fn effective_commission(&self, listing: &Listing) -> Result<f64, PublicationError> {
        match self.store.commission_settings(&listing.id) {
            Ok(Some(settings)) => return Ok(settings.commission_percent),
            Ok(None) => {}
            Err(err) if err.is_schema_absent() => {
                debug!(
                    listing = %listing.id,
                    %err,
                    "commission settings unavailable, using inline value"
                );
            }
            Err(err) => return Err(err.into()),
        }

        Ok(listing
            .commission_percent
            .unwrap_or(DEFAULT_COMMISSION_PERCENT))
    }
}

impl Snapshot {
    /// Capture the facts of `listing` with an already resolved commission percent.
    ///
    /// The e-signature collaborator uses the same routine when it attaches a snapshot
    /// to a freshly signed instance, so both sides round and tidy identically.
    pub fn capture(listing: &Listing, commission_percent: f64) -> Self {
        Self {
            registry_number: tidy_optional(listing.registry_number.as_deref()),
            address: SnapshotAddress::capture(&listing.address),
            sale_price: listing
                .sale_price
                .map(|price| round_cents(price) as f64 / 100.0),
            commission_percent: round_hundredths(commission_percent) as f64 / 100.0,
            authorization_starts_on: listing.authorization_starts_on,
            authorization_expires_on: listing.authorization_expires_on,
            exclusive: listing.exclusive,
        }
    }
}

impl SnapshotAddress {
    fn capture(address: &Address) -> Self {
        Self {
            street: tidy_optional(address.street.as_deref()),
            number: tidy_optional(address.number.as_deref()),
            complement: tidy_optional(address.complement.as_deref()),
            neighborhood: tidy_optional(address.neighborhood.as_deref()),
            city: tidy_optional(address.city.as_deref()),
            state: tidy_optional(address.state.as_deref()),
            postal_code: tidy_optional(address.postal_code.as_deref()),
        }
    }
}

fn tidy_optional(value: Option<&str>) -> String {
    value.map(tidy).unwrap_or_default()
}
