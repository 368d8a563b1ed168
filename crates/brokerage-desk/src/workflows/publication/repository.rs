use super::domain::{
    CommissionSettings, DocumentInstance, LegacyDocument, Listing, ListingId, ListingStatus,
};

/// Error enumeration for collaborator store failures.
///
/// `SchemaAbsent` is the only variant the gate recovers from: it means the query
/// could not run against the storage shape it expects, which is different from a
/// query that ran and found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage shape unavailable: {0}")]
    SchemaAbsent(String),
    #[error("row not found")]
    RowNotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_schema_absent(&self) -> bool {
        matches!(self, StoreError::SchemaAbsent(_))
    }
}

/// Listing records owned by the listing editor. The gate only writes the status field.
pub trait ListingStore: Send + Sync {
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;
    fn set_status(&self, id: &ListingId, status: ListingStatus) -> Result<(), StoreError>;
}

pub trait CommissionStore: Send + Sync {
    fn commission_settings(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<CommissionSettings>, StoreError>;
}

/// Read side of the e-signature collaborator.
pub trait DocumentInstanceStore: Send + Sync {
    /// Instances for the listing restricted to `template_codes`, at most `limit` rows.
    ///
    /// Rows must be ordered by [`recency_order`](super::signatures::recency_order)
    /// before the bound is applied, so a signed instance is never cut in favour of
    /// newer unsigned ones.
    fn recent_instances(
        &self,
        listing_id: &ListingId,
        template_codes: &[&str],
        limit: usize,
    ) -> Result<Vec<DocumentInstance>, StoreError>;
}

/// Pre-signature document storage across its schema generations.
pub trait LegacyDocumentStore: Send + Sync {
    /// Documents table read including its status column.
    fn documents_with_status(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<LegacyDocument>, StoreError>;
    /// Documents table read without assuming a status column exists.
    fn documents_without_status(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<LegacyDocument>, StoreError>;
    /// Generic documents reached through the listing link table.
    fn linked_documents(&self, listing_id: &ListingId) -> Result<Vec<LegacyDocument>, StoreError>;
}

pub trait MediaStore: Send + Sync {
    fn media_count(&self, listing_id: &ListingId) -> Result<u32, StoreError>;
}

/// Back-office settings, read on every evaluation.
pub trait SettingsStore: Send + Sync {
    fn digital_authorization_required(&self) -> Result<bool, StoreError>;
}

/// Everything the publication service reads from or writes to.
pub trait PublicationStore:
    ListingStore + CommissionStore + DocumentInstanceStore + MediaStore + SettingsStore
{
}

impl<T> PublicationStore for T where
    T: ListingStore + CommissionStore + DocumentInstanceStore + MediaStore + SettingsStore
{
}
