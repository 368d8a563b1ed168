use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::PublicationConfig;
use crate::workflows::publication::domain::{
    Address, CommissionSettings, DocumentInstance, DocumentInstanceId, DocumentStatus,
    LegacyDocument, Listing, ListingId, ListingStatus, Snapshot,
};
use crate::workflows::publication::legacy::{
    LegacyAuthorizationLookup, LegacyResolution, TieredLegacyResolver,
};
use crate::workflows::publication::repository::{
    CommissionStore, DocumentInstanceStore, LegacyDocumentStore, ListingStore, MediaStore,
    SettingsStore, StoreError,
};
use crate::workflows::publication::service::PublicationService;
use crate::workflows::publication::signatures::recency_order;

/// Which legacy storage generations exist in the simulated database.
#[derive(Debug, Clone, Copy)]
pub(super) struct LegacySchema {
    pub documents_table: bool,
    pub status_column: bool,
    pub link_table: bool,
}

impl Default for LegacySchema {
    fn default() -> Self {
        Self {
            documents_table: true,
            status_column: true,
            link_table: true,
        }
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    listings: Mutex<HashMap<ListingId, Listing>>,
    commissions: Mutex<HashMap<ListingId, CommissionSettings>>,
    instances: Mutex<Vec<DocumentInstance>>,
    instance_error: Mutex<Option<StoreError>>,
    legacy_documents: Mutex<Vec<LegacyDocument>>,
    linked_documents: Mutex<Vec<LegacyDocument>>,
    legacy_schema: Mutex<LegacySchema>,
    legacy_error: Mutex<Option<StoreError>>,
    media: Mutex<HashMap<ListingId, u32>>,
    digital_required: AtomicBool,
    settings_error: Mutex<Option<StoreError>>,
    status_writes: AtomicUsize,
}

impl MemoryStore {
    pub(super) fn with_listing(listing: Listing) -> Arc<Self> {
        let store = Arc::new(Self::default());
        store.put_listing(listing);
        store
    }

    pub(super) fn put_listing(&self, listing: Listing) {
        self.listings
            .lock()
            .expect("listing mutex")
            .insert(listing.id.clone(), listing);
    }

    pub(super) fn listing(&self, id: &ListingId) -> Listing {
        self.listings
            .lock()
            .expect("listing mutex")
            .get(id)
            .cloned()
            .expect("listing present")
    }

    pub(super) fn update_listing(&self, id: &ListingId, change: impl FnOnce(&mut Listing)) {
        let mut guard = self.listings.lock().expect("listing mutex");
        change(guard.get_mut(id).expect("listing present"));
    }

    pub(super) fn put_commission(&self, listing_id: &ListingId, percent: f64) {
        self.commissions.lock().expect("commission mutex").insert(
            listing_id.clone(),
            CommissionSettings {
                listing_id: listing_id.clone(),
                commission_percent: percent,
            },
        );
    }

    pub(super) fn push_instance(&self, instance: DocumentInstance) {
        self.instances
            .lock()
            .expect("instance mutex")
            .push(instance);
    }

    pub(super) fn fail_instances(&self, error: StoreError) {
        *self.instance_error.lock().expect("instance mutex") = Some(error);
    }

    pub(super) fn push_legacy(&self, document: LegacyDocument) {
        self.legacy_documents
            .lock()
            .expect("legacy mutex")
            .push(document);
    }

    pub(super) fn push_linked(&self, document: LegacyDocument) {
        self.linked_documents
            .lock()
            .expect("linked mutex")
            .push(document);
    }

    pub(super) fn set_legacy_schema(&self, schema: LegacySchema) {
        *self.legacy_schema.lock().expect("schema mutex") = schema;
    }

    pub(super) fn fail_legacy(&self, error: StoreError) {
        *self.legacy_error.lock().expect("legacy mutex") = Some(error);
    }

    pub(super) fn set_media(&self, listing_id: &ListingId, count: u32) {
        self.media
            .lock()
            .expect("media mutex")
            .insert(listing_id.clone(), count);
    }

    pub(super) fn require_digital(&self, required: bool) {
        self.digital_required.store(required, Ordering::SeqCst);
    }

    pub(super) fn fail_settings(&self, error: StoreError) {
        *self.settings_error.lock().expect("settings mutex") = Some(error);
    }

    pub(super) fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    fn legacy_guard(&self) -> Result<LegacySchema, StoreError> {
        if let Some(error) = self.legacy_error.lock().expect("legacy mutex").clone() {
            return Err(error);
        }
        Ok(*self.legacy_schema.lock().expect("schema mutex"))
    }
}

impl ListingStore for MemoryStore {
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(self.listings.lock().expect("listing mutex").get(id).cloned())
    }

    fn set_status(&self, id: &ListingId, status: ListingStatus) -> Result<(), StoreError> {
        let mut guard = self.listings.lock().expect("listing mutex");
        let listing = guard.get_mut(id).ok_or(StoreError::RowNotFound)?;
        listing.status = status;
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl CommissionStore for MemoryStore {
    fn commission_settings(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<CommissionSettings>, StoreError> {
        Ok(self
            .commissions
            .lock()
            .expect("commission mutex")
            .get(listing_id)
            .cloned())
    }
}

impl DocumentInstanceStore for MemoryStore {
    fn recent_instances(
        &self,
        listing_id: &ListingId,
        template_codes: &[&str],
        limit: usize,
    ) -> Result<Vec<DocumentInstance>, StoreError> {
        if let Some(error) = self.instance_error.lock().expect("instance mutex").clone() {
            return Err(error);
        }
        let mut rows: Vec<DocumentInstance> = self
            .instances
            .lock()
            .expect("instance mutex")
            .iter()
            .filter(|instance| &instance.listing_id == listing_id)
            .filter(|instance| template_codes.contains(&instance.template_code.as_str()))
            .cloned()
            .collect();
        rows.sort_by(recency_order);
        rows.truncate(limit);
        Ok(rows)
    }
}

impl LegacyDocumentStore for MemoryStore {
    fn documents_with_status(
        &self,
        _listing_id: &ListingId,
    ) -> Result<Vec<LegacyDocument>, StoreError> {
        let schema = self.legacy_guard()?;
        if !schema.documents_table || !schema.status_column {
            return Err(StoreError::SchemaAbsent("documents.status".to_string()));
        }
        Ok(self.legacy_documents.lock().expect("legacy mutex").clone())
    }

    fn documents_without_status(
        &self,
        _listing_id: &ListingId,
    ) -> Result<Vec<LegacyDocument>, StoreError> {
        let schema = self.legacy_guard()?;
        if !schema.documents_table {
            return Err(StoreError::SchemaAbsent("documents".to_string()));
        }
        Ok(self
            .legacy_documents
            .lock()
            .expect("legacy mutex")
            .iter()
            .map(|document| LegacyDocument {
                status: None,
                ..document.clone()
            })
            .collect())
    }

    fn linked_documents(&self, _listing_id: &ListingId) -> Result<Vec<LegacyDocument>, StoreError> {
        let schema = self.legacy_guard()?;
        if !schema.link_table {
            return Err(StoreError::SchemaAbsent("listing_documents".to_string()));
        }
        Ok(self.linked_documents.lock().expect("linked mutex").clone())
    }
}

impl MediaStore for MemoryStore {
    fn media_count(&self, listing_id: &ListingId) -> Result<u32, StoreError> {
        Ok(self
            .media
            .lock()
            .expect("media mutex")
            .get(listing_id)
            .copied()
            .unwrap_or(0))
    }
}

impl SettingsStore for MemoryStore {
    fn digital_authorization_required(&self) -> Result<bool, StoreError> {
        if let Some(error) = self.settings_error.lock().expect("settings mutex").clone() {
            return Err(error);
        }
        Ok(self.digital_required.load(Ordering::SeqCst))
    }
}

/// Legacy lookup double that records how often the gate consults it.
pub(super) struct CountingLegacy {
    resolution: LegacyResolution,
    calls: AtomicUsize,
}

impl CountingLegacy {
    pub(super) fn returning(resolution: LegacyResolution) -> Arc<Self> {
        Arc::new(Self {
            resolution,
            calls: AtomicUsize::new(0),
        })
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LegacyAuthorizationLookup for CountingLegacy {
    fn resolve(&self, _listing_id: &ListingId) -> Result<LegacyResolution, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.resolution)
    }
}

pub(super) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, day, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn listing_id(raw: &str) -> ListingId {
    ListingId(raw.to_string())
}

pub(super) fn listing(raw_id: &str) -> Listing {
    Listing {
        id: listing_id(raw_id),
        registry_number: Some("12345".to_string()),
        address: Address {
            street: Some("Avenida Sete de Setembro".to_string()),
            number: Some("1500".to_string()),
            complement: Some("Sala 4".to_string()),
            neighborhood: Some("Batel".to_string()),
            city: Some("Curitiba".to_string()),
            state: Some("PR".to_string()),
            postal_code: Some("80240-000".to_string()),
        },
        sale_price: Some(500_000.0),
        commission_percent: Some(5.0),
        authorization_starts_on: NaiveDate::from_ymd_opt(2025, 4, 1),
        authorization_expires_on: NaiveDate::from_ymd_opt(2025, 10, 1),
        exclusive: true,
        status: ListingStatus::Draft,
    }
}

/// Snapshot the e-signature collaborator would attach for the listing as it is now.
pub(super) fn snapshot_of(listing: &Listing) -> Snapshot {
    Snapshot::capture(listing, listing.commission_percent.unwrap_or(6.0))
}

pub(super) fn instance(
    listing: &Listing,
    id: &str,
    status: DocumentStatus,
    signed_day: Option<u32>,
    updated_day: u32,
) -> DocumentInstance {
    DocumentInstance {
        id: DocumentInstanceId(id.to_string()),
        listing_id: listing.id.clone(),
        template_code: "sale_authorization".to_string(),
        status,
        signed_at: signed_day.map(at),
        updated_at: at(updated_day),
        snapshot: None,
    }
}

pub(super) fn signed_instance(listing: &Listing, id: &str, day: u32) -> DocumentInstance {
    DocumentInstance {
        snapshot: Some(snapshot_of(listing)),
        ..instance(listing, id, DocumentStatus::Signed, Some(day), day)
    }
}

pub(super) fn legacy_document(
    document_type: Option<&str>,
    title: Option<&str>,
    status: Option<&str>,
) -> LegacyDocument {
    LegacyDocument {
        id: format!("legacy-{}", title.or(document_type).unwrap_or("untitled")),
        document_type: document_type.map(str::to_string),
        title: title.map(str::to_string),
        status: status.map(str::to_string),
    }
}

pub(super) fn publication_config() -> PublicationConfig {
    PublicationConfig::default()
}

pub(super) fn tiered_service(
    store: Arc<MemoryStore>,
) -> PublicationService<MemoryStore, TieredLegacyResolver<MemoryStore>> {
    PublicationService::standard(store, &publication_config())
}

pub(super) fn counting_service(
    store: Arc<MemoryStore>,
    legacy: Arc<CountingLegacy>,
) -> PublicationService<MemoryStore, CountingLegacy> {
    PublicationService::new(store, legacy, &publication_config())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
