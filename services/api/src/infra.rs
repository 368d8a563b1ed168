use brokerage_desk::workflows::publication::{
    Address, CommissionSettings, CommissionStore, DocumentInstance, DocumentInstanceId,
    DocumentInstanceStore, DocumentStatus, LegacyDocument, LegacyDocumentStore, Listing,
    ListingId, ListingStatus, ListingStore, MediaStore, SettingsStore, Snapshot, StoreError,
    recency_order,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const SIGNED_LISTING: &str = "L-1001";
pub(crate) const LEGACY_LISTING: &str = "L-1002";
pub(crate) const UNDOCUMENTED_LISTING: &str = "L-1003";
pub(crate) const PENDING_LISTING: &str = "L-1004";
pub(crate) const LINKED_LISTING: &str = "L-1005";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the brokerage database.
///
/// The documents table is modelled at the generation that predates its status
/// column, so status-aware legacy reads report the shape as absent.
#[derive(Default)]
pub(crate) struct InMemoryPublicationStore {
    listings: Mutex<HashMap<ListingId, Listing>>,
    commissions: Mutex<HashMap<ListingId, f64>>,
    instances: Mutex<Vec<DocumentInstance>>,
    documents: Mutex<HashMap<ListingId, Vec<LegacyDocument>>>,
    linked: Mutex<HashMap<ListingId, Vec<LegacyDocument>>>,
    media: Mutex<HashMap<ListingId, u32>>,
    digital_required: AtomicBool,
}

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

impl InMemoryPublicationStore {
    pub(crate) fn set_digital_authorization_required(&self, required: bool) {
        self.digital_required.store(required, Ordering::SeqCst);
    }

    pub(crate) fn insert_listing(&self, listing: Listing) {
        self.listings
            .lock()
            .expect("listing mutex poisoned")
            .insert(listing.id.clone(), listing);
    }

    pub(crate) fn update_listing(&self, id: &ListingId, change: impl FnOnce(&mut Listing)) {
        if let Some(listing) = self
            .listings
            .lock()
            .expect("listing mutex poisoned")
            .get_mut(id)
        {
            change(listing);
        }
    }

    pub(crate) fn insert_commission(&self, id: &ListingId, percent: f64) {
        self.commissions
            .lock()
            .expect("commission mutex poisoned")
            .insert(id.clone(), percent);
    }

    pub(crate) fn insert_instance(&self, instance: DocumentInstance) {
        self.instances
            .lock()
            .expect("instance mutex poisoned")
            .push(instance);
    }

    pub(crate) fn insert_document(&self, id: &ListingId, document: LegacyDocument) {
        self.documents
            .lock()
            .expect("document mutex poisoned")
            .entry(id.clone())
            .or_default()
            .push(document);
    }

    pub(crate) fn insert_linked(&self, id: &ListingId, document: LegacyDocument) {
        self.linked
            .lock()
            .expect("linked mutex poisoned")
            .entry(id.clone())
            .or_default()
            .push(document);
    }

    pub(crate) fn set_media(&self, id: &ListingId, count: u32) {
        self.media
            .lock()
            .expect("media mutex poisoned")
            .insert(id.clone(), count);
    }
}

impl ListingStore for InMemoryPublicationStore {
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(guard(&self.listings)?.get(id).cloned())
    }

    fn set_status(&self, id: &ListingId, status: ListingStatus) -> Result<(), StoreError> {
        let mut listings = guard(&self.listings)?;
        let listing = listings.get_mut(id).ok_or(StoreError::RowNotFound)?;
        listing.status = status;
        Ok(())
    }
}

impl CommissionStore for InMemoryPublicationStore {
    fn commission_settings(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<CommissionSettings>, StoreError> {
        Ok(guard(&self.commissions)?
            .get(listing_id)
            .map(|percent| CommissionSettings {
                listing_id: listing_id.clone(),
                commission_percent: *percent,
            }))
    }
}

impl DocumentInstanceStore for InMemoryPublicationStore {
    fn recent_instances(
        &self,
        listing_id: &ListingId,
        template_codes: &[&str],
        limit: usize,
    ) -> Result<Vec<DocumentInstance>, StoreError> {
        let mut rows: Vec<DocumentInstance> = guard(&self.instances)?
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

impl LegacyDocumentStore for InMemoryPublicationStore {
    fn documents_with_status(
        &self,
        _listing_id: &ListingId,
    ) -> Result<Vec<LegacyDocument>, StoreError> {
        Err(StoreError::SchemaAbsent(
            "column documents.status does not exist".to_string(),
        ))
    }

    fn documents_without_status(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<LegacyDocument>, StoreError> {
        Ok(guard(&self.documents)?
            .get(listing_id)
            .cloned()
            .unwrap_or_default())
    }

    fn linked_documents(&self, listing_id: &ListingId) -> Result<Vec<LegacyDocument>, StoreError> {
        Ok(guard(&self.linked)?
            .get(listing_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl MediaStore for InMemoryPublicationStore {
    fn media_count(&self, listing_id: &ListingId) -> Result<u32, StoreError> {
        Ok(guard(&self.media)?.get(listing_id).copied().unwrap_or(0))
    }
}

impl SettingsStore for InMemoryPublicationStore {
    fn digital_authorization_required(&self) -> Result<bool, StoreError> {
        Ok(self.digital_required.load(Ordering::SeqCst))
    }
}

fn sample_listing(id: &str, street: &str, number: &str, price: f64) -> Listing {
    Listing {
        id: ListingId(id.to_string()),
        registry_number: Some(format!("{}-77", &id[2..])),
        address: Address {
            street: Some(street.to_string()),
            number: Some(number.to_string()),
            complement: None,
            neighborhood: Some("Centro".to_string()),
            city: Some("Curitiba".to_string()),
            state: Some("PR".to_string()),
            postal_code: Some("80020-310".to_string()),
        },
        sale_price: Some(price),
        commission_percent: None,
        authorization_starts_on: NaiveDate::from_ymd_opt(2025, 5, 1),
        authorization_expires_on: NaiveDate::from_ymd_opt(2025, 11, 1),
        exclusive: true,
        status: ListingStatus::Draft,
    }
}

fn timestamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, 14, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Seeds one listing per evidence path the gate distinguishes.
pub(crate) fn seed_portfolio(store: &InMemoryPublicationStore) {
    let signed = sample_listing(SIGNED_LISTING, "Rua XV de Novembro", "700", 500_000.0);
    store.insert_commission(&signed.id, 5.0);
    store.set_media(&signed.id, 4);
    store.insert_instance(DocumentInstance {
        id: DocumentInstanceId("doc-5001".to_string()),
        listing_id: signed.id.clone(),
        template_code: "exclusive_sale_authorization".to_string(),
        status: DocumentStatus::Signed,
        signed_at: Some(timestamp(2)),
        updated_at: timestamp(2),
        snapshot: Some(Snapshot::capture(&signed, 5.0)),
    });
    store.insert_listing(signed);

    let legacy = sample_listing(LEGACY_LISTING, "Avenida Sete de Setembro", "2451", 320_000.0);
    store.set_media(&legacy.id, 2);
    store.insert_document(
        &legacy.id,
        LegacyDocument {
            id: "scan-88".to_string(),
            document_type: Some("authorization".to_string()),
            title: Some("Autorização de venda digitalizada".to_string()),
            status: None,
        },
    );
    store.insert_listing(legacy);

    let undocumented = sample_listing(
        UNDOCUMENTED_LISTING,
        "Rua Comendador Araújo",
        "143",
        210_000.0,
    );
    store.set_media(&undocumented.id, 1);
    store.insert_listing(undocumented);

    let pending = sample_listing(PENDING_LISTING, "Rua Marechal Deodoro", "630", 415_000.0);
    store.insert_instance(DocumentInstance {
        id: DocumentInstanceId("doc-5002".to_string()),
        listing_id: pending.id.clone(),
        template_code: "sale_authorization".to_string(),
        status: DocumentStatus::Sent,
        signed_at: None,
        updated_at: timestamp(6),
        snapshot: None,
    });
    store.insert_listing(pending);

    let linked = sample_listing(LINKED_LISTING, "Rua Padre Anchieta", "1888", 689_000.0);
    store.set_media(&linked.id, 3);
    store.insert_linked(
        &linked.id,
        LegacyDocument {
            id: "attachment-412".to_string(),
            document_type: Some("generic".to_string()),
            title: Some("AUTORIZACAO exclusiva assinada.pdf".to_string()),
            status: None,
        },
    );
    store.insert_listing(linked);
}
