use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use brokerage_desk::config::PublicationConfig;
use brokerage_desk::workflows::publication::{
    ActorRole, Address, AuthorizationSource, CommissionSettings, CommissionStore,
    DocumentInstance, DocumentInstanceId, DocumentInstanceStore, DocumentStatus, LegacyDocument,
    LegacyDocumentStore, Listing, ListingId, ListingStatus, ListingStore, MediaStore,
    PublicationError, PublicationService, SettingsStore, Snapshot, StoreError,
    TieredLegacyResolver, recency_order,
};
use chrono::{TimeZone, Utc};

/// Database stand-in whose legacy documents table predates the status column.
#[derive(Default)]
struct Portfolio {
    listings: Mutex<HashMap<ListingId, Listing>>,
    commissions: Mutex<HashMap<ListingId, f64>>,
    instances: Mutex<Vec<DocumentInstance>>,
    legacy: Mutex<HashMap<ListingId, Vec<LegacyDocument>>>,
    media: Mutex<HashMap<ListingId, u32>>,
    digital_required: Mutex<bool>,
}

impl ListingStore for Portfolio {
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(self.listings.lock().expect("listing mutex").get(id).cloned())
    }

    fn set_status(&self, id: &ListingId, status: ListingStatus) -> Result<(), StoreError> {
        let mut guard = self.listings.lock().expect("listing mutex");
        let listing = guard.get_mut(id).ok_or(StoreError::RowNotFound)?;
        listing.status = status;
        Ok(())
    }
}

impl CommissionStore for Portfolio {
    fn commission_settings(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<CommissionSettings>, StoreError> {
        Ok(self
            .commissions
            .lock()
            .expect("commission mutex")
            .get(listing_id)
            .map(|percent| CommissionSettings {
                listing_id: listing_id.clone(),
                commission_percent: *percent,
            }))
    }
}

impl DocumentInstanceStore for Portfolio {
    fn recent_instances(
        &self,
        listing_id: &ListingId,
        template_codes: &[&str],
        limit: usize,
    ) -> Result<Vec<DocumentInstance>, StoreError> {
        let mut rows: Vec<DocumentInstance> = self
            .instances
            .lock()
            .expect("instance mutex")
            .iter()
            .filter(|doc| &doc.listing_id == listing_id)
            .filter(|doc| template_codes.contains(&doc.template_code.as_str()))
            .cloned()
            .collect();
        rows.sort_by(recency_order);
        rows.truncate(limit);
        Ok(rows)
    }
}

impl LegacyDocumentStore for Portfolio {
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
        Ok(self
            .legacy
            .lock()
            .expect("legacy mutex")
            .get(listing_id)
            .cloned()
            .unwrap_or_default())
    }

    fn linked_documents(&self, _listing_id: &ListingId) -> Result<Vec<LegacyDocument>, StoreError> {
        Ok(Vec::new())
    }
}

impl MediaStore for Portfolio {
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

impl SettingsStore for Portfolio {
    fn digital_authorization_required(&self) -> Result<bool, StoreError> {
        Ok(*self.digital_required.lock().expect("settings mutex"))
    }
}

fn listing(id: &str, price: f64) -> Listing {
    Listing {
        id: ListingId(id.to_string()),
        registry_number: Some("12345".to_string()),
        address: Address {
            street: Some("Rua XV de Novembro".to_string()),
            number: Some("700".to_string()),
            complement: None,
            neighborhood: Some("Centro".to_string()),
            city: Some("Curitiba".to_string()),
            state: Some("PR".to_string()),
            postal_code: Some("80020-310".to_string()),
        },
        sale_price: Some(price),
        commission_percent: None,
        authorization_starts_on: None,
        authorization_expires_on: None,
        exclusive: false,
        status: ListingStatus::Draft,
    }
}

type PortfolioService = PublicationService<Portfolio, TieredLegacyResolver<Portfolio>>;

fn service(portfolio: Arc<Portfolio>) -> PortfolioService {
    PublicationService::standard(portfolio, &PublicationConfig::default())
}

#[test]
fn signed_listing_publishes_until_its_price_drifts() {
    let portfolio = Arc::new(Portfolio::default());
    let l1 = listing("L1", 500_000.0);
    portfolio
        .listings
        .lock()
        .expect("listing mutex")
        .insert(l1.id.clone(), l1.clone());
    portfolio
        .commissions
        .lock()
        .expect("commission mutex")
        .insert(l1.id.clone(), 5.0);
    portfolio.media.lock().expect("media mutex").insert(l1.id.clone(), 2);

    let signed_at = Utc
        .with_ymd_and_hms(2025, 5, 2, 14, 0, 0)
        .single()
        .expect("valid timestamp");
    portfolio.instances.lock().expect("instance mutex").push(DocumentInstance {
        id: DocumentInstanceId("inst-1".to_string()),
        listing_id: l1.id.clone(),
        template_code: "exclusive_sale_authorization".to_string(),
        status: DocumentStatus::Signed,
        signed_at: Some(signed_at),
        updated_at: signed_at,
        snapshot: Some(Snapshot::capture(&l1, 5.0)),
    });

    let service = service(portfolio.clone());

    let decision = service.can_publish(&l1.id).expect("decision");
    assert!(decision.allowed, "reasons: {:?}", decision.reasons);

    portfolio
        .listings
        .lock()
        .expect("listing mutex")
        .get_mut(&l1.id)
        .expect("listing present")
        .sale_price = Some(550_000.0);

    let decision = service.can_publish(&l1.id).expect("decision");
    assert!(!decision.allowed);
    assert_eq!(
        decision.reasons,
        vec!["data changed after signature — resend required".to_string()]
    );
    assert!(matches!(
        service.publish(&l1.id, ActorRole::Admin),
        Err(PublicationError::NotPublishable { .. })
    ));
}

#[test]
fn legacy_row_without_status_column_authorizes() {
    let portfolio = Arc::new(Portfolio::default());
    let l2 = listing("L2", 320_000.0);
    portfolio
        .listings
        .lock()
        .expect("listing mutex")
        .insert(l2.id.clone(), l2.clone());
    portfolio.legacy.lock().expect("legacy mutex").insert(
        l2.id.clone(),
        vec![LegacyDocument {
            id: "scan-88".to_string(),
            document_type: Some("authorization".to_string()),
            title: Some("Scanned authorization".to_string()),
            status: None,
        }],
    );

    let state = service(portfolio).evaluate(&l2.id).expect("state");
    assert!(state.has_authorization);
    assert_eq!(state.source, AuthorizationSource::Legacy);
}

#[test]
fn mandated_digital_proof_without_documents_is_denied() {
    let portfolio = Arc::new(Portfolio::default());
    let l3 = listing("L3", 210_000.0);
    portfolio
        .listings
        .lock()
        .expect("listing mutex")
        .insert(l3.id.clone(), l3.clone());
    *portfolio.digital_required.lock().expect("settings mutex") = true;

    let state = service(portfolio).evaluate(&l3.id).expect("state");
    assert!(!state.has_authorization);
    assert_eq!(
        state.reason.as_deref(),
        Some("digital authorization required")
    );
}
