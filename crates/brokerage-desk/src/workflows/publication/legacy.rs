//! Authorization evidence from document storage that predates the e-signature workflow.
//!
//! Three schema generations are searched in order. Each tier either answers, or hands
//! over to the next one when its storage shape is missing or its rows carry no
//! usable evidence. Tiers never loop back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{LegacyDocument, ListingId};
use super::repository::{LegacyDocumentStore, StoreError};

/// Status values that make a legacy authorization row count as present.
pub const VALID_LEGACY_STATUSES: &[&str] = &[
    "validated",
    "approved",
    "active",
    "signed",
    "validado",
    "aprovado",
    "ativo",
    "assinado",
];

/// Tokens identifying an authorization in a document type or title, after accent folding.
pub const AUTHORIZATION_TOKENS: &[&str] = &["authorization", "authorisation", "autorizacao"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyTier {
    /// Documents table read with its status column.
    StatusedDocuments,
    /// Documents table read without a status column.
    Documents,
    /// Generic documents linked to the listing.
    LinkedDocuments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyResolution {
    Found(LegacyTier),
    NotFound,
    /// Every tier reported its storage shape as absent.
    Unavailable,
}

impl LegacyResolution {
    pub fn is_found(self) -> bool {
        matches!(self, LegacyResolution::Found(_))
    }
}

/// Seam between the gate and legacy evidence so evaluation can be exercised in isolation.
pub trait LegacyAuthorizationLookup: Send + Sync {
    fn resolve(&self, listing_id: &ListingId) -> Result<LegacyResolution, StoreError>;

    fn legacy_authorization_exists(&self, listing_id: &ListingId) -> Result<bool, StoreError> {
        Ok(self.resolve(listing_id)?.is_found())
    }
}

enum TierOutcome {
    Found,
    /// Rows carry a definitive status and none of them is valid.
    Rejected,
    Continue { ran: bool },
}

/// Default lookup walking the three legacy storage generations.
pub struct TieredLegacyResolver<S> {
    store: Arc<S>,
}

impl<S> TieredLegacyResolver<S>
where
    S: LegacyDocumentStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn statused_tier(&self, listing_id: &ListingId) -> Result<TierOutcome, StoreError> {
        let rows = match self.store.documents_with_status(listing_id) {
            Ok(rows) => rows,
            Err(err) if err.is_schema_absent() => {
                debug!(listing = %listing_id, %err, "status column unavailable");
                return Ok(TierOutcome::Continue { ran: false });
            }
            Err(err) => return Err(err),
        };

        let candidates: Vec<&LegacyDocument> = rows
            .iter()
            .filter(|doc| is_authorization_document(doc))
            .collect();

        if candidates.is_empty() {
            return Ok(TierOutcome::Continue { ran: true });
        }

        if candidates.iter().any(|doc| has_valid_status(doc)) {
            return Ok(TierOutcome::Found);
        }

        if candidates.iter().all(|doc| observed_status(doc).is_none()) {
            debug!(
                listing = %listing_id,
                rows = candidates.len(),
                "no status evidence on legacy rows"
            );
            return Ok(TierOutcome::Continue { ran: true });
        }

        Ok(TierOutcome::Rejected)
    }

    fn presence_tier(
        &self,
        listing_id: &ListingId,
        tier: LegacyTier,
        rows: Result<Vec<LegacyDocument>, StoreError>,
    ) -> Result<Option<bool>, StoreError> {
        match rows {
            Ok(rows) => Ok(Some(rows.iter().any(is_authorization_document))),
            Err(err) if err.is_schema_absent() => {
                debug!(listing = %listing_id, ?tier, %err, "legacy tier unavailable");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl<S> LegacyAuthorizationLookup for TieredLegacyResolver<S>
where
    S: LegacyDocumentStore,
{
    fn resolve(&self, listing_id: &ListingId) -> Result<LegacyResolution, StoreError> {
        let mut any_tier_ran = match self.statused_tier(listing_id)? {
            TierOutcome::Found => {
                return Ok(found(listing_id, LegacyTier::StatusedDocuments));
            }
            TierOutcome::Rejected => {
                info!(listing = %listing_id, "legacy authorization rows present but not valid");
                return Ok(LegacyResolution::NotFound);
            }
            TierOutcome::Continue { ran } => ran,
        };

        let plain = self.store.documents_without_status(listing_id);
        match self.presence_tier(listing_id, LegacyTier::Documents, plain)? {
            Some(true) => return Ok(found(listing_id, LegacyTier::Documents)),
            Some(false) => any_tier_ran = true,
            None => {}
        }

        let linked = self.store.linked_documents(listing_id);
        match self.presence_tier(listing_id, LegacyTier::LinkedDocuments, linked)? {
            Some(true) => return Ok(found(listing_id, LegacyTier::LinkedDocuments)),
            Some(false) => any_tier_ran = true,
            None => {}
        }

        if any_tier_ran {
            Ok(LegacyResolution::NotFound)
        } else {
            Ok(LegacyResolution::Unavailable)
        }
    }
}

fn found(listing_id: &ListingId, tier: LegacyTier) -> LegacyResolution {
    info!(listing = %listing_id, ?tier, "legacy authorization found");
    LegacyResolution::Found(tier)
}

/// Whether a legacy row describes an authorization, by its type field or its title.
pub fn is_authorization_document(doc: &LegacyDocument) -> bool {
    [doc.document_type.as_deref(), doc.title.as_deref()]
        .into_iter()
        .flatten()
        .map(fold_accents)
        .any(|text| AUTHORIZATION_TOKENS.iter().any(|token| text.contains(token)))
}

fn observed_status(doc: &LegacyDocument) -> Option<String> {
    doc.status
        .as_deref()
        .map(fold_accents)
        .filter(|status| !status.is_empty())
}

fn has_valid_status(doc: &LegacyDocument) -> bool {
    observed_status(doc)
        .map(|status| VALID_LEGACY_STATUSES.contains(&status.as_str()))
        .unwrap_or(false)
}

/// Lowercase, trim, and strip the accents that show up in Portuguese document names.
fn fold_accents(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
