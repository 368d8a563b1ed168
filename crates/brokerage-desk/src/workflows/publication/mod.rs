//! Publication authorization gate.
//!
//! Decides whether a listing may move from draft to the public site by reconciling
//! signed authorization documents with the listing's current facts, falling back to
//! legacy document storage when digital proof is optional, and folding in the media
//! precondition.

pub mod domain;
pub mod facts;
pub mod gate;
pub mod legacy;
pub mod mismatch;
pub mod repository;
pub mod router;
pub mod service;
pub mod signatures;

#[cfg(test)]
mod tests;

pub use domain::{
    ActorRole, Address, AuthorizationSource, AuthorizationState, CommissionSettings,
    DocumentInstance, DocumentInstanceId, DocumentStatus, LegacyDocument, Listing, ListingId,
    ListingStatus, PublicationChange, PublicationDecision, Snapshot, SnapshotAddress,
    AUTHORIZATION_TEMPLATES,
};
pub use facts::{FactExtractor, DEFAULT_COMMISSION_PERCENT};
pub use gate::{AuthorizationGate, PublicationPolicy};
pub use legacy::{LegacyAuthorizationLookup, LegacyResolution, LegacyTier, TieredLegacyResolver};
pub use repository::{
    CommissionStore, DocumentInstanceStore, LegacyDocumentStore, ListingStore, MediaStore,
    PublicationStore, SettingsStore, StoreError,
};
pub use router::{publication_router, ACTOR_ROLE_HEADER};
pub use service::{PublicationError, PublicationErrorKind, PublicationService};
pub use signatures::{
    recency_order, SignatureAmbiguity, SignatureLookup, SignatureStateTracker, DEFAULT_FETCH_LIMIT,
};
