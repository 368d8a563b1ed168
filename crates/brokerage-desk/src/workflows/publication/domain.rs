use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Template codes that represent a listing authorization in the e-signature workflow.
pub const AUTHORIZATION_TEMPLATES: &[&str] = &[
    "sale_authorization",
    "exclusive_sale_authorization",
    "authorization_renewal",
];

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publication status of a listing on the public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Active,
    Archived,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Active => "active",
            ListingStatus::Archived => "archived",
        }
    }
}

/// Street address parts as stored on the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Current commercial and legal facts of a listing, owned by the listing editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub registry_number: Option<String>,
    pub address: Address,
    pub sale_price: Option<f64>,
    /// Inline commission percent kept by listings created before commission settings existed.
    pub commission_percent: Option<f64>,
    pub authorization_starts_on: Option<NaiveDate>,
    pub authorization_expires_on: Option<NaiveDate>,
    pub exclusive: bool,
    pub status: ListingStatus,
}

/// Dedicated commission record for a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionSettings {
    pub listing_id: ListingId,
    pub commission_percent: f64,
}

/// Address portion of a [`Snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotAddress {
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Fingerprint of the listing facts an authorization document was signed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registry_number: String,
    pub address: SnapshotAddress,
    pub sale_price: Option<f64>,
    pub commission_percent: f64,
    pub authorization_starts_on: Option<NaiveDate>,
    pub authorization_expires_on: Option<NaiveDate>,
    pub exclusive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentInstanceId(pub String);

/// Lifecycle of a document inside the e-signature workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Viewed,
    Signed,
    Refused,
    Voided,
    Error,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Viewed => "viewed",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Refused => "refused",
            DocumentStatus::Voided => "voided",
            DocumentStatus::Error => "error",
        }
    }
}

/// Generated document tracked by the e-signature collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInstance {
    pub id: DocumentInstanceId,
    pub listing_id: ListingId,
    pub template_code: String,
    pub status: DocumentStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Attached once, when the instance transitions into `signed`.
    pub snapshot: Option<Snapshot>,
}

impl DocumentInstance {
    pub fn is_authorization(&self) -> bool {
        AUTHORIZATION_TEMPLATES.contains(&self.template_code.as_str())
    }
}

/// File record from before digital signatures, with whatever columns its schema generation had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDocument {
    pub id: String,
    pub document_type: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationSource {
    Digital,
    Legacy,
    None,
}

/// Derived view of whether a listing is currently authorized for publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationState {
    pub has_authorization: bool,
    pub source: AuthorizationSource,
    pub status: Option<String>,
    pub document_instance_id: Option<DocumentInstanceId>,
    pub signed_at: Option<DateTime<Utc>>,
    pub data_changed_after_signature: bool,
    /// Snapshot fields that drifted since signature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_fields: Vec<String>,
    pub reason: Option<String>,
}

impl AuthorizationState {
    pub(crate) fn denied(reason: &str) -> Self {
        Self {
            has_authorization: false,
            source: AuthorizationSource::None,
            status: None,
            document_instance_id: None,
            signed_at: None,
            data_changed_after_signature: false,
            changed_fields: Vec::new(),
            reason: Some(reason.to_string()),
        }
    }
}

/// Publish eligibility combining authorization with the media precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationDecision {
    pub allowed: bool,
    pub reasons: Vec<String>,
    pub media_count: u32,
    pub authorization: AuthorizationState,
}

/// Back-office roles as seen by the publication workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Manager,
    Broker,
    Agent,
    Viewer,
}

impl ActorRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" | "gestor" => Some(Self::Manager),
            "broker" | "corretor" => Some(Self::Broker),
            "agent" => Some(Self::Agent),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Admin => "admin",
            ActorRole::Manager => "manager",
            ActorRole::Broker => "broker",
            ActorRole::Agent => "agent",
            ActorRole::Viewer => "viewer",
        }
    }

    /// Only elevated roles may change what is visible on the public site.
    pub const fn can_publish(self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::Manager)
    }
}

/// Result of a successful publish or unpublish write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationChange {
    pub listing_id: ListingId,
    pub status: ListingStatus,
}
