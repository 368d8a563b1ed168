//! Drift detection between the snapshot captured at signature time and today's facts.

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::Snapshot;

/// Snapshot fields compared by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    RegistryNumber,
    Street,
    Number,
    Complement,
    Neighborhood,
    City,
    State,
    PostalCode,
    SalePrice,
    CommissionPercent,
    AuthorizationStartsOn,
    AuthorizationExpiresOn,
    Exclusive,
}

impl SnapshotField {
    pub const fn label(self) -> &'static str {
        match self {
            SnapshotField::RegistryNumber => "registry_number",
            SnapshotField::Street => "street",
            SnapshotField::Number => "number",
            SnapshotField::Complement => "complement",
            SnapshotField::Neighborhood => "neighborhood",
            SnapshotField::City => "city",
            SnapshotField::State => "state",
            SnapshotField::PostalCode => "postal_code",
            SnapshotField::SalePrice => "sale_price",
            SnapshotField::CommissionPercent => "commission_percent",
            SnapshotField::AuthorizationStartsOn => "authorization_starts_on",
            SnapshotField::AuthorizationExpiresOn => "authorization_expires_on",
            SnapshotField::Exclusive => "exclusive",
        }
    }
}

/// Normalized, comparable form of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    registry_number: String,
    street: String,
    number: String,
    complement: String,
    neighborhood: String,
    city: String,
    state: String,
    postal_code: String,
    sale_price_cents: Option<i64>,
    commission_hundredths: i64,
    authorization_starts_on: Option<NaiveDate>,
    authorization_expires_on: Option<NaiveDate>,
    exclusive: bool,
}

impl Fingerprint {
    fn of(snapshot: &Snapshot) -> Self {
        let address = &snapshot.address;
        Self {
            registry_number: normalize_text(&snapshot.registry_number),
            street: normalize_text(&address.street),
            number: normalize_text(&address.number),
            complement: normalize_text(&address.complement),
            neighborhood: normalize_text(&address.neighborhood),
            city: normalize_text(&address.city),
            state: normalize_text(&address.state),
            postal_code: alphanumeric(&address.postal_code),
            sale_price_cents: snapshot.sale_price.map(round_cents),
            commission_hundredths: round_hundredths(snapshot.commission_percent),
            authorization_starts_on: snapshot.authorization_starts_on,
            authorization_expires_on: snapshot.authorization_expires_on,
            exclusive: snapshot.exclusive,
        }
    }

    fn differences(&self, other: &Self) -> Vec<SnapshotField> {
        let checks = [
            (
                SnapshotField::RegistryNumber,
                self.registry_number == other.registry_number,
            ),
            (SnapshotField::Street, self.street == other.street),
            (SnapshotField::Number, self.number == other.number),
            (SnapshotField::Complement, self.complement == other.complement),
            (
                SnapshotField::Neighborhood,
                self.neighborhood == other.neighborhood,
            ),
            (SnapshotField::City, self.city == other.city),
            (SnapshotField::State, self.state == other.state),
            (SnapshotField::PostalCode, self.postal_code == other.postal_code),
            (
                SnapshotField::SalePrice,
                self.sale_price_cents == other.sale_price_cents,
            ),
            (
                SnapshotField::CommissionPercent,
                self.commission_hundredths == other.commission_hundredths,
            ),
            (
                SnapshotField::AuthorizationStartsOn,
                self.authorization_starts_on == other.authorization_starts_on,
            ),
            (
                SnapshotField::AuthorizationExpiresOn,
                self.authorization_expires_on == other.authorization_expires_on,
            ),
            (SnapshotField::Exclusive, self.exclusive == other.exclusive),
        ];

        checks
            .into_iter()
            .filter(|(_, equal)| !equal)
            .map(|(field, _)| field)
            .collect()
    }
}

/// Whether the signed snapshot still describes the listing.
///
/// A missing stored snapshot never matches: an authorization without a recorded
/// fingerprint cannot be shown to cover today's data.
pub fn matches(stored: Option<&Snapshot>, current: &Snapshot) -> bool {
    match stored {
        Some(stored) => Fingerprint::of(stored) == Fingerprint::of(current),
        None => false,
    }
}

/// Fields that differ between the two snapshots. Empty when `stored` is absent.
pub fn differences(stored: Option<&Snapshot>, current: &Snapshot) -> Vec<SnapshotField> {
    match stored {
        Some(stored) => Fingerprint::of(stored).differences(&Fingerprint::of(current)),
        None => Vec::new(),
    }
}

/// Trim and collapse inner whitespace runs.
pub(crate) fn tidy(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_text(raw: &str) -> String {
    tidy(raw).to_lowercase()
}

fn alphanumeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub(crate) fn round_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub(crate) fn round_hundredths(percent: f64) -> i64 {
    (percent * 100.0).round() as i64
}
