//! Field normalizer
//!
//! Extracts the handful of fields the cluster graph needs from a raw record and
//! rejects records that cannot be placed on it.

use std::sync::Arc;

use crate::record::{ShipmentRecord, fields};

/// Line color used when a record carries no `COLOR`
pub const DEFAULT_COLOR: &str = "#FF4136";

/// Maximum number of characters shown in a node label before truncation
pub const LABEL_MAX_CHARS: usize = 25;

/// Candidate keys per logical field, tried in priority order
pub mod candidates {
    use crate::record::fields;

    pub const ORIGIN: &[&str] = &[fields::ORIGIN_COUNTRY, fields::ORIGIN_COUNTRY_SPACED];
    pub const DESTINATION: &[&str] = &[fields::DESTINATION_COUNTRY];
    pub const EXPORTER: &[&str] = &[fields::EXPORTER];
    pub const PRODUCT: &[&str] = &[fields::DESCRIPTION];
}

/// Strip zero-width spaces and surrounding whitespace
pub fn clean_string(raw: &str) -> String {
    raw.replace('\u{200B}', "").trim().to_string()
}

/// Shorten a display label to [`LABEL_MAX_CHARS`] characters plus an ellipsis
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let mut label: String = name.chars().take(LABEL_MAX_CHARS).collect();
        label.push('…');
        label
    } else {
        name.to_string()
    }
}

/// Resolve a logical field by trying each candidate key in order.
///
/// The first candidate whose cleaned value is non-empty wins. Returns an empty
/// string when none match.
pub fn resolve(record: &ShipmentRecord, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| clean_string(&record.text(key)))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Cleaned, contract-checked view of a record used for graph construction.
///
/// `origin` and `destination` are always non-empty.
#[derive(Debug, Clone)]
pub struct NormalizedShipment {
    pub index: usize,
    pub origin: String,
    pub destination: String,
    pub exporter: Option<String>,
    pub product: Option<String>,
    pub color: String,
    pub record: Arc<ShipmentRecord>,
}

impl NormalizedShipment {
    /// The entity names this shipment contributes, in node insertion order
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.origin.as_str()),
            Some(self.destination.as_str()),
            self.exporter.as_deref(),
            self.product.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Normalize the record at `index`, or `None` if it lacks an origin or
/// destination.
pub fn normalize(index: usize, record: &Arc<ShipmentRecord>) -> Option<NormalizedShipment> {
    let origin = resolve(record, candidates::ORIGIN);
    let destination = resolve(record, candidates::DESTINATION);
    if origin.is_empty() || destination.is_empty() {
        return None;
    }

    let color = record.text(fields::COLOR).trim().to_string();
    let color = if color.is_empty() {
        DEFAULT_COLOR.to_string()
    } else {
        color
    };

    Some(NormalizedShipment {
        index,
        origin,
        destination,
        exporter: non_empty(resolve(record, candidates::EXPORTER)),
        product: non_empty(resolve(record, candidates::PRODUCT)),
        color,
        record: Arc::clone(record),
    })
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
