//! Shipment detail panel
//!
//! Fixed set of labelled rows shown for the displayed shipment.

use serde::Serialize;

use crate::normalize::{self, candidates};
use crate::record::{ShipmentRecord, fields};
use crate::selection::Selection;

/// Placeholder for blank values
pub const NOT_AVAILABLE: &str = "N/A";

/// Rows in display order: (label, candidate keys)
const ROWS: &[(&str, &[&str])] = &[
    ("Product", &[fields::PRODUCT]),
    ("Date", &[fields::DATE]),
    ("Transport", &[fields::MODE_OF_TRANSPORT]),
    ("Exporter", candidates::EXPORTER),
    ("Importer", &[fields::IMPORTER]),
    ("Origin", candidates::ORIGIN),
    ("Destination", candidates::DESTINATION),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailPanel {
    pub rows: Vec<DetailRow>,
    /// Pinned by a click; the panel offers an unlock action
    pub locked: bool,
}

impl DetailPanel {
    pub fn from_record(record: &ShipmentRecord, locked: bool) -> Self {
        let rows = ROWS
            .iter()
            .map(|&(label, keys)| {
                let value = normalize::resolve(record, keys);
                DetailRow {
                    label,
                    value: if value.is_empty() {
                        NOT_AVAILABLE.to_string()
                    } else {
                        value
                    },
                }
            })
            .collect();
        Self { rows, locked }
    }

    /// Panel for whatever the selection currently displays
    pub fn for_selection(selection: &Selection) -> Option<Self> {
        selection
            .displayed()
            .map(|record| Self::from_record(record, selection.is_locked()))
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }
}
