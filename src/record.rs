//! Raw shipment records
//!
//! A shipment record is whatever object the upstream sheet API returns for one
//! row. Field names are loosely specified, so records are kept as an untyped
//! JSON map and every consumer reads fields through [`ShipmentRecord::text`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names consumed from upstream records (exact, case- and space-sensitive)
pub mod fields {
    pub const ORIGIN_COUNTRY: &str = "Origin Country";
    /// Variant with a trailing space observed in some sheet revisions
    pub const ORIGIN_COUNTRY_SPACED: &str = "Origin Country ";
    pub const DESTINATION_COUNTRY: &str = "Destination Country";
    pub const EXPORTER: &str = "Exporter";
    /// Used as the product node of the cluster graph
    pub const DESCRIPTION: &str = "Description";
    pub const COLOR: &str = "COLOR";

    pub const PRODUCT: &str = "Product";
    pub const DATE: &str = "Date";
    pub const MODE_OF_TRANSPORT: &str = "Mode of Transport";
    pub const IMPORTER: &str = "Importer";

    pub const ORIGIN_LATITUDE: &str = "Origin latitude";
    pub const ORIGIN_LONGITUDE: &str = "Origin longitude";
    pub const DESTINATION_LATITUDE: &str = "Destination latitude";
    pub const DESTINATION_LONGITUDE: &str = "Destination longitude";
}

/// One trade event as received from the record source.
///
/// Records have no identity key. Downstream structures share them behind an
/// `Arc` and compare by pointer when identity matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentRecord(Map<String, Value>);

impl ShipmentRecord {
    /// Build a record from an upstream array element.
    ///
    /// Anything other than a JSON object becomes an empty record, which the
    /// normalizer later rejects.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Field value as display text.
    ///
    /// Strings are returned verbatim, numbers and booleans as their JSON text.
    /// Absent keys, `null`, arrays and objects read as the empty string.
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Field value as a finite number, accepting numeric strings
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = match self.0.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
