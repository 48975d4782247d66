//! Route segments for the map view
//!
//! Each shipment with usable coordinates becomes one straight origin to
//! destination line. Country names are not required here; only the four
//! coordinate fields matter.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::io::{IoResult, Writer, write_json};
use crate::record::{ShipmentRecord, fields};

/// Line color used when a record carries no `COLOR`
pub const DEFAULT_ROUTE_COLOR: &str = "blue";

/// A `[latitude, longitude]` pair
pub type LatLng = [f64; 2];

/// One origin/destination line on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Index of the source record
    pub index: usize,
    pub origin: LatLng,
    pub destination: LatLng,
    pub color: String,
    pub shipment: Arc<ShipmentRecord>,
}

impl RouteSegment {
    fn from_record(index: usize, record: &Arc<ShipmentRecord>) -> Option<Self> {
        let origin = [
            record.number(fields::ORIGIN_LATITUDE)?,
            record.number(fields::ORIGIN_LONGITUDE)?,
        ];
        let destination = [
            record.number(fields::DESTINATION_LATITUDE)?,
            record.number(fields::DESTINATION_LONGITUDE)?,
        ];
        let color = record.text(fields::COLOR);
        let color = if color.trim().is_empty() {
            DEFAULT_ROUTE_COLOR.to_string()
        } else {
            color
        };
        Some(Self {
            index,
            origin,
            destination,
            color,
            shipment: Arc::clone(record),
        })
    }
}

/// Project records onto route segments, skipping any without four finite
/// coordinates
pub fn project(records: &[Arc<ShipmentRecord>]) -> Vec<RouteSegment> {
    let routes: Vec<RouteSegment> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| RouteSegment::from_record(index, record))
        .collect();
    tracing::debug!(
        records = records.len(),
        routes = routes.len(),
        "projected route segments"
    );
    routes
}

/// Writer that outputs route segments as JSON
pub struct RouteWriter;

impl RouteWriter {
    pub fn new() -> Self {
        Self
    }

    pub const FILE_NAME: &'static str = "routes.json";
}

impl Default for RouteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for RouteWriter {
    fn write(&self, dataset: &Dataset, output: &Path) -> IoResult<()> {
        write_json(&dataset.routes(), output, Self::FILE_NAME)
    }

    fn format_id(&self) -> &str {
        "routes-json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn records(values: Vec<Value>) -> Vec<Arc<ShipmentRecord>> {
        values
            .into_iter()
            .map(|v| Arc::new(ShipmentRecord::from_value(v)))
            .collect()
    }

    #[test]
    fn record_with_coordinates_becomes_segment() {
        let input = records(vec![json!({
            "Origin latitude": "31.23",
            "Origin longitude": "121.47",
            "Destination latitude": 40.71,
            "Destination longitude": -74.0,
            "COLOR": "#00AA00"
        })]);
        let routes = project(&input);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].origin, [31.23, 121.47]);
        assert_eq!(routes[0].destination, [40.71, -74.0]);
        assert_eq!(routes[0].color, "#00AA00");
        assert!(Arc::ptr_eq(&routes[0].shipment, &input[0]));
    }

    #[test]
    fn missing_or_invalid_coordinates_are_skipped() {
        let input = records(vec![
            json!({"Origin latitude": 1, "Origin longitude": 2, "Destination latitude": 3}),
            json!({"Origin latitude": "north", "Origin longitude": 2, "Destination latitude": 3, "Destination longitude": 4}),
            json!({"Origin latitude": 1, "Origin longitude": 2, "Destination latitude": 3, "Destination longitude": 4}),
        ]);
        let routes = project(&input);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].index, 2);
    }

    #[test]
    fn blank_color_falls_back_to_blue() {
        let input = records(vec![json!({
            "Origin latitude": 0, "Origin longitude": 0,
            "Destination latitude": 1, "Destination longitude": 1,
            "COLOR": " "
        })]);
        assert_eq!(project(&input)[0].color, DEFAULT_ROUTE_COLOR);
    }

    #[test]
    fn route_writer_format_id_is_routes_json() {
        assert_eq!(RouteWriter::new().format_id(), "routes-json");
    }
}
