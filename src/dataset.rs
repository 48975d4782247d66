//! A loaded shipment list and the views projected from it
//!
//! The graph and route projections are computed once, when the dataset is
//! built from a successful fetch. Cloning a dataset shares everything.

use std::sync::Arc;

use serde_json::Value;

use crate::graph_writer::{GraphData, GraphWriter};
use crate::record::ShipmentRecord;
use crate::routes::{self, RouteSegment};

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[Arc<ShipmentRecord>]>,
    graph: Arc<GraphData>,
    routes: Arc<[RouteSegment]>,
}

impl Dataset {
    /// Build a dataset and project it
    pub fn new(records: Vec<ShipmentRecord>) -> Self {
        let records: Arc<[Arc<ShipmentRecord>]> = records.into_iter().map(Arc::new).collect();
        let graph = GraphWriter::new().project(&records);
        let routes = routes::project(&records).into();
        Self {
            records,
            graph: Arc::new(graph),
            routes,
        }
    }

    /// Build a dataset from upstream array elements
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values.into_iter().map(ShipmentRecord::from_value).collect())
    }

    pub fn records(&self) -> &[Arc<ShipmentRecord>] {
        &self.records
    }

    pub fn graph(&self) -> &GraphData {
        &self.graph
    }

    pub fn routes(&self) -> &[RouteSegment] {
        &self.routes
    }

    /// True when the source returned no records at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
