//! Graph JSON writer for the cluster view
//!
//! Projects shipment records onto a node/edge graph for force-directed
//! visualization. Nodes are countries, exporters and products; edges model a
//! shipment flowing through its product node. Outputs topology only - positions
//! are computed in the browser by the layout library.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::io::{IoResult, Writer, write_json};
use crate::normalize::{self, NormalizedShipment};
use crate::record::ShipmentRecord;

/// Role of an edge within its shipment, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRole {
    /// Origin country -> product (`e1-{i}`)
    OriginProduct,
    /// Exporter -> product (`e2-{i}`)
    ExporterProduct,
    /// Product -> destination country (`e3-{i}`)
    ProductDestination,
}

impl EdgeRole {
    /// Tag used to build the edge id
    pub fn tag(&self) -> &'static str {
        match self {
            EdgeRole::OriginProduct => "e1",
            EdgeRole::ExporterProduct => "e2",
            EdgeRole::ProductDestination => "e3",
        }
    }

    /// Edge id for the record at `index`
    pub fn edge_id(&self, index: usize) -> String {
        format!("{}-{}", self.tag(), index)
    }
}

/// A node in the graph representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Cleaned entity name; also the node identity
    pub id: String,

    /// Human-readable label, truncated for display
    pub label: String,
}

impl GraphNode {
    fn new(name: &str) -> Self {
        Self {
            id: name.to_string(),
            label: normalize::truncate_label(name),
        }
    }
}

/// A directed edge between two entity nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Role tag plus source record index (e.g., "e2-7")
    pub id: String,

    /// Source node ID
    pub source: String,

    /// Target node ID
    pub target: String,

    /// Line color taken from the originating record
    pub color: String,

    pub role: EdgeRole,

    /// The originating record, shown in the detail panel on interaction
    pub shipment: Arc<ShipmentRecord>,
}

/// One renderable element, in the order the layout library consumes them
#[derive(Debug, Clone, Copy)]
pub enum GraphElement<'a> {
    Node(&'a GraphNode),
    Edge(&'a GraphEdge),
}

/// Complete graph data for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    /// Deduplicated nodes in first-seen order
    pub nodes: Vec<GraphNode>,

    /// Edges in record order, then role order within a record
    pub edges: Vec<GraphEdge>,

    /// Version of the graph format (for future compatibility)
    pub format_version: String,
}

impl Default for GraphData {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphData {
    /// Format version constant
    pub const FORMAT_VERSION: &'static str = "1.0";

    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            format_version: Self::FORMAT_VERSION.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Nodes followed by edges
    pub fn elements(&self) -> impl Iterator<Item = GraphElement<'_>> {
        self.nodes
            .iter()
            .map(GraphElement::Node)
            .chain(self.edges.iter().map(GraphElement::Edge))
    }

    /// Look up an edge by its id
    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Builds [`GraphData`] while enforcing node dedup
#[derive(Default)]
struct GraphBuilder {
    graph: GraphData,
    seen: HashSet<String>,
}

impl GraphBuilder {
    /// Insert a node unless one with the same name exists; first occurrence wins
    fn add_node(&mut self, name: &str) {
        if name.is_empty() || self.seen.contains(name) {
            return;
        }
        self.seen.insert(name.to_string());
        self.graph.nodes.push(GraphNode::new(name));
    }

    /// Add an edge only when both endpoints are present
    fn add_edge(
        &mut self,
        shipment: &NormalizedShipment,
        role: EdgeRole,
        source: Option<&str>,
        target: Option<&str>,
    ) {
        let (Some(source), Some(target)) = (source, target) else {
            return;
        };
        if source.is_empty() || target.is_empty() {
            return;
        }
        self.graph.edges.push(GraphEdge {
            id: role.edge_id(shipment.index),
            source: source.to_string(),
            target: target.to_string(),
            color: shipment.color.clone(),
            role,
            shipment: Arc::clone(&shipment.record),
        });
    }
}

/// Writer that projects shipments onto the cluster graph
pub struct GraphWriter;

impl GraphWriter {
    pub fn new() -> Self {
        Self
    }

    /// Output file name inside the output directory
    pub const FILE_NAME: &'static str = "graph.json";

    /// Convert the ordered records into graph data.
    ///
    /// Records without an origin or destination contribute nothing. The result
    /// depends only on the input order, so projecting the same list twice yields
    /// identical graphs.
    pub fn project(&self, records: &[Arc<ShipmentRecord>]) -> GraphData {
        let mut builder = GraphBuilder::default();
        let mut rejected = 0usize;

        for (index, record) in records.iter().enumerate() {
            let Some(shipment) = normalize::normalize(index, record) else {
                rejected += 1;
                continue;
            };

            for name in shipment.entity_names() {
                builder.add_node(name);
            }

            let origin = Some(shipment.origin.as_str());
            let destination = Some(shipment.destination.as_str());
            let exporter = shipment.exporter.as_deref();
            let product = shipment.product.as_deref();

            builder.add_edge(&shipment, EdgeRole::OriginProduct, origin, product);
            builder.add_edge(&shipment, EdgeRole::ExporterProduct, exporter, product);
            builder.add_edge(&shipment, EdgeRole::ProductDestination, product, destination);
        }

        let graph = builder.graph;
        tracing::debug!(
            records = records.len(),
            rejected,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "projected cluster graph"
        );
        graph
    }
}

impl Default for GraphWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for GraphWriter {
    fn write(&self, dataset: &Dataset, output: &Path) -> IoResult<()> {
        write_json(dataset.graph(), output, Self::FILE_NAME)
    }

    fn format_id(&self) -> &str {
        "graph-json"
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

    fn node_ids(graph: &GraphData) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn edge_summary(graph: &GraphData) -> String {
        graph
            .edges
            .iter()
            .map(|e| format!("{} {} -> {} {}", e.id, e.source, e.target, e.color))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========== Empty/Minimal Input Tests ==========

    #[test]
    fn empty_input_produces_empty_graph() {
        let graph = GraphWriter::new().project(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.format_version, GraphData::FORMAT_VERSION);
    }

    #[test]
    fn full_record_produces_four_nodes_three_edges() {
        let input = records(vec![json!({
            "Origin Country": "China",
            "Destination Country": "USA",
            "Exporter": "Acme",
            "Description": "Widgets",
            "COLOR": "#112233"
        })]);
        let graph = GraphWriter::new().project(&input);

        assert_eq!(node_ids(&graph), vec!["China", "USA", "Acme", "Widgets"]);
        insta::assert_snapshot!(edge_summary(&graph), @r"
        e1-0 China -> Widgets #112233
        e2-0 Acme -> Widgets #112233
        e3-0 Widgets -> USA #112233
        ");
        assert!(graph.edges.iter().all(|e| Arc::ptr_eq(&e.shipment, &input[0])));
    }

    // ========== Rejection and Gating Tests ==========

    #[test]
    fn record_missing_required_field_contributes_nothing() {
        let input = records(vec![
            json!({"Destination Country": "USA", "Exporter": "Acme", "Description": "Widgets"}),
            json!({"Origin Country": "China", "Exporter": "Acme", "Description": "Widgets"}),
            json!("not an object"),
        ]);
        let graph = GraphWriter::new().project(&input);
        assert!(graph.is_empty());
    }

    #[test]
    fn record_without_product_is_node_only() {
        let input = records(vec![json!({"Origin Country": "A", "Destination Country": "B"})]);
        let graph = GraphWriter::new().project(&input);

        assert_eq!(node_ids(&graph), vec!["A", "B"]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn missing_exporter_suppresses_only_exporter_edge() {
        let input = records(vec![json!({
            "Origin Country": "India",
            "Destination Country": "Kenya",
            "Description": "Tea"
        })]);
        let graph = GraphWriter::new().project(&input);

        let roles: Vec<EdgeRole> = graph.edges.iter().map(|e| e.role).collect();
        assert_eq!(
            roles,
            vec![EdgeRole::OriginProduct, EdgeRole::ProductDestination]
        );
        assert_eq!(graph.edges[0].color, normalize::DEFAULT_COLOR);
    }

    #[test]
    fn exporter_without_product_adds_node_but_no_edge() {
        let input = records(vec![json!({
            "Origin Country": "A",
            "Destination Country": "B",
            "Exporter": "Acme"
        })]);
        let graph = GraphWriter::new().project(&input);
        assert_eq!(node_ids(&graph), vec!["A", "B", "Acme"]);
        assert!(graph.edges.is_empty());
    }

    // ========== Dedup Tests ==========

    #[test]
    fn repeated_names_yield_one_node() {
        let input = records(vec![
            json!({"Origin Country": "China", "Destination Country": "USA", "Exporter": "Acme", "Description": "Widgets"}),
            json!({"Origin Country": "Japan", "Destination Country": "China", "Exporter": "Acme", "Description": "Gears"}),
            json!({"Origin Country": "USA", "Destination Country": "Japan", "Exporter": "China", "Description": "Widgets"}),
        ]);
        let graph = GraphWriter::new().project(&input);

        assert_eq!(
            node_ids(&graph),
            vec!["China", "USA", "Acme", "Widgets", "Japan", "Gears"]
        );
        assert_eq!(graph.edges.len(), 9);
    }

    #[test]
    fn node_identity_is_case_and_space_sensitive() {
        let input = records(vec![
            json!({"Origin Country": "china", "Destination Country": "United  States"}),
            json!({"Origin Country": "China", "Destination Country": "United States"}),
        ]);
        let graph = GraphWriter::new().project(&input);
        assert_eq!(graph.nodes.len(), 4);
    }

    #[test]
    fn edge_ids_use_source_record_index() {
        let input = records(vec![
            json!({"Origin Country": "", "Destination Country": "X"}),
            json!({"Origin Country": "A", "Destination Country": "B", "Description": "P"}),
        ]);
        let graph = GraphWriter::new().project(&input);
        let ids: Vec<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1-1", "e3-1"]);
        assert!(graph.edge("e3-1").is_some());
        assert!(graph.edge("e2-1").is_none());
    }

    #[test]
    fn long_names_get_truncated_labels() {
        let input = records(vec![json!({
            "Origin Country": "A",
            "Destination Country": "B",
            "Description": "Assorted industrial machinery parts"
        })]);
        let graph = GraphWriter::new().project(&input);
        let product = &graph.nodes[2];
        assert_eq!(product.id, "Assorted industrial machinery parts");
        assert_eq!(product.label, "Assorted industrial machi…");
    }

    // ========== Determinism Tests ==========

    #[test]
    fn projection_is_idempotent() {
        let input = records(vec![
            json!({"Origin Country": "China", "Destination Country": "USA", "Exporter": "Acme", "Description": "Widgets"}),
            json!({"Origin Country": "Peru", "Destination Country": "USA", "Description": "Copper"}),
        ]);
        let writer = GraphWriter::new();
        let first = writer.project(&input);
        let second = writer.project(&input);

        assert_eq!(first.nodes, second.nodes);
        assert_eq!(edge_summary(&first), edge_summary(&second));
    }

    #[test]
    fn elements_list_nodes_before_edges() {
        let input = records(vec![json!({
            "Origin Country": "A",
            "Destination Country": "B",
            "Description": "P"
        })]);
        let graph = GraphWriter::new().project(&input);
        let kinds: Vec<&str> = graph
            .elements()
            .map(|e| match e {
                GraphElement::Node(_) => "node",
                GraphElement::Edge(_) => "edge",
            })
            .collect();
        assert_eq!(kinds, vec!["node", "node", "node", "edge", "edge"]);
    }

    // ========== Writer Trait Tests ==========

    #[test]
    fn graph_writer_format_id_is_graph_json() {
        assert_eq!(GraphWriter::new().format_id(), "graph-json");
    }

    #[test]
    fn graph_writer_produces_valid_json_file() {
        let dataset = Dataset::from_values(vec![json!({
            "Origin Country": "China",
            "Destination Country": "USA",
            "Description": "Widgets",
            "Date": "2024-03-01"
        })]);
        let dir = tempfile::tempdir().unwrap();

        GraphWriter::new()
            .write(&dataset, dir.path())
            .expect("Write should succeed");

        let content = std::fs::read_to_string(dir.path().join(GraphWriter::FILE_NAME)).unwrap();
        let parsed: GraphData = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.nodes.len(), 3);
        assert_eq!(parsed.edges.len(), 2);
        assert_eq!(parsed.edges[0].role, EdgeRole::OriginProduct);
        assert_eq!(parsed.edges[0].shipment.text("Date"), "2024-03-01");
    }
}
