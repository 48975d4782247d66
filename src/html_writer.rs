//! HTML Writer
//!
//! Renders the route map, cluster graph and login pages. Graph and route data
//! are embedded as JSON for the browser-side render surfaces (Leaflet and
//! Cytoscape), together with the precomputed detail-panel rows for every
//! interactive element.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use askama::Template;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::detail::{DetailPanel, DetailRow};
use crate::graph_writer::GraphData;
use crate::io::{IoError, IoResult, Writer};
use crate::routes::RouteSegment;
use crate::source::FailureKind;
use crate::view::LoadState;

/// Links shown in the navigation bar
#[derive(Debug, Clone)]
pub struct Nav {
    pub route_href: String,
    pub cluster_href: String,
    /// Show the logout button (server mode only)
    pub logout: bool,
}

impl Nav {
    /// Relative links between the generated files
    pub fn static_site() -> Self {
        Self {
            route_href: "index.html".to_string(),
            cluster_href: "cluster.html".to_string(),
            logout: false,
        }
    }

    /// Links for the preview server
    pub fn server() -> Self {
        Self {
            route_href: "/".to_string(),
            cluster_href: "/cluster".to_string(),
            logout: true,
        }
    }
}

/// Message shown instead of the visualization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStatus {
    /// CSS class: "loading", "empty", "unavailable" or "error"
    pub class: &'static str,
    pub message: String,
}

impl PageStatus {
    fn new(class: &'static str, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    /// Status for a non-ready state; `None` when the dataset is ready
    fn for_state(state: &LoadState, loading: &str) -> Option<Self> {
        match state {
            LoadState::Loading => Some(Self::new("loading", loading)),
            LoadState::Unavailable => Some(Self::new(
                "unavailable",
                "Shipment data is unavailable: no source is configured.",
            )),
            LoadState::Failed(e) => Some(match e.kind() {
                FailureKind::Transport => {
                    Self::new("error", format!("Could not load shipments: {}", e))
                }
                FailureKind::Shape => Self::new(
                    "error",
                    format!("Unexpected response from the shipment source: {}", e),
                ),
            }),
            LoadState::Ready(_) => None,
        }
    }

    pub fn route_map(state: &LoadState) -> Option<Self> {
        Self::for_state(state, "Loading Trade Map...").or_else(|| {
            let empty = state.dataset().is_some_and(|d| d.routes().is_empty());
            empty.then(|| Self::new("empty", "No shipment data found."))
        })
    }

    pub fn cluster(state: &LoadState) -> Option<Self> {
        Self::for_state(state, "Loading Graph...").or_else(|| {
            let empty = state.dataset().is_some_and(|d| d.graph().is_empty());
            empty.then(|| Self::new("empty", "No graph data available."))
        })
    }
}

#[derive(Serialize)]
struct ClusterPayload<'a> {
    graph: &'a GraphData,
    /// Detail rows keyed by edge id
    details: BTreeMap<&'a str, Vec<DetailRow>>,
}

#[derive(Serialize)]
struct RoutePayload<'a> {
    routes: &'a [RouteSegment],
    /// Detail rows keyed by record index
    details: BTreeMap<usize, Vec<DetailRow>>,
}

#[derive(Template)]
#[template(path = "route_map.html")]
struct RouteMapTemplate<'a> {
    nav: &'a Nav,
    status: Option<PageStatus>,
    payload: Option<String>,
    route_count: usize,
}

#[derive(Template)]
#[template(path = "cluster.html")]
struct ClusterTemplate<'a> {
    nav: &'a Nav,
    status: Option<PageStatus>,
    payload: Option<String>,
    node_count: usize,
    edge_count: usize,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    error: Option<&'a str>,
}

/// Serialize for embedding inside a `<script>` element.
///
/// Markup-significant characters become JSON unicode escapes, so no record text
/// can open a comment or close the element early.
fn script_json<T: Serialize>(value: &T) -> IoResult<String> {
    let json = serde_json::to_string(value).map_err(|e| IoError::Write(e.to_string()))?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

fn detail_rows(record: &crate::record::ShipmentRecord) -> Vec<DetailRow> {
    DetailPanel::from_record(record, false).rows
}

/// Render the route map page for any load state
pub fn render_route_map(state: &LoadState, nav: &Nav) -> IoResult<String> {
    let status = PageStatus::route_map(state);
    let (payload, route_count) = match (state.dataset(), &status) {
        (Some(dataset), None) => {
            let payload = RoutePayload {
                routes: dataset.routes(),
                details: dataset
                    .routes()
                    .iter()
                    .map(|r| (r.index, detail_rows(&r.shipment)))
                    .collect(),
            };
            (Some(script_json(&payload)?), dataset.routes().len())
        }
        _ => (None, 0),
    };

    let template = RouteMapTemplate {
        nav,
        status,
        payload,
        route_count,
    };
    template.render().map_err(|e| IoError::Write(e.to_string()))
}

/// Render the cluster graph page for any load state
pub fn render_cluster(state: &LoadState, nav: &Nav) -> IoResult<String> {
    let status = PageStatus::cluster(state);
    let (payload, node_count, edge_count) = match (state.dataset(), &status) {
        (Some(dataset), None) => {
            let graph = dataset.graph();
            let payload = ClusterPayload {
                graph,
                details: graph
                    .edges
                    .iter()
                    .map(|e| (e.id.as_str(), detail_rows(&e.shipment)))
                    .collect(),
            };
            (
                Some(script_json(&payload)?),
                graph.nodes.len(),
                graph.edges.len(),
            )
        }
        _ => (None, 0, 0),
    };

    let template = ClusterTemplate {
        nav,
        status,
        payload,
        node_count,
        edge_count,
    };
    template.render().map_err(|e| IoError::Write(e.to_string()))
}

/// Render the login page, optionally with an error message
pub fn render_login(error: Option<&str>) -> IoResult<String> {
    LoginTemplate { error }
        .render()
        .map_err(|e| IoError::Write(e.to_string()))
}

/// Writer for the static HTML site (`index.html` + `cluster.html`)
pub struct HtmlWriter;

impl HtmlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for HtmlWriter {
    fn write(&self, dataset: &Dataset, output: &Path) -> IoResult<()> {
        fs::create_dir_all(output)?;

        let state = LoadState::Ready(dataset.clone());
        let nav = Nav::static_site();
        fs::write(output.join("index.html"), render_route_map(&state, &nav)?)?;
        fs::write(output.join("cluster.html"), render_cluster(&state, &nav)?)?;
        Ok(())
    }

    fn format_id(&self) -> &str {
        "html"
    }
}
