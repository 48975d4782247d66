//! tradegraph - trade-shipment route map and cluster graph generator.
//!
//! Shipment records fetched from a spreadsheet-backed API are normalized and
//! projected onto a deduplicated cluster graph and a set of map routes, which
//! are written out as JSON and HTML or served behind a password gate.

pub mod auth;
pub mod dataset;
pub mod detail;
pub mod graph_writer;
pub mod html_writer;
pub mod io;
pub mod normalize;
pub mod record;
pub mod routes;
pub mod selection;
pub mod server;
pub mod source;
pub mod view;
