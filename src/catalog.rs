//! Sensor catalog: fetch the hardware monitor's tree and flatten it.
//!
//! The monitor serves one JSON tree per request:
//!
//! ```text
//! { "id": 0, "Text": "Sensor", "Min": "", "Value": "", "Max": "", "Children": [
//!     { "id": 1, "Text": "MY-PC", "Children": [
//!         { "id": 2, "Text": "Intel Core i7", "Children": [
//!             { "id": 3, "Text": "Temperatures", "Children": [
//!                 { "id": 4, "Text": "CPU Package", "Value": "52.0 °C", "Min": "38.0 °C", "Max": "71.0 °C" }
//! ...
//! ```
//!
//! # Naming
//!
//! [`flatten`] walks the tree depth-first and emits every node, groups
//! included, as a [`SensorReading`]. A node's name is its inherited prefix plus
//! its own `Text`. A node passes `"<its name>/"` down to its children only when
//! its `id` is greater than 1; nodes with `id <= 1` pass their own inherited
//! prefix through unchanged. On the monitor's layout (root `id` 0, machine
//! `id` 1) this keeps the root and machine labels out of every sensor name, so
//! the example above yields `"Intel Core i7/Temperatures/CPU Package"`.
//!
//! # Failure
//!
//! One GET, no retry. Transport failures and non-200 answers are
//! [`Error::Fetch`]/[`Error::HttpStatus`], bodies that are not a tree are
//! [`Error::Parse`]. The engine's next tick is the retry.

use std::future::Future;
use std::time::Duration;

use log::trace;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::reading::{SensorReading, SensorValue};

/// One node of the raw tree. Only lives for a single fetch.
#[derive(Debug, Deserialize)]
pub struct CatalogNode {
    #[serde(rename = "Text", default)]
    pub text: String,
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "Value", default)]
    pub value: SensorValue,
    #[serde(rename = "Min", default)]
    pub min: SensorValue,
    #[serde(rename = "Max", default)]
    pub max: SensorValue,
    #[serde(rename = "Children", default)]
    pub children: Vec<CatalogNode>,
}

/// Flatten a tree into readings, depth-first, parents before children.
pub fn flatten(root: CatalogNode) -> Vec<SensorReading> {
    let mut readings = Vec::new();
    visit("", root, &mut readings);
    readings
}

fn visit(
    prefix: &str,
    node: CatalogNode,
    out: &mut Vec<SensorReading>,
) {
    let full_name = format!("{prefix}{}", node.text);
    let child_prefix = if node.id > 1 { format!("{full_name}/") } else { prefix.to_string() };

    let reading = SensorReading::new(full_name, node.value).with_range(node.min.as_f64(), node.max.as_f64());
    out.push(reading);

    for child in node.children {
        visit(&child_prefix, child, out);
    }
}

/// Parse a response body into flattened readings.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<SensorReading>> {
    let root: CatalogNode = serde_json::from_slice(body)?;
    Ok(flatten(root))
}

// =============================================================================
// Sources
// =============================================================================

/// Something that can produce the current flat sensor list.
///
/// The engine calls `fetch` once per tick from a spawned task, hence the
/// `Send + Sync + 'static` bounds.
pub trait SensorSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<SensorReading>>> + Send;
}

/// HTTP source for the hardware monitor's `data.json`.
pub struct HttpCatalog {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCatalog {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }
}

impl SensorSource for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<SensorReading>> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::HttpStatus(status));
        }
        let body = response.bytes().await?;
        let readings = parse_catalog(&body)?;
        trace!("fetched {} readings from {}", readings.len(), self.endpoint);
        Ok(readings)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FETCH_TIMEOUT, SENSOR_ENDPOINT};

    fn names(readings: &[SensorReading]) -> Vec<&str> { readings.iter().map(SensorReading::full_name).collect() }

    fn parse(json: &str) -> Result<Vec<SensorReading>> { parse_catalog(json.as_bytes()) }

    #[test]
    fn test_prefix_rule_fixture() {
        // A (id 1) does not pass a prefix down, B (id 2) does.
        let json = r#"{"Text":"A","id":1,"Children":[{"Text":"B","id":2,"Children":[{"Text":"C","id":3}]}]}"#;
        let readings = parse(json).unwrap();
        assert_eq!(names(&readings), ["A", "B", "B/C"]);
    }

    #[test]
    fn test_monitor_layout_drops_root_and_machine_labels() {
        let json = r#"{
            "id": 0, "Text": "Sensor", "Min": "", "Value": "", "Max": "",
            "Children": [{
                "id": 1, "Text": "MY-PC", "Min": "", "Value": "", "Max": "",
                "Children": [{
                    "id": 2, "Text": "Intel Core i7", "Min": "", "Value": "", "Max": "",
                    "Children": [{
                        "id": 3, "Text": "Temperatures", "Min": "", "Value": "", "Max": "",
                        "Children": [{
                            "id": 4, "Text": "CPU Package",
                            "Min": "38.0 °C", "Value": "52.0 °C", "Max": "71.0 °C",
                            "Children": []
                        }]
                    }]
                }]
            }]
        }"#;
        let readings = parse(json).unwrap();
        assert_eq!(
            names(&readings),
            [
                "Sensor",
                "MY-PC",
                "Intel Core i7",
                "Intel Core i7/Temperatures",
                "Intel Core i7/Temperatures/CPU Package",
            ]
        );

        let package = &readings[4];
        assert_eq!(package.numeric_value(), Some(52.0));
        assert_eq!(package.min(), Some(38.0));
        assert_eq!(package.max(), Some(71.0));
        assert_eq!(package.ordinal(), 0, "Ordinals are assigned by bindings, not the fetcher");
    }

    #[test]
    fn test_every_node_is_emitted_depth_first() {
        let json = r#"{"Text":"R","id":5,"Children":[
            {"Text":"X","id":6,"Children":[{"Text":"X1","id":7}]},
            {"Text":"Y","id":8}
        ]}"#;
        let readings = parse(json).unwrap();
        assert_eq!(names(&readings), ["R", "R/X", "R/X/X1", "R/Y"]);
    }

    #[test]
    fn test_group_nodes_have_absent_values() {
        let json = r#"{"Text":"Group","id":2,"Value":"","Children":[]}"#;
        let readings = parse(json).unwrap();
        assert!(readings[0].value().is_absent());
        assert_eq!(readings[0].min(), None);
    }

    #[test]
    fn test_numeric_json_values_are_accepted() {
        let json = r#"{"Text":"Fan","id":2,"Value":1200,"Min":0,"Max":2400}"#;
        let readings = parse(json).unwrap();
        assert_eq!(readings[0].numeric_value(), Some(1200.0));
        assert_eq!(readings[0].max(), Some(2400.0));
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let err = parse("{\"Text\": ").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "Truncated JSON should be a parse error");
        assert!(!err.is_fetch());

        let err = parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "A JSON array is not a tree");
    }

    #[test]
    fn test_http_catalog_keeps_endpoint() {
        let catalog = HttpCatalog::new(SENSOR_ENDPOINT, FETCH_TIMEOUT).unwrap();
        assert_eq!(catalog.endpoint(), "http://localhost:8085/data.json");
    }
}
