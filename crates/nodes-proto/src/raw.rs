//! Flat, unvalidated-shape view of a stream for inspection tooling.
//!
//! Unlike [`crate::read_tree`] this never materializes the tree, so it also
//! works on graphs that are not trees.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Serialize;
use uast_nodes::{Kind, Value};

use crate::error::DecodeResult;
use crate::graph::{read_graph, Graph};
use crate::options::DecodeOptions;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawNode {
    pub id: u64,
    pub kind: Kind,
    #[serde(rename = "val", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawGraph {
    #[serde(skip_serializing_if = "is_zero")]
    pub root: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub meta: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last: u64,
    pub nodes: BTreeMap<u64, RawNode>,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl RawGraph {
    /// Tab-indented JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl From<&Graph> for RawGraph {
    fn from(g: &Graph) -> Self {
        let nodes = g
            .records()
            .map(|rec| {
                let kind = rec.kind();
                let node = RawNode {
                    id: rec.id,
                    kind,
                    value: rec.value.clone(),
                    keys: if kind == Kind::Object {
                        rec.keys.clone()
                    } else {
                        Vec::new()
                    },
                    values: if kind.is_value() {
                        Vec::new()
                    } else {
                        rec.values.clone()
                    },
                };
                (rec.id, node)
            })
            .collect();
        RawGraph {
            root: g.root(),
            meta: g.metadata(),
            last: g.last_id(),
            nodes,
        }
    }
}

/// Reads a stream into a flat id → node map.
pub fn read_raw<R: Read>(r: R) -> DecodeResult<RawGraph> {
    read_raw_with(r, &DecodeOptions::default())
}

pub fn read_raw_with<R: Read>(r: R, options: &DecodeOptions) -> DecodeResult<RawGraph> {
    let graph = read_graph(r, options)?;
    Ok(RawGraph::from(&graph))
}
