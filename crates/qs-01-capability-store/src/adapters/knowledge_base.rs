//! Hardware knowledge base.
//!
//! A JSON graph of hardware, algorithm and concept nodes:
//!
//! ```json
//! {"nodes": [{"id": "ibm_heron", "type": "hardware", "label": "IBM Heron",
//!             "properties": {"t1": 100.0, "eplg": "3.7E-3"}}],
//!  "edges": []}
//! ```
//!
//! Hardware nodes with a T1 (microseconds) and either `fidelity` or `eplg`
//! (error per layered gate, fidelity = 1 - eplg) seed the capability store
//! so targets are known before their first live telemetry.

use crate::domain::errors::KnowledgeBaseError;
use serde::Deserialize;
use serde_json::Value;
use shared_types::{CapabilityMetrics, CapabilityUpdate, TargetId, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

const HARDWARE: &str = "hardware";

#[derive(Debug, Clone, Deserialize)]
pub struct KbNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KbEdge {
    pub source: String,
    pub target: String,
    pub relationship: String,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraph {
    nodes: Vec<KbNode>,
    #[serde(default)]
    edges: Vec<KbEdge>,
}

/// Parsed knowledge base, keyed by node id.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    nodes: BTreeMap<String, KbNode>,
    edges: Vec<KbEdge>,
}

impl KnowledgeBase {
    pub fn from_json(json: &str) -> Result<Self, KnowledgeBaseError> {
        let graph: KnowledgeGraph = serde_json::from_str(json)?;
        let nodes = graph
            .nodes
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect::<BTreeMap<_, _>>();

        info!(
            nodes = nodes.len(),
            edges = graph.edges.len(),
            "Knowledge base loaded"
        );
        Ok(Self {
            nodes,
            edges: graph.edges,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, KnowledgeBaseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn node(&self, id: &str) -> Option<&KbNode> {
        self.nodes.get(id)
    }

    /// Edges leaving `id`.
    pub fn related(&self, id: &str) -> impl Iterator<Item = &KbEdge> {
        let id = id.to_string();
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Metrics of a hardware node, if it carries enough to build them.
    pub fn hardware_metrics(&self, id: &str) -> Option<CapabilityMetrics> {
        let node = self.nodes.get(id)?;
        if node.node_type != HARDWARE {
            return None;
        }

        let t1_micros = number(node.properties.get("t1")?)?;
        let fidelity = match node.properties.get("fidelity") {
            Some(v) => number(v)?,
            None => 1.0 - number(node.properties.get("eplg")?)?,
        };
        let queue_depth = node
            .properties
            .get("queue_depth")
            .and_then(Value::as_u64)
            .map(|q| q.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0);

        Some(CapabilityMetrics::new(t1_micros * 1e-6, fidelity).with_queue_depth(queue_depth))
    }

    /// One update per usable hardware node, ordered by id.
    ///
    /// Nodes without a T1 or fidelity are skipped; validation of the values
    /// is left to the store.
    pub fn seed_updates(&self, now: Timestamp) -> Vec<CapabilityUpdate> {
        self.nodes
            .values()
            .filter(|n| n.node_type == HARDWARE)
            .filter_map(|n| match self.hardware_metrics(&n.id) {
                Some(metrics) => Some(CapabilityUpdate {
                    target_id: TargetId::new(n.id.clone()),
                    metrics,
                    timestamp: now,
                }),
                None => {
                    debug!(node = %n.id, "Hardware node lacks t1/fidelity, not seeded");
                    None
                }
            })
            .collect()
    }
}

/// Numbers may be written as JSON numbers or strings like "3.7E-3".
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
