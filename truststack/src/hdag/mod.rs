//! Hyperdimensional DAG of named feature vectors.
//!
//! The [`Hdag`] owns a set of named [`Vector`] nodes and a directed,
//! weighted edge list. Like the ledger it is append-only: nodes are
//! insert-or-replace and never removed, edges are appended and never
//! deduplicated or deleted (documented choice). Node iteration order and
//! `neighbors` results are insertion order, which also makes
//! [`Hdag::digest`] deterministic.
//!
//! Resonance is the graph's core metric: cosine similarity between two
//! vectors, with zero-norm operands mapping to `0.0` (see
//! [`vector`] for the policy).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Hash256, canonical_bytes};

pub mod vector;

pub use vector::{DimensionMismatch, Vector};

/// Errors returned by graph operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HdagError {
    /// An operation referenced a node id that was never added.
    UnknownNode(String),
    /// Two vectors of different lengths were combined.
    Dimension(DimensionMismatch),
}

impl fmt::Display for HdagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdagError::UnknownNode(id) => write!(f, "unknown node: {id}"),
            HdagError::Dimension(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HdagError {}

impl From<DimensionMismatch> for HdagError {
    fn from(e: DimensionMismatch) -> Self {
        HdagError::Dimension(e)
    }
}

/// Directed, weighted edge between two named nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f32,
}

/// One node of the exchange representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRepr {
    pub id: String,
    pub vector: Vector,
}

/// Exchange representation of a whole graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HdagRepr {
    pub nodes: Vec<NodeRepr>,
    pub edges: Vec<Edge>,
}

/// Directed graph of named tensor nodes and weighted edges.
#[derive(Clone, Debug, Default)]
pub struct Hdag {
    nodes: HashMap<String, Vector>,
    // Node ids in first-insertion order; replacement keeps the slot.
    node_order: Vec<String>,
    edges: Vec<Edge>,
}

impl Hdag {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node stored under `id`.
    ///
    /// Replacing keeps the node's original position in the insertion
    /// order, so representations and digests stay stable apart from the
    /// vector itself.
    pub fn add_node(&mut self, id: &str, vector: Vector) {
        if self.nodes.insert(id.to_string(), vector).is_none() {
            self.node_order.push(id.to_string());
        }
    }

    /// Appends a directed edge between two existing nodes.
    ///
    /// Fails with [`HdagError::UnknownNode`] if either endpoint is
    /// absent. Duplicate edges between the same ordered pair are allowed.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: f32) -> Result<(), HdagError> {
        if !self.nodes.contains_key(source) {
            return Err(HdagError::UnknownNode(source.to_string()));
        }
        if !self.nodes.contains_key(target) {
            return Err(HdagError::UnknownNode(target.to_string()));
        }
        self.edges.push(Edge {
            source: source.to_string(),
            target: target.to_string(),
            weight,
        });
        Ok(())
    }

    /// Cosine similarity between two vectors.
    ///
    /// Zero-norm operands yield `0.0`; unequal lengths are an error.
    pub fn resonance(&self, x: &Vector, y: &Vector) -> Result<f32, HdagError> {
        Ok(x.cosine(y)?)
    }

    /// Resonance between two stored nodes, looked up by id.
    pub fn node_resonance(&self, a: &str, b: &str) -> Result<f32, HdagError> {
        let va = self.node(a).ok_or_else(|| HdagError::UnknownNode(a.to_string()))?;
        let vb = self.node(b).ok_or_else(|| HdagError::UnknownNode(b.to_string()))?;
        self.resonance(va, vb)
    }

    /// Returns the outgoing `(target, weight)` pairs of `id`, in
    /// edge-insertion order.
    pub fn neighbors(&self, id: &str) -> Result<Vec<(String, f32)>, HdagError> {
        if !self.nodes.contains_key(id) {
            return Err(HdagError::UnknownNode(id.to_string()));
        }
        Ok(self
            .edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| (e.target.clone(), e.weight))
            .collect())
    }

    /// Returns the vector stored under `id`, if any.
    pub fn node(&self, id: &str) -> Option<&Vector> {
        self.nodes.get(id)
    }

    /// Returns `true` if `id` was added via [`Hdag::add_node`].
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    /// Returns the number of edges (duplicates included).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Computes the deterministic content digest of the whole graph.
    ///
    /// BLAKE3-256 over the canonical bincode encoding of the node list
    /// (in insertion order, as `(id, vector)` pairs) followed by the edge
    /// list. Capsules store this digest as their `hdag_ref`; any later
    /// node, vector, or edge change produces a different digest.
    pub fn digest(&self) -> Hash256 {
        let nodes: Vec<(&String, &Vector)> = self
            .node_order
            .iter()
            .map(|id| {
                let vector = self
                    .nodes
                    .get(id)
                    .expect("node_order entries always have a stored vector");
                (id, vector)
            })
            .collect();
        Hash256::compute(&canonical_bytes(&(nodes, &self.edges)))
    }

    /// Selects the node whose vector maximises total resonance against
    /// all stored vectors.
    ///
    /// Pairs with mismatched dimensions contribute `0.0`. Ties keep the
    /// earlier-inserted node. Returns `None` on an empty graph.
    pub fn attractor(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;

        for candidate_id in &self.node_order {
            let candidate = &self.nodes[candidate_id.as_str()];
            let total: f32 = self
                .node_order
                .iter()
                .map(|other_id| {
                    candidate
                        .cosine(&self.nodes[other_id.as_str()])
                        .unwrap_or(0.0)
                })
                .sum();

            match best {
                Some((_, best_score)) if total <= best_score => {}
                _ => best = Some((candidate_id.as_str(), total)),
            }
        }

        best
    }

    /// Serializes the nodes (insertion order) and edges for exchange.
    pub fn to_representation(&self) -> HdagRepr {
        let nodes = self
            .node_order
            .iter()
            .map(|id| NodeRepr {
                id: id.clone(),
                vector: self.nodes[id.as_str()].clone(),
            })
            .collect();
        HdagRepr {
            nodes,
            edges: self.edges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-3;

    fn sample_graph() -> Hdag {
        let mut g = Hdag::new();
        g.add_node("sensor", Vector::from_slice(&[1.0, 0.5, 0.1]));
        g.add_node("feature", Vector::from_slice(&[0.8, 0.55, 0.05]));
        g.add_edge("sensor", "feature", 0.9).unwrap();
        g
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut g = Hdag::new();
        g.add_node("a", Vector::from_slice(&[1.0]));

        let err = g.add_edge("a", "missing", 0.5).unwrap_err();
        assert_eq!(err, HdagError::UnknownNode("missing".to_string()));

        let err = g.add_edge("missing", "a", 0.5).unwrap_err();
        assert_eq!(err, HdagError::UnknownNode("missing".to_string()));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_edges_are_kept() {
        let mut g = sample_graph();
        g.add_edge("sensor", "feature", 0.9).unwrap();
        assert_eq!(g.edge_count(), 2);

        let n = g.neighbors("sensor").unwrap();
        assert_eq!(n.len(), 2);
    }

    #[test]
    fn neighbors_in_edge_insertion_order() {
        let mut g = Hdag::new();
        g.add_node("hub", Vector::from_slice(&[1.0]));
        g.add_node("x", Vector::from_slice(&[1.0]));
        g.add_node("y", Vector::from_slice(&[1.0]));
        g.add_edge("hub", "y", 0.2).unwrap();
        g.add_edge("hub", "x", 0.7).unwrap();

        let n = g.neighbors("hub").unwrap();
        assert_eq!(n, vec![("y".to_string(), 0.2), ("x".to_string(), 0.7)]);

        let err = g.neighbors("absent").unwrap_err();
        assert_eq!(err, HdagError::UnknownNode("absent".to_string()));
    }

    #[test]
    fn node_resonance_matches_reference_cosine() {
        let g = sample_graph();
        let r = g.node_resonance("sensor", "feature").unwrap();
        assert!((r - 0.98974).abs() < TOL, "got {r}");
    }

    #[test]
    fn add_node_replaces_and_keeps_position() {
        let mut g = sample_graph();
        let before = g.digest();

        g.add_node("sensor", Vector::from_slice(&[0.0, 0.0, 1.0]));
        assert_eq!(g.node_count(), 2);

        let repr = g.to_representation();
        assert_eq!(repr.nodes[0].id, "sensor");
        assert_eq!(repr.nodes[0].vector, Vector::from_slice(&[0.0, 0.0, 1.0]));
        assert_ne!(g.digest(), before);
    }

    #[test]
    fn digest_changes_on_edge_append() {
        let mut g = sample_graph();
        let before = g.digest();
        g.add_edge("feature", "sensor", 0.1).unwrap();
        assert_ne!(g.digest(), before);
    }

    #[test]
    fn digest_is_deterministic_across_instances() {
        let a = sample_graph();
        let b = sample_graph();
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn attractor_prefers_central_vector() {
        let mut g = Hdag::new();
        // "center" is aligned with both others; the outliers disagree
        // with each other, so the center wins on total resonance.
        g.add_node("left", Vector::from_slice(&[1.0, 0.0]));
        g.add_node("center", Vector::from_slice(&[1.0, 1.0]));
        g.add_node("right", Vector::from_slice(&[0.0, 1.0]));

        let (id, score) = g.attractor().unwrap();
        assert_eq!(id, "center");
        assert!(score > 2.0, "got {score}");
    }

    #[test]
    fn attractor_on_empty_graph_is_none() {
        assert!(Hdag::new().attractor().is_none());
    }

    #[test]
    fn representation_round_trips_through_json() {
        let g = sample_graph();
        let json = serde_json::to_string(&g.to_representation()).unwrap();
        let back: HdagRepr = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes.len(), 2);
        assert_eq!(back.nodes[0].id, "sensor");
        assert_eq!(back.edges.len(), 1);
        assert_eq!(back.edges[0].weight, 0.9);
    }
}
