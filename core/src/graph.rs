//! Per-frame interaction graph.
//!
//! The graph is rebuilt from a frame's vertex / edge arrays in one pass and
//! dropped afterwards. It is a simple directed graph: no self loops, at most
//! one edge per ordered pair (the last weight seen wins).

use crate::{
    frame::Frame,
    types::{SpeciesType, Timestep},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodeAttrs {
    pub species_type: SpeciesType,
    pub trait_value:  f64,
    pub niche_width:  f64,
    pub mass:         f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InteractionGraph {
    /// Vertex id → attributes. Endpoints of edges that are not in the
    /// vertex list appear with `None`.
    pub nodes: BTreeMap<u64, Option<NodeAttrs>>,
    /// `(source, target) → weight`.
    pub edges: BTreeMap<(u64, u64), f64>,
}

impl InteractionGraph {
    pub fn from_frame(frame: &Frame) -> Self {
        let mut graph = Self::default();
        for (slot, &id) in frame.vertex_ids.iter().enumerate() {
            graph.nodes.insert(id, Some(NodeAttrs {
                species_type: frame.types[slot],
                trait_value:  frame.traits[slot],
                niche_width:  frame.niche_widths[slot],
                mass:         frame.masses[slot],
            }));
        }
        for edge in &frame.edges {
            if edge.source == edge.target {
                continue;
            }
            graph.nodes.entry(edge.source).or_insert(None);
            graph.nodes.entry(edge.target).or_insert(None);
            graph.edges.insert((edge.source, edge.target), edge.weight);
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `edges / (n * (n - 1))`; zero for graphs with fewer than two nodes.
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1)) as f64
    }

    pub fn out_degree(&self, id: u64) -> usize {
        self.edges.keys().filter(|(s, _)| *s == id).count()
    }

    pub fn in_degree(&self, id: u64) -> usize {
        self.edges.keys().filter(|(_, t)| *t == id).count()
    }
}

/// Graph density of every frame, in frame order.
pub fn density_series(frames: &[Frame]) -> Vec<(Timestep, f64)> {
    frames
        .iter()
        .map(|f| {
            let g = InteractionGraph::from_frame(f);
            debug!(
                "graph t={}: {} nodes, {} edges",
                f.timestep,
                g.node_count(),
                g.edge_count()
            );
            (f.timestep, g.density())
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedNode {
    pub id:   u64,
    /// (trait, niche width, type).
    pub pos:  [f64; 3],
    pub size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedEdge {
    pub from:  [f64; 3],
    pub to:    [f64; 3],
    pub width: f64,
}

/// A graph laid out in (trait, niche width, type) space for 3D drawing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphEmbedding {
    pub timestep: Timestep,
    pub nodes:    Vec<EmbeddedNode>,
    pub edges:    Vec<EmbeddedEdge>,
}

/// Lay out `frame`'s graph. Node sizes are masses scaled so the heaviest
/// node gets `size_scale`; edge widths likewise with `width_scale`.
pub fn embed(frame: &Frame, size_scale: f64, width_scale: f64) -> GraphEmbedding {
    let graph = InteractionGraph::from_frame(frame);
    let pos = |attrs: &NodeAttrs| [attrs.trait_value, attrs.niche_width, attrs.species_type as f64];

    let max_mass = graph
        .nodes
        .values()
        .flatten()
        .map(|a| a.mass)
        .fold(0.0, f64::max);
    let max_weight = graph.edges.values().copied().fold(0.0, f64::max);
    let scaled = |v: f64, max: f64, scale: f64| if max > 0.0 { v / max * scale } else { 0.0 };

    let nodes = graph
        .nodes
        .iter()
        .filter_map(|(&id, attrs)| {
            attrs.as_ref().map(|a| EmbeddedNode {
                id,
                pos:  pos(a),
                size: scaled(a.mass, max_mass, size_scale),
            })
        })
        .collect();

    // Edges touching unplaced nodes have nowhere to be drawn.
    let edges = graph
        .edges
        .iter()
        .filter_map(|(&(s, t), &w)| {
            let from = graph.nodes.get(&s).copied().flatten()?;
            let to = graph.nodes.get(&t).copied().flatten()?;
            Some(EmbeddedEdge {
                from:  pos(&from),
                to:    pos(&to),
                width: scaled(w, max_weight, width_scale),
            })
        })
        .collect();

    GraphEmbedding { timestep: frame.timestep, nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Edge;

    fn frame_with_edges(n: usize, edges: &[(u64, u64, f64)]) -> Frame {
        Frame::new(
            3,
            vec![1; n],
            (0..n).map(|i| i as f64).collect(),
            (1..=n).map(|i| i as f64).collect(),
            vec![0.5; n],
        )
        .unwrap()
        .with_edges(
            edges
                .iter()
                .map(|&(source, target, weight)| Edge { source, target, weight })
                .collect(),
        )
    }

    #[test]
    fn density_of_complete_digraph_is_one() {
        let f = frame_with_edges(3, &[
            (0, 1, 1.0), (1, 0, 1.0), (0, 2, 1.0),
            (2, 0, 1.0), (1, 2, 1.0), (2, 1, 1.0),
        ]);
        assert_eq!(InteractionGraph::from_frame(&f).density(), 1.0);
    }

    #[test]
    fn self_loops_and_duplicates_are_dropped() {
        let f = frame_with_edges(4, &[(0, 0, 1.0), (0, 1, 1.0), (0, 1, 2.5)]);
        let g = InteractionGraph::from_frame(&f);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edges[&(0, 1)], 2.5);
        assert_eq!(g.density(), 1.0 / 12.0);
        assert_eq!(g.out_degree(0), 1);
        assert_eq!(g.in_degree(1), 1);
    }

    #[test]
    fn edges_address_vertex_ids_not_slots() {
        let f = frame_with_edges(2, &[(10, 20, 1.0)])
            .with_vertex_ids(vec![10, 20])
            .unwrap();
        let g = InteractionGraph::from_frame(&f);
        assert_eq!(g.node_count(), 2);
        assert!(g.nodes.values().all(Option::is_some));
        assert_eq!(g.nodes[&20].map(|a| a.mass), Some(2.0));
        assert_eq!(embed(&f, 200.0, 3.0).edges.len(), 1);
    }

    #[test]
    fn unknown_endpoints_become_nodes() {
        let f = frame_with_edges(1, &[(0, 9, 1.0)]);
        let g = InteractionGraph::from_frame(&f);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.nodes[&9], None);
        assert_eq!(g.density(), 0.5);
        assert!(embed(&f, 200.0, 3.0).edges.is_empty());
    }

    #[test]
    fn tiny_graphs_have_zero_density() {
        let f = frame_with_edges(1, &[]);
        assert_eq!(InteractionGraph::from_frame(&f).density(), 0.0);
    }

    #[test]
    fn embedding_scales_by_heaviest_node_and_edge() {
        let f = frame_with_edges(2, &[(0, 1, 2.0), (1, 0, 4.0)]);
        let e = embed(&f, 200.0, 3.0);
        assert_eq!(e.nodes[1].size, 200.0);
        assert_eq!(e.nodes[0].size, 100.0);
        assert_eq!(e.edges[0].width, 1.5);
        assert_eq!(e.edges[1].width, 3.0);
        assert_eq!(e.nodes[0].pos, [0.0, 0.5, 1.0]);
    }
}
