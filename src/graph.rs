use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::edge_list::EdgeList;

/// Directed graph whose nodes are the labels found in an edge list.
///
/// Node indices follow first appearance in the edge list. Repeated arcs are
/// stored once; self-loops are kept.
#[derive(Debug, Clone, Default)]
pub struct LabelGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl LabelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: &EdgeList) -> Self {
        let mut graph = LabelGraph::new();
        for edge in edges {
            graph.add_edge(&edge.source, &edge.target);
        }
        graph
    }

    pub fn add_node(&mut self, label: &str) -> NodeIndex {
        if let Some(&node) = self.index.get(label) {
            return node;
        }
        let node = self.graph.add_node(label.to_string());
        self.index.insert(label.to_string(), node);
        node
    }

    pub fn add_edge(&mut self, source: &str, target: &str) {
        let s = self.add_node(source);
        let t = self.add_node(target);
        if !self.graph.contains_edge(s, t) {
            self.graph.add_edge(s, t, ());
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.index.get(label).copied()
    }

    pub fn label(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn inner(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    /// Label of a node on some cycle, or `None` for a DAG.
    pub fn find_cycle(&self) -> Option<String> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.label(cycle.node_id()).to_string())
    }

    pub fn is_dag(&self) -> bool {
        self.find_cycle().is_none()
    }
}
