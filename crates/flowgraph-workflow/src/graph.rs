use std::collections::HashMap;

use flowgraph_config::{EdgeDef, NodeDef, NodeKind};

/// Edge indexes for dependency lookup and sink detection.
///
/// Edges are referred to by their position in the request's edge list, so
/// every index preserves edge-list order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// target node_id -> positions of edges ending there.
  incoming: HashMap<String, Vec<usize>>,
  /// Positions of edges whose target is a sink node.
  sink_edges: Vec<usize>,
}

impl Graph {
  /// Build the indexes from nodes and edges.
  pub fn new(nodes: &HashMap<String, NodeDef>, edges: &[EdgeDef]) -> Self {
    let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();

    for (position, edge) in edges.iter().enumerate() {
      incoming
        .entry(edge.target.clone())
        .or_default()
        .push(position);
    }

    let sink_edges = Self::positions_into(nodes, edges, NodeKind::is_sink);

    Self {
      incoming,
      sink_edges,
    }
  }

  /// Positions of edges whose target node kind satisfies `kinds`.
  ///
  /// Edges whose target is not a known node never match.
  pub fn positions_into(
    nodes: &HashMap<String, NodeDef>,
    edges: &[EdgeDef],
    kinds: impl Fn(&NodeKind) -> bool,
  ) -> Vec<usize> {
    edges
      .iter()
      .enumerate()
      .filter(|(_, edge)| nodes.get(&edge.target).is_some_and(|n| kinds(&n.kind)))
      .map(|(position, _)| position)
      .collect()
  }

  /// Positions of the edges ending at `node_id`.
  pub fn incoming(&self, node_id: &str) -> &[usize] {
    self
      .incoming
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Positions of the edges ending at sink nodes.
  pub fn sink_edges(&self) -> &[usize] {
    &self.sink_edges
  }
}
