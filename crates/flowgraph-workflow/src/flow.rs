use std::collections::HashMap;

use flowgraph_config::{EdgeDef, FlowRequest, InputValue, InputValues, NodeDef, NodeKind};

use crate::error::WorkflowError;
use crate::graph::Graph;

/// An indexed graph ready for one execution.
#[derive(Debug, Clone)]
pub struct Flow {
  nodes: HashMap<String, NodeDef>,
  edges: Vec<EdgeDef>,
  input_values: InputValues,
  graph: Graph,
  diagnostics: Vec<WorkflowError>,
}

impl Flow {
  /// Index a request.
  ///
  /// When two nodes share an id the first one wins and the duplicate is
  /// recorded as a diagnostic.
  pub fn new(request: FlowRequest) -> Self {
    let FlowRequest {
      nodes: node_list,
      edges,
      input_values,
    } = request;

    let mut diagnostics = Vec::new();
    let mut nodes = HashMap::with_capacity(node_list.len());
    for node in node_list {
      if nodes.contains_key(&node.id) {
        diagnostics.push(WorkflowError::DuplicateNode(node.id));
        continue;
      }
      nodes.insert(node.id.clone(), node);
    }

    for edge in &edges {
      if !nodes.contains_key(&edge.source) || !nodes.contains_key(&edge.target) {
        diagnostics.push(WorkflowError::InvalidEdge {
          from: edge.source.clone(),
          to: edge.target.clone(),
        });
      }
    }

    let graph = Graph::new(&nodes, &edges);

    Self {
      nodes,
      edges,
      input_values,
      graph,
      diagnostics,
    }
  }

  /// Get a node by ID.
  pub fn node(&self, node_id: &str) -> Option<&NodeDef> {
    self.nodes.get(node_id)
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// All edges in request order.
  pub fn edges(&self) -> &[EdgeDef] {
    &self.edges
  }

  /// The edge at `position` in request order.
  pub fn edge(&self, position: usize) -> Option<&EdgeDef> {
    self.edges.get(position)
  }

  /// Edges ending at `node_id`, in request order.
  pub fn incoming(&self, node_id: &str) -> impl Iterator<Item = &EdgeDef> + '_ {
    self
      .graph
      .incoming(node_id)
      .iter()
      .filter_map(|&position| self.edges.get(position))
  }

  /// Positions of edges that end at sink nodes.
  pub fn sink_edges(&self) -> &[usize] {
    self.graph.sink_edges()
  }

  /// Positions of edges ending at nodes whose kind satisfies `kinds`.
  pub fn edges_into(&self, kinds: impl Fn(&NodeKind) -> bool) -> Vec<usize> {
    Graph::positions_into(&self.nodes, &self.edges, kinds)
  }

  /// Literal supplied for an input node.
  ///
  /// The request's `inputValues` entry wins over a value inlined on the node.
  pub fn input_value(&self, node_id: &str) -> Option<&InputValue> {
    self
      .input_values
      .get(node_id)
      .or_else(|| self.node(node_id).and_then(|n| n.value.as_ref()))
  }

  /// Structural problems noticed while indexing.
  pub fn diagnostics(&self) -> &[WorkflowError] {
    &self.diagnostics
  }
}

impl From<FlowRequest> for Flow {
  fn from(request: FlowRequest) -> Self {
    Self::new(request)
  }
}
