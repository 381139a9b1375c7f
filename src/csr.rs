//! Compact range adjacency: `offsets` of length n+1 into parallel
//! `heads` / `costs` / `arcs` arrays, neighbors of each node sorted by id.

use std::ops::Range;

use crate::graph::{ArcId, Graph, GraphError, NodeId};

#[derive(Clone, Debug)]
pub struct Csr {
    offsets: Vec<u32>,
    heads: Vec<NodeId>,
    costs: Vec<f64>,
    arcs: Vec<ArcId>,
}

impl Csr {
    /// Marked nodes only; arcs into unmarked nodes are dropped.
    pub fn from_graph(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut heads = Vec::with_capacity(graph.arc_count());
        let mut costs = Vec::with_capacity(graph.arc_count());
        let mut arcs = Vec::with_capacity(graph.arc_count());
        let mut row: Vec<ArcId> = Vec::new();
        offsets.push(0);
        for v in graph.nodes() {
            row.clear();
            if graph.is_marked(v) {
                row.extend(graph.out_arcs(v).filter(|&a| graph.is_marked(graph.head(a))));
                row.sort_unstable_by_key(|&a| (graph.head(a), a));
            }
            for &a in &row {
                heads.push(graph.head(a));
                costs.push(graph.cost(a));
                arcs.push(a);
            }
            offsets.push(heads.len() as u32);
        }
        Self { offsets, heads, costs, arcs }
    }

    /// Raw CSR arrays. Rows are sorted by head here; `arcs()` then holds each
    /// entry's position in the caller's original layout.
    pub fn from_parts(offsets: &[u32], targets: &[u32], weights: &[f64]) -> Result<Self, GraphError> {
        if offsets.is_empty() { return Err(GraphError::MalformedCsr("offsets must have length n+1".into())); }
        let n = offsets.len() - 1;
        if offsets[0] != 0 || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(GraphError::MalformedCsr("offsets must start at 0 and be monotone".into()));
        }
        let m = offsets[n] as usize;
        if targets.len() < m || weights.len() < m {
            return Err(GraphError::MalformedCsr(format!("expected {m} targets and weights")));
        }
        let mut heads = Vec::with_capacity(m);
        let mut costs = Vec::with_capacity(m);
        let mut arcs = Vec::with_capacity(m);
        let mut row: Vec<usize> = Vec::new();
        for v in 0..n {
            row.clear();
            row.extend(offsets[v] as usize..offsets[v + 1] as usize);
            for &e in &row {
                if targets[e] as usize >= n { return Err(GraphError::NodeOutOfRange { node: targets[e], nodes: n }); }
                if targets[e] as usize == v { return Err(GraphError::SelfLoop(targets[e])); }
                if !weights[e].is_finite() || weights[e] < 0.0 { return Err(GraphError::InvalidCost(weights[e])); }
            }
            row.sort_unstable_by_key(|&e| (targets[e], e));
            for &e in &row {
                heads.push(NodeId(targets[e]));
                costs.push(weights[e]);
                arcs.push(ArcId(e as u32));
            }
        }
        Ok(Self { offsets: offsets[..=n].to_vec(), heads, costs, arcs })
    }

    #[inline(always)]
    pub fn node_count(&self) -> usize { self.offsets.len() - 1 }

    #[inline(always)]
    pub fn range(&self, v: NodeId) -> Range<usize> {
        self.offsets[v.index()] as usize..self.offsets[v.index() + 1] as usize
    }

    #[inline(always)]
    pub fn degree(&self, v: NodeId) -> usize { self.range(v).len() }

    #[inline(always)]
    pub fn heads(&self) -> &[NodeId] { &self.heads }
    #[inline(always)]
    pub fn costs(&self) -> &[f64] { &self.costs }
    #[inline(always)]
    pub fn arcs(&self) -> &[ArcId] { &self.arcs }
}
