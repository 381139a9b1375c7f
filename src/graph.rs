//! Static edge-weighted graph consumed by the searches.
//! Each undirected edge `e` is stored as the arc pair `2e` / `2e + 1`; outgoing
//! arcs of a node form a singly linked list (`first_out` / `next_out`).

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArcId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize { self.0 as usize }

    #[inline(always)]
    pub fn from_index(i: usize) -> Self {
        debug_assert!(i <= u32::MAX as usize);
        NodeId(i as u32)
    }
}

impl ArcId {
    #[inline(always)]
    pub fn index(self) -> usize { self.0 as usize }

    /// The opposite arc of the same undirected edge.
    #[inline(always)]
    pub fn rev(self) -> ArcId { ArcId(self.0 ^ 1) }

    #[inline(always)]
    pub fn edge(self) -> EdgeId { EdgeId(self.0 / 2) }
}

impl EdgeId {
    #[inline(always)]
    pub fn index(self) -> usize { self.0 as usize }

    /// The arc of this edge that was added in the `u -> v` direction.
    #[inline(always)]
    pub fn forward(self) -> ArcId { ArcId(self.0 * 2) }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "n{}", self.0) }
}

/// Terminal classification of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalKind {
    /// Plain Steiner node.
    #[default]
    Steiner,
    /// Required terminal.
    Proper,
    /// Optional terminal carrying a prize (prize-collecting / maximum-weight).
    Pseudo,
    /// Terminal of a rooted variant that must be connected regardless of profit.
    Fixed,
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("node {node} out of range (graph has {nodes} nodes)")]
    NodeOutOfRange { node: u32, nodes: usize },
    #[error("self loop at node {0}")]
    SelfLoop(u32),
    #[error("invalid arc cost {0} (must be finite and non-negative)")]
    InvalidCost(f64),
    #[error("invalid prize {prize} at node {node}")]
    InvalidPrize { node: u32, prize: f64 },
    #[error("malformed CSR: {0}")]
    MalformedCsr(String),
}

#[derive(Clone, Debug)]
pub struct Graph {
    mark: Vec<bool>,
    kind: Vec<TerminalKind>,
    prize: Vec<f64>,
    degree: Vec<u32>,
    first_out: Vec<Option<ArcId>>,
    next_out: Vec<Option<ArcId>>,
    head: Vec<NodeId>,
    tail: Vec<NodeId>,
    cost: Vec<f64>,
    root: Option<NodeId>,
}

impl Graph {
    /// Graph with `n` marked Steiner nodes and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            mark: vec![true; n],
            kind: vec![TerminalKind::Steiner; n],
            prize: vec![0.0; n],
            degree: vec![0; n],
            first_out: vec![None; n],
            next_out: Vec::new(),
            head: Vec::new(),
            tail: Vec::new(),
            cost: Vec::new(),
            root: None,
        }
    }

    #[inline(always)]
    pub fn node_count(&self) -> usize { self.mark.len() }
    #[inline(always)]
    pub fn arc_count(&self) -> usize { self.head.len() }
    #[inline(always)]
    pub fn edge_count(&self) -> usize { self.head.len() / 2 }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> { (0..self.node_count()).map(NodeId::from_index) }

    fn check_node(&self, v: NodeId) -> Result<(), GraphError> {
        if v.index() < self.node_count() { Ok(()) } else { Err(GraphError::NodeOutOfRange { node: v.0, nodes: self.node_count() }) }
    }

    /// Adds an undirected edge with the same cost in both directions.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, cost: f64) -> Result<EdgeId, GraphError> {
        self.add_arc_pair(u, v, cost, cost)
    }

    /// Adds an edge whose arcs `u -> v` and `v -> u` cost `forward` and `backward`.
    pub fn add_arc_pair(&mut self, u: NodeId, v: NodeId, forward: f64, backward: f64) -> Result<EdgeId, GraphError> {
        self.check_node(u)?;
        self.check_node(v)?;
        if u == v { return Err(GraphError::SelfLoop(u.0)); }
        for c in [forward, backward] {
            if !c.is_finite() || c < 0.0 { return Err(GraphError::InvalidCost(c)); }
        }
        let edge = EdgeId(self.edge_count() as u32);
        self.push_arc(u, v, forward);
        self.push_arc(v, u, backward);
        Ok(edge)
    }

    fn push_arc(&mut self, tail: NodeId, head: NodeId, cost: f64) {
        let a = ArcId(self.head.len() as u32);
        self.head.push(head);
        self.tail.push(tail);
        self.cost.push(cost);
        self.next_out.push(self.first_out[tail.index()]);
        self.first_out[tail.index()] = Some(a);
        self.degree[tail.index()] += 1;
    }

    pub fn set_terminal(&mut self, v: NodeId, kind: TerminalKind) -> Result<(), GraphError> {
        self.check_node(v)?;
        self.kind[v.index()] = kind;
        Ok(())
    }

    pub fn set_prize(&mut self, v: NodeId, prize: f64) -> Result<(), GraphError> {
        self.check_node(v)?;
        if !prize.is_finite() || prize < 0.0 { return Err(GraphError::InvalidPrize { node: v.0, prize }); }
        self.prize[v.index()] = prize;
        Ok(())
    }

    pub fn set_root(&mut self, v: NodeId) -> Result<(), GraphError> {
        self.check_node(v)?;
        self.root = Some(v);
        Ok(())
    }

    #[inline(always)]
    pub fn root(&self) -> Option<NodeId> { self.root }
    #[inline(always)]
    pub fn kind(&self, v: NodeId) -> TerminalKind { self.kind[v.index()] }
    #[inline(always)]
    pub fn prize(&self, v: NodeId) -> f64 { self.prize[v.index()] }
    #[inline(always)]
    pub fn degree(&self, v: NodeId) -> usize { self.degree[v.index()] as usize }
    #[inline(always)]
    pub fn is_marked(&self, v: NodeId) -> bool { self.mark[v.index()] }
    #[inline(always)]
    pub fn set_mark(&mut self, v: NodeId, mark: bool) { self.mark[v.index()] = mark; }

    /// Required terminal: proper or fixed.
    #[inline(always)]
    pub fn is_terminal(&self, v: NodeId) -> bool {
        matches!(self.kind[v.index()], TerminalKind::Proper | TerminalKind::Fixed)
    }
    #[inline(always)]
    pub fn is_pseudo_terminal(&self, v: NodeId) -> bool { self.kind[v.index()] == TerminalKind::Pseudo }
    #[inline(always)]
    pub fn is_fixed_terminal(&self, v: NodeId) -> bool { self.kind[v.index()] == TerminalKind::Fixed }

    /// Any terminal kind; such nodes may have their prize credited by a walk.
    #[inline(always)]
    pub fn carries_prize(&self, v: NodeId) -> bool { self.kind[v.index()] != TerminalKind::Steiner }

    /// Required terminals in id order.
    pub fn terminals(&self) -> impl Iterator<Item = NodeId> + '_ { self.nodes().filter(|&v| self.is_terminal(v)) }

    /// Required and pseudo terminals in id order.
    pub fn all_terminals(&self) -> impl Iterator<Item = NodeId> + '_ { self.nodes().filter(|&v| self.carries_prize(v)) }

    pub fn terminal_count(&self) -> usize { self.terminals().count() }

    #[inline(always)]
    pub fn first_out(&self, v: NodeId) -> Option<ArcId> { self.first_out[v.index()] }
    #[inline(always)]
    pub fn next_out(&self, a: ArcId) -> Option<ArcId> { self.next_out[a.index()] }
    #[inline(always)]
    pub fn head(&self, a: ArcId) -> NodeId { self.head[a.index()] }
    #[inline(always)]
    pub fn tail(&self, a: ArcId) -> NodeId { self.tail[a.index()] }
    #[inline(always)]
    pub fn cost(&self, a: ArcId) -> f64 { self.cost[a.index()] }

    /// Arc costs indexed by `ArcId`.
    pub fn costs(&self) -> &[f64] { &self.cost }

    /// Arc costs where arc `a` carries the cost of `a.rev()`.
    pub fn reversed_costs(&self) -> Vec<f64> {
        (0..self.arc_count()).map(|a| self.cost[a ^ 1]).collect()
    }

    pub fn out_arcs(&self, v: NodeId) -> OutArcs<'_> { OutArcs { graph: self, next: self.first_out(v) } }

    pub fn find_arc(&self, u: NodeId, v: NodeId) -> Option<ArcId> { self.out_arcs(u).find(|&a| self.head(a) == v) }
}

pub struct OutArcs<'g> {
    graph: &'g Graph,
    next: Option<ArcId>,
}

impl Iterator for OutArcs<'_> {
    type Item = ArcId;

    #[inline]
    fn next(&mut self) -> Option<ArcId> {
        let a = self.next?;
        self.next = self.graph.next_out(a);
        Some(a)
    }
}

/// Temporarily clears the marks of (up to) two nodes; the previous marks are
/// restored when the guard is dropped, on every exit path.
pub struct MarkGuard<'g> {
    graph: &'g mut Graph,
    saved: [(NodeId, bool); 2],
}

impl<'g> MarkGuard<'g> {
    pub fn unmark_pair(graph: &'g mut Graph, a: NodeId, b: NodeId) -> Self {
        let saved = [(a, graph.is_marked(a)), (b, graph.is_marked(b))];
        graph.set_mark(a, false);
        graph.set_mark(b, false);
        Self { graph, saved }
    }
}

impl Deref for MarkGuard<'_> {
    type Target = Graph;

    fn deref(&self) -> &Graph { self.graph }
}

impl Drop for MarkGuard<'_> {
    fn drop(&mut self) {
        for &(v, mark) in self.saved.iter().rev() {
            self.graph.set_mark(v, mark);
        }
    }
}
