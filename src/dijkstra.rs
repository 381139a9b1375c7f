//! Bounded Dijkstra traversal.
//!
//! One generic loop serves two labelings: shortest-path (`dist[u] + c`) and
//! spanning-tree (`c`, Prim's cheapest attachment). The mode is matched once
//! per call and the loop is monomorphized for it. Optional stops: an arc-scan
//! budget, a distance limit, a target node or "every terminal reached".
//!
//! Extracted nodes carry exact labels. After an early stop, labels of nodes
//! still queued are lengths of real paths, so they can only be too long.

use tracing::trace;

use crate::config::SearchConfig;
use crate::graph::{ArcId, Graph, NodeId};
use crate::numeric::{is_gt, is_lt};
use crate::scratch::SearchScratch;

/// Arc cost lookup; implemented for plain cost slices and reversed views.
pub trait ArcCosts: Copy {
    fn arc_cost(self, a: ArcId) -> f64;
}

impl ArcCosts for &[f64] {
    #[inline(always)]
    fn arc_cost(self, a: ArcId) -> f64 { self[a.index()] }
}

/// Reads each arc's cost from its reverse arc, i.e. walks arcs backwards.
#[derive(Copy, Clone, Debug)]
pub struct Reversed<'a>(pub &'a [f64]);

impl ArcCosts for Reversed<'_> {
    #[inline(always)]
    fn arc_cost(self, a: ArcId) -> f64 { self.0[a.rev().index()] }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalMode {
    ShortestPath,
    SpanningTree,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopAt {
    Target(NodeId),
    AllTerminals,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Limits {
    /// Maximum number of arc scans.
    pub edge_budget: Option<u64>,
    /// Labels above this value are not recorded.
    pub distance_limit: Option<f64>,
    pub stop_at: Option<StopAt>,
}

impl Limits {
    pub fn none() -> Self { Self::default() }
    /// No stop condition; edge budget from `config.dijkstra_edge_budget`.
    pub fn from_config(config: &SearchConfig) -> Self { Self { edge_budget: config.dijkstra_edge_budget, ..Self::default() } }
    pub fn with_budget(mut self, budget: u64) -> Self { self.edge_budget = Some(budget); self }
    pub fn with_distance_limit(mut self, limit: f64) -> Self { self.distance_limit = Some(limit); self }
    pub fn stop_at(mut self, stop: StopAt) -> Self { self.stop_at = Some(stop); self }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalOutcome {
    /// Heap ran empty.
    Exhausted,
    TargetReached,
    AllTerminalsReached,
    /// Edge budget exceeded; only extracted labels are final.
    BudgetExceeded,
}

impl TraversalOutcome {
    pub fn is_truncated(self) -> bool { self == TraversalOutcome::BudgetExceeded }
}

trait Labeling {
    fn label(base: f64, cost: f64) -> f64;
}

struct PathLength;
struct Attachment;

impl Labeling for PathLength {
    #[inline(always)]
    fn label(base: f64, cost: f64) -> f64 { base + cost }
}

impl Labeling for Attachment {
    #[inline(always)]
    fn label(_base: f64, cost: f64) -> f64 { cost }
}

/// Single-source traversal. `scratch` must be reset.
pub fn dijkstra<C: ArcCosts>(
    graph: &Graph,
    costs: C,
    source: NodeId,
    mode: TraversalMode,
    limits: Limits,
    scratch: &mut SearchScratch,
) -> TraversalOutcome {
    dijkstra_multi(graph, costs, std::iter::once(source), mode, limits, scratch)
}

/// Traversal seeded with every node of `sources` at distance zero.
pub fn dijkstra_multi<C: ArcCosts>(
    graph: &Graph,
    costs: C,
    sources: impl IntoIterator<Item = NodeId>,
    mode: TraversalMode,
    limits: Limits,
    scratch: &mut SearchScratch,
) -> TraversalOutcome {
    debug_assert!(scratch.node_capacity() >= graph.node_count());
    debug_assert!(scratch.touched().is_empty(), "scratch was not reset");
    for s in sources {
        scratch.set_label(s, 0.0, None);
        scratch.enqueue(s);
    }
    match mode {
        TraversalMode::ShortestPath => run::<PathLength, C>(graph, costs, limits, scratch),
        TraversalMode::SpanningTree => run::<Attachment, C>(graph, costs, limits, scratch),
    }
}

/// Shortest paths from all required terminals at once.
pub fn dijkstra_from_terminals<C: ArcCosts>(graph: &Graph, costs: C, limits: Limits, scratch: &mut SearchScratch) -> TraversalOutcome {
    let terminals = graph.nodes().filter(|&v| graph.is_terminal(v) && graph.is_marked(v));
    dijkstra_multi(graph, costs, terminals, TraversalMode::ShortestPath, limits, scratch)
}

/// Distance of every node to the designated root along arc directions
/// (searches backwards from the root). Exhausted at once without a root.
pub fn dijkstra_to_root(graph: &Graph, costs: &[f64], limits: Limits, scratch: &mut SearchScratch) -> TraversalOutcome {
    match graph.root() {
        Some(root) => dijkstra(graph, Reversed(costs), root, TraversalMode::ShortestPath, limits, scratch),
        None => TraversalOutcome::Exhausted,
    }
}

fn run<L: Labeling, C: ArcCosts>(graph: &Graph, costs: C, limits: Limits, scratch: &mut SearchScratch) -> TraversalOutcome {
    let budget = limits.edge_budget.unwrap_or(u64::MAX);
    let dist_limit = limits.distance_limit;
    let mut open_terminals = match limits.stop_at {
        Some(StopAt::AllTerminals) => graph.terminals().filter(|&t| graph.is_marked(t)).count(),
        _ => 0,
    };
    let mut scanned = 0u64;
    let mut settled = 0usize;
    let outcome = 'search: loop {
        let Some(k) = scratch.extract_min() else { break TraversalOutcome::Exhausted };
        settled += 1;
        match limits.stop_at {
            Some(StopAt::Target(t)) if t == k => break TraversalOutcome::TargetReached,
            Some(StopAt::AllTerminals) if graph.is_terminal(k) && graph.is_marked(k) => {
                open_terminals = open_terminals.saturating_sub(1);
                if open_terminals == 0 { break TraversalOutcome::AllTerminalsReached; }
            }
            _ => {}
        }
        let dk = scratch.dist(k);
        for a in graph.out_arcs(k) {
            let m = graph.head(a);
            if !graph.is_marked(m) || scratch.heap.is_connected(m) { continue; }
            scanned += 1;
            if scanned > budget { break 'search TraversalOutcome::BudgetExceeded; }
            let d = L::label(dk, costs.arc_cost(a));
            if dist_limit.is_some_and(|lim| is_gt(d, lim)) { continue; }
            if is_lt(d, scratch.dist(m)) {
                scratch.set_label(m, d, Some(a));
                scratch.enqueue(m);
            }
        }
    };
    trace!(settled, scanned, ?outcome, "dijkstra");
    outcome
}

/// Arcs of the labeled path ending in `v`, in source-to-`v` order.
pub fn path_arcs(graph: &Graph, scratch: &SearchScratch, v: NodeId) -> Vec<ArcId> {
    let mut arcs = Vec::new();
    let mut cur = v;
    while let Some(a) = scratch.pred(cur) {
        arcs.push(a);
        cur = graph.tail(a);
        debug_assert!(arcs.len() <= graph.node_count());
    }
    arcs.reverse();
    arcs
}
