//! Terminal-bounded special-distance walks with prize accounting.
//!
//! A walk search runs Dijkstra from `start` towards `end`. When the walk enters
//! a node that carries a prize, the prize is credited (the label never drops
//! below zero), provided it was not already credited along the same walk.
//! Scanned nodes go back to `Unknown` so a cheaper walk may relabel them,
//! except required terminals, which stay finalized.
//!
//! Three ledgers decide what counts as "already credited":
//! - `sd_walk`: no lists; a prize is credited only on the first labeling of a
//!   node in the whole search, and a required terminal whose prize was
//!   credited is never relabeled.
//! - `sd_walk_ext`: one bounded list per node of credited nodes.
//! - `sd_walk_ext_split`: separate lists for credited required terminals,
//!   credited pseudo-terminals and traversed edges; a walk never reuses an
//!   edge that is still on its list.
//!
//! A saturated list may contain anything, so it blocks further credits and
//! counts as a conflict. The destination is never refused.

use tracing::trace;

use crate::config::SearchConfig;
use crate::graph::{ArcId, Graph, MarkGuard, NodeId};
use crate::heap::NodeState;
use crate::numeric::{is_gt, is_lt, is_zero};
use crate::scratch::SearchScratch;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WalkQuery {
    pub start: NodeId,
    pub end: NodeId,
    /// Labels above this value are discarded. The test runs after the prize
    /// of the reached node is credited, so a prize can pull a label back
    /// under the limit.
    pub distance_limit: f64,
    /// Maximum number of arc scans.
    pub edge_limit: u64,
}

impl WalkQuery {
    /// Query with the arc-scan budget taken from `config.sd_edge_limit`.
    pub fn new(start: NodeId, end: NodeId, distance_limit: f64, config: &SearchConfig) -> Self {
        Self { start, end, distance_limit, edge_limit: config.sd_edge_limit }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WalkOutcome {
    /// `end` was extracted with this walk cost (never above the limit).
    Reached { distance: f64 },
    /// Heap ran empty: no walk within the distance limit.
    NotFound,
    BudgetExceeded,
}

impl WalkOutcome {
    pub fn is_success(self) -> bool { matches!(self, WalkOutcome::Reached { .. }) }

    pub fn distance(self) -> Option<f64> {
        match self {
            WalkOutcome::Reached { distance } => Some(distance),
            _ => None,
        }
    }
}

trait Ledger {
    /// `k -> m` must not be relaxed.
    fn refuses(g: &Graph, s: &SearchScratch, k: NodeId, m: NodeId, a: ArcId) -> bool;
    /// The prize of `m` has not been credited on the walk to `k`.
    fn may_claim(g: &Graph, s: &SearchScratch, k: NodeId, m: NodeId) -> bool;
    /// `m` was relabeled from `k` over `a`.
    fn record(g: &Graph, s: &mut SearchScratch, k: NodeId, m: NodeId, a: ArcId, claimed: bool);
}

struct Unlisted;
struct Combined;
struct Split;

impl Ledger for Unlisted {
    #[inline(always)]
    fn refuses(g: &Graph, s: &SearchScratch, _k: NodeId, m: NodeId, _a: ArcId) -> bool { g.is_terminal(m) && s.is_claimed(m) }

    #[inline(always)]
    fn may_claim(_g: &Graph, s: &SearchScratch, _k: NodeId, m: NodeId) -> bool { !s.is_visited(m) }

    #[inline(always)]
    fn record(_g: &Graph, s: &mut SearchScratch, _k: NodeId, m: NodeId, _a: ArcId, claimed: bool) {
        if claimed { s.claimed[m.index()] = true; }
    }
}

impl Ledger for Combined {
    #[inline(always)]
    fn refuses(g: &Graph, s: &SearchScratch, k: NodeId, m: NodeId, _a: ArcId) -> bool {
        g.is_terminal(m) && s.is_visited(m) && s.ancestors.terms.may_contain(k, m.0)
    }

    #[inline(always)]
    fn may_claim(_g: &Graph, s: &SearchScratch, k: NodeId, m: NodeId) -> bool { !s.ancestors.terms.may_contain(k, m.0) }

    #[inline(always)]
    fn record(_g: &Graph, s: &mut SearchScratch, k: NodeId, m: NodeId, _a: ArcId, claimed: bool) {
        let anc = &mut s.ancestors;
        anc.terms.copy_from(k, m);
        if claimed { anc.terms.push(m, m.0); }
    }
}

impl Ledger for Split {
    #[inline(always)]
    fn refuses(g: &Graph, s: &SearchScratch, k: NodeId, m: NodeId, a: ArcId) -> bool {
        let anc = &s.ancestors;
        if g.is_terminal(m) && s.is_visited(m) && anc.terms.may_contain(k, m.0) { return true; }
        anc.edges.get(k).is_some_and(|edges| edges.contains(&a.edge().0))
    }

    #[inline(always)]
    fn may_claim(g: &Graph, s: &SearchScratch, k: NodeId, m: NodeId) -> bool {
        let list = if g.is_terminal(m) { &s.ancestors.terms } else { &s.ancestors.np_terms };
        !list.may_contain(k, m.0)
    }

    #[inline(always)]
    fn record(g: &Graph, s: &mut SearchScratch, k: NodeId, m: NodeId, a: ArcId, claimed: bool) {
        let anc = &mut s.ancestors;
        anc.terms.copy_from(k, m);
        anc.np_terms.copy_from(k, m);
        anc.edges.copy_from(k, m);
        anc.edges.push(m, a.edge().0);
        if claimed {
            if g.is_terminal(m) { anc.terms.push(m, m.0) } else { anc.np_terms.push(m, m.0) }
        }
    }
}

/// Walk without ancestor lists.
pub fn sd_walk(graph: &mut Graph, costs: &[f64], query: WalkQuery, scratch: &mut SearchScratch) -> WalkOutcome {
    walk::<Unlisted>(graph, costs, query, scratch)
}

/// Walk with one list of credited nodes per node.
pub fn sd_walk_ext(graph: &mut Graph, costs: &[f64], query: WalkQuery, scratch: &mut SearchScratch) -> WalkOutcome {
    walk::<Combined>(graph, costs, query, scratch)
}

/// Walk with separate terminal / pseudo-terminal / edge lists.
pub fn sd_walk_ext_split(graph: &mut Graph, costs: &[f64], query: WalkQuery, scratch: &mut SearchScratch) -> WalkOutcome {
    walk::<Split>(graph, costs, query, scratch)
}

fn walk<L: Ledger>(graph: &mut Graph, costs: &[f64], query: WalkQuery, scratch: &mut SearchScratch) -> WalkOutcome {
    let WalkQuery { start, end, distance_limit, edge_limit } = query;
    debug_assert_ne!(start, end);
    debug_assert_eq!(costs.len(), graph.arc_count());
    debug_assert!(scratch.node_capacity() >= graph.node_count());
    debug_assert!(scratch.touched().is_empty(), "scratch was not reset");
    if graph.degree(start) == 0 || graph.degree(end) == 0 { return WalkOutcome::NotFound; }

    // start and end are unmarked for the duration of the walk
    let g = MarkGuard::unmark_pair(graph, start, end);
    scratch.set_label(start, 0.0, None);
    scratch.enqueue(start);
    let mut scanned = 0u64;
    let outcome = 'walk: loop {
        let Some(k) = scratch.extract_min() else { break WalkOutcome::NotFound };
        if k == end { break WalkOutcome::Reached { distance: scratch.dist(end) }; }
        if !g.is_terminal(k) { scratch.heap.set_state(k, NodeState::Unknown); }
        let dk = scratch.dist(k);
        for a in g.out_arcs(k) {
            let m = g.head(a);
            if m != end && !g.is_marked(m) { continue; }
            if scratch.heap.is_connected(m) { continue; }
            scanned += 1;
            if scanned > edge_limit { break 'walk WalkOutcome::BudgetExceeded; }
            if m != end && L::refuses(&g, scratch, k, m, a) { continue; }
            let mut d = dk + costs[a.index()];
            let prize = g.prize(m);
            let claimed = m != end && g.carries_prize(m) && !is_zero(prize) && L::may_claim(&g, scratch, k, m);
            if claimed { d = (d - prize).max(0.0); }
            if is_gt(d, distance_limit) { continue; }
            if is_lt(d, scratch.dist(m)) {
                scratch.set_label(m, d, Some(a));
                L::record(&g, scratch, k, m, a, claimed);
                scratch.enqueue(m);
            }
        }
    };
    trace!(start = %start, end = %end, scanned, ?outcome, "sd walk");
    outcome
}
