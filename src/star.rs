//! Localized star search around one center node.
//!
//! Every neighbor of the center is seeded at its edge cost and becomes its
//! own star base. The search never leaves the radius (largest incident edge
//! cost) and never enters the center. When a path from base `a` reaches an
//! unsettled neighbor `m != a` with length at most `cost(c, m)`, the edge
//! `(c, m)` is replaceable by `c - a - ... - m` and is reported deletable.
//! Only unsettled neighbors can be marked, so of two tied edges the one
//! settled later is the one reported.

use tracing::trace;

use crate::config::SearchConfig;
use crate::csr::Csr;
use crate::graph::{Graph, NodeId};
use crate::heap::{CleanMode, HeapPosition, PositionHeap};
use crate::numeric::{is_gt, is_le, is_lt, FARAWAY};

/// Per-node profit subtracted when a star path leaves that node, together
/// with the neighbor the profit was derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeBias {
    profit: Vec<f64>,
    source: Vec<Option<NodeId>>,
}

impl NodeBias {
    pub fn zero(n: usize) -> Self { Self { profit: vec![0.0; n], source: vec![None; n] } }

    /// Pseudo-terminals contribute their own prize. A Steiner node next to a
    /// pseudo-terminal `t` contributes `prize(t) - cost(v, t)` when positive,
    /// with `t` as its source.
    pub fn from_prizes(graph: &Graph) -> Self {
        let mut bias = Self::zero(graph.node_count());
        for v in graph.nodes() {
            if graph.is_pseudo_terminal(v) {
                bias.profit[v.index()] = graph.prize(v);
                continue;
            }
            if graph.carries_prize(v) { continue; }
            for a in graph.out_arcs(v) {
                let t = graph.head(a);
                if !graph.is_pseudo_terminal(t) { continue; }
                let gain = graph.prize(t) - graph.cost(a);
                if is_gt(gain, bias.profit[v.index()]) {
                    bias.profit[v.index()] = gain;
                    bias.source[v.index()] = Some(t);
                }
            }
        }
        bias
    }

    pub fn set(&mut self, v: NodeId, profit: f64, source: Option<NodeId>) {
        debug_assert!(profit >= 0.0);
        self.profit[v.index()] = profit;
        self.source[v.index()] = source;
    }

    #[inline(always)]
    pub fn profit(&self, v: NodeId) -> f64 { self.profit[v.index()] }
    #[inline(always)]
    pub fn source(&self, v: NodeId) -> Option<NodeId> { self.source[v.index()] }
}

/// Buffers for repeated star searches over graphs with up to `n` nodes.
/// Every search leaves them clean again.
#[derive(Clone, Debug)]
pub struct StarScratch {
    heap: PositionHeap,
    dist: Vec<f64>,
    base: Vec<Option<NodeId>>,
    prev: Vec<Option<NodeId>>,
    /// Position of a center neighbor within the center's range.
    slot: Vec<Option<u32>>,
    touched: Vec<NodeId>,
    scanned: u64,
}

impl StarScratch {
    pub fn new(n: usize) -> Self {
        Self {
            heap: PositionHeap::new(n),
            dist: vec![FARAWAY; n],
            base: vec![None; n],
            prev: vec![None; n],
            slot: vec![None; n],
            touched: Vec::new(),
            scanned: 0,
        }
    }

    pub fn node_capacity(&self) -> usize { self.dist.len() }

    /// Arcs scanned by the most recent search.
    pub fn scanned(&self) -> u64 { self.scanned }

    pub fn is_pristine(&self) -> bool {
        self.touched.is_empty()
            && self.heap.is_empty()
            && (0..self.dist.len()).all(|i| {
                self.dist[i] == FARAWAY
                    && self.base[i].is_none()
                    && self.prev[i].is_none()
                    && self.slot[i].is_none()
                    && self.heap.position(NodeId::from_index(i)) == HeapPosition::Unknown
            })
    }

    #[inline]
    fn label(&mut self, v: NodeId, dist: f64, base: NodeId, prev: NodeId) {
        let i = v.index();
        if self.dist[i] == FARAWAY && self.slot[i].is_none() { self.touched.push(v); }
        self.dist[i] = dist;
        self.base[i] = Some(base);
        self.prev[i] = Some(prev);
    }

    fn reset(&mut self) {
        self.heap.clean(CleanMode::KeepPositions);
        for &v in &self.touched {
            let i = v.index();
            self.dist[i] = FARAWAY;
            self.base[i] = None;
            self.prev[i] = None;
            self.slot[i] = None;
            self.heap.reset_position(v);
        }
        self.touched.clear();
    }
}

trait Discount {
    /// Amount subtracted from `cost` when the path leaves `k` towards `m`.
    fn discount(&self, k: NodeId, m: NodeId, prev: Option<NodeId>, cost: f64) -> f64;
}

struct Unbiased;

impl Discount for Unbiased {
    #[inline(always)]
    fn discount(&self, _k: NodeId, _m: NodeId, _prev: Option<NodeId>, _cost: f64) -> f64 { 0.0 }
}

impl Discount for &NodeBias {
    #[inline(always)]
    fn discount(&self, k: NodeId, m: NodeId, prev: Option<NodeId>, cost: f64) -> f64 {
        match self.source(k) {
            // the profit was paid for by the edge to its source
            Some(s) if s == m || Some(s) == prev => 0.0,
            _ => self.profit(k).min(cost),
        }
    }
}

/// Star search from `center`. `deletable` must have one entry per arc of
/// `csr.range(center)` and is overwritten; `true` means the corresponding
/// center edge has an alternative path no longer than itself. Returns whether
/// any entry is `true`. Hitting `edge_limit` only ends the search early.
pub fn sd_star(csr: &Csr, center: NodeId, edge_limit: u64, scratch: &mut StarScratch, deletable: &mut [bool]) -> bool {
    star(csr, Unbiased, center, edge_limit, scratch, deletable)
}

/// `sd_star` with the edge limit taken from `config.star_edge_limit`.
pub fn sd_star_from_config(
    csr: &Csr,
    center: NodeId,
    config: &SearchConfig,
    scratch: &mut StarScratch,
    deletable: &mut [bool],
) -> bool {
    sd_star(csr, center, config.star_edge_limit, scratch, deletable)
}

/// Like `sd_star`, but a path leaving node `k` gets `min(profit(k), cost)`
/// off each arc unless the arc leads to, or the path came from, the source
/// of `k`'s profit.
pub fn sd_star_biased(
    csr: &Csr,
    bias: &NodeBias,
    center: NodeId,
    edge_limit: u64,
    scratch: &mut StarScratch,
    deletable: &mut [bool],
) -> bool {
    debug_assert!(bias.profit.len() >= csr.node_count());
    star(csr, bias, center, edge_limit, scratch, deletable)
}

fn star<D: Discount>(
    csr: &Csr,
    bias: D,
    center: NodeId,
    edge_limit: u64,
    scratch: &mut StarScratch,
    deletable: &mut [bool],
) -> bool {
    let range = csr.range(center);
    let degree = range.len();
    debug_assert_eq!(deletable.len(), degree);
    debug_assert!(scratch.node_capacity() >= csr.node_count());
    debug_assert!(scratch.touched.is_empty());
    deletable.fill(false);
    scratch.scanned = 0;
    if degree <= 1 { return false; }

    let heads = csr.heads();
    let costs = csr.costs();
    let radius = costs[range.clone()].iter().copied().fold(0.0, f64::max);
    let mut decided = 0usize;
    let mut any = false;

    for (i, e) in range.clone().enumerate() {
        let m = heads[e];
        debug_assert_ne!(m, center);
        let cost = costs[e];
        match scratch.slot[m.index()] {
            None => {
                scratch.label(m, cost, m, center);
                scratch.slot[m.index()] = Some(i as u32);
            }
            // parallel center edges: keep the cheaper, the other is redundant
            Some(j) => {
                decided += 1;
                any = true;
                if is_le(scratch.dist[m.index()], cost) {
                    deletable[i] = true;
                } else {
                    deletable[j as usize] = true;
                    scratch.slot[m.index()] = Some(i as u32);
                    scratch.dist[m.index()] = cost;
                }
            }
        }
        scratch.heap.insert_or_decrease(m, scratch.dist[m.index()]);
    }

    let mut scanned = 0u64;
    let mut settled = 0usize;
    'search: while let Some((k, dk)) = scratch.heap.delete_min() {
        settled += 1;
        if let Some(i) = scratch.slot[k.index()] {
            if !deletable[i as usize] { decided += 1; }
        }
        if decided >= degree { break; }
        let base_k = scratch.base[k.index()];
        let prev_k = scratch.prev[k.index()];
        for e in csr.range(k) {
            let m = heads[e];
            if m == center || scratch.heap.position(m) == HeapPosition::Removed { continue; }
            scanned += 1;
            if scanned > edge_limit { break 'search; }
            let d = dk + costs[e] - bias.discount(k, m, prev_k, costs[e]);
            if is_gt(d, radius) { continue; }
            if let Some(i) = scratch.slot[m.index()] {
                let i = i as usize;
                if base_k != Some(m) && !deletable[i] && is_le(d, costs[range.start + i]) {
                    deletable[i] = true;
                    decided += 1;
                    any = true;
                }
            }
            if is_lt(d, scratch.dist[m.index()]) {
                // k's base is Some once k has been labeled
                let base = base_k.unwrap_or(k);
                scratch.label(m, d, base, k);
                scratch.heap.insert_or_decrease(m, d);
            }
        }
    }
    scratch.scanned = scanned;
    trace!(center = %center, degree, settled, scanned, any, "star search");
    scratch.reset();
    any
}
