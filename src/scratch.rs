//! Reusable per-search buffers.
//!
//! A `SearchScratch` is sized once for a graph and handed to every search by
//! mutable reference. Searches record each node they label in a touch list so
//! that `reset` only restores those entries instead of sweeping all n nodes.

use crate::config::SearchConfig;
use crate::graph::{ArcId, NodeId};
use crate::heap::{HeapStats, NodeHeap, NodeState};
use crate::numeric::FARAWAY;

/// Distance and predecessor arc of a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathLabel {
    pub dist: f64,
    pub pred: Option<ArcId>,
}

impl Default for PathLabel {
    fn default() -> Self { Self { dist: FARAWAY, pred: None } }
}

/// Occupancy of one bounded ancestor list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListFill {
    Open(u16),
    /// More than K ids were pushed; membership can no longer be decided.
    Saturated,
}

/// Per-node lists of at most K ids stored in one flat buffer.
#[derive(Clone, Debug)]
pub struct AncestorLists {
    capacity: usize,
    ids: Vec<u32>,
    fill: Vec<ListFill>,
}

impl AncestorLists {
    pub fn new(n: usize, capacity: usize) -> Self {
        debug_assert!(capacity <= u16::MAX as usize);
        Self { capacity, ids: vec![0; n * capacity], fill: vec![ListFill::Open(0); n] }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize { self.capacity }
    #[inline(always)]
    pub fn fill(&self, v: NodeId) -> ListFill { self.fill[v.index()] }

    /// Stored ids, or `None` once the list is saturated.
    #[inline]
    pub fn get(&self, v: NodeId) -> Option<&[u32]> {
        match self.fill[v.index()] {
            ListFill::Open(len) => {
                let start = v.index() * self.capacity;
                Some(&self.ids[start..start + len as usize])
            }
            ListFill::Saturated => None,
        }
    }

    /// Conservative membership: a saturated list may contain anything.
    #[inline]
    pub fn may_contain(&self, v: NodeId, id: u32) -> bool {
        self.get(v).map_or(true, |ids| ids.contains(&id))
    }

    #[inline]
    pub fn push(&mut self, v: NodeId, id: u32) {
        if let ListFill::Open(len) = self.fill[v.index()] {
            if (len as usize) < self.capacity {
                self.ids[v.index() * self.capacity + len as usize] = id;
                self.fill[v.index()] = ListFill::Open(len + 1);
            } else {
                self.fill[v.index()] = ListFill::Saturated;
            }
        }
    }

    /// Replaces `to`'s list by `from`'s. A saturated target stays saturated.
    #[inline]
    pub fn copy_from(&mut self, from: NodeId, to: NodeId) {
        debug_assert_ne!(from, to);
        match (self.fill[from.index()], self.fill[to.index()]) {
            (_, ListFill::Saturated) => {}
            (ListFill::Saturated, _) => self.fill[to.index()] = ListFill::Saturated,
            (ListFill::Open(len), ListFill::Open(_)) => {
                let src = from.index() * self.capacity;
                self.ids.copy_within(src..src + len as usize, to.index() * self.capacity);
                self.fill[to.index()] = ListFill::Open(len);
            }
        }
    }

    #[inline]
    pub fn saturate(&mut self, v: NodeId) { self.fill[v.index()] = ListFill::Saturated; }

    #[inline]
    pub fn clear(&mut self, v: NodeId) { self.fill[v.index()] = ListFill::Open(0); }
}

/// The three lists used by the prize-accounting walks: claimed proper
/// terminals, claimed non-proper terminals and traversed edges. The combined
/// walk only uses `terms`.
#[derive(Clone, Debug)]
pub struct Ancestors {
    pub terms: AncestorLists,
    pub np_terms: AncestorLists,
    pub edges: AncestorLists,
}

#[derive(Clone, Debug)]
pub struct SearchScratch {
    pub(crate) dist: Vec<f64>,
    pub(crate) pred: Vec<Option<ArcId>>,
    pub(crate) heap: NodeHeap,
    pub(crate) visited: Vec<bool>,
    /// Prize credited somewhere in the current search.
    pub(crate) claimed: Vec<bool>,
    pub(crate) touched: Vec<NodeId>,
    pub(crate) ancestors: Ancestors,
}

impl SearchScratch {
    /// Buffers for `n` nodes with ancestor lists of capacity `k`.
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            dist: vec![FARAWAY; n],
            pred: vec![None; n],
            heap: NodeHeap::new(n),
            visited: vec![false; n],
            claimed: vec![false; n],
            touched: Vec::with_capacity(n),
            ancestors: Ancestors {
                terms: AncestorLists::new(n, k),
                np_terms: AncestorLists::new(n, k),
                edges: AncestorLists::new(n, k),
            },
        }
    }

    /// Buffers for `n` nodes sized by `config.ancestor_capacity`.
    pub fn from_config(n: usize, config: &SearchConfig) -> Self { Self::new(n, config.ancestor_capacity) }

    #[inline(always)]
    pub fn node_capacity(&self) -> usize { self.dist.len() }
    #[inline(always)]
    pub fn ancestor_capacity(&self) -> usize { self.ancestors.terms.capacity() }
    #[inline(always)]
    pub fn dist(&self, v: NodeId) -> f64 { self.dist[v.index()] }
    #[inline(always)]
    pub fn dists(&self) -> &[f64] { &self.dist }
    #[inline(always)]
    pub fn pred(&self, v: NodeId) -> Option<ArcId> { self.pred[v.index()] }
    #[inline(always)]
    pub fn label(&self, v: NodeId) -> PathLabel { PathLabel { dist: self.dist[v.index()], pred: self.pred[v.index()] } }
    #[inline(always)]
    pub fn state(&self, v: NodeId) -> NodeState { self.heap.state(v) }
    #[inline(always)]
    pub fn is_visited(&self, v: NodeId) -> bool { self.visited[v.index()] }
    #[inline(always)]
    pub fn is_claimed(&self, v: NodeId) -> bool { self.claimed[v.index()] }
    pub fn touched(&self) -> &[NodeId] { &self.touched }
    pub fn ancestors(&self) -> &Ancestors { &self.ancestors }
    pub fn heap_stats(&self) -> HeapStats { self.heap.stats() }

    /// Records `v` in the touch list the first time it is labeled.
    #[inline(always)]
    pub(crate) fn visit(&mut self, v: NodeId) {
        if !self.visited[v.index()] {
            self.visited[v.index()] = true;
            self.touched.push(v);
        }
    }

    #[inline(always)]
    pub(crate) fn set_label(&mut self, v: NodeId, dist: f64, pred: Option<ArcId>) {
        self.visit(v);
        self.dist[v.index()] = dist;
        self.pred[v.index()] = pred;
    }

    /// Queues or re-sifts `v` with its current distance.
    #[inline(always)]
    pub(crate) fn enqueue(&mut self, v: NodeId) { self.heap.insert_or_decrease(v, &self.dist); }

    #[inline(always)]
    pub(crate) fn extract_min(&mut self) -> Option<NodeId> { self.heap.extract_min(&self.dist) }

    /// Restores every touched node to its pre-search sentinels.
    pub fn reset(&mut self) {
        self.heap.clear();
        for &v in &self.touched {
            let i = v.index();
            self.dist[i] = FARAWAY;
            self.pred[i] = None;
            self.visited[i] = false;
            self.claimed[i] = false;
            self.heap.set_state(v, NodeState::Unknown);
            self.ancestors.terms.clear(v);
            self.ancestors.np_terms.clear(v);
            self.ancestors.edges.clear(v);
        }
        self.touched.clear();
    }

    /// Full O(n) check that no search state is left behind.
    pub fn is_pristine(&self) -> bool {
        self.touched.is_empty()
            && self.heap.is_empty()
            && (0..self.node_capacity()).all(|i| {
                let v = NodeId::from_index(i);
                self.dist[i] == FARAWAY
                    && self.pred[i].is_none()
                    && !self.visited[i]
                    && !self.claimed[i]
                    && self.heap.state(v) == NodeState::Unknown
                    && self.ancestors.terms.fill(v) == ListFill::Open(0)
                    && self.ancestors.np_terms.fill(v) == ListFill::Open(0)
                    && self.ancestors.edges.fill(v) == ListFill::Open(0)
            })
    }
}
