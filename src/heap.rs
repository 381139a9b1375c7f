//! Array-based binary min-heaps with decrease-key.
//!
//! `NodeHeap` is keyed by an external distance slice and tracks a per-node
//! `NodeState`; it is the queue shared by the traversal, walk and
//! construction routines. `PositionHeap` stores its keys inline and can be
//! emptied in bulk, which suits the many small star searches.
//!
//! Both heaps are 1-indexed. Sift-down picks the right child only when its key
//! is strictly smaller, so equal keys resolve to the lower heap index and the
//! extraction order is reproducible.

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::numeric::is_lt;

/// Per-node heap membership.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Never inserted in the current search.
    Unknown,
    /// Currently stored at this heap slot.
    Slot(u32),
    /// Extracted (finalized).
    Connected,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapStats { pub pushes: u64, pub pops: u64, pub max_size: u64 }

#[derive(Clone, Debug)]
pub struct NodeHeap {
    slots: Vec<NodeId>,
    state: Vec<NodeState>,
    count: usize,
    stats: HeapStats,
}

impl NodeHeap {
    pub fn new(n: usize) -> Self {
        Self { slots: vec![NodeId(0); n + 1], state: vec![NodeState::Unknown; n], count: 0, stats: HeapStats::default() }
    }

    #[inline(always)]
    pub fn len(&self) -> usize { self.count }
    #[inline(always)]
    pub fn is_empty(&self) -> bool { self.count == 0 }
    #[inline(always)]
    pub fn capacity(&self) -> usize { self.state.len() }
    #[inline(always)]
    pub fn state(&self, v: NodeId) -> NodeState { self.state[v.index()] }
    #[inline(always)]
    pub fn is_connected(&self, v: NodeId) -> bool { self.state[v.index()] == NodeState::Connected }
    pub fn stats(&self) -> HeapStats { self.stats }
    pub fn reset_stats(&mut self) { self.stats = HeapStats::default(); }

    /// Overrides the state of a node that is not in the heap.
    #[inline]
    pub fn set_state(&mut self, v: NodeId, state: NodeState) {
        debug_assert!(!matches!(self.state[v.index()], NodeState::Slot(_)), "node {v} is still queued");
        debug_assert!(!matches!(state, NodeState::Slot(_)));
        self.state[v.index()] = state;
    }

    /// Appends `v` if it was never inserted, otherwise sifts it up from its
    /// slot after its key decreased.
    #[inline]
    pub fn insert_or_decrease(&mut self, v: NodeId, key: &[f64]) {
        match self.state[v.index()] {
            NodeState::Unknown => self.push(v, key),
            NodeState::Slot(pos) => self.sift_up(pos as usize, key),
            NodeState::Connected => debug_assert!(false, "node {v} already finalized"),
        }
    }

    /// Like `insert_or_decrease`, but also re-queues finalized nodes.
    #[inline]
    pub fn reopen(&mut self, v: NodeId, key: &[f64]) {
        match self.state[v.index()] {
            NodeState::Slot(pos) => self.sift_up(pos as usize, key),
            NodeState::Unknown | NodeState::Connected => self.push(v, key),
        }
    }

    fn push(&mut self, v: NodeId, key: &[f64]) {
        self.count += 1;
        debug_assert!(self.count < self.slots.len());
        self.slots[self.count] = v;
        self.stats.pushes += 1;
        if self.count as u64 > self.stats.max_size { self.stats.max_size = self.count as u64; }
        self.sift_up(self.count, key);
    }

    #[inline]
    pub fn peek_min(&self) -> Option<NodeId> { (self.count > 0).then(|| self.slots[1]) }

    /// Removes the minimum and marks it `Connected`.
    #[inline]
    pub fn extract_min(&mut self, key: &[f64]) -> Option<NodeId> {
        if self.count == 0 { return None; }
        let top = self.slots[1];
        let last = self.slots[self.count];
        self.count -= 1;
        if self.count > 0 {
            self.slots[1] = last;
            self.sift_down(1, key);
        }
        self.state[top.index()] = NodeState::Connected;
        self.stats.pops += 1;
        Some(top)
    }

    /// Empties the heap, returning queued nodes to `Unknown`. Nodes already
    /// extracted keep their state; the scratch touch list resets those.
    pub fn clear(&mut self) {
        for i in 1..=self.count {
            let v = self.slots[i];
            self.state[v.index()] = NodeState::Unknown;
        }
        self.count = 0;
    }

    #[inline]
    fn sift_up(&mut self, mut pos: usize, key: &[f64]) {
        let v = self.slots[pos];
        let kv = key[v.index()];
        while pos > 1 {
            let parent = pos / 2;
            let p = self.slots[parent];
            if !is_lt(kv, key[p.index()]) { break; }
            self.slots[pos] = p;
            self.state[p.index()] = NodeState::Slot(pos as u32);
            pos = parent;
        }
        self.slots[pos] = v;
        self.state[v.index()] = NodeState::Slot(pos as u32);
    }

    #[inline]
    fn sift_down(&mut self, mut pos: usize, key: &[f64]) {
        let v = self.slots[pos];
        let kv = key[v.index()];
        loop {
            let mut child = pos * 2;
            if child > self.count { break; }
            if child < self.count && is_lt(key[self.slots[child + 1].index()], key[self.slots[child].index()]) {
                child += 1;
            }
            let c = self.slots[child];
            if !is_lt(key[c.index()], kv) { break; }
            self.slots[pos] = c;
            self.state[c.index()] = NodeState::Slot(pos as u32);
            pos = child;
        }
        self.slots[pos] = v;
        self.state[v.index()] = NodeState::Slot(pos as u32);
    }

    /// Heap order holds and every queued node's state points at its slot.
    pub fn check_invariants(&self, key: &[f64]) -> bool {
        (1..=self.count).all(|i| {
            let v = self.slots[i];
            self.state[v.index()] == NodeState::Slot(i as u32) && (i == 1 || !is_lt(key[v.index()], key[self.slots[i / 2].index()]))
        })
    }
}

/// Slot of a node in a `PositionHeap`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeapPosition {
    Unknown,
    Slot(u32),
    Removed,
}

/// What `PositionHeap::clean` does with the position array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CleanMode {
    /// O(1); the caller resets positions of the nodes it touched.
    KeepPositions,
    /// O(n) reset of every position to `Unknown`.
    ResetPositions,
}

/// Min-heap storing `(key, node)` pairs with a node-indexed position array.
#[derive(Clone, Debug)]
pub struct PositionHeap {
    entries: Vec<(f64, NodeId)>,
    position: Vec<HeapPosition>,
    size: usize,
}

impl PositionHeap {
    pub fn new(n: usize) -> Self {
        Self { entries: vec![(0.0, NodeId(0)); n + 1], position: vec![HeapPosition::Unknown; n], size: 0 }
    }

    #[inline(always)]
    pub fn len(&self) -> usize { self.size }
    #[inline(always)]
    pub fn is_empty(&self) -> bool { self.size == 0 }
    #[inline(always)]
    pub fn position(&self, v: NodeId) -> HeapPosition { self.position[v.index()] }
    #[inline(always)]
    pub fn reset_position(&mut self, v: NodeId) { self.position[v.index()] = HeapPosition::Unknown; }

    pub fn key(&self, v: NodeId) -> Option<f64> {
        match self.position[v.index()] {
            HeapPosition::Slot(p) => Some(self.entries[p as usize].0),
            _ => None,
        }
    }

    /// Inserts `v`, or lowers its key if it is queued with a larger one.
    /// Removed nodes are inserted again.
    pub fn insert_or_decrease(&mut self, v: NodeId, key: f64) {
        match self.position[v.index()] {
            HeapPosition::Slot(p) => {
                let p = p as usize;
                if is_lt(key, self.entries[p].0) {
                    self.entries[p].0 = key;
                    self.sift_up(p);
                }
            }
            HeapPosition::Unknown | HeapPosition::Removed => {
                self.size += 1;
                debug_assert!(self.size < self.entries.len());
                self.entries[self.size] = (key, v);
                self.sift_up(self.size);
            }
        }
    }

    pub fn delete_min(&mut self) -> Option<(NodeId, f64)> {
        if self.size == 0 { return None; }
        let (key, top) = self.entries[1];
        self.entries[1] = self.entries[self.size];
        self.size -= 1;
        if self.size > 0 { self.sift_down(1); }
        self.position[top.index()] = HeapPosition::Removed;
        Some((top, key))
    }

    pub fn clean(&mut self, mode: CleanMode) {
        match mode {
            CleanMode::KeepPositions => {
                for i in 1..=self.size {
                    let v = self.entries[i].1;
                    self.position[v.index()] = HeapPosition::Unknown;
                }
            }
            CleanMode::ResetPositions => self.position.iter_mut().for_each(|p| *p = HeapPosition::Unknown),
        }
        self.size = 0;
    }

    #[inline]
    fn sift_up(&mut self, mut pos: usize) {
        let entry = self.entries[pos];
        while pos > 1 {
            let parent = pos / 2;
            if !is_lt(entry.0, self.entries[parent].0) { break; }
            self.entries[pos] = self.entries[parent];
            self.position[self.entries[pos].1.index()] = HeapPosition::Slot(pos as u32);
            pos = parent;
        }
        self.entries[pos] = entry;
        self.position[entry.1.index()] = HeapPosition::Slot(pos as u32);
    }

    #[inline]
    fn sift_down(&mut self, mut pos: usize) {
        let entry = self.entries[pos];
        loop {
            let mut child = pos * 2;
            if child > self.size { break; }
            if child < self.size && is_lt(self.entries[child + 1].0, self.entries[child].0) { child += 1; }
            if !is_lt(self.entries[child].0, entry.0) { break; }
            self.entries[pos] = self.entries[child];
            self.position[self.entries[pos].1.index()] = HeapPosition::Slot(pos as u32);
            pos = child;
        }
        self.entries[pos] = entry;
        self.position[entry.1.index()] = HeapPosition::Slot(pos as u32);
    }

    pub fn check_invariants(&self) -> bool {
        (1..=self.size).all(|i| {
            let (k, v) = self.entries[i];
            self.position[v.index()] == HeapPosition::Slot(i as u32) && (i == 1 || !is_lt(k, self.entries[i / 2].0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn node_heap_random_ops_extract_sorted() {
        let n = 64;
        let mut rng = SmallRng::seed_from_u64(7);
        let mut key = vec![f64::MAX; n];
        let mut heap = NodeHeap::new(n);
        let mut last = f64::MIN;
        let mut extracted = 0;
        for _ in 0..500 {
            let v = NodeId(rng.gen_range(0..n as u32));
            match heap.state(v) {
                NodeState::Connected => {}
                NodeState::Unknown => {
                    key[v.index()] = last.max(0.0) + rng.gen_range(0.0..10.0);
                    heap.insert_or_decrease(v, &key);
                }
                NodeState::Slot(_) => {
                    let lowered = key[v.index()] - rng.gen_range(0.0..2.0);
                    key[v.index()] = lowered.max(last.max(0.0));
                    heap.insert_or_decrease(v, &key);
                }
            }
            assert!(heap.check_invariants(&key));
            if rng.gen_bool(0.3) {
                if let Some(u) = heap.extract_min(&key) {
                    assert!(key[u.index()] >= last);
                    last = key[u.index()];
                    extracted += 1;
                    assert!(heap.is_connected(u));
                }
            }
        }
        while let Some(u) = heap.extract_min(&key) {
            assert!(key[u.index()] >= last);
            last = key[u.index()];
            extracted += 1;
            assert!(heap.check_invariants(&key));
        }
        assert_eq!(heap.stats().pops, extracted);
    }

    #[test]
    fn equal_keys_extract_in_insertion_order() {
        let key = vec![1.0; 5];
        let mut heap = NodeHeap::new(5);
        for v in 0..5 { heap.insert_or_decrease(NodeId(v), &key); }
        let order: Vec<u32> = std::iter::from_fn(|| heap.extract_min(&key)).map(|v| v.0).collect();
        let again = {
            let mut heap = NodeHeap::new(5);
            for v in 0..5 { heap.insert_or_decrease(NodeId(v), &key); }
            std::iter::from_fn(|| heap.extract_min(&key)).map(|v| v.0).collect::<Vec<_>>()
        };
        assert_eq!(order, again);
        assert_eq!(order[0], 0);
    }

    #[test]
    fn node_heap_clear_and_reopen() {
        let mut key = vec![3.0, 1.0, 2.0];
        let mut heap = NodeHeap::new(3);
        for v in 0..3 { heap.insert_or_decrease(NodeId(v), &key); }
        assert_eq!(heap.extract_min(&key), Some(NodeId(1)));
        key[1] = 0.0;
        heap.reopen(NodeId(1), &key);
        assert_eq!(heap.peek_min(), Some(NodeId(1)));
        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.state(NodeId(0)), NodeState::Unknown);
        assert_eq!(heap.state(NodeId(1)), NodeState::Unknown);
    }

    #[test]
    fn position_heap_decrease_and_clean() {
        let mut heap = PositionHeap::new(6);
        for (v, k) in [(0, 5.0), (1, 4.0), (2, 3.0), (3, 9.0)] { heap.insert_or_decrease(NodeId(v), k); }
        heap.insert_or_decrease(NodeId(3), 1.0);
        heap.insert_or_decrease(NodeId(2), 8.0);
        assert!(heap.check_invariants());
        assert_eq!(heap.key(NodeId(2)), Some(3.0));
        assert_eq!(heap.delete_min(), Some((NodeId(3), 1.0)));
        assert_eq!(heap.position(NodeId(3)), HeapPosition::Removed);
        assert_eq!(heap.delete_min(), Some((NodeId(2), 3.0)));
        heap.clean(CleanMode::KeepPositions);
        assert!(heap.is_empty());
        assert_eq!(heap.position(NodeId(0)), HeapPosition::Unknown);
        assert_eq!(heap.position(NodeId(2)), HeapPosition::Removed);
        heap.clean(CleanMode::ResetPositions);
        assert_eq!(heap.position(NodeId(2)), HeapPosition::Unknown);
    }
}
