//! Multi-level nearest terminals.
//!
//! Layer `l` of node `v` holds the `l`-th nearest terminal of `v` that is
//! distinct from the terminals of layers `0..l`, with its distance and the
//! arc the label arrived over. Labels are settled from one heap over all
//! `(layer, node)` slots in non-decreasing distance order, so each node's
//! layers are filled bottom-up and never decrease.
//!
//! Paths leaving the designated root are measured along arc directions; all
//! other labels measure the distance from the node to its terminal.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SearchConfig;
use crate::graph::{ArcId, EdgeId, Graph, NodeId};
use crate::heap::NodeHeap;
use crate::numeric::{is_gt, is_lt, FARAWAY};

pub const MAX_LAYERS: usize = 4;

#[derive(Clone, Debug)]
pub struct NearestTerminals {
    n: usize,
    layers: usize,
    /// `layer * n + node`
    dist: Vec<f64>,
    base: Vec<Option<NodeId>>,
    pred: Vec<Option<ArcId>>,
    filled: Vec<u8>,
}

#[inline]
fn step_cost(graph: &Graph, into: ArcId, base: NodeId, root: Option<NodeId>) -> f64 {
    if root == Some(base) { graph.cost(into) } else { graph.cost(into.rev()) }
}

impl NearestTerminals {
    /// `compute` with `config.terminal_layers` layers.
    pub fn from_config(graph: &Graph, config: &SearchConfig) -> Self { Self::compute(graph, config.terminal_layers) }

    /// Labels every marked node with up to `layers` nearest distinct
    /// terminals (required and pseudo terminals alike).
    pub fn compute(graph: &Graph, layers: usize) -> Self {
        debug_assert!((1..=MAX_LAYERS).contains(&layers));
        let layers = layers.clamp(1, MAX_LAYERS);
        let n = graph.node_count();
        let mut nt = Self {
            n,
            layers,
            dist: vec![FARAWAY; layers * n],
            base: vec![None; layers * n],
            pred: vec![None; layers * n],
            filled: vec![0; n],
        };
        let root = graph.root();
        let mut heap = NodeHeap::new(layers * n);
        for t in graph.all_terminals().filter(|&t| graph.is_marked(t)) {
            nt.dist[t.index()] = 0.0;
            nt.base[t.index()] = Some(t);
            heap.insert_or_decrease(t, &nt.dist);
        }

        let mut settled = 0usize;
        while let Some(slot) = heap.extract_min(&nt.dist) {
            let (layer, v) = (slot.index() / n, NodeId::from_index(slot.index() % n));
            debug_assert_eq!(nt.filled[v.index()] as usize, layer);
            nt.filled[v.index()] += 1;
            settled += 1;
            let Some(b) = nt.base[slot.index()] else { continue };
            let d = nt.dist[slot.index()];

            for a in graph.out_arcs(v) {
                let m = graph.head(a);
                if !graph.is_marked(m) { continue; }
                let open = nt.filled[m.index()] as usize;
                if open == layers || nt.claims(m, b) { continue; }
                let y = open * n + m.index();
                let cand = d + step_cost(graph, a, b, root);
                if is_lt(cand, nt.dist[y]) {
                    nt.dist[y] = cand;
                    nt.base[y] = Some(b);
                    nt.pred[y] = Some(a);
                    heap.insert_or_decrease(NodeId::from_index(y), &nt.dist);
                }
            }

            // seed the next layer of v from every settled neighbor label
            if layer + 1 < layers {
                let y = (layer + 1) * n + v.index();
                for a in graph.out_arcs(v) {
                    let u = graph.head(a);
                    if !graph.is_marked(u) { continue; }
                    for r in 0..nt.filled[u.index()] as usize {
                        let x = r * n + u.index();
                        let Some(ub) = nt.base[x] else { continue };
                        if nt.claims(v, ub) { continue; }
                        let cand = nt.dist[x] + step_cost(graph, a.rev(), ub, root);
                        if is_lt(cand, nt.dist[y]) {
                            nt.dist[y] = cand;
                            nt.base[y] = Some(ub);
                            nt.pred[y] = Some(a.rev());
                        }
                    }
                }
                if nt.base[y].is_some() { heap.insert_or_decrease(NodeId::from_index(y), &nt.dist); }
            }
        }
        debug!(layers, settled, pushes = heap.stats().pushes, "nearest terminals");
        nt
    }

    /// `t` is the terminal of one of `v`'s filled layers.
    #[inline]
    fn claims(&self, v: NodeId, t: NodeId) -> bool {
        (0..self.filled[v.index()] as usize).any(|r| self.base[r * self.n + v.index()] == Some(t))
    }

    #[inline(always)]
    pub fn layers(&self) -> usize { self.layers }

    /// Number of layers of `v` that hold a terminal.
    #[inline(always)]
    pub fn filled(&self, v: NodeId) -> usize { self.filled[v.index()] as usize }

    #[inline(always)]
    pub fn dist(&self, v: NodeId, layer: usize) -> f64 { self.dist[layer * self.n + v.index()] }

    #[inline(always)]
    pub fn base(&self, v: NodeId, layer: usize) -> Option<NodeId> {
        if layer < self.filled(v) { self.base[layer * self.n + v.index()] } else { None }
    }

    #[inline(always)]
    pub fn pred(&self, v: NodeId, layer: usize) -> Option<ArcId> {
        if layer < self.filled(v) { self.pred[layer * self.n + v.index()] } else { None }
    }

    /// Layers never decrease and no terminal appears twice at one node.
    pub fn check_layers(&self) -> bool {
        (0..self.n).map(NodeId::from_index).all(|v| {
            let k = self.filled(v);
            let monotone = (1..self.layers).all(|l| !is_gt(self.dist(v, l - 1), self.dist(v, l)));
            let distinct = (0..k).all(|i| (i + 1..k).all(|j| self.base(v, i) != self.base(v, j)));
            monotone && distinct
        })
    }

    /// Upper bounds on the special distance between terminal pairs, read off
    /// the edges whose endpoints lie in different layer-0 regions: for labels
    /// `(s, d_u)` at `u` and `(t, d_v)` at `v`, the walk `s .. u - v .. t`
    /// costs `d_u + c(u, v) + d_v`.
    pub fn boundary_bounds(&self, graph: &Graph) -> TerminalPairBounds {
        let mut bounds: HashMap<(NodeId, NodeId), f64> = HashMap::new();
        for e in 0..graph.edge_count() {
            let a = EdgeId(e as u32).forward();
            let (u, v) = (graph.tail(a), graph.head(a));
            if !graph.is_marked(u) || !graph.is_marked(v) { continue; }
            let (Some(bu), Some(bv)) = (self.base(u, 0), self.base(v, 0)) else { continue };
            if bu == bv { continue; }
            let c = graph.cost(a).max(graph.cost(a.rev()));
            for i in 0..self.filled(u) {
                for j in 0..self.filled(v) {
                    let (Some(s), Some(t)) = (self.base(u, i), self.base(v, j)) else { continue };
                    if s == t { continue; }
                    let bound = self.dist(u, i) + c + self.dist(v, j);
                    let key = if s < t { (s, t) } else { (t, s) };
                    bounds.entry(key).and_modify(|b| if is_lt(bound, *b) { *b = bound }).or_insert(bound);
                }
            }
        }
        TerminalPairBounds { bounds }
    }
}

/// Smallest boundary-edge bound found per unordered terminal pair.
#[derive(Clone, Debug, Default)]
pub struct TerminalPairBounds {
    bounds: HashMap<(NodeId, NodeId), f64>,
}

impl TerminalPairBounds {
    pub fn bound(&self, s: NodeId, t: NodeId) -> Option<f64> {
        let key = if s < t { (s, t) } else { (t, s) };
        self.bounds.get(&key).copied()
    }

    pub fn len(&self) -> usize { self.bounds.len() }
    pub fn is_empty(&self) -> bool { self.bounds.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = ((NodeId, NodeId), f64)> + '_ { self.bounds.iter().map(|(&k, &b)| (k, b)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TerminalKind;

    fn terminal_path() -> Graph {
        let mut g = Graph::new(5);
        for i in 0..4 { g.add_edge(NodeId(i), NodeId(i + 1), 1.0).unwrap(); }
        g.set_terminal(NodeId(0), TerminalKind::Proper).unwrap();
        g.set_terminal(NodeId(4), TerminalKind::Proper).unwrap();
        g
    }

    #[test]
    fn two_layers_on_a_path() {
        let g = terminal_path();
        let nt = NearestTerminals::compute(&g, 2);
        assert!(nt.check_layers());
        assert_eq!((nt.dist(NodeId(1), 0), nt.base(NodeId(1), 0)), (1.0, Some(NodeId(0))));
        assert_eq!((nt.dist(NodeId(1), 1), nt.base(NodeId(1), 1)), (3.0, Some(NodeId(4))));
        assert_eq!(nt.dist(NodeId(2), 0), 2.0);
        assert_eq!(nt.dist(NodeId(2), 1), 2.0);
        assert_ne!(nt.base(NodeId(2), 0), nt.base(NodeId(2), 1));
        assert_eq!(nt.dist(NodeId(0), 1), 4.0);
        let pred = nt.pred(NodeId(0), 1).unwrap();
        assert_eq!(g.head(pred), NodeId(0));
    }

    #[test]
    fn missing_layers_stay_empty() {
        let g = terminal_path();
        let nt = NearestTerminals::compute(&g, 4);
        assert!(nt.check_layers());
        assert_eq!(nt.filled(NodeId(2)), 2);
        assert_eq!(nt.base(NodeId(2), 2), None);
        assert!(crate::numeric::is_faraway(nt.dist(NodeId(2), 3)));
    }

    #[test]
    fn rooted_labels_follow_arc_directions() {
        let mut g = Graph::new(3);
        g.add_arc_pair(NodeId(0), NodeId(1), 1.0, 10.0).unwrap();
        g.add_arc_pair(NodeId(1), NodeId(2), 1.0, 10.0).unwrap();
        g.set_terminal(NodeId(0), TerminalKind::Fixed).unwrap();
        g.set_terminal(NodeId(2), TerminalKind::Proper).unwrap();
        g.set_root(NodeId(0)).unwrap();
        let nt = NearestTerminals::compute(&g, 2);
        assert!(nt.check_layers());
        assert_eq!(nt.dist(NodeId(1), 0), 1.0);
        assert_eq!(nt.dist(NodeId(1), 1), 1.0);
        assert_eq!(nt.dist(NodeId(0), 1), 2.0);
        assert_eq!(nt.dist(NodeId(2), 1), 2.0);
    }

    #[test]
    fn boundary_bounds_on_a_path() {
        let mut g = terminal_path();
        g.set_terminal(NodeId(2), TerminalKind::Pseudo).unwrap();
        let nt = NearestTerminals::compute(&g, 2);
        let bounds = nt.boundary_bounds(&g);
        assert_eq!(bounds.bound(NodeId(0), NodeId(2)), Some(2.0));
        assert_eq!(bounds.bound(NodeId(4), NodeId(2)), Some(2.0));
        assert_eq!(bounds.bound(NodeId(0), NodeId(4)), Some(4.0));
        assert_eq!(bounds.len(), 3);
    }

    #[test]
    fn layer_count_comes_from_config() {
        let g = terminal_path();
        let one = SearchConfig { terminal_layers: 1, ..SearchConfig::default() };
        let nt = NearestTerminals::from_config(&g, &one);
        assert_eq!(nt.layers(), 1);
        assert_eq!(nt.filled(NodeId(2)), 1);
        let nt = NearestTerminals::from_config(&g, &SearchConfig::default());
        assert_eq!(nt.layers(), SearchConfig::default().terminal_layers);
        // only two terminals exist, so the third layer stays empty
        assert_eq!(nt.filled(NodeId(2)), 2);
        assert_eq!(nt.base(NodeId(2), 2), None);
    }
}
