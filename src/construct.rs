//! Greedy Steiner tree construction (shortest-path heuristic).
//!
//! The tree grows from a start node with one incremental Dijkstra. When an
//! extracted node is worth connecting, its whole predecessor chain joins the
//! tree, every chain node drops to distance zero and is queued again, so the
//! search continues from the new branch at no cost.
//!
//! Results are written to caller-owned arrays: `connected[v]` and the tree arc
//! `pred[v]` entering `v` from its parent (`None` for the tree root). The
//! routines here reset the scratch before returning.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::config::SearchConfig;
use crate::graph::{ArcId, Graph, NodeId};
use crate::numeric::{is_ge, is_gt, is_lt};
use crate::scratch::SearchScratch;

/// Which prizes pay for a branch ending in pseudo-terminal `k`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PrizeCredit {
    /// Only the prize of `k`.
    #[default]
    TargetOnly,
    /// `k` plus every unconnected pseudo-terminal on its branch.
    AlongPath,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeOutcome {
    /// Every marked required terminal is in the tree.
    Complete,
    /// This many required terminals could not be reached.
    Unreachable(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Rule {
    /// Connect required terminals only.
    Required,
    /// Also connect pseudo-terminals that pay for their branch.
    Profitable(PrizeCredit),
}

struct Growth<'a> {
    graph: &'a Graph,
    costs: &'a [f64],
    rule: Rule,
    open_required: usize,
    added: usize,
}

impl Growth<'_> {
    fn prize_bound(&self, connected: &[bool]) -> f64 {
        let open = self.graph.nodes().filter(|&v| self.graph.is_pseudo_terminal(v) && self.graph.is_marked(v) && !connected[v.index()]);
        match self.rule {
            Rule::Required => 0.0,
            Rule::Profitable(PrizeCredit::TargetOnly) => open.map(|v| self.graph.prize(v)).fold(0.0, f64::max),
            Rule::Profitable(PrizeCredit::AlongPath) => open.map(|v| self.graph.prize(v)).sum(),
        }
    }

    fn worth_connecting(&self, k: NodeId, scratch: &SearchScratch, connected: &[bool]) -> bool {
        let g = self.graph;
        if g.is_terminal(k) { return true; }
        let Rule::Profitable(credit) = self.rule else { return false };
        if !g.is_pseudo_terminal(k) { return false; }
        let mut prize = g.prize(k);
        if credit == PrizeCredit::AlongPath {
            let mut v = k;
            while let Some(a) = scratch.pred(v) {
                v = g.tail(a);
                if connected[v.index()] { break; }
                if g.is_pseudo_terminal(v) { prize += g.prize(v); }
            }
        }
        is_ge(prize, scratch.dist(k))
    }

    /// Connects the chain from `k` back to the tree.
    fn splice(&mut self, k: NodeId, scratch: &mut SearchScratch, connected: &mut [bool], pred: &mut [Option<ArcId>]) {
        let mut v = k;
        while !connected[v.index()] {
            connected[v.index()] = true;
            pred[v.index()] = scratch.pred(v);
            if self.graph.is_terminal(v) { self.open_required -= 1; }
            self.added += 1;
            scratch.dist[v.index()] = 0.0;
            scratch.heap.reopen(v, &scratch.dist);
            match scratch.pred(v) {
                Some(a) => v = self.graph.tail(a),
                None => break,
            }
        }
    }

    fn run(&mut self, scratch: &mut SearchScratch, connected: &mut [bool], pred: &mut [Option<ArcId>]) {
        let g = self.graph;
        let mut bound = self.prize_bound(connected);
        let mut settled = 0usize;
        loop {
            let Some(top) = scratch.heap.peek_min() else { break };
            if self.open_required == 0 && (self.rule == Rule::Required || is_gt(scratch.dist(top), bound)) { break; }
            let Some(k) = scratch.extract_min() else { break };
            settled += 1;
            if !connected[k.index()] && self.worth_connecting(k, scratch, connected) {
                self.splice(k, scratch, connected, pred);
                bound = self.prize_bound(connected);
                continue;
            }
            let dk = scratch.dist(k);
            for a in g.out_arcs(k) {
                let m = g.head(a);
                if !g.is_marked(m) || connected[m.index()] { continue; }
                let d = dk + self.costs[a.index()];
                if is_lt(d, scratch.dist(m)) {
                    scratch.set_label(m, d, Some(a));
                    scratch.heap.reopen(m, &scratch.dist);
                }
            }
        }
        debug!(settled, added = self.added, open_required = self.open_required, "tree growth");
    }
}

fn open_required(graph: &Graph, connected: &[bool]) -> usize {
    graph.terminals().filter(|&t| graph.is_marked(t) && !connected[t.index()]).count()
}

fn grow_from(
    graph: &Graph,
    costs: &[f64],
    start: NodeId,
    rule: Rule,
    scratch: &mut SearchScratch,
    connected: &mut [bool],
    pred: &mut [Option<ArcId>],
) -> TreeOutcome {
    debug_assert_eq!(connected.len(), graph.node_count());
    debug_assert_eq!(pred.len(), graph.node_count());
    debug_assert_eq!(costs.len(), graph.arc_count());
    debug_assert!(scratch.touched().is_empty(), "scratch was not reset");
    connected.fill(false);
    pred.fill(None);
    connected[start.index()] = true;
    scratch.set_label(start, 0.0, None);
    scratch.enqueue(start);
    let mut growth = Growth { graph, costs, rule, open_required: open_required(graph, connected), added: 1 };
    growth.run(scratch, connected, pred);
    scratch.reset();
    match growth.open_required {
        0 => TreeOutcome::Complete,
        missing => TreeOutcome::Unreachable(missing),
    }
}

/// Tree spanning all required terminals, grown from `start`.
pub fn shortest_path_tree(
    graph: &Graph,
    costs: &[f64],
    start: NodeId,
    scratch: &mut SearchScratch,
    connected: &mut [bool],
    pred: &mut [Option<ArcId>],
) -> TreeOutcome {
    grow_from(graph, costs, start, Rule::Required, scratch, connected, pred)
}

/// Tree spanning all required terminals (fixed terminals of rooted
/// instances included) plus every pseudo-terminal whose credited prize covers
/// the cost of its branch. Growth stops early once the cheapest open label
/// exceeds what the unconnected prizes could still pay for.
pub fn prize_collecting_tree(
    graph: &Graph,
    costs: &[f64],
    start: NodeId,
    credit: PrizeCredit,
    scratch: &mut SearchScratch,
    connected: &mut [bool],
    pred: &mut [Option<ArcId>],
) -> TreeOutcome {
    grow_from(graph, costs, start, Rule::Profitable(credit), scratch, connected, pred)
}

/// Grows an existing tree for up to `rounds` (at most two) rounds, each
/// seeded with all tree nodes at distance zero. Returns the number of nodes
/// added.
pub fn extend_tree(
    graph: &Graph,
    costs: &[f64],
    credit: PrizeCredit,
    rounds: usize,
    scratch: &mut SearchScratch,
    connected: &mut [bool],
    pred: &mut [Option<ArcId>],
) -> usize {
    debug_assert!(scratch.touched().is_empty(), "scratch was not reset");
    let mut total = 0;
    for round in 0..rounds.min(2) {
        for v in graph.nodes().filter(|&v| connected[v.index()]) {
            scratch.set_label(v, 0.0, None);
            scratch.enqueue(v);
        }
        let mut growth = Growth { graph, costs, rule: Rule::Profitable(credit), open_required: open_required(graph, connected), added: 0 };
        growth.run(scratch, connected, pred);
        scratch.reset();
        debug!(round, added = growth.added, "tree extension");
        total += growth.added;
        if growth.added == 0 { break; }
    }
    total
}

/// Repeatedly drops leaves that do not pay for their tree arc: Steiner
/// leaves always, pseudo-terminal leaves whose prize is below the arc cost.
/// Required terminals and the tree root stay. Returns the number removed.
pub fn prune_leaves(graph: &Graph, costs: &[f64], connected: &mut [bool], pred: &mut [Option<ArcId>]) -> usize {
    let mut children = vec![0u32; graph.node_count()];
    for v in graph.nodes().filter(|&v| connected[v.index()]) {
        if let Some(a) = pred[v.index()] { children[graph.tail(a).index()] += 1; }
    }
    let mut stack: Vec<NodeId> = graph.nodes().filter(|&v| connected[v.index()] && children[v.index()] == 0).collect();
    let mut removed = 0;
    while let Some(v) = stack.pop() {
        let Some(a) = pred[v.index()] else { continue };
        let useless = if graph.is_terminal(v) {
            false
        } else if graph.is_pseudo_terminal(v) {
            is_lt(graph.prize(v), costs[a.index()])
        } else {
            true
        };
        if !useless { continue; }
        connected[v.index()] = false;
        pred[v.index()] = None;
        removed += 1;
        let parent = graph.tail(a);
        children[parent.index()] -= 1;
        if children[parent.index()] == 0 { stack.push(parent); }
    }
    removed
}

/// Sum of the tree arc costs.
pub fn tree_cost(graph: &Graph, costs: &[f64], connected: &[bool], pred: &[Option<ArcId>]) -> f64 {
    graph.nodes().filter(|&v| connected[v.index()]).filter_map(|v| pred[v.index()]).map(|a| costs[a.index()]).sum()
}

/// Tree cost plus the prizes of pseudo-terminals left out.
pub fn prize_objective(graph: &Graph, costs: &[f64], connected: &[bool], pred: &[Option<ArcId>]) -> f64 {
    let missed: f64 = graph.nodes().filter(|&v| graph.is_pseudo_terminal(v) && !connected[v.index()]).map(|v| graph.prize(v)).sum();
    tree_cost(graph, costs, connected, pred) + missed
}

#[derive(Clone, Debug, PartialEq)]
pub struct SteinerTree {
    pub start: NodeId,
    pub connected: Vec<bool>,
    pub pred: Vec<Option<ArcId>>,
    pub cost: f64,
    /// `cost` plus missed prizes; equals `cost` without pseudo-terminals.
    pub objective: f64,
}

impl SteinerTree {
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.connected.iter().enumerate().filter(|(_, &c)| c).map(|(i, _)| NodeId::from_index(i))
    }

    pub fn arcs(&self) -> impl Iterator<Item = ArcId> + '_ { self.pred.iter().flatten().copied() }
}

/// Runs the construction from up to `config.construction_starts` terminals,
/// drawn with a `SmallRng` seeded from `config.seed`, extends and prunes each
/// tree, and keeps the one with the smallest objective. Ties keep the earlier
/// start. `None` if the graph has no marked terminal or no start reaches
/// every required terminal.
pub fn best_of_starts(graph: &Graph, costs: &[f64], config: &SearchConfig, scratch: &mut SearchScratch) -> Option<SteinerTree> {
    let prize_collecting = graph.nodes().any(|v| graph.is_pseudo_terminal(v));
    let mut starts: Vec<NodeId> = graph.terminals().filter(|&t| graph.is_marked(t)).collect();
    if starts.is_empty() {
        starts = graph.all_terminals().filter(|&t| graph.is_marked(t)).collect();
    }
    if starts.is_empty() { return None; }
    if let Some(root) = graph.root() {
        // rooted instances always grow from the root
        starts = vec![root];
    } else {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        starts.shuffle(&mut rng);
        starts.truncate(config.construction_starts.max(1));
    }

    let n = graph.node_count();
    let mut best: Option<SteinerTree> = None;
    for &start in &starts {
        let mut connected = vec![false; n];
        let mut pred = vec![None; n];
        let outcome = if prize_collecting {
            let out = prize_collecting_tree(graph, costs, start, PrizeCredit::TargetOnly, scratch, &mut connected, &mut pred);
            extend_tree(graph, costs, PrizeCredit::AlongPath, config.extension_rounds, scratch, &mut connected, &mut pred);
            out
        } else {
            shortest_path_tree(graph, costs, start, scratch, &mut connected, &mut pred)
        };
        if outcome != TreeOutcome::Complete { continue; }
        prune_leaves(graph, costs, &mut connected, &mut pred);
        let cost = tree_cost(graph, costs, &connected, &pred);
        let objective = prize_objective(graph, costs, &connected, &pred);
        debug!(start = %start, cost, objective, "construction start");
        if best.as_ref().map_or(true, |b| is_lt(objective, b.objective)) {
            best = Some(SteinerTree { start, connected, pred, cost, objective });
        }
    }
    best
}
