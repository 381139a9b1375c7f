mod common;

use common::*;
use stp_paths::{
    best_of_starts, prize_objective, prune_leaves, shortest_path_tree, tree_cost, ArcId, Graph, NodeId, SearchConfig,
    SearchScratch, SteinerTree, TerminalKind, TreeOutcome,
};

/// Every tree node reaches `start` over tree arcs without repeating a node.
fn assert_rooted_at(g: &Graph, start: NodeId, connected: &[bool], pred: &[Option<ArcId>]) {
    assert!(connected[start.index()]);
    assert_eq!(pred[start.index()], None);
    for v in g.nodes().filter(|&v| connected[v.index()]) {
        let mut u = v;
        let mut steps = 0;
        while let Some(a) = pred[u.index()] {
            assert_eq!(g.head(a), u);
            u = g.tail(a);
            assert!(connected[u.index()], "tree arc leaves the tree at {u}");
            steps += 1;
            assert!(steps <= g.node_count(), "cycle through {v}");
        }
        assert_eq!(u, start);
    }
}

#[test]
fn star_tree_costs_the_sum_of_its_edges() {
    init_tracing();
    let mut g = star_graph(&[3.0, 1.0, 4.0, 1.0, 5.0]);
    for v in 1..=5 { g.set_terminal(NodeId(v), TerminalKind::Proper).unwrap(); }
    let mut s = SearchScratch::new(g.node_count(), 4);
    let mut conn = vec![false; 6];
    let mut pred = vec![None; 6];
    let out = shortest_path_tree(&g, g.costs(), NodeId(2), &mut s, &mut conn, &mut pred);
    assert_eq!(out, TreeOutcome::Complete);
    assert_eq!(tree_cost(&g, g.costs(), &conn, &pred), 14.0);
    assert_rooted_at(&g, NodeId(2), &conn, &pred);
}

#[test]
fn random_trees_span_all_terminals_within_path_bound() {
    for seed in 1..=10u64 {
        let mut g = pseudo_random_graph(40, 60, seed * 97, false);
        let terminals = random_terminals(&mut g, 7, TerminalKind::Proper, seed);
        let fw = floyd_warshall(&g);
        let start = terminals[0];
        let mut s = SearchScratch::new(g.node_count(), 4);
        let mut conn = vec![false; g.node_count()];
        let mut pred = vec![None; g.node_count()];
        let out = shortest_path_tree(&g, g.costs(), start, &mut s, &mut conn, &mut pred);
        assert_eq!(out, TreeOutcome::Complete, "seed {seed}");
        assert!(s.is_pristine());
        assert!(terminals.iter().all(|t| conn[t.index()]));
        assert_rooted_at(&g, start, &conn, &pred);
        let cost = tree_cost(&g, g.costs(), &conn, &pred);
        let bound: f64 = terminals.iter().map(|t| fw[start.index()][t.index()]).sum();
        assert!(cost <= bound, "seed {seed}: {cost} > {bound}");
        // every branch ends in a terminal
        assert_eq!(prune_leaves(&g, g.costs(), &mut conn, &mut pred), 0);
    }
}

#[test]
fn best_of_starts_is_deterministic_and_minimal() {
    for seed in 1..=6u64 {
        let mut g = pseudo_random_graph(30, 45, seed * 5, false);
        let terminals = random_terminals(&mut g, 5, TerminalKind::Proper, seed);
        let cfg = SearchConfig { construction_starts: terminals.len(), seed, ..SearchConfig::default() };
        let mut s = SearchScratch::new(g.node_count(), 4);
        let best = best_of_starts(&g, g.costs(), &cfg, &mut s).unwrap();
        assert_eq!(Some(&best), best_of_starts(&g, g.costs(), &cfg, &mut s).as_ref());
        assert_eq!(best.cost, best.objective);
        assert_rooted_at(&g, best.start, &best.connected, &best.pred);
        for &t in &terminals {
            let mut conn = vec![false; g.node_count()];
            let mut pred = vec![None; g.node_count()];
            shortest_path_tree(&g, g.costs(), t, &mut s, &mut conn, &mut pred);
            assert!(best.cost <= tree_cost(&g, g.costs(), &conn, &pred), "seed {seed} start {t}");
        }
    }
}

#[test]
fn prize_collecting_trees_never_lose_to_the_empty_tree() {
    for seed in 1..=8u64 {
        let mut g = pseudo_random_graph(30, 40, seed * 23, false);
        random_terminals(&mut g, 8, TerminalKind::Pseudo, seed);
        let total_prize: f64 = g.nodes().map(|v| g.prize(v)).sum();
        let cfg = SearchConfig { construction_starts: 4, seed, ..SearchConfig::default() };
        let mut s = SearchScratch::new(g.node_count(), 4);
        let SteinerTree { start, connected, pred, cost, objective } = best_of_starts(&g, g.costs(), &cfg, &mut s).unwrap();
        assert!(s.is_pristine());
        assert!(g.is_pseudo_terminal(start));
        assert_rooted_at(&g, start, &connected, &pred);
        assert_eq!(objective, prize_objective(&g, g.costs(), &connected, &pred));
        assert!(cost <= objective);
        assert!(objective <= total_prize, "seed {seed}: {objective} > {total_prize}");
    }
}
