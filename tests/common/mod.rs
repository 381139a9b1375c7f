#![allow(dead_code)]

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stp_paths::numeric::FARAWAY;
use stp_paths::{Graph, NodeId, TerminalKind};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn path_graph(n: u32, w: f64) -> Graph {
    let mut g = Graph::new(n as usize);
    for u in 1..n { g.add_edge(NodeId(u - 1), NodeId(u), w).unwrap(); }
    g
}

/// Center 0, leaves `1..=k` with the given costs.
pub fn star_graph(costs: &[f64]) -> Graph {
    let mut g = Graph::new(costs.len() + 1);
    for (i, &w) in costs.iter().enumerate() { g.add_edge(NodeId(0), NodeId(i as u32 + 1), w).unwrap(); }
    g
}

/// Ring `0 - 1 - ... - (k-1) - 0`; edge `i` joins `i` and `i + 1`.
pub fn cycle_graph(costs: &[f64]) -> Graph {
    let n = costs.len() as u32;
    let mut g = Graph::new(n as usize);
    for (i, &w) in costs.iter().enumerate() {
        let u = i as u32;
        g.add_edge(NodeId(u), NodeId((u + 1) % n), w).unwrap();
    }
    g
}

pub fn complete_graph(n: u32, w: f64) -> Graph {
    let mut g = Graph::new(n as usize);
    for u in 0..n {
        for v in u + 1..n { g.add_edge(NodeId(u), NodeId(v), w).unwrap(); }
    }
    g
}

/// Connected graph: a random spanning tree plus `extra` random edges, integer
/// costs in `1..=9` (exact in f64). Asymmetric arc pairs when `directed`.
pub fn pseudo_random_graph(n: u32, extra: u32, seed: u64, directed: bool) -> Graph {
    assert!(n >= 2);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut g = Graph::new(n as usize);
    let cost = |rng: &mut SmallRng| rng.gen_range(1..=9) as f64;
    for v in 1..n {
        let u = rng.gen_range(0..v);
        let (f, b) = (cost(&mut rng), cost(&mut rng));
        g.add_arc_pair(NodeId(u), NodeId(v), f, if directed { b } else { f }).unwrap();
    }
    let mut added = 0;
    let mut attempts = 0;
    while added < extra && attempts < extra * 10 + 100 {
        attempts += 1;
        let (u, v) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if u == v || g.find_arc(NodeId(u), NodeId(v)).is_some() { continue; }
        let (f, b) = (cost(&mut rng), cost(&mut rng));
        g.add_arc_pair(NodeId(u), NodeId(v), f, if directed { b } else { f }).unwrap();
        added += 1;
    }
    g
}

/// Marks `count` distinct random nodes with `kind`; pseudo-terminals get
/// integer prizes in `1..=6`.
pub fn random_terminals(g: &mut Graph, count: usize, kind: TerminalKind, seed: u64) -> Vec<NodeId> {
    let mut rng = SmallRng::seed_from_u64(seed ^ 0x5eed);
    let mut picked = Vec::new();
    while picked.len() < count.min(g.node_count()) {
        let v = NodeId(rng.gen_range(0..g.node_count() as u32));
        if picked.contains(&v) { continue; }
        g.set_terminal(v, kind).unwrap();
        if kind == TerminalKind::Pseudo { g.set_prize(v, rng.gen_range(1..=6) as f64).unwrap(); }
        picked.push(v);
    }
    picked
}

/// All-pairs distances along arc directions over marked nodes only.
pub fn floyd_warshall(g: &Graph) -> Vec<Vec<f64>> {
    let n = g.node_count();
    let mut d = vec![vec![FARAWAY; n]; n];
    for v in g.nodes().filter(|&v| g.is_marked(v)) {
        d[v.index()][v.index()] = 0.0;
        for a in g.out_arcs(v) {
            let w = g.head(a);
            if g.is_marked(w) && g.cost(a) < d[v.index()][w.index()] { d[v.index()][w.index()] = g.cost(a); }
        }
    }
    for k in 0..n {
        for i in 0..n {
            if d[i][k] >= FARAWAY { continue; }
            for j in 0..n {
                let via = d[i][k] + d[k][j];
                if via < d[i][j] { d[i][j] = via; }
            }
        }
    }
    d
}

/// Kruskal weight of a minimum spanning forest (symmetric costs).
pub fn mst_weight(g: &Graph) -> f64 {
    let mut edges: Vec<(f64, usize, usize)> = (0..g.edge_count())
        .map(|e| {
            let a = stp_paths::EdgeId(e as u32).forward();
            (g.cost(a), g.tail(a).index(), g.head(a).index())
        })
        .collect();
    edges.sort_by(|x, y| x.0.total_cmp(&y.0));
    let mut parent: Vec<usize> = (0..g.node_count()).collect();
    fn find(p: &mut [usize], mut x: usize) -> usize {
        while p[x] != x { p[x] = p[p[x]]; x = p[x]; }
        x
    }
    let mut total = 0.0;
    for (w, u, v) in edges {
        let (ru, rv) = (find(&mut parent, u), find(&mut parent, v));
        if ru != rv { parent[ru] = rv; total += w; }
    }
    total
}
