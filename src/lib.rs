//! Shortest-path and special-distance primitives for Steiner tree reductions.
//!
//! Building blocks, bottom-up:
//!  - `heap`: binary min-heaps with decrease-key and deterministic ties
//!  - `dijkstra`: bounded shortest-path / spanning-tree traversal
//!  - `sdwalk`: terminal-bounded special-distance walks with prize accounting
//!  - `star`: localized star search marking replaceable center edges
//!  - `layers`: multi-level nearest terminals and boundary-edge bounds
//!  - `construct`: greedy Steiner tree construction, extension and pruning
//!
//! All searches borrow caller-owned scratch buffers and report budget or limit
//! overruns as outcomes, never as errors. A C ABI for the star search lives in
//! `ffi`.

pub mod config;
pub mod construct;
pub mod csr;
pub mod dijkstra;
pub mod ffi;
pub mod graph;
pub mod heap;
pub mod layers;
pub mod numeric;
pub mod scratch;
pub mod sdwalk;
pub mod star;

pub use config::{ConfigError, SearchConfig};
pub use construct::{
    best_of_starts, extend_tree, prize_collecting_tree, prize_objective, prune_leaves, shortest_path_tree, tree_cost,
    PrizeCredit, SteinerTree, TreeOutcome,
};
pub use csr::Csr;
pub use dijkstra::{dijkstra, dijkstra_from_terminals, dijkstra_multi, dijkstra_to_root, path_arcs, Limits, StopAt, TraversalMode, TraversalOutcome};
pub use graph::{ArcId, EdgeId, Graph, GraphError, MarkGuard, NodeId, TerminalKind};
pub use heap::{HeapStats, NodeHeap, PositionHeap};
pub use layers::{NearestTerminals, TerminalPairBounds, MAX_LAYERS};
pub use scratch::{ListFill, SearchScratch};
pub use sdwalk::{sd_walk, sd_walk_ext, sd_walk_ext_split, WalkOutcome, WalkQuery};
pub use star::{sd_star, sd_star_biased, sd_star_from_config, NodeBias, StarScratch};
