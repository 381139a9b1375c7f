//! Tunables shared by the reduction entry points.
//! Defaults can be overridden from JSON or from `STP_PATHS_*` environment
//! variables (e.g. `STP_PATHS_ANCESTOR_CAPACITY=16`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layers::MAX_LAYERS;

/// Largest ancestor-list capacity accepted by `validate`.
pub const MAX_ANCESTOR_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Capacity K of each bounded ancestor list.
    pub ancestor_capacity: usize,
    /// Arc scans allowed per special-distance walk.
    pub sd_edge_limit: u64,
    /// Arc scans allowed per star search.
    pub star_edge_limit: u64,
    /// Optional arc-scan budget for plain traversals.
    pub dijkstra_edge_budget: Option<u64>,
    /// Number of nearest-terminal layers (1..=4).
    pub terminal_layers: usize,
    /// Growth rounds performed by tree extension (1..=2).
    pub extension_rounds: usize,
    /// Start nodes tried by the multi-start construction.
    pub construction_starts: usize,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ancestor_capacity: 8,
            sd_edge_limit: 100,
            star_edge_limit: 200,
            dijkstra_edge_budget: None,
            terminal_layers: 3,
            extension_rounds: 2,
            construction_starts: 8,
            seed: 0,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue { key, value: v }),
        Err(_) => Ok(None),
    }
}

impl SearchConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> { Ok(serde_json::to_string_pretty(self)?) }

    /// Defaults overridden by any `STP_PATHS_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = env_parse("STP_PATHS_ANCESTOR_CAPACITY")? { cfg.ancestor_capacity = v; }
        if let Some(v) = env_parse("STP_PATHS_SD_EDGE_LIMIT")? { cfg.sd_edge_limit = v; }
        if let Some(v) = env_parse("STP_PATHS_STAR_EDGE_LIMIT")? { cfg.star_edge_limit = v; }
        if let Some(v) = env_parse::<u64>("STP_PATHS_DIJKSTRA_EDGE_BUDGET")? { cfg.dijkstra_edge_budget = Some(v); }
        if let Some(v) = env_parse("STP_PATHS_TERMINAL_LAYERS")? { cfg.terminal_layers = v; }
        if let Some(v) = env_parse("STP_PATHS_EXTENSION_ROUNDS")? { cfg.extension_rounds = v; }
        if let Some(v) = env_parse("STP_PATHS_CONSTRUCTION_STARTS")? { cfg.construction_starts = v; }
        if let Some(v) = env_parse("STP_PATHS_SEED")? { cfg.seed = v; }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |key, value: usize| Err(ConfigError::InvalidValue { key, value: value.to_string() });
        if self.ancestor_capacity == 0 || self.ancestor_capacity > MAX_ANCESTOR_CAPACITY {
            return bad("ancestor_capacity", self.ancestor_capacity);
        }
        if !(1..=MAX_LAYERS).contains(&self.terminal_layers) {
            return bad("terminal_layers", self.terminal_layers);
        }
        if !(1..=2).contains(&self.extension_rounds) {
            return bad("extension_rounds", self.extension_rounds);
        }
        if self.construction_starts == 0 {
            return bad("construction_starts", self.construction_starts);
        }
        Ok(())
    }
}
