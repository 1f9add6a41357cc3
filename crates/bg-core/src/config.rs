//! Run parameters for one growth run.
//!
//! A [`GrowthConfig`] is typically built in code or loaded from a JSON/TOML
//! file by the application (enable the `serde` feature), then validated once
//! before the pipeline starts.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Batch sizes used by the adaptive iterative-pruning schedule.
pub const ADAPTIVE_BATCH_SIZES: [usize; 6] = [40, 20, 10, 5, 2, 1];

// ── PruneMeasure ──────────────────────────────────────────────────────────────

/// Centrality measure used to thin out the triangulation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PruneMeasure {
    /// Keep edges at or above the edge-betweenness quantile.
    #[default]
    Betweenness,
    /// Keep nodes at or above the closeness quantile (induced subgraph).
    Closeness,
    /// Remove low-betweenness edges in shrinking batches, protecting
    /// existing infrastructure.
    IterativeBetweenness,
    /// Single-shot betweenness quantile followed by the iterative pass.
    Hybrid,
}

impl PruneMeasure {
    pub fn as_str(self) -> &'static str {
        match self {
            PruneMeasure::Betweenness          => "betweenness",
            PruneMeasure::Closeness            => "closeness",
            PruneMeasure::IterativeBetweenness => "iterative_betweenness",
            PruneMeasure::Hybrid               => "hybrid",
        }
    }

    /// `true` for the measures that run the quantile betweenness cut.
    #[inline]
    pub fn uses_quantile_betweenness(self) -> bool {
        matches!(self, PruneMeasure::Betweenness | PruneMeasure::Hybrid)
    }

    /// `true` for the measures that run the protected iterative removal.
    #[inline]
    pub fn is_iterative(self) -> bool {
        matches!(self, PruneMeasure::IterativeBetweenness | PruneMeasure::Hybrid)
    }
}

impl fmt::Display for PruneMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PruneMeasure {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "betweenness" => Ok(PruneMeasure::Betweenness),
            "closeness" => Ok(PruneMeasure::Closeness),
            "iterative_betweenness" | "iter_betweenness" => Ok(PruneMeasure::IterativeBetweenness),
            "hybrid" => Ok(PruneMeasure::Hybrid),
            other => Err(CoreError::Parse(format!(
                "unknown prune measure {other:?}: expected betweenness, closeness, \
                 iterative_betweenness or hybrid"
            ))),
        }
    }
}

// ── BatchMode ─────────────────────────────────────────────────────────────────

/// How many edges the iterative pruner removes per betweenness recomputation.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BatchMode {
    /// Start with large batches and halve them as the target gets closer
    /// (see [`ADAPTIVE_BATCH_SIZES`]).
    #[default]
    Adaptive,
    /// Always remove (at least) this many edges per iteration.
    Fixed(usize),
}

impl BatchMode {
    /// The six-step batch-size schedule for this mode.
    pub fn sizes(self) -> [usize; 6] {
        match self {
            BatchMode::Adaptive => ADAPTIVE_BATCH_SIZES,
            BatchMode::Fixed(n) => [n; 6],
        }
    }
}

// ── GrowthConfig ──────────────────────────────────────────────────────────────

/// Parameters of one growth run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GrowthConfig {
    /// Discount applied to existing-infrastructure edges while routing,
    /// in `[0, 1]`.  `0` disables the discount.
    pub route_factor: f64,

    /// Fraction of the triangulation to retain, in `(0, 1]`.
    pub prune_factor: f64,

    /// Centrality measure driving the pruning stage.
    pub prune_measure: PruneMeasure,

    /// Batch schedule for the iterative measures.
    pub batch_mode: BatchMode,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            route_factor:  0.0,
            prune_factor:  1.0,
            prune_measure: PruneMeasure::Betweenness,
            batch_mode:    BatchMode::Adaptive,
        }
    }
}

impl GrowthConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.route_factor) {
            return Err(CoreError::Config(format!(
                "route_factor must be in [0, 1], got {}",
                self.route_factor
            )));
        }
        if !(self.prune_factor > 0.0 && self.prune_factor <= 1.0) {
            return Err(CoreError::Config(format!(
                "prune_factor must be in (0, 1], got {}",
                self.prune_factor
            )));
        }
        if self.batch_mode == BatchMode::Fixed(0) {
            return Err(CoreError::Config("fixed batch size must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether nodes left without incident edges are stripped from the
    /// final network.
    #[inline]
    pub fn drop_isolated(&self) -> bool {
        self.prune_measure == PruneMeasure::IterativeBetweenness
    }
}
