use serde::{Deserialize, Serialize};

use super::key::KeyLayout;
use crate::error::{ExplainError, Result};

/// Occupancy above which an automatically sized set is doubled.
pub const MAX_LOAD_FACTOR: f64 = 0.7;

/// Largest fixed capacity whose power-of-two rounding still fits a `usize`.
pub const MAX_FIXED_CAPACITY: usize = 1 << (usize::BITS - 1);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SupportThreshold {
    /// Total support must reach this many rows.
    Rows(u64),
    /// Outlier support must reach this fraction of all outlier rows.
    OutlierFraction(f64),
}

impl SupportThreshold {
    /// Resolves the threshold into `(min total support, min outlier support)`.
    pub fn resolve(&self, num_outliers: usize) -> (u64, u64) {
        match *self {
            SupportThreshold::Rows(n) => (n, 0),
            SupportThreshold::OutlierFraction(f) => (1, (f * num_outliers as f64).ceil() as u64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioMetric {
    /// `outlier_support / support`.
    OutlierShare,
    /// Outlier rate among rows matching the itemset divided by the outlier
    /// rate among rows that do not.
    RiskRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PruneStrategy {
    /// Keep only candidates passing both support and ratio; they are emitted
    /// and seed the next level.
    SupportAndRatio,
    /// Drop candidates failing support. Candidates passing ratio are emitted
    /// and not grown further; the rest seed the next level.
    MinimalExplanations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    All,
    /// Only emitted itemsets with no emitted strict superset.
    Maximal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityPolicy {
    Fixed(usize),
    Auto,
}

impl CapacityPolicy {
    /// Set capacity for a level expected to hold at most `expected` keys.
    pub fn capacity_for(&self, expected: usize) -> usize {
        match *self {
            CapacityPolicy::Fixed(n) => n,
            CapacityPolicy::Auto => {
                let wanted = (expected as f64 / MAX_LOAD_FACTOR).ceil() as usize;
                wanted
                    .max(1)
                    .checked_next_power_of_two()
                    .unwrap_or(usize::MAX)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parallelism {
    Serial,
    Chunked { chunk_size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_order: usize,
    pub bits_per_slot: u32,
    pub min_support: SupportThreshold,
    pub min_ratio: f64,
    pub ratio_metric: RatioMetric,
    pub strategy: PruneStrategy,
    pub selection: SelectionPolicy,
    pub capacity: CapacityPolicy,
    pub parallelism: Parallelism,
    pub memory_limit: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_order: 3,
            bits_per_slot: 21,
            min_support: SupportThreshold::Rows(1),
            min_ratio: 0.5,
            ratio_metric: RatioMetric::OutlierShare,
            strategy: PruneStrategy::SupportAndRatio,
            selection: SelectionPolicy::All,
            capacity: CapacityPolicy::Auto,
            parallelism: Parallelism::Chunked { chunk_size: 4096 },
            memory_limit: None,
        }
    }
}

impl SearchConfig {
    pub fn new(min_support: u64, min_ratio: f64) -> Self {
        Self {
            min_support: SupportThreshold::Rows(min_support),
            min_ratio,
            ..Self::default()
        }
    }

    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }

    pub fn with_bits_per_slot(mut self, bits: u32) -> Self {
        self.bits_per_slot = bits;
        self
    }

    pub fn with_min_support(mut self, threshold: SupportThreshold) -> Self {
        self.min_support = threshold;
        self
    }

    pub fn with_ratio_metric(mut self, metric: RatioMetric) -> Self {
        self.ratio_metric = metric;
        self
    }

    pub fn with_strategy(mut self, strategy: PruneStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_capacity(mut self, capacity: CapacityPolicy) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_memory_limit(mut self, limit_bytes: usize) -> Self {
        self.memory_limit = Some(limit_bytes);
        self
    }

    pub fn layout(&self) -> Result<KeyLayout> {
        KeyLayout::new(self.bits_per_slot, self.max_order)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout()?;
        if !self.min_ratio.is_finite() || self.min_ratio < 0.0 {
            return Err(ExplainError::InvalidConfig(format!(
                "min_ratio must be finite and non-negative, got {}",
                self.min_ratio
            )));
        }
        if let SupportThreshold::OutlierFraction(f) = self.min_support {
            if !(0.0..=1.0).contains(&f) {
                return Err(ExplainError::InvalidConfig(format!(
                    "outlier support fraction must lie in [0, 1], got {}",
                    f
                )));
            }
        }
        match self.capacity {
            CapacityPolicy::Fixed(0) => {
                return Err(ExplainError::InvalidConfig(
                    "fixed capacity must be positive".to_string(),
                ));
            }
            CapacityPolicy::Fixed(n) if n > MAX_FIXED_CAPACITY => {
                return Err(ExplainError::InvalidConfig(format!(
                    "fixed capacity {} exceeds {}",
                    n, MAX_FIXED_CAPACITY
                )));
            }
            _ => {}
        }
        if let Parallelism::Chunked { chunk_size: 0 } = self.parallelism {
            return Err(ExplainError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
