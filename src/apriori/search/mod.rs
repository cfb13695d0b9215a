//! Level-wise candidate search.
//!
//! Each step searches one order: build that order's candidate set, count it
//! against every row, then split it into pruned, emitted and seeding
//! itemsets. The set and its counters live only for the step; what carries
//! over is the seed list in [`SearchState`].

pub mod processor;
pub mod state;

pub use processor::{classify, count_level, CandidateCount, Classified, Thresholds};
pub use state::{SearchPhase, SearchState};

use tracing::{debug, info};

use super::combinations::binomial;
use super::config::{CapacityPolicy, SearchConfig, SelectionPolicy};
use super::fixed_set::{FixedCapacityIntSet, KeyMode};
use super::generate::{initial_candidates, SeedIndex};
use super::key::{IntKey, KeyLayout};
use super::memory::{estimate_level_bytes, MemoryBudget, MemoryGuard};
use super::metric::Population;
use super::rows::EncodedRows;
use super::storage::{Explanation, ExplanationLevel};
use crate::error::{ExplainError, Result};

/// What one step found.
#[derive(Debug, Clone)]
pub struct LevelReport {
    pub order: usize,
    pub capacity: usize,
    /// Every candidate counted at this order
    pub generated: Vec<IntKey>,
    /// Candidates that seed the next order
    pub survivors: Vec<IntKey>,
    pub pruned: Vec<IntKey>,
    pub emitted: Vec<Explanation>,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub num_rows: usize,
    pub num_outliers: usize,
    pub levels_searched: usize,
    /// Ordered by ratio, then outlier support, both descending
    pub explanations: Vec<Explanation>,
}

pub struct LevelSearch<'a> {
    rows: &'a EncodedRows,
    config: SearchConfig,
    layout: KeyLayout,
    budget: MemoryBudget,
    population: Population,
    thresholds: Thresholds,
    state: SearchState,
}

impl<'a> LevelSearch<'a> {
    pub fn new(rows: &'a EncodedRows, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let layout = config.layout()?;
        if let Some(max_id) = rows.max_id() {
            // fail before counting rather than on the first surviving id
            layout.singleton(max_id)?;
        }

        let (min_support, min_outlier_support) = config.min_support.resolve(rows.num_outliers());
        let thresholds = Thresholds {
            min_support,
            min_outlier_support,
            min_ratio: config.min_ratio,
        };
        let budget = MemoryBudget::new(config.memory_limit);

        Ok(Self {
            rows,
            layout,
            budget,
            population: Population {
                rows: rows.len() as u64,
                outliers: rows.num_outliers() as u64,
            },
            thresholds,
            state: SearchState::new(),
            config,
        })
    }

    pub fn phase(&self) -> SearchPhase {
        self.state.phase
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches the next order. Returns `None` once the search has finished.
    ///
    /// An error leaves the search where it was; the caller may drop it or
    /// rebuild it with a different configuration.
    pub fn step(&mut self) -> Result<Option<LevelReport>> {
        let Some(order) = self.state.next_order() else {
            return Ok(None);
        };

        let Some((candidates, guard)) = build_candidates(
            self.rows,
            &self.state.seeds,
            &self.layout,
            &self.config,
            &self.budget,
            order,
        )?
        else {
            debug!(order, "no candidates generated");
            self.state.finish();
            return Ok(None);
        };
        let capacity = candidates.capacity();

        let counters = count_level(
            self.rows,
            &candidates,
            order,
            &self.layout,
            self.config.parallelism,
        );
        let classified = classify(
            &candidates,
            &counters,
            &self.layout,
            self.config.strategy,
            self.config.ratio_metric,
            self.population,
            self.thresholds,
        )?;

        let mut generated = candidates
            .iter_slots()
            .map(|(_, bits)| processor::candidate_key(&candidates, bits, &self.layout))
            .collect::<Result<Vec<_>>>()?;
        processor::sort_keys(&mut generated, &self.layout);

        let mut level = ExplanationLevel::new(order);
        for count in &classified.emitted {
            let items = self.layout.decode(count.key);
            level.add_itemset(&items, count.support, count.outlier_support, count.ratio);
            self.state.emitted_keys.push(count.key);
        }
        let emitted: Vec<Explanation> = level.iter().collect();
        self.state.levels.push(level);

        debug!(
            order,
            capacity,
            reserved_bytes = guard.bytes(),
            generated = generated.len(),
            survivors = classified.seeds.len(),
            pruned = classified.pruned.len(),
            emitted = emitted.len(),
            "level searched"
        );

        let report = LevelReport {
            order,
            capacity,
            generated,
            survivors: classified.seeds.clone(),
            pruned: classified.pruned,
            emitted,
        };
        self.state
            .complete_level(order, classified.seeds, self.layout.max_order());
        Ok(Some(report))
    }

    /// Emitted itemsets so far, filtered by the selection policy and ordered.
    fn collect(&self) -> Result<Vec<Explanation>> {
        let dominated = match self.config.selection {
            SelectionPolicy::All => None,
            SelectionPolicy::Maximal => {
                let mut dominated = FixedCapacityIntSet::new(
                    CapacityPolicy::Auto
                        .capacity_for(self.state.emitted_keys.len() * self.layout.max_order()),
                    KeyMode::Composite,
                )?;
                for &key in &self.state.emitted_keys {
                    for subset in self.layout.subsets_without_one(key) {
                        dominated.add(subset)?;
                    }
                }
                Some(dominated)
            }
        };

        let mut explanations: Vec<Explanation> = Vec::new();
        for level in &self.state.levels {
            for explanation in level.iter() {
                if let Some(dominated) = &dominated {
                    let key = self.layout.encode_sorted(&explanation.items)?;
                    if dominated.contains(key) {
                        continue;
                    }
                }
                explanations.push(explanation);
            }
        }

        explanations.sort_by(|a, b| {
            b.ratio
                .total_cmp(&a.ratio)
                .then(b.outlier_support.cmp(&a.outlier_support))
                .then(a.order().cmp(&b.order()))
                .then_with(|| a.items.cmp(&b.items))
        });
        Ok(explanations)
    }

    /// The result of a finished search.
    pub fn summary(&self) -> Result<Summary> {
        if self.state.phase != SearchPhase::Finished {
            return Err(ExplainError::InvalidPhase {
                operation: "summarize",
                phase: self.state.phase.to_string(),
            });
        }
        Ok(Summary {
            num_rows: self.rows.len(),
            num_outliers: self.rows.num_outliers(),
            levels_searched: self.state.levels_searched,
            explanations: self.collect()?,
        })
    }

    /// Steps until finished and returns the summary.
    pub fn run(mut self) -> Result<Summary> {
        while self.step()?.is_some() {}
        let summary = self.summary()?;
        info!(
            rows = summary.num_rows,
            outliers = summary.num_outliers,
            levels = summary.levels_searched,
            explanations = summary.explanations.len(),
            "search finished"
        );
        Ok(summary)
    }
}

/// Builds the candidate set for `order`, reserving its memory first.
///
/// Returns `None` when the seeds admit no join.
fn build_candidates<'b>(
    rows: &EncodedRows,
    seeds: &[IntKey],
    layout: &KeyLayout,
    config: &SearchConfig,
    budget: &'b MemoryBudget,
    order: usize,
) -> Result<Option<(FixedCapacityIntSet, MemoryGuard<'b>)>> {
    if order == 1 {
        let capacity = config.capacity.capacity_for(rows.distinct_ids());
        let guard = budget.reserve(estimate_level_bytes(capacity))?;
        let set = initial_candidates(rows, capacity)?;
        return Ok(Some((set, guard)));
    }

    let index = SeedIndex::new(seeds, *layout)?;
    let joins = index.count_joins()?;
    if joins == 0 {
        return Ok(None);
    }
    // no order can yield more candidates than seed pairs
    let expected = joins.min(binomial(seeds.len(), 2));
    let capacity = config.capacity.capacity_for(expected);
    let guard = budget.reserve(estimate_level_bytes(capacity))?;
    let set = index.generate(capacity)?;
    Ok(Some((set, guard)))
}

/// Runs a complete search over `rows`.
pub fn explain(rows: &EncodedRows, config: SearchConfig) -> Result<Summary> {
    LevelSearch::new(rows, config)?.run()
}
