use std::ops::Range;

use rayon::prelude::*;

use super::super::combinations::for_each_combination;
use super::super::config::{Parallelism, PruneStrategy, RatioMetric};
use super::super::counters::LevelCounters;
use super::super::fixed_set::{FixedCapacityIntSet, KeyMode};
use super::super::key::{AttributeValueId, IntKey, KeyLayout};
use super::super::metric::Population;
use super::super::rows::EncodedRows;
use crate::error::Result;

/// Resolved pruning thresholds for one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_support: u64,
    pub min_outlier_support: u64,
    pub min_ratio: f64,
}

/// A counted candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateCount {
    pub key: IntKey,
    pub support: u64,
    pub outlier_support: u64,
    pub ratio: f64,
}

/// How one level's candidates were split by the prune step.
#[derive(Debug, Default)]
pub struct Classified {
    pub emitted: Vec<CandidateCount>,
    pub seeds: Vec<IntKey>,
    pub pruned: Vec<IntKey>,
}

/// The key a candidate set stores, as an [`IntKey`] under `layout`.
pub fn candidate_key(set: &FixedCapacityIntSet, bits: u64, layout: &KeyLayout) -> Result<IntKey> {
    match set.mode() {
        KeyMode::Singleton => layout.singleton(bits as AttributeValueId),
        KeyMode::Composite => Ok(IntKey::from_bits(bits)),
    }
}

/// Marks every id that appears in at least one candidate. Ids outside this
/// mask cannot contribute to any count at this level.
fn active_ids(candidates: &FixedCapacityIntSet, layout: &KeyLayout, max_id: usize) -> Vec<bool> {
    let mut active = vec![false; max_id + 1];
    for bits in candidates.iter() {
        match candidates.mode() {
            KeyMode::Singleton => active[bits as usize] = true,
            KeyMode::Composite => {
                for id in layout.elements(IntKey::from_bits(bits)) {
                    active[id as usize] = true;
                }
            }
        }
    }
    active
}

fn count_range(
    rows: &EncodedRows,
    range: Range<usize>,
    candidates: &FixedCapacityIntSet,
    order: usize,
    layout: &KeyLayout,
    active: &[bool],
    counters: &mut LevelCounters,
) {
    let mut filtered: Vec<AttributeValueId> = Vec::new();
    for idx in range {
        let row = rows.row(idx);
        let is_outlier = rows.is_outlier(idx);

        if order == 1 {
            for &id in row {
                if let Some(slot) = candidates.slot_of(id) {
                    counters.record(slot, is_outlier);
                }
            }
            continue;
        }

        filtered.clear();
        filtered.extend(row.iter().copied().filter(|&id| active[id as usize]));
        if filtered.len() < order {
            continue;
        }
        for_each_combination(&filtered, order, &mut |combination: &[AttributeValueId]| {
            if let Some(slot) = candidates.slot_of(layout.pack_sorted(combination)) {
                counters.record(slot, is_outlier);
            }
        });
    }
}

/// Counts, for every candidate, the rows containing all of its elements and
/// how many of those rows are outliers.
///
/// Chunked parallelism gives each rayon task private counters that are summed
/// afterwards; the candidate set is only read.
pub fn count_level(
    rows: &EncodedRows,
    candidates: &FixedCapacityIntSet,
    order: usize,
    layout: &KeyLayout,
    parallelism: Parallelism,
) -> LevelCounters {
    let capacity = candidates.capacity();
    let num_rows = rows.len();
    let Some(max_id) = rows.max_id() else {
        return LevelCounters::new(capacity);
    };
    let active = active_ids(candidates, layout, max_id as usize);

    match parallelism {
        Parallelism::Serial => {
            let mut counters = LevelCounters::new(capacity);
            count_range(rows, 0..num_rows, candidates, order, layout, &active, &mut counters);
            counters
        }
        Parallelism::Chunked { chunk_size } => {
            let num_chunks = num_rows.div_ceil(chunk_size);
            (0..num_chunks)
                .into_par_iter()
                .fold(
                    || LevelCounters::new(capacity),
                    |mut counters, chunk| {
                        let start = chunk * chunk_size;
                        let end = (start + chunk_size).min(num_rows);
                        count_range(rows, start..end, candidates, order, layout, &active, &mut counters);
                        counters
                    },
                )
                .reduce(|| LevelCounters::new(capacity), |a, b| a.merge(&b))
        }
    }
}

/// Splits counted candidates into emitted, seeding and pruned ones.
pub fn classify(
    candidates: &FixedCapacityIntSet,
    counters: &LevelCounters,
    layout: &KeyLayout,
    strategy: PruneStrategy,
    metric: RatioMetric,
    population: Population,
    thresholds: Thresholds,
) -> Result<Classified> {
    let mut classified = Classified::default();

    for (slot, bits) in candidates.iter_slots() {
        let key = candidate_key(candidates, bits, layout)?;
        let (support, outlier_support) = counters.get(slot);
        let ratio = metric.ratio(support, outlier_support, population);

        let passes_support =
            support >= thresholds.min_support && outlier_support >= thresholds.min_outlier_support;
        let passes_ratio = support > 0 && ratio >= thresholds.min_ratio;
        let count = CandidateCount {
            key,
            support,
            outlier_support,
            ratio,
        };

        match strategy {
            PruneStrategy::SupportAndRatio => {
                if passes_support && passes_ratio {
                    classified.emitted.push(count);
                    classified.seeds.push(key);
                } else {
                    classified.pruned.push(key);
                }
            }
            PruneStrategy::MinimalExplanations => {
                if !passes_support {
                    classified.pruned.push(key);
                } else if passes_ratio {
                    classified.emitted.push(count);
                } else {
                    classified.seeds.push(key);
                }
            }
        }
    }

    // slot order follows the hash; sort for stable output
    classified.emitted.sort_by_cached_key(|c| layout.decode(c.key));
    sort_keys(&mut classified.seeds, layout);
    sort_keys(&mut classified.pruned, layout);
    Ok(classified)
}

pub fn sort_keys(keys: &mut [IntKey], layout: &KeyLayout) {
    keys.sort_by_cached_key(|&key| layout.decode(key));
}
