//! Candidate generation between levels.
//!
//! Level 1 is every attribute value seen in the rows. Level `k + 1` unions
//! pairs of level-`k` seeds that differ by exactly one element and keeps a
//! union only if all of its `k`-subsets are seeds, so nothing containing a
//! pruned itemset is ever counted.

use super::config::CapacityPolicy;
use super::fixed_set::{FixedCapacityIntSet, KeyMode};
use super::key::{IntKey, KeyLayout};
use super::rows::EncodedRows;
use crate::error::Result;

/// Singleton-mode set of every id present in at least one row.
pub fn initial_candidates(rows: &EncodedRows, capacity: usize) -> Result<FixedCapacityIntSet> {
    let mut set = FixedCapacityIntSet::new(capacity, KeyMode::Singleton)?;
    for (row, _) in rows.iter() {
        for &id in row {
            set.add(id)?;
        }
    }
    Ok(set)
}

/// Seeds indexed for subset checks.
pub struct SeedIndex<'a> {
    seeds: &'a [IntKey],
    lookup: FixedCapacityIntSet,
    order: usize,
    layout: KeyLayout,
}

impl<'a> SeedIndex<'a> {
    /// `seeds` must all have the same order.
    pub fn new(seeds: &'a [IntKey], layout: KeyLayout) -> Result<Self> {
        let mut lookup = FixedCapacityIntSet::new(
            CapacityPolicy::Auto.capacity_for(seeds.len()),
            KeyMode::Composite,
        )?;
        for &seed in seeds {
            lookup.add(seed)?;
        }
        let order = seeds.first().map_or(0, |&s| layout.order(s));
        debug_assert!(seeds.iter().all(|&s| layout.order(s) == order));
        Ok(Self {
            seeds,
            lookup,
            order,
            layout,
        })
    }

    /// The union of `a` and `b` if they differ by exactly one element and
    /// every subset of the union one element smaller is a seed.
    fn join(&self, a: IntKey, b: IntKey) -> Result<Option<IntKey>> {
        if self.layout.intersection_len(a, b) + 1 != self.order {
            return Ok(None);
        }
        let union = self.layout.union(a, b)?;
        let closed = self
            .layout
            .subsets_without_one(union)
            .into_iter()
            .all(|subset| self.lookup.contains(subset));
        Ok(closed.then_some(union))
    }

    fn for_each_join<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(IntKey) -> Result<()>,
    {
        for (i, &a) in self.seeds.iter().enumerate() {
            for &b in &self.seeds[i + 1..] {
                if let Some(union) = self.join(a, b)? {
                    f(union)?;
                }
            }
        }
        Ok(())
    }

    /// Upper bound on the distinct candidates [`SeedIndex::generate`] yields:
    /// every accepted join, duplicates included.
    pub fn count_joins(&self) -> Result<usize> {
        let mut joins = 0usize;
        self.for_each_join(|_| {
            joins += 1;
            Ok(())
        })?;
        Ok(joins)
    }

    /// Next-level candidates, deduplicated in a composite-mode set.
    pub fn generate(&self, capacity: usize) -> Result<FixedCapacityIntSet> {
        let mut next = FixedCapacityIntSet::new(capacity, KeyMode::Composite)?;
        self.for_each_join(|union| next.add(union).map(|_| ()))?;
        Ok(next)
    }
}

/// Next-level candidates from same-order `seeds`, or `None` when no pair of
/// seeds joins. Capacity follows `policy`, sized from the number of joins.
pub fn generate_next(
    seeds: &[IntKey],
    layout: KeyLayout,
    policy: CapacityPolicy,
) -> Result<Option<FixedCapacityIntSet>> {
    let index = SeedIndex::new(seeds, layout)?;
    let joins = index.count_joins()?;
    if joins == 0 {
        return Ok(None);
    }
    index.generate(policy.capacity_for(joins)).map(Some)
}
