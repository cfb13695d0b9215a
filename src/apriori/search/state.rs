use std::fmt;

use super::super::key::IntKey;
use super::super::storage::ExplanationLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Ready,
    Searching { next_order: usize },
    Finished,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPhase::Ready => write!(f, "ready"),
            SearchPhase::Searching { next_order } => write!(f, "searching (next order {})", next_order),
            SearchPhase::Finished => write!(f, "finished"),
        }
    }
}

/// What carries over from one level to the next.
#[derive(Debug)]
pub struct SearchState {
    pub phase: SearchPhase,
    /// Survivors of the last level that seed the next one
    pub seeds: Vec<IntKey>,
    /// Emitted itemsets, one entry per order searched
    pub levels: Vec<ExplanationLevel>,
    /// Keys of every emitted itemset, for maximal selection
    pub emitted_keys: Vec<IntKey>,
    pub levels_searched: usize,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            phase: SearchPhase::Ready,
            seeds: Vec::new(),
            levels: Vec::new(),
            emitted_keys: Vec::new(),
            levels_searched: 0,
        }
    }

    /// Order of the level the next step would search.
    pub fn next_order(&self) -> Option<usize> {
        match self.phase {
            SearchPhase::Ready => Some(1),
            SearchPhase::Searching { next_order } => Some(next_order),
            SearchPhase::Finished => None,
        }
    }

    /// Records a completed level and decides whether another one follows.
    pub fn complete_level(&mut self, order: usize, seeds: Vec<IntKey>, max_order: usize) {
        self.levels_searched = order;
        self.seeds = seeds;
        self.phase = if self.seeds.is_empty() || order >= max_order {
            SearchPhase::Finished
        } else {
            SearchPhase::Searching {
                next_order: order + 1,
            }
        };
    }

    pub fn finish(&mut self) {
        self.seeds.clear();
        self.phase = SearchPhase::Finished;
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}
