//! Byte accounting for per-level structures.
//!
//! A level reserves its candidate set and counters before allocating them
//! and releases the reservation when the level's structures are dropped.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ExplainError, Result};

pub struct MemoryBudget {
    limit: Option<usize>,
    reserved: AtomicUsize,
}

impl MemoryBudget {
    /// `None` accepts every reservation.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            reserved: AtomicUsize::new(0),
        }
    }

    /// Reserves `bytes` until the returned guard is dropped.
    pub fn reserve(&self, bytes: usize) -> Result<MemoryGuard<'_>> {
        if let Some(limit) = self.limit {
            self.reserved
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |reserved| {
                    reserved.checked_add(bytes).filter(|&total| total <= limit)
                })
                .map_err(|reserved| ExplainError::MemoryBudgetExceeded {
                    requested: bytes,
                    available: limit.saturating_sub(reserved),
                })?;
        }
        Ok(MemoryGuard {
            budget: self,
            bytes,
        })
    }

    fn release(&self, bytes: usize) {
        if self.limit.is_some() {
            self.reserved.fetch_sub(bytes, Ordering::AcqRel);
        }
    }
}

/// A live reservation against a [`MemoryBudget`].
pub struct MemoryGuard<'a> {
    budget: &'a MemoryBudget,
    bytes: usize,
}

impl MemoryGuard<'_> {
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for MemoryGuard<'_> {
    fn drop(&mut self) {
        self.budget.release(self.bytes);
    }
}

/// Bytes held by one level: the slot array plus two `u64` counter arrays.
pub fn estimate_level_bytes(capacity: usize) -> usize {
    let slot_size = std::mem::size_of::<u64>() * 2;
    let counter_size = std::mem::size_of::<u64>() * 2;
    capacity.saturating_mul(slot_size + counter_size)
}
