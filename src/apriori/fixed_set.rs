//! Fixed-capacity open-addressed set of 64-bit keys.
//!
//! Capacity is rounded up to a power of two at construction and never grows;
//! the probe start is `mix(key) & mask` and collisions walk linearly. Keys are
//! only ever added, so there are no tombstones. A level of the search builds
//! one set, hangs its counters off the slot indices, and drops it.

use serde::{Deserialize, Serialize};

use super::key::IntKey;
use crate::error::{ExplainError, Result};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// How an external key is interpreted before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMode {
    /// Plain small non-negative integers, e.g. single attribute value ids.
    Singleton,
    /// Packed [`IntKey`] itemsets.
    Composite,
}

impl KeyMode {
    /// Small dense integers only differ in their low bits, so they get a
    /// multiplicative spread. Packed keys carry structure in every slot and
    /// get the full splitmix64 finalizer.
    #[inline]
    fn mix(self, bits: u64) -> u64 {
        match self {
            KeyMode::Singleton => {
                let h = bits.wrapping_mul(GOLDEN_GAMMA);
                h ^ (h >> 32)
            }
            KeyMode::Composite => {
                let mut z = bits.wrapping_add(GOLDEN_GAMMA);
                z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
                z ^ (z >> 31)
            }
        }
    }
}

/// Anything that reduces to the set's 64-bit representation.
pub trait SetKey: Copy {
    fn to_bits(self) -> u64;
}

impl SetKey for u64 {
    #[inline]
    fn to_bits(self) -> u64 {
        self
    }
}

impl SetKey for u32 {
    #[inline]
    fn to_bits(self) -> u64 {
        u64::from(self)
    }
}

impl SetKey for usize {
    #[inline]
    fn to_bits(self) -> u64 {
        self as u64
    }
}

impl SetKey for IntKey {
    #[inline]
    fn to_bits(self) -> u64 {
        self.bits()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    key: u64,
    occupied: bool,
}

#[derive(Debug, Clone)]
pub struct FixedCapacityIntSet {
    slots: Vec<Slot>,
    mask: usize,
    len: usize,
    mode: KeyMode,
}

impl FixedCapacityIntSet {
    /// Creates a set holding at most `capacity.next_power_of_two()` keys.
    ///
    /// A capacity of zero is treated as one. Fails with `InvalidConfig` if
    /// the rounded capacity cannot be allocated.
    pub fn new(capacity: usize, mode: KeyMode) -> Result<Self> {
        let rounded = capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or_else(|| unallocatable(capacity))?;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(rounded)
            .map_err(|_| unallocatable(capacity))?;
        slots.resize(rounded, Slot::default());
        Ok(Self {
            slots,
            mask: rounded - 1,
            len: 0,
            mode,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Walks the probe sequence for `bits`, returning the slot that holds it
    /// or the first free slot, whichever comes first.
    #[inline]
    fn probe(&self, bits: u64) -> Option<usize> {
        let mut i = self.mode.mix(bits) as usize & self.mask;
        for _ in 0..self.slots.len() {
            let slot = &self.slots[i];
            if !slot.occupied || slot.key == bits {
                return Some(i);
            }
            i = (i + 1) & self.mask;
        }
        None
    }

    /// Inserts `key` and returns its slot index and whether it was new.
    pub fn insert_slot<K: SetKey>(&mut self, key: K) -> Result<(usize, bool)> {
        let bits = key.to_bits();
        let i = self.probe(bits).ok_or(ExplainError::CapacityExceeded {
            capacity: self.slots.len(),
        })?;
        let slot = &mut self.slots[i];
        if slot.occupied {
            return Ok((i, false));
        }
        slot.occupied = true;
        slot.key = bits;
        self.len += 1;
        Ok((i, true))
    }

    /// Inserts `key` if absent. Returns `true` if it was newly added.
    pub fn add<K: SetKey>(&mut self, key: K) -> Result<bool> {
        self.insert_slot(key).map(|(_, inserted)| inserted)
    }

    /// Slot index holding `key`, if present. Stable until the set is cleared.
    #[inline]
    pub fn slot_of<K: SetKey>(&self, key: K) -> Option<usize> {
        let bits = key.to_bits();
        self.probe(bits).filter(|&i| self.slots[i].occupied)
    }

    #[inline]
    pub fn contains<K: SetKey>(&self, key: K) -> bool {
        self.slot_of(key).is_some()
    }

    /// Key stored at `slot`, if occupied.
    pub fn key_at(&self, slot: usize) -> Option<u64> {
        self.slots
            .get(slot)
            .filter(|s| s.occupied)
            .map(|s| s.key)
    }

    /// Empties the set in place, keeping its allocation and mode.
    pub fn clear(&mut self) {
        self.slots.fill(Slot::default());
        self.len = 0;
    }

    /// `(slot index, raw key)` for every occupied slot, in slot order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.occupied)
            .map(|(i, s)| (i, s.key))
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.iter_slots().map(|(_, key)| key)
    }
}

fn unallocatable(capacity: usize) -> ExplainError {
    ExplainError::InvalidConfig(format!("set capacity {} cannot be allocated", capacity))
}
