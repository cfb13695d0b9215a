use serde::{Deserialize, Serialize};

use crate::error::{ExplainError, Result};

/// Identifier of one distinct (column, value) pair.
pub type AttributeValueId = u32;

/// An unordered set of attribute value ids packed into one 64-bit word.
///
/// Elements are sorted ascending and slot `i` holds `sorted[i] + 1`, so an
/// all-zero slot marks the end of the set. Because the packing is canonical,
/// equality and hashing work directly on the bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntKey(u64);

impl IntKey {
    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }
}

/// Packing layout: `max_order` slots of `bits_per_slot` bits each.
///
/// The layout belongs to a search, not to a key: the same bit pattern means
/// different sets under different layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout {
    bits_per_slot: u32,
    max_order: usize,
    slot_mask: u64,
}

impl KeyLayout {
    pub fn new(bits_per_slot: u32, max_order: usize) -> Result<Self> {
        if bits_per_slot == 0 || max_order == 0 {
            return Err(ExplainError::InvalidConfig(
                "key layout needs at least one slot of at least one bit".to_string(),
            ));
        }
        let fits = (bits_per_slot as usize)
            .checked_mul(max_order)
            .is_some_and(|bits| bits <= 64);
        if !fits {
            return Err(ExplainError::InvalidConfig(format!(
                "{} slots of {} bits do not fit in 64 bits",
                max_order, bits_per_slot
            )));
        }
        let slot_mask = if bits_per_slot == 64 {
            u64::MAX
        } else {
            (1u64 << bits_per_slot) - 1
        };
        Ok(Self {
            bits_per_slot,
            max_order,
            slot_mask,
        })
    }

    pub fn bits_per_slot(&self) -> u32 {
        self.bits_per_slot
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Largest id a slot can hold (one value is reserved for "empty").
    pub fn max_element(&self) -> u64 {
        self.slot_mask - 1
    }

    #[inline]
    fn check_element(&self, element: AttributeValueId) -> Result<u64> {
        let element = u64::from(element);
        if element > self.max_element() {
            return Err(ExplainError::EncodingOverflow {
                element,
                max_element: self.max_element(),
            });
        }
        Ok(element + 1)
    }

    #[inline]
    fn shift(&self, slot: usize) -> u32 {
        self.bits_per_slot * slot as u32
    }

    /// Encodes a set given in any order. Duplicates collapse.
    pub fn encode(&self, elements: &[AttributeValueId]) -> Result<IntKey> {
        let mut sorted = elements.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        self.encode_sorted(&sorted)
    }

    /// Encodes elements already sorted ascending without duplicates.
    ///
    /// This is the hot-path entry used while counting rows, whose ids are
    /// stored sorted.
    #[inline]
    pub fn encode_sorted(&self, sorted: &[AttributeValueId]) -> Result<IntKey> {
        debug_assert!(sorted.windows(2).all(|w| w[0] < w[1]));
        if sorted.len() > self.max_order {
            return Err(ExplainError::OrderOverflow {
                order: sorted.len(),
                max_order: self.max_order,
            });
        }
        let mut bits = 0u64;
        for (slot, &element) in sorted.iter().enumerate() {
            bits |= self.check_element(element)? << self.shift(slot);
        }
        Ok(IntKey(bits))
    }

    pub fn singleton(&self, element: AttributeValueId) -> Result<IntKey> {
        self.encode_sorted(&[element])
    }

    /// Elements of `key` in ascending order.
    pub fn elements(&self, key: IntKey) -> impl Iterator<Item = AttributeValueId> + '_ {
        (0..self.max_order)
            .map(move |slot| (key.0 >> self.shift(slot)) & self.slot_mask)
            .take_while(|&raw| raw != 0)
            .map(|raw| (raw - 1) as AttributeValueId)
    }

    pub fn decode(&self, key: IntKey) -> Vec<AttributeValueId> {
        self.elements(key).collect()
    }

    pub fn order(&self, key: IntKey) -> usize {
        self.elements(key).count()
    }

    /// Union of two keys, failing if the result exceeds `max_order`.
    pub fn union(&self, a: IntKey, b: IntKey) -> Result<IntKey> {
        let mut merged: Vec<AttributeValueId> = Vec::with_capacity(self.max_order * 2);
        let mut left = self.elements(a).peekable();
        let mut right = self.elements(b).peekable();
        loop {
            match (left.peek().copied(), right.peek().copied()) {
                (Some(l), Some(r)) if l == r => {
                    merged.push(l);
                    left.next();
                    right.next();
                }
                (Some(l), Some(r)) if l < r => {
                    merged.push(l);
                    left.next();
                }
                (Some(_), Some(r)) => {
                    merged.push(r);
                    right.next();
                }
                (Some(l), None) => {
                    merged.push(l);
                    left.next();
                }
                (None, Some(r)) => {
                    merged.push(r);
                    right.next();
                }
                (None, None) => break,
            }
        }
        self.encode_sorted(&merged)
    }

    /// Every subset of `key` with exactly one element removed.
    pub fn subsets_without_one(&self, key: IntKey) -> Vec<IntKey> {
        let elements = self.decode(key);
        let mut subsets = Vec::with_capacity(elements.len());
        let mut scratch = Vec::with_capacity(elements.len());
        for skip in 0..elements.len() {
            scratch.clear();
            scratch.extend(
                elements
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != skip)
                    .map(|(_, &e)| e),
            );
            // a subset of an encodable key is always encodable
            subsets.push(self.pack_sorted(&scratch));
        }
        subsets
    }

    /// Packs ids known to fit the layout, skipping the bounds checks of
    /// [`KeyLayout::encode_sorted`].
    #[inline]
    pub(crate) fn pack_sorted(&self, sorted: &[AttributeValueId]) -> IntKey {
        debug_assert!(sorted.len() <= self.max_order);
        debug_assert!(sorted.iter().all(|&e| u64::from(e) <= self.max_element()));
        let mut bits = 0u64;
        for (slot, &element) in sorted.iter().enumerate() {
            bits |= (u64::from(element) + 1) << self.shift(slot);
        }
        IntKey(bits)
    }

    /// Number of elements shared by `a` and `b`.
    pub fn intersection_len(&self, a: IntKey, b: IntKey) -> usize {
        let mut right = self.elements(b).peekable();
        let mut shared = 0;
        for element in self.elements(a) {
            while let Some(&r) = right.peek() {
                if r < element {
                    right.next();
                } else {
                    break;
                }
            }
            if right.peek() == Some(&element) {
                shared += 1;
                right.next();
            }
        }
        shared
    }
}

impl Default for KeyLayout {
    /// Three 21-bit slots, enough for two million distinct attribute values.
    fn default() -> Self {
        Self {
            bits_per_slot: 21,
            max_order: 3,
            slot_mask: (1u64 << 21) - 1,
        }
    }
}
