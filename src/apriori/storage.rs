use serde::{Deserialize, Serialize};

use super::key::AttributeValueId;

/// One emitted attribute value combination with its counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub items: Vec<AttributeValueId>,
    pub support: u64,
    pub outlier_support: u64,
    pub ratio: f64,
}

impl Explanation {
    pub fn order(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Clone, Default)]
struct ItemsetStorage {
    items: Vec<AttributeValueId>,
    offsets: Vec<(usize, usize)>,
    supports: Vec<(u64, u64)>,
    ratios: Vec<f64>,
}

/// Flat storage of the itemsets of one order emitted by a level.
#[derive(Debug, Clone)]
pub struct ExplanationLevel {
    storage: ItemsetStorage,
    pub itemset_size: usize,
}

impl ExplanationLevel {
    pub fn new(itemset_size: usize) -> Self {
        Self {
            storage: ItemsetStorage::default(),
            itemset_size,
        }
    }

    pub fn add_itemset(
        &mut self,
        items: &[AttributeValueId],
        support: u64,
        outlier_support: u64,
        ratio: f64,
    ) -> usize {
        debug_assert_eq!(items.len(), self.itemset_size);
        let storage = &mut self.storage;
        let start = storage.items.len();
        storage.items.extend_from_slice(items);
        storage.offsets.push((start, items.len()));
        storage.supports.push((support, outlier_support));
        storage.ratios.push(ratio);
        storage.offsets.len() - 1
    }

    pub fn len(&self) -> usize {
        self.storage.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.offsets.is_empty()
    }

    pub fn get_itemset(&self, idx: usize) -> &[AttributeValueId] {
        let (start, len) = self.storage.offsets[idx];
        &self.storage.items[start..start + len]
    }

    pub fn get(&self, idx: usize) -> Explanation {
        let (support, outlier_support) = self.storage.supports[idx];
        Explanation {
            items: self.get_itemset(idx).to_vec(),
            support,
            outlier_support,
            ratio: self.storage.ratios[idx],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Explanation> + '_ {
        (0..self.len()).map(move |idx| self.get(idx))
    }
}
