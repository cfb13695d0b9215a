/// Per-slot support counters laid out parallel to a level's candidate set.
///
/// Workers each own one and are merged by addition, so chunk order does not
/// matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCounters {
    support: Vec<u64>,
    outlier_support: Vec<u64>,
}

impl LevelCounters {
    pub fn new(capacity: usize) -> Self {
        Self {
            support: vec![0; capacity],
            outlier_support: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.support.len()
    }

    #[inline]
    pub fn record(&mut self, slot: usize, is_outlier: bool) {
        self.support[slot] += 1;
        self.outlier_support[slot] += u64::from(is_outlier);
    }

    /// `(support, outlier_support)` for `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> (u64, u64) {
        (self.support[slot], self.outlier_support[slot])
    }

    pub fn merge(mut self, other: &LevelCounters) -> Self {
        debug_assert_eq!(self.capacity(), other.capacity());
        for (a, b) in self.support.iter_mut().zip(&other.support) {
            *a += b;
        }
        for (a, b) in self.outlier_support.iter_mut().zip(&other.outlier_support) {
            *a += b;
        }
        self
    }
}
