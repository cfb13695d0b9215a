//! Explains an outlier population by the attribute value combinations most
//! disproportionately associated with it.
//!
//! Rows are sets of attribute value ids plus an outlier flag. The search
//! counts itemsets level by level, keeping each level's candidates in a
//! fixed-capacity hash set keyed by a packed 64-bit encoding of the itemset.

pub mod apriori;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use apriori::{
    explain, EncodedRows, Explanation, FixedCapacityIntSet, IntKey, KeyLayout, KeyMode,
    LevelSearch, SearchConfig, Summary,
};
pub use error::{ExplainError, Result};
