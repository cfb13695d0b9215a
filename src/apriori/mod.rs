pub mod combinations;
pub mod config;
pub mod counters;
pub mod fixed_set;
pub mod generate;
pub mod key;
pub mod memory;
pub mod metric;
pub mod rows;
pub mod search;
pub mod storage;


pub use config::{
    CapacityPolicy, Parallelism, PruneStrategy, RatioMetric, SearchConfig, SelectionPolicy,
    SupportThreshold,
};
pub use counters::LevelCounters;
pub use fixed_set::{FixedCapacityIntSet, KeyMode, SetKey};
pub use generate::{generate_next, initial_candidates};
pub use key::{AttributeValueId, IntKey, KeyLayout};
pub use rows::{EncodedRows, EncodedRowsBuilder};
pub use search::{classify, count_level, explain, LevelReport, LevelSearch, SearchPhase, Summary};
pub use storage::{Explanation, ExplanationLevel};
