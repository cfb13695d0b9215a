use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplainError {
    #[error("attribute value id {element} does not fit the key layout (max {max_element})")]
    EncodingOverflow { element: u64, max_element: u64 },
    #[error("itemset of order {order} exceeds the key layout's maximum order {max_order}")]
    OrderOverflow { order: usize, max_order: usize },
    #[error("fixed-capacity set is full ({capacity} slots)")]
    CapacityExceeded { capacity: usize },
    #[error("memory budget exceeded: requested {requested} bytes, {available} available")]
    MemoryBudgetExceeded { requested: usize, available: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot {operation} in phase {phase}")]
    InvalidPhase { operation: &'static str, phase: String },
}

pub type Result<T> = std::result::Result<T, ExplainError>;
