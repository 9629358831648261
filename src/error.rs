use thiserror::Error;

/// The error type for profile parsing and derivation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{column} index {index} is out of range for the {table} table of length {len}")]
    IndexOutOfRange {
        table: &'static str,
        column: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Column {column} of the {table} table has length {actual}, expected {expected}")]
    ColumnLengthMismatch {
        table: &'static str,
        column: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("Stack table row {0} has a prefix {1} which does not precede it")]
    StackPrefixOrder(usize, usize),

    #[error("The profile has no thread with index {0}")]
    InvalidThreadIndex(usize),

    #[error("Retained allocations require a balanced native allocations table")]
    UnbalancedAllocations,

    #[error("Cannot merge an empty list of profiles")]
    NothingToMerge,

    #[error("Could not parse query command {0:?}")]
    InvalidQuery(String),
}
