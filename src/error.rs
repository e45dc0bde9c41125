/// Errors raised while collapsing or intersecting SNP tables.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GraspError {
    #[error("Invalid mechanism: {0} (expected one of median, mean, min)")]
    InvalidMechanism(String),

    #[error("Malformed observation at index {index}: {reason}")]
    MalformedObservation { index: usize, reason: String },

    #[error("Invalid p-value threshold: {0}")]
    InvalidThreshold(f64),
}

pub type Result<T> = std::result::Result<T, GraspError>;
