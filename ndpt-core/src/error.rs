use thiserror::Error;

/// Failures while building or rebuilding an energy correction.
///
/// None of these are retried: a failure for a single composition aborts the
/// whole order, since the accumulated coefficients would otherwise be wrong.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NdptError {
    #[error("perturbation order must be at least 2 (got {0})")]
    InvalidOrder(u32),
    #[error("composition needs at least two positions to merge its boundaries (got {len})")]
    CompositionTooShort { len: usize },
    #[error("boundary merge overflows: {first} + {last}")]
    BoundaryOverflow { first: u32, last: u32 },
    #[error("V_00 exponent {surplus} does not fit in u32")]
    ExponentOverflow { surplus: usize },
    #[error("no nonzero-to-zero rotation boundary in cyclic sequence {sequence:?}")]
    NoRotationBoundary { sequence: Vec<u32> },
    #[error("sigma factor needs at least one index")]
    EmptySigma,
    #[error("sigma factor indices must be positive: {indices:?}")]
    ZeroSigmaIndex { indices: Vec<u32> },
}

pub type Result<T> = std::result::Result<T, NdptError>;
