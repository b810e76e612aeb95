//! Error types for goalsim.
//!
//! All fallible operations return `Result<T, SimError>` instead of
//! panicking. Variants fall into two classes: configuration errors the
//! caller may recover from (skip the task, re-prompt the user) and
//! internal-invariant violations that abort the current simulation or
//! batch. `SimError::is_fatal` distinguishes them.

use thiserror::Error;

/// Result type alias for goalsim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all goalsim operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Configuration Errors (recoverable) =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A task requests INSIDE/NOT_INSIDE but carries no phantom shape.
    #[error("A phantom shape is required to evaluate INSIDE and NOT_INSIDE relationships")]
    MissingPhantomShape,

    /// A flattened point list has an odd number of coordinates.
    #[error("Flattened point list must have an even length, got {len}")]
    OddPointList {
        /// Observed list length.
        len: usize,
    },

    /// A task file name does not match the `task%05d:000.bin` template.
    #[error("Malformed task file name: {name}")]
    TaskFileName {
        /// The offending file name.
        name: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Internal Invariant Violations (fatal) =====
    /// A physics body has no entry in the tag table.
    #[error("Found a physics body without a tag")]
    UntaggedBody,

    /// A task body id is not present in the world.
    #[error("Task body id {body_id} not present in the scene")]
    TaskBodyMissing {
        /// The missing body id.
        body_id: usize,
    },

    /// A body tag points at a scene slot that does not exist.
    #[error("Body tag mismatch: object id {object_id} has no matching scene slot")]
    TagMismatch {
        /// The object id carried by the tag.
        object_id: usize,
    },

    /// Numerical instability detected (NaN or Inf) after a physics step.
    #[error("Non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// A serialized scene's size drifted from the precomputed record size.
    #[error("Serialized scene size {actual} differs from precomputed record size {expected}")]
    RecordSizeMismatch {
        /// Size computed before the batch started.
        expected: usize,
        /// Size observed mid-run.
        actual: usize,
    },

    /// A record segment cannot hold the requested number of samples.
    #[error("Record segment overflow: sample {sample} exceeds capacity {capacity}")]
    RecordOverflow {
        /// Index of the sample that did not fit.
        sample: usize,
        /// Segment capacity in samples.
        capacity: usize,
    },

    /// A batch worker thread terminated abnormally.
    #[error("Batch worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the failed worker.
        worker: usize,
    },

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a non-finite-value error at the given location.
    #[must_use]
    pub fn non_finite(location: impl Into<String>) -> Self {
        Self::NonFiniteValue {
            location: location.into(),
        }
    }

    /// Check if this error is an internal-invariant violation.
    ///
    /// Fatal errors indicate a broken precondition rather than bad input;
    /// they abort the current simulation or batch and are never retried.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UntaggedBody
                | Self::TaskBodyMissing { .. }
                | Self::TagMismatch { .. }
                | Self::NonFiniteValue { .. }
                | Self::RecordSizeMismatch { .. }
                | Self::RecordOverflow { .. }
                | Self::WorkerPanicked { .. }
        )
    }
}
