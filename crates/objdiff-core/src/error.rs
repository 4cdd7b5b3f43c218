//! Error types for the diff engine.

use objdiff_model::AccessError;

/// Errors that can occur during a comparison.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A precondition was violated by the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading or writing a property failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The primitive differ was handed a non-primitive type.
    #[error("the primitive differ can only deal with primitive types, got {0}")]
    NotPrimitive(String),

    /// The circular reference stacks were not unwound in LIFO order.
    #[error("inconsistent enter/leave sequence at {path}: must always be LIFO")]
    StackInconsistency { path: String },

    /// An equals-only value provider could not be invoked.
    #[error("value provider '{method}' is not available on {type_name}")]
    ValueProvider { method: String, type_name: String },

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization of a result failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
