//! Error types for the object model.

/// Errors raised while reading or writing through the object model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// A property getter failed.
    #[error("cannot read property '{property}' of {target_type}: {reason}")]
    PropertyRead {
        property: String,
        target_type: String,
        reason: String,
    },

    /// A property setter failed, or the property is read-only.
    #[error("cannot write property '{property}' of {target_type}: {reason}")]
    PropertyWrite {
        property: String,
        target_type: String,
        reason: String,
    },

    /// The operation does not apply to the target value.
    #[error("cannot {operation} on {target_type}")]
    Unsupported {
        operation: String,
        target_type: String,
    },
}

impl AccessError {
    /// Name of the property involved, if any.
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::PropertyRead { property, .. } | Self::PropertyWrite { property, .. } => {
                Some(property)
            }
            Self::Unsupported { .. } => None,
        }
    }
}

/// Convenience alias for object model results.
pub type AccessResult<T> = Result<T, AccessError>;
