//! Error taxonomy for resources and executables.

/// Result type for workpool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, binding or executing work.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A resource or executable was constructed with an empty name
    #[error("name cannot be empty")]
    InvalidName,

    /// An executable was constructed with a non-positive duration
    #[error("duration for '{name}' must be positive, got {duration}")]
    InvalidDuration {
        /// Executable name
        name: String,
        /// Rejected duration
        duration: i64,
    },

    /// A resource was constructed with a non-positive capacity
    #[error("capacity for resource '{name}' must be positive")]
    InvalidCapacity {
        /// Resource name
        name: String,
    },

    /// No free instance with this name could be found or locked
    #[error("resource '{0}' not found or not available")]
    ResourceUnavailable(String),

    /// A consumable resource has no remaining capacity
    #[error("resource '{0}' has no remaining capacity")]
    ResourceExhausted(String),

    /// Bound resources do not match the declared requirements
    #[error("resources not properly assigned for '{executable}': required {required}, bound {bound}")]
    BindingMismatch {
        /// Executable name
        executable: String,
        /// Number of required resource names
        required: usize,
        /// Number of bound resources
        bound: usize,
    },

    /// A handle does not resolve to a resource in the pool
    #[error("resource handle #{0} does not belong to this pool")]
    StaleHandle(usize),
}

impl Error {
    /// Whether the caller may retry once the pool state changes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ResourceUnavailable(_) | Error::ResourceExhausted(_)
        )
    }

    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::InvalidName => "invalid_name",
            Error::InvalidDuration { .. } => "invalid_duration",
            Error::InvalidCapacity { .. } => "invalid_capacity",
            Error::ResourceUnavailable(_) => "resource_unavailable",
            Error::ResourceExhausted(_) => "resource_exhausted",
            Error::BindingMismatch { .. } => "binding_mismatch",
            Error::StaleHandle(_) => "stale_handle",
        }
    }
}
