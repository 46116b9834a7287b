//! Error types for each seam of the instrumentation protocol.

use thiserror::Error;

/// Discovery errors. These are per-candidate: the walker logs them and
/// skips the owner, they never abort a whole attach/detach call.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An owner's attributes could not be enumerated.
    #[error("attribute access failed on {owner}: {message}")]
    AttributeAccess {
        /// Type name of the owner whose attributes failed.
        owner: String,
        /// What went wrong.
        message: String,
    },

    /// A namespace name did not resolve against the configured root.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Interceptor construction errors. These indicate a caller
/// configuration bug and are propagated loudly — attach does not
/// swallow them.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum InterceptorError {
    /// The interceptor could not build a replacement operation.
    #[error("interceptor construction failed for {operation}: {message}")]
    Construction {
        /// Qualified name of the target operation.
        operation: String,
        /// What went wrong.
        message: String,
    },

    /// The supplied config was rejected.
    #[error("invalid interceptor config: {0}")]
    InvalidConfig(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by operations themselves when invoked. Wrapped
/// operations re-raise these unchanged — instrumentation never alters
/// failure behavior.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OperationError {
    /// A named argument the operation needs was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// The operation was invoked before a required prior step.
    /// Calling `transform` before `fit`, typically.
    #[error("not fitted: {0}")]
    NotFitted(String),

    /// The operation rejected its input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation failed.
    #[error("{0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
