//! The Interceptor interface — the one capability the engine requires
//! from an instrumentation payload.
//!
//! Timing, logging, metrics-emission, and profiling payloads are all
//! interchangeable implementations of [`Interceptor::wrap`]: given an
//! owner, an operation, and arbitrary configuration, produce a
//! replacement operation with identical calling convention. The
//! stateless functional form is [`interceptor_fn`]; stateful payloads
//! implement the trait on a constructed type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InterceptorError;
use crate::operation::Operation;
use crate::target::Target;

/// Configuration forwarded verbatim to an interceptor at attach time.
///
/// A bag of named JSON values, distinct per attach call. Interceptors
/// read the keys they understand and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    params: serde_json::Map<String, Value>,
}

impl Config {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Whether the config carries no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A payload that wraps operations with additional behavior.
///
/// The replacement operation must accept the same arguments, return the
/// same value, and re-raise the same failures as the one it wraps —
/// behavior is added strictly around the call. Implementations that
/// keep state across invocations are responsible for their own
/// concurrent-use safety; the engine adds no locking around invocation.
///
/// Errors from `wrap` indicate a caller configuration bug and are
/// propagated out of attach uncaught.
pub trait Interceptor: Send + Sync {
    /// Produce a replacement for `op` on `target`.
    ///
    /// `op` may itself already be a composed operation from a prior
    /// layer; implementations should capture a clone and delegate to
    /// [`Operation::invoke`]. Identity metadata and the instrumentor
    /// marker are applied by the engine afterwards, so a plain
    /// `op.derived(...)` is all an implementation needs.
    fn wrap(
        &self,
        target: &Target,
        op: &Operation,
        config: &Config,
    ) -> Result<Operation, InterceptorError>;
}

/// Wrapper that implements [`Interceptor`] for a closure.
struct InterceptorFn<F> {
    f: F,
}

impl<F> Interceptor for InterceptorFn<F>
where
    F: Fn(&Target, &Operation, &Config) -> Result<Operation, InterceptorError> + Send + Sync,
{
    fn wrap(
        &self,
        target: &Target,
        op: &Operation,
        config: &Config,
    ) -> Result<Operation, InterceptorError> {
        (self.f)(target, op, config)
    }
}

/// Create an interceptor from a closure — the stateless functional
/// form of the payload contract.
///
/// # Example
///
/// ```
/// use stetho_core::interceptor_fn;
///
/// let announcer = interceptor_fn(|_target, op, _config| {
///     let inner = op.clone();
///     Ok(op.derived(move |call| {
///         println!("calling {}", inner.qualname());
///         inner.invoke(call)
///     }))
/// });
/// ```
#[must_use]
pub fn interceptor_fn<F>(f: F) -> impl Interceptor
where
    F: Fn(&Target, &Operation, &Config) -> Result<Operation, InterceptorError> + Send + Sync,
{
    InterceptorFn { f }
}
