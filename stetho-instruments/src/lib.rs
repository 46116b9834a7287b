#![deny(missing_docs)]
//! Ready-made interceptors for stetho — timing, shape logging, call counting.
//!
//! Provides four [`Interceptor`] implementations:
//! - [`TimeElapsed`]: logs wall-clock duration per call
//! - [`ShapeLogger`]: logs the lengths of array-shaped arguments and results
//! - [`CallCounter`]: counts invocations per qualified name
//! - [`Identity`]: wraps without changing behavior, for overhead baselines
//!
//! All of them observe only: arguments pass through untouched, results
//! and errors come back exactly as the wrapped operation produced them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, info};

use stetho_core::{Call, Config, Interceptor, InterceptorError, Operation, Target};

/// An interceptor that logs the wall-clock duration of every call.
///
/// Logs at `info` level by default. A `threshold_ms` config value
/// raises the bar: calls faster than the threshold are logged at
/// `debug` instead, which keeps routine traffic out of the way when
/// only slow calls matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeElapsed;

impl TimeElapsed {
    /// Create the timing interceptor.
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for TimeElapsed {
    fn wrap(
        &self,
        _target: &Target,
        op: &Operation,
        config: &Config,
    ) -> Result<Operation, InterceptorError> {
        let threshold_ms = match config.get("threshold_ms") {
            None => 0,
            Some(v) => v.as_u64().ok_or_else(|| {
                InterceptorError::InvalidConfig("threshold_ms must be a non-negative integer".into())
            })?,
        };
        let inner = op.clone();
        Ok(op.derived(move |call| {
            let start = Instant::now();
            let result = inner.invoke(call);
            let elapsed = start.elapsed();
            if elapsed.as_millis() as u64 >= threshold_ms {
                info!(
                    operation = %inner.qualname(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "call finished"
                );
            } else {
                debug!(
                    operation = %inner.qualname(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "call finished"
                );
            }
            result
        }))
    }
}

/// An interceptor that logs the lengths of array-shaped arguments and
/// results.
///
/// Non-array values are reported as `scalar`. Errors pass through
/// unlogged — the operation's own error is the record of what happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeLogger;

impl ShapeLogger {
    /// Create the shape logger.
    pub fn new() -> Self {
        Self
    }
}

fn shape_of(value: &serde_json::Value) -> String {
    match value.as_array() {
        Some(items) => format!("[{}]", items.len()),
        None => "scalar".to_owned(),
    }
}

fn shapes_of(call: &Call) -> String {
    let mut parts: Vec<String> = Vec::new();
    for name in ["X", "y"] {
        if let Some(value) = call.get(name) {
            parts.push(format!("{name}={}", shape_of(value)));
        }
    }
    if parts.is_empty() {
        "no array arguments".to_owned()
    } else {
        parts.join(", ")
    }
}

impl Interceptor for ShapeLogger {
    fn wrap(
        &self,
        _target: &Target,
        op: &Operation,
        _config: &Config,
    ) -> Result<Operation, InterceptorError> {
        let inner = op.clone();
        Ok(op.derived(move |call| {
            info!(
                operation = %inner.qualname(),
                shapes = %shapes_of(call),
                "call starting"
            );
            let result = inner.invoke(call)?;
            info!(
                operation = %inner.qualname(),
                result = %shape_of(&result),
                "call finished"
            );
            Ok(result)
        }))
    }
}

/// An interceptor that counts invocations per qualified name.
///
/// Clones share one tally, so the same counter can be handed to an
/// instrumentor and read from the test or the process's metrics
/// surface afterwards.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl CallCounter {
    /// Create a counter with all counts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations recorded for a qualified name.
    pub fn count(&self, qualname: &str) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(qualname)
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot of all counts, sorted by qualified name.
    pub fn counts(&self) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.sort();
        out
    }

    /// Reset every count to zero.
    pub fn reset(&self) {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Interceptor for CallCounter {
    fn wrap(
        &self,
        _target: &Target,
        op: &Operation,
        _config: &Config,
    ) -> Result<Operation, InterceptorError> {
        let counts = Arc::clone(&self.counts);
        let inner = op.clone();
        Ok(op.derived(move |call| {
            *counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(inner.qualname().to_owned())
                .or_insert(0) += 1;
            inner.invoke(call)
        }))
    }
}

/// An interceptor that changes nothing.
///
/// Useful as an overhead baseline and for exercising attach/detach
/// machinery without observable side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Identity {
    /// Create the identity interceptor.
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for Identity {
    fn wrap(
        &self,
        _target: &Target,
        op: &Operation,
        _config: &Config,
    ) -> Result<Operation, InterceptorError> {
        let inner = op.clone();
        Ok(op.derived(move |call| inner.invoke(call)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stetho_core::test_utils::{ModelTypes, StandardScaler};
    use stetho_core::Estimator;

    fn scaler_fit() -> (std::sync::Arc<dyn Estimator>, Target, Operation) {
        let types = ModelTypes::new();
        let est = StandardScaler::new(&types) as std::sync::Arc<dyn Estimator>;
        let op = est.operation("fit").unwrap();
        let target = Target::Instance(std::sync::Arc::clone(&est));
        (est, target, op)
    }

    fn fit_call() -> Call {
        Call::new().with("X", json!([1.0, 2.0, 3.0]))
    }

    #[test]
    fn time_elapsed_preserves_result_and_identity() {
        let (_est, target, op) = scaler_fit();
        let wrapped = TimeElapsed::new()
            .wrap(&target, &op, &Config::new())
            .unwrap();
        assert_eq!(wrapped.qualname(), "StandardScaler.fit");
        assert_eq!(wrapped.invoke(&fit_call()).unwrap(), json!(null));
    }

    #[test]
    fn time_elapsed_rejects_bad_threshold() {
        let (_est, target, op) = scaler_fit();
        let config = Config::new().with("threshold_ms", json!("fast"));
        let err = TimeElapsed::new().wrap(&target, &op, &config).unwrap_err();
        assert!(matches!(err, InterceptorError::InvalidConfig(_)));
    }

    #[test]
    fn shape_logger_passes_errors_through() {
        let (_est, target, _op) = scaler_fit();
        let failing = Operation::new("fit", "Broken.fit", |_| {
            Err(stetho_core::OperationError::Failed("boom".into()))
        });
        let wrapped = ShapeLogger::new()
            .wrap(&target, &failing, &Config::new())
            .unwrap();
        assert!(wrapped.invoke(&fit_call()).is_err());
    }

    #[test]
    fn call_counter_tallies_per_qualname() {
        let (_est, target, op) = scaler_fit();
        let counter = CallCounter::new();
        let wrapped = counter.wrap(&target, &op, &Config::new()).unwrap();
        wrapped.invoke(&fit_call()).unwrap();
        wrapped.invoke(&fit_call()).unwrap();
        assert_eq!(counter.count("StandardScaler.fit"), 2);
        assert_eq!(counter.counts(), vec![("StandardScaler.fit".to_owned(), 2)]);
        counter.reset();
        assert_eq!(counter.count("StandardScaler.fit"), 0);
    }

    #[test]
    fn identity_is_transparent() {
        let (_est, target, op) = scaler_fit();
        let wrapped = Identity::new().wrap(&target, &op, &Config::new()).unwrap();
        assert_eq!(wrapped.invoke(&fit_call()).unwrap(), json!(null));
        assert_eq!(wrapped.name(), "fit");
    }
}
