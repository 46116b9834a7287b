//! Fixture interceptors — record, count, or fail on wrap.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::InterceptorError;
use crate::interceptor::{Config, Interceptor};
use crate::operation::Operation;
use crate::target::Target;

/// Records `enter`/`exit` events with qualified names, in invocation
/// order. Use [`events`](Self::events) to assert on call nesting.
#[derive(Clone, Default)]
pub struct RecordingInterceptor {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingInterceptor {
    /// Create a recorder with an empty event log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Interceptor for RecordingInterceptor {
    fn wrap(
        &self,
        _target: &Target,
        op: &Operation,
        _config: &Config,
    ) -> Result<Operation, InterceptorError> {
        let events = Arc::clone(&self.events);
        let inner = op.clone();
        Ok(op.derived(move |call| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("enter {}", inner.qualname()));
            let result = inner.invoke(call);
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("exit {}", inner.qualname()));
            result
        }))
    }
}

/// Counts invocations per qualified name.
#[derive(Clone, Default)]
pub struct CountingInterceptor {
    counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl CountingInterceptor {
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

    /// Total invocations recorded across all names.
    pub fn total(&self) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

impl Interceptor for CountingInterceptor {
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

/// Always fails to build a replacement operation — for asserting that
/// construction errors propagate out of attach uncaught.
#[derive(Clone, Copy, Default)]
pub struct FailingInterceptor;

impl FailingInterceptor {
    /// Create the failing interceptor.
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for FailingInterceptor {
    fn wrap(
        &self,
        _target: &Target,
        op: &Operation,
        _config: &Config,
    ) -> Result<Operation, InterceptorError> {
        Err(InterceptorError::Construction {
            operation: op.qualname().to_owned(),
            message: "fixture configured to fail".into(),
        })
    }
}
