//! Identity types for instrumentors and owners.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::descriptor::TypeDescriptor;
use crate::estimator::Estimator;

/// Identifies one instrumentor across attach/detach calls.
///
/// Layers in a binding table are tagged with the id of the instrumentor
/// that installed them, so detaching strips exactly that instrumentor's
/// layers and nothing else. Just a string underneath — no format
/// requirement.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct InstrumentorId(pub String);

impl InstrumentorId {
    /// Create an id from anything that converts to String.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique id of the form `instrumentor-N`.
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(format!("instrumentor-{n}"))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstrumentorId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for InstrumentorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stable identity key for an owner encountered during traversal.
///
/// Owners are held behind `Arc`, so the allocation address is a stable
/// key for as long as the owner is alive — which is as long as any
/// traversal or binding referencing it can observe it. Used for the
/// visited set that guards against revisiting shared sub-objects.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Identity of an estimator instance.
    pub fn of_instance(estimator: &Arc<dyn Estimator>) -> Self {
        Self(Arc::as_ptr(estimator) as *const () as usize)
    }

    /// Identity of a type descriptor.
    pub fn of_type(descriptor: &Arc<TypeDescriptor>) -> Self {
        Self(Arc::as_ptr(descriptor) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = InstrumentorId::generate();
        let b = InstrumentorId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn display_matches_inner() {
        let id = InstrumentorId::new("timer");
        assert_eq!(id.to_string(), "timer");
        assert_eq!(id.as_str(), "timer");
    }
}
