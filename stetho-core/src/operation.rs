//! Operations — named callables with identity metadata.
//!
//! An [`Operation`] is a cloneable handle to a callable plus the
//! identity metadata that must survive wrapping: the declared name, the
//! qualified name (`Type.name`), the origin, and an optional marker
//! naming the instrumentor whose layer produced it. Wrapping replaces
//! the callable; the metadata is always copied from the operation being
//! wrapped, so diagnostics show the true name at any wrap depth.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::OperationError;
use crate::id::InstrumentorId;

/// Named arguments for an operation call.
///
/// Operations take a bag of named JSON values and return a JSON value.
/// This preserves "same arguments in, same value or same failure out"
/// across wrapping without the engine knowing any operation's shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Call {
    args: serde_json::Map<String, Value>,
}

impl Call {
    /// Create an empty call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named argument (builder style).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Look up a named argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Look up a named argument, failing with
    /// [`OperationError::MissingArgument`] if absent.
    pub fn require(&self, name: &str) -> Result<&Value, OperationError> {
        self.args
            .get(name)
            .ok_or_else(|| OperationError::MissingArgument(name.to_owned()))
    }

    /// Number of named arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether the call carries no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Where an operation came from, relative to the owner it was resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Declared directly on the owner.
    Declared,
    /// Inherited from an ancestor type descriptor.
    Inherited,
    /// A computed property. Properties cannot be shadowed per-instance,
    /// so they are wrappable at type granularity only.
    Property,
}

/// The callable half of an operation.
pub type OperationFn = dyn Fn(&Call) -> Result<Value, OperationError> + Send + Sync;

/// A named callable attribute of an owner.
///
/// Cloning an `Operation` clones the handle, not the behavior — all
/// clones invoke the same underlying callable.
#[derive(Clone)]
pub struct Operation {
    name: String,
    qualname: String,
    origin: Origin,
    instrumented_by: Option<InstrumentorId>,
    func: Arc<OperationFn>,
}

impl Operation {
    /// Create an operation declared directly on its owner.
    ///
    /// `qualname` is the owning type's name joined with the operation
    /// name, e.g. `StandardScaler.fit`.
    pub fn new<F>(name: impl Into<String>, qualname: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Call) -> Result<Value, OperationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            qualname: qualname.into(),
            origin: Origin::Declared,
            instrumented_by: None,
            func: Arc::new(func),
        }
    }

    /// Create a property operation: the callable is the underlying
    /// getter, and the property marker is preserved across wrapping.
    pub fn property<F>(name: impl Into<String>, qualname: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Call) -> Result<Value, OperationError> + Send + Sync + 'static,
    {
        Self {
            origin: Origin::Property,
            ..Self::new(name, qualname, func)
        }
    }

    /// Invoke the operation.
    pub fn invoke(&self, call: &Call) -> Result<Value, OperationError> {
        (self.func)(call)
    }

    /// The declared operation name, e.g. `fit`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The qualified name, e.g. `StandardScaler.fit`. Copied from the
    /// innermost original across every wrap layer.
    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    /// Where this operation came from.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The instrumentor whose layer produced this operation, if any.
    /// `None` means this is an unwrapped original (or an interceptor
    /// forgot to go through composition, which the engine never does).
    pub fn instrumented_by(&self) -> Option<&InstrumentorId> {
        self.instrumented_by.as_ref()
    }

    /// Build a new operation with this one's identity metadata and a
    /// different callable. This is how interceptors produce replacement
    /// operations: `op.derived(move |call| ...)`.
    pub fn derived<F>(&self, func: F) -> Self
    where
        F: Fn(&Call) -> Result<Value, OperationError> + Send + Sync + 'static,
    {
        Self {
            name: self.name.clone(),
            qualname: self.qualname.clone(),
            origin: self.origin,
            instrumented_by: None,
            func: Arc::new(func),
        }
    }

    /// Copy identity metadata from `inner` onto this operation.
    /// Composition applies this to every layer so that name, qualified
    /// name, and origin always reflect the innermost original.
    #[must_use]
    pub fn with_identity_of(mut self, inner: &Operation) -> Self {
        self.name = inner.name.clone();
        self.qualname = inner.qualname.clone();
        self.origin = inner.origin;
        self
    }

    /// Mark this operation as produced by the given instrumentor.
    #[must_use]
    pub fn marked(mut self, id: InstrumentorId) -> Self {
        self.instrumented_by = Some(id);
        self
    }

    /// Re-tag the origin as inherited. Used by descriptor-chain
    /// resolution when an operation is found on an ancestor.
    #[must_use]
    pub(crate) fn as_inherited(mut self) -> Self {
        if self.origin == Origin::Declared {
            self.origin = Origin::Inherited;
        }
        self
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("qualname", &self.qualname)
            .field("origin", &self.origin)
            .field("instrumented_by", &self.instrumented_by)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_builder_and_lookup() {
        let call = Call::new().with("X", json!([1, 2, 3]));
        assert_eq!(call.get("X"), Some(&json!([1, 2, 3])));
        assert!(call.get("y").is_none());
        assert!(matches!(
            call.require("y"),
            Err(OperationError::MissingArgument(name)) if name == "y"
        ));
    }

    #[test]
    fn derived_copies_identity() {
        let op = Operation::new("fit", "Scaler.fit", |_| Ok(json!(null)));
        let derived = op.derived(|_| Ok(json!(1)));
        assert_eq!(derived.name(), "fit");
        assert_eq!(derived.qualname(), "Scaler.fit");
        assert_eq!(derived.origin(), Origin::Declared);
        assert!(derived.instrumented_by().is_none());
        assert_eq!(derived.invoke(&Call::new()).unwrap(), json!(1));
    }

    #[test]
    fn marked_sets_instrumentor() {
        let op = Operation::new("fit", "Scaler.fit", |_| Ok(json!(null)));
        let marked = op.marked(InstrumentorId::new("timer"));
        assert_eq!(marked.instrumented_by().unwrap().as_str(), "timer");
    }

    #[test]
    fn property_origin_survives_derivation() {
        let prop = Operation::property("coef", "Model.coef", |_| Ok(json!([0.5])));
        let derived = prop.derived(|_| Ok(json!([0.5])));
        assert_eq!(derived.origin(), Origin::Property);
    }
}
