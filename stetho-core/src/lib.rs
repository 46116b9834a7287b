//! # stetho-core — protocol traits for reversible model instrumentation
//!
//! This crate defines the seams between an instrumentation engine and
//! the model ecosystem it instruments. The engine (`stetho-engine`)
//! walks object graphs and namespaces built from these types; payload
//! crates implement [`Interceptor`] and never see anything else.
//!
//! ## The Seams
//!
//! | Seam | Types | What it does |
//! |------|-------|-------------|
//! | Owner | [`Estimator`], [`TypeDescriptor`], [`Target`] | What can be instrumented |
//! | Binding | [`BindingTable`], [`Operation`], [`Layer`] | How operations are rebound and layers tracked |
//! | Payload | [`Interceptor`], [`Config`] | How behavior is wrapped around a call |
//! | Registry | [`Namespace`] | Whole-library attachment without reflection |
//!
//! ## Design Principle
//!
//! Everything a reflective implementation would do implicitly —
//! attribute rebinding, class lookup, decorator stacking — is an
//! explicit data structure here: a binding table instead of
//! monkey-patching, a descriptor chain instead of a metaclass, a layer
//! vector instead of nested closures. Removal of any layer is a
//! data-structure operation, never closure introspection.
//!
//! ## Dependency Notes
//!
//! Operation arguments, results, and interceptor config are
//! `serde_json::Value`-based. JSON is the universal interchange format
//! for this kind of extension data, and `Value` keeps the traits
//! object-safe where a generic `T: Serialize` would not.

#![deny(missing_docs)]

pub mod binding;
pub mod descriptor;
pub mod error;
pub mod estimator;
pub mod id;
pub mod interceptor;
pub mod namespace;
pub mod operation;
pub mod target;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use binding::{BindingTable, Detached, Layer};
pub use descriptor::TypeDescriptor;
pub use error::{DiscoveryError, InterceptorError, OperationError};
pub use estimator::{AttrValue, Attribute, Estimator};
pub use id::{InstrumentorId, ObjectId};
pub use interceptor::{Config, Interceptor, interceptor_fn};
pub use namespace::Namespace;
pub use operation::{Call, Operation, OperationFn, Origin};
pub use target::Target;
