//! # stetho-engine — discovery, composition, and reversible attachment
//!
//! The engine half of the stetho instrumentation system. `stetho-core`
//! defines the seams (owners, bindings, interceptors); this crate walks
//! object graphs, class sets, and namespace registries, wraps the
//! operations it finds, and — crucially — unwinds any subset of that
//! wrapping later, regardless of what other instrumentors did in
//! between.
//!
//! ## Shape
//!
//! - [`discover`] enumerates (target, operation) candidates per
//!   granularity: live instance graphs, class sets, namespace trees.
//! - [`compose`] turns an interceptor layer into a replacement
//!   operation that keeps the original's identity.
//! - [`Instrumentor`] drives both: attach wraps candidates and records
//!   layers in each owner's binding table; detach strips exactly its
//!   own layers and recomposes the rest.
//!
//! Attach and detach are idempotent, and detach order is independent of
//! attach order across instrumentors — the layer ledger lives with each
//! owner, not inside any instrumentor.

#![deny(missing_docs)]

pub mod compose;
pub mod config;
pub mod discover;
pub mod exclude;
pub mod instrumentor;

#[cfg(feature = "test-utils")]
pub mod testing;

// Re-exports for convenience
pub use compose::{compose, recompose};
pub use config::{DEFAULT_EXCLUDE, DEFAULT_OPERATIONS};
pub use discover::{Candidate, discover_classes, discover_instances, discover_namespace};
pub use exclude::ExclusionPolicy;
pub use instrumentor::Instrumentor;

#[cfg(feature = "test-utils")]
pub use testing::InstrumentationAsserter;
