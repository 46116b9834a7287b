#![deny(missing_docs)]
//! # stetho — umbrella crate
//!
//! Provides a single import surface for the stetho instrumentation
//! system. Re-exports the protocol crate, the attachment engine, and
//! the ready-made interceptors behind feature flags, plus a `prelude`
//! for the happy path.

#[cfg(feature = "core")]
pub use stetho_core;
#[cfg(feature = "engine")]
pub use stetho_engine;
#[cfg(feature = "instruments")]
pub use stetho_instruments;

/// Happy-path imports for instrumenting estimator graphs.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use stetho_core::{
        AttrValue, Attribute, BindingTable, Call, Config, Estimator, InstrumentorId, Interceptor,
        InterceptorError, Namespace, Operation, OperationError, Origin, Target, TypeDescriptor,
        interceptor_fn,
    };

    #[cfg(feature = "engine")]
    pub use stetho_engine::{ExclusionPolicy, Instrumentor};

    #[cfg(feature = "instruments")]
    pub use stetho_instruments::{CallCounter, Identity, ShapeLogger, TimeElapsed};

    #[cfg(feature = "test-utils")]
    pub use stetho_engine::InstrumentationAsserter;
}
