//! Fixture estimators and interceptors for testing.
//!
//! Available behind the `test-utils` feature flag. The fixture set is a
//! small model ecosystem: a scaler and a PCA-alike, pipeline and
//! feature-union composites, a tree ensemble whose internals exercise
//! the default exclusion, and recording/counting interceptors for
//! observing wrap behavior.

mod composites;
mod estimators;
mod interceptors;
mod types;

pub use composites::{FeatureUnion, Pipeline, classification_model};
pub use estimators::{
    DecisionTreeRegressor, EnumTransformer, PlainEstimator, RandomForestRegressor, StandardScaler,
    as_f64_array,
};
pub use interceptors::{CountingInterceptor, FailingInterceptor, RecordingInterceptor};
pub use types::ModelTypes;
