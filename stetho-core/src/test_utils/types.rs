//! The fixture type system — a fresh descriptor set per test.

use std::sync::Arc;

use crate::descriptor::TypeDescriptor;
use crate::operation::Operation;
use serde_json::json;

/// Descriptors for the fixture ecosystem.
///
/// Each call builds a fresh, independent set, so tests that wrap at
/// type granularity never observe each other's layers. Class-level
/// operations are stateless; stateful behavior lives on instance
/// fixtures like [`StandardScaler`](super::StandardScaler).
pub struct ModelTypes {
    /// Root marker type every fixture derives from.
    pub base_estimator: Arc<TypeDescriptor>,
    /// Scaler type; declares `fit` and `transform`.
    pub standard_scaler: Arc<TypeDescriptor>,
    /// Decomposition type; declares `fit` and `transform`.
    pub pca: Arc<TypeDescriptor>,
    /// Composite type; class-level `fit`/`transform` are stateless
    /// stand-ins (real traversal lives on the instance fixture).
    pub pipeline: Arc<TypeDescriptor>,
    /// Composite type, parallel branches.
    pub feature_union: Arc<TypeDescriptor>,
    /// Base type for tree internals — the default exclusion target.
    /// Declares `fit` and `predict`, inherited by its subtypes.
    pub base_decision_tree: Arc<TypeDescriptor>,
    /// Concrete tree type; inherits `fit`/`predict`, declares nothing.
    pub decision_tree: Arc<TypeDescriptor>,
    /// Ensemble type holding tree internals.
    pub random_forest: Arc<TypeDescriptor>,
    /// Transformer carrying an enumerated parameter (opaque leaf).
    pub enum_transformer: Arc<TypeDescriptor>,
    /// Linear model with a `coef` property and a declared `fit`.
    pub linear_regression: Arc<TypeDescriptor>,
}

impl ModelTypes {
    /// Build a fresh descriptor set with class-level operations
    /// declared.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let base_estimator = TypeDescriptor::root("BaseEstimator");

        let standard_scaler = base_estimator.derive("StandardScaler");
        declare_stateless(&standard_scaler, "fit", json!(null));
        declare_stateless(&standard_scaler, "transform", json!([]));

        let pca = base_estimator.derive("Pca");
        declare_stateless(&pca, "fit", json!(null));
        declare_stateless(&pca, "transform", json!([]));

        let pipeline = base_estimator.derive("Pipeline");
        declare_stateless(&pipeline, "fit", json!(null));
        declare_stateless(&pipeline, "transform", json!([]));

        let feature_union = base_estimator.derive("FeatureUnion");
        declare_stateless(&feature_union, "fit", json!(null));
        declare_stateless(&feature_union, "transform", json!([]));

        let base_decision_tree = base_estimator.derive("BaseDecisionTree");
        declare_stateless(&base_decision_tree, "fit", json!(null));
        declare_stateless(&base_decision_tree, "predict", json!(0.0));
        let decision_tree = base_decision_tree.derive("DecisionTreeRegressor");

        let random_forest = base_estimator.derive("RandomForestRegressor");
        declare_stateless(&random_forest, "fit", json!(null));
        declare_stateless(&random_forest, "predict", json!(0.0));

        let enum_transformer = base_estimator.derive("EnumTransformer");
        declare_stateless(&enum_transformer, "fit", json!(null));
        declare_stateless(&enum_transformer, "transform", json!([]));

        let linear_regression = base_estimator.derive("LinearRegression");
        declare_stateless(&linear_regression, "fit", json!(null));
        linear_regression.declare(Operation::property(
            "coef",
            "LinearRegression.coef",
            |_| Ok(json!([0.5])),
        ));

        Self {
            base_estimator,
            standard_scaler,
            pca,
            pipeline,
            feature_union,
            base_decision_tree,
            decision_tree,
            random_forest,
            enum_transformer,
            linear_regression,
        }
    }
}

fn declare_stateless(ty: &Arc<TypeDescriptor>, name: &str, retval: serde_json::Value) {
    let qualname = format!("{}.{}", ty.name(), name);
    ty.declare(Operation::new(name, qualname, move |_| Ok(retval.clone())));
}
