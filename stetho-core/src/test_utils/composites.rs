//! Composite fixture estimators — pipelines and unions.
//!
//! Composite operations resolve their children's operations at call
//! time (through each child's binding table), so a child wrapped after
//! the composite was built is still observed wrapped when the
//! composite runs. This is what the nesting-order property tests
//! exercise.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::binding::BindingTable;
use crate::descriptor::TypeDescriptor;
use crate::error::{DiscoveryError, OperationError};
use crate::estimator::{AttrValue, Attribute, Estimator};
use crate::operation::{Call, Operation};

use super::estimators::{EnumTransformer, RandomForestRegressor, StandardScaler, as_f64_array};
use super::types::ModelTypes;

fn step_call(x: &Value, y: Option<&Value>) -> Call {
    let mut call = Call::new().with("X", x.clone());
    if let Some(y) = y {
        call = call.with("y", y.clone());
    }
    call
}

/// Fit every child in order, feeding each `transform` output into the
/// next step's input. Returns the transformed `X` after the last child
/// that exposes `transform`.
fn fit_through(
    children: &[(String, Arc<dyn Estimator>)],
    call: &Call,
) -> Result<Value, OperationError> {
    let mut x = call.require("X")?.clone();
    let y = call.get("y").cloned();
    for (_, child) in children {
        let sub = step_call(&x, y.as_ref());
        if let Some(op) = child.operation("fit") {
            op.invoke(&sub)?;
        }
        if let Some(op) = child.operation("transform") {
            x = op.invoke(&sub)?;
        }
    }
    Ok(x)
}

/// A sequential composite: `fit` runs fit-then-transform through each
/// step, `predict` transforms through all but the last step and asks
/// the last to predict.
pub struct Pipeline {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
    steps: Vec<(String, Arc<dyn Estimator>)>,
}

impl Pipeline {
    /// Build a pipeline from named steps.
    pub fn new(types: &ModelTypes, steps: Vec<(String, Arc<dyn Estimator>)>) -> Arc<Self> {
        let bindings = BindingTable::new();

        let children = steps.clone();
        bindings.declare(Operation::new("fit", "Pipeline.fit", move |call| {
            fit_through(&children, call)?;
            Ok(json!(null))
        }));

        let children = steps.clone();
        bindings.declare(Operation::new(
            "transform",
            "Pipeline.transform",
            move |call| {
                let mut x = call.require("X")?.clone();
                for (_, child) in &children {
                    if let Some(op) = child.operation("transform") {
                        x = op.invoke(&step_call(&x, None))?;
                    }
                }
                Ok(x)
            },
        ));

        let children = steps.clone();
        bindings.declare(Operation::new("predict", "Pipeline.predict", move |call| {
            let mut x = call.require("X")?.clone();
            let (last, head) = children
                .split_last()
                .ok_or_else(|| OperationError::InvalidInput("empty pipeline".into()))?;
            for (_, child) in head {
                if let Some(op) = child.operation("transform") {
                    x = op.invoke(&step_call(&x, None))?;
                }
            }
            let op = last
                .1
                .operation("predict")
                .ok_or_else(|| OperationError::Failed("final step cannot predict".into()))?;
            op.invoke(&step_call(&x, None))
        }));

        Arc::new(Self {
            descriptor: Arc::clone(&types.pipeline),
            bindings,
            steps,
        })
    }

    /// The named steps.
    pub fn steps(&self) -> &[(String, Arc<dyn Estimator>)] {
        &self.steps
    }
}

impl Estimator for Pipeline {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    fn attributes(&self) -> Result<Vec<Attribute>, DiscoveryError> {
        let steps = self
            .steps
            .iter()
            .map(|(name, child)| (name.clone(), AttrValue::Owner(child.clone())))
            .collect();
        Ok(vec![Attribute::new("steps", AttrValue::Map(steps))])
    }
}

/// A parallel composite: `fit` fits every branch on the same input,
/// `transform` concatenates every branch's output.
pub struct FeatureUnion {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
    transformer_list: Vec<(String, Arc<dyn Estimator>)>,
}

impl FeatureUnion {
    /// Build a union from named branches.
    pub fn new(types: &ModelTypes, transformer_list: Vec<(String, Arc<dyn Estimator>)>) -> Arc<Self> {
        let bindings = BindingTable::new();

        let children = transformer_list.clone();
        bindings.declare(Operation::new("fit", "FeatureUnion.fit", move |call| {
            for (_, child) in &children {
                if let Some(op) = child.operation("fit") {
                    op.invoke(call)?;
                }
            }
            Ok(json!(null))
        }));

        let children = transformer_list.clone();
        bindings.declare(Operation::new(
            "transform",
            "FeatureUnion.transform",
            move |call| {
                let mut out: Vec<f64> = Vec::new();
                for (_, child) in &children {
                    if let Some(op) = child.operation("transform") {
                        out.extend(as_f64_array(&op.invoke(call)?)?);
                    }
                }
                Ok(json!(out))
            },
        ));

        Arc::new(Self {
            descriptor: Arc::clone(&types.feature_union),
            bindings,
            transformer_list,
        })
    }
}

impl Estimator for FeatureUnion {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    fn attributes(&self) -> Result<Vec<Attribute>, DiscoveryError> {
        let branches = self
            .transformer_list
            .iter()
            .map(|(name, child)| (name.clone(), AttrValue::Owner(child.clone())))
            .collect();
        Ok(vec![Attribute::new(
            "transformer_list",
            AttrValue::Map(branches),
        )])
    }
}

/// The standard composite fixture: a feature union of scaler + PCA,
/// an enum-carrying transformer, and a random forest.
pub fn classification_model(types: &ModelTypes) -> Arc<Pipeline> {
    let union = FeatureUnion::new(
        types,
        vec![
            ("ss".to_owned(), StandardScaler::new(types) as Arc<dyn Estimator>),
            (
                "pca".to_owned(),
                super::estimators::PlainEstimator::leaf(&types.pca) as Arc<dyn Estimator>,
            ),
        ],
    );
    Pipeline::new(
        types,
        vec![
            ("fu".to_owned(), union as Arc<dyn Estimator>),
            (
                "et".to_owned(),
                EnumTransformer::new(types) as Arc<dyn Estimator>,
            ),
            (
                "rf".to_owned(),
                RandomForestRegressor::new(types, 3) as Arc<dyn Estimator>,
            ),
        ],
    )
}
