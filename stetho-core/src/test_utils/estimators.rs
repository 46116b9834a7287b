//! Leaf fixture estimators.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};

use crate::binding::BindingTable;
use crate::descriptor::TypeDescriptor;
use crate::error::{DiscoveryError, OperationError};
use crate::estimator::{AttrValue, Attribute, Estimator};
use crate::operation::Operation;

use super::types::ModelTypes;

/// Interpret a JSON value as a flat array of numbers.
pub fn as_f64_array(value: &Value) -> Result<Vec<f64>, OperationError> {
    let items = value
        .as_array()
        .ok_or_else(|| OperationError::InvalidInput("expected an array".into()))?;
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| OperationError::InvalidInput("expected a number".into()))
        })
        .collect()
}

/// A scaler with real per-instance state: `fit` computes the mean of
/// `X`, `transform` centers `X` on it. Operations live in the instance
/// binding table, shadowing the class-level stand-ins.
pub struct StandardScaler {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
    mean: Arc<Mutex<Option<f64>>>,
}

impl StandardScaler {
    /// Build a scaler instance.
    pub fn new(types: &ModelTypes) -> Arc<Self> {
        let bindings = BindingTable::new();
        let mean = Arc::new(Mutex::new(None));

        let state = Arc::clone(&mean);
        bindings.declare(Operation::new("fit", "StandardScaler.fit", move |call| {
            let x = as_f64_array(call.require("X")?)?;
            if x.is_empty() {
                return Err(OperationError::InvalidInput("empty X".into()));
            }
            let m = x.iter().sum::<f64>() / x.len() as f64;
            *state.lock().unwrap_or_else(PoisonError::into_inner) = Some(m);
            Ok(json!(null))
        }));

        let state = Arc::clone(&mean);
        bindings.declare(Operation::new(
            "transform",
            "StandardScaler.transform",
            move |call| {
                let m = state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .ok_or_else(|| OperationError::NotFitted("StandardScaler".into()))?;
                let x = as_f64_array(call.require("X")?)?;
                Ok(json!(x.iter().map(|v| v - m).collect::<Vec<f64>>()))
            },
        ));

        Arc::new(Self {
            descriptor: Arc::clone(&types.standard_scaler),
            bindings,
            mean,
        })
    }

    /// The fitted mean, if `fit` ran.
    pub fn mean(&self) -> Option<f64> {
        *self.mean.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Estimator for StandardScaler {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }
}

/// A tree with operations inherited from `BaseDecisionTree` — resolved
/// through the descriptor chain, nothing declared on the instance.
pub struct DecisionTreeRegressor {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
}

impl DecisionTreeRegressor {
    /// Build a tree instance.
    pub fn new(types: &ModelTypes) -> Arc<Self> {
        Arc::new(Self {
            descriptor: Arc::clone(&types.decision_tree),
            bindings: BindingTable::new(),
        })
    }
}

impl Estimator for DecisionTreeRegressor {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }
}

/// An ensemble whose `estimators_` attribute is a forest of tree
/// internals — the shape the default exclusion exists for.
pub struct RandomForestRegressor {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
    trees: Vec<Arc<DecisionTreeRegressor>>,
}

impl RandomForestRegressor {
    /// Build a forest with `n_trees` tree internals.
    pub fn new(types: &ModelTypes, n_trees: usize) -> Arc<Self> {
        let trees: Vec<Arc<DecisionTreeRegressor>> = (0..n_trees)
            .map(|_| DecisionTreeRegressor::new(types))
            .collect();

        let bindings = BindingTable::new();
        let children = trees.clone();
        bindings.declare(Operation::new(
            "fit",
            "RandomForestRegressor.fit",
            move |call| {
                for tree in &children {
                    if let Some(op) = tree.operation("fit") {
                        op.invoke(call)?;
                    }
                }
                Ok(json!(null))
            },
        ));
        let children = trees.clone();
        bindings.declare(Operation::new(
            "predict",
            "RandomForestRegressor.predict",
            move |call| {
                let mut total = 0.0;
                for tree in &children {
                    if let Some(op) = tree.operation("predict") {
                        total += op.invoke(call)?.as_f64().unwrap_or(0.0);
                    }
                }
                Ok(json!(total / children.len().max(1) as f64))
            },
        ));

        Arc::new(Self {
            descriptor: Arc::clone(&types.random_forest),
            bindings,
            trees,
        })
    }

    /// The tree internals.
    pub fn trees(&self) -> &[Arc<DecisionTreeRegressor>] {
        &self.trees
    }
}

impl Estimator for RandomForestRegressor {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    fn attributes(&self) -> Result<Vec<Attribute>, DiscoveryError> {
        let forest = self
            .trees
            .iter()
            .map(|t| AttrValue::Owner(t.clone() as Arc<dyn Estimator>))
            .collect();
        Ok(vec![Attribute::new("estimators_", AttrValue::Seq(forest))])
    }
}

/// A transformer whose only attribute is an enumerated parameter — an
/// opaque leaf the walker must never descend into.
pub struct EnumTransformer {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
}

impl EnumTransformer {
    /// Build the transformer.
    pub fn new(types: &ModelTypes) -> Arc<Self> {
        let bindings = BindingTable::new();
        bindings.declare(Operation::new("fit", "EnumTransformer.fit", |_| {
            Ok(json!(null))
        }));
        bindings.declare(Operation::new(
            "transform",
            "EnumTransformer.transform",
            |call| Ok(call.require("X")?.clone()),
        ));
        Arc::new(Self {
            descriptor: Arc::clone(&types.enum_transformer),
            bindings,
        })
    }
}

impl Estimator for EnumTransformer {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    fn attributes(&self) -> Result<Vec<Attribute>, DiscoveryError> {
        Ok(vec![Attribute::new("param", AttrValue::Opaque)])
    }
}

/// A shape-shifting fixture: no instance operations of its own, custom
/// attributes, optionally failing attribute access. Resolves
/// operations purely through the descriptor chain, which makes it the
/// fixture of choice for class-granularity tests.
pub struct PlainEstimator {
    descriptor: Arc<TypeDescriptor>,
    bindings: BindingTable,
    attrs: Vec<Attribute>,
    fail: bool,
}

impl PlainEstimator {
    /// A leaf instance of the given type.
    pub fn leaf(ty: &Arc<TypeDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            descriptor: Arc::clone(ty),
            bindings: BindingTable::new(),
            attrs: Vec::new(),
            fail: false,
        })
    }

    /// An instance with the given attributes.
    pub fn with_attributes(ty: &Arc<TypeDescriptor>, attrs: Vec<Attribute>) -> Arc<Self> {
        Arc::new(Self {
            descriptor: Arc::clone(ty),
            bindings: BindingTable::new(),
            attrs,
            fail: false,
        })
    }

    /// An instance whose `attributes()` errors — for testing that
    /// discovery skips it and carries on.
    pub fn failing(ty: &Arc<TypeDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            descriptor: Arc::clone(ty),
            bindings: BindingTable::new(),
            attrs: Vec::new(),
            fail: true,
        })
    }
}

impl Estimator for PlainEstimator {
    fn descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    fn attributes(&self) -> Result<Vec<Attribute>, DiscoveryError> {
        if self.fail {
            return Err(DiscoveryError::AttributeAccess {
                owner: self.type_name(),
                message: "fixture configured to fail".into(),
            });
        }
        Ok(self.attrs.clone())
    }
}
