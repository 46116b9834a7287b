//! Discovery — enumerating (target, operation) pairs to wrap.
//!
//! Three walkers, one per attachment granularity: an object-graph walk
//! over a live instance, a class walk over a set of descriptors, and a
//! namespace-tree walk for whole-library attachment. All three produce
//! a flat candidate list; the attach/detach paths in
//! [`Instrumentor`](crate::Instrumentor) consume it.
//!
//! Discovery is read-only and total: a broken owner (attribute access
//! failure) is logged and skipped, never fatal, so one failing object
//! cannot leave a half-walked graph behind.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use stetho_core::{
    AttrValue, Estimator, Namespace, ObjectId, Origin, Target, TypeDescriptor,
};

use crate::exclude::ExclusionPolicy;

/// One unit of work for the attach/detach paths: wrap (or unwrap) the
/// named operation on this target.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The owner the operation is resolved on and installed into.
    pub target: Target,
    /// The operation's declared name.
    pub op_name: String,
}

impl Candidate {
    fn instance(estimator: &Arc<dyn Estimator>, op_name: &str) -> Self {
        Self {
            target: Target::Instance(Arc::clone(estimator)),
            op_name: op_name.to_owned(),
        }
    }

    fn type_level(descriptor: &Arc<TypeDescriptor>, op_name: &str) -> Self {
        Self {
            target: Target::Type(Arc::clone(descriptor)),
            op_name: op_name.to_owned(),
        }
    }
}

/// Walk a live object graph and list the wrappable operations, children
/// before parents (post-order).
///
/// Each reachable owner appears once — shared children and reference
/// cycles are cut by a visited set keyed on owner identity. Owners of
/// excluded types are pruned wholesale: neither wrapped nor descended
/// into. Properties are skipped at this granularity (they cannot be
/// shadowed per-instance). An attribute whose name collides with a
/// requested operation name is never descended into.
pub fn discover_instances(
    root: &Arc<dyn Estimator>,
    operations: &[String],
    policy: &ExclusionPolicy,
) -> Vec<Candidate> {
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    walk_instance(root, operations, policy, &mut visited, &mut out);
    out
}

fn walk_instance(
    owner: &Arc<dyn Estimator>,
    operations: &[String],
    policy: &ExclusionPolicy,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<Candidate>,
) {
    if !visited.insert(ObjectId::of_instance(owner)) {
        return;
    }
    if policy.is_excluded(&owner.descriptor()) {
        debug!(owner = %owner.type_name(), "skipping excluded type");
        return;
    }

    match owner.attributes() {
        Ok(attributes) => {
            for attribute in attributes {
                if operations.iter().any(|op| *op == attribute.name) {
                    debug!(
                        owner = %owner.type_name(),
                        attribute = %attribute.name,
                        "attribute shares an operation name, not descending"
                    );
                    continue;
                }
                walk_attr_value(&attribute.value, operations, policy, visited, out);
            }
        }
        Err(err) => {
            warn!(owner = %owner.type_name(), error = %err, "attribute walk failed, skipping children");
        }
    }

    for name in operations {
        let Some(op) = owner.operation(name) else {
            continue;
        };
        if op.origin() == Origin::Property {
            debug!(
                owner = %owner.type_name(),
                operation = %name,
                "property is not wrappable at instance granularity"
            );
            continue;
        }
        out.push(Candidate::instance(owner, name));
    }
}

fn walk_attr_value(
    value: &AttrValue,
    operations: &[String],
    policy: &ExclusionPolicy,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<Candidate>,
) {
    match value {
        AttrValue::Owner(child) => walk_instance(child, operations, policy, visited, out),
        AttrValue::Seq(items) => {
            for item in items {
                walk_attr_value(item, operations, policy, visited, out);
            }
        }
        AttrValue::Map(items) => {
            for (_, item) in items {
                walk_attr_value(item, operations, policy, visited, out);
            }
        }
        AttrValue::Opaque => {}
    }
}

/// List the wrappable operations across a set of type descriptors.
///
/// An operation inherited from an ancestor is attributed to the
/// descriptor that declares it, so a base-class operation shared by
/// many subtypes is wrapped exactly once — on its definer. Excluded
/// definers are skipped.
pub fn discover_classes(
    descriptors: &[Arc<TypeDescriptor>],
    operations: &[String],
    policy: &ExclusionPolicy,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for descriptor in descriptors {
        collect_class(descriptor, operations, policy, &mut seen, &mut out);
    }
    out
}

fn collect_class(
    descriptor: &Arc<TypeDescriptor>,
    operations: &[String],
    policy: &ExclusionPolicy,
    seen: &mut HashSet<(ObjectId, String)>,
    out: &mut Vec<Candidate>,
) {
    for name in operations {
        let Some(definer) = descriptor.definer(name) else {
            continue;
        };
        if policy.is_excluded(&definer) {
            debug!(definer = %definer.name(), operation = %name, "skipping excluded definer");
            continue;
        }
        if !seen.insert((ObjectId::of_type(&definer), name.clone())) {
            continue;
        }
        out.push(Candidate::type_level(&definer, name));
    }
}

/// Walk a namespace tree and list the wrappable operations of every
/// registered type.
///
/// Namespaces whose name contains `test` (case-insensitive) are pruned
/// with their whole subtree. Only operations declared directly on a
/// registered descriptor are listed here — inheritance attribution is
/// the class walk's job, and registries commonly register base and
/// subtype side by side.
pub fn discover_namespace(
    namespace: &Namespace,
    operations: &[String],
    policy: &ExclusionPolicy,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk_namespace(namespace, operations, policy, &mut seen, &mut out);
    out
}

fn walk_namespace(
    namespace: &Namespace,
    operations: &[String],
    policy: &ExclusionPolicy,
    seen: &mut HashSet<(ObjectId, String)>,
    out: &mut Vec<Candidate>,
) {
    if namespace.name().to_ascii_lowercase().contains("test") {
        debug!(namespace = %namespace.name(), "skipping test namespace");
        return;
    }
    for descriptor in namespace.types() {
        if policy.is_excluded(descriptor) {
            debug!(descriptor = %descriptor.name(), "skipping excluded type");
            continue;
        }
        for name in operations {
            if !descriptor.bindings().contains(name) {
                continue;
            }
            if !seen.insert((ObjectId::of_type(descriptor), name.clone())) {
                continue;
            }
            out.push(Candidate::type_level(descriptor, name));
        }
    }
    for child in namespace.namespaces() {
        walk_namespace(child, operations, policy, seen, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stetho_core::test_utils::{ModelTypes, PlainEstimator, classification_model};
    use stetho_core::{Namespace, Operation};
    use serde_json::json;

    fn ops(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn instance_walk_is_post_order_and_deduplicated() {
        let types = ModelTypes::new();
        let model = classification_model(&types);
        let found = discover_instances(
            &(model as Arc<dyn Estimator>),
            &ops(&["fit", "transform", "predict"]),
            &ExclusionPolicy::new(),
        );

        let names: Vec<String> = found
            .iter()
            .map(|c| format!("{}.{}", c.target.type_name(), c.op_name))
            .collect();
        // children strictly before their parents
        let pos = |needle: &str| {
            names
                .iter()
                .position(|n| n == needle)
                .unwrap_or_else(|| panic!("missing {needle} in {names:?}"))
        };
        assert!(pos("StandardScaler.fit") < pos("FeatureUnion.fit"));
        assert!(pos("FeatureUnion.fit") < pos("Pipeline.fit"));
        assert!(pos("RandomForestRegressor.fit") < pos("Pipeline.fit"));
        // the forest's trees are excluded by default
        assert!(!names.iter().any(|n| n.starts_with("DecisionTreeRegressor")));
    }

    #[test]
    fn instance_walk_skips_properties() {
        let types = ModelTypes::new();
        let est = PlainEstimator::leaf(&types.linear_regression);
        let found = discover_instances(
            &(est as Arc<dyn Estimator>),
            &ops(&["fit", "coef"]),
            &ExclusionPolicy::new(),
        );
        let names: Vec<&str> = found.iter().map(|c| c.op_name.as_str()).collect();
        assert!(names.contains(&"fit"));
        assert!(!names.contains(&"coef"));
    }

    #[test]
    fn instance_walk_skips_colliding_attribute() {
        let types = ModelTypes::new();
        let child = PlainEstimator::leaf(&types.standard_scaler);
        let est = PlainEstimator::with_attributes(
            &types.pipeline,
            vec![stetho_core::Attribute::new(
                "transform",
                stetho_core::AttrValue::Owner(child as Arc<dyn Estimator>),
            )],
        );
        let found = discover_instances(
            &(est as Arc<dyn Estimator>),
            &ops(&["fit", "transform"]),
            &ExclusionPolicy::new(),
        );
        // the child hidden behind the colliding attribute is not walked
        assert!(!found.iter().any(|c| c.target.type_name() == "StandardScaler"));
    }

    #[test]
    fn instance_walk_survives_broken_attributes() {
        let types = ModelTypes::new();
        let est = PlainEstimator::failing(&types.pipeline);
        let found = discover_instances(
            &(est as Arc<dyn Estimator>),
            &ops(&["fit"]),
            &ExclusionPolicy::new(),
        );
        // the owner itself is still wrappable
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].op_name, "fit");
    }

    #[test]
    fn class_walk_attributes_inherited_ops_to_definer() {
        let types = ModelTypes::new();
        let base = types.base_estimator.derive("Shared");
        base.declare(Operation::new("fit", "Shared.fit", |_| Ok(json!(null))));
        let sub_a = base.derive("SubA");
        let sub_b = base.derive("SubB");

        let found = discover_classes(
            &[sub_a, sub_b],
            &ops(&["fit"]),
            &ExclusionPolicy::new(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target.type_name(), "Shared");
    }

    #[test]
    fn class_walk_skips_excluded_definer() {
        let types = ModelTypes::new();
        let found = discover_classes(
            &[Arc::clone(&types.decision_tree)],
            &ops(&["fit", "predict"]),
            &ExclusionPolicy::new(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn namespace_walk_prunes_test_subtrees() {
        let types = ModelTypes::new();
        let root = Namespace::new("mlcore")
            .with_namespace(
                Namespace::new("preprocessing").with_type(Arc::clone(&types.standard_scaler)),
            )
            .with_namespace(
                Namespace::new("Tests").with_type(Arc::clone(&types.pca)),
            );
        let found = discover_namespace(&root, &ops(&["fit", "transform"]), &ExclusionPolicy::new());
        assert!(found.iter().all(|c| c.target.type_name() == "StandardScaler"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn namespace_walk_lists_declared_ops_only() {
        let types = ModelTypes::new();
        // decision_tree declares nothing itself; its ops live on the base
        let root = Namespace::new("trees").with_type(Arc::clone(&types.decision_tree));
        let found = discover_namespace(&root, &ops(&["fit", "predict"]), &ExclusionPolicy::new());
        assert!(found.is_empty());
    }
}
