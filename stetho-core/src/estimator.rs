//! The Estimator interface — what makes an object an instrumentable owner.
//!
//! `Estimator` is the base-type marker the target ecosystem supplies:
//! discovery treats a value as an eligible owner iff it implements this
//! trait. An estimator exposes its runtime type, its instance-level
//! operation bindings, and the attributes a graph walker may descend
//! into. Composites (pipelines, unions, metaestimators) surface their
//! children through [`Estimator::attributes`].

use std::sync::Arc;

use crate::binding::BindingTable;
use crate::descriptor::TypeDescriptor;
use crate::error::DiscoveryError;
use crate::operation::Operation;

/// A named attribute of an owner, as seen by the graph walker.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Attribute name on the owner, e.g. `steps` or `estimators_`.
    pub name: String,
    /// The attribute's traversable shape.
    pub value: AttrValue,
}

impl Attribute {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The traversable shape of an attribute value.
///
/// Only `Owner` values (and `Owner`s nested inside `Seq`/`Map`) are
/// instrumentation targets. `Opaque` covers everything the walker must
/// never descend into: raw byte buffers, enumerated parameters, numeric
/// arrays, fitted coefficients.
#[derive(Clone)]
pub enum AttrValue {
    /// A nested owner — a sub-estimator of a composite.
    Owner(Arc<dyn Estimator>),
    /// An ordered collection, e.g. a pipeline's step list.
    Seq(Vec<AttrValue>),
    /// A keyed collection, e.g. a named-transformer map.
    Map(Vec<(String, AttrValue)>),
    /// A leaf the walker never descends into.
    Opaque,
}

impl std::fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Owner(e) => f.debug_tuple("Owner").field(&e.type_name()).finish(),
            AttrValue::Seq(items) => f.debug_tuple("Seq").field(&items.len()).finish(),
            AttrValue::Map(items) => f.debug_tuple("Map").field(&items.len()).finish(),
            AttrValue::Opaque => write!(f, "Opaque"),
        }
    }
}

/// An instrumentable owner instance.
///
/// Implementations come from the target ecosystem; the engine never
/// creates estimators, it only rebinds their operations. Operation
/// resolution is instance-bindings-first, then up the descriptor
/// chain — mirroring attribute lookup in the object models this design
/// is ported from, but through an explicit binding seam instead of
/// dynamic dispatch.
pub trait Estimator: Send + Sync {
    /// The runtime type of this instance.
    fn descriptor(&self) -> Arc<TypeDescriptor>;

    /// Instance-level operation bindings. Wrapping at instance
    /// granularity installs here, shadowing the descriptor chain.
    fn bindings(&self) -> &BindingTable;

    /// The attributes a graph walker may inspect. The default is a
    /// leaf estimator with nothing to descend into. Errors are
    /// per-owner: the walker logs and skips this owner's children.
    fn attributes(&self) -> Result<Vec<Attribute>, DiscoveryError> {
        Ok(Vec::new())
    }

    /// Resolve an operation: instance bindings first, then the
    /// descriptor chain.
    fn operation(&self, name: &str) -> Option<Operation> {
        self.bindings()
            .get_current(name)
            .or_else(|| self.descriptor().resolve(name))
    }

    /// The runtime type's name.
    fn type_name(&self) -> String {
        self.descriptor().name().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Call, Operation, Origin};
    use serde_json::json;

    struct Plain {
        descriptor: Arc<TypeDescriptor>,
        bindings: BindingTable,
    }

    impl Estimator for Plain {
        fn descriptor(&self) -> Arc<TypeDescriptor> {
            Arc::clone(&self.descriptor)
        }

        fn bindings(&self) -> &BindingTable {
            &self.bindings
        }
    }

    #[test]
    fn operation_prefers_instance_bindings() {
        let ty = TypeDescriptor::root("Plain");
        ty.declare(Operation::new("fit", "Plain.fit", |_| Ok(json!("class"))));

        let est = Plain {
            descriptor: Arc::clone(&ty),
            bindings: BindingTable::new(),
        };
        let resolved = est.operation("fit").unwrap();
        assert_eq!(resolved.invoke(&Call::new()).unwrap(), json!("class"));

        est.bindings
            .declare(Operation::new("fit", "Plain.fit", |_| Ok(json!("instance"))));
        let resolved = est.operation("fit").unwrap();
        assert_eq!(resolved.invoke(&Call::new()).unwrap(), json!("instance"));
        assert_eq!(resolved.origin(), Origin::Declared);
    }
}
