//! Type descriptors — explicit runtime type objects.
//!
//! A [`TypeDescriptor`] stands in for what a reflective language would
//! call a class: a name, an optional parent (single inheritance chain),
//! and a class-level [`BindingTable`]. Instances hold an `Arc` to their
//! descriptor and resolve operations instance-table-first, then up the
//! chain. Wrapping a descriptor's operation is visible to every
//! instance that resolves through it.

use std::sync::Arc;

use crate::binding::BindingTable;
use crate::operation::Operation;

/// A runtime type: name, parent chain, and class-level bindings.
pub struct TypeDescriptor {
    name: String,
    parent: Option<Arc<TypeDescriptor>>,
    bindings: BindingTable,
}

impl TypeDescriptor {
    /// Create a root type with no parent.
    pub fn root(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
            bindings: BindingTable::new(),
        })
    }

    /// Create a subtype of `self`.
    pub fn derive(self: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(self)),
            bindings: BindingTable::new(),
        })
    }

    /// The type's name, e.g. `StandardScaler`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent descriptor, if any.
    pub fn parent(&self) -> Option<&Arc<TypeDescriptor>> {
        self.parent.as_ref()
    }

    /// The class-level binding table.
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Declare an operation on this type. Convenience for
    /// `bindings().declare`.
    pub fn declare(&self, op: Operation) {
        self.bindings.declare(op);
    }

    /// Resolve an operation by walking the chain from this type upward.
    /// Operations found on an ancestor come back tagged
    /// [`Origin::Inherited`](crate::operation::Origin::Inherited).
    pub fn resolve(self: &Arc<Self>, name: &str) -> Option<Operation> {
        if let Some(op) = self.bindings.get_current(name) {
            return Some(op);
        }
        let mut ancestor = self.parent.as_ref();
        while let Some(ty) = ancestor {
            if let Some(op) = ty.bindings.get_current(name) {
                return Some(op.as_inherited());
            }
            ancestor = ty.parent.as_ref();
        }
        None
    }

    /// The descriptor in the chain that declares `name`, starting from
    /// this type. This is the attribution point for class-granularity
    /// wrapping: an inherited operation is wrapped once, on its
    /// definer, never independently on each subclass.
    pub fn definer(self: &Arc<Self>, name: &str) -> Option<Arc<TypeDescriptor>> {
        let mut ty = Arc::clone(self);
        loop {
            if ty.bindings.contains(name) {
                return Some(ty);
            }
            let parent = ty.parent.as_ref()?;
            ty = Arc::clone(parent);
        }
    }

    /// Whether this type or any ancestor is named `base_name`.
    pub fn is_subtype_of(&self, base_name: &str) -> bool {
        if self.name == base_name {
            return true;
        }
        let mut ancestor = self.parent.as_ref();
        while let Some(ty) = ancestor {
            if ty.name == base_name {
                return true;
            }
            ancestor = ty.parent.as_ref();
        }
        false
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Call, Origin};
    use serde_json::json;

    #[test]
    fn resolve_prefers_own_table() {
        let base = TypeDescriptor::root("Base");
        base.declare(Operation::new("fit", "Base.fit", |_| Ok(json!("base"))));
        let sub = base.derive("Sub");
        sub.declare(Operation::new("fit", "Sub.fit", |_| Ok(json!("sub"))));

        let op = sub.resolve("fit").unwrap();
        assert_eq!(op.origin(), Origin::Declared);
        assert_eq!(op.invoke(&Call::new()).unwrap(), json!("sub"));
    }

    #[test]
    fn resolve_walks_chain_and_tags_inherited() {
        let base = TypeDescriptor::root("Base");
        base.declare(Operation::new("fit", "Base.fit", |_| Ok(json!("base"))));
        let sub = base.derive("Sub");

        let op = sub.resolve("fit").unwrap();
        assert_eq!(op.origin(), Origin::Inherited);
        assert_eq!(op.qualname(), "Base.fit");
    }

    #[test]
    fn definer_attributes_to_declaring_ancestor() {
        let base = TypeDescriptor::root("Base");
        base.declare(Operation::new("fit", "Base.fit", |_| Ok(json!(null))));
        let mid = base.derive("Mid");
        let sub = mid.derive("Sub");

        let definer = sub.definer("fit").unwrap();
        assert_eq!(definer.name(), "Base");
        assert!(sub.definer("predict").is_none());
    }

    #[test]
    fn subtype_check_matches_whole_chain() {
        let base = TypeDescriptor::root("BaseDecisionTree");
        let sub = base.derive("DecisionTreeRegressor");
        assert!(sub.is_subtype_of("BaseDecisionTree"));
        assert!(sub.is_subtype_of("DecisionTreeRegressor"));
        assert!(!sub.is_subtype_of("StandardScaler"));
    }
}
