//! Targets — the owner unification wrapping and discovery operate on.

use std::sync::Arc;

use crate::binding::BindingTable;
use crate::descriptor::TypeDescriptor;
use crate::estimator::Estimator;
use crate::id::ObjectId;
use crate::operation::Operation;

/// An owner a wrap applies to: a live instance or a type.
///
/// Instance targets resolve operations through the full lookup chain
/// and install into the instance's binding table (shadowing the
/// chain). Type targets see and install only operations declared
/// directly on the descriptor — inherited operations are reached
/// through their definer.
#[derive(Clone)]
pub enum Target {
    /// A live estimator instance.
    Instance(Arc<dyn Estimator>),
    /// A type descriptor.
    Type(Arc<TypeDescriptor>),
}

impl Target {
    /// The type name, for reporting and exclusion checks.
    pub fn type_name(&self) -> String {
        match self {
            Target::Instance(e) => e.type_name(),
            Target::Type(d) => d.name().to_owned(),
        }
    }

    /// The descriptor: an instance's runtime type, or the type itself.
    pub fn descriptor(&self) -> Arc<TypeDescriptor> {
        match self {
            Target::Instance(e) => e.descriptor(),
            Target::Type(d) => Arc::clone(d),
        }
    }

    /// Stable identity key for the visited set and ledger bookkeeping.
    pub fn id(&self) -> ObjectId {
        match self {
            Target::Instance(e) => ObjectId::of_instance(e),
            Target::Type(d) => ObjectId::of_type(d),
        }
    }

    /// The binding table wrapping installs into.
    pub fn bindings(&self) -> &BindingTable {
        match self {
            Target::Instance(e) => e.bindings(),
            Target::Type(d) => d.bindings(),
        }
    }

    /// The operation currently bound under `name` on this target.
    pub fn operation(&self, name: &str) -> Option<Operation> {
        match self {
            Target::Instance(e) => e.operation(name),
            Target::Type(d) => d.bindings().get_current(name),
        }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Instance(e) => f.debug_tuple("Instance").field(&e.type_name()).finish(),
            Target::Type(d) => f.debug_tuple("Type").field(&d.name()).finish(),
        }
    }
}
