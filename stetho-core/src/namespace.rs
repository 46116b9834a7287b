//! Namespaces — the explicit registry tree for whole-library attachment.
//!
//! Where a reflective language walks a package's module tree at attach
//! time, this design takes an explicit [`Namespace`] registry the
//! target ecosystem builds once: nested namespaces plus the type
//! descriptors registered in each. Discovery walks it; nothing is
//! imported or executed during the walk.

use std::sync::Arc;

use crate::descriptor::TypeDescriptor;

/// A node in the namespace tree.
#[derive(Debug, Default)]
pub struct Namespace {
    name: String,
    children: Vec<Namespace>,
    types: Vec<Arc<TypeDescriptor>>,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Add a nested namespace (builder style).
    #[must_use]
    pub fn with_namespace(mut self, child: Namespace) -> Self {
        self.children.push(child);
        self
    }

    /// Register a type (builder style).
    #[must_use]
    pub fn with_type(mut self, ty: Arc<TypeDescriptor>) -> Self {
        self.types.push(ty);
        self
    }

    /// This namespace's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directly nested namespaces, in registration order.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.children
    }

    /// Types registered directly in this namespace, in registration
    /// order.
    pub fn types(&self) -> &[Arc<TypeDescriptor>] {
        &self.types
    }

    /// Resolve a dotted path against this namespace.
    ///
    /// The first segment may name this namespace itself
    /// (`mlcore.decomposition` resolved on the `mlcore` root), matching
    /// how package paths are written by callers.
    pub fn resolve(&self, path: &str) -> Option<&Namespace> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut node = if first == self.name {
            self
        } else {
            self.children.iter().find(|c| c.name == first)?
        };
        for segment in segments {
            node = node.children.iter().find(|c| c.name == segment)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Namespace {
        Namespace::new("mlcore")
            .with_namespace(
                Namespace::new("preprocessing").with_type(TypeDescriptor::root("StandardScaler")),
            )
            .with_namespace(
                Namespace::new("decomposition").with_type(TypeDescriptor::root("Pca")),
            )
    }

    #[test]
    fn resolve_self_and_nested() {
        let root = tree();
        assert_eq!(root.resolve("mlcore").unwrap().name(), "mlcore");
        assert_eq!(
            root.resolve("mlcore.preprocessing").unwrap().name(),
            "preprocessing"
        );
        assert_eq!(root.resolve("decomposition").unwrap().name(), "decomposition");
        assert!(root.resolve("mlcore.linear_model").is_none());
    }
}
