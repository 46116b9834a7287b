//! Exclusion policy — which types discovery must never wrap.

use std::collections::BTreeSet;

use stetho_core::TypeDescriptor;

use crate::config::DEFAULT_EXCLUDE;

/// A read-only set of excluded base-type names.
///
/// A type is excluded when it, or any ancestor in its descriptor
/// chain, carries one of the configured names — subclasses of an
/// excluded base are never wrapped. Configured once at instrumentor
/// construction; immutable during discovery.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    names: BTreeSet<String>,
}

impl ExclusionPolicy {
    /// The default policy: [`DEFAULT_EXCLUDE`] only.
    pub fn new() -> Self {
        Self {
            names: DEFAULT_EXCLUDE.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// The default policy unioned with user-supplied type names.
    pub fn with_extra(extra: impl IntoIterator<Item = String>) -> Self {
        let mut policy = Self::new();
        policy.names.extend(extra);
        policy
    }

    /// Whether the given type (or any of its ancestors) is excluded.
    pub fn is_excluded(&self, descriptor: &TypeDescriptor) -> bool {
        self.names.iter().any(|name| descriptor.is_subtype_of(name))
    }

    /// The configured names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stetho_core::TypeDescriptor;

    #[test]
    fn excludes_subtypes_of_default_bases() {
        let policy = ExclusionPolicy::new();
        let base = TypeDescriptor::root("BaseDecisionTree");
        let tree = base.derive("DecisionTreeRegressor");
        assert!(policy.is_excluded(&base));
        assert!(policy.is_excluded(&tree));
        assert!(!policy.is_excluded(&TypeDescriptor::root("StandardScaler")));
    }

    #[test]
    fn extra_names_union_with_default() {
        let policy = ExclusionPolicy::with_extra(["Pca".to_owned()]);
        assert!(policy.is_excluded(&TypeDescriptor::root("Pca")));
        assert!(policy.is_excluded(&TypeDescriptor::root("BaseDecisionTree")));
    }
}
