//! The instrumentor — reversible attachment of one interceptor.
//!
//! An [`Instrumentor`] pairs one interceptor (and its config) with an
//! identity, an operation list, and an exclusion policy. Attach walks a
//! graph, a class set, or a namespace tree, wraps every discovered
//! operation, and records a layer per wrap in the owner's binding
//! table. Detach strips exactly this instrumentor's layers and
//! recomposes whatever other instrumentors installed — in any order,
//! independent of attach order.
//!
//! The instrumentor itself holds no mutable bookkeeping: the wrap
//! ledger lives with each owner, shared by all instrumentors, which is
//! what makes detaching safe when several instrumentors overlap.

use std::sync::Arc;

use tracing::{debug, warn};

use stetho_core::{
    Config, Estimator, InstrumentorId, Interceptor, InterceptorError, Namespace, Target,
    TypeDescriptor,
};

use crate::compose::{compose, layer_of, recompose};
use crate::config::DEFAULT_OPERATIONS;
use crate::discover::{Candidate, discover_classes, discover_instances, discover_namespace};
use crate::exclude::ExclusionPolicy;

/// Reversible attachment of one interceptor to estimator graphs,
/// classes, or namespaces.
pub struct Instrumentor {
    id: InstrumentorId,
    interceptor: Arc<dyn Interceptor>,
    config: Config,
    operations: Vec<String>,
    policy: ExclusionPolicy,
    namespace_root: Option<Arc<Namespace>>,
}

impl Instrumentor {
    /// Create an instrumentor with a generated identity, the default
    /// operation list, and the default exclusion policy.
    pub fn new(interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            id: InstrumentorId::generate(),
            interceptor,
            config: Config::new(),
            operations: DEFAULT_OPERATIONS.iter().map(|s| (*s).to_owned()).collect(),
            policy: ExclusionPolicy::new(),
            namespace_root: None,
        }
    }

    /// Use an explicit identity instead of a generated one. Two
    /// instrumentors with the same identity are indistinguishable to
    /// the ledger; give each its own.
    #[must_use]
    pub fn with_id(mut self, id: InstrumentorId) -> Self {
        self.id = id;
        self
    }

    /// Default config handed to the interceptor at every wrap. The
    /// `*_with` attach variants override it per call.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replace the operation list.
    #[must_use]
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = String>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    /// Add excluded type names on top of the defaults.
    #[must_use]
    pub fn with_exclusions(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.policy = ExclusionPolicy::with_extra(extra);
        self
    }

    /// The namespace registry [`attach_namespaces`](Self::attach_namespaces)
    /// resolves paths against.
    #[must_use]
    pub fn with_namespace_root(mut self, root: Arc<Namespace>) -> Self {
        self.namespace_root = Some(root);
        self
    }

    /// This instrumentor's identity.
    pub fn id(&self) -> &InstrumentorId {
        &self.id
    }

    /// The operation names attach looks for.
    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    /// The exclusion policy in force.
    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Wrap every discovered operation across a live object graph, at
    /// instance granularity. Attaching twice is a no-op for targets
    /// already carrying this instrumentor's layer.
    pub fn attach_object_graph(&self, root: &Arc<dyn Estimator>) -> Result<(), InterceptorError> {
        self.attach_object_graph_with(root, self.config.clone())
    }

    /// [`attach_object_graph`](Self::attach_object_graph) with a
    /// per-call config instead of the instrumentor's default.
    pub fn attach_object_graph_with(
        &self,
        root: &Arc<dyn Estimator>,
        config: Config,
    ) -> Result<(), InterceptorError> {
        self.attach_candidates(
            &discover_instances(root, &self.operations, &self.policy),
            &config,
        )
    }

    /// Strip this instrumentor's layers across a live object graph.
    /// Targets it never wrapped are silently left alone.
    pub fn detach_object_graph(&self, root: &Arc<dyn Estimator>) -> Result<(), InterceptorError> {
        self.detach_candidates(&discover_instances(root, &self.operations, &self.policy))
    }

    /// Wrap the classes of every owner in a live object graph, at type
    /// granularity. Inherited operations are wrapped once, on the
    /// descriptor that declares them.
    pub fn attach_object_graph_classes(
        &self,
        root: &Arc<dyn Estimator>,
    ) -> Result<(), InterceptorError> {
        self.attach_object_graph_classes_with(root, self.config.clone())
    }

    /// [`attach_object_graph_classes`](Self::attach_object_graph_classes)
    /// with a per-call config.
    pub fn attach_object_graph_classes_with(
        &self,
        root: &Arc<dyn Estimator>,
        config: Config,
    ) -> Result<(), InterceptorError> {
        self.attach_candidates(&self.graph_class_candidates(root), &config)
    }

    /// Strip this instrumentor's layers from the classes of every owner
    /// in a live object graph.
    pub fn detach_object_graph_classes(
        &self,
        root: &Arc<dyn Estimator>,
    ) -> Result<(), InterceptorError> {
        self.detach_candidates(&self.graph_class_candidates(root))
    }

    /// Wrap the given type descriptors directly, at type granularity.
    pub fn attach_types(
        &self,
        descriptors: &[Arc<TypeDescriptor>],
    ) -> Result<(), InterceptorError> {
        self.attach_types_with(descriptors, self.config.clone())
    }

    /// [`attach_types`](Self::attach_types) with a per-call config.
    pub fn attach_types_with(
        &self,
        descriptors: &[Arc<TypeDescriptor>],
        config: Config,
    ) -> Result<(), InterceptorError> {
        self.attach_candidates(
            &discover_classes(descriptors, &self.operations, &self.policy),
            &config,
        )
    }

    /// Strip this instrumentor's layers from the given type
    /// descriptors.
    pub fn detach_types(
        &self,
        descriptors: &[Arc<TypeDescriptor>],
    ) -> Result<(), InterceptorError> {
        self.detach_candidates(&discover_classes(descriptors, &self.operations, &self.policy))
    }

    /// Wrap every type registered under the named namespace paths.
    /// Paths that do not resolve against the configured registry are
    /// logged and skipped.
    pub fn attach_namespaces(&self, paths: &[&str]) -> Result<(), InterceptorError> {
        self.attach_namespaces_with(paths, self.config.clone())
    }

    /// [`attach_namespaces`](Self::attach_namespaces) with a per-call
    /// config.
    pub fn attach_namespaces_with(
        &self,
        paths: &[&str],
        config: Config,
    ) -> Result<(), InterceptorError> {
        self.attach_candidates(&self.namespace_candidates(paths), &config)
    }

    /// Strip this instrumentor's layers from every type registered
    /// under the named namespace paths.
    pub fn detach_namespaces(&self, paths: &[&str]) -> Result<(), InterceptorError> {
        self.detach_candidates(&self.namespace_candidates(paths))
    }

    /// Whether this instrumentor currently has a layer on the named
    /// operation of the given target.
    pub fn is_attached(&self, target: &Target, op_name: &str) -> bool {
        target.bindings().has_layer_of(op_name, &self.id)
    }

    fn graph_class_candidates(&self, root: &Arc<dyn Estimator>) -> Vec<Candidate> {
        let mut descriptors: Vec<Arc<TypeDescriptor>> = Vec::new();
        for candidate in discover_instances(root, &self.operations, &self.policy) {
            let descriptor = candidate.target.descriptor();
            if !descriptors
                .iter()
                .any(|d| Arc::ptr_eq(d, &descriptor))
            {
                descriptors.push(descriptor);
            }
        }
        discover_classes(&descriptors, &self.operations, &self.policy)
    }

    fn namespace_candidates(&self, paths: &[&str]) -> Vec<Candidate> {
        let Some(root) = self.namespace_root.as_ref() else {
            warn!("no namespace registry configured, nothing to do");
            return Vec::new();
        };
        let mut out = Vec::new();
        for path in paths {
            match root.resolve(path) {
                Some(node) => {
                    out.extend(discover_namespace(node, &self.operations, &self.policy));
                }
                None => warn!(path = %path, "namespace path did not resolve, skipping"),
            }
        }
        out
    }

    fn attach_candidates(
        &self,
        candidates: &[Candidate],
        config: &Config,
    ) -> Result<(), InterceptorError> {
        for candidate in candidates {
            let table = candidate.target.bindings();
            if table.has_layer_of(&candidate.op_name, &self.id) {
                debug!(
                    target = %candidate.target.type_name(),
                    operation = %candidate.op_name,
                    "already attached, skipping"
                );
                continue;
            }
            let Some(current) = candidate.target.operation(&candidate.op_name) else {
                continue;
            };
            // An instance resolving through a class this instrumentor
            // already wrapped: wrapping again would double-count.
            if current.instrumented_by() == Some(&self.id) {
                debug!(
                    target = %candidate.target.type_name(),
                    operation = %candidate.op_name,
                    "resolves to an operation this instrumentor already wrapped, skipping"
                );
                continue;
            }
            let layer = layer_of(&self.id, &self.interceptor, config);
            let wrapped = compose(&candidate.target, &current, &layer)?;
            table.push_layer(&current, layer, wrapped);
            debug!(
                target = %candidate.target.type_name(),
                operation = %candidate.op_name,
                instrumentor = %self.id,
                "attached"
            );
        }
        Ok(())
    }

    fn detach_candidates(&self, candidates: &[Candidate]) -> Result<(), InterceptorError> {
        for candidate in candidates {
            let table = candidate.target.bindings();
            match table.strip_layers_of(&candidate.op_name, &self.id) {
                None => {}
                Some(stetho_core::Detached::Restored) => {
                    debug!(
                        target = %candidate.target.type_name(),
                        operation = %candidate.op_name,
                        instrumentor = %self.id,
                        "detached, original restored"
                    );
                }
                Some(stetho_core::Detached::Recompose {
                    remaining,
                    original,
                }) => {
                    let rebuilt = recompose(&candidate.target, &original, &remaining)?;
                    table.install(&candidate.op_name, rebuilt);
                    debug!(
                        target = %candidate.target.type_name(),
                        operation = %candidate.op_name,
                        instrumentor = %self.id,
                        layers_remaining = remaining.len(),
                        "detached, remaining layers recomposed"
                    );
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Instrumentor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentor")
            .field("id", &self.id)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}
