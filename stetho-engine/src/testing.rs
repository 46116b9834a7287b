//! Assertion helpers for instrumentation tests.
//!
//! Enabled by the `test-utils` feature. The asserter re-discovers the
//! same candidates attach would and checks each one's ledger state, so
//! a test can claim "fully attached" or "fully detached" in one line
//! instead of spelling out the walk.

use std::sync::Arc;

use stetho_core::{Estimator, TypeDescriptor};

use crate::discover::{Candidate, discover_classes, discover_instances};
use crate::instrumentor::Instrumentor;

/// Asserts that an instrumentor's layers are present on, or absent
/// from, every wrappable operation of a graph or class set.
///
/// Methods panic with a descriptive message on the first violation —
/// test-only semantics, like any assertion helper.
pub struct InstrumentationAsserter<'a> {
    instrumentor: &'a Instrumentor,
}

impl<'a> InstrumentationAsserter<'a> {
    /// Build an asserter for one instrumentor.
    pub fn new(instrumentor: &'a Instrumentor) -> Self {
        Self { instrumentor }
    }

    /// Every wrappable operation in the graph carries this
    /// instrumentor's layer, at instance granularity.
    pub fn assert_attached_object_graph(&self, root: &Arc<dyn Estimator>) {
        self.assert_all(&self.instance_candidates(root), true);
    }

    /// No wrappable operation in the graph carries this instrumentor's
    /// layer.
    pub fn assert_detached_object_graph(&self, root: &Arc<dyn Estimator>) {
        self.assert_all(&self.instance_candidates(root), false);
    }

    /// Every wrappable operation across the graph's classes carries
    /// this instrumentor's layer, on its definer.
    pub fn assert_attached_object_graph_classes(&self, root: &Arc<dyn Estimator>) {
        self.assert_all(&self.class_candidates(root), true);
    }

    /// No wrappable operation across the graph's classes carries this
    /// instrumentor's layer.
    pub fn assert_detached_object_graph_classes(&self, root: &Arc<dyn Estimator>) {
        self.assert_all(&self.class_candidates(root), false);
    }

    fn instance_candidates(&self, root: &Arc<dyn Estimator>) -> Vec<Candidate> {
        discover_instances(
            root,
            self.instrumentor.operations(),
            self.instrumentor.policy(),
        )
    }

    fn class_candidates(&self, root: &Arc<dyn Estimator>) -> Vec<Candidate> {
        let mut descriptors: Vec<Arc<TypeDescriptor>> = Vec::new();
        for candidate in self.instance_candidates(root) {
            let descriptor = candidate.target.descriptor();
            if !descriptors.iter().any(|d| Arc::ptr_eq(d, &descriptor)) {
                descriptors.push(descriptor);
            }
        }
        discover_classes(
            &descriptors,
            self.instrumentor.operations(),
            self.instrumentor.policy(),
        )
    }

    fn assert_all(&self, candidates: &[Candidate], expect_attached: bool) {
        for candidate in candidates {
            let attached = self
                .instrumentor
                .is_attached(&candidate.target, &candidate.op_name);
            assert_eq!(
                attached,
                expect_attached,
                "{}.{} expected {} by instrumentor {}",
                candidate.target.type_name(),
                candidate.op_name,
                if expect_attached { "attached" } else { "detached" },
                self.instrumentor.id(),
            );
        }
    }
}
