//! Operation bindings and the wrap ledger.
//!
//! A [`BindingTable`] owns the operations of one owner (an instance or
//! a type descriptor). Each slot tracks the operation currently bound,
//! the true original, and the ordered stack of interceptor layers
//! applied over that original — outermost last. Keeping the layer
//! stack with the owner (rather than inside any one instrumentor)
//! means every instrumentor sees every layer, which is what makes
//! removal by identity order-independent.
//!
//! The table never discards an original while layers referencing it
//! remain recorded, so any subset of layers can be stripped and the
//! remainder faithfully recomposed.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::id::InstrumentorId;
use crate::interceptor::{Config, Interceptor};
use crate::operation::Operation;

/// One installed interceptor layer.
///
/// An explicit record of (instrumentor identity, interceptor, config) —
/// not an opaque nested closure — so removing an arbitrary middle layer
/// is a data-structure operation.
#[derive(Clone)]
pub struct Layer {
    /// Identity of the instrumentor that installed this layer.
    pub instrumentor: InstrumentorId,
    /// The interceptor to re-apply when recomposing.
    pub interceptor: Arc<dyn Interceptor>,
    /// Config supplied at attach time, distinct per target.
    pub config: Config,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("instrumentor", &self.instrumentor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Outcome of stripping one instrumentor's layers from a slot.
#[derive(Debug)]
pub enum Detached {
    /// The stripped layers were the last ones. The slot was restored:
    /// a declared slot rebinds its original, an override slot created
    /// by wrapping is dropped entirely (class lookup resumes).
    Restored,
    /// Other instrumentors' layers remain. The caller must recompose
    /// `remaining` innermost-first onto `original` and install the
    /// result.
    Recompose {
        /// Layers still installed, in application order.
        remaining: Vec<Layer>,
        /// The true original operation.
        original: Operation,
    },
}

struct Slot {
    original: Operation,
    current: Operation,
    layers: Vec<Layer>,
    /// False for override slots the wrap path created over an operation
    /// resolved from elsewhere (the descriptor chain). Those are
    /// removed, not restored, when the last layer goes.
    declared: bool,
}

/// The operations of one owner, keyed by declared name.
///
/// Interior mutability via `RwLock`: installs happen in the externally
/// serialized instrumentation setup phase, reads happen on the call
/// path. Lock poisoning is absorbed — a panic mid-install in a
/// single-threaded setup phase leaves nothing torn.
#[derive(Default)]
pub struct BindingTable {
    slots: RwLock<HashMap<String, Slot>>,
}

impl BindingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an operation, keyed by its declared name. Overwrites any
    /// existing slot of the same name, dropping its layers.
    pub fn declare(&self, op: Operation) {
        let mut slots = self.write();
        slots.insert(
            op.name().to_owned(),
            Slot {
                original: op.clone(),
                current: op,
                layers: Vec::new(),
                declared: true,
            },
        );
    }

    /// Whether a slot exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Names of all slots, sorted. Deterministic for discovery.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// The operation currently bound under `name` — the composition of
    /// every installed layer over the original.
    pub fn get_current(&self, name: &str) -> Option<Operation> {
        self.read().get(name).map(|s| s.current.clone())
    }

    /// The true original under `name`, untouched by any layer.
    pub fn get_original(&self, name: &str) -> Option<Operation> {
        self.read().get(name).map(|s| s.original.clone())
    }

    /// Rebind `name` to `op` without touching the layer record. Used by
    /// the engine after recomposition. Returns false if no slot exists.
    pub fn install(&self, name: &str, op: Operation) -> bool {
        let mut slots = self.write();
        match slots.get_mut(name) {
            Some(slot) => {
                slot.current = op;
                true
            }
            None => false,
        }
    }

    /// Rebind `name` to its original and forget all layers. The manual
    /// full reset; the engine's detach path goes through
    /// [`strip_layers_of`](Self::strip_layers_of) instead.
    pub fn restore_original(&self, name: &str) -> bool {
        let mut slots = self.write();
        match slots.get_mut(name) {
            Some(slot) => {
                slot.current = slot.original.clone();
                slot.layers.clear();
                true
            }
            None => false,
        }
    }

    /// Remove the slot under `name` entirely.
    pub fn remove(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    /// Record a layer and rebind in one step.
    ///
    /// If no slot exists under the operation's name, an override slot
    /// is created with `original` as its original — this is the only
    /// write of the original for that slot; later layers never touch
    /// it (first write wins). The original is recorded before the
    /// wrapper becomes visible, so no owner is ever bound to a wrapper
    /// whose original went unrecorded.
    pub fn push_layer(&self, original: &Operation, layer: Layer, wrapped: Operation) {
        let mut slots = self.write();
        match slots.get_mut(wrapped.name()) {
            Some(slot) => {
                slot.layers.push(layer);
                slot.current = wrapped;
            }
            None => {
                slots.insert(
                    wrapped.name().to_owned(),
                    Slot {
                        original: original.clone(),
                        current: wrapped,
                        layers: vec![layer],
                        declared: false,
                    },
                );
            }
        }
    }

    /// Whether any layer under `name` belongs to `id`. The idempotency
    /// check: the engine skips re-wrapping a target it already wrapped.
    pub fn has_layer_of(&self, name: &str, id: &InstrumentorId) -> bool {
        self.read()
            .get(name)
            .is_some_and(|s| s.layers.iter().any(|l| l.instrumentor == *id))
    }

    /// Snapshot of the layers under `name`, in application order.
    pub fn layers_for(&self, name: &str) -> Vec<Layer> {
        self.read()
            .get(name)
            .map(|s| s.layers.clone())
            .unwrap_or_default()
    }

    /// Number of layers under `name`.
    pub fn layer_count(&self, name: &str) -> usize {
        self.read().get(name).map_or(0, |s| s.layers.len())
    }

    /// Strip every layer belonging to `id` from the slot under `name`.
    ///
    /// A single instrumentor may have layered the same target through
    /// multiple attach calls with different configs; all of its layers
    /// go together, regardless of stack position. Returns `None` when
    /// there is no slot or no matching layer (detaching defensively is
    /// a no-op). When the last layers go, the slot restores itself; a
    /// wrap-created override slot is deleted instead, so resolution
    /// falls back to wherever the operation originally came from.
    pub fn strip_layers_of(&self, name: &str, id: &InstrumentorId) -> Option<Detached> {
        let mut slots = self.write();
        let slot = slots.get_mut(name)?;
        let before = slot.layers.len();
        slot.layers.retain(|l| l.instrumentor != *id);
        if slot.layers.len() == before {
            return None;
        }
        if slot.layers.is_empty() {
            if slot.declared {
                slot.current = slot.original.clone();
            } else {
                slots.remove(name);
            }
            Some(Detached::Restored)
        } else {
            Some(Detached::Recompose {
                remaining: slot.layers.clone(),
                original: slot.original.clone(),
            })
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Slot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingTable")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::interceptor_fn;
    use crate::operation::Call;
    use serde_json::json;

    fn op(name: &str, value: i64) -> Operation {
        Operation::new(name, format!("Fixture.{name}"), move |_| Ok(json!(value)))
    }

    fn layer(id: &str) -> Layer {
        Layer {
            instrumentor: InstrumentorId::new(id),
            interceptor: Arc::new(interceptor_fn(|_, op, _| {
                let inner = op.clone();
                Ok(op.derived(move |call| inner.invoke(call)))
            })),
            config: Config::new(),
        }
    }

    #[test]
    fn declare_then_get() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        assert!(table.contains("fit"));
        assert_eq!(
            table.get_current("fit").unwrap().invoke(&Call::new()).unwrap(),
            json!(1)
        );
    }

    #[test]
    fn push_layer_rebinds_and_records() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        let original = table.get_current("fit").unwrap();
        table.push_layer(&original, layer("a"), op("fit", 2));

        assert_eq!(table.layer_count("fit"), 1);
        assert!(table.has_layer_of("fit", &InstrumentorId::new("a")));
        assert_eq!(
            table.get_current("fit").unwrap().invoke(&Call::new()).unwrap(),
            json!(2)
        );
        // first write wins: original untouched
        assert_eq!(
            table.get_original("fit").unwrap().invoke(&Call::new()).unwrap(),
            json!(1)
        );
    }

    #[test]
    fn strip_last_layer_restores_declared_slot() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        let original = table.get_current("fit").unwrap();
        table.push_layer(&original, layer("a"), op("fit", 2));

        let outcome = table.strip_layers_of("fit", &InstrumentorId::new("a"));
        assert!(matches!(outcome, Some(Detached::Restored)));
        assert_eq!(
            table.get_current("fit").unwrap().invoke(&Call::new()).unwrap(),
            json!(1)
        );
        assert_eq!(table.layer_count("fit"), 0);
    }

    #[test]
    fn strip_last_layer_drops_override_slot() {
        let table = BindingTable::new();
        // no declare: push_layer creates an override slot
        let original = op("fit", 1);
        table.push_layer(&original, layer("a"), op("fit", 2));
        assert!(table.contains("fit"));

        let outcome = table.strip_layers_of("fit", &InstrumentorId::new("a"));
        assert!(matches!(outcome, Some(Detached::Restored)));
        assert!(!table.contains("fit"));
    }

    #[test]
    fn strip_middle_layer_requests_recompose() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        let original = table.get_current("fit").unwrap();
        table.push_layer(&original, layer("a"), op("fit", 2));
        let current = table.get_current("fit").unwrap();
        table.push_layer(&current, layer("b"), op("fit", 3));

        let outcome = table.strip_layers_of("fit", &InstrumentorId::new("a"));
        match outcome {
            Some(Detached::Recompose {
                remaining,
                original,
            }) => {
                assert_eq!(remaining.len(), 1);
                assert_eq!(remaining[0].instrumentor.as_str(), "b");
                assert_eq!(original.invoke(&Call::new()).unwrap(), json!(1));
            }
            other => panic!("expected Recompose, got {other:?}"),
        }
    }

    #[test]
    fn strip_unknown_instrumentor_is_noop() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        assert!(
            table
                .strip_layers_of("fit", &InstrumentorId::new("nobody"))
                .is_none()
        );
        assert!(table.strip_layers_of("missing", &InstrumentorId::new("a")).is_none());
    }

    #[test]
    fn strip_removes_all_layers_of_one_instrumentor() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        let original = table.get_current("fit").unwrap();
        table.push_layer(&original, layer("a"), op("fit", 2));
        let c1 = table.get_current("fit").unwrap();
        table.push_layer(&c1, layer("b"), op("fit", 3));
        let c2 = table.get_current("fit").unwrap();
        table.push_layer(&c2, layer("a"), op("fit", 4));

        match table.strip_layers_of("fit", &InstrumentorId::new("a")) {
            Some(Detached::Recompose { remaining, .. }) => {
                assert_eq!(remaining.len(), 1);
                assert_eq!(remaining[0].instrumentor.as_str(), "b");
            }
            other => panic!("expected Recompose, got {other:?}"),
        }
    }

    #[test]
    fn restore_original_clears_layers() {
        let table = BindingTable::new();
        table.declare(op("fit", 1));
        let original = table.get_current("fit").unwrap();
        table.push_layer(&original, layer("a"), op("fit", 2));

        assert!(table.restore_original("fit"));
        assert_eq!(table.layer_count("fit"), 0);
        assert_eq!(
            table.get_current("fit").unwrap().invoke(&Call::new()).unwrap(),
            json!(1)
        );
    }
}
