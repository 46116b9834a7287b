//! Layer composition — building replacement operations from interceptors.
//!
//! Every wrapped operation in the system goes through [`compose`]: it
//! applies one interceptor and then re-stamps the result with the inner
//! operation's identity and the installing instrumentor's marker.
//! [`recompose`] rebuilds a slot's current binding from its original
//! plus a surviving layer list, which is how detaching a middle layer
//! leaves the others behaving as if it was never there.

use stetho_core::{InstrumentorId, InterceptorError, Layer, Operation, Target};

/// Wrap `op` with one interceptor layer on behalf of `id`.
///
/// The replacement keeps the inner operation's name, qualified name,
/// and origin, and carries `id` as its instrumentor marker.
pub fn compose(
    target: &Target,
    op: &Operation,
    layer: &Layer,
) -> Result<Operation, InterceptorError> {
    let wrapped = layer.interceptor.wrap(target, op, &layer.config)?;
    Ok(wrapped
        .with_identity_of(op)
        .marked(layer.instrumentor.clone()))
}

/// Rebuild the composition of `layers` over `original`, innermost
/// first.
pub fn recompose(
    target: &Target,
    original: &Operation,
    layers: &[Layer],
) -> Result<Operation, InterceptorError> {
    let mut current = original.clone();
    for layer in layers {
        current = compose(target, &current, layer)?;
    }
    Ok(current)
}

/// Build a layer record for `id` from its interceptor and config.
pub(crate) fn layer_of(
    id: &InstrumentorId,
    interceptor: &std::sync::Arc<dyn stetho_core::Interceptor>,
    config: &stetho_core::Config,
) -> Layer {
    Layer {
        instrumentor: id.clone(),
        interceptor: std::sync::Arc::clone(interceptor),
        config: config.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stetho_core::test_utils::{CountingInterceptor, ModelTypes, PlainEstimator};
    use stetho_core::{Call, Config, Estimator, Interceptor, Origin};
    use serde_json::json;

    fn fixture() -> (Target, Operation) {
        let types = ModelTypes::new();
        let est = PlainEstimator::leaf(&types.standard_scaler);
        let op = est.operation("fit").unwrap();
        (Target::Instance(est as Arc<dyn Estimator>), op)
    }

    #[test]
    fn compose_keeps_identity_and_marks() {
        let (target, op) = fixture();
        let layer = layer_of(
            &InstrumentorId::new("timer"),
            &(Arc::new(CountingInterceptor::new()) as Arc<dyn Interceptor>),
            &Config::new(),
        );
        let wrapped = compose(&target, &op, &layer).unwrap();
        assert_eq!(wrapped.name(), "fit");
        assert_eq!(wrapped.qualname(), "StandardScaler.fit");
        assert_eq!(wrapped.origin(), Origin::Declared);
        assert_eq!(wrapped.instrumented_by().unwrap().as_str(), "timer");
    }

    #[test]
    fn recompose_applies_innermost_first() {
        let (target, op) = fixture();
        let counter_a = CountingInterceptor::new();
        let counter_b = CountingInterceptor::new();
        let layers = vec![
            layer_of(
                &InstrumentorId::new("a"),
                &(Arc::new(counter_a.clone()) as Arc<dyn Interceptor>),
                &Config::new(),
            ),
            layer_of(
                &InstrumentorId::new("b"),
                &(Arc::new(counter_b.clone()) as Arc<dyn Interceptor>),
                &Config::new(),
            ),
        ];
        let rebuilt = recompose(&target, &op, &layers).unwrap();
        // outermost layer's marker wins
        assert_eq!(rebuilt.instrumented_by().unwrap().as_str(), "b");
        assert_eq!(rebuilt.invoke(&Call::new()).unwrap(), json!(null));
        assert_eq!(counter_a.count("StandardScaler.fit"), 1);
        assert_eq!(counter_b.count("StandardScaler.fit"), 1);
    }
}
