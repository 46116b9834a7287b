//! End-to-end tests: instruments attached to a real estimator graph.

use std::sync::Arc;

use serde_json::json;

use stetho_core::test_utils::{ModelTypes, classification_model};
use stetho_core::{Call, Config, Estimator, InstrumentorId};
use stetho_engine::{InstrumentationAsserter, Instrumentor};
use stetho_instruments::{CallCounter, Identity, TimeElapsed};

fn fit_call() -> Call {
    Call::new()
        .with("X", json!([1.0, 2.0, 3.0]))
        .with("y", json!([0.0, 1.0, 0.0]))
}

#[test]
fn call_counter_counts_across_a_wrapped_graph() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let types = ModelTypes::new();
    let model = classification_model(&types) as Arc<dyn Estimator>;
    let counter = CallCounter::new();
    let instrumentor =
        Instrumentor::new(Arc::new(counter.clone())).with_id(InstrumentorId::new("counter"));

    instrumentor.attach_object_graph(&model).unwrap();
    let asserter = InstrumentationAsserter::new(&instrumentor);
    asserter.assert_attached_object_graph(&model);

    model.operation("fit").unwrap().invoke(&fit_call()).unwrap();
    assert_eq!(counter.count("Pipeline.fit"), 1);
    assert_eq!(counter.count("FeatureUnion.fit"), 1);
    assert_eq!(counter.count("StandardScaler.fit"), 1);
    // the feed-forward after fitting runs each transform once
    assert_eq!(counter.count("StandardScaler.transform"), 1);

    instrumentor.detach_object_graph(&model).unwrap();
    asserter.assert_detached_object_graph(&model);

    model.operation("fit").unwrap().invoke(&fit_call()).unwrap();
    assert_eq!(counter.count("Pipeline.fit"), 1);
}

#[test]
fn timing_layer_over_counting_layer_is_removable_alone() {
    let types = ModelTypes::new();
    let model = classification_model(&types) as Arc<dyn Estimator>;
    let counter = CallCounter::new();
    let counting =
        Instrumentor::new(Arc::new(counter.clone())).with_id(InstrumentorId::new("counter"));
    let timing = Instrumentor::new(Arc::new(TimeElapsed::new()))
        .with_id(InstrumentorId::new("timer"))
        .with_config(Config::new().with("threshold_ms", json!(250)));

    counting.attach_object_graph(&model).unwrap();
    timing.attach_object_graph(&model).unwrap();

    timing.detach_object_graph(&model).unwrap();
    InstrumentationAsserter::new(&timing).assert_detached_object_graph(&model);
    InstrumentationAsserter::new(&counting).assert_attached_object_graph(&model);

    model.operation("fit").unwrap().invoke(&fit_call()).unwrap();
    assert_eq!(counter.count("Pipeline.fit"), 1);

    counting.detach_object_graph(&model).unwrap();
}

#[test]
fn identity_round_trip_leaves_class_tables_clean() {
    let types = ModelTypes::new();
    let model = classification_model(&types);
    let est = Arc::clone(&model) as Arc<dyn Estimator>;
    let instrumentor =
        Instrumentor::new(Arc::new(Identity::new())).with_id(InstrumentorId::new("identity"));

    instrumentor.attach_object_graph_classes(&est).unwrap();
    InstrumentationAsserter::new(&instrumentor).assert_attached_object_graph_classes(&est);

    est.operation("fit").unwrap().invoke(&fit_call()).unwrap();

    instrumentor.detach_object_graph_classes(&est).unwrap();
    InstrumentationAsserter::new(&instrumentor).assert_detached_object_graph_classes(&est);
    assert_eq!(types.standard_scaler.bindings().layer_count("fit"), 0);
}
