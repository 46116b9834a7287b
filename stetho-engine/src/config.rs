//! Default attachment configuration.

/// By default, instrument these operations on all estimators: the
/// fit/predict/transform family and their internal variants.
pub const DEFAULT_OPERATIONS: &[&str] = &[
    "_fit",
    "_predict",
    "_predict_proba",
    "_transform",
    "fit",
    "predict",
    "predict_proba",
    "transform",
];

/// By default, exclude subtypes of these base types from
/// instrumentation. Decision-tree internals are a forest of homogeneous
/// sub-estimators inside deeply nested loops; per-node wrapping there
/// is noise, not signal. Enumerated and raw byte-sequence values are
/// excluded structurally — the walker treats them as opaque leaves.
pub const DEFAULT_EXCLUDE: &[&str] = &["BaseDecisionTree"];
