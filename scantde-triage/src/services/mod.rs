//! Pipeline components
//!
//! Leaf-first: stage executor and deduplicator, window selection, classifier
//! invocation, score reduction, quality tagging. The workflow module composes
//! them into one run.

pub mod algorithmic_cuts;
pub mod attribution;
pub mod best_score;
pub mod classifier_invoker;
pub mod cosmology;
pub mod deduplicator;
pub mod lightcurve_fit;
pub mod model_store;
pub mod quality_tagger;
pub mod sky;
pub mod stage_executor;
pub mod window_selector;

pub use attribution::JsonAttributionSink;
pub use best_score::reduce;
pub use classifier_invoker::{
    invoke, AttributionSink, ClassifierModel, ClassifierOutput, FeatureAttribution, ModelStore,
    ScoredRow,
};
pub use deduplicator::deduplicate;
pub use model_store::{JsonModelStore, LogisticModel, StaticModelStore};
pub use quality_tagger::tag;
pub use stage_executor::{apply_predicate, apply_stage, StageOutcome};
pub use window_selector::WindowSelector;
