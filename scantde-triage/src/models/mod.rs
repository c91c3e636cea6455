//! Data model for the triage pipeline

pub mod candidate;
pub mod features;
pub mod parameters;
pub mod selection;
pub mod variant;
pub mod window;

pub use candidate::{Candidate, CandidateTable, LightcurveFit, QualityFlags, WinningScore};
pub use features::{FeatureRow, FeatureTable};
pub use parameters::TriageParameters;
pub use selection::{SelectionConfig, SelectionVariant};
pub use variant::{ClassifierVariant, ScorePrecedence, VariantKind};
pub use window::MaturityWindow;
