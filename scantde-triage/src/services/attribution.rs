//! Feature-attribution export
//!
//! Writes one JSON file per scored candidate and variant:
//! `<root>/<variant>/<name>.json`. The root is per night and selection, see
//! [`crate::cache::CachePaths::attribution_dir`].

use crate::error::TriageResult;
use crate::services::classifier_invoker::{AttributionSink, FeatureAttribution};
use scantde_common::config::ensure_directory;
use std::path::{Path, PathBuf};

/// Attribution sink writing pretty-printed JSON files
#[derive(Debug, Clone)]
pub struct JsonAttributionSink {
    root: PathBuf,
}

impl JsonAttributionSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, variant: &str, name: &str) -> PathBuf {
        self.root.join(variant).join(format!("{}.json", name))
    }
}

impl AttributionSink for JsonAttributionSink {
    fn write(&self, attribution: &FeatureAttribution) -> TriageResult<()> {
        let path = self.path_for(&attribution.variant, &attribution.name);
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(attribution)?)?;
        Ok(())
    }
}
