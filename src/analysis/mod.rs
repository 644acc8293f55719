// Analysis over extracted structure and language-agnostic inputs
//
// Relationship resolution for class diagrams, participant and layer
// classification tables, and the listing/manifest/import analyzers behind
// package and component diagrams.

pub mod components;
pub mod imports;
pub mod layers;
pub mod listing;
pub mod manifest;
pub mod packages;
pub mod relationships;
pub mod roles;

pub use components::{component_kind, ComponentAnalyzer, DEFAULT_EXCLUDES};
pub use imports::{extract_imports, package_of_import};
pub use listing::{classify, InputShape};
pub use manifest::{ManifestCaps, Registry as ManifestRegistry};
pub use packages::PackageAnalyzer;
pub use relationships::{class_model, resolve};

use serde::{Deserialize, Serialize};

/// Tunables for package and component analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Dependency caps per manifest
    pub caps: ManifestCaps,
    /// Component names containing any of these are dropped
    pub exclude_keywords: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            caps: ManifestCaps::default(),
            exclude_keywords: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AnalysisOptions {
    pub fn package_analyzer(&self) -> PackageAnalyzer {
        PackageAnalyzer::new().with_caps(self.caps)
    }

    pub fn component_analyzer(&self) -> ComponentAnalyzer {
        ComponentAnalyzer::new()
            .with_caps(self.caps)
            .with_excludes(self.exclude_keywords.iter().cloned())
    }
}
