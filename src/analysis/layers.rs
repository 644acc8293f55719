// Layer and package detection from names
//
// Packages are grouped by architectural layer using common directory and
// file naming patterns.

use crate::model::Layer;

/// Keyword to layer, checked in order against the lowercase short name
const LAYER_RULES: &[(&[&str], Layer)] = &[
    (&["controller", "api", "view", "ui"], Layer::Presentation),
    (&["service", "business", "logic", "application"], Layer::Business),
    (&["model", "entity", "entities", "domain", "core"], Layer::Domain),
    (&["repository", "repositories", "dao", "data", "persistence", "database"], Layer::Data),
    (&["config", "setting", "properties"], Layer::Configuration),
    (&["util", "helper", "tool", "common"], Layer::Utility),
    (&["test", "spec"], Layer::Testing),
    (&["external", "lib", "vendor"], Layer::External),
];

/// Detect the layer of a package from its short name
pub fn layer_of(short_name: &str) -> Layer {
    let lower = short_name.to_lowercase();
    LAYER_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(Layer::Module, |(_, layer)| *layer)
}

/// File-name keyword to package, for files given without a directory
const FILE_PACKAGE_RULES: &[(&[&str], &str)] = &[
    (&["controller", "api"], "controllers"),
    (&["service", "business"], "services"),
    (&["model", "entity", "domain"], "models"),
    (&["repository", "dao", "data"], "repositories"),
    (&["view", "ui", "component"], "views"),
    (&["util", "helper", "tool"], "utils"),
    (&["config", "setting"], "config"),
];

/// Dotted package owning a file: its directory path, else a keyword guess
pub fn file_package(filename: &str) -> String {
    let normalized = filename.trim().replace('\\', "/");
    let normalized = normalized.trim_start_matches("./");
    if let Some((dir, _)) = normalized.rsplit_once('/') {
        let package: Vec<&str> = dir.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
        if !package.is_empty() {
            return package.join(".");
        }
    }
    let stem = normalized.rsplit_once('.').map_or(normalized, |(stem, _)| stem).to_lowercase();
    FILE_PACKAGE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| stem.contains(k)))
        .map_or("main", |(_, package)| *package)
        .to_string()
}
