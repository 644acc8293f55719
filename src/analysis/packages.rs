// Package hierarchy extraction
//
// Builds package nodes from listings, bundles, manifests or a single source
// file, and package dependencies from imports.

use super::imports::{extract_imports, is_external_package, package_of_import};
use super::layers::{file_package, layer_of};
use super::listing::{classify, is_content_line, parse_path, split_bundle, InputShape, PathEntry};
use super::manifest::{self, ManifestCaps};
use crate::model::{Dependency, DependencyKind, Layer, PackageModel, PackageNode};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Extracts a package model from language-agnostic input
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageAnalyzer {
    caps: ManifestCaps,
}

impl PackageAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set manifest dependency caps
    pub fn with_caps(mut self, caps: ManifestCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn analyze(&self, text: &str) -> PackageModel {
        let mut builder = PackageBuilder::default();
        let shape = classify(text);
        debug!(?shape, "package input classified");

        match shape {
            InputShape::Bundle => {
                for (name, body) in split_bundle(text) {
                    builder.add_file(&name, &body);
                }
            }
            InputShape::Listing => {
                for line in text.lines().filter(|l| !l.trim().is_empty() && !is_content_line(l)) {
                    if let Some(entry) = parse_path(line) {
                        builder.add_entry(&entry);
                    }
                }
            }
            InputShape::Manifest => {
                if let Some(registry) = manifest::detect(text) {
                    builder.ensure_node(registry.root());
                    for dep in manifest::dependencies(text, registry, self.caps) {
                        builder.ensure_node(&format!("external.{}", dep));
                    }
                }
            }
            InputShape::Source => builder.add_file("main", text),
        }
        builder.finish()
    }
}

#[derive(Default)]
struct PackageBuilder {
    packages: Vec<PackageNode>,
    index: HashMap<String, usize>,
    edges: Vec<(String, String)>,
    seen_edges: HashSet<(String, String)>,
}

impl PackageBuilder {
    /// Register one node; its parent is recorded by name only
    fn ensure_node(&mut self, qualified: &str) -> usize {
        if let Some(&idx) = self.index.get(qualified) {
            return idx;
        }
        let (parent, short) = match qualified.rsplit_once('.') {
            Some((parent, short)) => (Some(parent.to_string()), short),
            None => (None, qualified),
        };
        let layer = if is_external_package(qualified) {
            Layer::External
        } else {
            layer_of(short)
        };
        let idx = self.packages.len();
        self.packages.push(PackageNode {
            qualified_name: qualified.to_string(),
            short_name: short.to_string(),
            level: qualified.matches('.').count(),
            parent,
            files: Vec::new(),
            layer,
        });
        self.index.insert(qualified.to_string(), idx);
        idx
    }

    /// Register a node and every prefix above it
    fn ensure_path(&mut self, segments: &[String]) -> Option<usize> {
        let mut last = None;
        for depth in 1..=segments.len() {
            last = Some(self.ensure_node(&segments[..depth].join(".")));
        }
        last
    }

    fn add_entry(&mut self, entry: &PathEntry) {
        let Some(idx) = self.ensure_path(&entry.packages) else {
            return;
        };
        if let Some(file) = &entry.file {
            self.packages[idx].files.push(file.clone());
        }
    }

    /// A bundle file: its package plus edges to the packages it imports
    fn add_file(&mut self, filename: &str, code: &str) {
        let package = file_package(filename);
        let segments: Vec<String> = package.split('.').map(str::to_string).collect();
        if let Some(idx) = self.ensure_path(&segments) {
            let leaf = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
            self.packages[idx].files.push(leaf.to_string());
        }

        for import in extract_imports(code) {
            let target = package_of_import(&import);
            if target.is_empty() || target == package {
                continue;
            }
            self.ensure_node(&target);
            let edge = (package.clone(), target);
            if self.seen_edges.insert(edge.clone()) {
                self.edges.push(edge);
            }
        }
    }

    fn finish(self) -> PackageModel {
        let dependencies = self
            .edges
            .into_iter()
            .map(|(from, to)| Dependency {
                external: is_external_package(&to),
                from,
                to,
                kind: DependencyKind::Depends,
            })
            .collect();
        PackageModel {
            packages: self.packages,
            dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(model: &PackageModel) -> Vec<&str> {
        model.packages.iter().map(|p| p.qualified_name.as_str()).collect()
    }

    #[test]
    fn test_listing_builds_hierarchy() {
        let model = PackageAnalyzer::new().analyze("src/services/OrderService.java\nsrc/models/Order.java\n");
        assert_eq!(names(&model), vec!["src", "src.services", "src.models"]);
        let services = model.get("src.services").unwrap();
        assert_eq!(services.parent.as_deref(), Some("src"));
        assert_eq!(services.level, 1);
        assert_eq!(services.files, vec!["OrderService.java"]);
        assert_eq!(services.layer, Layer::Business);
        assert!(model.dependencies.is_empty());
    }

    #[test]
    fn test_listing_is_idempotent() {
        let model = PackageAnalyzer::new().analyze("src/a/x.py\nsrc/a/y.py\nsrc/a/x.py\n");
        assert_eq!(names(&model), vec!["src", "src.a"]);
        assert_eq!(model.get("src.a").unwrap().files, vec!["x.py", "y.py", "x.py"]);
    }

    #[test]
    fn test_bundle_imports_become_dependencies() {
        let text = "---FILE---\napp/api/routes.py\nfrom app.services import orders\nimport flask\n\
                    ---FILE---\napp/services/orders.py\nimport os\n";
        let model = PackageAnalyzer::new().analyze(text);
        let deps: Vec<_> = model
            .dependencies
            .iter()
            .map(|d| (d.from.as_str(), d.to.as_str(), d.external))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("app.api", "app", false),
                ("app.api", "external.flask", true),
                ("app.services", "external.os", true),
            ]
        );
        assert_eq!(model.get("external.flask").unwrap().layer, Layer::External);
    }

    #[test]
    fn test_manifest_registers_external_packages() {
        let model = PackageAnalyzer::new().analyze("flask==2.0\nrequests>=2\n");
        assert_eq!(names(&model), vec!["external.pypi", "external.flask", "external.requests"]);
        assert!(model.has_external());
    }

    #[test]
    fn test_single_source_is_main() {
        let model = PackageAnalyzer::new().analyze("import numpy\nx = 1\n");
        assert_eq!(model.packages[0].qualified_name, "main");
        assert_eq!(model.dependencies[0].to, "numpy");
    }

    #[test]
    fn test_self_edges_dropped() {
        let text = "---FILE---\nutils/a.py\nimport utils\n";
        let model = PackageAnalyzer::new().analyze(text);
        assert!(model.dependencies.is_empty());
    }
}
