// Component extraction
//
// Listings become one component per relevant file or directory, grouped by
// package. Manifests become library components. Source text contributes its
// classes, interfaces and functions, with imports as dependencies.

use super::imports::{extract_imports, is_external_package, package_of_import};
use super::layers::file_package;
use super::listing::{classify, is_content_line, is_relevant, parse_path, split_bundle, InputShape};
use super::manifest::{self, ManifestCaps};
use crate::model::{ComponentKind, ComponentModel, ComponentNode, Dependency, DependencyKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Component names containing any of these are dropped
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "PropertyGroup", "ItemGroup", "Reference", "HintPath", "DefineConstants", "ErrorReport",
    "WarningLevel", "DebugType", "VisualStudio", "ProjectExtensions", "SchemaVersion",
    "NuGetPackageImportStamp", "DependentUpon", "UseIIS", "AutoAssignPort", "DevelopmentServerPort",
    "DevelopmentServerVPath", "IISUrl", "NTLMAuthentication", "UseCustomServer",
    "SaveServerSettingsInUserFile", "ProjectGuid", "ProjectTypeGuids", "OutputType",
    "AppDesignerFolder", "RootNamespace", "AssemblyName", "UseIISExpress", "IISExpressSSLPort",
    "UseGlobalApplicationHostFile", "DebugSymbols", "OutputPath",
];

const KIND_RULES: &[(&[&str], ComponentKind)] = &[
    (&["service"], ComponentKind::Service),
    (&["api"], ComponentKind::Api),
    (&["controller"], ComponentKind::Controller),
    (&["handler"], ComponentKind::Handler),
    (&["model", "entity"], ComponentKind::Entity),
    (&["repository", "dao"], ComponentKind::Repository),
    (&["database"], ComponentKind::Database),
    (&["view", "component", "page", "form"], ComponentKind::Ui),
    (&["config", "settings"], ComponentKind::Configuration),
    (&["util", "helper", "tool"], ComponentKind::Utility),
];

const EXTENSION_KINDS: &[(&[&str], ComponentKind)] = &[
    (&["js", "jsx", "ts", "tsx", "py", "php", "go", "rs", "vue"], ComponentKind::Module),
    (&["java", "cs", "cpp", "c", "h"], ComponentKind::Class),
    (&["html", "cshtml", "aspx"], ComponentKind::Ui),
    (&["css"], ComponentKind::Style),
    (&["json", "xml", "yml", "yaml"], ComponentKind::Configuration),
];

/// Kind of a component by name keyword, then by extension
pub fn component_kind(filename: &str) -> ComponentKind {
    let lower = filename.to_lowercase();
    if let Some((_, kind)) = KIND_RULES.iter().find(|(keys, _)| keys.iter().any(|k| lower.contains(k))) {
        return *kind;
    }
    match lower.rsplit_once('.') {
        Some((_, ext)) => EXTENSION_KINDS
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map_or(ComponentKind::Component, |(_, kind)| *kind),
        None => ComponentKind::Directory,
    }
}

static CODE_COMPONENTS: Lazy<Vec<(Regex, ComponentKind)>> = Lazy::new(|| {
    [
        (r"\b(?:class|struct|record)\s+([A-Za-z_]\w*)", ComponentKind::Class),
        (r"\b(?:interface|trait|protocol)\s+([A-Za-z_]\w*)", ComponentKind::Interface),
        (r"(?m)^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)", ComponentKind::Function),
        (r"\bfunction\s+([A-Za-z_$][\w$]*)", ComponentKind::Function),
    ]
    .iter()
    .map(|(p, kind)| (Regex::new(p).unwrap(), *kind))
    .collect()
});

/// Extracts a component model from language-agnostic input
#[derive(Debug, Clone)]
pub struct ComponentAnalyzer {
    caps: ManifestCaps,
    excludes: Vec<String>,
}

impl Default for ComponentAnalyzer {
    fn default() -> Self {
        Self {
            caps: ManifestCaps::default(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ComponentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caps(mut self, caps: ManifestCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Replace the exclude keywords
    pub fn with_excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = excludes.into_iter().map(Into::into).collect();
        self
    }

    fn excluded(&self, name: &str) -> bool {
        self.excludes.iter().any(|k| !k.is_empty() && name.contains(k.as_str()))
    }

    pub fn analyze(&self, text: &str) -> ComponentModel {
        let mut builder = ComponentBuilder::default();
        let shape = classify(text);
        debug!(?shape, "component input classified");

        match shape {
            InputShape::Listing => {
                for line in text.lines().filter(|l| !l.trim().is_empty() && !is_content_line(l)) {
                    let Some(mut entry) = parse_path(line) else {
                        continue;
                    };
                    let leaf = match entry.file.take() {
                        Some(file) => file,
                        None => match entry.packages.pop() {
                            Some(dir) => dir,
                            None => continue,
                        },
                    };
                    if !is_relevant(&leaf) {
                        continue;
                    }
                    let name = leaf.rsplit_once('.').map_or(leaf.as_str(), |(stem, _)| stem);
                    let package = if entry.packages.is_empty() {
                        "root".to_string()
                    } else {
                        entry.package()
                    };
                    builder.add(name, &package, component_kind(&leaf));
                }
            }
            InputShape::Manifest => {
                if let Some(registry) = manifest::detect(text) {
                    for dep in manifest::dependencies(text, registry, self.caps) {
                        builder.add(&dep, registry.component_group(), ComponentKind::ExternalLibrary);
                    }
                }
            }
            InputShape::Bundle => {
                for (filename, body) in split_bundle(text) {
                    let leaf = filename.rsplit(['/', '\\']).next().unwrap_or(&filename);
                    let name = leaf.rsplit_once('.').map_or(leaf, |(stem, _)| stem);
                    builder.add(name, &file_package(&filename), component_kind(leaf));
                    builder.add_imports(name, &body);
                }
            }
            InputShape::Source => {
                for (re, kind) in CODE_COMPONENTS.iter() {
                    for caps in re.captures_iter(text) {
                        builder.add(&caps[1], "code", *kind);
                    }
                }
                if !extract_imports(text).is_empty() {
                    builder.add("Main", "code", ComponentKind::Module);
                    builder.add_imports("Main", text);
                }
            }
        }
        builder.finish(|name| self.excluded(name))
    }
}

#[derive(Default)]
struct ComponentBuilder {
    components: Vec<ComponentNode>,
    seen: HashSet<(String, String)>,
    dependencies: Vec<Dependency>,
}

impl ComponentBuilder {
    fn add(&mut self, name: &str, package: &str, kind: ComponentKind) {
        if self.seen.insert((package.to_string(), name.to_string())) {
            self.components.push(ComponentNode {
                name: name.to_string(),
                package: package.to_string(),
                kind,
            });
        }
    }

    /// Import targets become library or module components
    fn add_imports(&mut self, from: &str, code: &str) {
        for import in extract_imports(code) {
            let package = package_of_import(&import);
            let external = is_external_package(&package);
            let (name, group, kind) = if external {
                (import.as_str(), "external", ComponentKind::ExternalLibrary)
            } else {
                (import.as_str(), "imports", ComponentKind::Module)
            };
            if name == from {
                continue;
            }
            self.add(name, group, kind);
            self.dependencies.push(Dependency {
                from: from.to_string(),
                to: name.to_string(),
                kind: DependencyKind::Uses,
                external,
            });
        }
    }

    fn finish(self, excluded: impl Fn(&str) -> bool) -> ComponentModel {
        ComponentModel {
            components: self.components.into_iter().filter(|c| !excluded(&c.name)).collect(),
            dependencies: self
                .dependencies
                .into_iter()
                .filter(|d| !excluded(&d.from) && !excluded(&d.to))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("OrderService.java", ComponentKind::Service)]
    #[case("UserController.cs", ComponentKind::Controller)]
    #[case("Order.java", ComponentKind::Class)]
    #[case("index.js", ComponentKind::Module)]
    #[case("site.css", ComponentKind::Style)]
    #[case("README.md", ComponentKind::Component)]
    #[case("models", ComponentKind::Entity)]
    #[case("src", ComponentKind::Directory)]
    fn test_component_kind(#[case] name: &str, #[case] expected: ComponentKind) {
        assert_eq!(component_kind(name), expected);
    }

    #[test]
    fn test_listing_groups_by_package() {
        let model = ComponentAnalyzer::new().analyze("src/services/OrderService.java\nsrc/models/Order.java\n");
        let found: Vec<_> = model
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.package.as_str(), c.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("OrderService", "src.services", ComponentKind::Service),
                ("Order", "src.models", ComponentKind::Class),
            ]
        );
        assert!(model.dependencies.is_empty());
    }

    #[test]
    fn test_listing_filters_project_noise() {
        let text = "<ItemGroup>\nApp/Web.csproj\nApp/Controllers/HomeController.cs\n│   ├───\nApp/.gitignore\n";
        let model = ComponentAnalyzer::new().analyze(text);
        let names: Vec<_> = model.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["HomeController"]);
    }

    #[test]
    fn test_manifest_libraries() {
        let model = ComponentAnalyzer::new().analyze(r#"{"dependencies": {"express": "^4", "pg": "^8"}}"#);
        assert_eq!(model.components.len(), 2);
        assert!(model
            .components
            .iter()
            .all(|c| c.kind == ComponentKind::ExternalLibrary && c.package == "node_modules"));
    }

    #[test]
    fn test_source_components_and_imports() {
        let code = "import java.util.List;\npublic interface Repo {}\npublic class OrderService {}\n";
        let model = ComponentAnalyzer::new().analyze(code);
        let names: Vec<_> = model.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["OrderService", "Repo", "Main", "java.util.List"]);
        assert_eq!(model.dependencies[0].from, "Main");
        assert!(model.dependencies[0].external);
    }

    #[test]
    fn test_custom_excludes() {
        let model = ComponentAnalyzer::new()
            .with_excludes(["Legacy"])
            .analyze("src/LegacyService.py\nsrc/NewService.py\n");
        assert_eq!(model.components.len(), 1);
        assert_eq!(model.components[0].name, "NewService");
    }
}
