// Package and component diagram rendering
//
// Packages are grouped by architectural layer, components by their package.
// Edges refer to aliases so dotted names never turn into nested namespaces.
// Aliases are unique per document even when names sanitize alike.

use super::{Aliases, RenderOptions};
use crate::model::{ComponentKind, ComponentModel, Dependency, Layer, PackageModel};
use std::collections::{HashMap, HashSet};

const LAYER_ORDER: &[Layer] = &[
    Layer::Presentation,
    Layer::Business,
    Layer::Domain,
    Layer::Data,
    Layer::Configuration,
    Layer::Utility,
    Layer::Testing,
    Layer::Module,
    Layer::External,
];

/// One line per distinct edge, internal edges solid and external ones dashed
fn edges<'a>(
    dependencies: &'a [Dependency],
    mut id: impl FnMut(&'a str) -> String,
    lines: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for dep in dependencies {
        let arrow = if dep.external { "..>" } else { "-->" };
        let line = format!("{} {} {}", id(dep.from.as_str()), arrow, id(dep.to.as_str()));
        if seen.insert(line.clone()) {
            lines.push(line);
        }
    }
}

pub(super) fn render_packages(model: &PackageModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    let mut ids = Aliases::default();
    if options.style {
        lines.push("skinparam packageStyle folder".to_string());
        lines.push("skinparam shadowing false".to_string());
    }

    for layer in LAYER_ORDER {
        let members: Vec<_> = model.packages.iter().filter(|p| p.layer == *layer).collect();
        if members.is_empty() {
            continue;
        }
        lines.push(format!("package \"{}\" {} {{", layer.title(), layer.color()));
        for package in members {
            let alias = ids.issue(&package.qualified_name, &package.qualified_name);
            let external = if package.layer == Layer::External { " <<external>>" } else { "" };
            if package.files.is_empty() {
                lines.push(format!("  package \"{}\" as {}{}", package.qualified_name, alias, external));
                continue;
            }
            lines.push(format!(
                "  package \"{}\" as {}{} {{",
                package.qualified_name, alias, external
            ));
            for file in &package.files {
                let file_alias = ids.fresh(&format!("{}__{}", alias, file));
                lines.push(format!("    file \"{}\" as {}", file, file_alias));
            }
            lines.push("  }".to_string());
        }
        lines.push("}".to_string());
    }

    edges(&model.dependencies, |name| ids.issue(name, name), &mut lines);
    lines
}

fn component_keyword(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Directory => "folder",
        ComponentKind::Database => "database",
        ComponentKind::Interface => "interface",
        _ => "component",
    }
}

pub(super) fn render_components(model: &ComponentModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    if options.style {
        lines.push("skinparam componentStyle uml2".to_string());
    }

    // Packages in first-seen order
    let mut packages: Vec<&str> = Vec::new();
    for component in &model.components {
        if !packages.contains(&component.package.as_str()) {
            packages.push(&component.package);
        }
    }

    // Edges resolve a name to the first component carrying it
    let mut ids = Aliases::default();
    let mut aliases: HashMap<&str, String> = HashMap::new();
    for package in packages {
        lines.push(format!("package \"{}\" {{", package));
        for component in model.components.iter().filter(|c| c.package == package) {
            let alias = ids.fresh(&format!("{}.{}", component.package, component.name));
            lines.push(format!(
                "  {} \"{}\" as {} <<{}>>",
                component_keyword(component.kind),
                component.name,
                alias,
                component.kind.stereotype()
            ));
            aliases.entry(&component.name).or_insert(alias);
        }
        lines.push("}".to_string());
    }

    edges(
        &model.dependencies,
        |name| aliases.get(name).cloned().unwrap_or_else(|| ids.issue(name, name)),
        &mut lines,
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentNode, DependencyKind, PackageNode};

    fn package(name: &str, layer: Layer, files: &[&str]) -> PackageNode {
        PackageNode {
            qualified_name: name.to_string(),
            short_name: name.rsplit('.').next().unwrap_or(name).to_string(),
            level: name.matches('.').count(),
            parent: name.rsplit_once('.').map(|(p, _)| p.to_string()),
            files: files.iter().map(|f| f.to_string()).collect(),
            layer,
        }
    }

    fn dep(from: &str, to: &str, external: bool) -> Dependency {
        Dependency {
            from: from.to_string(),
            to: to.to_string(),
            kind: DependencyKind::Depends,
            external,
        }
    }

    fn plain() -> RenderOptions {
        RenderOptions {
            style: false,
            hide_empty_members: false,
        }
    }

    #[test]
    fn test_packages_grouped_by_layer() {
        let model = PackageModel {
            packages: vec![
                package("src.services", Layer::Business, &["order_service.py"]),
                package("src.api", Layer::Presentation, &["routes.py"]),
                package("flask", Layer::External, &[]),
            ],
            dependencies: vec![
                dep("src.api", "src.services", false),
                dep("src.api", "src.services", false),
                dep("src.api", "flask", true),
            ],
        };
        assert_eq!(
            render_packages(&model, &plain()),
            vec![
                "package \"Presentation\" #E8F4FD {",
                "  package \"src.api\" as src_api {",
                "    file \"routes.py\" as src_api__routes_py",
                "  }",
                "}",
                "package \"Business\" #FFF2CC {",
                "  package \"src.services\" as src_services {",
                "    file \"order_service.py\" as src_services__order_service_py",
                "  }",
                "}",
                "package \"External\" #F5F5F5 {",
                "  package \"flask\" as flask <<external>>",
                "}",
                "src_api --> src_services",
                "src_api ..> flask",
            ]
        );
    }

    #[test]
    fn test_components_by_package() {
        let model = ComponentModel {
            components: vec![
                ComponentNode {
                    name: "OrderService".to_string(),
                    package: "code".to_string(),
                    kind: ComponentKind::Service,
                },
                ComponentNode {
                    name: "react".to_string(),
                    package: "external".to_string(),
                    kind: ComponentKind::ExternalLibrary,
                },
            ],
            dependencies: vec![Dependency {
                from: "OrderService".to_string(),
                to: "react".to_string(),
                kind: DependencyKind::Uses,
                external: true,
            }],
        };
        let lines = render_components(&model, &RenderOptions::default());
        assert_eq!(lines[0], "skinparam componentStyle uml2");
        assert!(lines.contains(&"  component \"OrderService\" as code_OrderService <<service>>".to_string()));
        assert!(lines.contains(&"  component \"react\" as external_react <<library>>".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("code_OrderService ..> external_react"));
    }

    #[test]
    fn test_package_aliases_stay_distinct() {
        let model = PackageModel {
            packages: vec![
                package("a.b", Layer::Module, &["x.py"]),
                package("a_b", Layer::Module, &["x.py"]),
            ],
            dependencies: vec![dep("a.b", "a_b", false), dep("a_b", "a.b", false)],
        };
        let lines = render_packages(&model, &plain());
        assert!(lines.contains(&"  package \"a.b\" as a_b {".to_string()));
        assert!(lines.contains(&"  package \"a_b\" as a_b_2 {".to_string()));
        assert!(lines.contains(&"    file \"x.py\" as a_b__x_py".to_string()));
        assert!(lines.contains(&"    file \"x.py\" as a_b_2__x_py".to_string()));
        assert!(lines.contains(&"a_b --> a_b_2".to_string()));
        assert!(lines.contains(&"a_b_2 --> a_b".to_string()));
    }

    #[test]
    fn test_component_aliases_stay_distinct() {
        let component = |name: &str| ComponentNode {
            name: name.to_string(),
            package: "code".to_string(),
            kind: ComponentKind::Module,
        };
        let model = ComponentModel {
            components: vec![component("a.b"), component("a_b")],
            dependencies: vec![Dependency {
                from: "a.b".to_string(),
                to: "a_b".to_string(),
                kind: DependencyKind::Uses,
                external: false,
            }],
        };
        let lines = render_components(&model, &plain());
        assert!(lines[1].ends_with("as code_a_b <<module>>"), "{:?}", lines);
        assert!(lines[2].ends_with("as code_a_b_2 <<module>>"), "{:?}", lines);
        assert_eq!(lines.last().map(String::as_str), Some("code_a_b --> code_a_b_2"));
    }

    #[test]
    fn test_unknown_edge_endpoint_sanitized() {
        let model = ComponentModel {
            components: Vec::new(),
            dependencies: vec![Dependency {
                from: "Main".to_string(),
                to: "java.util.List".to_string(),
                kind: DependencyKind::Uses,
                external: true,
            }],
        };
        assert_eq!(render_components(&model, &plain()), vec!["Main ..> java_util_List"]);
    }
}
