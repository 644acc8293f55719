// Dependency manifest sniffing and parsing
//
// Supports package.json, composer.json, requirements.txt, pom.xml and
// build.gradle shaped text. Only dependency names are read. JSON manifests
// are parsed as JSON first; text that is not valid JSON is read by pattern.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

static NPM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:dependencies|devDependencies)"\s*:\s*\{([^}]*)\}"#).unwrap());
static COMPOSER_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r#""require(?:-dev)?"\s*:\s*\{([^}]*)\}"#).unwrap());
static JSON_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)"\s*:"#).unwrap());
static ARTIFACT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>").unwrap());
static GRADLE_DEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:implementation|api|compile|testImplementation|runtimeOnly)\s*\(?\s*["']([^:"']+):([^:"']+)"#).unwrap()
});
static REQUIREMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][\w.\-]*(?:\[[^\]]*\])?\s*(?:[=<>!~]=?.*)?$").unwrap());

/// Package registry a manifest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    Npm,
    Pypi,
    Maven,
    Packagist,
}

impl Registry {
    /// Root node name in the external namespace
    pub fn root(&self) -> &'static str {
        match self {
            Registry::Npm => "external.npm",
            Registry::Pypi => "external.pypi",
            Registry::Maven => "external.maven",
            Registry::Packagist => "external.packagist",
        }
    }

    /// Group name for library components
    pub fn component_group(&self) -> &'static str {
        match self {
            Registry::Npm => "node_modules",
            Registry::Pypi => "pip_packages",
            Registry::Maven => "maven_central",
            Registry::Packagist => "vendor",
        }
    }
}

/// How many dependencies a manifest contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestCaps {
    /// Per dependency block of JSON-shaped manifests
    pub json: usize,
    /// For line-shaped manifests
    pub lines: usize,
}

impl Default for ManifestCaps {
    fn default() -> Self {
        Self { json: 5, lines: 10 }
    }
}

/// Dependency sections of package.json and composer.json
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonManifest {
    dependencies: DependencyNames,
    #[serde(rename = "devDependencies")]
    dev_dependencies: DependencyNames,
    require: DependencyNames,
    #[serde(rename = "require-dev")]
    require_dev: DependencyNames,
}

/// Keys of a dependency object in document order
#[derive(Debug, Default)]
struct DependencyNames(Vec<String>);

impl<'de> Deserialize<'de> for DependencyNames {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Keys;

        impl<'de> Visitor<'de> for Keys {
            type Value = DependencyNames;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a dependency object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut names = Vec::new();
                while let Some((name, _)) = map.next_entry::<String, IgnoredAny>()? {
                    names.push(name);
                }
                Ok(DependencyNames(names))
            }

            // composer writes empty sections as `[]`
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(DependencyNames::default())
            }
        }

        deserializer.deserialize_any(Keys)
    }
}

/// Dependency blocks of a JSON manifest, `None` when the text is not valid JSON
fn json_blocks(text: &str, registry: Registry) -> Option<Vec<Vec<String>>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    let manifest: JsonManifest = serde_json::from_str(text.get(start..=end)?).ok()?;
    let blocks = match registry {
        Registry::Packagist => [manifest.require, manifest.require_dev],
        _ => [manifest.dependencies, manifest.dev_dependencies],
    };
    Some(blocks.into_iter().map(|block| block.0).collect())
}

/// Dependency blocks matched by pattern, for manifests that do not parse
fn pattern_blocks(text: &str, registry: Registry) -> Vec<Vec<String>> {
    let block = match registry {
        Registry::Packagist => &COMPOSER_BLOCK,
        _ => &NPM_BLOCK,
    };
    block
        .captures_iter(text)
        .map(|b| JSON_KEY.captures_iter(&b[1]).map(|k| k[1].to_string()).collect())
        .collect()
}

const KNOWN_FILES: &[&str] = &["package.json", "requirements.txt", "pom.xml", "build.gradle", "composer.json"];

/// Keyword sniffing for manifest-shaped text
pub fn is_manifest(text: &str) -> bool {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || lower.contains("dependencies")
        || lower.contains("\"require\"")
        || KNOWN_FILES.iter().any(|f| lower.contains(f))
        || looks_like_requirements(trimmed)
}

/// More than 60% of the lines look like `name==version` requirements
fn looks_like_requirements(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let deps = lines
        .iter()
        .filter(|l| !l.starts_with('#'))
        .filter(|l| l.contains("==") || l.contains(">=") || l.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_'))
        .count();
    deps * 10 > lines.len() * 6
}

/// Which registry a manifest belongs to, if any
pub fn detect(text: &str) -> Option<Registry> {
    let lower = text.to_lowercase();
    if lower.contains("composer.json") || COMPOSER_BLOCK.is_match(text) {
        Some(Registry::Packagist)
    } else if lower.contains("package.json") || NPM_BLOCK.is_match(text) {
        Some(Registry::Npm)
    } else if ["maven", "gradle", "pom.xml", "<artifactid>", "implementation"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Some(Registry::Maven)
    } else if lower.contains("requirements.txt") || looks_like_requirements(text.trim()) {
        Some(Registry::Pypi)
    } else {
        None
    }
}

/// Dependency names declared by a manifest, capped per `caps`
pub fn dependencies(text: &str, registry: Registry, caps: ManifestCaps) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    match registry {
        Registry::Npm | Registry::Packagist => {
            let blocks = json_blocks(text, registry).unwrap_or_else(|| {
                debug!(?registry, "manifest is not valid JSON, reading dependency blocks by pattern");
                pattern_blocks(text, registry)
            });
            for block in blocks {
                // composer names are `vendor/package`; platform requirements have no vendor
                let keys = block.into_iter().filter_map(|key| match registry {
                    Registry::Packagist => key.split_once('/').map(|(_, package)| package.to_string()),
                    _ => Some(key),
                });
                names.extend(keys.take(caps.json));
            }
        }
        Registry::Maven => {
            let maven = ARTIFACT_ID.captures_iter(text).map(|c| c[1].to_string());
            let gradle = GRADLE_DEP.captures_iter(text).map(|c| c[2].to_string());
            names.extend(maven.chain(gradle).take(caps.lines));
        }
        Registry::Pypi => {
            let packages = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
                .filter(|l| REQUIREMENT.is_match(l))
                .filter_map(|l| l.split(['=', '<', '>', '!', '~', '[', ' ', ';']).next())
                .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("requirements.txt"))
                .map(str::to_string);
            names.extend(packages.take(caps.lines));
        }
    }
    let mut seen = std::collections::HashSet::new();
    names.retain(|n| seen.insert(n.clone()));
    names
}
