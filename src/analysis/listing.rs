// Input classification and path listings
//
// Package and component diagrams accept several input shapes. A multi-file
// bundle separates files with `---FILE---` lines whose first line is the
// file name.

use super::manifest;

/// Separator between files of a bundle
pub const FILE_MARKER: &str = "---FILE---";

/// Shape of the text given to a package or component conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Several files separated by `---FILE---`
    Bundle,
    /// One path per line
    Listing,
    /// A dependency manifest
    Manifest,
    /// A single source file
    Source,
}

/// Classify input: bundle, then listing, then manifest, then source
pub fn classify(text: &str) -> InputShape {
    if text.contains(FILE_MARKER) {
        InputShape::Bundle
    } else if is_listing(text) {
        InputShape::Listing
    } else if manifest::is_manifest(text) {
        InputShape::Manifest
    } else {
        InputShape::Source
    }
}

/// More than half of the non-empty lines contain a path separator
pub fn is_listing(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let paths = lines.iter().filter(|l| l.contains('/') || l.contains('\\')).count();
    paths * 2 > lines.len()
}

/// One parsed listing line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Directory segments, e.g. `["src", "services"]`
    pub packages: Vec<String>,
    /// Leaf file name when the last segment has an extension
    pub file: Option<String>,
}

impl PathEntry {
    /// Dotted package name
    pub fn package(&self) -> String {
        self.packages.join(".")
    }
}

/// Split a listing line into package segments and an optional file leaf
pub fn parse_path(line: &str) -> Option<PathEntry> {
    let normalized = line.trim().replace('\\', "/");
    let normalized = normalized.strip_prefix("./").unwrap_or(&normalized);
    let is_dir = normalized.ends_with('/');
    let mut parts: Vec<String> = normalized
        .split('/')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != ".")
        .map(str::to_string)
        .collect();
    let leaf = parts.last()?;
    let file = if !is_dir && leaf.contains('.') && !leaf.starts_with('.') {
        parts.pop()
    } else {
        None
    };
    Some(PathEntry { packages: parts, file })
}

/// Files of a bundle as `(name, body)` pairs
pub fn split_bundle(text: &str) -> Vec<(String, String)> {
    text.split(FILE_MARKER)
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(|section| match section.split_once('\n') {
            Some((name, body)) => (name.trim().to_string(), body.to_string()),
            None => (section.to_string(), String::new()),
        })
        .collect()
}

/// Fragments of project files and tree-drawing output that are not paths
const CONTENT_INDICATORS: &[&str] = &[
    "<?xml", "<Project", "<PropertyGroup", "<ItemGroup", "<Reference", "<Compile", "<Content",
    "<None", "<Folder", "<Import", "<Target", "EndGlobal", "GlobalSection", "EndProject",
    "Project(", "<!--", "-->", "{", "}", "Debug|Any CPU", "Release|Any CPU", "ActiveCfg",
    "Visual Studio", "PS C:", "\u{feff}",
];

const TREE_GLYPHS: &[char] = &['│', '├', '└', '─', ' ', '\t', '|', '+', '-', '`'];

/// Whether a listing line is file content or decoration rather than a path
pub fn is_content_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.chars().count() <= 2 || trimmed.starts_with('#') {
        return true;
    }
    if trimmed.chars().all(|c| TREE_GLYPHS.contains(&c)) {
        return true;
    }
    CONTENT_INDICATORS.iter().any(|i| trimmed.contains(i))
}

/// Source and markup extensions that become components
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "cs", "js", "ts", "py", "java", "php", "html", "css", "jsx", "tsx", "vue", "go", "rs", "cpp",
    "c", "h", "cshtml", "aspx",
];

const IRRELEVANT_FILES: &[&str] = &[
    ".gitattributes", ".gitignore", "web.config", "packages.config", ".sln", ".csproj", ".vbproj",
    ".fsproj",
];

/// Whether a listing leaf deserves a component: a source file or a plain directory name
pub fn is_relevant(name: &str) -> bool {
    if name.is_empty() || name.contains(['#', '<', '>', '|', '\u{feff}']) || name.starts_with("---") {
        return false;
    }
    if let Some((_, ext)) = name.rsplit_once('.') {
        if SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return true;
        }
    }
    let lower = name.to_lowercase();
    if IRRELEVANT_FILES.iter().any(|f| lower.ends_with(f)) {
        return false;
    }
    name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
