// Language and diagram-kind tags
//
// Closed enumerations for the registry key. Aliases are resolved here so that
// every other module only ever sees canonical tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A supported source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CSharp,
    Java,
    Python,
    Php,
    /// JavaScript and TypeScript share extractors
    JavaScript,
}

impl Language {
    /// All concrete languages in registry order
    pub const ALL: [Language; 5] = [
        Language::CSharp,
        Language::Java,
        Language::Python,
        Language::Php,
        Language::JavaScript,
    ];

    /// Resolve a language name or alias (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "csharp" | "c#" | "cs" => Some(Language::CSharp),
            "java" => Some(Language::Java),
            "python" | "py" => Some(Language::Python),
            "php" => Some(Language::Php),
            "javascript" | "js" | "jsx" | "typescript" | "ts" | "tsx" | "node" => {
                Some(Language::JavaScript)
            }
            _ => None,
        }
    }

    /// Detect a language from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "cs" => Some(Language::CSharp),
            "java" => Some(Language::Java),
            "py" | "pyi" => Some(Language::Python),
            "php" => Some(Language::Php),
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" => Some(Language::JavaScript),
            _ => None,
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::Python => "python",
            Language::Php => "php",
            Language::JavaScript => "javascript",
        }
    }

    /// Whether the language delimits blocks with braces
    pub fn is_brace_based(&self) -> bool {
        !matches!(self, Language::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language key of the registry: a concrete language or the `any` wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Concrete(Language),
    Any,
}

impl LanguageTag {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("any") {
            return Some(LanguageTag::Any);
        }
        Language::from_name(name).map(LanguageTag::Concrete)
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            LanguageTag::Concrete(lang) => Some(*lang),
            LanguageTag::Any => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Concrete(lang) => lang.as_str(),
            LanguageTag::Any => "any",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagram kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    Class,
    Sequence,
    UseCase,
    Activity,
    Component,
    Package,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 6] = [
        DiagramKind::Class,
        DiagramKind::Sequence,
        DiagramKind::UseCase,
        DiagramKind::Activity,
        DiagramKind::Component,
        DiagramKind::Package,
    ];

    /// Resolve a diagram kind name or alias (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "class" => Some(DiagramKind::Class),
            "sequence" => Some(DiagramKind::Sequence),
            "use_case" | "usecase" | "use-case" => Some(DiagramKind::UseCase),
            "activity" => Some(DiagramKind::Activity),
            "component" => Some(DiagramKind::Component),
            "package" => Some(DiagramKind::Package),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Class => "class",
            DiagramKind::Sequence => "sequence",
            DiagramKind::UseCase => "use_case",
            DiagramKind::Activity => "activity",
            DiagramKind::Component => "component",
            DiagramKind::Package => "package",
        }
    }

    /// Kinds that ignore the source language
    pub fn is_language_agnostic(&self) -> bool {
        matches!(self, DiagramKind::Component | DiagramKind::Package)
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("csharp", Language::CSharp)]
    #[case("C#", Language::CSharp)]
    #[case("Java", Language::Java)]
    #[case("py", Language::Python)]
    #[case("PHP", Language::Php)]
    #[case("typescript", Language::JavaScript)]
    #[case("ts", Language::JavaScript)]
    #[case("js", Language::JavaScript)]
    fn test_language_aliases(#[case] name: &str, #[case] expected: Language) {
        assert_eq!(Language::from_name(name), Some(expected));
    }

    #[test]
    fn test_unknown_language() {
        assert_eq!(Language::from_name("cobol"), None);
        assert_eq!(LanguageTag::from_name("cobol"), None);
    }

    #[test]
    fn test_any_tag() {
        assert_eq!(LanguageTag::from_name("ANY"), Some(LanguageTag::Any));
        assert_eq!(LanguageTag::Any.language(), None);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("src/Order.cs")), Some(Language::CSharp));
        assert_eq!(Language::from_path(Path::new("app.tsx")), Some(Language::JavaScript));
        assert_eq!(Language::from_path(Path::new("README.md")), None);
    }

    #[rstest]
    #[case("use_case", DiagramKind::UseCase)]
    #[case("usecase", DiagramKind::UseCase)]
    #[case("CLASS", DiagramKind::Class)]
    #[case("package", DiagramKind::Package)]
    fn test_kind_aliases(#[case] name: &str, #[case] expected: DiagramKind) {
        assert_eq!(DiagramKind::from_name(name), Some(expected));
    }

    #[test]
    fn test_language_agnostic_kinds() {
        assert!(DiagramKind::Component.is_language_agnostic());
        assert!(DiagramKind::Package.is_language_agnostic());
        assert!(!DiagramKind::Class.is_language_agnostic());
    }
}
