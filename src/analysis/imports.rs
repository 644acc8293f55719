// Import extraction across languages
//
// Resolves imports to the package they come from:
// - Standard library and well-known framework roots (external.<root>)
// - Everything else (the first segment of the import path)

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Import statement patterns; group 1 is the imported path
static IMPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Python
        r"(?m)^[ \t]*from[ \t]+([\w.]+)[ \t]+import\b",
        r"(?m)^[ \t]*import[ \t]+([A-Za-z_][\w.]*)[ \t]*(?:,|as[ \t]|$)",
        // JavaScript / TypeScript
        r#"(?m)^[ \t]*import[ \t]+[^'";]*?[ \t]from[ \t]*['"]([^'"]+)['"]"#,
        r#"(?m)^[ \t]*import[ \t]+['"]([^'"]+)['"]"#,
        r#"\brequire[ \t]*\([ \t]*['"]([^'"]+)['"][ \t]*\)"#,
        // Java
        r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?([\w.]+?)(?:\.\*)?[ \t]*;",
        // C#
        r"(?m)^[ \t]*using[ \t]+(?:static[ \t]+)?([\w.]+)[ \t]*;",
        // PHP and Rust
        r"(?m)^[ \t]*use[ \t]+([\w\\:]+)",
        r#"\b(?:include|require)(?:_once)?[ \t]*\(?[ \t]*['"]([^'"]+)['"]"#,
        // C / C++
        r#"#include[ \t]*[<"]([^>"]+)[>"]"#,
        // Go
        r#"(?m)^[ \t]*import[ \t]+(?:\w+[ \t]+)?"([^"]+)""#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Roots of standard libraries across the supported ecosystems
const STD_ROOTS: &[&str] = &[
    // JVM
    "java", "javax", "org", "com", "kotlin", "android",
    // .NET
    "System", "Microsoft",
    // Rust, C++
    "std", "core", "alloc",
    // Python
    "abc", "argparse", "asyncio", "collections", "contextlib", "copy", "csv", "dataclasses",
    "datetime", "enum", "functools", "hashlib", "io", "itertools", "json", "logging", "math",
    "os", "pathlib", "random", "re", "shutil", "subprocess", "sys", "tempfile", "threading",
    "time", "typing", "unittest", "uuid",
];

/// Framework and package-manager names treated as external
const KNOWN_EXTERNAL: &[&str] = &[
    "node_modules", "pip", "maven", "composer", "react", "angular", "vue", "django", "flask",
    "fastapi", "express", "spring", "hibernate", "junit", "mockito", "laravel", "symfony",
    "lodash", "axios", "sqlalchemy", "pydantic",
];

/// Imported paths in order of appearance, without duplicates or relative imports
pub fn extract_imports(code: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = IMPORT_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(code))
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str().trim()))
        .filter(|(_, path)| !path.is_empty() && !path.starts_with('.'))
        .collect();
    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|(_, path)| seen.insert(*path))
        .map(|(_, path)| path.to_string())
        .collect()
}

/// Map an imported path to the package that owns it
pub fn package_of_import(import: &str) -> String {
    let cleaned = import.trim().replace("::", ".").replace('\\', ".");
    let cleaned = cleaned.trim_matches('.');
    let root = if cleaned.contains('/') {
        cleaned.split('/').find(|s| !s.is_empty()).unwrap_or(cleaned)
    } else {
        cleaned.split('.').next().unwrap_or(cleaned)
    };
    let root = root.trim_start_matches('@');

    if is_external_root(root) {
        format!("external.{}", root)
    } else {
        root.to_string()
    }
}

fn is_external_root(root: &str) -> bool {
    let lower = root.to_lowercase();
    STD_ROOTS.contains(&root) || KNOWN_EXTERNAL.iter().any(|k| lower.contains(k))
}

/// Whether a package name lives in the synthetic external namespace
pub fn is_external_package(name: &str) -> bool {
    name == "external" || name.starts_with("external.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_python_imports() {
        let code = "import os\nfrom app.models import User\nimport numpy as np\nfrom . import sibling\n";
        assert_eq!(extract_imports(code), vec!["os", "app.models", "numpy"]);
    }

    #[test]
    fn test_javascript_imports() {
        let code = "import React from 'react';\nimport './styles.css';\nconst fs = require(\"fs\");\nimport { a } from './local';\n";
        assert_eq!(extract_imports(code), vec!["react", "fs"]);
    }

    #[test]
    fn test_brace_language_imports() {
        let code = "using System.Linq;\nimport java.util.List;\nuse App\\Models\\User;\n#include <vector>\n";
        assert_eq!(
            extract_imports(code),
            vec!["System.Linq", "java.util.List", "App\\Models\\User", "vector"]
        );
    }

    #[test]
    fn test_duplicates_removed() {
        assert_eq!(extract_imports("import os\nimport os\n"), vec!["os"]);
    }

    #[rstest]
    #[case("java.util.List", "external.java")]
    #[case("System.Linq", "external.System")]
    #[case("std::collections::HashMap", "external.std")]
    #[case("app.models", "app")]
    #[case("App\\Models\\User", "App")]
    #[case("lodash/fp", "external.lodash")]
    #[case("@angular/core", "external.angular")]
    #[case("flask", "external.flask")]
    #[case("utils/format", "utils")]
    #[case("numpy", "numpy")]
    fn test_package_of_import(#[case] import: &str, #[case] expected: &str) {
        assert_eq!(package_of_import(import), expected);
    }

    #[test]
    fn test_is_external_package() {
        assert!(is_external_package("external.npm"));
        assert!(!is_external_package("externalities"));
    }
}
