// Source structure extraction with tree-sitter
//
// The grammars are the fast path. Python source they cannot parse cleanly
// goes through an indentation-based reader that produces the same types.
// Java and JavaScript/TypeScript fall back to the declaration scanner.

mod brace;
mod fallback;
mod java;
mod javascript;
mod python;

pub use brace::BraceModule;
pub use java::JavaParser;
pub use javascript::JavaScriptParser;
pub use python::PythonParser;

use crate::extract::normalize::{normalize, NormalizeOptions};
use crate::extract::statements::Statement;
use crate::extract::syntax::PYTHON;
use crate::lang::Language;
use crate::model::{Member, MemberKind, Parameter, Visibility};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SELF_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*self\.(?P<name>[A-Za-z_]\w*)\s*(?::\s*(?P<ty>[^=\n]+?))?\s*=\s*(?P<value>[^=\n].*)$").unwrap()
});

static CLASS_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z_]\w*)\s*(?::\s*(?P<ty>[^=]+?))?\s*(?:=\s*(?P<value>[^=].*))?$").unwrap()
});

/// Top-level structure of a Python module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyModule {
    pub classes: Vec<PyClass>,
    pub functions: Vec<PyFunction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyClass {
    pub name: String,
    /// Positional base expressions, e.g. `Base`, `Generic[T]`
    pub bases: Vec<String>,
    /// Keyword arguments of the class header, e.g. `("metaclass", "ABCMeta")`
    pub keywords: Vec<(String, String)>,
    /// Decorator text without `@`
    pub decorators: Vec<String>,
    /// Preceding comment lines
    pub markers: Vec<String>,
    pub methods: Vec<PyFunction>,
    /// Class-level assignments and annotations
    pub class_fields: Vec<Member>,
    /// `self.x` attributes assigned in methods
    pub instance_fields: Vec<Member>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyFunction {
    pub name: String,
    /// Decorator text without `@`, arguments included
    pub decorators: Vec<String>,
    /// Parameters without `self`/`cls`
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub docstring: Option<String>,
    /// Preceding comment lines plus docstring lines carrying directives
    pub markers: Vec<String>,
    pub body: Vec<Statement>,
    /// Normalized body source, comments and string contents removed
    pub body_text: String,
}

impl PyFunction {
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| decorator_name(d) == name)
    }
}

/// Last dotted segment of a decorator name: `app.post("/x")` -> `post`
pub fn decorator_name(decorator: &str) -> &str {
    let end = decorator.find('(').unwrap_or(decorator.len());
    let name = decorator[..end].trim();
    name.rsplit('.').next().unwrap_or(name)
}

/// Parse Python source, falling back to the indentation reader on syntax errors
pub fn parse_python(source: &str) -> PyModule {
    let parsed = PythonParser::new().and_then(|mut parser| parser.parse_source(source));
    match parsed {
        Ok(Some(module)) => module,
        Ok(None) => {
            debug!("python source has syntax errors, using indentation reader");
            fallback::parse(source)
        }
        Err(e) => {
            debug!(error = %e, "tree-sitter python unavailable, using indentation reader");
            fallback::parse(source)
        }
    }
}

/// Parse Java or JavaScript/TypeScript source; `None` sends the caller to the scanner
pub fn parse_brace(source: &str, language: Language, options: &NormalizeOptions) -> Option<BraceModule> {
    let parsed = match language {
        Language::Java => JavaParser::new().and_then(|mut parser| parser.parse_source(source, *options)),
        Language::JavaScript => JavaScriptParser::new().and_then(|mut parser| parser.parse_source(source, *options)),
        _ => return None,
    };
    match parsed {
        Ok(Some(module)) => Some(module),
        Ok(None) => {
            debug!(?language, "source has syntax errors, using declaration scanner");
            None
        }
        Err(e) => {
            debug!(?language, error = %e, "tree-sitter grammar unavailable, using declaration scanner");
            None
        }
    }
}

/// Statement text with comments dropped, string contents blanked and whitespace collapsed
pub(crate) fn clean_statement(raw: &str) -> String {
    let text = normalize(raw, &PYTHON, &NormalizeOptions::new());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalized_body(raw: &str) -> String {
    normalize(raw, &PYTHON, &NormalizeOptions::new())
}

/// Docstring lines that carry a `@Tag:` directive
pub(crate) fn docstring_markers(docstring: Option<&str>) -> Vec<String> {
    docstring
        .map(|doc| {
            doc.lines()
                .map(str::trim)
                .filter(|l| l.starts_with('@'))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn python_visibility(name: &str) -> Visibility {
    if name.starts_with("__") && name.ends_with("__") {
        Visibility::Public
    } else if name.starts_with("__") {
        Visibility::Private
    } else if name.starts_with('_') {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

/// Best-effort type of a Python value expression
pub(crate) fn infer_python_type(value: &str, parameters: &[Parameter]) -> Option<String> {
    let v = value.trim();
    if let Some(p) = parameters.iter().find(|p| p.name == v) {
        return p.type_name.clone();
    }
    if v.starts_with(['"', '\'']) || v.starts_with("f\"") || v.starts_with("f'") {
        return Some("str".to_string());
    }
    if v == "True" || v == "False" {
        return Some("bool".to_string());
    }
    if v.parse::<i64>().is_ok() {
        return Some("int".to_string());
    }
    if v.parse::<f64>().is_ok() {
        return Some("float".to_string());
    }
    if v.starts_with('[') {
        return Some("list".to_string());
    }
    if v.starts_with('{') {
        return Some("dict".to_string());
    }
    let callee: String = v.chars().take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '.').collect();
    let short = callee.rsplit('.').next().unwrap_or(&callee);
    if v[callee.len()..].starts_with('(') && short.starts_with(|c: char| c.is_uppercase()) {
        return Some(short.to_string());
    }
    None
}

/// A class-level statement read as a field or constant
pub(crate) fn class_field(statement: &str) -> Option<Member> {
    let caps = CLASS_FIELD.captures(statement.trim())?;
    let name = caps.name("name")?.as_str();
    let ty = caps.name("ty").map(|m| m.as_str().trim().to_string());
    let value = caps.name("value").map(|m| m.as_str());
    if ty.is_none() && value.is_none() {
        return None;
    }
    let is_constant = name.len() > 1 && name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit());
    let kind = if is_constant { MemberKind::Constant } else { MemberKind::Field };
    let type_name = ty.or_else(|| value.and_then(|v| infer_python_type(v, &[])));
    Some(
        Member::new(kind, name)
            .with_visibility(python_visibility(name))
            .with_type(type_name),
    )
}

/// `self.x = value` attributes assigned in a method body
pub(crate) fn self_attributes(method: &PyFunction) -> Vec<Member> {
    let mut fields: Vec<Member> = Vec::new();
    for caps in SELF_ASSIGN.captures_iter(&method.body_text) {
        let (Some(name), Some(value)) = (caps.name("name"), caps.name("value")) else {
            continue;
        };
        let name = name.as_str();
        if fields.iter().any(|f| f.name == name) {
            continue;
        }
        let type_name = caps
            .name("ty")
            .map(|t| t.as_str().trim().to_string())
            .or_else(|| infer_python_type(value.as_str(), &method.parameters));
        fields.push(
            Member::new(MemberKind::Field, name)
                .with_visibility(python_visibility(name))
                .with_type(type_name),
        );
    }
    fields
}

/// Fill in `instance_fields` from the class's methods
pub(crate) fn collect_instance_fields(class: &mut PyClass) {
    let mut fields: Vec<Member> = Vec::new();
    for method in &class.methods {
        for field in self_attributes(method) {
            let known = fields.iter().chain(class.class_fields.iter()).any(|f| f.name == field.name);
            if !known {
                fields.push(field);
            }
        }
    }
    class.instance_fields = fields;
}
