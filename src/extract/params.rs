// Parameter list splitting

use super::scanner::split_annotations;
use super::syntax::Syntax;
use crate::lang::Language;
use crate::model::{Parameter, Visibility};

/// Split on `sep` at nesting depth zero; pieces are trimmed, empty ones dropped
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut prev = ' ';

    for (idx, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '>' if prev != '=' && prev != '-' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                pieces.push(text[start..idx].trim());
                start = idx + c.len_utf8();
            }
            _ => {}
        }
        prev = c;
    }
    pieces.push(text[start..].trim());
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Split off a top-level default value: `x = 5` -> (`x`, Some(`5`))
pub fn split_default(text: &str) -> (&str, Option<&str>) {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let next = bytes.get(idx + 1).copied();
                let prev = if idx > 0 { bytes[idx - 1] } else { b' ' };
                if next != Some(b'=') && next != Some(b'>') && !matches!(prev, b'!' | b'<' | b'>' | b'=') {
                    return (text[..idx].trim(), Some(text[idx + 1..].trim()));
                }
            }
            _ => {}
        }
    }
    (text.trim(), None)
}

/// Split whitespace-separated tokens, keeping generic argument lists whole
pub fn split_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                tokens.push(&text[s..idx]);
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    // `Map <K, V>` style spacing: glue a generic list onto the previous token
    let mut merged: Vec<&str> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.starts_with('<') {
            if let Some(last) = merged.last_mut() {
                let start = last.as_ptr() as usize - text.as_ptr() as usize;
                let end = token.as_ptr() as usize - text.as_ptr() as usize + token.len();
                *last = &text[start..end];
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

/// Parse a raw parameter list (the text between the parentheses)
pub fn parse_parameters(list: &str, syntax: &Syntax) -> Vec<Parameter> {
    split_top_level(list, ',')
        .into_iter()
        .filter_map(|raw| parse_parameter(raw, syntax))
        .collect()
}

fn parse_parameter(raw: &str, syntax: &Syntax) -> Option<Parameter> {
    let (_, rest) = split_annotations(raw);
    let (decl, default) = split_default(rest);
    let mut param = match syntax.language {
        Language::Python => python_parameter(decl)?,
        Language::JavaScript => script_parameter(decl, syntax)?,
        Language::Php => php_parameter(decl, syntax)?,
        Language::CSharp | Language::Java => typed_parameter(decl)?,
    };
    if let Some(value) = default {
        param.optional = true;
        param.default = Some(value.to_string());
    }
    Some(param)
}

fn python_parameter(decl: &str) -> Option<Parameter> {
    let (name, type_name) = match decl.split_once(':') {
        Some((n, t)) => (n.trim(), Some(t.trim())),
        None => (decl.trim(), None),
    };
    if matches!(name, "self" | "cls" | "*" | "/" | "") {
        return None;
    }
    let variadic = name.starts_with('*');
    let mut param = Parameter::new(name.trim_start_matches('*'));
    param.type_name = type_name.map(str::to_string);
    param.variadic = variadic;
    Some(param)
}

fn script_parameter(decl: &str, syntax: &Syntax) -> Option<Parameter> {
    let mut text = decl.trim();
    loop {
        let word = text.split_whitespace().next().unwrap_or("");
        if syntax.visibility_of(word).is_some() || word == "readonly" {
            text = text[word.len()..].trim_start();
        } else {
            break;
        }
    }
    let (name_part, type_name) = match split_top_level(text, ':').as_slice() {
        [name, ty, ..] => (*name, Some(ty.to_string())),
        [name] => (*name, None),
        [] => return None,
    };
    let variadic = name_part.starts_with("...");
    let mut name = name_part.trim_start_matches("...").trim();
    let optional = name.ends_with('?');
    name = name.trim_end_matches('?');
    let name = if name.starts_with('{') {
        "props"
    } else if name.starts_with('[') {
        "items"
    } else {
        name
    };
    if name.is_empty() {
        return None;
    }
    let mut param = Parameter::new(name);
    param.type_name = type_name;
    param.variadic = variadic;
    param.optional = optional;
    Some(param)
}

fn php_parameter(decl: &str, syntax: &Syntax) -> Option<Parameter> {
    let tokens: Vec<&str> = split_tokens(decl)
        .into_iter()
        .filter(|t| syntax.visibility_of(t).is_none() && *t != "readonly")
        .collect();
    let var_idx = tokens.iter().position(|t| t.contains('$'))?;
    let var = tokens[var_idx];
    let variadic = var.contains("...");
    let name = var.trim_start_matches(['&', '.', '$']);
    let mut param = Parameter::new(name);
    if var_idx > 0 {
        let ty = tokens[..var_idx].join(" ");
        param.optional = ty.starts_with('?');
        param.type_name = Some(ty);
    }
    param.variadic = variadic;
    Some(param)
}

const TYPED_PARAM_MODIFIERS: &[&str] = &["final", "ref", "out", "in", "this", "scoped", "readonly"];

fn typed_parameter(decl: &str) -> Option<Parameter> {
    let mut tokens = split_tokens(decl);
    let mut variadic = false;
    tokens.retain(|t| {
        if *t == "params" {
            variadic = true;
            return false;
        }
        !TYPED_PARAM_MODIFIERS.contains(t)
    });
    let name = tokens.pop()?;
    let mut ty = tokens.join(" ");
    if let Some(stripped) = ty.strip_suffix("...") {
        ty = stripped.to_string();
        variadic = true;
    }
    let mut param = Parameter::new(name);
    if !ty.is_empty() {
        param.optional = ty.ends_with('?');
        param.type_name = Some(ty);
    }
    param.variadic = variadic;
    Some(param)
}

/// Visibility keyword on a constructor-promoted parameter (PHP 8, TypeScript)
pub fn promoted_visibility(raw: &str, syntax: &Syntax) -> Option<Visibility> {
    let (_, rest) = split_annotations(raw);
    let first = rest.split_whitespace().next()?;
    if first == "readonly" && syntax.language == Language::JavaScript {
        return Some(Visibility::Public);
    }
    syntax.visibility_of(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::syntax::{CSHARP, JAVA, JAVASCRIPT, PHP, PYTHON};

    #[test]
    fn test_split_top_level_respects_generics() {
        let parts = split_top_level("Map<String, Integer> a, List<X> b", ',');
        assert_eq!(parts, vec!["Map<String, Integer> a", "List<X> b"]);
    }

    #[test]
    fn test_split_top_level_arrow() {
        let parts = split_top_level("cb = (a, b) => a, c", ',');
        assert_eq!(parts, vec!["cb = (a, b) => a", "c"]);
    }

    #[test]
    fn test_split_default() {
        assert_eq!(split_default("int x = 5"), ("int x", Some("5")));
        assert_eq!(split_default("a == b"), ("a == b", None));
        assert_eq!(split_default("f = () => 1"), ("f", Some("() => 1")));
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens("final Map<String, X> items"), vec!["final", "Map<String, X>", "items"]);
    }

    #[test]
    fn test_java_parameters() {
        let params = parse_parameters("@RequestBody OrderRequest req, String... tags", &JAVA);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "req");
        assert_eq!(params[0].type_name.as_deref(), Some("OrderRequest"));
        assert!(params[1].variadic);
        assert_eq!(params[1].type_name.as_deref(), Some("String"));
    }

    #[test]
    fn test_csharp_parameters() {
        let params = parse_parameters("[FromBody] Order order, int? limit = null, params string[] rest", &CSHARP);
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].type_name.as_deref(), Some("Order"));
        assert!(params[1].optional);
        assert_eq!(params[1].default.as_deref(), Some("null"));
        assert!(params[2].variadic);
    }

    #[test]
    fn test_python_parameters() {
        let params = parse_parameters("self, order: Order, limit: int = 10, *args, **kwargs", &PYTHON);
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["order", "limit", "args", "kwargs"]);
        assert!(params[1].optional);
        assert!(params[2].variadic);
    }

    #[test]
    fn test_php_parameters() {
        let params = parse_parameters("private readonly OrderRepository $repo, ?int $limit = null, ...$rest", &PHP);
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "repo");
        assert_eq!(params[0].type_name.as_deref(), Some("OrderRepository"));
        assert!(params[1].optional);
        assert!(params[2].variadic);
    }

    #[test]
    fn test_script_parameters() {
        let params = parse_parameters("private readonly repo: OrderRepo, id?: string, ...rest: any[], { a, b }", &JAVASCRIPT);
        assert_eq!(params.len(), 4);
        assert_eq!(params[0].name, "repo");
        assert_eq!(params[0].type_name.as_deref(), Some("OrderRepo"));
        assert!(params[1].optional);
        assert!(params[2].variadic);
        assert_eq!(params[3].name, "props");
    }

    #[test]
    fn test_promoted_visibility() {
        assert_eq!(promoted_visibility("private Repo $repo", &PHP), Some(Visibility::Private));
        assert_eq!(promoted_visibility("readonly repo: Repo", &JAVASCRIPT), Some(Visibility::Public));
        assert_eq!(promoted_visibility("Repo $repo", &PHP), None);
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_parameters("", &JAVA).is_empty());
        assert!(parse_parameters("   ", &PYTHON).is_empty());
    }
}
