// Brace-language declaration scanner
//
// Finds type declarations with a per-language pattern, cuts their bodies with
// the balanced-block extractor and splits each body into depth-0 member
// chunks. A chunk ends at `;` or at a `{...}` block.

use super::block::find_balanced_end;
use super::members::{classify_member, enum_constants, MemberContext};
use super::params::{parse_parameters, split_top_level};
use super::syntax::Syntax;
use crate::lang::Language;
use crate::model::{Member, MemberKind, Modifier, TypeDeclaration, TypeKind, Visibility};
use once_cell::sync::Lazy;
use regex::Regex;

static TYPE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[\s;{}\]])(?P<mods>(?:(?:public|private|protected|internal|static|abstract|final|sealed|partial|export|default|readonly|declare|data|open)\s+)*)(?P<kind>class|interface|struct|enum|trait|record)\s+(?P<name>[A-Za-z_$][\w$]*)(?P<rest>[^{;]*)\{",
    )
    .unwrap()
});

static NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnamespace\s+(?P<name>[\w.\\]+)\s*[;{]").unwrap());

static SCRIPT_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^\w$.])(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\(",
    )
    .unwrap()
});

static SCRIPT_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^\w$.])(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?P<form>function\s*\*?\s*[\w$]*\s*\(|\(|[A-Za-z_$][\w$]*\s*=>)",
    )
    .unwrap()
});

static PHP_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w$>:])function\s+&?(?P<name>[A-Za-z_]\w*)\s*\(").unwrap()
});

/// A depth-0 chunk of a type body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMember<'a> {
    /// Annotations, decorators or attributes, without `@` / brackets
    pub annotations: Vec<String>,
    /// Preserved marker comments preceding the chunk
    pub markers: Vec<String>,
    /// Declaration text without annotations and markers
    pub header: String,
    /// Block content when the chunk ended with `{...}`
    pub body: Option<&'a str>,
}

/// A callable with its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedMethod {
    pub member: Member,
    pub annotations: Vec<String>,
    pub markers: Vec<String>,
    pub body: Option<String>,
}

impl ScannedMethod {
    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Text of a `@Name: value` marker, if present
    pub fn marker(&self, tag: &str) -> Option<&str> {
        marker_value(&self.markers, tag)
    }
}

/// A type declaration together with everything later stages need from its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedType {
    pub decl: TypeDeclaration,
    pub annotations: Vec<String>,
    pub markers: Vec<String>,
    pub methods: Vec<ScannedMethod>,
    /// Byte range of the body in the text the type was read from
    pub span: (usize, usize),
}

impl ScannedType {
    pub fn short_name(&self) -> &str {
        self.decl.short_name()
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| annotation_name(a) == name)
    }
}

/// Value of a `@Tag: value` marker among comment lines
pub fn marker_value<'a>(markers: &'a [String], tag: &str) -> Option<&'a str> {
    markers.iter().find_map(|m| {
        let idx = m.find(tag)?;
        let rest = m[idx + tag.len()..].trim_start();
        let value = rest.strip_prefix(':')?.trim();
        let value = value.trim_end_matches("*/").trim_end_matches("\"\"\"").trim();
        (!value.is_empty()).then_some(value)
    })
}

/// Name part of an annotation: `GetMapping("/x")` -> `GetMapping`
pub fn annotation_name(annotation: &str) -> &str {
    let end = annotation
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(annotation.len());
    let name = &annotation[..end];
    name.rsplit('.').next().unwrap_or(name)
}

/// Argument text of an annotation: `GetMapping("/x")` -> `"/x"`
pub fn annotation_args(annotation: &str) -> Option<&str> {
    let open = annotation.find('(')?;
    let close = annotation.rfind(')')?;
    (close > open).then(|| annotation[open + 1..close].trim())
}

/// Strip leading annotations (`@X(...)`, `[X]`, `#[X]`) from a declaration
pub fn split_annotations(text: &str) -> (Vec<String>, &str) {
    let mut annotations = Vec::new();
    let mut rest = text.trim_start();

    loop {
        if let Some(after) = rest.strip_prefix('@') {
            if after.starts_with("interface") {
                break;
            }
            let name_len = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(after.len());
            if name_len == 0 {
                break;
            }
            let mut end = 1 + name_len;
            let tail = &rest[end..];
            let trimmed = tail.trim_start();
            if trimmed.starts_with('(') {
                let open = end + (tail.len() - trimmed.len());
                end = match find_balanced_end(&rest[open + 1..], '(', ')') {
                    Some(close) => open + 1 + close + 1,
                    None => rest.len(),
                };
            }
            annotations.push(rest[1..end].trim().to_string());
            rest = rest[end..].trim_start();
        } else if rest.starts_with("#[") || rest.starts_with('[') {
            let open = if rest.starts_with('#') { 2 } else { 1 };
            let (inner, end) = match find_balanced_end(&rest[open..], '[', ']') {
                Some(close) => (&rest[open..open + close], open + close + 1),
                None => (&rest[open..], rest.len()),
            };
            annotations.extend(split_top_level(inner, ',').into_iter().map(str::to_string));
            rest = rest[end..].trim_start();
        } else {
            break;
        }
    }
    (annotations, rest)
}

/// A preserved comment line; `#` only opens a comment where the language has `#` comments
fn is_marker_line(line: &str, syntax: &Syntax) -> bool {
    line.starts_with("//")
        || (syntax.line_comments.contains(&"#") && line.starts_with('#') && !line.starts_with("#["))
}

/// Separate marker comment lines from declaration text
pub(crate) fn split_markers(text: &str, syntax: &Syntax) -> (Vec<String>, String) {
    let mut markers = Vec::new();
    let mut code = Vec::new();
    for line in text.lines() {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        if is_marker_line(t, syntax) {
            markers.push(t.to_string());
        } else {
            code.push(t);
        }
    }
    (markers, code.join(" "))
}

/// Last `;`, `{` or `}` outside string literals and argument lists
fn statement_break(line: &str) -> Option<usize> {
    let mut quote = None;
    let mut depth = 0i32;
    let mut last = None;
    let mut prev = ' ';
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if c == q && prev != '\\' {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                ';' | '{' | '}' if depth <= 0 => last = Some(i),
                _ => {}
            },
        }
        prev = c;
    }
    last
}

/// Annotations and marker comments that precede `start`
pub fn leading_context(text: &str, start: usize, syntax: &Syntax) -> (Vec<String>, Vec<String>) {
    let before = &text[..start];
    let mut markers = Vec::new();
    let mut code: Vec<&str> = Vec::new();

    for line in before.rsplit('\n') {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        if is_marker_line(t, syntax) {
            markers.push(t.to_string());
            continue;
        }
        match statement_break(t) {
            Some(p) => {
                code.push(&t[p + 1..]);
                break;
            }
            None => {
                code.push(t);
                if !t.starts_with(['@', '[']) && !t.starts_with("#[") {
                    break;
                }
            }
        }
    }
    markers.reverse();
    code.reverse();
    let joined = code.join(" ");
    let (annotations, _) = split_annotations(&joined);
    (annotations, markers)
}

/// Split a type body into depth-0 member chunks
pub fn scan_members<'b>(body: &'b str, syntax: &Syntax) -> Vec<RawMember<'b>> {
    let bytes = body.as_bytes();
    let mut members = Vec::new();
    let mut start = 0;
    let mut paren = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => paren += 1,
            b')' => paren = paren.saturating_sub(1),
            b';' if paren == 0 => {
                push_member(&mut members, &body[start..i], None, syntax);
                start = i + 1;
            }
            b'{' if paren == 0 => {
                let header = &body[start..i];
                let inner_start = i + 1;
                let end = find_balanced_end(&body[inner_start..], '{', '}')
                    .map_or(body.len(), |e| inner_start + e);
                let trimmed = header.trim_end();
                // `x = { ... };` initializers belong to the statement
                if trimmed.ends_with('=') && !trimmed.ends_with("=>") {
                    i = end + 1;
                    continue;
                }
                push_member(&mut members, header, Some(&body[inner_start..end]), syntax);
                i = end + 1;
                // `{ get; set; } = value;` property initializers
                let rest = body.get(i..).unwrap_or("");
                if rest.trim_start().starts_with('=') {
                    if let Some(semi) = rest.find(';') {
                        i += semi + 1;
                    }
                }
                start = i.min(body.len());
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    push_member(&mut members, &body[start.min(body.len())..], None, syntax);
    members
}

fn push_member<'a>(members: &mut Vec<RawMember<'a>>, raw: &str, body: Option<&'a str>, syntax: &Syntax) {
    members.extend(raw_member(raw, body, syntax));
}

/// One member chunk with its marker comments and annotations split off
pub(crate) fn raw_member<'a>(raw: &str, body: Option<&'a str>, syntax: &Syntax) -> Option<RawMember<'a>> {
    let (markers, code) = split_markers(raw, syntax);
    let (annotations, header) = split_annotations(&code);
    let header = header.trim().to_string();
    if header.is_empty() && body.is_none() {
        return None;
    }
    Some(RawMember {
        annotations,
        markers,
        header,
        body,
    })
}

/// Namespace in effect at each declaration offset, `\` separators become `.`
fn namespaces(text: &str, syntax: &Syntax) -> Vec<(usize, String)> {
    if !matches!(syntax.language, Language::CSharp | Language::Php) {
        return Vec::new();
    }
    NAMESPACE
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let name = caps.name("name")?.as_str().replace('\\', ".");
            Some((m.start(), name))
        })
        .collect()
}

/// Base list of a declaration, split into (extends, implements)
pub(crate) fn parse_heritage(rest: &str, kind: TypeKind, syntax: &Syntax) -> (Vec<String>, Vec<String>, Option<String>) {
    let mut text = rest.trim();
    let mut components = None;

    // generic parameters
    if text.starts_with('<') {
        text = match find_balanced_end(&text[1..], '<', '>') {
            Some(end) => text[end + 2..].trim(),
            None => "",
        };
    }
    // record components
    if text.starts_with('(') {
        let end = find_balanced_end(&text[1..], '(', ')').unwrap_or(text.len() - 1);
        components = Some(text[1..end + 1].to_string());
        text = text.get(end + 2..).unwrap_or("").trim();
    }
    if let Some(idx) = find_word(text, "where") {
        text = text[..idx].trim();
    }

    let list = |s: &str| -> Vec<String> {
        split_top_level(s, ',')
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    };

    if syntax.language == Language::CSharp {
        let Some(bases) = text.strip_prefix(':') else {
            return (Vec::new(), Vec::new(), components);
        };
        let mut extends = Vec::new();
        let mut implements = Vec::new();
        for base in list(bases) {
            if kind == TypeKind::Struct || looks_like_interface_name(&base) {
                implements.push(base);
            } else {
                extends.push(base);
            }
        }
        return (extends, implements, components);
    }

    // PHP backed enums: `enum Suit: string`
    if let Some(after) = text.strip_prefix(':') {
        text = after.trim_start();
        text = text.split_once(char::is_whitespace).map_or("", |(_, r)| r).trim();
    }

    let ext_idx = find_word(text, "extends");
    let impl_idx = find_word(text, "implements");
    let extends = match (ext_idx, impl_idx) {
        (Some(e), Some(i)) if i > e => list(&text[e + 7..i]),
        (Some(e), _) => list(&text[e + 7..]),
        _ => Vec::new(),
    };
    let implements = match (impl_idx, ext_idx) {
        (Some(i), Some(e)) if e > i => list(&text[i + 10..e]),
        (Some(i), _) => list(&text[i + 10..]),
        _ => Vec::new(),
    };
    (extends, implements, components)
}

/// `IRepository` style names
fn looks_like_interface_name(name: &str) -> bool {
    let short = name.rsplit('.').next().unwrap_or(name);
    let mut chars = short.chars();
    matches!((chars.next(), chars.next()), (Some('I'), Some(c)) if c.is_uppercase())
}

fn find_word(text: &str, word: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = text[from..].find(word) {
        let idx = from + pos;
        let before_ok = idx == 0 || !text[..idx].ends_with(|c: char| c.is_alphanumeric() || c == '_');
        let after_ok = !text[idx + word.len()..].starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if before_ok && after_ok {
            return Some(idx);
        }
        from = idx + word.len();
    }
    None
}

/// Scan every type declaration in normalized brace-language text
pub fn scan_types(text: &str, syntax: &'static Syntax) -> Vec<ScannedType> {
    let spaces = namespaces(text, syntax);
    let mut types = Vec::new();

    for caps in TYPE_DECL.captures_iter(text) {
        let (Some(whole), Some(kind), Some(name)) = (caps.get(0), caps.name("kind"), caps.name("name")) else {
            continue;
        };
        let kind = TypeKind::from_keyword(kind.as_str());
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        let mods = caps.name("mods").map_or("", |m| m.as_str());

        let body_start = whole.end();
        let body_end = find_balanced_end(&text[body_start..], '{', '}')
            .map_or(text.len(), |e| body_start + e);
        let body = &text[body_start..body_end];

        let decl_start = caps.name("mods").map_or(whole.start(), |m| m.start());
        let (annotations, markers) = leading_context(text, decl_start, syntax);

        let qualified = spaces
            .iter()
            .filter(|(offset, _)| *offset < decl_start)
            .last()
            .map(|(_, ns)| format!("{}.{}", ns, name.as_str()))
            .unwrap_or_else(|| name.as_str().to_string());

        let mut decl = TypeDeclaration::new(&qualified, kind);
        for word in mods.split_whitespace() {
            if let Some(modifier) = Modifier::from_keyword(word) {
                if matches!(modifier, Modifier::Abstract | Modifier::Final | Modifier::Static) {
                    decl.add_modifier(modifier);
                }
            }
        }
        let (extends, implements, components) = parse_heritage(rest, kind, syntax);
        decl.base_types = extends;
        decl.interfaces = implements;
        decl.stereotypes = annotations.iter().map(|a| annotation_name(a).to_string()).collect();

        let ctx = MemberContext {
            type_name: name.as_str(),
            kind,
            syntax,
        };
        let mut methods = Vec::new();

        if let Some(components) = components {
            for param in parse_parameters(&components, syntax) {
                decl.members.push(
                    Member::new(MemberKind::Field, &param.name)
                        .with_visibility(Visibility::Private)
                        .with_type(param.type_name),
                );
            }
        }

        let member_text = if kind == TypeKind::Enum && syntax.language != Language::Php {
            let (constants, remainder) = enum_constants(body, syntax);
            decl.members.extend(constants);
            remainder
        } else {
            body
        };

        for raw in scan_members(member_text, syntax) {
            let (members, method) = classify_member(&raw, &ctx);
            decl.members.extend(members);
            if let Some(method) = method {
                decl.members.push(method.member.clone());
                methods.push(method);
            }
        }

        types.push(ScannedType {
            decl,
            annotations,
            markers,
            methods,
            span: (body_start, body_end),
        });
    }
    types
}

/// Scan top-level functions (JavaScript/TypeScript and PHP) outside `exclude` spans
pub fn scan_functions(text: &str, syntax: &'static Syntax, exclude: &[(usize, usize)]) -> Vec<ScannedMethod> {
    let patterns: Vec<&Regex> = match syntax.language {
        Language::JavaScript => vec![&SCRIPT_FUNCTION, &SCRIPT_ARROW],
        Language::Php => vec![&PHP_FUNCTION],
        _ => return Vec::new(),
    };

    let mut found: Vec<(usize, ScannedMethod, (usize, usize))> = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            let start = name.start();
            if exclude.iter().any(|(s, e)| start >= *s && start < *e) {
                continue;
            }
            let Some((method, span)) = function_at(text, whole.start(), whole.end(), name.as_str(), syntax) else {
                continue;
            };
            found.push((start, method, span));
        }
    }
    found.sort_by_key(|(start, _, _)| *start);

    // drop functions nested in another function's body
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut functions = Vec::new();
    for (start, method, span) in found {
        if spans.iter().any(|(s, e)| start >= *s && start < *e) {
            continue;
        }
        spans.push(span);
        functions.push(method);
    }
    functions
}

fn function_at(
    text: &str,
    match_start: usize,
    match_end: usize,
    name: &str,
    syntax: &'static Syntax,
) -> Option<(ScannedMethod, (usize, usize))> {
    let matched = &text[match_start..match_end];
    let is_async = matched.contains("async");
    let (params_text, after_params) = if matched.ends_with('(') {
        let open = match_end;
        let close = find_balanced_end(&text[open..], '(', ')').map_or(text.len(), |e| open + e);
        (&text[open..close], (close + 1).min(text.len()))
    } else {
        // `x => ...` single parameter arrow
        let arrow = matched.rfind("=>")?;
        let param = matched[..arrow].rsplit(|c: char| c.is_whitespace() || c == '=').find(|s| !s.is_empty())?;
        let start = match_start + matched[..arrow].rfind(param)?;
        (&text[start..start + param.len()], match_start + arrow)
    };

    let rest = &text[after_params..];
    let brace = rest.find('{');
    let semi = rest.find(';');
    let arrow_expr = rest.trim_start().trim_start_matches(|c: char| c != '=' && c != '{' && c != ';');
    let (body, span_end) = match (brace, semi) {
        (Some(b), s) if s.map_or(true, |s| b < s) || !arrow_expr.starts_with("=>") => {
            let inner = after_params + b + 1;
            let end = find_balanced_end(&text[inner..], '{', '}').map_or(text.len(), |e| inner + e);
            (Some(text[inner..end].to_string()), end)
        }
        (_, Some(s)) => {
            let expr = rest[..s].trim().trim_start_matches(|c: char| c != '>').trim_start_matches('>');
            (Some(expr.trim().to_string()), after_params + s)
        }
        _ => (None, text.len()),
    };

    let return_type = rest[..brace.unwrap_or(0).min(rest.len())]
        .trim()
        .strip_prefix(':')
        .map(|t| t.trim().trim_end_matches("=>").trim().to_string());

    let (annotations, markers) = leading_context(text, match_start, syntax);
    let mut member = Member::new(MemberKind::Method, name)
        .with_parameters(parse_parameters(params_text, syntax))
        .with_type(return_type);
    if is_async {
        member.add_modifier(Modifier::Async);
    }
    Some((
        ScannedMethod {
            member,
            annotations,
            markers,
            body,
        },
        (match_start, span_end),
    ))
}
