// Indentation-based Python reader
//
// Used when tree-sitter reports syntax errors. Lines are grouped into
// logical lines (open brackets and triple-quoted strings continue a line),
// then into a tree by indentation.

use super::{
    clean_statement, class_field, collect_instance_fields, docstring_markers, normalized_body, PyClass,
    PyFunction, PyModule,
};
use crate::extract::block::find_balanced_end;
use crate::extract::normalize::{normalize, NormalizeOptions};
use crate::extract::params::{parse_parameters, split_top_level};
use crate::extract::statements::Statement;
use crate::extract::syntax::PYTHON;
use once_cell::sync::Lazy;
use regex::Regex;

const DIRECTIVES: &[&str] = &["@Activity", "@User", "@System", "@Actor", "@Route"];

static CLASS_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^class\s+(?P<name>[A-Za-z_]\w*)\s*(?:\((?P<args>.*)\))?").unwrap());

static DEF_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<async>async\s+)?def\s+(?P<name>[A-Za-z_]\w*)\s*\(").unwrap());

struct Node {
    text: String,
    children: Vec<Node>,
}

/// Parse Python source without a grammar
pub fn parse(source: &str) -> PyModule {
    let text = normalize(source, &PYTHON, &NormalizeOptions::new().preserve(DIRECTIVES).keep_strings());
    let lines = logical_lines(&text);
    let mut idx = 0;
    let mut nodes = Vec::new();
    while idx < lines.len() {
        nodes.extend(level(&lines, &mut idx));
    }

    let mut module = PyModule::default();
    let mut pending = Pending::default();
    for node in &nodes {
        let t = node.text.as_str();
        if pending.take(t) {
            continue;
        }
        if let Some(class) = parse_class(node, &mut pending) {
            module.classes.push(class);
        } else if let Some(func) = parse_function(node, &mut pending) {
            module.functions.push(func);
        }
        pending = Pending::default();
    }
    module
}

/// Comments and decorators waiting for the next definition
#[derive(Default)]
struct Pending {
    comments: Vec<String>,
    decorators: Vec<String>,
}

impl Pending {
    fn take(&mut self, line: &str) -> bool {
        if line.starts_with('#') {
            self.comments.push(line.to_string());
            true
        } else if let Some(decorator) = line.strip_prefix('@') {
            self.decorators.push(decorator.trim().to_string());
            true
        } else {
            false
        }
    }
}

fn is_definition_start(line: &str) -> bool {
    line.starts_with("def ") || line.starts_with("async def ") || line.starts_with("class ") || line.starts_with('@')
}

/// Join physical lines into (indent, text) logical lines
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut depth = 0i32;
    let mut triple: Option<&'static str> = None;

    for raw in text.lines() {
        let trimmed = raw.trim();
        if let Some((indent, buf)) = current.take() {
            if triple.is_none() && is_definition_start(trimmed) {
                // unbalanced brackets never swallow the next definition
                out.push((indent, buf));
                depth = 0;
            } else {
                let sep = if triple.is_some() || buf.starts_with("\"\"\"") || buf.starts_with("'''") {
                    '\n'
                } else {
                    ' '
                };
                current = Some((indent, format!("{}{}{}", buf, sep, trimmed)));
            }
        }
        if current.is_none() {
            if trimmed.is_empty() {
                continue;
            }
            current = Some((raw.len() - raw.trim_start().len(), trimmed.to_string()));
        }

        scan_line(raw, &mut depth, &mut triple);
        let continued = depth > 0 || triple.is_some() || trimmed.ends_with('\\');
        if !continued {
            if let Some(line) = current.take() {
                out.push(line);
            }
            depth = 0;
        }
    }
    if let Some(line) = current {
        out.push(line);
    }
    out
}

/// Track bracket depth and open triple-quoted strings across a line
fn scan_line(line: &str, depth: &mut i32, triple: &mut Option<&'static str>) {
    let mut rest = line;
    while !rest.is_empty() {
        if let Some(close) = *triple {
            match rest.find(close) {
                Some(p) => {
                    rest = &rest[p + 3..];
                    *triple = None;
                    continue;
                }
                None => return,
            }
        }
        let Some(c) = rest.chars().next() else {
            return;
        };
        if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
            *triple = Some(if c == '"' { "\"\"\"" } else { "'''" });
            rest = &rest[3..];
            continue;
        }
        match c {
            '"' | '\'' => {
                let mut escaped = false;
                let end = rest[1..]
                    .char_indices()
                    .find(|&(_, ch)| {
                        let hit = ch == c && !escaped;
                        escaped = ch == '\\' && !escaped;
                        hit
                    })
                    .map_or(rest.len(), |(i, _)| i + 2);
                rest = &rest[end..];
                continue;
            }
            '(' | '[' | '{' => *depth += 1,
            ')' | ']' | '}' => *depth -= 1,
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
}

/// Nodes at the indentation of `lines[idx]`, each with its deeper lines as children
fn level(lines: &[(usize, String)], idx: &mut usize) -> Vec<Node> {
    let indent = lines[*idx].0;
    let mut nodes = Vec::new();
    while *idx < lines.len() && lines[*idx].0 >= indent {
        let text = lines[*idx].1.clone();
        *idx += 1;
        let mut children = Vec::new();
        while *idx < lines.len() && lines[*idx].0 > indent {
            children.extend(level(lines, idx));
        }
        nodes.push(Node { text, children });
    }
    nodes
}

fn is_docstring(text: &str) -> bool {
    text.starts_with("\"\"\"") || text.starts_with("'''") || text.starts_with("r\"\"\"")
}

fn strip_docstring(text: &str) -> String {
    text.trim_start_matches('r')
        .trim_start_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("\"\"\"")
        .trim_end_matches("'''")
        .trim()
        .to_string()
}

fn parse_class(node: &Node, pending: &mut Pending) -> Option<PyClass> {
    let caps = CLASS_HEADER.captures(&node.text)?;
    let mut class = PyClass {
        name: caps.name("name")?.as_str().to_string(),
        decorators: std::mem::take(&mut pending.decorators),
        markers: std::mem::take(&mut pending.comments),
        ..PyClass::default()
    };
    if let Some(args) = caps.name("args") {
        for arg in split_top_level(args.as_str(), ',') {
            match arg.split_once('=') {
                Some((key, value)) if !value.starts_with('=') => {
                    class.keywords.push((key.trim().to_string(), value.trim().to_string()))
                }
                _ => class.bases.push(arg.to_string()),
            }
        }
    }

    let mut inner = Pending::default();
    for child in &node.children {
        let t = child.text.as_str();
        if inner.take(t) || is_docstring(t) {
            continue;
        }
        if let Some(method) = parse_function(child, &mut inner) {
            class.methods.push(method);
        } else if !t.starts_with("class ") {
            if let Some(field) = class_field(&clean_statement(t)) {
                class.class_fields.push(field);
            }
        }
        inner = Pending::default();
    }
    collect_instance_fields(&mut class);
    Some(class)
}

fn parse_function(node: &Node, pending: &mut Pending) -> Option<PyFunction> {
    let text = node.text.as_str();
    let caps = DEF_HEADER.captures(text)?;
    let open = caps.get(0)?.end();
    let (params, after) = match find_balanced_end(&text[open..], '(', ')') {
        Some(end) => (&text[open..open + end], &text[open + end + 1..]),
        None => (&text[open..], ""),
    };
    let (signature_tail, inline) = match after.split_once(':') {
        Some((tail, inline)) => (tail, inline.trim()),
        None => (after, ""),
    };
    let return_type = signature_tail
        .trim()
        .strip_prefix("->")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let mut func = PyFunction {
        name: caps.name("name")?.as_str().to_string(),
        decorators: std::mem::take(&mut pending.decorators),
        markers: std::mem::take(&mut pending.comments),
        parameters: parse_parameters(params, &PYTHON),
        return_type,
        is_async: caps.name("async").is_some(),
        ..PyFunction::default()
    };

    let mut children: &[Node] = &node.children;
    if let Some(first) = children.first().filter(|n| is_docstring(&n.text)) {
        func.docstring = Some(strip_docstring(&first.text));
        children = &children[1..];
    }
    func.markers.extend(docstring_markers(func.docstring.as_deref()));

    let mut raw_body = String::new();
    if !inline.is_empty() {
        raw_body.push_str(inline);
        raw_body.push('\n');
        func.body.extend(statements(&[Node {
            text: inline.to_string(),
            children: Vec::new(),
        }]));
    }
    write_body(children, 0, &mut raw_body);
    func.body.extend(statements(children));
    func.body_text = normalized_body(&raw_body);
    Some(func)
}

fn write_body(nodes: &[Node], depth: usize, out: &mut String) {
    for node in nodes {
        out.push_str(&"    ".repeat(depth));
        out.push_str(&node.text);
        out.push('\n');
        write_body(&node.children, depth + 1, out);
    }
}

/// `keyword header: inline` -> (header, inline statement)
fn clause<'t>(text: &'t str, keyword: &str) -> Option<(&'t str, &'t str)> {
    let rest = text.strip_prefix(keyword)?;
    if !(rest.is_empty() || rest.starts_with([' ', '(', ':'])) {
        return None;
    }
    let colon = top_level_colon(rest)?;
    Some((rest[..colon].trim(), rest[colon + 1..].trim()))
}

fn top_level_colon(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ':' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Body of a clause: its inline statement plus its indented children
fn clause_body(inline: &str, node: &Node) -> Vec<Statement> {
    let mut body = Vec::new();
    if !inline.is_empty() {
        body.extend(statements(&[Node {
            text: inline.to_string(),
            children: Vec::new(),
        }]));
    }
    body.extend(statements(&node.children));
    body
}

fn statements(nodes: &[Node]) -> Vec<Statement> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < nodes.len() {
        let node = &nodes[i];
        i += 1;
        let raw = node.text.as_str();
        if raw.starts_with('#') {
            out.push(Statement::Marker(raw.to_string()));
            continue;
        }
        if is_docstring(raw) || raw.starts_with('@') || is_definition_start(raw) {
            continue;
        }
        let text = clean_statement(raw);

        if let Some((condition, inline)) = clause(&text, "if") {
            let mut branches = vec![(condition.to_string(), clause_body(inline, node))];
            let mut otherwise = None;
            while let Some(next) = nodes.get(i) {
                let next_text = clean_statement(&next.text);
                if let Some((condition, inline)) = clause(&next_text, "elif") {
                    branches.push((condition.to_string(), clause_body(inline, next)));
                    i += 1;
                } else if let Some((_, inline)) = clause(&next_text, "else") {
                    otherwise = Some(clause_body(inline, next));
                    i += 1;
                    break;
                } else {
                    break;
                }
            }
            out.push(Statement::If { branches, otherwise });
        } else if let Some((header, inline)) = clause(&text, "for").or_else(|| clause(&text, "async for")) {
            out.push(Statement::Loop {
                header: header.to_string(),
                body: clause_body(inline, node),
            });
            i += skip_clause(nodes, i, "else");
        } else if let Some((header, inline)) = clause(&text, "while") {
            out.push(Statement::Loop {
                header: header.to_string(),
                body: clause_body(inline, node),
            });
            i += skip_clause(nodes, i, "else");
        } else if let Some((_, inline)) = clause(&text, "try") {
            let body = clause_body(inline, node);
            let mut handlers = Vec::new();
            let mut finally = None;
            while let Some(next) = nodes.get(i) {
                let next_text = clean_statement(&next.text);
                if let Some((parameter, inline)) = clause(&next_text, "except") {
                    handlers.push((parameter.trim_start_matches('*').trim().to_string(), clause_body(inline, next)));
                } else if let Some((_, inline)) = clause(&next_text, "finally") {
                    finally = Some(clause_body(inline, next));
                } else if clause(&next_text, "else").is_none() {
                    break;
                }
                i += 1;
            }
            out.push(Statement::Try { body, handlers, finally });
        } else if let Some((_, inline)) = clause(&text, "with").or_else(|| clause(&text, "async with")) {
            out.push(Statement::Block(clause_body(inline, node)));
        } else if let Some((subject, _)) = clause(&text, "match") {
            let cases = node
                .children
                .iter()
                .filter_map(|case| {
                    let case_text = clean_statement(&case.text);
                    let (label, inline) = clause(&case_text, "case")?;
                    Some((label.to_string(), clause_body(inline, case)))
                })
                .collect();
            out.push(Statement::Switch {
                subject: subject.to_string(),
                cases,
            });
        } else if !matches!(text.as_str(), "pass" | "break" | "continue" | "") && !text.starts_with("import ")
            && !text.starts_with("from ")
        {
            out.push(Statement::Simple(text));
        }
    }
    out
}

/// Length of a trailing `else:` clause at `i`, if any
fn skip_clause(nodes: &[Node], i: usize, keyword: &str) -> usize {
    nodes
        .get(i)
        .filter(|n| clause(&clean_statement(&n.text), keyword).is_some())
        .map_or(0, |_| 1)
}
