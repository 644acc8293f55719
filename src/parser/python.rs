// Python parser using tree-sitter

use super::{
    clean_statement, class_field, collect_instance_fields, docstring_markers, normalized_body, PyClass,
    PyFunction, PyModule,
};
use crate::error::{Error, Result};
use crate::extract::statements::Statement;
use crate::model::Parameter;
use tree_sitter::{Node, Parser};

/// Parser for Python source text
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse Python source; `None` when the tree contains syntax errors
    pub fn parse_source(&mut self, source: &str) -> Result<Option<PyModule>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Ok(None);
        }

        let ctx = Context {
            source: source.as_bytes(),
            lines: source.lines().collect(),
        };
        let mut module = PyModule::default();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match definition(&child) {
                Some((def, decorators)) if def.kind() == "class_definition" => {
                    if let Some(class) = parse_class(&ctx, &child, &def, decorators) {
                        module.classes.push(class);
                    }
                }
                Some((def, decorators)) if def.kind() == "function_definition" => {
                    if let Some(func) = parse_function(&ctx, &child, &def, decorators) {
                        module.functions.push(func);
                    }
                }
                _ => {}
            }
        }

        Ok(Some(module))
    }
}

struct Context<'s> {
    source: &'s [u8],
    lines: Vec<&'s str>,
}

impl Context<'_> {
    fn text(&self, node: &Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    /// Comment lines directly above `row`, skipping decorators
    fn leading_comments(&self, row: usize) -> Vec<String> {
        let mut comments = Vec::new();
        for line in self.lines[..row.min(self.lines.len())].iter().rev() {
            let t = line.trim();
            if t.starts_with('#') {
                comments.push(t.to_string());
            } else if !t.starts_with('@') {
                break;
            }
        }
        comments.reverse();
        comments
    }
}

/// Unwrap a decorated definition into the definition node and its decorators
fn definition<'t>(node: &Node<'t>) -> Option<(Node<'t>, Vec<Node<'t>>)> {
    match node.kind() {
        "class_definition" | "function_definition" => Some((*node, Vec::new())),
        "decorated_definition" => {
            let mut decorators = Vec::new();
            let mut def = None;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "decorator" => decorators.push(child),
                    "class_definition" | "function_definition" => def = Some(child),
                    _ => {}
                }
            }
            def.map(|d| (d, decorators))
        }
        _ => None,
    }
}

fn decorator_texts(ctx: &Context, decorators: &[Node]) -> Vec<String> {
    decorators
        .iter()
        .map(|d| ctx.text(d).trim_start_matches('@').trim().to_string())
        .collect()
}

/// Parse a class definition
fn parse_class(ctx: &Context, outer: &Node, node: &Node, decorators: Vec<Node>) -> Option<PyClass> {
    let name = ctx.text(&node.child_by_field_name("name")?);
    let mut class = PyClass {
        name,
        decorators: decorator_texts(ctx, &decorators),
        markers: ctx.leading_comments(outer.start_position().row),
        ..PyClass::default()
    };

    if let Some(args) = node.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for child in args.named_children(&mut cursor) {
            match child.kind() {
                "keyword_argument" => {
                    let key = child.child_by_field_name("name").map(|n| ctx.text(&n));
                    let value = child.child_by_field_name("value").map(|n| ctx.text(&n));
                    if let (Some(key), Some(value)) = (key, value) {
                        class.keywords.push((key, value));
                    }
                }
                "comment" => {}
                _ => class.bases.push(ctx.text(&child)),
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match definition(&child) {
                Some((def, decorators)) if def.kind() == "function_definition" => {
                    if let Some(method) = parse_function(ctx, &child, &def, decorators) {
                        class.methods.push(method);
                    }
                }
                Some(_) => {}
                None if child.kind() == "expression_statement" => {
                    if let Some(field) = class_field(&clean_statement(&ctx.text(&child))) {
                        class.class_fields.push(field);
                    }
                }
                None => {}
            }
        }
    }

    collect_instance_fields(&mut class);
    Some(class)
}

/// Parse a function definition
fn parse_function(ctx: &Context, outer: &Node, node: &Node, decorators: Vec<Node>) -> Option<PyFunction> {
    let name = ctx.text(&node.child_by_field_name("name")?);
    let mut func = PyFunction {
        name,
        decorators: decorator_texts(ctx, &decorators),
        is_async: has_async_keyword(node),
        return_type: node.child_by_field_name("return_type").map(|t| ctx.text(&t)),
        ..PyFunction::default()
    };
    if let Some(params) = node.child_by_field_name("parameters") {
        func.parameters = parse_parameters(ctx, &params);
    }
    if let Some(body) = node.child_by_field_name("body") {
        func.docstring = docstring(ctx, &body);
        // comments ahead of the first statement attach to the definition node
        let mut cursor = node.walk();
        func.body = node
            .children(&mut cursor)
            .filter(|c| c.kind() == "comment" && c.start_byte() < body.start_byte())
            .filter(|c| c.start_position().row > node.start_position().row)
            .map(|c| Statement::Marker(ctx.text(&c).trim().to_string()))
            .collect();
        func.body.extend(block_statements(ctx, &body));
        func.body_text = normalized_body(&ctx.text(&body));
    }
    func.markers = ctx.leading_comments(outer.start_position().row);
    func.markers.extend(docstring_markers(func.docstring.as_deref()));
    Some(func)
}

/// Check if a function_definition node has an async keyword
fn has_async_keyword(node: &Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == "async");
    found
}

/// Docstring of a block: its first statement when that is a bare string
fn docstring(ctx: &Context, block: &Node) -> Option<String> {
    let first = block.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    Some(strip_quotes(&ctx.text(&string)))
}

fn strip_quotes(text: &str) -> String {
    let s = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let s = if s.starts_with("\"\"\"") || s.starts_with("'''") {
        &s[3..s.len().saturating_sub(3).max(3)]
    } else if s.len() >= 2 {
        &s[1..s.len() - 1]
    } else {
        s
    };
    s.trim().to_string()
}

/// Parse function parameters, dropping `self` and `cls`
fn parse_parameters(ctx: &Context, node: &Node) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => Some(Parameter::new(&ctx.text(&child))),
            "list_splat_pattern" | "dictionary_splat_pattern" => splat_parameter(ctx, &child),
            "typed_parameter" => typed_parameter(ctx, &child),
            "default_parameter" | "typed_default_parameter" => {
                let mut param = child
                    .child_by_field_name("name")
                    .map(|n| Parameter::new(&ctx.text(&n)));
                if let Some(p) = param.as_mut() {
                    p.type_name = child.child_by_field_name("type").map(|t| ctx.text(&t));
                    p.default = child.child_by_field_name("value").map(|v| ctx.text(&v));
                    p.optional = true;
                }
                param
            }
            _ => None,
        };
        if let Some(param) = param {
            if param.name != "self" && param.name != "cls" {
                params.push(param);
            }
        }
    }
    params
}

fn splat_parameter(ctx: &Context, node: &Node) -> Option<Parameter> {
    let mut cursor = node.walk();
    let ident = node.named_children(&mut cursor).find(|c| c.kind() == "identifier")?;
    let mut param = Parameter::new(&ctx.text(&ident));
    param.variadic = true;
    Some(param)
}

fn typed_parameter(ctx: &Context, node: &Node) -> Option<Parameter> {
    let mut param = None;
    let mut type_name = None;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" if param.is_none() => param = Some(Parameter::new(&ctx.text(&child))),
            "list_splat_pattern" | "dictionary_splat_pattern" => param = splat_parameter(ctx, &child),
            "type" => type_name = Some(ctx.text(&child)),
            _ => {}
        }
    }
    let mut param = param?;
    param.type_name = type_name;
    Some(param)
}

/// Statements of a block, in order
fn block_statements(ctx: &Context, block: &Node) -> Vec<Statement> {
    let mut out = Vec::new();
    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        if let Some(stmt) = statement(ctx, &child) {
            out.push(stmt);
        }
    }
    out
}

fn field_statements(ctx: &Context, node: &Node, field: &str) -> Vec<Statement> {
    node.child_by_field_name(field)
        .map(|b| block_statements(ctx, &b))
        .unwrap_or_default()
}

fn field_text(ctx: &Context, node: &Node, field: &str) -> String {
    node.child_by_field_name(field)
        .map(|n| clean_statement(&ctx.text(&n)))
        .unwrap_or_default()
}

/// Block child of a clause node (`except`, `finally`)
fn clause_block<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let block = node.named_children(&mut cursor).find(|c| c.kind() == "block");
    block
}

fn statement(ctx: &Context, node: &Node) -> Option<Statement> {
    match node.kind() {
        "comment" => Some(Statement::Marker(ctx.text(node).trim().to_string())),
        "if_statement" => {
            let mut branches = vec![(field_text(ctx, node, "condition"), field_statements(ctx, node, "consequence"))];
            let mut otherwise = None;
            let mut cursor = node.walk();
            for alt in node.children_by_field_name("alternative", &mut cursor) {
                match alt.kind() {
                    "elif_clause" => {
                        branches.push((field_text(ctx, &alt, "condition"), field_statements(ctx, &alt, "consequence")))
                    }
                    "else_clause" => otherwise = Some(field_statements(ctx, &alt, "body")),
                    _ => {}
                }
            }
            Some(Statement::If { branches, otherwise })
        }
        "for_statement" => {
            let header = format!("{} in {}", field_text(ctx, node, "left"), field_text(ctx, node, "right"));
            Some(Statement::Loop {
                header,
                body: field_statements(ctx, node, "body"),
            })
        }
        "while_statement" => Some(Statement::Loop {
            header: field_text(ctx, node, "condition"),
            body: field_statements(ctx, node, "body"),
        }),
        "try_statement" => {
            let body = field_statements(ctx, node, "body");
            let mut handlers = Vec::new();
            let mut finally = None;
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "except_clause" | "except_group_clause" => {
                        let text = ctx.text(&child);
                        let header = text.split(':').next().unwrap_or("");
                        let parameter = clean_statement(header.trim_start_matches("except").trim_start_matches('*'));
                        let block = clause_block(&child)
                            .map(|b| block_statements(ctx, &b))
                            .unwrap_or_default();
                        handlers.push((parameter, block));
                    }
                    "finally_clause" => {
                        finally = clause_block(&child).map(|b| block_statements(ctx, &b));
                    }
                    _ => {}
                }
            }
            Some(Statement::Try { body, handlers, finally })
        }
        "with_statement" => Some(Statement::Block(field_statements(ctx, node, "body"))),
        "match_statement" => {
            let subject = field_text(ctx, node, "subject");
            let mut cases = Vec::new();
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for case in body.named_children(&mut cursor) {
                    if case.kind() != "case_clause" {
                        continue;
                    }
                    let text = ctx.text(&case);
                    let label = text.split(':').next().unwrap_or("").trim_start_matches("case");
                    cases.push((clean_statement(label), field_statements(ctx, &case, "consequence")));
                }
            }
            Some(Statement::Switch { subject, cases })
        }
        "block" => Some(Statement::Block(block_statements(ctx, node))),
        "expression_statement" => {
            // docstrings and bare literals
            if node.named_child_count() == 1 && node.named_child(0).is_some_and(|c| c.kind() == "string") {
                return None;
            }
            simple(ctx, node)
        }
        "pass_statement" | "break_statement" | "continue_statement" | "function_definition" | "class_definition"
        | "decorated_definition" | "import_statement" | "import_from_statement" => None,
        _ => simple(ctx, node),
    }
}

fn simple(ctx: &Context, node: &Node) -> Option<Statement> {
    let text = clean_statement(&ctx.text(node));
    (!text.is_empty()).then_some(Statement::Simple(text))
}
