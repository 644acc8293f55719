// Tree walk shared by the brace-language grammars
//
// The grammar decides where declarations, members and bodies start and end.
// Header text between those boundaries is normalized and classified by the
// same member rules as the declaration scanner, so both paths agree on what a
// member is.

use crate::extract::members::{classify_member, MemberContext};
use crate::extract::normalize::{normalize, NormalizeOptions};
use crate::extract::params::parse_parameters;
use crate::extract::scanner::{
    annotation_name, parse_heritage, raw_member, split_annotations, split_markers, ScannedMethod, ScannedType,
};
use crate::extract::syntax::Syntax;
use crate::model::{Member, MemberKind, Modifier, TypeDeclaration, TypeKind, Visibility};
use tree_sitter::Node;

/// Node kinds one grammar uses for the constructs we read
pub(super) struct Grammar {
    /// Declaration node kind and the type keyword it stands for
    pub types: &'static [(&'static str, &'static str)],
    /// Function nodes recorded under their own name
    pub functions: &'static [&'static str],
    /// Function values recorded under the variable they are bound to
    pub function_values: &'static [&'static str],
    /// Variable statements whose declarators may bind a function
    pub bindings: &'static [&'static str],
    /// Type body entries that are neither members nor comments
    pub ignored_members: &'static [&'static str],
    pub enum_constants: &'static [&'static str],
    /// Wrapper around the regular members of an enum body
    pub enum_members: Option<&'static str>,
}

/// Declarations read from one syntax tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BraceModule {
    pub types: Vec<ScannedType>,
    /// Functions outside types and outside other functions
    pub functions: Vec<ScannedMethod>,
}

pub(super) struct Reader<'s> {
    source: &'s str,
    grammar: &'static Grammar,
    syntax: &'static Syntax,
    options: NormalizeOptions,
    module: BraceModule,
}

impl<'s> Reader<'s> {
    pub(super) fn new(
        source: &'s str,
        grammar: &'static Grammar,
        syntax: &'static Syntax,
        options: NormalizeOptions,
    ) -> Self {
        Self {
            source,
            grammar,
            syntax,
            options,
            module: BraceModule::default(),
        }
    }

    pub(super) fn read(mut self, root: &Node) -> BraceModule {
        self.visit(root, false);
        self.module
    }

    fn slice(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or("")
    }

    fn text(&self, node: &Node) -> &'s str {
        self.slice(node.start_byte(), node.end_byte())
    }

    fn clean(&self, raw: &str) -> String {
        normalize(raw, self.syntax, &self.options)
    }

    fn type_keyword(&self, kind: &str) -> Option<&'static str> {
        self.grammar
            .types
            .iter()
            .find(|(node_kind, _)| *node_kind == kind)
            .map(|(_, keyword)| *keyword)
    }

    fn visit(&mut self, node: &Node, in_function: bool) {
        let kind = node.kind();
        if let Some(keyword) = self.type_keyword(kind) {
            self.read_type(node, keyword);
            return;
        }

        if self.grammar.bindings.contains(&kind) {
            self.read_bindings(node, in_function);
            return;
        }

        if !in_function && self.grammar.functions.contains(&kind) {
            if let Some(name) = node.child_by_field_name("name") {
                let name = self.text(&name);
                self.push_function(node, name);
            }
        }

        let nested = in_function || self.is_function(kind);
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(&child, nested);
        }
    }

    fn is_function(&self, kind: &str) -> bool {
        self.grammar.functions.contains(&kind) || self.grammar.function_values.contains(&kind)
    }

    /// `const handler = async (req, res) => { ... }`
    fn read_bindings(&mut self, node: &Node, in_function: bool) {
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            let name = declarator.child_by_field_name("name");
            let value = declarator.child_by_field_name("value");
            match (name, value) {
                (Some(name), Some(value)) if self.grammar.function_values.contains(&value.kind()) => {
                    if !in_function && name.kind() == "identifier" {
                        let name = self.text(&name);
                        self.push_function(&value, name);
                    }
                    self.visit_children(&value, true);
                }
                _ => self.visit(&declarator, in_function),
            }
        }
    }

    fn visit_children(&mut self, node: &Node, in_function: bool) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(&child, in_function);
        }
    }

    fn push_function(&mut self, node: &Node, name: &str) {
        let parameters = node
            .child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter"))
            .map(|p| self.clean(strip_parens(self.text(&p))))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("return_type")
            .map(|t| self.clean(self.text(&t).trim_start().trim_start_matches(':')))
            .filter(|t| !t.is_empty());
        let body = node.child_by_field_name("body").map(|b| self.body_text(&b));

        let mut member = Member::new(MemberKind::Method, name)
            .with_parameters(parse_parameters(&parameters, self.syntax))
            .with_type(return_type);
        if has_token(node, "async") {
            member.add_modifier(Modifier::Async);
        }
        let markers = self.leading_markers(&statement_of(node));
        self.module.functions.push(ScannedMethod {
            member,
            annotations: Vec::new(),
            markers,
            body,
        });
    }

    /// Block content without braces, or the expression of an expression body
    fn body_text(&self, body: &Node) -> String {
        let text = self.text(body);
        let inner = text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(text);
        self.clean(inner)
    }

    /// Preserved comment lines directly above `node`, decorators skipped
    fn leading_markers(&self, node: &Node) -> Vec<String> {
        let mut comments = Vec::new();
        let mut current = node.prev_named_sibling();
        while let Some(sibling) = current {
            if is_comment(&sibling) {
                comments.push(sibling);
            } else if sibling.kind() != "decorator" {
                break;
            }
            current = sibling.prev_named_sibling();
        }
        comments
            .iter()
            .rev()
            .flat_map(|comment| {
                self.clean(self.text(comment))
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn read_type(&mut self, node: &Node, keyword: &str) {
        let (Some(name_node), Some(body)) = (node.child_by_field_name("name"), node.child_by_field_name("body"))
        else {
            return;
        };
        let name = self.text(&name_node).to_string();
        let kind = TypeKind::from_keyword(keyword);
        let outer = statement_of(node);

        // modifiers, annotations and decorators sit before the name
        let prefix = self.clean(self.slice(outer.start_byte(), name_node.start_byte()));
        let (prefix_markers, prefix) = split_markers(&prefix, self.syntax);
        let (annotations, keywords) = split_annotations(&prefix);

        let mut decl = TypeDeclaration::new(&name, kind);
        for word in keywords.split_whitespace() {
            if let Some(modifier) = Modifier::from_keyword(word) {
                if matches!(modifier, Modifier::Abstract | Modifier::Final | Modifier::Static) {
                    decl.add_modifier(modifier);
                }
            }
        }

        let heritage = self.clean(self.slice(name_node.end_byte(), body.start_byte()));
        let (extends, implements, components) = parse_heritage(&heritage, kind, self.syntax);
        decl.base_types = extends;
        decl.interfaces = implements;
        decl.stereotypes = annotations.iter().map(|a| annotation_name(a).to_string()).collect();

        if let Some(components) = components {
            for param in parse_parameters(&components, self.syntax) {
                decl.members.push(
                    Member::new(MemberKind::Field, &param.name)
                        .with_visibility(Visibility::Private)
                        .with_type(param.type_name),
                );
            }
        }

        let ctx = MemberContext {
            type_name: &name,
            kind,
            syntax: self.syntax,
        };
        let mut methods = Vec::new();
        let mut nested = Vec::new();
        self.read_members(&body, &ctx, &mut decl, &mut methods, &mut nested);

        let mut markers = self.leading_markers(&outer);
        markers.extend(prefix_markers);
        self.module.types.push(ScannedType {
            decl,
            annotations,
            markers,
            methods,
            span: (body.start_byte(), body.end_byte()),
        });

        for inner in nested {
            self.visit(&inner, false);
        }
    }

    fn read_members<'t>(
        &self,
        body: &Node<'t>,
        ctx: &MemberContext<'_>,
        decl: &mut TypeDeclaration,
        methods: &mut Vec<ScannedMethod>,
        nested: &mut Vec<Node<'t>>,
    ) {
        // decorators that the grammar places beside the member they belong to
        let mut decorators: Vec<&str> = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let kind = child.kind();
            if is_comment(&child) {
                continue;
            }
            if kind == "decorator" {
                decorators.push(self.text(&child));
                continue;
            }
            if self.type_keyword(kind).is_some() {
                nested.push(child);
            } else if self.grammar.enum_constants.contains(&kind) {
                let name_node = child.child_by_field_name("name").unwrap_or(child);
                let name = self.text(&name_node);
                if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                    decl.members
                        .push(Member::new(MemberKind::Constant, name).with_visibility(Visibility::Public));
                }
            } else if self.grammar.enum_members == Some(kind) {
                self.read_members(&child, ctx, decl, methods, nested);
            } else if !self.grammar.ignored_members.contains(&kind) {
                self.read_member(&child, &decorators, ctx, decl, methods);
            }
            decorators.clear();
        }
    }

    fn read_member(
        &self,
        node: &Node,
        decorators: &[&str],
        ctx: &MemberContext<'_>,
        decl: &mut TypeDeclaration,
        methods: &mut Vec<ScannedMethod>,
    ) {
        let body = member_body(node);
        let end = body.map_or(node.end_byte(), |b| b.start_byte());
        let mut raw = decorators.join(" ");
        raw.push(' ');
        raw.push_str(self.slice(node.start_byte(), end));
        let header = self.clean(&raw);
        let header = header.trim_end_matches([';', ',', ' ']);
        let body_text = body.map(|b| self.body_text(&b));

        let Some(mut member) = raw_member(header, body_text.as_deref(), self.syntax) else {
            return;
        };
        let mut markers = self.leading_markers(node);
        markers.append(&mut member.markers);
        member.markers = markers;

        let (members, method) = classify_member(&member, ctx);
        decl.members.extend(members);
        if let Some(method) = method {
            decl.members.push(method.member.clone());
            methods.push(method);
        }
    }
}

fn is_comment(node: &Node) -> bool {
    node.kind().ends_with("comment")
}

/// Any direct child token of the given kind, e.g. `async`
fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == token);
    found
}

/// Outermost export or variable statement wrapping a declaration
fn statement_of<'t>(node: &Node<'t>) -> Node<'t> {
    let mut current = *node;
    while let Some(parent) = current.parent() {
        if !matches!(
            parent.kind(),
            "export_statement" | "variable_declarator" | "lexical_declaration" | "variable_declaration"
        ) {
            break;
        }
        current = parent;
    }
    current
}

/// Block of a member: its `body`, or the block of a function bound to a field
fn member_body<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if let Some(body) = node.child_by_field_name("body") {
        return Some(body);
    }
    let value = node.child_by_field_name("value")?;
    if matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
        return value
            .child_by_field_name("body")
            .filter(|b| b.kind() == "statement_block");
    }
    None
}

fn strip_parens(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(trimmed)
}
