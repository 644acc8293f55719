// Java parser using tree-sitter

use super::brace::{BraceModule, Grammar, Reader};
use crate::error::{Error, Result};
use crate::extract::normalize::NormalizeOptions;
use crate::extract::syntax::JAVA as JAVA_SYNTAX;
use tree_sitter::Parser;

static JAVA: Grammar = Grammar {
    types: &[
        ("class_declaration", "class"),
        ("interface_declaration", "interface"),
        ("enum_declaration", "enum"),
        ("record_declaration", "record"),
    ],
    functions: &[],
    function_values: &["lambda_expression"],
    bindings: &[],
    ignored_members: &["static_initializer", "block", "annotation_type_declaration"],
    enum_constants: &["enum_constant"],
    enum_members: Some("enum_body_declarations"),
};

/// Parser for Java source fragments
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    /// Create a new Java parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_java::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Java language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse Java source; `None` when the tree contains syntax errors
    pub fn parse_source(&mut self, source: &str, options: NormalizeOptions) -> Result<Option<BraceModule>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;
        let root = tree.root_node();
        if root.has_error() {
            return Ok(None);
        }
        Ok(Some(Reader::new(source, &JAVA, &JAVA_SYNTAX, options).read(&root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberKind, TypeKind, Visibility};

    fn parse(source: &str) -> Option<BraceModule> {
        JavaParser::new()
            .and_then(|mut p| p.parse_source(source, NormalizeOptions::new()))
            .unwrap()
    }

    #[test]
    fn test_class_members() {
        let module = parse(
            "package shop;\n\n@Service\npublic abstract class OrderService extends Base implements Handler, Audited {\n    private final OrderRepository repo;\n    static { init(); }\n    public OrderService(OrderRepository repo) { this.repo = repo; }\n    // @Activity: Place order\n    public Order place(Order order) { return repo.save(order); }\n    protected abstract void audit();\n}\n",
        )
        .expect("clean source parses");
        let service = &module.types[0];
        assert_eq!(service.decl.name, "OrderService");
        assert!(service.decl.is_abstract());
        assert_eq!(service.decl.base_types, vec!["Base"]);
        assert_eq!(service.decl.interfaces, vec!["Handler", "Audited"]);
        assert!(service.has_annotation("Service"));

        let repo = &service.decl.members[0];
        assert_eq!((repo.name.as_str(), repo.kind), ("repo", MemberKind::Field));
        assert_eq!(repo.visibility, Visibility::Private);
        assert_eq!(repo.type_name.as_deref(), Some("OrderRepository"));

        let names: Vec<_> = service.methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["OrderService", "place", "audit"]);
        assert_eq!(service.methods[1].marker("@Activity"), Some("Place order"));
        assert!(service.methods[1].body_text().contains("repo.save(order)"));
        assert!(module.functions.is_empty());
    }

    #[test]
    fn test_enum_and_record() {
        let module = parse(
            "enum Status { OPEN, CLOSED; boolean done() { return this == CLOSED; } }\nrecord Point(int x, int y) implements Shape { }\nclass Outer { class Inner { int n; } }\n",
        )
        .expect("clean source parses");
        let status = &module.types[0];
        assert_eq!(status.decl.kind, TypeKind::Enum);
        let names: Vec<_> = status.decl.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["OPEN", "CLOSED", "done"]);

        let point = &module.types[1];
        assert_eq!(point.decl.name, "Point");
        assert_eq!(point.decl.interfaces, vec!["Shape"]);
        let fields: Vec<_> = point.decl.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "y"]);

        let names: Vec<_> = module.types.iter().map(|t| t.decl.name.as_str()).collect();
        assert_eq!(names, vec!["Status", "Point", "Outer", "Inner"]);
    }

    #[test]
    fn test_broken_source_is_none() {
        assert!(parse("public class Broken { void run( { }").is_none());
    }
}
