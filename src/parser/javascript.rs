// JavaScript/TypeScript parser using tree-sitter

use super::brace::{BraceModule, Grammar, Reader};
use crate::error::{Error, Result};
use crate::extract::normalize::NormalizeOptions;
use crate::extract::syntax::JAVASCRIPT;
use tree_sitter::Parser;

static SCRIPT: Grammar = Grammar {
    types: &[
        ("class_declaration", "class"),
        ("abstract_class_declaration", "class"),
        ("interface_declaration", "interface"),
        ("enum_declaration", "enum"),
    ],
    functions: &[
        "function_declaration",
        "generator_function_declaration",
        "function_expression",
        "function",
        "generator_function",
    ],
    function_values: &["arrow_function", "function_expression", "function", "generator_function"],
    bindings: &["lexical_declaration", "variable_declaration"],
    ignored_members: &["class_static_block", "index_signature", "call_signature", "construct_signature"],
    enum_constants: &["property_identifier", "enum_assignment"],
    enum_members: None,
};

/// Parser for JavaScript/TypeScript source fragments
pub struct JavaScriptParser {
    js_parser: Parser,
    ts_parser: Parser,
}

impl JavaScriptParser {
    /// Create a new JavaScript/TypeScript parser
    pub fn new() -> Result<Self> {
        let mut js_parser = Parser::new();
        let js_language = tree_sitter_javascript::language();
        js_parser
            .set_language(&js_language)
            .map_err(|e| Error::Parser(format!("Failed to set JavaScript language: {}", e)))?;

        let mut ts_parser = Parser::new();
        let ts_language = tree_sitter_typescript::language_typescript();
        ts_parser
            .set_language(&ts_language)
            .map_err(|e| Error::Parser(format!("Failed to set TypeScript language: {}", e)))?;

        Ok(Self { js_parser, ts_parser })
    }

    /// Parse with the JavaScript grammar, then TypeScript; `None` when both report errors
    pub fn parse_source(&mut self, source: &str, options: NormalizeOptions) -> Result<Option<BraceModule>> {
        for parser in [&mut self.js_parser, &mut self.ts_parser] {
            let tree = parser
                .parse(source, None)
                .ok_or_else(|| Error::parser("Failed to parse source"))?;
            let root = tree.root_node();
            if !root.has_error() {
                return Ok(Some(Reader::new(source, &SCRIPT, &JAVASCRIPT, options).read(&root)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberKind, Modifier, TypeKind, Visibility};

    fn parse(source: &str) -> Option<BraceModule> {
        JavaScriptParser::new()
            .and_then(|mut p| p.parse_source(source, NormalizeOptions::new()))
            .unwrap()
    }

    #[test]
    fn test_javascript_class_with_private_field() {
        let module = parse(
            "export class Cart extends Base {\n  #items = [];\n  // @Activity: Add item\n  add(item) { this.#items.push(item); }\n  handle = () => { this.clear(); };\n}\n",
        )
        .expect("clean source parses");
        assert_eq!(module.types.len(), 1);
        let cart = &module.types[0];
        assert_eq!(cart.decl.name, "Cart");
        assert_eq!(cart.decl.base_types, vec!["Base"]);

        let names: Vec<_> = cart.decl.members.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"items"));
        let items = cart.decl.members.iter().find(|m| m.name == "items").unwrap();
        assert_eq!(items.visibility, Visibility::Private);

        let add = cart.methods.iter().find(|m| m.name() == "add").expect("add is a method");
        assert_eq!(add.marker("@Activity"), Some("Add item"));
        assert!(add.body_text().contains("push(item)"));
        assert!(cart.methods.iter().any(|m| m.name() == "handle"));
    }

    #[test]
    fn test_top_level_functions() {
        let module = parse(
            "// @Activity: Checkout\nexport async function checkout(cart) { await pay(cart); }\nconst total = (items) => items.length;\nfunction outer() { function inner() {} }\n",
        )
        .expect("clean source parses");
        let names: Vec<_> = module.functions.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["checkout", "total", "outer"]);
        assert!(module.functions[0].member.has_modifier(Modifier::Async));
        assert_eq!(module.functions[0].marker("@Activity"), Some("Checkout"));
        assert_eq!(module.functions[1].member.parameters[0].name, "items");
    }

    #[test]
    fn test_typescript_falls_back_to_typescript_grammar() {
        let module = parse(
            "interface Repo { find(id: number): Order; }\n@Injectable()\nexport class OrderService implements Repo {\n  constructor(private repo: Repo) {}\n  find(id: number): Order { return this.repo.find(id); }\n}\nenum Status { Open, Closed = 'closed' }\n",
        )
        .expect("typescript parses");
        let kinds: Vec<_> = module.types.iter().map(|t| (t.decl.name.as_str(), t.decl.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Repo", TypeKind::Interface),
                ("OrderService", TypeKind::Class),
                ("Status", TypeKind::Enum)
            ]
        );
        let service = &module.types[1];
        assert_eq!(service.decl.interfaces, vec!["Repo"]);
        assert!(service.has_annotation("Injectable"));
        assert!(service.decl.members.iter().any(|m| m.kind == MemberKind::Constructor));

        let constants: Vec<_> = module.types[2].decl.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(constants, vec!["Open", "Closed"]);
    }

    #[test]
    fn test_broken_source_is_none() {
        assert!(parse("class Broken { run( { }").is_none());
    }
}
