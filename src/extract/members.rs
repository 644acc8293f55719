// Member classification for brace languages
//
// Turns a raw member chunk into fields, properties, constants, methods or
// constructors. Each language family gets its own reader; the result types
// are shared.

use super::block::find_balanced_end;
use super::params::{parse_parameters, promoted_visibility, split_default, split_tokens, split_top_level};
use super::scanner::{RawMember, ScannedMethod};
use super::syntax::Syntax;
use crate::lang::Language;
use crate::model::{Member, MemberKind, Modifier, TypeKind, Visibility};
use once_cell::sync::Lazy;
use regex::Regex;

static NESTED_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:class|interface|enum|struct|record|trait)\s+[A-Za-z_$]").unwrap());

static THIS_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bthis\.(?P<name>[A-Za-z_$#][\w$]*)\s*=\s*(?P<value>[^;=\n][^;\n]*)").unwrap()
});

/// Declaring type of the member being classified
pub struct MemberContext<'a> {
    /// Unqualified type name, used to spot constructors
    pub type_name: &'a str,
    pub kind: TypeKind,
    pub syntax: &'static Syntax,
}

impl MemberContext<'_> {
    fn default_visibility(&self) -> Visibility {
        if self.kind == TypeKind::Interface {
            Visibility::Public
        } else {
            self.syntax.default_visibility
        }
    }
}

/// Classify one raw chunk into data members and at most one callable
pub fn classify_member(raw: &RawMember<'_>, ctx: &MemberContext<'_>) -> (Vec<Member>, Option<ScannedMethod>) {
    let header = raw.header.trim();
    if header.is_empty() || NESTED_TYPE.is_match(header) {
        return (Vec::new(), None);
    }
    match ctx.syntax.language {
        Language::Php => classify_php(raw, header, ctx),
        Language::JavaScript => classify_script(raw, header, ctx),
        _ => classify_typed(raw, header, ctx),
    }
}

/// Leading visibility/modifier keywords and the remainder of a header
struct Prelude<'h> {
    visibility: Option<Visibility>,
    modifiers: Vec<Modifier>,
    is_const: bool,
    rest: Vec<&'h str>,
}

fn prelude<'h>(tokens: Vec<&'h str>, syntax: &Syntax) -> Prelude<'h> {
    let mut visibility = None;
    let mut modifiers = Vec::new();
    let mut is_const = false;
    let mut rest = Vec::new();
    let mut in_prelude = true;

    for token in tokens {
        if in_prelude {
            if let Some(v) = syntax.visibility_of(token) {
                visibility = Some(v);
                continue;
            }
            if token == "const" {
                is_const = true;
                continue;
            }
            if syntax.is_modifier(token) {
                if let Some(m) = Modifier::from_keyword(token) {
                    if !modifiers.contains(&m) {
                        modifiers.push(m);
                    }
                }
                continue;
            }
            in_prelude = false;
        }
        rest.push(token);
    }
    Prelude {
        visibility,
        modifiers,
        is_const,
        rest,
    }
}

fn method(raw: &RawMember<'_>, member: Member, body: Option<String>) -> ScannedMethod {
    ScannedMethod {
        member,
        annotations: raw.annotations.clone(),
        markers: raw.markers.clone(),
        body,
    }
}

/// Position of the first top-level `(` that is not part of an initializer
fn call_paren(header: &str) -> Option<usize> {
    let paren = header.find('(')?;
    let eq = header[..paren].find('=');
    eq.is_none().then_some(paren)
}

/// Parameter text and the remainder after the closing paren
fn paren_parts(header: &str, paren: usize) -> (&str, &str) {
    let inner = &header[paren + 1..];
    match find_balanced_end(inner, '(', ')') {
        Some(end) => (&inner[..end], &inner[end + 1..]),
        None => (inner, ""),
    }
}

// ----------------------------------------------------------------------------
// C# and Java
// ----------------------------------------------------------------------------

fn classify_typed(raw: &RawMember<'_>, header: &str, ctx: &MemberContext<'_>) -> (Vec<Member>, Option<ScannedMethod>) {
    let syntax = ctx.syntax;

    // expression-bodied members: `int X => expr;` / `int F() => expr;`
    let (sig, arrow_body) = match header.find("=>") {
        Some(idx) if header[..idx].find('(').is_some() || !header[..idx].contains('=') => {
            (header[..idx].trim(), Some(header[idx + 2..].trim().to_string()))
        }
        _ => (header, None),
    };

    if let Some(paren) = call_paren(sig) {
        let (params, _) = paren_parts(sig, paren);
        let tokens: Vec<&str> = split_tokens(&sig[..paren])
            .into_iter()
            .filter(|t| !t.starts_with('<'))
            .collect();
        let p = prelude(tokens, syntax);
        let Some((name, type_tokens)) = p.rest.split_last() else {
            return (Vec::new(), None);
        };
        let return_type = type_tokens.join(" ");
        let kind = if return_type.is_empty() && *name == ctx.type_name {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };
        let mut member = Member::new(kind, name)
            .with_visibility(p.visibility.unwrap_or_else(|| ctx.default_visibility()))
            .with_type((kind == MemberKind::Method).then_some(return_type))
            .with_parameters(parse_parameters(params, syntax));
        for m in p.modifiers {
            member.add_modifier(m);
        }
        let body = raw.body.map(str::to_string).or(arrow_body);
        return (Vec::new(), Some(method(raw, member, body)));
    }

    let (decl, _) = split_default(sig);
    let declarators = split_top_level(decl, ',');
    let Some(first) = declarators.first() else {
        return (Vec::new(), None);
    };
    let p = prelude(split_tokens(first), syntax);
    let Some((name, type_tokens)) = p.rest.split_last() else {
        return (Vec::new(), None);
    };
    let type_name = type_tokens.join(" ");

    let is_constant = p.is_const
        || (syntax.language == Language::Java
            && (ctx.kind == TypeKind::Interface
                || (p.modifiers.contains(&Modifier::Static) && p.modifiers.contains(&Modifier::Final))));
    let kind = if is_constant {
        MemberKind::Constant
    } else if raw.body.is_some() || arrow_body.is_some() {
        MemberKind::Property
    } else {
        MemberKind::Field
    };

    let visibility = p.visibility.unwrap_or_else(|| ctx.default_visibility());
    let mut members = Vec::new();
    for member_name in std::iter::once(*name).chain(declarators[1..].iter().map(|d| split_default(d).0)) {
        let mut member = Member::new(kind, member_name)
            .with_visibility(visibility)
            .with_type(Some(type_name.clone()));
        for m in &p.modifiers {
            member.add_modifier(*m);
        }
        members.push(member);
    }
    (members, None)
}

// ----------------------------------------------------------------------------
// PHP
// ----------------------------------------------------------------------------

fn classify_php(raw: &RawMember<'_>, header: &str, ctx: &MemberContext<'_>) -> (Vec<Member>, Option<ScannedMethod>) {
    let syntax = ctx.syntax;
    let tokens = split_tokens(header);

    if let Some(fn_idx) = tokens.iter().position(|t| *t == "function" || t.starts_with("function(")) {
        let p = prelude(tokens[..fn_idx].to_vec(), syntax);
        let after = header
            .find("function")
            .map_or("", |i| header[i + "function".len()..].trim_start())
            .trim_start_matches('&');
        let Some(paren) = after.find('(') else {
            return (Vec::new(), None);
        };
        let name = after[..paren].trim();
        if name.is_empty() {
            return (Vec::new(), None);
        }
        let (params_text, tail) = paren_parts(after, paren);
        let return_type = tail.trim().strip_prefix(':').map(|t| t.trim().to_string());
        let kind = if name == "__construct" {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };
        let mut member = Member::new(kind, name)
            .with_visibility(p.visibility.unwrap_or(syntax.default_visibility))
            .with_type(return_type)
            .with_parameters(parse_parameters(params_text, syntax));
        for m in p.modifiers {
            member.add_modifier(m);
        }

        // constructor promotion
        let mut fields = Vec::new();
        if kind == MemberKind::Constructor {
            for (raw_param, param) in split_top_level(params_text, ',').iter().zip(member.parameters.iter()) {
                if let Some(visibility) = promoted_visibility(raw_param, syntax) {
                    fields.push(
                        Member::new(MemberKind::Field, &param.name)
                            .with_visibility(visibility)
                            .with_type(param.type_name.clone()),
                    );
                }
            }
        }
        return (fields, Some(method(raw, member, raw.body.map(str::to_string))));
    }

    // trait imports
    if tokens.first() == Some(&"use") {
        return (Vec::new(), None);
    }

    // backed enum cases
    if tokens.first() == Some(&"case") {
        let (decl, _) = split_default(header);
        let name = decl.trim_start_matches("case").trim();
        if name.is_empty() {
            return (Vec::new(), None);
        }
        return (
            vec![Member::new(MemberKind::Constant, name).with_visibility(Visibility::Public)],
            None,
        );
    }

    let p = prelude(tokens, syntax);
    if p.is_const {
        let text = p.rest.join(" ");
        let members = split_top_level(&text, ',')
            .into_iter()
            .filter_map(|piece| {
                let (decl, _) = split_default(piece);
                // typed constants: `const string NAME = ...`
                let name = decl.split_whitespace().last()?;
                Some(
                    Member::new(MemberKind::Constant, name)
                        .with_visibility(p.visibility.unwrap_or(Visibility::Public)),
                )
            })
            .collect();
        return (members, None);
    }

    // properties: `private ?Type $a = 1, $b`
    let text = p.rest.join(" ");
    let mut type_name: Option<String> = None;
    let mut members = Vec::new();
    for piece in split_top_level(&text, ',') {
        let (decl, _) = split_default(piece);
        let parts: Vec<&str> = decl.split_whitespace().collect();
        let Some(var) = parts.iter().find(|t| t.starts_with('$')) else {
            continue;
        };
        if parts.len() > 1 && type_name.is_none() {
            type_name = Some(parts[..parts.len() - 1].join(" "));
        }
        let mut member = Member::new(MemberKind::Field, var.trim_start_matches('$'))
            .with_visibility(p.visibility.unwrap_or(syntax.default_visibility))
            .with_type(type_name.clone());
        for m in &p.modifiers {
            member.add_modifier(*m);
        }
        members.push(member);
    }
    (members, None)
}

// ----------------------------------------------------------------------------
// JavaScript / TypeScript
// ----------------------------------------------------------------------------

/// Best-effort type of a JavaScript value expression
pub fn infer_script_type(value: &str) -> String {
    let v = value.trim();
    if v.starts_with(['"', '\'', '`']) {
        return "string".to_string();
    }
    if v.parse::<f64>().is_ok() {
        return "number".to_string();
    }
    if v == "true" || v == "false" {
        return "boolean".to_string();
    }
    if v.starts_with('[') {
        return "Array".to_string();
    }
    if v.starts_with('{') {
        return "object".to_string();
    }
    if let Some(rest) = v.strip_prefix("new ") {
        let ty: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$' || *c == '.')
            .collect();
        if !ty.is_empty() {
            return ty;
        }
    }
    "any".to_string()
}

fn script_name_visibility(name: &str, declared: Option<Visibility>) -> (String, Visibility) {
    if let Some(stripped) = name.strip_prefix('#') {
        return (stripped.to_string(), Visibility::Private);
    }
    if let Some(v) = declared {
        return (name.to_string(), v);
    }
    if name.starts_with('_') {
        return (name.to_string(), Visibility::Private);
    }
    (name.to_string(), Visibility::Public)
}

fn classify_script(raw: &RawMember<'_>, header: &str, ctx: &MemberContext<'_>) -> (Vec<Member>, Option<ScannedMethod>) {
    let syntax = ctx.syntax;

    // leading keywords, unless the keyword itself is the member name (`get()`)
    let mut rest = header;
    let mut visibility = None;
    let mut modifiers = Vec::new();
    let mut accessor = false;
    loop {
        let word_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        let word = &rest[..word_len];
        let after = rest[word_len..].trim_start();
        let is_keyword = syntax.visibility_of(word).is_some() || syntax.is_modifier(word);
        if word.is_empty() || !is_keyword || after.is_empty() || after.starts_with(['(', '=', ':', '?', '!', ';', '<']) {
            break;
        }
        if let Some(v) = syntax.visibility_of(word) {
            visibility = Some(v);
        } else if word == "get" || word == "set" {
            accessor = true;
        } else if let Some(m) = Modifier::from_keyword(word) {
            modifiers.push(m);
        }
        rest = after;
    }

    let name_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '#'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return (Vec::new(), None);
    }
    let (name, vis) = script_name_visibility(&rest[..name_len], visibility);
    let after = rest[name_len..].trim_start().trim_start_matches(['?', '!']).trim_start();

    // method: `name(...)` or `name<T>(...)`
    let generic_skipped = if after.starts_with('<') {
        find_balanced_end(&after[1..], '<', '>').map_or(after, |e| after[e + 2..].trim_start())
    } else {
        after
    };
    if generic_skipped.starts_with('(') && !accessor {
        let (params_text, tail) = paren_parts(generic_skipped, 0);
        let return_type = tail.trim().strip_prefix(':').map(|t| t.trim().to_string());
        let kind = if name == "constructor" {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };
        let mut member = Member::new(kind, &name)
            .with_visibility(vis)
            .with_type(return_type)
            .with_parameters(parse_parameters(params_text, syntax));
        for m in modifiers {
            member.add_modifier(m);
        }
        let fields = if kind == MemberKind::Constructor {
            constructor_fields(params_text, &member, raw.body.unwrap_or(""), syntax)
        } else {
            Vec::new()
        };
        return (fields, Some(method(raw, member, raw.body.map(str::to_string))));
    }

    // accessor property
    if accessor {
        let tail = generic_skipped.trim_start_matches(|c: char| c != ')').trim_start_matches(')');
        let ty = tail.trim().strip_prefix(':').map(|t| t.trim().to_string());
        let member = Member::new(MemberKind::Property, &name).with_visibility(vis).with_type(ty);
        return (vec![member], None);
    }

    // `name: Type = value` / `name = value`
    let (decl, value) = split_default(after);
    let declared_type = decl.strip_prefix(':').map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    // arrow function fields are methods
    if let Some(value) = value {
        let v = value.trim_start_matches("async").trim_start();
        let arrow_params = if v.starts_with('(') {
            let (params, tail) = paren_parts(v, 0);
            tail.trim_start().trim_start_matches(|c: char| c != '=').starts_with("=>").then_some(params)
        } else if v.starts_with("function") {
            v.find('(').map(|p| paren_parts(v, p).0)
        } else {
            v.split_once("=>").map(|(p, _)| p.trim()).filter(|p| !p.contains(' '))
        };
        if let Some(params) = arrow_params {
            let mut member = Member::new(MemberKind::Method, &name)
                .with_visibility(vis)
                .with_parameters(parse_parameters(params, syntax));
            if value.starts_with("async") {
                member.add_modifier(Modifier::Async);
            }
            for m in modifiers {
                member.add_modifier(m);
            }
            return (Vec::new(), Some(method(raw, member, raw.body.map(str::to_string))));
        }
    }

    let type_name = declared_type.or_else(|| value.map(infer_script_type));
    let kind = if modifiers.contains(&Modifier::Static) && modifiers.contains(&Modifier::Final) {
        MemberKind::Constant
    } else {
        MemberKind::Field
    };
    let mut member = Member::new(kind, &name).with_visibility(vis).with_type(type_name);
    for m in modifiers {
        member.add_modifier(m);
    }
    (vec![member], None)
}

/// Fields introduced by a constructor: promoted parameters and `this.x = v`
fn constructor_fields(params_text: &str, ctor: &Member, body: &str, syntax: &Syntax) -> Vec<Member> {
    let mut fields: Vec<Member> = Vec::new();
    for (raw_param, param) in split_top_level(params_text, ',').iter().zip(ctor.parameters.iter()) {
        if let Some(visibility) = promoted_visibility(raw_param, syntax) {
            fields.push(
                Member::new(MemberKind::Field, &param.name)
                    .with_visibility(visibility)
                    .with_type(param.type_name.clone()),
            );
        }
    }
    for caps in THIS_ASSIGN.captures_iter(body) {
        let (Some(name), Some(value)) = (caps.name("name"), caps.name("value")) else {
            continue;
        };
        let (name, vis) = script_name_visibility(name.as_str(), None);
        if fields.iter().any(|f| f.name == name) {
            continue;
        }
        let value = value.as_str().trim();
        let inferred = ctor
            .parameters
            .iter()
            .find(|p| p.name == value)
            .and_then(|p| p.type_name.clone())
            .unwrap_or_else(|| infer_script_type(value));
        fields.push(Member::new(MemberKind::Field, &name).with_visibility(vis).with_type(Some(inferred)));
    }
    fields
}

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Enum values as constants, plus the body text that follows them
pub fn enum_constants<'b>(body: &'b str, syntax: &Syntax) -> (Vec<Member>, &'b str) {
    let (values, remainder) = if syntax.language == Language::Java {
        match top_level_semicolon(body) {
            Some(idx) => (&body[..idx], &body[idx + 1..]),
            None => (body, ""),
        }
    } else {
        (body, "")
    };

    let constants = split_top_level(values, ',')
        .into_iter()
        .filter_map(|piece| {
            let (_, piece) = super::scanner::split_annotations(piece);
            let (decl, _) = split_default(piece);
            let name: String = decl
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            (!name.is_empty()).then(|| Member::new(MemberKind::Constant, &name).with_visibility(Visibility::Public))
        })
        .collect();
    (constants, remainder)
}

fn top_level_semicolon(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::scanner::scan_members;
    use crate::extract::syntax::{CSHARP, JAVA, JAVASCRIPT, PHP};

    fn classify_all(body: &str, type_name: &str, kind: TypeKind, syntax: &'static Syntax) -> (Vec<Member>, Vec<ScannedMethod>) {
        let ctx = MemberContext { type_name, kind, syntax };
        let mut members = Vec::new();
        let mut methods = Vec::new();
        for raw in scan_members(body, syntax) {
            let (m, method) = classify_member(&raw, &ctx);
            members.extend(m);
            if let Some(method) = method {
                members.push(method.member.clone());
                methods.push(method);
            }
        }
        (members, methods)
    }

    #[test]
    fn test_java_members() {
        let (members, methods) = classify_all(
            "private static final int MAX = 5; private List<Line> lines = new ArrayList<>(); public Order(String id) { this.id = id; } protected abstract void close(); String name;",
            "Order",
            TypeKind::Class,
            &JAVA,
        );
        assert_eq!(members[0].kind, MemberKind::Constant);
        assert_eq!(members[1].kind, MemberKind::Field);
        assert_eq!(members[1].type_name.as_deref(), Some("List<Line>"));
        assert_eq!(members[2].kind, MemberKind::Constructor);
        assert_eq!(members[2].type_name, None);
        assert_eq!(members[3].visibility, Visibility::Protected);
        assert!(members[3].has_modifier(Modifier::Abstract));
        assert_eq!(members[4].visibility, Visibility::Package);
        assert_eq!(methods.len(), 2);
    }

    #[test]
    fn test_java_interface_defaults_public() {
        let (members, _) = classify_all("Order find(String id);", "Repo", TypeKind::Interface, &JAVA);
        assert_eq!(members[0].visibility, Visibility::Public);
        assert_eq!(members[0].type_name.as_deref(), Some("Order"));
    }

    #[test]
    fn test_csharp_members() {
        let (members, methods) = classify_all(
            "public const int Max = 3; public string Name { get; set; } public int Count => items.Count; internal async Task<Order> LoadAsync(Guid id) { return null; } private readonly IRepo _repo;",
            "Service",
            TypeKind::Class,
            &CSHARP,
        );
        assert_eq!(members[0].kind, MemberKind::Constant);
        assert_eq!(members[1].kind, MemberKind::Property);
        assert_eq!(members[2].kind, MemberKind::Property);
        assert_eq!(members[3].visibility, Visibility::Package);
        assert!(members[3].has_modifier(Modifier::Async));
        assert_eq!(members[3].type_name.as_deref(), Some("Task<Order>"));
        assert_eq!(members[4].visibility, Visibility::Private);
        assert_eq!(methods.len(), 1);
    }

    #[test]
    fn test_php_members() {
        let (members, methods) = classify_all(
            "use HasFactory; const STATUS = 'x'; private ?Customer $customer = null; public function __construct(private OrderRepository $repo) {} public static function make(array $data): static { return new static(); }",
            "Order",
            TypeKind::Class,
            &PHP,
        );
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["STATUS", "customer", "repo", "__construct", "make"]);
        assert_eq!(members[1].type_name.as_deref(), Some("?Customer"));
        assert_eq!(members[2].type_name.as_deref(), Some("OrderRepository"));
        assert_eq!(members[3].kind, MemberKind::Constructor);
        assert!(members[4].has_modifier(Modifier::Static));
        assert_eq!(members[4].type_name.as_deref(), Some("static"));
        assert_eq!(methods.len(), 2);
    }

    #[test]
    fn test_script_members() {
        let (members, methods) = classify_all(
            "#secret = 1; static count = 0; constructor(repo, name) { this.repo = repo; this.items = []; this.name = name; } async load(id) { return 1; } handle = async (req, res) => { send(); }; get total() { return 1; }",
            "Cart",
            TypeKind::Class,
            &JAVASCRIPT,
        );
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["secret", "count", "repo", "items", "name", "constructor", "load", "handle", "total"]);
        assert_eq!(members[0].visibility, Visibility::Private);
        assert_eq!(members[3].type_name.as_deref(), Some("Array"));
        assert!(members[6].has_modifier(Modifier::Async));
        assert_eq!(members[7].kind, MemberKind::Method);
        assert_eq!(members[8].kind, MemberKind::Property);
        assert_eq!(methods.len(), 3);
    }

    #[test]
    fn test_typescript_members() {
        let (members, _) = classify_all(
            "private readonly items: Item[] = []; constructor(private repo: OrderRepo) {} find(id: string): Promise<Order> { return x; }",
            "OrderService",
            TypeKind::Class,
            &JAVASCRIPT,
        );
        assert_eq!(members[0].name, "items");
        assert_eq!(members[0].visibility, Visibility::Private);
        assert_eq!(members[0].type_name.as_deref(), Some("Item[]"));
        assert_eq!(members[1].name, "repo");
        assert_eq!(members[1].type_name.as_deref(), Some("OrderRepo"));
        assert_eq!(members[3].type_name.as_deref(), Some("Promise<Order>"));
    }

    #[test]
    fn test_enum_constants() {
        let (constants, rest) = enum_constants(" RED(1), GREEN(2); private int code; ", &JAVA);
        let names: Vec<_> = constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["RED", "GREEN"]);
        assert_eq!(rest.trim(), "private int code;");

        let (constants, _) = enum_constants(" Active = 1, Inactive ", &CSHARP);
        assert_eq!(constants.len(), 2);
    }

    #[test]
    fn test_infer_script_type() {
        assert_eq!(infer_script_type("'a'"), "string");
        assert_eq!(infer_script_type("42"), "number");
        assert_eq!(infer_script_type("false"), "boolean");
        assert_eq!(infer_script_type("new Map()"), "Map");
        assert_eq!(infer_script_type("compute()"), "any");
    }
}
