// Sequence diagram extraction
//
// Every public method with at least one outgoing call becomes an entry point
// started by the actor. Only direct calls inside the entry body are tracked.

use super::source::{Callable, Source, TypeUnit};
use crate::analysis::roles::{self, is_trivial_receiver, role_of, ACTOR};
use crate::extract::block::{extract_balanced, find_balanced_end};
use crate::extract::naming::{collection_element, is_primitive, looks_like_type, strip_type_ref};
use crate::extract::normalize::NormalizeOptions;
use crate::lang::Language;
use crate::model::{Interaction, InteractionKind, MemberKind, Participant, Role, SequenceModel, TypeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?P<this>\$this|this|self)\s*(?:\.|->)\s*)?(?P<recv>\$?[A-Za-z_]\w*)\s*(?:\?\.|\.|->|::)\s*(?P<method>[A-Za-z_]\w*)\s*\(",
    )
    .unwrap()
});

static NEW_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnew\s+(?P<ty>[A-Z][\w.\\]*)\s*(?:<[^<>()]*>)?\s*\(").unwrap());

/// `Order order = ...` / `List<Order> orders;`
static LOCAL_TYPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<ty>[A-Z][\w.]*(?:<[^<>;=()]*>)?(?:\[\])?)\s+(?P<name>[a-z_]\w*)\s*[=;]").unwrap()
});

/// `$order = new Order(...)` / `const order = new Order(...)`
static LOCAL_NEW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<name>\$?[A-Za-z_]\w*)\s*=\s*new\s+(?P<ty>[A-Z][\w.\\]*)").unwrap());

/// Python `order = Order(...)` and annotated locals
static LOCAL_PY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?P<name>[a-z_]\w*)\s*(?::\s*(?P<ann>[A-Z]\w*))?\s*=\s*(?P<ty>[A-Z]\w*)?").unwrap()
});

static EXPRESS_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:app|router)\s*\.\s*(?P<verb>get|post|put|delete|patch)\s*\(\s*['"`](?P<path>[^'"`]*)['"`]"#)
        .unwrap()
});

/// Participant for free functions
const FUNCTION_OWNER: &str = "Controller";
/// Participant for Express route handlers
const ROUTER: &str = "Router";
const MAX_ARGS: usize = 30;

/// Call interactions of every entry point
pub fn extract(text: &str, language: Language) -> SequenceModel {
    let source = Source::read(text, language, &NormalizeOptions::new());
    let mut builder = SequenceBuilder::new(&source);

    for unit in source.types.iter().filter(|t| t.decl.kind != TypeKind::Interface) {
        let owner = unit.short_name();
        let role = role_of(owner);
        for method in unit.methods.iter().filter(|m| is_entry(m)) {
            builder.entry(owner, role, Some(unit), method);
        }
    }
    for function in source.functions.iter().filter(|f| is_entry(f)) {
        builder.entry(FUNCTION_OWNER, Role::Boundary, None, function);
    }
    if language == Language::JavaScript {
        let text = crate::extract::normalize::normalize(text, source.syntax, &NormalizeOptions::new().keep_strings());
        builder.express_routes(&text);
    }
    builder.finish()
}

fn is_entry(method: &Callable) -> bool {
    method.is_public() && method.member.kind == MemberKind::Method && method.has_body()
}

/// `place(order, 3)` with long or nested argument lists elided
fn message(method: &str, args: &str) -> String {
    let args = args.split_whitespace().collect::<Vec<_>>().join(" ");
    if args.len() > MAX_ARGS || args.contains(['(', '{']) {
        format!("{}(...)", method)
    } else {
        format!("{}({})", method, args)
    }
}

struct SequenceBuilder<'s> {
    source: &'s Source,
    model: SequenceModel,
}

impl<'s> SequenceBuilder<'s> {
    fn new(source: &'s Source) -> Self {
        Self {
            source,
            model: SequenceModel::default(),
        }
    }

    /// Calls of one entry body; entries without calls leave no trace
    fn entry(&mut self, owner: &str, role: Role, unit: Option<&TypeUnit>, method: &Callable) {
        let scope = Scope::new(self.source, unit, method);
        let calls = scope.calls(owner);
        if calls.is_empty() {
            return;
        }
        let result = method
            .member
            .type_name
            .as_deref()
            .filter(|t| !matches!(*t, "void" | "None"))
            .unwrap_or("result")
            .to_string();
        self.emit(owner, role, &format!("{}()", method.name()), calls, &result);
    }

    fn express_routes(&mut self, text: &str) {
        for caps in EXPRESS_ROUTE.captures_iter(text) {
            let (Some(whole), Some(verb), Some(path)) = (caps.get(0), caps.name("verb"), caps.name("path")) else {
                continue;
            };
            let Some(open) = text[..whole.end()].rfind('(') else {
                continue;
            };
            let args_end = find_balanced_end(&text[open + 1..], '(', ')').map_or(text.len(), |e| open + 1 + e);
            let args = &text[whole.end().min(args_end)..args_end];
            let Some(brace) = args.find('{') else {
                continue;
            };
            let body = extract_balanced(&args[brace + 1..], '{', '}');
            let handler = Callable::anonymous(body);
            let scope = Scope::new(self.source, None, &handler);
            let calls = scope.calls(ROUTER);
            if calls.is_empty() {
                continue;
            }
            let label = format!("{} {}", verb.as_str().to_uppercase(), path.as_str());
            self.emit(ROUTER, Role::Boundary, &label, calls, "response");
        }
    }

    fn emit(&mut self, owner: &str, role: Role, opening: &str, calls: Vec<Call>, result: &str) {
        self.model.add_participant(ACTOR, Role::Actor);
        self.model.add_participant(owner, role);
        self.model
            .interactions
            .push(Interaction::new(ACTOR, owner, opening, InteractionKind::Sync));
        for call in calls {
            self.model.add_participant(&call.target.name, call.target.role);
            let kind = if call.is_async { InteractionKind::Async } else { InteractionKind::Sync };
            self.model
                .interactions
                .push(Interaction::new(owner, &call.target.name, &call.message, kind));
            if let Some(value) = call.returns {
                self.model
                    .interactions
                    .push(Interaction::new(&call.target.name, owner, &value, InteractionKind::Return));
            }
        }
        self.model
            .interactions
            .push(Interaction::new(owner, ACTOR, result, InteractionKind::Return));
    }

    /// Participants ordered by role, discovery order within a role
    fn finish(mut self) -> SequenceModel {
        self.model.participants.sort_by_key(|p| p.role);
        self.model
    }
}

struct Call {
    target: Participant,
    message: String,
    is_async: bool,
    returns: Option<String>,
}

/// Name resolution inside one entry body
struct Scope<'a> {
    source: &'a Source,
    unit: Option<&'a TypeUnit>,
    method: &'a Callable,
    locals: HashMap<String, String>,
}

impl<'a> Scope<'a> {
    fn new(source: &'a Source, unit: Option<&'a TypeUnit>, method: &'a Callable) -> Self {
        let mut locals = HashMap::new();
        for caps in LOCAL_TYPED.captures_iter(&method.body) {
            locals.insert(caps["name"].to_string(), caps["ty"].to_string());
        }
        for caps in LOCAL_NEW.captures_iter(&method.body) {
            locals.insert(caps["name"].trim_start_matches('$').to_string(), caps["ty"].to_string());
        }
        if source.language() == Language::Python {
            for caps in LOCAL_PY.captures_iter(&method.body) {
                if let Some(ty) = caps.name("ann").or_else(|| caps.name("ty")) {
                    locals.insert(caps["name"].to_string(), ty.as_str().to_string());
                }
            }
        }
        Self {
            source,
            unit,
            method,
            locals,
        }
    }

    /// Declared type of a receiver: field, parameter, then local
    fn declared_type(&self, name: &str) -> Option<String> {
        let field = self.unit.and_then(|u| {
            u.decl
                .field_type(name)
                .or_else(|| u.decl.field_type(&format!("_{}", name)))
        });
        let param = || {
            self.method
                .member
                .parameters
                .iter()
                .find(|p| p.name.trim_start_matches('$') == name)
                .and_then(|p| p.type_name.as_deref())
        };
        field
            .or_else(param)
            .map(str::to_string)
            .or_else(|| self.locals.get(name).cloned())
    }

    fn participant(&self, receiver: &str, method: &str, via_self: bool) -> Option<Participant> {
        let name = receiver.trim_start_matches('$');
        if !via_self && is_trivial_receiver(receiver) {
            return None;
        }
        if let Some(raw) = self.declared_type(name) {
            if collection_element(&raw).is_some() {
                return None;
            }
            let stripped = strip_type_ref(&raw);
            let short = stripped.rsplit('.').next().unwrap_or(&stripped);
            if is_primitive(short) || short.is_empty() {
                return None;
            }
            return Some(Participant::new(short, role_of(short)));
        }
        if !via_self && looks_like_type(name) {
            let short = name.rsplit(['.', '\\']).next().unwrap_or(name);
            return Some(Participant::new(short, role_of(short)));
        }
        let (synthesized, role) = roles::synthesize(receiver, method);
        Some(Participant::new(&synthesized, role))
    }

    /// Known return type of `target.method`, when the target is declared here
    fn return_value(&self, target: &str, method: &str) -> Option<String> {
        let declared = self.source.find_type(target)?;
        let member = declared.decl.methods().find(|m| m.name == method)?;
        Some(member.type_name.clone().unwrap_or_else(|| "result".to_string()))
    }

    fn calls(&self, owner: &str) -> Vec<Call> {
        let body = self.method.body.as_str();
        let syntax = self.source.syntax;
        let mut found: Vec<(usize, Call)> = Vec::new();

        for caps in CALL.captures_iter(body) {
            let (Some(whole), Some(recv), Some(method)) = (caps.get(0), caps.name("recv"), caps.name("method")) else {
                continue;
            };
            let via_self = caps.name("this").is_some();
            let Some(target) = self.participant(recv.as_str(), method.as_str(), via_self) else {
                continue;
            };
            if target.name == owner {
                continue;
            }
            let args_end = find_balanced_end(&body[whole.end()..], '(', ')').map_or(body.len(), |e| whole.end() + e);
            let is_async = syntax.await_is_async && body[..whole.start()].trim_end().ends_with("await");
            let returns = if !syntax.implicit_returns || is_async {
                None
            } else {
                match self.return_value(&target.name, method.as_str()) {
                    Some(value) if matches!(value.as_str(), "void" | "None") => None,
                    Some(value) => Some(value),
                    None => Some("result".to_string()),
                }
            };
            found.push((
                whole.start(),
                Call {
                    message: message(method.as_str(), &body[whole.end()..args_end]),
                    target,
                    is_async,
                    returns,
                },
            ));
        }

        for caps in NEW_CALL.captures_iter(body) {
            let (Some(whole), Some(ty)) = (caps.get(0), caps.name("ty")) else {
                continue;
            };
            let ty = ty.as_str();
            let short = ty.rsplit(['.', '\\']).next().unwrap_or(ty);
            if short == owner || is_primitive(short) || is_trivial_receiver(short) {
                continue;
            }
            let args_end = find_balanced_end(&body[whole.end()..], '(', ')').map_or(body.len(), |e| whole.end() + e);
            found.push((
                whole.start(),
                Call {
                    target: Participant::new(short, role_of(short)),
                    message: message("new", &body[whole.end()..args_end]),
                    is_async: false,
                    returns: None,
                },
            ));
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, call)| call).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(model: &SequenceModel) -> Vec<String> {
        model
            .interactions
            .iter()
            .map(|i| format!("{} {:?} {} : {}", i.from, i.kind, i.to, i.message))
            .collect()
    }

    #[test]
    fn test_java_service_calls() {
        let code = r#"
public class OrderService {
    private OrderRepository repository;
    private EmailClient emailClient;

    public Order placeOrder(Order order) {
        repository.save(order);
        emailClient.send(order, subject, recipientAddress, body);
        return order;
    }

    private void helper() { repository.flush(); }
}
"#;
        let model = extract(code, Language::Java);
        assert_eq!(
            lines(&model),
            vec![
                "User Sync OrderService : placeOrder()",
                "OrderService Sync OrderRepository : save(order)",
                "OrderRepository Return OrderService : result",
                "OrderService Sync EmailClient : send(...)",
                "EmailClient Return OrderService : result",
                "OrderService Return User : Order",
            ]
        );
        let roles: Vec<_> = model.participants.iter().map(|p| (p.name.as_str(), p.role)).collect();
        assert_eq!(
            roles,
            vec![
                ("User", Role::Actor),
                ("EmailClient", Role::Boundary),
                ("OrderService", Role::Control),
                ("OrderRepository", Role::Database),
            ]
        );
    }

    #[test]
    fn test_csharp_has_no_implicit_returns() {
        let code = "public class CartController { private readonly ICartService _cartService; \
                    public IActionResult Add(int id) { _cartService.AddItem(id); return Ok(); } }";
        let model = extract(code, Language::CSharp);
        assert_eq!(
            lines(&model),
            vec![
                "User Sync CartController : Add()",
                "CartController Sync ICartService : AddItem(id)",
                "CartController Return User : IActionResult",
            ]
        );
    }

    #[test]
    fn test_php_this_and_static_calls() {
        let code = "<?php class UserController { public function store($request) { $user = User::create($request); $this->mailer->sendWelcome($user); } }";
        let model = extract(code, Language::Php);
        let targets: Vec<_> = model.interactions.iter().map(|i| i.to.as_str()).collect();
        assert!(targets.contains(&"User"));
        assert!(targets.contains(&"NotificationService"));
    }

    #[test]
    fn test_python_self_fields() {
        let code = "class OrderService:\n    def __init__(self, repo: OrderRepository):\n        self.repo = repo\n\n    def place(self, order):\n        self.repo.save(order)\n";
        let model = extract(code, Language::Python);
        assert_eq!(model.interactions[1].to, "OrderRepository");
        assert_eq!(model.interactions[1].message, "save(order)");
    }

    #[test]
    fn test_javascript_await_is_async() {
        let code = "class OrderController {\n  async create(req, res) {\n    const order = await this.orderService.create(req.body);\n    res.json(order);\n  }\n}";
        let model = extract(code, Language::JavaScript);
        let call = &model.interactions[1];
        assert_eq!(call.to, "OrderService");
        assert_eq!(call.kind, InteractionKind::Async);
    }

    #[test]
    fn test_express_routes() {
        let code = "router.post('/orders', async (req, res) => {\n  const order = await orderService.create(req.body);\n  res.status(201).json(order);\n});";
        let model = extract(code, Language::JavaScript);
        assert_eq!(model.interactions[0].to, "Router");
        assert_eq!(model.interactions[0].message, "POST /orders");
        assert_eq!(model.interactions[1].to, "OrderService");
    }

    #[test]
    fn test_constructor_calls_and_trivial_receivers() {
        let code = "public class Checkout { public void run() { System.out.println(\"x\"); Cart cart = new Cart(); Math.max(1, 2); } }";
        let model = extract(code, Language::Java);
        let targets: Vec<_> = model.interactions.iter().map(|i| i.to.as_str()).collect();
        assert_eq!(targets, vec!["Checkout", "Cart", "User"]);
        assert_eq!(model.interactions[1].message, "new()");
    }

    #[test]
    fn test_methods_without_calls_are_omitted() {
        let model = extract("public class Point { public int getX() { return x; } }", Language::Java);
        assert!(model.interactions.is_empty());
        assert!(model.participants.is_empty());
    }
}
