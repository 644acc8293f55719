// Use case extraction
//
// Endpoints are discovered by framework convention: routed controller
// actions, decorated Python views, Express routes and the other JavaScript
// entry shapes. Each endpoint becomes one use case named after its action.

use super::source::{Callable, Source, TypeUnit};
use crate::analysis::roles::{actor_for, ACTOR};
use crate::extract::block::extract_balanced;
use crate::extract::naming::{capitalize, humanize, split_words, title_words};
use crate::extract::normalize::{NormalizeOptions, USE_CASE_MARKERS};
use crate::extract::scanner::{annotation_args, annotation_name};
use crate::lang::Language;
use crate::model::{MemberKind, UseCase, UseCaseLink, UseCaseLinkKind, UseCaseModel};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Name of the system boundary and of the internal actor
pub const SYSTEM: &str = "System";
const AUTHENTICATE: &str = "Authenticate User";
const AUTH_SYSTEM: &str = "Authentication System";
const VALIDATE: &str = "Validate Input";
const API_CLIENT: &str = "API Client";
const GRAPHQL_CLIENT: &str = "GraphQL Client";
const SOCKET_CLIENT: &str = "WebSocket Client";

const VERB_ACTIONS: &[(&str, &str)] = &[
    ("GET", "Query"),
    ("POST", "Create"),
    ("PUT", "Update"),
    ("DELETE", "Delete"),
    ("PATCH", "Modify"),
];

const HTTP_WORDS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Leading words that already name the action
const ACTION_VERBS: &[&str] = &[
    "create", "add", "register", "update", "edit", "modify", "delete", "remove", "list", "view",
    "show", "query", "search", "find", "submit", "cancel", "approve", "reject", "login", "logout",
    "upload", "download", "export", "import", "send", "process", "manage", "validate", "checkout",
    "pay", "reset", "change", "assign", "authenticate", "resolve", "handle", "fetch", "retrieve",
    "save", "publish", "archive", "confirm",
];

/// Laravel resource actions: method, verb, action
const RESOURCE_ACTIONS: &[(&str, &str, &str)] = &[
    ("index", "GET", "List"),
    ("show", "GET", "View"),
    ("create", "GET", "Create"),
    ("store", "POST", "Create"),
    ("edit", "GET", "Edit"),
    ("update", "PUT", "Update"),
    ("destroy", "DELETE", "Delete"),
];

const JAVA_MAPPINGS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

const CSHARP_ATTRIBUTES: &[(&str, &str)] = &[
    ("HttpGet", "GET"),
    ("HttpPost", "POST"),
    ("HttpPut", "PUT"),
    ("HttpDelete", "DELETE"),
    ("HttpPatch", "PATCH"),
];

/// Use cases that pull in authentication or input validation
const GUARDED_ACTIONS: &[&str] = &["Create", "Update", "Delete", "Manage", "Modify"];
const VALIDATED_ACTIONS: &[&str] = &["Create", "Update", "Submit"];

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["'`]([^"'`]*)["'`]"#).unwrap());

static REQUEST_METHOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"RequestMethod\.(\w+)").unwrap());

/// `methods: ['POST']`, `methods={"POST"}`, `methods=["POST"]`
static METHODS_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"methods\s*[:=]\s*[\[{(]\s*["'](\w+)["']"#).unwrap());

static PY_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^[A-Za-z_][\w.]*\.(?P<verb>get|post|put|delete|patch|route|api_route)\s*\((?P<args>.*)\)\s*$")
        .unwrap()
});

static LARAVEL_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"Route::(?P<verb>get|post|put|patch|delete)\s*\(\s*['"](?P<path>[^'"]*)['"]\s*,\s*\[\s*(?P<ctrl>[\w\\]+)::class\s*,\s*['"](?P<method>\w+)['"]"#,
    )
    .unwrap()
});

static EXPRESS_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?:app|router|\w+Router)\s*\.\s*(?P<verb>get|post|put|delete|patch)\s*\(\s*['"`](?P<path>[^'"`]*)['"`]"#,
    )
    .unwrap()
});

/// Trailing handler reference of a route call: `orderController.create`
static HANDLER_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:(?P<recv>[A-Za-z_$][\w$]*)\.)?(?P<name>[A-Za-z_$][\w$]*)\s*$").unwrap());

static USE_CASE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:function\s+|class\s+|(?:const|let|var)\s+)(?P<name>[A-Za-z_$][\w$]*UseCase)\b").unwrap()
});

static NEXT_PAGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+default\s+(?:async\s+)?function\s*(?P<name>\w*)\s*\(\s*req\s*,\s*res\s*\)").unwrap()
});

static NEXT_APP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+(?:async\s+)?function\s+(?P<verb>GET|POST|PUT|DELETE|PATCH)\s*\(").unwrap()
});

static REQ_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"req\.method\s*===?\s*['"](?P<verb>[A-Z]+)['"]"#).unwrap());

static GRAPHQL_RESOLVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<name>[A-Za-z_]\w*)\s*:\s*(?:async\s+)?\(\s*(?:parent|root|obj|_)\s*,[^)]*\)\s*=>").unwrap()
});

static SOCKET_EVENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bsocket\s*\.\s*on\s*\(\s*['"`](?P<event>[^'"`]+)['"`]"#).unwrap());

static AUTH_MIDDLEWARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:requireAuth|authenticate|verifyToken|checkAuth|authMiddleware|verifyJWT|isAuthenticated)\b|passport\.authenticate|jwt\.verify",
    )
    .unwrap()
});

static VALIDATION_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:validate|check|verify)\w*\s*\(").unwrap());

/// `@Actor: Administrator -> deleteUser`
static ACTOR_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Actor:\s*(?P<actor>[^\n>]+?)\s*->\s*(?P<method>[A-Za-z_$][\w$]*)").unwrap());

/// One discovered entry point
#[derive(Debug, Clone, Default)]
struct Endpoint {
    /// Source method or handler, empty for inline handlers
    method: String,
    verb: Option<String>,
    route: Option<String>,
    /// Owning controller or class
    subject: String,
    body: String,
    /// Actor from a marker on the method itself
    declared_actor: Option<String>,
    /// Actor fixed by the entry shape
    actor: Option<&'static str>,
    /// Name fixed by the entry shape
    name: Option<String>,
}

impl Endpoint {
    fn action(method: &Callable, subject: &str) -> Self {
        Self {
            method: method.name().to_string(),
            subject: subject.to_string(),
            body: method.body.clone(),
            declared_actor: method
                .marker("@Actor")
                .filter(|value| !value.contains("->"))
                .map(str::to_string),
            ..Default::default()
        }
    }

    fn routed(mut self, verb: Option<String>, route: Option<String>) -> Self {
        self.verb = verb;
        self.route = route;
        self
    }

    fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => use_case_name(self.verb.as_deref(), &self.method, self.route.as_deref(), &self.subject),
        }
    }
}

/// Use cases, actors and their include/extend links
pub fn extract(text: &str, language: Language) -> UseCaseModel {
    let options = NormalizeOptions::new().keep_strings().preserve(USE_CASE_MARKERS);
    let source = Source::read(text, language, &options);
    let endpoints = match language {
        Language::Java => java_endpoints(&source),
        Language::CSharp => csharp_endpoints(&source),
        Language::Php => php_endpoints(&source),
        Language::Python => python_endpoints(&source),
        Language::JavaScript => javascript_endpoints(&source),
    };
    debug!(language = language.as_str(), endpoints = endpoints.len(), "endpoints discovered");

    let mut builder = UseCaseBuilder::new(actor_overrides(&source.text));
    for endpoint in &endpoints {
        builder.add(endpoint);
    }
    builder.link_includes(&endpoints);
    if language == Language::JavaScript && AUTH_MIDDLEWARE.is_match(&source.text) {
        builder.authentication();
    }
    builder.link_validation(&endpoints);
    builder.finish()
}

/// `verb -> action` plus cleaned method words, then route words, then the subject
pub fn use_case_name(verb: Option<&str>, method: &str, route: Option<&str>, subject: &str) -> String {
    let mut words = split_words(method);
    let mut verb = verb.map(str::to_uppercase);
    if let Some(first) = words.first().map(|w| w.to_lowercase()) {
        if HTTP_WORDS.contains(&first.as_str()) {
            verb.get_or_insert(first.to_uppercase());
            words.remove(0);
        }
    }
    let action = verb
        .as_deref()
        .and_then(|v| VERB_ACTIONS.iter().find(|(verb, _)| *verb == v))
        .map(|(_, action)| *action);

    // a bare action verb borrows its object from the route or subject
    let bare = words.len() == 1 && is_action_verb(&words[0]);
    if words.is_empty() || bare {
        let object = route.map(route_words).filter(|w| !w.is_empty()).unwrap_or_else(|| subject_words(subject));
        for word in object {
            if !words.iter().any(|w| w.eq_ignore_ascii_case(&word)) {
                words.push(word);
            }
        }
    }

    match (words.first(), action) {
        (Some(first), _) if is_action_verb(first) => title_words(&words),
        (Some(_), Some(action)) => format!("{} {}", action, title_words(&words)),
        (Some(_), None) => title_words(&words),
        (None, Some(action)) => action.to_string(),
        (None, None) => String::new(),
    }
}

fn is_action_verb(word: &str) -> bool {
    ACTION_VERBS.contains(&word.to_lowercase().as_str())
}

/// Words of a route, without parameters, `api` and version segments
fn route_words(route: &str) -> Vec<String> {
    route
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with(['{', ':', '<', '[', '$']))
        .filter(|s| *s != "api" && !is_version(s))
        .flat_map(split_words)
        .collect()
}

fn is_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// `OrderController` -> `["Order"]`
fn subject_words(subject: &str) -> Vec<String> {
    let stem = subject.strip_suffix("Controller").unwrap_or(subject);
    split_words(stem)
}

/// First quoted string in an annotation's arguments
fn route_of(annotation: &str) -> Option<String> {
    let args = annotation_args(annotation)?;
    QUOTED.captures(args).map(|caps| caps[1].to_string())
}

fn join_route(base: Option<&str>, path: Option<&str>) -> Option<String> {
    if base.is_none() && path.is_none() {
        return None;
    }
    let parts: Vec<&str> = [base, path]
        .into_iter()
        .flatten()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

fn lookup(table: &[(&str, &str)], name: &str) -> Option<String> {
    table.iter().find(|(n, _)| *n == name).map(|(_, verb)| verb.to_string())
}

fn is_action_method(method: &Callable) -> bool {
    method.is_public() && method.member.kind == MemberKind::Method && !method.name().starts_with("__")
}

/// Routed public actions of every controller type
fn controller_actions<F>(
    source: &Source,
    is_controller: fn(&TypeUnit) -> bool,
    base_route: fn(&TypeUnit) -> Option<String>,
    route: F,
) -> Vec<Endpoint>
where
    F: Fn(&Callable) -> Option<(Option<String>, Option<String>)>,
{
    let mut endpoints = Vec::new();
    for unit in source.types.iter().filter(|t| is_controller(t)) {
        let base = base_route(unit);
        for method in unit.methods.iter().filter(|m| is_action_method(m)) {
            let Some((verb, path)) = route(method) else {
                continue;
            };
            let route = join_route(base.as_deref(), path.as_deref());
            endpoints.push(Endpoint::action(method, unit.short_name()).routed(verb, route));
        }
    }
    endpoints
}

fn java_endpoints(source: &Source) -> Vec<Endpoint> {
    controller_actions(
        source,
        |unit| {
            unit.has_annotation("RestController")
                || unit.has_annotation("Controller")
                || unit.short_name().ends_with("Controller")
        },
        |unit| {
            unit.annotations
                .iter()
                .find(|a| annotation_name(a) == "RequestMapping")
                .and_then(|a| route_of(a))
        },
        |method| {
            method.annotations.iter().find_map(|ann| {
                let name = annotation_name(ann);
                let verb = match lookup(JAVA_MAPPINGS, name) {
                    Some(verb) => Some(verb),
                    None if name == "RequestMapping" => {
                        REQUEST_METHOD.captures(ann).map(|caps| caps[1].to_uppercase())
                    }
                    None => return None,
                };
                Some((verb, route_of(ann)))
            })
        },
    )
}

fn csharp_endpoints(source: &Source) -> Vec<Endpoint> {
    controller_actions(
        source,
        |unit| unit.has_annotation("ApiController") || unit.short_name().ends_with("Controller"),
        |unit| {
            let subject = unit.short_name().strip_suffix("Controller").unwrap_or(unit.short_name());
            unit.annotations
                .iter()
                .find(|a| annotation_name(a) == "Route")
                .and_then(|a| route_of(a))
                .map(|r| r.replace("[controller]", &subject.to_lowercase()))
        },
        |method| {
            let attribute = method
                .annotations
                .iter()
                .find_map(|ann| lookup(CSHARP_ATTRIBUTES, annotation_name(ann)).map(|verb| (verb, ann)))?;
            let (verb, ann) = attribute;
            let path = route_of(ann).or_else(|| {
                method
                    .annotations
                    .iter()
                    .find(|a| annotation_name(a) == "Route")
                    .and_then(|a| route_of(a))
            });
            Some((Some(verb), path))
        },
    )
}

/// Symfony attribute or docblock route on a PHP declaration
fn php_route(annotations: &[String], markers: &[String]) -> Option<(Option<String>, Option<String>)> {
    if let Some(ann) = annotations.iter().find(|a| annotation_name(a) == "Route") {
        let verb = METHODS_ARG.captures(ann).map(|caps| caps[1].to_uppercase());
        return Some((verb, route_of(ann)));
    }
    markers.iter().find(|m| m.contains("@Route")).map(|marker| {
        let verb = METHODS_ARG.captures(marker).map(|caps| caps[1].to_uppercase());
        let path = QUOTED.captures(marker).map(|caps| caps[1].to_string());
        (verb, path)
    })
}

fn resource_action(method: &str) -> Option<(&'static str, &'static str)> {
    RESOURCE_ACTIONS
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(method))
        .map(|(_, verb, action)| (*verb, *action))
}

/// `List Order` for resource actions of `OrderController`
fn resource_name(endpoint: &mut Endpoint) {
    if let Some((_, action)) = resource_action(&endpoint.method) {
        let mut object = subject_words(&endpoint.subject);
        if object.is_empty() {
            object = endpoint.route.as_deref().map(route_words).unwrap_or_default();
        }
        endpoint.name = Some(format!("{} {}", action, title_words(&object)).trim().to_string());
    }
}

fn php_endpoints(source: &Source) -> Vec<Endpoint> {
    let mut endpoints = controller_actions(
        source,
        |unit| unit.short_name().ends_with("Controller"),
        |unit| php_route(&unit.annotations, &unit.markers).and_then(|(_, path)| path),
        |method| {
            php_route(&method.annotations, &method.markers).or_else(|| {
                let verb = resource_action(method.name()).map(|(verb, _)| verb.to_string());
                Some((verb, None))
            })
        },
    );

    for caps in LARAVEL_ROUTE.captures_iter(&source.text) {
        let controller = caps["ctrl"].rsplit('\\').next().unwrap_or(&caps["ctrl"]).to_string();
        let method = caps["method"].to_string();
        let body = source
            .find_type(&controller)
            .and_then(|unit| unit.methods.iter().find(|m| m.name() == method))
            .map(|m| m.body.clone())
            .unwrap_or_default();
        endpoints.push(Endpoint {
            method,
            verb: Some(caps["verb"].to_uppercase()),
            route: Some(caps["path"].to_string()),
            subject: controller,
            body,
            ..Default::default()
        });
    }

    for endpoint in &mut endpoints {
        resource_name(endpoint);
    }
    endpoints
}

fn python_endpoints(source: &Source) -> Vec<Endpoint> {
    let methods = source
        .types
        .iter()
        .flat_map(|t| t.methods.iter().map(move |m| (t.short_name(), m)));
    let functions = source.functions.iter().map(|f| ("", f));

    let mut endpoints = Vec::new();
    for (subject, function) in methods.chain(functions) {
        let Some(caps) = function.annotations.iter().find_map(|d| PY_ROUTE.captures(d)) else {
            continue;
        };
        let args = caps.name("args").map_or("", |m| m.as_str());
        let verb = match &caps["verb"] {
            "route" | "api_route" => METHODS_ARG
                .captures(args)
                .map(|c| c[1].to_uppercase())
                .unwrap_or_else(|| "GET".to_string()),
            verb => verb.to_uppercase(),
        };
        let route = QUOTED.captures(args).map(|c| c[1].to_string());
        endpoints.push(Endpoint::action(function, subject).routed(Some(verb), route));
    }
    endpoints
}

/// `(req, res)` shaped handler
fn is_request_handler(method: &Callable) -> bool {
    let params = &method.member.parameters;
    params.len() >= 2
        && matches!(params[0].name.as_str(), "req" | "request")
        && matches!(params[1].name.as_str(), "res" | "response")
}

fn callable_body(source: &Source, name: &str) -> String {
    source
        .types
        .iter()
        .flat_map(|t| t.methods.iter())
        .chain(source.functions.iter())
        .find(|m| m.name() == name)
        .map(|m| m.body.clone())
        .unwrap_or_default()
}

fn javascript_endpoints(source: &Source) -> Vec<Endpoint> {
    let text = source.text.as_str();
    let mut endpoints = express_routes(source);

    for unit in &source.types {
        let name = unit.short_name();
        if name.ends_with("Controller") {
            for method in unit.methods.iter().filter(|m| is_request_handler(m)) {
                endpoints.push(Endpoint::action(method, name));
            }
        } else if name.ends_with("Service") {
            for method in unit.methods.iter().filter(|m| is_action_method(m) && !m.name().starts_with('_')) {
                let mut endpoint = Endpoint::action(method, name);
                endpoint.actor = Some(SYSTEM);
                endpoints.push(endpoint);
            }
        }
    }

    for caps in USE_CASE_DECL.captures_iter(text) {
        let name = &caps["name"];
        let stem = name.strip_suffix("UseCase").unwrap_or(name);
        endpoints.push(Endpoint {
            method: name.to_string(),
            body: callable_body(source, name),
            name: Some(humanize(stem)),
            ..Default::default()
        });
    }

    for caps in NEXT_PAGES.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let rest = &text[whole.end()..];
        let body = rest.find('{').map_or("", |open| extract_balanced(&rest[open + 1..], '{', '}'));
        let verbs: Vec<String> = REQ_METHOD.captures_iter(body).map(|c| c["verb"].to_string()).collect();
        if verbs.is_empty() {
            endpoints.push(next_endpoint(None, body, Some("Handle API Request".to_string())));
        }
        for verb in verbs {
            endpoints.push(next_endpoint(Some(verb), body, None));
        }
    }
    for caps in NEXT_APP.captures_iter(text) {
        endpoints.push(next_endpoint(Some(caps["verb"].to_string()), "", None));
    }

    for caps in GRAPHQL_RESOLVER.captures_iter(text) {
        endpoints.push(Endpoint {
            name: Some(format!("Resolve {}", humanize(&caps["name"]))),
            actor: Some(GRAPHQL_CLIENT),
            ..Default::default()
        });
    }
    for caps in SOCKET_EVENT.captures_iter(text) {
        endpoints.push(Endpoint {
            name: Some(format!("Handle {}", humanize(&caps["event"]))),
            actor: Some(SOCKET_CLIENT),
            ..Default::default()
        });
    }
    endpoints
}

fn next_endpoint(verb: Option<String>, body: &str, name: Option<String>) -> Endpoint {
    Endpoint {
        verb,
        subject: "Request".to_string(),
        body: body.to_string(),
        actor: Some(API_CLIENT),
        name,
        ..Default::default()
    }
}

/// `app.post('/orders', handler)` with an inline or referenced handler
fn express_routes(source: &Source) -> Vec<Endpoint> {
    let text = source.text.as_str();
    EXPRESS_ROUTE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let args = extract_balanced(&text[whole.end()..], '(', ')');
            let mut endpoint = Endpoint {
                verb: Some(caps["verb"].to_uppercase()),
                route: Some(caps["path"].to_string()),
                ..Default::default()
            };
            let inline = args.contains("=>") || args.contains("function");
            if let (true, Some(open)) = (inline, args.find('{')) {
                endpoint.body = extract_balanced(&args[open + 1..], '{', '}').to_string();
            } else if let Some(handler) = HANDLER_REF.captures(args.trim()) {
                endpoint.method = handler["name"].to_string();
                endpoint.subject = handler.name("recv").map_or(String::new(), |r| capitalize(r.as_str()));
                endpoint.body = callable_body(source, &endpoint.method);
            }
            Some(endpoint)
        })
        .collect()
}

/// `@Actor: Name -> method` directives anywhere in the unit
fn actor_overrides(text: &str) -> HashMap<String, String> {
    ACTOR_DIRECTIVE
        .captures_iter(text)
        .map(|caps| (caps["method"].to_string(), caps["actor"].trim().to_string()))
        .collect()
}

/// True when `body` calls `method` by name
fn calls_method(body: &str, method: &str) -> bool {
    body.match_indices(method).any(|(idx, _)| {
        let before = body[..idx].chars().next_back();
        let after = body[idx + method.len()..].trim_start();
        !before.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$') && after.starts_with('(')
    })
}

fn first_word(name: &str) -> &str {
    name.split(' ').next().unwrap_or(name)
}

struct UseCaseBuilder {
    model: UseCaseModel,
    actors: BTreeSet<String>,
    overrides: HashMap<String, String>,
}

impl UseCaseBuilder {
    fn new(overrides: HashMap<String, String>) -> Self {
        Self {
            model: UseCaseModel {
                system: SYSTEM.to_string(),
                ..Default::default()
            },
            actors: BTreeSet::new(),
            overrides,
        }
    }

    fn has(&self, name: &str) -> bool {
        self.model.use_cases.iter().any(|u| u.name == name)
    }

    fn actor_of(&self, endpoint: &Endpoint) -> String {
        if let Some(actor) = self.overrides.get(&endpoint.method).or(endpoint.declared_actor.as_ref()) {
            return actor.clone();
        }
        if let Some(actor) = endpoint.actor {
            return actor.to_string();
        }
        let route = endpoint.route.as_deref().unwrap_or("");
        actor_for(&[&endpoint.method, route, &endpoint.subject]).to_string()
    }

    fn add(&mut self, endpoint: &Endpoint) {
        let name = endpoint.name();
        if name.is_empty() || self.has(&name) {
            return;
        }
        let actor = self.actor_of(endpoint);
        self.associate(&actor, &name);
        self.model.use_cases.push(UseCase {
            name,
            source_method: (!endpoint.method.is_empty()).then(|| endpoint.method.clone()),
            http_verb: endpoint.verb.clone(),
            route: endpoint.route.clone(),
            actor,
        });
    }

    fn associate(&mut self, actor: &str, name: &str) {
        let edge = (actor.to_string(), name.to_string());
        if !self.model.associations.contains(&edge) {
            self.actors.insert(actor.to_string());
            self.model.associations.push(edge);
        }
    }

    fn link(&mut self, from: &str, to: &str, kind: UseCaseLinkKind) {
        if from == to || !self.has(from) || !self.has(to) {
            return;
        }
        let link = UseCaseLink {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        };
        if !self.model.links.contains(&link) {
            self.model.links.push(link);
        }
    }

    /// An endpoint body calling another endpoint's source method
    fn link_includes(&mut self, endpoints: &[Endpoint]) {
        for caller in endpoints.iter().filter(|e| !e.body.is_empty()) {
            let from = caller.name();
            for callee in endpoints.iter().filter(|e| e.method.len() > 1) {
                let same = callee.method == caller.method && callee.subject == caller.subject;
                if !same && calls_method(&caller.body, &callee.method) {
                    self.link(&from, &callee.name(), UseCaseLinkKind::Include);
                }
            }
        }
    }

    fn authentication(&mut self) {
        if !self.has(AUTHENTICATE) {
            self.model.use_cases.push(UseCase::new(AUTHENTICATE, ACTOR));
        }
        self.associate(ACTOR, AUTHENTICATE);
        self.associate(AUTH_SYSTEM, AUTHENTICATE);
        let guarded: Vec<String> = self
            .model
            .use_cases
            .iter()
            .filter(|u| GUARDED_ACTIONS.contains(&first_word(&u.name)))
            .map(|u| u.name.clone())
            .collect();
        for name in guarded {
            self.link(&name, AUTHENTICATE, UseCaseLinkKind::Include);
        }
    }

    /// `Validate Input` extends every mutating use case when bodies validate
    fn link_validation(&mut self, endpoints: &[Endpoint]) {
        if !endpoints.iter().any(|e| VALIDATION_CALL.is_match(&e.body)) {
            return;
        }
        let mutating: Vec<String> = self
            .model
            .use_cases
            .iter()
            .filter(|u| VALIDATED_ACTIONS.contains(&first_word(&u.name)))
            .map(|u| u.name.clone())
            .collect();
        if mutating.is_empty() {
            return;
        }
        if !self.has(VALIDATE) {
            self.model.use_cases.push(UseCase::new(VALIDATE, SYSTEM));
        }
        for name in mutating {
            self.link(VALIDATE, &name, UseCaseLinkKind::Extend);
        }
    }

    fn finish(mut self) -> UseCaseModel {
        self.model.actors = self.actors.into_iter().collect();
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(model: &UseCaseModel) -> Vec<&str> {
        model.use_cases.iter().map(|u| u.name.as_str()).collect()
    }

    #[rstest]
    #[case(Some("POST"), "createOrder", None, "", "Create Order")]
    #[case(Some("GET"), "getOrders", None, "", "Query Orders")]
    #[case(Some("DELETE"), "deleteOrder", None, "", "Delete Order")]
    #[case(Some("PATCH"), "status", None, "", "Modify Status")]
    #[case(None, "listInvoices", None, "", "List Invoices")]
    #[case(Some("POST"), "", Some("/api/v1/orders/{id}"), "", "Create Orders")]
    #[case(Some("PUT"), "update", None, "OrderController", "Update Order")]
    #[case(Some("GET"), "get", None, "CustomerController", "Query Customer")]
    #[case(None, "get_user_profile", None, "", "Query User Profile")]
    fn test_use_case_name(
        #[case] verb: Option<&str>,
        #[case] method: &str,
        #[case] route: Option<&str>,
        #[case] subject: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(use_case_name(verb, method, route, subject), expected);
    }

    #[test]
    fn test_java_controller() {
        let code = r#"
@RestController
@RequestMapping("/orders")
public class OrderController {
    @PostMapping
    public Order createOrder(@RequestBody Order order) { return service.createOrder(order); }

    @GetMapping("/{id}")
    public Order getOrder(@PathVariable Long id) { return service.find(id); }

    @RequestMapping(value = "/admin/purge", method = RequestMethod.DELETE)
    public void purge() { }

    private void helper() { }
}"#;
        let model = extract(code, Language::Java);
        assert_eq!(names(&model), vec!["Create Order", "Query Order", "Delete Purge"]);
        assert_eq!(model.use_cases[0].route.as_deref(), Some("/orders"));
        assert_eq!(model.use_cases[1].route.as_deref(), Some("/orders/{id}"));
        assert_eq!(model.use_cases[2].actor, "Administrator");
        assert_eq!(model.actors, vec!["Administrator", "User"]);
        assert_eq!(model.associations[0], ("User".to_string(), "Create Order".to_string()));
    }

    #[test]
    fn test_csharp_controller_routes() {
        let code = r#"
[ApiController]
[Route("api/[controller]")]
public class ProductsController : ControllerBase
{
    [HttpGet("{id}")]
    public IActionResult GetProduct(int id) { return Ok(); }

    [HttpPost]
    public IActionResult Create(Product product) { return Ok(); }
}"#;
        let model = extract(code, Language::CSharp);
        assert_eq!(names(&model), vec!["Query Product", "Create Products"]);
        assert_eq!(model.use_cases[0].route.as_deref(), Some("/api/products/{id}"));
        assert_eq!(model.use_cases[1].http_verb.as_deref(), Some("POST"));
    }

    #[test]
    fn test_actor_directive_overrides() {
        let code = "// @Actor: Auditor -> exportReport\n\
                    @RestController\npublic class ReportController {\n\
                    @GetMapping(\"/reports\")\npublic byte[] exportReport() { return data; }\n}";
        let model = extract(code, Language::Java);
        assert_eq!(model.use_cases[0].name, "Export Report");
        assert_eq!(model.use_cases[0].actor, "Auditor");
        assert_eq!(model.actors, vec!["Auditor"]);
    }

    #[test]
    fn test_php_symfony_and_resources() {
        let code = r#"<?php
class OrderController extends AbstractController
{
    #[Route('/orders/export', methods: ['GET'])]
    public function export() { }

    /**
     * @Route("/orders/archive", methods={"POST"})
     */
    public function archive() { }

    public function index() { }
    public function store(Request $request) { $this->validate($request); }
    public function __construct() { }
}
"#;
        let model = extract(code, Language::Php);
        assert_eq!(
            names(&model),
            vec!["Export Orders", "Archive Orders", "List Order", "Create Order", "Validate Input"]
        );
        assert_eq!(model.use_cases[1].http_verb.as_deref(), Some("POST"));
        assert_eq!(model.links.len(), 1);
        assert_eq!(model.links[0].kind, UseCaseLinkKind::Extend);
        assert_eq!(model.links[0].to, "Create Order");
    }

    #[test]
    fn test_laravel_route_file() {
        let code = "<?php\nRoute::post('/invoices', [InvoiceController::class, 'store']);\n\
                    Route::delete('/invoices/{id}', [App\\Http\\InvoiceController::class, 'destroy']);\n";
        let model = extract(code, Language::Php);
        assert_eq!(names(&model), vec!["Create Invoice", "Delete Invoice"]);
        assert_eq!(model.use_cases[1].route.as_deref(), Some("/invoices/{id}"));
    }

    #[test]
    fn test_python_decorated_views() {
        let code = "@app.post(\"/orders\")\ndef create_order(payload):\n    return service.create(payload)\n\n\
                    @bp.route(\"/admin/users\", methods=[\"DELETE\"])\ndef remove_user(user_id):\n    pass\n\n\
                    def helper():\n    pass\n";
        let model = extract(code, Language::Python);
        assert_eq!(names(&model), vec!["Create Order", "Remove User"]);
        assert_eq!(model.use_cases[1].http_verb.as_deref(), Some("DELETE"));
        assert_eq!(model.use_cases[1].actor, "Administrator");
    }

    #[test]
    fn test_express_routes_and_includes() {
        let code = r#"
class OrderService {
  createOrder(data) { return this.repo.save(data); }
}
router.post('/orders', authenticate, (req, res) => {
  const order = orderService.createOrder(req.body);
  res.json(order);
});
router.get('/orders/:id', orderController.show);
"#;
        let model = extract(code, Language::JavaScript);
        assert_eq!(
            names(&model),
            vec!["Create Orders", "Show Orders", "Create Order", "Authenticate User"]
        );
        let find = |name: &str| model.use_cases.iter().find(|u| u.name == name).unwrap();
        assert_eq!(find("Create Order").actor, "System");
        assert!(model.links.contains(&UseCaseLink {
            from: "Create Orders".to_string(),
            to: "Create Order".to_string(),
            kind: UseCaseLinkKind::Include,
        }));
        assert!(model.links.contains(&UseCaseLink {
            from: "Create Orders".to_string(),
            to: AUTHENTICATE.to_string(),
            kind: UseCaseLinkKind::Include,
        }));
        assert_eq!(model.actors, vec!["Authentication System", "System", "User"]);
    }

    #[test]
    fn test_javascript_entry_shapes() {
        let code = r#"
const resolvers = {
  Query: {
    orders: (parent, args, context) => db.orders(),
  },
};
io.on('connection', (socket) => {
  socket.on('order:placed', (msg) => notify(msg));
});
export async function POST(request) { return Response.json({}); }
async function placeOrderUseCase(input) { return input; }
"#;
        let model = extract(code, Language::JavaScript);
        let found: Vec<_> = model
            .use_cases
            .iter()
            .map(|u| (u.name.as_str(), u.actor.as_str()))
            .collect();
        assert!(found.contains(&("Resolve Orders", "GraphQL Client")));
        assert!(found.contains(&("Handle Order Placed", "WebSocket Client")));
        assert!(found.contains(&("Create Request", "API Client")));
        assert!(found.contains(&("Place Order", "User")));
    }

    #[test]
    fn test_no_endpoints_is_empty() {
        let model = extract("public class Order { private int id; }", Language::Java);
        assert!(model.use_cases.is_empty());
        assert!(model.actors.is_empty());
        assert_eq!(model.system, SYSTEM);
    }
}
