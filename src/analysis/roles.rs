// Keyword tables for participant roles and actors
//
// First match wins. Matching is on lowercase identifier words so that
// `OrderRepository` and `order_repo` classify the same way.

use crate::extract::naming::{participant_name, split_words};
use crate::model::Role;

/// The human actor that starts every interaction
pub const ACTOR: &str = "User";

const ROLE_RULES: &[(&[&str], Role)] = &[
    (&["repository", "repositories", "repo", "dao", "database", "db", "session", "context"], Role::Database),
    (
        &["controller", "api", "client", "gateway", "handler", "endpoint", "view", "ui", "router", "resource"],
        Role::Boundary,
    ),
    (&["service", "manager", "business", "logic", "usecase", "processor", "facade"], Role::Control),
];

/// Receivers that never become participants
const TRIVIAL_RECEIVERS: &[&str] = &[
    "console", "math", "json", "object", "array", "date", "string", "system", "logger", "log",
    "this", "self", "parent", "super", "static", "promise", "number", "str", "int", "len", "print",
    "os", "sys", "re", "path", "datetime", "stringbuilder", "linq", "enumerable", "collections",
    "arrays", "objects", "optional", "task", "_", "$", "window", "document", "process", "carbon",
    "str_", "arr", "logging", "out", "err",
];

fn lower_words(name: &str) -> Vec<String> {
    split_words(name).iter().map(|w| w.to_lowercase()).collect()
}

fn any_word(words: &[String], keywords: &[&str]) -> bool {
    words.iter().any(|w| keywords.contains(&w.as_str()))
}

/// Role of a participant by its type or receiver name
pub fn role_of(name: &str) -> Role {
    let words = lower_words(name);
    ROLE_RULES
        .iter()
        .find(|(keywords, _)| any_word(&words, keywords))
        .map_or(Role::Entity, |(_, role)| *role)
}

/// Whether calls on this receiver are noise for a sequence diagram
pub fn is_trivial_receiver(receiver: &str) -> bool {
    let lower = receiver.trim_start_matches('$').to_lowercase();
    TRIVIAL_RECEIVERS.contains(&lower.as_str())
}

const DATA_METHODS: &[&str] = &["save", "find", "get", "delete", "update", "create"];
const NOTIFY_WORDS: &[&str] = &["notify", "send", "mail", "email", "notification"];

/// Participant for a receiver whose type is unknown
pub fn synthesize(receiver: &str, method: &str) -> (String, Role) {
    let words = lower_words(receiver);
    let method_words = lower_words(method);
    let name = participant_name(receiver);

    if any_word(&words, &["service", "business", "logic"]) {
        return (name, Role::Control);
    }
    if any_word(&words, &["repository", "repo", "dao", "db", "database", "session"]) {
        return (name, Role::Database);
    }
    if any_word(&words, &["client", "api", "http", "requests", "axios", "fetch", "guzzle"]) {
        return ("ExternalAPI".to_string(), Role::Boundary);
    }
    if any_word(&words, NOTIFY_WORDS) || method_words.first().is_some_and(|w| NOTIFY_WORDS.contains(&w.as_str())) {
        return ("NotificationService".to_string(), Role::Control);
    }
    if method_words.first().is_some_and(|w| DATA_METHODS.contains(&w.as_str())) {
        return ("Database".to_string(), Role::Database);
    }
    if any_word(&words, &["request", "response", "req", "res"]) {
        return (ACTOR.to_string(), Role::Actor);
    }
    (name, Role::Entity)
}

const ACTOR_RULES: &[(&[&str], &str)] = &[
    (&["admin", "administrator"], "Administrator"),
    (&["user", "client", "customer", "auth", "login", "register"], "User"),
];

/// Actor for a use case from words of its method, route and controller
pub fn actor_for(texts: &[&str]) -> &'static str {
    let words: Vec<String> = texts
        .iter()
        .flat_map(|t| lower_words(t))
        .collect();
    ACTOR_RULES
        .iter()
        .find(|(keywords, _)| any_word(&words, keywords))
        .map_or(ACTOR, |(_, actor)| *actor)
}
