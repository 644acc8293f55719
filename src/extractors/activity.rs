// Activity diagram extraction
//
// Each entry method is linearized into a flow of nodes. Simple statements
// are classified by an ordered rule list; control flow becomes decision,
// loop, parallel and error-handling nodes with nested branches.

use super::source::{Callable, Source};
use crate::analysis::roles::is_trivial_receiver;
use crate::extract::block::extract_balanced;
use crate::extract::naming::{humanize, split_words, title_words};
use crate::extract::normalize::{NormalizeOptions, ACTIVITY_MARKERS};
use crate::extract::params::split_top_level;
use crate::extract::statements::Statement;
use crate::lang::Language;
use crate::model::{ActivityFlow, ActivityKind, ActivityModel, ActivityNode, Branch, MemberKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const USER_LANE: &str = "User";
pub const SYSTEM_LANE: &str = "System";

const RECEIVES_RESPONSE: &str = "Receives response";
const SEES_ERROR: &str = "Sees error message";
const VALID_DATA: &str = "Valid data";

/// Leading method word to description verb
const VERBS: &[(&[&str], &str)] = &[
    (&["validate"], "Validate"),
    (&["check", "verify"], "Verify"),
    (&["process"], "Process"),
    (&["create"], "Create"),
    (&["store", "save"], "Save"),
    (&["update"], "Update"),
    (&["delete", "destroy"], "Delete"),
    (&["find"], "Find"),
    (&["get", "fetch"], "Retrieve"),
    (&["send"], "Send"),
    (&["mail"], "Email"),
    (&["calculate"], "Calculate"),
    (&["generate"], "Generate"),
    (&["dispatch", "execute"], "Execute"),
    (&["handle"], "Handle"),
];

/// `// @User: Fills in the form`
static LANE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(?P<lane>User|System):\s*(?P<desc>.*)").unwrap());

static RESPONSE_RETURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^return\b.*\b(?:ResponseEntity|response|redirect|view|json|jsonify|render|render_template|ok)\s*[(<.]")
        .unwrap()
});

static RESPONSE_SEND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bres\s*\.\s*(?:json|send|render|redirect|status)\s*\(").unwrap());

static CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?P<recv>\$?[A-Za-z_]\w*)\s*(?:\?\.|\.|->|::)\s*)?(?P<name>[A-Za-z_$][\w$]*)\s*\(").unwrap()
});

static VALIDATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:validate|isValid|is_valid|checkValid|check_valid)\w*\s*\(").unwrap());

static FAILURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:throw|raise)\b|\babort\s*\(").unwrap());

static PARALLEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Promise\s*\.\s*(?:all|allSettled)|asyncio\s*\.\s*gather|Task\s*\.\s*WhenAll)\s*\(").unwrap()
});

const KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "return", "function", "typeof", "await", "async",
];

const SELF_REFS: &[&str] = &["this", "self", "$this", "parent", "super", "static"];

/// Flows of every entry method
pub fn extract(text: &str, language: Language) -> ActivityModel {
    let options = NormalizeOptions::new().keep_newlines().preserve(ACTIVITY_MARKERS);
    let source = Source::read(text, language, &options);

    let callables: Vec<&Callable> = source
        .types
        .iter()
        .flat_map(|t| t.methods.iter())
        .chain(source.functions.iter())
        .filter(|c| c.has_body() && !matches!(c.member.kind, MemberKind::Constructor | MemberKind::Property))
        .collect();

    let marked: Vec<(String, &Callable)> = callables
        .iter()
        .filter_map(|c| c.marker("@Activity").map(|name| (name.to_string(), *c)))
        .collect();
    let entries = if marked.is_empty() {
        callables.iter().map(|c| (humanize(c.name()), *c)).collect()
    } else {
        marked
    };
    debug!(language = language.as_str(), entries = entries.len(), "activity entries selected");

    let flows = entries
        .into_iter()
        .map(|(name, callable)| FlowBuilder::default().flow(&name, &callable.statements()))
        .collect();
    ActivityModel { flows }
}

/// Verb-first description of a method: `saveOrder` -> `Save Order`
pub fn describe(method: &str, object: &str) -> String {
    let mut words = split_words(method);
    if words.is_empty() {
        return String::new();
    }
    let first = words[0].to_lowercase();
    if let Some((_, verb)) = VERBS.iter().find(|(keys, _)| keys.contains(&first.as_str())) {
        words[0] = verb.to_string();
    }
    if words.len() == 1 {
        words.extend(split_words(object));
    }
    title_words(&words)
}

/// `orderService` -> `order`, `$userRepository` -> `user`
fn receiver_object(receiver: &str) -> String {
    let name = receiver.trim_start_matches('$').trim_start_matches('_');
    let lower = name.to_lowercase();
    let end = ["service", "repository", "repo"]
        .iter()
        .filter_map(|suffix| lower.find(suffix))
        .min()
        .unwrap_or(name.len());
    name[..end].trim_end_matches('_').to_string()
}

fn is_service_receiver(receiver: &str) -> bool {
    let lower = receiver.to_lowercase();
    lower.contains("service") || lower.contains("repository")
}

/// First call of a statement whose receiver is not a utility object
fn first_call(text: &str) -> Option<&str> {
    CALL.captures_iter(text).find_map(|caps| {
        let name = caps.name("name")?.as_str();
        let recv = caps.name("recv").map(|r| r.as_str());
        if KEYWORDS.contains(&name) {
            return None;
        }
        match recv {
            Some(r) if is_trivial_receiver(r) && !SELF_REFS.contains(&r) => None,
            _ => Some(name),
        }
    })
}

/// Outcome of classifying one simple statement
enum Step {
    Lane(&'static str, String),
    Response,
    Service(String),
    Validation,
    Failure,
    Call(String),
    Skip,
}

fn classify(text: &str) -> Step {
    if let Some(caps) = LANE_DIRECTIVE.captures(text) {
        let lane = if &caps["lane"] == "User" { USER_LANE } else { SYSTEM_LANE };
        return Step::Lane(lane, caps["desc"].trim().to_string());
    }
    if RESPONSE_RETURN.is_match(text) || RESPONSE_SEND.is_match(text) {
        return Step::Response;
    }
    let service = CALL.captures_iter(text).find_map(|caps| {
        let recv = caps.name("recv")?.as_str();
        is_service_receiver(recv).then(|| describe(&caps["name"], &receiver_object(recv)))
    });
    if let Some(description) = service {
        return Step::Service(description);
    }
    if VALIDATION.is_match(text) {
        return Step::Validation;
    }
    if FAILURE.is_match(text) {
        return Step::Failure;
    }
    match first_call(text) {
        Some(name) => Step::Call(format!("Call {}()", name)),
        None => Step::Skip,
    }
}

/// Walks statements while tracking the current swimlane
struct FlowBuilder {
    lane: &'static str,
}

impl Default for FlowBuilder {
    fn default() -> Self {
        Self { lane: SYSTEM_LANE }
    }
}

impl FlowBuilder {
    fn flow(mut self, name: &str, statements: &[Statement]) -> ActivityFlow {
        let mut nodes = vec![ActivityNode::new(ActivityKind::Start, USER_LANE, &format!("Start {}", name))];
        nodes.extend(self.nodes(statements));
        nodes.push(ActivityNode::new(ActivityKind::End, self.lane, "End"));
        ActivityFlow {
            name: name.to_string(),
            nodes,
        }
    }

    fn nodes(&mut self, statements: &[Statement]) -> Vec<ActivityNode> {
        let mut out = Vec::new();
        for (i, statement) in statements.iter().enumerate() {
            let Statement::Simple(text) = statement else {
                out.extend(self.compound(statement));
                continue;
            };
            if PARALLEL.is_match(text) {
                out.push(self.parallel(text));
                continue;
            }
            match classify(text) {
                Step::Lane(lane, description) => {
                    self.lane = lane;
                    out.push(ActivityNode::activity(lane, &description));
                }
                Step::Response => out.push(ActivityNode::activity(USER_LANE, RECEIVES_RESPONSE)),
                Step::Service(description) => out.push(ActivityNode::activity(SYSTEM_LANE, &description)),
                // the rest of the block only runs on valid data
                Step::Validation => {
                    let lane = self.lane;
                    let yes = self.nodes(&statements[i + 1..]);
                    let no = vec![ActivityNode::activity(USER_LANE, SEES_ERROR)];
                    out.push(
                        ActivityNode::new(ActivityKind::Decision, lane, VALID_DATA)
                            .with_branch(Branch::new("yes", yes))
                            .with_branch(Branch::new("no", no)),
                    );
                    return out;
                }
                Step::Failure => out.push(ActivityNode::activity(USER_LANE, SEES_ERROR)),
                Step::Call(description) => out.push(ActivityNode::activity(SYSTEM_LANE, &description)),
                Step::Skip => {}
            }
        }
        out
    }

    fn compound(&mut self, statement: &Statement) -> Vec<ActivityNode> {
        match statement {
            Statement::Marker(text) => match classify(text) {
                Step::Lane(lane, description) => {
                    self.lane = lane;
                    vec![ActivityNode::activity(lane, &description)]
                }
                _ => Vec::new(),
            },
            Statement::If { branches, otherwise } => self.decision(branches, otherwise.as_deref()).into_iter().collect(),
            Statement::Switch { subject, cases } => {
                let mut node = ActivityNode::new(ActivityKind::Decision, self.lane, subject);
                for (label, body) in cases {
                    let nodes = self.nodes(body);
                    node = node.with_branch(Branch::new(label, nodes));
                }
                vec![node]
            }
            Statement::Loop { header, body } => {
                let lane = self.lane;
                let nodes = self.nodes(body);
                vec![ActivityNode::new(ActivityKind::Loop, lane, header).with_branch(Branch::new("body", nodes))]
            }
            Statement::Try { body, handlers, finally } => {
                let lane = self.lane;
                let mut node = ActivityNode::new(ActivityKind::ErrorHandling, lane, "Handle errors");
                let nodes = self.nodes(body);
                node = node.with_branch(Branch::new("try", nodes));
                for (parameter, handler) in handlers {
                    let nodes = self.nodes(handler);
                    let label = if parameter.is_empty() { "catch".to_string() } else { format!("catch {}", parameter) };
                    node = node.with_branch(Branch::new(&label, nodes));
                }
                if let Some(finally) = finally {
                    let nodes = self.nodes(finally);
                    node = node.with_branch(Branch::new("finally", nodes));
                }
                vec![node]
            }
            Statement::Block(inner) => self.nodes(inner),
            Statement::Simple(_) => self.nodes(std::slice::from_ref(statement)),
        }
    }

    /// `if / else if / else` as nested yes/no decisions
    fn decision(&mut self, branches: &[(String, Vec<Statement>)], otherwise: Option<&[Statement]>) -> Option<ActivityNode> {
        let ((condition, body), rest) = branches.split_first()?;
        let lane = self.lane;
        let yes = self.nodes(body);
        let no = if rest.is_empty() {
            otherwise.map(|o| self.nodes(o)).unwrap_or_default()
        } else {
            self.decision(rest, otherwise).into_iter().collect()
        };
        Some(
            ActivityNode::new(ActivityKind::Decision, lane, condition)
                .with_branch(Branch::new("yes", yes))
                .with_branch(Branch::new("no", no)),
        )
    }

    /// `Promise.all([a(), b()])`: one branch per awaited call
    fn parallel(&mut self, text: &str) -> ActivityNode {
        let mut node = ActivityNode::new(ActivityKind::Parallel, SYSTEM_LANE, "Run in parallel");
        let open = PARALLEL.find(text).map_or(0, |m| m.end());
        let args = extract_balanced(&text[open..], '(', ')');
        let list = args.trim().strip_prefix('[').map_or(args, |inner| inner.strip_suffix(']').unwrap_or(inner));
        for (i, element) in split_top_level(list, ',').into_iter().enumerate() {
            let nodes = self.nodes(&[Statement::Simple(element.to_string())]);
            node = node.with_branch(Branch::new(&format!("task {}", i + 1), nodes));
        }
        node
    }
}
