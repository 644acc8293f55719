// Activity diagram rendering
//
// Swimlane headers are emitted whenever the lane changes, so nested branches
// can hop lanes. Every opened block is closed by the node that opened it,
// which keeps `stop` outside any decision.

use super::RenderOptions;
use crate::extract::block::find_balanced_end;
use crate::model::{ActivityFlow, ActivityKind, ActivityModel, ActivityNode, Branch};

pub(super) fn render(model: &ActivityModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    if options.style {
        lines.push("skinparam activityBackgroundColor #FEFECE".to_string());
        lines.push("skinparam activityDiamondBackgroundColor #FFF2CC".to_string());
    }

    let partitioned = model.flows.len() > 1;
    for flow in &model.flows {
        let mut writer = FlowWriter::default();
        if partitioned {
            lines.push(format!("partition \"{}\" {{", escape(&flow.name)));
        }
        writer.flow(flow);
        lines.extend(writer.lines);
        if partitioned {
            lines.push("}".to_string());
        }
    }
    lines
}

/// Text safe inside `:...;` and `(...)`
fn escape(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(';', ",")
        .replace('"', "'")
}

/// Guard text without one wrapping pair of parentheses. Inner call
/// parentheses stay; unbalanced ones become spaces.
fn guard(text: &str) -> String {
    let text = escape(text);
    let inner = text
        .strip_prefix('(')
        .filter(|rest| find_balanced_end(rest, '(', ')') == Some(rest.len() - 1))
        .map_or(text.as_str(), |rest| &rest[..rest.len() - 1])
        .trim();
    if is_balanced(inner) {
        inner.to_string()
    } else {
        inner.replace(['(', ')'], " ").split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn is_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

fn condition(text: &str) -> String {
    let text = guard(text);
    if text.ends_with('?') {
        text
    } else {
        format!("{}?", text)
    }
}

#[derive(Default)]
struct FlowWriter {
    lines: Vec<String>,
    lane: Option<String>,
}

impl FlowWriter {
    fn flow(&mut self, flow: &ActivityFlow) {
        for node in &flow.nodes {
            self.node(node);
        }
    }

    fn switch_lane(&mut self, lane: &str) {
        if lane.is_empty() || self.lane.as_deref() == Some(lane) {
            return;
        }
        self.lines.push(format!("|{}|", lane));
        self.lane = Some(lane.to_string());
    }

    fn nodes(&mut self, nodes: &[ActivityNode]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &ActivityNode) {
        self.switch_lane(&node.swimlane);
        match node.kind {
            ActivityKind::Start => {
                self.lines.push("start".to_string());
                self.lines.push(format!(":{};", escape(&node.description)));
            }
            ActivityKind::Activity => self.lines.push(format!(":{};", escape(&node.description))),
            ActivityKind::Decision => self.decision(node),
            ActivityKind::Loop => {
                self.lines.push(format!("while ({})", condition(&node.description)));
                for branch in &node.branches {
                    self.nodes(&branch.nodes);
                }
                self.lines.push("endwhile".to_string());
            }
            ActivityKind::Parallel => {
                self.lines.push(format!(":{};", escape(&node.description)));
                self.lines.push("fork".to_string());
                for (i, branch) in node.branches.iter().enumerate() {
                    if i > 0 {
                        self.lines.push("fork again".to_string());
                    }
                    self.lines.push(format!(":{};", escape(&branch.label)));
                    self.nodes(&branch.nodes);
                }
                self.lines.push("end fork".to_string());
            }
            ActivityKind::ErrorHandling => self.error_handling(node),
            ActivityKind::End => self.lines.push("stop".to_string()),
        }
    }

    fn decision(&mut self, node: &ActivityNode) {
        let yes_no = node.branches.len() <= 2
            && node.branches.first().is_some_and(|b| b.label == "yes")
            && node.branches.get(1).map_or(true, |b| b.label == "no");

        if yes_no {
            self.lines.push(format!("if ({}) then (yes)", condition(&node.description)));
            if let Some(yes) = node.branches.first() {
                self.nodes(&yes.nodes);
            }
            if let Some(no) = node.branches.get(1).filter(|b| !b.nodes.is_empty()) {
                self.lines.push("else (no)".to_string());
                self.nodes(&no.nodes);
            }
            self.lines.push("endif".to_string());
            return;
        }

        // Multi-way branch as an if / elseif chain on the subject
        let subject = guard(&node.description);
        let (default, cases): (Vec<&Branch>, Vec<&Branch>) =
            node.branches.iter().partition(|b| b.label == "default");
        if cases.is_empty() {
            if let Some(default) = default.first() {
                self.nodes(&default.nodes);
            }
            return;
        }
        for (i, case) in cases.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "elseif" };
            self.lines.push(format!(
                "{} ({} = {}?) then (yes)",
                keyword,
                subject,
                guard(&case.label)
            ));
            self.nodes(&case.nodes);
        }
        if let Some(default) = default.first() {
            self.lines.push("else (default)".to_string());
            self.nodes(&default.nodes);
        }
        self.lines.push("endif".to_string());
    }

    /// `try` as the success path, handlers as alternatives, `finally` after the block
    fn error_handling(&mut self, node: &ActivityNode) {
        let body = node.branches.iter().find(|b| b.label == "try");
        let finally = node.branches.iter().find(|b| b.label == "finally");
        let handlers: Vec<&Branch> = node
            .branches
            .iter()
            .filter(|b| b.label != "try" && b.label != "finally")
            .collect();

        if handlers.is_empty() {
            if let Some(body) = body {
                self.nodes(&body.nodes);
            }
        } else {
            self.lines.push(format!("if ({}) then (try)", condition(&node.description)));
            if let Some(body) = body {
                self.nodes(&body.nodes);
            }
            let last = handlers.len() - 1;
            for (i, handler) in handlers.iter().enumerate() {
                if i == last {
                    self.lines.push(format!("else ({})", escape(&handler.label)));
                } else {
                    self.lines.push(format!("elseif ({}?) then (yes)", escape(&handler.label)));
                }
                self.nodes(&handler.nodes);
            }
            self.lines.push("endif".to_string());
        }

        if let Some(finally) = finally {
            self.nodes(&finally.nodes);
        }
    }
}
