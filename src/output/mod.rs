// Diagram rendering
//
// Renderers are pure: each walks one model in order and emits the body lines
// of a document. Nothing here looks at source text.

mod activity;
mod class;
mod packages;
mod sequence;
mod usecase;

use crate::model::{DiagramDocument, DiagramModel};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Switches for optional directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Emit `skinparam` style directives
    pub style: bool,
    /// Emit `hide empty members` in class diagrams
    pub hide_empty_members: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: true,
            hide_empty_members: true,
        }
    }
}

/// Renders any diagram model to a document
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramRenderer {
    options: RenderOptions,
}

impl DiagramRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Toggle style directives
    pub fn with_style(mut self, style: bool) -> Self {
        self.options.style = style;
        self
    }

    pub fn with_hide_empty_members(mut self, hide: bool) -> Self {
        self.options.hide_empty_members = hide;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn render(&self, model: &DiagramModel) -> DiagramDocument {
        let body = match model {
            DiagramModel::Class(m) => class::render(m, &self.options),
            DiagramModel::Sequence(m) => sequence::render(m, &self.options),
            DiagramModel::UseCase(m) => usecase::render(m, &self.options),
            DiagramModel::Activity(m) => activity::render(m, &self.options),
            DiagramModel::Component(m) => packages::render_components(m, &self.options),
            DiagramModel::Package(m) => packages::render_packages(m, &self.options),
        };
        DiagramDocument::new(model.kind(), body)
    }
}

/// Identifier safe for use as a diagram alias
pub(crate) fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Aliases handed out within one document
///
/// Distinct names can sanitize to the same identifier (`a.b` and `a_b`);
/// later ones get a numeric suffix so every alias names one node.
#[derive(Debug, Default)]
pub(crate) struct Aliases {
    issued: HashMap<String, String>,
    taken: HashSet<String>,
}

impl Aliases {
    /// Alias for `key`, issued from `base` on first request
    pub(crate) fn issue(&mut self, key: &str, base: &str) -> String {
        if let Some(alias) = self.issued.get(key) {
            return alias.clone();
        }
        let alias = self.fresh(base);
        self.issued.insert(key.to_string(), alias.clone());
        alias
    }

    /// New alias from `base`, never handed out before
    pub(crate) fn fresh(&mut self, base: &str) -> String {
        let base = sanitize_id(base);
        let mut alias = base.clone();
        let mut n = 2;
        while self.taken.contains(&alias) {
            alias = format!("{}_{}", base, n);
            n += 1;
        }
        self.taken.insert(alias.clone());
        alias
    }
}

/// Name usable as-is in the DSL, quoted otherwise
pub(crate) fn quote_if_needed(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "'"))
    }
}
