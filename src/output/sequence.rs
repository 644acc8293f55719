// Sequence diagram rendering

use super::{quote_if_needed, sanitize_id, RenderOptions};
use crate::model::{InteractionKind, SequenceModel};
use std::collections::HashMap;

pub(super) fn render(model: &SequenceModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    if options.style {
        lines.push("skinparam sequenceMessageAlign center".to_string());
        lines.push("skinparam responseMessageBelowArrow true".to_string());
    }

    // Participants with awkward names get an alias
    let mut ids: HashMap<&str, String> = HashMap::new();
    for participant in &model.participants {
        let quoted = quote_if_needed(&participant.name);
        if quoted == participant.name {
            lines.push(format!("{} {}", participant.role.keyword(), participant.name));
            ids.insert(&participant.name, participant.name.clone());
        } else {
            let alias = sanitize_id(&participant.name);
            lines.push(format!("{} {} as {}", participant.role.keyword(), quoted, alias));
            ids.insert(&participant.name, alias);
        }
    }

    let id = |name: &str| ids.get(name).cloned().unwrap_or_else(|| sanitize_id(name));
    for interaction in &model.interactions {
        let arrow = match interaction.kind {
            InteractionKind::Sync => "->",
            InteractionKind::Async => "->>",
            InteractionKind::Return => "-->",
        };
        lines.push(format!(
            "{} {} {} : {}",
            id(&interaction.from),
            arrow,
            id(&interaction.to),
            interaction.message
        ));
    }
    lines
}
