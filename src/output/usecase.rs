// Use case diagram rendering

use super::{quote_if_needed, sanitize_id, RenderOptions};
use crate::model::{UseCaseLinkKind, UseCaseModel};

/// Actor reference, aliased when the name needs quoting
fn actor_id(name: &str) -> String {
    if quote_if_needed(name) == name {
        name.to_string()
    } else {
        sanitize_id(name)
    }
}

fn use_case_ref(name: &str) -> String {
    format!("({})", name.replace(['(', ')'], ""))
}

pub(super) fn render(model: &UseCaseModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = vec!["left to right direction".to_string()];
    if options.style {
        lines.push("skinparam packageStyle rectangle".to_string());
        lines.push("skinparam actorStyle awesome".to_string());
    }

    for actor in &model.actors {
        let id = actor_id(actor);
        if id == *actor {
            lines.push(format!("actor {}", actor));
        } else {
            lines.push(format!("actor {} as {}", quote_if_needed(actor), id));
        }
    }

    let system = if model.system.is_empty() { "System" } else { model.system.as_str() };
    lines.push(format!("rectangle {} {{", quote_if_needed(system)));
    for use_case in &model.use_cases {
        lines.push(format!("  usecase {}", use_case_ref(&use_case.name)));
    }
    lines.push("}".to_string());

    for (actor, use_case) in &model.associations {
        lines.push(format!("{} --> {}", actor_id(actor), use_case_ref(use_case)));
    }
    for link in &model.links {
        let stereotype = match link.kind {
            UseCaseLinkKind::Include => "include",
            UseCaseLinkKind::Extend => "extend",
        };
        lines.push(format!(
            "{} ..> {} : <<{}>>",
            use_case_ref(&link.from),
            use_case_ref(&link.to),
            stereotype
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UseCase, UseCaseLink};

    fn order_model() -> UseCaseModel {
        UseCaseModel {
            system: "System".to_string(),
            actors: vec!["Authentication System".to_string(), "User".to_string()],
            use_cases: vec![
                UseCase::new("Create Order", "User"),
                UseCase::new("Authenticate User", "Authentication System"),
            ],
            associations: vec![
                ("User".to_string(), "Create Order".to_string()),
                ("Authentication System".to_string(), "Authenticate User".to_string()),
            ],
            links: vec![UseCaseLink {
                from: "Create Order".to_string(),
                to: "Authenticate User".to_string(),
                kind: UseCaseLinkKind::Include,
            }],
        }
    }

    #[test]
    fn test_render_order_model() {
        let lines = render(
            &order_model(),
            &RenderOptions {
                style: false,
                hide_empty_members: false,
            },
        );
        assert_eq!(
            lines,
            vec![
                "left to right direction",
                "actor \"Authentication System\" as Authentication_System",
                "actor User",
                "rectangle System {",
                "  usecase (Create Order)",
                "  usecase (Authenticate User)",
                "}",
                "User --> (Create Order)",
                "Authentication_System --> (Authenticate User)",
                "(Create Order) ..> (Authenticate User) : <<include>>",
            ]
        );
    }

    #[test]
    fn test_extend_link() {
        let mut model = order_model();
        model.links = vec![UseCaseLink {
            from: "Validate Input".to_string(),
            to: "Create Order".to_string(),
            kind: UseCaseLinkKind::Extend,
        }];
        let lines = render(&model, &RenderOptions::default());
        assert!(lines.contains(&"(Validate Input) ..> (Create Order) : <<extend>>".to_string()));
        assert!(lines.contains(&"skinparam packageStyle rectangle".to_string()));
    }
}
