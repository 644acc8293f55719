// Class diagram rendering

use super::RenderOptions;
use crate::model::{ClassModel, Member, MemberKind, Modifier, RelationshipKind, TypeDeclaration, TypeKind};

pub(super) fn render(model: &ClassModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    if options.hide_empty_members {
        lines.push("hide empty members".to_string());
    }
    if options.style {
        lines.push("skinparam classAttributeIconSize 0".to_string());
    }

    for decl in &model.types {
        type_block(decl, &mut lines);
    }

    for rel in &model.relationships {
        let edge = match rel.kind {
            RelationshipKind::Inheritance => format!("{} <|-- {}", rel.target, rel.source),
            RelationshipKind::Implementation => format!("{} <|.. {}", rel.target, rel.source),
            RelationshipKind::Composition => format!("{} *-- {}", rel.source, rel.target),
            RelationshipKind::Aggregation => format!("{} o-- {}", rel.source, rel.target),
            RelationshipKind::Association => format!("{} --> {}", rel.source, rel.target),
            RelationshipKind::Dependency => format!("{} ..> {}", rel.source, rel.target),
        };
        match &rel.label {
            Some(label) if !matches!(rel.kind, RelationshipKind::Inheritance | RelationshipKind::Implementation) => {
                lines.push(format!("{} : {}", edge, label))
            }
            _ => lines.push(edge),
        }
    }
    lines
}

fn keyword(decl: &TypeDeclaration) -> &'static str {
    match decl.kind {
        TypeKind::Interface => "interface",
        TypeKind::Enum => "enum",
        TypeKind::Struct => "struct",
        TypeKind::Class | TypeKind::Trait if decl.is_abstract() => "abstract class",
        TypeKind::Class | TypeKind::Trait => "class",
    }
}

fn type_block(decl: &TypeDeclaration, lines: &mut Vec<String>) {
    let mut stereotypes: Vec<&str> = decl.stereotypes.iter().map(String::as_str).collect();
    if decl.kind == TypeKind::Trait {
        stereotypes.insert(0, "trait");
    }
    if decl.external {
        stereotypes.push("external");
    }
    let mut header = format!("{} {}", keyword(decl), decl.name);
    for stereotype in stereotypes {
        header.push_str(&format!(" <<{}>>", stereotype));
    }

    if decl.members.is_empty() {
        lines.push(header);
        return;
    }
    lines.push(format!("{} {{", header));
    for member in &decl.members {
        lines.push(format!("  {}", member_line(member, decl.kind == TypeKind::Enum)));
    }
    lines.push("}".to_string());
}

fn member_line(member: &Member, in_enum: bool) -> String {
    if in_enum && member.kind == MemberKind::Constant {
        return member.name.clone();
    }
    let mut line = String::new();
    if member.has_modifier(Modifier::Static) || member.kind == MemberKind::Constant {
        line.push_str("{static} ");
    }
    if member.has_modifier(Modifier::Abstract) {
        line.push_str("{abstract} ");
    }
    line.push(member.visibility.symbol());
    line.push(' ');
    line.push_str(&member.name);

    if member.kind.is_callable() {
        let params: Vec<String> = member
            .parameters
            .iter()
            .map(|p| match &p.type_name {
                Some(ty) => format!("{}: {}", p.name, ty),
                None => p.name.clone(),
            })
            .collect();
        line.push_str(&format!("({})", params.join(", ")));
    }
    if member.kind != MemberKind::Constructor {
        if let Some(ty) = &member.type_name {
            line.push_str(&format!(" : {}", ty));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parameter, Relationship, Visibility};

    fn invoice_model() -> ClassModel {
        let mut invoice = TypeDeclaration::new("Invoice", TypeKind::Class);
        invoice.base_types.push("Document".to_string());
        invoice.members.push(
            Member::new(MemberKind::Field, "id")
                .with_visibility(Visibility::Private)
                .with_type(Some("String".to_string())),
        );
        invoice.members.push(Member::new(MemberKind::Method, "getId").with_type(Some("String".to_string())));
        ClassModel {
            types: vec![invoice, TypeDeclaration::external("Document")],
            relationships: vec![Relationship::new("Invoice", "Document", RelationshipKind::Inheritance)],
        }
    }

    #[test]
    fn test_type_block_and_inheritance() {
        let lines = render(&invoice_model(), &RenderOptions::default());
        assert_eq!(
            lines,
            vec![
                "hide empty members",
                "skinparam classAttributeIconSize 0",
                "class Invoice {",
                "  - id : String",
                "  + getId() : String",
                "}",
                "class Document <<external>>",
                "Document <|-- Invoice",
            ]
        );
    }

    #[test]
    fn test_arrows_by_kind() {
        let model = ClassModel {
            types: Vec::new(),
            relationships: vec![
                Relationship::new("Repo", "IRepo", RelationshipKind::Implementation),
                Relationship::new("Order", "Customer", RelationshipKind::Composition),
                Relationship::new("Order", "Line", RelationshipKind::Aggregation),
                Relationship::new("Service", "Order", RelationshipKind::Dependency).with_label("save"),
            ],
        };
        let lines = render(&model, &RenderOptions { style: false, hide_empty_members: false });
        assert_eq!(
            lines,
            vec!["IRepo <|.. Repo", "Order *-- Customer", "Order o-- Line", "Service ..> Order : save"]
        );
    }

    #[test]
    fn test_members_with_modifiers() {
        let mut shape = TypeDeclaration::new("Shape", TypeKind::Class);
        shape.add_modifier(Modifier::Abstract);
        shape.stereotypes.push("Entity".to_string());
        let mut area = Member::new(MemberKind::Method, "area")
            .with_visibility(Visibility::Protected)
            .with_type(Some("double".to_string()))
            .with_parameters(vec![Parameter::typed("scale", "int")]);
        area.add_modifier(Modifier::Abstract);
        shape.members.push(area);
        shape.members.push(Member::new(MemberKind::Constructor, "Shape").with_type(Some("Shape".to_string())));

        let lines = render(
            &ClassModel {
                types: vec![shape],
                relationships: Vec::new(),
            },
            &RenderOptions::default(),
        );
        assert!(lines.contains(&"abstract class Shape <<Entity>> {".to_string()));
        assert!(lines.contains(&"  {abstract} # area(scale: int) : double".to_string()));
        assert!(lines.contains(&"  + Shape()".to_string()));
    }

    #[test]
    fn test_enum_constants() {
        let mut status = TypeDeclaration::new("Status", TypeKind::Enum);
        status.members.push(Member::new(MemberKind::Constant, "ACTIVE"));
        let lines = render(
            &ClassModel {
                types: vec![status],
                relationships: Vec::new(),
            },
            &RenderOptions::default(),
        );
        assert!(lines.contains(&"enum Status {".to_string()));
        assert!(lines.contains(&"  ACTIVE".to_string()));
    }
}
