// Relationship resolution between extracted types
//
// References are matched against the declared types by qualified name, then
// by the referencing type's namespace, then by a unique short name.

use crate::extract::naming::{collection_element, is_primitive, strip_type_ref};
use crate::model::{ClassModel, Relationship, RelationshipKind, TypeDeclaration, TypeKind};
use std::collections::{HashMap, HashSet};

/// Lookup table over the declared types of one unit
struct TypeIndex<'a> {
    by_name: HashMap<&'a str, &'a TypeDeclaration>,
    by_short: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> TypeIndex<'a> {
    fn new(types: &'a [TypeDeclaration]) -> Self {
        let mut by_name = HashMap::new();
        let mut by_short: HashMap<&str, Vec<&str>> = HashMap::new();
        for decl in types {
            by_name.insert(decl.name.as_str(), decl);
            let names = by_short.entry(decl.short_name()).or_default();
            if !names.contains(&decl.name.as_str()) {
                names.push(decl.name.as_str());
            }
        }
        Self { by_name, by_short }
    }

    /// Resolve a raw reference seen from `from` to a declared type name
    fn resolve(&self, raw: &str, from: &str) -> Option<&'a str> {
        let stripped = strip_type_ref(raw);
        if stripped.is_empty() || is_primitive(&stripped) {
            return None;
        }
        if let Some((name, _)) = self.by_name.get_key_value(stripped.as_str()) {
            return Some(*name);
        }
        if let Some((namespace, _)) = from.rsplit_once('.') {
            let qualified = format!("{}.{}", namespace, stripped);
            if let Some((name, _)) = self.by_name.get_key_value(qualified.as_str()) {
                return Some(*name);
            }
        }
        let short = stripped.rsplit('.').next().unwrap_or(&stripped);
        match self.by_short.get(short).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    fn is_interface(&self, name: &str) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|d| matches!(d.kind, TypeKind::Interface | TypeKind::Trait))
    }
}

/// Collects relationships, dropping repeats of `(source, target, kind)`
#[derive(Default)]
struct RelationshipSet {
    seen: HashSet<(String, String, RelationshipKind)>,
    items: Vec<Relationship>,
}

impl RelationshipSet {
    fn add(&mut self, relationship: Relationship) {
        let key = (
            relationship.source.clone(),
            relationship.target.clone(),
            relationship.kind,
        );
        if self.seen.insert(key) {
            self.items.push(relationship);
        }
    }
}

/// Derive relationships between the given types.
///
/// Inheritance and implementation edges are kept for undeclared bases;
/// member-derived edges only target declared types.
pub fn resolve(types: &[TypeDeclaration]) -> Vec<Relationship> {
    let index = TypeIndex::new(types);
    let mut out = RelationshipSet::default();

    for decl in types.iter().filter(|d| !d.external) {
        let source = decl.name.as_str();
        let is_interface = matches!(decl.kind, TypeKind::Interface | TypeKind::Trait);

        for base in &decl.base_types {
            let target = base_target(&index, base, source);
            if target.is_empty() || target == source {
                continue;
            }
            let kind = if !is_interface && index.is_interface(&target) {
                RelationshipKind::Implementation
            } else {
                RelationshipKind::Inheritance
            };
            out.add(Relationship::new(source, &target, kind));
        }
        for interface in &decl.interfaces {
            let target = base_target(&index, interface, source);
            if !target.is_empty() && target != source {
                out.add(Relationship::new(source, &target, RelationshipKind::Implementation));
            }
        }

        for field in decl.fields() {
            let Some(raw) = field.type_name.as_deref() else {
                continue;
            };
            let element = collection_element(raw).and_then(|e| index.resolve(&e, source));
            let (target, kind) = match element {
                Some(target) => (target, RelationshipKind::Aggregation),
                None => match index.resolve(raw, source) {
                    Some(target) => (target, RelationshipKind::Composition),
                    None => continue,
                },
            };
            if target != source {
                out.add(Relationship::new(source, target, kind).with_label(&field.name));
            }
        }

        for method in decl.methods() {
            for param in &method.parameters {
                let Some(target) = param.type_name.as_deref().and_then(|t| index.resolve(t, source)) else {
                    continue;
                };
                if target != source {
                    out.add(Relationship::new(source, target, RelationshipKind::Dependency).with_label(&method.name));
                }
            }
        }
    }
    out.items
}

fn base_target(index: &TypeIndex<'_>, raw: &str, from: &str) -> String {
    match index.resolve(raw, from) {
        Some(name) => name.to_string(),
        None => strip_type_ref(raw),
    }
}

/// Placeholder declarations for relationship ends that are not declared
pub fn external_placeholders(types: &[TypeDeclaration], relationships: &[Relationship]) -> Vec<TypeDeclaration> {
    let declared: HashSet<&str> = types.iter().map(|d| d.name.as_str()).collect();
    let mut added: HashSet<&str> = HashSet::new();
    let mut placeholders = Vec::new();
    for rel in relationships {
        for name in [rel.source.as_str(), rel.target.as_str()] {
            if !declared.contains(name) && added.insert(name) {
                placeholders.push(TypeDeclaration::external(name));
            }
        }
    }
    placeholders
}

/// Merge duplicate declarations: the last one wins, at the first one's position
pub fn merge_duplicates(types: Vec<TypeDeclaration>) -> Vec<TypeDeclaration> {
    let mut merged: Vec<TypeDeclaration> = Vec::with_capacity(types.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for decl in types {
        match positions.get(&decl.name).copied() {
            Some(pos) => merged[pos] = decl,
            None => {
                positions.insert(decl.name.clone(), merged.len());
                merged.push(decl);
            }
        }
    }
    merged
}

/// Build a class model: merge duplicates, resolve edges, add placeholders
pub fn class_model(types: Vec<TypeDeclaration>) -> ClassModel {
    let mut types = merge_duplicates(types);
    let relationships = resolve(&types);
    let placeholders = external_placeholders(&types, &relationships);
    types.extend(placeholders);
    ClassModel { types, relationships }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, MemberKind, Parameter};

    fn class(name: &str) -> TypeDeclaration {
        TypeDeclaration::new(name, TypeKind::Class)
    }

    fn field(name: &str, ty: &str) -> Member {
        Member::new(MemberKind::Field, name).with_type(Some(ty.to_string()))
    }

    #[test]
    fn test_inheritance_to_undeclared_base() {
        let mut invoice = class("Invoice");
        invoice.base_types.push("Document".to_string());
        let model = class_model(vec![invoice]);
        assert_eq!(model.relationships.len(), 1);
        assert_eq!(model.relationships[0].target, "Document");
        assert_eq!(model.relationships[0].kind, RelationshipKind::Inheritance);
        assert!(model.types.iter().any(|t| t.name == "Document" && t.external));
    }

    #[test]
    fn test_extends_interface_becomes_implementation() {
        let shape = TypeDeclaration::new("Shape", TypeKind::Interface);
        let mut circle = class("Circle");
        circle.base_types.push("Shape".to_string());
        let rels = resolve(&[shape, circle]);
        assert_eq!(rels[0].kind, RelationshipKind::Implementation);
    }

    #[test]
    fn test_composition_and_aggregation() {
        let mut order = class("Order");
        order.members.push(field("customer", "Customer"));
        order.members.push(field("lines", "List<OrderLine>"));
        order.members.push(field("note", "String"));
        let rels = resolve(&[order, class("Customer"), class("OrderLine")]);
        let kinds: Vec<_> = rels.iter().map(|r| (r.target.as_str(), r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Customer", RelationshipKind::Composition),
                ("OrderLine", RelationshipKind::Aggregation),
            ]
        );
    }

    #[test]
    fn test_dependency_dedup_keeps_first_label() {
        let mut service = class("OrderService");
        for name in ["save", "load"] {
            let method = Member::new(MemberKind::Method, name)
                .with_parameters(vec![Parameter::typed("order", "Order")]);
            service.members.push(method);
        }
        let rels = resolve(&[service, class("Order")]);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].label.as_deref(), Some("save"));
    }

    #[test]
    fn test_namespace_and_short_name_resolution() {
        let mut invoice = class("Billing.Invoice");
        invoice.members.push(field("customer", "Customer"));
        invoice.members.push(field("tax", "\\Tax\\Rate"));
        let rels = resolve(&[invoice, class("Billing.Customer"), class("Tax.Rate")]);
        let targets: Vec<_> = rels.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["Billing.Customer", "Tax.Rate"]);
    }

    #[test]
    fn test_self_reference_skipped() {
        let mut node = class("Node");
        node.members.push(field("next", "Node"));
        assert!(resolve(&[node]).is_empty());
    }

    #[test]
    fn test_duplicates_last_write_wins_first_position() {
        let mut second = class("A");
        second.members.push(field("x", "int"));
        let merged = merge_duplicates(vec![class("A"), class("B"), second]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "A");
        assert_eq!(merged[0].members.len(), 1);
    }
}
