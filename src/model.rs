// Intermediate models for diagram extraction
//
// Every model here is built fresh by one conversion and dropped when it ends.
// They are serializable so the CLI can dump them for debugging.

use crate::lang::{DiagramKind, LanguageTag};
use serde::{Deserialize, Serialize};

/// Raw input for one conversion
#[derive(Debug, Clone, Copy)]
pub struct SourceUnit<'a> {
    /// Source text as supplied by the caller
    pub text: &'a str,
    /// Declared language
    pub language: LanguageTag,
}

impl<'a> SourceUnit<'a> {
    pub fn new(text: &'a str, language: LanguageTag) -> Self {
        Self { text, language }
    }
}

// ============================================================================
// Class diagrams
// ============================================================================

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Trait,
    Enum,
}

impl TypeKind {
    /// Resolve a declaration keyword
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "interface" => TypeKind::Interface,
            "struct" => TypeKind::Struct,
            "trait" => TypeKind::Trait,
            "enum" => TypeKind::Enum,
            _ => TypeKind::Class,
        }
    }
}

/// Member or type modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Static,
    Abstract,
    Virtual,
    Override,
    Final,
    Async,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "static" => Some(Modifier::Static),
            "abstract" => Some(Modifier::Abstract),
            "virtual" => Some(Modifier::Virtual),
            "override" => Some(Modifier::Override),
            "final" | "sealed" => Some(Modifier::Final),
            "async" => Some(Modifier::Async),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Virtual => "virtual",
            Modifier::Override => "override",
            Modifier::Final => "final",
            Modifier::Async => "async",
        }
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    /// C# `internal` or Java package-private
    Package,
}

impl Visibility {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "internal" => Some(Visibility::Package),
            _ => None,
        }
    }

    /// Diagram symbol for this visibility
    pub fn symbol(&self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Private => '-',
            Visibility::Protected => '#',
            Visibility::Package => '~',
        }
    }
}

/// A method or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (without `$` sigil)
    pub name: String,
    /// Declared type, verbatim
    pub type_name: Option<String>,
    /// Has a default value or `?` marker
    pub optional: bool,
    /// Default value expression, if any
    pub default: Option<String>,
    /// Rest/variadic parameter
    pub variadic: bool,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: None,
            optional: false,
            default: None,
            variadic: false,
        }
    }

    pub fn typed(name: &str, type_name: &str) -> Self {
        let mut param = Self::new(name);
        param.type_name = Some(type_name.to_string());
        param
    }
}

/// Kind of a type member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    Constant,
}

impl MemberKind {
    pub fn is_callable(&self) -> bool {
        matches!(self, MemberKind::Method | MemberKind::Constructor)
    }
}

/// A field, property, method, constructor or constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub kind: MemberKind,
    pub visibility: Visibility,
    /// Declared or inferred type; return type for methods
    pub type_name: Option<String>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub modifiers: Vec<Modifier>,
}

impl Member {
    pub fn new(kind: MemberKind, name: &str) -> Self {
        Self {
            kind,
            visibility: Visibility::default(),
            type_name: None,
            name: name.to_string(),
            parameters: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_type(mut self, type_name: Option<String>) -> Self {
        self.type_name = type_name.filter(|t| !t.is_empty());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Add a modifier once, keeping declaration order
    pub fn add_modifier(&mut self, modifier: Modifier) {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

/// A class, interface, struct, trait or enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Name, qualified with the enclosing namespace when one is declared
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: Vec<Modifier>,
    /// Raw base type references from the extends/base list
    pub base_types: Vec<String>,
    /// Raw references from an explicit implements clause
    pub interfaces: Vec<String>,
    /// Decorators or annotations on the declaration
    pub stereotypes: Vec<String>,
    pub members: Vec<Member>,
    /// Placeholder for a referenced type that is not declared in the input
    pub external: bool,
}

impl TypeDeclaration {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            modifiers: Vec::new(),
            base_types: Vec::new(),
            interfaces: Vec::new(),
            stereotypes: Vec::new(),
            members: Vec::new(),
            external: false,
        }
    }

    pub fn external(name: &str) -> Self {
        let mut decl = Self::new(name, TypeKind::Class);
        decl.external = true;
        decl
    }

    /// Name without namespace qualification
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn add_modifier(&mut self, modifier: Modifier) {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(&Modifier::Abstract)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind, MemberKind::Field | MemberKind::Property))
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind.is_callable())
    }

    /// Type of a field or property by name
    pub fn field_type(&self, name: &str) -> Option<&str> {
        self.fields()
            .find(|m| m.name == name)
            .and_then(|m| m.type_name.as_deref())
    }
}

/// Relationship kind between two types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Inheritance,
    Implementation,
    Composition,
    Aggregation,
    Association,
    Dependency,
}

/// An edge between two types; identity is `(source, target, kind)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    /// Advisory label, never part of identity
    pub label: Option<String>,
}

impl Relationship {
    pub fn new(source: &str, target: &str, kind: RelationshipKind) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Canonical dedup key
    pub fn key(&self) -> (&str, &str, RelationshipKind) {
        (&self.source, &self.target, self.kind)
    }
}

/// Types and relationships for a class diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModel {
    pub types: Vec<TypeDeclaration>,
    pub relationships: Vec<Relationship>,
}

// ============================================================================
// Sequence diagrams
// ============================================================================

/// Role of a sequence participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Actor,
    Boundary,
    Control,
    #[default]
    Entity,
    Database,
}

impl Role {
    /// Declaration keyword in the diagram
    pub fn keyword(&self) -> &'static str {
        match self {
            Role::Actor => "actor",
            Role::Boundary => "boundary",
            Role::Control => "control",
            Role::Entity => "entity",
            Role::Database => "database",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub role: Role,
}

impl Participant {
    pub fn new(name: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Sync,
    Async,
    Return,
}

/// A message between two participants, in discovery order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub from: String,
    pub to: String,
    pub message: String,
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn new(from: &str, to: &str, message: &str, kind: InteractionKind) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            message: message.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceModel {
    /// Participants in declaration order
    pub participants: Vec<Participant>,
    pub interactions: Vec<Interaction>,
}

impl SequenceModel {
    /// Register a participant once; the first role seen wins
    pub fn add_participant(&mut self, name: &str, role: Role) {
        if !self.participants.iter().any(|p| p.name == name) {
            self.participants.push(Participant::new(name, role));
        }
    }
}

// ============================================================================
// Use case diagrams
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCase {
    pub name: String,
    /// Method or handler the use case was derived from
    pub source_method: Option<String>,
    pub http_verb: Option<String>,
    pub route: Option<String>,
    pub actor: String,
}

impl UseCase {
    pub fn new(name: &str, actor: &str) -> Self {
        Self {
            name: name.to_string(),
            source_method: None,
            http_verb: None,
            route: None,
            actor: actor.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCaseLinkKind {
    Include,
    Extend,
}

/// Include or extend edge between use cases, by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseLink {
    pub from: String,
    pub to: String,
    pub kind: UseCaseLinkKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseModel {
    /// Name of the subject system boundary
    pub system: String,
    /// Actor names, sorted
    pub actors: Vec<String>,
    pub use_cases: Vec<UseCase>,
    /// Actor to use case edges, in discovery order
    pub associations: Vec<(String, String)>,
    pub links: Vec<UseCaseLink>,
}

// ============================================================================
// Activity diagrams
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Start,
    Activity,
    Decision,
    Loop,
    Parallel,
    ErrorHandling,
    End,
}

/// A labelled branch body of a compound node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub label: String,
    pub nodes: Vec<ActivityNode>,
}

impl Branch {
    pub fn new(label: &str, nodes: Vec<ActivityNode>) -> Self {
        Self {
            label: label.to_string(),
            nodes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityNode {
    pub kind: ActivityKind,
    pub swimlane: String,
    pub description: String,
    /// Branch bodies for decision, loop, parallel and error-handling nodes
    pub branches: Vec<Branch>,
}

impl ActivityNode {
    pub fn new(kind: ActivityKind, swimlane: &str, description: &str) -> Self {
        Self {
            kind,
            swimlane: swimlane.to_string(),
            description: description.to_string(),
            branches: Vec::new(),
        }
    }

    pub fn activity(swimlane: &str, description: &str) -> Self {
        Self::new(ActivityKind::Activity, swimlane, description)
    }

    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Count of this node and all nested nodes
    pub fn count(&self) -> usize {
        1 + self
            .branches
            .iter()
            .flat_map(|b| b.nodes.iter())
            .map(ActivityNode::count)
            .sum::<usize>()
    }
}

/// One linearized entry method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFlow {
    pub name: String,
    pub nodes: Vec<ActivityNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityModel {
    pub flows: Vec<ActivityFlow>,
}

// ============================================================================
// Package and component diagrams
// ============================================================================

/// Architectural layer of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Presentation,
    Business,
    Domain,
    Data,
    Configuration,
    Utility,
    Testing,
    External,
    #[default]
    Module,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Presentation => "presentation",
            Layer::Business => "business",
            Layer::Domain => "domain",
            Layer::Data => "data",
            Layer::Configuration => "configuration",
            Layer::Utility => "utility",
            Layer::Testing => "testing",
            Layer::External => "external",
            Layer::Module => "module",
        }
    }

    /// Title used for a layer group
    pub fn title(&self) -> &'static str {
        match self {
            Layer::Presentation => "Presentation",
            Layer::Business => "Business",
            Layer::Domain => "Domain",
            Layer::Data => "Data",
            Layer::Configuration => "Configuration",
            Layer::Utility => "Utility",
            Layer::Testing => "Testing",
            Layer::External => "External",
            Layer::Module => "Module",
        }
    }

    /// Fill color for the layer
    pub fn color(&self) -> &'static str {
        match self {
            Layer::Presentation => "#E8F4FD",
            Layer::Business => "#FFF2CC",
            Layer::Domain => "#D4E6B7",
            Layer::Data => "#F8CECC",
            Layer::Configuration => "#E1D5E7",
            Layer::Utility => "#DAE8FC",
            Layer::Testing => "#FFE6CC",
            Layer::External => "#F5F5F5",
            Layer::Module => "#FFFFFF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
    /// Dotted path, e.g. `src.services`
    pub qualified_name: String,
    pub short_name: String,
    /// Depth in the hierarchy, root packages are 0
    pub level: usize,
    /// Qualified name of the parent, looked up by name
    pub parent: Option<String>,
    pub files: Vec<String>,
    pub layer: Layer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Uses,
    Depends,
}

/// Dependency between two packages or components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    /// Target is an external package
    pub external: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageModel {
    /// Packages in discovery order
    pub packages: Vec<PackageNode>,
    pub dependencies: Vec<Dependency>,
}

impl PackageModel {
    pub fn get(&self, qualified_name: &str) -> Option<&PackageNode> {
        self.packages.iter().find(|p| p.qualified_name == qualified_name)
    }

    pub fn has_external(&self) -> bool {
        self.packages.iter().any(|p| p.layer == Layer::External)
    }
}

/// Kind of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Service,
    Api,
    Controller,
    Handler,
    Entity,
    Repository,
    Database,
    Ui,
    Configuration,
    Utility,
    Style,
    ExternalLibrary,
    Interface,
    Function,
    Module,
    Class,
    Directory,
    Component,
}

impl ComponentKind {
    /// Stereotype shown next to the component
    pub fn stereotype(&self) -> &'static str {
        match self {
            ComponentKind::Service => "service",
            ComponentKind::Api => "API",
            ComponentKind::Controller => "controller",
            ComponentKind::Handler => "handler",
            ComponentKind::Entity => "entity",
            ComponentKind::Repository => "repository",
            ComponentKind::Database => "database",
            ComponentKind::Ui => "UI",
            ComponentKind::Configuration => "config",
            ComponentKind::Utility => "utility",
            ComponentKind::Style => "style",
            ComponentKind::ExternalLibrary => "library",
            ComponentKind::Interface => "interface",
            ComponentKind::Function => "function",
            ComponentKind::Module => "module",
            ComponentKind::Class => "class",
            ComponentKind::Directory => "folder",
            ComponentKind::Component => "component",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub name: String,
    /// Dotted package the component belongs to
    pub package: String,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentModel {
    pub components: Vec<ComponentNode>,
    pub dependencies: Vec<Dependency>,
}

// ============================================================================
// Union and document
// ============================================================================

/// Any extracted model, tagged by diagram kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagramModel {
    Class(ClassModel),
    Sequence(SequenceModel),
    UseCase(UseCaseModel),
    Activity(ActivityModel),
    Component(ComponentModel),
    Package(PackageModel),
}

impl DiagramModel {
    pub fn kind(&self) -> DiagramKind {
        match self {
            DiagramModel::Class(_) => DiagramKind::Class,
            DiagramModel::Sequence(_) => DiagramKind::Sequence,
            DiagramModel::UseCase(_) => DiagramKind::UseCase,
            DiagramModel::Activity(_) => DiagramKind::Activity,
            DiagramModel::Component(_) => DiagramKind::Component,
            DiagramModel::Package(_) => DiagramKind::Package,
        }
    }
}

pub const OPEN_MARKER: &str = "@startuml";
pub const CLOSE_MARKER: &str = "@enduml";

/// A rendered diagram: ordered DSL lines bounded by open/close markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramDocument {
    kind: DiagramKind,
    lines: Vec<String>,
}

impl DiagramDocument {
    /// Wrap body statements with the open and close markers
    pub fn new(kind: DiagramKind, body: Vec<String>) -> Self {
        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(OPEN_MARKER.to_string());
        lines.extend(body);
        lines.push(CLOSE_MARKER.to_string());
        Self { kind, lines }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains_line(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l.trim() == line)
    }
}

impl std::fmt::Display for DiagramDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_symbols() {
        assert_eq!(Visibility::Public.symbol(), '+');
        assert_eq!(Visibility::Private.symbol(), '-');
        assert_eq!(Visibility::Protected.symbol(), '#');
        assert_eq!(Visibility::Package.symbol(), '~');
        assert_eq!(Visibility::from_keyword("internal"), Some(Visibility::Package));
    }

    #[test]
    fn test_member_modifiers_dedup() {
        let mut member = Member::new(MemberKind::Method, "run");
        member.add_modifier(Modifier::Static);
        member.add_modifier(Modifier::Static);
        assert_eq!(member.modifiers, vec![Modifier::Static]);
    }

    #[test]
    fn test_type_short_name() {
        let decl = TypeDeclaration::new("App.Billing.Invoice", TypeKind::Class);
        assert_eq!(decl.short_name(), "Invoice");
    }

    #[test]
    fn test_field_type_lookup() {
        let mut decl = TypeDeclaration::new("OrderService", TypeKind::Class);
        decl.members.push(
            Member::new(MemberKind::Field, "repo").with_type(Some("OrderRepository".to_string())),
        );
        assert_eq!(decl.field_type("repo"), Some("OrderRepository"));
        assert_eq!(decl.field_type("missing"), None);
    }

    #[test]
    fn test_relationship_key_ignores_label() {
        let a = Relationship::new("A", "B", RelationshipKind::Dependency).with_label("save");
        let b = Relationship::new("A", "B", RelationshipKind::Dependency).with_label("load");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_document_markers() {
        let doc = DiagramDocument::new(DiagramKind::Class, vec![]);
        assert_eq!(doc.lines().first().map(String::as_str), Some(OPEN_MARKER));
        assert_eq!(doc.lines().last().map(String::as_str), Some(CLOSE_MARKER));
        assert_eq!(doc.text(), "@startuml\n@enduml");
    }

    #[test]
    fn test_activity_node_count() {
        let node = ActivityNode::new(ActivityKind::Decision, "System", "x")
            .with_branch(Branch::new("yes", vec![ActivityNode::activity("System", "a")]))
            .with_branch(Branch::new("no", vec![ActivityNode::activity("System", "b")]));
        assert_eq!(node.count(), 3);
    }

    #[test]
    fn test_model_serializes_with_kind_tag() {
        let model = DiagramModel::Class(ClassModel::default());
        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"kind\":\"class\""));
    }
}
