// Language-independent view of one source unit
//
// Python, Java and JavaScript/TypeScript go through tree-sitter readers.
// C#, PHP and source the grammars reject go through the normalizer and the
// declaration scanner. All of them end up as the same declarations and
// callables so the extractors never branch on language.

use crate::extract::normalize::{normalize, NormalizeOptions};
use crate::extract::scanner::{marker_value, scan_functions, scan_types, ScannedMethod, ScannedType};
use crate::extract::statements::{parse_statements, Statement};
use crate::extract::syntax::{syntax_for, Syntax};
use crate::lang::Language;
use crate::model::{Member, MemberKind, Modifier, TypeDeclaration, TypeKind, Visibility};
use crate::parser::{decorator_name, parse_brace, parse_python, python_visibility, PyClass, PyFunction};

/// A method or free function with everything the extractors read from it
#[derive(Debug, Clone)]
pub struct Callable {
    pub member: Member,
    /// Annotations, attributes or decorators, without `@` / brackets
    pub annotations: Vec<String>,
    /// Preserved directive comments
    pub markers: Vec<String>,
    /// Normalized body text
    pub body: String,
    parsed: Option<Vec<Statement>>,
}

impl Callable {
    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn marker(&self, tag: &str) -> Option<&str> {
        marker_value(&self.markers, tag)
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty() || self.parsed.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Statement structure of the body
    pub fn statements(&self) -> Vec<Statement> {
        match &self.parsed {
            Some(statements) => statements.clone(),
            None => parse_statements(&self.body),
        }
    }

    /// Visible from outside its type
    pub fn is_public(&self) -> bool {
        self.member.visibility == Visibility::Public
    }

    /// Public callable around an anonymous body, such as an inline route handler
    pub fn anonymous(body: &str) -> Self {
        Self {
            member: Member::new(MemberKind::Method, "handler").with_visibility(Visibility::Public),
            annotations: Vec::new(),
            markers: Vec::new(),
            body: body.to_string(),
            parsed: None,
        }
    }

    fn from_scanned(method: ScannedMethod) -> Self {
        Self {
            body: method.body.unwrap_or_default(),
            member: method.member,
            annotations: method.annotations,
            markers: method.markers,
            parsed: None,
        }
    }
}

/// A type declaration with its callables
#[derive(Debug, Clone)]
pub struct TypeUnit {
    pub decl: TypeDeclaration,
    pub annotations: Vec<String>,
    pub markers: Vec<String>,
    pub methods: Vec<Callable>,
}

impl TypeUnit {
    pub fn short_name(&self) -> &str {
        self.decl.short_name()
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| crate::extract::scanner::annotation_name(a) == name)
    }

    fn from_scanned(scanned: ScannedType) -> Self {
        Self {
            decl: scanned.decl,
            annotations: scanned.annotations,
            markers: scanned.markers,
            methods: scanned.methods.into_iter().map(Callable::from_scanned).collect(),
        }
    }
}

/// Everything read from one source unit
#[derive(Debug, Clone)]
pub struct Source {
    pub syntax: &'static Syntax,
    /// Normalized source text
    pub text: String,
    pub types: Vec<TypeUnit>,
    /// Top-level functions
    pub functions: Vec<Callable>,
}

impl Source {
    pub fn read(text: &str, language: Language, options: &NormalizeOptions) -> Self {
        let syntax = syntax_for(language);
        if language == Language::Python {
            let module = parse_python(text);
            return Self {
                syntax,
                text: normalize(text, syntax, options),
                types: module.classes.iter().map(python_type).collect(),
                functions: module.functions.into_iter().map(python_callable).collect(),
            };
        }

        let normalized = normalize(text, syntax, options);
        if let Some(module) = parse_brace(text, language, options) {
            return Self {
                syntax,
                types: module.types.into_iter().map(TypeUnit::from_scanned).collect(),
                functions: module.functions.into_iter().map(Callable::from_scanned).collect(),
                text: normalized,
            };
        }

        let scanned = scan_types(&normalized, syntax);
        let spans: Vec<(usize, usize)> = scanned.iter().map(|t| t.span).collect();
        let functions = scan_functions(&normalized, syntax, &spans)
            .into_iter()
            .map(Callable::from_scanned)
            .collect();
        Self {
            syntax,
            types: scanned.into_iter().map(TypeUnit::from_scanned).collect(),
            functions,
            text: normalized,
        }
    }

    pub fn language(&self) -> Language {
        self.syntax.language
    }

    /// Declared type by short or qualified name
    pub fn find_type(&self, name: &str) -> Option<&TypeUnit> {
        self.types
            .iter()
            .find(|t| t.decl.name == name || t.short_name() == name)
    }
}

const ABSTRACT_BASES: &[&str] = &["ABC", "ABCMeta"];
const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];
const IGNORED_BASES: &[&str] = &["object", "ABC", "Protocol", "Generic"];

fn base_name(base: &str) -> &str {
    let end = base.find('[').unwrap_or(base.len());
    let name = &base[..end];
    name.rsplit('.').next().unwrap_or(name).trim()
}

/// Declaration of a Python class
pub(crate) fn python_type(class: &PyClass) -> TypeUnit {
    let bases: Vec<&str> = class.bases.iter().map(|b| base_name(b)).collect();
    let kind = if bases.iter().any(|b| ENUM_BASES.contains(b)) {
        TypeKind::Enum
    } else if bases.contains(&"Protocol") {
        TypeKind::Interface
    } else {
        TypeKind::Class
    };

    let mut decl = TypeDeclaration::new(&class.name, kind);
    decl.base_types = class
        .bases
        .iter()
        .filter(|b| {
            let name = base_name(b);
            !IGNORED_BASES.contains(&name) && !ENUM_BASES.contains(&name)
        })
        .cloned()
        .collect();
    decl.stereotypes = class.decorators.iter().map(|d| decorator_name(d).to_string()).collect();

    let abstract_meta = class
        .keywords
        .iter()
        .any(|(k, v)| k == "metaclass" && ABSTRACT_BASES.contains(&base_name(v)));
    let methods: Vec<Callable> = class.methods.iter().cloned().map(python_callable).collect();
    let has_abstract = methods.iter().any(|m| m.member.has_modifier(Modifier::Abstract));
    if abstract_meta || bases.iter().any(|b| ABSTRACT_BASES.contains(b)) || has_abstract {
        decl.add_modifier(Modifier::Abstract);
    }

    for field in &class.class_fields {
        let mut field = field.clone();
        if kind == TypeKind::Enum {
            field.kind = MemberKind::Constant;
            field.type_name = None;
        }
        decl.members.push(field);
    }
    decl.members.extend(class.instance_fields.iter().cloned());
    decl.members.extend(methods.iter().map(|m| m.member.clone()));

    TypeUnit {
        decl,
        annotations: class.decorators.clone(),
        markers: class.markers.clone(),
        methods,
    }
}

/// Callable view of a Python function or method
pub(crate) fn python_callable(function: PyFunction) -> Callable {
    let kind = if function.name == "__init__" {
        MemberKind::Constructor
    } else if function.has_decorator("property") || function.has_decorator("cached_property") {
        MemberKind::Property
    } else {
        MemberKind::Method
    };
    let mut member = Member::new(kind, &function.name)
        .with_visibility(python_visibility(&function.name))
        .with_type(function.return_type.clone());
    if kind != MemberKind::Property {
        member = member.with_parameters(function.parameters.clone());
    }
    if function.has_decorator("staticmethod") || function.has_decorator("classmethod") {
        member.add_modifier(Modifier::Static);
    }
    if function.has_decorator("abstractmethod") {
        member.add_modifier(Modifier::Abstract);
    }
    if function.is_async {
        member.add_modifier(Modifier::Async);
    }
    Callable {
        member,
        annotations: function.decorators,
        markers: function.markers,
        body: function.body_text,
        parsed: Some(function.body),
    }
}
