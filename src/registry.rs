// Converter registry
//
// A converter is a (language, diagram kind) pair plus borrowed options. The
// registry decides which pairs exist; it never holds per-conversion state.

use crate::analysis::AnalysisOptions;
use crate::error::{Error, Result};
use crate::extractors;
use crate::lang::{DiagramKind, Language, LanguageTag};
use crate::model::{
    ActivityModel, ClassModel, DiagramDocument, DiagramModel, SequenceModel, UseCaseModel,
};
use crate::output::{DiagramRenderer, RenderOptions};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Immutable options shared by every converter of a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub render: RenderOptions,
    pub analysis: AnalysisOptions,
}

/// One extractor + renderer pair
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    language: LanguageTag,
    kind: DiagramKind,
    options: &'a Options,
}

impl<'a> Converter<'a> {
    pub fn language(&self) -> LanguageTag {
        self.language
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    /// Structural model of one source unit
    pub fn extract(&self, source: &str) -> DiagramModel {
        let analysis = &self.options.analysis;
        match (self.kind, self.language) {
            (DiagramKind::Component, _) => {
                DiagramModel::Component(analysis.component_analyzer().analyze(source))
            }
            (DiagramKind::Package, _) => DiagramModel::Package(analysis.package_analyzer().analyze(source)),
            (kind, LanguageTag::Concrete(language)) => structural(kind, source, language),
            // Only reachable through a hand-built converter; degrade to an empty model
            (kind, LanguageTag::Any) => empty(kind),
        }
    }

    pub fn render(&self, model: &DiagramModel) -> DiagramDocument {
        DiagramRenderer::new().with_options(self.options.render).render(model)
    }

    /// Extract and render in one step
    pub fn document(&self, source: &str) -> DiagramDocument {
        let model = self.extract(source);
        debug!(language = %self.language, kind = %self.kind, "rendering diagram");
        self.render(&model)
    }

    /// Diagram text of one source unit
    pub fn convert(&self, source: &str) -> String {
        self.document(source).text()
    }
}

fn structural(kind: DiagramKind, source: &str, language: Language) -> DiagramModel {
    match kind {
        DiagramKind::Class => DiagramModel::Class(extractors::class::extract(source, language)),
        DiagramKind::Sequence => DiagramModel::Sequence(extractors::sequence::extract(source, language)),
        DiagramKind::UseCase => DiagramModel::UseCase(extractors::usecase::extract(source, language)),
        DiagramKind::Activity => DiagramModel::Activity(extractors::activity::extract(source, language)),
        DiagramKind::Component | DiagramKind::Package => empty(kind),
    }
}

fn empty(kind: DiagramKind) -> DiagramModel {
    match kind {
        DiagramKind::Class => DiagramModel::Class(ClassModel::default()),
        DiagramKind::Sequence => DiagramModel::Sequence(SequenceModel::default()),
        DiagramKind::UseCase => DiagramModel::UseCase(UseCaseModel::default()),
        DiagramKind::Activity => DiagramModel::Activity(ActivityModel::default()),
        DiagramKind::Component => DiagramModel::Component(Default::default()),
        DiagramKind::Package => DiagramModel::Package(Default::default()),
    }
}

static STANDARD: Lazy<Registry> = Lazy::new(Registry::default);

/// Lookup table of supported language and diagram kind pairs
#[derive(Debug, Clone, Default)]
pub struct Registry {
    options: Options,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry with default options
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Every valid pair: each concrete language with every kind, then `any`
    /// with the language-agnostic kinds
    pub fn combinations() -> Vec<(LanguageTag, DiagramKind)> {
        let mut pairs: Vec<(LanguageTag, DiagramKind)> = Language::ALL
            .iter()
            .flat_map(|lang| DiagramKind::ALL.iter().map(move |kind| (LanguageTag::Concrete(*lang), *kind)))
            .collect();
        pairs.extend(
            DiagramKind::ALL
                .iter()
                .filter(|kind| kind.is_language_agnostic())
                .map(|kind| (LanguageTag::Any, *kind)),
        );
        pairs
    }

    /// `language+kind` names of all valid pairs
    pub fn combination_names() -> Vec<String> {
        Self::combinations()
            .into_iter()
            .map(|(lang, kind)| format!("{}+{}", lang, kind))
            .collect()
    }

    pub fn is_supported(language: LanguageTag, kind: DiagramKind) -> bool {
        matches!(language, LanguageTag::Concrete(_)) || kind.is_language_agnostic()
    }

    /// Converter for typed keys, if the pair is valid
    pub fn lookup(&self, language: LanguageTag, kind: DiagramKind) -> Option<Converter<'_>> {
        Self::is_supported(language, kind).then_some(Converter {
            language,
            kind,
            options: &self.options,
        })
    }

    /// Converter for user-supplied names (case-insensitive, aliases accepted)
    pub fn get(&self, language: &str, kind: &str) -> Result<Converter<'_>> {
        let converter = match (LanguageTag::from_name(language), DiagramKind::from_name(kind)) {
            (Some(lang), Some(k)) => self.lookup(lang, k),
            _ => None,
        };
        converter.ok_or_else(|| {
            warn!(language, kind, "unsupported combination");
            Error::unsupported(language, kind, Self::combination_names())
        })
    }
}
