// Class diagram extraction

use super::source::Source;
use crate::analysis::relationships::class_model;
use crate::extract::normalize::NormalizeOptions;
use crate::lang::Language;
use crate::model::ClassModel;
use tracing::debug;

/// Types, members and their relationships
pub fn extract(text: &str, language: Language) -> ClassModel {
    let source = Source::read(text, language, &NormalizeOptions::new());
    let types: Vec<_> = source.types.into_iter().map(|t| t.decl).collect();
    debug!(language = language.as_str(), types = types.len(), "class declarations scanned");
    class_model(types)
}
