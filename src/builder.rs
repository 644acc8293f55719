// Batch builder: one source, many diagram kinds
//
// Each kind is resolved and converted on its own. A failing kind never
// affects the others; its error text takes the place of the document.

use crate::model::DiagramDocument;
use crate::registry::Registry;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Per-kind outcome of a batch, keyed by the requested kind name
pub type BatchResult = BTreeMap<String, std::result::Result<DiagramDocument, String>>;

pub struct DiagramBuilder<'r> {
    registry: &'r Registry,
}

impl Default for DiagramBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramBuilder<'static> {
    pub fn new() -> Self {
        Self {
            registry: Registry::standard(),
        }
    }
}

impl<'r> DiagramBuilder<'r> {
    pub fn with_registry(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Convert `source` once per requested kind
    pub fn build_batch<I, S>(&self, source: &str, language: &str, kinds: I) -> BatchResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = BatchResult::new();
        for kind in kinds {
            let kind = kind.as_ref().trim();
            let outcome = self.build_one(source, language, kind);
            if let Err(e) = &outcome {
                debug!(kind, error = %e, "diagram kind failed");
            }
            results.insert(kind.to_string(), outcome);
        }
        results
    }

    fn build_one(&self, source: &str, language: &str, kind: &str) -> std::result::Result<DiagramDocument, String> {
        let converter = self.registry.get(language, kind).map_err(|e| e.to_string())?;
        panic::catch_unwind(AssertUnwindSafe(|| converter.document(source))).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(language, kind, %message, "converter panicked");
            format!("Conversion failed: {}", message)
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA: &str = "public class Invoice extends Document { private String id; public String getId() { return id; } }";

    #[test]
    fn test_batch_isolates_failures() {
        let results = DiagramBuilder::new().build_batch(JAVA, "java", ["class", "bogus_kind"]);
        assert_eq!(results.len(), 2);
        let class = results["class"].as_ref().unwrap();
        assert!(class.contains_line("Document <|-- Invoice"));
        let err = results["bogus_kind"].as_ref().unwrap_err();
        assert!(err.contains("java + bogus_kind"));
    }

    #[test]
    fn test_batch_matches_single_conversion() {
        let registry = Registry::standard();
        let results = DiagramBuilder::with_registry(registry).build_batch(JAVA, "java", vec!["class", "sequence"]);
        for kind in ["class", "sequence"] {
            let single = registry.get("java", kind).unwrap().convert(JAVA);
            assert_eq!(results[kind].as_ref().unwrap().text(), single);
        }
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
