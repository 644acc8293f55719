//! Draftsman - Generate UML diagrams from source code
//!
//! Extracts class, sequence, use case and activity structure from C#, Java,
//! Python, PHP and JavaScript/TypeScript sources, derives package and
//! component structure from listings and manifests, and renders each as a
//! PlantUML document.
//!
//! ```no_run
//! let results = draftsman::build("class Invoice extends Document { }", "java", ["class"]);
//! println!("{}", results["class"].as_ref().unwrap());
//! ```

pub mod analysis;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod extractors;
pub mod lang;
pub mod model;
pub mod output;
pub mod parser;
pub mod registry;

// Re-export main types
pub use builder::{BatchResult, DiagramBuilder};
pub use config::Config;
pub use error::{Error, Result};
pub use lang::{DiagramKind, Language, LanguageTag};
pub use model::{DiagramDocument, DiagramModel};
pub use output::{DiagramRenderer, RenderOptions};
pub use registry::{Converter, Options, Registry};

/// Convert one source unit into each requested diagram kind
pub fn build<I, S>(source: &str, language: &str, kinds: I) -> BatchResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DiagramBuilder::new().build_batch(source, language, kinds)
}
