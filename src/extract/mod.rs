// Shared extraction primitives
//
// Every language-specific extractor is built from these pieces plus the
// per-language tables in `syntax`.

pub mod block;
pub mod members;
pub mod naming;
pub mod normalize;
pub mod params;
pub mod scanner;
pub mod statements;
pub mod syntax;

pub use block::{block_after, extract_balanced, find_balanced_end};
pub use normalize::{normalize, NormalizeOptions, ACTIVITY_MARKERS, USE_CASE_MARKERS};
pub use scanner::{scan_functions, scan_types, ScannedMethod, ScannedType};
pub use statements::{parse_statements, Statement};
pub use syntax::{syntax_for, Syntax};
