// Structural extractors, one per diagram kind over any supported language

pub mod activity;
pub mod class;
pub mod sequence;
pub mod source;
pub mod usecase;

pub use source::{Callable, Source, TypeUnit};
