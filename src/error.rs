use std::path::PathBuf;
use thiserror::Error;

/// Draftsman error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error(
        "Unsupported combination: {language} + {diagram_kind}. Available combinations: {}",
        .valid_combinations.join(", ")
    )]
    UnsupportedCombination {
        language: String,
        diagram_kind: String,
        valid_combinations: Vec<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Draftsman operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create an unsupported-combination error
    pub fn unsupported(
        language: impl Into<String>,
        diagram_kind: impl Into<String>,
        valid_combinations: Vec<String>,
    ) -> Self {
        Error::UnsupportedCombination {
            language: language.into(),
            diagram_kind: diagram_kind.into(),
            valid_combinations,
        }
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = Error::PathNotFound(PathBuf::from("/some/path"));
        assert_eq!(err.to_string(), "Path not found: /some/path");
    }

    #[test]
    fn test_unsupported_combination_display() {
        let err = Error::unsupported(
            "python",
            "bogus_kind",
            vec!["python+class".to_string(), "python+sequence".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("python + bogus_kind"));
        assert!(msg.contains("python+class, python+sequence"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("kinds must not be empty");
        assert_eq!(err.to_string(), "Config validation error: kinds must not be empty");
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_parser_error() {
        let err = Error::parser("unexpected token");
        assert_eq!(err.to_string(), "Parser error: unexpected token");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
