use crate::analysis::AnalysisOptions;
use crate::error::{Error, Result};
use crate::lang::{DiagramKind, LanguageTag};
use crate::output::RenderOptions;
use crate::registry::Options;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "draftsman.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub render: RenderOptions,
    pub packages: AnalysisOptions,
    pub analysis: ScanConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Conversion defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Used when no language is given and none can be inferred
    pub language: Option<String>,
    pub kinds: Vec<String>,
}

/// Directory scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Print to stdout when unset
    pub directory: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    PlantUml,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "plantuml" | "puml" | "uml" => Some(OutputFormat::PlantUml),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    /// File extension for written documents
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::PlantUml => "puml",
            OutputFormat::Json => "json",
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: None,
            kinds: vec!["class".to_string()],
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*".to_string()],
            exclude: vec![
                ".git/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/.venv/**".to_string(),
                "**/vendor/**".to_string(),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            directory: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        language: Option<String>,
        kinds: Vec<String>,
        output: Option<PathBuf>,
        format: Option<String>,
        exclude: Vec<String>,
        verbose: bool,
    ) {
        if language.is_some() {
            self.engine.language = language;
        }

        if !kinds.is_empty() {
            self.engine.kinds = kinds;
        }

        if let Some(out) = output {
            self.output.directory = Some(out);
        }

        if let Some(fmt) = format.as_deref().and_then(OutputFormat::from_name) {
            self.output.format = fmt;
        }

        if !exclude.is_empty() {
            self.analysis.exclude.extend(exclude);
        }

        if verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Engine options derived from the render and package sections
    pub fn options(&self) -> Options {
        Options {
            render: self.render,
            analysis: self.packages.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.kinds.is_empty() {
            return Err(Error::config_validation("at least one diagram kind required"));
        }

        if let Some(kind) = self.engine.kinds.iter().find(|k| DiagramKind::from_name(k).is_none()) {
            return Err(Error::config_validation(format!("unknown diagram kind: {}", kind)));
        }

        if let Some(language) = &self.engine.language {
            if LanguageTag::from_name(language).is_none() {
                return Err(Error::config_validation(format!("unknown language: {}", language)));
            }
        }

        if self.packages.caps.json == 0 || self.packages.caps.lines == 0 {
            return Err(Error::config_validation("manifest caps must be at least 1"));
        }

        if self.analysis.include.is_empty() {
            return Err(Error::config_validation("at least one include pattern required"));
        }

        for pattern in self.analysis.include.iter().chain(&self.analysis.exclude) {
            glob::Pattern::new(pattern)?;
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_validation(format!(
                "unknown log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}
