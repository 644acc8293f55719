//! CLI module for Draftsman

mod args;
mod scan;

pub use args::{Args, Command};

use crate::builder::DiagramBuilder;
use crate::config::{Config, OutputFormat, DEFAULT_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::lang::Language;
use crate::registry::Registry;
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Convert {
            files,
            language,
            kinds,
            output,
            format,
            config,
            verbose,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            // Unknown kinds from the command line fail per kind, not up front
            cfg.merge_cli(language, kinds, output, format, Vec::new(), verbose);
            init_logging(&cfg.logging.level);

            let registry = Registry::new().with_options(cfg.options());
            let inputs = files
                .iter()
                .map(|path| Input::read(path, cfg.engine.language.as_deref()))
                .collect::<Result<Vec<_>>>()?;
            info!(files = inputs.len(), kinds = ?cfg.engine.kinds, "converting");

            let rendered: Vec<Rendered> = inputs
                .par_iter()
                .flat_map_iter(|input| render_input(&registry, input, &cfg.engine.kinds, cfg.output.format))
                .collect();
            emit(&rendered, cfg.output.directory.as_deref(), cfg.output.format)
        }

        Command::Scan {
            path,
            kind,
            exclude,
            imports,
            listing,
            config,
            verbose,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(None, Vec::new(), None, None, exclude, verbose);
            init_logging(&cfg.logging.level);

            let filter = scan::FileFilter::new(&cfg.analysis)?;
            let files = scan::discover(&path, &filter)?;
            info!(path = %path.display(), files = files.len(), "scanned directory");
            let text = if imports {
                scan::bundle(&files)
            } else {
                scan::listing(&files)
            };

            if listing {
                println!("{}", text);
                return Ok(());
            }

            let registry = Registry::new().with_options(cfg.options());
            let converter = registry.get("any", &kind)?;
            println!("{}", converter.convert(&text));
            Ok(())
        }

        Command::Model { file, language, kind } => {
            let cfg = load_config(None)?;
            init_logging(&cfg.logging.level);

            let language = language.or(cfg.engine.language.clone());
            let input = Input::read(&file, language.as_deref())?;
            let registry = Registry::new().with_options(cfg.options());
            let model = registry.get(&input.language, &kind)?.extract(&input.text);
            println!("{}", serde_json::to_string_pretty(&model)?);
            Ok(())
        }

        Command::Combinations => {
            for name in Registry::combination_names() {
                println!("{}", name);
            }
            Ok(())
        }

        Command::Version => {
            println!("draftsman {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Explicit config must load; the default file is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when run from tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// One source file (or stdin) with its resolved language name
struct Input {
    stem: String,
    language: String,
    text: String,
}

impl Input {
    fn read(path: &Path, language: Option<&str>) -> Result<Self> {
        let stdin = path == Path::new("-");
        let text = if stdin {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        } else {
            if !path.exists() {
                return Err(Error::PathNotFound(path.to_path_buf()));
            }
            std::fs::read_to_string(path)?
        };

        let language = match language {
            Some(name) => name.to_string(),
            None => Language::from_path(path)
                .map(|lang| lang.as_str().to_string())
                .ok_or_else(|| {
                    Error::other(format!(
                        "Cannot infer language of {}; pass --language",
                        path.display()
                    ))
                })?,
        };

        let stem = if stdin {
            "stdin".to_string()
        } else {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "diagram".to_string())
        };
        Ok(Self { stem, language, text })
    }
}

/// One file x kind outcome
struct Rendered {
    stem: String,
    kind: String,
    content: std::result::Result<String, String>,
}

fn render_input(registry: &Registry, input: &Input, kinds: &[String], format: OutputFormat) -> Vec<Rendered> {
    debug!(file = %input.stem, language = %input.language, "rendering");
    match format {
        OutputFormat::PlantUml => DiagramBuilder::with_registry(registry)
            .build_batch(&input.text, &input.language, kinds)
            .into_iter()
            .map(|(kind, result)| Rendered {
                stem: input.stem.clone(),
                kind,
                content: result.map(|doc| doc.text()),
            })
            .collect(),
        OutputFormat::Json => kinds
            .iter()
            .map(|kind| {
                let content = registry
                    .get(&input.language, kind)
                    .map_err(|e| e.to_string())
                    .and_then(|converter| {
                        serde_json::to_string_pretty(&converter.extract(&input.text)).map_err(|e| e.to_string())
                    });
                Rendered {
                    stem: input.stem.clone(),
                    kind: kind.clone(),
                    content,
                }
            })
            .collect(),
    }
}

/// Write documents to the output directory or stdout; failed kinds are reported
fn emit(rendered: &[Rendered], directory: Option<&Path>, format: OutputFormat) -> Result<()> {
    if let Some(dir) = directory {
        std::fs::create_dir_all(dir)?;
    }

    let mut failures = 0;
    for item in rendered {
        match (&item.content, directory) {
            (Ok(content), Some(dir)) => {
                let path: PathBuf = dir.join(format!("{}.{}.{}", item.stem, item.kind, format.extension()));
                std::fs::write(&path, format!("{}\n", content))?;
                info!(path = %path.display(), "wrote diagram");
            }
            (Ok(content), None) => println!("{}", content),
            (Err(message), _) => {
                eprintln!("{} [{}]: {}", item.stem, item.kind, message);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(Error::other(format!("{} conversion(s) failed", failures)));
    }
    Ok(())
}
