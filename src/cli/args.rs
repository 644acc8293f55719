//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate PlantUML diagrams from source code
#[derive(Parser, Debug)]
#[command(name = "draftsman")]
#[command(about = "Generate PlantUML diagrams from source code")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert source files into diagrams
    Convert {
        /// Source files (`-` reads stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Source language (inferred from the extension when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Diagram kinds (can be repeated)
        #[arg(short, long = "kind")]
        kinds: Vec<String>,

        /// Output directory (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (plantuml, json)
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Walk a directory and draw its package or component structure
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Diagram kind (package, component)
        #[arg(short, long, default_value = "package")]
        kind: String,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Read file contents and follow imports
        #[arg(long)]
        imports: bool,

        /// Print the generated listing instead of the diagram
        #[arg(long)]
        listing: bool,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the extracted model as JSON
    Model {
        /// Source file (`-` reads stdin)
        file: PathBuf,

        /// Source language (inferred from the extension when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Diagram kind
        #[arg(short, long, default_value = "class")]
        kind: String,
    },

    /// List supported language and diagram kind pairs
    Combinations,

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_defaults() {
        let args = Args::try_parse_from(["draftsman", "convert", "Order.java"]).unwrap();
        match args.command {
            Command::Convert { files, language, kinds, output, format, config, verbose } => {
                assert_eq!(files, vec![PathBuf::from("Order.java")]);
                assert!(language.is_none());
                assert!(kinds.is_empty());
                assert!(output.is_none());
                assert!(format.is_none());
                assert!(config.is_none());
                assert!(!verbose);
            }
            _ => panic!("Expected Convert command"),
        }
    }

    #[test]
    fn test_convert_with_options() {
        let args = Args::try_parse_from([
            "draftsman", "convert", "a.py", "b.py",
            "--language", "python",
            "-k", "class",
            "-k", "sequence",
            "--output", "/tmp/diagrams",
            "--format", "json",
            "--config", "custom.toml",
            "--verbose",
        ])
        .unwrap();

        match args.command {
            Command::Convert { files, language, kinds, output, format, config, verbose } => {
                assert_eq!(files.len(), 2);
                assert_eq!(language.as_deref(), Some("python"));
                assert_eq!(kinds, vec!["class".to_string(), "sequence".to_string()]);
                assert_eq!(output, Some(PathBuf::from("/tmp/diagrams")));
                assert_eq!(format.as_deref(), Some("json"));
                assert_eq!(config, Some(PathBuf::from("custom.toml")));
                assert!(verbose);
            }
            _ => panic!("Expected Convert command"),
        }
    }

    #[test]
    fn test_convert_requires_files() {
        assert!(Args::try_parse_from(["draftsman", "convert"]).is_err());
    }

    #[test]
    fn test_scan_defaults() {
        let args = Args::try_parse_from(["draftsman", "scan", "./src"]).unwrap();
        match args.command {
            Command::Scan { path, kind, exclude, imports, listing, .. } => {
                assert_eq!(path, PathBuf::from("./src"));
                assert_eq!(kind, "package");
                assert!(exclude.is_empty());
                assert!(!imports);
                assert!(!listing);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_model_command() {
        let args = Args::try_parse_from(["draftsman", "model", "Cart.cs", "-k", "sequence"]).unwrap();
        match args.command {
            Command::Model { file, language, kind } => {
                assert_eq!(file, PathBuf::from("Cart.cs"));
                assert!(language.is_none());
                assert_eq!(kind, "sequence");
            }
            _ => panic!("Expected Model command"),
        }
    }

    #[test]
    fn test_simple_commands() {
        let args = Args::try_parse_from(["draftsman", "version"]).unwrap();
        assert!(matches!(args.command, Command::Version));
        let args = Args::try_parse_from(["draftsman", "combinations"]).unwrap();
        assert!(matches!(args.command, Command::Combinations));
    }
}
