//! Directory discovery for package and component diagrams

use crate::analysis::listing::FILE_MARKER;
use crate::config::ScanConfig;
use crate::error::{Error, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Include/exclude globs matched against `/`-separated relative paths
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Pattern>> {
            patterns.iter().map(|p| Pattern::new(p).map_err(Error::from)).collect()
        };
        Ok(Self {
            include: compile(&config.include)?,
            exclude: compile(&config.exclude)?,
        })
    }

    pub fn accepts(&self, relative: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(relative));
        included && !self.exclude.iter().any(|p| p.matches(relative) || matches_prefix(p, relative))
    }
}

/// `dir/**` style patterns also exclude the directory itself
fn matches_prefix(pattern: &Pattern, relative: &str) -> bool {
    let text = pattern.as_str();
    text.strip_suffix("/**")
        .is_some_and(|dir| !dir.contains('*') && relative.starts_with(&format!("{}/", dir)))
}

fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Files under `root` accepted by the filter, sorted by relative path
pub fn discover(root: &Path, filter: &FileFilter) -> Result<Vec<(String, PathBuf)>> {
    if !root.exists() {
        return Err(Error::PathNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_path(entry.path(), root);
        if filter.accepts(&relative) {
            files.push((relative, entry.path().to_path_buf()));
        } else {
            debug!(path = %relative, "excluded");
        }
    }

    files.sort();
    Ok(files)
}

/// One relative path per line
pub fn listing(files: &[(String, PathBuf)]) -> String {
    files
        .iter()
        .map(|(relative, _)| relative.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-file bundle of readable files; binary files are skipped
pub fn bundle(files: &[(String, PathBuf)]) -> String {
    let mut text = String::new();
    for (relative, path) in files {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                text.push_str(FILE_MARKER);
                text.push('\n');
                text.push_str(relative);
                text.push('\n');
                text.push_str(&content);
                if !content.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(e) => debug!(path = %relative, error = %e, "skipped unreadable file"),
        }
    }
    text
}
