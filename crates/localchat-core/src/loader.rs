//! Turns a directory of text-like files into paragraph-level [`DocumentUnit`]s.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::DocumentUnit;

/// A newline, any whitespace run (including further newlines), then a newline.
#[allow(clippy::expect_used)]
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern"));

pub const DEFAULT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl Default for DocumentLoader {
    fn default() -> Self { Self::new(DEFAULT_EXTENSIONS.iter().copied()) }
}

impl DocumentLoader {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { extensions }
    }

    /// Scan `data_dir` recursively and split every eligible file into units.
    ///
    /// A missing directory yields no units. Unreadable files are skipped.
    pub fn scan(&self, data_dir: &Path) -> Vec<DocumentUnit> {
        if !data_dir.exists() {
            debug!(dir = %data_dir.display(), "document directory does not exist");
            return Vec::new();
        }
        let files = self.list_files(data_dir);
        let units = self.scan_files(&files);
        info!(files = files.len(), units = units.len(), dir = %data_dir.display(), "scanned document directory");
        units
    }

    /// Split each of `files` in order; any that cannot be read are skipped.
    pub fn scan_files(&self, files: &[PathBuf]) -> Vec<DocumentUnit> {
        let mut units = Vec::new();
        for file_path in files {
            let content = match read_lossy(file_path) {
                Ok(content) => content,
                Err(e) => { debug!(error = %e, "skipping unreadable document"); continue; }
            };
            let Some(name) = file_path.file_name().map(|n| n.to_string_lossy().into_owned()) else { continue };
            units.extend(split_paragraphs(&name, &content));
        }
        units
    }

    fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        // Symlinked files count; loops and dangling links surface as errors and are dropped.
        walkdir::WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_eligible(e.path()))
            .map(|e| e.into_path())
            .collect()
    }
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split `content` on blank-line separators. Ordinals count every split
/// segment, so a discarded blank segment still consumes its number.
pub fn split_paragraphs(file_name: &str, content: &str) -> Vec<DocumentUnit> {
    PARAGRAPH_BREAK
        .split(content)
        .enumerate()
        .filter_map(|(i, part)| {
            let clean = part.trim();
            (!clean.is_empty()).then(|| DocumentUnit::new(format!("{}#p{}", file_name, i + 1), clean))
        })
        .collect()
}
