//! Candidate files offered by the picker or a drop

use mime::Mime;
use reqwest::Url;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use super::IntakeError;

/// A user-supplied file with the metadata shown in the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub mime: Option<Mime>,
    pub size: u64,
    pub last_modified: Option<OffsetDateTime>,
}

impl FileEntry {
    /// Stat `path` and guess its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| IntakeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        if !metadata.is_file() {
            return Err(IntakeError::NotAFile(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            name: display_name(path),
            mime: mime_guess::from_path(path).first(),
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(OffsetDateTime::from),
        })
    }

    /// An entry whose metadata is already known, as a drop event reports it.
    pub fn described(name: &str, mime: Option<&str>, size: u64) -> Self {
        Self {
            path: PathBuf::from(name),
            name: name.to_string(),
            mime: mime.and_then(|m| m.parse().ok()),
            size,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, at: OffsetDateTime) -> Self {
        self.last_modified = Some(at);
        self
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Split text dropped onto the terminal into paths.
///
/// Terminals paste dropped files either as shell-quoted paths (`'my file.csv'`,
/// `my\ file.csv`) or as `file://` URIs; several files arrive space or
/// newline separated.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for token in split_words(text) {
        if token.starts_with("file://") {
            match Url::parse(&token).ok().and_then(|url| url.to_file_path().ok()) {
                Some(path) => paths.push(path),
                None => tracing::debug!(token = %token, "Ignoring malformed file URI"),
            }
        } else {
            paths.push(PathBuf::from(token));
        }
    }

    paths
}

/// Shell-like word splitting: single and double quotes, backslash escapes.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            // Inside double quotes a backslash only escapes `$`, `` ` ``, `"`, `\` and newline.
            (Some('"'), '\\') => {
                match chars.next_if(|next| matches!(next, '$' | '`' | '"' | '\\' | '\n')) {
                    Some(next) => current.push(next),
                    None => current.push('\\'),
                }
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    in_word = true;
                }
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }

    words
}
