use std::fmt;
use time::macros::format_description;

use super::FileEntry;

const NOT_AVAILABLE: &str = "n/a";

/// Human-readable listing of accepted files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    lines: Vec<String>,
}

impl Manifest {
    pub fn render<'a>(entries: impl IntoIterator<Item = &'a FileEntry>) -> Self {
        Self {
            lines: entries.into_iter().map(render_line).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

fn render_line(entry: &FileEntry) -> String {
    let mime = entry
        .mime
        .as_ref()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let modified = entry
        .last_modified
        .and_then(|at| at.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "{} ({}) - {} bytes, last modified: {}",
        entry.name, mime, entry.size, modified
    )
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_render_full_entry() {
        let entry = FileEntry::described("a.csv", Some("text/csv"), 120)
            .with_last_modified(datetime!(2018-10-04 12:30 UTC));

        let manifest = Manifest::render([&entry]);

        assert_eq!(
            manifest.lines(),
            ["a.csv (text/csv) - 120 bytes, last modified: 2018-10-04"]
        );
    }

    #[test]
    fn test_missing_metadata_renders_na() {
        let entry = FileEntry::described("notes", None, 0);
        let manifest = Manifest::render([&entry]);

        assert_eq!(
            manifest.to_string(),
            "notes (n/a) - 0 bytes, last modified: n/a\n"
        );
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::render(std::iter::empty());
        assert!(manifest.is_empty());
        assert_eq!(manifest.to_string(), "");
    }
}
