//! Export file destinations.
//!
//! The pipeline hands finished Markdown to a [`FileSink`]; the sink owns
//! where bytes land. `DirectorySink` writes into a directory on disk,
//! `MemorySink` captures output for tests.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use crate::domain::{ExportError, Result};

/// Destination for finished exports.
///
/// `filename` is a bare file name; sinks reject anything that looks like
/// a path so a malformed title can never escape the output directory.
pub trait FileSink {
    fn save(&self, content: &str, filename: &str) -> Result<()>;
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.is_empty() || filename.contains('/') || filename.contains('\\') {
        return Err(ExportError::config(format!(
            "invalid export filename: {filename:?}"
        )));
    }
    Ok(())
}

/// Writes exports into a directory, creating it on first use.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&self, content: &str, filename: &str) -> Result<()> {
        check_filename(filename)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| ExportError::io(format!("creating {}", self.dir.display()), e))?;
        let path = self.dir.join(filename);
        fs::write(&path, content)
            .map_err(|e| ExportError::io(format!("writing {}", path.display()), e))?;
        tracing::info!(path = %path.display(), bytes = content.len(), "export written");
        Ok(())
    }
}

/// In-memory sink recording `(filename, content)` pairs in save order.
#[derive(Default)]
pub struct MemorySink {
    saved: RefCell<Vec<(String, String)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn saved(&self) -> Vec<(String, String)> {
        self.saved.borrow().clone()
    }
}

impl FileSink for MemorySink {
    fn save(&self, content: &str, filename: &str) -> Result<()> {
        check_filename(filename)?;
        self.saved
            .borrow_mut()
            .push((filename.to_string(), content.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_sink_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("exports").join("nested");
        let sink = DirectorySink::new(dir.clone());
        sink.save("# hello\n", "test.md").unwrap();
        assert_eq!(fs::read_to_string(dir.join("test.md")).unwrap(), "# hello\n");
    }

    #[test]
    fn path_separators_in_filename_are_rejected() {
        let sink = MemorySink::new();
        assert!(sink.save("x", "../escape.md").is_err());
        assert!(sink.save("x", "a\\b.md").is_err());
        assert!(sink.save("x", "").is_err());
        assert!(sink.saved().is_empty());
    }

    #[test]
    fn memory_sink_preserves_save_order() {
        let sink = MemorySink::new();
        sink.save("one", "a.md").unwrap();
        sink.save("two", "b.md").unwrap();
        let saved = sink.saved();
        assert_eq!(saved[0].0, "a.md");
        assert_eq!(saved[1].1, "two");
    }
}
