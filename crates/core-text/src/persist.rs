//! Persistence provider used by `load_file` / `save_file`.
//!
//! The document reads and writes whole files as text. Encoding detection and
//! dialogs belong to the caller; a provider only moves strings to and from a
//! path.

use std::fs;
use std::io;
use std::path::Path;

pub trait Persistence: Send + Sync {
    fn read_all_text(&self, path: &Path) -> io::Result<String>;
    fn write_all_text(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// UTF-8 files on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsPersistence;

impl Persistence for FsPersistence {
    fn read_all_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_all_text(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        FsPersistence.write_all_text(&path, "alpha\r\nbeta").unwrap();
        assert_eq!(FsPersistence.read_all_text(&path).unwrap(), "alpha\r\nbeta");
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsPersistence
            .read_all_text(&dir.path().join("absent.txt"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
