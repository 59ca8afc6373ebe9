use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const DB_FILE: &str = "index.redb";
pub const META_FILE: &str = "meta.toml";
pub const LOCK_FILE: &str = "LOCK";

fn is_name_only(s: &str) -> bool {
    !s.contains('/') && !s.contains('\\')
}

pub fn default_db_base_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("org", "fsindex", "fsindex")
        .ok_or_else(|| anyhow!("Unable to determine platform data directory"))?;
    Ok(proj.data_dir().to_path_buf())
}

/// A bare name lives under the platform data directory; anything with a
/// separator is taken as a path.
pub fn resolve_db_dir(db: &str) -> Result<PathBuf> {
    if is_name_only(db) {
        Ok(default_db_base_dir()?.join(db))
    } else {
        Ok(PathBuf::from(db))
    }
}

/// Ensure the DB directory exists and has the expected files.
/// A missing or empty directory is a new DB; a non-empty directory without
/// our files is refused.
pub fn ensure_db_dir_is_valid_or_empty(db_dir: &Path) -> Result<DbDirState> {
    if db_dir.exists() {
        if !db_dir.is_dir() {
            return Err(anyhow!("DB path exists but is not a directory"));
        }

        let mut entries = fs::read_dir(db_dir)
            .with_context(|| format!("Failed to read directory {}", db_dir.display()))?;

        if entries.next().is_none() {
            return Ok(DbDirState::Empty);
        }

        if db_dir.join(DB_FILE).is_file() && db_dir.join(META_FILE).is_file() {
            Ok(DbDirState::LooksValid)
        } else {
            Err(anyhow!(
                "Directory exists but does not look like an fsindex database (expected {} and {})",
                META_FILE,
                DB_FILE
            ))
        }
    } else {
        fs::create_dir_all(db_dir)
            .with_context(|| format!("Failed to create {}", db_dir.display()))?;
        Ok(DbDirState::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDirState {
    /// Directory exists but is empty, or it was created just now.
    Empty,
    /// Directory contains meta.toml + index.redb.
    LooksValid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_like_values_are_kept() {
        assert_eq!(resolve_db_dir("./db").unwrap(), PathBuf::from("./db"));
        assert_eq!(resolve_db_dir("/var/x").unwrap(), PathBuf::from("/var/x"));
    }

    #[test]
    fn test_missing_dir_is_created() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("new");
        assert_eq!(ensure_db_dir_is_valid_or_empty(&dir).unwrap(), DbDirState::Empty);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_foreign_dir_is_refused() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), b"hi").unwrap();
        assert!(ensure_db_dir_is_valid_or_empty(tmp.path()).is_err());
    }

    #[test]
    fn test_file_is_refused() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("f");
        fs::write(&f, b"").unwrap();
        assert!(ensure_db_dir_is_valid_or_empty(&f).is_err());
    }
}
