use crate::dbpath::{self, DbDirState, DB_FILE, LOCK_FILE, META_FILE};
use crate::error::Result as IndexResult;
use crate::path_filter::PathFilter;
use crate::schema;
use crate::types::{BlobHash, FileHash};
use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use redb::{Database, ReadableTable, ReadableTableMetadata, WriteTransaction};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct DbHandle {
    pub db_dir: PathBuf,
    pub db: Database,
    // Keep the lock file open for the lifetime of DbHandle, so the lock is held.
    _lock_file: File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub path: String,
    pub hash: FileHash,
    pub size: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableCounts {
    pub files: u64,
    pub blobs: u64,
    pub blob_bytes: u64,
    pub file_blobs: u64,
    pub file_tags: u64,
}

/// Open an fsindex database directory:
/// - validates directory
/// - initializes if empty (meta + index.redb)
/// - acquires exclusive lock
/// - opens redb database and creates missing tables
pub fn open(db_dir: &Path) -> Result<DbHandle> {
    let state = dbpath::ensure_db_dir_is_valid_or_empty(db_dir)?;

    // Acquire lock first (prevents two processes initializing concurrently).
    let lock_file = open_and_lock(db_dir)?;

    if state == DbDirState::Empty {
        init_db_dir(db_dir)
            .with_context(|| format!("Failed to initialize DB in {}", db_dir.display()))?;
    }

    let db_file_path = db_dir.join(DB_FILE);
    let meta_path = db_dir.join(META_FILE);
    if !db_file_path.is_file() || !meta_path.is_file() {
        return Err(anyhow!(
            "Database directory is missing expected files ({} and {})",
            META_FILE,
            DB_FILE
        ));
    }

    let db = Database::create(&db_file_path)
        .with_context(|| format!("Failed to open redb file {}", db_file_path.display()))?;

    let handle = DbHandle {
        db_dir: db_dir.to_path_buf(),
        db,
        _lock_file: lock_file,
    };

    handle.ensure_schema()?;

    Ok(handle)
}

impl DbHandle {
    /// Create any missing table. Safe to run against an initialized store.
    pub fn ensure_schema(&self) -> Result<()> {
        let tx = self.db.begin_write().context("begin_write() failed")?;
        {
            let _ = tx.open_table(schema::FILES)?;
            let _ = tx.open_table(schema::BLOBS)?;
            let _ = tx.open_table(schema::FILE_BLOBS)?;
            let _ = tx.open_table(schema::FILE_TAGS)?;
            let _ = tx.open_table(schema::TAG_FILES)?;
        }
        tx.commit().context("commit() failed")?;
        Ok(())
    }

    /// Start a write transaction. Dropping it without `commit` discards its writes.
    pub fn begin(&self) -> IndexResult<StoreTxn> {
        Ok(StoreTxn {
            tx: self.db.begin_write()?,
        })
    }

    pub fn list_files(&self, filter: &PathFilter) -> IndexResult<Vec<FileRow>> {
        let tx = self.db.begin_read()?;
        let files = tx.open_table(schema::FILES)?;

        let mut out = Vec::new();
        for item in files.iter()? {
            let (k, _) = item?;
            let (path, hash, size) = k.value();
            if filter.matches(path) {
                out.push(FileRow {
                    path: path.to_string(),
                    hash,
                    size,
                });
            }
        }
        Ok(out)
    }

    /// Every path ever recorded with this content hash.
    pub fn paths_for_hash(&self, hash: FileHash) -> IndexResult<Vec<String>> {
        let tx = self.db.begin_read()?;
        let files = tx.open_table(schema::FILES)?;

        let mut out = Vec::new();
        for item in files.iter()? {
            let (k, _) = item?;
            let (path, h, _) = k.value();
            if h == hash {
                out.push(path.to_string());
            }
        }
        Ok(out)
    }

    pub fn file_tags(&self, hash: FileHash) -> IndexResult<Vec<(String, String)>> {
        let tx = self.db.begin_read()?;
        let tags = tx.open_table(schema::FILE_TAGS)?;

        let mut out = Vec::new();
        for item in tags.range((hash, "", "")..)? {
            let (k, _) = item?;
            let (h, key, val) = k.value();
            if h != hash {
                break;
            }
            out.push((key.to_string(), val.to_string()));
        }
        Ok(out)
    }

    pub fn find_by_tag(&self, key: &str, val: &str) -> IndexResult<Vec<FileHash>> {
        let tx = self.db.begin_read()?;
        let idx = tx.open_table(schema::TAG_FILES)?;

        let mut out = Vec::new();
        for item in idx.range((key, val, 0u64)..)? {
            let (k, _) = item?;
            let (k_key, k_val, hash) = k.value();
            if k_key != key || k_val != val {
                break;
            }
            out.push(hash);
        }
        Ok(out)
    }

    /// `(ordinal, blob_hash)` pairs of a file, ascending by ordinal.
    pub fn file_chunks(&self, hash: FileHash) -> IndexResult<Vec<(u32, BlobHash)>> {
        let tx = self.db.begin_read()?;
        let fb = tx.open_table(schema::FILE_BLOBS)?;

        let mut out = Vec::new();
        for item in fb.range((hash, 0u32, 0u64)..)? {
            let (k, _) = item?;
            let (h, ordinal, blob) = k.value();
            if h != hash {
                break;
            }
            out.push((ordinal, blob));
        }
        Ok(out)
    }

    /// All stored variants of a blob hash, as `(size, bytes)`. More than one
    /// entry means two different chunks collided on the hash.
    pub fn blobs_by_hash(&self, hash: BlobHash) -> IndexResult<Vec<(u32, Vec<u8>)>> {
        let tx = self.db.begin_read()?;
        let blobs = tx.open_table(schema::BLOBS)?;

        let mut out = Vec::new();
        for item in blobs.range((hash, 0u32)..)? {
            let (k, v) = item?;
            let (h, size) = k.value();
            if h != hash {
                break;
            }
            out.push((size, v.value().to_vec()));
        }
        Ok(out)
    }

    pub fn table_counts(&self) -> IndexResult<TableCounts> {
        let tx = self.db.begin_read()?;
        let files = tx.open_table(schema::FILES)?;
        let blobs = tx.open_table(schema::BLOBS)?;
        let file_blobs = tx.open_table(schema::FILE_BLOBS)?;
        let file_tags = tx.open_table(schema::FILE_TAGS)?;

        let mut blob_bytes = 0u64;
        for item in blobs.iter()? {
            let (k, _) = item?;
            blob_bytes += u64::from(k.value().1);
        }

        Ok(TableCounts {
            files: files.len()?,
            blobs: blobs.len()?,
            blob_bytes,
            file_blobs: file_blobs.len()?,
            file_tags: file_tags.len()?,
        })
    }
}

/// One write transaction against the four tables.
///
/// Every `put_*` is insert-or-ignore: an existing row with the same key is
/// left untouched and the call still succeeds. Callers cannot tell a fresh
/// insert from a duplicate, and do not need to.
pub struct StoreTxn {
    tx: WriteTransaction,
}

impl StoreTxn {
    pub fn put_blob(&self, hash: BlobHash, size: u32, bytes: &[u8]) -> IndexResult<()> {
        let mut blobs = self.tx.open_table(schema::BLOBS)?;
        let exists = blobs.get((hash, size))?.is_some();
        if !exists {
            blobs.insert((hash, size), bytes)?;
        }
        Ok(())
    }

    pub fn put_file(&self, path: &str, hash: FileHash, size: u64) -> IndexResult<()> {
        let mut files = self.tx.open_table(schema::FILES)?;
        let exists = files.get((path, hash, size))?.is_some();
        if !exists {
            files.insert((path, hash, size), ())?;
        }
        Ok(())
    }

    pub fn put_file_blob(&self, file_hash: FileHash, blob_hash: BlobHash, ordinal: u32) -> IndexResult<()> {
        let mut fb = self.tx.open_table(schema::FILE_BLOBS)?;
        let exists = fb.get((file_hash, ordinal, blob_hash))?.is_some();
        if !exists {
            fb.insert((file_hash, ordinal, blob_hash), ())?;
        }
        Ok(())
    }

    /// Also maintains the tag -> file reverse index.
    pub fn put_file_tag(&self, file_hash: FileHash, key: &str, val: &str) -> IndexResult<()> {
        let mut tags = self.tx.open_table(schema::FILE_TAGS)?;
        let exists = tags.get((file_hash, key, val))?.is_some();
        if !exists {
            tags.insert((file_hash, key, val), ())?;
        }

        let mut idx = self.tx.open_table(schema::TAG_FILES)?;
        let exists = idx.get((key, val, file_hash))?.is_some();
        if !exists {
            idx.insert((key, val, file_hash), ())?;
        }
        Ok(())
    }

    pub fn commit(self) -> IndexResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn open_and_lock(db_dir: &Path) -> Result<File> {
    let lock_path = db_dir.join(LOCK_FILE);
    let f = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    // Exclusive lock: one writer process at a time.
    f.try_lock_exclusive()
        .with_context(|| format!("Database is locked (in use?): {}", db_dir.display()))?;

    Ok(f)
}

fn init_db_dir(db_dir: &Path) -> Result<()> {
    let meta_path = db_dir.join(META_FILE);
    if !meta_path.exists() {
        write_meta(&meta_path)?;
    }

    let db_file_path = db_dir.join(DB_FILE);
    let _ = Database::create(&db_file_path)
        .with_context(|| format!("Failed to initialize redb at {}", db_file_path.display()))?;

    Ok(())
}

fn write_meta(meta_path: &Path) -> Result<()> {
    let mut f = File::create(meta_path)
        .with_context(|| format!("Failed to create {}", meta_path.display()))?;

    let contents = format!(
        r#"# fsindex database metadata
format = 1
app = "fsindex"
db_kind = "redb"
hash = "fnv1a-64"
created = "{}"
"#,
        chrono::Utc::now().to_rfc3339()
    );

    f.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", meta_path.display()))?;

    f.sync_all()
        .with_context(|| format!("Failed to sync {}", meta_path.display()))?;

    Ok(())
}
