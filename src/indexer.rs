use crate::chunker::{self, ChunkReader, ReadOutcome, DEFAULT_CHUNK_SIZE};
use crate::db::DbHandle;
use crate::error::{IndexError, Result};
use crate::hashing::{self, Fnv64};
use crate::path_utils;
use crate::tagger;
use crate::types::{hash_to_hex, BlobHash, FileHash};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Upper bound on one chunk (and on the read buffer).
    pub max_chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// What `index_file` recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub hash: FileHash,
    pub path: String,
    pub declared_size: u64,
    pub bytes_read: u64,
    pub chunks: usize,
    pub outcome: ReadOutcome,
}

pub struct Indexer<'a> {
    db: &'a DbHandle,
    config: IndexConfig,
}

impl<'a> Indexer<'a> {
    pub fn new(db: &'a DbHandle, config: IndexConfig) -> Self {
        Self { db, config }
    }

    /// Index one regular file whose size was observed as `declared_size`.
    ///
    /// Chunks are hashed and stored as they are read while the whole-file hash
    /// is folded in alongside. Then the file row, its tags and its ordered
    /// chunk list are written under that hash. Everything goes into one
    /// transaction; an error leaves the store as it was.
    pub fn index_file(&self, path: &Path, declared_size: u64) -> Result<IndexedFile> {
        let file = chunker::open_for_chunking(path).map_err(|e| IndexError::open(path, e))?;
        let txn = self.db.begin()?;

        let mut reader = ChunkReader::new(file, declared_size, self.config.max_chunk_size);
        let mut whole = Fnv64::new();
        let mut chunks: Vec<BlobHash> = Vec::new();

        while let Some(chunk) = reader.next_chunk().map_err(|e| IndexError::read(path, e))? {
            if chunks.len() >= u32::MAX as usize {
                return Err(IndexError::read(
                    path,
                    std::io::Error::other("too many chunks; use a larger chunk size"),
                ));
            }

            let blob_hash = hashing::fnv1a_64(chunk);
            // chunk_capacity keeps every chunk under MAX_CHUNK_CEILING
            txn.put_blob(blob_hash, chunk.len() as u32, chunk)?;
            whole.update(chunk);
            chunks.push(blob_hash);

            tracing::trace!(
                path = %path.display(),
                ordinal = chunks.len() - 1,
                len = chunk.len(),
                blob = %hash_to_hex(blob_hash),
                "chunk stored"
            );
        }

        let outcome = reader.outcome();
        match outcome {
            ReadOutcome::Complete => {}
            ReadOutcome::Truncated { read, declared } => {
                tracing::debug!(
                    path = %path.display(),
                    read,
                    declared,
                    "file shorter than its listed size"
                );
            }
            ReadOutcome::Grown { declared } => {
                tracing::warn!(
                    path = %path.display(),
                    declared,
                    "file was changed while being read; indexed the first {declared} bytes"
                );
            }
        }

        let hash = whole.value();
        let canonical = path_utils::canonical_path(path)?;

        txn.put_file(&canonical, hash, declared_size)?;
        for tag in tagger::derive_tags(&canonical) {
            txn.put_file_tag(hash, tag.key.as_str(), &tag.value)?;
        }
        for (ordinal, blob_hash) in chunks.iter().enumerate() {
            txn.put_file_blob(hash, *blob_hash, ordinal as u32)?;
        }
        txn.commit()?;

        tracing::debug!(
            path = %canonical,
            hash = %hash_to_hex(hash),
            chunks = chunks.len(),
            "indexed"
        );

        Ok(IndexedFile {
            hash,
            path: canonical,
            declared_size,
            bytes_read: reader.bytes_read(),
            chunks: chunks.len(),
            outcome,
        })
    }
}
