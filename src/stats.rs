use crate::chunker::ReadOutcome;
use crate::db::TableCounts;
use crate::indexer::IndexedFile;
use crate::util::format_size;
use std::path::Path;

/// Tally of one `index` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub indexed: u64,
    pub failed: u64,
    pub grown: u64,
    pub truncated: u64,
    pub skipped: u64,
    pub walk_errors: u64,
    pub chunks: u64,
    pub bytes: u64,
}

impl IndexStats {
    pub fn record(&mut self, f: &IndexedFile) {
        self.indexed += 1;
        self.chunks += f.chunks as u64;
        self.bytes = self.bytes.saturating_add(f.bytes_read);
        match f.outcome {
            ReadOutcome::Complete => {}
            ReadOutcome::Truncated { .. } => self.truncated += 1,
            ReadOutcome::Grown { .. } => self.grown += 1,
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            indexed = self.indexed,
            failed = self.failed,
            changed_during_read = self.grown,
            truncated = self.truncated,
            skipped = self.skipped,
            walk_errors = self.walk_errors,
            chunks = self.chunks,
            bytes = %format_size(self.bytes),
            "index finished"
        );
    }
}

pub fn print_counts(db_dir: &Path, c: &TableCounts) {
    println!("DB directory:   {}", db_dir.display());
    println!("files:          {}", c.files);
    println!("blobs:          {} ({})", c.blobs, format_size(c.blob_bytes));
    println!("file_blobs:     {}", c.file_blobs);
    println!("file_tags:      {}", c.file_tags);
}
