use crate::db::DbHandle;
use crate::indexer::{IndexConfig, Indexer};
use crate::stats::IndexStats;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Walk `roots` and index every regular file, one at a time.
///
/// Symlinks are never followed or indexed. A file that fails is logged and
/// counted; the walk carries on.
pub fn run_index(db: &DbHandle, roots: &[PathBuf], config: IndexConfig) -> Result<IndexStats> {
    let indexer = Indexer::new(db, config);
    let mut stats = IndexStats::default();

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template("{spinner} {pos} files indexed {wide_msg}")?);

    for root in roots {
        let walker = walkdir::WalkDir::new(root).follow_links(false);

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "walk error");
                    stats.walk_errors += 1;
                    continue;
                }
            };

            let ft = entry.file_type();
            if ft.is_symlink() {
                tracing::debug!(path = %entry.path().display(), "skipping symlink");
                stats.skipped += 1;
                continue;
            }
            if ft.is_dir() {
                continue;
            }
            if !ft.is_file() {
                tracing::debug!(path = %entry.path().display(), "skipping special file");
                stats.skipped += 1;
                continue;
            }

            let size = match entry.metadata() {
                Ok(md) => md.len(),
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "stat failed; skipping");
                    stats.failed += 1;
                    continue;
                }
            };

            progress.set_message(entry.path().display().to_string());

            match indexer.index_file(entry.path(), size) {
                Ok(r) => {
                    stats.record(&r);
                    progress.inc(1);
                    if stats.indexed % 10_000 == 0 {
                        tracing::info!(indexed = stats.indexed, "index progress");
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping file");
                    stats.failed += 1;
                }
            }
        }
    }

    progress.finish_and_clear();
    stats.log_summary();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_indexes_tree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("x.txt"), b"AA").unwrap();
        fs::write(root.join("y.txt"), b"AA").unwrap();
        fs::write(root.join("nested/deeper/z.rs"), b"fn main() {}").unwrap();
        fs::write(root.join("nested/empty"), b"").unwrap();

        let dbh = db::open(&tmp.path().join("db")).unwrap();
        let stats = run_index(&dbh, &[root], IndexConfig::default()).unwrap();

        assert_eq!(stats.indexed, 4);
        assert_eq!(stats.failed, 0);

        let c = dbh.table_counts().unwrap();
        assert_eq!(c.files, 4);
        // "AA" twice, z.rs once; the empty file has no chunks
        assert_eq!(c.blobs, 2);
        assert_eq!(dbh.find_by_tag("dir", "nested").unwrap().len(), 2);
        assert_eq!(dbh.find_by_tag("ext", "txt").unwrap().len(), 1);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a"), vec![1u8; 5000]).unwrap();
        fs::write(root.join("b"), b"bee").unwrap();

        let dbh = db::open(&tmp.path().join("db")).unwrap();
        let cfg = IndexConfig {
            max_chunk_size: 1024,
        };
        run_index(&dbh, &[root.clone()], cfg.clone()).unwrap();
        let first = dbh.table_counts().unwrap();
        run_index(&dbh, &[root], cfg).unwrap();

        assert_eq!(dbh.table_counts().unwrap(), first);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("real"), b"data").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

        let dbh = db::open(&tmp.path().join("db")).unwrap();
        let stats = run_index(&dbh, &[root], IndexConfig::default()).unwrap();

        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(dbh.find_by_tag("file", "link").unwrap().len(), 0);
    }

    #[test]
    fn test_missing_root_does_not_abort() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good");
        fs::create_dir_all(&good).unwrap();
        fs::write(good.join("f"), b"x").unwrap();

        let dbh = db::open(&tmp.path().join("db")).unwrap();
        let stats = run_index(
            &dbh,
            &[tmp.path().join("missing"), good],
            IndexConfig::default(),
        )
        .unwrap();

        assert_eq!(stats.walk_errors, 1);
        assert_eq!(stats.indexed, 1);
    }
}
