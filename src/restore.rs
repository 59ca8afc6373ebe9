use crate::db::DbHandle;
use crate::error::{IndexError, Result};
use crate::hashing::Fnv64;
use crate::types::{hash_to_hex, FileHash};

/// Rebuild a file's bytes from its chunk list.
///
/// Chunks are concatenated in ordinal order and the result must hash back to
/// `file_hash`. A blob hash stored under more than one size has its variants
/// tried depth-first until the bytes hash back.
pub fn reassemble(db: &DbHandle, file_hash: FileHash) -> Result<Vec<u8>> {
    let chunks = db.file_chunks(file_hash)?;

    for (expected, (ordinal, _)) in chunks.iter().enumerate() {
        if *ordinal as usize != expected {
            return Err(IndexError::corrupt(format!(
                "file {} has no chunk at ordinal {}",
                hash_to_hex(file_hash),
                expected
            )));
        }
    }

    let mut candidates = Vec::with_capacity(chunks.len());
    for (ordinal, blob) in &chunks {
        let variants = db.blobs_by_hash(*blob)?;
        if variants.is_empty() {
            return Err(IndexError::corrupt(format!(
                "blob {} (ordinal {}) of file {} is missing",
                hash_to_hex(*blob),
                ordinal,
                hash_to_hex(file_hash)
            )));
        }
        candidates.push(variants);
    }

    let mut out = Vec::new();
    if assemble(&candidates, Fnv64::new(), file_hash, &mut out) {
        Ok(out)
    } else {
        Err(IndexError::corrupt(format!(
            "chunks of file {} do not hash back to it",
            hash_to_hex(file_hash)
        )))
    }
}

fn assemble(rest: &[Vec<(u32, Vec<u8>)>], state: Fnv64, target: u64, out: &mut Vec<u8>) -> bool {
    let Some((first, tail)) = rest.split_first() else {
        return state.value() == target;
    };

    for (_, bytes) in first {
        let mut next = state;
        next.update(bytes);

        let mark = out.len();
        out.extend_from_slice(bytes);
        if assemble(tail, next, target, out) {
            return true;
        }
        out.truncate(mark);
    }
    false
}
