use anyhow::{anyhow, Context, Result};

/// FNV-1a 64 over a file's full byte stream, in read order.
pub type FileHash = u64;

/// FNV-1a 64 over a single chunk.
pub type BlobHash = u64;

/// Render a hash as 16 lowercase hex digits (big-endian).
pub fn hash_to_hex(h: u64) -> String {
    hex::encode(h.to_be_bytes())
}

/// Parse a hash printed by `hash_to_hex`. Shorter inputs are left-padded,
/// so `ff` and `00000000000000ff` name the same hash.
pub fn hash_from_hex(s: &str) -> Result<u64> {
    let s = s.trim().trim_start_matches("0x");
    if s.is_empty() || s.len() > 16 {
        return Err(anyhow!("expected 1-16 hex digits, got {:?}", s));
    }

    let padded = format!("{:0>16}", s);
    let bytes = hex::decode(&padded).with_context(|| format!("invalid hex hash {s:?}"))?;

    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes);
    Ok(u64::from_be_bytes(arr))
}
