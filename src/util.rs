// Simple human-readable size (binary units)
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.2} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

// Parse "smart" human sizes like: 123, 10_000, 4k, 32K, 512m, 1g, 1.5g,
// also accepts optional "b", "kb", "kib", "mb", "mib", etc.
//
// Uses binary units (KiB=1024) to match format_size().
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if s.is_empty() {
        return Err("size is empty".into());
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '_'))
        .unwrap_or(s.len());
    let (num_part, suffix) = s.split_at(split);

    let num_part = num_part.replace('_', "");
    if num_part.is_empty() {
        return Err(format!("missing number in size: {s}"));
    }

    let value: f64 = num_part
        .parse::<f64>()
        .map_err(|_| format!("invalid number in size: {s}"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid size: {s}"));
    }

    let mult: f64 = match suffix {
        "" | "b" => 1.0,
        "k" | "kb" | "kib" => 1024.0,
        "m" | "mb" | "mib" => 1024.0 * 1024.0,
        "g" | "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        _ => return Err(format!("unknown size suffix '{suffix}' in '{s}'")),
    };

    let bytes_f = value * mult;
    if bytes_f > (u64::MAX as f64) {
        return Err(format!("size too large: {s}"));
    }

    Ok(bytes_f.floor() as u64)
}

/// clap value parser for `--chunk-size`: a non-zero size no larger than the chunk ceiling.
pub fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let n = parse_size(s)?;
    if n == 0 {
        return Err("chunk size must be greater than zero".into());
    }
    if n > crate::chunker::MAX_CHUNK_CEILING as u64 {
        return Err(format!(
            "chunk size may not exceed {}",
            format_size(crate::chunker::MAX_CHUNK_CEILING as u64)
        ));
    }
    Ok(n as usize)
}
