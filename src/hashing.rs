use std::fs::File;
use std::hash::Hasher;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// FNV-1a offset basis; also the hash of an empty stream.
pub const FNV1A_64_INIT: u64 = 0xcbf29ce484222325;

/// Incremental FNV-1a 64.
///
/// The whole state is the running 64-bit value, and bytes go straight through
/// `Hasher::write`, so feeding a stream in pieces gives the same value as
/// feeding it in one call. Where the pieces were cut never reaches the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv64(u64);

impl Fnv64 {
    pub fn new() -> Self {
        Self(FNV1A_64_INIT)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut h = fnv::FnvHasher::with_key(self.0);
        h.write(bytes);
        self.0 = h.finish();
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for Fnv64 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot FNV-1a 64 of a byte slice.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut h = Fnv64::new();
    h.update(bytes);
    h.value()
}

/// Tell the kernel we are about to read `file` front to back, once.
#[cfg(unix)]
pub fn advise_sequential(file: &File) {
    let fd = file.as_raw_fd();
    unsafe {
        let _ = libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_SEQUENTIAL);
        let _ = libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_NOREUSE);
    }
}

#[cfg(not(unix))]
pub fn advise_sequential(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_offset_basis() {
        assert_eq!(fnv1a_64(b""), FNV1A_64_INIT);
        assert_eq!(Fnv64::new().value(), FNV1A_64_INIT);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_clone_forks_stream() {
        let mut base = Fnv64::new();
        base.update(b"foo");

        let mut fork = base.clone();
        fork.update(b"bar");

        assert_eq!(base.value(), fnv1a_64(b"foo"));
        assert_eq!(fork.value(), fnv1a_64(b"foobar"));
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut h = Fnv64::new();
        h.update(b"abc");
        let before = h.value();
        h.update(b"");
        assert_eq!(h.value(), before);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Splitting a stream at arbitrary points never changes its hash.
        #[test]
        fn prop_hash_independent_of_split(
            data in prop::collection::vec(any::<u8>(), 0..4096),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(data.len() + 1)).collect();
            points.sort_unstable();

            let mut h = Fnv64::new();
            let mut prev = 0;
            for p in points {
                h.update(&data[prev..p]);
                prev = p;
            }
            h.update(&data[prev..]);

            prop_assert_eq!(h.value(), fnv1a_64(&data));
        }
    }
}
