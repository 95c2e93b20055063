//! Deterministic default hasher for token keys.

use core::hash::{BuildHasher, Hasher};

/// Order-sensitive polynomial hash over bytes: `h = h * 31 + b`.
///
/// Unlike `RandomState` this is stable across runs and processes, so the
/// slot layout (and with it the tie order among equal counts) is
/// reproducible for a given input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolynomialHasher {
    state: u64,
}

impl Hasher for PolynomialHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = self.state.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildPolynomialHasher;

impl BuildHasher for BuildPolynomialHasher {
    type Hasher = PolynomialHasher;

    fn build_hasher(&self) -> Self::Hasher {
        PolynomialHasher::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(bytes: &[u8]) -> u64 {
        let mut h = BuildPolynomialHasher.build_hasher();
        h.write(bytes);
        h.finish()
    }

    #[test]
    fn matches_polynomial_definition() {
        assert_eq!(hash(b""), 0);
        assert_eq!(hash(b"a"), 97);
        assert_eq!(hash(b"ab"), 97 * 31 + 98);
        assert_eq!(hash(b"abc"), (97 * 31 + 98) * 31 + 99);
    }

    #[test]
    fn order_sensitive() {
        assert_ne!(hash(b"ab"), hash(b"ba"));
    }

    /// High bytes are folded as unsigned values.
    #[test]
    fn high_bytes_are_unsigned() {
        assert_eq!(hash(&[0xff]), 255);
    }

    /// Split writes accumulate the same as one write.
    #[test]
    fn chunked_writes_compose() {
        let mut h = BuildPolynomialHasher.build_hasher();
        h.write(b"hel");
        h.write(b"lo");
        assert_eq!(h.finish(), hash(b"hello"));
    }

    #[test]
    fn long_input_wraps_without_panicking() {
        let long = vec![b'z'; 10_000];
        let _ = hash(&long);
    }
}
