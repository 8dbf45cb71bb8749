//! Structural hash of a worklet's canonical source.

use sha2::{Digest, Sha256};

/// First 48 bits of the SHA-256 digest, so the value stays an exact JS number.
pub fn worklet_hash(as_string: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(as_string.as_bytes());
    let digest = hasher.finalize();
    digest[..6]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let src = "function foo(x){return x+2}";
        assert_eq!(worklet_hash(src), worklet_hash(src));
    }

    #[test]
    fn test_hash_fits_safe_integer() {
        let max_safe = (1u64 << 53) - 1;
        for src in ["", "a", "function _f(){return 1}"] {
            assert!(worklet_hash(src) <= max_safe);
        }
    }

    #[test]
    fn test_single_byte_change() {
        assert_ne!(
            worklet_hash("function _f(){return x+2}"),
            worklet_hash("function _f(){return x+3}")
        );
    }

    #[test]
    fn test_known_prefix() {
        // sha256("") = e3b0c44298fc...
        assert_eq!(worklet_hash(""), 0xe3b0_c442_98fc);
    }
}
