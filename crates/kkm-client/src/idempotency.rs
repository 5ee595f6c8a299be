//! Idempotency key generation.

use rand::RngCore;

/// Random bytes per key (256 bits).
pub const KEY_BYTES: usize = 32;

/// Returns a fresh hex-encoded key, `2 * KEY_BYTES` characters long.
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let key = generate_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_key(), generate_key());
    }
}
