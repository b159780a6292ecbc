//! Inter-module trust keys.
//!
//! A DKey is an opaque shared secret a module generates once at startup and
//! holds in memory only. A dependent module fetches the key string exactly
//! once, at its own startup, and caches it for the process lifetime; from
//! then on every "system" call between the two carries the string and is
//! validated by plain equality. There is no rotation, expiry, or signature —
//! the key is a process-lifetime trust handshake, not a cryptographic token.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::RngCore;

/// Errors of DKey construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DKeyError {
    /// The configured key size is zero.
    #[error("key size is wrong")]
    KeySize,
}

/// A process-lifetime shared secret.
///
/// The key string can be handed out only once; repeated hand-outs yield
/// nothing. Validation works regardless of whether the key was handed out.
#[derive(Debug)]
pub struct DKey {
    string: String,
    handed_out: AtomicBool,
}

impl DKey {
    /// Generates a key of `size` random bytes.
    pub fn generate(size: usize) -> Result<Self, DKeyError> {
        if size == 0 {
            return Err(DKeyError::KeySize);
        }
        let mut bytes = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(Self {
            string: hex::encode_upper(&bytes),
            handed_out: AtomicBool::new(false),
        })
    }

    /// Hands the key string out. The first call returns the string; every
    /// later call returns `None`.
    pub fn take_string(&self) -> Option<String> {
        if self
            .handed_out
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(self.string.clone())
        } else {
            None
        }
    }

    /// Whether `candidate` equals the key string.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate == self.string
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_validates_itself_only() {
        let key = DKey::generate(16).unwrap();
        let string = key.take_string().unwrap();
        assert_eq!(string.len(), 32);
        assert!(string.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!string.chars().any(|c| c.is_ascii_lowercase()));
        assert!(key.matches(&string));
        assert!(!key.matches("SOMETHING-ELSE"));
        assert!(!key.matches(""));
    }

    #[test]
    fn key_string_is_handed_out_once() {
        let key = DKey::generate(8).unwrap();
        let first = key.take_string();
        assert!(first.is_some());
        assert!(key.take_string().is_none());
        // Validation still works after the hand-out.
        assert!(key.matches(&first.unwrap()));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(DKey::generate(0).unwrap_err(), DKeyError::KeySize);
    }
}
