//! Gemeinsame Typen fuer die Krypto-Engine

use serde::{Deserialize, Serialize};

/// Laenge des symmetrischen Schluessels in Bytes (beide Algorithmen)
pub const SCHLUESSEL_LAENGE: usize = 32;

/// Laenge der Nonce in Bytes (beide Algorithmen)
pub const NONCE_LAENGE: usize = 12;

/// Laenge des AEAD-Auth-Tags in Bytes
pub const TAG_LAENGE: usize = 16;

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// AEAD-Algorithmus fuer die Nachrichten-Verschluesselung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    #[default]
    #[serde(rename = "aes256_gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20_poly1305")]
    ChaCha20Poly1305,
}

impl std::fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes256Gcm => write!(f, "aes256_gcm"),
            Self::ChaCha20Poly1305 => write!(f, "chacha20_poly1305"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_bytes_debug_ist_geschwaerzt() {
        let s = SecretBytes::new(vec![0xAB; 32]);
        let text = format!("{s:?}");
        assert!(text.contains("REDACTED"));
        assert!(!text.contains("171"));
    }

    #[test]
    fn algorithmus_serde_namen() {
        assert_eq!(
            serde_json::to_string(&CipherAlgorithm::ChaCha20Poly1305).unwrap(),
            "\"chacha20_poly1305\""
        );
        let a: CipherAlgorithm = serde_json::from_str("\"aes256_gcm\"").unwrap();
        assert_eq!(a, CipherAlgorithm::Aes256Gcm);
        assert_eq!(CipherAlgorithm::default(), CipherAlgorithm::Aes256Gcm);
    }
}
