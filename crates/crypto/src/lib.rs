//! # secwire-crypto
//!
//! Krypto-Engine fuer den sicheren Kanal.
//!
//! ## Module
//! - `engine` - Schluessel-Import, AEAD-Versiegelung, HMAC-Signatur
//! - `types` - Gemeinsame Typen (SecretBytes, CipherAlgorithm, Laengen)
//! - `error` - Fehlertypen

pub mod engine;
pub mod error;
pub mod types;

// Bequeme Re-Exports
pub use engine::{secret_erzeugen, CryptoEngine};
pub use error::{CryptoError, CryptoResult};
pub use types::{CipherAlgorithm, SecretBytes};
