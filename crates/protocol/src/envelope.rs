//! Wire-Darstellung einer versiegelten Nachricht
//!
//! ## Format (JSON)
//! ```text
//! {
//!   "encrypted": "<base64 ciphertext + auth_tag(16)>",
//!   "iv":        "<base64 nonce(12)>",
//!   "timestamp": <unix-ms>,
//!   "signature": "<base64 HMAC-SHA256 ueber den Klartext>"
//! }
//! ```
//!
//! Die Form muss unveraendert ueber jeden textbasierten Transport laufen.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Versiegelte Nachricht, wie sie ueber den Transport geht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Ciphertext inkl. Auth-Tag (Base64)
    pub encrypted: String,
    /// Nonce (Base64), pro Nachricht frisch erzeugt
    pub iv: String,
    /// Erstellungszeitpunkt (Unix-ms)
    pub timestamp: i64,
    /// Signatur ueber den Klartext (Base64)
    pub signature: String,
}

impl Envelope {
    /// Baut ein Envelope aus Roh-Bytes
    pub fn aus_teilen(ciphertext: &[u8], iv: &[u8], timestamp: i64, signature: &[u8]) -> Self {
        Self {
            encrypted: STANDARD.encode(ciphertext),
            iv: STANDARD.encode(iv),
            timestamp,
            signature: STANDARD.encode(signature),
        }
    }

    pub fn ciphertext_bytes(&self) -> ProtocolResult<Vec<u8>> {
        dekodieren("encrypted", &self.encrypted)
    }

    pub fn iv_bytes(&self) -> ProtocolResult<Vec<u8>> {
        dekodieren("iv", &self.iv)
    }

    pub fn signature_bytes(&self) -> ProtocolResult<Vec<u8>> {
        dekodieren("signature", &self.signature)
    }

    /// Serialisiert das Envelope als JSON-Text
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialisiert ein Envelope aus JSON-Bytes (ein Transport-Frame)
    pub fn from_json_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn dekodieren(feld: &'static str, wert: &str) -> ProtocolResult<Vec<u8>> {
    STANDARD
        .decode(wert)
        .map_err(|quelle| ProtocolError::Base64 { feld, quelle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_hat_genau_vier_felder() {
        let env = Envelope::aus_teilen(b"cipher", &[7u8; 12], 1234, b"sig");
        let json = env.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 4);
        assert!(obj["encrypted"].is_string());
        assert!(obj["iv"].is_string());
        assert_eq!(obj["timestamp"], 1234);
        assert!(obj["signature"].is_string());
    }

    #[test]
    fn bytes_werden_wiederhergestellt() {
        let env = Envelope::aus_teilen(b"cipher", &[7u8; 12], 1, b"sig");
        let decoded = Envelope::from_json_bytes(env.to_json().unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.ciphertext_bytes().unwrap(), b"cipher");
        assert_eq!(decoded.iv_bytes().unwrap(), vec![7u8; 12]);
        assert_eq!(decoded.signature_bytes().unwrap(), b"sig");
    }

    #[test]
    fn ungueltiges_base64_nennt_das_feld() {
        let mut env = Envelope::aus_teilen(b"x", &[0u8; 12], 1, b"s");
        env.iv = "***".into();
        match env.iv_bytes() {
            Err(ProtocolError::Base64 { feld, .. }) => assert_eq!(feld, "iv"),
            other => panic!("Erwartet Base64-Fehler, erhalten: {other:?}"),
        }
    }

    #[test]
    fn fehlendes_feld_schlaegt_fehl() {
        let json = br#"{"encrypted":"AA==","iv":"AA==","timestamp":1}"#;
        assert!(Envelope::from_json_bytes(json).is_err());
    }
}
