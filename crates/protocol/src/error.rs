//! Fehlertypen fuer das Protokoll-Crate

use thiserror::Error;

/// Fehler beim Kodieren/Dekodieren von Nachrichten und Envelopes
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON-Verarbeitung fehlgeschlagen: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64-Dekodierung von '{feld}' fehlgeschlagen: {quelle}")]
    Base64 {
        feld: &'static str,
        #[source]
        quelle: base64::DecodeError,
    },

    #[error("Frame zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    FrameZuGross { groesse: usize, maximum: usize },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
