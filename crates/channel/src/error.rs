//! Fehlertypen fuer den sicheren Kanal

use secwire_crypto::CryptoError;
use secwire_protocol::ProtocolError;
use thiserror::Error;

/// Fehlertyp fuer Kanal-Operationen
#[derive(Debug, Error)]
pub enum ChannelError {
    /// `connect()` ausserhalb von `Disconnected`
    #[error("Kanal ist bereits verbunden")]
    BereitsVerbunden,

    /// Serialisierte Nachricht ueberschreitet das konfigurierte Maximum
    #[error("Nachricht zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    NachrichtZuGross { groesse: usize, maximum: usize },

    /// Kein Schluesselmaterial oder kein offener Transport
    #[error("Kanal ist nicht verbunden")]
    NichtVerbunden,

    /// Ungueltige Konfiguration
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    /// Schluessel-Import, Versiegeln oder Oeffnen fehlgeschlagen
    #[error("Krypto-Fehler: {0}")]
    Krypto(#[from] CryptoError),

    /// Nachricht oder Envelope nicht (de)serialisierbar
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),

    /// Transport-Fehler (Oeffnen, Schreiben)
    #[error("Transport-Fehler: {0}")]
    Transport(#[from] std::io::Error),
}

impl ChannelError {
    /// Erstellt einen Konfigurationsfehler
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }
}

/// Result-Typ fuer den sicheren Kanal
pub type ChannelResult<T> = Result<T, ChannelError>;
