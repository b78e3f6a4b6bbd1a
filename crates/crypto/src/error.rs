//! Fehlertypen fuer die Krypto-Engine

use thiserror::Error;

/// Fehler der Krypto-Engine
///
/// `SchluesselInitialisierung` und `BereitsInitialisiert` sind fatal fuer den
/// Verbindungsversuch. `Integritaet`, `Entschluesselung` und `UngueltigeNonce`
/// betreffen nur den einzelnen Frame.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Initialisierung fehlgeschlagen: {0}")]
    SchluesselInitialisierung(String),

    #[error("Krypto-Engine ist bereits initialisiert")]
    BereitsInitialisiert,

    #[error("Krypto-Engine ist nicht initialisiert")]
    NichtInitialisiert,

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Integritaetspruefung fehlgeschlagen: {0}")]
    Integritaet(String),

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },
}

impl CryptoError {
    /// Gibt true zurueck wenn nur der einzelne Frame betroffen ist
    pub fn ist_frame_fehler(&self) -> bool {
        matches!(
            self,
            Self::Entschluesselung(_) | Self::Integritaet(_) | Self::UngueltigeNonce { .. }
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
