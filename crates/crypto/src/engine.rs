//! Krypto-Engine des sicheren Kanals
//!
//! Besitzt genau einen symmetrischen Schluessel pro Verbindungsversuch und
//! versiegelt/oeffnet Nachrichten.
//!
//! ## Versiegeln
//! ```text
//! nonce     = 12 Zufallsbytes (pro Nachricht frisch)
//! aad       = timestamp(8, i64 BE)
//! encrypted = AEAD(key, nonce, plaintext, aad)   // inkl. auth_tag(16)
//! signature = HMAC-SHA256(token, plaintext)
//! ```
//!
//! Die Signatur deckt den Klartext ab, nicht den Ciphertext, und ist nicht
//! Teil der signierten Daten. Beim Oeffnen wird sie gegen den frisch
//! entschluesselten Klartext geprueft.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use secwire_protocol::Envelope;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{CipherAlgorithm, SecretBytes, NONCE_LAENGE, SCHLUESSEL_LAENGE};

/// Krypto-Engine fuer einen Verbindungsversuch
///
/// Jede Kanal-Instanz besitzt ihre eigene Engine; Schluesselmaterial wird
/// nie zwischen Instanzen geteilt.
pub struct CryptoEngine {
    algorithmus: CipherAlgorithm,
    /// HMAC-Schluessel aus dem Authentifizierungs-Token
    signatur_schluessel: hmac::Key,
    /// Symmetrischer Schluessel (None bis `derive_key`)
    schluessel: Option<SecretBytes>,
    rng: SystemRandom,
}

impl std::fmt::Debug for CryptoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoEngine")
            .field("algorithmus", &self.algorithmus)
            .field("initialisiert", &self.ist_initialisiert())
            .finish_non_exhaustive()
    }
}

impl CryptoEngine {
    /// Erstellt eine neue, noch nicht initialisierte Engine
    ///
    /// `token` ist das Authentifizierungs-Credential und dient als
    /// Signatur-Schluessel.
    pub fn neu(algorithmus: CipherAlgorithm, token: &str) -> Self {
        Self {
            algorithmus,
            signatur_schluessel: hmac::Key::new(hmac::HMAC_SHA256, token.as_bytes()),
            schluessel: None,
            rng: SystemRandom::new(),
        }
    }

    pub fn algorithmus(&self) -> CipherAlgorithm {
        self.algorithmus
    }

    pub fn ist_initialisiert(&self) -> bool {
        self.schluessel.is_some()
    }

    /// Importiert den symmetrischen Schluessel aus einem Base64-Secret
    ///
    /// Darf pro Engine genau einmal aufgerufen werden.
    pub fn derive_key(&mut self, secret: &str) -> CryptoResult<()> {
        if self.schluessel.is_some() {
            return Err(CryptoError::BereitsInitialisiert);
        }

        let bytes = STANDARD.decode(secret.trim()).map_err(|e| {
            CryptoError::SchluesselInitialisierung(format!("Secret ist kein Base64: {e}"))
        })?;
        if bytes.len() != SCHLUESSEL_LAENGE {
            return Err(CryptoError::SchluesselInitialisierung(format!(
                "Ungueltige Schluessel-Laenge: erwartet {}, erhalten {}",
                SCHLUESSEL_LAENGE,
                bytes.len()
            )));
        }

        self.schluessel = Some(SecretBytes::new(bytes));
        tracing::debug!(algorithmus = %self.algorithmus, "Sitzungsschluessel importiert");
        Ok(())
    }

    /// Versiegelt einen Klartext zu einem Envelope
    pub fn seal(&self, plaintext: &[u8], timestamp_ms: i64) -> CryptoResult<Envelope> {
        let key = self.schluessel()?;

        let mut nonce = [0u8; NONCE_LAENGE];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| CryptoError::Verschluesselung("Nonce-Erzeugung fehlgeschlagen".into()))?;

        let aad = timestamp_ms.to_be_bytes();
        let ciphertext = match self.algorithmus {
            CipherAlgorithm::Aes256Gcm => {
                encrypt_aes256gcm(plaintext, key.as_bytes(), &nonce, &aad)?
            }
            CipherAlgorithm::ChaCha20Poly1305 => {
                encrypt_chacha20(plaintext, key.as_bytes(), &nonce, &aad)?
            }
        };

        let signatur = hmac::sign(&self.signatur_schluessel, plaintext);

        Ok(Envelope::aus_teilen(
            &ciphertext,
            &nonce,
            timestamp_ms,
            signatur.as_ref(),
        ))
    }

    /// Oeffnet ein Envelope und gibt den verifizierten Klartext zurueck
    ///
    /// Schlaegt fehl bei falscher Nonce-Laenge, manipuliertem Ciphertext
    /// oder Timestamp, falschem Schluessel oder nicht passender Signatur.
    pub fn open(&self, envelope: &Envelope) -> CryptoResult<Vec<u8>> {
        let key = self.schluessel()?;

        let nonce_bytes = envelope
            .iv_bytes()
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?;
        let nonce: [u8; NONCE_LAENGE] =
            nonce_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::UngueltigeNonce {
                    erwartet: NONCE_LAENGE,
                    erhalten: nonce_bytes.len(),
                })?;
        let ciphertext = envelope
            .ciphertext_bytes()
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?;
        let signatur = envelope
            .signature_bytes()
            .map_err(|e| CryptoError::Integritaet(e.to_string()))?;

        let aad = envelope.timestamp.to_be_bytes();
        let plaintext = match self.algorithmus {
            CipherAlgorithm::Aes256Gcm => {
                decrypt_aes256gcm(&ciphertext, key.as_bytes(), &nonce, &aad)?
            }
            CipherAlgorithm::ChaCha20Poly1305 => {
                decrypt_chacha20(&ciphertext, key.as_bytes(), &nonce, &aad)?
            }
        };

        // Signatur ueber den entschluesselten Klartext, nie ueber das Envelope
        hmac::verify(&self.signatur_schluessel, &plaintext, &signatur)
            .map_err(|_| CryptoError::Integritaet("Signatur stimmt nicht ueberein".into()))?;

        Ok(plaintext)
    }

    fn schluessel(&self) -> CryptoResult<&SecretBytes> {
        self.schluessel.as_ref().ok_or(CryptoError::NichtInitialisiert)
    }
}

/// Erzeugt ein neues zufaelliges Secret (Base64) fuer die Konfiguration
pub fn secret_erzeugen() -> CryptoResult<String> {
    let mut bytes = vec![0u8; SCHLUESSEL_LAENGE];
    SystemRandom::new().fill(&mut bytes).map_err(|_| {
        CryptoError::SchluesselInitialisierung("Zufallsquelle nicht verfuegbar".into())
    })?;
    let secret = STANDARD.encode(&bytes);
    drop(SecretBytes::new(bytes));
    Ok(secret)
}

fn encrypt_aes256gcm(
    plaintext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; NONCE_LAENGE],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key_bytes));
    cipher
        .encrypt(AesNonce::from_slice(nonce_bytes), Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

fn encrypt_chacha20(
    plaintext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; NONCE_LAENGE],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(key_bytes));
    cipher
        .encrypt(
            ChaChaNonce::from_slice(nonce_bytes),
            chacha20poly1305::aead::Payload { msg: plaintext, aad },
        )
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

fn decrypt_aes256gcm(
    ciphertext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; NONCE_LAENGE],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key_bytes));
    cipher
        .decrypt(
            AesNonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

fn decrypt_chacha20(
    ciphertext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; NONCE_LAENGE],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(key_bytes));
    cipher
        .decrypt(
            ChaChaNonce::from_slice(nonce_bytes),
            chacha20poly1305::aead::Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
