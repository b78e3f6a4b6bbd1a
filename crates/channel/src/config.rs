//! Kanal-Konfiguration
//!
//! Unveraenderlich fuer die Lebensdauer eines Kanals. Alle Felder haben
//! Standardwerte, sodass eine TOML-Datei nur die abweichenden Werte
//! enthalten muss.

use secwire_crypto::CipherAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::{ChannelError, ChannelResult};

/// Standard-Maximum fuer serialisierte Klartext-Nachrichten (64 KB)
pub const DEFAULT_MAX_NACHRICHTEN_BYTES: usize = 64 * 1024;

/// Standard-Frist fuer Acks (30 Sekunden)
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 30_000;

/// Konfiguration eines sicheren Kanals
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Transport-Endpunkt (z.B. `tcp://127.0.0.1:9900`)
    pub url: String,
    /// Authentifizierungs-Credential (auch Signatur-Schluessel)
    pub token: String,
    /// Symmetrisches Secret (Base64, 32 Bytes)
    pub schluessel: String,
    /// AEAD-Algorithmus
    pub algorithmus: CipherAlgorithm,
    /// Topics, die abonniert werden duerfen
    pub erlaubte_topics: BTreeSet<String>,
    /// Maximale Groesse einer serialisierten Nachricht vor dem Versiegeln
    pub max_nachrichten_bytes: usize,
    /// Frist bis zum Ack in Millisekunden
    pub ack_timeout_ms: u64,
    /// Maximales Alter eingehender Envelopes in Millisekunden (None = aus)
    pub max_envelope_alter_ms: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "tcp://127.0.0.1:9900".into(),
            token: String::new(),
            schluessel: String::new(),
            algorithmus: CipherAlgorithm::default(),
            erlaubte_topics: BTreeSet::new(),
            max_nachrichten_bytes: DEFAULT_MAX_NACHRICHTEN_BYTES,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            max_envelope_alter_ms: None,
        }
    }
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("schluessel", &"[REDACTED]")
            .field("algorithmus", &self.algorithmus)
            .field("erlaubte_topics", &self.erlaubte_topics)
            .field("max_nachrichten_bytes", &self.max_nachrichten_bytes)
            .field("ack_timeout_ms", &self.ack_timeout_ms)
            .field("max_envelope_alter_ms", &self.max_envelope_alter_ms)
            .finish()
    }
}

impl ChannelConfig {
    /// Prueft die Konfiguration auf offensichtliche Fehler
    ///
    /// Das Secret selbst wird erst beim Verbinden importiert und geprueft.
    pub fn pruefen(&self) -> ChannelResult<()> {
        if self.url.trim().is_empty() {
            return Err(ChannelError::konfiguration("url darf nicht leer sein"));
        }
        if self.token.is_empty() {
            return Err(ChannelError::konfiguration("token darf nicht leer sein"));
        }
        if self.max_nachrichten_bytes == 0 {
            return Err(ChannelError::konfiguration(
                "max_nachrichten_bytes muss groesser 0 sein",
            ));
        }
        if self.ack_timeout_ms == 0 {
            return Err(ChannelError::konfiguration(
                "ack_timeout_ms muss groesser 0 sein",
            ));
        }
        Ok(())
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Angeforderte Berechtigungen fuer den Handshake
    pub fn berechtigungen(&self) -> Vec<String> {
        self.erlaubte_topics.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gueltig() -> ChannelConfig {
        ChannelConfig {
            token: "tok".into(),
            ..ChannelConfig::default()
        }
    }

    #[test]
    fn standardwerte() {
        let cfg = ChannelConfig::default();
        assert_eq!(cfg.max_nachrichten_bytes, 64 * 1024);
        assert_eq!(cfg.ack_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.algorithmus, CipherAlgorithm::Aes256Gcm);
        assert!(cfg.max_envelope_alter_ms.is_none());
    }

    #[test]
    fn pruefen_akzeptiert_gueltige_config() {
        assert!(gueltig().pruefen().is_ok());
    }

    #[test]
    fn pruefen_lehnt_fehlerhafte_werte_ab() {
        let faelle = [
            ChannelConfig { url: " ".into(), ..gueltig() },
            ChannelConfig { token: String::new(), ..gueltig() },
            ChannelConfig { max_nachrichten_bytes: 0, ..gueltig() },
            ChannelConfig { ack_timeout_ms: 0, ..gueltig() },
        ];
        for cfg in faelle {
            assert!(matches!(cfg.pruefen(), Err(ChannelError::Konfiguration(_))));
        }
    }

    #[test]
    fn debug_zeigt_keine_geheimnisse() {
        let cfg = ChannelConfig {
            token: "super-geheim".into(),
            schluessel: "c2NobHVlc3NlbA==".into(),
            ..ChannelConfig::default()
        };
        let text = format!("{cfg:?}");
        assert!(!text.contains("super-geheim"));
        assert!(!text.contains("c2NobHVlc3NlbA=="));
    }

    #[test]
    fn berechtigungen_sind_sortiert() {
        let mut cfg = gueltig();
        cfg.erlaubte_topics.insert("trips".into());
        cfg.erlaubte_topics.insert("alerts".into());
        assert_eq!(cfg.berechtigungen(), vec!["alerts", "trips"]);
    }
}
