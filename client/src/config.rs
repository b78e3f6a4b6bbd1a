//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte; ohne `token` und `schluessel` kann der Kanal aber nicht
//! verbinden.

use secwire_channel::ChannelConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Kanal-Einstellungen (Endpunkt, Credentials, Limits)
    pub kanal: ChannelConfig,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn aus_toml(inhalt: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(inhalt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secwire_crypto::CipherAlgorithm;

    #[test]
    fn standard_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.kanal.ack_timeout_ms, 30_000);
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [kanal]
            url = "tcp://10.0.0.5:7000"
            token = "tok"
            schluessel = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
            algorithmus = "chacha20_poly1305"
            erlaubte_topics = ["trips", "alerts"]
            max_nachrichten_bytes = 4096

            [logging]
            format = "json"
        "#;
        let cfg = ClientConfig::aus_toml(toml).unwrap();
        assert_eq!(cfg.kanal.url, "tcp://10.0.0.5:7000");
        assert_eq!(cfg.kanal.algorithmus, CipherAlgorithm::ChaCha20Poly1305);
        assert_eq!(cfg.kanal.erlaubte_topics.len(), 2);
        assert_eq!(cfg.kanal.max_nachrichten_bytes, 4096);
        assert_eq!(cfg.logging.format, "json");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.kanal.ack_timeout_ms, 30_000);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.kanal.pruefen().is_ok());
    }

    #[test]
    fn unbekannter_algorithmus_ist_fehler() {
        let toml = r#"
            [kanal]
            algorithmus = "rot13"
        "#;
        assert!(ClientConfig::aus_toml(toml).is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let cfg = ClientConfig::laden("/nicht/vorhanden/secwire.toml").unwrap();
        assert!(cfg.kanal.token.is_empty());
    }
}
