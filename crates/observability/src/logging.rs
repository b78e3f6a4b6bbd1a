//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `SECWIRE_LOG_LEVEL`: Filter (z.B. `info` oder `secwire_channel=trace`), Standard: info
//! - `SECWIRE_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Die Umgebung hat Vorrang vor den Werten aus der Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "SECWIRE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SECWIRE_LOG_FORMAT";

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Unbekannte Werte fallen auf `Text` zurueck
    pub fn parse(format: &str) -> Self {
        match format {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialisiert das Logging-System.
///
/// Liest `SECWIRE_LOG_LEVEL` und `SECWIRE_LOG_FORMAT` aus der Umgebung und
/// faellt auf die uebergebenen Werte zurueck. Ein zweiter Aufruf ist ein
/// No-op (der erste Subscriber bleibt aktiv).
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = format_waehlen(std::env::var(ENV_LOG_FORMAT).ok(), format);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if ergebnis.is_err() {
        tracing::debug!("Logging bereits initialisiert");
    }
}

/// Waehlt das Format: Umgebung vor Konfiguration
pub fn format_waehlen(aus_env: Option<String>, konfiguriert: &str) -> LogFormat {
    match aus_env {
        Some(wert) if log_format_gueltig(&wert) => LogFormat::parse(&wert),
        _ => LogFormat::parse(konfiguriert),
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level));
        }
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO")); // Gross-/Kleinschreibung
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }

    #[test]
    fn format_aus_env_hat_vorrang() {
        assert_eq!(format_waehlen(Some("json".into()), "text"), LogFormat::Json);
        assert_eq!(format_waehlen(Some("text".into()), "json"), LogFormat::Text);
    }

    #[test]
    fn ungueltiges_env_format_wird_ignoriert() {
        assert_eq!(format_waehlen(Some("xml".into()), "json"), LogFormat::Json);
        assert_eq!(format_waehlen(None, "json"), LogFormat::Json);
        assert_eq!(format_waehlen(None, "unbekannt"), LogFormat::Text);
    }

    #[test]
    fn doppelte_initialisierung_panikt_nicht() {
        logging_initialisieren("debug", "text");
        logging_initialisieren("info", "json");
    }
}
