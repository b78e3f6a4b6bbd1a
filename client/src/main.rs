//! secwire-client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging, verbindet den Kanal,
//! abonniert alle erlaubten Topics und protokolliert eingehende Events bis
//! Ctrl-C.
//!
//! ```text
//! secwire-client                       # nur verbinden und lauschen
//! secwire-client chat '{"text":"hi"}'  # zusaetzlich eine Nachricht senden
//! secwire-client --secret-erzeugen     # neues Base64-Secret ausgeben
//! ```

mod config;

use anyhow::Result;
use secwire_channel::{ChannelEvent, EventKind, SecureChannel, TcpTransport};
use secwire_crypto::secret_erzeugen;
use secwire_observability::logging_initialisieren;
use secwire_protocol::Message;
use serde_json::Value;

use crate::config::ClientConfig;

enum Schritt {
    Weiter(bool),
    Abbruch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--secret-erzeugen") {
        println!("{}", secret_erzeugen()?);
        return Ok(());
    }

    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("SECWIRE_CONFIG").unwrap_or_else(|_| "secwire.toml".into());
    let config = ClientConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        url = %config.kanal.url,
        "secwire-client wird gestartet"
    );

    let mut kanal = SecureChannel::neu(config.kanal.clone(), TcpTransport::new())?;
    for art in EventKind::ALLE {
        kanal.on(art, ereignis_loggen);
    }

    kanal.connect().await?;

    // Vor der Authentifizierung landen diese Anfragen in der Queue
    for topic in &config.kanal.erlaubte_topics {
        kanal.subscribe(topic).await?;
    }
    if let Some(art) = args.first() {
        let data = args.get(1).map(String::as_str).map(nutzdaten).unwrap_or(Value::Null);
        kanal.send(Message::neu(art.as_str(), data)).await?;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let schritt = tokio::select! {
            weiter = kanal.process_next() => Schritt::Weiter(weiter),
            _ = &mut ctrl_c => Schritt::Abbruch,
        };

        match schritt {
            Schritt::Weiter(true) => {}
            Schritt::Weiter(false) => {
                tracing::info!("Transport beendet");
                break;
            }
            Schritt::Abbruch => {
                tracing::info!("Ctrl-C empfangen, trenne Verbindung");
                kanal.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}

/// JSON wenn moeglich, sonst als String
fn nutzdaten(roh: &str) -> Value {
    serde_json::from_str(roh).unwrap_or_else(|_| Value::String(roh.to_string()))
}

fn ereignis_loggen(ereignis: &ChannelEvent) {
    match ereignis {
        ChannelEvent::Message(message) => {
            tracing::debug!(kind = %message.kind, data = %message.data, "Nachricht");
        }
        ChannelEvent::Topic { topic, message } => {
            tracing::info!(topic = %topic, kind = %message.kind, data = %message.data, "Topic-Nachricht");
        }
        ChannelEvent::Error { grund } => tracing::warn!(grund = %grund, "Kanal-Fehler"),
        ChannelEvent::MessageTimeout { message_id } => {
            tracing::warn!(message_id = %message_id, "Kein Ack erhalten");
        }
        anderes => tracing::info!(event = %anderes.kind(), details = ?anderes, "Kanal-Event"),
    }
}
