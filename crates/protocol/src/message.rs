//! Nachrichtenmodell des sicheren Kanals
//!
//! Jede Anwendungs- oder Steuerungsnachricht ist ein JSON-Objekt:
//!
//! ```text
//! { "type": "<kind>", "messageId": "...", "topic": "...", "data": { ... } }
//! ```
//!
//! `messageId`, `topic` und `data` sind optional. Der Klartext einer
//! Nachricht wird vor dem Versiegeln genau so serialisiert; seine Laenge ist
//! die Groesse, die gegen das konfigurierte Maximum geprueft wird.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProtocolResult;
use crate::types::MessageId;

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// Typ-Tag einer Nachricht
///
/// Die Steuerungs-Typen werden von der Kanal-Schicht selbst verarbeitet,
/// alles andere ist eine Anwendungsnachricht und wird an Listener gereicht.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Ausgehend: Token + angeforderte Berechtigungen + Timestamp
    Authenticate,
    /// Eingehend: Handshake erfolgreich
    AuthSuccess,
    /// Eingehend: Handshake abgelehnt
    AuthFailure,
    /// Eingehend: Empfangsbestaetigung mit `messageId`
    Ack,
    /// Ausgehend: Topic abonnieren
    Subscribe,
    /// Ausgehend: Topic abbestellen
    Unsubscribe,
    /// Eingehend: Abonnement bestaetigt
    Subscribed,
    /// Eingehend: Abbestellung bestaetigt
    Unsubscribed,
    /// Eingehend: Gegenseite verweigert ein Topic
    PermissionDenied,
    Ping,
    Pong,
    /// Eingehend: Fehlermeldung der Gegenseite
    Error,
    /// Anwendungsnachricht mit frei waehlbarem Typ
    Anwendung(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Authenticate => "authenticate",
            Self::AuthSuccess => "auth_success",
            Self::AuthFailure => "auth_failure",
            Self::Ack => "ack",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::PermissionDenied => "permission_denied",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Error => "error",
            Self::Anwendung(name) => name.as_str(),
        }
    }

    /// Gibt true zurueck wenn die Kanal-Schicht diesen Typ selbst verarbeitet
    pub fn ist_steuerung(&self) -> bool {
        !matches!(self, Self::Anwendung(_))
    }
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "authenticate" => Self::Authenticate,
            "auth_success" => Self::AuthSuccess,
            "auth_failure" => Self::AuthFailure,
            "ack" => Self::Ack,
            "subscribe" => Self::Subscribe,
            "unsubscribe" => Self::Unsubscribe,
            "subscribed" => Self::Subscribed,
            "unsubscribed" => Self::Unsubscribed,
            "permission_denied" => Self::PermissionDenied,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            "error" => Self::Error,
            _ => Self::Anwendung(s),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Anwendung(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Eine Nachricht (Klartext vor dem Versiegeln bzw. nach dem Oeffnen)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Korrelations-ID fuer Acks
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Beliebiger strukturierter Inhalt
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Message {
    /// Erstellt eine neue Nachricht ohne ID und Topic
    pub fn neu(kind: impl Into<MessageKind>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            message_id: None,
            topic: None,
            data,
        }
    }

    /// Setzt die Nachrichten-ID
    pub fn mit_id(mut self, id: impl Into<MessageId>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Setzt das Topic
    pub fn mit_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Authentifizierungs-Anfrage (erste Nachricht nach dem Oeffnen)
    pub fn authenticate(token: &str, permissions: &[String], timestamp_ms: i64) -> Self {
        Self::neu(
            MessageKind::Authenticate,
            json!({
                "token": token,
                "permissions": permissions,
                "timestamp": timestamp_ms,
            }),
        )
    }

    pub fn subscribe(topic: &str) -> Self {
        Self::neu(MessageKind::Subscribe, json!({ "channel": topic })).mit_topic(topic)
    }

    pub fn unsubscribe(topic: &str) -> Self {
        Self::neu(MessageKind::Unsubscribe, json!({ "channel": topic })).mit_topic(topic)
    }

    pub fn ack(id: MessageId) -> Self {
        Self::neu(MessageKind::Ack, Value::Null).mit_id(id)
    }

    pub fn ping(timestamp_ms: i64) -> Self {
        Self::neu(MessageKind::Ping, json!({ "timestamp": timestamp_ms }))
    }

    /// Pong-Antwort (spiegelt den Timestamp des Pings zurueck)
    pub fn pong(echo_timestamp: Value) -> Self {
        Self::neu(MessageKind::Pong, json!({ "timestamp": echo_timestamp }))
    }

    /// Topic der Nachricht: `topic`-Feld, sonst `data.channel`
    pub fn topic_name(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .or_else(|| self.data.get("channel").and_then(Value::as_str))
    }

    /// Textfeld `data.message` (Fehler- und Ablehnungsgruende)
    pub fn data_message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    /// Serialisiert die Nachricht als JSON-Bytes (Klartext fuer `seal`)
    pub fn to_json_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialisiert eine Nachricht aus JSON-Bytes
    pub fn from_json_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steuerungs_typen_werden_erkannt() {
        for (name, kind) in [
            ("authenticate", MessageKind::Authenticate),
            ("auth_success", MessageKind::AuthSuccess),
            ("auth_failure", MessageKind::AuthFailure),
            ("ack", MessageKind::Ack),
            ("permission_denied", MessageKind::PermissionDenied),
        ] {
            assert_eq!(MessageKind::from(name), kind);
            assert_eq!(kind.as_str(), name);
            assert!(kind.ist_steuerung());
        }
    }

    #[test]
    fn unbekannter_typ_ist_anwendung() {
        let kind = MessageKind::from("trip_update");
        assert_eq!(kind, MessageKind::Anwendung("trip_update".into()));
        assert!(!kind.ist_steuerung());
        assert_eq!(String::from(kind), "trip_update");
    }

    #[test]
    fn ack_wire_form() {
        let json = r#"{"type":"ack","messageId":"m-1"}"#;
        let msg = Message::from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(msg.kind, MessageKind::Ack);
        assert_eq!(msg.message_id, Some(MessageId::from("m-1")));
        assert!(msg.data.is_null());
    }

    #[test]
    fn optionale_felder_werden_weggelassen() {
        let msg = Message::neu("notification", Value::Null);
        let json = String::from_utf8(msg.to_json_bytes().unwrap()).unwrap();
        assert_eq!(json, r#"{"type":"notification"}"#);
    }

    #[test]
    fn authenticate_traegt_token_und_berechtigungen() {
        let perms = vec!["alerts".to_string(), "trips".to_string()];
        let msg = Message::authenticate("tok", &perms, 1_700_000_000_000);
        assert_eq!(msg.kind, MessageKind::Authenticate);
        assert_eq!(msg.data["token"], "tok");
        assert_eq!(msg.data["permissions"][1], "trips");
        assert_eq!(msg.data["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn topic_name_faellt_auf_data_channel_zurueck() {
        let json = r#"{"type":"subscribed","data":{"channel":"alerts"}}"#;
        let msg = Message::from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(msg.topic_name(), Some("alerts"));

        let msg = Message::subscribe("trips");
        assert_eq!(msg.topic.as_deref(), Some("trips"));
        assert_eq!(msg.topic_name(), Some("trips"));
    }

    #[test]
    fn fehlender_typ_schlaegt_fehl() {
        let result = Message::from_json_bytes(br#"{"data":{}}"#);
        assert!(result.is_err());
    }
}
