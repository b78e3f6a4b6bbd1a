//! Identifikationstypen fuer Nachrichten
//!
//! Newtype-Pattern wie bei allen IDs: eine `MessageId` kann nicht mit einem
//! beliebigen String (z.B. einem Topic-Namen) verwechselt werden.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Nachrichten-ID (Korrelation zwischen Nachricht und Ack)
///
/// Vom Aufrufer vergeben oder beim Senden als UUID v4 erzeugt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Erstellt eine neue zufaellige MessageId (UUID v4)
    pub fn neu() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::neu()
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aktueller Unix-Timestamp in Millisekunden
pub fn jetzt_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_eindeutig() {
        let a = MessageId::neu();
        let b = MessageId::neu();
        assert_ne!(a, b, "Zwei neue MessageIds muessen verschieden sein");
    }

    #[test]
    fn message_id_ist_transparent_serialisiert() {
        let id = MessageId::from("msg-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"msg-42\"");
        let decoded: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, id);
    }
}
