//! Verbindungszustand und Status-Snapshot

use serde::Serialize;

/// Zustand des Kanals
///
/// ```text
/// Disconnected --connect()--> Connecting --open--> Connected
///      ^                                              |
///      |                                        auth_success
///      +---- disconnect() / close ----- Authenticated <-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
}

impl ChannelState {
    /// Transport offen (mit oder ohne Authentifizierung)
    pub fn ist_verbunden(&self) -> bool {
        matches!(self, Self::Connected | Self::Authenticated)
    }
}

/// Snapshot fuer `status()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    pub connected: bool,
    pub authenticated: bool,
    pub queued_count: usize,
    pub pending_timeout_count: usize,
}

/// Ergebnis von `send()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Noch nicht authentifiziert, Nachricht wartet in der Queue
    Eingereiht,
    /// Versiegelt und an den Transport uebergeben
    Gesendet(secwire_protocol::MessageId),
}

/// Ergebnis von `subscribe()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Topic ist nicht erlaubt, es wurde nichts gesendet
    NichtErlaubt,
    /// Anfrage gesendet oder eingereiht
    Angefragt(SendOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbunden_umfasst_authentifiziert() {
        assert!(!ChannelState::Disconnected.ist_verbunden());
        assert!(!ChannelState::Connecting.ist_verbunden());
        assert!(ChannelState::Connected.ist_verbunden());
        assert!(ChannelState::Authenticated.ist_verbunden());
    }

    #[test]
    fn status_serialisiert_camel_case() {
        let status = ChannelStatus {
            connected: true,
            authenticated: false,
            queued_count: 2,
            pending_timeout_count: 1,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["queuedCount"], 2);
        assert_eq!(json["pendingTimeoutCount"], 1);
    }
}
