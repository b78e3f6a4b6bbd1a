//! Kanal-Events und Listener-Registry
//!
//! Listener werden synchron aufgerufen, in Registrierungs-Reihenfolge,
//! waehrend der Kanal das ausloesende Ereignis verarbeitet. Fuer jedes
//! Topic gibt es zusaetzlich eigene Listener (`on_topic`), die nur
//! Anwendungsnachrichten dieses Topics sehen.

use secwire_protocol::{Message, MessageId};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Ein vom Kanal ausgeloestes Ereignis
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Transport ist offen, Handshake laeuft
    Connected,
    /// Verbindung getrennt (lokal oder von der Gegenseite)
    Disconnected { grund: String },
    /// Handshake erfolgreich
    Authenticated,
    /// Handshake abgelehnt, Kanal bleibt `Connected`
    AuthFailed { grund: Option<String> },
    /// Server hat eine Operation abgelehnt
    PermissionDenied {
        topic: Option<String>,
        grund: Option<String>,
    },
    /// Jede erfolgreich entschluesselte Nachricht
    Message(Message),
    /// Fuer eine gesendete Nachricht kam kein Ack
    MessageTimeout { message_id: MessageId },
    /// Transport-, Krypto- oder Protokollfehler
    Error { grund: String },
    Subscribed { topic: String },
    Unsubscribed { topic: String },
    /// Anwendungsnachricht mit Topic
    Topic { topic: String, message: Message },
}

/// Art eines Events (Schluessel fuer die Registrierung)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Authenticated,
    AuthFailed,
    PermissionDenied,
    Message,
    MessageTimeout,
    Error,
    Subscribed,
    Unsubscribed,
    Topic,
}

impl EventKind {
    /// Alle Arten (fuer Listener, die alles sehen wollen)
    pub const ALLE: [EventKind; 11] = [
        EventKind::Connected,
        EventKind::Disconnected,
        EventKind::Authenticated,
        EventKind::AuthFailed,
        EventKind::PermissionDenied,
        EventKind::Message,
        EventKind::MessageTimeout,
        EventKind::Error,
        EventKind::Subscribed,
        EventKind::Unsubscribed,
        EventKind::Topic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Authenticated => "authenticated",
            Self::AuthFailed => "authFailed",
            Self::PermissionDenied => "permissionDenied",
            Self::Message => "message",
            Self::MessageTimeout => "messageTimeout",
            Self::Error => "error",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Topic => "topic",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Disconnected { .. } => EventKind::Disconnected,
            Self::Authenticated => EventKind::Authenticated,
            Self::AuthFailed { .. } => EventKind::AuthFailed,
            Self::PermissionDenied { .. } => EventKind::PermissionDenied,
            Self::Message(_) => EventKind::Message,
            Self::MessageTimeout { .. } => EventKind::MessageTimeout,
            Self::Error { .. } => EventKind::Error,
            Self::Subscribed { .. } => EventKind::Subscribed,
            Self::Unsubscribed { .. } => EventKind::Unsubscribed,
            Self::Topic { .. } => EventKind::Topic,
        }
    }
}

// ---------------------------------------------------------------------------
// ListenerRegistry
// ---------------------------------------------------------------------------

/// Handle zum Abmelden eines Listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ChannelEvent) + Send>;

/// Registrierte Listener nach Event-Art und nach Topic
#[derive(Default)]
pub struct ListenerRegistry {
    naechste_id: u64,
    nach_art: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    nach_topic: HashMap<String, Vec<(ListenerId, Listener)>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("arten", &self.nach_art.len())
            .field("topics", &self.nach_topic.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_vergeben(&mut self) -> ListenerId {
        self.naechste_id += 1;
        ListenerId(self.naechste_id)
    }

    /// Registriert einen Listener fuer eine Event-Art
    pub fn on<F>(&mut self, art: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&ChannelEvent) + Send + 'static,
    {
        let id = self.id_vergeben();
        self.nach_art
            .entry(art)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Registriert einen Listener fuer Nachrichten eines Topics
    pub fn on_topic<F>(&mut self, topic: impl Into<String>, listener: F) -> ListenerId
    where
        F: FnMut(&ChannelEvent) + Send + 'static,
    {
        let id = self.id_vergeben();
        self.nach_topic
            .entry(topic.into())
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Meldet einen Listener ab
    pub fn off(&mut self, id: ListenerId) -> bool {
        let listen = self
            .nach_art
            .values_mut()
            .chain(self.nach_topic.values_mut());
        for liste in listen {
            if let Some(pos) = liste.iter().position(|(lid, _)| *lid == id) {
                drop(liste.remove(pos));
                return true;
            }
        }
        false
    }

    pub fn anzahl(&self) -> usize {
        self.nach_art.values().map(Vec::len).sum::<usize>()
            + self.nach_topic.values().map(Vec::len).sum::<usize>()
    }

    /// Ruft alle passenden Listener synchron auf
    pub fn emit(&mut self, event: &ChannelEvent) {
        if let Some(liste) = self.nach_art.get_mut(&event.kind()) {
            for (_, listener) in liste.iter_mut() {
                listener(event);
            }
        }
        if let ChannelEvent::Topic { topic, .. } = event {
            if let Some(liste) = self.nach_topic.get_mut(topic) {
                for (_, listener) in liste.iter_mut() {
                    listener(event);
                }
            }
        }
    }
}
