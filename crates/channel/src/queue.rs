//! Warteschlange fuer Nachrichten vor der Authentifizierung
//!
//! Solange der Kanal nicht authentifiziert ist, landen ausgehende Nachrichten
//! hier und werden nach `auth_success` in Einfuege-Reihenfolge nachgeholt.
//! Die Queue lebt nur im Speicher und wird bei jedem Trennen geleert.

use secwire_protocol::Message;
use std::collections::VecDeque;

/// FIFO-Warteschlange fuer ausstehende Nachrichten
#[derive(Debug, Default)]
pub struct MessageQueue {
    eintraege: VecDeque<Message>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Haengt eine Nachricht hinten an
    pub fn einreihen(&mut self, message: Message) {
        self.eintraege.push_back(message);
    }

    /// Entnimmt alle Nachrichten in Einfuege-Reihenfolge
    ///
    /// Die Queue ist danach leer.
    pub fn entnehmen(&mut self) -> Vec<Message> {
        self.eintraege.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }

    pub fn leeren(&mut self) {
        self.eintraege.clear();
    }
}
