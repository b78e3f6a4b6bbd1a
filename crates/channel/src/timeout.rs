//! Ack-Fristen fuer gesendete Nachrichten
//!
//! Jede gesendete Nachricht bekommt eine Frist. Kommt bis dahin kein `ack`
//! mit ihrer ID, meldet `abgelaufene()` sie genau einmal und der Eintrag
//! verschwindet. Es gibt keine automatische Wiederholung.
//!
//! Die aktuelle Zeit wird immer explizit uebergeben, damit der Tracker
//! ohne echte Uhr testbar bleibt.

use secwire_protocol::MessageId;
use std::collections::HashMap;
use std::time::Instant;

/// Verwaltet ausstehende Ack-Fristen
#[derive(Debug, Default)]
pub struct TimeoutTracker {
    fristen: HashMap<MessageId, Instant>,
}

impl TimeoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registriert eine Frist
    ///
    /// Eine bestehende Frist mit gleicher ID wird ersetzt und nie gemeldet;
    /// gibt in dem Fall `true` zurueck.
    pub fn register(&mut self, id: MessageId, frist: Instant) -> bool {
        let ersetzt = self.fristen.insert(id.clone(), frist).is_some();
        if ersetzt {
            tracing::warn!(message_id = %id, "MessageId wiederverwendet, fruehere Ack-Frist ersetzt");
        }
        ersetzt
    }

    /// Entfernt den Eintrag fuer eine bestaetigte Nachricht
    ///
    /// Gibt `false` zurueck wenn die ID unbekannt war (verspaetetes oder
    /// doppeltes Ack).
    pub fn acknowledge(&mut self, id: &MessageId) -> bool {
        self.fristen.remove(id).is_some()
    }

    /// Entfernt und liefert alle Eintraege deren Frist bis `jetzt` abgelaufen ist
    ///
    /// Sortiert nach Frist, aelteste zuerst.
    pub fn abgelaufene(&mut self, jetzt: Instant) -> Vec<MessageId> {
        let mut faellig: Vec<(MessageId, Instant)> = self
            .fristen
            .iter()
            .filter(|(_, frist)| **frist <= jetzt)
            .map(|(id, frist)| (id.clone(), *frist))
            .collect();
        faellig.sort_by_key(|(_, frist)| *frist);

        for (id, _) in &faellig {
            self.fristen.remove(id);
        }
        faellig.into_iter().map(|(id, _)| id).collect()
    }

    /// Frueheste ausstehende Frist
    pub fn naechste_frist(&self) -> Option<Instant> {
        self.fristen.values().min().copied()
    }

    pub fn enthaelt(&self, id: &MessageId) -> bool {
        self.fristen.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fristen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fristen.is_empty()
    }

    /// Verwirft alle Fristen ohne sie zu melden
    pub fn leeren(&mut self) {
        self.fristen.clear();
    }
}
