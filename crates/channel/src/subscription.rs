//! Topic-Abonnements
//!
//! Haelt die Menge der erlaubten Topics (aus der Konfiguration, fest fuer die
//! Lebensdauer des Kanals) und die vom Server bestaetigten Abonnements.
//! Die lokale Pruefung ist nur eine Vorfilterung; die eigentliche
//! Durchsetzung liegt beim Server.

use std::collections::BTreeSet;

/// Verwaltet erlaubte und bestaetigte Topics
#[derive(Debug, Clone, Default)]
pub struct SubscriptionManager {
    erlaubt: BTreeSet<String>,
    aktiv: BTreeSet<String>,
}

impl SubscriptionManager {
    pub fn new(erlaubt: BTreeSet<String>) -> Self {
        Self {
            erlaubt,
            aktiv: BTreeSet::new(),
        }
    }

    /// Ob ein Topic abonniert werden darf (exakter Vergleich)
    pub fn ist_erlaubt(&self, topic: &str) -> bool {
        self.erlaubt.contains(topic)
    }

    /// Vermerkt ein vom Server bestaetigtes Abonnement
    ///
    /// Gibt `false` zurueck wenn das Topic bereits aktiv war.
    pub fn bestaetigen(&mut self, topic: &str) -> bool {
        self.aktiv.insert(topic.to_string())
    }

    /// Entfernt ein Abonnement (Bestaetigung der Abmeldung)
    pub fn entfernen(&mut self, topic: &str) -> bool {
        self.aktiv.remove(topic)
    }

    pub fn ist_aktiv(&self, topic: &str) -> bool {
        self.aktiv.contains(topic)
    }

    /// Alle bestaetigten Topics, sortiert
    pub fn aktive(&self) -> Vec<String> {
        self.aktiv.iter().cloned().collect()
    }

    pub fn erlaubte(&self) -> &BTreeSet<String> {
        &self.erlaubt
    }

    /// Verwirft alle bestaetigten Abonnements (nach dem Trennen)
    pub fn leeren(&mut self) {
        self.aktiv.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SubscriptionManager {
        SubscriptionManager::new(["trips".to_string(), "alerts".to_string()].into())
    }

    #[test]
    fn erlaubnis_ist_exakter_vergleich() {
        let m = manager();
        assert!(m.ist_erlaubt("trips"));
        assert!(!m.ist_erlaubt("Trips"));
        assert!(!m.ist_erlaubt("trips/42"));
        assert!(!m.ist_erlaubt(""));
    }

    #[test]
    fn bestaetigen_und_entfernen() {
        let mut m = manager();
        assert!(m.bestaetigen("trips"));
        assert!(!m.bestaetigen("trips"));
        assert!(m.ist_aktiv("trips"));
        assert_eq!(m.aktive(), vec!["trips"]);

        assert!(m.entfernen("trips"));
        assert!(!m.entfernen("trips"));
        assert!(m.aktive().is_empty());
    }

    #[test]
    fn leeren_behaelt_erlaubte_topics() {
        let mut m = manager();
        m.bestaetigen("alerts");
        m.leeren();
        assert!(m.aktive().is_empty());
        assert_eq!(m.erlaubte().len(), 2);
    }
}
