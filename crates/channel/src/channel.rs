//! SecureChannel – Zustandsmaschine des sicheren Kanals
//!
//! Verbindet Transport, Krypto-Engine, Queue, Ack-Fristen und Abonnements.
//!
//! ## Ablauf
//! 1. `connect()` importiert das Secret und oeffnet den Transport
//! 2. `Opened` vom Transport -> `Connected`, Authentifizierungs-Anfrage geht raus
//! 3. `auth_success` -> `Authenticated`, Queue wird in Reihenfolge nachgeholt
//! 4. Jede gesendete Nachricht bekommt eine Ack-Frist
//!
//! Eingehende Ereignisse werden entweder direkt ueber
//! `handle_transport_event()` eingespeist oder von `process_next()` / `run()`
//! vom Transport gelesen. Listener laufen synchron im selben Aufruf.

use bytes::Bytes;
use secwire_crypto::CryptoEngine;
use secwire_protocol::{jetzt_ms, Envelope, Message, MessageId, MessageKind};
use serde_json::Value;
use std::time::Instant;

use crate::config::ChannelConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::events::{ChannelEvent, EventKind, ListenerId, ListenerRegistry};
use crate::queue::MessageQueue;
use crate::state::{ChannelState, ChannelStatus, SendOutcome, SubscribeOutcome};
use crate::subscription::SubscriptionManager;
use crate::timeout::TimeoutTracker;
use crate::transport::{Transport, TransportEvent};

/// Ergebnis eines Schritts der Ereignisschleife
enum Schritt {
    Transport(Option<TransportEvent>),
    Frist(Instant),
}

/// Wie eine Nachricht uebertragen wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Versandart {
    /// Groessenpruefung und Ack-Frist
    Normal,
    /// Authentifizierungs-Anfrage: Ack-Frist, aber keine Groessenpruefung
    Handshake,
    /// Direkte Antwort (Pong): Groessenpruefung, keine Ack-Frist
    Antwort,
}

/// Ein sicherer Kanal ueber einem Transport `T`
pub struct SecureChannel<T: Transport> {
    config: ChannelConfig,
    transport: T,
    state: ChannelState,
    /// Neu pro Verbindungsversuch, `None` solange getrennt
    engine: Option<CryptoEngine>,
    queue: MessageQueue,
    timeouts: TimeoutTracker,
    subscriptions: SubscriptionManager,
    listeners: ListenerRegistry,
    /// ID der laufenden Authentifizierungs-Anfrage
    auth_anfrage: Option<MessageId>,
}

impl<T: Transport> std::fmt::Debug for SecureChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureChannel")
            .field("url", &self.config.url)
            .field("state", &self.state)
            .field("queue", &self.queue.len())
            .field("timeouts", &self.timeouts.len())
            .field("subscriptions", &self.subscriptions.aktive())
            .finish()
    }
}

impl<T: Transport> SecureChannel<T> {
    /// Erstellt einen getrennten Kanal
    pub fn neu(config: ChannelConfig, transport: T) -> ChannelResult<Self> {
        config.pruefen()?;
        let subscriptions = SubscriptionManager::new(config.erlaubte_topics.clone());
        Ok(Self {
            config,
            transport,
            state: ChannelState::Disconnected,
            engine: None,
            queue: MessageQueue::new(),
            timeouts: TimeoutTracker::new(),
            subscriptions,
            listeners: ListenerRegistry::new(),
            auth_anfrage: None,
        })
    }

    // -----------------------------------------------------------------------
    // Zugriff
    // -----------------------------------------------------------------------

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            connected: self.state.ist_verbunden(),
            authenticated: self.state == ChannelState::Authenticated,
            queued_count: self.queue.len(),
            pending_timeout_count: self.timeouts.len(),
        }
    }

    /// Vom Server bestaetigte Topics
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.aktive()
    }

    /// Frueheste ausstehende Ack-Frist
    pub fn naechste_frist(&self) -> Option<Instant> {
        self.timeouts.naechste_frist()
    }

    // -----------------------------------------------------------------------
    // Listener
    // -----------------------------------------------------------------------

    pub fn on<F>(&mut self, art: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&ChannelEvent) + Send + 'static,
    {
        self.listeners.on(art, listener)
    }

    /// Listener fuer Anwendungsnachrichten eines Topics
    pub fn on_topic<F>(&mut self, topic: impl Into<String>, listener: F) -> ListenerId
    where
        F: FnMut(&ChannelEvent) + Send + 'static,
    {
        self.listeners.on_topic(topic, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    fn emit(&mut self, event: ChannelEvent) {
        tracing::trace!(event = %event.kind(), "Event");
        self.listeners.emit(&event);
    }

    fn fehler_melden(&mut self, grund: impl Into<String>) {
        self.emit(ChannelEvent::Error {
            grund: grund.into(),
        });
    }

    // -----------------------------------------------------------------------
    // Verbindung
    // -----------------------------------------------------------------------

    /// Baut die Verbindung auf
    ///
    /// Schlaegt der Schluessel-Import fehl, bleibt der Kanal `Disconnected`,
    /// ein `error`-Event wird ausgeloest und der Fehler zurueckgegeben.
    pub async fn connect(&mut self) -> ChannelResult<()> {
        if self.state != ChannelState::Disconnected {
            return Err(ChannelError::BereitsVerbunden);
        }

        let mut engine = CryptoEngine::neu(self.config.algorithmus, &self.config.token);
        if let Err(e) = engine.derive_key(&self.config.schluessel) {
            tracing::error!(fehler = %e, "Schluessel-Import fehlgeschlagen");
            self.fehler_melden(format!("Schluessel-Import fehlgeschlagen: {e}"));
            return Err(e.into());
        }

        if let Err(e) = self.transport.open(&self.config.url).await {
            tracing::error!(url = %self.config.url, fehler = %e, "Transport konnte nicht geoeffnet werden");
            self.fehler_melden(format!("Verbindungsaufbau fehlgeschlagen: {e}"));
            return Err(e.into());
        }

        self.engine = Some(engine);
        self.state = ChannelState::Connecting;
        tracing::info!(
            url = %self.config.url,
            algorithmus = %self.config.algorithmus,
            "Verbindungsaufbau gestartet"
        );
        Ok(())
    }

    /// Trennt die Verbindung (idempotent)
    ///
    /// Verwirft Queue, Ack-Fristen und Abonnements ohne Timeout-Events.
    pub async fn disconnect(&mut self) {
        let war_offen = self.state != ChannelState::Disconnected;
        if war_offen {
            self.transport.close().await;
        }
        self.zuruecksetzen();

        if war_offen {
            tracing::info!("Verbindung lokal getrennt");
            self.emit(ChannelEvent::Disconnected {
                grund: "lokal getrennt".into(),
            });
        }
    }

    fn zuruecksetzen(&mut self) {
        self.state = ChannelState::Disconnected;
        self.engine = None;
        self.auth_anfrage = None;
        self.queue.leeren();
        self.timeouts.leeren();
        self.subscriptions.leeren();
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    /// Sendet eine Nachricht oder reiht sie ein
    ///
    /// Vor der Authentifizierung wird nur eingereiht. Danach bekommt die
    /// Nachricht eine ID (falls keine gesetzt ist), wird auf ihre Groesse
    /// geprueft, versiegelt, gesendet und mit einer Ack-Frist versehen.
    pub async fn send(&mut self, message: Message) -> ChannelResult<SendOutcome> {
        if self.state != ChannelState::Authenticated {
            tracing::debug!(
                kind = %message.kind,
                state = ?self.state,
                "Nicht authentifiziert, Nachricht eingereiht"
            );
            self.queue.einreihen(message);
            return Ok(SendOutcome::Eingereiht);
        }

        let id = self.uebertragen_gemeldet(message, Versandart::Normal).await?;
        Ok(SendOutcome::Gesendet(id))
    }

    /// Abonniert ein Topic
    ///
    /// Nicht erlaubte Topics werden lokal abgelehnt, ohne Netzwerkverkehr.
    pub async fn subscribe(&mut self, topic: &str) -> ChannelResult<SubscribeOutcome> {
        if !self.subscriptions.ist_erlaubt(topic) {
            tracing::warn!(topic = %topic, "Abonnement fuer nicht erlaubtes Topic abgelehnt");
            return Ok(SubscribeOutcome::NichtErlaubt);
        }
        let ergebnis = self.send(Message::subscribe(topic)).await?;
        Ok(SubscribeOutcome::Angefragt(ergebnis))
    }

    /// Meldet ein Topic ab (ohne lokale Pruefung)
    pub async fn unsubscribe(&mut self, topic: &str) -> ChannelResult<SendOutcome> {
        self.send(Message::unsubscribe(topic)).await
    }

    /// Sendet einen Keepalive-Ping
    pub async fn ping(&mut self) -> ChannelResult<SendOutcome> {
        self.send(Message::ping(jetzt_ms())).await
    }

    /// Versiegelt und sendet eine Nachricht ohne Zustandspruefung
    ///
    /// Das Groessenlimit gilt fuer alles ausser der Authentifizierungs-Anfrage,
    /// deren Laenge von Token und Berechtigungen abhaengt.
    async fn uebertragen(&mut self, mut message: Message, art: Versandart) -> ChannelResult<MessageId> {
        let id = message.message_id.get_or_insert_with(MessageId::neu).clone();

        let klartext = message.to_json_bytes()?;
        if art != Versandart::Handshake && klartext.len() > self.config.max_nachrichten_bytes {
            return Err(ChannelError::NachrichtZuGross {
                groesse: klartext.len(),
                maximum: self.config.max_nachrichten_bytes,
            });
        }

        let engine = self.engine.as_ref().ok_or(ChannelError::NichtVerbunden)?;
        let envelope = engine.seal(&klartext, jetzt_ms())?;
        let frame = Bytes::from(envelope.to_json()?);

        self.transport.send(frame).await?;

        if art != Versandart::Antwort {
            self.timeouts
                .register(id.clone(), Instant::now() + self.config.ack_timeout());
        }
        tracing::trace!(
            message_id = %id,
            kind = %message.kind,
            bytes = klartext.len(),
            "Nachricht gesendet"
        );
        Ok(id)
    }

    /// Wie `uebertragen`, meldet Transport- und Kryptofehler zusaetzlich als Event
    async fn uebertragen_gemeldet(&mut self, message: Message, art: Versandart) -> ChannelResult<MessageId> {
        match self.uebertragen(message, art).await {
            Ok(id) => Ok(id),
            Err(e) => {
                if !matches!(e, ChannelError::NachrichtZuGross { .. }) {
                    tracing::warn!(fehler = %e, "Senden fehlgeschlagen");
                    self.fehler_melden(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Sendet die eingereihten Nachrichten in Einfuege-Reihenfolge
    async fn queue_nachholen(&mut self) {
        let eintraege = self.queue.entnehmen();
        if eintraege.is_empty() {
            return;
        }
        tracing::debug!(anzahl = eintraege.len(), "Queue wird nachgeholt");

        for message in eintraege {
            if let Err(e) = self.uebertragen_gemeldet(message, Versandart::Normal).await {
                if let ChannelError::NachrichtZuGross { .. } = e {
                    tracing::warn!(fehler = %e, "Eingereihte Nachricht verworfen");
                    self.fehler_melden(format!("Eingereihte Nachricht verworfen: {e}"));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Eingang
    // -----------------------------------------------------------------------

    /// Verarbeitet ein Transport-Ereignis
    pub async fn handle_transport_event(&mut self, ereignis: TransportEvent) {
        match ereignis {
            TransportEvent::Opened => self.geoeffnet().await,
            TransportEvent::Closed { grund } => self.geschlossen(grund),
            TransportEvent::Error(fehler) => {
                tracing::warn!(fehler = %fehler, "Transport-Fehler");
                self.fehler_melden(format!("Transport-Fehler: {fehler}"));
            }
            TransportEvent::Data(frame) => self.frame_verarbeiten(&frame).await,
        }
    }

    async fn geoeffnet(&mut self) {
        if self.state != ChannelState::Connecting {
            tracing::debug!(state = ?self.state, "Unerwartetes Opened ignoriert");
            return;
        }

        self.state = ChannelState::Connected;
        tracing::info!(url = %self.config.url, "Verbunden, Authentifizierung laeuft");
        self.emit(ChannelEvent::Connected);

        let anfrage = Message::authenticate(
            &self.config.token,
            &self.config.berechtigungen(),
            jetzt_ms(),
        );
        // Fehler wurden bereits als Event gemeldet
        if let Ok(id) = self.uebertragen_gemeldet(anfrage, Versandart::Handshake).await {
            self.auth_anfrage = Some(id);
        }
    }

    fn geschlossen(&mut self, grund: Option<String>) {
        if self.state == ChannelState::Disconnected {
            return;
        }
        let grund = grund.unwrap_or_else(|| "von der Gegenseite geschlossen".into());
        tracing::info!(grund = %grund, "Verbindung getrennt");
        self.zuruecksetzen();
        self.emit(ChannelEvent::Disconnected { grund });
    }

    async fn frame_verarbeiten(&mut self, frame: &[u8]) {
        if !self.state.ist_verbunden() {
            tracing::debug!(state = ?self.state, "Frame ausserhalb einer Verbindung verworfen");
            return;
        }

        let envelope = match Envelope::from_json_bytes(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(fehler = %e, "Ungueltiges Envelope");
                self.fehler_melden(format!("Ungueltiges Envelope: {e}"));
                return;
            }
        };

        if let Some(max_alter) = self.config.max_envelope_alter_ms {
            let alter = jetzt_ms().saturating_sub(envelope.timestamp).unsigned_abs();
            if alter > max_alter {
                tracing::warn!(alter_ms = alter, max_alter_ms = max_alter, "Envelope ausserhalb des Zeitfensters");
                self.fehler_melden(format!(
                    "Envelope ausserhalb des Zeitfensters: {alter} ms (Maximum: {max_alter} ms)"
                ));
                return;
            }
        }

        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let klartext = match engine.open(&envelope) {
            Ok(klartext) => klartext,
            Err(e) => {
                tracing::warn!(fehler = %e, "Envelope konnte nicht geoeffnet werden");
                self.fehler_melden(e.to_string());
                return;
            }
        };

        let message = match Message::from_json_bytes(&klartext) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(fehler = %e, "Ungueltige Nachricht");
                self.fehler_melden(format!("Ungueltige Nachricht: {e}"));
                return;
            }
        };

        tracing::trace!(kind = %message.kind, "Nachricht empfangen");
        self.emit(ChannelEvent::Message(message.clone()));
        self.nachricht_verarbeiten(message).await;
    }

    async fn nachricht_verarbeiten(&mut self, message: Message) {
        match message.kind {
            MessageKind::AuthSuccess => {
                self.auth_anfrage_erledigt();
                if self.state != ChannelState::Connected {
                    tracing::debug!(state = ?self.state, "auth_success ignoriert");
                    return;
                }
                self.state = ChannelState::Authenticated;
                tracing::info!("Authentifiziert");
                self.emit(ChannelEvent::Authenticated);
                self.queue_nachholen().await;
            }
            MessageKind::AuthFailure => {
                self.auth_anfrage_erledigt();
                let grund = message.data_message().map(str::to_string);
                tracing::warn!(grund = ?grund, "Authentifizierung abgelehnt");
                self.emit(ChannelEvent::AuthFailed { grund });
            }
            MessageKind::Ack => match &message.message_id {
                Some(id) => {
                    if self.timeouts.acknowledge(id) {
                        tracing::trace!(message_id = %id, "Ack");
                    } else {
                        tracing::debug!(message_id = %id, "Ack fuer unbekannte Nachricht");
                    }
                }
                None => tracing::debug!("Ack ohne messageId"),
            },
            MessageKind::PermissionDenied => {
                let topic = message.topic_name().map(str::to_string);
                let grund = message.data_message().map(str::to_string);
                tracing::warn!(topic = ?topic, grund = ?grund, "Berechtigung verweigert");
                self.emit(ChannelEvent::PermissionDenied { topic, grund });
            }
            MessageKind::Subscribed => {
                if let Some(topic) = message.topic_name().map(str::to_string) {
                    self.subscriptions.bestaetigen(&topic);
                    tracing::debug!(topic = %topic, "Abonniert");
                    self.emit(ChannelEvent::Subscribed { topic });
                }
            }
            MessageKind::Unsubscribed => {
                if let Some(topic) = message.topic_name().map(str::to_string) {
                    self.subscriptions.entfernen(&topic);
                    tracing::debug!(topic = %topic, "Abgemeldet");
                    self.emit(ChannelEvent::Unsubscribed { topic });
                }
            }
            MessageKind::Ping => {
                let echo = message.data.get("timestamp").cloned().unwrap_or(Value::Null);
                let _ = self.uebertragen_gemeldet(Message::pong(echo), Versandart::Antwort).await;
            }
            MessageKind::Pong => {
                tracing::trace!(timestamp = ?message.data.get("timestamp"), "Pong");
            }
            MessageKind::Error => {
                let grund = message
                    .data_message()
                    .unwrap_or("Unbekannter Fehler der Gegenseite")
                    .to_string();
                tracing::warn!(grund = %grund, "Fehlermeldung der Gegenseite");
                self.fehler_melden(grund);
            }
            MessageKind::Authenticate | MessageKind::Subscribe | MessageKind::Unsubscribe => {
                tracing::debug!(kind = %message.kind, "Ausgehender Nachrichtentyp empfangen, ignoriert");
            }
            MessageKind::Anwendung(_) => {
                if let Some(topic) = message.topic_name().map(str::to_string) {
                    self.emit(ChannelEvent::Topic { topic, message });
                }
            }
        }
    }

    fn auth_anfrage_erledigt(&mut self) {
        if let Some(id) = self.auth_anfrage.take() {
            self.timeouts.acknowledge(&id);
        }
    }

    // -----------------------------------------------------------------------
    // Fristen und Ereignisschleife
    // -----------------------------------------------------------------------

    /// Meldet alle bis `jetzt` abgelaufenen Ack-Fristen
    ///
    /// Jeder Eintrag wird genau einmal gemeldet und danach entfernt.
    pub fn poll_timeouts(&mut self, jetzt: Instant) -> usize {
        let abgelaufen = self.timeouts.abgelaufene(jetzt);
        let anzahl = abgelaufen.len();
        for message_id in abgelaufen {
            if self.auth_anfrage.as_ref() == Some(&message_id) {
                self.auth_anfrage = None;
            }
            tracing::warn!(message_id = %message_id, "Kein Ack innerhalb der Frist");
            self.emit(ChannelEvent::MessageTimeout { message_id });
        }
        anzahl
    }

    /// Wartet auf das naechste Transport-Ereignis oder die naechste Frist
    ///
    /// Gibt `false` zurueck wenn der Transport keine Ereignisse mehr liefert.
    pub async fn process_next(&mut self) -> bool {
        let frist = self.timeouts.naechste_frist();
        let schritt = tokio::select! {
            ereignis = self.transport.next_event() => Schritt::Transport(ereignis),
            faellig = warten_bis(frist) => Schritt::Frist(faellig),
        };

        match schritt {
            Schritt::Transport(Some(ereignis)) => {
                self.handle_transport_event(ereignis).await;
                true
            }
            Schritt::Transport(None) => false,
            Schritt::Frist(faellig) => {
                self.poll_timeouts(Instant::now().max(faellig));
                true
            }
        }
    }

    /// Verarbeitet Ereignisse bis der Transport endet
    pub async fn run(&mut self) {
        while self.process_next().await {}
        tracing::debug!("Ereignisschleife beendet");
    }
}

/// Schlaeft bis zur Frist und gibt sie zurueck; ohne Frist fuer immer
async fn warten_bis(frist: Option<Instant>) -> Instant {
    match frist {
        Some(frist) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(frist)).await;
            frist
        }
        None => std::future::pending().await,
    }
}
