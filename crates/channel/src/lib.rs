//! # secwire-channel
//!
//! Sicherer, authentifizierter Nachrichtenkanal ueber einem austauschbaren
//! Transport.
//!
//! ## Module
//! - `channel` - Zustandsmaschine (`SecureChannel`)
//! - `config` - Kanal-Konfiguration
//! - `events` - Events und Listener-Registry
//! - `queue` - Warteschlange vor der Authentifizierung
//! - `timeout` - Ack-Fristen
//! - `subscription` - Erlaubte und bestaetigte Topics
//! - `transport` - Transport-Trait und TCP-Implementierung
//! - `state` - Zustand, Status-Snapshot, Sende-Ergebnisse
//! - `error` - Fehlertypen

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod queue;
pub mod state;
pub mod subscription;
pub mod timeout;
pub mod transport;

pub use channel::SecureChannel;
pub use config::ChannelConfig;
pub use error::{ChannelError, ChannelResult};
pub use events::{ChannelEvent, EventKind, ListenerId};
pub use state::{ChannelState, ChannelStatus, SendOutcome, SubscribeOutcome};
pub use transport::{TcpTransport, Transport, TransportEvent};
