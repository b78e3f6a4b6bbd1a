//! secwire-protocol – Nachrichten und Wire-Format
//!
//! Dieses Crate definiert das Nachrichtenmodell (Typ-Tag, Korrelations-ID,
//! Topic, Payload), das JSON-Envelope fuer versiegelte Nachrichten und den
//! Frame-Codec fuer Stream-Transporte.

pub mod envelope;
pub mod error;
pub mod message;
pub mod types;
pub mod wire;

pub use envelope::Envelope;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Message, MessageKind};
pub use types::{jetzt_ms, MessageId};
