//! Transport-Abstraktion
//!
//! Der Kanal spricht nur mit dem `Transport`-Trait. Ein Transport liefert
//! ganze Frames (ein Envelope pro Frame) und meldet Oeffnen, Schliessen und
//! Fehler als `TransportEvent`. `TcpTransport` ist die mitgelieferte
//! Implementierung mit laengenpraefixierten Frames.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use secwire_protocol::wire::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
use std::collections::VecDeque;
use std::io;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// Ereignis eines Transports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Verbindung steht
    Opened,
    /// Verbindung wurde geschlossen
    Closed { grund: Option<String> },
    /// Fehler ohne Verbindungsende
    Error(String),
    /// Ein vollstaendiger Frame
    Data(Bytes),
}

/// Bidirektionaler, frame-orientierter Transport
#[async_trait]
pub trait Transport: Send {
    /// Beginnt den Verbindungsaufbau; `Opened` folgt ueber `next_event`
    async fn open(&mut self, url: &str) -> io::Result<()>;

    /// Sendet einen Frame
    async fn send(&mut self, frame: Bytes) -> io::Result<()>;

    /// Schliesst die Verbindung (idempotent)
    async fn close(&mut self);

    /// Naechstes Ereignis; `None` wenn keine weiteren Ereignisse kommen
    ///
    /// Muss abbruchsicher sein, da der Kanal es in `select!` verwendet.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

// ---------------------------------------------------------------------------
// TcpTransport
// ---------------------------------------------------------------------------

/// TCP-Transport mit `FrameCodec` (u32-Laengenpraefix)
///
/// Akzeptiert `tcp://host:port` oder `host:port`.
#[derive(Debug)]
pub struct TcpTransport {
    framed: Option<Framed<TcpStream, FrameCodec>>,
    ausstehend: VecDeque<TransportEvent>,
    max_frame_size: usize,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            framed: None,
            ausstehend: VecDeque::new(),
            max_frame_size,
        }
    }

    pub fn ist_offen(&self) -> bool {
        self.framed.is_some()
    }
}

/// Extrahiert `host:port` aus der Kanal-URL
pub fn tcp_adresse(url: &str) -> io::Result<&str> {
    let adresse = url.strip_prefix("tcp://").unwrap_or(url);
    if adresse.is_empty() || !adresse.contains(':') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Ungueltige TCP-Adresse: '{url}'"),
        ));
    }
    Ok(adresse.trim_end_matches('/'))
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self, url: &str) -> io::Result<()> {
        let adresse = tcp_adresse(url)?;
        let stream = TcpStream::connect(adresse).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(adresse = %adresse, "TCP-Verbindung aufgebaut");

        self.framed = Some(Framed::new(
            stream,
            FrameCodec::with_max_size(self.max_frame_size),
        ));
        self.ausstehend.push_back(TransportEvent::Opened);
        Ok(())
    }

    async fn send(&mut self, frame: Bytes) -> io::Result<()> {
        let framed = self.framed.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "Transport ist nicht offen")
        })?;
        framed.send(frame).await
    }

    async fn close(&mut self) {
        if let Some(mut framed) = self.framed.take() {
            if let Err(e) = SinkExt::<Bytes>::close(&mut framed).await {
                tracing::debug!(fehler = %e, "Fehler beim Schliessen ignoriert");
            }
        }
        self.ausstehend.clear();
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if let Some(ereignis) = self.ausstehend.pop_front() {
            return Some(ereignis);
        }

        let framed = self.framed.as_mut()?;
        match framed.next().await {
            Some(Ok(frame)) => Some(TransportEvent::Data(frame)),
            Some(Err(e)) => {
                // Nach einem Decode-Fehler ist der Stream nicht mehr synchron
                tracing::warn!(fehler = %e, "Frame-Lesefehler");
                self.framed = None;
                self.ausstehend.push_back(TransportEvent::Closed {
                    grund: Some(e.to_string()),
                });
                Some(TransportEvent::Error(e.to_string()))
            }
            None => {
                self.framed = None;
                Some(TransportEvent::Closed { grund: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn adresse_aus_url() {
        assert_eq!(tcp_adresse("tcp://127.0.0.1:9900").unwrap(), "127.0.0.1:9900");
        assert_eq!(tcp_adresse("localhost:1").unwrap(), "localhost:1");
        assert_eq!(tcp_adresse("tcp://host:5/").unwrap(), "host:5");
        assert!(tcp_adresse("tcp://").is_err());
        assert!(tcp_adresse("nur-host").is_err());
    }

    #[tokio::test]
    async fn send_ohne_open_schlaegt_fehl() {
        let mut transport = TcpTransport::new();
        let err = transport.send(Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(transport.next_event().await.is_none());
    }

    #[tokio::test]
    async fn frames_ueber_echte_verbindung() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let adresse = listener.local_addr().unwrap();

        // Gegenstelle: Echo eines Frames, dann schliessen
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, FrameCodec::new());
            let frame = framed.next().await.unwrap().unwrap();
            framed.send(frame).await.unwrap();
        });

        let mut transport = TcpTransport::new();
        transport.open(&format!("tcp://{adresse}")).await.unwrap();
        assert_eq!(transport.next_event().await, Some(TransportEvent::Opened));

        transport.send(Bytes::from_static(b"hallo")).await.unwrap();
        assert_eq!(
            transport.next_event().await,
            Some(TransportEvent::Data(Bytes::from_static(b"hallo")))
        );

        server.await.unwrap();
        assert_eq!(
            transport.next_event().await,
            Some(TransportEvent::Closed { grund: None })
        );
        assert!(!transport.ist_offen());
        assert!(transport.next_event().await.is_none());
    }

    #[tokio::test]
    async fn open_auf_geschlossenen_port_schlaegt_fehl() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let adresse = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = TcpTransport::new();
        assert!(transport.open(&adresse.to_string()).await.is_err());
        assert!(!transport.ist_offen());
    }
}
