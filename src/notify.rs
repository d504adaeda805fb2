// src/notify.rs
//! Status messages sent over the secondary serial channel

use crate::gps::data::Position;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A status line for the notification channel
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Started,
    Position { latitude: f64, longitude: f64 },
    /// No position after averaging several samples
    NoReliableFix,
    /// No position in single-shot mode
    NoSignal,
    Arrived(String),
}

impl From<&Position> for Notification {
    fn from(pos: &Position) -> Self {
        Notification::Position {
            latitude: pos.latitude,
            longitude: pos.longitude,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Started => writeln!(f, "GPS iniciado."),
            Notification::Position { latitude, longitude } => {
                writeln!(f, "Lat: {:.6}, Lon: {:.6}", latitude, longitude)
            }
            Notification::NoReliableFix => writeln!(f, "Sem fix GPS confiável."),
            Notification::NoSignal => writeln!(f, "Sem sinal GPS"),
            Notification::Arrived(place) => writeln!(f, "Você chegou perto de: {}", place),
        }
    }
}

/// Writes notifications to a sink. Write failures are logged and dropped.
pub struct Notifier<W> {
    sink: W,
    failed_writes: usize,
}

impl<W: AsyncWrite + Unpin> Notifier<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            failed_writes: 0,
        }
    }

    pub async fn send(&mut self, notification: &Notification) {
        let text = notification.to_string();
        log::info!("{}", text.trim_end());

        if let Err(e) = self.write_text(&text).await {
            self.failed_writes += 1;
            log::warn!("Failed to send notification: {}", e);
        }
    }

    async fn write_text(&mut self, text: &str) -> std::io::Result<()> {
        self.sink.write_all(text.as_bytes()).await?;
        self.sink.flush().await
    }

    /// Number of notifications that could not be written
    pub fn failed_writes(&self) -> usize {
        self.failed_writes
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}
