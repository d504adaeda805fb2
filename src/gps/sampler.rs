// src/gps/sampler.rs
//! Deadline-bounded fix collection and averaging

use super::{
    data::{Fix, Position},
    framer::SentenceFramer,
    nmea::{self, DecodeError},
};
use std::{collections::VecDeque, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    time::{sleep_until, timeout_at, Instant},
};

/// Back-off when the source reports end of stream or a read error
const IDLE_BACKOFF: Duration = Duration::from_millis(20);

const READ_CHUNK: usize = 128;

/// Sampling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
    pub sample_count: usize,
    pub attempt_timeout: Duration,
    pub total_timeout: Duration,
    pub attempt_pause: Duration,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            sample_count: 5,
            attempt_timeout: Duration::from_secs(3),
            total_timeout: Duration::from_secs(20),
            attempt_pause: Duration::from_millis(200),
        }
    }
}

/// Reads fixes from a raw NMEA byte source.
///
/// The framer and any sentences already split out of a read survive between
/// calls, so a line straddling two attempts is still decoded.
pub struct FixSampler<R> {
    source: R,
    framer: SentenceFramer,
    pending: VecDeque<String>,
    buf: [u8; READ_CHUNK],
    settings: SamplerSettings,
}

impl<R: AsyncRead + Unpin> FixSampler<R> {
    pub fn new(source: R, settings: SamplerSettings) -> Self {
        Self {
            source,
            framer: SentenceFramer::new(),
            pending: VecDeque::new(),
            buf: [0; READ_CHUNK],
            settings,
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Read until one valid fix is decoded or `deadline` passes
    pub async fn read_one_fix(&mut self, deadline: Instant) -> Option<Fix> {
        loop {
            while let Some(line) = self.pending.pop_front() {
                match nmea::classify(&line) {
                    Ok(fix) => return Some(fix),
                    Err(DecodeError::NotRmc) => {}
                    Err(e) if e.is_malformed() => log::debug!("Malformed RMC sentence ({}): {}", e, line),
                    Err(e) => log::debug!("Skipping RMC sentence: {}", e),
                }
            }

            if Instant::now() >= deadline {
                return None;
            }

            match timeout_at(deadline, self.source.read(&mut self.buf)).await {
                Err(_) => return None,
                Ok(Ok(0)) => {
                    log::trace!("GPS source at end of stream");
                    self.idle(deadline).await;
                }
                Ok(Ok(n)) => {
                    let lines = self.framer.feed_slice(&self.buf[..n]);
                    self.pending.extend(lines);
                }
                Ok(Err(e)) => {
                    log::warn!("Error reading from GPS source: {}", e);
                    self.idle(deadline).await;
                }
            }
        }
    }

    /// Collect up to `sample_count` fixes within `total_timeout` and average
    /// them. Returns `None` when no fix arrived in time.
    pub async fn get_filtered_position(
        &mut self,
        sample_count: usize,
        total_timeout: Duration,
    ) -> Option<Position> {
        let deadline = Instant::now() + total_timeout;
        let mut fixes = Vec::with_capacity(sample_count);

        while fixes.len() < sample_count && Instant::now() < deadline {
            let attempt_deadline = (Instant::now() + self.settings.attempt_timeout).min(deadline);

            match self.read_one_fix(attempt_deadline).await {
                Some(fix) => {
                    match fix.timestamp {
                        Some(ts) => log::info!(
                            "Valid fix: {:.6}, {:.6} at {}",
                            fix.latitude,
                            fix.longitude,
                            ts.format("%Y-%m-%d %H:%M:%S%.3f UTC")
                        ),
                        None => log::info!("Valid fix: {:.6}, {:.6}", fix.latitude, fix.longitude),
                    }
                    fixes.push(fix);
                }
                None => log::info!("No valid fix yet..."),
            }

            if fixes.len() < sample_count {
                let pause = (Instant::now() + self.settings.attempt_pause).min(deadline);
                sleep_until(pause).await;
            }
        }

        let position = Position::average(&fixes);
        match &position {
            Some(pos) => log::debug!(
                "Averaged {} fixes to {:.6}, {:.6}",
                pos.samples,
                pos.latitude,
                pos.longitude
            ),
            None => log::debug!("No fixes within {:?}", total_timeout),
        }
        position
    }

    /// Sample using the configured count and overall timeout
    pub async fn sample(&mut self) -> Option<Position> {
        let SamplerSettings {
            sample_count,
            total_timeout,
            ..
        } = self.settings;
        self.get_filtered_position(sample_count, total_timeout).await
    }

    async fn idle(&self, deadline: Instant) {
        sleep_until((Instant::now() + IDLE_BACKOFF).min(deadline)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };
    use tokio::io::{duplex, AsyncWriteExt, ReadBuf};

    /// Source whose every read fails, counting the attempts
    struct FailingSource {
        reads: usize,
    }

    impl AsyncRead for FailingSource {
        fn poll_read(mut self: Pin<&mut Self>, _: &mut Context<'_>, _: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            self.reads += 1;
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "receiver unplugged")))
        }
    }

    const FIX_1_1: &[u8] = b"$GPRMC,120000,A,0100.0000,N,00100.0000,E,0.0,0.0,191026,,*00\r\n";

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_returned_at_deadline() {
        let (mut tx, rx) = duplex(4096);
        for _ in 0..3 {
            tx.write_all(FIX_1_1).await.unwrap();
        }

        let mut sampler = FixSampler::new(rx, SamplerSettings::default());
        let start = Instant::now();
        let pos = sampler
            .get_filtered_position(5, Duration::from_secs(1))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!((pos.latitude, pos.longitude), (1.0, 1.0));
        assert_eq!(pos.samples, 3);
        assert!(elapsed >= Duration::from_millis(990), "returned early: {:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(1050), "overran deadline: {:?}", elapsed);

        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fix_returns_none() {
        let (_tx, rx) = duplex(64);
        let mut sampler = FixSampler::new(rx, SamplerSettings::default());

        let start = Instant::now();
        assert!(sampler.get_filtered_position(5, Duration::from_secs(20)).await.is_none());
        assert!(start.elapsed() <= Duration::from_millis(20_050));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_source_does_not_hang() {
        let (tx, rx) = duplex(64);
        drop(tx);

        let mut sampler = FixSampler::new(rx, SamplerSettings::default());
        let deadline = Instant::now() + Duration::from_secs(3);
        assert!(sampler.read_one_fix(deadline).await.is_none());
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_uninteresting_sentences() {
        let (mut tx, rx) = duplex(4096);
        tx.write_all(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n")
            .await
            .unwrap();
        tx.write_all(b"$GPRMC,123519,V,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n")
            .await
            .unwrap();
        tx.write_all(b"$GPRMC,123519,A,,N,01131.000,E,022.4,084.4,230394,003.1,W\r\n")
            .await
            .unwrap();
        tx.write_all(b"$GNRMC,123520,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n")
            .await
            .unwrap();

        let mut sampler = FixSampler::new(rx, SamplerSettings::default());
        let fix = sampler
            .read_one_fix(Instant::now() + Duration::from_secs(3))
            .await
            .unwrap();
        assert!((fix.latitude - 48.1173).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentence_split_across_attempts() {
        let (mut tx, rx) = duplex(4096);
        let (head, tail) = FIX_1_1.split_at(20);
        tx.write_all(head).await.unwrap();

        let mut sampler = FixSampler::new(rx, SamplerSettings::default());
        let first = sampler
            .read_one_fix(Instant::now() + Duration::from_millis(500))
            .await;
        assert!(first.is_none());

        tx.write_all(tail).await.unwrap();
        let second = sampler
            .read_one_fix(Instant::now() + Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!((second.latitude, second.longitude), (1.0, 1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_batch_stops_early() {
        let (mut tx, rx) = duplex(4096);
        tx.write_all(b"$GPRMC,120000,A,0100.0000,N,00100.0000,E\n").await.unwrap();
        tx.write_all(b"$GPRMC,120001,A,0300.0000,S,00300.0000,W\n").await.unwrap();

        let settings = SamplerSettings {
            sample_count: 2,
            ..SamplerSettings::default()
        };
        let mut sampler = FixSampler::new(rx, settings);

        let start = Instant::now();
        let pos = sampler.sample().await.unwrap();
        assert_eq!((pos.latitude, pos.longitude), (-1.0, -1.0));
        assert_eq!(pos.samples, 2);
        // one pause between the two attempts, none after the last
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_back_off_until_deadline() {
        let mut sampler = FixSampler::new(FailingSource { reads: 0 }, SamplerSettings::default());

        let start = Instant::now();
        let deadline = start + Duration::from_secs(1);
        assert!(sampler.read_one_fix(deadline).await.is_none());

        assert!(Instant::now() >= deadline);
        assert!(start.elapsed() <= Duration::from_millis(1050));
        // one read per 20 ms back-off, not a busy loop
        let reads = sampler.get_ref().reads;
        assert!(reads >= 2 && reads <= 52, "unexpected read count {}", reads);
    }
}
