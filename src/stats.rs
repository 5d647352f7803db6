//! Engine counters and fetch timing.
//!
//! Updated by the engine as ticks fire and fetches settle; logged at debug
//! level after every delivery and readable through
//! [`Engine::stats`](crate::engine::Engine::stats).
//!
//! # Fetch Latency
//!
//! Latency is measured from issuing the request to the outcome arriving back
//! at the engine, so it includes JSON parsing. The average is an exponential
//! moving average, seeded with the first sample.

use core::fmt::Write;
use std::time::{Duration, Instant};

use heapless::String;

#[derive(Debug, Clone)]
pub struct EngineStats {
    /// Timer ticks that issued a fetch.
    pub ticks: u64,
    /// Fetches that failed (transport, status, or parse).
    pub fetch_failures: u64,
    /// Readings handed to a binding.
    pub readings_delivered: u64,
    /// Frames handed to the host sink.
    pub frames_pushed: u64,
    /// Frames the sink rejected.
    pub sink_failures: u64,

    /// Last successful fetch latency.
    pub fetch_latency_us: u32,
    pub fetch_latency_min_us: u32,
    pub fetch_latency_max_us: u32,
    fetch_latency_avg_us: f32,
    latency_samples: u64,

    start_time: Instant,
}

impl EngineStats {
    /// Exponential moving average alpha (0.1 for smooth updates).
    const EMA_ALPHA: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            ticks: 0,
            fetch_failures: 0,
            readings_delivered: 0,
            frames_pushed: 0,
            sink_failures: 0,
            fetch_latency_us: 0,
            fetch_latency_min_us: u32::MAX,
            fetch_latency_max_us: 0,
            fetch_latency_avg_us: 0.0,
            latency_samples: 0,
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub const fn record_tick(&mut self) { self.ticks += 1; }

    #[inline]
    pub const fn record_failure(&mut self) { self.fetch_failures += 1; }

    #[inline]
    pub const fn record_delivery(&mut self) { self.readings_delivered += 1; }

    #[inline]
    pub const fn record_push(
        &mut self,
        accepted: bool,
    ) {
        if accepted {
            self.frames_pushed += 1;
        } else {
            self.sink_failures += 1;
        }
    }

    /// Record the latency of a successful fetch.
    pub fn record_latency(
        &mut self,
        latency: Duration,
    ) {
        let us = u32::try_from(latency.as_micros()).unwrap_or(u32::MAX);
        self.fetch_latency_us = us;
        self.fetch_latency_min_us = self.fetch_latency_min_us.min(us);
        self.fetch_latency_max_us = self.fetch_latency_max_us.max(us);

        if self.latency_samples == 0 {
            self.fetch_latency_avg_us = us as f32;
        } else {
            self.fetch_latency_avg_us =
                Self::EMA_ALPHA.mul_add(us as f32, (1.0 - Self::EMA_ALPHA) * self.fetch_latency_avg_us);
        }
        self.latency_samples += 1;
    }

    /// Average fetch latency in microseconds, 0 before the first fetch.
    #[inline]
    pub const fn fetch_latency_avg_us(&self) -> u32 { self.fetch_latency_avg_us as u32 }

    #[inline]
    pub fn uptime(&self) -> Duration { self.start_time.elapsed() }

    /// Uptime as `HH:MM:SS`.
    pub fn uptime_string(&self) -> String<12> { format_hms(self.uptime()) }
}

impl Default for EngineStats {
    fn default() -> Self { Self::new() }
}

fn format_hms(elapsed: Duration) -> String<12> {
    let secs = elapsed.as_secs();
    let mut s = String::new();
    write!(s, "{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60).ok();
    s
}

// =============================================================================
// Unit Tests
// =============================================================================
