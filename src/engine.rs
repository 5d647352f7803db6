//! Polling engine: host events in, sensor fetches fanned out, bitmaps out.
//!
//! The engine owns the [`KeyRegistry`] (and through it the poll timer), the
//! sensor source, and the bitmap sink. Everything that touches a binding runs
//! on the engine's own task, so setters and value updates never interleave.
//!
//! # Tick
//!
//! 1. Snapshot the listeners: watched sensor name → keys watching it
//! 2. Spawn one fetch for the whole catalog
//! 3. When it settles, hand each reading to the keys listed under its name
//!    and push every redrawn frame to the host
//!
//! The listener snapshot is taken when the tick fires. If a fetch is still
//! in flight when the next tick fires, both complete independently; a key that
//! was hidden or retargeted in the meantime is skipped on delivery.
//!
//! # Failure
//!
//! A failed fetch (transport, HTTP status, or malformed body) drops that
//! tick: nothing is delivered, nothing is pushed, the failure is logged and
//! counted, and the next tick tries again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use embedded_graphics::prelude::Size;
use log::{debug, info, trace, warn};
use tokio::sync::mpsc;

use crate::binding::SensorBinding;
use crate::canvas::KeyFrame;
use crate::catalog::SensorSource;
use crate::error::Result;
use crate::host::{BitmapSink, HostEvent, KeyId, KeySettings, SettingsMap};
use crate::reading::SensorReading;
use crate::registry::KeyRegistry;
use crate::stats::EngineStats;

/// Watched sensor name → keys watching it.
pub type Listeners = HashMap<String, Vec<KeyId>>;

/// Result of one spawned fetch, sent back to the engine task.
struct FetchOutcome {
    listeners: Listeners,
    readings: Result<Vec<SensorReading>>,
    started: Instant,
}

pub struct Engine<S, K> {
    source: Arc<S>,
    sink: K,
    registry: KeyRegistry,
    key_size: Size,
    stats: EngineStats,
}

impl<S, K> Engine<S, K>
where
    S: SensorSource,
    K: BitmapSink,
{
    pub fn new(
        source: S,
        sink: K,
        poll_interval: std::time::Duration,
        key_size: Size,
    ) -> Self {
        Self {
            source: Arc::new(source),
            sink,
            registry: KeyRegistry::new(poll_interval),
            key_size,
            stats: EngineStats::new(),
        }
    }

    pub const fn registry(&self) -> &KeyRegistry { &self.registry }

    pub const fn stats(&self) -> &EngineStats { &self.stats }

    pub const fn sink(&self) -> &K { &self.sink }

    pub const fn sink_mut(&mut self) -> &mut K { &mut self.sink }

    // -------------------------------------------------------------------------
    // Host Events
    // -------------------------------------------------------------------------

    pub fn handle_event(
        &mut self,
        event: HostEvent,
    ) {
        match event {
            HostEvent::KeyShown { key, settings } => self.show_key(key, &settings),
            HostEvent::KeyHidden { key } => self.hide_key(&key),
            HostEvent::KeyPressed { key } => match self.registry.lookup_mut(&key) {
                Some(binding) => binding.toggle(),
                None => {
                    // A press can arrive before the key was ever shown
                    debug!("{key}: pressed before shown, registering");
                    self.show_key(key, &SettingsMap::new());
                }
            },
            HostEvent::SettingsChanged { key, settings } => {
                let settings = parse_settings(&key, &settings);
                let Some(binding) = self.registry.lookup_mut(&key) else {
                    debug!("{key}: settings for a key that is not shown, ignored");
                    return;
                };
                if let Some(frame) = binding.apply_settings(&settings) {
                    self.push(&key, &frame);
                }
            }
        }
    }

    fn show_key(
        &mut self,
        key: KeyId,
        settings: &SettingsMap,
    ) {
        let settings = parse_settings(&key, settings);
        let binding = SensorBinding::with_settings(key.clone(), self.key_size, &settings);
        info!("{key}: shown, watching {:?} as {}", binding.watched_name(), binding.display_type());
        if let Some(mut replaced) = self.registry.register(key, binding) {
            replaced.destroy();
        }
    }

    fn hide_key(
        &mut self,
        key: &KeyId,
    ) {
        if let Some(mut binding) = self.registry.deregister(key) {
            binding.destroy();
            info!("{key}: hidden");
        }
    }

    // -------------------------------------------------------------------------
    // Polling
    // -------------------------------------------------------------------------

    /// Group the visible keys by the sensor they watch. Keys with no sensor
    /// selected are left out.
    pub fn listeners(&self) -> Listeners {
        let mut listeners = Listeners::new();
        for (key, binding) in self.registry.iter() {
            if !binding.watched_name().is_empty() {
                listeners.entry(binding.watched_name().to_string()).or_default().push(key.clone());
            }
        }
        listeners
    }

    /// Run one tick inline: snapshot listeners, fetch, deliver.
    ///
    /// Returns the number of readings delivered, or the fetch error after it
    /// has been logged and counted.
    pub async fn poll_once(&mut self) -> Result<usize> {
        self.stats.record_tick();
        let listeners = self.listeners();
        let started = Instant::now();
        let readings = self.source.fetch().await;
        self.deliver(FetchOutcome {
            listeners,
            readings,
            started,
        })
    }

    fn spawn_fetch(
        &mut self,
        done: &mpsc::UnboundedSender<FetchOutcome>,
    ) {
        self.stats.record_tick();
        let listeners = self.listeners();
        let source = Arc::clone(&self.source);
        let done = done.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let readings = source.fetch().await;
            // The engine may have shut down; nothing to do then
            done.send(FetchOutcome {
                listeners,
                readings,
                started,
            })
            .ok();
        });
    }

    fn deliver(
        &mut self,
        outcome: FetchOutcome,
    ) -> Result<usize> {
        let readings = match outcome.readings {
            Ok(readings) => readings,
            Err(err) => {
                self.stats.record_failure();
                warn!("tick dropped: {err}");
                return Err(err);
            }
        };
        self.stats.record_latency(outcome.started.elapsed());

        let mut delivered = 0;
        for reading in &readings {
            let Some(keys) = outcome.listeners.get(reading.full_name()) else {
                continue;
            };
            for key in keys {
                let Some(binding) = self.registry.lookup_mut(key) else {
                    trace!("{key}: hidden since the tick fired");
                    continue;
                };
                if binding.watched_name() != reading.full_name() {
                    trace!("{key}: retargeted since the tick fired");
                    continue;
                }
                let frame = binding.update_value(reading);
                self.stats.record_delivery();
                delivered += 1;
                if let Some(frame) = frame {
                    self.push(key, &frame);
                }
            }
        }

        debug!(
            "tick {}: {} readings, {delivered} delivered, fetch avg {}us",
            self.stats.ticks,
            readings.len(),
            self.stats.fetch_latency_avg_us()
        );
        Ok(delivered)
    }

    fn push(
        &mut self,
        key: &KeyId,
        frame: &KeyFrame,
    ) {
        let result = self.sink.push_bitmap(key, frame);
        if let Err(err) = &result {
            warn!("{key}: bitmap push failed: {err}");
        }
        self.stats.record_push(result.is_ok());
    }

    // -------------------------------------------------------------------------
    // Run Loop
    // -------------------------------------------------------------------------

    /// Process host events and poll ticks until the event channel closes.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<HostEvent>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                () = self.registry.tick() => self.spawn_fetch(&done_tx),
                Some(outcome) = done_rx.recv() => {
                    // Failures are logged and counted in deliver
                    self.deliver(outcome).ok();
                }
            }
        }

        info!(
            "engine stopped after {}: {} ticks, {} failed, {} frames pushed",
            self.stats.uptime_string(),
            self.stats.ticks,
            self.stats.fetch_failures,
            self.stats.frames_pushed
        );
    }
}

fn parse_settings(
    key: &KeyId,
    settings: &SettingsMap,
) -> KeySettings {
    KeySettings::from_map(settings).unwrap_or_else(|err| {
        warn!("{key}: unreadable settings, using defaults: {err}");
        KeySettings::default()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
