//! Desktop preview: every configured key, live, in one window.
//!
//! Keys are tiled left to right in configuration order. Clicking a tile sends
//! a key-pressed event for that key, as a physical press would. The engine
//! runs on its own thread with its own runtime; frames come back to the window
//! loop over a channel.
//!
//! ```text
//! cargo run --features preview --bin ohm-deck-preview -- [config.toml]
//! ```

use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use log::{info, warn};
use ohm_deck::colors::{BLACK, CHARCOAL};
use ohm_deck::config::AppConfig;
use ohm_deck::{BitmapSink, Engine, HostEvent, HttpCatalog, KeyFrame, KeyId};
use tokio::sync::mpsc;

/// Tiles per row.
const COLUMNS: u32 = 5;

/// Gap between tiles and around the edge.
const GAP: u32 = 8;

/// Window refresh period.
const FRAME_TIME: Duration = Duration::from_millis(50);

/// Forwards frames to the window thread.
struct ChannelSink {
    frames: std_mpsc::Sender<(KeyId, KeyFrame)>,
}

impl BitmapSink for ChannelSink {
    fn push_bitmap(
        &mut self,
        key: &KeyId,
        frame: &KeyFrame,
    ) -> ohm_deck::Result<()> {
        // Window closed; the engine is about to stop too
        self.frames.send((key.clone(), frame.clone())).ok();
        Ok(())
    }
}

/// Tile grid geometry.
struct Layout {
    key_size: u32,
    columns: u32,
    rows: u32,
}

impl Layout {
    fn new(
        key_size: u32,
        count: usize,
    ) -> Self {
        let count = count as u32;
        let columns = count.clamp(1, COLUMNS);
        Self {
            key_size,
            columns,
            rows: count.div_ceil(columns).max(1),
        }
    }

    fn size(&self) -> Size {
        let pitch = self.key_size + GAP;
        Size::new(self.columns * pitch + GAP, self.rows * pitch + GAP)
    }

    fn origin(
        &self,
        index: usize,
    ) -> Point {
        let pitch = (self.key_size + GAP) as i32;
        let (col, row) = (index as u32 % self.columns, index as u32 / self.columns);
        Point::new(GAP as i32 + col as i32 * pitch, GAP as i32 + row as i32 * pitch)
    }

    fn tile_at(
        &self,
        point: Point,
        count: usize,
    ) -> Option<usize> {
        (0..count).find(|&i| Rectangle::new(self.origin(i), Size::new_equal(self.key_size)).contains(point))
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, origin) = AppConfig::load_or_default(config_path.as_deref())?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();
    origin.log();

    if config.keys.is_empty() {
        bail!("no [[keys]] configured, nothing to preview");
    }
    let keys: Vec<KeyId> = config.keys.iter().map(|k| KeyId::new(k.id.as_str())).collect();
    let layout = Layout::new(config.display.key_size, keys.len());

    let (event_tx, event_rx) = mpsc::channel(keys.len() + 16);
    let (frame_tx, frame_rx) = std_mpsc::channel();

    for (key, key_config) in keys.iter().zip(&config.keys) {
        event_tx
            .blocking_send(HostEvent::KeyShown {
                key: key.clone(),
                settings: key_config.settings.clone(),
            })
            .context("engine channel closed")?;
    }

    let engine_thread = {
        let config = config.clone();
        thread::spawn(move || -> anyhow::Result<()> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(async {
                let source = HttpCatalog::new(&config.polling.endpoint, config.polling.timeout())
                    .context("failed to build HTTP client")?;
                let sink = ChannelSink { frames: frame_tx };
                let key_size = Size::new_equal(config.display.key_size);
                let mut engine = Engine::new(source, sink, config.polling.interval(), key_size);
                engine.run(event_rx).await;
                Ok(())
            })
        })
    };

    let mut display: SimulatorDisplay<Rgb888> = SimulatorDisplay::new(layout.size());
    display.clear(BLACK).ok();
    for i in 0..keys.len() {
        Rectangle::new(layout.origin(i), Size::new_equal(config.display.key_size))
            .into_styled(PrimitiveStyle::with_stroke(CHARCOAL, 1))
            .draw(&mut display)
            .ok();
    }

    let output_settings = OutputSettingsBuilder::new().scale(1).build();
    let mut window = Window::new("ohm-deck preview", &output_settings);
    info!("previewing {} keys, click a key to press it", keys.len());

    'running: loop {
        while let Ok((key, frame)) = frame_rx.try_recv() {
            if let Some(index) = keys.iter().position(|k| *k == key) {
                frame.draw(&mut display.translated(layout.origin(index))).ok();
            }
        }
        window.update(&display);

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::MouseButtonUp { point, .. } => {
                    if let Some(index) = layout.tile_at(point, keys.len()) {
                        let key = keys[index].clone();
                        if event_tx.blocking_send(HostEvent::KeyPressed { key }).is_err() {
                            warn!("engine stopped, press ignored");
                        }
                    }
                }
                _ => {}
            }
        }
        thread::sleep(FRAME_TIME);
    }

    // Closing the channel ends the engine's run loop
    drop(event_tx);
    match engine_thread.join() {
        Ok(result) => result,
        Err(_) => bail!("engine thread panicked"),
    }
}
