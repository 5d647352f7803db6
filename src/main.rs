//! Headless runner.
//!
//! Loads the configuration, shows every configured key to the engine, and
//! writes each key's latest bitmap to `<output.directory>/<key>.png` until
//! interrupted.
//!
//! ```text
//! ohm-deck [config.toml]
//! ```
//!
//! The log filter defaults to `[logging] level` from the config; `RUST_LOG`
//! overrides it.

use std::path::PathBuf;

use anyhow::Context;
use embedded_graphics::prelude::Size;
use log::{info, warn};
use ohm_deck::config::AppConfig;
use ohm_deck::{BitmapSink, Engine, HostEvent, HttpCatalog, KeyFrame, KeyId};
use tokio::sync::mpsc;

/// Writes each pushed frame over `<directory>/<key>.png`.
struct PngDirSink {
    directory: PathBuf,
}

impl PngDirSink {
    const fn new(directory: PathBuf) -> Self { Self { directory } }

    fn path_for(
        &self,
        key: &KeyId,
    ) -> PathBuf {
        // Host ids are opaque; keep them filesystem-safe
        let name: String = key
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.directory.join(format!("{name}.png"))
    }
}

impl BitmapSink for PngDirSink {
    fn push_bitmap(
        &mut self,
        key: &KeyId,
        frame: &KeyFrame,
    ) -> ohm_deck::Result<()> {
        let png = frame.encode_png()?;
        std::fs::write(self.path_for(key), png)?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, origin) = AppConfig::load_or_default(config_path.as_deref())?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();
    origin.log();

    std::fs::create_dir_all(&config.output.directory)
        .with_context(|| format!("failed to create {}", config.output.directory.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let source =
        HttpCatalog::new(&config.polling.endpoint, config.polling.timeout()).context("failed to build HTTP client")?;
    info!(
        "polling {} every {:?}, writing frames to {}",
        source.endpoint(),
        config.polling.interval(),
        config.output.directory.display()
    );
    let sink = PngDirSink::new(config.output.directory.clone());
    let key_size = Size::new_equal(config.display.key_size);
    let mut engine = Engine::new(source, sink, config.polling.interval(), key_size);

    if config.keys.is_empty() {
        warn!("no [[keys]] configured, nothing will be polled");
    }

    // Room for every startup event so sending never waits on the engine
    let (tx, rx) = mpsc::channel(config.keys.len() + 1);
    for key in &config.keys {
        let event = HostEvent::KeyShown {
            key: KeyId::new(key.id.as_str()),
            settings: key.settings.clone(),
        };
        tx.send(event).await.context("engine channel closed")?;
    }

    tokio::select! {
        () = engine.run(rx) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            info!("interrupted, shutting down");
        }
    }

    let stats = engine.stats();
    info!(
        "uptime {}: {} ticks, {} failed fetches, {} frames written",
        stats.uptime_string(),
        stats.ticks,
        stats.fetch_failures,
        stats.frames_pushed
    );
    Ok(())
}
