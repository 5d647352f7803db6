// Crate-level lints: Allow common graphics patterns that pedantic lints flag
#![allow(clippy::cast_possible_truncation)] // Intentional f32->i32, u32->i32 casts for pixel math
#![allow(clippy::cast_precision_loss)] // u32/u64->f32 in graphics and timing calculations
#![allow(clippy::cast_possible_wrap)] // u32->i32 wrapping is acceptable for key-sized canvases
#![allow(clippy::cast_sign_loss)] // f32->u32 where we know the value is positive
#![allow(clippy::similar_names)] // min/max, fg/bg pairs are clear

//! Hardware-monitor sensors on macro-keypad keys.
//!
//! Polls the hardware monitor's `data.json` once per second, hands each
//! reading to the keys watching that sensor, and renders every such key as a
//! 144×144 bitmap: the value as text, a radial gauge, or a one-minute line
//! chart.
//!
//! # Data Flow
//!
//! ```text
//! PollTimer tick ─> SensorSource::fetch ─> [SensorReading]
//!        │                                       │
//!        └── Engine::listeners (name -> keys) ───┤
//!                                                v
//!                         SensorBinding::update_value (history, redraw)
//!                                                │
//!                         RenderStrategy::paint ─> KeyCanvas ─> KeyFrame
//!                                                │
//!                                   BitmapSink::push_bitmap
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: fetch and flatten the sensor tree
//! - [`binding`]: per-key state and history
//! - [`render`], [`widgets`]: the three display types
//! - [`registry`], [`engine`]: visible keys, the shared timer, fan-out
//! - [`host`]: events in, bitmaps out
//! - [`canvas`]: off-screen framebuffer and PNG encoding
//! - [`config`], [`colors`], [`styles`]: constants, runtime config, look

pub mod binding;
pub mod canvas;
pub mod catalog;
pub mod colors;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod reading;
pub mod registry;
pub mod render;
pub mod stats;
pub mod styles;
pub mod widgets;

pub use binding::SensorBinding;
pub use canvas::{KeyCanvas, KeyFrame};
pub use catalog::{HttpCatalog, SensorSource};
pub use engine::Engine;
pub use error::{Error, Result};
pub use host::{BitmapSink, HostEvent, KeyId, KeySettings, MemorySink, SettingsMap};
pub use reading::{SensorReading, SensorValue};
pub use render::{DisplayType, RenderSkip, RenderStrategy, Theme};
