//! Per-key sensor binding: settings, sample history, and the off-screen canvas.
//!
//! One `SensorBinding` exists per visible key. It remembers which sensor the
//! key watches, how to draw it, and the last [`HISTORY_CAPACITY`] readings for
//! that sensor. Every change that affects the picture returns the redrawn
//! frame, which the engine forwards to the host.
//!
//! # History
//!
//! Readings are appended in arrival order and the oldest is dropped once the
//! capacity is exceeded (FIFO). Each reading is stamped with the binding's own
//! sample counter on arrival; the sparkline uses these ordinals to place its
//! gridlines, so they keep scrolling with the data.
//!
//! # Redraw Rules
//!
//! - [`update_value`](SensorBinding::update_value) always redraws
//! - Visual setters (type, colors, range) redraw with the last known value
//! - Before the first reading arrives there is nothing to draw, so setters
//!   return `None`
//! - A paint that is skipped (non-numeric value) still returns a frame: the
//!   previous picture, unchanged, so the host cache stays in step
//! - After [`destroy`](SensorBinding::destroy) nothing is drawn again
//!
//! Changing the watched sensor keeps the history and redraws with the last
//! value; readings for the new sensor append to the same series from the next
//! tick on.

use std::collections::VecDeque;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{debug, warn};

use crate::canvas::{KeyCanvas, KeyFrame};
use crate::colors::parse_color;
use crate::config::HISTORY_CAPACITY;
use crate::host::{KeyId, KeySettings};
use crate::reading::SensorReading;
use crate::render::{DisplayType, PaintContext, RenderStrategy, Theme};

// =============================================================================
// Sensor Binding
// =============================================================================

pub struct SensorBinding {
    key: KeyId,

    /// Full sensor name to match against fetched readings. Empty until the
    /// settings name one, which matches nothing the monitor reports.
    watched_name: String,

    strategy: RenderStrategy,
    theme: Theme,
    min_override: Option<f64>,
    max_override: Option<f64>,

    /// Oldest first, at most `HISTORY_CAPACITY` entries.
    history: VecDeque<SensorReading>,

    /// Ordinal for the next reading.
    sample_counter: u64,

    /// `None` once destroyed.
    canvas: Option<KeyCanvas>,
}

impl SensorBinding {
    /// A binding with default type and colors and no sensor selected.
    pub fn new(
        key: KeyId,
        size: Size,
    ) -> Self {
        Self {
            key,
            watched_name: String::new(),
            strategy: RenderStrategy::default(),
            theme: Theme::default(),
            min_override: None,
            max_override: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
            sample_counter: 0,
            canvas: Some(KeyCanvas::new(size)),
        }
    }

    /// A binding configured from the settings the key was shown with.
    pub fn with_settings(
        key: KeyId,
        size: Size,
        settings: &KeySettings,
    ) -> Self {
        let mut binding = Self::new(key, size);
        binding.apply_settings(settings);
        binding
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub const fn key(&self) -> &KeyId { &self.key }

    pub fn watched_name(&self) -> &str { &self.watched_name }

    pub const fn display_type(&self) -> DisplayType { self.strategy.display_type() }

    pub const fn strategy(&self) -> &RenderStrategy { &self.strategy }

    pub const fn theme(&self) -> Theme { self.theme }

    pub const fn min_override(&self) -> Option<f64> { self.min_override }

    pub const fn max_override(&self) -> Option<f64> { self.max_override }

    pub const fn history(&self) -> &VecDeque<SensorReading> { &self.history }

    pub fn last_reading(&self) -> Option<&SensorReading> { self.history.back() }

    pub const fn sample_counter(&self) -> u64 { self.sample_counter }

    pub const fn is_destroyed(&self) -> bool { self.canvas.is_none() }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Record a new reading for the watched sensor and redraw.
    pub fn update_value(
        &mut self,
        reading: &SensorReading,
    ) -> Option<KeyFrame> {
        if self.is_destroyed() {
            return None;
        }

        let stamped = reading.clone().with_ordinal(self.sample_counter);
        self.sample_counter += 1;

        // Maintain fixed-size history buffer (FIFO)
        self.history.push_back(stamped);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        self.redraw()
    }

    /// Watch a different sensor and redraw with the last known value.
    pub fn set_watched_name(
        &mut self,
        name: &str,
    ) -> Option<KeyFrame> {
        self.assign_watched_name(name);
        self.redraw()
    }

    pub fn set_display_type(
        &mut self,
        display_type: DisplayType,
    ) -> Option<KeyFrame> {
        self.assign_display_type(display_type);
        self.redraw()
    }

    pub fn set_foreground(
        &mut self,
        color: Rgb888,
    ) -> Option<KeyFrame> {
        self.assign_theme(Theme {
            foreground: color,
            ..self.theme
        });
        self.redraw()
    }

    pub fn set_background(
        &mut self,
        color: Rgb888,
    ) -> Option<KeyFrame> {
        self.assign_theme(Theme {
            background: color,
            ..self.theme
        });
        self.redraw()
    }

    pub fn set_min_override(
        &mut self,
        min: Option<f64>,
    ) -> Option<KeyFrame> {
        self.min_override = min;
        self.redraw()
    }

    pub fn set_max_override(
        &mut self,
        max: Option<f64>,
    ) -> Option<KeyFrame> {
        self.max_override = max;
        self.redraw()
    }

    /// Key press hook. Pressing a sensor key does nothing yet.
    pub const fn toggle(&mut self) {}

    /// Release the canvas and history. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.canvas.take().is_some() {
            debug!("{}: binding destroyed", self.key);
        }
        self.history.clear();
        self.strategy = RenderStrategy::for_type(self.strategy.display_type());
    }

    /// Apply every recognized field of `settings`, then redraw once.
    ///
    /// Invalid values are logged and ignored: an unknown type or an unparsable
    /// color leaves the previous setting in place.
    pub fn apply_settings(
        &mut self,
        settings: &KeySettings,
    ) -> Option<KeyFrame> {
        if let Some(name) = &settings.sensor_name {
            self.assign_watched_name(name);
        }

        if let Some(kind) = &settings.sensor_type {
            match kind.parse() {
                Ok(display_type) => self.assign_display_type(display_type),
                Err(err) => warn!("{}: {err}, keeping {}", self.key, self.display_type()),
            }
        }

        let mut theme = self.theme;
        if let Some(fg) = &settings.sensor_foreground {
            match parse_color(fg) {
                Some(color) => theme.foreground = color,
                None => warn!("{}: invalid foreground color {fg:?}", self.key),
            }
        }
        if let Some(bg) = &settings.sensor_background {
            match parse_color(bg) {
                Some(color) => theme.background = color,
                None => warn!("{}: invalid background color {bg:?}", self.key),
            }
        }
        self.assign_theme(theme);

        if let Some(min) = settings.sensor_minimum {
            self.min_override = min;
        }
        if let Some(max) = settings.sensor_maximum {
            self.max_override = max;
        }

        self.redraw()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn assign_watched_name(
        &mut self,
        name: &str,
    ) {
        if self.watched_name != name {
            debug!("{}: now watching {name:?}", self.key);
            self.watched_name = name.to_string();
        }
    }

    /// Switching type drops any widget state of the old type.
    fn assign_display_type(
        &mut self,
        display_type: DisplayType,
    ) {
        if self.strategy.display_type() != display_type {
            self.strategy = RenderStrategy::for_type(display_type);
        }
    }

    fn assign_theme(
        &mut self,
        theme: Theme,
    ) {
        if self.theme != theme {
            self.theme = theme;
            self.strategy.retheme(theme);
        }
    }

    /// Paint the current state and snapshot the canvas.
    fn redraw(&mut self) -> Option<KeyFrame> {
        let canvas = self.canvas.as_mut()?;
        if self.history.is_empty() {
            return None;
        }

        let ctx = PaintContext {
            history: &self.history,
            theme: self.theme,
            min_override: self.min_override,
            max_override: self.max_override,
        };
        if let Err(skip) = self.strategy.paint(canvas, &ctx) {
            debug!("{}: paint skipped, {skip}", self.key);
        }
        Some(canvas.snapshot())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
