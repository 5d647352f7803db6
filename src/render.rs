//! Render strategy selection for key bitmaps.
//!
//! A binding's `displayType` picks one of three paint routines:
//!
//! | Type | Setting value | Routine |
//! |------|---------------|---------|
//! | [`DisplayType::Text`] | `"text"` | [`widgets::text`](crate::widgets::text) |
//! | [`DisplayType::Knob`] | `"knob"` | [`KnobWidget`] |
//! | [`DisplayType::Sparkline`] | `"line"` | [`widgets::sparkline`](crate::widgets::sparkline) |
//!
//! Selection is a plain `match` on [`RenderStrategy`]; switching type replaces
//! the strategy, so the knob's lazily built widget is dropped when the key
//! moves away from `Knob` and rebuilt on the next knob paint.
//!
//! # Skipped Paints
//!
//! A value that cannot be drawn (absent, or with no numeric prefix) is not an
//! error. Paint routines return [`RenderSkip`] without touching the canvas, so
//! the key keeps showing its previous bitmap.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::canvas::KeyCanvas;
use crate::config::{DEFAULT_BACKGROUND, DEFAULT_FOREGROUND};
use crate::reading::SensorReading;
use crate::widgets::{KnobWidget, sparkline, text};

// =============================================================================
// Display Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayType {
    #[default]
    Text,
    Knob,
    Sparkline,
}

impl DisplayType {
    /// The value the host's settings use for this type.
    pub const fn setting_value(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Knob => "knob",
            Self::Sparkline => "line",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.setting_value()) }
}

/// A `sensor_type` setting that names no known display type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDisplayType(pub String);

impl fmt::Display for UnknownDisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown sensor type {:?}", self.0) }
}

impl FromStr for DisplayType {
    type Err = UnknownDisplayType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(Self::Text),
            "knob" => Ok(Self::Knob),
            "line" => Ok(Self::Sparkline),
            other => Err(UnknownDisplayType(other.to_string())),
        }
    }
}

// =============================================================================
// Theme
// =============================================================================

/// The two user-picked colors every routine draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub foreground: Rgb888,
    pub background: Rgb888,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
        }
    }
}

// =============================================================================
// Paint Context
// =============================================================================

/// Why a paint left the canvas untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSkip {
    /// No reading yet, or the reading's value is empty.
    NoValue,
    /// The value has no numeric prefix (`"n/a"`).
    NotNumeric,
}

impl fmt::Display for RenderSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoValue => f.write_str("no value"),
            Self::NotNumeric => f.write_str("value is not numeric"),
        }
    }
}

/// Everything a paint routine reads from the binding.
pub struct PaintContext<'a> {
    /// Oldest first; the newest entry is the current value.
    pub history: &'a VecDeque<SensorReading>,
    pub theme: Theme,
    pub min_override: Option<f64>,
    pub max_override: Option<f64>,
}

impl PaintContext<'_> {
    /// The most recent reading.
    pub fn current(&self) -> Result<&SensorReading, RenderSkip> {
        match self.history.back() {
            Some(reading) if !reading.value().is_absent() => Ok(reading),
            _ => Err(RenderSkip::NoValue),
        }
    }

    /// The most recent reading and its numeric value.
    pub fn current_numeric(&self) -> Result<(&SensorReading, f64), RenderSkip> {
        let reading = self.current()?;
        let value = reading.numeric_value().ok_or(RenderSkip::NotNumeric)?;
        Ok((reading, value))
    }

    /// Gauge range: overrides first, then the current reading's own range.
    /// `max` is raised to at least `min + 1` so the span is never zero.
    pub fn range(&self) -> (f64, f64) { self.resolve_range(self.min_override, self.max_override) }

    /// The current reading's own range, ignoring overrides. Same clamp as
    /// [`range`](Self::range).
    pub fn reading_range(&self) -> (f64, f64) { self.resolve_range(None, None) }

    fn resolve_range(
        &self,
        min_override: Option<f64>,
        max_override: Option<f64>,
    ) -> (f64, f64) {
        let current = self.history.back();
        let min = min_override.or_else(|| current.and_then(SensorReading::min)).unwrap_or(0.0);
        let max = max_override.or_else(|| current.and_then(SensorReading::max)).unwrap_or(min + 1.0);
        (min, max.max(min + 1.0))
    }
}

// =============================================================================
// Render Strategy
// =============================================================================

/// Paint routine for one binding, with the per-type widget state it needs.
pub enum RenderStrategy {
    Text,
    /// The gauge is built on first paint, sized to the canvas.
    Knob(Option<KnobWidget>),
    Sparkline,
}

impl RenderStrategy {
    pub const fn for_type(display_type: DisplayType) -> Self {
        match display_type {
            DisplayType::Text => Self::Text,
            DisplayType::Knob => Self::Knob(None),
            DisplayType::Sparkline => Self::Sparkline,
        }
    }

    pub const fn display_type(&self) -> DisplayType {
        match self {
            Self::Text => DisplayType::Text,
            Self::Knob(_) => DisplayType::Knob,
            Self::Sparkline => DisplayType::Sparkline,
        }
    }

    pub fn paint(
        &mut self,
        canvas: &mut KeyCanvas,
        ctx: &PaintContext<'_>,
    ) -> Result<(), RenderSkip> {
        match self {
            Self::Text => text::paint(canvas, ctx),
            Self::Knob(widget) => widget
                .get_or_insert_with(|| KnobWidget::new(canvas.size(), ctx.theme))
                .paint(canvas, ctx),
            Self::Sparkline => sparkline::paint(canvas, ctx),
        }
    }

    /// Push new colors into stateful widgets.
    pub fn retheme(
        &mut self,
        theme: Theme,
    ) {
        if let Self::Knob(Some(widget)) = self {
            widget.set_theme(theme);
        }
    }

    pub const fn has_knob_widget(&self) -> bool { matches!(self, Self::Knob(Some(_))) }
}

impl Default for RenderStrategy {
    fn default() -> Self { Self::for_type(DisplayType::default()) }
}

// =============================================================================
// Unit Tests
// =============================================================================
