//! Radial gauge.
//!
//! A 270° arc open at the bottom, running clockwise from 7:30 to 4:30. The
//! full track is stroked in the background color and the filled part, from the
//! range minimum up to the value, in the foreground color. The value string
//! (with its unit) sits in the middle; the range ends are labelled below the
//! arc.
//!
//! # Geometry
//!
//! Sized once from the canvas when the widget is built:
//!
//! - Track centerline radius: 40% of the shorter side
//! - Track width: 40% of that radius
//! - Value text: 20% of the shorter side

use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, PrimitiveStyle};
use embedded_graphics::text::Text;
use heapless::String;

use super::primitives::draw_scaled_text;
use crate::colors::BLACK;
use crate::render::{PaintContext, RenderSkip, Theme};
use crate::styles::{BOTTOM_LEFT, BOTTOM_RIGHT, RANGE_LABEL_FONT, ScaledFont, value_font};

/// Arc start, measured clockwise from 3 o'clock.
const START_DEG: f32 = 135.0;

/// Full sweep of the track.
const SWEEP_DEG: f32 = 270.0;

const RADIUS_RATIO: f32 = 0.4;
const TRACK_WIDTH_RATIO: f32 = 0.4;
const VALUE_TEXT_RATIO: f32 = 0.2;

/// Gap between range labels and the canvas edge.
const LABEL_MARGIN: i32 = 2;

/// Fraction of the sweep covered by `value` within `[min, max]`.
pub fn sweep_fraction(
    value: f64,
    min: f64,
    max: f64,
) -> f32 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0) as f32
}

/// Format a range bound compactly: whole numbers without decimals.
fn format_bound(value: f64) -> String<16> {
    let mut s = String::new();
    if value.fract() == 0.0 && value.abs() < 1e9 {
        write!(s, "{value:.0}").ok();
    } else {
        write!(s, "{value:.1}").ok();
    }
    s
}

pub struct KnobWidget {
    center: Point,
    diameter: u32,
    track_width: u32,
    size: Size,
    value_font: ScaledFont,
    theme: Theme,
}

impl KnobWidget {
    pub fn new(
        size: Size,
        theme: Theme,
    ) -> Self {
        let smaller = size.width.min(size.height) as f32;
        let radius = smaller * RADIUS_RATIO;
        Self {
            center: Point::new(size.width as i32 / 2, size.height as i32 / 2),
            diameter: (radius * 2.0) as u32,
            track_width: ((radius * TRACK_WIDTH_RATIO).round() as u32).max(1),
            size,
            value_font: value_font((smaller * VALUE_TEXT_RATIO) as u32),
            theme,
        }
    }

    pub const fn theme(&self) -> Theme { self.theme }

    pub const fn set_theme(
        &mut self,
        theme: Theme,
    ) {
        self.theme = theme;
    }

    pub const fn diameter(&self) -> u32 { self.diameter }

    pub const fn track_width(&self) -> u32 { self.track_width }

    pub fn paint<D>(
        &self,
        target: &mut D,
        ctx: &PaintContext<'_>,
    ) -> Result<(), RenderSkip>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let (reading, value) = ctx.current_numeric()?;
        let (min, max) = ctx.range();

        target.clear(BLACK).ok();

        Arc::with_center(self.center, self.diameter, START_DEG.deg(), SWEEP_DEG.deg())
            .into_styled(PrimitiveStyle::with_stroke(self.theme.background, self.track_width))
            .draw(target)
            .ok();

        let fill = sweep_fraction(value, min, max);
        if fill > 0.0 {
            Arc::with_center(self.center, self.diameter, START_DEG.deg(), (SWEEP_DEG * fill).deg())
                .into_styled(PrimitiveStyle::with_stroke(self.theme.foreground, self.track_width))
                .draw(target)
                .ok();
        }

        let label = reading.value().to_string();
        draw_scaled_text(target, &label, self.center, self.value_font, self.theme.foreground);

        self.draw_range_labels(target, min, max);
        Ok(())
    }

    fn draw_range_labels<D>(
        &self,
        target: &mut D,
        min: f64,
        max: f64,
    ) where
        D: DrawTarget<Color = Rgb888>,
    {
        let style = MonoTextStyle::new(RANGE_LABEL_FONT, self.theme.foreground);
        let bottom = self.size.height as i32 - LABEL_MARGIN;

        Text::with_text_style(&format_bound(min), Point::new(LABEL_MARGIN, bottom), style, BOTTOM_LEFT)
            .draw(target)
            .ok();
        Text::with_text_style(
            &format_bound(max),
            Point::new(self.size.width as i32 - LABEL_MARGIN, bottom),
            style,
            BOTTOM_RIGHT,
        )
        .draw(target)
        .ok();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
