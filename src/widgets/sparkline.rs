//! Scrolling line chart of the binding's history.
//!
//! Layout, back to front:
//!
//! 1. Vertical gridlines under every sample whose ordinal is a multiple of
//!    [`GRIDLINE_SPACING`], background color, 3px
//! 2. Baseline at the range minimum (the bottom row), background color, 3px
//! 3. History polyline, oldest at the left, foreground color, 1px
//! 4. Current value string at 20% of the height, foreground over a black
//!    outline and shadow
//!
//! The horizontal pitch comes from the history capacity rather than the
//! current sample count, so a young history fills from the left and the chart
//! only scrolls once it is full. Samples without a numeric value leave a gap in
//! the point list; their neighbors are joined directly.
//!
//! The vertical scale is the current reading's own min/max. The key's range
//! overrides only apply to the knob.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Polyline};

use super::primitives::draw_shadowed_text;
use crate::colors::BLACK;
use crate::config::{GRIDLINE_SPACING, HISTORY_CAPACITY};
use crate::render::{PaintContext, RenderSkip};
use crate::styles::value_font;

const GRID_STROKE: u32 = 3;
const LINE_STROKE: u32 = 1;
const OVERLAY_HEIGHT_RATIO: f32 = 0.15;
const OVERLAY_Y_RATIO: f32 = 0.2;

/// Horizontal distance between samples for a chart `width` pixels wide.
pub fn pitch(width: u32) -> f32 { width.saturating_sub(1) as f32 / (HISTORY_CAPACITY as f32 + 0.1) }

/// Row for `value` on a chart `height` pixels tall, clamped to the chart.
/// `min` maps to the bottom row and `max` to the top row.
pub fn row_for(
    value: f64,
    min: f64,
    max: f64,
    height: u32,
) -> i32 {
    let bottom = height.saturating_sub(1) as f64;
    let span = if max > min { max - min } else { 1.0 };
    let y = bottom - (value - min) / span * bottom;
    y.round().clamp(0.0, bottom) as i32
}

pub fn paint<D>(
    target: &mut D,
    ctx: &PaintContext<'_>,
) -> Result<(), RenderSkip>
where
    D: DrawTarget<Color = Rgb888>,
{
    let (current, _) = ctx.current_numeric()?;
    let (min, max) = ctx.reading_range();
    let Size { width, height } = target.bounding_box().size;
    let step = pitch(width);
    let bottom = height.saturating_sub(1) as i32;
    let x_at = |i: usize| (i as f32 * step) as i32;

    target.clear(BLACK).ok();

    let grid = PrimitiveStyle::with_stroke(ctx.theme.background, GRID_STROKE);
    for (i, sample) in ctx.history.iter().enumerate() {
        if sample.ordinal() % GRIDLINE_SPACING == 0 {
            let x = x_at(i);
            Line::new(Point::new(x, 0), Point::new(x, bottom))
                .into_styled(grid)
                .draw(target)
                .ok();
        }
    }

    let base_y = row_for(min, min, max, height);
    Line::new(Point::new(0, base_y), Point::new(width as i32 - 1, base_y))
        .into_styled(grid)
        .draw(target)
        .ok();

    let points: Vec<Point> = ctx
        .history
        .iter()
        .enumerate()
        .filter_map(|(i, sample)| {
            let value = sample.numeric_value()?;
            Some(Point::new(x_at(i), row_for(value, min, max, height)))
        })
        .collect();
    Polyline::new(&points)
        .into_styled(PrimitiveStyle::with_stroke(ctx.theme.foreground, LINE_STROKE))
        .draw(target)
        .ok();

    let smaller = width.min(height) as f32;
    let font = value_font((smaller * OVERLAY_HEIGHT_RATIO) as u32);
    let center = Point::new(width as i32 / 2, (height as f32 * OVERLAY_Y_RATIO) as i32);
    let label = current.value().to_string();
    draw_shadowed_text(target, &label, center, font, ctx.theme.foreground, BLACK, BLACK);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::canvas::KeyCanvas;
    use crate::colors::{CHARCOAL, ORANGE, WHITE};
    use crate::reading::{SensorReading, SensorValue};
    use crate::render::Theme;

    /// History of `values` with ordinals 0, 1, 2, ...
    fn history(
        values: &[SensorValue],
        range: (f64, f64),
    ) -> VecDeque<SensorReading> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SensorReading::new("Load", v.clone()).with_range(range.0, range.1).with_ordinal(i as u64))
            .collect()
    }

    fn paint_history(
        canvas: &mut KeyCanvas,
        history: &VecDeque<SensorReading>,
    ) -> Result<(), RenderSkip> {
        paint_with_overrides(canvas, history, (None, None))
    }

    fn paint_with_overrides(
        canvas: &mut KeyCanvas,
        history: &VecDeque<SensorReading>,
        overrides: (Option<f64>, Option<f64>),
    ) -> Result<(), RenderSkip> {
        let ctx = PaintContext {
            history,
            theme: Theme::default(),
            min_override: overrides.0,
            max_override: overrides.1,
        };
        paint(canvas, &ctx)
    }

    fn numbers(values: &[f64]) -> Vec<SensorValue> { values.iter().map(|&v| SensorValue::Number(v)).collect() }

    #[test]
    fn test_pitch_spreads_capacity_over_width() {
        let p = pitch(144);
        assert!((p - 143.0 / 60.1).abs() < 1e-4);
        assert!(((HISTORY_CAPACITY - 1) as f32 * p) < 143.0, "Last sample must land inside the chart");
    }

    #[test]
    fn test_row_mapping() {
        assert_eq!(row_for(0.0, 0.0, 100.0, 144), 143, "Minimum maps to the bottom row");
        assert_eq!(row_for(100.0, 0.0, 100.0, 144), 0, "Maximum maps to the top row");
        assert_eq!(row_for(200.0, 0.0, 100.0, 144), 0, "Out of range clamps");
        assert_eq!(row_for(-50.0, 0.0, 100.0, 144), 143);
    }

    #[test]
    fn test_flat_history_clamps_range() {
        // min == max == 5 must not divide by zero; range becomes [5, 6]
        let h = history(&numbers(&[5.0, 5.0, 5.0]), (5.0, 5.0));
        let mut canvas = KeyCanvas::square(144);
        assert_eq!(paint_history(&mut canvas, &h), Ok(()));
        assert_eq!(canvas.pixel(Point::new(3, 143)), Some(ORANGE), "Flat line sits on the bottom row");
    }

    #[test]
    fn test_range_overrides_do_not_rescale() {
        let h = history(&numbers(&[20.0, 60.0, 40.0]), (0.0, 100.0));
        let mut plain = KeyCanvas::square(144);
        let mut overridden = KeyCanvas::square(144);
        paint_history(&mut plain, &h).ok();
        paint_with_overrides(&mut overridden, &h, (Some(30.0), Some(50.0))).ok();
        assert_eq!(plain.snapshot(), overridden.snapshot(), "Chart scales by the reading's own range");
    }

    #[test]
    fn test_gridlines_follow_ordinals() {
        let values = numbers(&[0.0; 30]);
        let h = history(&values, (0.0, 10.0));
        let mut canvas = KeyCanvas::square(144);
        paint_history(&mut canvas, &h).ok();

        let x20 = (20.0 * pitch(144)) as i32;
        assert_eq!(canvas.pixel(Point::new(x20, 80)), Some(CHARCOAL), "Ordinal 20 gets a gridline");
        assert_eq!(canvas.pixel(Point::new(0, 80)), Some(CHARCOAL), "Ordinal 0 gets a gridline");
        assert_eq!(canvas.pixel(Point::new(30, 80)), Some(BLACK), "Other ordinals do not");
    }

    #[test]
    fn test_line_scrolls_with_ordinal_not_index() {
        // Ordinals 5..35: the gridline moves to wherever ordinal 20 sits
        let h: VecDeque<_> = (5..35)
            .map(|ord| SensorReading::new("Load", 0.0).with_range(0.0, 10.0).with_ordinal(ord))
            .collect();
        let mut canvas = KeyCanvas::square(144);
        paint_history(&mut canvas, &h).ok();

        let x = (15.0 * pitch(144)) as i32;
        assert_eq!(canvas.pixel(Point::new(x, 80)), Some(CHARCOAL));
        assert_eq!(canvas.pixel(Point::new(0, 80)), Some(BLACK), "Oldest sample is ordinal 5, no gridline");
    }

    #[test]
    fn test_polyline_tracks_values() {
        let h = history(&numbers(&[0.0, 10.0]), (0.0, 10.0));
        let mut canvas = KeyCanvas::square(144);
        paint_history(&mut canvas, &h).ok();

        let x1 = pitch(144) as i32;
        assert_eq!(canvas.pixel(Point::new(x1, 0)), Some(ORANGE), "Second sample at the top");
    }

    #[test]
    fn test_non_numeric_samples_are_skipped() {
        let values = [SensorValue::Number(1.0), SensorValue::from("n/a"), SensorValue::Number(2.0)];
        let h = history(&values, (0.0, 10.0));
        let mut canvas = KeyCanvas::square(144);
        assert_eq!(paint_history(&mut canvas, &h), Ok(()), "Older non-numeric samples do not block the chart");
    }

    #[test]
    fn test_non_numeric_current_value_skips() {
        let values = [SensorValue::Number(1.0), SensorValue::from("n/a")];
        let h = history(&values, (0.0, 10.0));
        let mut canvas = KeyCanvas::square(144);
        canvas.clear(WHITE).ok();
        assert_eq!(paint_history(&mut canvas, &h), Err(RenderSkip::NotNumeric));
        assert_eq!(canvas.pixel(Point::zero()), Some(WHITE));
    }

    #[test]
    fn test_overlay_text_in_upper_fifth() {
        let h = history(&numbers(&[0.0]), (0.0, 10.0));
        let mut canvas = KeyCanvas::square(144);
        paint_history(&mut canvas, &h).ok();

        let lit_rows: Vec<i32> = (0..144)
            .filter(|&y| (40..104).any(|x| canvas.pixel(Point::new(x, y)) == Some(ORANGE)))
            .collect();
        assert!(lit_rows.iter().all(|&y| y < 60), "Overlay text should sit near 20% of the height");
        assert!(!lit_rows.is_empty());
    }
}
