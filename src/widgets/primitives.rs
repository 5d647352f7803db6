//! Text drawing shared by the paint routines.
//!
//! All value text is drawn centered on a point, through
//! [`Magnify`](crate::canvas::Magnify) so a fixed-size mono font can reach the
//! requested pixel height. Outlines and shadows are made by drawing the same
//! string at small offsets underneath the fill; offsets are in real pixels, so
//! an outline stays one pixel wide whatever the magnification.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use crate::canvas::Magnify;
use crate::styles::{CENTERED, ScaledFont};

/// Neighbor offsets forming a one-pixel ring around the text.
const OUTLINE_OFFSETS: [(i32, i32); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// Distance of the shadow ring from the glyphs.
const SHADOW_SPREAD: i32 = 2;

/// Draw `text` centered on `center` in a single color.
pub fn draw_scaled_text<D>(
    target: &mut D,
    text: &str,
    center: Point,
    font: ScaledFont,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    let style = MonoTextStyle::new(font.font, color);
    let mut magnified = Magnify::new(target, font.scale, center);
    Text::with_text_style(text, Point::zero(), style, CENTERED)
        .draw(&mut magnified)
        .ok();
}

/// Draw `text` centered on `center`: a ring in `outline`, then `fill` on top.
pub fn draw_outlined_text<D>(
    target: &mut D,
    text: &str,
    center: Point,
    font: ScaledFont,
    fill: Rgb888,
    outline: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    for (dx, dy) in OUTLINE_OFFSETS {
        draw_scaled_text(target, text, center + Point::new(dx, dy), font, outline);
    }
    draw_scaled_text(target, text, center, font, fill);
}

/// Outlined text over a wider ring in `shadow`, for text drawn over a busy
/// background such as the sparkline.
pub fn draw_shadowed_text<D>(
    target: &mut D,
    text: &str,
    center: Point,
    font: ScaledFont,
    fill: Rgb888,
    outline: Rgb888,
    shadow: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    for (dx, dy) in OUTLINE_OFFSETS {
        let offset = Point::new(dx * SHADOW_SPREAD, dy * SHADOW_SPREAD);
        draw_scaled_text(target, text, center + offset, font, shadow);
    }
    draw_outlined_text(target, text, center, font, fill, outline);
}

// =============================================================================
// Unit Tests
// =============================================================================
