//! Plain text: the current value string, centered, outlined in the
//! background color and filled in the foreground color.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use super::primitives::draw_outlined_text;
use crate::colors::BLACK;
use crate::render::{PaintContext, RenderSkip};
use crate::styles::value_font;

/// Text height as a fraction of the key's shorter side.
const TEXT_HEIGHT_RATIO: f32 = 0.3;

pub fn paint<D>(
    target: &mut D,
    ctx: &PaintContext<'_>,
) -> Result<(), RenderSkip>
where
    D: DrawTarget<Color = Rgb888>,
{
    let (reading, _) = ctx.current_numeric()?;
    let area = target.bounding_box();
    let smaller = area.size.width.min(area.size.height);
    let font = value_font((smaller as f32 * TEXT_HEIGHT_RATIO) as u32);

    target.clear(BLACK).ok();
    let label = reading.value().to_string();
    draw_outlined_text(target, &label, area.center(), font, ctx.theme.foreground, ctx.theme.background);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
