//! Text styles and font selection.
//!
//! # Fonts
//!
//! Sensor value strings carry their unit (`"45.0 °C"`, `"1200 RPM"`), so value
//! text uses the ISO 8859-1 variants of the embedded-graphics fonts, which
//! include `°`. Range labels on the knob are plain digits and use `ProFont`.
//!
//! Mono fonts come in fixed sizes. Renderers ask for a pixel height and get
//! back the font plus an integer magnification ([`ScaledFont`]); the
//! [`Magnify`](crate::canvas::Magnify) adapter does the scaling at draw time.
//!
//! # Alignment
//!
//! All value text is anchored at its center point, so the shared style is
//! center-aligned with a middle baseline, the equivalent of
//! `textAlign = "center"; textBaseline = "middle"`.

use embedded_graphics::{
    mono_font::{
        MonoFont,
        iso_8859_1::{FONT_6X10, FONT_10X20},
    },
    text::{Alignment, Baseline, TextStyle, TextStyleBuilder},
};
use profont::PROFONT_9_POINT;

// =============================================================================
// Text Alignment Styles
// =============================================================================

/// Centered on both axes. Used for every value string.
pub const CENTERED: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Middle)
    .build();

/// Left aligned, bottom baseline. Knob minimum label.
pub const BOTTOM_LEFT: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Bottom)
    .build();

/// Right aligned, bottom baseline. Knob maximum label.
pub const BOTTOM_RIGHT: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Right)
    .baseline(Baseline::Bottom)
    .build();

// =============================================================================
// Fonts
// =============================================================================

/// Small digits for knob range labels.
pub const RANGE_LABEL_FONT: &MonoFont<'static> = &PROFONT_9_POINT;

/// Small Latin-1 value font (6×10).
pub const VALUE_FONT_SMALL: &MonoFont<'static> = &FONT_6X10;

/// Large Latin-1 value font (10×20).
pub const VALUE_FONT_LARGE: &MonoFont<'static> = &FONT_10X20;

/// A mono font together with an integer magnification.
#[derive(Clone, Copy)]
pub struct ScaledFont {
    pub font: &'static MonoFont<'static>,
    pub scale: u32,
}

impl ScaledFont {
    /// Rendered glyph height in pixels.
    pub const fn height(&self) -> u32 { self.font.character_size.height * self.scale }
}

/// Pick the value font whose magnified height comes closest to `px` without
/// exceeding it. Heights below the small font's native size still get the
/// small font at 1×, so text never disappears on tiny keys.
pub fn value_font(px: u32) -> ScaledFont {
    let large = VALUE_FONT_LARGE.character_size.height;
    let small = VALUE_FONT_SMALL.character_size.height;

    if px >= large {
        ScaledFont { font: VALUE_FONT_LARGE, scale: px / large }
    } else {
        ScaledFont { font: VALUE_FONT_SMALL, scale: (px / small).max(1) }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
