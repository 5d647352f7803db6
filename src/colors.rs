//! Color constants and color-string parsing.
//!
//! Key bitmaps are encoded as 24-bit PNGs, so everything is drawn in `Rgb888`
//! rather than the 16-bit formats small SPI panels use.
//!
//! The keypad host hands colors over as CSS-style hex strings from its color
//! picker (`"#ff8800"`). [`parse_color`] accepts the long and the short form;
//! anything else is rejected and the caller keeps its previous color.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

// =============================================================================
// Standard Colors
// =============================================================================

/// Pure black. Canvas clear color and text outline on the sparkline.
pub const BLACK: Rgb888 = Rgb888::BLACK;

/// Pure white.
pub const WHITE: Rgb888 = Rgb888::WHITE;

// =============================================================================
// Theme Defaults
// =============================================================================

/// Default foreground (`#ff8800`).
pub const ORANGE: Rgb888 = Rgb888::new(0xff, 0x88, 0x00);

/// Default background (`#181818`), a near-black that still shows as a track
/// on the knob.
pub const CHARCOAL: Rgb888 = Rgb888::new(0x18, 0x18, 0x18);

/// Parse `#rrggbb` or `#rgb` (leading `#` optional, case-insensitive).
pub fn parse_color(text: &str) -> Option<Rgb888> {
    let hex = text.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb888::new(r, g, b))
        }
        3 => {
            // Each nibble is doubled: "f80" -> "ff8800"
            let mut channels = [0u8; 3];
            for (channel, digit) in channels.iter_mut().zip(hex.chars()) {
                let nibble = digit.to_digit(16)? as u8;
                *channel = nibble << 4 | nibble;
            }
            Some(Rgb888::new(channels[0], channels[1], channels[2]))
        }
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
