//! Off-screen drawing surface for one key.
//!
//! [`KeyCanvas`] is a plain `Rgb888` framebuffer implementing
//! embedded-graphics' `DrawTarget`, so every primitive, font and widget from the
//! embedded-graphics ecosystem can paint into it. When a key has been redrawn the
//! binding takes a [`KeyFrame`] snapshot and hands it to the host sink, which
//! encodes it (PNG, or a PNG data URL as keypad hosts expect).
//!
//! [`Magnify`] is a `DrawTarget` adapter that draws each logical pixel as an
//! N×N block. Mono fonts only come in fixed sizes; drawing through `Magnify` is
//! how value text reaches 30% of the key height.

use std::convert::Infallible;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};

use crate::colors::BLACK;
use crate::error::Result;

// =============================================================================
// Key Canvas
// =============================================================================

/// Off-screen framebuffer for one key. Starts out black.
pub struct KeyCanvas {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl KeyCanvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![BLACK; (size.width * size.height) as usize],
        }
    }

    /// Square canvas, the shape of every keypad key.
    pub fn square(edge: u32) -> Self { Self::new(Size::new_equal(edge)) }

    /// Color at `point`, `None` outside the canvas.
    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb888> {
        index_of(self.size, point).map(|i| self.pixels[i])
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> KeyFrame {
        KeyFrame {
            size: self.size,
            pixels: self.pixels.clone(),
        }
    }
}

fn index_of(
    size: Size,
    point: Point,
) -> Option<usize> {
    let x = u32::try_from(point.x).ok()?;
    let y = u32::try_from(point.y).ok()?;
    (x < size.width && y < size.height).then(|| (y * size.width + x) as usize)
}

impl OriginDimensions for KeyCanvas {
    fn size(&self) -> Size { self.size }
}

impl DrawTarget for KeyCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        // Out-of-bounds pixels are clipped silently
        for Pixel(point, color) in pixels {
            if let Some(i) = index_of(self.size, point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

// =============================================================================
// Magnify Adapter
// =============================================================================

/// Draws every logical pixel as a `scale`×`scale` block at
/// `origin + point * scale` on the wrapped target.
pub struct Magnify<'a, D> {
    target: &'a mut D,
    scale: u32,
    origin: Point,
}

impl<'a, D: DrawTarget> Magnify<'a, D> {
    pub fn new(
        target: &'a mut D,
        scale: u32,
        origin: Point,
    ) -> Self {
        Self {
            target,
            scale: scale.max(1),
            origin,
        }
    }
}

impl<D: DrawTarget> Dimensions for Magnify<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        // Logical area that lands on the target, padded by one block each way
        let target = self.target.bounding_box();
        let s = self.scale as i32;
        let top_left = Point::new(
            (target.top_left.x - self.origin.x).div_euclid(s) - 1,
            (target.top_left.y - self.origin.y).div_euclid(s) - 1,
        );
        let size = Size::new(target.size.width / self.scale + 3, target.size.height / self.scale + 3);
        Rectangle::new(top_left, size)
    }
}

impl<D: DrawTarget> DrawTarget for Magnify<'_, D> {
    type Color = D::Color;
    type Error = D::Error;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let block = Size::new_equal(self.scale);
        for Pixel(point, color) in pixels {
            let top_left = self.origin + point * self.scale as i32;
            self.target.fill_solid(&Rectangle::new(top_left, block), color)?;
        }
        Ok(())
    }
}

// =============================================================================
// Key Frame
// =============================================================================

/// Immutable snapshot of a key canvas, ready to be encoded for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl KeyFrame {
    pub const fn size(&self) -> Size { self.size }

    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb888> {
        index_of(self.size, point).map(|i| self.pixels[i])
    }

    /// Packed `RGBRGB...` bytes, row-major.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| [c.r(), c.g(), c.b()]).collect()
    }

    /// Encode as a 24-bit PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            &self.to_rgb_bytes(),
            self.size.width,
            self.size.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(png)
    }

    /// `data:image/png;base64,...`, the form keypad hosts take for key images.
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.encode_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

impl Drawable for KeyFrame {
    type Color = Rgb888;
    type Output = ();

    fn draw<D>(
        &self,
        target: &mut D,
    ) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        target.fill_contiguous(&Rectangle::new(Point::zero(), self.size), self.pixels.iter().copied())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
