//! Paint routines for key bitmaps.
//!
//! - [`text`]: the value string, large and centered
//! - [`knob`]: radial gauge over the value's range
//! - [`sparkline`]: line chart of the recent history
//! - [`primitives`]: outlined and shadowed text shared by all three
//!
//! Every routine is generic over an `Rgb888` `DrawTarget`, clears it before
//! drawing, and returns [`RenderSkip`](crate::render::RenderSkip) without
//! touching it when the current value cannot be drawn. Draw errors from the
//! target are ignored; the key canvas cannot fail.

pub mod knob;
pub mod primitives;
pub mod sparkline;
pub mod text;

pub use knob::KnobWidget;
