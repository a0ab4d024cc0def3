//! Seams between the renderers and the browser.
//!
//! The renderers only talk to these traits; `wasm::canvas` and `wasm::gl`
//! implement them over `web-sys`, and the tests implement them with
//! recording fakes.

use crate::color::Rgb;
use crate::error::Result;

/// Canvas compositing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// `source-over`
    Normal,
    /// `lighter`: overlapping beams add up toward white.
    Additive,
}

impl Composite {
    pub fn css(self) -> &'static str {
        match self {
            Self::Normal => "source-over",
            Self::Additive => "lighter",
        }
    }
}

/// One color stop of a beam gradient, offset in 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgb,
    pub alpha: f32,
}

/// Where and how to paint one beam this frame.
///
/// The beam is an ellipse of radius `radius` centred on (`x`, `y`), rotated
/// by `rotation` and then stretched vertically by `stretch`.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamPose {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub rotation: f32,
    pub stretch: f32,
    pub opacity: f32,
    pub stops: Vec<GradientStop>,
}

/// A 2D drawing surface backed by a canvas.
pub trait Surface2d {
    /// Backing-store size in device pixels.
    fn backing_size(&self) -> (u32, u32);
    fn set_backing_size(&mut self, width: u32, height: u32);
    fn set_composite(&mut self, mode: Composite);
    fn set_blur(&mut self, radius: f32);
    /// Fill the whole surface with an opaque color.
    fn fill(&mut self, color: Rgb);
    fn draw_radial_beam(&mut self, pose: &BeamPose);
    fn draw_linear_beam(&mut self, pose: &BeamPose);
}

/// Something that can hand out a 2D surface, normally a `<canvas>`.
pub trait CanvasTarget {
    type Surface: Surface2d;

    /// Layout size of the container in CSS pixels.
    fn layout_size(&self) -> (u32, u32);

    /// `Ok(None)` when the environment has no 2D context.
    fn surface_2d(&self) -> Result<Option<Self::Surface>>;
}

/// Clamp a layout size to something a canvas can be sized to.
pub fn backing_dims(width: f64, height: f64) -> (u32, u32) {
    let clamp = |v: f64| if v.is_finite() { v.round().max(1.0) as u32 } else { 1 };
    (clamp(width), clamp(height))
}

/// Viewport as every renderer stores it: never zero on either axis.
pub fn clamp_viewport((width, height): (u32, u32)) -> (u32, u32) {
    (width.max(1), height.max(1))
}
