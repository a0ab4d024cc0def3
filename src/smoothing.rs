//! Exponential pointer smoothing shared by all three renderers.
//!
//! Every frame `current += (target - current) * factor`. With a factor in
//! (0, 1) the distance to the target shrinks by `1 - factor` per step, so the
//! value approaches the latest target monotonically and never overshoots.

use glam::Vec2;

use crate::error::{RenderError, Result};

/// Below this distance the value snaps onto the target.
const SNAP_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    current: Vec2,
    target: Vec2,
    factor: f32,
}

impl Smoothed {
    pub fn new(initial: Vec2, factor: f32) -> Result<Self> {
        if !(factor > 0.0 && factor < 1.0) {
            return Err(RenderError::invalid(format!(
                "smoothing factor {factor} outside (0, 1)"
            )));
        }
        Ok(Self {
            current: initial,
            target: initial,
            factor,
        })
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    /// Advance one frame and return the new value.
    pub fn step(&mut self) -> Vec2 {
        let delta = self.target - self.current;
        if delta.length_squared() <= SNAP_EPSILON * SNAP_EPSILON {
            self.current = self.target;
        } else {
            self.current += delta * self.factor;
        }
        self.current
    }

    /// Jump straight to `value`, e.g. after a resize invalidated pixel coordinates.
    pub fn reset(&mut self, value: Vec2) {
        self.current = value;
        self.target = value;
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }
}
