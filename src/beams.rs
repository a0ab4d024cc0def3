//! Canvas beam renderer: a drifting curtain of blurred, additively blended
//! streaks over an opaque dark background.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::color::Rgb;
use crate::config::{BeamConfig, BeamShape, Range};
use crate::error::{ContextKind, RenderError, Result};
use crate::lifecycle::{degrade, MountOutcome, Renderer};
use crate::noise::Simplex2;
use crate::rng::{self, BeamRng};
use crate::smoothing::Smoothed;
use crate::surface::{clamp_viewport, BeamPose, CanvasTarget, Composite, GradientStop, Surface2d};

/// Noise time scale for drift; slow enough to read as wandering, not jitter.
const DRIFT_RATE: f32 = 0.05;
const DRIFT_OCTAVES: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    /// Normalized horizontal position, 0..1.
    pub x: f32,
    /// Normalized vertical position, 0..1.
    pub y: f32,
    /// Depth, 0 (far) ..1 (near). Scales parallax.
    pub z: f32,
    /// Pixel width at the viewport the field was generated for.
    pub width: f32,
    pub height: f32,
    /// Radians.
    pub angle: f32,
    pub colors: Vec<Rgb>,
    pub sway_phase: f32,
    pub sway_speed: f32,
    pub pulse_phase: f32,
    pub pulse_speed: f32,
    pub opacity: Range,
    pub drift_offset: f32,
}

impl Beam {
    fn random(rng: &mut BeamRng, config: &BeamConfig, viewport: Vec2) -> Self {
        let pick = |rng: &mut BeamRng, r: Range| rng.gen_range(r.min..=r.max);

        let colors = config.palette[rng.gen_range(0..config.palette.len())].clone();
        let lo = pick(rng, config.opacity);
        let hi = pick(rng, config.opacity);
        Self {
            x: rng.gen_range(0.0..=1.0),
            y: rng.gen_range(0.2..=0.8),
            z: rng.gen_range(0.0..=1.0),
            width: pick(rng, config.width) * viewport.x,
            height: pick(rng, config.height) * viewport.y,
            angle: pick(rng, config.angle).to_radians(),
            colors,
            sway_phase: rng.gen_range(0.0..TAU),
            sway_speed: pick(rng, config.sway_speed),
            pulse_phase: rng.gen_range(0.0..TAU),
            pulse_speed: pick(rng, config.pulse_speed),
            opacity: Range::new(lo.min(hi), lo.max(hi)),
            drift_offset: rng.gen_range(0.0..256.0),
        }
    }

    /// Opacity at `time` seconds. A full pulse cycle sweeps the whole bound.
    pub fn opacity_at(&self, time: f32) -> f32 {
        let wave = 0.5 + 0.5 * (time * self.pulse_speed + self.pulse_phase).sin();
        let Range { min, max } = self.opacity;
        (min + (max - min) * wave).clamp(min, max)
    }

    pub fn sway_at(&self, time: f32) -> f32 {
        (time * self.sway_speed + self.sway_phase).sin()
    }
}

/// Pool of beams plus the per-field motion parameters.
pub struct BeamField {
    beams: Vec<Beam>,
    viewport: Vec2,
    noise: Simplex2,
    shape: BeamShape,
    sway_amplitude: f32,
    sway_tilt: f32,
    drift: f32,
    parallax: f32,
}

impl BeamField {
    /// Deterministic for a given (config, viewport, seed). Beams come out
    /// sorted far to near so nearer beams paint last.
    pub fn generate(config: &BeamConfig, viewport: (u32, u32), seed: u64) -> Self {
        let size = Vec2::new(viewport.0 as f32, viewport.1 as f32);
        let mut rng = rng::seeded(seed);
        let mut beams: Vec<Beam> = (0..config.count)
            .map(|_| Beam::random(&mut rng, config, size))
            .collect();
        beams.sort_by(|a, b| a.z.total_cmp(&b.z));

        Self {
            beams,
            viewport: size,
            noise: Simplex2::new(seed),
            shape: config.shape,
            sway_amplitude: config.sway_amplitude,
            sway_tilt: config.sway_tilt,
            drift: config.drift,
            parallax: config.parallax,
        }
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn shape(&self) -> BeamShape {
        self.shape
    }

    /// `pointer` is the smoothed pointer offset from the container centre,
    /// -1..1 on each axis.
    pub fn pose(&self, beam: &Beam, time: f32, pointer: Vec2) -> BeamPose {
        let sway = beam.sway_at(time);
        let drift = Vec2::new(
            self.noise.fbm(beam.drift_offset, time * DRIFT_RATE, DRIFT_OCTAVES),
            0.5 * self.noise.fbm(beam.drift_offset + 31.7, time * DRIFT_RATE, DRIFT_OCTAVES),
        ) * self.drift;
        let parallax = pointer * beam.z * self.parallax;

        let x = (beam.x + sway * self.sway_amplitude + drift.x) * self.viewport.x + parallax.x;
        let y = (beam.y + drift.y) * self.viewport.y + parallax.y;
        let radius = (beam.width * 0.5).max(0.5);
        let opacity = beam.opacity_at(time);

        BeamPose {
            x,
            y,
            radius,
            rotation: beam.angle + sway * self.sway_tilt,
            stretch: beam.height / (radius * 2.0),
            opacity,
            stops: gradient_stops(self.shape, &beam.colors, opacity),
        }
    }

    pub fn poses(&self, time: f32, pointer: Vec2) -> impl Iterator<Item = BeamPose> + '_ {
        self.beams.iter().map(move |b| self.pose(b, time, pointer))
    }
}

/// Color stops for one beam, fading to transparent at the edge(s).
pub fn gradient_stops(shape: BeamShape, colors: &[Rgb], opacity: f32) -> Vec<GradientStop> {
    let Some(&last) = colors.last() else {
        return Vec::new();
    };
    let n = colors.len() as f32;
    let mut stops = Vec::with_capacity(colors.len() + 2);
    match shape {
        BeamShape::Radial => {
            for (i, &color) in colors.iter().enumerate() {
                stops.push(GradientStop {
                    offset: 0.6 * i as f32 / n,
                    color,
                    alpha: opacity,
                });
            }
        }
        BeamShape::Linear => {
            stops.push(GradientStop { offset: 0.0, color: colors[0], alpha: 0.0 });
            let span = if colors.len() > 1 { 0.6 / (n - 1.0) } else { 0.0 };
            for (i, &color) in colors.iter().enumerate() {
                stops.push(GradientStop {
                    offset: if colors.len() > 1 { 0.2 + span * i as f32 } else { 0.5 },
                    color,
                    alpha: opacity,
                });
            }
        }
    }
    stops.push(GradientStop { offset: 1.0, color: last, alpha: 0.0 });
    stops
}

/// Pointer position in container pixels to an offset from centre in -1..1.
pub fn centre_offset(x: f32, y: f32, viewport: (u32, u32)) -> Vec2 {
    let size = Vec2::new(viewport.0.max(1) as f32, viewport.1.max(1) as f32);
    ((Vec2::new(x, y) / size - 0.5) * 2.0).clamp(Vec2::NEG_ONE, Vec2::ONE)
}

pub struct BeamRenderer<S> {
    surface: S,
    config: BeamConfig,
    seed: u64,
    field: BeamField,
    pointer: Smoothed,
    viewport: (u32, u32),
}

impl<S: Surface2d> BeamRenderer<S> {
    pub fn mount<T>(target: &T, config: BeamConfig) -> MountOutcome<Self>
    where
        T: CanvasTarget<Surface = S>,
    {
        degrade("beams", Self::try_mount(target, config))
    }

    fn try_mount<T>(target: &T, config: BeamConfig) -> Result<Self>
    where
        T: CanvasTarget<Surface = S>,
    {
        config.validate()?;
        let mut surface = target
            .surface_2d()?
            .ok_or(RenderError::ContextUnavailable(ContextKind::Canvas2d))?;
        let viewport = clamp_viewport(target.layout_size());
        surface.set_backing_size(viewport.0, viewport.1);

        let seed = config.seed.unwrap_or_else(rng::entropy_seed);
        let field = BeamField::generate(&config, viewport, seed);
        let pointer = Smoothed::new(Vec2::ZERO, config.pointer_smoothing)?;
        log::debug!(
            "beam field ready: {} beams, seed {seed:#x}, {}x{}",
            config.count,
            viewport.0,
            viewport.1
        );

        Ok(Self {
            surface,
            config,
            seed,
            field,
            pointer,
            viewport,
        })
    }

    pub fn field(&self) -> &BeamField {
        &self.field
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn pointer(&self) -> &Smoothed {
        &self.pointer
    }
}

impl<S: Surface2d> Renderer for BeamRenderer<S> {
    fn frame(&mut self, elapsed_ms: f64) {
        let time = (elapsed_ms / 1000.0) as f32;
        let pointer = self.pointer.step();

        self.surface.set_composite(Composite::Normal);
        self.surface.set_blur(0.0);
        self.surface.fill(self.config.background);

        self.surface.set_composite(Composite::Additive);
        self.surface.set_blur(self.config.blur);
        for pose in self.field.poses(time, pointer) {
            match self.field.shape() {
                BeamShape::Radial => self.surface.draw_radial_beam(&pose),
                BeamShape::Linear => self.surface.draw_linear_beam(&pose),
            }
        }
        self.surface.set_blur(0.0);
        self.surface.set_composite(Composite::Normal);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = clamp_viewport((width, height));
        self.surface.set_backing_size(self.viewport.0, self.viewport.1);
        // Positions are normalized; sizes are regenerated for the new viewport.
        self.field = BeamField::generate(&self.config, self.viewport, self.seed);
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.set_target(centre_offset(x, y, self.viewport));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeamPreset;

    #[test]
    fn radial_stops_fade_at_rim() {
        let colors = [Rgb::hex(0xff0000), Rgb::hex(0x0000ff)];
        let stops = gradient_stops(BeamShape::Radial, &colors, 0.3);
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0].offset, 0.0);
        assert_eq!(stops[0].alpha, 0.3);
        let rim = stops.last().unwrap();
        assert_eq!((rim.offset, rim.alpha), (1.0, 0.0));
        assert!(stops.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn linear_stops_fade_at_both_ends() {
        let colors = [Rgb::hex(0x22d3ee), Rgb::hex(0x6366f1), Rgb::hex(0xa855f7)];
        let stops = gradient_stops(BeamShape::Linear, &colors, 0.2);
        assert_eq!(stops.first().unwrap().alpha, 0.0);
        assert_eq!(stops.last().unwrap().alpha, 0.0);
        assert!(stops[1..stops.len() - 1].iter().all(|s| s.alpha == 0.2));
        assert!(stops.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn single_color_linear_beam_is_centred() {
        let stops = gradient_stops(BeamShape::Linear, &[Rgb::BLACK], 1.0);
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[1].offset, 0.5);
    }

    #[test]
    fn beams_sorted_far_to_near() {
        let field = BeamField::generate(&BeamPreset::Aurora.config(), (800, 600), 3);
        assert!(field.beams().windows(2).all(|w| w[0].z <= w[1].z));
    }

    #[test]
    fn parallax_scales_with_depth() {
        let field = BeamField::generate(&BeamPreset::Aurora.config(), (800, 600), 11);
        let near = field.beams().last().unwrap();
        let far = field.beams().first().unwrap();
        let shift = |b: &Beam| {
            field.pose(b, 1.0, Vec2::new(1.0, 0.0)).x - field.pose(b, 1.0, Vec2::ZERO).x
        };
        assert!(shift(near) >= shift(far));
        assert!((shift(near) - near.z * 40.0).abs() < 1e-3);
    }

    #[test]
    fn drift_wanders_within_its_amplitude() {
        let mut config = BeamPreset::Aurora.config();
        config.sway_amplitude = 0.0;
        config.parallax = 0.0;
        let field = BeamField::generate(&config, (1000, 1000), 5);
        let beam = &field.beams()[0];
        let xs: Vec<f32> = (0..200)
            .map(|i| field.pose(beam, i as f32 * 5.0, Vec2::ZERO).x / 1000.0 - beam.x)
            .collect();
        assert!(xs.iter().all(|dx| dx.abs() <= config.drift * 1.05));
        assert!(xs.iter().any(|&dx| (dx - xs[0]).abs() > 1e-4));
    }

    #[test]
    fn centre_offset_maps_corners() {
        assert_eq!(centre_offset(0.0, 0.0, (200, 100)), Vec2::NEG_ONE);
        assert_eq!(centre_offset(100.0, 50.0, (200, 100)), Vec2::ZERO);
        assert_eq!(centre_offset(900.0, 50.0, (200, 100)), Vec2::new(1.0, 0.0));
    }
}
