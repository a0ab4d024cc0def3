//! Renderer configuration and named presets.
//!
//! The hero sections used to ship one hand-tuned renderer per look; each look
//! is now a preset of a single configurable renderer. JSON overrides are
//! merged over a preset, so `{"count": 20}` on top of `ember` keeps the ember
//! palette.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Rgb;
use crate::error::{RenderError, Result};

/// Inclusive `[min, max]` range used for randomized per-beam parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    fn check(&self, name: &str) -> Result<()> {
        // A finite span keeps uniform sampling in range.
        if !(self.max - self.min).is_finite() || self.min > self.max {
            return Err(RenderError::invalid(format!(
                "{name}: expected finite min <= max, got [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamShape {
    /// Ellipse filled with a radial gradient fading at the rim.
    Radial,
    /// Ellipse filled with a vertical linear gradient fading at both ends.
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeamConfig {
    pub count: usize,
    pub seed: Option<u64>,
    pub background: Rgb,
    /// Each beam picks one color sequence; the sequence becomes its gradient stops.
    pub palette: Vec<Vec<Rgb>>,
    pub shape: BeamShape,
    /// Beam width as a fraction of viewport width.
    pub width: Range,
    /// Beam height as a fraction of viewport height.
    pub height: Range,
    /// Base angle in degrees, 0 is upright.
    pub angle: Range,
    pub opacity: Range,
    /// Horizontal sway amplitude as a fraction of viewport width.
    pub sway_amplitude: f32,
    /// Sway angular speed in radians per second.
    pub sway_speed: Range,
    /// Opacity pulse angular speed in radians per second.
    pub pulse_speed: Range,
    /// Extra rotation (radians) per unit of normalized sway.
    pub sway_tilt: f32,
    /// Noise drift amplitude as a fraction of viewport size.
    pub drift: f32,
    /// Parallax in pixels at depth 1 for a pointer at the container edge.
    pub parallax: f32,
    pub pointer_smoothing: f32,
    /// CSS blur radius in pixels applied while painting beams.
    pub blur: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderConfig {
    pub background: Rgb,
    pub palette: [Rgb; 4],
    pub octaves: u32,
    /// Spatial scale of the noise field; larger means smaller features.
    pub scale: f32,
    /// Time multiplier.
    pub speed: f32,
    pub intensity: f32,
    /// Glow radius around the pointer in pixels.
    pub glow_radius: f32,
    pub glow_strength: f32,
    pub pointer_smoothing: f32,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveTerm {
    pub amplitude: f32,
    pub freq_x: f32,
    pub freq_y: f32,
    /// Phase velocity in radians per second.
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    pub color: Rgb,
    pub intensity: f32,
    /// Distance at which the light has faded out.
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveConfig {
    pub background: Rgb,
    pub surface: Rgb,
    /// Plane extent in world units.
    pub size: [f32; 2],
    pub segments: [u32; 2],
    /// Rotation of the plane about X in degrees, tilting it away from the camera.
    pub tilt: f32,
    pub waves: Vec<WaveTerm>,
    pub ambient: (Rgb, f32),
    pub directional: ([f32; 3], Rgb, f32),
    pub point_lights: [PointLightConfig; 2],
    pub fog: [f32; 2],
    pub fov: f32,
    pub camera: [f32; 3],
    /// Camera offset in world units for a pointer at the container edge.
    pub camera_drift: [f32; 2],
    pub pointer_smoothing: f32,
}

fn check_smoothing(factor: f32) -> Result<()> {
    if factor > 0.0 && factor < 1.0 {
        Ok(())
    } else {
        Err(RenderError::invalid(format!(
            "pointer_smoothing {factor} outside (0, 1)"
        )))
    }
}

/// Largest beam pool a config may ask for.
pub const MAX_BEAMS: usize = 512;
/// Largest wave mesh subdivision per axis.
pub const MAX_SEGMENTS: u32 = 1024;

impl BeamConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BEAMS).contains(&self.count) {
            return Err(RenderError::invalid(format!(
                "count {} outside 1..={MAX_BEAMS}",
                self.count
            )));
        }
        if self.palette.is_empty() || self.palette.iter().any(Vec::is_empty) {
            return Err(RenderError::invalid("palette needs non-empty color sequences"));
        }
        self.width.check("width")?;
        self.height.check("height")?;
        self.angle.check("angle")?;
        self.opacity.check("opacity")?;
        self.sway_speed.check("sway_speed")?;
        self.pulse_speed.check("pulse_speed")?;
        if self.opacity.min < 0.0 || self.opacity.max > 1.0 {
            return Err(RenderError::invalid("opacity must lie within [0, 1]"));
        }
        if self.width.min <= 0.0 || self.height.min <= 0.0 {
            return Err(RenderError::invalid("beam size must be positive"));
        }
        check_smoothing(self.pointer_smoothing)
    }
}

impl ShaderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=8).contains(&self.octaves) {
            return Err(RenderError::invalid(format!(
                "octaves {} outside 1..=8",
                self.octaves
            )));
        }
        if self.glow_radius <= 0.0 {
            return Err(RenderError::invalid("glow_radius must be positive"));
        }
        check_smoothing(self.pointer_smoothing)
    }
}

impl WaveConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=3).contains(&self.waves.len()) {
            return Err(RenderError::invalid("expected two or three wave terms"));
        }
        if self.segments.iter().any(|s| !(1..=MAX_SEGMENTS).contains(s)) {
            return Err(RenderError::invalid(format!(
                "segments must lie in 1..={MAX_SEGMENTS}"
            )));
        }
        if self.size.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(RenderError::invalid("plane size must be positive"));
        }
        if !self.camera.iter().chain(&self.camera_drift).all(|c| c.is_finite()) {
            return Err(RenderError::invalid("camera position must be finite"));
        }
        // The camera looks at the origin with +Y up, so it must sit off the Y axis.
        if self.camera[2].abs() < 1e-3 {
            return Err(RenderError::invalid("camera z must be non-zero"));
        }
        if !(self.fog[0].is_finite() && self.fog[1].is_finite() && self.fog[0] < self.fog[1]) {
            return Err(RenderError::invalid("fog needs finite near < far"));
        }
        if self.point_lights.iter().any(|l| !(l.range.is_finite() && l.range > 0.0)) {
            return Err(RenderError::invalid("point light range must be positive"));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(RenderError::invalid("fov must lie in (0, 180)"));
        }
        check_smoothing(self.pointer_smoothing)
    }
}

/// Look of a beam field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamPreset {
    Aurora,
    Borealis,
    Ember,
    Glacier,
}

impl BeamPreset {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "" | "aurora" => Ok(Self::Aurora),
            "borealis" => Ok(Self::Borealis),
            "ember" => Ok(Self::Ember),
            "glacier" => Ok(Self::Glacier),
            other => Err(RenderError::UnknownPreset(other.to_owned())),
        }
    }

    pub fn config(self) -> BeamConfig {
        let base = BeamConfig {
            count: 35,
            seed: None,
            background: Rgb::hex(0x05060f),
            palette: vec![
                vec![Rgb::hex(0x22d3ee), Rgb::hex(0x6366f1)],
                vec![Rgb::hex(0xa855f7), Rgb::hex(0xec4899)],
                vec![Rgb::hex(0x10b981), Rgb::hex(0x22d3ee)],
            ],
            shape: BeamShape::Radial,
            width: Range::new(0.04, 0.12),
            height: Range::new(0.45, 0.95),
            angle: Range::new(-18.0, 18.0),
            opacity: Range::new(0.08, 0.32),
            sway_amplitude: 0.03,
            sway_speed: Range::new(0.15, 0.45),
            pulse_speed: Range::new(0.2, 0.6),
            sway_tilt: 0.12,
            drift: 0.02,
            parallax: 40.0,
            pointer_smoothing: 0.04,
            blur: 24.0,
        };
        match self {
            Self::Aurora => base,
            Self::Borealis => BeamConfig {
                count: 28,
                palette: vec![
                    vec![Rgb::hex(0x34d399), Rgb::hex(0x059669)],
                    vec![Rgb::hex(0x5eead4), Rgb::hex(0x0ea5e9)],
                    vec![Rgb::hex(0x86efac), Rgb::hex(0x14b8a6), Rgb::hex(0x6366f1)],
                ],
                shape: BeamShape::Linear,
                width: Range::new(0.03, 0.08),
                height: Range::new(0.6, 1.1),
                angle: Range::new(-8.0, 8.0),
                blur: 30.0,
                ..base
            },
            Self::Ember => BeamConfig {
                count: 24,
                background: Rgb::hex(0x0c0505),
                palette: vec![
                    vec![Rgb::hex(0xf97316), Rgb::hex(0xdc2626)],
                    vec![Rgb::hex(0xfbbf24), Rgb::hex(0xf97316)],
                    vec![Rgb::hex(0xf43f5e), Rgb::hex(0x9333ea)],
                ],
                opacity: Range::new(0.1, 0.4),
                sway_speed: Range::new(0.25, 0.7),
                parallax: 28.0,
                ..base
            },
            Self::Glacier => BeamConfig {
                count: 40,
                background: Rgb::hex(0x030712),
                palette: vec![
                    vec![Rgb::hex(0xe0f2fe), Rgb::hex(0x38bdf8)],
                    vec![Rgb::hex(0x93c5fd), Rgb::hex(0x4f46e5)],
                ],
                width: Range::new(0.02, 0.07),
                opacity: Range::new(0.05, 0.22),
                blur: 16.0,
                pointer_smoothing: 0.03,
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderPreset {
    Aurora,
    Nebula,
}

impl ShaderPreset {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "" | "aurora" => Ok(Self::Aurora),
            "nebula" => Ok(Self::Nebula),
            other => Err(RenderError::UnknownPreset(other.to_owned())),
        }
    }

    pub fn config(self) -> ShaderConfig {
        let base = ShaderConfig {
            background: Rgb::hex(0x05060f),
            palette: [
                Rgb::hex(0x0b1026),
                Rgb::hex(0x22d3ee),
                Rgb::hex(0x6366f1),
                Rgb::hex(0xa855f7),
            ],
            octaves: 5,
            scale: 1.6,
            speed: 0.08,
            intensity: 1.0,
            glow_radius: 260.0,
            glow_strength: 0.35,
            pointer_smoothing: 0.1,
            seed: None,
        };
        match self {
            Self::Aurora => base,
            Self::Nebula => ShaderConfig {
                palette: [
                    Rgb::hex(0x0f0518),
                    Rgb::hex(0xec4899),
                    Rgb::hex(0x8b5cf6),
                    Rgb::hex(0xf59e0b),
                ],
                octaves: 6,
                scale: 2.2,
                speed: 0.05,
                intensity: 0.9,
                ..base
            },
        }
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            background: Rgb::hex(0x05060f),
            surface: Rgb::hex(0x1e1b4b),
            size: [60.0, 40.0],
            segments: [120, 80],
            tilt: -62.0,
            waves: vec![
                WaveTerm { amplitude: 0.9, freq_x: 0.18, freq_y: 0.0, speed: 0.8 },
                WaveTerm { amplitude: 0.6, freq_x: 0.0, freq_y: 0.24, speed: 0.6 },
                WaveTerm { amplitude: 0.3, freq_x: 0.31, freq_y: 0.27, speed: 1.3 },
            ],
            ambient: (Rgb::hex(0x1e293b), 0.6),
            directional: ([-0.4, 0.8, 0.6], Rgb::hex(0xffffff), 0.7),
            point_lights: [
                PointLightConfig {
                    position: [-12.0, 6.0, 8.0],
                    color: Rgb::hex(0x22d3ee),
                    intensity: 1.4,
                    range: 40.0,
                },
                PointLightConfig {
                    position: [12.0, -4.0, 8.0],
                    color: Rgb::hex(0xa855f7),
                    intensity: 1.2,
                    range: 40.0,
                },
            ],
            fog: [18.0, 55.0],
            fov: 55.0,
            camera: [0.0, 0.0, 22.0],
            camera_drift: [3.0, 2.0],
            pointer_smoothing: 0.05,
        }
    }
}

/// A renderer kind with its resolved configuration, parsed from a mount
/// string such as `"beams:ember"` or `"waves"`.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererSpec {
    Beams(BeamConfig),
    Aurora(ShaderConfig),
    Waves(WaveConfig),
}

impl RendererSpec {
    pub fn parse(spec: &str, overrides: Option<&str>) -> Result<Self> {
        let (kind, preset) = spec.trim().split_once(':').unwrap_or((spec.trim(), ""));
        let parsed = match kind {
            "beams" => Self::Beams(merge_overrides(
                BeamPreset::from_name(preset)?.config(),
                overrides,
            )?),
            "aurora" | "shader" => Self::Aurora(merge_overrides(
                ShaderPreset::from_name(preset)?.config(),
                overrides,
            )?),
            "waves" => {
                if !matches!(preset, "" | "default") {
                    return Err(RenderError::UnknownPreset(preset.to_owned()));
                }
                Self::Waves(merge_overrides(WaveConfig::default(), overrides)?)
            }
            other => return Err(RenderError::UnknownRenderer(other.to_owned())),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Beams(c) => c.validate(),
            Self::Aurora(c) => c.validate(),
            Self::Waves(c) => c.validate(),
        }
    }

    /// Page background behind the canvas; also what a degraded mount shows.
    pub fn background(&self) -> Rgb {
        match self {
            Self::Beams(c) => c.background,
            Self::Aurora(c) => c.background,
            Self::Waves(c) => c.background,
        }
    }
}

/// Merge a JSON object of overrides onto `base`. `None` or an empty string
/// keeps the base untouched.
pub fn merge_overrides<T>(base: T, overrides: Option<&str>) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let Some(text) = overrides.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(base);
    };
    let patch: Value = serde_json::from_str(text)?;
    let Value::Object(patch) = patch else {
        return Err(RenderError::invalid("overrides must be a JSON object"));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in patch {
            fields.insert(key, value);
        }
    }
    Ok(serde_json::from_value(merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for p in [BeamPreset::Aurora, BeamPreset::Borealis, BeamPreset::Ember, BeamPreset::Glacier] {
            p.config().validate().unwrap();
        }
        for p in [ShaderPreset::Aurora, ShaderPreset::Nebula] {
            p.config().validate().unwrap();
        }
        WaveConfig::default().validate().unwrap();
    }

    #[test]
    fn overrides_keep_unmentioned_fields() {
        let cfg = merge_overrides(
            BeamPreset::Ember.config(),
            Some(r#"{"count": 12, "seed": 99}"#),
        )
        .unwrap();
        assert_eq!(cfg.count, 12);
        assert_eq!(cfg.seed, Some(99));
        assert_eq!(cfg.palette, BeamPreset::Ember.config().palette);
    }

    #[test]
    fn overrides_reject_unknown_fields() {
        let err = merge_overrides(BeamPreset::Aurora.config(), Some(r#"{"beams": 3}"#));
        assert!(matches!(err, Err(RenderError::Config(_))));
    }

    #[test]
    fn overrides_parse_colors() {
        let cfg = merge_overrides(
            ShaderPreset::Aurora.config(),
            Some(r##"{"background": "#101010"}"##),
        )
        .unwrap();
        assert_eq!(cfg.background, Rgb::hex(0x101010));
    }

    #[test]
    fn empty_overrides_are_identity() {
        let cfg = merge_overrides(WaveConfig::default(), Some("  ")).unwrap();
        assert_eq!(cfg, WaveConfig::default());
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut beams = BeamPreset::Aurora.config();
        beams.opacity = Range::new(0.5, 0.2);
        assert!(beams.validate().is_err());

        let mut shader = ShaderPreset::Aurora.config();
        shader.octaves = 9;
        assert!(shader.validate().is_err());

        let mut wave = WaveConfig::default();
        wave.waves.truncate(1);
        assert!(wave.validate().is_err());
        let mut wave = WaveConfig::default();
        wave.pointer_smoothing = 1.0;
        assert!(wave.validate().is_err());
    }

    fn rejected(spec: &str, overrides: &str) -> bool {
        matches!(
            RendererSpec::parse(spec, Some(overrides)),
            Err(RenderError::InvalidConfig(_))
        )
    }

    #[test]
    fn oversized_meshes_and_pools_are_rejected() {
        assert!(rejected("waves", r#"{"segments": [65536, 65536]}"#));
        assert!(rejected("waves", r#"{"segments": [2048, 8]}"#));
        assert!(rejected("beams", r#"{"count": 100000}"#));
        assert!(RendererSpec::parse("waves", Some(r#"{"segments": [1024, 1024]}"#)).is_ok());
    }

    #[test]
    fn ranges_with_overflowing_span_are_rejected() {
        assert!(rejected("beams", r#"{"angle": {"min": -3e38, "max": 3e38}}"#));
        assert!(rejected("beams:ember", r#"{"sway_speed": {"min": -2e38, "max": 2e38}}"#));
    }

    #[test]
    fn degenerate_wave_cameras_and_lights_are_rejected() {
        assert!(rejected("waves", r#"{"camera": [0, 0, 0]}"#));
        assert!(rejected("waves", r#"{"camera": [0, 15, 0]}"#));
        assert!(rejected("waves", r#"{"fog": [40, 10]}"#));

        let mut wave = WaveConfig::default();
        wave.point_lights[1].range = 0.0;
        assert!(matches!(wave.validate(), Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_preset_is_reported() {
        assert!(matches!(
            BeamPreset::from_name("plasma"),
            Err(RenderError::UnknownPreset(name)) if name == "plasma"
        ));
    }

    #[test]
    fn renderer_spec_parses_kind_and_preset() {
        let spec = RendererSpec::parse("beams:glacier", Some(r#"{"count": 8}"#)).unwrap();
        match spec {
            RendererSpec::Beams(cfg) => {
                assert_eq!(cfg.count, 8);
                assert_eq!(cfg.background, BeamPreset::Glacier.config().background);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(RendererSpec::parse("aurora", None), Ok(RendererSpec::Aurora(_))));
        assert!(matches!(RendererSpec::parse(" waves ", None), Ok(RendererSpec::Waves(_))));
    }

    #[test]
    fn renderer_spec_rejects_unknowns() {
        assert!(matches!(
            RendererSpec::parse("confetti", None),
            Err(RenderError::UnknownRenderer(_))
        ));
        assert!(matches!(
            RendererSpec::parse("waves:stormy", None),
            Err(RenderError::UnknownPreset(_))
        ));
        assert!(matches!(
            RendererSpec::parse("beams", Some(r#"{"count": 0}"#)),
            Err(RenderError::InvalidConfig(_))
        ));
    }
}
