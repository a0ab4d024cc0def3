//! WebGL aurora: a full-screen fragment shader over fractal simplex noise.

use glam::Vec2;

use crate::color::Rgb;
use crate::config::ShaderConfig;
use crate::error::{ContextKind, RenderError, Result};
use crate::lifecycle::{degrade, MountOutcome, Renderer};
use crate::rng;
use crate::smoothing::Smoothed;
use crate::surface::clamp_viewport;

pub const VERTEX_SHADER: &str = r#"#version 300 es
in vec2 a_position;
void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

/// Fragment body; [`fragment_source`] prepends the version line and defines.
pub const FRAGMENT_SHADER: &str = r#"
precision highp float;

uniform float u_time;
uniform vec2 u_resolution;
uniform vec2 u_pointer;
uniform vec3 u_palette[4];
uniform float u_scale;
uniform float u_intensity;
uniform float u_glow_radius;
uniform float u_glow_strength;
uniform vec2 u_seed;

out vec4 frag_color;

vec3 permute(vec3 x) { return mod(((x * 34.0) + 1.0) * x, 289.0); }

float snoise(vec2 v) {
    const vec4 C = vec4(0.211324865405187, 0.366025403784439,
                        -0.577350269189626, 0.024390243902439);
    vec2 i = floor(v + dot(v, C.yy));
    vec2 x0 = v - i + dot(i, C.xx);
    vec2 i1 = (x0.x > x0.y) ? vec2(1.0, 0.0) : vec2(0.0, 1.0);
    vec4 x12 = x0.xyxy + C.xxzz;
    x12.xy -= i1;
    i = mod(i, 289.0);
    vec3 p = permute(permute(i.y + vec3(0.0, i1.y, 1.0)) + i.x + vec3(0.0, i1.x, 1.0));
    vec3 m = max(0.5 - vec3(dot(x0, x0), dot(x12.xy, x12.xy), dot(x12.zw, x12.zw)), 0.0);
    m = m * m;
    m = m * m;
    vec3 x = 2.0 * fract(p * C.www) - 1.0;
    vec3 h = abs(x) - 0.5;
    vec3 ox = floor(x + 0.5);
    vec3 a0 = x - ox;
    m *= 1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h);
    vec3 g;
    g.x = a0.x * x0.x + h.x * x0.y;
    g.yz = a0.yz * x12.xz + h.yz * x12.yw;
    return 130.0 * dot(m, g);
}

float fbm(vec2 p) {
    float sum = 0.0;
    float amp = 0.5;
    float norm = 0.0;
    for (int i = 0; i < OCTAVES; i++) {
        sum += amp * snoise(p);
        norm += amp;
        p *= 2.0;
        amp *= 0.5;
    }
    return sum / norm;
}

void main() {
    vec2 uv = gl_FragCoord.xy / u_resolution;
    vec2 p = (gl_FragCoord.xy - 0.5 * u_resolution) / min(u_resolution.x, u_resolution.y);
    p = p * u_scale + u_seed;

    float t = u_time;
    float n1 = fbm(p + vec2(0.0, t));
    float n2 = fbm(p * 1.7 + vec2(n1, -t * 0.7));
    float curtain = smoothstep(-0.2, 0.8, n2 + (1.0 - uv.y) * 0.6);

    vec3 color = mix(u_palette[0], u_palette[1], clamp(n1 * 0.5 + 0.5, 0.0, 1.0));
    color = mix(color, u_palette[2], clamp(n2 * 0.5 + 0.5, 0.0, 1.0) * curtain);
    color = mix(color, u_palette[3], smoothstep(0.3, 0.9, n1 * n2 + 0.5) * 0.5);

    float d = distance(gl_FragCoord.xy, u_pointer) / u_glow_radius;
    float glow = exp(-d * d) * u_glow_strength;
    color += glow * mix(u_palette[1], u_palette[3], 0.5);

    frag_color = vec4(color * u_intensity * (0.35 + 0.65 * curtain) + glow * 0.1, 1.0);
}
"#;

/// Two triangles covering clip space.
pub const FULLSCREEN_QUAD: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, //
    -1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
];

pub fn fragment_source(octaves: u32) -> String {
    format!("#version 300 es\n#define OCTAVES {octaves}\n{FRAGMENT_SHADER}")
}

/// Values uploaded as uniforms each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AuroraUniforms {
    pub time: f32,
    pub resolution: [f32; 2],
    /// Pointer in GL pixel space (origin bottom-left).
    pub pointer: [f32; 2],
    pub palette: [[f32; 3]; 4],
    pub scale: f32,
    pub intensity: f32,
    pub glow_radius: f32,
    pub glow_strength: f32,
    pub seed: [f32; 2],
}

/// A linked quad program bound to a canvas.
pub trait QuadPipeline {
    fn set_viewport(&mut self, width: u32, height: u32);
    fn draw(&mut self, uniforms: &AuroraUniforms);
    fn release(&mut self);
}

/// Something that can compile and link a quad pipeline.
pub trait QuadTarget {
    type Pipeline: QuadPipeline;

    fn layout_size(&self) -> (u32, u32);

    /// `Ok(None)` when no WebGL2 context is available; compile and link
    /// failures come back as errors carrying the driver's log.
    fn quad_pipeline(&self, vertex: &str, fragment: &str) -> Result<Option<Self::Pipeline>>;
}

pub struct ShaderRenderer<P> {
    pipeline: P,
    config: ShaderConfig,
    resolution: (u32, u32),
    pointer: Smoothed,
    seed_offset: [f32; 2],
    uniforms: AuroraUniforms,
}

impl<P: QuadPipeline> ShaderRenderer<P> {
    pub fn mount<T>(target: &T, config: ShaderConfig) -> MountOutcome<Self>
    where
        T: QuadTarget<Pipeline = P>,
    {
        degrade("aurora", Self::try_mount(target, config))
    }

    fn try_mount<T>(target: &T, config: ShaderConfig) -> Result<Self>
    where
        T: QuadTarget<Pipeline = P>,
    {
        config.validate()?;
        let mut pipeline = target
            .quad_pipeline(VERTEX_SHADER, &fragment_source(config.octaves))?
            .ok_or(RenderError::ContextUnavailable(ContextKind::WebGl2))?;

        let resolution = clamp_viewport(target.layout_size());
        pipeline.set_viewport(resolution.0, resolution.1);
        let centre = Vec2::new(resolution.0 as f32, resolution.1 as f32) * 0.5;
        let pointer = Smoothed::new(centre, config.pointer_smoothing)?;

        // Offsets the noise domain so two mounts with different seeds differ.
        let seed = config.seed.unwrap_or_else(rng::entropy_seed);
        let seed_offset = [
            (seed & 0xffff) as f32 / 64.0,
            ((seed >> 16) & 0xffff) as f32 / 64.0,
        ];
        log::debug!(
            "aurora shader linked: {} octaves, {}x{}",
            config.octaves,
            resolution.0,
            resolution.1
        );

        let uniforms = Self::uniforms_for(&config, resolution, centre, seed_offset, 0.0);
        Ok(Self {
            pipeline,
            config,
            resolution,
            pointer,
            seed_offset,
            uniforms,
        })
    }

    fn uniforms_for(
        config: &ShaderConfig,
        resolution: (u32, u32),
        pointer: Vec2,
        seed: [f32; 2],
        time: f32,
    ) -> AuroraUniforms {
        AuroraUniforms {
            time,
            resolution: [resolution.0 as f32, resolution.1 as f32],
            pointer: pointer.to_array(),
            palette: config.palette.map(Rgb::to_unit),
            scale: config.scale,
            intensity: config.intensity,
            glow_radius: config.glow_radius,
            glow_strength: config.glow_strength,
            seed,
        }
    }

    /// Uniforms sent with the most recent frame.
    pub fn uniforms(&self) -> &AuroraUniforms {
        &self.uniforms
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

impl<P: QuadPipeline> Renderer for ShaderRenderer<P> {
    fn frame(&mut self, elapsed_ms: f64) {
        let time = (elapsed_ms / 1000.0) as f32 * self.config.speed;
        let pointer = self.pointer.step();
        self.uniforms = Self::uniforms_for(
            &self.config,
            self.resolution,
            pointer,
            self.seed_offset,
            time,
        );
        self.pipeline.draw(&self.uniforms);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resolution = clamp_viewport((width, height));
        self.pipeline.set_viewport(self.resolution.0, self.resolution.1);
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        // DOM y grows downward, gl_FragCoord.y grows upward.
        self.pointer
            .set_target(Vec2::new(x, self.resolution.1 as f32 - y));
    }

    fn release(&mut self) {
        self.pipeline.release();
    }
}
