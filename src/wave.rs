//! 3D wave scene: a subdivided plane whose vertices ride a sum of sine
//! waves, lit by an ambient, a directional and two point lights, viewed by a
//! camera that drifts after the pointer.

use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::config::{WaveConfig, WaveTerm};
use crate::error::{ContextKind, RenderError, Result};
use crate::lifecycle::{degrade, MountOutcome, Renderer};
use crate::smoothing::Smoothed;
use crate::surface::clamp_viewport;

const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

pub const VERTEX_SHADER: &str = r#"#version 300 es
in vec3 a_position;
in vec3 a_normal;

uniform mat4 u_model;
uniform mat4 u_view_proj;
uniform mat3 u_normal_matrix;

out vec3 v_world;
out vec3 v_normal;

void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_world = world.xyz;
    v_normal = normalize(u_normal_matrix * a_normal);
    gl_Position = u_view_proj * world;
}
"#;

pub const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec3 v_world;
in vec3 v_normal;

uniform vec3 u_camera;
uniform vec3 u_surface;
uniform vec3 u_ambient;
uniform vec3 u_light_dir;
uniform vec3 u_light_color;
uniform vec3 u_point_pos[2];
uniform vec3 u_point_color[2];
uniform float u_point_range[2];
uniform vec3 u_fog_color;
uniform vec2 u_fog;

out vec4 frag_color;

void main() {
    vec3 n = normalize(v_normal);
    if (!gl_FrontFacing) n = -n;
    vec3 light = u_ambient + u_light_color * max(dot(n, normalize(u_light_dir)), 0.0);
    for (int i = 0; i < 2; i++) {
        vec3 to_light = u_point_pos[i] - v_world;
        float d = length(to_light);
        float falloff = clamp(1.0 - d / u_point_range[i], 0.0, 1.0);
        light += u_point_color[i] * max(dot(n, to_light / d), 0.0) * falloff * falloff;
    }
    vec3 color = u_surface * light;
    float depth = distance(u_camera, v_world);
    float fog = smoothstep(u_fog.x, u_fog.y, depth);
    frag_color = vec4(mix(color, u_fog_color, fog), 1.0);
}
"#;

/// Grid mesh in the XY plane with flat, GPU-ready buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneMesh {
    /// xyz per vertex.
    pub positions: Vec<f32>,
    /// xyz per vertex, unit length.
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    columns: u32,
    rows: u32,
}

impl PlaneMesh {
    /// `segments` cells across and down, centred on the origin, facing +Z.
    pub fn new(size: [f32; 2], segments: [u32; 2]) -> Self {
        let [sx, sy] = segments;
        let columns = sx + 1;
        let rows = sy + 1;
        let count = (columns * rows) as usize;

        let mut positions = Vec::with_capacity(count * 3);
        for row in 0..rows {
            let y = size[1] * 0.5 - size[1] * row as f32 / sy as f32;
            for col in 0..columns {
                let x = -size[0] * 0.5 + size[0] * col as f32 / sx as f32;
                positions.extend_from_slice(&[x, y, 0.0]);
            }
        }

        let mut indices = Vec::with_capacity((sx * sy * 6) as usize);
        for row in 0..sy {
            for col in 0..sx {
                let a = row * columns + col;
                let b = a + columns;
                let c = b + 1;
                let d = a + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        let mut normals = Vec::with_capacity(count * 3);
        for _ in 0..count {
            normals.extend_from_slice(&[0.0, 0.0, 1.0]);
        }

        Self {
            positions,
            normals,
            indices,
            columns,
            rows,
        }
    }

    pub fn vertex_count(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Z of every vertex, in buffer order.
    pub fn heights(&self) -> Vec<f32> {
        self.positions.chunks_exact(3).map(|p| p[2]).collect()
    }

    fn vertex(&self, i: u32) -> Vec3 {
        let i = i as usize * 3;
        Vec3::from_slice(&self.positions[i..i + 3])
    }

    /// Set every vertex's Z from the wave sum at `time` seconds.
    pub fn displace(&mut self, waves: &[WaveTerm], time: f32) {
        for p in self.positions.chunks_exact_mut(3) {
            p[2] = wave_height(waves, p[0], p[1], time);
        }
    }

    /// Area-weighted vertex normals from the current positions.
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertex_count()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (self.vertex(tri[0]), self.vertex(tri[1]), self.vertex(tri[2]));
            let face = (b - a).cross(c - a);
            for &i in tri {
                acc[i as usize] += face;
            }
        }
        for (n, out) in acc.iter().zip(self.normals.chunks_exact_mut(3)) {
            out.copy_from_slice(&n.try_normalize().unwrap_or(Vec3::Z).to_array());
        }
    }
}

pub fn wave_height(waves: &[WaveTerm], x: f32, y: f32, time: f32) -> f32 {
    waves
        .iter()
        .map(|w| w.amplitude * (w.freq_x * x + w.freq_y * y + w.speed * time).sin())
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub fov_deg: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, NEAR, FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// Everything the lit mesh shader needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveUniforms {
    pub model: Mat4,
    pub view_proj: Mat4,
    pub normal_matrix: Mat3,
    pub camera: Vec3,
    pub surface: [f32; 3],
    pub ambient: [f32; 3],
    pub light_dir: [f32; 3],
    pub light_color: [f32; 3],
    pub point_pos: [[f32; 3]; 2],
    pub point_color: [[f32; 3]; 2],
    pub point_range: [f32; 2],
    pub fog_color: [f32; 3],
    pub fog: [f32; 2],
}

fn scaled(color: [f32; 3], k: f32) -> [f32; 3] {
    color.map(|c| c * k)
}

pub struct WaveScene {
    config: WaveConfig,
    mesh: PlaneMesh,
    camera: Camera,
    camera_xy: Smoothed,
    pointer: Vec2,
    model: Mat4,
}

impl WaveScene {
    pub fn new(config: WaveConfig, viewport: (u32, u32)) -> Result<Self> {
        config.validate()?;
        let mut mesh = PlaneMesh::new(config.size, config.segments);
        mesh.displace(&config.waves, 0.0);
        mesh.recompute_normals();

        let base = Vec3::from_array(config.camera);
        let camera = Camera {
            position: base,
            fov_deg: config.fov,
            aspect: aspect(viewport),
        };
        let camera_xy = Smoothed::new(base.truncate(), config.pointer_smoothing)?;
        let model = Mat4::from_rotation_x(config.tilt.to_radians());

        Ok(Self {
            config,
            mesh,
            camera,
            camera_xy,
            pointer: Vec2::ZERO,
            model,
        })
    }

    /// Deform the surface and ease the camera for `time` seconds.
    pub fn advance(&mut self, time: f32) {
        self.mesh.displace(&self.config.waves, time);
        self.mesh.recompute_normals();

        let base = Vec2::new(self.config.camera[0], self.config.camera[1]);
        let drift = Vec2::from_array(self.config.camera_drift);
        // Pointer right/up moves the camera right/up.
        let target = base + Vec2::new(self.pointer.x, -self.pointer.y) * drift;
        self.camera_xy.set_target(target);
        let xy = self.camera_xy.step();
        self.camera.position = xy.extend(self.config.camera[2]);
    }

    /// Pointer offset from the container centre, -1..1 on each axis.
    pub fn set_pointer(&mut self, offset: Vec2) {
        self.pointer = offset;
    }

    pub fn resize(&mut self, viewport: (u32, u32)) {
        self.camera.aspect = aspect(viewport);
    }

    pub fn mesh(&self) -> &PlaneMesh {
        &self.mesh
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn uniforms(&self) -> WaveUniforms {
        let c = &self.config;
        let (ambient, ambient_k) = c.ambient;
        let (dir, light, light_k) = c.directional;
        let [p0, p1] = c.point_lights;
        WaveUniforms {
            model: self.model,
            view_proj: self.camera.view_proj(),
            normal_matrix: Mat3::from_mat4(self.model).inverse().transpose(),
            camera: self.camera.position,
            surface: c.surface.to_unit(),
            ambient: scaled(ambient.to_unit(), ambient_k),
            light_dir: Vec3::from_array(dir).try_normalize().unwrap_or(Vec3::Z).to_array(),
            light_color: scaled(light.to_unit(), light_k),
            point_pos: [p0.position, p1.position],
            point_color: [
                scaled(p0.color.to_unit(), p0.intensity),
                scaled(p1.color.to_unit(), p1.intensity),
            ],
            point_range: [p0.range, p1.range],
            fog_color: c.background.to_unit(),
            fog: c.fog,
        }
    }

    pub fn clear_color(&self) -> [f32; 3] {
        self.config.background.to_unit()
    }
}

fn aspect((w, h): (u32, u32)) -> f32 {
    w.max(1) as f32 / h.max(1) as f32
}

/// GPU side of the wave scene.
pub trait MeshPipeline {
    fn set_viewport(&mut self, width: u32, height: u32);
    fn upload(&mut self, mesh: &PlaneMesh);
    fn draw(&mut self, uniforms: &WaveUniforms, clear: [f32; 3]);
    /// Free buffers, vertex array, program and context.
    fn release(&mut self);
}

pub trait MeshTarget {
    type Pipeline: MeshPipeline;

    fn layout_size(&self) -> (u32, u32);

    /// `Ok(None)` when no WebGL2 context is available.
    fn mesh_pipeline(
        &self,
        vertex: &str,
        fragment: &str,
        mesh: &PlaneMesh,
    ) -> Result<Option<Self::Pipeline>>;
}

pub struct WaveRenderer<P> {
    pipeline: P,
    scene: WaveScene,
    viewport: (u32, u32),
}

impl<P: MeshPipeline> WaveRenderer<P> {
    pub fn mount<T>(target: &T, config: WaveConfig) -> MountOutcome<Self>
    where
        T: MeshTarget<Pipeline = P>,
    {
        degrade("waves", Self::try_mount(target, config))
    }

    fn try_mount<T>(target: &T, config: WaveConfig) -> Result<Self>
    where
        T: MeshTarget<Pipeline = P>,
    {
        let viewport = clamp_viewport(target.layout_size());
        let scene = WaveScene::new(config, viewport)?;
        let mut pipeline = target
            .mesh_pipeline(VERTEX_SHADER, FRAGMENT_SHADER, scene.mesh())?
            .ok_or(RenderError::ContextUnavailable(ContextKind::WebGl2))?;
        pipeline.set_viewport(viewport.0, viewport.1);
        log::debug!(
            "wave scene ready: {} vertices, {}x{}",
            scene.mesh().vertex_count(),
            viewport.0,
            viewport.1
        );
        Ok(Self {
            pipeline,
            scene,
            viewport,
        })
    }

    pub fn scene(&self) -> &WaveScene {
        &self.scene
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

impl<P: MeshPipeline> Renderer for WaveRenderer<P> {
    fn frame(&mut self, elapsed_ms: f64) {
        self.scene.advance((elapsed_ms / 1000.0) as f32);
        self.pipeline.upload(self.scene.mesh());
        self.pipeline
            .draw(&self.scene.uniforms(), self.scene.clear_color());
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = clamp_viewport((width, height));
        self.scene.resize(self.viewport);
        self.pipeline.set_viewport(self.viewport.0, self.viewport.1);
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        self.scene
            .set_pointer(crate::beams::centre_offset(x, y, self.viewport));
    }

    fn release(&mut self) {
        self.pipeline.release();
    }
}
