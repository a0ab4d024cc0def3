use js_sys::{Float32Array, Uint32Array};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::aurora::{AuroraUniforms, QuadPipeline, FULLSCREEN_QUAD};
use crate::error::{RenderError, Result, ShaderStage};
use crate::wave::{MeshPipeline, PlaneMesh, WaveUniforms};

fn compile_shader(gl: &GL, stage: ShaderStage, source: &str) -> Result<WebGlShader> {
    let kind = match stage {
        ShaderStage::Vertex => GL::VERTEX_SHADER,
        ShaderStage::Fragment => GL::FRAGMENT_SHADER,
    };
    let shader = gl
        .create_shader(kind)
        .ok_or(RenderError::ResourceAllocation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown error".into());
        gl.delete_shader(Some(&shader));
        Err(RenderError::ShaderCompile { stage, log })
    }
}

fn link_program(gl: &GL, vertex: &str, fragment: &str) -> Result<WebGlProgram> {
    let vs = compile_shader(gl, ShaderStage::Vertex, vertex)?;
    let fs = match compile_shader(gl, ShaderStage::Fragment, fragment) {
        Ok(fs) => fs,
        Err(err) => {
            gl.delete_shader(Some(&vs));
            return Err(err);
        }
    };
    let program = gl
        .create_program()
        .ok_or(RenderError::ResourceAllocation("program"))?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);
    // The program keeps what it needs once linked.
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));

    if gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown error".into());
        gl.delete_program(Some(&program));
        Err(RenderError::ProgramLink { log })
    }
}

fn array_buffer(gl: &GL, data: &[f32], usage: u32) -> Result<WebGlBuffer> {
    let buffer = gl
        .create_buffer()
        .ok_or(RenderError::ResourceAllocation("vertex buffer"))?;
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
    gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &Float32Array::from(data), usage);
    Ok(buffer)
}

fn bind_attribute(gl: &GL, program: &WebGlProgram, name: &str, buffer: &WebGlBuffer, size: i32) {
    let location = gl.get_attrib_location(program, name);
    if location < 0 {
        log::warn!("attribute `{name}` not found in program");
        return;
    }
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
    gl.enable_vertex_attrib_array(location as u32);
    gl.vertex_attrib_pointer_with_i32(location as u32, size, GL::FLOAT, false, 0, 0);
}

fn resize_canvas(gl: &GL, canvas: &HtmlCanvasElement, width: u32, height: u32) {
    canvas.set_width(width);
    canvas.set_height(height);
    gl.viewport(0, 0, width as i32, height as i32);
}

/// Ask the browser to drop the context now rather than at garbage collection.
fn lose_context(gl: &GL) {
    let Ok(Some(ext)) = gl.get_extension("WEBGL_lose_context") else {
        return;
    };
    let lose = js_sys::Reflect::get(&ext, &JsValue::from_str("loseContext"))
        .and_then(|f| f.dyn_into::<js_sys::Function>().map_err(JsValue::from));
    if let Err(err) = lose.and_then(|f| f.call0(&ext)) {
        log::debug!("loseContext failed: {err:?}");
    }
}

#[derive(Default)]
struct QuadLocations {
    time: Option<WebGlUniformLocation>,
    resolution: Option<WebGlUniformLocation>,
    pointer: Option<WebGlUniformLocation>,
    palette: Option<WebGlUniformLocation>,
    scale: Option<WebGlUniformLocation>,
    intensity: Option<WebGlUniformLocation>,
    glow_radius: Option<WebGlUniformLocation>,
    glow_strength: Option<WebGlUniformLocation>,
    seed: Option<WebGlUniformLocation>,
}

/// Full-screen quad running the aurora fragment shader.
pub struct GlQuad {
    canvas: HtmlCanvasElement,
    gl: GL,
    program: Option<WebGlProgram>,
    vao: Option<WebGlVertexArrayObject>,
    buffer: Option<WebGlBuffer>,
    locations: QuadLocations,
}

impl GlQuad {
    pub fn new(canvas: HtmlCanvasElement, gl: GL, vertex: &str, fragment: &str) -> Result<Self> {
        let program = link_program(&gl, vertex, fragment)?;
        let mut quad = Self {
            canvas,
            gl,
            program: Some(program),
            vao: None,
            buffer: None,
            locations: QuadLocations::default(),
        };
        let allocated = quad.allocate();
        quad.gl.bind_vertex_array(None);
        if let Err(err) = allocated {
            quad.free();
            return Err(err);
        }
        Ok(quad)
    }

    /// Runs with the new vertex array bound; the caller unbinds it.
    fn allocate(&mut self) -> Result<()> {
        let gl = &self.gl;
        let Some(program) = &self.program else {
            return Err(RenderError::ResourceAllocation("program"));
        };
        let vao = gl
            .create_vertex_array()
            .ok_or(RenderError::ResourceAllocation("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));
        self.vao = Some(vao);
        let buffer = array_buffer(gl, &FULLSCREEN_QUAD, GL::STATIC_DRAW)?;
        bind_attribute(gl, program, "a_position", &buffer, 2);
        self.buffer = Some(buffer);

        let at = |name: &str| gl.get_uniform_location(program, name);
        self.locations = QuadLocations {
            time: at("u_time"),
            resolution: at("u_resolution"),
            pointer: at("u_pointer"),
            palette: at("u_palette"),
            scale: at("u_scale"),
            intensity: at("u_intensity"),
            glow_radius: at("u_glow_radius"),
            glow_strength: at("u_glow_strength"),
            seed: at("u_seed"),
        };
        Ok(())
    }

    /// Delete whatever GL objects exist so far.
    fn free(&mut self) {
        self.gl.delete_buffer(self.buffer.take().as_ref());
        self.gl.delete_vertex_array(self.vao.take().as_ref());
        self.gl.delete_program(self.program.take().as_ref());
    }
}

impl QuadPipeline for GlQuad {
    fn set_viewport(&mut self, width: u32, height: u32) {
        resize_canvas(&self.gl, &self.canvas, width, height);
    }

    fn draw(&mut self, u: &AuroraUniforms) {
        let (Some(program), Some(vao)) = (&self.program, &self.vao) else {
            return;
        };
        let gl = &self.gl;
        let l = &self.locations;
        gl.use_program(Some(program));
        gl.uniform1f(l.time.as_ref(), u.time);
        gl.uniform2f(l.resolution.as_ref(), u.resolution[0], u.resolution[1]);
        gl.uniform2f(l.pointer.as_ref(), u.pointer[0], u.pointer[1]);
        gl.uniform3fv_with_f32_array(l.palette.as_ref(), u.palette.as_flattened());
        gl.uniform1f(l.scale.as_ref(), u.scale);
        gl.uniform1f(l.intensity.as_ref(), u.intensity);
        gl.uniform1f(l.glow_radius.as_ref(), u.glow_radius);
        gl.uniform1f(l.glow_strength.as_ref(), u.glow_strength);
        gl.uniform2f(l.seed.as_ref(), u.seed[0], u.seed[1]);

        gl.bind_vertex_array(Some(vao));
        gl.draw_arrays(GL::TRIANGLES, 0, (FULLSCREEN_QUAD.len() / 2) as i32);
        gl.bind_vertex_array(None);
    }

    fn release(&mut self) {
        self.free();
        lose_context(&self.gl);
    }
}

#[derive(Default)]
struct MeshLocations {
    model: Option<WebGlUniformLocation>,
    view_proj: Option<WebGlUniformLocation>,
    normal_matrix: Option<WebGlUniformLocation>,
    camera: Option<WebGlUniformLocation>,
    surface: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    light_dir: Option<WebGlUniformLocation>,
    light_color: Option<WebGlUniformLocation>,
    point_pos: Option<WebGlUniformLocation>,
    point_color: Option<WebGlUniformLocation>,
    point_range: Option<WebGlUniformLocation>,
    fog_color: Option<WebGlUniformLocation>,
    fog: Option<WebGlUniformLocation>,
}

/// Indexed, lit plane mesh whose positions and normals are re-uploaded
/// every frame.
pub struct GlMesh {
    canvas: HtmlCanvasElement,
    gl: GL,
    program: Option<WebGlProgram>,
    vao: Option<WebGlVertexArrayObject>,
    positions: Option<WebGlBuffer>,
    normals: Option<WebGlBuffer>,
    indices: Option<WebGlBuffer>,
    index_count: i32,
    locations: MeshLocations,
}

impl GlMesh {
    pub fn new(
        canvas: HtmlCanvasElement,
        gl: GL,
        vertex: &str,
        fragment: &str,
        mesh: &PlaneMesh,
    ) -> Result<Self> {
        let program = link_program(&gl, vertex, fragment)?;
        let mut scene = Self {
            canvas,
            gl,
            program: Some(program),
            vao: None,
            positions: None,
            normals: None,
            indices: None,
            index_count: mesh.indices.len() as i32,
            locations: MeshLocations::default(),
        };
        let allocated = scene.allocate(mesh);
        scene.gl.bind_vertex_array(None);
        if let Err(err) = allocated {
            scene.free();
            return Err(err);
        }
        scene.gl.enable(GL::DEPTH_TEST);
        Ok(scene)
    }

    /// Runs with the new vertex array bound; the caller unbinds it.
    fn allocate(&mut self, mesh: &PlaneMesh) -> Result<()> {
        let gl = &self.gl;
        let Some(program) = &self.program else {
            return Err(RenderError::ResourceAllocation("program"));
        };
        let vao = gl
            .create_vertex_array()
            .ok_or(RenderError::ResourceAllocation("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));
        self.vao = Some(vao);

        let positions = array_buffer(gl, &mesh.positions, GL::DYNAMIC_DRAW)?;
        bind_attribute(gl, program, "a_position", &positions, 3);
        self.positions = Some(positions);
        let normals = array_buffer(gl, &mesh.normals, GL::DYNAMIC_DRAW)?;
        bind_attribute(gl, program, "a_normal", &normals, 3);
        self.normals = Some(normals);

        let indices = gl
            .create_buffer()
            .ok_or(RenderError::ResourceAllocation("index buffer"))?;
        gl.bind_buffer(GL::ELEMENT_ARRAY_BUFFER, Some(&indices));
        gl.buffer_data_with_array_buffer_view(
            GL::ELEMENT_ARRAY_BUFFER,
            &Uint32Array::from(mesh.indices.as_slice()),
            GL::STATIC_DRAW,
        );
        self.indices = Some(indices);

        let at = |name: &str| gl.get_uniform_location(program, name);
        self.locations = MeshLocations {
            model: at("u_model"),
            view_proj: at("u_view_proj"),
            normal_matrix: at("u_normal_matrix"),
            camera: at("u_camera"),
            surface: at("u_surface"),
            ambient: at("u_ambient"),
            light_dir: at("u_light_dir"),
            light_color: at("u_light_color"),
            point_pos: at("u_point_pos"),
            point_color: at("u_point_color"),
            point_range: at("u_point_range"),
            fog_color: at("u_fog_color"),
            fog: at("u_fog"),
        };
        Ok(())
    }

    fn free(&mut self) {
        for buffer in [self.positions.take(), self.normals.take(), self.indices.take()] {
            self.gl.delete_buffer(buffer.as_ref());
        }
        self.gl.delete_vertex_array(self.vao.take().as_ref());
        self.gl.delete_program(self.program.take().as_ref());
    }

    fn refill(&self, buffer: Option<&WebGlBuffer>, data: &[f32]) {
        self.gl.bind_buffer(GL::ARRAY_BUFFER, buffer);
        self.gl.buffer_sub_data_with_i32_and_array_buffer_view(
            GL::ARRAY_BUFFER,
            0,
            &Float32Array::from(data),
        );
    }
}

impl MeshPipeline for GlMesh {
    fn set_viewport(&mut self, width: u32, height: u32) {
        resize_canvas(&self.gl, &self.canvas, width, height);
    }

    fn upload(&mut self, mesh: &PlaneMesh) {
        if self.positions.is_none() {
            return;
        }
        self.refill(self.positions.as_ref(), &mesh.positions);
        self.refill(self.normals.as_ref(), &mesh.normals);
        self.gl.bind_buffer(GL::ARRAY_BUFFER, None);
    }

    fn draw(&mut self, u: &WaveUniforms, clear: [f32; 3]) {
        let (Some(program), Some(vao)) = (&self.program, &self.vao) else {
            return;
        };
        let gl = &self.gl;
        let l = &self.locations;
        gl.clear_color(clear[0], clear[1], clear[2], 1.0);
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);

        gl.use_program(Some(program));
        gl.uniform_matrix4fv_with_f32_array(l.model.as_ref(), false, &u.model.to_cols_array());
        gl.uniform_matrix4fv_with_f32_array(
            l.view_proj.as_ref(),
            false,
            &u.view_proj.to_cols_array(),
        );
        gl.uniform_matrix3fv_with_f32_array(
            l.normal_matrix.as_ref(),
            false,
            &u.normal_matrix.to_cols_array(),
        );
        gl.uniform3f(l.camera.as_ref(), u.camera.x, u.camera.y, u.camera.z);
        gl.uniform3fv_with_f32_array(l.surface.as_ref(), &u.surface);
        gl.uniform3fv_with_f32_array(l.ambient.as_ref(), &u.ambient);
        gl.uniform3fv_with_f32_array(l.light_dir.as_ref(), &u.light_dir);
        gl.uniform3fv_with_f32_array(l.light_color.as_ref(), &u.light_color);
        gl.uniform3fv_with_f32_array(l.point_pos.as_ref(), u.point_pos.as_flattened());
        gl.uniform3fv_with_f32_array(l.point_color.as_ref(), u.point_color.as_flattened());
        gl.uniform1fv_with_f32_array(l.point_range.as_ref(), &u.point_range);
        gl.uniform3fv_with_f32_array(l.fog_color.as_ref(), &u.fog_color);
        gl.uniform2f(l.fog.as_ref(), u.fog[0], u.fog[1]);

        gl.bind_vertex_array(Some(vao));
        gl.draw_elements_with_i32(GL::TRIANGLES, self.index_count, GL::UNSIGNED_INT, 0);
        gl.bind_vertex_array(None);
    }

    fn release(&mut self) {
        self.free();
        lose_context(&self.gl);
    }
}
