use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement,
    WebGl2RenderingContext,
};

use super::gl::{GlMesh, GlQuad};
use crate::aurora::QuadTarget;
use crate::color::Rgb;
use crate::error::Result;
use crate::surface::{backing_dims, BeamPose, CanvasTarget, Composite, GradientStop, Surface2d};
use crate::wave::{MeshTarget, PlaneMesh};

const CANVAS_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("inset", "0"),
    ("width", "100%"),
    ("height", "100%"),
    ("display", "block"),
    ("pointer-events", "none"),
];

/// Layout size of `element` in CSS pixels.
pub fn layout_of(element: &HtmlElement) -> (u32, u32) {
    backing_dims(
        f64::from(element.client_width()),
        f64::from(element.client_height()),
    )
}

/// A `<canvas>` appended to a hero section, filling it.
pub struct CanvasHost {
    pub container: HtmlElement,
    pub canvas: HtmlCanvasElement,
}

impl CanvasHost {
    pub fn create(container: &HtmlElement) -> Result<Self, JsValue> {
        let document = container.owner_document().ok_or("element has no document")?;
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_attribute("aria-hidden", "true")?;
        let style = canvas.style();
        for (name, value) in CANVAS_STYLE {
            style.set_property(name, value)?;
        }
        container.append_child(&canvas)?;
        Ok(Self {
            container: container.clone(),
            canvas,
        })
    }

    fn webgl2(&self) -> Result<Option<WebGl2RenderingContext>> {
        let Some(ctx) = self.canvas.get_context("webgl2")? else {
            return Ok(None);
        };
        Ok(Some(ctx.dyn_into::<WebGl2RenderingContext>().map_err(JsValue::from)?))
    }
}

impl CanvasTarget for CanvasHost {
    type Surface = Canvas2d;

    fn layout_size(&self) -> (u32, u32) {
        layout_of(&self.container)
    }

    fn surface_2d(&self) -> Result<Option<Canvas2d>> {
        let Some(ctx) = self.canvas.get_context("2d")? else {
            return Ok(None);
        };
        Ok(Some(Canvas2d {
            canvas: self.canvas.clone(),
            ctx: ctx
                .dyn_into::<CanvasRenderingContext2d>()
                .map_err(JsValue::from)?,
        }))
    }
}

impl QuadTarget for CanvasHost {
    type Pipeline = GlQuad;

    fn layout_size(&self) -> (u32, u32) {
        layout_of(&self.container)
    }

    fn quad_pipeline(&self, vertex: &str, fragment: &str) -> Result<Option<GlQuad>> {
        let Some(gl) = self.webgl2()? else {
            return Ok(None);
        };
        GlQuad::new(self.canvas.clone(), gl, vertex, fragment).map(Some)
    }
}

impl MeshTarget for CanvasHost {
    type Pipeline = GlMesh;

    fn layout_size(&self) -> (u32, u32) {
        layout_of(&self.container)
    }

    fn mesh_pipeline(&self, vertex: &str, fragment: &str, mesh: &PlaneMesh) -> Result<Option<GlMesh>> {
        let Some(gl) = self.webgl2()? else {
            return Ok(None);
        };
        GlMesh::new(self.canvas.clone(), gl, vertex, fragment, mesh).map(Some)
    }
}

pub struct Canvas2d {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas2d {
    fn add_stops(gradient: &CanvasGradient, stops: &[GradientStop]) -> Result<(), JsValue> {
        for stop in stops {
            gradient.add_color_stop(stop.offset.clamp(0.0, 1.0), &stop.color.css_rgba(stop.alpha))?;
        }
        Ok(())
    }

    /// Paint the beam ellipse in its own transformed frame, origin at the beam centre.
    fn paint(
        &self,
        pose: &BeamPose,
        gradient: impl FnOnce(&CanvasRenderingContext2d, f64) -> Result<CanvasGradient, JsValue>,
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let r = f64::from(pose.radius);
        ctx.save();
        ctx.translate(f64::from(pose.x), f64::from(pose.y))?;
        ctx.rotate(f64::from(pose.rotation))?;
        ctx.scale(1.0, f64::from(pose.stretch))?;
        let fill = gradient(ctx, r)?;
        Self::add_stops(&fill, &pose.stops)?;
        ctx.set_fill_style_canvas_gradient(&fill);
        ctx.begin_path();
        ctx.ellipse(0.0, 0.0, r, r, 0.0, 0.0, TAU)?;
        ctx.fill();
        ctx.restore();
        Ok(())
    }
}

impl Surface2d for Canvas2d {
    fn backing_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn set_composite(&mut self, mode: Composite) {
        if let Err(err) = self.ctx.set_global_composite_operation(mode.css()) {
            log::debug!("globalCompositeOperation rejected: {err:?}");
        }
    }

    fn set_blur(&mut self, radius: f32) {
        if radius > 0.0 {
            self.ctx.set_filter(&format!("blur({radius}px)"));
        } else {
            self.ctx.set_filter("none");
        }
    }

    fn fill(&mut self, color: Rgb) {
        let (w, h) = self.backing_size();
        self.ctx.set_global_alpha(1.0);
        self.ctx.set_fill_style_str(&color.to_string());
        self.ctx.fill_rect(0.0, 0.0, f64::from(w), f64::from(h));
    }

    fn draw_radial_beam(&mut self, pose: &BeamPose) {
        let painted = self.paint(pose, |ctx, r| ctx.create_radial_gradient(0.0, 0.0, 0.0, 0.0, 0.0, r));
        if let Err(err) = painted {
            // Pop the state `paint` saved before it bailed out.
            self.ctx.restore();
            log::debug!("radial beam skipped: {err:?}");
        }
    }

    fn draw_linear_beam(&mut self, pose: &BeamPose) {
        let painted = self.paint(pose, |ctx, r| Ok(ctx.create_linear_gradient(0.0, -r, 0.0, r)));
        if let Err(err) = painted {
            self.ctx.restore();
            log::debug!("linear beam skipped: {err:?}");
        }
    }
}
