//! Recording fakes for the browser seams.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hero_fx_wasm::aurora::{AuroraUniforms, QuadPipeline, QuadTarget};
use hero_fx_wasm::color::Rgb;
use hero_fx_wasm::error::{RenderError, Result, ShaderStage};
use hero_fx_wasm::lifecycle::{FrameScheduler, Subscription};
use hero_fx_wasm::surface::{BeamPose, CanvasTarget, Composite, Surface2d};
use hero_fx_wasm::wave::{MeshPipeline, MeshTarget, PlaneMesh, WaveUniforms};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Composite(Composite),
    Blur(f32),
    Fill(Rgb),
    Draw { composite: Composite, opacity: f32 },
}

#[derive(Default)]
pub struct RecordingSurface {
    pub size: (u32, u32),
    pub composite: Option<Composite>,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    fn draw(&mut self, pose: &BeamPose) {
        self.ops.push(Op::Draw {
            composite: self.composite.unwrap_or(Composite::Normal),
            opacity: pose.opacity,
        });
    }

    pub fn draws(&self) -> Vec<(Composite, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Draw { composite, opacity } => Some((composite, opacity)),
                _ => None,
            })
            .collect()
    }
}

impl Surface2d for RecordingSurface {
    fn backing_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_composite(&mut self, mode: Composite) {
        self.composite = Some(mode);
        self.ops.push(Op::Composite(mode));
    }

    fn set_blur(&mut self, radius: f32) {
        self.ops.push(Op::Blur(radius));
    }

    fn fill(&mut self, color: Rgb) {
        self.ops.push(Op::Fill(color));
    }

    fn draw_radial_beam(&mut self, pose: &BeamPose) {
        self.draw(pose);
    }

    fn draw_linear_beam(&mut self, pose: &BeamPose) {
        self.draw(pose);
    }
}

/// What a fake target hands back when asked for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Available,
    Missing,
    CompileFails,
}

pub struct FakeCanvas {
    pub layout: (u32, u32),
    pub context: Context,
}

impl FakeCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layout: (width, height),
            context: Context::Available,
        }
    }

    pub fn with(context: Context) -> Self {
        Self {
            context,
            ..Self::new(800, 600)
        }
    }

    fn check(&self) -> Result<bool> {
        match self.context {
            Context::Available => Ok(true),
            Context::Missing => Ok(false),
            Context::CompileFails => Err(RenderError::ShaderCompile {
                stage: ShaderStage::Fragment,
                log: "ERROR: 0:12: 'snoise' : no matching overloaded function found".into(),
            }),
        }
    }
}

impl CanvasTarget for FakeCanvas {
    type Surface = RecordingSurface;

    fn layout_size(&self) -> (u32, u32) {
        self.layout
    }

    fn surface_2d(&self) -> Result<Option<RecordingSurface>> {
        Ok(self.check()?.then(RecordingSurface::default))
    }
}

/// Counters shared between a fake pipeline and the test holding it.
#[derive(Default, Debug)]
pub struct GpuLog {
    pub viewports: RefCell<Vec<(u32, u32)>>,
    pub draws: Cell<u32>,
    pub uploads: Cell<u32>,
    pub releases: Cell<u32>,
}

pub struct FakePipeline(pub Rc<GpuLog>);

impl QuadPipeline for FakePipeline {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.0.viewports.borrow_mut().push((width, height));
    }

    fn draw(&mut self, _: &AuroraUniforms) {
        self.0.draws.set(self.0.draws.get() + 1);
    }

    fn release(&mut self) {
        self.0.releases.set(self.0.releases.get() + 1);
    }
}

impl MeshPipeline for FakePipeline {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.0.viewports.borrow_mut().push((width, height));
    }

    fn upload(&mut self, _: &PlaneMesh) {
        self.0.uploads.set(self.0.uploads.get() + 1);
    }

    fn draw(&mut self, _: &WaveUniforms, _: [f32; 3]) {
        self.0.draws.set(self.0.draws.get() + 1);
    }

    fn release(&mut self) {
        self.0.releases.set(self.0.releases.get() + 1);
    }
}

pub struct FakeGl {
    pub canvas: FakeCanvas,
    pub log: Rc<GpuLog>,
}

impl FakeGl {
    pub fn new(context: Context) -> Self {
        Self {
            canvas: FakeCanvas::with(context),
            log: Rc::default(),
        }
    }
}

impl QuadTarget for FakeGl {
    type Pipeline = FakePipeline;

    fn layout_size(&self) -> (u32, u32) {
        self.canvas.layout
    }

    fn quad_pipeline(&self, _: &str, _: &str) -> Result<Option<FakePipeline>> {
        Ok(self.canvas.check()?.then(|| FakePipeline(self.log.clone())))
    }
}

impl MeshTarget for FakeGl {
    type Pipeline = FakePipeline;

    fn layout_size(&self) -> (u32, u32) {
        self.canvas.layout
    }

    fn mesh_pipeline(&self, _: &str, _: &str, _: &PlaneMesh) -> Result<Option<FakePipeline>> {
        Ok(self.canvas.check()?.then(|| FakePipeline(self.log.clone())))
    }
}

/// Frame scheduler tracking which requests are still outstanding.
#[derive(Default)]
pub struct Frames {
    next: Cell<u32>,
    pub live: RefCell<Vec<u32>>,
}

impl Frames {
    /// Simulate the host firing the pending frame.
    pub fn fire(&self) {
        self.live.borrow_mut().clear();
    }
}

/// Scheduler handed to a mount; the test keeps its own `Rc<Frames>`.
pub struct Sched(pub Rc<Frames>);

impl FrameScheduler for Sched {
    type Handle = u32;

    fn request(&self) -> Result<u32> {
        let id = self.0.next.get() + 1;
        self.0.next.set(id);
        self.0.live.borrow_mut().push(id);
        Ok(id)
    }

    fn cancel(&self, handle: u32) {
        self.0.live.borrow_mut().retain(|&h| h != handle);
    }
}

/// A listener that counts itself in `registered` until cancelled.
pub struct Listener(Rc<Cell<usize>>);

impl Listener {
    pub fn register(registered: &Rc<Cell<usize>>) -> Box<dyn Subscription> {
        registered.set(registered.get() + 1);
        Box::new(Self(registered.clone()))
    }
}

impl Subscription for Listener {
    fn cancel(self: Box<Self>) {
        self.0.set(self.0.get() - 1);
    }
}
