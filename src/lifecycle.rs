//! Mount/unmount plumbing shared by every renderer.
//!
//! A mount owns exactly one frame loop and the listeners it registered. Both
//! are torn down on the same path in [`Mount::unmount`], so a mount followed
//! by an unmount leaves no scheduled frame and no listener behind.

use std::cell::{Cell, RefCell};

use crate::error::{RenderError, Result};

/// What every renderer does once mounted.
pub trait Renderer {
    /// Paint one frame, `elapsed_ms` after the first frame of this mount.
    fn frame(&mut self, elapsed_ms: f64);

    /// The container now has this layout size in CSS pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Pointer position relative to the container's top-left corner.
    fn pointer_moved(&mut self, x: f32, y: f32);

    /// Release native resources. Called once, from [`Mount::unmount`].
    fn release(&mut self) {}
}

/// Result of setting up a renderer. A degraded mount keeps the static
/// background and never animates.
pub enum MountOutcome<R> {
    Running(R),
    Degraded(RenderError),
}

impl<R> MountOutcome<R> {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn running(self) -> Option<R> {
        match self {
            Self::Running(r) => Some(r),
            Self::Degraded(_) => None,
        }
    }
}

impl<R> std::fmt::Debug for MountOutcome<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running(_) => f.write_str("Running"),
            Self::Degraded(err) => write!(f, "Degraded({err})"),
        }
    }
}

/// Turn a setup failure into a logged, non-fatal degraded mount.
pub fn degrade<R>(renderer: &str, setup: Result<R>) -> MountOutcome<R> {
    match setup {
        Ok(r) => MountOutcome::Running(r),
        Err(err @ (RenderError::ShaderCompile { .. } | RenderError::ProgramLink { .. })) => {
            log::error!("{renderer}: {err}; falling back to static background");
            MountOutcome::Degraded(err)
        }
        Err(err) => {
            log::warn!("{renderer}: {err}; falling back to static background");
            MountOutcome::Degraded(err)
        }
    }
}

/// The host's "run this on the next frame" primitive.
pub trait FrameScheduler {
    type Handle: Copy;

    fn request(&self) -> Result<Self::Handle>;
    fn cancel(&self, handle: Self::Handle);
}

/// Keeps at most one frame request outstanding.
pub struct FrameLoop<S: FrameScheduler> {
    scheduler: S,
    pending: Cell<Option<S::Handle>>,
    running: Cell<bool>,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            pending: Cell::new(None),
            running: Cell::new(false),
        }
    }

    pub fn start(&self) -> Result<()> {
        if self.running.replace(true) {
            return Ok(());
        }
        self.schedule()
    }

    /// Called from the frame callback: the request that fired is consumed
    /// and, unless the loop was stopped meanwhile, the next one is made.
    pub fn fired(&self) -> Result<()> {
        self.pending.set(None);
        if self.running.get() {
            self.schedule()
        } else {
            Ok(())
        }
    }

    fn schedule(&self) -> Result<()> {
        if let Some(previous) = self.pending.take() {
            self.scheduler.cancel(previous);
        }
        let handle = self.scheduler.request()?;
        self.pending.set(Some(handle));
        Ok(())
    }

    pub fn stop(&self) {
        self.running.set(false);
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

/// A registered listener that knows how to remove itself.
pub trait Subscription {
    fn cancel(self: Box<Self>);
}

#[derive(Default)]
pub struct Subscriptions {
    active: RefCell<Vec<Box<dyn Subscription>>>,
}

impl Subscriptions {
    pub fn push(&self, sub: Box<dyn Subscription>) {
        self.active.borrow_mut().push(sub);
    }

    pub fn len(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cancel_all(&self) {
        let subs = std::mem::take(&mut *self.active.borrow_mut());
        for sub in subs {
            sub.cancel();
        }
    }
}

/// One mounted renderer with its loop and listeners.
pub struct Mount<R: Renderer, S: FrameScheduler> {
    renderer: RefCell<R>,
    frames: FrameLoop<S>,
    subscriptions: Subscriptions,
    first_frame: Cell<Option<f64>>,
    released: Cell<bool>,
}

impl<R: Renderer, S: FrameScheduler> Mount<R, S> {
    pub fn new(renderer: R, scheduler: S) -> Self {
        Self {
            renderer: RefCell::new(renderer),
            frames: FrameLoop::new(scheduler),
            subscriptions: Subscriptions::default(),
            first_frame: Cell::new(None),
            released: Cell::new(false),
        }
    }

    pub fn start(&self) -> Result<()> {
        self.frames.start()
    }

    pub fn listen(&self, sub: Box<dyn Subscription>) {
        self.subscriptions.push(sub);
    }

    /// Frame callback body. `timestamp_ms` is the host's frame timestamp.
    pub fn tick(&self, timestamp_ms: f64) -> Result<()> {
        if !self.frames.is_running() {
            return Ok(());
        }
        let start = self.first_frame.get().unwrap_or(timestamp_ms);
        self.first_frame.set(Some(start));
        self.renderer.borrow_mut().frame((timestamp_ms - start).max(0.0));
        self.frames.fired()
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.renderer.borrow_mut().resize(width, height);
    }

    pub fn pointer_moved(&self, x: f32, y: f32) {
        self.renderer.borrow_mut().pointer_moved(x, y);
    }

    /// Cancel the pending frame, remove every listener and release the
    /// renderer. Safe to call more than once.
    pub fn unmount(&self) {
        self.frames.stop();
        self.subscriptions.cancel_all();
        if !self.released.replace(true) {
            self.renderer.borrow_mut().release();
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.released.get()
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn frames(&self) -> &FrameLoop<S> {
        &self.frames
    }

    pub fn renderer(&self) -> std::cell::Ref<'_, R> {
        self.renderer.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        next: Cell<u32>,
        live: RefCell<Vec<u32>>,
    }

    impl FrameScheduler for Rc<Counter> {
        type Handle = u32;

        fn request(&self) -> Result<u32> {
            let id = self.next.get() + 1;
            self.next.set(id);
            self.live.borrow_mut().push(id);
            Ok(id)
        }

        fn cancel(&self, handle: u32) {
            self.live.borrow_mut().retain(|&h| h != handle);
        }
    }

    #[derive(Default)]
    struct Frames(Vec<f64>);

    impl Renderer for Frames {
        fn frame(&mut self, elapsed_ms: f64) {
            self.0.push(elapsed_ms);
        }
        fn resize(&mut self, _: u32, _: u32) {}
        fn pointer_moved(&mut self, _: f32, _: f32) {}
    }

    #[test]
    fn elapsed_is_measured_from_first_tick() {
        let counter = Rc::new(Counter::default());
        let mount = Mount::new(Frames::default(), counter.clone());
        mount.start().unwrap();
        for ts in [1000.0, 1016.0, 1033.0] {
            counter.live.borrow_mut().clear();
            mount.tick(ts).unwrap();
        }
        assert_eq!(mount.renderer().0, vec![0.0, 16.0, 33.0]);
    }

    #[test]
    fn loop_keeps_one_request_outstanding() {
        let counter = Rc::new(Counter::default());
        let frames = FrameLoop::new(counter.clone());
        frames.start().unwrap();
        frames.start().unwrap();
        assert_eq!(counter.live.borrow().len(), 1);
        frames.stop();
        assert!(counter.live.borrow().is_empty());
        assert!(!frames.has_pending());
    }

    #[test]
    fn tick_after_unmount_does_not_reschedule() {
        let counter = Rc::new(Counter::default());
        let mount = Mount::new(Frames::default(), counter.clone());
        mount.start().unwrap();
        mount.unmount();
        mount.tick(5.0).unwrap();
        assert!(counter.live.borrow().is_empty());
        assert!(mount.renderer().0.is_empty());
    }

    #[test]
    fn degrade_keeps_the_error() {
        let outcome: MountOutcome<()> =
            degrade("test", Err(RenderError::invalid("nope")));
        assert!(!outcome.is_running());
        assert!(matches!(outcome, MountOutcome::Degraded(RenderError::InvalidConfig(_))));
    }
}
