use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Event, EventTarget, Window};

use crate::error::{RenderError, Result};
use crate::lifecycle::{FrameScheduler, Subscription};

/// Holds the animation-frame closure. It is filled after the mount exists so
/// the closure can reach the mount through a weak reference.
pub type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` / `cancelAnimationFrame`.
pub struct RafScheduler {
    window: Window,
    callback: FrameSlot,
}

impl RafScheduler {
    pub fn new(window: Window, callback: FrameSlot) -> Self {
        Self { window, callback }
    }
}

impl FrameScheduler for RafScheduler {
    type Handle = i32;

    fn request(&self) -> Result<i32> {
        let slot = self.callback.borrow();
        let callback = slot
            .as_ref()
            .ok_or_else(|| RenderError::Js("frame callback already dropped".into()))?;
        Ok(self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())?)
    }

    fn cancel(&self, handle: i32) {
        if let Err(err) = self.window.cancel_animation_frame(handle) {
            log::debug!("cancelAnimationFrame({handle}) failed: {err:?}");
        }
    }
}

/// A DOM event listener that removes itself when cancelled.
pub struct DomListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl DomListener {
    pub fn add(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Subscription for DomListener {
    fn cancel(self: Box<Self>) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        {
            log::debug!("removing `{}` listener failed: {err:?}", self.event);
        }
    }
}
