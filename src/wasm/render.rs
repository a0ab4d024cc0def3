use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlElement, MouseEvent, Window};

use super::canvas::{layout_of, CanvasHost};
use super::dom::{DomListener, FrameSlot, RafScheduler};
use crate::aurora::ShaderRenderer;
use crate::beams::BeamRenderer;
use crate::config::RendererSpec;
use crate::lifecycle::{Mount, MountOutcome, Renderer};
use crate::wave::WaveRenderer;

const SPEC_ATTR: &str = "data-hero-fx";
const CONFIG_ATTR: &str = "data-hero-fx-config";

thread_local! {
    static MOUNTED: RefCell<Vec<HeroBackground>> = RefCell::new(Vec::new());
}

/// Type-erased handle on a running mount.
trait Teardown {
    fn teardown(&self);
    fn animating(&self) -> bool;
}

impl<R: Renderer> Teardown for Mount<R, RafScheduler> {
    fn teardown(&self) {
        self.unmount();
    }

    fn animating(&self) -> bool {
        self.frames().is_running()
    }
}

struct Active {
    mount: Rc<dyn Teardown>,
    frame: FrameSlot,
    host: CanvasHost,
}

impl Active {
    fn stop(self) {
        self.mount.teardown();
        // Dropping the closure here, outside any frame callback, frees it.
        self.frame.borrow_mut().take();
        self.host.canvas.remove();
    }
}

/// One animated background attached to a page element.
#[wasm_bindgen]
pub struct HeroBackground {
    active: Option<Active>,
}

#[wasm_bindgen]
impl HeroBackground {
    /// Mount a renderer described by `spec` (`"beams:ember"`, `"aurora"`,
    /// `"waves"`) into `container`. Setup failures leave the container with
    /// its static background color and return a non-animating handle.
    pub fn mount(
        container: HtmlElement,
        spec: &str,
        config: Option<String>,
    ) -> Result<HeroBackground, JsValue> {
        let spec = RendererSpec::parse(spec, config.as_deref())?;
        container
            .style()
            .set_property("background-color", &spec.background().to_string())?;

        let host = CanvasHost::create(&container)?;
        let active = match spec {
            RendererSpec::Beams(cfg) => {
                let outcome = BeamRenderer::mount(&host, cfg);
                start(host, outcome)?
            }
            RendererSpec::Aurora(cfg) => {
                let outcome = ShaderRenderer::mount(&host, cfg);
                start(host, outcome)?
            }
            RendererSpec::Waves(cfg) => {
                let outcome = WaveRenderer::mount(&host, cfg);
                start(host, outcome)?
            }
        };
        Ok(HeroBackground { active })
    }

    #[wasm_bindgen(getter)]
    pub fn animating(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.mount.animating())
    }

    /// Stop the loop, drop listeners and GPU resources, remove the canvas.
    pub fn unmount(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop();
        }
    }
}

impl Drop for HeroBackground {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn start<R: Renderer + 'static>(
    host: CanvasHost,
    outcome: MountOutcome<R>,
) -> Result<Option<Active>, JsValue> {
    let renderer = match outcome {
        MountOutcome::Running(renderer) => renderer,
        MountOutcome::Degraded(_) => {
            host.canvas.remove();
            return Ok(None);
        }
    };

    let window = web_sys::window().ok_or("no window")?;
    let frame: FrameSlot = Rc::new(RefCell::new(None));
    let mount = Rc::new(Mount::new(
        renderer,
        RafScheduler::new(window.clone(), frame.clone()),
    ));

    // The frame closure only holds a weak reference, so the mount is freed
    // once the handle lets go of it.
    {
        let weak = Rc::downgrade(&mount);
        *frame.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            let Some(mount) = weak.upgrade() else {
                return;
            };
            if let Err(err) = mount.tick(timestamp) {
                log::error!("frame failed, stopping: {err}");
                mount.unmount();
            }
        }) as Box<dyn FnMut(f64)>));
    }

    let active = Active {
        mount: mount.clone(),
        frame,
        host,
    };
    if let Err(err) = wire(&mount, &window, &active.host.container) {
        active.stop();
        return Err(err);
    }
    Ok(Some(active))
}

/// Register the resize and pointer listeners, then request the first frame.
fn wire<R: Renderer + 'static>(
    mount: &Rc<Mount<R, RafScheduler>>,
    window: &Window,
    container: &HtmlElement,
) -> Result<(), JsValue> {
    {
        let weak = Rc::downgrade(mount);
        let container = container.clone();
        mount.listen(Box::new(DomListener::add(
            window.as_ref(),
            "resize",
            move |_: Event| {
                if let Some(mount) = weak.upgrade() {
                    let (w, h) = layout_of(&container);
                    mount.resize(w, h);
                }
            },
        )?));
    }

    {
        let weak = Rc::downgrade(mount);
        let container = container.clone();
        mount.listen(Box::new(DomListener::add(
            window.as_ref(),
            "pointermove",
            move |event: Event| {
                let (Some(mount), Some(event)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>())
                else {
                    return;
                };
                let rect = container.get_bounding_client_rect();
                mount.pointer_moved(
                    (f64::from(event.client_x()) - rect.left()) as f32,
                    (f64::from(event.client_y()) - rect.top()) as f32,
                );
            },
        )?));
    }

    mount.start()?;
    Ok(())
}

/// Mount every element carrying `data-hero-fx`. A bad element is logged and
/// skipped so one broken section cannot blank the rest of the page.
pub fn mount_all(document: &Document) -> Result<(), JsValue> {
    let nodes = document.query_selector_all(&format!("[{SPEC_ATTR}]"))?;
    for i in 0..nodes.length() {
        let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
            continue;
        };
        let spec = element.get_attribute(SPEC_ATTR).unwrap_or_default();
        let config = element.get_attribute(CONFIG_ATTR);
        match HeroBackground::mount(element, &spec, config) {
            Ok(handle) => MOUNTED.with(|m| m.borrow_mut().push(handle)),
            Err(err) => log::warn!("skipping `{spec}` background: {err:?}"),
        }
    }
    Ok(())
}

/// Tear down everything [`mount_all`] started.
#[wasm_bindgen]
pub fn unmount_all() {
    let handles = MOUNTED.with(|m| std::mem::take(&mut *m.borrow_mut()));
    for mut handle in handles {
        handle.unmount();
    }
}
