//! Animated hero-section backgrounds for the browser.
//!
//! Three renderers share one lifecycle: a canvas beam field
//! ([`beams::BeamRenderer`]), a WebGL aurora shader
//! ([`aurora::ShaderRenderer`]) and a lit 3D wave surface
//! ([`wave::WaveRenderer`]). Everything outside `wasm` is plain Rust and
//! runs under `cargo test` on the host.

pub mod aurora;
pub mod beams;
pub mod color;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod noise;
pub mod rng;
pub mod smoothing;
pub mod surface;
pub mod toast;
pub mod wave;

pub use config::{BeamConfig, BeamPreset, RendererSpec, ShaderConfig, ShaderPreset, WaveConfig};
pub use error::{RenderError, Result};
pub use lifecycle::{Mount, MountOutcome, Renderer};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod canvas;
    mod dom;
    mod gl;
    mod render;

    pub use render::{unmount_all, HeroBackground};

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();
        log::info!("hero backgrounds starting");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        render::mount_all(&document)?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{unmount_all, HeroBackground};
