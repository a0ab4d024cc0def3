#![cfg(not(target_arch = "wasm32"))]

mod common;

use glam::Vec3;

use common::{Context, FakeGl};
use hero_fx_wasm::config::WaveConfig;
use hero_fx_wasm::wave::{WaveRenderer, WaveScene};
use hero_fx_wasm::Renderer;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn aspect_follows_viewport() {
    let mut scene = WaveScene::new(WaveConfig::default(), (1920, 1080)).unwrap();
    assert!(approx(scene.camera().aspect, 16.0 / 9.0));
    scene.resize((1080, 1920));
    assert!(approx(scene.camera().aspect, 9.0 / 16.0));
    scene.resize((0, 0));
    assert!(approx(scene.camera().aspect, 1.0));
}

#[test]
fn look_target_projects_to_screen_centre() {
    let scene = WaveScene::new(WaveConfig::default(), (1280, 720)).unwrap();
    let clip = scene.camera().view_proj() * Vec3::ZERO.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(approx(ndc.x, 0.0) && approx(ndc.y, 0.0), "{ndc:?}");
    assert!(ndc.z > -1.0 && ndc.z < 1.0);
}

#[test]
fn wide_and_tall_viewports_keep_vertical_extent() {
    // A point on the plane edge keeps the same NDC y whatever the width.
    let p = Vec3::new(0.0, 5.0, 0.0).extend(1.0);
    let ndc_y = |viewport| {
        let scene = WaveScene::new(WaveConfig::default(), viewport).unwrap();
        let clip = scene.camera().view_proj() * p;
        clip.y / clip.w
    };
    assert!(approx(ndc_y((1920, 1080)), ndc_y((1080, 1080))));
}

#[test]
fn renderer_resize_reaches_pipeline_and_camera() {
    let gl = FakeGl::new(Context::Available);
    let mut waves = WaveRenderer::mount(&gl, WaveConfig::default()).running().unwrap();
    waves.resize(1000, 500);
    assert!(approx(waves.scene().camera().aspect, 2.0));
    assert_eq!(gl.log.viewports.borrow().as_slice(), &[(800, 600), (1000, 500)]);
}
