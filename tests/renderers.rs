#![cfg(not(target_arch = "wasm32"))]

mod common;

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use common::{Context, FakeCanvas, FakeGl, Frames, Listener, Op, Sched};
use hero_fx_wasm::aurora::ShaderRenderer;
use hero_fx_wasm::beams::{BeamField, BeamRenderer};
use hero_fx_wasm::config::{BeamPreset, ShaderPreset, WaveConfig};
use hero_fx_wasm::error::{ContextKind, RenderError};
use hero_fx_wasm::smoothing::Smoothed;
use hero_fx_wasm::surface::{Composite, Surface2d};
use hero_fx_wasm::wave::WaveRenderer;
use hero_fx_wasm::{Mount, MountOutcome, Renderer};

fn seeded_beams(seed: u64) -> hero_fx_wasm::BeamConfig {
    let mut config = BeamPreset::Aurora.config();
    config.seed = Some(seed);
    config
}

#[test]
fn smoothing_approaches_without_overshoot() {
    let target = Vec2::new(0.8, -0.6);
    let mut pointer = Smoothed::new(Vec2::ZERO, 0.04).unwrap();
    pointer.set_target(target);

    let mut distance = target.length();
    for _ in 0..400 {
        let now = pointer.step();
        let d = now.distance(target);
        assert!(d <= distance + 1e-6, "moved away: {d} > {distance}");
        assert!(now.x >= 0.0 && now.x <= target.x + 1e-6);
        assert!(now.y <= 0.0 && now.y >= target.y - 1e-6);
        distance = d;
    }
    assert_eq!(pointer.current(), target);
}

#[test]
fn canvas_backing_tracks_layout() {
    let canvas = FakeCanvas::new(640, 360);
    let mut beams = BeamRenderer::mount(&canvas, seeded_beams(7)).running().unwrap();
    assert_eq!(beams.surface().backing_size(), (640, 360));

    beams.resize(1280, 720);
    assert_eq!(beams.surface().backing_size(), (1280, 720));

    beams.resize(0, 0);
    assert_eq!(beams.surface().backing_size(), (1, 1));
}

#[test]
fn zero_layout_is_clamped_the_same_on_mount_and_resize() {
    let canvas = FakeCanvas::new(0, 0);
    let mut beams = BeamRenderer::mount(&canvas, seeded_beams(7)).running().unwrap();
    let mounted = beams.surface().backing_size();
    beams.resize(0, 0);
    assert_eq!(mounted, (1, 1));
    assert_eq!(beams.surface().backing_size(), mounted);

    let mut gl = FakeGl::new(Context::Available);
    gl.canvas.layout = (0, 0);
    let mut aurora = ShaderRenderer::mount(&gl, ShaderPreset::Aurora.config()).running().unwrap();
    aurora.resize(0, 0);
    assert_eq!(gl.log.viewports.borrow().as_slice(), &[(1, 1), (1, 1)]);
}

#[test]
fn resize_keeps_the_seed() {
    let canvas = FakeCanvas::new(640, 360);
    let mut beams = BeamRenderer::mount(&canvas, seeded_beams(11)).running().unwrap();
    let before: Vec<(f32, f32, f32)> = beams.field().beams().iter().map(|b| (b.x, b.y, b.z)).collect();

    beams.resize(1920, 1080);
    let after: Vec<(f32, f32, f32)> = beams.field().beams().iter().map(|b| (b.x, b.y, b.z)).collect();
    assert_eq!(before, after);
    assert_eq!(beams.seed(), 11);
}

#[test]
fn opacity_stays_within_bounds_over_a_full_cycle() {
    let field = BeamField::generate(&seeded_beams(3), (1280, 720), 3);
    for beam in field.beams() {
        let period = std::f32::consts::TAU / beam.pulse_speed;
        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        for i in 0..=2000 {
            let o = beam.opacity_at(period * i as f32 / 2000.0);
            assert!(beam.opacity.contains(o), "{o} outside {:?}", beam.opacity);
            lo = lo.min(o);
            hi = hi.max(o);
        }
        let span = beam.opacity.max - beam.opacity.min;
        assert!(lo - beam.opacity.min <= 1e-3 * span.max(1e-3));
        assert!(beam.opacity.max - hi <= 1e-3 * span.max(1e-3));
    }
}

#[test]
fn fixed_seed_reproduces_the_field() {
    let config = seeded_beams(0x5eed);
    assert_eq!(config.count, 35);
    let a = BeamField::generate(&config, (1440, 900), 0x5eed);
    let b = BeamField::generate(&config, (1440, 900), 0x5eed);
    assert_eq!(a.beams().len(), 35);
    assert_eq!(a.beams(), b.beams());

    let c = BeamField::generate(&config, (1440, 900), 0x5eee);
    assert_ne!(a.beams(), c.beams());
}

#[test]
fn every_beam_is_drawn_additively_over_an_opaque_fill() {
    let canvas = FakeCanvas::new(1024, 576);
    let config = seeded_beams(21);
    let background = config.background;
    let mut beams = BeamRenderer::mount(&canvas, config).running().unwrap();
    beams.frame(0.0);
    beams.frame(1500.0);

    let ops = &beams.surface().ops;
    let fill = ops.iter().position(|op| *op == Op::Fill(background)).unwrap();
    assert!(ops[..fill].iter().all(|op| !matches!(op, Op::Draw { .. })));

    let draws = beams.surface().draws();
    assert_eq!(draws.len(), 2 * 35);
    assert!(draws.iter().all(|(mode, _)| *mode == Composite::Additive));
    // Composite goes back to normal after each frame.
    assert_eq!(ops.last(), Some(&Op::Composite(Composite::Normal)));
}

#[test]
fn missing_contexts_degrade_without_panicking() {
    let beams = BeamRenderer::mount(&FakeCanvas::with(Context::Missing), seeded_beams(1));
    assert!(matches!(
        beams,
        MountOutcome::Degraded(RenderError::ContextUnavailable(ContextKind::Canvas2d))
    ));

    let gl = FakeGl::new(Context::Missing);
    let aurora = ShaderRenderer::mount(&gl, ShaderPreset::Aurora.config());
    assert!(matches!(
        aurora,
        MountOutcome::Degraded(RenderError::ContextUnavailable(ContextKind::WebGl2))
    ));
    let waves = WaveRenderer::mount(&gl, WaveConfig::default());
    assert!(matches!(
        waves,
        MountOutcome::Degraded(RenderError::ContextUnavailable(ContextKind::WebGl2))
    ));
    assert_eq!(gl.log.draws.get(), 0);
}

#[test]
fn shader_failures_degrade_with_the_driver_log() {
    let gl = FakeGl::new(Context::CompileFails);
    match ShaderRenderer::mount(&gl, ShaderPreset::Nebula.config()) {
        MountOutcome::Degraded(RenderError::ShaderCompile { log, .. }) => {
            assert!(log.contains("snoise"));
        }
        other => panic!("expected compile failure, got {other:?}"),
    }
    assert!(!WaveRenderer::mount(&gl, WaveConfig::default()).is_running());
}

#[test]
fn invalid_config_degrades() {
    let mut config = seeded_beams(1);
    config.count = 0;
    let outcome = BeamRenderer::mount(&FakeCanvas::new(10, 10), config);
    assert!(matches!(outcome, MountOutcome::Degraded(RenderError::InvalidConfig(_))));
}

#[test]
fn oversized_wave_mesh_degrades_instead_of_panicking() {
    let gl = FakeGl::new(Context::Available);
    let mut config = WaveConfig::default();
    config.segments = [65_536, 65_536];
    let outcome = WaveRenderer::mount(&gl, config);
    assert!(matches!(outcome, MountOutcome::Degraded(RenderError::InvalidConfig(_))));
    assert!(gl.log.viewports.borrow().is_empty());
}

#[test]
fn wave_surface_moves_over_time() {
    let gl = FakeGl::new(Context::Available);
    let mut waves = WaveRenderer::mount(&gl, WaveConfig::default()).running().unwrap();
    waves.frame(0.0);
    let start = waves.scene().mesh().heights();
    waves.frame(1000.0);
    let later = waves.scene().mesh().heights();

    assert_eq!(start.len(), later.len());
    assert_ne!(start, later);
    assert_eq!(gl.log.uploads.get(), 2);
    assert_eq!(gl.log.draws.get(), 2);
}

#[test]
fn aurora_pointer_eases_toward_the_cursor() {
    let gl = FakeGl::new(Context::Available);
    let mut aurora = ShaderRenderer::mount(&gl, ShaderPreset::Aurora.config()).running().unwrap();
    // Layout is 800x600, so DOM (800, 0) is the top-right corner in GL space.
    aurora.pointer_moved(800.0, 0.0);
    let mut last = aurora.uniforms().pointer;
    for i in 0..60 {
        aurora.frame(f64::from(i) * 16.0);
        let now = aurora.uniforms().pointer;
        assert!(now[0] >= last[0] && now[1] >= last[1]);
        assert!(now[0] <= 800.0 && now[1] <= 600.0);
        last = now;
    }
    assert!(last[0] > 400.0 && last[1] > 300.0);
}

#[test]
fn aurora_resize_updates_viewport_resolution_and_pointer_flip() {
    let gl = FakeGl::new(Context::Available);
    let mut aurora = ShaderRenderer::mount(&gl, ShaderPreset::Aurora.config()).running().unwrap();
    aurora.resize(1000, 500);
    assert_eq!(gl.log.viewports.borrow().last(), Some(&(1000, 500)));

    aurora.frame(16.0);
    assert_eq!(aurora.uniforms().resolution, [1000.0, 500.0]);

    // DOM y = 100 in a 500 px tall box is GL y = 400.
    aurora.pointer_moved(400.0, 100.0);
    for i in 0..400 {
        aurora.frame(32.0 + f64::from(i) * 16.0);
    }
    let last = aurora.uniforms().pointer;
    assert!((last[0] - 400.0).abs() < 1e-3, "{last:?}");
    assert!((last[1] - 400.0).abs() < 1e-3, "{last:?}");
}

#[test]
fn unmount_leaves_no_frames_or_listeners() {
    let frames = Rc::new(Frames::default());
    let registered = Rc::new(Cell::new(0));
    let canvas = FakeCanvas::new(800, 450);
    let beams = BeamRenderer::mount(&canvas, seeded_beams(5)).running().unwrap();

    let mount = Mount::new(beams, Sched(frames.clone()));
    mount.listen(Listener::register(&registered));
    mount.listen(Listener::register(&registered));
    mount.start().unwrap();
    for ts in [100.0, 116.7, 133.3] {
        frames.fire();
        mount.tick(ts).unwrap();
    }
    assert_eq!(frames.live.borrow().len(), 1);
    assert_eq!(registered.get(), 2);

    mount.unmount();
    assert!(frames.live.borrow().is_empty());
    assert_eq!(registered.get(), 0);
    assert_eq!(mount.listener_count(), 0);
    assert!(!mount.frames().is_running());
    assert!(!mount.is_mounted());
}

#[test]
fn wave_resources_are_released_exactly_once() {
    let frames = Rc::new(Frames::default());
    let gl = FakeGl::new(Context::Available);
    let waves = WaveRenderer::mount(&gl, WaveConfig::default()).running().unwrap();

    let mount = Mount::new(waves, Sched(frames.clone()));
    mount.start().unwrap();
    frames.fire();
    mount.tick(16.0).unwrap();
    mount.unmount();
    mount.unmount();

    assert_eq!(gl.log.releases.get(), 1);
    assert!(frames.live.borrow().is_empty());
}
