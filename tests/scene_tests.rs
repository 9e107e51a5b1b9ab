//! Integration tests for the scene contract and built-in scenes.

mod common;

use chroma_morph::gpu::{Command, GpuError, GraphicsBackend, RecordingBackend};
use chroma_morph::scenes::params::{COLOR_SHIFT, INTENSITY, SPEED};
use chroma_morph::{create_scene, default_roster, Scene, SceneError, SceneKind, SceneState};
use common::{feature, BrokenScene};

// ==================== Parameters ====================

#[test]
fn test_set_param_stores_clamped_value() {
    let values = [
        f32::NEG_INFINITY,
        -10.0,
        -0.001,
        0.0,
        0.3,
        0.5,
        0.999,
        1.0,
        1.5,
        42.0,
        f32::INFINITY,
    ];
    for kind in SceneKind::all() {
        let mut scene = create_scene(*kind);
        for &v in &values {
            scene.set_param("sample", v);
            assert_eq!(scene.get_param("sample", 0.5), v.clamp(0.0, 1.0));
        }
    }
}

#[test]
fn test_unknown_params_use_fallback() {
    let scene = create_scene(SceneKind::Curve);
    assert_eq!(scene.get_param("nope", 0.25), 0.25);
    assert_eq!(scene.param("nope"), 0.5);
}

#[test]
fn test_builtin_defaults() {
    let expected = [
        (SceneKind::Wave, 0.7),
        (SceneKind::Particle, 0.8),
        (SceneKind::Fractal, 0.9),
        (SceneKind::Curve, 0.8),
    ];
    for (kind, intensity) in expected {
        let scene = create_scene(kind);
        assert_eq!(scene.param(INTENSITY), intensity, "{}", kind.name());
        assert_eq!(scene.param(SPEED), 1.0);
        assert_eq!(scene.param(COLOR_SHIFT), 0.0);
    }
}

#[test]
fn test_lerp_stays_between_endpoints() {
    for t in [0.0, 0.1, 0.25, 0.5, 0.75, 1.0] {
        let mut a = create_scene(SceneKind::Wave);
        let mut b = create_scene(SceneKind::Fractal);
        a.set_param("only_a", 0.1);
        b.set_param("only_b", 0.9);
        b.set_param(SPEED, 0.2);

        let keys = ["only_a", "only_b", INTENSITY, SPEED, COLOR_SHIFT];
        let before: Vec<(f32, f32)> = keys.iter().map(|k| (a.param(k), b.param(k))).collect();

        a.lerp_params(b.as_ref(), t);

        for (key, (va, vb)) in keys.iter().zip(before) {
            let got = a.param(key);
            let (lo, hi) = if va <= vb { (va, vb) } else { (vb, va) };
            assert!(
                got >= lo - 1e-6 && got <= hi + 1e-6,
                "{} = {} outside [{}, {}] at t={}",
                key,
                got,
                lo,
                hi,
                t
            );
            if t == 0.0 {
                assert_eq!(got, va);
            }
            if t == 1.0 {
                assert_eq!(got, vb);
            }
        }
    }
}

#[test]
fn test_lerp_endpoints_are_exact_across_grid() {
    for i in 0..=100 {
        for j in 0..=100 {
            let (va, vb) = (i as f32 / 100.0, j as f32 / 100.0);
            let mut a = create_scene(SceneKind::Wave);
            let mut b = create_scene(SceneKind::Wave);
            a.set_param(INTENSITY, va);
            b.set_param(INTENSITY, vb);

            a.lerp_params(b.as_ref(), 0.0);
            assert_eq!(a.param(INTENSITY), va);

            a.lerp_params(b.as_ref(), 1.0);
            assert_eq!(a.param(INTENSITY), vb, "a={} b={}", va, vb);
        }
    }
}

#[test]
fn test_lerp_missing_keys_use_scene_fallback() {
    let mut a = create_scene(SceneKind::Wave);
    let mut b = create_scene(SceneKind::Wave);
    b.set_param("glow", 1.0);

    a.lerp_params(b.as_ref(), 0.5);

    // Missing on `a` resolves to 0.5, not 0
    assert_eq!(a.param("glow"), 0.75);
}

#[test]
fn test_lerp_clamps_t() {
    let mut a = create_scene(SceneKind::Wave);
    let b = create_scene(SceneKind::Fractal);
    a.lerp_params(b.as_ref(), 3.0);
    assert!((a.param(INTENSITY) - 0.9).abs() < 1e-6);
}

// ==================== Audio mapping ====================

#[test]
fn test_audio_maps_to_parameters() {
    for mut scene in default_roster() {
        scene.update(0.016, Some(&feature(0.6, 1.0, 0.3)));
        assert_eq!(scene.param(INTENSITY), 0.6);
        assert_eq!(scene.param(SPEED), 1.0);
        assert_eq!(scene.param(COLOR_SHIFT), 0.3);
    }
}

#[test]
fn test_update_without_audio_keeps_parameters() {
    let mut scene = create_scene(SceneKind::Particle);
    scene.set_param(INTENSITY, 0.33);
    scene.update(0.5, None);
    assert_eq!(scene.param(INTENSITY), 0.33);
    assert_eq!(scene.time(), 0.5);
}

// ==================== Lifecycle ====================

#[test]
fn test_builtin_scenes_render_and_dispose_cleanly() {
    let mut backend = RecordingBackend::new(640, 480);
    for mut scene in default_roster() {
        scene.update(0.5, Some(&feature(0.5, 0.5, 0.5)));
        scene.render(&mut backend).unwrap();
        assert_eq!(scene.state(), SceneState::Initialized);

        scene.dispose(&mut backend);
        scene.dispose(&mut backend);
        assert_eq!(scene.state(), SceneState::Disposed);
    }
    assert_eq!(backend.program_count(), 0);
    assert_eq!(backend.buffer_count(), 0);
    assert_eq!(backend.blend_mode(), chroma_morph::BlendMode::Standard);
}

#[test]
fn test_every_scene_issues_draws() {
    for kind in SceneKind::all() {
        let mut backend = RecordingBackend::default();
        let mut scene = create_scene(*kind);
        scene.render(&mut backend).unwrap();

        let draws = backend.draws();
        assert!(!draws.is_empty(), "{} drew nothing", kind.name());
        assert!(draws.iter().all(|d| d.vertices > 0 && d.instances > 0));
    }
}

#[test]
fn test_glow_scenes_restore_standard_blend() {
    for kind in [SceneKind::Particle, SceneKind::Curve] {
        let mut backend = RecordingBackend::default();
        let mut scene = create_scene(kind);
        scene.render(&mut backend).unwrap();

        let draws = backend.draws();
        assert!(draws
            .iter()
            .any(|d| d.blend == chroma_morph::BlendMode::Additive));
        assert_eq!(backend.blend_mode(), chroma_morph::BlendMode::Standard);
    }
}

#[test]
fn test_disposed_scene_refuses_to_render() {
    let mut backend = RecordingBackend::default();
    let mut scene = create_scene(SceneKind::Wave);
    scene.dispose(&mut backend);

    let err = scene.render(&mut backend).unwrap_err();
    assert!(matches!(err, SceneError::Disposed { scene: "wave" }));
    assert!(backend.draws().is_empty());
}

#[test]
fn test_shader_failure_is_fatal_and_not_retried() {
    let mut backend = RecordingBackend::default();
    let mut scene = BrokenScene::new();

    let err = scene.render(&mut backend).unwrap_err();
    match &err {
        SceneError::Init {
            source: GpuError::Shader(shader),
            ..
        } => {
            assert_eq!(shader.program, "broken");
            assert!(!shader.log.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(scene.releases, 1);
    assert_eq!(scene.state(), SceneState::Disposed);

    assert!(matches!(
        scene.render(&mut backend),
        Err(SceneError::Disposed { .. })
    ));
    assert_eq!(scene.releases, 1);
    assert!(!backend
        .commands()
        .iter()
        .any(|c| matches!(c, Command::CreateProgram { .. })));
}

#[test]
fn test_resolution_uniform_tracks_backend_size() {
    let mut backend = RecordingBackend::new(320, 200);
    let mut scene = create_scene(SceneKind::Fractal);
    scene.render(&mut backend).unwrap();

    assert!(backend.resize(1024, 768));
    scene.render(&mut backend).unwrap();

    let program = backend.program_by_name("fractal").unwrap();
    let bytes = backend.uniform_bytes(program).unwrap();
    assert!(!bytes.is_empty());
    let writes: Vec<_> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SetUniform { name, value, .. } if name == "resolution" => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(
        writes.last(),
        Some(&chroma_morph::UniformValue::Vec2([1024.0, 768.0]))
    );
}
