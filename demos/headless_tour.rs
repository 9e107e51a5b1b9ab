//! Example: Tour every scene headlessly with a synthetic beat.
//!
//! Renders a few seconds of frames offscreen, advancing through the roster
//! with crossfades. Uses the GPU when one is available and falls back to the
//! recording backend otherwise.
//!
//! Run with:
//!     RUST_LOG=info cargo run --example headless_tour [config.json]

use anyhow::Context;
use chroma_morph::audio::SyntheticInput;
use chroma_morph::gpu::{GraphicsBackend, RecordingBackend, WgpuBackend};
use chroma_morph::{EngineConfig, Visualizer};

const FPS: f32 = 60.0;
const SECONDS_PER_SCENE: f32 = 3.0;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => EngineConfig::default(),
    };

    println!("Chroma Morph - Headless Tour");
    println!("============================\n");
    println!("  Resolution: {}x{}", config.width, config.height);
    println!("  Scenes: {}", config.scenes.join(", "));
    println!("  Morph: {:.1}s {}\n", config.morph_duration, config.easing.name());

    match pollster::block_on(WgpuBackend::new(config.width, config.height)) {
        Ok(backend) => {
            println!("  GPU: {}\n", backend.adapter_info().name);
            let mut vis = build(config, backend)?;
            tour(&mut vis)?;

            let pixels = vis.backend().read_pixels()?;
            let lit = pixels.chunks_exact(4).filter(|p| p[..3].iter().any(|&c| c > 16)).count();
            println!("  Lit pixels in final frame: {}", lit);
            vis.shutdown();
        }
        Err(e) => {
            println!("  No GPU ({}), recording commands instead\n", e);
            let backend =
                RecordingBackend::new(config.width, config.height).with_command_limit(4096);
            let mut vis = build(config, backend)?;
            tour(&mut vis)?;
            println!("  Draw calls recorded: {}", vis.backend().total_draws());
            vis.shutdown();
        }
    }

    Ok(())
}

fn build<B: GraphicsBackend>(config: EngineConfig, backend: B) -> anyhow::Result<Visualizer<B>> {
    let input = SyntheticInput::test_beat(120.0, 44100);
    Ok(Visualizer::with_input(config, backend, Box::new(input))?)
}

fn tour<B: GraphicsBackend>(vis: &mut Visualizer<B>) -> anyhow::Result<()> {
    if !vis.toggle_audio() {
        println!("  Audio unavailable, scenes run on default parameters");
    }

    let size = vis.backend().size();
    let dt = 1.0 / FPS;
    let frames_per_scene = (SECONDS_PER_SCENE * FPS) as usize;
    let total = frames_per_scene * vis.morph().scene_count();

    for frame in 0..total {
        if frame > 0 && frame % frames_per_scene == 0 {
            vis.advance_scene();
        }
        vis.frame(dt, size)?;

        if frame % (FPS as usize) == 0 {
            let morph = vis.morph();
            let scene = morph.current_scene().map_or("-", |s| s.name());
            let bass = vis.last_feature().map_or(0.0, |f| f.bass);
            println!(
                "  t={:>5.2}s scene={:<9} morphing={:<5} weight={:.2} bass={:.2}",
                frame as f32 * dt,
                scene,
                morph.is_morphing(),
                morph.blend_weight(),
                bass
            );
        }
    }

    println!();
    Ok(())
}
