/// Moonwalk Inspect - build a scene from a config file and report on it
///
/// Usage: moonwalk-inspect <scene.json> [--walk N]
///
/// With `--walk N`, the player walks forward N frames, turning a little each
/// frame, and every pickup is logged. Set RUST_LOG=debug for import
/// details.

use std::env;

use anyhow::{bail, Context, Result};
use log::info;
use moonwalk_core::{BoundingBox, Scene, SceneConfig, Transform};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let (config_path, steps) = match args.as_slice() {
        [_, path] => (path, 0),
        [_, path, flag, n] if flag == "--walk" => {
            let steps: usize = n.parse().with_context(|| format!("invalid step count `{}`", n))?;
            (path, steps)
        }
        _ => bail!("Usage: moonwalk-inspect <scene.json> [--walk N]"),
    };

    let config = SceneConfig::load(config_path)
        .with_context(|| format!("Failed to read scene config {}", config_path))?;
    let mut scene = Scene::load(config).context("Failed to build scene")?;

    report(&scene);

    for frame in 0..steps {
        scene.look(1.0, 0.0);
        if let Some(gem) = scene.step(1.0, 0.0) {
            info!(
                "frame {}: picked up collectible at {}",
                frame,
                format_bounds(gem.bounds())
            );
        }
    }

    if steps > 0 {
        let position = scene.player().position();
        println!(
            "After {} steps: player at ({:.2}, {:.2}, {:.2}), {} collected, {} left",
            steps,
            position.x,
            position.y,
            position.z,
            scene.collected(),
            scene.collectibles().len()
        );
    }

    Ok(())
}

fn report(scene: &Scene) {
    let terrain = scene.terrain();
    let mesh = scene.terrain_mesh();
    println!(
        "Terrain: {}x{} samples, {} vertices, {} triangles",
        terrain.width(),
        terrain.depth(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    if let Some(bounds) = mesh.bounding_box() {
        println!("Terrain bounds: {}", format_bounds(&bounds));
    }

    println!("Props: {}", scene.props().len());
    println!("Collectibles: {}", scene.collectibles().len());
    for (i, gem) in scene.collectibles().iter().enumerate() {
        println!("  #{} {}", i, format_bounds(gem.bounds()));
    }

    let position = scene.player().position();
    println!(
        "Player: ({:.2}, {:.2}, {:.2}) looking {:?}",
        position.x,
        position.y,
        position.z,
        scene.player().forward().as_slice()
    );
    println!(
        "eyeFromWorld: {:?}",
        Transform::to_buffer(&scene.eye_from_world())
    );
    println!(
        "clipFromEye: {:?}",
        Transform::to_buffer(&scene.clip_from_eye())
    );
}

fn format_bounds(bounds: &BoundingBox) -> String {
    let [x0, y0, z0, x1, y1, z1] = bounds.to_array();
    format!(
        "[{:.2}, {:.2}, {:.2}] - [{:.2}, {:.2}, {:.2}]",
        x0, y0, z0, x1, y1, z1
    )
}
