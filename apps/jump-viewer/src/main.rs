//! Renders a JSON scene through the rendering manager and writes a PNG.

mod panel;
mod scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use image::RgbaImage;

use jump_core::Raster;
use jump_renderer::RenderingManager;

use crate::panel::AppPanel;
use crate::scene::Scene;

#[derive(Parser, Debug)]
#[command(name = "jump-viewer", about = "Render a JUMP scene to a PNG image")]
struct Args {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Give up if rendering has not finished after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.width == 0 || args.height == 0 {
        bail!("image size must be non-zero, got {}x{}", args.width, args.height);
    }

    let scene = Scene::load(&args.scene)?;
    let config = scene.rendering.clone();
    let background = scene.background;
    let (layers, selection) = scene.into_model()?;
    log::info!(
        "Loaded {} layers and {} selected features from {}",
        layers.len(),
        selection.len(),
        args.scene.display()
    );

    let panel = Arc::new(AppPanel::new(layers, selection, args.width, args.height));
    let manager = RenderingManager::new(panel.clone(), &config);
    let started = Instant::now();
    manager.render_all()?;

    let deadline = started + Duration::from_secs(args.timeout);
    while manager.is_rendering() {
        if Instant::now() >= deadline {
            bail!("rendering did not finish within {}s", args.timeout);
        }
        thread::sleep(Duration::from_millis(10));
    }
    log::info!(
        "Rendered in {:?} ({} repaints)",
        started.elapsed(),
        panel.repaint_count()
    );

    let mut raster = Raster::filled(args.width, args.height, background);
    manager.copy_to(&mut raster);
    manager.dispose();

    let image = RgbaImage::from_raw(args.width, args.height, raster.to_rgba_bytes())
        .ok_or_else(|| anyhow!("raster does not match {}x{}", args.width, args.height))?;
    image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    log::info!("Wrote {}", args.output.display());
    Ok(())
}
