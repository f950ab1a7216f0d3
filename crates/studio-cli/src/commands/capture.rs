//! Headless capture of a dressed subject to PNG

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use studio_catalog::Catalog;
use studio_render::HeadlessContext;
use studio_viewer::{
    encode_png_data_uri, load_asset, write_png, AssetKind, LoadedAsset, LoggingHooks, SceneHost,
    SceneState, SceneUpdate, ViewerConfig,
};

/// Simulated frame step while settling the scene
const FRAME_DT: f32 = 1.0 / 60.0;
/// Frames run after the backdrop is up so the tint morph finishes
const SETTLE_FRAMES: u32 = 180;
/// Longest wait for a backdrop download or decode
const BACKDROP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct CaptureArgs {
    pub model: String,
    pub output: PathBuf,
    pub backdrop: Option<String>,
    pub outfit: Option<String>,
    pub tint: Option<String>,
    pub width: u32,
    pub height: u32,
    pub data_uri: bool,
    pub config: Option<PathBuf>,
}

pub fn run(args: CaptureArgs) -> Result<()> {
    let config = ViewerConfig::load(args.config.as_deref()).context("Failed to load viewer config")?;
    let catalog = Catalog::builtin()?;

    // Resolve every name before touching the GPU
    let backdrop = args
        .backdrop
        .as_deref()
        .map(|id| catalog.require_backdrop(id).cloned())
        .transpose()?;
    let outfit = args
        .outfit
        .as_deref()
        .map(|id| catalog.require_outfit(id).cloned())
        .transpose()?;
    let tint = args
        .tint
        .as_deref()
        .map(|name| catalog.require_tint(name).cloned())
        .transpose()?;

    let model = match load_asset(AssetKind::Subject, &args.model, |_| {})
        .with_context(|| format!("Failed to load subject '{}'", args.model))?
    {
        LoadedAsset::Model(model) => model,
        LoadedAsset::Panorama(_) => anyhow::bail!("'{}' is not a model", args.model),
    };

    let ctx = HeadlessContext::new_blocking(args.width, args.height)
        .context("Failed to create headless render context")?;

    let initial = SceneState::initial(&catalog, config.scene.reflection, config.scene.grid);
    let mut host = SceneHost::new(
        &ctx.device,
        &ctx.queue,
        ctx.format,
        ctx.width,
        ctx.height,
        initial,
        &config,
        Box::new(LoggingHooks::new(None)),
    );
    host.set_subject(&ctx.device, &ctx.queue, model);

    if let Some(outfit) = outfit {
        host.user_edit(&ctx.device, &ctx.queue, SceneUpdate::outfit(Some(outfit)));
    }
    if let Some(tint) = tint {
        host.user_edit(&ctx.device, &ctx.queue, SceneUpdate::tint(tint));
    }
    if let Some(backdrop) = backdrop {
        host.user_edit(&ctx.device, &ctx.queue, SceneUpdate::backdrop(backdrop));
    }

    let deadline = Instant::now() + BACKDROP_TIMEOUT;
    while host.compositor().is_loading() {
        if Instant::now() >= deadline {
            log::warn!("Backdrop still loading after {:?}; capturing without it", BACKDROP_TIMEOUT);
            break;
        }
        host.frame(&ctx.device, &ctx.queue, FRAME_DT);
        std::thread::sleep(Duration::from_millis(10));
    }
    if let Some(error) = host.compositor().last_error() {
        log::warn!("Backdrop unavailable: {}", error);
    }
    for _ in 0..SETTLE_FRAMES {
        host.frame(&ctx.device, &ctx.queue, FRAME_DT);
    }

    let (width, height, rgba) = host.capture_rgba(&ctx.device, &ctx.queue)?;
    if args.data_uri {
        println!("{}", encode_png_data_uri(width, height, &rgba)?);
    } else {
        write_png(&args.output, width, height, &rgba)?;
        println!("Captured {}x{} to {}", width, height, args.output.display());
    }

    host.teardown(&ctx.device, &ctx.queue);
    Ok(())
}
