//! SHARJAYS Studio CLI - viewer, headless capture and catalog tools

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{capture, catalog, classify, describe, view};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Model viewer core for SHARJAYS Studio", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive viewer
    View {
        /// Subject model path or URL (.glb / .gltf)
        model: Option<String>,

        /// Path to a studio.toml config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Backdrop id to start on
        #[arg(long)]
        backdrop: Option<String>,
    },

    /// Render the dressed subject to a PNG without opening a window
    Capture {
        /// Subject model path or URL (.glb / .gltf)
        model: String,

        /// Output image path
        #[arg(short, long, default_value = "capture.png")]
        output: PathBuf,

        /// Backdrop id
        #[arg(long)]
        backdrop: Option<String>,

        /// Outfit id
        #[arg(long)]
        outfit: Option<String>,

        /// Tint name (case-insensitive)
        #[arg(long)]
        tint: Option<String>,

        /// Image width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "720")]
        height: u32,

        /// Print the frame as a PNG data URI instead of writing a file
        #[arg(long)]
        data_uri: bool,

        /// Path to a studio.toml config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List backdrops, outfits or tints
    Catalog {
        #[arg(value_enum, default_value = "backdrops")]
        section: catalog::Section,

        /// Backdrop filter (all, color, environment, motion) or outfit
        /// category (suits, hoodies, t-shirts, accessories)
        #[arg(long)]
        filter: Option<String>,

        /// Case-insensitive outfit name search
        #[arg(long)]
        search: Option<String>,
    },

    /// Print the style descriptor for an outfit and tint
    Describe {
        /// Outfit id
        #[arg(long)]
        outfit: String,

        /// Tint name; defaults to the catalog default
        #[arg(long)]
        tint: Option<String>,
    },

    /// Show how an imported file would be used as a backdrop
    Classify {
        /// File name or path
        file: String,

        /// MIME type reported for the file
        #[arg(long)]
        mime: Option<String>,
    },
}

fn main() -> Result<()> {
    studio_viewer::logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::View {
            model,
            config,
            backdrop,
        } => view::run(model, config.as_deref(), backdrop),
        Commands::Capture {
            model,
            output,
            backdrop,
            outfit,
            tint,
            width,
            height,
            data_uri,
            config,
        } => capture::run(capture::CaptureArgs {
            model,
            output,
            backdrop,
            outfit,
            tint,
            width,
            height,
            data_uri,
            config,
        }),
        Commands::Catalog {
            section,
            filter,
            search,
        } => catalog::run(section, filter.as_deref(), search.as_deref()),
        Commands::Describe { outfit, tint } => describe::run(&outfit, tint.as_deref()),
        Commands::Classify { file, mime } => classify::run(&file, mime.as_deref()),
    }
}
