use anyhow::Context;
use clap::{Parser, Subcommand};
use cubefield_common::SceneConfig;
use cubefield_frame::AppContext;
use cubefield_input::Direction;
use cubefield_render::{DebugTextRenderer, DrawList, MinimapPoint, PixelCanvas};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Nominal frame time handed to the loop; only `scaled` stepping reads it.
const FRAME: Duration = Duration::from_nanos(16_666_667);

#[derive(Parser)]
#[command(name = "cubefield-cli", about = "Headless tool for the cubefield scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fixed placement seed, overriding the config file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective configuration
    Info,
    /// Run frames headless and report the resulting state
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Keys held for the whole run, e.g. forward,left
        #[arg(long, value_delimiter = ',')]
        hold: Vec<Direction>,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the minimap as ASCII art after running some frames
    Minimap {
        /// Number of frames to run first
        #[arg(short, long, default_value = "0")]
        frames: u64,
        /// Keys held for the whole run
        #[arg(long, value_delimiter = ',')]
        hold: Vec<Direction>,
    },
}

#[derive(Serialize)]
struct Report {
    frames: u64,
    tick: u64,
    seed: Option<u64>,
    held: Vec<Direction>,
    camera: [f32; 3],
    yaw: f32,
    pitch: f32,
    cube0_rotation: Option<[f32; 3]>,
    minimap: Vec<MinimapPoint>,
}

fn load_config(cli: &Cli) -> anyhow::Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.world.seed = Some(seed);
    }
    Ok(config)
}

/// Run `frames` ticks with `hold` pressed throughout. Returns the last
/// frame's text summary, if any frame ran.
fn run(
    config: &SceneConfig,
    frames: u64,
    hold: &[Direction],
    verbose: bool,
) -> (AppContext, Option<String>) {
    let mut ctx = AppContext::new(config);
    for dir in hold {
        ctx.input.set_key(*dir, true);
    }

    let (w, h) = ctx.minimap.size();
    let mut list = DrawList::new(w, h);
    let mut renderer = if verbose {
        DebugTextRenderer::verbose()
    } else {
        DebugTextRenderer::new()
    };

    let mut last = None;
    for _ in 0..frames {
        last = Some(ctx.tick(FRAME, &mut renderer, &mut list));
    }
    tracing::debug!(frames, moving = ctx.input.any_held(), "simulation finished");
    (ctx, last)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Info => {
            println!("cubefield-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", config.to_yaml()?);
        }
        Commands::Simulate { frames, hold, json } => {
            let (ctx, last) = run(&config, frames, &hold, cli.verbose);
            let minimap = ctx.minimap.points(&ctx.world, &ctx.camera);

            if json {
                let report = Report {
                    frames: ctx.frames(),
                    tick: ctx.world.tick(),
                    seed: ctx.world.seed(),
                    held: ctx.input.held().collect(),
                    camera: ctx.camera.position.to_array(),
                    yaw: ctx.camera.yaw,
                    pitch: ctx.camera.pitch,
                    cube0_rotation: ctx
                        .world
                        .cubes()
                        .first()
                        .map(|c| c.transform.rotation.to_array()),
                    minimap,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if let Some(summary) = last {
                    print!("{summary}");
                }
                let held: Vec<&str> = ctx.input.held().map(|d| d.as_str()).collect();
                println!("Held: [{}]", held.join(", "));
                if let Some(cube) = ctx.world.cubes().first() {
                    let r = cube.transform.rotation;
                    println!("Cube {} rotation: ({:.2}, {:.2}, {:.2})", cube.id, r.x, r.y, r.z);
                }
                println!("Minimap:");
                for (cube, p) in ctx.world.cubes().iter().zip(&minimap) {
                    println!("  {} -> ({:.1}, {:.1})", cube.id, p.x, p.y);
                }
            }
        }
        Commands::Minimap { frames, hold } => {
            let (ctx, _) = run(&config, frames, &hold, false);
            let (w, h) = ctx.minimap.size();
            let mut canvas = PixelCanvas::new(w, h);
            ctx.minimap.draw(&ctx.world, &ctx.camera, &mut canvas);

            let mm = ctx.minimap.config();
            let legend = [(mm.cube_color, '#'), (mm.camera_color, '@')];
            print!("{}", canvas.to_ascii(&legend));
            println!(
                "camera=({:.2}, {:.2}, {:.2}) frames={}",
                ctx.camera.position.x,
                ctx.camera.position.y,
                ctx.camera.position.z,
                ctx.frames()
            );
        }
    }

    Ok(())
}
