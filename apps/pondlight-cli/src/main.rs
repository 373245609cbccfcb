use anyhow::Context;
use clap::{Parser, Subcommand};
use pondlight_assets::{DRACO_EXTENSION, SceneGraph};
use pondlight_render::{DebugTextRenderer, RenderView, Renderer};
use pondlight_scene::{
    DebugParams, FIREFLY_COUNT, FireflySet, FrameLoop, MAX_PIXEL_RATIO, MissingNodePolicy,
    NAMED_MATERIALS, Stage, SteppedClock,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pondlight-cli", about = "Headless tool for the pondlight scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, expected model nodes and default parameters
    Info,
    /// Load a model, bind materials and print the resulting stage
    Inspect {
        /// glTF or GLB file
        model: PathBuf,
        /// Report missing nodes instead of failing
        #[arg(long)]
        allow_missing_nodes: bool,
    },
    /// Print generated firefly positions and scales
    Fireflies {
        /// RNG seed; random when omitted
        #[arg(short, long)]
        seed: Option<u64>,
        /// Number of fireflies
        #[arg(short, long, default_value_t = FIREFLY_COUNT)]
        count: usize,
    },
    /// Run the frame loop on a stepped clock and print the final frame
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f64,
        /// JSON file with debug parameters
        #[arg(long)]
        params: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("pondlight-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("expected nodes:");
            for (name, material) in NAMED_MATERIALS {
                println!("  {name:<18} {material:?}");
            }
            let params = DebugParams::default();
            println!("defaults:");
            println!("  pondColorStart   {}", params.pond_color_start);
            println!("  pondColorEnd     {}", params.pond_color_end);
            println!("  backgroundColor  {}", params.background_color);
            println!("  firefliesSize    {}", params.fireflies_size);
            println!("fireflies: {FIREFLY_COUNT}, max pixel ratio {MAX_PIXEL_RATIO}");
            println!("unsupported: {DRACO_EXTENSION}");
        }
        Commands::Inspect {
            model,
            allow_missing_nodes,
        } => {
            let policy = if allow_missing_nodes {
                MissingNodePolicy::Skip
            } else {
                MissingNodePolicy::Fail
            };
            let started = Instant::now();
            let graph = SceneGraph::load(&model)
                .with_context(|| format!("loading {}", model.display()))?;
            let mut stage = Stage::new(
                DebugParams::default(),
                FireflySet::from_seed(FIREFLY_COUNT, 0),
                1.0,
                policy,
            );
            stage.attach_scene(graph, started.elapsed())?;
            print!(
                "{}",
                DebugTextRenderer::new().render(&stage, &RenderView::default())
            );
        }
        Commands::Fireflies { seed, count } => {
            let set = match seed {
                Some(seed) => FireflySet::from_seed(count, seed),
                None => FireflySet::random(count),
            };
            for (i, firefly) in set.particles().iter().enumerate() {
                let p = firefly.position;
                println!(
                    "{i:>3}  pos=({:.3}, {:.3}, {:.3})  scale={:.3}",
                    p.x, p.y, p.z, firefly.scale
                );
            }
        }
        Commands::Simulate { frames, dt, params } => {
            let params = match &params {
                Some(path) => DebugParams::from_json_file(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => DebugParams::default(),
            };
            let step = Duration::try_from_secs_f64(dt).context("--dt must be a non-negative number of seconds")?;
            let mut stage = Stage::new(
                params,
                FireflySet::from_seed(FIREFLY_COUNT, 0),
                1.0,
                MissingNodePolicy::Fail,
            );

            let mut frame_loop = FrameLoop::with_clock(SteppedClock::new(step));
            let cancel = frame_loop.cancel_token();
            if frames == 0 {
                cancel.cancel();
            }
            let ran = frame_loop.run(|tick| {
                stage.advance(tick);
                tracing::debug!(frame = tick.index, elapsed = tick.elapsed, "tick");
                if tick.index + 1 >= frames {
                    cancel.cancel();
                }
            });

            println!("ran {ran} frames");
            print!(
                "{}",
                DebugTextRenderer::new().render(&stage, &RenderView::default())
            );
        }
    }

    Ok(())
}
