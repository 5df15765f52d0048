use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use meshview_assets::{GeometryRecord, GridParams, cube, grid, load_mesh_file};
use meshview_input::{PointerEvent, action_for_key};
use meshview_render::{DebugDevice, RenderSession, ShowcaseAssets, ViewerConfig, assemble_showcase};
use meshview_render_wgpu::program_for;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshview-cli", about = "CLI tool for meshview operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Parse a Wavefront OBJ file and print its statistics as JSON
    Inspect {
        /// Mesh file
        mesh: PathBuf,
    },
    /// Build the floor grid and print its statistics as JSON
    Grid {
        /// Width of one cell
        #[arg(short, long, default_value_t = 0.4)]
        width: f32,
        /// Cells along X
        #[arg(short, long, default_value_t = 50)]
        columns: u32,
        /// Cells along Z
        #[arg(short, long, default_value_t = 50)]
        rows: u32,
    },
    /// Build the textured cube and print its statistics as JSON
    Cube,
    /// Render the showcase scene headless and print the draw log
    Run {
        /// Number of frames to render
        #[arg(short, long, default_value_t = 1)]
        frames: u32,
        /// Viewer configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Mesh added to the scene once loaded
        #[arg(long)]
        mesh: Option<PathBuf>,
        /// Cube textures, in cube order (repeatable)
        #[arg(long = "texture")]
        textures: Vec<PathBuf>,
        /// Keys pressed before the first frame, e.g. "2l"
        #[arg(long, default_value = "")]
        keys: String,
        /// Horizontal drag in pixels applied before each frame
        #[arg(long, default_value_t = 0.0)]
        drag: f32,
        /// Seconds to wait for background loads before rendering
        #[arg(long, default_value_t = 10)]
        wait: u64,
        /// Print the device command log of the last frame
        #[arg(long)]
        log: bool,
    },
}

/// Summary of one geometry record.
#[derive(Debug, Serialize)]
struct GeometryReport {
    name: String,
    vertices: usize,
    indices: usize,
    triangles: usize,
    has_texcoords: bool,
    has_colors: bool,
    bounds_min: [f32; 3],
    bounds_max: [f32; 3],
}

impl GeometryReport {
    fn new(record: &GeometryRecord) -> Self {
        let (min, max) = record.positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), p| {
                let p = Vec3::from_array(*p);
                (min.min(p), max.max(p))
            },
        );
        Self {
            name: record.name.clone(),
            vertices: record.vertex_count(),
            indices: record.index_count(),
            triangles: record.triangle_count(),
            has_texcoords: record.texcoords.is_some(),
            has_colors: record.colors.is_some(),
            bounds_min: min.to_array(),
            bounds_max: max.to_array(),
        }
    }
}

/// Per-frame counters printed by `run`.
#[derive(Debug, Serialize)]
struct FrameReport {
    frame: u32,
    nodes_drawn: usize,
    nodes_skipped: usize,
    indices: u64,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Info => {
            println!("meshview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", meshview_render::crate_info());
            println!("defaults: {:?}", ViewerConfig::default());
        }
        Commands::Inspect { mesh } => {
            let record = load_mesh_file(&mesh)
                .with_context(|| format!("loading mesh {}", mesh.display()))?;
            print_json(&GeometryReport::new(&record))?;
        }
        Commands::Grid {
            width,
            columns,
            rows,
        } => {
            let params = GridParams {
                square_width: width,
                columns,
                rows,
                ..GridParams::default()
            };
            print_json(&GeometryReport::new(&grid(&params)?))?;
        }
        Commands::Cube => {
            print_json(&GeometryReport::new(&cube(None)))?;
        }
        Commands::Run {
            frames,
            config,
            mesh,
            textures,
            keys,
            drag,
            wait,
            log,
        } => {
            let config = match &config {
                Some(path) => ViewerConfig::load(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => ViewerConfig::default(),
            };
            let mut session = RenderSession::new(DebugDevice::with_viewport(1280, 720), config);
            let assets = ShowcaseAssets { mesh, textures };
            assemble_showcase(&mut session, program_for, &assets)?;

            let report = session.wait_for_assets(Duration::from_secs(wait));
            for (path, error) in &report.failures {
                eprintln!("failed to load {}: {error}", path.display());
            }

            for key in keys.chars() {
                session.handle_action(action_for_key(key));
            }

            let mut cursor = 0.0;
            for frame in 0..frames {
                if drag != 0.0 {
                    session.handle_pointer(PointerEvent::Down { x: cursor, y: 0.0 });
                    cursor += drag;
                    session.handle_pointer(PointerEvent::Move { x: cursor, y: 0.0 });
                    session.handle_pointer(PointerEvent::Up);
                }
                let stats = session.render_frame()?;
                print_json(&FrameReport {
                    frame,
                    nodes_drawn: stats.nodes_drawn,
                    nodes_skipped: stats.nodes_skipped,
                    indices: stats.indices_submitted,
                })?;
            }

            if log {
                print!("{}", session.device().frame_log());
            }
        }
    }

    Ok(())
}
