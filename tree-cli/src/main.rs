//! Command-line driver: grows a fractal tree over an OBJ surface mesh and
//! writes the result as text tables and a VTK polyline file.
//!
//! ```text
//! fractal-tree heart.obj --init-node 0.1,0.2,0.3 --second-node 0.1,0.3,0.3 -g 12
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod export;
mod obj;

use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tree_core::{Parameters, SpatialIndex, grow};

/// Grow a fractal tree constrained to a triangulated surface
#[derive(Parser, Debug)]
#[command(name = "fractal-tree", version, long_about = None)]
struct Cli {
    /// Surface mesh in Wavefront OBJ format
    mesh: PathBuf,

    /// Starting point, snapped onto the surface
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3,
          required_unless_present = "landmark", conflicts_with = "landmark")]
    init_node: Option<Vec3>,

    /// Start at the mesh vertex nearest to this point
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3)]
    landmark: Option<Vec3>,

    /// Direction of the first segment
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3, conflicts_with = "second_node")]
    direction: Option<Vec3>,

    /// Aim the first segment at this point instead
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3)]
    second_node: Option<Vec3>,

    /// JSON file with growth parameters; flags below override it
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Number of generations
    #[arg(short, long)]
    generations: Option<u32>,

    /// Length of the first segment
    #[arg(long)]
    initial_length: Option<f32>,

    /// Length of every later segment
    #[arg(long)]
    branch_length: Option<f32>,

    /// Probability that a tip splits in two
    #[arg(long)]
    branching_probability: Option<f32>,

    /// Minimum distance between unrelated segments
    #[arg(long)]
    avoidance: Option<f32>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Base name of the output files
    #[arg(short, long)]
    output: Option<String>,

    /// Directory the output files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl Cli {
    /// Parameters from `--params`, then the individual overrides.
    fn parameters(&self) -> Result<Parameters> {
        let mut params = match &self.params {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("opening {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Parameters::default(),
        };

        if let Some(v) = self.generations {
            params.generations = v;
        }
        if let Some(v) = self.initial_length {
            params.initial_length = v;
        }
        if let Some(v) = self.branch_length {
            params.branch_length = v;
        }
        if let Some(v) = self.branching_probability {
            params.branching_probability = v;
        }
        if let Some(v) = self.avoidance {
            params.avoidance_distance = v;
        }
        if let Some(v) = self.seed {
            params.random_seed = Some(v);
        }
        if let Some(v) = &self.output {
            params.output_name.clone_from(v);
        }
        if let Some(v) = self.direction {
            params.initial_direction = v;
        }
        Ok(params)
    }
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<f32>, String>>()?;
    match parts.as_slice() {
        &[x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected three comma-separated numbers, got {s:?}")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mesh = obj::load(&cli.mesh)?;
    info!(
        path = %cli.mesh.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "Loaded mesh"
    );

    let init_node = match (cli.init_node, cli.landmark) {
        (Some(p), _) => p,
        (None, Some(landmark)) => {
            let index = SpatialIndex::new(&mesh)?;
            let vertex = index.nearest_vertex(landmark);
            info!(vertex, "Starting at landmark vertex");
            mesh.vertices()[vertex]
        }
        (None, None) => anyhow::bail!("either --init-node or --landmark is required"),
    };

    let mut params = cli.parameters()?;
    if let Some(second) = cli.second_node {
        params = params.aim_at(init_node, second);
    }

    let grown = grow(&mesh, init_node, &params).context("growing tree")?;
    println!("{}", grown.report);

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;
    let written = export::write_all(&grown, &cli.out_dir.join(&grown.output_name))?;
    for path in &written {
        info!(path = %path.display(), "Wrote output");
    }
    Ok(())
}
