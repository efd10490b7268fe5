//! dihedral CLI - edge convexity classification
//!
//! Classifies the edges of a solid as convex or concave and prints one
//! colored markup line per edge.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dihedral_kernel_convexity::{
    Approximation, Containment, ConvexityClassifier, ConvexityConfig, EdgeLabel,
};
use dihedral_kernel_math::Point3;
use dihedral_kernel_primitives::BRepSolid;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod input;
mod markup;

use input::{load_polyhedron, Fixture};
use markup::MarkupSet;

#[derive(Parser, Debug)]
#[command(name = "dihedral", version)]
#[command(about = "Mark convex and concave edges of a B-rep solid", long_about = None)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every edge shared by two faces
    Classify(ClassifyArgs),
    /// Ray-parity point-in-solid test from an anchor through a target
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
struct SolidArgs {
    /// Built-in solid to analyze
    #[arg(long, value_enum, default_value = "cube", conflicts_with = "input")]
    fixture: Fixture,

    /// JSON polyhedron file: {"vertices": [[x,y,z], ...], "faces": [[i, ...], ...]}
    #[arg(short, long)]
    input: Option<PathBuf>,
}

impl SolidArgs {
    fn load(&self) -> Result<BRepSolid> {
        match &self.input {
            Some(path) => load_polyhedron(path),
            None => self.fixture.build(),
        }
    }
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// TOML file with classifier settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probe offset distance from the edge midpoint
    #[arg(long)]
    offset: Option<f64>,

    /// Face approximation strategy
    #[arg(long, value_enum)]
    approximation: Option<ApproximationArg>,

    /// Classify edges on the rayon thread pool
    #[arg(long)]
    parallel: bool,
}

impl ConfigArgs {
    /// File settings (or defaults) with command-line overrides applied.
    fn resolve(&self) -> Result<ConvexityConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ConvexityConfig::default(),
        };
        if let Some(offset) = self.offset {
            config.offset_distance = offset;
        }
        if let Some(approximation) = self.approximation {
            config.approximation = approximation.into();
        }
        if self.parallel {
            config.parallel = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ApproximationArg {
    SortedFan,
    BoundaryFan,
}

impl From<ApproximationArg> for Approximation {
    fn from(arg: ApproximationArg) -> Self {
        match arg {
            ApproximationArg::SortedFan => Approximation::SortedFan,
            ApproximationArg::BoundaryFan => Approximation::BoundaryFan,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[command(flatten)]
    solid: SolidArgs,

    #[command(flatten)]
    config: ConfigArgs,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    #[command(flatten)]
    solid: SolidArgs,

    #[command(flatten)]
    config: ConfigArgs,

    /// Ray origin as x,y,z
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    anchor: Point3,

    /// Point to classify, as x,y,z
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    target: Point3,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Summary {
    edges: usize,
    convex: usize,
    concave: usize,
}

#[derive(Serialize)]
struct ClassifyReport<'a> {
    lines: &'a [markup::MarkupLine],
    summary: &'a Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Classify(args) => {
            let mut markup = MarkupSet::new();
            let summary = classify(&args, &mut markup)?;
            print_classification(&markup, &summary, args.format)?;
        }
        Commands::Probe(args) => {
            let containment = probe(&args)?;
            println!(
                "{}",
                match containment {
                    Containment::Inside => "inside",
                    Containment::Outside => "outside",
                }
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<ConvexityConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Classify the requested solid, replacing whatever `markup` held before.
fn classify(args: &ClassifyArgs, markup: &mut MarkupSet) -> Result<Summary> {
    let config = args.config.resolve()?;
    debug!(?config, "resolved configuration");
    let solid = args.solid.load()?;

    let edges = ConvexityClassifier::new(config)
        .classify_edges(&solid)
        .context("edge classification failed")?;

    if !markup.is_empty() {
        debug!(cleared = markup.clear(), "cleared previous markup");
    }
    markup.draw_all(&edges);

    let concave = edges
        .iter()
        .filter(|e| e.label == EdgeLabel::Concave)
        .count();
    let summary = Summary {
        edges: edges.len(),
        convex: edges.len() - concave,
        concave,
    };
    info!(lines = markup.len(), concave, "classified");
    Ok(summary)
}

fn probe(args: &ProbeArgs) -> Result<Containment> {
    let config = args.config.resolve()?;
    let solid = args.solid.load()?;
    let query = ConvexityClassifier::new(config)
        .classify_point(&solid, &args.anchor, &args.target)
        .context("point query failed")?;
    debug!(
        raw_hits = query.raw_hits,
        corrected = query.corrected_count,
        "probe"
    );
    Ok(query.containment)
}

fn print_classification(markup: &MarkupSet, summary: &Summary, format: Format) -> Result<()> {
    match format {
        Format::Text => {
            for line in markup.lines() {
                println!("{line}");
            }
            println!(
                "{} edges: {} convex, {} concave",
                summary.edges, summary.convex, summary.concave
            );
        }
        Format::Json => {
            let report = ClassifyReport {
                lines: markup.lines(),
                summary,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn parse_point(s: &str) -> Result<Point3, String> {
    let coords: Vec<f64> = s
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in '{s}': {e}"))?;
    match coords.as_slice() {
        &[x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(format!("expected x,y,z but got '{s}'")),
    }
}
