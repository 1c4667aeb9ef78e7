use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgGroup, Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gcp_archive::KmzArchive;
use gcp_common::{BoundingBox, Config, Provider};
use gcp_discovery::file_config::{load_config, FileConfig};
use gcp_discovery::manifest::cells_from_manifest;
use gcp_discovery::sources::{MockSource, NgsSource, UsgsSource};
use gcp_discovery::{AreaSpec, DiscoveryOptions, FilterOptions, GcpFinder, PointSource};
use gcp_export::ExportFormat;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    #[default]
    All,
    Metashape,
    Arcgis,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::All => ExportFormat::All,
            FormatArg::Metashape => ExportFormat::MetaShape,
            FormatArg::Arcgis => ExportFormat::ArcGis,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "gcp-discovery",
    about = "Find, score and export ground control points for drone imagery"
)]
#[command(group(ArgGroup::new("area").required(true).args(["h3_cells", "bbox", "manifest"])))]
struct Cli {
    /// H3 cell ids covering the flight area
    #[arg(long, num_args = 1..)]
    h3_cells: Vec<String>,

    /// Explicit bounding box
    #[arg(
        long,
        num_args = 4,
        value_names = ["MIN_LAT", "MIN_LON", "MAX_LAT", "MAX_LON"],
        allow_negative_numbers = true
    )]
    bbox: Option<Vec<f64>>,

    /// Flight manifest JSON; cells are read from image names
    #[arg(long)]
    manifest: Option<PathBuf>,

    #[arg(long, default_value = "./gcps")]
    output_dir: PathBuf,

    #[arg(long, default_value = "gcps")]
    base_name: String,

    #[arg(long, value_enum, default_value_t = FormatArg::All)]
    format: FormatArg,

    /// Maximum accepted RMSE in meters [default: 1.0]
    #[arg(long)]
    min_accuracy: Option<f64>,

    /// Per-source result cap [default: 100]
    #[arg(long)]
    max_results: Option<usize>,

    /// Query the fallback below this many primary GCPs [default: 10]
    #[arg(long)]
    min_gcp_threshold: Option<usize>,

    #[arg(long)]
    min_spread_score: Option<f64>,

    #[arg(long)]
    min_confidence_score: Option<f64>,

    /// Drop points within this many meters of an earlier point
    #[arg(long)]
    dedup_radius_m: Option<f64>,

    /// Optional TOML file with [discovery], [filter] and [scoring] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also search USGS by the WRS-2 path/rows around the area
    #[arg(long)]
    wrs2: bool,

    /// Use synthetic points instead of USGS and NGS
    #[arg(long)]
    demo: bool,

    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, options: &mut DiscoveryOptions) {
        if self.min_accuracy.is_some() {
            options.filter.min_accuracy_m = self.min_accuracy;
        }
        if let Some(v) = self.max_results {
            options.max_results = v;
        }
        if let Some(v) = self.min_gcp_threshold {
            options.min_gcp_threshold = v;
        }
        if self.min_spread_score.is_some() {
            options.min_spread_score = self.min_spread_score;
        }
        if self.min_confidence_score.is_some() {
            options.min_confidence_score = self.min_confidence_score;
        }
        if self.dedup_radius_m.is_some() {
            options.dedup_radius_m = self.dedup_radius_m;
        }
    }

    fn area(&self) -> Result<AreaSpec> {
        if let Some(b) = &self.bbox {
            // Validated when the finder resolves the area.
            return Ok(AreaSpec::BoundingBox(BoundingBox {
                min_lat: b[0],
                min_lon: b[1],
                max_lat: b[2],
                max_lon: b[3],
            }));
        }
        if let Some(path) = &self.manifest {
            return Ok(AreaSpec::Cells(cells_from_manifest(path)?));
        }
        Ok(AreaSpec::Cells(self.h3_cells.clone()))
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("gcp=info".parse()?)
        .add_directive("usgs_client=info".parse()?)
        .add_directive("ngs_client=info".parse()?);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn build_finder(cli: &Cli, config: &Config, file_config: &FileConfig) -> GcpFinder {
    let scoring = file_config.scoring.clone();

    if cli.demo {
        let seed = file_config.mock_seed();
        warn!(seed, "DEMO MODE: using synthetic GCPs; do not use these for real surveys");
        return GcpFinder::builder()
            .primary(Arc::new(MockSource::new(Provider::Mock).with_seed(seed)))
            .fallback(Arc::new(
                MockSource::new(Provider::Mock).with_seed(seed.wrapping_add(1)),
            ))
            .scoring(scoring)
            .build();
    }

    let fallback: Arc<dyn PointSource> = match &config.ngs_archive_path {
        Some(path) => {
            info!(path = %path.display(), "Using NGS photo-control archive as fallback");
            Arc::new(KmzArchive::new(path))
        }
        None => Arc::new(NgsSource::from_config(config)),
    };

    let wrs2 = cli.wrs2 || file_config.usgs_wrs2();
    GcpFinder::builder()
        .primary(Arc::new(UsgsSource::from_config(config).with_wrs2(wrs2)))
        .fallback(fallback)
        .scoring(scoring)
        .build()
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_env();
    let file_config = match &cli.config {
        Some(path) => {
            info!(config = %path.display(), "Loading config");
            load_config(path)?
        }
        None => FileConfig::default(),
    };

    let mut options = DiscoveryOptions {
        filter: FilterOptions::strict(),
        ..Default::default()
    };
    file_config.apply(&mut options);
    cli.apply(&mut options);

    let area = cli.area()?;
    let finder = build_finder(&cli, &config, &file_config);

    info!("Searching for GCPs...");
    let outcome = finder.discover(&area, &options).await?;
    println!("{}", outcome.stats);
    println!("Distribution: {}", outcome.metrics);

    if outcome.accepted.is_empty() {
        warn!(metrics = %outcome.metrics, verdict = ?outcome.verdict, "No GCPs accepted");
        println!("No GCPs accepted. You may need to:");
        println!("  1. Check USGS / NGS configuration");
        println!("  2. Check your bounding box or H3 cells");
        println!("  3. Relax the filtering or quality thresholds");
        return Ok(ExitCode::from(1));
    }

    let files = gcp_export::export(
        &outcome.accepted,
        &cli.output_dir,
        &cli.base_name,
        cli.format.into(),
    )?;
    for file in &files {
        println!("Wrote {}", file.display());
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.json_logs) {
        eprintln!("Failed to initialise logging: {e:#}");
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("GCP discovery failed: {e:#}");
            ExitCode::from(2)
        }
    }
}
