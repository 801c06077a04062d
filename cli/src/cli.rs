use std::path::PathBuf;

/// County climate panel CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "nldas-county", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML configuration file; flags below override its fields
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Aggregate every year of the configured range into county CSVs
    Run(RunArgs),

    /// Build (or rebuild) the county/grid weight cache only
    BuildWeights(BuildWeightsArgs),
}

/// Per-field overrides of the configuration file.
#[derive(clap::Args, Debug, Default)]
pub struct ConfigArgs {
    /// Directory of monthly gridded files
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub input_dir: Option<PathBuf>,

    /// County boundary shapefile
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub boundary: Option<PathBuf>,

    /// Output directory for CSVs (and the default cache location)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// County identifier attribute, e.g. GEOID
    #[arg(long)]
    pub id_field: Option<String>,

    #[arg(long)]
    pub start_year: Option<i32>,

    #[arg(long)]
    pub end_year: Option<i32>,

    /// Keep only the first N counties
    #[arg(long)]
    pub limit: Option<usize>,

    /// Weight cache directory
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub cache_dir: Option<PathBuf>,

    /// Output file prefix, e.g. NLDAS
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Recompute weights even if a matching cache exists
    #[arg(long)]
    pub rebuild_weights: bool,
}

#[derive(clap::Args, Debug)]
pub struct BuildWeightsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Overwrite an existing cache
    #[arg(long)]
    pub rebuild: bool,
}
