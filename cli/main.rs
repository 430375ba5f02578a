#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process;

use oncorisk::artifacts::{ArtifactPaths, ArtifactStore};
use oncorisk::batch::score_tsv;
use oncorisk::serve::{self, ServerConfig};
use oncorisk::service::PredictionService;

#[derive(Parser)]
#[command(
    name = "oncorisk",
    version,
    about = "Breast-cancer risk screening from routine patient attributes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /predict over HTTP
    Serve(ServeArgs),
    /// Score a TSV of patients and write predictions.tsv
    Infer(InferArgs),
}

/// Artifact locations. Each flag overrides the config file.
#[derive(Args)]
struct ArtifactArgs {
    /// TOML config file with bind, allowed_origins and [artifacts]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the fitted classifier (.toml or .json)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to the fitted scaler (.toml or .json)
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Path to the encoded column list (.toml or .json)
    #[arg(long)]
    columns: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    /// Address to listen on, e.g. 127.0.0.1:8000
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// Allowed cross-origin origin; repeat to allow several. Replaces the configured list.
    #[arg(long = "allow-origin", value_name = "ORIGIN")]
    allow_origins: Vec<String>,
}

#[derive(Args)]
struct InferArgs {
    /// TSV with BRCA, weight, height, AGE_GROUP, PROVINCE_GROUP, GENDER_N columns
    input: PathBuf,

    #[command(flatten)]
    artifacts: ArtifactArgs,

    /// Where to write the predictions
    #[arg(long, default_value = "predictions.tsv")]
    output: PathBuf,
}

impl ArtifactArgs {
    fn resolve(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                ServerConfig::load(path)?
            }
            None => ServerConfig::default(),
        };
        apply_overrides(&mut config.artifacts, self);
        Ok(config)
    }
}

fn apply_overrides(paths: &mut ArtifactPaths, args: &ArtifactArgs) {
    if let Some(model) = &args.model {
        paths.model = model.clone();
    }
    if let Some(scaler) = &args.scaler {
        paths.scaler = scaler.clone();
    }
    if let Some(columns) = &args.columns {
        paths.columns = columns.clone();
    }
}

fn load_service(paths: &ArtifactPaths) -> Result<PredictionService, Box<dyn std::error::Error>> {
    info!("Loading classifier from: {}", paths.model.display());
    info!("Loading scaler from: {}", paths.scaler.display());
    info!("Loading column list from: {}", paths.columns.display());

    let store = ArtifactStore::load(paths)?;
    info!(
        "Artifacts ready: {} classifier, {} scaler, {} features",
        store.classifier().kind(),
        store.scaler().kind(),
        store.layout().len()
    );
    Ok(PredictionService::new(store))
}

fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.artifacts.resolve()?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if !args.allow_origins.is_empty() {
        config.allowed_origins = args.allow_origins;
    }

    let service = load_service(&config.artifacts)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve::run(&config, service))?;
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.artifacts.resolve()?;
    let service = load_service(&config.artifacts)?;

    info!("Scoring patients from: {}", args.input.display());
    let scored = score_tsv(&service, &args.input, &args.output)?;
    println!(
        "Scored {scored} patients. Predictions saved to: {}",
        args.output.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(args) => run_serve(args),
        Commands::Infer(args) => run_infer(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
