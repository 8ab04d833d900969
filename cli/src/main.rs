use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use schema_bundle_core::validate_bundle;
use schema_bundle_io::{BundleConfig, Bundler, CONFIG_FILE, FsDocumentLoader, OutputFormat};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ListFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "schema-bundle", version)]
#[command(about = "Bundle multi-file OpenAPI-style documents into one self-contained document")]
struct Cli {
    /// Configuration file (defaults to ./.schema-bundle.yml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log engine progress to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve references and inclusions into a single document.
    Bundle(BundleArgs),
    /// List the components a bundle would hoist, with their final names.
    Components(ComponentsArgs),
    /// Check that a document has no external or dangling references.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct RemoteArgs {
    /// Fail on http(s) references instead of fetching them.
    #[arg(long)]
    no_remote: bool,
    /// Request timeout for remote references, in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Debug, Args)]
struct BundleArgs {
    /// Root document (YAML or JSON).
    input: PathBuf,
    /// Output file (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Output format (inferred from the output extension by default).
    #[arg(long)]
    format: Option<CliOutputFormat>,
    #[command(flatten)]
    remote: RemoteArgs,
}

#[derive(Debug, Args)]
struct ComponentsArgs {
    /// Root document (YAML or JSON).
    input: PathBuf,
    #[arg(long, default_value = "table")]
    format: ListFormat,
    #[command(flatten)]
    remote: RemoteArgs,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Document to check, typically a bundle output.
    input: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Bundle(args) => run_bundle(cli.config.as_deref(), args),
        Command::Components(args) => run_components(cli.config.as_deref(), args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, remote: &RemoteArgs) -> Result<BundleConfig, String> {
    let mut config = match path {
        Some(path) => BundleConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => BundleConfig::load_or_default(CONFIG_FILE)
            .map_err(|err| format!("Failed to load config '{CONFIG_FILE}': {err}"))?,
    };
    if remote.no_remote {
        config.remote.enabled = false;
    }
    if let Some(timeout) = remote.timeout {
        config.remote.timeout_secs = timeout;
    }
    debug!(?config, "Loaded configuration");
    Ok(config)
}

fn run_bundle(config: Option<&Path>, args: BundleArgs) -> Result<(), String> {
    let config = load_config(config, &args.remote)?;
    let bundler = Bundler::new(config).map_err(|e| e.to_string())?;

    let bundled = bundler.bundle_file(&args.input).map_err(|e| e.to_string())?;
    bundler
        .write(&bundled, args.output.as_deref(), args.format.map(Into::into))
        .map_err(|err| format!("Failed to write bundle: {err}"))?;

    if let Some(output) = &args.output {
        eprintln!(
            "Bundled '{}' into '{}'.",
            args.input.display(),
            output.display()
        );
    }
    Ok(())
}

fn run_components(config: Option<&Path>, args: ComponentsArgs) -> Result<(), String> {
    let config = load_config(config, &args.remote)?;
    let bundler = Bundler::new(config).map_err(|e| e.to_string())?;
    let components = bundler.components(&args.input).map_err(|e| e.to_string())?;

    match args.format {
        ListFormat::Json => {
            let listing: Vec<serde_json::Value> = components
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "kind": c.kind.section(),
                        "name": c.name,
                        "ref": c.local_ref,
                        "source": c.key,
                    })
                })
                .collect();
            let raw = serde_json::to_string_pretty(&listing)
                .map_err(|err| format!("Failed to serialize components: {err}"))?;
            println!("{raw}");
        }
        ListFormat::Table => {
            let width = components
                .iter()
                .map(|c| c.local_ref.len())
                .max()
                .unwrap_or(0);
            for component in &components {
                println!("{:<width$}  {}", component.local_ref, component.key);
            }
            eprintln!("{} component(s).", components.len());
        }
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let document = FsDocumentLoader::new()
        .read(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;

    let errors = validate_bundle(&document);
    if errors.is_empty() {
        println!("'{}' is self-contained.", args.input.display());
        return Ok(());
    }
    for error in &errors {
        println!("{error}");
    }
    Err(format!("{} problem(s) found", errors.len()))
}
