//! fakeforge CLI - resolve Go interfaces and functions into fake models
//!
//! Models are printed to stdout as JSON for a templating step to consume;
//! logs go to stderr.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fakeforge::{BatchFile, BatchReport};
use fakeforge_core::{FakeforgeConfig, GenerationRequest, ResolveMode};
use fakeforge_resolver::{run_batch, FakeModelAssembler};
use fakeforge_symbols::go::{GoSourceProvider, PackageLocator};
use fakeforge_symbols::NamespaceCache;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fakeforge")]
#[command(about = "Resolve Go interfaces and functions into fake models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Root of the Go module to resolve packages in
    #[arg(long, value_name = "DIR", global = true)]
    module_root: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one target and print its model
    Resolve {
        /// Import path, or a path relative to the module root such as ./storage
        package: String,

        /// Interface or function type to fake; optional with --package-mode
        name: Option<String>,

        /// Fake every exported function of the package
        #[arg(long)]
        package_mode: bool,

        /// Package name of the generated fake
        #[arg(long)]
        destination: Option<String>,

        /// Name of the generated fake type
        #[arg(long)]
        fake_name: Option<String>,

        /// Preferred import alias, repeatable
        #[arg(long = "alias", value_name = "PATH=ALIAS", value_parser = parse_alias)]
        aliases: Vec<(String, String)>,
    },
    /// Resolve every target listed in a TOML batch file
    Batch {
        /// Batch file with [[target]] entries
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = load_config(cli.config.as_deref(), cli.module_root)?;
    let provider = GoSourceProvider::from_config(&config.provider)
        .context("Failed to set up the Go source provider")?;
    let locator = provider.locator().clone();
    let cache = Arc::new(NamespaceCache::new(Arc::new(provider)));

    match cli.command {
        Commands::Resolve {
            package,
            name,
            package_mode,
            destination,
            fake_name,
            aliases,
        } => {
            let mode = if package_mode {
                ResolveMode::Package
            } else {
                ResolveMode::Auto
            };
            if mode == ResolveMode::Auto && name.is_none() {
                return Err(anyhow!("a target name is required unless --package-mode is set"));
            }

            let mut request = GenerationRequest {
                namespace_path: locator.canonical_path(&package)?,
                target_name: name,
                mode,
                destination_package: destination,
                fake_name,
                alias_overrides: Default::default(),
            };
            for (path, alias) in aliases {
                request = request.with_alias(locator.canonical_path(&path)?, alias);
            }

            resolve_one(cache, config, request).await
        }
        Commands::Batch { file } => run_batch_file(cache, config, &locator, &file).await,
    }
}

/// Initialize logging on stderr so stdout only carries JSON
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fakeforge={level},fakeforge_core={level},fakeforge_symbols={level},fakeforge_resolver={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn load_config(path: Option<&Path>, module_root: Option<PathBuf>) -> Result<FakeforgeConfig> {
    let mut config = FakeforgeConfig::load(path).context("Failed to load configuration")?;
    if let Some(root) = module_root {
        config.provider.module_root = root;
    }
    config.validate()?;
    debug!(
        "Using module root {} (goroot {:?})",
        config.provider.module_root.display(),
        config.provider.goroot
    );
    Ok(config)
}

async fn resolve_one(
    cache: Arc<NamespaceCache>,
    config: FakeforgeConfig,
    request: GenerationRequest,
) -> Result<()> {
    let label = request.label();
    let model = tokio::task::spawn_blocking(move || {
        FakeModelAssembler::new(&cache, &config).assemble(&request)
    })
    .await
    .context("Resolution task panicked")?
    .with_context(|| format!("Failed to resolve {label}"))?;

    print_json(&model)
}

async fn run_batch_file(
    cache: Arc<NamespaceCache>,
    config: FakeforgeConfig,
    locator: &PackageLocator,
    file: &Path,
) -> Result<()> {
    let requests = BatchFile::from_path(file)?.into_requests(locator)?;
    info!("Resolving {} targets from {}", requests.len(), file.display());

    let outcomes = run_batch(cache, Arc::new(config), requests).await;
    let report = BatchReport::from_outcomes(outcomes);
    print_json(&report)?;

    if report.has_failures() {
        return Err(anyhow!(
            "{} of {} targets failed",
            report.failed,
            report.targets.len()
        ));
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn parse_alias(raw: &str) -> std::result::Result<(String, String), String> {
    let (path, alias) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=ALIAS, got {raw}"))?;
    let (path, alias) = (path.trim(), alias.trim());
    if path.is_empty() || alias.is_empty() {
        return Err(format!("expected PATH=ALIAS, got {raw}"));
    }
    Ok((path.to_string(), alias.to_string()))
}
