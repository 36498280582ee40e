mod manifest;

use anyhow::{Context, Result};
use bootstrap::{
    ArchiveExtractor, ConsoleProgressReporter, DownloadConfig, Downloader, EnvStoreConfig,
    EnvironmentStore, ExtractorKind, IntoProgressCallback, Scope, UrlSource,
};
use clap::{Args, Parser, Subcommand};
use manifest::{Installer, Manifest, Outcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug};

#[derive(Parser, Debug)]
#[command(name = "dev-bootstrap")]
#[command(about = "Fetch, unpack and register the SDKs a development environment needs")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// File that persists system variables on hosts without a registry
    #[arg(long, env = "BOOTSTRAP_ENV_FILE", global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download a file, falling back through mirrors in order
    Fetch {
        /// Where the file is written
        destination: PathBuf,

        /// One URL, or several mirrors tried in order
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Unpack an archive into the directory that contains it
    Extract(ExtractArgs),

    /// Read and write environment variables
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Install every dependency listed in a manifest
    Install {
        /// JSON manifest of dependencies
        manifest: PathBuf,

        /// Override the host's archive format
        #[arg(long)]
        format: Option<ExtractorKind>,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    archive: PathBuf,

    /// Keep the archive after extraction
    #[arg(long)]
    keep: bool,

    /// Override the host's archive format
    #[arg(long)]
    format: Option<ExtractorKind>,
}

#[derive(Subcommand, Debug)]
enum EnvCommands {
    /// Print a variable's value
    Get { scope: Scope, name: String },

    /// Persist a variable
    Set {
        scope: Scope,
        name: String,
        value: String,
    },

    /// Append a directory to PATH if missing
    AddPath { directory: PathBuf },
}

fn extractor_for(format: Option<ExtractorKind>) -> Result<Box<dyn ArchiveExtractor>> {
    match format {
        Some(kind) => Ok(kind.build()),
        None => bootstrap::extract::for_host().context("No archive format available on this host"),
    }
}

fn env_store(env_file: Option<PathBuf>) -> Box<dyn EnvironmentStore> {
    let mut config = EnvStoreConfig::default();
    if let Some(path) = env_file {
        config.persisted_file = path;
    }
    bootstrap::env::for_host(&config)
}

async fn run(cli: Cli) -> Result<u8> {
    let progress = ConsoleProgressReporter::new().into_callback();

    match cli.command {
        Commands::Fetch { destination, urls } => {
            let source = match <[String; 1]>::try_from(urls) {
                Ok([url]) => UrlSource::Single(url),
                Err(urls) => UrlSource::Mirrors(urls),
            };
            let downloader = Downloader::new(DownloadConfig::default())?;
            let result = downloader
                .fetch(&source, &destination, Some(progress))
                .await
                .with_context(|| format!("Failed to fetch {}", destination.display()))?;
            println!("Fetched {} ({} bytes) from {}", destination.display(), result.size, result.url);
        }

        Commands::Extract(args) => {
            let extractor = extractor_for(args.format)?;
            debug!("Using {} extractor", extractor.name());
            let summary = extractor
                .extract(&args.archive, !args.keep, Some(progress))
                .with_context(|| format!("Failed to extract {}", args.archive.display()))?;
            println!("Extracted into {}", summary.destination.display());
        }

        Commands::Env { command } => {
            let store = env_store(cli.env_file);
            match command {
                EnvCommands::Get { scope, name } => match store.get(scope, &name)? {
                    Some(value) => println!("{}", value),
                    None => {
                        eprintln!("{} is not set in {} scope", name, scope);
                        return Ok(1);
                    }
                },
                EnvCommands::Set { scope, name, value } => {
                    store
                        .set(scope, &name, &value)
                        .with_context(|| format!("Failed to set {}", name))?;
                }
                EnvCommands::AddPath { directory } => {
                    let directory = std::path::absolute(&directory)
                        .with_context(|| format!("Failed to resolve {}", directory.display()))?;
                    if store.add_to_path(&directory.to_string_lossy())? {
                        println!("Added {} to PATH", directory.display());
                    } else {
                        println!("{} is already on PATH", directory.display());
                    }
                }
            }
        }

        Commands::Install { manifest, format } => {
            let manifest = Manifest::load(&manifest)?;
            let downloader = Downloader::new(DownloadConfig::default())?;
            let extractor = extractor_for(format)?;
            let store = env_store(cli.env_file);
            let installer = Installer::new(&downloader, extractor.as_ref(), store.as_ref(), Some(progress));

            for (name, outcome) in installer.install_all(&manifest).await? {
                match outcome {
                    Outcome::AlreadyInstalled { value } => println!("{}: already installed at {}", name, value),
                    Outcome::Installed { value, .. } => println!("{}: installed at {}", name, value),
                }
            }
        }
    }

    Ok(0)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Ignore error if .env not present
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
