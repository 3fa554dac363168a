use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use picsrv::{
    Config, create_app,
    gallery::{Gallery, group_albums, normalize_request_path},
    startup_checks::{self, StartupCheckError},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Overrides `app.log_level` from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Print the album groups of a gallery directory
    Albums {
        /// Directory relative to the gallery root
        #[arg(default_value = "")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, loaded) = load_config(&cli.config)?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.app.log_level.clone());
    init_logging(&level)?;

    if loaded {
        info!("Configuration loaded from: {:?}", cli.config);
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
    }

    match cli.command {
        Some(Commands::Albums { path }) => print_albums(&config, &path),
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        None => run_server(config, None, None, None).await,
    }
}

/// `RUST_LOG` wins over the configured level so single modules can be
/// turned up without touching the config file.
fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;
    Ok(())
}

/// Returns the config and whether it came from a file.
fn load_config(config_path: &Path) -> Result<(Config, bool), Box<dyn std::error::Error>> {
    if !config_path.exists() {
        return Ok((Config::default(), false));
    }

    let config_content = std::fs::read_to_string(config_path)?;
    let config = toml_edit::de::from_str::<Config>(&config_content)?;
    Ok((config, true))
}

fn print_albums(config: &Config, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let gallery = Gallery::new(
        config.gallery.clone(),
        config
            .static_files
            .directory
            .join(&config.static_files.placeholder),
    );
    let listing = gallery.list_directory(&normalize_request_path(path)?)?;

    for group in group_albums(&listing.folders, config.gallery.name_separator) {
        println!("{}", group.caption());
        for record in &group.records {
            println!("  {}  ({})", record.label(), record.raw_name);
        }
    }

    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!(
        "Starting {} with gallery {:?} and static files {:?}",
        config.app.name, config.gallery.source_directory, config.static_files.directory
    );

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        if errors.iter().any(StartupCheckError::is_critical) {
            error!("Critical startup check failed, exiting");
            return Err("Critical startup check failed".into());
        }
        warn!(
            "Continuing despite {} non-critical startup check failures",
            errors.len()
        );
    }

    let app = create_app(config).await?;

    let addr = SocketAddr::from((host.parse::<IpAddr>()?, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(quit_after))
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    tokio::select! {
        _ = ctrl_c() => info!("Shutdown signal received (Ctrl+C)"),
        _ = terminate() => info!("Shutdown signal received (SIGTERM)"),
        _ = quit_timer(quit_after) => info!("Quit timer expired, shutting down"),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

async fn quit_timer(quit_after: Option<u64>) {
    match quit_after {
        Some(seconds) => {
            info!("Server will shut down after {} seconds", seconds);
            tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
        }
        None => std::future::pending::<()>().await,
    }
}
