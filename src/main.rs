use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use podcastmg::{start_podcast_updater, Config, Database, PodcastManageService, WebServer};

/// Podcast subscription management server.
#[derive(Debug, Parser)]
#[command(name = "podcastmg", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Address to listen on (overrides `server.host`).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides `server.port`).
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file (overrides `database.path`).
    #[arg(long)]
    database: Option<String>,

    /// Token signing secret (overrides `auth.jwt_secret`).
    #[arg(long)]
    signing_secret: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database) = &self.database {
            config.database.path = database.clone();
        }
        if let Some(secret) = &self.signing_secret {
            config.auth.jwt_secret = secret.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load configuration; a missing file means defaults
    let mut config = match Config::load_with_env(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config.display());
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    // Initialize logging
    if let Err(e) = podcastmg::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        podcastmg::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> podcastmg::Result<()> {
    config.validate()?;

    info!("podcastmg starting");
    let db =
        Database::open_with_max_connections(&config.database.path, config.database.max_connections)
            .await?;
    let service = PodcastManageService::from_config(db.clone(), &config)?;

    if config.updater.enabled {
        start_podcast_updater(service.clone(), &config.updater);
    } else {
        info!("Podcast updater disabled");
    }

    let server = WebServer::new(&config.server, service)?;
    let result = server.run().await;
    db.close().await;
    result?;
    Ok(())
}
