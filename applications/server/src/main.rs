/// Curator Server - music curation backend
use clap::{Parser, Subcommand};
use curator_core::Repositories;
use curator_server::{api, config::ServerConfig, jobs::ActionExporter, state::AppState};
use curator_spotify::{CatalogCache, SpotifyClient};
use curator_storage::Database;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "curator-server")]
#[command(about = "Curator music curation server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CURATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// List all users
    ListUsers,
    /// Run one export pass and exit
    Export,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "curator_server=info,curator_spotify=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::ListUsers => list_users(config).await?,
        Commands::Export => export(config).await?,
    }

    Ok(())
}

async fn open_repositories(config: &ServerConfig) -> anyhow::Result<Repositories> {
    let db = Database::new(&config.storage.database_url).await?;
    tracing::info!("Database connected");
    Ok(Repositories::from_store(Arc::new(db)))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Curator Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let repos = open_repositories(&config).await?;

    let spotify = SpotifyClient::new(
        config.spotify.client_config(),
        repos.users.clone(),
        CatalogCache::new(config.cache.ttls()),
    )?;

    let _exporter = config
        .exporter
        .enabled
        .then(|| ActionExporter::new(repos.clone(), config.exporter.clone()).spawn());

    let app_state = AppState::new(&config, repos, spotify);
    let app = api::router(app_state, config.server.web_dir.clone());

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_users(config: ServerConfig) -> anyhow::Result<()> {
    let repos = open_repositories(&config).await?;
    let users = repos.users.get_all_users().await?;

    println!("Users:");
    for user in users {
        println!(
            "  {} - {} ({})",
            user.id,
            user.spotify_id,
            user.display_name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

async fn export(config: ServerConfig) -> anyhow::Result<()> {
    let repos = open_repositories(&config).await?;
    let exported = ActionExporter::new(repos, config.exporter).run_once().await?;
    println!("Exported actions for {exported} user(s)");
    Ok(())
}
