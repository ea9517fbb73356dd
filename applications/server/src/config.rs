/// Server configuration
use crate::error::{Result, ServerError};
use curator_spotify::{CacheTtls, SpotifyConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_auth")]
    pub auth: AuthSettings,

    #[serde(default = "default_spotify")]
    pub spotify: SpotifySettings,

    #[serde(default = "default_cache")]
    pub cache: CacheSettings,

    #[serde(default = "default_exporter")]
    pub exporter: ExporterSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Built web UI, served for every non-API path
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Signs session tokens
    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_session_hours")]
    pub session_hours: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_accounts_base_url")]
    pub accounts_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_playlists_ttl_secs")]
    pub playlists_ttl_secs: u64,

    #[serde(default = "default_playlist_name_ttl_secs")]
    pub playlist_name_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Upper bound on records per user per pass
    #[serde(default = "default_max_actions")]
    pub max_actions: u32,

    #[serde(default)]
    pub tester_playlist_id: Option<String>,

    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

impl SpotifySettings {
    pub fn client_config(&self) -> SpotifyConfig {
        SpotifyConfig::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.redirect_uri.clone(),
        )
        .with_base_urls(&self.api_base_url, &self.accounts_base_url)
    }
}

impl CacheSettings {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            playlists: Duration::from_secs(self.playlists_ttl_secs),
            playlist_name: Duration::from_secs(self.playlist_name_ttl_secs),
        }
    }
}

impl ExporterSettings {
    /// Time between passes, between ten minutes and a year
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
            .clamp(Duration::from_secs(10 * 60), Duration::from_secs(365 * 24 * 60 * 60))
    }

    /// Records per user per pass; zero falls back to the default
    pub fn batch_limit(&self) -> u32 {
        match self.max_actions {
            0 => default_max_actions(),
            n => n,
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `config.toml` in the working directory; a missing
    /// file is not an error. Environment variables prefixed `CURATOR_`
    /// override it, with `__` between section and key
    /// (`CURATOR_SPOTIFY__CLIENT_ID`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CURATOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.session_secret.is_empty() {
            return Err(ServerError::Config(
                "Session secret is required (set CURATOR_AUTH__SESSION_SECRET)".to_string(),
            ));
        }

        if self.spotify.client_config().client_credentials().is_none() {
            return Err(ServerError::Config(
                "Spotify credentials are required (set CURATOR_SPOTIFY__CLIENT_ID and CURATOR_SPOTIFY__CLIENT_SECRET)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
        web_dir: default_web_dir(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("./web")
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/curator.db".to_string()
}

fn default_auth() -> AuthSettings {
    AuthSettings {
        session_secret: String::new(),
        session_hours: default_session_hours(),
    }
}

fn default_session_hours() -> u64 {
    7 * 24
}

fn default_spotify() -> SpotifySettings {
    SpotifySettings {
        client_id: None,
        client_secret: None,
        redirect_uri: default_redirect_uri(),
        api_base_url: default_api_base_url(),
        accounts_base_url: default_accounts_base_url(),
    }
}

fn default_redirect_uri() -> String {
    "http://localhost:5000/api/auth/callback".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_accounts_base_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_cache() -> CacheSettings {
    CacheSettings {
        playlists_ttl_secs: default_playlists_ttl_secs(),
        playlist_name_ttl_secs: default_playlist_name_ttl_secs(),
    }
}

fn default_playlists_ttl_secs() -> u64 {
    5 * 60
}

fn default_playlist_name_ttl_secs() -> u64 {
    10 * 60
}

fn default_exporter() -> ExporterSettings {
    ExporterSettings {
        enabled: false,
        dir: default_export_dir(),
        interval_hours: default_interval_hours(),
        max_actions: default_max_actions(),
        tester_playlist_id: None,
        initial_delay_secs: default_initial_delay_secs(),
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("/exports")
}

fn default_interval_hours() -> u64 {
    3
}

fn default_max_actions() -> u32 {
    5000
}

fn default_initial_delay_secs() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            auth: default_auth(),
            spotify: default_spotify(),
            cache: default_cache(),
            exporter: default_exporter(),
        }
    }
}
