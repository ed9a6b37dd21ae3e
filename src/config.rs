use clap::{Args, Parser, ValueEnum};
use std::fmt;

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Secret key used to sign session cookies
    #[arg(long, env = "secret_key")]
    pub secret_key: String,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub spotify: SpotifyConfig,

    #[command(flatten)]
    pub session: SessionConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

// Hand-written so that credentials never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"<redacted>")
            .field("server", &self.server)
            .field("spotify", &self.spotify)
            .field("session", &self.session)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port for the management server (health checks)
    #[arg(long, env = "MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks during shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Upper bound on the total time spent handling one request
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Args)]
pub struct SpotifyConfig {
    /// OAuth client identifier issued by Spotify
    #[arg(long, env = "spotify_client_id")]
    pub client_id: String,

    /// OAuth client secret issued by Spotify
    #[arg(long, env = "spotify_client_secret")]
    pub client_secret: String,

    /// Redirect URI registered with Spotify for the callback route
    #[arg(long, env = "SPOTIFY_REDIRECT_URI", default_value = "https://api.tropii.xyz/callback")]
    pub redirect_uri: String,

    /// Authorization (consent screen) endpoint
    #[arg(long, env = "SPOTIFY_AUTH_URL", default_value = "https://accounts.spotify.com/authorize")]
    pub auth_url: String,

    /// Token endpoint used for both code and refresh exchanges
    #[arg(long, env = "SPOTIFY_TOKEN_URL", default_value = "https://accounts.spotify.com/api/token")]
    pub token_url: String,

    /// Base URL of the Web API
    #[arg(long, env = "SPOTIFY_API_BASE_URL", default_value = "https://api.spotify.com/v1/")]
    pub api_base_url: String,

    /// Space-separated scopes requested on login
    #[arg(long, env = "SPOTIFY_SCOPE", default_value = "user-read-private user-read-email")]
    pub scope: String,

    /// Force the consent dialog even if the user already approved the app
    #[arg(long, env = "SPOTIFY_SHOW_DIALOG", default_value_t = false)]
    pub show_dialog: bool,

    /// Timeout for every outbound call to Spotify
    #[arg(long, env = "SPOTIFY_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Substring a playlist name must contain to be returned by /playlists
    #[arg(long, env = "PLAYLIST_NAME_FILTER", default_value = "Qualm")]
    pub playlist_name_filter: String,
}

impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("scope", &self.scope)
            .field("show_dialog", &self.show_dialog)
            .field("timeout_secs", &self.timeout_secs)
            .field("playlist_name_filter", &self.playlist_name_filter)
            .finish()
    }
}

#[derive(Clone, Debug, Args)]
pub struct SessionConfig {
    /// Name of the cookie carrying the signed session id
    #[arg(long = "session-cookie-name", env = "SESSION_COOKIE_NAME", default_value = "session")]
    pub cookie_name: String,

    /// Lifetime of a session (cookie and server-side record) in seconds
    #[arg(long = "session-ttl-secs", env = "SESSION_TTL_SECS", default_value_t = 2_678_400)]
    pub ttl_secs: u64,

    /// Only send the session cookie over HTTPS
    #[arg(long = "session-cookie-secure", env = "SESSION_COOKIE_SECURE", default_value_t = false)]
    pub cookie_secure: bool,

    /// How often idle sessions are evicted (0 disables eviction)
    #[arg(long = "session-cleanup-interval-secs", env = "SESSION_CLEANUP_INTERVAL_SECS", default_value_t = 300)]
    pub cleanup_interval_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; tracing and metrics export is off when unset
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads `.env` (if any) into the environment, then parses flags and environment variables.
    #[must_use]
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }
}
