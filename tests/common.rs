#![allow(dead_code)]
use qualm_relay::api::session::SessionCookie;
use qualm_relay::api::{MgmtState, app_router, mgmt_router};
use qualm_relay::config::{
    Config, LogFormat, ServerConfig, SessionConfig, SpotifyConfig, TelemetryConfig,
};
use qualm_relay::domain::session::Session;
use qualm_relay::storage::{InMemorySessionStore, SessionStore};
use qualm_relay::AppBuilder;
use std::sync::{Arc, Once};
use tokio::net::TcpListener;
use uuid::Uuid;
use wiremock::MockServer;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("qualm_relay=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config(provider_url: &str) -> Config {
    Config {
        secret_key: "test_secret".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
            request_timeout_secs: 30,
        },
        spotify: SpotifyConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost/callback".to_string(),
            auth_url: format!("{provider_url}/authorize"),
            token_url: format!("{provider_url}/api/token"),
            api_base_url: format!("{provider_url}/v1/"),
            scope: "user-read-private user-read-email".to_string(),
            show_dialog: false,
            timeout_secs: 2,
            playlist_name_filter: "Qualm".to_string(),
        },
        session: SessionConfig {
            cookie_name: "session".to_string(),
            ttl_secs: 3600,
            cookie_secure: false,
            cleanup_interval_secs: 0,
        },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub provider: MockServer,
    pub config: Config,
    pub session_store: Arc<InMemorySessionStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let provider = MockServer::start().await;
        let config = get_test_config(&provider.uri());
        Self::spawn_with(provider, config).await
    }

    pub async fn spawn_with(provider: MockServer, config: Config) -> Self {
        setup_tracing();

        let session_store = Arc::new(InMemorySessionStore::new());
        let app = AppBuilder::new(config.clone())
            .with_session_store(Arc::clone(&session_store) as Arc<dyn SessionStore>)
            .build()
            .expect("Failed to build app");

        let mgmt_state = MgmtState { session_store: Arc::clone(&app.services.session_store) };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let router = app_router(config.clone(), app.services);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());
        let mgmt = mgmt_router(mgmt_state);
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self { server_url, mgmt_url, provider, config, session_store, client }
    }

    /// Stores `session` under a new id and returns the matching `Cookie` header value.
    pub async fn seed_session(&self, session: Session) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.session_store.set(id, session).await.unwrap();
        (id, self.cookie_for(id))
    }

    pub fn cookie_for(&self, id: Uuid) -> String {
        let jar = SessionCookie::new(&self.config.session, &self.config.secret_key);
        format!("{}={}", self.config.session.cookie_name, jar.sign(id).unwrap())
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{}", self.server_url, path));
        if let Some(cookie) = cookie {
            req = req.header(reqwest::header::COOKIE, cookie);
        }
        req.send().await.unwrap()
    }

    pub async fn session(&self, id: Uuid) -> Option<Session> {
        self.session_store.get(id).await.unwrap()
    }
}

/// `name=value` part of the response's session `Set-Cookie` header.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()[reqwest::header::LOCATION].to_str().unwrap().to_string()
}
