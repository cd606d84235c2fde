use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub stale_secs: u64,
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub word_cloud_limit: usize,
    pub stream_channel_capacity: usize,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn settings_builder() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.max_connections", 20)?
        .set_default("database.acquire_timeout_secs", 10)?
        .set_default("cache.ttl_secs", 30)?
        .set_default("cache.stale_secs", 120)?
        .set_default("cache.max_entries", 1024)?
        .set_default("dashboard.word_cloud_limit", 50)?
        .set_default("dashboard.stream_channel_capacity", 100)?)
}

/// Defaults, then `config/app.toml` if present, then `CRM__SECTION__KEY` variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = settings_builder()?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("CRM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut app_config: AppConfig = settings.try_deserialize()?;
    if app_config.database.url.is_none() {
        app_config.database.url = std::env::var("DATABASE_URL").ok();
    }

    Ok(app_config)
}
