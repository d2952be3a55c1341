use crate::error::AggregatorError;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Container control plane (Pterodactyl client API).
#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    /// Base URL including the API prefix, e.g. `https://panel.example/api/client`.
    #[serde(default = "default_panel_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: default_panel_base_url(),
            api_key: None,
            server_id: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Credentials needed before any control-plane call is attempted.
#[derive(Debug, Clone)]
pub struct PanelCredentials {
    pub api_key: String,
    pub server_id: String,
}

impl PanelConfig {
    pub fn credentials(&self) -> Result<PanelCredentials, AggregatorError> {
        let api_key = non_empty(&self.api_key)
            .ok_or(AggregatorError::Configuration("panel.api_key"))?;
        let server_id = non_empty(&self.server_id)
            .ok_or(AggregatorError::Configuration("panel.server_id"))?;
        Ok(PanelCredentials {
            api_key: api_key.to_string(),
            server_id: server_id.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Remote console (RCON) of the game process.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_console_host")]
    pub host: String,
    #[serde(default = "default_console_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    /// Command whose reply lists online players.
    #[serde(default = "default_console_command")]
    pub command: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: default_console_host(),
            port: default_console_port(),
            password: None,
            command: default_console_command(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ConsoleConfig {
    pub fn password(&self) -> Result<&str, AggregatorError> {
        non_empty(&self.password).ok_or(AggregatorError::Configuration("console.password"))
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_database_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub name: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_panel_base_url() -> String {
    "https://panel.holy.gg/api/client".into()
}

fn default_console_host() -> String {
    "localhost".into()
}

fn default_console_port() -> u16 {
    25575
}

fn default_console_command() -> String {
    "list".into()
}

fn default_database_port() -> u16 {
    3306
}

fn default_max_pool_size() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    5000
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config: AppConfig = toml::from_str(&s)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay secrets and endpoints from the environment. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PTERODACTYL_URL") {
            self.panel.base_url = v;
        }
        if let Some(v) = get("PTERODACTYL_API_KEY") {
            self.panel.api_key = Some(v);
        }
        if let Some(v) = get("PTERODACTYL_SERVER_ID") {
            self.panel.server_id = Some(v);
        }
        if let Some(v) = get("RCON_HOST") {
            self.console.host = v;
        }
        if let Some(port) = get("RCON_PORT").and_then(|v| v.parse().ok()) {
            self.console.port = port;
        }
        if let Some(v) = get("RCON_PASSWORD") {
            self.console.password = Some(v);
        }
        if let Some(v) = get("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = get("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = get("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = get("DB_NAME") {
            self.database.name = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.panel.base_url.trim().is_empty(),
            "panel.base_url must be non-empty"
        );
        anyhow::ensure!(
            self.panel.timeout_ms > 0,
            "panel.timeout_ms must be > 0, got {}",
            self.panel.timeout_ms
        );
        anyhow::ensure!(
            self.console.port > 0,
            "console.port must be between 1 and 65535, got {}",
            self.console.port
        );
        anyhow::ensure!(
            !self.console.command.trim().is_empty(),
            "console.command must be non-empty"
        );
        anyhow::ensure!(
            self.console.timeout_ms > 0,
            "console.timeout_ms must be > 0, got {}",
            self.console.timeout_ms
        );
        anyhow::ensure!(
            !self.database.host.is_empty(),
            "database.host must be non-empty"
        );
        anyhow::ensure!(
            !self.database.name.is_empty(),
            "database.name must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.timeout_ms > 0,
            "database.timeout_ms must be > 0, got {}",
            self.database.timeout_ms
        );
        Ok(())
    }
}
