use serde::Deserialize;

use crate::error::WorkerResult;

/// Process configuration, loaded from environment variables (optionally
/// preloaded from an `.env` file) with the `PRIO_` prefix, mirroring the
/// original's `envconfig`-tagged struct.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "Config::default_server_host")]
    pub server_host: String,
    #[serde(default = "Config::default_server_port")]
    pub server_port: u16,

    /// Full Postgres DSN. When unset, assembled from the `db_*` fields.
    pub db_dsn: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_database: Option<String>,

    /// Comma-separated list of coordination-service ensemble addresses.
    #[serde(default)]
    pub zk_servers: String,
    #[serde(default = "Config::default_zk_timeout_ms")]
    pub zk_timeout_ms: u64,
}

impl Config {
    fn default_namespace() -> String {
        "default".to_string()
    }

    fn default_server_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_server_port() -> u16 {
        8080
    }

    fn default_zk_timeout_ms() -> u64 {
        5_000
    }

    /// Loads configuration from the process environment. `envfile`, if it
    /// points at a readable file, is merged into the environment first (a
    /// missing file is not an error, matching `dotenvy`'s usual posture for
    /// optional local overrides).
    pub fn load(envfile: &str) -> WorkerResult<Self> {
        match dotenvy::from_path(envfile) {
            Ok(()) => {}
            Err(dotenvy::Error::Io(_)) => {}
            Err(err) => tracing::warn!(envfile, %err, "failed to parse env file"),
        }

        let cfg = envy::prefixed("PRIO_").from_env::<Config>()?;
        Ok(cfg)
    }

    /// The ZooKeeper-shaped ensemble address list, split on commas and
    /// trimmed. Empty entries are dropped.
    pub fn zk_server_list(&self) -> Vec<String> {
        self.zk_servers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Assembles a Postgres DSN from `db_dsn` if present, otherwise from
    /// the discrete `db_*` fields.
    pub fn database_dsn(&self) -> Option<String> {
        if let Some(dsn) = &self.db_dsn {
            return Some(dsn.clone());
        }
        let host = self.db_host.as_deref()?;
        let port = self.db_port?;
        let user = self.db_user.as_deref().unwrap_or("postgres");
        let password = self.db_password.as_deref().unwrap_or("");
        let database = self.db_database.as_deref()?;
        Some(format!("postgres://{user}:{password}@{host}:{port}/{database}"))
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
