use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_ADMIN_SECRET_CODE: &str = "ADMIN_SECRET_123";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Separate listener for `/healthz` and `/metrics`; disabled when unset.
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), metrics_addr: None }
    }
}

/// Bootstrap administrator created before the listener is bound.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_secret_code")]
    pub admin_secret_code: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            admin_name: default_admin_name(),
            admin_email: default_admin_email(),
            admin_secret_code: default_admin_secret_code(),
        }
    }
}

fn default_admin_name() -> String { "System Administrator".into() }
fn default_admin_email() -> String { "admin@complaintportal.com".into() }
fn default_admin_secret_code() -> String { DEFAULT_ADMIN_SECRET_CODE.into() }

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file if present, otherwise defaults overridden by environment variables.
    /// A config file that exists but does not parse is an error.
    pub fn load_or_env() -> Result<Self> {
        let path = config_path();
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            Self::from_env()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        cfg.server.metrics_addr = std::env::var("METRICS_ADDR").ok();
        if std::env::var("LOG_FORMAT").map(|f| f.eq_ignore_ascii_case("json")).unwrap_or(false) {
            cfg.logging.format = LogFormat::Json;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.portal.normalize_from_env();
        self.portal.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        if self.metrics_addr.as_deref().is_some_and(|a| a.trim().is_empty()) {
            self.metrics_addr = None;
        }
        Ok(())
    }
}

impl PortalConfig {
    pub fn normalize_from_env(&mut self) {
        // ADMIN_SECRET_CODE wins over the file so deployments can rotate it
        if let Ok(code) = std::env::var("ADMIN_SECRET_CODE") {
            if !code.trim().is_empty() {
                self.admin_secret_code = code;
            }
        }
        self.admin_name = self.admin_name.trim().to_string();
        self.admin_email = self.admin_email.trim().to_string();
        self.admin_secret_code = self.admin_secret_code.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin_name.is_empty() {
            return Err(anyhow!("portal.admin_name is empty"));
        }
        if self.admin_email.is_empty() {
            return Err(anyhow!("portal.admin_email is empty"));
        }
        if self.admin_secret_code.is_empty() {
            return Err(anyhow!("portal.admin_secret_code is empty; set it in config.toml or ADMIN_SECRET_CODE"));
        }
        Ok(())
    }
}
