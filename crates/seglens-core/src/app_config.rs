use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    /// Base URL of the remote analysis engine. When unset every job runs in
    /// demo mode.
    pub engine_base_url: Option<String>,
    pub engine_api_token: Option<String>,
    pub engine_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("engine_base_url", &self.engine_base_url)
            .field(
                "engine_api_token",
                &self.engine_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .finish()
    }
}
