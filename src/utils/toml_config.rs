//! TOML-based configuration for salon-server
//!
//! Infrastructure settings live in `salon.toml`. Signing secrets never do: the
//! file names the environment variables that hold them, and they are resolved
//! once at startup into [`AuthSettings`].

use crate::auth::cookies::{parse_same_site, CookieSettings};
use crate::auth::jwt::AuthSettings;
use crate::auth::password::PasswordHasher;
use crate::db::DatabaseProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Minimum accepted length for a signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime, in seconds (365 days).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Root configuration structure loaded from salon.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cookies: CookieConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the access-token secret
    #[serde(default = "default_access_secret_env")]
    pub access_secret_env: String,

    /// Environment variable name containing the refresh-token secret
    #[serde(default = "default_refresh_secret_env")]
    pub refresh_secret_env: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: i64,

    /// Argon2 memory cost in KiB
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,

    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,

    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,

    /// How often expired refresh tokens are purged; 0 disables the task
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

fn default_access_secret_env() -> String {
    "ACCESS_TOKEN_SECRET".to_string()
}

fn default_refresh_secret_env() -> String {
    "REFRESH_TOKEN_SECRET".to_string()
}

fn default_access_token_ttl() -> i64 {
    900
}

fn default_refresh_token_ttl() -> i64 {
    604800
}

fn default_hash_memory_kib() -> u32 {
    argon2::Params::DEFAULT_M_COST
}

fn default_hash_iterations() -> u32 {
    argon2::Params::DEFAULT_T_COST
}

fn default_hash_parallelism() -> u32 {
    argon2::Params::DEFAULT_P_COST
}

fn default_prune_interval_secs() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret_env: default_access_secret_env(),
            refresh_secret_env: default_refresh_secret_env(),
            access_token_ttl: default_access_token_ttl(),
            refresh_token_ttl: default_refresh_token_ttl(),
            hash_memory_kib: default_hash_memory_kib(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "./data/salon.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Cookie & CORS Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_true")]
    pub secure: bool,

    /// `strict`, `lax` or `none`
    #[serde(default = "default_same_site")]
    pub same_site: String,

    #[serde(default = "default_cookie_path")]
    pub path: String,

    pub domain: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_same_site() -> String {
    "lax".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: default_same_site(),
            path: default_cookie_path(),
            domain: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Secret in '{0}' is too short (at least 32 bytes required)")]
    WeakSecret(String),
}

impl SalonConfig {
    /// Load configuration from a TOML file and validate it, including the
    /// presence and strength of the signing secrets.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.auth_settings()?;

        Ok(config)
    }

    /// Parse and structurally validate configuration text. Secrets are not
    /// resolved here.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SalonConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that does not depend on the environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.access_token_ttl <= 0 || self.auth.refresh_token_ttl <= 0 {
            return Err(ConfigError::ValidationError(
                "Token lifetimes must be positive".to_string(),
            ));
        }

        if self.auth.access_token_ttl > MAX_TOKEN_TTL_SECS
            || self.auth.refresh_token_ttl > MAX_TOKEN_TTL_SECS
        {
            return Err(ConfigError::ValidationError(format!(
                "Token lifetimes must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }

        if self.auth.access_secret_env == self.auth.refresh_secret_env {
            return Err(ConfigError::ValidationError(
                "Access and refresh secrets must come from different variables".to_string(),
            ));
        }

        self.cookie_settings()?;
        self.password_hasher()?;

        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "Unknown log format '{}'",
                self.server.log_format
            )));
        }

        Ok(())
    }

    pub fn password_hasher(&self) -> Result<PasswordHasher, ConfigError> {
        PasswordHasher::new(
            self.auth.hash_memory_kib,
            self.auth.hash_iterations,
            self.auth.hash_parallelism,
        )
        .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    pub fn cookie_settings(&self) -> Result<CookieSettings, ConfigError> {
        let same_site = parse_same_site(&self.cookies.same_site).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "Unknown cookie same_site value '{}'",
                self.cookies.same_site
            ))
        })?;

        Ok(CookieSettings {
            secure: self.cookies.secure,
            same_site,
            path: self.cookies.path.clone(),
            domain: self.cookies.domain.clone(),
        })
    }

    pub fn database_provider(&self) -> DatabaseProvider {
        DatabaseProvider::from_url(&self.database.url)
    }

    /// Resolve signing secrets from the process environment.
    pub fn auth_settings(&self) -> Result<AuthSettings, ConfigError> {
        self.auth_settings_with(|name| std::env::var(name).ok())
    }

    /// Resolve signing secrets through `lookup`.
    pub fn auth_settings_with<F>(&self, lookup: F) -> Result<AuthSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |name: &str| -> Result<String, ConfigError> {
            let secret = lookup(name)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::WeakSecret(name.to_string()));
            }
            Ok(secret)
        };

        let access_secret = resolve(&self.auth.access_secret_env)?;
        let refresh_secret = resolve(&self.auth.refresh_secret_env)?;

        if access_secret == refresh_secret {
            return Err(ConfigError::ValidationError(
                "Access and refresh secrets must differ".to_string(),
            ));
        }

        Ok(AuthSettings {
            access_secret,
            refresh_secret,
            access_ttl_secs: self.auth.access_token_ttl,
            refresh_ttl_secs: self.auth.refresh_token_ttl,
            hasher: self.password_hasher()?,
        })
    }

    /// Sample configuration written by `salon-server init`.
    pub fn template(host: &str, port: u16) -> String {
        format!(
            r#"# salon-server configuration

[server]
host = "{host}"
port = {port}
log_level = "info"
log_format = "pretty"   # or "json"

[auth]
# Names of the environment variables holding the signing secrets.
# Each secret must be at least {MIN_SECRET_LEN} bytes and the two must differ.
access_secret_env = "ACCESS_TOKEN_SECRET"
refresh_secret_env = "REFRESH_TOKEN_SECRET"
access_token_ttl = 900        # 15 minutes
refresh_token_ttl = 604800    # 7 days
prune_interval_secs = 3600

[database]
url = "./data/salon.db"       # or ":memory:"

[cookies]
secure = true
same_site = "lax"
path = "/"

[cors]
allowed_origins = ["http://localhost:3000"]
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const ACCESS: &str = "access-secret-that-is-at-least-32-chars";
    const REFRESH: &str = "refresh-secret-that-is-at-least-32-chars";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_template_parses_with_defaults() {
        let config = SalonConfig::from_toml_str(&SalonConfig::template("0.0.0.0", 9000))
            .expect("template should be valid");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.access_token_ttl, 900);
        assert_eq!(config.auth.refresh_token_ttl, 604800);
        assert_eq!(
            config.database_provider(),
            DatabaseProvider::SQLite {
                path: "./data/salon.db".to_string()
            }
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = SalonConfig::from_toml_str("").expect("defaults are valid");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.access_secret_env, "ACCESS_TOKEN_SECRET");
        assert!(config.cookies.secure);
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let result = SalonConfig::from_toml_str("[auth]\naccess_token_ttl = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_oversized_ttl() {
        for toml in [
            "[auth]\nrefresh_token_ttl = 9223372036854775807\n",
            "[auth]\naccess_token_ttl = 31536001\n",
        ] {
            let result = SalonConfig::from_toml_str(toml);
            assert!(matches!(result, Err(ConfigError::ValidationError(_))), "{toml}");
        }

        let at_limit = SalonConfig::from_toml_str("[auth]\nrefresh_token_ttl = 31536000\n");
        assert!(at_limit.is_ok());
    }

    #[test]
    fn test_rejects_shared_secret_variable() {
        let result = SalonConfig::from_toml_str(
            "[auth]\naccess_secret_env = \"SECRET\"\nrefresh_secret_env = \"SECRET\"\n",
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_unknown_same_site() {
        let result = SalonConfig::from_toml_str("[cookies]\nsame_site = \"sideways\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_auth_settings_resolution() {
        let config = SalonConfig::default();

        let settings = config
            .auth_settings_with(env(&[
                ("ACCESS_TOKEN_SECRET", ACCESS),
                ("REFRESH_TOKEN_SECRET", REFRESH),
            ]))
            .expect("secrets resolve");

        assert_eq!(settings.access_secret, ACCESS);
        assert_eq!(settings.refresh_secret, REFRESH);
        assert_eq!(settings.access_ttl_secs, 900);
    }

    #[test]
    fn test_missing_secret() {
        let config = SalonConfig::default();

        let result = config.auth_settings_with(env(&[("ACCESS_TOKEN_SECRET", ACCESS)]));

        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "REFRESH_TOKEN_SECRET"));
    }

    #[test]
    fn test_weak_and_identical_secrets() {
        let config = SalonConfig::default();

        let weak = config.auth_settings_with(env(&[
            ("ACCESS_TOKEN_SECRET", "short"),
            ("REFRESH_TOKEN_SECRET", REFRESH),
        ]));
        let identical = config.auth_settings_with(env(&[
            ("ACCESS_TOKEN_SECRET", ACCESS),
            ("REFRESH_TOKEN_SECRET", ACCESS),
        ]));

        assert!(matches!(weak, Err(ConfigError::WeakSecret(_))));
        assert!(matches!(identical, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SalonConfig::load("/definitely/not/here/salon.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server\nport = ").expect("write");

        let result = SalonConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
