//! Configuration types and loading
//!
//! Config path precedence: `--config` > `VEC2_CONFIG` env var > `vec2.toml`.
//! The application secret is loaded from the VEC2_SECRET env var or
//! `secret_file`, never stored in the TOML directly.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use vec2_client::LogField;

/// Env var holding the application secret.
pub const SECRET_ENV: &str = "VEC2_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub login: LoginConfig,
    /// Request logs written by the client.
    #[serde(default)]
    pub logs: Vec<LogConfig>,
}

/// API endpoint and application identity
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_url")]
    pub url: String,
    pub client_id: String,
    pub key: String,
    #[serde(skip)]
    pub secret: Option<Secret<String>>,
    /// Path to a file containing the secret (alternative to VEC2_SECRET)
    #[serde(default)]
    pub secret_file: Option<PathBuf>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where tokens are persisted between runs
#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

/// Local listener for the login redirect
#[derive(Debug, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_callback_addr")]
    pub callback_addr: SocketAddr,
    #[serde(default = "default_login_timeout")]
    pub timeout_secs: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            callback_addr: default_callback_addr(),
            timeout_secs: default_login_timeout(),
        }
    }
}

impl LoginConfig {
    /// The redirect target handed to the login page.
    pub fn redirect_url(&self) -> String {
        format!("http://{}/callback", self.callback_addr)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub fields: Vec<String>,
    /// Only log calls to authenticated endpoints.
    #[serde(default)]
    pub auth_only: bool,
}

impl LogConfig {
    pub fn parsed_fields(&self) -> common::Result<Vec<LogField>> {
        self.fields
            .iter()
            .map(|f| f.parse().map_err(common::Error::Config))
            .collect()
    }
}

fn default_url() -> String {
    vec2_auth::DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("vec2-credentials.json")
}

fn default_callback_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8765))
}

fn default_login_timeout() -> u64 {
    300
}

impl Config {
    /// Load configuration from a TOML file, then resolve the secret.
    ///
    /// Secret resolution order:
    /// 1. VEC2_SECRET env var
    /// 2. secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.url.starts_with("http://") && !config.api.url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "api.url must start with http:// or https://, got: {}",
                config.api.url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        if config.login.timeout_secs == 0 {
            return Err(common::Error::Config(
                "login.timeout_secs must be greater than 0".into(),
            ));
        }

        if config.api.client_id.trim().is_empty() {
            return Err(common::Error::Config("api.client_id must not be empty".into()));
        }

        if config.api.key.trim().is_empty() {
            return Err(common::Error::Config("api.key must not be empty".into()));
        }

        for log in &config.logs {
            log.parsed_fields()?;
        }

        if let Ok(secret) = std::env::var(SECRET_ENV) {
            config.api.secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.api.secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.api.secret = Some(Secret::new(secret));
            }
        }

        if config.api.secret.is_none() {
            return Err(common::Error::MissingSecret(SECRET_ENV));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or VEC2_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_path {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("VEC2_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("vec2.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch VEC2_SECRET / VEC2_CONFIG.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[api]
client_id = "client-1"
key = "key-1"

[credentials]
path = "/tmp/vec2-creds.json"

[[logs]]
path = "/tmp/vec2.log"
fields = ["response", "data"]
"#
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("vec2.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { set_env(SECRET_ENV, "app-secret") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env(SECRET_ENV) };

        assert_eq!(config.api.url, "https://api.vec2.design");
        assert_eq!(config.api.client_id, "client-1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.secret.as_ref().unwrap().expose(), "app-secret");
        assert_eq!(config.credentials.path, PathBuf::from("/tmp/vec2-creds.json"));
        assert_eq!(config.login.callback_addr.port(), 8765);
        assert_eq!(config.login.redirect_url(), "http://127.0.0.1:8765/callback");
        assert_eq!(
            config.logs[0].parsed_fields().unwrap(),
            vec![LogField::Response, LogField::Data]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/vec2.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_secret_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("secret");
        std::fs::write(&secret_path, "file-secret\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                r#"
[api]
client_id = "c"
key = "k"
secret_file = "{}"
"#,
                secret_path.display()
            ),
        );

        unsafe { remove_env(SECRET_ENV) };
        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.secret.as_ref().unwrap().expose(), "file-secret");
    }

    #[test]
    fn test_secret_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
client_id = "c"
key = "k"
secret_file = "/nonexistent/path/secret"
"#,
        );

        unsafe { set_env(SECRET_ENV, "env-secret") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env(SECRET_ENV) };
        assert_eq!(
            config.api.secret.as_ref().unwrap().expose(),
            "env-secret",
            "VEC2_SECRET must take precedence over secret_file"
        );
    }

    #[test]
    fn test_missing_secret_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { remove_env(SECRET_ENV) };
        let result = Config::load(&path);
        assert!(matches!(result, Err(common::Error::MissingSecret(SECRET_ENV))));
    }

    #[test]
    fn test_blank_secret_file_is_missing() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("secret");
        std::fs::write(&secret_path, "  \n  ").unwrap();
        let path = write_config(
            &dir,
            &format!(
                r#"
[api]
client_id = "c"
key = "k"
secret_file = "{}"
"#,
                secret_path.display()
            ),
        );

        unsafe { remove_env(SECRET_ENV) };
        assert!(matches!(
            Config::load(&path),
            Err(common::Error::MissingSecret(_))
        ));
    }

    #[test]
    fn test_unreadable_secret_file_is_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
client_id = "c"
key = "k"
secret_file = "/nonexistent/path/secret"
"#,
        );

        unsafe { remove_env(SECRET_ENV) };
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("failed to read secret_file"), "got: {err}");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
url = "api.vec2.design"
client_id = "c"
key = "k"
"#,
        );

        unsafe { set_env(SECRET_ENV, "s") };
        let result = Config::load(&path);
        unsafe { remove_env(SECRET_ENV) };
        let err = result.unwrap_err().to_string();
        assert!(err.contains("api.url must start with http"), "got: {err}");
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        unsafe { set_env(SECRET_ENV, "s") };

        let api = write_config(
            &dir,
            "[api]\nclient_id = \"c\"\nkey = \"k\"\ntimeout_secs = 0\n",
        );
        assert!(Config::load(&api).is_err(), "api.timeout_secs = 0 must be rejected");

        let login = write_config(
            &dir,
            "[api]\nclient_id = \"c\"\nkey = \"k\"\n\n[login]\ntimeout_secs = 0\n",
        );
        assert!(Config::load(&login).is_err(), "login.timeout_secs = 0 must be rejected");

        unsafe { remove_env(SECRET_ENV) };
    }

    #[test]
    fn test_empty_identity_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        unsafe { set_env(SECRET_ENV, "s") };

        let path = write_config(&dir, "[api]\nclient_id = \" \"\nkey = \"k\"\n");
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("client_id"), "got: {err}");

        let path = write_config(&dir, "[api]\nclient_id = \"c\"\nkey = \"\"\n");
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("key"), "got: {err}");

        unsafe { remove_env(SECRET_ENV) };
    }

    #[test]
    fn test_unknown_log_field_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
client_id = "c"
key = "k"

[[logs]]
path = "calls.log"
fields = ["body"]
"#,
        );

        unsafe { set_env(SECRET_ENV, "s") };
        let result = Config::load(&path);
        unsafe { remove_env(SECRET_ENV) };
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown log field: body"), "got: {err}");
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some(Path::new("/custom/vec2.toml")));
        assert_eq!(path, PathBuf::from("/custom/vec2.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("VEC2_CONFIG", "/env/vec2.toml") };
        let path = Config::resolve_path(None);
        unsafe { remove_env("VEC2_CONFIG") };
        assert_eq!(path, PathBuf::from("/env/vec2.toml"));
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("VEC2_CONFIG") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("vec2.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("VEC2_CONFIG", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some(Path::new("/cli/wins.toml")));
        unsafe { remove_env("VEC2_CONFIG") };
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over VEC2_CONFIG"
        );
    }
}
