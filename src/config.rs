//! Configuration types for content-check
//!
//! Configuration is constructed explicitly (no global state) and passed by
//! `Arc` into the components that need it. The usual entry point is
//! [`Config::from_env`], which reads `CONTENT_CHECK_*` environment variables
//! (a `.env` file is honored via `dotenvy`) and validates the result before
//! any dispatch begins.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Remote check service connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote check service API
    pub api_url: String,

    /// API token used for sign-in
    pub api_token: String,

    /// Username associated with the token
    pub username: String,

    /// Client signature sent with every check request
    pub client_signature: String,

    /// Timeout for a single HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

/// Batch dispatch behavior (concurrency, pacing, file filtering)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory containing the content files to check (default: "./content")
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Maximum concurrent in-flight check calls (default: 2)
    ///
    /// Chosen empirically to stay under the remote service's rate limits;
    /// raise with care.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,

    /// Delay held after each check call before its concurrency slot is
    /// released (default: 500 ms), spacing out requests to the remote service
    #[serde(default = "default_pacing_delay", with = "duration_ms_serde")]
    pub pacing_delay: Duration,

    /// Maximum file size accepted for submission, in bytes (default: 1 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// File extensions eligible for checking (case-insensitive)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            max_concurrent_checks: default_max_concurrent(),
            pacing_delay: default_pacing_delay(),
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Folder watching behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Delay between a filesystem event and reading the file, so writers
    /// that emit files in chunks have finished (default: 100 ms)
    #[serde(default = "default_settle_delay", with = "duration_ms_serde")]
    pub settle_delay: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(with = "duration_ms_serde")]
    pub base_delay: Duration,

    /// Cap on the exponential backoff delay
    #[serde(with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,

    /// Add random jitter (up to 10% of the capped delay) to de-synchronize clients
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    /// Defaults for remote check calls: 3 retries, 1s base, 30s cap, x2.0
    pub fn remote_defaults() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Defaults for local file operations: 2 retries, 500ms base, 5s cap, x1.5
    pub fn local_defaults() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }
}

/// Main configuration for the content check client
///
/// Fields are organized into logical sub-configs:
/// - [`remote`](RemoteConfig): service URL, credentials, client signature
/// - [`batch`](BatchConfig): concurrency cap, pacing, file filtering
/// - [`watch`](WatchConfig): folder watching behavior
/// - `remote_retry` / `local_retry`: [`RetryConfig`] for remote calls and
///   local file operations respectively
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote check service settings
    pub remote: RemoteConfig,

    /// Batch dispatch settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Folder watching settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Retry policy for remote check calls
    #[serde(default = "RetryConfig::remote_defaults")]
    pub remote_retry: RetryConfig,

    /// Retry policy for local file operations
    #[serde(default = "RetryConfig::local_defaults")]
    pub local_retry: RetryConfig,
}

impl Config {
    /// Load configuration from `CONTENT_CHECK_*` environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// The result is validated; any problem is fatal for the whole run and
    /// reported before a single check is dispatched.
    ///
    /// # Errors
    /// Returns a configuration error listing every invalid or missing setting.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// This is the testable seam behind [`Config::from_env`]; tests feed a
    /// map instead of mutating process environment.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut batch = BatchConfig::default();

        if let Some(dir) = lookup("CONTENT_CHECK_CONTENT_DIR") {
            batch.content_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("CONTENT_CHECK_MAX_CONCURRENT") {
            batch.max_concurrent_checks = raw.parse().map_err(|_| {
                Error::config(
                    "CONTENT_CHECK_MAX_CONCURRENT",
                    format!("CONTENT_CHECK_MAX_CONCURRENT is not a valid integer: {raw:?}"),
                )
            })?;
        }
        if let Some(raw) = lookup("CONTENT_CHECK_PACING_MS") {
            let ms: u64 = raw.parse().map_err(|_| {
                Error::config(
                    "CONTENT_CHECK_PACING_MS",
                    format!("CONTENT_CHECK_PACING_MS is not a valid integer: {raw:?}"),
                )
            })?;
            batch.pacing_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("CONTENT_CHECK_MAX_FILE_SIZE") {
            batch.max_file_size = raw.parse().map_err(|_| {
                Error::config(
                    "CONTENT_CHECK_MAX_FILE_SIZE",
                    format!("CONTENT_CHECK_MAX_FILE_SIZE is not a valid integer: {raw:?}"),
                )
            })?;
        }

        let config = Self {
            remote: RemoteConfig {
                api_url: lookup("CONTENT_CHECK_API_URL").unwrap_or_default(),
                api_token: lookup("CONTENT_CHECK_API_TOKEN").unwrap_or_default(),
                username: lookup("CONTENT_CHECK_USERNAME").unwrap_or_default(),
                client_signature: lookup("CONTENT_CHECK_CLIENT_SIGNATURE").unwrap_or_default(),
                request_timeout: default_request_timeout(),
            },
            batch,
            watch: WatchConfig::default(),
            remote_retry: RetryConfig::remote_defaults(),
            local_retry: RetryConfig::local_defaults(),
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Collect every human-readable validation problem
    ///
    /// An empty vec means the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.remote.api_url.trim().is_empty() {
            problems.push("api_url is not set (CONTENT_CHECK_API_URL)".to_string());
        } else {
            match url::Url::parse(&self.remote.api_url) {
                Ok(parsed) => {
                    if !matches!(parsed.scheme(), "http" | "https") {
                        problems.push(format!(
                            "api_url must use http or https, got {:?}",
                            parsed.scheme()
                        ));
                    }
                    if parsed.host_str() == Some("your-instance.example.com") {
                        problems
                            .push("api_url still contains the placeholder host".to_string());
                    }
                }
                Err(e) => problems.push(format!("api_url is not a valid URL: {e}")),
            }
        }

        if self.remote.api_token.trim().is_empty() {
            problems.push("api_token is not set (CONTENT_CHECK_API_TOKEN)".to_string());
        } else if self.remote.api_token.eq_ignore_ascii_case("YOUR_API_TOKEN") {
            problems.push("api_token still contains the placeholder value".to_string());
        }

        if self.remote.username.trim().is_empty() {
            problems.push("username is not set (CONTENT_CHECK_USERNAME)".to_string());
        }

        if self.remote.client_signature.trim().is_empty() {
            problems
                .push("client_signature is not set (CONTENT_CHECK_CLIENT_SIGNATURE)".to_string());
        }

        if self.batch.max_concurrent_checks == 0 {
            problems.push("max_concurrent_checks must be at least 1".to_string());
        }

        if self.batch.max_file_size == 0 {
            problems.push("max_file_size must be at least 1 byte".to_string());
        }

        for (name, retry) in [
            ("remote_retry", &self.remote_retry),
            ("local_retry", &self.local_retry),
        ] {
            if retry.backoff_multiplier < 1.0 {
                problems.push(format!(
                    "{name}.backoff_multiplier must be >= 1.0, got {}",
                    retry.backoff_multiplier
                ));
            }
        }

        problems
    }

    /// Validate, turning any problems into a single configuration error
    pub fn ensure_valid(&self) -> Result<()> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config {
                message: problems.join("; "),
                key: None,
            })
        }
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("./content")
}

fn default_max_concurrent() -> usize {
    2
}

fn default_pacing_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1 MiB
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_allowed_extensions() -> Vec<String> {
    vec![
        "xml".into(),
        "html".into(),
        "htm".into(),
        "md".into(),
        "markdown".into(),
        "txt".into(),
        "java".into(),
        "c".into(),
        "h".into(),
        "cpp".into(),
        "hpp".into(),
        "yaml".into(),
        "yml".into(),
        "json".into(),
        "properties".into(),
    ]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds, for sub-second delays)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
