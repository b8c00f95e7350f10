use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use meshgen_core::error::ConfigError;
use meshgen_pipeline::config::{PipelineConfig, DEFAULT_OBJECT_NAME};
use meshgen_tripo::api::ApiKey;
use meshgen_tripo::client::ConversionOptions;
use meshgen_tripo::poll::PollPolicy;

/// Server configuration loaded from environment variables.
///
/// Built once at startup and shared behind an `Arc`. Required values that
/// are missing or malformed abort startup with a [`ConfigError`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Whole-request deadline in seconds (default: `900`).
    pub request_timeout_secs: u64,
    /// Postgres connection string.
    pub database_url: String,
    /// Generation service endpoint and credential.
    pub remote: RemoteConfig,
    /// Stage parameters for the generation pipeline.
    pub pipeline: PipelineConfig,
    /// Local reconstruction script; `None` disables the script endpoints.
    pub scripts: Option<ScriptConfig>,
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: ApiKey,
}

/// Location and invocation of the local reconstruction script.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Working directory the script runs in.
    pub dir: PathBuf,
    /// Program used to launch the script (default: `python`).
    pub interpreter: String,
    /// Script file name relative to `dir` (default: `run.py`).
    pub script_name: String,
    /// Kill the script after this long (default: 30 minutes).
    pub timeout: Duration,
}

impl ScriptConfig {
    /// Directory uploaded source images are written to.
    pub fn examples_dir(&self) -> PathBuf {
        self.dir.join("examples")
    }

    /// Directory the script writes its first result set to.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join("output").join("0")
    }

    pub fn mesh_path(&self) -> PathBuf {
        self.output_dir().join("mesh.usd")
    }

    pub fn photo_path(&self) -> PathBuf {
        self.output_dir().join("example2.jpg")
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `8080`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `900`                   |
    /// | `DATABASE_URL`          | required                |
    /// | `BASE_URL`              | required                |
    /// | `API_KEY`               | required                |
    /// | `DEST_PATH`             | required                |
    /// | `SETTLE_DELAY_SECS`     | `20`                    |
    /// | `POLL_INTERVAL_SECS`    | `5`                     |
    /// | `POLL_MAX_ATTEMPTS`     | `120`                   |
    /// | `POLL_STATUS_RETRIES`   | `3`                     |
    /// | `POLL_DEADLINE_SECS`    | unset                   |
    /// | `CONVERT_FORMAT`        | `USDZ`                  |
    /// | `CONVERT_QUAD`          | `true`                  |
    /// | `CONVERT_FACE_LIMIT`    | `5000`                  |
    /// | `GENERATED_OBJECT_NAME` | `GeneratedObject`       |
    /// | `SCRIPT_DIR`            | unset                   |
    /// | `SCRIPT_INTERPRETER`    | `python`                |
    /// | `SCRIPT_NAME`           | `run.py`                |
    /// | `SCRIPT_TIMEOUT_SECS`   | `1800`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.or("HOST", "0.0.0.0");
        let port = env.parse("PORT", 8080u16)?;
        let cors_origins: Vec<String> = env
            .or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| HeaderValue::from_str(o).is_err())
        {
            return Err(ConfigError::Invalid {
                var: "CORS_ORIGINS",
                reason: format!("'{bad}' is not a valid header value"),
            });
        }
        let request_timeout_secs = env.parse("REQUEST_TIMEOUT_SECS", 900u64)?;
        let database_url = env.required("DATABASE_URL")?;

        let base_url = env.required("BASE_URL")?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "BASE_URL",
                reason: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }
        let api_key = ApiKey::new(env.get("API_KEY").unwrap_or_default())?;

        let poll = PollPolicy {
            interval: Duration::from_secs(env.parse("POLL_INTERVAL_SECS", 5u64)?),
            max_attempts: env.parse("POLL_MAX_ATTEMPTS", 120u32)?,
            max_status_retries: env.parse("POLL_STATUS_RETRIES", 3u32)?,
            deadline: env
                .parse_opt::<u64>("POLL_DEADLINE_SECS")?
                .map(Duration::from_secs),
        };
        if poll.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_MAX_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }

        let pipeline = PipelineConfig {
            artifact_path: PathBuf::from(env.required("DEST_PATH")?),
            settle_delay: Duration::from_secs(env.parse("SETTLE_DELAY_SECS", 20u64)?),
            poll,
            conversion: ConversionOptions {
                format: env.or("CONVERT_FORMAT", "USDZ"),
                quad: env.parse("CONVERT_QUAD", true)?,
                face_limit: env.parse("CONVERT_FACE_LIMIT", 5000u32)?,
            },
            object_name: env.or("GENERATED_OBJECT_NAME", DEFAULT_OBJECT_NAME),
        };

        let scripts = match env.get("SCRIPT_DIR") {
            Some(dir) => Some(ScriptConfig {
                dir: PathBuf::from(dir),
                interpreter: env.or("SCRIPT_INTERPRETER", "python"),
                script_name: env.or("SCRIPT_NAME", "run.py"),
                timeout: Duration::from_secs(env.parse("SCRIPT_TIMEOUT_SECS", 1800u64)?),
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            remote: RemoteConfig { base_url, api_key },
            pipeline,
            scripts,
        })
    }
}

/// Variable lookup where blank values count as unset.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.get(var).ok_or(ConfigError::Missing(var))
    }

    fn parse_opt<T>(&self, var: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(var)
            .map(|raw| {
                raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                    var,
                    reason: format!("'{raw}': {e}"),
                })
            })
            .transpose()
    }

    fn parse<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse_opt(var)?.unwrap_or(default))
    }
}
