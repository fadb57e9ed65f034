// src/config/app.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_CONFIG_PATH: &str = "FRAUD_CONFIG_PATH";
pub const ENV_DEFAULT_THRESHOLD: &str = "FRAUD_DEFAULT_THRESHOLD";
pub const ENV_MODELS_DIR: &str = "FRAUD_MODELS_DIR";
pub const ENV_EVAL_TIMEOUT_MS: &str = "FRAUD_EVAL_TIMEOUT_MS";

const BEHAVIOR_FILE: &str = "behavior_model.json";
const TEXT_FILE: &str = "text_model.json";
const ENCODER_FILE: &str = "embedding_model.json";

fn default_threshold() -> f64 {
    0.5
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_session_ttl_secs() -> u64 {
    3_600
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPaths {
    pub behavior: PathBuf,
    pub text: PathBuf,
    pub encoder: PathBuf,
}

impl ModelPaths {
    /// Conventional file names inside one directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            behavior: dir.join(BEHAVIOR_FILE),
            text: dir.join(TEXT_FILE),
            encoder: dir.join(ENCODER_FILE),
        }
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::in_dir("models")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub models: ModelPaths,
    /// Threshold pre-filled on first page load. Requests always carry their own.
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
    /// Caller-level bound on one evaluation (model loads + inference).
    #[serde(default = "default_timeout_ms")]
    pub evaluation_timeout_ms: u64,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Unset keeps the whole history for the life of the session.
    #[serde(default)]
    pub max_history_per_session: Option<usize>,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default = "default_true")]
    pub warm_up_on_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelPaths::default(),
            default_threshold: default_threshold(),
            evaluation_timeout_ms: default_timeout_ms(),
            session_ttl_secs: default_session_ttl_secs(),
            max_history_per_session: None,
            metrics_enabled: true,
            warm_up_on_start: true,
        }
    }
}

impl AppConfig {
    /// Load using env var + fallbacks:
    /// 1) $FRAUD_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied on top, then values are sanitized.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let p = Path::new(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(p)?
                } else {
                    info!("no config file found, using defaults");
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(t) = parse_env::<f64>(ENV_DEFAULT_THRESHOLD) {
            self.default_threshold = t;
        }
        if let Some(ms) = parse_env::<u64>(ENV_EVAL_TIMEOUT_MS) {
            self.evaluation_timeout_ms = ms;
        }
        if let Ok(dir) = env::var(ENV_MODELS_DIR) {
            if !dir.trim().is_empty() {
                self.models = ModelPaths::in_dir(dir.trim());
            }
        }
    }

    fn sanitize(&mut self) {
        if !self.default_threshold.is_finite() {
            self.default_threshold = default_threshold();
        }
        self.default_threshold = self.default_threshold.clamp(0.0, 1.0);
        if self.evaluation_timeout_ms == 0 {
            self.evaluation_timeout_ms = default_timeout_ms();
        }
        if self.session_ttl_secs == 0 {
            self.session_ttl_secs = default_session_ttl_secs();
        }
        if self.max_history_per_session == Some(0) {
            self.max_history_per_session = None;
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable env override");
            None
        }
    }
}
