use crate::core::resolver::FallbackPolicy;
use crate::core::ConfigProvider;
use crate::utils::error::{FeedError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_PUBLIC_PATHS: [&str; 3] = ["/auth/login", "/auth/register", "/public/"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the session file.
    #[serde(default = "default_session_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

fn default_timeout() -> u64 {
    30
}

fn default_public_paths() -> Vec<String> {
    DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect()
}

fn default_session_path() -> String {
    ".feedplan".to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_filename() -> String {
    "rations.csv".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            filename: default_filename(),
            fallback: FallbackPolicy::default(),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: default_timeout(),
            public_paths: default_public_paths(),
        }
    }
}

impl FeedConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig::new(base_url),
            session: SessionConfig::default(),
            report: ReportConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FeedError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FeedError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 600)?;
        validation::validate_path_prefixes("api.public_paths", &self.api.public_paths)?;
        validation::validate_path("session.path", &self.session.path)?;
        validation::validate_path("report.output_path", &self.report.output_path)?;
        validation::validate_non_empty_string("report.filename", &self.report.filename)?;
        Ok(())
    }
}

impl ConfigProvider for FeedConfig {
    fn output_path(&self) -> &str {
        &self.report.output_path
    }

    fn report_filename(&self) -> &str {
        &self.report.filename
    }

    fn fallback_policy(&self) -> FallbackPolicy {
        self.report.fallback
    }
}

impl Validate for FeedConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
