use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("missing environment variable {0} referenced in config")]
    MissingEnv(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("could not determine a config directory, pass --config explicitly")]
    NoConfigDir,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ai_provider: AiProviderConfig,
    pub commit_style: CommitStyleConfig,
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub custom_instructions: CustomInstructions,
    pub git: GitIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiProviderConfig {
    pub name: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitStyleConfig {
    pub format: String,
    #[serde(default)]
    pub conventional_prefixes: BTreeMap<String, String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    crate::constants::DEFAULT_TEMPERATURE
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupingConfig {
    pub max_files_per_commit: usize,
    pub combine_similar_changes: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomInstructions {
    #[serde(default)]
    pub grouping: String,
    #[serde(default)]
    pub user_feedback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitIdentity {
    pub user_name: String,
    pub user_email: String,
}

/// load and validate the config, from an explicit path or the default location
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_path()?,
    };
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse(&raw)
}

pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("ai-git-commit").join("config.json"))
        .ok_or(ConfigError::NoConfigDir)
}

fn parse(raw: &str) -> Result<Config, ConfigError> {
    let mut value: serde_json::Value = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
    substitute_env(&mut value)?;
    let config: Config = serde_json::from_value(value).map_err(ConfigError::Parse)?;
    config.validate()?;
    Ok(config)
}

/// expand `${VAR}` references in every string value, so secrets like the
/// api key can live in the environment rather than on disk
fn substitute_env(value: &mut serde_json::Value) -> Result<(), ConfigError> {
    match value {
        serde_json::Value::String(text) => *text = expand(text)?,
        serde_json::Value::Array(items) => {
            for item in items {
                substitute_env(item)?;
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values_mut() {
                substitute_env(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expand(text: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                let value =
                    env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))?;
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                // unterminated reference, keep it literally
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ai_provider.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ai_provider.name must not be empty".to_string(),
            ));
        }
        if self.ai_provider.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ai_provider.model must not be empty".to_string(),
            ));
        }
        if self.ai_provider.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ai_provider.api_key must not be empty".to_string(),
            ));
        }
        let temperature = self.commit_style.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid(format!(
                "commit_style.temperature must be between 0 and 2 (got {temperature})"
            )));
        }
        if self.grouping.max_files_per_commit == 0 {
            return Err(ConfigError::Invalid(
                "grouping.max_files_per_commit must be at least 1".to_string(),
            ));
        }
        if self.git.user_name.trim().is_empty() || self.git.user_email.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "git.user_name and git.user_email are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        Self {
            ai_provider: AiProviderConfig {
                name: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: "sk-test".to_string(),
            },
            commit_style: CommitStyleConfig {
                format: "conventional".to_string(),
                conventional_prefixes: BTreeMap::from([
                    ("feat".to_string(), "a new feature".to_string()),
                    ("fix".to_string(), "a bug fix".to_string()),
                ]),
                temperature: 0.7,
            },
            grouping: GroupingConfig {
                max_files_per_commit: 5,
                combine_similar_changes: true,
            },
            custom_instructions: CustomInstructions::default(),
            git: GitIdentity {
                user_name: "Test User".to_string(),
                user_email: "test@example.com".to_string(),
            },
        }
    }
}
