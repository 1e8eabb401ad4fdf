// file: src/config.rs
// description: application configuration with toml file and environment overrides
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub primary: ClassifierConfig,
    pub auditor: ClassifierConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Full chat-completions URL of the service.
    pub endpoint: String,
    pub model: String,
    /// Inline key; prefer `api_key_env` so keys stay out of config files.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the key (e.g. OPENAI_API_KEY).
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Strict `json_schema` structured outputs vs. `json_object` mode for
    /// services without strict schema support.
    #[serde(default = "default_structured_outputs")]
    pub structured_outputs: bool,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_structured_outputs() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

impl ClassifierConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok())
        })
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LEAD_TRIAGE")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: PathBuf::from("data/leads.db"),
            },
            primary: ClassifierConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o-2024-08-06".to_string(),
                api_key: None,
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                structured_outputs: true,
                max_tokens: None,
            },
            auditor: ClassifierConfig {
                endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
                model: "deepseek-chat".to_string(),
                api_key: None,
                api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
                structured_outputs: false,
                max_tokens: Some(8192),
            },
            export: ExportConfig {
                output_dir: PathBuf::from("output"),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, classifier) in [("primary", &self.primary), ("auditor", &self.auditor)] {
            if classifier.endpoint.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "{name} classifier endpoint must not be empty"
                )));
            }
            if classifier.model.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "{name} classifier model must not be empty"
                )));
            }
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "database path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
