//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmConfig;

/// Model used for the study. May need updating if the provider retires it.
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Survey configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub llm: LlmConfig,
    /// Plain-text instructions shown after the welcome page.
    pub instructions_path: PathBuf,
    /// Training paragraph table (`PageTitle,Paragraph1,Paragraph2[,Icon]`).
    pub paragraphs_path: PathBuf,
    /// Optional JSON override for the test-session rewrite sources.
    pub rewrites_path: Option<PathBuf>,
    /// Directory the session transcript is written to.
    pub output_dir: PathBuf,
}

impl SurveyConfig {
    /// Build config from environment variables.
    ///
    /// Only `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let model = std::env::var("SURVEY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = match std::env::var("OPENAI_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    key: "OPENAI_TIMEOUT_SECS".to_string(),
                    message: format!("expected whole seconds, got '{raw}'"),
                }
            })?)),
            Err(_) => None,
        };

        let instructions_path = std::env::var("SURVEY_INSTRUCTIONS_PATH")
            .unwrap_or_else(|_| "instructions.txt".to_string())
            .into();
        let paragraphs_path = std::env::var("SURVEY_PARAGRAPHS_PATH")
            .unwrap_or_else(|_| "input_paragraphs.csv".to_string())
            .into();
        let rewrites_path = std::env::var("SURVEY_REWRITES_PATH").ok().map(PathBuf::from);
        let output_dir = std::env::var("SURVEY_OUTPUT_DIR")
            .unwrap_or_else(|_| ".".to_string())
            .into();

        Ok(Self {
            llm: LlmConfig {
                api_key: SecretString::from(api_key),
                model,
                base_url,
                timeout,
            },
            instructions_path,
            paragraphs_path,
            rewrites_path,
            output_dir,
        })
    }
}
