use solar_analysis::{AnalyzerError, Result};

pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub port: u16,
}

impl Config {
    /// Absence of the upstream credential is fatal; every other knob has a
    /// default.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| AnalyzerError::Config("OPENROUTER_API_KEY not set".to_string()))?;

        let model = std::env::var("ANALYSIS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url =
            std::env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .unwrap_or(3000);

        Ok(Self {
            api_key,
            model,
            base_url,
            port,
        })
    }
}
