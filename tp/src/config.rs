//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main tripplanner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Itinerary generation settings
    pub generation: GenerationConfig,

    /// Photo fetching settings
    pub photos: PhotoConfig,

    /// Storage locations
    pub storage: StorageConfig,

    /// Raw-response debug sink settings
    pub debug: DebugConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        let env_var = self.llm.api_key_env();
        if std::env::var(&env_var).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                env_var
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripplanner.yml
        let local_config = PathBuf::from(".tripplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripplanner/tripplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripplanner").join("tripplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
///
/// Only `provider` is usually needed; model, key variable and base URL all
/// have per-provider defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "anthropic", "openai" or "gemini"
    pub provider: String,

    /// Model identifier; defaults per provider
    pub model: Option<String>,

    /// Environment variable containing the API key; defaults per provider
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// API base URL; defaults per provider
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            api_key_env: None,
            base_url: None,
            max_tokens: 8192,
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Model identifier, falling back to the provider default
    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "openai" => "gpt-4o",
                "gemini" => "gemini-2.0-flash",
                _ => "claude-sonnet-4-20250514",
            }
            .to_string()
        })
    }

    /// API key environment variable, falling back to the provider default
    pub fn api_key_env(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "openai" => "OPENAI_API_KEY",
                "gemini" => "GEMINI_API_KEY",
                _ => "ANTHROPIC_API_KEY",
            }
            .to_string()
        })
    }

    /// API base URL, falling back to the provider default
    pub fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "openai" => "https://api.openai.com",
                "gemini" => "https://generativelanguage.googleapis.com",
                _ => "https://api.anthropic.com",
            }
            .to_string()
        })
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        let env_var = self.api_key_env();
        std::env::var(&env_var).context(format!("API key environment variable {} not set", env_var))
    }
}

/// Itinerary generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Days generated per LLM call
    #[serde(rename = "block-size")]
    pub block_size: u32,

    /// Output language for generated content
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            block_size: 3,
            language: "English".to_string(),
        }
    }
}

/// Photo fetching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Environment variable containing the Unsplash access key
    #[serde(rename = "access-key-env")]
    pub access_key_env: String,

    /// Local image cache directory
    #[serde(rename = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Maximum images fetched per day plan
    #[serde(rename = "max-images")]
    pub max_images: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            access_key_env: "UNSPLASH_ACCESS_KEY".to_string(),
            cache_dir: PathBuf::from("images"),
            max_images: 3,
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Plan store directory
    #[serde(rename = "plans-dir")]
    pub plans_dir: PathBuf,

    /// Rendered itinerary output directory
    #[serde(rename = "exports-dir")]
    pub exports_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            plans_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tripplanner")
                .join("plans"),
            exports_dir: PathBuf::from("exports"),
        }
    }
}

/// Raw-response debug sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Whether raw model responses are saved at all
    pub enabled: bool,

    /// Directory for debug artifacts
    pub dir: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("debug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.generation.block_size, 3);
        assert_eq!(config.generation.language, "English");
        assert!(config.debug.enabled);
    }

    #[test]
    fn test_provider_defaults_anthropic() {
        let llm = LlmConfig::default();
        assert_eq!(llm.model(), "claude-sonnet-4-20250514");
        assert_eq!(llm.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(llm.base_url(), "https://api.anthropic.com");
    }

    #[test]
    fn test_provider_defaults_follow_provider() {
        let llm = LlmConfig {
            provider: "openai".to_string(),
            ..Default::default()
        };
        assert_eq!(llm.model(), "gpt-4o");
        assert_eq!(llm.api_key_env(), "OPENAI_API_KEY");

        let llm = LlmConfig {
            provider: "gemini".to_string(),
            ..Default::default()
        };
        assert_eq!(llm.model(), "gemini-2.0-flash");
        assert_eq!(llm.api_key_env(), "GEMINI_API_KEY");
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let llm = LlmConfig {
            provider: "openai".to_string(),
            model: Some("gpt-4o-mini".to_string()),
            base_url: Some("http://localhost:8080".to_string()),
            ..Default::default()
        };
        assert_eq!(llm.model(), "gpt-4o-mini");
        assert_eq!(llm.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
llm:
  provider: gemini
  max-tokens: 4096
generation:
  block-size: 2
  language: Spanish
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.generation.block_size, 2);
        assert_eq!(config.generation.language, "Spanish");
        // Unspecified sections fall back to defaults
        assert_eq!(config.photos.max_images, 3);
    }
}
