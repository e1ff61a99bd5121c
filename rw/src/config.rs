//! rewild configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::GeoLocation;
use crate::prompts::DEFAULT_MAX_PROVIDERS;

/// Main rewild configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI service configuration
    pub ai: AiConfig,

    /// Retry policy for AI calls
    pub retry: RetryConfig,

    /// Geolocation provider
    pub location: LocationConfig,

    /// Workspace paths and sample inputs
    pub paths: PathsConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the AI API key environment variable is set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.ai.max_providers == 0 {
            return Err(eyre::eyre!("ai.max-providers must be at least 1"));
        }
        if std::env::var(&self.ai.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "AI API key not found. Set the {} environment variable.",
                self.ai.api_key_env
            ));
        }
        if let (Some(lat), Some(lon)) = (self.location.latitude, self.location.longitude) {
            GeoLocation::new(lat, lon).map_err(|e| eyre::eyre!("Invalid configured location: {}", e))?;
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => Some(p.clone()),
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        }?;
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Project-local config first, then the user config
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".rewild.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("rewild").join("rewild.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// AI service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider name (currently only "gemini" supported)
    pub provider: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Per-call model identifiers
    pub models: ModelsConfig,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Most providers kept from one local-services lookup
    #[serde(rename = "max-providers")]
    pub max_providers: u32,
}

impl AiConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            models: ModelsConfig::default(),
            timeout_ms: 180_000,
            max_providers: DEFAULT_MAX_PROVIDERS,
        }
    }
}

/// Model identifiers for each call kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Model for site analysis
    pub analysis: String,

    /// Image model for the restored-site vision
    pub vision: String,

    /// Model for plan generation
    pub plan: String,

    /// Model for search-grounded service lookup
    pub services: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            analysis: "gemini-2.5-flash".to_string(),
            vision: "gemini-2.5-flash-image".to_string(),
            plan: "gemini-2.5-pro".to_string(),
            services: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds (doubles each retry)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
        }
    }
}

/// Which geolocation provider to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    /// Use the configured latitude/longitude
    Fixed,
    /// Look up the approximate position of the public IP
    #[default]
    Ip,
    /// Geolocation is not available
    None,
}

/// Geolocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Provider: fixed, ip, none
    pub provider: LocatorKind,

    /// Latitude for the fixed provider
    pub latitude: Option<f64>,

    /// Longitude for the fixed provider
    pub longitude: Option<f64>,

    /// IP geolocation endpoint (ip-api.com compatible JSON)
    #[serde(rename = "lookup-url")]
    pub lookup_url: String,

    /// Lookup timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LocationConfig {
    /// The configured fixed coordinates, if both are present
    pub fn fixed(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: LocatorKind::Ip,
            latitude: None,
            longitude: None,
            lookup_url: "http://ip-api.com/json".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Paths and sample inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory where saved results are written
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Directory with prompt template overrides (`<name>.pmt`)
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// Sample site photo used by "use demo image"
    #[serde(rename = "demo-image-url")]
    pub demo_image_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/rewild on Linux)
        let output_dir = dirs::data_dir()
            .map(|d| d.join("rewild").join("projects"))
            .unwrap_or_else(|| PathBuf::from("rewild-projects"));

        Self {
            output_dir,
            prompts_dir: None,
            demo_image_url: "https://images.unsplash.com/photo-1506521781263-d8422e82f27a?w=1280".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.location.provider, LocatorKind::Ip);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();

        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert!(config.models.vision.contains("image"));
        assert_eq!(config.max_providers, DEFAULT_MAX_PROVIDERS);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
ai:
  provider: gemini
  base-url: https://proxy.example.com
  api-key-env: MY_KEY
  timeout-ms: 60000
  max-providers: 3
  models:
    plan: my-plan-model

retry:
  max-retries: 5
  base-delay-ms: 500

location:
  provider: fixed
  latitude: 52.52
  longitude: 13.405

paths:
  output-dir: /tmp/rewild
  prompts-dir: ./prompts

log-level: DEBUG
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.ai.base_url, "https://proxy.example.com");
        assert_eq!(config.ai.api_key_env, "MY_KEY");
        assert_eq!(config.ai.models.plan, "my-plan-model");
        assert_eq!(config.ai.max_providers, 3);
        // Unspecified models keep defaults
        assert_eq!(config.ai.models.analysis, ModelsConfig::default().analysis);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(config.location.provider, LocatorKind::Fixed);
        assert_eq!(config.location.fixed(), Some((52.52, 13.405)));
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/rewild"));
        assert_eq!(config.paths.prompts_dir, Some(PathBuf::from("./prompts")));
        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
retry:
  max-retries: 1
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.location.fixed(), None);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewild.yml");
        fs::write(&path, "log-level: TRACE\nretry:\n  max-retries: 7\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("TRACE"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/definitely/not/here/rewild.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_key() {
        let mut config = Config::default();
        config.ai.api_key_env = "REWILD_TEST_KEY_UNSET".to_string();
        // SAFETY: serialized test, no other thread reads this variable
        unsafe { std::env::remove_var("REWILD_TEST_KEY_UNSET") };
        assert!(config.validate().is_err());
        assert!(config.ai.get_api_key().is_err());
    }

    #[test]
    #[serial]
    fn test_validate_with_api_key() {
        let mut config = Config::default();
        config.ai.api_key_env = "REWILD_TEST_KEY_SET".to_string();
        // SAFETY: serialized test, no other thread reads this variable
        unsafe { std::env::set_var("REWILD_TEST_KEY_SET", "secret") };
        assert!(config.validate().is_ok());
        assert_eq!(config.ai.get_api_key().unwrap(), "secret");

        config.location.latitude = Some(123.0);
        config.location.longitude = Some(0.0);
        assert!(config.validate().is_err());

        config.location = LocationConfig::default();
        config.ai.max_providers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max-providers"));
        unsafe { std::env::remove_var("REWILD_TEST_KEY_SET") };
    }
}
