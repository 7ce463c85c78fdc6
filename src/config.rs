use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub openai: OpenAiConfig,
    pub moderation: ModerationConfig,
    pub limits: LimitsConfig,
    pub datasets: DatasetsConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "memory" or "redis"
    pub backend: String,
    pub redis_url: String,
    pub key_prefix: String,
    pub response: ResponseCacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub retry_times: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    pub enabled: bool,
    pub prohibited_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub monthly_token_limit: i64,
    pub max_prompt_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetsConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite://assistant.db?mode=rwc".to_string(),
            },
            cache: CacheConfig {
                backend: "memory".to_string(),
                redis_url: "redis://localhost:6379".to_string(),
                key_prefix: "assistant:".to_string(),
                response: ResponseCacheConfig {
                    enabled: true,
                    ttl_seconds: 86400,
                },
            },
            openai: OpenAiConfig {
                api_key: String::new(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_seconds: 60,
                retry_times: 2,
                retry_delay_ms: 150,
            },
            moderation: ModerationConfig {
                enabled: true,
                prohibited_terms: vec![
                    "offensive".to_string(),
                    "inappropriate".to_string(),
                    "harmful".to_string(),
                ],
            },
            limits: LimitsConfig {
                monthly_token_limit: 100_000,
                max_prompt_length: 4096,
            },
            datasets: DatasetsConfig {
                path: "data/assistant".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me".to_string(),
                token_expiry_seconds: 3600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("ASSISTANT")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("ASSISTANT")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.retry_times, 2);
        assert_eq!(config.limits.monthly_token_limit, 100_000);
        assert_eq!(config.limits.max_prompt_length, 4096);
        assert!(config.moderation.enabled);
        assert_eq!(config.moderation.prohibited_terms.len(), 3);
        assert!(config.cache.response.enabled);
        assert_eq!(config.cache.response.ttl_seconds, 86400);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 4000
openai:
  model: "gpt-4o"
  timeout_seconds: 30
limits:
  monthly_token_limit: 50000
cache:
  response:
    enabled: false
logging:
  level: "warn"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.timeout_seconds, 30);
        assert_eq!(config.limits.monthly_token_limit, 50000);
        assert!(!config.cache.response.enabled);
        assert_eq!(config.logging.level, "warn");
        // Untouched sections keep their defaults
        assert_eq!(config.limits.max_prompt_length, 4096);
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_config_missing_file_uses_defaults() {
        let config = Config::load_from_file("nonexistent.yaml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.openai.model, "gpt-4o-mini");
    }
}
