use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Subscriber configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub coordinator: CoordinatorConfig,
    pub subscriber: SubscriberConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub url: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Address the broker pushes messages to; derived from the server port when unset
    pub callback_url: Option<String>,
    /// Attempts per subscribe/unsubscribe (first try plus retries)
    pub subscription_attempts: u32,
    /// Attempts per topic listing
    pub topic_list_attempts: u32,
    pub max_buffered_messages: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            callback_url: None,
            subscription_attempts: 2,
            topic_list_attempts: 3,
            max_buffered_messages: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 10,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // HERALD_COORDINATOR__URL, HERALD_SUBSCRIBER__CALLBACK_URL, ...
        builder = builder.add_source(
            Environment::with_prefix("HERALD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check for misconfigurations, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = url::Url::parse(&self.coordinator.url) {
            errors.push(format!(
                "coordinator.url '{}' is not a valid URL: {e}",
                self.coordinator.url
            ));
        }
        if let Some(ref callback) = self.subscriber.callback_url {
            if callback.trim().is_empty() {
                errors.push("subscriber.callback_url must not be empty when set".to_string());
            }
        }
        if self.subscriber.subscription_attempts == 0 {
            errors.push("subscriber.subscription_attempts must be at least 1".to_string());
        }
        if self.subscriber.topic_list_attempts == 0 {
            errors.push("subscriber.topic_list_attempts must be at least 1".to_string());
        }
        if self.subscriber.max_buffered_messages == 0 {
            errors.push("subscriber.max_buffered_messages must be at least 1".to_string());
        }
        if self.http.request_timeout_seconds == 0 {
            errors.push("http.request_timeout_seconds must be at least 1".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get HTTP listen address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Callback address announced to the broker
    #[must_use]
    pub fn callback_url(&self) -> String {
        self.subscriber
            .callback_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
    }
}
