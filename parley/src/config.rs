//! Environment-driven bot configuration.
//!
//! ```rust
//! use parley::BotConfig;
//!
//! let config = BotConfig::from_lookup(|key| match key {
//!     "PARLEY_LUIS_ENDPOINT" => Some("https://westus.api.cognitive.microsoft.com".to_string()),
//!     "PARLEY_LUIS_APP_ID" => Some("app-1".to_string()),
//!     "PARLEY_STATE_BACKEND" => Some("memory".to_string()),
//!     key if key.ends_with("_API_KEY") => Some("secret".to_string()),
//!     key if key.ends_with("_ENDPOINT") => Some("https://example.test".to_string()),
//!     "PARLEY_QNA_KB_ID" => Some("kb-1".to_string()),
//!     _ => None,
//! })
//! .expect("config should load");
//!
//! assert_eq!(config.knowledge_top, 1);
//! assert_eq!(format!("{:?}", config.intent.api_key), "[REDACTED]");
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pdialog::DialogPolicy;
use pservices::SecretString;
use pstate::StateBackendConfig;

use crate::BotError;

pub const DEFAULT_KNOWLEDGE_SCORE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_KNOWLEDGE_TOP: u32 = 1;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SENTIMENT_LANGUAGE: &str = "en";

/// Base URL plus subscription key for one hosted collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpointConfig {
    pub endpoint: String,
    pub api_key: SecretString,
}

impl ServiceEndpointConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: SecretString::new(api_key),
        }
    }
}

/// Custom Vision project that classifies the body style of car pictures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarTypeClassifierConfig {
    pub service: ServiceEndpointConfig,
    pub project_id: String,
    pub published_name: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub intent: ServiceEndpointConfig,
    pub intent_app_id: String,
    pub knowledge: ServiceEndpointConfig,
    pub knowledge_base_id: String,
    pub knowledge_score_threshold: f64,
    pub knowledge_top: u32,
    pub vision: ServiceEndpointConfig,
    pub sentiment: ServiceEndpointConfig,
    pub sentiment_language: String,
    pub car_type: Option<CarTypeClassifierConfig>,
    pub http_timeout: Duration,
    pub state_backend: StateBackendConfig,
    pub max_chain_depth: usize,
}

impl BotConfig {
    pub fn new(
        intent: ServiceEndpointConfig,
        intent_app_id: impl Into<String>,
        knowledge: ServiceEndpointConfig,
        knowledge_base_id: impl Into<String>,
        vision: ServiceEndpointConfig,
        sentiment: ServiceEndpointConfig,
    ) -> Self {
        Self {
            intent,
            intent_app_id: intent_app_id.into(),
            knowledge,
            knowledge_base_id: knowledge_base_id.into(),
            knowledge_score_threshold: DEFAULT_KNOWLEDGE_SCORE_THRESHOLD,
            knowledge_top: DEFAULT_KNOWLEDGE_TOP,
            vision,
            sentiment,
            sentiment_language: DEFAULT_SENTIMENT_LANGUAGE.to_string(),
            car_type: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            state_backend: StateBackendConfig::default(),
            max_chain_depth: DialogPolicy::default().max_chain_depth,
        }
    }

    /// Reads `PARLEY_*` variables from the process environment.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| BotError::configuration(format!("{key} is not set")))
        };
        let endpoint = |prefix: &str| -> Result<ServiceEndpointConfig, BotError> {
            Ok(ServiceEndpointConfig::new(
                required(&format!("PARLEY_{prefix}_ENDPOINT"))?,
                required(&format!("PARLEY_{prefix}_API_KEY"))?,
            ))
        };

        let mut config = Self::new(
            endpoint("LUIS")?,
            required("PARLEY_LUIS_APP_ID")?,
            endpoint("QNA")?,
            required("PARLEY_QNA_KB_ID")?,
            endpoint("VISION")?,
            endpoint("SENTIMENT")?,
        );

        if let Some(threshold) = parse_optional::<f64>(&lookup, "PARLEY_QNA_SCORE_THRESHOLD")? {
            config.knowledge_score_threshold = threshold;
        }
        if let Some(top) = parse_optional::<u32>(&lookup, "PARLEY_QNA_TOP")? {
            config.knowledge_top = top;
        }
        if let Some(language) = lookup("PARLEY_SENTIMENT_LANGUAGE") {
            config.sentiment_language = language.trim().to_string();
        }
        // The body-style check is enabled by its endpoint; the rest is then required.
        if lookup("PARLEY_CUSTOM_VISION_ENDPOINT").is_some_and(|value| !value.trim().is_empty()) {
            config.car_type = Some(CarTypeClassifierConfig {
                service: endpoint("CUSTOM_VISION")?,
                project_id: required("PARLEY_CUSTOM_VISION_PROJECT_ID")?,
                published_name: required("PARLEY_CUSTOM_VISION_PUBLISHED_NAME")?,
            });
        }
        if let Some(seconds) = parse_optional::<u64>(&lookup, "PARLEY_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(seconds);
        }
        if let Some(depth) = parse_optional::<usize>(&lookup, "PARLEY_MAX_CHAIN_DEPTH")? {
            config.max_chain_depth = depth;
        }
        config.state_backend = parse_state_backend(
            lookup("PARLEY_STATE_BACKEND").as_deref(),
            lookup("PARLEY_STATE_PATH").as_deref(),
        )?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_state_backend(mut self, state_backend: StateBackendConfig) -> Self {
        self.state_backend = state_backend;
        self
    }

    pub fn with_car_type_classifier(mut self, car_type: CarTypeClassifierConfig) -> Self {
        self.car_type = Some(car_type);
        self
    }

    pub fn with_http_timeout(mut self, http_timeout: Duration) -> Self {
        self.http_timeout = http_timeout;
        self
    }

    pub fn with_knowledge_ranking(mut self, score_threshold: f64, top: u32) -> Self {
        self.knowledge_score_threshold = score_threshold;
        self.knowledge_top = top;
        self
    }

    pub fn dialog_policy(&self) -> DialogPolicy {
        DialogPolicy::default().with_max_chain_depth(self.max_chain_depth)
    }

    pub fn validate(&self) -> Result<(), BotError> {
        if !(0.0..=1.0).contains(&self.knowledge_score_threshold) {
            return Err(BotError::configuration(
                "knowledge score threshold must be within [0, 1]",
            ));
        }

        if self.knowledge_top == 0 {
            return Err(BotError::configuration(
                "knowledge top must be greater than zero",
            ));
        }

        if self.http_timeout.is_zero() {
            return Err(BotError::configuration(
                "http timeout must be greater than zero",
            ));
        }

        self.dialog_policy()
            .validate()
            .map_err(|err| BotError::configuration(err.message))
    }
}

fn parse_optional<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, BotError>
where
    T: FromStr,
{
    match lookup(key).map(|value| value.trim().to_string()) {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| BotError::configuration(format!("{key} has an invalid value '{value}'"))),
    }
}

fn parse_state_backend(
    kind: Option<&str>,
    path: Option<&str>,
) -> Result<StateBackendConfig, BotError> {
    let path = path.map(str::trim).filter(|path| !path.is_empty());

    match kind.map(|kind| kind.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(StateBackendConfig::default()),
        Some("memory") | Some("in_memory") | Some("in-memory") => Ok(StateBackendConfig::InMemory),
        Some("filesystem") | Some("fs") => {
            let root = path.ok_or_else(|| {
                BotError::configuration("PARLEY_STATE_PATH is required for the filesystem backend")
            })?;
            Ok(StateBackendConfig::Filesystem {
                root: PathBuf::from(root),
            })
        }
        Some("sqlite") => Ok(match path {
            Some(path) => StateBackendConfig::Sqlite {
                path: PathBuf::from(path),
            },
            None => StateBackendConfig::default(),
        }),
        Some(other) => Err(BotError::configuration(format!(
            "unsupported state backend '{other}'"
        ))),
    }
}
