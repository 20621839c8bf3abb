use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aws::AwsCredentials;

/// Process-wide configuration, threaded explicitly into each collaborator at
/// construction time. Nothing outside `AppConfig::load` reads the
/// environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    pub search: SearchConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

impl AwsConfig {
    pub fn credentials(&self) -> AwsCredentials {
        AwsCredentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub presign_expiry_secs: u32,
}

#[derive(Clone, Debug)]
pub struct NotifyConfig {
    pub topic_arn: String,
    pub subject: String,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub endpoint: String,
    pub region: String,
    pub max_results: usize,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub agent_id: String,
    pub agent_alias_id: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    pub topic_arn: Option<String>,
    pub agent_id: Option<String>,
    pub agent_alias_id: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            aws: AwsConfig {
                region: "ap-northeast-1".to_string(),
                access_key_id: String::new(),
                secret_access_key: String::new().into(),
                session_token: None,
            },
            storage: StorageConfig { bucket: String::new(), presign_expiry_secs: 3600 },
            notify: NotifyConfig {
                topic_arn: String::new(),
                subject: "Slide deck ready".to_string(),
            },
            search: SearchConfig {
                endpoint: "https://api.duckduckgo.com".to_string(),
                region: "jp-jp".to_string(),
                max_results: 10,
            },
            agent: AgentConfig { agent_id: String::new(), agent_alias_id: String::new() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("deckhand.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(aws) = patch.aws {
            if let Some(region) = aws.region {
                self.aws.region = region;
            }
            if let Some(access_key_id) = aws.access_key_id {
                self.aws.access_key_id = access_key_id;
            }
            if let Some(secret_access_key_value) = aws.secret_access_key {
                self.aws.secret_access_key = secret_value(secret_access_key_value);
            }
            if let Some(session_token_value) = aws.session_token {
                self.aws.session_token = Some(secret_value(session_token_value));
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(bucket) = storage.bucket {
                self.storage.bucket = bucket;
            }
            if let Some(presign_expiry_secs) = storage.presign_expiry_secs {
                self.storage.presign_expiry_secs = presign_expiry_secs;
            }
        }

        if let Some(notify) = patch.notify {
            if let Some(topic_arn) = notify.topic_arn {
                self.notify.topic_arn = topic_arn;
            }
            if let Some(subject) = notify.subject {
                self.notify.subject = subject;
            }
        }

        if let Some(search) = patch.search {
            if let Some(endpoint) = search.endpoint {
                self.search.endpoint = endpoint;
            }
            if let Some(region) = search.region {
                self.search.region = region;
            }
            if let Some(max_results) = search.max_results {
                self.search.max_results = max_results;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(agent_id) = agent.agent_id {
                self.agent.agent_id = agent_id;
            }
            if let Some(agent_alias_id) = agent.agent_alias_id {
                self.agent.agent_alias_id = agent_alias_id;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DECKHAND_AWS_REGION").or_else(|| read_env("AWS_REGION")) {
            self.aws.region = value;
        }
        if let Some(value) =
            read_env("DECKHAND_AWS_ACCESS_KEY_ID").or_else(|| read_env("AWS_ACCESS_KEY_ID"))
        {
            self.aws.access_key_id = value;
        }
        if let Some(value) =
            read_env("DECKHAND_AWS_SECRET_ACCESS_KEY").or_else(|| read_env("AWS_SECRET_ACCESS_KEY"))
        {
            self.aws.secret_access_key = secret_value(value);
        }
        if let Some(value) = read_env("AWS_SESSION_TOKEN") {
            self.aws.session_token = Some(secret_value(value));
        }

        if let Some(value) =
            read_env("DECKHAND_STORAGE_BUCKET").or_else(|| read_env("S3_BUCKET_NAME"))
        {
            self.storage.bucket = value;
        }
        if let Some(value) = read_env("DECKHAND_STORAGE_PRESIGN_EXPIRY_SECS") {
            self.storage.presign_expiry_secs =
                parse_u32("DECKHAND_STORAGE_PRESIGN_EXPIRY_SECS", &value)?;
        }

        if let Some(value) =
            read_env("DECKHAND_NOTIFY_TOPIC_ARN").or_else(|| read_env("SNS_TOPIC_ARN"))
        {
            self.notify.topic_arn = value;
        }
        if let Some(value) = read_env("DECKHAND_NOTIFY_SUBJECT") {
            self.notify.subject = value;
        }

        if let Some(value) = read_env("DECKHAND_SEARCH_ENDPOINT") {
            self.search.endpoint = value;
        }
        if let Some(value) = read_env("DECKHAND_SEARCH_REGION") {
            self.search.region = value;
        }
        if let Some(value) = read_env("DECKHAND_SEARCH_MAX_RESULTS") {
            self.search.max_results =
                parse_u32("DECKHAND_SEARCH_MAX_RESULTS", &value)? as usize;
        }

        if let Some(value) = read_env("DECKHAND_AGENT_ID").or_else(|| read_env("AGENT_ID")) {
            self.agent.agent_id = value;
        }
        if let Some(value) =
            read_env("DECKHAND_AGENT_ALIAS_ID").or_else(|| read_env("AGENT_ALIAS_ID"))
        {
            self.agent.agent_alias_id = value;
        }

        let log_level =
            read_env("DECKHAND_LOGGING_LEVEL").or_else(|| read_env("DECKHAND_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DECKHAND_LOGGING_FORMAT").or_else(|| read_env("DECKHAND_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(region) = overrides.region {
            self.aws.region = region;
        }
        if let Some(access_key_id) = overrides.access_key_id {
            self.aws.access_key_id = access_key_id;
        }
        if let Some(secret_access_key) = overrides.secret_access_key {
            self.aws.secret_access_key = secret_value(secret_access_key);
        }
        if let Some(bucket) = overrides.bucket {
            self.storage.bucket = bucket;
        }
        if let Some(topic_arn) = overrides.topic_arn {
            self.notify.topic_arn = topic_arn;
        }
        if let Some(agent_id) = overrides.agent_id {
            self.agent.agent_id = agent_id;
        }
        if let Some(agent_alias_id) = overrides.agent_alias_id {
            self.agent.agent_alias_id = agent_alias_id;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        const KNOWN_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !KNOWN_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level `{}` is not one of trace|debug|info|warn|error",
                self.logging.level
            )));
        }

        // S3 caps presigned URLs at seven days.
        if self.storage.presign_expiry_secs == 0 || self.storage.presign_expiry_secs > 604_800 {
            return Err(ConfigError::Validation(format!(
                "storage.presign_expiry_secs `{}` must be within 1..=604800",
                self.storage.presign_expiry_secs
            )));
        }

        if !self.notify.topic_arn.is_empty() && !self.notify.topic_arn.starts_with("arn:") {
            return Err(ConfigError::Validation(format!(
                "notify.topic_arn `{}` does not look like an ARN",
                self.notify.topic_arn
            )));
        }

        if self.search.max_results == 0 || self.search.max_results > 25 {
            return Err(ConfigError::Validation(format!(
                "search.max_results `{}` must be within 1..=25",
                self.search.max_results
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    aws: Option<AwsPatch>,
    storage: Option<StoragePatch>,
    notify: Option<NotifyPatch>,
    search: Option<SearchPatch>,
    agent: Option<AgentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AwsPatch {
    region: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    bucket: Option<String>,
    presign_expiry_secs: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifyPatch {
    topic_arn: Option<String>,
    subject: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    endpoint: Option<String>,
    region: Option<String>,
    max_results: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    agent_id: Option<String>,
    agent_alias_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(env_path) = read_env("DECKHAND_CONFIG_PATH") {
        return Some(PathBuf::from(env_path));
    }
    let default = PathBuf::from("deckhand.toml");
    default.exists().then_some(default)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
