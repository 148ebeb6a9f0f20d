use crate::errors::{AssistantError, AssistantResult};
use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PERSONA: &str = "You are a helpful assistant for MIGEPROF (Ministry of Gender and Family Promotion) that provides information about policies, guidelines, services, and contact information.";
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_REPO_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";
pub const DEFAULT_EMAIL_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Configuration for the assistant and the services it talks to
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub completion_api_key: Option<String>,
    pub completion_endpoint: Option<String>,
    pub model_name: Option<String>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,

    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    pub repo_access_token: Option<String>,
    pub repo_api_base: Option<String>,

    pub search_api_key: Option<String>,
    pub search_endpoint: Option<String>,

    pub email_init_key: Option<String>,
    pub email_endpoint: Option<String>,
    pub email_service_id: Option<String>,
    pub email_template_id: Option<String>,
    pub feedback_to_email: Option<String>,
    pub feedback_to_name: Option<String>,
    pub feedback_from_name: Option<String>,

    pub locale: Option<Locale>,
    pub log_level: Option<String>,
    /// Whole-request timeout applied to every HTTP client; unset means transport defaults
    pub request_timeout_secs: Option<u64>,
}

impl AssistantConfig {
    /// Built-in defaults for everything except secrets
    pub fn defaults() -> Self {
        Self {
            completion_endpoint: Some(DEFAULT_COMPLETION_ENDPOINT.to_string()),
            model_name: Some(DEFAULT_MODEL.to_string()),
            temperature: Some(DEFAULT_TEMPERATURE),
            system_prompt: Some(DEFAULT_PERSONA.to_string()),
            repo_owner: Some("GerediNIYIBIGIRA".to_string()),
            repo_name: Some("AI_ProjectMethod_Assignment".to_string()),
            repo_api_base: Some(DEFAULT_REPO_API_BASE.to_string()),
            search_endpoint: Some(DEFAULT_SEARCH_ENDPOINT.to_string()),
            email_endpoint: Some(DEFAULT_EMAIL_ENDPOINT.to_string()),
            email_service_id: Some("service_2ya3fhd".to_string()),
            email_template_id: Some("template_z7zxxzb".to_string()),
            feedback_to_name: Some("MIGEPROF Team".to_string()),
            feedback_from_name: Some("MIGEPROF Information Assistant User".to_string()),
            locale: Some(Locale::En),
            log_level: Some("info".to_string()),
            ..Self::default()
        }
    }

    /// Reads the secrets and repository identifiers from the process environment.
    ///
    /// Only variables that are set and non-empty produce values; everything else stays `None`
    /// so the result can be layered with [`AssistantConfig::merge`].
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        Self {
            completion_api_key: var("OPENAI_API_KEY"),
            repo_access_token: var("GITHUB_ACCESS_TOKEN"),
            search_api_key: var("TAVILY_API_KEY"),
            email_init_key: var("EMAILJS_KEY"),
            repo_owner: var("INFODESK_REPO_OWNER"),
            repo_name: var("INFODESK_REPO_NAME"),
            model_name: var("INFODESK_MODEL"),
            log_level: var("INFODESK_LOG_LEVEL"),
            ..Self::default()
        }
    }

    /// Loads configuration from a file if it exists, otherwise returns an empty config
    pub fn load_from_file(path: &Path) -> AssistantResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            AssistantError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| AssistantError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    /// Saves configuration to a file, creating its directory when needed
    pub fn save_to_file(&self, path: &Path) -> AssistantResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            AssistantError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AssistantError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            AssistantError::ConfigError(format!("Failed to write config file: {}", e))
        })
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        fn pick<T: Clone>(ours: &Option<T>, theirs: &Option<T>) -> Option<T> {
            theirs.clone().or_else(|| ours.clone())
        }

        Self {
            completion_api_key: pick(&self.completion_api_key, &other.completion_api_key),
            completion_endpoint: pick(&self.completion_endpoint, &other.completion_endpoint),
            model_name: pick(&self.model_name, &other.model_name),
            temperature: other.temperature.or(self.temperature),
            system_prompt: pick(&self.system_prompt, &other.system_prompt),
            repo_owner: pick(&self.repo_owner, &other.repo_owner),
            repo_name: pick(&self.repo_name, &other.repo_name),
            repo_access_token: pick(&self.repo_access_token, &other.repo_access_token),
            repo_api_base: pick(&self.repo_api_base, &other.repo_api_base),
            search_api_key: pick(&self.search_api_key, &other.search_api_key),
            search_endpoint: pick(&self.search_endpoint, &other.search_endpoint),
            email_init_key: pick(&self.email_init_key, &other.email_init_key),
            email_endpoint: pick(&self.email_endpoint, &other.email_endpoint),
            email_service_id: pick(&self.email_service_id, &other.email_service_id),
            email_template_id: pick(&self.email_template_id, &other.email_template_id),
            feedback_to_email: pick(&self.feedback_to_email, &other.feedback_to_email),
            feedback_to_name: pick(&self.feedback_to_name, &other.feedback_to_name),
            feedback_from_name: pick(&self.feedback_from_name, &other.feedback_from_name),
            locale: other.locale.or(self.locale),
            log_level: pick(&self.log_level, &other.log_level),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    pub fn persona(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_PERSONA)
    }

    pub fn locale(&self) -> Locale {
        self.locale.unwrap_or_default()
    }

    /// Builds the shared HTTP client, honouring the optional request timeout
    pub fn http_client(&self) -> AssistantResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("infodesk/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        builder.build().map_err(|e| {
            AssistantError::ConfigError(format!("Failed to build HTTP client: {}", e))
        })
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> AssistantResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        AssistantError::ConfigError("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> AssistantResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
