use crate::error::{AiItError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AZURE_OPENAI_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";

/// Non-secret settings from `config.toml`
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub log_level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_openai_api_version: Option<String>,
}

/// App-registration credentials for the client-credentials flow.
#[derive(Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Validate that all three values are present and non-empty.
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        let missing: Vec<&str> = [
            ("AZURE_TENANT_ID", tenant_id),
            ("AZURE_CLIENT_ID", client_id),
            ("AZURE_CLIENT_SECRET", client_secret),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(AiItError::ConfigError(format!(
                "Microsoft Graph requires AZURE_TENANT_ID, AZURE_CLIENT_ID, and AZURE_CLIENT_SECRET in .env (missing: {}). See .env.example.",
                missing.join(", ")
            )));
        }

        Ok(Self {
            tenant_id: tenant_id.trim().to_string(),
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
        })
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// Resolved application configuration, built once at startup and passed down
/// by reference.
#[derive(Clone)]
pub struct AppConfig {
    pub azure_tenant_id: String,
    pub azure_client_id: String,
    pub azure_client_secret: String,

    /// OpenAI key, or the Azure OpenAI key when `azure_openai_endpoint` is set
    pub openai_api_key: String,
    pub azure_openai_endpoint: String,
    pub azure_openai_api_version: String,
    /// Azure deployment name, or model name for OpenAI
    pub azure_openai_deployment: String,

    pub graph_base_url: String,
    pub authority_host: String,
    pub openai_base_url: String,

    pub prompts_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            azure_tenant_id: String::new(),
            azure_client_id: String::new(),
            azure_client_secret: String::new(),
            openai_api_key: String::new(),
            azure_openai_endpoint: String::new(),
            azure_openai_api_version: DEFAULT_AZURE_OPENAI_API_VERSION.to_string(),
            azure_openai_deployment: DEFAULT_DEPLOYMENT.to_string(),
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            prompts_dir: PathBuf::from("prompts"),
            reports_dir: PathBuf::from("reports"),
            log_level: String::new(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("azure_tenant_id", &self.azure_tenant_id)
            .field("azure_client_id", &self.azure_client_id)
            .field("azure_client_secret", &"[redacted]")
            .field("openai_api_key", &"[redacted]")
            .field("azure_openai_endpoint", &self.azure_openai_endpoint)
            .field("azure_openai_api_version", &self.azure_openai_api_version)
            .field("azure_openai_deployment", &self.azure_openai_deployment)
            .field("graph_base_url", &self.graph_base_url)
            .field("authority_host", &self.authority_host)
            .field("openai_base_url", &self.openai_base_url)
            .field("prompts_dir", &self.prompts_dir)
            .field("reports_dir", &self.reports_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl AppConfig {
    /// Merge `config.toml` settings with environment-style variables.
    ///
    /// Values are trimmed and empty values count as unset.
    pub fn from_sources(settings: &Config, vars: &HashMap<String, String>) -> Self {
        let get = |key: &str| -> Option<String> {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        Self {
            azure_tenant_id: get("AZURE_TENANT_ID").unwrap_or_default(),
            azure_client_id: get("AZURE_CLIENT_ID").unwrap_or_default(),
            azure_client_secret: get("AZURE_CLIENT_SECRET").unwrap_or_default(),
            openai_api_key: get("OPENAI_API_KEY")
                .or_else(|| get("AZURE_OPENAI_API_KEY"))
                .unwrap_or_default(),
            azure_openai_endpoint: get("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            azure_openai_api_version: get("AZURE_OPENAI_API_VERSION")
                .or_else(|| settings.azure_openai_api_version.clone())
                .unwrap_or(defaults.azure_openai_api_version),
            azure_openai_deployment: get("AZURE_OPENAI_DEPLOYMENT")
                .or_else(|| settings.openai_model.clone())
                .unwrap_or(defaults.azure_openai_deployment),
            graph_base_url: get("GRAPH_BASE_URL").unwrap_or(defaults.graph_base_url),
            authority_host: get("AZURE_AUTHORITY_HOST").unwrap_or(defaults.authority_host),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            prompts_dir: settings.prompts_dir.clone().unwrap_or(defaults.prompts_dir),
            reports_dir: settings.reports_dir.clone().unwrap_or(defaults.reports_dir),
            log_level: settings.log_level.trim().to_string(),
        }
    }

    /// Graph credentials; fails naming the missing settings.
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::new(
            &self.azure_tenant_id,
            &self.azure_client_id,
            &self.azure_client_secret,
        )
    }

    /// Tenant id shortened for display, e.g. `c59151ed...`
    pub fn tenant_preview(&self) -> String {
        let tenant: Vec<char> = self.azure_tenant_id.chars().collect();
        if tenant.len() > 8 {
            format!("{}...", tenant[..8].iter().collect::<String>())
        } else if tenant.is_empty() {
            "—".to_string()
        } else {
            self.azure_tenant_id.clone()
        }
    }
}

/// Configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "ai-it", "ai-it").ok_or_else(|| {
            AiItError::ConfigError("Failed to determine config directory".into())
        })?;

        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Load `config.toml`, or defaults when it does not exist
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_file();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the full application config.
    ///
    /// Precedence: process environment, then `env_file`, then `config.toml`.
    pub fn load_app_config(&self, env_file: &Path) -> Result<AppConfig> {
        let settings = self.load_config()?;

        let mut vars = if env_file.exists() {
            Self::parse_env_file(&fs::read_to_string(env_file)?)
        } else {
            HashMap::new()
        };
        vars.extend(std::env::vars());

        tracing::debug!(
            config_file = %self.config_file().display(),
            env_file = %env_file.display(),
            "resolved configuration sources"
        );

        Ok(AppConfig::from_sources(&settings, &vars))
    }

    /// Parse simple .env file format
    pub fn parse_env_file(contents: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim();

                let value = if value.len() >= 2
                    && ((value.starts_with('"') && value.ends_with('"'))
                        || (value.starts_with('\'') && value.ends_with('\'')))
                {
                    value[1..value.len() - 1].to_string()
                } else {
                    value.to_string()
                };

                vars.insert(key, value);
            }
        }

        vars
    }
}
