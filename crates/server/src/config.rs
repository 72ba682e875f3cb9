//! Configuration loading for the bot server.
//!
//! The configuration is read once at startup from a TOML file. Environment
//! variables prefixed with `PRBOT_` override individual values and secrets can
//! be read from files, which suits container secret mounts.
use gitea_sonarqube_bot_core::config::{BotSettings, WebhookSecrets};
use gitea_sonarqube_bot_core::naming::{self, NamingPattern};
use gitea_sonarqube_bot_core::projects::{ProjectMapping, ProjectResolver};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::errors::ServerError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Prefix of all environment variables overriding configuration values
pub const ENV_PREFIX: &str = "PRBOT";

/// An API token, either inline or read from a file.
#[derive(Clone, Default, Deserialize)]
pub struct TokenConfig {
    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub file: String,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("value", &"<redacted>")
            .field("file", &self.file)
            .finish()
    }
}

/// A webhook secret, either inline or read from a file.
#[derive(Clone, Default, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub secret: String,

    #[serde(default)]
    pub secret_file: String,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &"<redacted>")
            .field("secret_file", &self.secret_file)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiteaConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Context name of the commit statuses the bot sets
    #[serde(default)]
    pub status_context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SonarQubeConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Metrics shown in the pull request comment in addition to the defaults
    #[serde(default)]
    pub additional_metrics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamingPatternConfig {
    #[serde(default = "naming::default_regex")]
    pub regex: String,

    #[serde(default = "naming::default_template")]
    pub template: String,
}

impl Default for NamingPatternConfig {
    fn default() -> Self {
        Self {
            regex: naming::default_regex(),
            template: naming::default_template(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP/HTTP endpoint receiving traces. Export is disabled when empty.
    #[serde(default)]
    pub otlp_endpoint: String,
}

/// Top-level configuration of the bot server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gitea: GiteaConfig,

    #[serde(default)]
    pub sonarqube: SonarQubeConfig,

    #[serde(default)]
    pub projects: Vec<ProjectMapping>,

    #[serde(default)]
    pub naming_pattern: NamingPatternConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Parses the TOML configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ServerError> {
        toml::from_str(content)
            .map_err(|e| ServerError::ConfigError(format!("Unable to parse configuration: {}", e)))
    }

    /// Overrides configuration values with environment variables.
    ///
    /// Variable names are the upper-cased configuration path joined by `_`, e.g.
    /// `PRBOT_GITEA_TOKEN_VALUE`. `PRBOT_SONARQUBE_ADDITIONALMETRICS` is a comma
    /// separated list.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Resolves a variable name to its value, `None` if unset
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        override_with(&mut self.gitea.url, var("GITEA_URL"));
        override_with(&mut self.gitea.token.value, var("GITEA_TOKEN_VALUE"));
        override_with(&mut self.gitea.token.file, var("GITEA_TOKEN_FILE"));
        override_with(&mut self.gitea.webhook.secret, var("GITEA_WEBHOOK_SECRET"));
        override_with(
            &mut self.gitea.webhook.secret_file,
            var("GITEA_WEBHOOK_SECRETFILE"),
        );

        override_with(&mut self.sonarqube.url, var("SONARQUBE_URL"));
        override_with(&mut self.sonarqube.token.value, var("SONARQUBE_TOKEN_VALUE"));
        override_with(&mut self.sonarqube.token.file, var("SONARQUBE_TOKEN_FILE"));
        override_with(
            &mut self.sonarqube.webhook.secret,
            var("SONARQUBE_WEBHOOK_SECRET"),
        );
        override_with(
            &mut self.sonarqube.webhook.secret_file,
            var("SONARQUBE_WEBHOOK_SECRETFILE"),
        );
        if let Some(metrics) = var("SONARQUBE_ADDITIONALMETRICS") {
            self.sonarqube.additional_metrics = metrics
                .split(',')
                .map(|metric| metric.trim().to_string())
                .filter(|metric| !metric.is_empty())
                .collect();
        }

        override_with(&mut self.naming_pattern.regex, var("NAMINGPATTERN_REGEX"));
        override_with(
            &mut self.naming_pattern.template,
            var("NAMINGPATTERN_TEMPLATE"),
        );
    }

    /// Replaces inline tokens and webhook secrets by the content of their
    /// referenced files.
    pub fn resolve_secret_files(&mut self) -> Result<(), ServerError> {
        resolve_secret(&mut self.gitea.token.value, &self.gitea.token.file)?;
        resolve_secret(&mut self.gitea.webhook.secret, &self.gitea.webhook.secret_file)?;
        resolve_secret(&mut self.sonarqube.token.value, &self.sonarqube.token.file)?;
        resolve_secret(
            &mut self.sonarqube.webhook.secret,
            &self.sonarqube.webhook.secret_file,
        )?;
        Ok(())
    }

    /// Checks the values the server cannot start without.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.gitea.url.trim().is_empty() {
            return Err(ServerError::ConfigError(
                "gitea.url is required".to_string(),
            ));
        }

        if self.sonarqube.url.trim().is_empty() {
            return Err(ServerError::ConfigError(
                "sonarqube.url is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the immutable settings shared by the webhook handlers.
    ///
    /// Fails if the project mappings or the naming pattern are invalid.
    pub fn bot_settings(&self) -> Result<BotSettings, ServerError> {
        let projects = ProjectResolver::new(self.projects.clone())?;
        let naming = NamingPattern::new(&self.naming_pattern.regex, &self.naming_pattern.template)?;
        let secrets = WebhookSecrets {
            gitea: self.gitea.webhook.secret.clone(),
            sonarqube: self.sonarqube.webhook.secret.clone(),
        };

        Ok(BotSettings::new(projects, naming, secrets))
    }

    /// The OTLP endpoint, if trace export is enabled.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        let endpoint = self.telemetry.otlp_endpoint.trim();
        if endpoint.is_empty() {
            None
        } else {
            Some(endpoint)
        }
    }
}

fn override_with(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn resolve_secret(value: &mut String, file: &str) -> Result<(), ServerError> {
    if file.is_empty() {
        return Ok(());
    }

    let content = fs::read_to_string(file).map_err(|e| {
        error!(file, error = e.to_string(), "Failed to read secret file");
        ServerError::ConfigError(format!(
            "Cannot read '{}' or it is no regular file: {}",
            file, e
        ))
    })?;

    *value = content.trim_end_matches(['\r', '\n']).to_string();
    debug!(file, "Loaded secret from file");
    Ok(())
}

/// Loads the configuration file, applies the process environment and resolves
/// secret files.
///
/// # Arguments
///
/// * `path` - Path of the TOML configuration file
///
/// # Returns
///
/// The complete configuration, or a [`ServerError::ConfigError`] describing why
/// it could not be loaded
pub fn load_config(path: &Path) -> Result<AppConfig, ServerError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ServerError::ConfigError(format!(
            "Fatal error while reading config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut config = AppConfig::from_toml(&content)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.resolve_secret_files()?;
    config.validate()?;

    info!(
        path = %path.display(),
        projects = config.projects.len(),
        "Loaded configuration"
    );
    Ok(config)
}
