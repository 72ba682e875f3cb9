use super::*;
use indoc::indoc;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

const SAMPLE_CONFIG: &str = indoc! {r#"
    [gitea]
    url = "https://gitea.example.com"
    token = { value = "gitea-token" }
    webhook = { secret = "gitea-secret" }
    status_context = "sonarqube"

    [sonarqube]
    url = "https://sonarqube.example.com"
    token = { value = "sonar-token" }
    webhook = { secret = "sonar-secret" }
    additional_metrics = ["new_security_hotspots"]

    [[projects]]
    sonarqube = { key = "pr-bot" }
    gitea = { owner = "example-organization", name = "pr-bot" }

    [[projects]]
    sonarqube = { key = "other" }
    gitea = { owner = "example-organization", name = "other" }
"#};

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn write_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_from_toml_reads_all_sections() {
    let config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();

    assert_eq!(config.gitea.url, "https://gitea.example.com");
    assert_eq!(config.gitea.token.value, "gitea-token");
    assert_eq!(config.gitea.webhook.secret, "gitea-secret");
    assert_eq!(config.gitea.status_context.as_deref(), Some("sonarqube"));
    assert_eq!(config.sonarqube.url, "https://sonarqube.example.com");
    assert_eq!(config.sonarqube.token.value, "sonar-token");
    assert_eq!(config.sonarqube.webhook.secret, "sonar-secret");
    assert_eq!(
        config.sonarqube.additional_metrics,
        vec!["new_security_hotspots".to_string()]
    );
    assert_eq!(config.projects.len(), 2);
    assert_eq!(config.projects[0], ProjectMapping::new("pr-bot", "example-organization", "pr-bot"));
}

#[test]
fn test_from_toml_defaults_naming_pattern() {
    let config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();

    assert_eq!(config.naming_pattern.regex, naming::default_regex());
    assert_eq!(config.naming_pattern.template, naming::default_template());
    assert_eq!(config.otlp_endpoint(), None);
}

#[test]
fn test_from_toml_custom_naming_pattern() {
    let content = format!(
        "{}\n{}",
        SAMPLE_CONFIG,
        indoc! {r#"
            [naming_pattern]
            regex = "^pull-(\\d+)$"
            template = "pull-%d"
        "#}
    );

    let config = AppConfig::from_toml(&content).unwrap();
    let settings = config.bot_settings().unwrap();

    assert_eq!(settings.naming.parse("pull-42").unwrap(), 42);
    assert_eq!(settings.naming.format(42), "pull-42");
}

#[test]
fn test_from_toml_invalid_content() {
    let result = AppConfig::from_toml("[gitea\nurl = ");

    assert!(matches!(result, Err(ServerError::ConfigError(msg)) if msg.starts_with("Unable to parse configuration")));
}

#[test]
fn test_apply_env_overrides() {
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();

    config.apply_env_overrides(env(&[
        ("PRBOT_GITEA_URL", "https://git.internal"),
        ("PRBOT_GITEA_TOKEN_VALUE", "env-gitea-token"),
        ("PRBOT_SONARQUBE_WEBHOOK_SECRET", "env-sonar-secret"),
        ("PRBOT_SONARQUBE_ADDITIONALMETRICS", "new_bugs, ,new_code_smells"),
        ("PRBOT_NAMINGPATTERN_TEMPLATE", "PR-%d"),
    ]));

    assert_eq!(config.gitea.url, "https://git.internal");
    assert_eq!(config.gitea.token.value, "env-gitea-token");
    assert_eq!(config.gitea.webhook.secret, "gitea-secret");
    assert_eq!(config.sonarqube.webhook.secret, "env-sonar-secret");
    assert_eq!(
        config.sonarqube.additional_metrics,
        vec!["new_bugs".to_string(), "new_code_smells".to_string()]
    );
}

#[test]
fn test_apply_env_overrides_without_variables() {
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();

    config.apply_env_overrides(env(&[]));

    assert_eq!(config.gitea.url, "https://gitea.example.com");
    assert_eq!(config.sonarqube.token.value, "sonar-token");
}

#[test]
fn test_resolve_secret_files_reads_and_trims() {
    let token = write_temp_file("file-token\n");
    let secret = write_temp_file("file-secret\r\n");
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.gitea.token.file = token.path().to_string_lossy().to_string();
    config.sonarqube.webhook.secret_file = secret.path().to_string_lossy().to_string();

    config.resolve_secret_files().unwrap();

    assert_eq!(config.gitea.token.value, "file-token");
    assert_eq!(config.sonarqube.webhook.secret, "file-secret");
    assert_eq!(config.sonarqube.token.value, "sonar-token");
}

#[test]
fn test_resolve_secret_files_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing-token");
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.gitea.token.file = missing.to_string_lossy().to_string();

    let result = config.resolve_secret_files();

    let expected_prefix = format!("Cannot read '{}' or it is no regular file", missing.display());
    assert!(matches!(result, Err(ServerError::ConfigError(msg)) if msg.starts_with(&expected_prefix)));
}

#[test]
fn test_resolve_secret_files_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.sonarqube.token.file = dir.path().to_string_lossy().to_string();

    let result = config.resolve_secret_files();

    assert!(matches!(result, Err(ServerError::ConfigError(_))));
}

#[test]
fn test_validate_requires_urls() {
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    assert!(config.validate().is_ok());

    config.sonarqube.url = " ".to_string();
    assert!(matches!(config.validate(), Err(ServerError::ConfigError(msg)) if msg == "sonarqube.url is required"));

    config.gitea.url = String::new();
    assert!(matches!(config.validate(), Err(ServerError::ConfigError(msg)) if msg == "gitea.url is required"));
}

#[test]
fn test_bot_settings() {
    let config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();

    let settings = config.bot_settings().unwrap();

    assert_eq!(settings.projects.len(), 2);
    assert_eq!(settings.secrets.gitea, "gitea-secret");
    assert_eq!(settings.secrets.sonarqube, "sonar-secret");
    let (index, mapping) = settings.projects.by_sonarqube_key("other").unwrap();
    assert_eq!(index, 1);
    assert_eq!(mapping.repository().name, "other");
}

#[test]
fn test_bot_settings_rejects_missing_projects() {
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.projects.clear();

    let result = config.bot_settings();

    assert!(matches!(result, Err(ServerError::InvalidConfiguration(_))));
}

#[test]
fn test_bot_settings_rejects_invalid_naming_pattern() {
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.naming_pattern.regex = "^PR-\\d+$".to_string();

    let result = config.bot_settings();

    assert!(matches!(result, Err(ServerError::InvalidConfiguration(_))));
}

#[test]
fn test_otlp_endpoint() {
    let mut config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.telemetry.otlp_endpoint = " http://collector:4318/v1/traces ".to_string();

    assert_eq!(config.otlp_endpoint(), Some("http://collector:4318/v1/traces"));
}

#[test]
fn test_debug_output_hides_secrets() {
    let config = AppConfig::from_toml(SAMPLE_CONFIG).unwrap();

    let output = format!("{:?}", config);

    assert!(!output.contains("gitea-token"));
    assert!(!output.contains("gitea-secret"));
    assert!(!output.contains("sonar-token"));
    assert!(!output.contains("sonar-secret"));
}

#[test]
fn test_load_config_from_file() {
    let file = write_temp_file(SAMPLE_CONFIG);

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.projects.len(), 2);
}

#[test]
fn test_load_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let result = load_config(&dir.path().join("config.toml"));

    assert!(matches!(result, Err(ServerError::ConfigError(msg)) if msg.starts_with("Fatal error while reading config file")));
}
