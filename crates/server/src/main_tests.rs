use super::*;
use gitea_sonarqube_bot_core::projects::ProjectMapping;

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.gitea.url = "https://gitea.example.com".to_string();
    config.gitea.token.value = "gitea-token".to_string();
    config.gitea.status_context = Some("sonarqube".to_string());
    config.sonarqube.url = "https://sonarqube.example.com".to_string();
    config.sonarqube.token.value = "sonar-token".to_string();
    config.projects = vec![ProjectMapping::new("pr-bot", "example-organization", "pr-bot")];
    config
}

#[test]
fn test_cli_flags() {
    let cli = Cli::try_parse_from([
        "gitea_sonarqube_bot_server",
        "--config",
        "/etc/bot/config.toml",
        "-p",
        "8080",
    ])
    .unwrap();

    assert_eq!(cli.config, PathBuf::from("/etc/bot/config.toml"));
    assert_eq!(cli.port, 8080);
}

#[test]
fn test_cli_rejects_invalid_port() {
    let result = Cli::try_parse_from(["gitea_sonarqube_bot_server", "--port", "http"]);

    assert!(result.is_err());
}

#[test]
fn test_create_handler() {
    let handler = create_handler(&config()).unwrap();

    assert_eq!(handler.settings().projects.len(), 1);
    assert_eq!(handler.settings().naming.format(1337), "PR-1337");
}

#[test]
fn test_create_handler_requires_projects() {
    let mut config = config();
    config.projects.clear();

    let result = create_handler(&config);

    assert!(matches!(result, Err(ServerError::InvalidConfiguration(_))));
}
