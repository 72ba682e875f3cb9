//! # Gitea SonarQube Bot Server
//!
//! Receives SonarQube and Gitea webhooks and reports quality gate results on
//! Gitea pull requests.
//!
//! # Endpoints
//!
//! - `GET /ping` - Health check
//! - `POST /hooks/sonarqube` - SonarQube analysis webhooks
//! - `POST /hooks/gitea` - Gitea `pull_request` and `issue_comment` webhooks
//!
//! # Examples
//!
//! ```bash
//! gitea_sonarqube_bot_server --config ./config/config.toml --port 3000
//! ```

use clap::Parser;
use gitea_sonarqube_bot_core::WebhookHandler;
use gitea_sonarqube_bot_developer_platforms::gitea::GiteaProvider;
use gitea_sonarqube_bot_developer_platforms::sonarqube::SonarQubeProvider;
use std::path::PathBuf;
use std::process::{ExitCode, Termination};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod config;
mod errors;
mod routes;
mod telemetry;

use config::AppConfig;
use errors::ServerError;

/// Command line options of the bot server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the TOML configuration file
    #[arg(
        short,
        long,
        env = "GITEA_SQ_BOT_CONFIG_PATH",
        default_value = "./config/config.toml"
    )]
    config: PathBuf,

    /// Port the webhook server listens on
    #[arg(short, long, env = "GITEA_SQ_BOT_PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = e.to_string(), "Bot server stopped");
            eprintln!("{}", e);
            e.report()
        }
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = config::load_config(&cli.config)?;
    let _telemetry = telemetry::init_telemetry(config.otlp_endpoint())?;

    info!(
        config = %cli.config.display(),
        port = cli.port,
        "Starting Gitea SonarQube bot"
    );

    let handler = create_handler(&config)?;
    let app = routes::router(Arc::new(handler));

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        ServerError::NetworkError(format!("Unable to listen on {}: {}", addr, e))
    })?;

    info!(address = addr, "Listening for webhooks");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::NetworkError(e.to_string()))?;

    info!("Shutdown complete");
    Ok(())
}

fn create_handler(
    config: &AppConfig,
) -> Result<WebhookHandler<GiteaProvider, SonarQubeProvider>, ServerError> {
    let settings = config.bot_settings()?;

    let mut gitea = GiteaProvider::new(&config.gitea.url, &config.gitea.token.value);
    if let Some(context) = config.gitea.status_context.as_deref() {
        gitea = gitea.with_status_context(context);
    }

    let sonarqube = SonarQubeProvider::new(
        &config.sonarqube.url,
        &config.sonarqube.token.value,
        &config.sonarqube.additional_metrics,
    );

    debug!(
        projects = settings.projects.len(),
        naming_regex = settings.naming.regex(),
        naming_template = settings.naming.template(),
        "Created webhook handler"
    );
    Ok(WebhookHandler::new(gitea, sonarqube, Arc::new(settings)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = e.to_string(), "Unable to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = e.to_string(), "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
