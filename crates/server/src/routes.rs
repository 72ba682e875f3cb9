use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gitea_sonarqube_bot_core::outcome::{Outcome, RejectReason};
use gitea_sonarqube_bot_core::WebhookHandler;
use gitea_sonarqube_bot_developer_platforms::{GitHostProvider, QualityGateProvider};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

pub const SONARQUBE_PROJECT_HEADER: &str = "X-SonarQube-Project";
pub const SONARQUBE_SIGNATURE_HEADER: &str = "X-Sonar-Webhook-HMAC-SHA256";
pub const GITEA_EVENT_HEADER: &str = "X-Gitea-Event";
pub const GITEA_SIGNATURE_HEADER: &str = "X-Gitea-Signature";

/// Largest webhook body accepted before the signature is checked
pub const MAX_WEBHOOK_BODY: usize = 2 * 1024 * 1024;

const PULL_REQUEST_EVENT: &str = "pull_request";
const ISSUE_COMMENT_EVENT: &str = "issue_comment";

/// Builds the HTTP router serving the health check and both webhook endpoints.
pub fn router<G, Q>(handler: Arc<WebhookHandler<G, Q>>) -> Router
where
    G: GitHostProvider + 'static,
    Q: QualityGateProvider + 'static,
{
    Router::new()
        .route("/ping", get(handle_ping))
        .route("/hooks/sonarqube", post(handle_sonarqube_hook::<G, Q>))
        .route("/hooks/gitea", post(handle_gitea_hook::<G, Q>))
        .with_state(handler)
}

async fn handle_ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "pong" }))
}

#[instrument(skip(handler, headers, body))]
async fn handle_sonarqube_hook<G, Q>(
    State(handler): State<Arc<WebhookHandler<G, Q>>>,
    headers: HeaderMap,
    body: Body,
) -> Response
where
    G: GitHostProvider + 'static,
    Q: QualityGateProvider + 'static,
{
    let project_key =
        header_value(&headers, SONARQUBE_PROJECT_HEADER).filter(|v| !v.trim().is_empty());
    let Some(project_key) = project_key else {
        warn!(
            header = SONARQUBE_PROJECT_HEADER,
            "Received SonarQube webhook without project header"
        );
        return StatusCode::NOT_FOUND.into_response();
    };

    let body = match read_body(body).await {
        Ok(body) => body,
        Err(outcome) => return respond(outcome),
    };

    let signature = header_value(&headers, SONARQUBE_SIGNATURE_HEADER).unwrap_or_default();
    let outcome = handler.handle_sonarqube(project_key, signature, &body);
    dispatch(handler, outcome)
}

#[instrument(skip(handler, headers, body))]
async fn handle_gitea_hook<G, Q>(
    State(handler): State<Arc<WebhookHandler<G, Q>>>,
    headers: HeaderMap,
    body: Body,
) -> Response
where
    G: GitHostProvider + 'static,
    Q: QualityGateProvider + 'static,
{
    let event = header_value(&headers, GITEA_EVENT_HEADER).unwrap_or_default();
    if event != PULL_REQUEST_EVENT && event != ISSUE_COMMENT_EVENT {
        warn!(event, "Received unsupported Gitea webhook event");
        return StatusCode::NOT_FOUND.into_response();
    }

    let body = match read_body(body).await {
        Ok(body) => body,
        Err(outcome) => return respond(outcome),
    };

    let signature = header_value(&headers, GITEA_SIGNATURE_HEADER).unwrap_or_default();
    let outcome = if event == PULL_REQUEST_EVENT {
        handler.handle_pull_request(signature, &body)
    } else {
        handler.handle_issue_comment(signature, &body)
    };
    dispatch(handler, outcome)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn read_body(body: Body) -> Result<Vec<u8>, Outcome> {
    to_bytes(body, MAX_WEBHOOK_BODY)
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| {
            error!(
                error = e.to_string(),
                limit = MAX_WEBHOOK_BODY,
                "Failed to read webhook body"
            );
            Outcome::Rejected(RejectReason::InternalError(e.to_string()))
        })
}

/// Answers the webhook and runs the side effects of a processed event in the
/// background.
fn dispatch<G, Q>(handler: Arc<WebhookHandler<G, Q>>, outcome: Outcome) -> Response
where
    G: GitHostProvider + 'static,
    Q: QualityGateProvider + 'static,
{
    let response = respond_with(outcome.status_code(), outcome.message());

    if let Some(work) = outcome.into_reconciliation() {
        debug!("Scheduling reconciliation");
        tokio::spawn(async move {
            match handler.reconcile(work).await {
                Ok(()) => info!("Reconciliation finished"),
                Err(e) => warn!(error = e.to_string(), "Reconciliation aborted"),
            }
        });
    }

    response
}

fn respond(outcome: Outcome) -> Response {
    respond_with(outcome.status_code(), outcome.message())
}

fn respond_with(status: u16, message: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "message": message }))).into_response()
}
