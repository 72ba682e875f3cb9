use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, error, instrument, warn};

use crate::{
    ensure_success,
    errors::Error,
    models::{MeasuresResponse, PullRequestsResponse, QualityGatePullRequest},
    QualityGateProvider,
};

#[cfg(test)]
#[path = "sonarqube_tests.rs"]
mod tests;

/// Metrics that are always requested for the pull request comment.
pub const DEFAULT_METRICS: [&str; 3] = ["bugs", "vulnerabilities", "code_smells"];

/// Builds the comma separated `metricKeys` list: the default metrics followed by
/// any additionally configured ones. Each key is URL encoded.
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_developer_platforms::sonarqube::metrics_list;
///
/// assert_eq!(metrics_list(&[]), "bugs,vulnerabilities,code_smells");
/// assert_eq!(
///     metrics_list(&["new_security_hotspots".to_string()]),
///     "bugs,vulnerabilities,code_smells,new_security_hotspots"
/// );
/// ```
pub fn metrics_list(additional_metrics: &[String]) -> String {
    DEFAULT_METRICS
        .iter()
        .copied()
        .chain(additional_metrics.iter().map(String::as_str))
        .map(|m| urlencoding::encode(m).into_owned())
        .collect::<Vec<String>>()
        .join(",")
}

/// [`QualityGateProvider`] backed by the SonarQube Web API.
///
/// The token is sent as the user name of HTTP basic authentication with an
/// empty password, which is how SonarQube expects user tokens.
#[derive(Clone)]
pub struct SonarQubeProvider {
    client: Client,
    base_url: String,
    token: String,
    metric_keys: String,
}

impl SonarQubeProvider {
    pub fn new(base_url: &str, token: &str, additional_metrics: &[String]) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            metric_keys: metrics_list(additional_metrics),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.token, None::<&str>)
            .send()
            .await
            .map_err(|e| Error::RequestFailed(url.to_string(), e.to_string()))?;

        let response = ensure_success(response, url).map_err(|e| {
            warn!(
                url,
                error = e.to_string(),
                "SonarQube rejected the request"
            );
            e
        })?;

        response.json::<T>().await.map_err(|e| {
            error!(
                url,
                error = e.to_string(),
                "Cannot parse response from SonarQube"
            );
            Error::InvalidResponse(e.to_string())
        })
    }
}

impl fmt::Debug for SonarQubeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonarQubeProvider")
            .field("base_url", &self.base_url)
            .field("metric_keys", &self.metric_keys)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QualityGateProvider for SonarQubeProvider {
    #[instrument]
    async fn get_measures(
        &self,
        project_key: &str,
        pull_request: &str,
    ) -> Result<MeasuresResponse, Error> {
        let url = format!(
            "{}/api/measures/component?additionalFields=metrics&metricKeys={}&component={}&pullRequest={}",
            self.base_url,
            self.metric_keys,
            urlencoding::encode(project_key),
            urlencoding::encode(pull_request)
        );

        let measures: MeasuresResponse = self.fetch(&url).await?;
        debug!(
            project = project_key,
            pull_request,
            count = measures.component.measures.len(),
            "Loaded measures"
        );

        Ok(measures)
    }

    #[instrument]
    async fn get_pull_request(
        &self,
        project_key: &str,
        pull_request: &str,
    ) -> Result<QualityGatePullRequest, Error> {
        let url = format!(
            "{}/api/project_pull_requests/list?project={}",
            self.base_url,
            urlencoding::encode(project_key)
        );

        let response: PullRequestsResponse = self.fetch(&url).await?;
        response
            .find(pull_request)
            .cloned()
            .ok_or_else(|| Error::PullRequestNotFound(pull_request.to_string()))
    }

    fn pull_request_url(&self, project_key: &str, pull_request: &str) -> String {
        format!(
            "{}/dashboard?id={}&pullRequest={}",
            self.base_url,
            urlencoding::encode(project_key),
            urlencoding::encode(pull_request)
        )
    }
}
