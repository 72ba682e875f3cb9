//! Markdown comment posted on pull requests after an analysis.
use gitea_sonarqube_bot_developer_platforms::errors::Error as PlatformError;
use gitea_sonarqube_bot_developer_platforms::models::MeasuresResponse;
use gitea_sonarqube_bot_developer_platforms::QualityGateProvider;
use indoc::formatdoc;
use tracing::debug;

use crate::commands::REVIEW_COMMAND;
use crate::config::QUALITY_GATE_OK;

#[cfg(test)]
#[path = "comment_tests.rs"]
mod tests;

/// Renders the headline of the comment.
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_core::comment::render_quality_gate;
///
/// assert_eq!(render_quality_gate("OK"), "**Quality Gate**: :white_check_mark:");
/// assert_eq!(render_quality_gate("ERROR"), "**Quality Gate**: :x:");
/// ```
pub fn render_quality_gate(quality_gate_status: &str) -> String {
    let emoji = if quality_gate_status == QUALITY_GATE_OK {
        ":white_check_mark:"
    } else {
        ":x:"
    };

    format!("**Quality Gate**: {}", emoji)
}

/// Renders the full comment from already loaded measures.
pub fn render_comment(quality_gate_status: &str, measures: &MeasuresResponse, url: &str) -> String {
    formatdoc!(
        "
        {quality_gate}

        {table}

        See [SonarQube]({url}) for details.

        ---

        - If you want the bot to check again, post `{command}`",
        quality_gate = render_quality_gate(quality_gate_status),
        table = measures.render_markdown_table(),
        url = url,
        command = REVIEW_COMMAND,
    )
}

/// Loads the measures of a pull request analysis and renders the comment.
///
/// # Arguments
///
/// * `quality` - The SonarQube client
/// * `project_key` - The SonarQube project key
/// * `pull_request` - The SonarQube pull request identifier, e.g. `PR-42`
/// * `url` - Link to the analysis shown in the comment
/// * `quality_gate_status` - The gate status to show in the headline
pub async fn compose_comment<Q: QualityGateProvider + ?Sized>(
    quality: &Q,
    project_key: &str,
    pull_request: &str,
    url: &str,
    quality_gate_status: &str,
) -> Result<String, PlatformError> {
    let measures = quality.get_measures(project_key, pull_request).await?;
    debug!(
        project = project_key,
        pull_request,
        count = measures.component.measures.len(),
        "Composing pull request comment"
    );

    Ok(render_comment(quality_gate_status, &measures, url))
}
