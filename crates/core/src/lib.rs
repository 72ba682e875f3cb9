//! # Gitea SonarQube Bot Core
//!
//! Core business logic for reporting SonarQube quality gate results on Gitea
//! pull requests.
//!
//! The bot reacts to three kinds of webhooks:
//! - SonarQube finished analysing a pull request: the quality gate is reported
//!   as a commit status and as a pull request comment
//! - Gitea pull request was opened or received new commits: the head commit is
//!   marked as awaiting analysis
//! - Gitea pull request comment with the `/sq-bot review` command: the current
//!   quality gate is reported again
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gitea_sonarqube_bot_core::{
//!     config::{BotSettings, WebhookSecrets},
//!     naming::NamingPattern,
//!     projects::{ProjectMapping, ProjectResolver},
//!     WebhookHandler,
//! };
//! use gitea_sonarqube_bot_developer_platforms::{gitea::GiteaProvider, sonarqube::SonarQubeProvider};
//! use std::sync::Arc;
//!
//! async fn handle(body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = BotSettings::new(
//!         ProjectResolver::new(vec![ProjectMapping::new("pr-bot", "example-organization", "pr-bot")])?,
//!         NamingPattern::default(),
//!         WebhookSecrets::default(),
//!     );
//!
//!     let handler = WebhookHandler::new(
//!         GiteaProvider::new("https://gitea.example.com", "gitea-token"),
//!         SonarQubeProvider::new("https://sonarqube.example.com", "sonarqube-token", &[]),
//!         Arc::new(settings),
//!     );
//!
//!     // Decide synchronously, then run the side effects
//!     let outcome = handler.handle_sonarqube("pr-bot", "", body);
//!     println!("{}: {}", outcome.status_code(), outcome.message());
//!
//!     if let Some(work) = outcome.into_reconciliation() {
//!         handler.reconcile(work).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

use gitea_sonarqube_bot_developer_platforms::errors::Error as PlatformError;
use gitea_sonarqube_bot_developer_platforms::models::Repository;
use gitea_sonarqube_bot_developer_platforms::{GitHostProvider, QualityGateProvider};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub mod commands;
use commands::{classify, BotCommand, CommandClassification};

pub mod comment;
use comment::compose_comment;

pub mod config;
use config::{BotSettings, GITEA_SOURCE, SONARQUBE_SOURCE};

pub mod errors;
use errors::BotError;

pub mod events;
use events::{CommentAction, IssueCommentEvent, PullRequestSyncEvent, QualityAnalysisEvent};

pub mod naming;

pub mod outcome;
use outcome::{IgnoreReason, Outcome, Reconciliation};

pub mod projects;
use projects::ProjectMapping;

pub mod signature;
use signature::verify_signature;

pub mod status;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Reconciles SonarQube analyses with Gitea pull requests.
///
/// `WebhookHandler` decides how to react to an inbound webhook and executes the
/// resulting side effects against the git host and the quality service.
///
/// The `handle_*` methods never call a collaborator. They verify, decode and
/// filter a webhook and return an [`Outcome`] that can be sent back to the
/// webhook sender straight away. [`WebhookHandler::reconcile`] then performs the
/// side effects of a processed webhook.
#[derive(Debug)]
pub struct WebhookHandler<G: GitHostProvider, Q: QualityGateProvider> {
    git_host: G,
    quality_gate: Q,
    settings: Arc<BotSettings>,
}

impl<G: GitHostProvider, Q: QualityGateProvider> WebhookHandler<G, Q> {
    /// Creates a new handler.
    ///
    /// # Arguments
    ///
    /// * `git_host` - Client for the git host receiving statuses and comments
    /// * `quality_gate` - Client for the quality service providing analysis results
    /// * `settings` - The immutable bot settings
    pub fn new(git_host: G, quality_gate: Q, settings: Arc<BotSettings>) -> Self {
        Self {
            git_host,
            quality_gate,
            settings,
        }
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Handles a SonarQube analysis webhook.
    ///
    /// # Arguments
    ///
    /// * `project_key` - Value of the `X-SonarQube-Project` header
    /// * `signature` - Value of the `X-Sonar-Webhook-HMAC-SHA256` header, empty if absent
    /// * `body` - The raw request body
    #[instrument(skip(self, signature, body))]
    pub fn handle_sonarqube(&self, project_key: &str, signature: &str, body: &[u8]) -> Outcome {
        let outcome = Outcome::from(self.accept_quality_analysis(project_key, signature, body));
        log_outcome(SONARQUBE_SOURCE, &outcome);
        outcome
    }

    /// Handles a Gitea `pull_request` webhook.
    #[instrument(skip(self, signature, body))]
    pub fn handle_pull_request(&self, signature: &str, body: &[u8]) -> Outcome {
        let outcome = Outcome::from(self.accept_pull_request(signature, body));
        log_outcome(GITEA_SOURCE, &outcome);
        outcome
    }

    /// Handles a Gitea `issue_comment` webhook.
    #[instrument(skip(self, signature, body))]
    pub fn handle_issue_comment(&self, signature: &str, body: &[u8]) -> Outcome {
        let outcome = Outcome::from(self.accept_issue_comment(signature, body));
        log_outcome(GITEA_SOURCE, &outcome);
        outcome
    }

    fn accept_quality_analysis(
        &self,
        project_key: &str,
        signature: &str,
        body: &[u8],
    ) -> Result<Reconciliation, BotError> {
        verify_signature(
            body,
            &self.settings.secrets.sonarqube,
            signature,
            SONARQUBE_SOURCE,
        )?;

        let event = QualityAnalysisEvent::decode(body, &self.settings.naming)?;

        let (_, project) = self
            .settings
            .projects
            .by_sonarqube_key(project_key)
            .ok_or_else(|| {
                BotError::ProjectNotConfigured(IgnoreReason::UnconfiguredProject(
                    project_key.to_string(),
                ))
            })?;

        if !event.is_pull_request_analysis() {
            return Err(BotError::UnsupportedEvent(
                IgnoreReason::NotAPullRequestAnalysis,
            ));
        }

        Ok(Reconciliation::QualityGate {
            project: project.clone(),
            event,
        })
    }

    fn accept_pull_request(&self, signature: &str, body: &[u8]) -> Result<Reconciliation, BotError> {
        verify_signature(body, &self.settings.secrets.gitea, signature, GITEA_SOURCE)?;

        let event = PullRequestSyncEvent::decode(body)?;

        let (_, project) = self.find_repository(&event.repository)?;

        if !event.action.starts_analysis() {
            return Err(BotError::UnsupportedEvent(IgnoreReason::UnsupportedAction));
        }

        Ok(Reconciliation::PendingAnalysis {
            repository: project.repository().clone(),
            pr_number: event.number,
            head_sha: event.head_sha,
        })
    }

    fn accept_issue_comment(&self, signature: &str, body: &[u8]) -> Result<Reconciliation, BotError> {
        verify_signature(body, &self.settings.secrets.gitea, signature, GITEA_SOURCE)?;

        let event = IssueCommentEvent::decode(body)?;

        if !event.is_pull_request {
            return Err(BotError::UnsupportedEvent(IgnoreReason::NotAPullRequest));
        }

        let (_, project) = self.find_repository(&event.repository)?;

        if event.action != CommentAction::Created {
            return Err(BotError::UnsupportedEvent(IgnoreReason::NotACreationEvent));
        }

        match classify(&event.body) {
            CommandClassification::Recognized(BotCommand::Review) => Ok(Reconciliation::Review {
                project: project.clone(),
                pr_number: event.issue_number,
            }),
            CommandClassification::UnknownBotCommand => {
                Err(BotError::UnsupportedEvent(IgnoreReason::UnknownBotCommand))
            }
            CommandClassification::NotABotCommand => {
                Err(BotError::UnsupportedEvent(IgnoreReason::NotABotCommand))
            }
        }
    }

    fn find_repository(
        &self,
        repository: &Repository,
    ) -> Result<(usize, &ProjectMapping), BotError> {
        self.settings
            .projects
            .by_repository(&repository.owner, &repository.name)
            .ok_or_else(|| {
                BotError::ProjectNotConfigured(IgnoreReason::UnconfiguredRepository(
                    repository.clone(),
                ))
            })
    }

    /// Executes the side effects of a processed webhook.
    ///
    /// Every failing collaborator call is logged with its context and stops the
    /// remaining side effects of this reconciliation. Nothing is retried.
    ///
    /// # Returns
    ///
    /// [`BotError::DownstreamApiError`] naming the first operation that failed
    pub async fn reconcile(&self, work: Reconciliation) -> Result<(), BotError> {
        match work {
            Reconciliation::QualityGate { project, event } => {
                self.report_quality_gate(&project, &event).await
            }
            Reconciliation::PendingAnalysis {
                repository,
                pr_number,
                head_sha,
            } => self.mark_pending(&repository, pr_number, &head_sha).await,
            Reconciliation::Review { project, pr_number } => {
                self.review_pull_request(&project, pr_number).await
            }
        }
    }

    /// Reports a finished analysis as commit status and comment.
    #[instrument(skip(self))]
    async fn report_quality_gate(
        &self,
        project: &ProjectMapping,
        event: &QualityAnalysisEvent,
    ) -> Result<(), BotError> {
        let repository = project.repository();
        let revision = event.effective_revision();

        let commit_status =
            status::from_quality_gate(&event.quality_gate_status, &event.branch_url);
        self.git_host
            .update_commit_status(repository, revision, &commit_status)
            .await
            .map_err(|e| {
                downstream_failure("Updating commit status", repository, event.pr_index, e)
            })?;
        info!(
            repository_owner = repository.owner.as_str(),
            repository = repository.name.as_str(),
            pull_request = event.pr_index,
            revision,
            state = commit_status.state.as_str(),
            "Reported quality gate as commit status"
        );

        let comment = compose_comment(
            &self.quality_gate,
            project.sonarqube_key(),
            &event.branch_name,
            &event.branch_url,
            &event.quality_gate_status,
        )
        .await
        .map_err(|e| downstream_failure("Composing comment", repository, event.pr_index, e))?;

        self.post_comment(repository, event.pr_index, &comment).await
    }

    /// Marks the head commit of a pull request as awaiting analysis.
    #[instrument(skip(self))]
    async fn mark_pending(
        &self,
        repository: &Repository,
        pr_number: u64,
        head_sha: &str,
    ) -> Result<(), BotError> {
        self.git_host
            .update_commit_status(repository, head_sha, &status::pending())
            .await
            .map_err(|e| downstream_failure("Updating commit status", repository, pr_number, e))?;

        info!(
            repository_owner = repository.owner.as_str(),
            repository = repository.name.as_str(),
            pull_request = pr_number,
            revision = head_sha,
            "Marked head commit as pending analysis"
        );
        Ok(())
    }

    /// Reports the current quality gate of a pull request without a new analysis.
    #[instrument(skip(self))]
    async fn review_pull_request(
        &self,
        project: &ProjectMapping,
        pr_number: u64,
    ) -> Result<(), BotError> {
        let repository = project.repository();
        let project_key = project.sonarqube_key();
        let pull_request = self.settings.naming.format(pr_number);

        let head = self
            .git_host
            .determine_head_commit(repository, pr_number)
            .await
            .map_err(|e| downstream_failure("Determining head commit", repository, pr_number, e))?;
        debug!(
            repository_owner = repository.owner.as_str(),
            repository = repository.name.as_str(),
            pull_request = pr_number,
            revision = head.as_str(),
            "Determined head commit"
        );

        let analysis = self
            .quality_gate
            .get_pull_request(project_key, &pull_request)
            .await
            .map_err(|e| {
                downstream_failure("Loading pull request analysis", repository, pr_number, e)
            })?;
        let quality_gate_status = analysis.status.quality_gate_status;
        let url = self.quality_gate.pull_request_url(project_key, &pull_request);

        let commit_status = status::from_quality_gate(&quality_gate_status, &url);
        self.git_host
            .update_commit_status(repository, &head, &commit_status)
            .await
            .map_err(|e| downstream_failure("Updating commit status", repository, pr_number, e))?;
        info!(
            repository_owner = repository.owner.as_str(),
            repository = repository.name.as_str(),
            pull_request = pr_number,
            revision = head.as_str(),
            state = commit_status.state.as_str(),
            "Reported quality gate as commit status"
        );

        let comment = compose_comment(
            &self.quality_gate,
            project_key,
            &pull_request,
            &url,
            &quality_gate_status,
        )
        .await
        .map_err(|e| downstream_failure("Composing comment", repository, pr_number, e))?;

        self.post_comment(repository, pr_number, &comment).await
    }

    async fn post_comment(
        &self,
        repository: &Repository,
        pr_number: u64,
        comment: &str,
    ) -> Result<(), BotError> {
        self.git_host
            .post_comment(repository, pr_number, comment)
            .await
            .map_err(|e| downstream_failure("Posting comment", repository, pr_number, e))?;

        info!(
            repository_owner = repository.owner.as_str(),
            repository = repository.name.as_str(),
            pull_request = pr_number,
            "Posted quality gate comment"
        );
        Ok(())
    }
}

fn downstream_failure(
    operation: &str,
    repository: &Repository,
    pr_number: u64,
    source: PlatformError,
) -> BotError {
    error!(
        repository_owner = repository.owner.as_str(),
        repository = repository.name.as_str(),
        pull_request = pr_number,
        operation,
        error = source.to_string(),
        "Downstream API call failed, abandoning remaining side effects"
    );
    BotError::downstream(operation, source)
}

fn log_outcome(source: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Processed(_) => info!(source, "Webhook accepted, processing data"),
        Outcome::Ignored(reason) => info!(source, reason = reason.to_string(), "Webhook ignored"),
        Outcome::Rejected(reason) => warn!(
            source,
            status = outcome.status_code(),
            reason = ?reason,
            "Webhook rejected"
        ),
    }
}
