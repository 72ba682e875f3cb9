//! Tests for the collaborator traits.
//!
//! The reconciliation engine shares providers between concurrently running
//! request tasks, so the traits must be usable as `Send + Sync` trait objects.

use crate::errors::Error;
use crate::models::{
    CommitState, CommitStatus, MeasuresResponse, QualityGatePullRequest,
    QualityGatePullRequestStatus, Repository,
};
use crate::{GitHostProvider, QualityGateProvider};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RecordingGitHost {
    statuses: Mutex<Vec<(String, CommitState)>>,
}

#[async_trait]
impl GitHostProvider for RecordingGitHost {
    async fn update_commit_status(
        &self,
        _repo: &Repository,
        revision: &str,
        status: &CommitStatus,
    ) -> Result<(), Error> {
        self.statuses
            .lock()
            .unwrap()
            .push((revision.to_string(), status.state));
        Ok(())
    }

    async fn post_comment(
        &self,
        _repo: &Repository,
        _issue_number: u64,
        _body: &str,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn determine_head_commit(
        &self,
        _repo: &Repository,
        pr_number: u64,
    ) -> Result<String, Error> {
        Ok(format!("sha-{}", pr_number))
    }
}

#[derive(Debug)]
struct StaticQualityGate;

#[async_trait]
impl QualityGateProvider for StaticQualityGate {
    async fn get_measures(
        &self,
        _project_key: &str,
        _pull_request: &str,
    ) -> Result<MeasuresResponse, Error> {
        Ok(MeasuresResponse::default())
    }

    async fn get_pull_request(
        &self,
        _project_key: &str,
        pull_request: &str,
    ) -> Result<QualityGatePullRequest, Error> {
        Ok(QualityGatePullRequest {
            key: pull_request.to_string(),
            status: QualityGatePullRequestStatus {
                quality_gate_status: "OK".to_string(),
            },
        })
    }

    fn pull_request_url(&self, project_key: &str, pull_request: &str) -> String {
        format!("https://sonarqube.example.com/dashboard?id={project_key}&pullRequest={pull_request}")
    }
}

#[tokio::test]
async fn test_git_host_provider_shared_across_tasks() {
    let git_host = Arc::new(RecordingGitHost::default());
    let repo = Repository::new("owner", "repo");

    let mut handles = Vec::new();
    for pr in 1..=3u64 {
        let provider: Arc<dyn GitHostProvider> = git_host.clone();
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            let head = provider.determine_head_commit(&repo, pr).await?;
            provider
                .update_commit_status(
                    &repo,
                    &head,
                    &CommitStatus {
                        target_url: String::new(),
                        description: "Analysis pending...".to_string(),
                        state: CommitState::Pending,
                    },
                )
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut statuses = git_host.statuses.lock().unwrap().clone();
    statuses.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        statuses,
        vec![
            ("sha-1".to_string(), CommitState::Pending),
            ("sha-2".to_string(), CommitState::Pending),
            ("sha-3".to_string(), CommitState::Pending),
        ]
    );
}

#[tokio::test]
async fn test_quality_gate_provider_as_trait_object() {
    let provider: Box<dyn QualityGateProvider> = Box::new(StaticQualityGate);

    let pr = provider.get_pull_request("pr-bot", "PR-7").await.unwrap();

    assert_eq!(pr.key, "PR-7");
    assert_eq!(
        provider.pull_request_url("pr-bot", "PR-7"),
        "https://sonarqube.example.com/dashboard?id=pr-bot&pullRequest=PR-7"
    );
}
