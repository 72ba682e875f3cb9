//! Mapping between SonarQube projects and Gitea repositories.
use gitea_sonarqube_bot_developer_platforms::models::Repository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::errors::BotError;

#[cfg(test)]
#[path = "projects_tests.rs"]
mod tests;

/// The SonarQube side of a project mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonarQubeProject {
    pub key: String,
}

/// Links a SonarQube project key to the Gitea repository it analyses.
///
/// The serialized shape is the one used in the configuration file:
///
/// ```toml
/// [[projects]]
/// sonarqube = { key = "pr-bot" }
/// gitea = { owner = "example-organization", name = "pr-bot" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMapping {
    pub sonarqube: SonarQubeProject,
    pub gitea: Repository,
}

impl ProjectMapping {
    pub fn new(sonarqube_key: &str, owner: &str, name: &str) -> Self {
        Self {
            sonarqube: SonarQubeProject {
                key: sonarqube_key.to_string(),
            },
            gitea: Repository::new(owner, name),
        }
    }

    pub fn sonarqube_key(&self) -> &str {
        &self.sonarqube.key
    }

    pub fn repository(&self) -> &Repository {
        &self.gitea
    }
}

/// Looks up project mappings by either side.
///
/// The list is small and fixed at startup, so lookups scan it in configuration
/// order and return the first match together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectResolver {
    projects: Vec<ProjectMapping>,
}

impl ProjectResolver {
    /// Validates and wraps the configured mappings.
    ///
    /// # Returns
    ///
    /// [`BotError::InvalidProjectMapping`] if the list is empty, if any key, owner or
    /// name is blank, or if a SonarQube key or Gitea repository appears twice.
    pub fn new(projects: Vec<ProjectMapping>) -> Result<Self, BotError> {
        if projects.is_empty() {
            return Err(BotError::InvalidProjectMapping(
                "at least one project mapping is required".to_string(),
            ));
        }

        let mut keys = HashSet::new();
        let mut repositories = HashSet::new();
        for (index, project) in projects.iter().enumerate() {
            if project.sonarqube.key.trim().is_empty()
                || project.gitea.owner.trim().is_empty()
                || project.gitea.name.trim().is_empty()
            {
                return Err(BotError::InvalidProjectMapping(format!(
                    "project mapping #{} has an empty SonarQube key, Gitea owner or Gitea name",
                    index
                )));
            }

            if !keys.insert(project.sonarqube.key.as_str()) {
                return Err(BotError::InvalidProjectMapping(format!(
                    "SonarQube project key '{}' is mapped more than once",
                    project.sonarqube.key
                )));
            }

            if !repositories.insert(&project.gitea) {
                return Err(BotError::InvalidProjectMapping(format!(
                    "Gitea repository '{}' is mapped more than once",
                    project.gitea
                )));
            }
        }

        debug!(count = projects.len(), "Loaded project mappings");
        Ok(Self { projects })
    }

    /// Finds the mapping for a SonarQube project key.
    pub fn by_sonarqube_key(&self, key: &str) -> Option<(usize, &ProjectMapping)> {
        self.projects
            .iter()
            .enumerate()
            .find(|(_, project)| project.sonarqube.key == key)
    }

    /// Finds the mapping for a Gitea repository.
    pub fn by_repository(&self, owner: &str, name: &str) -> Option<(usize, &ProjectMapping)> {
        self.projects
            .iter()
            .enumerate()
            .find(|(_, project)| project.gitea.owner == owner && project.gitea.name == name)
    }

    pub fn projects(&self) -> &[ProjectMapping] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
