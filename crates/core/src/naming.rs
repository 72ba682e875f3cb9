//! Translation between Gitea pull request indexes and SonarQube branch names.
use regex::Regex;
use thiserror::Error;

use crate::config::{
    DEFAULT_BRANCH_PATTERN, DEFAULT_BRANCH_REGEX, DEFAULT_BRANCH_TEMPLATE, INDEX_PLACEHOLDER,
};
use crate::errors::BotError;

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;

/// Index used to prove that a pattern and its template agree with each other.
const ROUND_TRIP_SAMPLE: u64 = 1337;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BranchNameError {
    #[error("branch name '{name}' does not match regex '{regex}'")]
    NoMatch { name: String, regex: String },

    #[error("branch name '{name}' captured '{captured}' which is not a pull request index")]
    NotAnIndex { name: String, captured: String },
}

/// A regex with exactly one capture group paired with a template containing
/// exactly one `%d` placeholder.
///
/// Construction guarantees that `parse(format(n)) == n`, so a SonarQube branch
/// name produced by the bot can always be mapped back to its pull request.
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_core::naming::NamingPattern;
///
/// let naming = NamingPattern::new(r"^pull-(\d+)$", "pull-%d").unwrap();
///
/// assert_eq!(naming.format(42), "pull-42");
/// assert_eq!(naming.parse("pull-42"), Ok(42));
/// assert!(naming.parse("main").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct NamingPattern {
    regex: Regex,
    template: String,
}

impl NamingPattern {
    /// Compiles and validates a naming pattern.
    ///
    /// # Returns
    ///
    /// [`BotError::InvalidNamingPattern`] if the regex does not compile, does not
    /// have exactly one capture group, the template does not contain exactly one
    /// `%d`, or the pair does not round trip.
    pub fn new(regex: &str, template: &str) -> Result<Self, BotError> {
        let compiled = Regex::new(regex).map_err(|e| {
            BotError::InvalidNamingPattern(format!("regex '{}' does not compile: {}", regex, e))
        })?;

        // captures_len includes the implicit whole-match group
        if compiled.captures_len() != 2 {
            return Err(BotError::InvalidNamingPattern(format!(
                "regex '{}' must contain exactly one capture group, found {}",
                regex,
                compiled.captures_len() - 1
            )));
        }

        let placeholders = template.matches(INDEX_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(BotError::InvalidNamingPattern(format!(
                "template '{}' must contain exactly one '{}' placeholder, found {}",
                template, INDEX_PLACEHOLDER, placeholders
            )));
        }

        let pattern = Self {
            regex: compiled,
            template: template.to_string(),
        };

        let sample = pattern.format(ROUND_TRIP_SAMPLE);
        match pattern.parse(&sample) {
            Ok(ROUND_TRIP_SAMPLE) => Ok(pattern),
            Ok(other) => Err(BotError::InvalidNamingPattern(format!(
                "template '{}' produced '{}' which regex '{}' parses as {} instead of {}",
                template, sample, regex, other, ROUND_TRIP_SAMPLE
            ))),
            Err(e) => Err(BotError::InvalidNamingPattern(format!(
                "template '{}' does not round trip: {}",
                template, e
            ))),
        }
    }

    /// Extracts the pull request index from a SonarQube branch name.
    ///
    /// The regex has to match the whole name.
    pub fn parse(&self, branch_name: &str) -> Result<u64, BranchNameError> {
        let no_match = || BranchNameError::NoMatch {
            name: branch_name.to_string(),
            regex: self.regex.as_str().to_string(),
        };

        let captures = self.regex.captures(branch_name).ok_or_else(no_match)?;

        let whole = captures.get(0).ok_or_else(no_match)?;
        if whole.start() != 0 || whole.end() != branch_name.len() {
            return Err(no_match());
        }

        let captured = captures.get(1).ok_or_else(no_match)?.as_str();
        captured
            .parse::<u64>()
            .map_err(|_| BranchNameError::NotAnIndex {
                name: branch_name.to_string(),
                captured: captured.to_string(),
            })
    }

    /// Produces the SonarQube branch name for a pull request index.
    pub fn format(&self, index: u64) -> String {
        self.template
            .replacen(INDEX_PLACEHOLDER, &index.to_string(), 1)
    }

    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Default for NamingPattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_BRANCH_PATTERN.clone(),
            template: DEFAULT_BRANCH_TEMPLATE.to_string(),
        }
    }
}

impl PartialEq for NamingPattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.template == other.template
    }
}

impl Eq for NamingPattern {}

/// Returns the default regex source, for configuration defaults.
pub fn default_regex() -> String {
    DEFAULT_BRANCH_REGEX.to_string()
}

/// Returns the default template, for configuration defaults.
pub fn default_template() -> String {
    DEFAULT_BRANCH_TEMPLATE.to_string()
}
