//! Bot commands posted as pull request comments.
use std::fmt;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Every bot command starts with this prefix.
pub const COMMAND_PREFIX: &str = "/sq-bot";

/// Asks the bot to re-report the current quality gate of a pull request.
pub const REVIEW_COMMAND: &str = "/sq-bot review";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Review,
}

impl BotCommand {
    pub const ALL: [BotCommand; 1] = [BotCommand::Review];

    pub fn as_str(&self) -> &'static str {
        match self {
            BotCommand::Review => REVIEW_COMMAND,
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a comment body relates to the bot's commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClassification {
    /// The comment is addressed to humans
    NotABotCommand,

    /// The comment starts with the bot prefix but names no known command
    UnknownBotCommand,

    Recognized(BotCommand),
}

/// Classifies a comment body.
///
/// Only a body that starts with [`COMMAND_PREFIX`] is addressed to the bot, and a
/// command is only recognized when the body equals it exactly.
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_core::commands::{classify, BotCommand, CommandClassification};
///
/// assert_eq!(classify("/sq-bot review"), CommandClassification::Recognized(BotCommand::Review));
/// assert_eq!(classify("/sq-bot rebase"), CommandClassification::UnknownBotCommand);
/// assert_eq!(classify("LGTM"), CommandClassification::NotABotCommand);
/// ```
pub fn classify(body: &str) -> CommandClassification {
    if !body.starts_with(COMMAND_PREFIX) {
        return CommandClassification::NotABotCommand;
    }

    BotCommand::ALL
        .iter()
        .find(|command| command.as_str() == body)
        .map(|command| CommandClassification::Recognized(*command))
        .unwrap_or(CommandClassification::UnknownBotCommand)
}
