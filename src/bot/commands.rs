//! Text command parsing.

use crate::config::{CommandSpec, Config};

/// What an incoming text message asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum BotCommand<'a> {
    Hello,
    Help,
    /// A command from the configured table.
    Run(&'a CommandSpec),
    /// Slash command that matches nothing; holds the name as typed.
    Unknown(String),
    /// Not a slash command at all.
    NotACommand,
}

/// Parse `text` against the configured command table.
///
/// Only the first word matters; anything after it is ignored, so user text
/// never reaches the command line.
pub fn parse_command<'a>(text: &str, config: &'a Config) -> BotCommand<'a> {
    let Some(rest) = text.trim().strip_prefix('/') else {
        return BotCommand::NotACommand;
    };
    let word = rest.split_whitespace().next().unwrap_or("");
    // Group chats address bots as `/cmd@botname`.
    let name = word.split('@').next().unwrap_or(word);

    match name {
        "hello" => BotCommand::Hello,
        "help" | "start" => BotCommand::Help,
        other => match config.command(other) {
            Some(spec) => BotCommand::Run(spec),
            None => BotCommand::Unknown(other.to_string()),
        },
    }
}

/// List of available commands.
pub fn help_text(config: &Config) -> String {
    let mut text = String::from("Available commands:\n/hello - greeting and bot configuration\n");
    for command in &config.commands {
        match &command.description {
            Some(description) => text.push_str(&format!("/{} - {}\n", command.name, description)),
            None => {
                let line = std::iter::once(command.program.as_str())
                    .chain(command.args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                text.push_str(&format!("/{} - runs `{}`\n", command.name, line));
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        toml::from_str(
            r#"
bot_token = "t"
[[commands]]
name = "uptime"
program = "uptime"
description = "Show uptime"
[[commands]]
name = "disk"
program = "df"
args = ["-h"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_builtin_commands() {
        let config = config();
        assert_eq!(parse_command("/hello", &config), BotCommand::Hello);
        assert_eq!(parse_command("/help", &config), BotCommand::Help);
        assert_eq!(parse_command("/start", &config), BotCommand::Help);
    }

    #[test]
    fn parses_configured_command_with_bot_mention() {
        let config = config();
        match parse_command("/uptime@relay_bot", &config) {
            BotCommand::Run(spec) => assert_eq!(spec.program, "uptime"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn trailing_words_are_ignored() {
        let config = config();
        match parse_command("/disk; rm -rf /", &config) {
            BotCommand::Unknown(name) => assert_eq!(name, "disk;"),
            other => panic!("unexpected: {other:?}"),
        }
        match parse_command("/disk /etc", &config) {
            BotCommand::Run(spec) => assert_eq!(spec.args, vec!["-h"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_and_plain_text() {
        let config = config();
        assert_eq!(
            parse_command("/reboot", &config),
            BotCommand::Unknown("reboot".to_string())
        );
        assert_eq!(parse_command("hi there", &config), BotCommand::NotACommand);
    }

    #[test]
    fn help_lists_commands() {
        let help = help_text(&config());
        assert!(help.contains("/uptime - Show uptime"));
        assert!(help.contains("/disk - runs `df -h`"));
    }
}
