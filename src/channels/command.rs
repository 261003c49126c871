//! Parse terminal input into survey commands.

use crate::survey::Choice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `1` or `2`.
    Select(Choice),
    /// Empty line or `next`.
    Continue,
    Refresh,
    Help,
    Quit,
    /// Anything else, kept verbatim for free-text prompts.
    Text(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "next" | "n" | "continue" => Command::Continue,
            "1" => Command::Select(Choice::Option1),
            "2" => Command::Select(Choice::Option2),
            "refresh" | "r" => Command::Refresh,
            "help" | "?" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Text(trimmed.to_string()),
        }
    }

    /// `y`/`yes` and `n`/`no`, case-insensitive.
    pub fn parse_confirm(line: &str) -> Option<bool> {
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(true),
            "n" | "no" => Some(false),
            _ => None,
        }
    }
}

pub const HELP: &str = "Commands:\n  \
    1 / 2     choose paragraph (or profile) 1 or 2\n  \
    Enter     continue to the next page\n  \
    refresh   regenerate the personalized paragraphs on this page\n  \
    /quit     leave the survey";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        assert_eq!(CommandParser::parse("1"), Command::Select(Choice::Option1));
        assert_eq!(CommandParser::parse(" 2 "), Command::Select(Choice::Option2));
    }

    #[test]
    fn test_continue_variants() {
        assert_eq!(CommandParser::parse(""), Command::Continue);
        assert_eq!(CommandParser::parse("   "), Command::Continue);
        assert_eq!(CommandParser::parse("Next"), Command::Continue);
    }

    #[test]
    fn test_refresh_and_quit() {
        assert_eq!(CommandParser::parse("REFRESH"), Command::Refresh);
        assert_eq!(CommandParser::parse("/quit"), Command::Quit);
    }

    #[test]
    fn test_free_text_kept() {
        assert_eq!(
            CommandParser::parse("  I like examples "),
            Command::Text("I like examples".into())
        );
        assert_eq!(CommandParser::parse("3"), Command::Text("3".into()));
    }

    #[test]
    fn test_confirm() {
        assert_eq!(CommandParser::parse_confirm("Y"), Some(true));
        assert_eq!(CommandParser::parse_confirm("no"), Some(false));
        assert_eq!(CommandParser::parse_confirm("maybe"), None);
    }
}
