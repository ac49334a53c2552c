//! Command parsing and dispatch.

pub mod router;

pub use router::CommandRouter;

/// A parsed `/command`, name plus whitespace-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Parse `/name[@botname] arg ...` from raw message text.
    ///
    /// Returns `None` for anything that is not a command (no leading
    /// slash, or a bare slash).
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.trim().strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let raw_name = parts.next()?;
        let name = raw_name.split_once('@').map_or(raw_name, |(name, _)| name);
        if name.is_empty() {
            return None;
        }
        Some(Command {
            name: name.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_command() {
        let command = Command::parse("/ping").unwrap();
        assert_eq!(command.name, "ping");
        assert!(command.args.is_empty());
    }

    #[test]
    fn parse_command_with_args() {
        let command = Command::parse("/moderate ca 12").unwrap();
        assert_eq!(command.name, "moderate");
        assert_eq!(command.args, vec!["ca", "12"]);
    }

    #[test]
    fn parse_strips_bot_mention() {
        let command = Command::parse("/set_chance@pairlore_bot 10").unwrap();
        assert_eq!(command.name, "set_chance");
        assert_eq!(command.args, vec!["10"]);
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse("/"), None);
        assert_eq!(Command::parse("/@bot"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let command = Command::parse("  /ping  ").unwrap();
        assert_eq!(command.name, "ping");
    }
}
