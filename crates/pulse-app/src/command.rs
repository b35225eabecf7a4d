//! User commands a frontend feeds into the runtime.

/// Commands from the person using the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Send a chat message
    Send(String),
    /// Leave the session
    Exit,
    /// Close the helping-hand feedback step, optionally with a 1..=5 rating
    Feedback(Option<u8>),
}

impl UserCommand {
    /// Parse one line of line-oriented input.
    ///
    /// `/exit` and `/quit` leave, `/rate N` rates, `/skip` closes feedback
    /// without a rating. Anything else is a chat message. Returns `None` for
    /// blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some("/exit" | "/quit") => Self::Exit,
            Some("/skip") => Self::Feedback(None),
            // Unparseable ratings become 0 so the session reports them as
            // out of range instead of silently chatting "/rate x"
            Some("/rate") => Self::Feedback(Some(
                words.next().and_then(|n| n.parse::<u8>().ok()).unwrap_or(0),
            )),
            _ => Self::Send(line.to_string()),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(UserCommand::parse("/exit"), Some(UserCommand::Exit));
        assert_eq!(UserCommand::parse("  /quit "), Some(UserCommand::Exit));
        assert_eq!(UserCommand::parse("/rate 4"), Some(UserCommand::Feedback(Some(4))));
        assert_eq!(UserCommand::parse("/rate four"), Some(UserCommand::Feedback(Some(0))));
        assert_eq!(UserCommand::parse("/skip"), Some(UserCommand::Feedback(None)));
    }

    #[test]
    fn everything_else_is_chat() {
        assert_eq!(UserCommand::parse(" rough day "), Some(UserCommand::Send("rough day".into())));
        assert_eq!(UserCommand::parse("/shrug"), Some(UserCommand::Send("/shrug".into())));
        assert_eq!(UserCommand::parse("   "), None);
    }

    proptest::proptest! {
        #[test]
        fn plain_lines_are_trimmed_chat(line in "[a-z][a-z ,.!?]{0,40}") {
            let parsed = UserCommand::parse(&format!("  {line}\t"));
            proptest::prop_assert_eq!(parsed, Some(UserCommand::Send(line.trim().to_string())));
        }

        #[test]
        fn any_rating_word_is_feedback(word in "\\S{1,6}") {
            let parsed = UserCommand::parse(&format!("/rate {word}"));
            proptest::prop_assert!(matches!(parsed, Some(UserCommand::Feedback(Some(_)))));
        }
    }
}
