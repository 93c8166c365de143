//! Slash commands recognized outside the scripted flow.
//!
//! Commands are matched once at the entry point. Anything that is not a
//! command falls through to the conversation state machine unchanged.

/// A recognized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/history` — the user's own conversation history.
    History,
    /// `/courses` — full catalog overview.
    Courses,
    /// `/teachers` or `/teacher`.
    Teachers,
    /// `/schedule`.
    Schedule,
    /// `/enrollments` — the user's payment decisions.
    Enrollments,
    /// `/ask <text>` — store a free-text question. Text may be empty.
    Ask(String),
}

impl Command {
    /// Parse message text into a command. Matching is exact and
    /// case-sensitive apart from surrounding whitespace; a Telegram
    /// `@botname` suffix on the command word is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };
        let word = strip_bot_mention(word);

        match (word, rest.is_empty()) {
            ("/history", true) => Some(Self::History),
            ("/courses", true) => Some(Self::Courses),
            ("/teachers" | "/teacher", true) => Some(Self::Teachers),
            ("/schedule", true) => Some(Self::Schedule),
            ("/enrollments", true) => Some(Self::Enrollments),
            ("/ask", _) => Some(Self::Ask(rest.to_string())),
            _ => None,
        }
    }
}

/// `/courses@my_bot` → `/courses`.
fn strip_bot_mention(word: &str) -> &str {
    match word.split_once('@') {
        Some((command, _)) if command.starts_with('/') => command,
        _ => word,
    }
}
