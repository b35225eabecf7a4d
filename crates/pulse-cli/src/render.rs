//! Line formatting for the terminal front end.
//!
//! Pure functions from session state to display lines, so the exact text is
//! testable without a terminal.

use std::{ops::Sub, time::Duration};

use pulse_app::UserCommand;
use pulse_core::{
    ContentKind, HelperRole, Message, MoodRegistry, SenderRole, Session, SessionAction,
    SessionError, SessionState, Timer, feedback_prompt, format_remaining, is_low_time,
};

/// Countdown values announced outside the last minute.
const ANNOUNCE_EVERY_SECS: u32 = 60;

/// Countdown values announced inside the last minute.
const LOW_TIME_EVERY_SECS: u32 = 10;

/// Display line for one session action, if it has one.
pub fn action_line<I>(session: &Session<I>, action: &SessionAction) -> Option<String>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    match action {
        SessionAction::StateChanged { to, .. } => state_line(session, *to),
        SessionAction::MessageAppended(message) => Some(message_line(message)),
        SessionAction::RemainingChanged { remaining } => countdown_line(*remaining),
        SessionAction::Generate { request, .. }
            if matches!(request.kind, ContentKind::Greeting | ContentKind::Reply) =>
        {
            typing_line(session)
        },
        SessionAction::Schedule { timer: Timer::Reply(_), .. } => typing_line(session),
        SessionAction::Generate { .. }
        | SessionAction::Schedule { .. }
        | SessionAction::FindMatch { .. }
        | SessionAction::Completed(_) => None,
    }
}

fn state_line<I>(session: &Session<I>, to: SessionState) -> Option<String>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    let mood = session.mood();
    match to {
        SessionState::Searching => {
            Some(format!("Looking for students feeling {} {}...", mood.icon, mood.label))
        },
        SessionState::Feedback => {
            let role = session.kind().role()?;
            let hint = match role {
                HelperRole::Vent => "/rate 1-5 or /skip",
                HelperRole::Listen => "/skip to close",
            };
            Some(format!("{} ({hint})", feedback_prompt(role)))
        },
        SessionState::Ended => Some("Session closed. Nothing from this chat was kept.".into()),
        SessionState::Idle | SessionState::Connected => None,
    }
}

/// Display line for a transcript message.
pub fn message_line(message: &Message) -> String {
    match message.sender {
        SenderRole::System => format!("* {}", message.text),
        SenderRole::User => format!("you: {}", message.text),
        SenderRole::Peer => match &message.author {
            Some(peer) => format!("{} {}: {}", peer.display_icon, peer.display_label, message.text),
            // Unattributed room prompts
            None => format!("~ {}", message.text),
        },
    }
}

/// Countdown line, announced on whole minutes and more often near the end.
pub fn countdown_line(remaining: u32) -> Option<String> {
    if remaining == 0 {
        return None;
    }
    if is_low_time(remaining) {
        (remaining % LOW_TIME_EVERY_SECS == 0 || remaining <= 3)
            .then(|| format!("[{} left!]", format_remaining(remaining)))
    } else {
        (remaining % ANNOUNCE_EVERY_SECS == 0)
            .then(|| format!("[{} left]", format_remaining(remaining)))
    }
}

fn typing_line<I>(session: &Session<I>) -> Option<String>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    let peer = session.peer()?;
    session.is_peer_typing().then(|| format!("{} is typing...", peer.display_label))
}

/// Display line for a rejected command.
pub fn reject_line(command: &UserCommand, error: &SessionError) -> String {
    match (command, error) {
        (UserCommand::Send(_), SessionError::InvalidState { state: SessionState::Searching, .. }) => {
            "! still matching, hold on a moment".into()
        },
        (UserCommand::Send(_), SessionError::InvalidState { state: SessionState::Feedback, .. }) => {
            "! chat is closed; /rate 1-5 or /skip".into()
        },
        _ => format!("! {error}"),
    }
}

/// Catalog listing with the campus-wide dominant signal marked.
pub fn mood_table(registry: &MoodRegistry) -> Vec<String> {
    let dominant = registry.dominant().id;
    registry
        .iter()
        .map(|signal| {
            let marker = if signal.id == dominant { " <- most reported" } else { "" };
            format!(
                "{} {:<14} {:<20} {:>4} reports{marker}",
                signal.icon, signal.id, signal.label, signal.report_count
            )
        })
        .collect()
}
