//! Generated text: requests, provider seam, and local fallbacks.
//!
//! The engine treats text generation as an external, best-effort service.
//! Every [`ContentRequest`] carries a fallback that is used whenever the
//! provider errors, times out, or answers with nothing, so a generated line
//! can be late but never missing or raw-error shaped.

use async_trait::async_trait;
use serde::Serialize;

use crate::{config::HelperRole, error::ContentError, mood::MoodSignal};

/// What kind of text is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentKind {
    /// Opening line of a 1:1 chat
    Greeting,
    /// Opening question of a pulse room
    Icebreaker,
    /// Answer to a user message
    Reply,
    /// Small actionable coping habit
    CopingTip,
    /// Late-night study motivation
    Motivation,
    /// Campus-wide validation line for the dominant signal
    SharedReality,
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    /// Requested kind
    pub kind: ContentKind,
    /// Signal the conversation is about
    pub mood: MoodSignal,
    /// User text being answered ([`ContentKind::Reply`] only)
    pub user_text: Option<String>,
}

impl ContentRequest {
    /// Request without conversation context.
    pub fn new(kind: ContentKind, mood: MoodSignal) -> Self {
        Self { kind, mood, user_text: None }
    }

    /// Reply to a user message.
    pub fn reply(mood: MoodSignal, user_text: impl Into<String>) -> Self {
        Self { kind: ContentKind::Reply, mood, user_text: Some(user_text.into()) }
    }

    /// Text used when the provider fails.
    pub fn fallback(&self) -> &'static str {
        match self.kind {
            ContentKind::Greeting => "hey. you feeling this too?",
            ContentKind::Icebreaker => "What is keeping you busy today?",
            ContentKind::Reply => "yeah, same.",
            ContentKind::CopingTip => "Take a moment to close your eyes and reset.",
            ContentKind::Motivation => "Keep going. You've got this.",
            ContentKind::SharedReality => {
                "This week is marked as high academic load across campus. You are not alone."
            },
        }
    }

    /// Text used when the provider answers but without usable content.
    pub fn default_text(&self) -> &'static str {
        match self.kind {
            ContentKind::Greeting => "hey. rough day here too.",
            ContentKind::Icebreaker => "What's the one thing on your mind right now?",
            ContentKind::Reply => "yeah i feel that completely.",
            ContentKind::CopingTip => "Take a deep breath and count to ten.",
            ContentKind::Motivation => "You are doing enough. One step at a time.",
            ContentKind::SharedReality => {
                "This week is marked as high academic load across campus. You are not alone."
            },
        }
    }

    /// Prompt for language-model backed providers.
    pub fn prompt(&self) -> String {
        let label = self.mood.label;
        match self.kind {
            ContentKind::Greeting => format!(
                "Context: A 1-on-1 anonymous chat between two university students who both feel \
                 \"{label}\".\nTask: Generate ONE short opening text message from one student to \
                 the other.\nRules:\n1. Casual, lower-case, maybe a bit tired or empathetic.\n\
                 2. No formal greetings.\n3. Example: \"honestly same. is it midterms for you \
                 too?\"\n4. Max 15 words."
            ),
            ContentKind::Icebreaker => format!(
                "Context: A 5-minute anonymous group chat for students who all checked in with \
                 \"{label}\".\nTask: Generate ONE simple, non-intrusive question to start the \
                 conversation.\nRules:\n1. It should help them normalize the struggle.\n2. It \
                 should NOT be deeply emotional or clinical.\n3. Keep it light or practical.\n\
                 4. Max 15 words."
            ),
            ContentKind::Reply => format!(
                "Roleplay: You are a university student feeling \"{label}\".\nScenario: You are \
                 in an anonymous chat with another student.\nUser said: \"{}\"\nTask: Reply to \
                 the user.\nRules:\n1. Keep it short (max 1 sentence).\n2. Be empathetic, \
                 validating, and casual (lowercase).\n3. Do NOT give advice. Just relate to the \
                 struggle.\n4. If they ask how you are, say you're barely hanging on or tired.",
                self.user_text.as_deref().unwrap_or_default()
            ),
            ContentKind::CopingTip => format!(
                "You are a compassionate, non-clinical peer support assistant for university \
                 students. The student is feeling: \"{label}\". Provide ONE short, specific, \
                 immediately actionable micro-habit (under 20 words) they can do right now to \
                 feel slightly better. Do not use platitudes."
            ),
            ContentKind::Motivation => "Provide a short, gentle, and grounding motivation quote \
                 for a student studying late at night. Focus on persistence and self-compassion, \
                 not hustle culture. Max 15 words."
                .to_string(),
            ContentKind::SharedReality => format!(
                "Context: A shared-reality visualization for a university campus.\nData: The \
                 dominant academic signal today is \"{label}\".\nTask: Generate a single \
                 sentence that validates the shared experience as a systemic observation. Do \
                 NOT give advice. Max 25 words."
            ),
        }
    }
}

/// External text generator.
///
/// Implementations may fail; callers go through [`resolve_text`] so failures
/// never reach a transcript.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Generate text for the request.
    async fn generate(&self, request: &ContentRequest) -> Result<String, ContentError>;
}

/// Map a provider outcome to transcript-safe text.
///
/// Successful non-blank answers are trimmed and kept. Blank answers use the
/// request's default text; errors use its fallback.
pub fn resolve_text(request: &ContentRequest, outcome: Result<String, ContentError>) -> String {
    match outcome {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => request.default_text().to_string(),
        Err(err) => {
            tracing::warn!(%err, kind = ?request.kind, "content provider failed, using fallback");
            request.fallback().to_string()
        },
    }
}

/// Provider that never leaves the process.
///
/// Answers every request with its local default text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait]
impl ContentProvider for OfflineProvider {
    async fn generate(&self, request: &ContentRequest) -> Result<String, ContentError> {
        Ok(request.default_text().to_string())
    }
}

const VENT_REPLIES: [&str; 3] = [
    "I hear you. That sounds really tough.",
    "That's a lot to carry. I'm here.",
    "Thank you for sharing that with me.",
];

const LISTEN_REPLIES: [&str; 3] = [
    "It feels like everything is piling up at once.",
    "I just can't seem to catch up lately.",
    "Sorry, it's a lot. It helps to say it out loud.",
];

/// Helping-hand reply table. Keyed by the local user's role: a venting user
/// hears from a listener, a listening user hears from a venter.
pub fn helping_hand_replies(role: HelperRole) -> &'static [&'static str] {
    match role {
        HelperRole::Vent => &VENT_REPLIES,
        HelperRole::Listen => &LISTEN_REPLIES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodRegistry;

    fn mood() -> MoodSignal {
        MoodRegistry::campus().resolve_or_default("deadline_mode")
    }

    #[test]
    fn resolve_keeps_trimmed_text() {
        let req = ContentRequest::new(ContentKind::Greeting, mood());
        assert_eq!(resolve_text(&req, Ok("  same here \n".into())), "same here");
    }

    #[test]
    fn resolve_blank_uses_default() {
        let req = ContentRequest::new(ContentKind::Icebreaker, mood());
        assert_eq!(
            resolve_text(&req, Ok("   ".into())),
            "What's the one thing on your mind right now?"
        );
    }

    #[test]
    fn resolve_error_uses_fallback() {
        let req = ContentRequest::reply(mood(), "rough day");
        let text = resolve_text(&req, Err(ContentError::Unavailable("offline".into())));
        assert_eq!(text, "yeah, same.");
    }

    #[test]
    fn fallbacks_are_never_empty() {
        let kinds = [
            ContentKind::Greeting,
            ContentKind::Icebreaker,
            ContentKind::Reply,
            ContentKind::CopingTip,
            ContentKind::Motivation,
            ContentKind::SharedReality,
        ];
        for kind in kinds {
            let req = ContentRequest::new(kind, mood());
            assert!(!req.fallback().is_empty());
            assert!(!req.default_text().is_empty());
            assert!(!req.prompt().is_empty());
        }
    }

    #[test]
    fn reply_prompt_quotes_user_text() {
        let req = ContentRequest::reply(mood(), "rough day");
        let prompt = req.prompt();
        assert!(prompt.contains("\"rough day\""));
        assert!(prompt.contains("Deadline Mode"));
    }

    #[test]
    fn helping_hand_tables_differ_by_role() {
        assert_eq!(helping_hand_replies(HelperRole::Vent)[0], "I hear you. That sounds really tough.");
        assert_eq!(
            helping_hand_replies(HelperRole::Listen)[0],
            "It feels like everything is piling up at once."
        );
    }
}
