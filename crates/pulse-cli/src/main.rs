//! Pulse terminal binary.
//!
//! # Usage
//!
//! ```bash
//! # Five-minute pulse room for students in deadline mode
//! pulse --kind group --mood deadline_mode
//!
//! # Helping hand as the listener, with generated replies
//! GEMINI_API_KEY=... pulse --kind helping-hand --role listen
//!
//! # Show the mood catalog
//! pulse --list-moods
//! ```
//!
//! Type to chat. `/exit` leaves, `/rate N` and `/skip` close the feedback
//! step. End of input (Ctrl-D) leaves without a rating.

use std::{
    io::{self, Write},
    num::NonZeroU32,
    sync::Arc,
};

use clap::{Parser, ValueEnum};
use pulse_app::{
    DEFAULT_CONTENT_TIMEOUT, DEFAULT_GEMINI_MODEL, GeminiProvider, RunReport, Runtime, SystemEnv,
};
use pulse_cli::{TerminalDriver, render};
use pulse_core::{
    ContentError, ContentKind, ContentProvider, ContentRequest, EndReason, HelperRole,
    MoodRegistry, OfflineProvider, SessionConfig, SessionKind, format_remaining, resolve_text,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const SECS_PER_MINUTE: NonZeroU32 = NonZeroU32::MIN.saturating_add(59);

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    /// Timed anonymous group room
    Group,
    /// Untimed private chat with one peer
    OneOnOne,
    /// Timed vent/listen pairing
    HelpingHand,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Role {
    /// Share what is on your mind
    Vent,
    /// Lend an ear
    Listen,
}

/// Pulse: ephemeral, anonymous, mood-matched chat
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(about = "Ephemeral mood-matched chat sessions for students")]
#[command(version)]
struct Args {
    /// Session shape
    #[arg(short, long, value_enum, default_value = "group")]
    kind: Kind,

    /// Mood signal id (unknown ids fall back to the default signal)
    #[arg(short, long, default_value = "heavy_load")]
    mood: String,

    /// Helping-hand role
    #[arg(short, long, value_enum, default_value = "vent")]
    role: Role,

    /// Override the session length in minutes (timed kinds only)
    #[arg(long)]
    minutes: Option<NonZeroU32>,

    /// Gemini API key; without one, replies come from local phrase tables
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    model: String,

    /// Print the mood catalog and exit
    #[arg(long)]
    list_moods: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn session_kind(&self) -> SessionKind {
        match (self.kind, self.role) {
            (Kind::Group, _) => SessionKind::Group,
            (Kind::OneOnOne, _) => SessionKind::OneOnOne,
            (Kind::HelpingHand, Role::Vent) => SessionKind::HelpingHand(HelperRole::Vent),
            (Kind::HelpingHand, Role::Listen) => SessionKind::HelpingHand(HelperRole::Listen),
        }
    }

    fn session_config(&self) -> SessionConfig {
        let config = SessionConfig::new(self.session_kind(), self.mood.clone());
        match self.minutes {
            Some(minutes) if config.duration.is_some() => {
                config.with_duration(Some(minutes.saturating_mul(SECS_PER_MINUTE)))
            },
            Some(_) => {
                tracing::warn!("--minutes ignored for untimed sessions");
                config
            },
            None => config,
        }
    }

    fn provider(&self) -> Arc<dyn ContentProvider> {
        match self.gemini_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                tracing::info!(model = %self.model, "using gemini provider");
                Arc::new(GeminiProvider::new(key).with_model(self.model.clone()))
            },
            _ => Arc::new(OfflineProvider),
        }
    }
}

async fn generate(provider: &dyn ContentProvider, request: ContentRequest) -> String {
    let outcome =
        match tokio::time::timeout(DEFAULT_CONTENT_TIMEOUT, provider.generate(&request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ContentError::Timeout(DEFAULT_CONTENT_TIMEOUT)),
        };
    resolve_text(&request, outcome)
}

async fn list_moods(registry: &MoodRegistry, provider: &dyn ContentProvider) -> io::Result<()> {
    let shared =
        generate(provider, ContentRequest::new(ContentKind::SharedReality, registry.dominant()))
            .await;

    let mut out = io::stdout().lock();
    for line in render::mood_table(registry) {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "\n{shared}")
}

fn report(report: &RunReport, tip: &str) -> io::Result<()> {
    let RunReport { summary, delta } = report;
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} ended ({:?}) after {} connected, {} messages.",
        summary.kind,
        summary.reason,
        format_remaining(summary.connected_secs),
        summary.message_count
    )?;
    if let Some(rating) = summary.rating {
        writeln!(out, "You rated your listener {rating}/5.")?;
    }
    writeln!(
        out,
        "+{} focus minutes, +{} community points.",
        delta.focus_minutes, delta.community_points
    )?;
    writeln!(out, "Before you go: {tip}")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Transcript owns stdout
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let registry = MoodRegistry::campus();
    let provider = args.provider();

    if args.list_moods {
        list_moods(&registry, provider.as_ref()).await?;
        return Ok(());
    }

    let config = args.session_config();
    let mood =
        registry.lookup(&config.mood_id).copied().unwrap_or_else(|_| registry.default_signal());
    tracing::info!(kind = %config.kind, mood = mood.id, "starting session");

    let runtime = Runtime::new(TerminalDriver::stdio()?, SystemEnv::new(), config, &registry)
        .with_provider(Arc::clone(&provider));
    let run = runtime.run().await?;

    // Full sessions close on encouragement, early exits on something practical
    let closing = match run.summary.reason {
        EndReason::Expired => ContentKind::Motivation,
        EndReason::UserExit | EndReason::AbandonedWhileSearching => ContentKind::CopingTip,
    };
    let tip = generate(provider.as_ref(), ContentRequest::new(closing, mood)).await;
    report(&run, &tip)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_minutes_is_rejected() {
        let err = Args::try_parse_from(["pulse", "--kind", "group", "--minutes", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn minutes_override_timed_sessions() {
        let args =
            Args::try_parse_from(["pulse", "--kind", "helping-hand", "--minutes", "2"]).unwrap();
        let config = args.session_config();
        assert_eq!(config.duration.map(NonZeroU32::get), Some(120));
    }

    #[test]
    fn minutes_leave_one_on_one_untimed() {
        let args =
            Args::try_parse_from(["pulse", "--kind", "one-on-one", "--minutes", "3"]).unwrap();
        assert_eq!(args.session_config().duration, None);
    }

    #[test]
    fn defaults_to_group_room() {
        let args = Args::try_parse_from(["pulse"]).unwrap();
        assert_eq!(args.session_config().duration.map(NonZeroU32::get), Some(300));
    }
}
