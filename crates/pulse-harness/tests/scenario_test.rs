//! End-to-end session scenarios in virtual time.
//!
//! Every scenario runs with the standard invariant registry attached, so
//! each simulated step is also checked against the session invariants.

use std::time::Duration;

use pulse_core::{
    EndReason, HelperRole, MatchingConfig, SenderRole, SessionAction, SessionConfig,
    SessionError, SessionEvent, SessionState, UserStats,
};
use pulse_harness::{InvariantRegistry, Script, ScriptedProvider, SimSession};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn sim(config: SessionConfig, seed: u64) -> SimSession {
    SimSession::new(config, seed).with_invariants(InvariantRegistry::standard())
}

fn connect(sim: &mut SimSession) {
    sim.start().unwrap();
    assert!(
        sim.advance_until(secs(4), |s| s.state() == SessionState::Connected),
        "match did not resolve in time"
    );
}

fn peer_texts(sim: &SimSession) -> Vec<String> {
    sim.session().transcript().by_role(SenderRole::Peer).map(|m| m.text.clone()).collect()
}

#[test]
fn group_room_announces_peer_count_before_chatter() {
    let mut sim = sim(SessionConfig::group("deadline_mode"), 7);
    sim.start().unwrap();

    // Discovery takes at least two seconds
    sim.advance(millis(1_900));
    assert_eq!(sim.session().state(), SessionState::Searching);
    assert_eq!(sim.session().peer_count(), 0);

    sim.advance(millis(1_100));
    let session = sim.session();
    assert_eq!(session.state(), SessionState::Connected);
    assert!((3..=6).contains(&session.peer_count()));

    let first = &session.transcript().history()[0];
    assert_eq!(first.sender, SenderRole::System);
    assert_eq!(
        first.text,
        format!("You are connected with {} peers feeling \"Deadline Mode\".", session.peer_count())
    );

    sim.advance(secs(60));
    let history = sim.session().transcript().history();
    assert!(history.iter().skip(1).all(|m| m.sender != SenderRole::System));
}

#[test]
fn one_on_one_reply_survives_provider_failure() {
    let mut sim = sim(SessionConfig::one_on_one("resetting"), 11)
        .with_provider(ScriptedProvider::failing());
    connect(&mut sim);

    // Greeting lands after the typing pause, as its fallback
    sim.advance(secs(2));
    assert_eq!(peer_texts(&sim), vec!["hey. you feeling this too?"]);

    sim.send("rough day").unwrap();
    let before = sim.session().transcript().len();
    assert!(sim.session().is_peer_typing());

    sim.advance(millis(1_400));
    assert_eq!(sim.session().transcript().len(), before);

    sim.advance(millis(2_100));
    let history = sim.session().transcript().history();
    assert_eq!(history.len(), before + 1);
    let reply = &history[before];
    assert_eq!(reply.sender, SenderRole::Peer);
    assert_eq!(reply.text, "yeah, same.");
    assert!(!sim.session().is_peer_typing());
}

#[test]
fn helping_hand_vent_expires_into_feedback() {
    let mut sim = sim(SessionConfig::helping_hand(HelperRole::Vent, "heavy_load"), 3);
    connect(&mut sim);
    assert_eq!(sim.session().peer().unwrap().display_label, "Anonymous Listener");

    sim.advance(secs(600));
    assert_eq!(sim.session().state(), SessionState::Feedback);
    assert_eq!(sim.remaining_history().first(), Some(&600));
    assert_eq!(sim.remaining_history().last(), Some(&0));
    assert!(sim.summaries().is_empty());

    sim.submit_feedback(Some(4)).unwrap();
    assert_eq!(sim.session().state(), SessionState::Ended);

    let summary = &sim.summaries()[0];
    assert_eq!(summary.rating, Some(4));
    assert_eq!(summary.reason, EndReason::Expired);
    assert_eq!(summary.connected_secs, 600);
    assert_eq!(sim.stats(), UserStats {
        focus_minutes: 10,
        sessions_completed: 1,
        community_points: 20
    });
}

#[test]
fn exit_before_match_discards_late_match() {
    let mut sim = sim(SessionConfig::one_on_one("catching_up"), 5);
    sim.start().unwrap();
    sim.advance(secs(1));

    sim.exit();
    assert_eq!(sim.session().state(), SessionState::Ended);
    assert_eq!(sim.queued(), 1);

    sim.advance(secs(5));
    assert_eq!(sim.queued(), 0);
    assert_eq!(sim.session().state(), SessionState::Ended);
    assert!(sim.session().peer().is_none());
    assert!(sim.session().transcript().is_empty());
    assert_eq!(sim.summaries().len(), 1);
    assert_eq!(sim.summaries()[0].reason, EndReason::AbandonedWhileSearching);
}

#[test]
fn unknown_mood_still_connects() {
    let mut sim = sim(SessionConfig::group("definitely_not_a_mood"), 1);
    connect(&mut sim);
    assert_eq!(sim.session().mood().id, "heavy_load");
    assert!(sim.session().transcript().history()[0].text.contains("Heavy Academic Load"));
}

#[test]
fn group_room_expires_after_five_minutes() {
    let mut sim = sim(SessionConfig::group("steady_pace"), 21);
    connect(&mut sim);

    sim.advance(secs(299));
    assert_eq!(sim.session().state(), SessionState::Connected);

    sim.advance(secs(2));
    assert_eq!(sim.session().state(), SessionState::Ended);
    assert_eq!(sim.remaining_history().len(), 301);
    assert_eq!(sim.summaries()[0].reason, EndReason::Expired);
    assert_eq!(sim.stats().community_points, 15);
}

#[test]
fn certain_chatter_fires_every_interval() {
    let matching = MatchingConfig { chatter_probability: 1.0, ..MatchingConfig::default() };
    let mut sim = sim(SessionConfig::group("collaborating").with_matching(matching), 9);
    connect(&mut sim);

    sim.advance(secs(21));
    let chatter = sim
        .session()
        .transcript()
        .by_role(SenderRole::Peer)
        .filter(|m| m.author.is_some())
        .count();
    assert_eq!(chatter, 4);

    // Every chatter author is a member of the room
    let roster = sim.session().roster().to_vec();
    for message in sim.session().transcript().by_role(SenderRole::Peer) {
        if let Some(author) = &message.author {
            assert!(roster.contains(author));
        }
    }
}

#[test]
fn silent_room_never_chatters() {
    let matching = MatchingConfig { chatter_probability: 0.0, ..MatchingConfig::default() };
    let mut sim = sim(SessionConfig::group("collaborating").with_matching(matching), 9);
    connect(&mut sim);
    sim.advance(secs(120));

    // Only the icebreaker speaks
    assert_eq!(peer_texts(&sim), vec!["What's the one thing on your mind right now?"]);
}

#[test]
fn blank_provider_answer_uses_default_text() {
    let mut sim = sim(SessionConfig::one_on_one("resetting"), 4)
        .with_provider(ScriptedProvider::new(Script::Blank));
    connect(&mut sim);
    sim.advance(secs(2));
    assert_eq!(peer_texts(&sim), vec!["hey. rough day here too."]);
}

#[test]
fn slow_provider_times_out_to_fallback() {
    let provider = ScriptedProvider::new(Script::Fixed("too late".into())).with_latency(secs(30));
    let mut sim = sim(SessionConfig::one_on_one("resetting"), 4).with_provider(provider);
    connect(&mut sim);

    // Greeting pause plus the full content timeout
    sim.advance(secs(8));
    assert!(peer_texts(&sim).is_empty());
    sim.advance(secs(2));
    assert_eq!(peer_texts(&sim), vec!["hey. you feeling this too?"]);
}

#[test]
fn one_on_one_runs_until_exit() {
    let mut sim = sim(SessionConfig::one_on_one("resetting"), 8);
    connect(&mut sim);
    assert_eq!(sim.session().remaining_seconds(), None);

    sim.advance(secs(3_600));
    assert_eq!(sim.session().state(), SessionState::Connected);

    sim.exit();
    let summary = &sim.summaries()[0];
    assert_eq!(summary.reason, EndReason::UserExit);
    assert!(summary.connected_secs >= 3_600);
}

#[test]
fn ended_session_rejects_messages_and_stays_frozen() {
    let mut sim = sim(SessionConfig::group("resetting"), 2);
    connect(&mut sim);
    sim.exit();
    let len = sim.session().transcript().len();

    assert_eq!(sim.send("anyone?"), Err(SessionError::Closed));
    sim.advance(secs(30));
    assert_eq!(sim.session().transcript().len(), len);
    assert_eq!(sim.queued(), 0);
}

#[test]
fn duplicate_match_after_connect_is_discarded() {
    let mut sim = sim(SessionConfig::group("resetting"), 2);
    connect(&mut sim);
    let roster = sim.session().roster().to_vec();

    let extra = sim.session().roster().first().cloned().unwrap();
    sim.inject(SessionEvent::MatchResolved(pulse_core::MatchResult::Single(extra)));
    assert_eq!(sim.session().roster(), roster.as_slice());
}

#[test]
fn same_seed_replays_exactly() {
    let run = |seed| {
        let mut sim = sim(SessionConfig::group("deadline_mode"), seed);
        connect(&mut sim);
        sim.advance(secs(90));
        sim.send("library is full again").unwrap();
        sim.advance(secs(30));
        sim.exit();
        sim.actions().to_vec()
    };

    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn helping_hand_listen_transcript() {
    let mut sim = sim(SessionConfig::helping_hand(HelperRole::Listen, "heavy_load"), 6);
    connect(&mut sim);
    sim.advance(secs(601));
    assert_eq!(sim.session().state(), SessionState::Feedback);
    sim.submit_feedback(Some(5)).unwrap();

    let lines: Vec<String> = sim
        .session()
        .transcript()
        .history()
        .iter()
        .map(|m| format!("{:?}: {}", m.sender, m.text))
        .collect();
    insta::assert_snapshot!(lines.join("\n"), @r"
    System: Session started. Waiting for them to share...
    System: Time's up. This session has ended.
    ");

    // Listener ratings are not recorded
    assert_eq!(sim.summaries()[0].rating, None);
    assert!(matches!(sim.actions().last(), Some(SessionAction::Completed(_))));
}

#[test]
fn listener_exit_snapshot() {
    let mut sim = sim(SessionConfig::helping_hand(HelperRole::Listen, "resetting"), 30);
    connect(&mut sim);
    sim.exit();
    assert_eq!(sim.session().state(), SessionState::Feedback);
    sim.submit_feedback(None).unwrap();

    insta::assert_json_snapshot!(sim.snapshot(), @r#"
    {
      "state": "Ended",
      "kind": {
        "HelpingHand": "Listen"
      },
      "peer_count": 1,
      "has_single_peer": true,
      "timed": true,
      "clock_running": false,
      "pending_replies": 0,
      "messages": [
        {
          "sender": "System",
          "has_author": false,
          "blank": false
        }
      ],
      "sealed": true,
      "remaining_history": [
        600
      ],
      "ended_len": 1,
      "completions": 1
    }
    "#);
}
