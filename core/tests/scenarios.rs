//! End-to-end night scenarios: the three ways a night can end, and the
//! session transitions around them.

use nightshift_core::{
    event::{AudioCue, CaptureCause, SimEvent},
    CommandOutcome, GameSession, IgnoreReason, Outcome, SessionConfig, SessionState, Side,
};

fn build(seed: u64) -> GameSession {
    let _ = env_logger::builder().is_test(true).try_init();
    GameSession::new(SessionConfig::default(), seed).expect("default session")
}

fn calm_patrollers(session: &mut GameSession) {
    for id in ["stitch", "wren", "mott"] {
        assert!(session.set_aggression(id, 0.0), "unknown patroller {id}");
    }
}

fn lost_to(session: &GameSession) -> Option<(String, CaptureCause)> {
    match session.state() {
        SessionState::Resolved { outcome: Outcome::Lost { adversary, cause } } => {
            Some((adversary.clone(), *cause))
        }
        _ => None,
    }
}

/// Night 1, doors open, one patroller certain to move every AI tick.
#[test]
fn certain_patroller_catches_player_through_open_door() {
    let mut session = build(0xA11CE);
    session.start_night(1);
    calm_patrollers(&mut session);
    session.set_aggression("stitch", 20.0);

    let mut events = Vec::new();
    while session.now_ms() < 60_000 && *session.state() == SessionState::Active {
        events.extend(session.advance(100));
    }

    assert_eq!(lost_to(&session), Some(("stitch".to_string(), CaptureCause::Patrol)));
    // Six rooms on the path: five AI ticks of 3 s each.
    assert_eq!(session.now_ms(), 15_000);
    let threshold = events
        .iter()
        .position(|e| matches!(e, SimEvent::ThresholdReached { adversary, side: Side::Left } if adversary == "stitch"))
        .expect("threshold reached before the office");
    let caught = events
        .iter()
        .position(|e| matches!(e, SimEvent::PlayerCaught { .. }))
        .expect("capture event");
    assert!(threshold < caught);
    assert!(session.room_occupants("office").contains("stitch"));
}

#[test]
fn closed_door_keeps_patroller_out() {
    let mut session = build(0xA11CE);
    session.start_night(1);
    calm_patrollers(&mut session);
    session.set_aggression("stitch", 20.0);
    session.toggle_door(Side::Left);

    let mut blocked = 0;
    for _ in 0..30 {
        for e in session.advance(1_000) {
            if matches!(e, SimEvent::DoorBlocked { side: Side::Left, .. }) {
                blocked += 1;
            }
        }
    }
    assert_eq!(*session.state(), SessionState::Active);
    assert!(blocked >= 5, "expected repeated knocks on the left door, got {blocked}");
    assert!(session.room_occupants("west_corner").contains("stitch"));
}

/// Power forced to zero at 2 AM: outage at once, controls dead, then the
/// blackout capture inside the countdown window.
#[test]
fn forced_power_loss_ends_in_blackout_capture() {
    let mut session = build(0xB1AC0);
    session.start_night(1);
    calm_patrollers(&mut session);
    session.select_camera("curtain_cove");
    session.toggle_camera();

    while session.hour() < 2 {
        session.advance(1_000);
    }
    assert_eq!(*session.state(), SessionState::Active);
    session.toggle_camera();
    session.toggle_door(Side::Left);
    session.set_light(Side::Right, true);

    session.set_power(0.0);
    assert_eq!(*session.state(), SessionState::PowerOutage);
    let panel = session.panel();
    assert!(!panel.door_closed(Side::Left) && !panel.door_closed(Side::Right));
    assert!(!panel.light_on(Side::Left) && !panel.light_on(Side::Right));
    assert!(!panel.camera_open());
    let drained = session.drain_events();
    assert!(drained.contains(&SimEvent::PowerOutageStarted));
    assert!(drained.contains(&SimEvent::AudioCue { cue: AudioCue::PowerDown }));

    assert_eq!(
        session.toggle_door(Side::Left),
        CommandOutcome::Ignored(IgnoreReason::PanelLocked)
    );

    let outage_start = session.now_ms();
    while session.now_ms() - outage_start < 40_000 && lost_to(&session).is_none() {
        session.advance(100);
    }
    let elapsed = session.now_ms() - outage_start;
    let grace = session.config().outage.grace_ms;
    assert_eq!(lost_to(&session), Some(("dash".to_string(), CaptureCause::Blackout)));
    assert!(
        elapsed >= grace + 5_000 && elapsed <= grace + 20_000 + 100,
        "blackout capture after {elapsed} ms"
    );
    assert!(session.room_occupants("office").contains("dash"));
}

/// Nobody gets in and the lights hold: six hours later the night is won.
#[test]
fn surviving_until_six_wins_the_night() {
    let mut session = build(0x5EED);
    session.start_night(1);
    calm_patrollers(&mut session);

    let mut completions = 0;
    for second in 0..700u64 {
        if second % 30 == 0 {
            session.set_aggression("dash", 0.0);
        }
        for e in session.advance(1_000) {
            if matches!(e, SimEvent::NightComplete { night: 1 }) {
                completions += 1;
            }
        }
    }

    assert_eq!(*session.state(), SessionState::Resolved { outcome: Outcome::Won });
    assert_eq!(completions, 1);
    assert_eq!(session.hour(), 6);
    assert!(session.power_remaining() > 0.0);
    assert_eq!(session.hud().clock_label, "6 AM");
}

#[test]
fn advancing_a_won_night_starts_the_next_one() {
    let mut session = build(3);
    assert_eq!(
        session.advance_night(),
        CommandOutcome::Ignored(IgnoreReason::NotActive),
        "nothing to advance from the menu"
    );
    session.start_night(1);
    calm_patrollers(&mut session);
    for second in 0..540u64 {
        if second % 30 == 0 {
            session.set_aggression("dash", 0.0);
        }
        session.advance(1_000);
    }
    assert_eq!(*session.state(), SessionState::Resolved { outcome: Outcome::Won });

    assert!(session.advance_night().is_applied());
    assert_eq!(*session.state(), SessionState::Active);
    let hud = session.hud();
    assert_eq!(hud.night, 2);
    assert_eq!(hud.hour, 0);
    assert_eq!(hud.power, 100.0);
    // Night 2 patrollers start meaner: 2 per night plus their offset.
    assert_eq!(session.adversary("wren").map(|a| a.aggression), Some(5.0));
}

#[test]
fn commands_after_resolution_are_ignored() {
    let mut session = build(0xA11CE);
    session.start_night(1);
    calm_patrollers(&mut session);
    session.set_aggression("stitch", 20.0);
    for _ in 0..20 {
        session.advance(1_000);
    }
    assert!(lost_to(&session).is_some());

    assert_eq!(session.toggle_door(Side::Left), CommandOutcome::Ignored(IgnoreReason::NotActive));
    assert_eq!(session.toggle_camera(), CommandOutcome::Ignored(IgnoreReason::NotActive));
    assert!(session.advance(10_000).is_empty());
}

#[test]
fn restart_discards_a_charge_in_flight() {
    let mut session = build(0xC4A);
    session.start_night(1);
    calm_patrollers(&mut session);
    session.set_aggression("dash", 19.5);

    let mut charging = false;
    for _ in 0..40 {
        if session
            .advance(100)
            .iter()
            .any(|e| matches!(e, SimEvent::ChargeStarted { .. }))
        {
            charging = true;
            break;
        }
    }
    assert!(charging, "charge should start on the first AI tick");

    assert!(session.restart_night().is_applied());
    calm_patrollers(&mut session);
    let mut caught = false;
    for _ in 0..50 {
        caught |= session
            .advance(100)
            .iter()
            .any(|e| matches!(e, SimEvent::PlayerCaught { .. }));
    }
    assert!(!caught, "a charge from the torn-down night must not land");
    assert_eq!(*session.state(), SessionState::Active);
    assert_eq!(session.adversary("dash").map(|a| a.location.as_str()), Some("curtain_cove"));
}

#[test]
fn leaving_during_outage_cancels_the_countdown() {
    let mut session = build(9);
    session.start_night(1);
    session.set_power(0.0);
    assert_eq!(*session.state(), SessionState::PowerOutage);

    assert!(session.return_to_menu().is_applied());
    assert_eq!(*session.state(), SessionState::Menu);
    for _ in 0..30 {
        assert!(session.advance(1_000).is_empty());
    }
    assert_eq!(*session.state(), SessionState::Menu);
    assert_eq!(session.outage_phase(), None);
}

#[test]
fn json_commands_drive_the_session() {
    let mut session = build(1);
    let script = r#"[
        {"cmd": "start_night", "index": 3},
        {"cmd": "toggle_door", "side": "right"},
        {"cmd": "select_camera", "room": "kitchen"},
        {"cmd": "toggle_camera"}
    ]"#;
    let commands: Vec<nightshift_core::PlayerCommand> = serde_json::from_str(script).unwrap();
    for command in commands {
        assert!(session.apply(command).is_applied());
    }
    let hud = session.hud();
    assert_eq!(hud.night, 3);
    assert_eq!(hud.usage, 3);
    assert!(hud.panel.door_closed(Side::Right));
    assert_eq!(hud.panel.camera(), "kitchen");
    assert!(session.graph().room("kitchen").map(|r| r.audio_only).unwrap_or(false));
}
