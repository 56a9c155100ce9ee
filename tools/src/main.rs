//! shift-runner: headless runner for the night-shift simulation.
//!
//! Usage:
//!   shift-runner --seed 12345 --night 3 --seconds 600
//!   shift-runner --seed 12345 --config data/night_shift.json --ipc-mode

use anyhow::Result;
use nightshift_core::{
    event::SimEvent, snapshot::HudSnapshot, GameSession, PlayerCommand, SessionConfig,
    SessionState, Side,
};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};

/// Frame length used by both modes.
const FRAME_MS: u64 = 100;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Advance { ms: u64 },
    Command { command: PlayerCommand },
    Occupants { room: String },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    run_id: String,
    tick: u64,
    now_ms: u64,
    hud: HudSnapshot,
    events: Vec<SimEvent>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let night = parse_arg(&args, "--night", 1u32);
    let seconds = parse_arg(&args, "--seconds", 600u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let config = match config_path {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let run_id = uuid::Uuid::new_v4().to_string();

    if !ipc_mode {
        println!("Night Shift: shift-runner");
        println!("  run_id:   {run_id}");
        println!("  started:  {}", chrono::Utc::now().to_rfc3339());
        println!("  seed:     {seed}");
        println!("  night:    {night}");
        println!("  seconds:  {seconds}");
        println!("  config:   {}", config_path.unwrap_or("(built-in)"));
        println!();
    }

    let mut session = GameSession::new(config, seed)?;

    if ipc_mode {
        run_ipc_loop(&mut session, &run_id)?;
    } else {
        session.start_night(night);
        run_autopilot(&mut session, seconds);
        print_summary(&session, &run_id);
    }
    Ok(())
}

fn run_ipc_loop(session: &mut GameSession, run_id: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Advance { ms } => {
                let mut left = ms;
                while left > 0 {
                    let step = left.min(FRAME_MS);
                    session.advance(step);
                    left -= step;
                }
                writeln!(stdout, "{}", serde_json::to_string(&ui_state(session, run_id))?)?;
            }
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&ui_state(session, run_id))?)?;
            }
            IpcCommand::Command { command } => {
                let outcome = session.apply(command);
                log::debug!("command outcome: {outcome:?}");
                writeln!(stdout, "{}", serde_json::to_string(&ui_state(session, run_id))?)?;
            }
            IpcCommand::Occupants { room } => {
                let occupants = session.room_occupants(&room);
                let audio_only = session.graph().room(&room).map(|r| r.audio_only);
                let reply = serde_json::json!({
                    "room": room,
                    "audio_only": audio_only,
                    "occupants": occupants,
                });
                writeln!(stdout, "{reply}")?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn ui_state(session: &mut GameSession, run_id: &str) -> UiState {
    UiState {
        run_id: run_id.to_string(),
        tick: session.tick(),
        now_ms: session.now_ms(),
        hud: session.hud(),
        events: session.drain_events(),
    }
}

/// A simple scripted guard: checks each door under the light every few
/// seconds, shuts whichever door has someone behind it, and keeps an
/// eye on the curtain cove the rest of the time.
fn run_autopilot(session: &mut GameSession, seconds: u64) {
    let cove = session.config().layout.special.home.clone();
    let frames_per_second = 1_000 / FRAME_MS;

    for second in 0..seconds {
        if !matches!(session.state(), SessionState::Active | SessionState::PowerOutage) {
            break;
        }
        if *session.state() == SessionState::Active {
            match second % 6 {
                0 => {
                    if session.panel().camera_open() {
                        session.toggle_camera();
                    }
                    for side in Side::BOTH {
                        session.set_light(side, true);
                        let someone = session.peek(side).is_some();
                        session.set_light(side, false);
                        if someone != session.panel().door_closed(side) {
                            session.toggle_door(side);
                        }
                    }
                }
                2 => {
                    session.select_camera(&cove);
                    if !session.panel().camera_open() {
                        session.toggle_camera();
                    }
                }
                4 => {
                    if session.panel().camera_open() {
                        session.toggle_camera();
                    }
                }
                _ => {}
            }
        }
        for _ in 0..frames_per_second {
            session.advance(FRAME_MS);
        }
    }
}

fn print_summary(session: &GameSession, run_id: &str) {
    let hud = session.hud();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in session.event_log() {
        *counts.entry(entry.event_type).or_default() += 1;
    }

    println!("=== NIGHT SUMMARY ===");
    println!("  run_id:      {run_id}");
    println!("  night:       {}", hud.night);
    println!("  state:       {:?}", hud.state);
    println!("  clock:       {}", hud.clock_label);
    println!("  power left:  {}%", hud.power_shown);
    println!("  sim time:    {:.1} s", session.now_ms() as f64 / 1_000.0);

    println!();
    println!("=== ADVERSARIES ===");
    for adversary in session.adversaries() {
        println!(
            "  {:<8} at {:<14} aggression {:.1}",
            adversary.id, adversary.location, adversary.aggression
        );
    }

    println!();
    println!("=== EVENTS ===");
    for (event_type, count) in counts {
        println!("  {event_type:<22} {count}");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
