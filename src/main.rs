//! Space Punch headless driver
//!
//! Plays a seeded autopilot run at the fixed timestep and prints a JSON report.
//!
//! Usage: `space-punch [seed] [seconds] [settings.json]`

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use space_punch::Settings;
use space_punch::consts::{MAX_SUBSTEPS, SIM_DT};
use space_punch::sim::{GamePhase, GameState, RunSnapshot, TickInput, tick};

/// Host frame length; the simulation substeps inside it
const FRAME_DT: f32 = 1.0 / 30.0;
const DEFAULT_RUN_SECONDS: f32 = 180.0;

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    frames: u64,
    events: BTreeMap<&'static str, usize>,
    snapshot: RunSnapshot,
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(clock_seed);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_RUN_SECONDS);
    let settings = args
        .next()
        .map(|path| Settings::load(Path::new(&path)))
        .unwrap_or_default();

    log::info!("Space Punch (headless) starting: seed {seed}, {seconds}s");

    let mut state = GameState::new(seed, &settings);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let total_frames = (seconds.max(0.0) / FRAME_DT).ceil() as u64;
    let mut events: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut accumulator = 0.0;
    let mut frames = 0;

    while frames < total_frames && state.phase != GamePhase::GameOver {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut state, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in state.drain_events() {
            *events.entry(event.name()).or_default() += 1;
        }
        frames += 1;
    }

    let report = RunReport {
        seed,
        frames,
        events,
        snapshot: state.snapshot(),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Failed to serialize run report: {err}"),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
