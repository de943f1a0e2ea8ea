//! Cabinet FX Simulator
//!
//! Runs the cabinet effects against a simulated clock and game, logging
//! every effect and printing a JSON summary at the end.
//!
//! Usage:
//!   cabinet-sim --seed 7 --seconds 120
//!   RUST_LOG=debug cabinet-sim --config cabinet.json

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use rf_cabinet_fx::{CabinetFx, CabinetFxConfig, CabinetFxState};
use rf_core::{
    AnimatorTarget, AnimatorTrigger, ClipRef, Clock, EffectSink, FrameRate, ManualClock, TextTarget,
};
use rf_event::{GameEvent, GameEventChannels};

#[derive(Parser)]
#[command(name = "cabinet-sim", about = "Simulate cabinet presentation effects")]
struct Cli {
    /// Master RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated length in seconds
    #[arg(long, default_value_t = 60.0)]
    seconds: f64,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seconds between spins
    #[arg(long, default_value_t = 6.0)]
    spin_every: f64,

    /// JSON config file; built-in demo config when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Sink that logs effects and tallies them
#[derive(Debug, Default, Serialize)]
struct LoggingSink {
    clips: BTreeMap<String, u64>,
    flare_pulses: u64,
    win_starts: u64,
    win_dones: u64,
    texts: Vec<String>,
    jackpots: u64,
}

impl EffectSink for LoggingSink {
    fn play_clip(&mut self, clip: &ClipRef) {
        log::info!("play '{}' ({:.1}s)", clip.name, clip.length_secs);
        *self.clips.entry(clip.name.clone()).or_default() += 1;
    }

    fn fire_trigger(&mut self, target: AnimatorTarget, trigger: AnimatorTrigger) {
        log::trace!("trigger {trigger} on {target:?}");
        match (target, trigger) {
            (AnimatorTarget::Flare(_), _) => self.flare_pulses += 1,
            (AnimatorTarget::Win, AnimatorTrigger::Start) => self.win_starts += 1,
            (AnimatorTarget::Win, AnimatorTrigger::Done) => self.win_dones += 1,
            (AnimatorTarget::Win, AnimatorTrigger::Flare) => {}
        }
    }

    fn set_text(&mut self, target: TextTarget, text: &str) {
        log::info!("text {target:?} = {text:?}");
        self.texts.push(text.to_string());
    }

    fn begin_jackpot(&mut self) {
        log::info!("jackpot!");
        self.jackpots += 1;
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    seed: Option<u64>,
    seconds: f64,
    frames: u64,
    spins: u64,
    spins_done: u64,
    effects: &'a LoggingSink,
    final_state: CabinetFxState,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CabinetFxConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CabinetFxConfig::demo(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut clock = ManualClock::new(0.0);
    let frame = FrameRate(cli.fps).frame_seconds();

    let fx = Rc::new(RefCell::new(
        CabinetFx::new(&config, LoggingSink::default(), clock.now())
            .context("building cabinet effects")?,
    ));
    let channels = GameEventChannels::new();
    let subscriptions = CabinetFx::attach(&fx, &channels);

    let spins_done = Rc::new(RefCell::new(0u64));
    let counter = Rc::clone(&spins_done);
    channels
        .spin_result_done
        .subscribe(move |_| *counter.borrow_mut() += 1);

    // game-side randomness, independent from the effect streams
    let mut game_rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ 0x5EED),
        None => ChaCha8Rng::from_os_rng(),
    };

    let start_at = 1.0;
    let stop_at = (cli.seconds - cli.spin_every).max(start_at);
    let mut next_spin = start_at + cli.spin_every;
    let mut started = false;
    let mut stopped = false;
    let mut spins = 0u64;
    let mut frames = 0u64;

    log::info!(
        "simulating {:.1}s at {} fps, spin every {:.1}s",
        cli.seconds,
        cli.fps,
        cli.spin_every
    );

    while clock.now() < cli.seconds {
        let now = clock.advance(frame);
        frames += 1;
        fx.borrow_mut().tick(now);

        if !started && now >= start_at {
            started = true;
            channels.raise(GameEvent::StartGame);
        }
        if started && !stopped && now >= next_spin && now < stop_at {
            next_spin += cli.spin_every;
            spins += 1;
            let result = roll(&mut game_rng);
            log::info!("spin #{spins} at {now:.2}s pays {result}");
            channels.raise(GameEvent::SpinStart);
            channels.raise(GameEvent::SpinResult(result));
        }
        if started && !stopped && now >= stop_at {
            stopped = true;
            channels.raise(GameEvent::StopGame);
        }
    }

    subscriptions.detach();

    let fx = fx.borrow();
    let spins_done = *spins_done.borrow();
    let summary = Summary {
        seed: config.seed,
        seconds: clock.now(),
        frames,
        spins,
        spins_done,
        effects: fx.sink(),
        final_state: fx.state(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Mostly losses, some small wins, the occasional big one
fn roll(rng: &mut ChaCha8Rng) -> i64 {
    match rng.random_range(0..100) {
        0..50 => 0,
        50..85 => rng.random_range(1..10),
        85..97 => rng.random_range(10..30),
        _ => rng.random_range(30..200),
    }
}
