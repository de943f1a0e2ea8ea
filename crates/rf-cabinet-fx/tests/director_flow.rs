//! Cabinet Director Integration Tests
//!
//! Drives `CabinetFx` through the game event channels with a manual clock:
//! - Win tiers, waits and "spin result done"
//! - Spin-start preemption
//! - Overlapping spin results
//! - Music pacing across game start/stop

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rf_cabinet_fx::{CabinetFx, CabinetFxConfig, CabinetSubscriptions, MusicWindow, WinTier};
use rf_core::{AnimatorTrigger, Clock, ManualClock, RecordingSink, TextTarget};
use rf_event::{GameEvent, GameEventChannels};
use rf_flare::FlarePatternKind;

type Fx = Rc<RefCell<CabinetFx<RecordingSink>>>;

struct Rig {
    fx: Fx,
    channels: GameEventChannels,
    clock: ManualClock,
    done: Rc<Cell<u32>>,
    _subs: CabinetSubscriptions,
}

impl Rig {
    fn new(seed: u64) -> Self {
        let mut config = CabinetFxConfig::demo();
        config.seed = Some(seed);
        let fx = Rc::new(RefCell::new(
            CabinetFx::new(&config, RecordingSink::new(), 0.0).unwrap(),
        ));
        let channels = GameEventChannels::new();
        let subs = CabinetFx::attach(&fx, &channels);

        let done = Rc::new(Cell::new(0));
        let seen = Rc::clone(&done);
        channels
            .spin_result_done
            .subscribe(move |_| seen.set(seen.get() + 1));

        Self {
            fx,
            channels,
            clock: ManualClock::new(0.0),
            done,
            _subs: subs,
        }
    }

    fn tick_to(&mut self, time: f64) {
        let now = self.clock.advance_to(time);
        self.fx.borrow_mut().tick(now);
    }

    /// Tick every frame from now until `time`
    fn run_until(&mut self, time: f64) {
        while self.clock.now() < time {
            let now = self.clock.advance(1.0 / 60.0);
            self.fx.borrow_mut().tick(now);
        }
    }

    fn raise(&self, event: GameEvent) {
        self.channels.raise(event);
    }

    fn clear_sink(&self) {
        self.fx.borrow_mut().sink_mut().clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIN TIERS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_no_win_completes_after_one_second() {
    let mut rig = Rig::new(1);
    rig.tick_to(2.0);
    rig.clear_sink();

    rig.raise(GameEvent::SpinResult(0));
    assert_eq!(rig.fx.borrow().wins().pending_tier(), Some(WinTier::None));
    assert!(rig.fx.borrow().sink().clips().is_empty());

    rig.tick_to(2.99);
    assert_eq!(rig.done.get(), 0);
    rig.tick_to(3.0);
    assert_eq!(rig.done.get(), 1);
    assert!(rig.fx.borrow().sink().win_triggers().is_empty());
}

#[test]
fn test_low_win_plays_low_cue() {
    let mut rig = Rig::new(2);
    rig.tick_to(1.0);
    let kind_before = rig.fx.borrow().flares().active().map(|t| t.kind());

    rig.raise(GameEvent::SpinResult(9));
    {
        let fx = rig.fx.borrow();
        assert_eq!(fx.sink().clips(), vec!["win_low"]);
        assert_eq!(fx.sink().last_text(TextTarget::WinText), None);
        assert_eq!(fx.flares().active().map(|t| t.kind()), kind_before);
    }

    rig.tick_to(2.0);
    assert_eq!(rig.done.get(), 1);
}

#[test]
fn test_big_win_full_sequence() {
    let mut rig = Rig::new(3);
    rig.tick_to(1.0);
    rig.clear_sink();

    rig.raise(GameEvent::SpinResult(10));
    {
        let fx = rig.fx.borrow();
        assert_eq!(fx.sink().last_text(TextTarget::WinText), Some("BIG WIN!"));
        assert_eq!(fx.sink().win_triggers(), vec![AnimatorTrigger::Start]);
        assert_eq!(fx.sink().clips(), vec!["win_medium"]);
        // first paired pulse fires with the preempt
        assert_eq!(fx.sink().flare_slots(), vec![0, 7]);
        let task = fx.flares().active().unwrap();
        assert_eq!(task.kind(), FlarePatternKind::Paired);
        assert_relative_eq!(task.expires_at(), 4.0);
    }

    rig.tick_to(3.99);
    assert_eq!(rig.done.get(), 0);
    rig.tick_to(4.0);
    assert_eq!(rig.done.get(), 1);
    assert_eq!(
        rig.fx.borrow().sink().win_triggers(),
        vec![AnimatorTrigger::Start, AnimatorTrigger::Done]
    );
}

#[test]
fn test_massive_win_invokes_jackpot() {
    let mut rig = Rig::new(4);
    rig.tick_to(1.0);
    rig.clear_sink();

    rig.raise(GameEvent::SpinResult(30));
    {
        let fx = rig.fx.borrow();
        assert_eq!(
            fx.sink().last_text(TextTarget::WinText),
            Some("MASSIVE WIN!")
        );
        assert_eq!(fx.sink().clips(), vec!["win_high"]);
        assert_eq!(fx.sink().jackpot_count(), 1);
        assert_relative_eq!(fx.flares().active().unwrap().expires_at(), 6.0);
    }

    rig.tick_to(4.99);
    assert_eq!(rig.done.get(), 0);
    rig.tick_to(5.0);
    assert_eq!(rig.done.get(), 1);
}

#[test]
fn test_overlapping_spin_result_is_ignored() {
    let mut rig = Rig::new(5);
    rig.tick_to(1.0);

    rig.raise(GameEvent::SpinResult(15));
    rig.clear_sink();
    rig.raise(GameEvent::SpinResult(100));

    {
        let fx = rig.fx.borrow();
        assert!(fx.sink().effects().is_empty());
        assert_eq!(fx.wins().pending_tier(), Some(WinTier::Big));
        assert_eq!(fx.state().spins_rejected, 1);
    }

    rig.run_until(10.0);
    assert_eq!(rig.done.get(), 1);
    assert_eq!(rig.fx.borrow().sink().jackpot_count(), 0);
}

#[test]
fn test_auto_spin_from_done_handler() {
    let mut rig = Rig::new(6);
    let channels = rig.channels.clone();
    let remaining = Rc::new(Cell::new(2));
    let left = Rc::clone(&remaining);
    rig.channels.spin_result_done.subscribe(move |_| {
        if left.get() > 0 {
            left.set(left.get() - 1);
            channels.raise(GameEvent::SpinStart);
            channels.raise(GameEvent::SpinResult(12));
        }
    });

    rig.tick_to(1.0);
    rig.raise(GameEvent::SpinResult(0));

    // each done immediately queues the next spin
    rig.tick_to(2.0);
    assert_eq!(rig.done.get(), 1);
    assert_eq!(rig.fx.borrow().wins().pending_tier(), Some(WinTier::Big));

    rig.tick_to(5.0);
    rig.tick_to(8.0);
    rig.tick_to(11.0);
    assert_eq!(rig.done.get(), 3);
    assert_eq!(remaining.get(), 0);
    assert_eq!(
        rig.fx.borrow().sink().win_triggers(),
        vec![
            AnimatorTrigger::Start,
            AnimatorTrigger::Done,
            AnimatorTrigger::Start,
            AnimatorTrigger::Done
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLARES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_spin_start_sweeps_round_the_cabinet() {
    let mut rig = Rig::new(7);
    rig.tick_to(0.5);
    rig.tick_to(1.0);
    rig.clear_sink();

    rig.raise(GameEvent::SpinStart);
    for k in 1..=8 {
        rig.tick_to(1.0 + 0.11 * k as f64);
    }

    let fx = rig.fx.borrow();
    assert_eq!(fx.sink().flare_slots(), vec![1, 2, 3, 4, 5, 6, 7, 0, 1]);
    let task = fx.flares().active().unwrap();
    assert_eq!(task.kind(), FlarePatternKind::Rounding);
    assert_relative_eq!(task.expires_at(), 6.0);
}

#[test]
fn test_spin_start_then_ambient_resumes() {
    let mut rig = Rig::new(8);
    rig.tick_to(1.0);
    rig.raise(GameEvent::SpinStart);

    rig.tick_to(6.0);
    assert!(rig.fx.borrow().flares().is_idle());
    rig.tick_to(6.01);
    let kind = rig.fx.borrow().flares().active().map(|t| t.kind());
    assert!(matches!(
        kind,
        Some(FlarePatternKind::Stepped | FlarePatternKind::Rounding | FlarePatternKind::Randomized)
    ));
}

#[test]
fn test_every_flare_task_accounted_for() {
    let mut rig = Rig::new(9);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut preempts = 0u64;

    rig.raise(GameEvent::StartGame);
    for _ in 0..60 * 300 {
        let now = rig.clock.advance(1.0 / 60.0);
        rig.fx.borrow_mut().tick(now);

        match rng.random_range(0..400) {
            0 => {
                rig.raise(GameEvent::SpinStart);
                preempts += 1;
            }
            1 => {
                let result = rng.random_range(0..60);
                let idle = rig.fx.borrow().wins().pending_tier().is_none();
                rig.raise(GameEvent::SpinResult(result));
                if idle && result >= 10 {
                    preempts += 1;
                }
            }
            2 => rig.raise(GameEvent::StopGame),
            3 => rig.raise(GameEvent::StartGame),
            _ => {}
        }

        let fx = rig.fx.borrow();
        let stats = fx.flares().stats();
        let running = u64::from(fx.flares().active().is_some());
        assert_eq!(stats.tasks_started, stats.ambient_started + preempts);
        assert_eq!(
            stats.tasks_started,
            stats.expirations + stats.preemptions + running
        );
        if let Some(task) = fx.flares().active() {
            assert!(task.started_at() <= now && now <= task.expires_at());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MUSIC
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_start_stop_round_trip_keeps_clip() {
    let mut rig = Rig::new(10);
    rig.tick_to(1.0);

    rig.raise(GameEvent::StartGame);
    let window = rig.fx.borrow().music().window().clone();
    assert!(window.is_playing());

    rig.raise(GameEvent::StopGame);
    rig.raise(GameEvent::StartGame);
    rig.raise(GameEvent::StopGame);

    let fx = rig.fx.borrow();
    assert_eq!(fx.music().window(), &window);
    assert_eq!(fx.music().clips_started(), 1);
    assert!(!fx.state().game_active);
}

#[test]
fn test_music_windows_do_not_overlap() {
    let mut rig = Rig::new(11);
    let mut windows: Vec<(f64, f64)> = Vec::new();

    // twenty minutes: game from 0:05 to 0:40 of every minute, attract otherwise
    for frame in 0..60 * 60 * 20 {
        let now = rig.clock.advance(1.0 / 60.0);
        rig.fx.borrow_mut().tick(now);
        match frame % 3600 {
            300 => rig.raise(GameEvent::StartGame),
            2400 => rig.raise(GameEvent::StopGame),
            _ => {}
        }

        if let MusicWindow::Playing {
            started_at,
            play_until,
            ..
        } = rig.fx.borrow().music().window()
        {
            if windows.last() != Some(&(*started_at, *play_until)) {
                windows.push((*started_at, *play_until));
            }
        }
    }

    assert!(windows.len() >= 10);
    assert_eq!(
        windows.len() as u64,
        rig.fx.borrow().music().clips_started()
    );
    for pair in windows.windows(2) {
        assert!(pair[1].0 >= pair[0].1);
    }
}
