//! Cabinet effects director
//!
//! Owns the three schedulers and the sink, routes game events to them and
//! announces "spin result done" when a win sequence completes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use rf_core::EffectSink;
use rf_event::{EventChannel, GameEvent, GameEventChannels, SubscriptionId};
use rf_flare::{FlarePattern, FlarePatternKind, FlareScheduler, FlareStats};

use crate::CabinetResult;
use crate::config::CabinetFxConfig;
use crate::music::{MusicScheduler, MusicWindow};
use crate::win::{WinCelebration, WinPhase, WinSequencer, WinTier};

// ═══════════════════════════════════════════════════════════════════════════════
// STATE SNAPSHOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Running flare task, as seen from outside
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlareTaskState {
    pub kind: FlarePatternKind,
    pub started_at: f64,
    pub expires_at: f64,
    pub pulses: u64,
}

/// Diagnostic snapshot of the whole director
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CabinetFxState {
    /// Time of the last tick
    pub now: f64,
    pub game_active: bool,
    pub flare: Option<FlareTaskState>,
    pub flare_stats: FlareStats,
    pub music: MusicWindow,
    pub clips_started: u64,
    pub win_phase: WinPhase,
    pub pending_win: Option<WinTier>,
    pub win_completes_at: Option<f64>,
    pub wins_completed: u64,
    pub spins_rejected: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Flares, music and win celebrations behind one tick
pub struct CabinetFx<S: EffectSink> {
    flares: FlareScheduler,
    music: MusicScheduler,
    wins: WinSequencer,
    spin_start: FlarePattern,
    sink: S,
    spin_result_done: EventChannel<()>,
    /// Events that arrived while the director was busy
    deferred: Rc<RefCell<VecDeque<GameEvent>>>,
    now: f64,
}

impl<S: EffectSink> CabinetFx<S> {
    /// Validate `config` and build all schedulers at time `now`
    ///
    /// Each scheduler gets its own RNG stream derived from the master seed.
    pub fn new(config: &CabinetFxConfig, sink: S, now: f64) -> CabinetResult<Self> {
        config.validate()?;

        let mut master = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let flares = FlareScheduler::new(
            config.flares.flare_set()?,
            config.flares.ambient.clone(),
            ChaCha8Rng::from_rng(&mut master),
        )?;
        let music = MusicScheduler::new(&config.music, now, ChaCha8Rng::from_rng(&mut master))?;
        let wins = WinSequencer::new(config.win.clone(), config.flares.win.clone())?;

        log::info!(
            "cabinet fx ready: {} flares, {} music clips",
            flares.flares().len(),
            config.music.clips.len()
        );

        Ok(Self {
            flares,
            music,
            wins,
            spin_start: config.flares.spin_start.pattern(),
            sink,
            spin_result_done: EventChannel::new("spin_result_done"),
            deferred: Rc::new(RefCell::new(VecDeque::new())),
            now,
        })
    }

    /// Advance every scheduler to `now`
    pub fn tick(&mut self, now: f64) {
        self.now = now;
        self.music.tick(now, &mut self.sink);
        self.flares.tick(now, &mut self.sink);
        if let Some(tier) = self.wins.tick(now, &mut self.sink) {
            log::debug!("spin result done ({tier})");
            self.spin_result_done.fire();
        }
        self.drain_deferred();
    }

    pub fn on_start_game(&mut self) {
        log::info!("game started at {:.3}s", self.now);
        self.music.on_game_start(self.now, &mut self.sink);
    }

    pub fn on_stop_game(&mut self) {
        log::info!("game stopped at {:.3}s", self.now);
        self.music.on_game_stop();
    }

    /// Cover the reel spin with the spin-start sweep
    pub fn on_spin_start(&mut self) -> CabinetResult<()> {
        self.flares
            .preempt(self.spin_start.clone(), self.now, &mut self.sink)?;
        Ok(())
    }

    pub fn on_spin_result(&mut self, result: i64) -> CabinetResult<WinCelebration> {
        self.wins
            .on_spin_result(result, self.now, &mut self.flares, &mut self.sink)
    }

    /// Apply one inbound game event
    ///
    /// `SpinResultDone` is outbound only and is ignored here.
    pub fn handle_event(&mut self, event: GameEvent) -> CabinetResult<()> {
        match event {
            GameEvent::StartGame => self.on_start_game(),
            GameEvent::StopGame => self.on_stop_game(),
            GameEvent::SpinStart => self.on_spin_start()?,
            GameEvent::SpinResult(result) => {
                self.on_spin_result(result)?;
            }
            GameEvent::SpinResultDone => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, event: GameEvent) {
        let kind = event.kind();
        if let Err(err) = self.handle_event(event) {
            log::debug!("{kind:?} not applied: {err}");
        }
        self.drain_deferred();
    }

    fn drain_deferred(&mut self) {
        loop {
            let next = self.deferred.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            let kind = event.kind();
            if let Err(err) = self.handle_event(event) {
                log::debug!("deferred {kind:?} not applied: {err}");
            }
        }
    }

    /// Channel raised when a win sequence completes
    pub fn spin_result_done(&self) -> &EventChannel<()> {
        &self.spin_result_done
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn flares(&self) -> &FlareScheduler {
        &self.flares
    }

    pub fn music(&self) -> &MusicScheduler {
        &self.music
    }

    pub fn wins(&self) -> &WinSequencer {
        &self.wins
    }

    pub fn state(&self) -> CabinetFxState {
        CabinetFxState {
            now: self.now,
            game_active: self.music.is_game_active(),
            flare: self.flares.active().map(|task| FlareTaskState {
                kind: task.kind(),
                started_at: task.started_at(),
                expires_at: task.expires_at(),
                pulses: task.pulses(),
            }),
            flare_stats: self.flares.stats(),
            music: self.music.window().clone(),
            clips_started: self.music.clips_started(),
            win_phase: self.wins.phase(),
            pending_win: self.wins.pending_tier(),
            win_completes_at: self.wins.completes_at(),
            wins_completed: self.wins.completed_count(),
            spins_rejected: self.wins.rejected_count(),
        }
    }
}

impl<S: EffectSink + 'static> CabinetFx<S> {
    /// Subscribe `this` to every inbound channel and forward "spin result
    /// done" to `channels.spin_result_done`
    ///
    /// Handlers hold a weak reference. Events raised while the director is
    /// borrowed are queued: inside `tick` or another handler they apply
    /// before that call returns, otherwise on the next `tick`.
    pub fn attach(this: &Rc<RefCell<Self>>, channels: &GameEventChannels) -> CabinetSubscriptions {
        let start_game = route(this, &channels.start_game, |_| GameEvent::StartGame);
        let stop_game = route(this, &channels.stop_game, |_| GameEvent::StopGame);
        let spin_start = route(this, &channels.spin_start, |_| GameEvent::SpinStart);
        let spin_result = route(this, &channels.spin_result, |r| GameEvent::SpinResult(*r));

        let done_source = this.borrow().spin_result_done.clone();
        let shared_done = channels.spin_result_done.clone();
        let done_forward = done_source.subscribe(move |_| {
            shared_done.fire();
        });

        CabinetSubscriptions {
            channels: channels.clone(),
            start_game,
            stop_game,
            spin_start,
            spin_result,
            done_source,
            done_forward,
        }
    }
}

fn route<S, T, F>(
    this: &Rc<RefCell<CabinetFx<S>>>,
    channel: &EventChannel<T>,
    to_event: F,
) -> SubscriptionId
where
    S: EffectSink + 'static,
    T: 'static,
    F: Fn(&T) -> GameEvent + 'static,
{
    let fx: Weak<RefCell<CabinetFx<S>>> = Rc::downgrade(this);
    let inbox = Rc::clone(&this.borrow().deferred);

    channel.subscribe(move |payload: &T| {
        let event = to_event(payload);
        let Some(fx) = fx.upgrade() else {
            return;
        };
        match fx.try_borrow_mut() {
            Ok(mut fx) => fx.dispatch(event),
            Err(_) => inbox.borrow_mut().push_back(event),
        };
    })
}

impl<S: EffectSink> std::fmt::Debug for CabinetFx<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CabinetFx")
            .field("now", &self.now)
            .field("flares", &self.flares.active())
            .field("music", &self.music)
            .field("wins", &self.wins)
            .finish()
    }
}

/// Handlers installed by [`CabinetFx::attach`]
#[derive(Debug)]
pub struct CabinetSubscriptions {
    channels: GameEventChannels,
    start_game: SubscriptionId,
    stop_game: SubscriptionId,
    spin_start: SubscriptionId,
    spin_result: SubscriptionId,
    done_source: EventChannel<()>,
    done_forward: SubscriptionId,
}

impl CabinetSubscriptions {
    /// Remove every handler; returns how many were still installed
    pub fn detach(self) -> usize {
        [
            self.channels.start_game.unsubscribe(self.start_game),
            self.channels.stop_game.unsubscribe(self.stop_game),
            self.channels.spin_start.unsubscribe(self.spin_start),
            self.channels.spin_result.unsubscribe(self.spin_result),
            self.done_source.unsubscribe(self.done_forward),
        ]
        .into_iter()
        .filter(|removed| *removed)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rf_core::{AnimatorTrigger, RecordedEffect, RecordingSink};
    use std::cell::Cell;

    fn director(seed: u64) -> CabinetFx<RecordingSink> {
        let mut config = CabinetFxConfig::demo();
        config.seed = Some(seed);
        CabinetFx::new(&config, RecordingSink::new(), 0.0).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let result = CabinetFx::new(&CabinetFxConfig::default(), RecordingSink::new(), 0.0);
        assert!(matches!(result, Err(crate::CabinetError::Core(_))));
    }

    #[test]
    fn test_first_tick_starts_ambient_flares() {
        let mut fx = director(1);
        assert!(fx.flares().is_idle());

        fx.tick(0.0);
        let task = fx.flares().active().unwrap();
        assert_ne!(task.kind(), FlarePatternKind::Paired);
        assert!(!fx.sink().flare_slots().is_empty());
    }

    #[test]
    fn test_spin_start_preempts_with_rounding() {
        let mut fx = director(2);
        fx.tick(0.0);
        fx.tick(1.0);
        fx.on_spin_start().unwrap();

        let task = fx.flares().active().unwrap();
        assert_eq!(task.kind(), FlarePatternKind::Rounding);
        assert_relative_eq!(task.started_at(), 1.0);
        assert_relative_eq!(task.expires_at(), 6.0);
    }

    #[test]
    fn test_done_fires_after_wait() {
        let mut fx = director(3);
        let done = Rc::new(Cell::new(0));
        let seen = Rc::clone(&done);
        fx.spin_result_done().subscribe(move |_| seen.set(seen.get() + 1));

        fx.tick(2.0);
        fx.on_spin_result(12).unwrap();
        fx.tick(4.9);
        assert_eq!(done.get(), 0);
        fx.tick(5.0);
        assert_eq!(done.get(), 1);
        assert_eq!(
            fx.sink().win_triggers(),
            vec![AnimatorTrigger::Start, AnimatorTrigger::Done]
        );
    }

    #[test]
    fn test_handle_event_routes_every_kind() {
        let mut fx = director(4);
        fx.handle_event(GameEvent::StartGame).unwrap();
        assert!(fx.music().is_game_active());
        assert!(fx.music().window().is_playing());

        fx.handle_event(GameEvent::SpinStart).unwrap();
        assert_eq!(
            fx.flares().active().map(|t| t.kind()),
            Some(FlarePatternKind::Rounding)
        );

        fx.handle_event(GameEvent::SpinResult(0)).unwrap();
        assert_eq!(fx.wins().pending_tier(), Some(WinTier::None));

        fx.handle_event(GameEvent::SpinResultDone).unwrap();
        fx.handle_event(GameEvent::StopGame).unwrap();
        assert!(!fx.music().is_game_active());
    }

    #[test]
    fn test_state_snapshot_serializes() {
        let mut fx = director(5);
        fx.tick(0.5);
        fx.on_spin_result(30).unwrap();

        let state = fx.state();
        assert_eq!(state.pending_win, Some(WinTier::Massive));
        assert_eq!(state.win_phase, WinPhase::Celebrating);
        assert_eq!(
            state.flare.as_ref().map(|f| f.kind),
            Some(FlarePatternKind::Paired)
        );
        assert_eq!(state.win_completes_at, Some(4.5));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["pending_win"], "massive");
        assert_eq!(json["music"]["state"], "idle");
    }

    #[test]
    fn test_attach_and_detach() {
        let fx = Rc::new(RefCell::new(director(6)));
        let channels = GameEventChannels::new();

        let subs = CabinetFx::attach(&fx, &channels);
        assert_eq!(channels.spin_start.subscriber_count(), 1);
        channels.raise(GameEvent::SpinResult(50));
        assert_eq!(fx.borrow().sink().jackpot_count(), 1);

        assert_eq!(subs.detach(), 5);
        assert_eq!(channels.spin_result.subscriber_count(), 0);
        assert_eq!(fx.borrow().spin_result_done().subscriber_count(), 0);

        channels.raise(GameEvent::StartGame);
        assert!(!fx.borrow().music().is_game_active());
    }

    #[test]
    fn test_events_while_borrowed_are_deferred() {
        let fx = Rc::new(RefCell::new(director(7)));
        let channels = GameEventChannels::new();
        let _subs = CabinetFx::attach(&fx, &channels);

        {
            let _held = fx.borrow();
            channels.raise(GameEvent::StartGame);
        }
        assert!(!fx.borrow().music().is_game_active());

        fx.borrow_mut().tick(0.1);
        assert!(fx.borrow().music().is_game_active());
        assert!(fx
            .borrow()
            .sink()
            .effects()
            .iter()
            .any(|e| matches!(e, RecordedEffect::PlayClip { .. })));
    }

    #[test]
    fn test_dropped_director_ignores_events() {
        let channels = GameEventChannels::new();
        {
            let fx = Rc::new(RefCell::new(director(8)));
            let _subs = CabinetFx::attach(&fx, &channels);
        }
        assert_eq!(channels.raise(GameEvent::SpinStart), 1);
    }
}
