//! Flare Scheduler
//!
//! Owns the single flare task slot. At most one pattern runs at a time:
//!
//! ```text
//!            tick (idle)               now >= expires_at
//!   Idle ─────────────────▶ Running ─────────────────────▶ Idle
//!     ▲   start / preempt     │  ▲                            │
//!     │                       │  └── preempt (replace) ───────┘
//!     └────────── next tick picks a new ambient pattern ◀─────┘
//! ```
//!
//! Starting a task fires its first pulse immediately. Later pulses fire on
//! the first tick at or after `next_pulse_at`, at most one pulse per tick.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use rf_core::{AnimatorTarget, AnimatorTrigger, EffectSink, RfResult};

use crate::ambient::AmbientFlareConfig;
use crate::pattern::{FlarePattern, FlarePatternKind};
use crate::set::FlareSet;

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVE TASK
// ═══════════════════════════════════════════════════════════════════════════════

/// The one running flare pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFlareTask {
    pattern: FlarePattern,
    started_at: f64,
    expires_at: f64,
    /// Pulses fired so far (cursor)
    pulses: u64,
    next_pulse_at: f64,
}

impl ActiveFlareTask {
    fn new(pattern: FlarePattern, now: f64) -> Self {
        Self {
            expires_at: now + pattern.duration(),
            pattern,
            started_at: now,
            pulses: 0,
            next_pulse_at: now,
        }
    }

    pub fn pattern(&self) -> &FlarePattern {
        &self.pattern
    }

    pub fn kind(&self) -> FlarePatternKind {
        self.pattern.kind()
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn expires_at(&self) -> f64 {
        self.expires_at
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    pub fn next_pulse_at(&self) -> f64 {
        self.next_pulse_at
    }

    /// Step index of the most recent pulse
    pub fn step_index(&self, flares: &FlareSet) -> usize {
        self.pattern.step_index(self.pulses, flares)
    }

    #[inline]
    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.expires_at
    }
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlareStats {
    pub tasks_started: u64,
    pub ambient_started: u64,
    pub preemptions: u64,
    pub expirations: u64,
    pub pulses: u64,
    pub flares_fired: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER
// ═══════════════════════════════════════════════════════════════════════════════

/// Single-slot cooperative flare scheduler
pub struct FlareScheduler {
    flares: FlareSet,
    ambient: AmbientFlareConfig,
    active: Option<ActiveFlareTask>,
    rng: ChaCha8Rng,
    stats: FlareStats,
}

impl FlareScheduler {
    /// Create an idle scheduler; the first `tick` starts an ambient pattern
    pub fn new(flares: FlareSet, ambient: AmbientFlareConfig, rng: ChaCha8Rng) -> RfResult<Self> {
        ambient.validate()?;
        Ok(Self {
            flares,
            ambient,
            active: None,
            rng,
            stats: FlareStats::default(),
        })
    }

    /// Create with a fixed seed, or OS entropy when `seed` is `None`
    pub fn with_seed(
        flares: FlareSet,
        ambient: AmbientFlareConfig,
        seed: Option<u64>,
    ) -> RfResult<Self> {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self::new(flares, ambient, rng)
    }

    pub fn flares(&self) -> &FlareSet {
        &self.flares
    }

    pub fn ambient_config(&self) -> &AmbientFlareConfig {
        &self.ambient
    }

    pub fn active(&self) -> Option<&ActiveFlareTask> {
        self.active.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn stats(&self) -> FlareStats {
        self.stats
    }

    /// Advance by one frame
    ///
    /// An expired task is cleared on this tick; the replacement ambient
    /// pattern starts on the following one.
    pub fn tick(&mut self, now: f64, sink: &mut dyn EffectSink) {
        let Some(task) = self.active.as_mut() else {
            let pattern = self.ambient.pick(&mut self.rng);
            self.stats.ambient_started += 1;
            self.launch(pattern, now, sink);
            return;
        };

        if task.is_expired(now) {
            log::debug!(
                "flare {} expired after {} pulses",
                task.kind().display_name(),
                task.pulses
            );
            self.active = None;
            self.stats.expirations += 1;
            return;
        }

        if now >= task.next_pulse_at {
            Self::pulse(task, &self.flares, &mut self.rng, &mut self.stats, now, sink);
        }
    }

    /// Start `pattern` only if no task is running. Returns whether it started.
    pub fn start(
        &mut self,
        pattern: FlarePattern,
        now: f64,
        sink: &mut dyn EffectSink,
    ) -> RfResult<bool> {
        pattern.validate()?;
        if self.active.is_some() {
            return Ok(false);
        }
        self.launch(pattern, now, sink);
        Ok(true)
    }

    /// Drop whatever is running and start `pattern` right now
    ///
    /// An invalid pattern is rejected before the running task is touched.
    pub fn preempt(
        &mut self,
        pattern: FlarePattern,
        now: f64,
        sink: &mut dyn EffectSink,
    ) -> RfResult<()> {
        pattern.validate()?;
        if let Some(replaced) = self.active.take() {
            log::debug!(
                "flare {} preempted by {} after {} pulses",
                replaced.kind().display_name(),
                pattern.kind().display_name(),
                replaced.pulses
            );
            self.stats.preemptions += 1;
        }
        self.launch(pattern, now, sink);
        Ok(())
    }

    fn launch(&mut self, pattern: FlarePattern, now: f64, sink: &mut dyn EffectSink) {
        log::debug!(
            "flare {} started at {:.3}s for {:.3}s",
            pattern.kind().display_name(),
            now,
            pattern.duration()
        );

        let mut task = ActiveFlareTask::new(pattern, now);
        self.stats.tasks_started += 1;

        // zero-length tasks never pulse; they are cleared on the next tick
        if !task.is_expired(now) {
            Self::pulse(&mut task, &self.flares, &mut self.rng, &mut self.stats, now, sink);
        }
        self.active = Some(task);
    }

    fn pulse(
        task: &mut ActiveFlareTask,
        flares: &FlareSet,
        rng: &mut ChaCha8Rng,
        stats: &mut FlareStats,
        now: f64,
        sink: &mut dyn EffectSink,
    ) {
        task.pulses += 1;
        let slots = task.pattern.pulse_slots(task.pulses, flares, rng);
        for &slot in &slots {
            sink.fire_trigger(AnimatorTarget::Flare(slot), AnimatorTrigger::Flare);
        }
        task.next_pulse_at = now + task.pattern.pulse_interval(rng);

        stats.pulses += 1;
        stats.flares_fired += slots.len() as u64;
    }
}
