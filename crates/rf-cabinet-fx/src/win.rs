//! Win celebration sequencer
//!
//! One run per spin result:
//!
//! ```text
//! Idle ─▶ Evaluating ─┬─▶ Celebrating (BIG / MASSIVE) ─┐
//!                     └─▶ Completing  (none / low)  ───┴─▶ wait elapsed ─▶ Idle
//!                                                             │
//!                                         "Done" (celebrated tiers only)
//!                                         + spin result done (always)
//! ```
//!
//! Tier boundaries are half-open: a result exactly on a threshold belongs
//! to the higher tier. While a run is pending, further spin results are
//! rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use rf_core::{AnimatorTarget, AnimatorTrigger, ClipRef, EffectSink, RfError, RfResult, TextTarget};
use rf_flare::{FlarePattern, FlareScheduler};

use crate::{CabinetError, CabinetResult};
use crate::config::{WinConfig, WinFlareConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// TIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Win magnitude bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinTier {
    /// Below the low threshold
    None,
    /// Small win: audio cue only
    Low,
    /// "BIG WIN!"
    Big,
    /// "MASSIVE WIN!" with jackpot overlay
    Massive,
}

impl WinTier {
    /// Bucket `result` using half-open intervals
    pub fn classify(result: i64, thresholds: &WinThresholds) -> Self {
        if result >= thresholds.massive {
            Self::Massive
        } else if result >= thresholds.big {
            Self::Big
        } else if result >= thresholds.low {
            Self::Low
        } else {
            Self::None
        }
    }

    /// Tiers that get banner, text and win flares
    pub fn is_celebrated(self) -> bool {
        self >= Self::Big
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "No Win",
            Self::Low => "Win",
            Self::Big => "Big Win",
            Self::Massive => "Massive Win",
        }
    }
}

impl fmt::Display for WinTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lower bounds of the Low, Big and Massive tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinThresholds {
    pub low: i64,
    pub big: i64,
    pub massive: i64,
}

impl Default for WinThresholds {
    fn default() -> Self {
        Self {
            low: 1,
            big: 10,
            massive: 30,
        }
    }
}

impl WinThresholds {
    pub fn validate(&self) -> RfResult<()> {
        if self.low < self.big && self.big < self.massive {
            Ok(())
        } else {
            Err(RfError::config(format!(
                "win thresholds must increase strictly, got {} / {} / {}",
                self.low, self.big, self.massive
            )))
        }
    }
}

/// Everything a tier does, resolved from config
#[derive(Debug, Clone, PartialEq)]
pub struct WinCelebration {
    pub tier: WinTier,
    pub cue: Option<ClipRef>,
    pub text: Option<String>,
    pub flares: Option<FlarePattern>,
    pub jackpot: bool,
    /// Seconds until completion
    pub wait: f64,
}

impl WinCelebration {
    pub fn for_tier(tier: WinTier, config: &WinConfig, flares: &WinFlareConfig) -> Self {
        let (cue, text, jackpot) = match tier {
            WinTier::None => (None, None, false),
            WinTier::Low => (config.low_cue.clone(), None, false),
            WinTier::Big => (config.medium_cue.clone(), Some(config.big_text.clone()), false),
            WinTier::Massive => (config.high_cue.clone(), Some(config.massive_text.clone()), true),
        };
        Self {
            tier,
            cue,
            text,
            flares: tier.is_celebrated().then(|| flares.pattern(tier)),
            jackpot,
            wait: config.wait_time(tier),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEQUENCER
// ═══════════════════════════════════════════════════════════════════════════════

/// Sequencer state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinPhase {
    #[default]
    Idle,
    Evaluating,
    Celebrating,
    Completing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingWin {
    tier: WinTier,
    complete_at: f64,
}

/// Drives one win celebration at a time
#[derive(Debug)]
pub struct WinSequencer {
    config: WinConfig,
    flares: WinFlareConfig,
    phase: WinPhase,
    pending: Option<PendingWin>,
    completed: u64,
    rejected: u64,
}

impl WinSequencer {
    pub fn new(config: WinConfig, flares: WinFlareConfig) -> RfResult<Self> {
        config.validate()?;
        flares.pattern(WinTier::Big).validate()?;
        flares.pattern(WinTier::Massive).validate()?;
        Ok(Self {
            config,
            flares,
            phase: WinPhase::Idle,
            pending: None,
            completed: 0,
            rejected: 0,
        })
    }

    pub fn phase(&self) -> WinPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Tier of the run waiting to complete
    pub fn pending_tier(&self) -> Option<WinTier> {
        self.pending.map(|p| p.tier)
    }

    pub fn completes_at(&self) -> Option<f64> {
        self.pending.map(|p| p.complete_at)
    }

    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    pub fn thresholds(&self) -> &WinThresholds {
        &self.config.thresholds
    }

    /// Evaluate a spin result and fire its celebration effects
    pub fn on_spin_result(
        &mut self,
        result: i64,
        now: f64,
        flares: &mut FlareScheduler,
        sink: &mut dyn EffectSink,
    ) -> CabinetResult<WinCelebration> {
        if let Some(pending) = self.pending {
            self.rejected += 1;
            log::warn!(
                "spin result {} ignored: {} still completing",
                result,
                pending.tier
            );
            return Err(CabinetError::WinSequenceInProgress {
                pending: pending.tier,
                rejected: result,
            });
        }

        let tier = WinTier::classify(result, &self.config.thresholds);
        let celebration = WinCelebration::for_tier(tier, &self.config, &self.flares);
        // nothing fires unless the whole celebration can run
        if let Some(pattern) = &celebration.flares {
            pattern.validate()?;
        }

        self.phase = WinPhase::Evaluating;
        log::info!(
            "spin result {} -> {} (wait {:.1}s)",
            result,
            tier,
            celebration.wait
        );

        if tier == WinTier::Low {
            if let Some(cue) = &celebration.cue {
                sink.play_clip(cue);
            }
        }

        if tier.is_celebrated() {
            if let Some(text) = &celebration.text {
                sink.set_text(TextTarget::WinText, text);
            }
            sink.fire_trigger(AnimatorTarget::Win, AnimatorTrigger::Start);
            if let Some(pattern) = &celebration.flares {
                if let Err(err) = flares.preempt(pattern.clone(), now, sink) {
                    self.phase = WinPhase::Idle;
                    return Err(err.into());
                }
            }
            if let Some(cue) = &celebration.cue {
                sink.play_clip(cue);
            }
            if celebration.jackpot {
                sink.begin_jackpot();
            }
        }

        self.pending = Some(PendingWin {
            tier,
            complete_at: now + celebration.wait,
        });
        self.phase = if tier.is_celebrated() {
            WinPhase::Celebrating
        } else {
            WinPhase::Completing
        };
        Ok(celebration)
    }

    /// Finish the pending run once its wait has elapsed
    ///
    /// Returns the tier of a run that completed on this tick; the caller
    /// announces "spin result done".
    pub fn tick(&mut self, now: f64, sink: &mut dyn EffectSink) -> Option<WinTier> {
        let pending = self.pending?;
        if now < pending.complete_at {
            return None;
        }

        self.phase = WinPhase::Completing;
        if pending.tier.is_celebrated() {
            sink.fire_trigger(AnimatorTarget::Win, AnimatorTrigger::Done);
        }
        self.pending = None;
        self.phase = WinPhase::Idle;
        self.completed += 1;
        log::debug!("{} sequence complete at {:.3}s", pending.tier, now);
        Some(pending.tier)
    }
}
