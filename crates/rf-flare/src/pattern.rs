//! Flare Pattern Library
//!
//! Pure mapping from (pattern, pulse number) to the flare slots lit by that
//! pulse. Pulses are numbered from 1; the cursor advances before a pulse
//! fires, so the first Stepped pulse uses step index 1 and the first
//! Rounding pulse lights slot 1.
//!
//! | Pattern    | Step index for pulse `n` | Slots lit                           |
//! |------------|--------------------------|-------------------------------------|
//! | Stepped    | `n % steps`              | `i, i+steps, i+2*steps, ...`        |
//! | Rounding   | `n % N`                  | `i`                                 |
//! | Randomized | -                        | `num_flares` uniform draws          |
//! | Paired     | `(n - 1) % (N / 2)`      | `i, N-1-i`                          |

use rand::Rng;
use serde::{Deserialize, Serialize};

use rf_core::{RfError, RfResult, ensure_non_negative, ensure_positive};

use crate::set::FlareSet;

/// Pattern variant without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlarePatternKind {
    Stepped,
    Rounding,
    Randomized,
    Paired,
}

impl FlarePatternKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Stepped => "Stepped",
            Self::Rounding => "Rounding",
            Self::Randomized => "Randomized",
            Self::Paired => "Paired",
        }
    }
}

/// A looping flare pattern with its timing parameters (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlarePattern {
    /// Every `steps`-th slot, offset rotating each pulse
    Stepped {
        step_time: f64,
        steps: usize,
        duration: f64,
    },
    /// One slot per pulse, walking around the set
    Rounding { step_time: f64, duration: f64 },
    /// `num_flares` random slots per pulse, interval drawn from `[min_time, max_time]`
    Randomized {
        min_time: f64,
        max_time: f64,
        num_flares: usize,
        duration: f64,
    },
    /// Mirrored pair walking in from both ends (win celebration)
    Paired { step_time: f64, duration: f64 },
}

impl FlarePattern {
    pub fn kind(&self) -> FlarePatternKind {
        match self {
            Self::Stepped { .. } => FlarePatternKind::Stepped,
            Self::Rounding { .. } => FlarePatternKind::Rounding,
            Self::Randomized { .. } => FlarePatternKind::Randomized,
            Self::Paired { .. } => FlarePatternKind::Paired,
        }
    }

    /// Total run time in seconds
    pub fn duration(&self) -> f64 {
        match *self {
            Self::Stepped { duration, .. }
            | Self::Rounding { duration, .. }
            | Self::Randomized { duration, .. }
            | Self::Paired { duration, .. } => duration,
        }
    }

    /// True once `elapsed` seconds cover the whole duration
    #[inline]
    pub fn is_expired(&self, elapsed: f64) -> bool {
        elapsed >= self.duration()
    }

    /// Reject parameters that would stall or divide by zero
    pub fn validate(&self) -> RfResult<()> {
        ensure_non_negative("flare pattern duration", self.duration())?;

        match *self {
            Self::Stepped {
                step_time, steps, ..
            } => {
                ensure_positive("stepped step_time", step_time)?;
                if steps == 0 {
                    return Err(RfError::config("stepped pattern needs at least one step"));
                }
            }
            Self::Rounding { step_time, .. } | Self::Paired { step_time, .. } => {
                ensure_positive("step_time", step_time)?;
            }
            Self::Randomized {
                min_time, max_time, ..
            } => {
                ensure_positive("randomized min_time", min_time)?;
                ensure_positive("randomized max_time", max_time)?;
                if min_time > max_time {
                    return Err(RfError::config(format!(
                        "randomized min_time {min_time} exceeds max_time {max_time}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Step index used by pulse number `pulse` (1-based)
    ///
    /// Randomized has no cursor and always reports 0.
    pub fn step_index(&self, pulse: u64, flares: &FlareSet) -> usize {
        match *self {
            Self::Stepped { steps, .. } => (pulse % steps.max(1) as u64) as usize,
            Self::Rounding { .. } => (pulse % flares.len() as u64) as usize,
            Self::Paired { .. } => (pulse.saturating_sub(1) % flares.pair_count() as u64) as usize,
            Self::Randomized { .. } => 0,
        }
    }

    /// Slots lit by pulse number `pulse` (1-based)
    pub fn pulse_slots<R: Rng + ?Sized>(
        &self,
        pulse: u64,
        flares: &FlareSet,
        rng: &mut R,
    ) -> Vec<usize> {
        let index = self.step_index(pulse, flares);
        match *self {
            Self::Stepped { steps, .. } => stepped_slots(index, steps, flares.len()),
            Self::Rounding { .. } => vec![index],
            Self::Randomized { num_flares, .. } => random_slots(rng, num_flares, flares.len()),
            Self::Paired { .. } => paired_slots(index, flares.len()),
        }
    }

    /// Wait before the next pulse
    pub fn pulse_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Stepped { step_time, .. }
            | Self::Rounding { step_time, .. }
            | Self::Paired { step_time, .. } => step_time,
            Self::Randomized {
                min_time, max_time, ..
            } => rng.random_range(min_time..=max_time),
        }
    }
}

/// Slots `index, index + steps, index + 2*steps, ...` below `count`
pub fn stepped_slots(index: usize, steps: usize, count: usize) -> Vec<usize> {
    (index..count).step_by(steps.max(1)).collect()
}

/// `index` and its mirror `count - 1 - index`, once each
pub fn paired_slots(index: usize, count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let mirror = count - 1 - index.min(count - 1);
    if mirror == index {
        vec![index]
    } else {
        vec![index, mirror]
    }
}

/// `num_flares` uniform draws from `0..count`, with replacement
pub fn random_slots<R: Rng + ?Sized>(rng: &mut R, num_flares: usize, count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    (0..num_flares).map(|_| rng.random_range(0..count)).collect()
}
