//! Ambient pattern selection
//!
//! When nothing else owns the flares, the scheduler loops a random ambient
//! pattern: Stepped, Rounding or Randomized, picked uniformly, each running
//! for a whole number of seconds drawn from `[min_duration_secs, max_duration_secs)`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use rf_core::{RfError, RfResult};

use crate::pattern::FlarePattern;

/// Tuning for the idle light show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientFlareConfig {
    /// Stepped: seconds between pulses
    pub stepped_step_time: f64,
    /// Stepped: slot stride
    pub stepped_steps: usize,
    /// Rounding: seconds between pulses
    pub rounding_step_time: f64,
    /// Randomized: shortest wait between pulses
    pub random_min_time: f64,
    /// Randomized: longest wait between pulses
    pub random_max_time: f64,
    /// Randomized: slots lit per pulse
    pub random_num_flares: usize,
    /// Shortest ambient run (inclusive, whole seconds)
    pub min_duration_secs: u32,
    /// Longest ambient run (exclusive, whole seconds)
    pub max_duration_secs: u32,
}

impl Default for AmbientFlareConfig {
    fn default() -> Self {
        Self {
            stepped_step_time: 0.5,
            stepped_steps: 3,
            rounding_step_time: 0.1,
            random_min_time: 0.2,
            random_max_time: 0.4,
            random_num_flares: 2,
            min_duration_secs: 5,
            max_duration_secs: 8,
        }
    }
}

impl AmbientFlareConfig {
    pub fn stepped(&self, duration: f64) -> FlarePattern {
        FlarePattern::Stepped {
            step_time: self.stepped_step_time,
            steps: self.stepped_steps,
            duration,
        }
    }

    pub fn rounding(&self, duration: f64) -> FlarePattern {
        FlarePattern::Rounding {
            step_time: self.rounding_step_time,
            duration,
        }
    }

    pub fn randomized(&self, duration: f64) -> FlarePattern {
        FlarePattern::Randomized {
            min_time: self.random_min_time,
            max_time: self.random_max_time,
            num_flares: self.random_num_flares,
            duration,
        }
    }

    /// Draw an ambient run length in seconds
    pub fn pick_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max_duration_secs <= self.min_duration_secs {
            return self.min_duration_secs as f64;
        }
        rng.random_range(self.min_duration_secs..self.max_duration_secs) as f64
    }

    /// Pick one of the three ambient patterns uniformly
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> FlarePattern {
        let duration = self.pick_duration(rng);
        match rng.random_range(0..3) {
            0 => self.stepped(duration),
            1 => self.rounding(duration),
            _ => self.randomized(duration),
        }
    }

    pub fn validate(&self) -> RfResult<()> {
        if self.max_duration_secs < self.min_duration_secs {
            return Err(RfError::config(format!(
                "ambient duration range [{}, {}) is inverted",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        self.stepped(0.0).validate()?;
        self.rounding(0.0).validate()?;
        self.randomized(0.0).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::FlarePatternKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_pick_covers_all_ambient_kinds() {
        let config = AmbientFlareConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let kinds: HashSet<FlarePatternKind> =
            (0..200).map(|_| config.pick(&mut rng).kind()).collect();

        assert_eq!(kinds.len(), 3);
        assert!(!kinds.contains(&FlarePatternKind::Paired));
    }

    #[test]
    fn test_durations_are_whole_seconds_in_range() {
        let config = AmbientFlareConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..200 {
            let d = config.pick(&mut rng).duration();
            assert!((5.0..8.0).contains(&d));
            assert_eq!(d.fract(), 0.0);
        }
    }

    #[test]
    fn test_degenerate_duration_range() {
        let config = AmbientFlareConfig {
            min_duration_secs: 6,
            max_duration_secs: 6,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(config.pick_duration(&mut rng), 6.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(AmbientFlareConfig::default().validate().is_ok());

        let inverted = AmbientFlareConfig {
            min_duration_secs: 8,
            max_duration_secs: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let no_steps = AmbientFlareConfig {
            stepped_steps: 0,
            ..Default::default()
        };
        assert!(no_steps.validate().is_err());
    }
}
