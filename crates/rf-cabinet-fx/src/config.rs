//! Cabinet effects configuration
//!
//! Every field has a default matching the shipped cabinet tuning, so a
//! config file only needs to list what it changes (plus the music clips,
//! which have no sensible default).
//!
//! ```json
//! {
//!   "seed": 7,
//!   "flares": { "count": 10 },
//!   "music": { "clips": [{ "name": "lounge_a", "length_secs": 42.0 }] }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use rf_core::{ClipRef, RfError, ensure_non_negative};
use rf_flare::{AmbientFlareConfig, FlarePattern, FlareSet};

use crate::CabinetResult;
use crate::win::{WinThresholds, WinTier};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinetFxConfig {
    /// Master RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    pub flares: FlareConfig,
    pub music: MusicConfig,
    pub win: WinConfig,
}

impl CabinetFxConfig {
    pub fn from_json(json: &str) -> CabinetResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CabinetResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> CabinetResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Defaults plus a small built-in music library and win cues
    pub fn demo() -> Self {
        Self {
            music: MusicConfig {
                clips: vec![
                    ClipRef::new("music_lounge", 24.0),
                    ClipRef::new("music_neon", 31.5),
                    ClipRef::new("music_highroller", 18.0),
                ],
                ..Default::default()
            },
            win: WinConfig {
                low_cue: Some(ClipRef::new("win_low", 1.0)),
                medium_cue: Some(ClipRef::new("win_medium", 2.5)),
                high_cue: Some(ClipRef::new("win_high", 4.0)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Check every precondition the schedulers rely on
    pub fn validate(&self) -> Result<(), RfError> {
        self.flares.validate()?;
        self.music.validate()?;
        self.win.validate()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLARES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlareConfig {
    /// Number of flare emitters on the cabinet
    pub count: usize,
    pub ambient: AmbientFlareConfig,
    pub spin_start: SpinStartFlareConfig,
    pub win: WinFlareConfig,
}

impl Default for FlareConfig {
    fn default() -> Self {
        Self {
            count: 8,
            ambient: AmbientFlareConfig::default(),
            spin_start: SpinStartFlareConfig::default(),
            win: WinFlareConfig::default(),
        }
    }
}

impl FlareConfig {
    pub fn flare_set(&self) -> Result<FlareSet, RfError> {
        FlareSet::new(self.count)
    }

    fn validate(&self) -> Result<(), RfError> {
        self.flare_set()?;
        self.ambient.validate()?;
        self.spin_start.pattern().validate()?;
        self.win.pattern(WinTier::Big).validate()?;
        self.win.pattern(WinTier::Massive).validate()
    }
}

/// Rounding sweep that covers the reel spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinStartFlareConfig {
    pub step_time: f64,
    pub duration: f64,
}

impl Default for SpinStartFlareConfig {
    fn default() -> Self {
        Self {
            step_time: 0.1,
            duration: 5.0,
        }
    }
}

impl SpinStartFlareConfig {
    pub fn pattern(&self) -> FlarePattern {
        FlarePattern::Rounding {
            step_time: self.step_time,
            duration: self.duration,
        }
    }
}

/// Paired sweep used by the win celebrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinFlareConfig {
    pub step_time: f64,
    pub big_duration: f64,
    pub massive_duration: f64,
}

impl Default for WinFlareConfig {
    fn default() -> Self {
        Self {
            step_time: 0.1,
            big_duration: 3.0,
            massive_duration: 5.0,
        }
    }
}

impl WinFlareConfig {
    /// Paired pattern for a celebrated tier; lower tiers get the big-win length
    pub fn pattern(&self, tier: WinTier) -> FlarePattern {
        let duration = match tier {
            WinTier::Massive => self.massive_duration,
            _ => self.big_duration,
        };
        FlarePattern::Paired {
            step_time: self.step_time,
            duration,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MUSIC
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Background music library; must not be empty
    pub clips: Vec<ClipRef>,
    /// Base gap between tracks while a game is running
    pub min_music_time: f64,
    /// Base gap between tracks in attract mode
    pub min_attract_music_time: f64,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            clips: Vec::new(),
            min_music_time: 10.0,
            min_attract_music_time: 10.0,
        }
    }
}

impl MusicConfig {
    /// Upper bound of the gap jitter, as a multiple of the minimum
    pub const JITTER_SPAN: f64 = 1.5;

    pub(crate) fn validate(&self) -> Result<(), RfError> {
        if self.clips.is_empty() {
            return Err(RfError::config("music clip library is empty"));
        }
        for clip in &self.clips {
            if !(clip.length_secs.is_finite() && clip.length_secs > 0.0) {
                return Err(RfError::config(format!(
                    "music clip '{}' has length {}",
                    clip.name, clip.length_secs
                )));
            }
        }
        ensure_jitter_range("min_music_time", self.min_music_time)?;
        ensure_jitter_range("min_attract_music_time", self.min_attract_music_time)
    }
}

/// Gap minimums must be non-negative and leave `1.5 * min` finite
fn ensure_jitter_range(name: &str, min: f64) -> Result<(), RfError> {
    ensure_non_negative(name, min)?;
    if (min * MusicConfig::JITTER_SPAN).is_finite() {
        Ok(())
    } else {
        Err(RfError::config(format!("{name} is too large, got {min}")))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIN CELEBRATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinConfig {
    pub thresholds: WinThresholds,
    /// Wait before "spin result done", every tier
    pub base_wait: f64,
    /// Added to `base_wait` for BIG WIN
    pub big_extra_wait: f64,
    /// Added to `base_wait` for MASSIVE WIN
    pub massive_extra_wait: f64,
    pub low_cue: Option<ClipRef>,
    pub medium_cue: Option<ClipRef>,
    pub high_cue: Option<ClipRef>,
    pub big_text: String,
    pub massive_text: String,
}

impl Default for WinConfig {
    fn default() -> Self {
        Self {
            thresholds: WinThresholds::default(),
            base_wait: 1.0,
            big_extra_wait: 2.0,
            massive_extra_wait: 3.0,
            low_cue: None,
            medium_cue: None,
            high_cue: None,
            big_text: "BIG WIN!".to_string(),
            massive_text: "MASSIVE WIN!".to_string(),
        }
    }
}

impl WinConfig {
    /// Total delay before completion for `tier`
    pub fn wait_time(&self, tier: WinTier) -> f64 {
        match tier {
            WinTier::None | WinTier::Low => self.base_wait,
            WinTier::Big => self.base_wait + self.big_extra_wait,
            WinTier::Massive => self.base_wait + self.massive_extra_wait,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), RfError> {
        self.thresholds.validate()?;
        ensure_non_negative("base_wait", self.base_wait)?;
        ensure_non_negative("big_extra_wait", self.big_extra_wait)?;
        ensure_non_negative("massive_extra_wait", self.massive_extra_wait)
    }
}
