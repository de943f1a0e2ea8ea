//! Background music scheduler
//!
//! Alternates between playing one random clip and waiting. The wait after a
//! clip is `clip length + jitter`, with the jitter drawn from
//! `[min, 1.5 * min]` where `min` depends on whether a game is running
//! (`min_music_time`) or the cabinet is in attract mode
//! (`min_attract_music_time`). Starting a game while idle cuts the wait
//! short. A playing clip is never interrupted or overlapped.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use rf_core::{ClipRef, EffectSink, RfResult};

use crate::config::MusicConfig;

/// Where the music timer currently stands
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MusicWindow {
    /// Nothing playing; next clip may start at `next_play_at`
    Idle { next_play_at: f64 },
    /// `clip` owns the music slot until `play_until`
    Playing {
        clip: ClipRef,
        started_at: f64,
        play_until: f64,
    },
}

impl MusicWindow {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    pub fn current_clip(&self) -> Option<&ClipRef> {
        match self {
            Self::Playing { clip, .. } => Some(clip),
            Self::Idle { .. } => None,
        }
    }
}

/// Time-gated music player selection
pub struct MusicScheduler {
    clips: Vec<ClipRef>,
    min_music_time: f64,
    min_attract_music_time: f64,
    window: MusicWindow,
    game_active: bool,
    rng: ChaCha8Rng,
    clips_started: u64,
}

impl MusicScheduler {
    /// Start idle in attract mode, first clip after the attract jitter
    pub fn new(config: &MusicConfig, now: f64, rng: ChaCha8Rng) -> RfResult<Self> {
        config.validate()?;

        let mut scheduler = Self {
            clips: config.clips.clone(),
            min_music_time: config.min_music_time,
            min_attract_music_time: config.min_attract_music_time,
            window: MusicWindow::Idle { next_play_at: now },
            game_active: false,
            rng,
            clips_started: 0,
        };
        let first = now + scheduler.jitter();
        scheduler.window = MusicWindow::Idle { next_play_at: first };
        Ok(scheduler)
    }

    pub fn window(&self) -> &MusicWindow {
        &self.window
    }

    pub fn is_game_active(&self) -> bool {
        self.game_active
    }

    pub fn clips_started(&self) -> u64 {
        self.clips_started
    }

    /// Advance by one frame
    pub fn tick(&mut self, now: f64, sink: &mut dyn EffectSink) {
        match &self.window {
            MusicWindow::Idle { next_play_at } if now >= *next_play_at => {
                self.play_random(now, sink);
            }
            MusicWindow::Playing {
                clip, play_until, ..
            } if now >= *play_until => {
                let length = clip.length_secs;
                log::debug!("music '{}' finished at {:.3}s", clip.name, now);
                let next_play_at = now + length + self.jitter();
                self.window = MusicWindow::Idle { next_play_at };
            }
            _ => {}
        }
    }

    /// Game started: faster rotation from now on, and start a clip if idle
    pub fn on_game_start(&mut self, now: f64, sink: &mut dyn EffectSink) {
        self.game_active = true;
        if !self.window.is_playing() {
            self.play_random(now, sink);
        }
    }

    /// Game stopped: back to attract pacing; the current clip keeps playing
    pub fn on_game_stop(&mut self) {
        self.game_active = false;
    }

    fn play_random(&mut self, now: f64, sink: &mut dyn EffectSink) {
        let clip = self.clips[self.rng.random_range(0..self.clips.len())].clone();
        log::debug!(
            "music '{}' starting at {:.3}s ({:.1}s)",
            clip.name,
            now,
            clip.length_secs
        );
        sink.play_clip(&clip);
        self.clips_started += 1;
        self.window = MusicWindow::Playing {
            play_until: now + clip.length_secs,
            started_at: now,
            clip,
        };
    }

    fn jitter(&mut self) -> f64 {
        let min = if self.game_active {
            self.min_music_time
        } else {
            self.min_attract_music_time
        };
        self.rng.random_range(min..=min * MusicConfig::JITTER_SPAN)
    }
}

impl std::fmt::Debug for MusicScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicScheduler")
            .field("clips", &self.clips.len())
            .field("window", &self.window)
            .field("game_active", &self.game_active)
            .finish()
    }
}
