//! Presentation collaborators
//!
//! Everything the cabinet effects fire is fire-and-forget: play a clip,
//! pull an animator trigger, set a text, start the jackpot overlay. The
//! schedulers only see the [`EffectSink`] trait; the host engine (or a test
//! double) decides what those calls actually do.

use serde::{Deserialize, Serialize};

/// Named animator triggers understood by flare and win animators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimatorTrigger {
    /// One pulse of a flare light
    Flare,
    /// Win banner intro
    Start,
    /// Win banner outro
    Done,
}

impl AnimatorTrigger {
    /// Trigger name as authored in the animator controller
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flare => "Flare",
            Self::Start => "Start",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for AnimatorTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Animator that receives a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "slot", rename_all = "snake_case")]
pub enum AnimatorTarget {
    /// Flare emitter at slot index
    Flare(usize),
    /// Win celebration banner
    Win,
}

/// Text element that can be rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTarget {
    WinText,
}

/// Reference to an audio clip known to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRef {
    /// Host-side clip name
    pub name: String,
    /// Clip length in seconds
    pub length_secs: f64,
}

impl ClipRef {
    pub fn new(name: impl Into<String>, length_secs: f64) -> Self {
        Self {
            name: name.into(),
            length_secs,
        }
    }
}

/// Receiver of fire-and-forget presentation effects
pub trait EffectSink {
    /// Request playback of an audio clip
    fn play_clip(&mut self, clip: &ClipRef);

    /// Pull a trigger on an animator
    fn fire_trigger(&mut self, target: AnimatorTarget, trigger: AnimatorTrigger);

    /// Replace the contents of a text element
    fn set_text(&mut self, target: TextTarget, text: &str);

    /// Start the jackpot overlay
    fn begin_jackpot(&mut self);
}

impl<S: EffectSink + ?Sized> EffectSink for &mut S {
    fn play_clip(&mut self, clip: &ClipRef) {
        (**self).play_clip(clip);
    }

    fn fire_trigger(&mut self, target: AnimatorTarget, trigger: AnimatorTrigger) {
        (**self).fire_trigger(target, trigger);
    }

    fn set_text(&mut self, target: TextTarget, text: &str) {
        (**self).set_text(target, text);
    }

    fn begin_jackpot(&mut self) {
        (**self).begin_jackpot();
    }
}

/// One captured effect call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum RecordedEffect {
    PlayClip { clip: String },
    Trigger { target: AnimatorTarget, trigger: AnimatorTrigger },
    SetText { target: TextTarget, text: String },
    BeginJackpot,
}

/// Sink that records every call, for tests and the simulator
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    effects: Vec<RecordedEffect>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All effects in call order
    pub fn effects(&self) -> &[RecordedEffect] {
        &self.effects
    }

    /// Take the recorded effects, leaving the sink empty
    pub fn drain(&mut self) -> Vec<RecordedEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Flare slots pulsed, in call order
    pub fn flare_slots(&self) -> Vec<usize> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                RecordedEffect::Trigger {
                    target: AnimatorTarget::Flare(slot),
                    trigger: AnimatorTrigger::Flare,
                } => Some(*slot),
                _ => None,
            })
            .collect()
    }

    /// Clip names requested, in call order
    pub fn clips(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                RecordedEffect::PlayClip { clip } => Some(clip.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Triggers pulled on the win animator
    pub fn win_triggers(&self) -> Vec<AnimatorTrigger> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                RecordedEffect::Trigger {
                    target: AnimatorTarget::Win,
                    trigger,
                } => Some(*trigger),
                _ => None,
            })
            .collect()
    }

    /// Last text written to `target`
    pub fn last_text(&self, target: TextTarget) -> Option<&str> {
        self.effects.iter().rev().find_map(|e| match e {
            RecordedEffect::SetText { target: t, text } if *t == target => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn jackpot_count(&self) -> usize {
        self.effects
            .iter()
            .filter(|e| matches!(e, RecordedEffect::BeginJackpot))
            .count()
    }
}

impl EffectSink for RecordingSink {
    fn play_clip(&mut self, clip: &ClipRef) {
        self.effects.push(RecordedEffect::PlayClip {
            clip: clip.name.clone(),
        });
    }

    fn fire_trigger(&mut self, target: AnimatorTarget, trigger: AnimatorTrigger) {
        self.effects.push(RecordedEffect::Trigger { target, trigger });
    }

    fn set_text(&mut self, target: TextTarget, text: &str) {
        self.effects.push(RecordedEffect::SetText {
            target,
            text: text.to_string(),
        });
    }

    fn begin_jackpot(&mut self) {
        self.effects.push(RecordedEffect::BeginJackpot);
    }
}
