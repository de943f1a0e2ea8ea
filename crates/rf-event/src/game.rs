//! Game Event Channels
//!
//! The game-state events the cabinet presentation listens to, one channel
//! per kind. The game layer raises them; the cabinet effects subscribe.

use serde::{Deserialize, Serialize};

use crate::channel::EventChannel;

/// Event kinds raised by the game layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    StartGame,
    StopGame,
    SpinStart,
    SpinResult,
    SpinResultDone,
}

/// A game event with its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GameEvent {
    StartGame,
    StopGame,
    SpinStart,
    /// Win magnitude of the finished spin
    SpinResult(i64),
    SpinResultDone,
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            Self::StartGame => GameEventKind::StartGame,
            Self::StopGame => GameEventKind::StopGame,
            Self::SpinStart => GameEventKind::SpinStart,
            Self::SpinResult(_) => GameEventKind::SpinResult,
            Self::SpinResultDone => GameEventKind::SpinResultDone,
        }
    }
}

/// One channel per [`GameEventKind`]
#[derive(Debug, Clone)]
pub struct GameEventChannels {
    pub start_game: EventChannel<()>,
    pub stop_game: EventChannel<()>,
    pub spin_start: EventChannel<()>,
    pub spin_result: EventChannel<i64>,
    pub spin_result_done: EventChannel<()>,
}

impl GameEventChannels {
    pub fn new() -> Self {
        Self {
            start_game: EventChannel::new("start_game"),
            stop_game: EventChannel::new("stop_game"),
            spin_start: EventChannel::new("spin_start"),
            spin_result: EventChannel::new("spin_result"),
            spin_result_done: EventChannel::new("spin_result_done"),
        }
    }

    /// Route an event to its channel; returns how many handlers ran
    pub fn raise(&self, event: GameEvent) -> usize {
        match event {
            GameEvent::StartGame => self.start_game.fire(),
            GameEvent::StopGame => self.stop_game.fire(),
            GameEvent::SpinStart => self.spin_start.fire(),
            GameEvent::SpinResult(value) => self.spin_result.raise(&value),
            GameEvent::SpinResultDone => self.spin_result_done.fire(),
        }
    }
}

impl Default for GameEventChannels {
    fn default() -> Self {
        Self::new()
    }
}
