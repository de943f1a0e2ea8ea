//! ReelForge Cabinet FX
//!
//! Decorative presentation layer for a slot cabinet. Three schedulers share
//! one frame clock and one effect sink:
//!
//! - **Flares** (`rf-flare`): one looping light pattern at a time, ambient
//!   when nothing else claims the slot
//! - **Music**: non-overlapping background clips, faster rotation in-game
//! - **Wins**: tiered celebration per spin result, then "spin result done"
//!
//! ## Architecture
//!
//! ```text
//!  GameEventChannels ──attach()──▶ CabinetFx ──▶ EffectSink
//!   start/stop game                 ├─ MusicScheduler
//!   spin start ───────────────────▶ ├─ FlareScheduler  (preempt: Rounding)
//!   spin result ──────────────────▶ └─ WinSequencer    (preempt: Paired)
//!   spin result done ◀──────────────── tick(now)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use rf_cabinet_fx::{CabinetFx, CabinetFxConfig};
//! use rf_core::RecordingSink;
//! use rf_event::{GameEvent, GameEventChannels};
//!
//! let mut config = CabinetFxConfig::demo();
//! config.seed = Some(7);
//!
//! let fx = Rc::new(RefCell::new(
//!     CabinetFx::new(&config, RecordingSink::new(), 0.0).unwrap(),
//! ));
//! let channels = GameEventChannels::new();
//! let _subs = CabinetFx::attach(&fx, &channels);
//!
//! channels.raise(GameEvent::SpinStart);
//! channels.raise(GameEvent::SpinResult(30));
//! fx.borrow_mut().tick(4.0);
//! assert_eq!(fx.borrow().sink().jackpot_count(), 1);
//! ```

pub mod config;
pub mod director;
pub mod music;
pub mod win;

pub use config::*;
pub use director::*;
pub use music::*;
pub use win::*;

use rf_core::RfError;
use thiserror::Error;

/// Cabinet FX error type
#[derive(Error, Debug)]
pub enum CabinetError {
    #[error(transparent)]
    Core(#[from] RfError),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spin result {rejected} rejected: {pending} sequence still pending")]
    WinSequenceInProgress { pending: WinTier, rejected: i64 },
}

pub type CabinetResult<T> = Result<T, CabinetError>;
