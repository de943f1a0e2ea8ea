//! ReelForge Cabinet Event System
//!
//! Synchronous publish/subscribe plumbing between the game layer and the
//! cabinet presentation:
//! - `EventChannel<T>`: one event kind, any number of handlers
//! - `GameEventChannels`: start/stop game, spin start, spin result, spin result done
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐    raise()     ┌────────────────────────┐
//! │ Game layer       │───────────────▶│ EventChannel<T>        │
//! │ (start, spin...) │                │  handler 1 (sync)      │
//! └──────────────────┘                │  handler 2 (sync)      │
//!                                     └────────────────────────┘
//! ```
//!
//! Everything runs on the game thread. Channels are `Rc`-based and
//! deliberately `!Send`.
//!
//! ## Usage
//!
//! ```rust
//! use rf_event::{GameEvent, GameEventChannels};
//!
//! let channels = GameEventChannels::new();
//! channels.spin_result.subscribe(|result| println!("spin paid {result}"));
//! channels.raise(GameEvent::SpinResult(12));
//! ```

pub mod channel;
pub mod game;

pub use channel::{EventChannel, SubscriptionId};
pub use game::{GameEvent, GameEventChannels, GameEventKind};
