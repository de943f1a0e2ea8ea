//! # rf-flare: Cabinet Flare Lights
//!
//! Drives the cabinet's flare emitters: a library of looping pulse patterns
//! and a single-slot scheduler that runs exactly one of them at a time.
//!
//! ## Architecture
//!
//! ```text
//! FlareScheduler
//!     │
//!     ├── FlareSet (N emitters, fixed)
//!     ├── AmbientFlareConfig (idle show tuning)
//!     └── Option<ActiveFlareTask>
//!           │
//!           v
//!     FlarePattern::pulse_slots → EffectSink::fire_trigger(Flare(i), Flare)
//! ```
//!
//! Higher-priority callers (spin start, win celebrations) take the slot with
//! [`FlareScheduler::preempt`]; when the slot empties the scheduler falls
//! back to a random ambient pattern.

pub mod ambient;
pub mod pattern;
pub mod scheduler;
pub mod set;

pub use ambient::*;
pub use pattern::*;
pub use scheduler::*;
pub use set::*;
