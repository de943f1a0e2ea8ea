//! rf-core: Shared types, traits, and utilities for ReelForge cabinet effects
//!
//! This crate provides the foundational types used across the cabinet
//! crates: the error type, the frame clock, and the presentation
//! collaborator interface the schedulers fire effects through.

mod effects;
mod error;
mod time;

pub use effects::*;
pub use error::*;
pub use time::*;
