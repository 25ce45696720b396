//! Transcript-driven playback pacing.
//!
//! The [`analyzer`] turns upcoming transcript cues into a recommended speed,
//! the [`rate`] controller writes it to the player, and the
//! [`orchestrator`] decides when to do either as videos, ads, seeks and
//! manual changes come and go. [`runtime`] drives it all on tokio.

pub mod analyzer;
pub mod cache;
pub mod cancellation;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod preferences;
pub mod probe;
pub mod rate;
pub mod runtime;
pub mod simulator;
pub mod text_utils;
pub mod transcript;
