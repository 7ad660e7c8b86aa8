#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard chat: locality mention extraction, per-turn context
//! assembly, the streaming relay to the completion service, and
//! transcript summaries.

pub mod config;
pub mod context;
pub mod mentions;
pub mod relay;
pub mod summary;
