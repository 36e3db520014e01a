//! Persisted build state.
//!
//! The builder's configuration is checkpointed under `_build/` so later
//! invocations can resume where `configure` left off.

pub mod checkpoint;

pub use checkpoint::{Checkpoint, BUILD_DIR};
