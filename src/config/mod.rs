//! JSON configuration for the sweep tools.
//!
//! - [`catalog`] – built-in fuels, oxidizers and ignition species.
//! - [`sweep`] – `SweepConfig` with optional overrides resolved onto defaults.

pub mod catalog;
pub mod sweep;

pub use sweep::{load_config, ResolvedConfig, SweepConfig};
