//! Streaming sample-rate conversion for mono `f32` audio.
//!
//! This crate provides:
//!
//! - `engine`: the [`Resampler`], a streaming front end over rubato's
//!   sinc resampler with constant-ratio and variable-ratio modes
//! - `quality`: the four quality presets and their filter recipes
//! - `prefs`: preference stores consulted for the configured preset
//! - `i18n`: localized preset display names
//! - `reader`: an `io::Read` adapter over little-endian `f32` byte streams
//!
//! # Example
//!
//! ```rust
//! use giztoy_resample::{NoPrefs, Resampler};
//!
//! // 48 kHz -> 44.1 kHz with the configured high-quality preset
//! let ratio = 44100.0 / 48000.0;
//! let mut resampler = Resampler::create(&NoPrefs, true, ratio, ratio)?;
//!
//! let input = vec![0.0f32; 4800];
//! let mut output = vec![0.0f32; 1024];
//! let mut rest = &input[..];
//! let mut total = 0;
//! loop {
//!     let (consumed, produced) = resampler.process(ratio, rest, true, &mut output);
//!     rest = &rest[consumed..];
//!     total += produced;
//!     if produced == 0 {
//!         break;
//!     }
//! }
//! assert!((total as i64 - 4410).abs() <= 1);
//! # Ok::<(), giztoy_resample::Error>(())
//! ```

pub mod engine;
pub mod error;
pub mod i18n;
pub mod prefs;
pub mod quality;
pub mod reader;
mod sample_reader;

pub use engine::{RatioMode, Resampler, State};
pub use error::{Error, Result};
pub use i18n::{Catalog, Translator, Untranslated, install_preset_names, preset_names};
pub use prefs::{FilePrefs, MemoryPrefs, NoPrefs, Prefs};
pub use quality::{
    PRESET_COUNT, Quality, best_config_key, best_default_index, fast_config_key,
    fast_default_index, preset_count, preset_display_name,
};
pub use reader::Reader;
