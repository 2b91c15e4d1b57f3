//! Quality presets.
//!
//! There are exactly four presets, ordered fastest to best. Each maps to a
//! sinc filter recipe; the longer the kernel and the finer its table, the
//! lower the aliasing and the higher the CPU cost.

use std::fmt;
use std::str::FromStr;

use rubato::{
    SincInterpolationParameters, SincInterpolationType, WindowFunction, calculate_cutoff,
};
use thiserror::Error;

use crate::prefs::Prefs;

/// Number of quality presets.
pub const PRESET_COUNT: usize = 4;

/// A resampling quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quality {
    /// Short Hann kernel, linear table interpolation.
    Low,
    /// Blackman kernel, linear table interpolation.
    Medium,
    /// Blackman-Harris kernel, linear table interpolation.
    /// Also the fixed recipe for variable-ratio resampling.
    High,
    /// Long Blackman-Harris kernel, cubic table interpolation.
    Best,
}

impl Quality {
    /// All presets, fastest first. `ALL[q.index()] == q`.
    pub const ALL: [Quality; PRESET_COUNT] =
        [Quality::Low, Quality::Medium, Quality::High, Quality::Best];

    /// Preset used for fast conversions when nothing is configured.
    pub const FAST_DEFAULT: Quality = Quality::Medium;
    /// Preset used for high-quality conversions when nothing is configured.
    pub const BEST_DEFAULT: Quality = Quality::Best;

    /// Preference key holding the fast preset index.
    pub const FAST_CONFIG_KEY: &'static str = "/Quality/LibsoxrSampleRateConverter";
    /// Preference key holding the high-quality preset index.
    pub const BEST_CONFIG_KEY: &'static str = "/Quality/LibsoxrHQSampleRateConverter";

    /// Position of this preset in [`Quality::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Quality::Low => 0,
            Quality::Medium => 1,
            Quality::High => 2,
            Quality::Best => 3,
        }
    }

    /// Returns the preset at `index`, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Untranslated display name.
    pub const fn name(self) -> &'static str {
        match self {
            Quality::Low => "Low Quality (Fastest)",
            Quality::Medium => "Medium Quality",
            Quality::High => "High Quality",
            Quality::Best => "Best Quality (Slowest)",
        }
    }

    /// Short identifier used by `Display` and `FromStr`.
    pub const fn id(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
            Quality::Best => "best",
        }
    }

    /// Sinc filter recipe for this preset.
    ///
    /// `sinc_len` is the filter length in input samples. The cutoff is
    /// relative to the Nyquist frequency of the lower of the two rates and
    /// is fitted to the length and window.
    pub fn recipe(self) -> SincInterpolationParameters {
        let (sinc_len, interpolation, oversampling_factor, window) = match self {
            Quality::Low => (32, SincInterpolationType::Linear, 64, WindowFunction::Hann2),
            Quality::Medium => (64, SincInterpolationType::Linear, 128, WindowFunction::Blackman2),
            Quality::High => (
                128,
                SincInterpolationType::Linear,
                256,
                WindowFunction::BlackmanHarris2,
            ),
            Quality::Best => (
                256,
                SincInterpolationType::Cubic,
                256,
                WindowFunction::BlackmanHarris2,
            ),
        };
        SincInterpolationParameters {
            sinc_len,
            f_cutoff: calculate_cutoff(sinc_len, window),
            interpolation,
            oversampling_factor,
            window,
        }
    }

    /// Resolves the configured preset from `prefs`.
    ///
    /// Reads the high-quality slot when `use_best` is set, the fast slot
    /// otherwise. An unset key yields the slot default; a stored value that
    /// is not a preset index is logged and also yields the slot default.
    pub fn resolve(prefs: &dyn Prefs, use_best: bool) -> Quality {
        let (key, default) = if use_best {
            (Self::BEST_CONFIG_KEY, Self::BEST_DEFAULT)
        } else {
            (Self::FAST_CONFIG_KEY, Self::FAST_DEFAULT)
        };

        let stored = prefs.read_int(key, default.index() as i64);
        match Quality::try_from(stored) {
            Ok(quality) => quality,
            Err(InvalidQuality) => {
                tracing::warn!(
                    key,
                    stored,
                    fallback = %default,
                    "ignoring out-of-range quality preference"
                );
                default
            }
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when a value does not name a quality preset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("resample: invalid quality preset")]
pub struct InvalidQuality;

impl FromStr for Quality {
    type Err = InvalidQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.id().eq_ignore_ascii_case(s))
            .ok_or(InvalidQuality)
    }
}

impl TryFrom<i64> for Quality {
    type Error = InvalidQuality;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(Quality::from_index)
            .ok_or(InvalidQuality)
    }
}

/// Returns the number of quality presets (always 4).
pub fn preset_count() -> usize {
    PRESET_COUNT
}

/// Returns the display name of the preset at `index`.
///
/// The name is localized if a name table was installed with
/// [`install_preset_names`](crate::i18n::install_preset_names), and the
/// untranslated name otherwise.
///
/// # Panics
///
/// Panics if `index >= preset_count()`.
pub fn preset_display_name(index: usize) -> &'static str {
    match crate::i18n::installed_preset_names() {
        Some(names) => names[index].as_str(),
        None => Quality::ALL[index].name(),
    }
}

/// Default preset index for the fast slot.
pub fn fast_default_index() -> usize {
    Quality::FAST_DEFAULT.index()
}

/// Default preset index for the high-quality slot.
pub fn best_default_index() -> usize {
    Quality::BEST_DEFAULT.index()
}

/// Preference key for the fast slot.
pub fn fast_config_key() -> &'static str {
    Quality::FAST_CONFIG_KEY
}

/// Preference key for the high-quality slot.
pub fn best_config_key() -> &'static str {
    Quality::BEST_CONFIG_KEY
}
