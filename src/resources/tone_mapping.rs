//! Tone Mapping Configuration
//!
//! Tone mapping is the last step baked into the color grading LUT. The
//! curve is selected per pipeline and compresses HDR values into the
//! displayable range.

use serde::{Deserialize, Serialize};

/// Tone mapping curve selection.
///
/// - [`None`](ToneMappingMode::None): graded values pass through unchanged
/// - [`Aces`](ToneMappingMode::Aces): filmic curve with a toe and a shoulder
/// - [`Neutral`](ToneMappingMode::Neutral): minimal hue and saturation shift
/// - [`Reinhard`](ToneMappingMode::Reinhard): `c / (c + 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToneMappingMode {
    #[default]
    None,
    Aces,
    Neutral,
    Reinhard,
}

impl ToneMappingMode {
    /// Returns a human-readable name for the mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Aces => "ACES",
            Self::Neutral => "Neutral",
            Self::Reinhard => "Reinhard",
        }
    }

    /// Returns all available tone mapping modes.
    #[must_use]
    pub const fn all() -> &'static [ToneMappingMode] {
        &[Self::None, Self::Aces, Self::Neutral, Self::Reinhard]
    }

    /// Whether the LUT input is encoded in LogC when rendering in HDR.
    ///
    /// Only a tone-mapped LUT can cover the HDR range, so the untouched
    /// `None` curve keeps a linear LUT input.
    #[inline]
    #[must_use]
    pub const fn needs_log_input(self) -> bool {
        !matches!(self, Self::None)
    }
}
