//! Shader Keyword Groups
//!
//! Shader variants are selected through small groups of mutually exclusive
//! keywords. Instead of toggling keyword strings one by one, the pipeline
//! hands the host a [`KeywordSelection`]: a tagged value naming the group and
//! the single variant that must be enabled (or none). The host enables that
//! keyword and disables every other keyword of the group, so at most one
//! keyword per group is ever active and nothing leaks between frames.

use crate::resources::{CascadeBlendMode, FxaaQuality, ShadowFilter, ShadowMaskMode};

/// A set of mutually exclusive shader keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeywordGroup {
    DirectionalFilter,
    OtherFilter,
    CascadeBlend,
    ShadowMask,
    LightsPerObject,
    FxaaQuality,
    LutBanding,
}

impl KeywordGroup {
    /// Keywords of the group, in variant order.
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::DirectionalFilter => {
                &["_DIRECTIONAL_PCF3", "_DIRECTIONAL_PCF5", "_DIRECTIONAL_PCF7"]
            }
            Self::OtherFilter => &["_OTHER_PCF3", "_OTHER_PCF5", "_OTHER_PCF7"],
            Self::CascadeBlend => &["_CASCADE_BLEND_SOFT", "_CASCADE_BLEND_DITHER"],
            Self::ShadowMask => &["_SHADOW_MASK_ALWAYS", "_SHADOW_MASK_DISTANCE"],
            Self::LightsPerObject => &["_LIGHTS_PER_OBJECT"],
            Self::FxaaQuality => &["FXAA_QUALITY_LOW", "FXAA_QUALITY_MEDIUM"],
            Self::LutBanding => &["_LUT_BANDING"],
        }
    }

    /// Returns all keyword groups.
    #[must_use]
    pub const fn all() -> &'static [KeywordGroup] {
        &[
            Self::DirectionalFilter,
            Self::OtherFilter,
            Self::CascadeBlend,
            Self::ShadowMask,
            Self::LightsPerObject,
            Self::FxaaQuality,
            Self::LutBanding,
        ]
    }
}

/// The enabled variant of one keyword group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordSelection {
    DirectionalFilter(ShadowFilter),
    OtherFilter(ShadowFilter),
    CascadeBlend(CascadeBlendMode),
    ShadowMask(Option<ShadowMaskMode>),
    LightsPerObject(bool),
    FxaaQuality(FxaaQuality),
    LutBanding(bool),
}

impl KeywordSelection {
    /// The group this selection belongs to.
    #[must_use]
    pub const fn group(self) -> KeywordGroup {
        match self {
            Self::DirectionalFilter(_) => KeywordGroup::DirectionalFilter,
            Self::OtherFilter(_) => KeywordGroup::OtherFilter,
            Self::CascadeBlend(_) => KeywordGroup::CascadeBlend,
            Self::ShadowMask(_) => KeywordGroup::ShadowMask,
            Self::LightsPerObject(_) => KeywordGroup::LightsPerObject,
            Self::FxaaQuality(_) => KeywordGroup::FxaaQuality,
            Self::LutBanding(_) => KeywordGroup::LutBanding,
        }
    }

    /// Index of the enabled keyword within [`KeywordGroup::keywords`], if any.
    #[must_use]
    pub const fn enabled_index(self) -> Option<usize> {
        match self {
            Self::DirectionalFilter(filter) | Self::OtherFilter(filter) => match filter {
                ShadowFilter::Pcf2x2 => None,
                ShadowFilter::Pcf3x3 => Some(0),
                ShadowFilter::Pcf5x5 => Some(1),
                ShadowFilter::Pcf7x7 => Some(2),
            },
            Self::CascadeBlend(mode) => match mode {
                CascadeBlendMode::Hard => None,
                CascadeBlendMode::Soft => Some(0),
                CascadeBlendMode::Dither => Some(1),
            },
            Self::ShadowMask(mode) => match mode {
                None => None,
                Some(ShadowMaskMode::Always) => Some(0),
                Some(ShadowMaskMode::Distance) => Some(1),
            },
            Self::FxaaQuality(quality) => match quality {
                FxaaQuality::Low => Some(0),
                FxaaQuality::Medium => Some(1),
                FxaaQuality::High => None,
            },
            Self::LightsPerObject(enabled) | Self::LutBanding(enabled) => {
                if enabled {
                    Some(0)
                } else {
                    None
                }
            }
        }
    }

    /// The enabled keyword, if any.
    #[must_use]
    pub fn enabled_keyword(self) -> Option<&'static str> {
        self.enabled_index()
            .map(|index| self.group().keywords()[index])
    }

    /// Whether `keyword` of this group ends up enabled.
    #[must_use]
    pub fn is_enabled(self, keyword: &str) -> bool {
        self.enabled_keyword() == Some(keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_selection_enables_at_most_one_keyword() {
        let selections = [
            KeywordSelection::DirectionalFilter(ShadowFilter::Pcf7x7),
            KeywordSelection::OtherFilter(ShadowFilter::Pcf2x2),
            KeywordSelection::CascadeBlend(CascadeBlendMode::Dither),
            KeywordSelection::ShadowMask(Some(ShadowMaskMode::Always)),
            KeywordSelection::LightsPerObject(true),
            KeywordSelection::FxaaQuality(FxaaQuality::Medium),
            KeywordSelection::LutBanding(false),
        ];
        for selection in selections {
            let enabled = selection
                .group()
                .keywords()
                .iter()
                .filter(|k| selection.is_enabled(k))
                .count();
            assert!(enabled <= 1, "{selection:?} enabled {enabled} keywords");
        }
    }

    #[test]
    fn filter_ordinals_map_to_pcf_keywords() {
        assert_eq!(
            KeywordSelection::DirectionalFilter(ShadowFilter::Pcf5x5).enabled_keyword(),
            Some("_DIRECTIONAL_PCF5")
        );
        assert_eq!(
            KeywordSelection::OtherFilter(ShadowFilter::Pcf3x3).enabled_keyword(),
            Some("_OTHER_PCF3")
        );
        assert_eq!(
            KeywordSelection::DirectionalFilter(ShadowFilter::Pcf2x2).enabled_keyword(),
            None
        );
    }
}
