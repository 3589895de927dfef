//! Bloom Pyramid
//!
//! # Algorithm
//!
//! 1. **Prefilter**: the source is thresholded into a half-resolution target
//!    (optionally averaging out fireflies).
//! 2. **Blur**: each level runs a horizontal then a vertical Gaussian pass
//!    into a target half the size of the previous one, until the downscale
//!    limit or the iteration cap is reached.
//! 3. **Combine**: levels are upsampled back, coarsest first, either added
//!    (intensity 1) or scattered (intensity = `scatter`).
//! 4. **Final**: the last combine is blended with the source into a
//!    buffer-sized `_BloomResult` with the configured intensity.
//!
//! Level `i` uses pyramid slots `2i` (horizontal) and `2i + 1` (vertical).
//! Every temporary is released right after its last read.

use glam::UVec2;
use smallvec::SmallVec;

use super::{PostFxPass, PostFxStack};
use crate::renderer::context::FrameContext;
use crate::renderer::host::{RenderTarget, TemporaryTargetDesc, color_format};
use crate::renderer::properties::properties;
use crate::resources::bloom::MAX_BLOOM_ITERATIONS;
use crate::resources::{BloomMode, BloomSettings};

/// Sizes of every bloom target, or nothing when bloom is inactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomPlan {
    /// Size of the prefilter target (half resolution).
    pub prefilter: UVec2,
    /// Size of each blurred level, finest first.
    pub levels: SmallVec<[UVec2; MAX_BLOOM_ITERATIONS as usize]>,
}

impl BloomPlan {
    /// Plans the pyramid for a buffer of `base` pixels.
    ///
    /// Returns `None` when the half resolution is empty or below twice the
    /// downscale limit, or when iterations or intensity are zero.
    #[must_use]
    pub fn new(settings: &BloomSettings, base: UVec2) -> Option<Self> {
        let half = base / 2;
        let limit = settings.downscale_limit.max(1);
        if half.x == 0
            || half.y == 0
            || settings.effective_iterations() == 0
            || settings.intensity <= 0.0
            || half.x < limit * 2
            || half.y < limit * 2
        {
            return None;
        }

        let mut levels = SmallVec::new();
        let mut size = half / 2;
        for _ in 0..settings.effective_iterations() {
            if size.x < limit || size.y < limit {
                break;
            }
            levels.push(size);
            size /= 2;
        }

        Some(Self {
            prefilter: half,
            levels,
        })
    }

    /// Number of blur levels.
    #[inline]
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// What one bloom draw did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomReport {
    pub levels: usize,
    /// Peak number of simultaneously live bloom targets.
    pub peak_targets: usize,
}

impl PostFxStack {
    /// Draws bloom from `source` into `_BloomResult`.
    ///
    /// Returns `None` (and allocates nothing) when bloom is inactive; the
    /// caller must release `_BloomResult` otherwise.
    pub(super) fn draw_bloom(
        &self,
        ctx: &mut FrameContext<'_>,
        settings: &BloomSettings,
        source: RenderTarget,
    ) -> Option<BloomReport> {
        let p = properties();
        ctx.host
            .set_global_vector(p.bloom_threshold, settings.threshold_vector());

        let base = if settings.ignore_render_scale {
            self.camera_size
        } else {
            self.buffer_size
        };
        let plan = BloomPlan::new(settings, base)?;
        let format = color_format(self.use_hdr);
        let live_before = ctx.targets.live_count();
        let mut peak = 0;

        ctx.host.begin_sample("Bloom");

        ctx.get_temporary(
            p.bloom_prefilter,
            TemporaryTargetDesc::color(plan.prefilter.x, plan.prefilter.y, format),
        );
        let prefilter_pass = if settings.fade_fireflies {
            PostFxPass::BloomPrefilterFadeFireflies
        } else {
            PostFxPass::BloomPrefilter
        };
        self.draw(
            ctx,
            source,
            RenderTarget::Temporary(p.bloom_prefilter),
            prefilter_pass,
        );

        let mut from = p.bloom_prefilter;
        for (level, size) in plan.levels.iter().enumerate() {
            let mid = p.bloom_pyramid[2 * level];
            let to = p.bloom_pyramid[2 * level + 1];
            ctx.get_temporary(mid, TemporaryTargetDesc::color(size.x, size.y, format));
            ctx.get_temporary(to, TemporaryTargetDesc::color(size.x, size.y, format));
            peak = peak.max(ctx.targets.live_count() - live_before);

            self.draw(
                ctx,
                RenderTarget::Temporary(from),
                RenderTarget::Temporary(mid),
                PostFxPass::BloomHorizontal,
            );
            self.draw(
                ctx,
                RenderTarget::Temporary(mid),
                RenderTarget::Temporary(to),
                PostFxPass::BloomVertical,
            );
            from = to;
        }

        let levels = plan.level_count();
        if levels > 0 {
            ctx.release_temporary(p.bloom_pyramid[2 * (levels - 1)]);
        }

        ctx.host.set_global_float(
            p.bloom_bicubic_upsampling,
            if settings.bicubic_upsampling { 1.0 } else { 0.0 },
        );
        let (combine_pass, final_pass) = match settings.mode {
            BloomMode::Additive => {
                ctx.host.set_global_float(p.bloom_intensity, 1.0);
                (PostFxPass::BloomAdd, PostFxPass::BloomAdd)
            }
            BloomMode::Scattering => {
                ctx.host.set_global_float(p.bloom_intensity, settings.scatter);
                (PostFxPass::BloomScatter, PostFxPass::BloomFinal)
            }
        };

        // Walk back up: level + 1 combined with level's blur into level's mid slot.
        for level in (0..levels.saturating_sub(1)).rev() {
            let aux = p.bloom_pyramid[2 * level + 1];
            let dest = p.bloom_pyramid[2 * level];
            ctx.host
                .set_global_texture(p.post_fx_source_aux, RenderTarget::Temporary(aux));
            self.draw(
                ctx,
                RenderTarget::Temporary(from),
                RenderTarget::Temporary(dest),
                combine_pass,
            );
            ctx.release_temporary(from);
            ctx.release_temporary(aux);
            from = dest;
        }

        ctx.host.set_global_float(p.bloom_intensity, settings.intensity);
        ctx.host.set_global_texture(p.post_fx_source_aux, source);
        ctx.get_temporary(
            p.bloom_result,
            TemporaryTargetDesc::color(self.buffer_size.x, self.buffer_size.y, format),
        );
        peak = peak.max(ctx.targets.live_count() - live_before);
        self.draw(
            ctx,
            RenderTarget::Temporary(from),
            RenderTarget::Temporary(p.bloom_result),
            final_pass,
        );
        ctx.release_temporary(from);
        if from != p.bloom_prefilter {
            ctx.release_temporary(p.bloom_prefilter);
        }

        ctx.host.end_sample("Bloom");
        Some(BloomReport {
            levels,
            peak_targets: peak,
        })
    }
}
