//! LUT application, FXAA and the final (rescaling) composite.

use glam::Vec4;

use super::color_grading::GradingParams;
use super::{PostFxPass, PostFxReport, PostFxStack};
use crate::renderer::context::FrameContext;
use crate::renderer::host::{
    HDR_COLOR_FORMAT, LDR_COLOR_FORMAT, RenderTarget, TemporaryTargetDesc,
};
use crate::renderer::keywords::KeywordSelection;
use crate::renderer::properties::properties;
use crate::resources::PostFxSettings;

impl PostFxStack {
    fn configure_fxaa(&self, ctx: &mut FrameContext<'_>) {
        ctx.host
            .set_keyword(KeywordSelection::FxaaQuality(self.fxaa.quality()));
        ctx.host
            .set_global_vector(properties().fxaa_config, self.fxaa.config_vector());
    }

    /// Bakes and uploads the LUT, then grades `source` onto the camera target.
    pub(super) fn apply_color_grading(
        &mut self,
        ctx: &mut FrameContext<'_>,
        settings: &PostFxSettings,
        source: RenderTarget,
    ) -> PostFxReport {
        let p = properties();
        let mut report = PostFxReport::default();
        ctx.host.begin_sample("Color Grading and Tone Mapping");

        let resolution = self.lut_resolution;
        let lut_width = resolution * resolution;
        let log_c = self.use_hdr && settings.tone_mapping.needs_log_input();
        let params = GradingParams::from_settings(settings);

        ctx.get_temporary(
            p.color_grading_lut,
            TemporaryTargetDesc::color(lut_width, resolution, HDR_COLOR_FORMAT),
        );
        let (texels, baked) = self.lut_cache.get_or_bake(&params, resolution, log_c);
        ctx.host
            .write_texture(RenderTarget::Temporary(p.color_grading_lut), texels);
        report.lut_baked = baked;

        ctx.host.set_global_texture(
            p.color_grading_lut,
            RenderTarget::Temporary(p.color_grading_lut),
        );
        ctx.host.set_global_vector(
            p.color_grading_lut_parameters,
            Vec4::new(
                1.0 / lut_width as f32,
                1.0 / resolution as f32,
                resolution as f32 - 1.0,
                0.0,
            ),
        );
        ctx.host
            .set_global_float(p.color_grading_lut_in_log_c, if log_c { 1.0 } else { 0.0 });
        ctx.host.set_global_float(p.final_src_blend, 1.0);
        ctx.host.set_global_float(p.final_dst_blend, 0.0);

        let buffer = self.buffer_size;
        // Luma rides in alpha unless the caller needs the real alpha.
        let (apply_pass, fxaa_pass) = if self.fxaa.keep_alpha {
            (PostFxPass::ApplyColorGrading, PostFxPass::Fxaa)
        } else {
            (PostFxPass::ApplyColorGradingWithLuma, PostFxPass::FxaaWithLuma)
        };

        if self.fxaa.enabled {
            self.configure_fxaa(ctx);
            ctx.get_temporary(
                p.color_grading_result,
                TemporaryTargetDesc::color(buffer.x, buffer.y, LDR_COLOR_FORMAT),
            );
            self.draw(
                ctx,
                source,
                RenderTarget::Temporary(p.color_grading_result),
                apply_pass,
            );
            ctx.release_temporary(p.color_grading_lut);
            report.fxaa = true;
        }

        if buffer == self.camera_size {
            if self.fxaa.enabled {
                self.draw_final(
                    ctx,
                    RenderTarget::Temporary(p.color_grading_result),
                    fxaa_pass,
                );
                ctx.release_temporary(p.color_grading_result);
            } else {
                self.draw_final(ctx, source, PostFxPass::ApplyColorGrading);
                ctx.release_temporary(p.color_grading_lut);
            }
        } else {
            ctx.get_temporary(
                p.final_result,
                TemporaryTargetDesc::color(buffer.x, buffer.y, LDR_COLOR_FORMAT),
            );
            if self.fxaa.enabled {
                self.draw(
                    ctx,
                    RenderTarget::Temporary(p.color_grading_result),
                    RenderTarget::Temporary(p.final_result),
                    fxaa_pass,
                );
                ctx.release_temporary(p.color_grading_result);
            } else {
                self.draw(
                    ctx,
                    source,
                    RenderTarget::Temporary(p.final_result),
                    PostFxPass::ApplyColorGrading,
                );
                ctx.release_temporary(p.color_grading_lut);
            }

            let bicubic = self
                .bicubic_rescaling
                .uses_bicubic(buffer.x, self.camera_size.x);
            ctx.host
                .set_global_float(p.copy_bicubic, if bicubic { 1.0 } else { 0.0 });
            self.draw_final(
                ctx,
                RenderTarget::Temporary(p.final_result),
                PostFxPass::FinalRescale,
            );
            ctx.release_temporary(p.final_result);
            report.rescaled = true;
            report.bicubic = bicubic;
        }

        ctx.host.end_sample("Color Grading and Tone Mapping");
        report
    }
}
