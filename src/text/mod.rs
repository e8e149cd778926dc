//! Deterministic overlay text: sanitize, shrink-to-fit, wrap, and draw onto a copy of an image.

pub(crate) mod font;
pub(crate) mod layout;

use image::RgbaImage;

use crate::foundation::error::{PlateError, PlateResult};
use crate::raster::blend::{alpha_composite_at, unpremultiply_rgba8_in_place};

use self::font::TextRenderer;
use self::layout::{OverlayOpts, OverlayText, plan_overlay};

/// Render overlay copy onto a copy of `base`.
///
/// All-empty copy returns `base` unchanged.
#[tracing::instrument(skip(base, text, renderer), fields(size = ?base.dimensions()))]
pub fn render_overlay(
    base: &RgbaImage,
    text: &OverlayText,
    opts: &OverlayOpts,
    renderer: &mut TextRenderer,
) -> PlateResult<RgbaImage> {
    let (w, h) = base.dimensions();
    let Some(plan) = plan_overlay(renderer, w, h, text, opts)? else {
        return Ok(base.clone());
    };
    tracing::debug!(
        base_font_size = plan.base_font_size,
        max_width = plan.max_width,
        segments = plan.segments.len(),
        "overlay layout"
    );

    let mut layer =
        renderer.rasterize_segments(w, h, &plan.segments, opts.color.rgba(), opts.shadow)?;
    unpremultiply_rgba8_in_place(&mut layer);
    let layer = RgbaImage::from_raw(w, h, layer)
        .ok_or_else(|| PlateError::Other(anyhow::anyhow!("text layer byte length mismatch")))?;

    let mut out = base.clone();
    alpha_composite_at(&mut out, &layer, 0, 0);
    Ok(out)
}
