use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{PlateError, PlateResult};
use crate::text::layout::{PlacedSegment, TEXT_SHADOW_ALPHA, TEXT_SHADOW_OFFSET, TextMeasure};

/// Environment variable naming the overlay font file.
pub const FONT_ENV: &str = "PLATELOCK_FONT";

/// Locations probed when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/local/share/fonts/DejaVuSans.ttf",
    "/Library/Fonts/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) fn from_rgba(c: [u8; 4]) -> Self {
        Self {
            r: c[0],
            g: c[1],
            b: c[2],
            a: c[3],
        }
    }
}

/// Find a usable font file: explicit path, then `PLATELOCK_FONT`, then common system locations.
pub fn discover_font_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Some(p) = std::env::var_os(FONT_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(p));
    }
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Shapes, measures, and rasterizes overlay text with a single font face.
///
/// Shaping and measurement go through Parley; glyph coverage is rendered by `vello_cpu`.
pub struct TextRenderer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl TextRenderer {
    /// Register raw TTF/OTF bytes.
    pub fn from_bytes(font_bytes: Vec<u8>) -> PlateResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| PlateError::font("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PlateError::font("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    pub fn from_path(path: &Path) -> PlateResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        let renderer = Self::from_bytes(bytes)?;
        tracing::debug!(path = %path.display(), family = %renderer.family_name, "loaded overlay font");
        Ok(renderer)
    }

    /// Load the font chosen by [`discover_font_path`].
    pub fn discover(explicit: Option<&Path>) -> PlateResult<Self> {
        let path = discover_font_path(explicit).ok_or_else(|| {
            PlateError::font(format!(
                "no overlay font found; pass a font path or set {FONT_ENV}"
            ))
        })?;
        Self::from_path(&path)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> PlateResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PlateError::invalid_argument(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Rasterize `segments` onto a transparent `width x height` layer.
    ///
    /// Returns premultiplied RGBA8 bytes. When `shadow` is set each segment gets a translucent
    /// black copy at `(+2, +2)` drawn before the segment itself.
    pub(crate) fn rasterize_segments(
        &mut self,
        width: u32,
        height: u32,
        segments: &[PlacedSegment],
        color: [u8; 4],
        shadow: bool,
    ) -> PlateResult<Vec<u8>> {
        let w: u16 = width.try_into().map_err(|_| {
            PlateError::invalid_argument("overlay canvas width exceeds 65535 px")
        })?;
        let h: u16 = height.try_into().map_err(|_| {
            PlateError::invalid_argument("overlay canvas height exceeds 65535 px")
        })?;

        let brush = TextBrushRgba8::from_rgba(color);
        let shadow_brush = TextBrushRgba8::from_rgba([0, 0, 0, TEXT_SHADOW_ALPHA]);
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        for seg in segments {
            // Segments anchored past the right or bottom edge cannot touch the layer.
            if seg.x >= i64::from(width) || seg.y >= i64::from(height) {
                continue;
            }
            let layout = self.layout(&seg.text, seg.font_size as f32, brush)?;
            if shadow {
                fill_layout(
                    &mut ctx,
                    &layout,
                    &self.font,
                    seg.x.saturating_add(TEXT_SHADOW_OFFSET),
                    seg.y.saturating_add(TEXT_SHADOW_OFFSET),
                    Some(shadow_brush),
                );
            }
            fill_layout(&mut ctx, &layout, &self.font, seg.x, seg.y, None);
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }
}

impl TextMeasure for TextRenderer {
    fn measure(&mut self, text: &str, size_px: u32) -> PlateResult<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let layout = self.layout(text, size_px as f32, TextBrushRgba8::default())?;
        Ok(layout.width())
    }
}

fn fill_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    x: i64,
    y: i64,
    brush_override: Option<TextBrushRgba8>,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x as f64, y as f64)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = brush_override.unwrap_or(run.style().brush);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            // Absolute pen positions within the layout, baseline included.
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_font_path_wins() {
        let p = Path::new("/nonexistent/font.ttf");
        assert_eq!(discover_font_path(Some(p)), Some(p.to_path_buf()));
    }

    #[test]
    fn garbage_bytes_are_a_font_error() {
        let err = TextRenderer::from_bytes(b"not a font".to_vec()).unwrap_err();
        assert!(matches!(err, PlateError::Font(_)));
    }

    #[test]
    fn missing_font_file_is_reported() {
        assert!(TextRenderer::from_path(Path::new("/nonexistent/font.ttf")).is_err());
    }

    #[test]
    fn brush_from_rgba_keeps_channels() {
        let b = TextBrushRgba8::from_rgba([1, 2, 3, 4]);
        assert_eq!((b.r, b.g, b.b, b.a), (1, 2, 3, 4));
    }
}
