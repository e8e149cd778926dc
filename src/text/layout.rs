use crate::foundation::core::OverlayColor;
use crate::foundation::error::{PlateError, PlateResult};

/// Base size never drops below this, so tiny canvases stay legible.
pub const MIN_BASE_FONT_PX: u32 = 18;
/// Shrink-to-fit stops here even if the line is still too wide.
pub const MIN_FIT_FONT_PX: u32 = 10;
/// Drop-shadow copy offset in pixels.
pub const TEXT_SHADOW_OFFSET: i64 = 2;
/// Drop-shadow alpha.
pub const TEXT_SHADOW_ALPHA: u8 = 64;

/// Width of a run of text set on a single line.
pub trait TextMeasure {
    /// Advance width in pixels of `text` at `size_px`, without wrapping.
    fn measure(&mut self, text: &str, size_px: u32) -> PlateResult<f32>;
}

/// Caller-supplied overlay copy. Every field may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayText {
    pub quote: String,
    pub attribution: String,
    pub product_label: String,
}

impl OverlayText {
    pub fn new(
        quote: impl Into<String>,
        attribution: impl Into<String>,
        product_label: impl Into<String>,
    ) -> Self {
        Self {
            quote: quote.into(),
            attribution: attribution.into(),
            product_label: product_label.into(),
        }
    }

    /// `true` when nothing would be drawn after sanitizing.
    pub fn is_empty(&self) -> bool {
        compose_lines(self).is_empty()
    }
}

/// Overlay placement and styling. Ratios are fractions of the image size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayOpts {
    pub color: OverlayColor,
    pub shadow: bool,
    pub left_ratio: f64,
    pub top_ratio: f64,
    pub wrap_ratio: f64,
}

impl Default for OverlayOpts {
    fn default() -> Self {
        Self {
            color: OverlayColor::Black,
            shadow: true,
            left_ratio: 0.06,
            top_ratio: 0.10,
            wrap_ratio: 0.44,
        }
    }
}

impl OverlayOpts {
    pub fn validate(&self) -> PlateResult<()> {
        for (name, v) in [
            ("left_ratio", self.left_ratio),
            ("top_ratio", self.top_ratio),
            ("wrap_ratio", self.wrap_ratio),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(PlateError::invalid_argument(format!(
                    "overlay {name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        Ok(())
    }
}

/// One wrapped run of text with its top-left position and size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedSegment {
    /// Text drawn for this segment.
    pub text: String,
    /// Index of the logical line (quote, attribution, product) this segment came from.
    pub line: usize,
    /// Left edge in pixels.
    pub x: i64,
    /// Top edge in pixels.
    pub y: i64,
    /// Pixel size shared by every segment of the same line.
    pub font_size: u32,
}

/// Full overlay layout for one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayPlan {
    /// Starting size before any shrink-to-fit.
    pub base_font_size: u32,
    /// Wrap width in pixels.
    pub max_width: u32,
    /// Sanitized logical lines, before wrapping.
    pub lines: Vec<String>,
    /// Wrapped segments in drawing order.
    pub segments: Vec<PlacedSegment>,
}

/// Trim and drop literal `[`/`]` so unresolved template placeholders never reach the art.
pub fn sanitize(s: &str) -> String {
    s.replace(['[', ']'], "").trim().to_string()
}

/// Logical overlay lines in fixed order: quote, attribution, product label.
pub fn compose_lines(text: &OverlayText) -> Vec<String> {
    let mut lines = Vec::with_capacity(3);
    let quote = sanitize(&text.quote);
    if !quote.is_empty() {
        lines.push(format!("\u{201C}{quote}\u{201D}"));
    }
    let attribution = sanitize(&text.attribution);
    if !attribution.is_empty() {
        lines.push(format!("\u{2014} {attribution}"));
    }
    let product = sanitize(&text.product_label);
    if !product.is_empty() {
        lines.push(product);
    }
    lines
}

pub fn base_font_size(width: u32, height: u32) -> u32 {
    let scaled = (f64::from(width.min(height)) * 0.04).floor() as u32;
    scaled.max(MIN_BASE_FONT_PX)
}

/// Shrink from `base` one pixel at a time until the unwrapped line fits `max_width`.
pub fn fit_font_size<M: TextMeasure + ?Sized>(
    measure: &mut M,
    line: &str,
    base: u32,
    max_width: u32,
) -> PlateResult<u32> {
    let limit = max_width as f32;
    let mut size = base;
    while size > MIN_FIT_FONT_PX && measure.measure(line, size)? > limit {
        size -= 1;
    }
    Ok(size)
}

/// Greedy word wrap at a fixed size.
///
/// A single word wider than `max_width` becomes a segment of its own.
pub fn wrap_words<M: TextMeasure + ?Sized>(
    measure: &mut M,
    line: &str,
    size: u32,
    max_width: u32,
) -> PlateResult<Vec<String>> {
    let limit = max_width as f32;
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.measure(&candidate, size)? <= limit {
            current = candidate;
        } else {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    Ok(wrapped)
}

/// Lay out the overlay for a `width x height` image. `None` when there is nothing to draw.
pub fn plan_overlay<M: TextMeasure + ?Sized>(
    measure: &mut M,
    width: u32,
    height: u32,
    text: &OverlayText,
    opts: &OverlayOpts,
) -> PlateResult<Option<OverlayPlan>> {
    opts.validate()?;
    let lines = compose_lines(text);
    if lines.is_empty() {
        return Ok(None);
    }

    let x = (f64::from(width) * opts.left_ratio).floor() as i64;
    let mut y = (f64::from(height) * opts.top_ratio).floor() as i64;
    let max_width = (f64::from(width) * opts.wrap_ratio).floor() as u32;

    let base = base_font_size(width, height);
    let spacing = (f64::from(base) * 0.6).floor();
    let segment_gap = (spacing * 0.5).floor() as i64;
    let line_gap = (spacing * 0.4).floor() as i64;

    let mut segments = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let font_size = fit_font_size(measure, line, base, max_width)?;
        for seg in wrap_words(measure, line, font_size, max_width)? {
            segments.push(PlacedSegment {
                text: seg,
                line: line_idx,
                x,
                y,
                font_size,
            });
            y = y.saturating_add(i64::from(font_size) + segment_gap);
        }
        y = y.saturating_add(line_gap);
    }

    Ok(Some(OverlayPlan {
        base_font_size: base,
        max_width,
        lines,
        segments,
    }))
}
