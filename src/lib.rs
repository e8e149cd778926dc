//! Platelock composites real product photos onto generated background plates.
//!
//! The product's pixels are never regenerated: a cutout of the photo is scaled, given a soft
//! drop shadow, and alpha-composited onto each plate. On top of that the crate provides:
//!
//! - Center cropping to a target aspect ratio ([`aspect_crop`])
//! - Deterministic overlay text with shrink-to-fit and word wrap ([`render_overlay`])
//! - A [`Campaign`] that generates, composites, edits and exports one asset per style
#![forbid(unsafe_code)]

mod foundation;
mod raster;

pub mod asset;
pub mod campaign;
pub mod compositor;
pub mod config;
pub mod crop;
pub mod cutout;
pub mod encode;
pub mod generate;
pub mod shadow;
pub(crate) mod text;

pub use crate::foundation::core::{AspectRatio, Offset, OverlayColor, RgbaImage};
pub use crate::foundation::error::{PlateError, PlateResult};

pub use crate::asset::{AssetKind, AssetStyle, StyleSheet, default_styles};
pub use crate::campaign::{
    AssetFailure, AssetSlot, BatchReport, Campaign, ExportedAsset, PreviewOpts, SlotId,
};
pub use crate::compositor::{CompositeOpts, Placement, composite_on_plate, placement_for};
pub use crate::config::CampaignConfig;
pub use crate::crop::{aspect_crop, resize_for_display};
pub use crate::cutout::{
    BackgroundRemover, CommandRemover, PassthroughRemover, cutout_or_original, has_transparency,
    select_remover,
};
pub use crate::generate::{ImageGenerator, PlateDirGenerator, PlateRequest};
pub use crate::shadow::{ShadowParams, make_shadow};
pub use crate::text::font::{FONT_ENV, TextRenderer, discover_font_path};
pub use crate::text::layout::{
    OverlayOpts, OverlayPlan, OverlayText, PlacedSegment, TextMeasure, base_font_size,
    compose_lines, fit_font_size, plan_overlay, sanitize, wrap_words,
};
pub use crate::text::render_overlay;
