//! Campaign orchestration: one asset slot per style, each holding its current plate and
//! composite.
//!
//! A slot's plate and composite are only ever replaced together, so the pair a caller reads is
//! always consistent. Upstream generation failures are caught per asset; one failing asset
//! never aborts the rest of a batch.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use rayon::prelude::*;

use crate::asset::{AssetKind, AssetStyle};
use crate::compositor::{CompositeOpts, composite_on_plate};
use crate::crop::aspect_crop;
use crate::cutout::{BackgroundRemover, cutout_or_original};
use crate::encode::{encode_png, write_png};
use crate::foundation::core::{AspectRatio, ensure_non_empty};
use crate::foundation::error::{PlateError, PlateResult};
use crate::generate::{ImageGenerator, PlateRequest};
use crate::text::font::TextRenderer;
use crate::text::layout::{OverlayOpts, OverlayText};
use crate::text::render_overlay;

/// Position of an asset in the campaign's style list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Current state of one asset.
#[derive(Clone, Debug)]
pub struct AssetSlot {
    style: AssetStyle,
    plate: RgbaImage,
    composite: RgbaImage,
    preview: Option<RgbaImage>,
}

impl AssetSlot {
    pub fn kind(&self) -> AssetKind {
        self.style.asset_type
    }

    pub fn style(&self) -> &AssetStyle {
        &self.style
    }

    /// Background plate without the product.
    pub fn plate(&self) -> &RgbaImage {
        &self.plate
    }

    /// Plate with the product composited on top.
    pub fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    /// What an export writes: the preview if one was rendered, else the composite.
    pub fn final_image(&self) -> &RgbaImage {
        self.preview.as_ref().unwrap_or(&self.composite)
    }

    fn replace_plate(&mut self, plate: RgbaImage, composite: RgbaImage) {
        self.plate = plate;
        self.composite = composite;
        self.preview = None;
    }
}

/// Crop and overlay applied on top of a slot's composite.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewOpts {
    /// Center crop target. `None` keeps the composite's shape.
    pub aspect: Option<AspectRatio>,
    /// Overlay copy. `None` skips the overlay entirely.
    pub overlay: Option<OverlayText>,
    pub overlay_opts: OverlayOpts,
}

/// One asset that produced no output in a batch.
#[derive(Debug)]
pub struct AssetFailure {
    /// Slot the asset would have occupied.
    pub slot: SlotId,
    /// Asset format that failed.
    pub kind: AssetKind,
    /// Why it failed.
    pub error: PlateError,
}

/// Per-asset outcome of [`Campaign::generate_all`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Slots that now hold a plate and composite, in style order.
    pub succeeded: Vec<SlotId>,
    /// Recoverable per-asset failures.
    pub failed: Vec<AssetFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// `true` when at least one asset was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }
}

/// A finished asset ready to be written out.
#[derive(Clone, Debug)]
pub struct ExportedAsset {
    /// Source slot.
    pub slot: SlotId,
    /// Kind-based name such as `instagram_story.png`.
    pub file_name: String,
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
}

pub struct Campaign {
    generator: Box<dyn ImageGenerator>,
    product: RgbaImage,
    composite: CompositeOpts,
    threads: Option<usize>,
    slots: BTreeMap<SlotId, AssetSlot>,
}

impl fmt::Debug for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Campaign")
            .field("product", &self.product.dimensions())
            .field("composite", &self.composite)
            .field("threads", &self.threads)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl Campaign {
    /// Prepare a campaign for `product`. The cutout is computed once here and reused by every
    /// composite and re-composite.
    pub fn new(
        generator: Box<dyn ImageGenerator>,
        remover: &dyn BackgroundRemover,
        product: &RgbaImage,
        composite: CompositeOpts,
    ) -> PlateResult<Self> {
        composite.validate()?;
        ensure_non_empty(product, "product image")?;
        let product = cutout_or_original(remover, product);
        Ok(Self {
            generator,
            product,
            composite,
            threads: None,
            slots: BTreeMap::new(),
        })
    }

    /// Worker count for [`Campaign::generate_all`]. `None` uses rayon's default.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn product_cutout(&self) -> &RgbaImage {
        &self.product
    }

    pub fn slot(&self, id: SlotId) -> Option<&AssetSlot> {
        self.slots.get(&id)
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &AssetSlot)> {
        self.slots.iter().map(|(id, slot)| (*id, slot))
    }

    /// Generate and composite every style, replacing all existing slots.
    ///
    /// Recoverable upstream failures are collected in the report. Anything else is a caller bug
    /// and is returned as an error, leaving the existing slots untouched.
    #[tracing::instrument(skip(self, styles), fields(assets = styles.len()))]
    pub fn generate_all(&mut self, styles: &[AssetStyle]) -> PlateResult<BatchReport> {
        let pool = build_thread_pool(self.threads)?;

        let generator = self.generator.as_ref();
        let product = &self.product;
        let opts = &self.composite;
        let results: Vec<PlateResult<AssetSlot>> = pool.install(|| {
            styles
                .par_iter()
                .map(|style| build_slot(generator, product, opts, style))
                .collect()
        });

        let mut slots = BTreeMap::new();
        let mut report = BatchReport::default();
        for (idx, (style, result)) in styles.iter().zip(results).enumerate() {
            let id = SlotId(idx);
            match result {
                Ok(slot) => {
                    slots.insert(id, slot);
                    report.succeeded.push(id);
                }
                Err(error) if error.is_recoverable() => {
                    tracing::warn!(slot = %id, kind = %style.asset_type, %error, "asset failed");
                    report.failed.push(AssetFailure {
                        slot: id,
                        kind: style.asset_type,
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }
        self.slots = slots;
        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "campaign generated"
        );
        Ok(report)
    }

    /// Generate (or regenerate) a single slot.
    pub fn generate_one(&mut self, id: SlotId, style: AssetStyle) -> PlateResult<&AssetSlot> {
        let slot = build_slot(self.generator.as_ref(), &self.product, &self.composite, &style)?;
        self.slots.insert(id, slot);
        self.slots
            .get(&id)
            .ok_or_else(|| PlateError::Other(anyhow::anyhow!("slot {id} vanished after insert")))
    }

    /// Edit a slot's background plate, then re-composite the product onto the new plate.
    ///
    /// On any failure the slot keeps its previous plate and composite.
    #[tracing::instrument(skip(self, instruction))]
    pub fn edit_background(&mut self, id: SlotId, instruction: &str) -> PlateResult<()> {
        let slot = self
            .slots
            .get(&id)
            .ok_or_else(|| PlateError::invalid_argument(format!("unknown asset slot {id}")))?;

        let request = PlateRequest::edit(&slot.style, instruction, &slot.plate);
        let plate = self.generator.generate_plate(&request)?;
        check_plate(&plate, slot.kind())?;
        let composite = composite_on_plate(&plate, &self.product, &self.composite)?;

        if let Some(slot) = self.slots.get_mut(&id) {
            slot.replace_plate(plate, composite);
        }
        Ok(())
    }

    /// Crop and optionally overlay text on a slot's composite; the result becomes its preview.
    ///
    /// An overlay needs a `renderer`; asking for one without it is an error.
    pub fn render_preview(
        &mut self,
        id: SlotId,
        opts: &PreviewOpts,
        renderer: Option<&mut TextRenderer>,
    ) -> PlateResult<&RgbaImage> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or_else(|| PlateError::invalid_argument(format!("unknown asset slot {id}")))?;

        let mut preview = match opts.aspect {
            Some(ratio) => aspect_crop(&slot.composite, ratio)?,
            None => slot.composite.clone(),
        };
        if let Some(text) = &opts.overlay {
            let renderer = renderer.ok_or_else(|| {
                PlateError::font("overlay requested but no text renderer is available")
            })?;
            preview = render_overlay(&preview, text, &opts.overlay_opts, renderer)?;
        }

        let stored = slot.preview.insert(preview);
        Ok(&*stored)
    }

    pub fn export(&self, id: SlotId) -> PlateResult<ExportedAsset> {
        let slot = self
            .slots
            .get(&id)
            .ok_or_else(|| PlateError::invalid_argument(format!("unknown asset slot {id}")))?;
        Ok(ExportedAsset {
            slot: id,
            file_name: slot.kind().export_file_name(),
            png: encode_png(slot.final_image())?,
        })
    }

    /// Write every slot's final image into `dir`. Returns the written paths in slot order.
    pub fn export_all(&self, dir: &Path) -> PlateResult<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.slots.len());
        for (id, slot) in &self.slots {
            let path = dir.join(export_name(*id, slot.kind(), &self.slots));
            write_png(&path, slot.final_image())?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Kind-based file name, suffixed with the slot index when several slots share a kind.
fn export_name(id: SlotId, kind: AssetKind, slots: &BTreeMap<SlotId, AssetSlot>) -> String {
    let shared = slots.values().filter(|s| s.kind() == kind).count() > 1;
    if shared {
        format!("{}_{}.png", kind.slug(), id.0)
    } else {
        kind.export_file_name()
    }
}

fn check_plate(plate: &RgbaImage, kind: AssetKind) -> PlateResult<()> {
    let (w, h) = plate.dimensions();
    if w == 0 || h == 0 {
        return Err(PlateError::upstream_generation(format!(
            "generator returned an empty {w}x{h} plate for {kind}"
        )));
    }
    Ok(())
}

fn build_slot(
    generator: &dyn ImageGenerator,
    product: &RgbaImage,
    opts: &CompositeOpts,
    style: &AssetStyle,
) -> PlateResult<AssetSlot> {
    let plate = generator.generate_plate(&PlateRequest::fresh(style))?;
    check_plate(&plate, style.asset_type)?;
    let composite = composite_on_plate(&plate, product, opts)?;
    Ok(AssetSlot {
        style: style.clone(),
        plate,
        composite,
        preview: None,
    })
}

fn build_thread_pool(threads: Option<usize>) -> PlateResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(PlateError::invalid_argument(
            "campaign 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PlateError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}
