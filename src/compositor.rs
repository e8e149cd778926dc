use image::RgbaImage;

use crate::foundation::core::ensure_non_empty;
use crate::foundation::error::{PlateError, PlateResult};
use crate::raster::blend::alpha_composite_at;
use crate::shadow::{ShadowParams, make_shadow};

/// Placement of a product cutout on a background plate.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositeOpts {
    /// Resized cutout width as a fraction of the plate width, in `(0, 1]`.
    pub scale: f64,
    /// Vertical bias; the cutout's top edge lands at `plate_h * (0.5 - y_bias)`.
    pub y_bias: f64,
    /// Shadow drawn beneath the cutout.
    pub shadow: ShadowParams,
}

impl Default for CompositeOpts {
    fn default() -> Self {
        Self {
            scale: 0.55,
            y_bias: 0.12,
            shadow: ShadowParams::product(),
        }
    }
}

impl CompositeOpts {
    pub fn validate(&self) -> PlateResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 1.0 {
            return Err(PlateError::invalid_argument(format!(
                "composite scale must be in (0, 1] (got {})",
                self.scale
            )));
        }
        if !self.y_bias.is_finite() {
            return Err(PlateError::invalid_argument("composite y_bias must be finite"));
        }
        Ok(())
    }
}

/// Where the resized cutout lands on a plate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Left edge on the plate; may lie outside it.
    pub x: i64,
    /// Top edge on the plate; may lie outside it.
    pub y: i64,
    /// Resized cutout width.
    pub width: u32,
    /// Resized cutout height.
    pub height: u32,
}

/// Compute the resized cutout size and its top-left anchor on a `plate_w x plate_h` plate.
pub fn placement_for(
    plate_w: u32,
    plate_h: u32,
    cutout_w: u32,
    cutout_h: u32,
    opts: &CompositeOpts,
) -> PlateResult<Placement> {
    opts.validate()?;
    if cutout_w == 0 || cutout_h == 0 {
        return Err(PlateError::invalid_argument(format!(
            "cutout must have non-zero size (got {cutout_w}x{cutout_h})"
        )));
    }
    if plate_w == 0 || plate_h == 0 {
        return Err(PlateError::invalid_argument(format!(
            "plate must have non-zero size (got {plate_w}x{plate_h})"
        )));
    }

    let width = (f64::from(plate_w) * opts.scale).floor() as u32;
    let s = f64::from(width) / f64::from(cutout_w);
    let height = (f64::from(cutout_h) * s).floor() as u32;
    if width == 0 || height == 0 {
        return Err(PlateError::invalid_argument(format!(
            "cutout {cutout_w}x{cutout_h} scales to an empty {width}x{height} on a \
             {plate_w}x{plate_h} plate"
        )));
    }

    let x = (i64::from(plate_w) - i64::from(width)) / 2;
    let y = (f64::from(plate_h) * (1.0 - (0.5 + opts.y_bias))).floor() as i64;
    Ok(Placement {
        x,
        y,
        width,
        height,
    })
}

/// Layer a soft shadow and the resized `cutout` onto a copy of `plate`.
///
/// The output always has the plate's dimensions; anything that would fall outside is clipped.
#[tracing::instrument(skip(plate, cutout), fields(plate = ?plate.dimensions(), cutout = ?cutout.dimensions()))]
pub fn composite_on_plate(
    plate: &RgbaImage,
    cutout: &RgbaImage,
    opts: &CompositeOpts,
) -> PlateResult<RgbaImage> {
    ensure_non_empty(cutout, "cutout")?;
    let (plate_w, plate_h) = plate.dimensions();
    let placement = placement_for(plate_w, plate_h, cutout.width(), cutout.height(), opts)?;
    tracing::debug!(?placement, "product placement");

    let resized = image::imageops::resize(
        cutout,
        placement.width,
        placement.height,
        image::imageops::FilterType::Lanczos3,
    );
    let shadow = make_shadow(&resized, opts.shadow)?;

    let mut out = plate.clone();
    alpha_composite_at(&mut out, &shadow, placement.x, placement.y);
    alpha_composite_at(&mut out, &resized, placement.x, placement.y);
    Ok(out)
}
