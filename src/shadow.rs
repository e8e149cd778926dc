use image::{Rgba, RgbaImage};

use crate::foundation::core::Offset;
use crate::foundation::error::{PlateError, PlateResult};
use crate::raster::blend::alpha_composite_at;
use crate::raster::blur::{blur_plane_u8, kernel_radius_for_sigma};

/// Soft drop-shadow parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    /// Gaussian standard deviation in pixels. `0` disables blurring.
    pub blur_radius: f32,
    /// Shift of the shadow inside its canvas.
    pub offset: Offset,
    /// Peak alpha of the shadow, `0..=255`.
    pub opacity: u8,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            blur_radius: 18.0,
            offset: Offset::new(20, 16),
            opacity: 110,
        }
    }
}

impl ShadowParams {
    /// Softer, wider shadow used under composited products.
    pub fn product() -> Self {
        Self {
            blur_radius: 24.0,
            offset: Offset::new(18, 18),
            opacity: 120,
        }
    }
}

/// Derive a black drop-shadow layer from `foreground`'s alpha channel.
///
/// The result has exactly the foreground's dimensions: blur spread and offset that would land
/// outside that canvas are clipped.
pub fn make_shadow(foreground: &RgbaImage, params: ShadowParams) -> PlateResult<RgbaImage> {
    if !params.blur_radius.is_finite() || params.blur_radius < 0.0 {
        return Err(PlateError::invalid_argument(
            "shadow blur radius must be finite and >= 0",
        ));
    }

    let (w, h) = foreground.dimensions();
    let alpha: Vec<u8> = foreground.pixels().map(|p| p.0[3]).collect();
    let blurred = blur_plane_u8(
        &alpha,
        w,
        h,
        kernel_radius_for_sigma(params.blur_radius),
        params.blur_radius,
    )?;

    let opacity = u32::from(params.opacity);
    let mut layer = RgbaImage::new(w, h);
    for (px, &a) in layer.pixels_mut().zip(blurred.iter()) {
        *px = Rgba([0, 0, 0, (u32::from(a) * opacity / 255) as u8]);
    }

    let mut canvas = RgbaImage::new(w, h);
    alpha_composite_at(
        &mut canvas,
        &layer,
        i64::from(params.offset.dx),
        i64::from(params.offset.dy),
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_cutout(size: u32, inset: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            let inside = x >= inset && y >= inset && x < size - inset && y < size - inset;
            Rgba([200, 50, 10, if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn shadow_keeps_foreground_size_for_any_blur() {
        let fg = square_cutout(40, 10);
        for blur in [0.0, 1.0, 5.0, 60.0] {
            let params = ShadowParams {
                blur_radius: blur,
                ..ShadowParams::default()
            };
            assert_eq!(make_shadow(&fg, params).unwrap().dimensions(), (40, 40));
        }
    }

    #[test]
    fn unblurred_shadow_is_shifted_black_mask_scaled_by_opacity() {
        let fg = square_cutout(20, 5);
        let params = ShadowParams {
            blur_radius: 0.0,
            offset: Offset::new(3, 2),
            opacity: 110,
        };
        let sh = make_shadow(&fg, params).unwrap();

        // 255 * 110 / 255 truncates to 110.
        assert_eq!(sh.get_pixel(8, 7).0, [0, 0, 0, 110]);
        assert_eq!(sh.get_pixel(5, 5).0[3], 0);
        assert_eq!(sh.get_pixel(17, 16).0, [0, 0, 0, 110]);
        assert!(sh.pixels().all(|p| p.0[..3] == [0, 0, 0]));
    }

    #[test]
    fn blur_softens_the_mask_edge() {
        let fg = square_cutout(64, 16);
        let params = ShadowParams {
            blur_radius: 4.0,
            offset: Offset::new(0, 0),
            opacity: 255,
        };
        let sh = make_shadow(&fg, params).unwrap();
        let edge = sh.get_pixel(16, 32).0[3];
        assert!(edge > 0 && edge < 255, "edge alpha {edge}");
        assert!(sh.get_pixel(13, 32).0[3] > 0);
        assert!(sh.get_pixel(32, 32).0[3] >= 250);
    }

    #[test]
    fn offset_past_canvas_clips_to_empty() {
        let fg = square_cutout(10, 0);
        let params = ShadowParams {
            blur_radius: 0.0,
            offset: Offset::new(50, 0),
            opacity: 200,
        };
        let sh = make_shadow(&fg, params).unwrap();
        assert!(sh.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn huge_blur_radius_spreads_evenly_instead_of_failing() {
        let fg = RgbaImage::from_pixel(8, 8, Rgba([10, 10, 10, 255]));
        let params = ShadowParams {
            blur_radius: 1e9,
            offset: Offset::new(0, 0),
            opacity: 120,
        };
        let sh = make_shadow(&fg, params).unwrap();
        assert_eq!(sh.dimensions(), (8, 8));
        assert!(sh.pixels().all(|p| p.0 == [0, 0, 0, 120]));
    }

    #[test]
    fn negative_blur_is_rejected() {
        let fg = square_cutout(4, 0);
        let params = ShadowParams {
            blur_radius: -1.0,
            ..ShadowParams::default()
        };
        assert!(make_shadow(&fg, params).is_err());
    }
}
