use image::RgbaImage;

use crate::foundation::core::{AspectRatio, ensure_non_empty};
use crate::foundation::error::{PlateError, PlateResult};

/// Center-crop `img` to `ratio` without any resampling.
///
/// Sources whose ratio already matches (within floating-point noise, or exactly at the
/// floor-rounded fit) come back as an unmodified copy, so repeated crops never drift.
pub fn aspect_crop(img: &RgbaImage, ratio: AspectRatio) -> PlateResult<RgbaImage> {
    ensure_non_empty(img, "crop source")?;
    let (w, h) = img.dimensions();
    let target = ratio.as_f64();
    let current = f64::from(w) / f64::from(h);

    if (current - target).abs() < 1e-6 {
        return Ok(img.clone());
    }

    // A source that is already the floor-rounded fit along either axis is a fixed point.
    let fit_w = (f64::from(h) * target).floor() as u32;
    let fit_h = (f64::from(w) / target).floor() as u32;
    if fit_w == w || fit_h == h {
        return Ok(img.clone());
    }

    let (left, top, new_w, new_h) = if current > target {
        let new_w = fit_w.max(1);
        ((w - new_w) / 2, 0, new_w, h)
    } else {
        let new_h = fit_h.max(1);
        (0, (h - new_h) / 2, w, new_h)
    };

    tracing::debug!(w, h, %ratio, left, top, new_w, new_h, "aspect crop");
    Ok(image::imageops::crop_imm(img, left, top, new_w, new_h).to_image())
}

/// Downscale so neither side exceeds `max_side`, preserving aspect ratio. Never upscales.
pub fn resize_for_display(img: &RgbaImage, max_side: u32) -> PlateResult<RgbaImage> {
    ensure_non_empty(img, "display source")?;
    if max_side == 0 {
        return Err(PlateError::invalid_argument("display max_side must be > 0"));
    }
    let (w, h) = img.dimensions();
    if w <= max_side && h <= max_side {
        return Ok(img.clone());
    }
    let (new_w, new_h) = if w > h {
        let s = f64::from(max_side) / f64::from(w);
        (max_side, ((f64::from(h) * s) as u32).max(1))
    } else {
        let s = f64::from(max_side) / f64::from(h);
        (((f64::from(w) * s) as u32).max(1), max_side)
    };
    Ok(image::imageops::resize(
        img,
        new_w,
        new_h,
        image::imageops::FilterType::Lanczos3,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, (x / 256) as u8, 255])
        })
    }

    #[test]
    fn wide_source_crops_width_centered() {
        let img = gradient(1000, 500);
        let out = aspect_crop(&img, AspectRatio::SQUARE).unwrap();
        assert_eq!(out.dimensions(), (500, 500));
        // left offset 250, top offset 0
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(250, 0));
        assert_eq!(out.get_pixel(499, 499), img.get_pixel(749, 499));
    }

    #[test]
    fn tall_source_crops_height_centered() {
        let img = gradient(400, 1000);
        let out = aspect_crop(&img, AspectRatio::SQUARE).unwrap();
        assert_eq!(out.dimensions(), (400, 400));
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(0, 300));
    }

    #[test]
    fn matching_ratio_is_copy() {
        let img = gradient(1080, 1920);
        let out = aspect_crop(&img, AspectRatio::PORTRAIT_9_16).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn crop_is_idempotent_for_awkward_ratios() {
        let img = gradient(1000, 1000);
        for ratio in [
            AspectRatio::LANDSCAPE_16_9,
            AspectRatio::PORTRAIT_9_16,
            AspectRatio::new(7, 3).unwrap(),
            AspectRatio::new(3, 7).unwrap(),
        ] {
            let once = aspect_crop(&img, ratio).unwrap();
            let twice = aspect_crop(&once, ratio).unwrap();
            assert_eq!(once, twice, "ratio {ratio}");
        }
    }

    #[test]
    fn crop_never_upscales() {
        for (w, h) in [(1, 1), (3, 1000), (1000, 3), (1024, 1024), (999, 1001)] {
            let img = gradient(w, h);
            for ratio in [
                AspectRatio::SQUARE,
                AspectRatio::LANDSCAPE_16_9,
                AspectRatio::PORTRAIT_9_16,
            ] {
                let out = aspect_crop(&img, ratio).unwrap();
                assert!(out.width() <= w && out.height() <= h);
                assert!(out.width() > 0 && out.height() > 0);
            }
        }
    }

    #[test]
    fn zero_area_source_is_invalid() {
        let img = RgbaImage::new(0, 10);
        assert!(matches!(
            aspect_crop(&img, AspectRatio::SQUARE),
            Err(crate::PlateError::InvalidArgument(_))
        ));
    }

    #[test]
    fn display_resize_caps_long_side() {
        let img = gradient(1600, 900);
        let out = resize_for_display(&img, 800).unwrap();
        assert_eq!(out.dimensions(), (800, 450));

        let small = gradient(300, 200);
        assert_eq!(resize_for_display(&small, 800).unwrap(), small);
    }
}
