use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::foundation::error::{PlateError, PlateResult};

/// Decode any format `image` understands into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> PlateResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

pub fn read_image(path: &Path) -> PlateResult<RgbaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Lossless PNG encoding of `img`.
pub fn encode_png(img: &RgbaImage) -> PlateResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

pub fn write_png(path: &Path, img: &RgbaImage) -> PlateResult<()> {
    ensure_parent_dir(path)?;
    let bytes = encode_png(img)?;
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> PlateResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Minimum and maximum accepted side length for uploaded product photos.
pub const PRODUCT_MIN_SIDE: u32 = 300;
pub const PRODUCT_MAX_SIDE: u32 = 4000;

/// Reject product photos that are too small to composite cleanly or too large to process.
pub fn validate_product_image(img: &RgbaImage) -> PlateResult<()> {
    let (w, h) = img.dimensions();
    if w < PRODUCT_MIN_SIDE || h < PRODUCT_MIN_SIDE {
        return Err(PlateError::invalid_argument(format!(
            "product image {w}x{h} is too small; use at least \
             {PRODUCT_MIN_SIDE}x{PRODUCT_MIN_SIDE}"
        )));
    }
    if w > PRODUCT_MAX_SIDE || h > PRODUCT_MAX_SIDE {
        return Err(PlateError::invalid_argument(format!(
            "product image {w}x{h} is too large; use images under \
             {PRODUCT_MAX_SIDE}x{PRODUCT_MAX_SIDE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_preserves_straight_alpha_exactly() {
        let img = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 80, y as u8 * 90, 7, 128]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn product_bounds() {
        assert!(validate_product_image(&RgbaImage::new(300, 300)).is_ok());
        assert!(validate_product_image(&RgbaImage::new(299, 800)).is_err());
        assert!(validate_product_image(&RgbaImage::new(800, 4001)).is_err());
    }
}
