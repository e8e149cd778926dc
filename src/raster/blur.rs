use crate::foundation::error::{PlateError, PlateResult};

/// Kernel half-width for a given standard deviation.
pub(crate) fn kernel_radius_for_sigma(sigma: f32) -> u32 {
    (sigma * 3.0).ceil().max(0.0) as u32
}

/// Separable Gaussian blur over a single 8-bit plane (row-major, `width * height` bytes).
///
/// Samples outside the plane clamp to the nearest edge pixel, so `radius` is capped at the
/// plane's longer side: wider taps would only re-read edge pixels.
pub(crate) fn blur_plane_u8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> PlateResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| PlateError::invalid_argument("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(PlateError::invalid_argument(
            "blur_plane_u8 expects src matching width*height",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius.min(width.max(height)), sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> PlateResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PlateError::invalid_argument("blur sigma must be > 0"));
    }

    let r = i32::try_from(radius)
        .ok()
        .filter(|r| r.checked_mul(2).is_some_and(|d| d < i32::MAX))
        .ok_or_else(|| PlateError::invalid_argument(format!("blur radius {radius} too large")))?;
    let mut weights_f = Vec::<f64>::with_capacity(2 * radius as usize + 1);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if !sum.is_finite() || sum <= 0.0 {
        return Err(PlateError::invalid_argument("blur kernel sum is not positive"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding drift lands on the center tap so the kernel sums to exactly 1.0 in Q16.
    let delta = 65536i64 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        let row = (y * w) as usize;
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                acc += u64::from(kw) * u64::from(src[row + sx as usize]);
            }
            dst[row + x as usize] = q16_to_u8(acc);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                acc += u64::from(kw) * u64::from(src[(sy * w + x) as usize]);
            }
            dst[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_radius_0_is_identity() {
        let src = vec![1u8, 2, 3, 4, 5, 6];
        let out = blur_plane_u8(&src, 3, 2, 0, 1.0).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn blur_constant_plane_is_identity() {
        let src = vec![77u8; 4 * 3];
        let out = blur_plane_u8(&src, 4, 3, 3, 2.0).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn blur_spreads_energy_from_single_pixel() {
        let (w, h) = (9u32, 9u32);
        let mut src = vec![0u8; (w * h) as usize];
        src[(4 * w + 4) as usize] = 255;

        let out = blur_plane_u8(&src, w, h, 3, 1.0).unwrap();

        assert!(out.iter().filter(|&&v| v != 0).count() > 1);
        let sum: u32 = out.iter().map(|&v| u32::from(v)).sum();
        assert!((sum as i32 - 255).abs() <= 12);
    }

    #[test]
    fn blur_rejects_mismatched_len_and_bad_sigma() {
        assert!(blur_plane_u8(&[0u8; 5], 2, 2, 1, 1.0).is_err());
        assert!(blur_plane_u8(&[0u8; 4], 2, 2, 1, 0.0).is_err());
    }

    #[test]
    fn radius_wider_than_plane_matches_capped_radius() {
        let src: Vec<u8> = (0..12u8).map(|v| v * 20).collect();
        let wide = blur_plane_u8(&src, 4, 3, u32::MAX, 1e9).unwrap();
        let capped = blur_plane_u8(&src, 4, 3, 4, 1e9).unwrap();
        assert_eq!(wide, capped);
    }

    #[test]
    fn kernel_rejects_radius_past_i32() {
        assert!(gaussian_kernel_q16(u32::MAX, 1.0).is_err());
        assert!(gaussian_kernel_q16(i32::MAX as u32, 1.0).is_err());
    }

    #[test]
    fn kernel_radius_covers_three_sigma() {
        assert_eq!(kernel_radius_for_sigma(0.0), 0);
        assert_eq!(kernel_radius_for_sigma(1.0), 3);
        assert_eq!(kernel_radius_for_sigma(24.0), 72);
    }
}
