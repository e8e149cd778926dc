use image::Rgba;
use platelock::{AspectRatio, RgbaImage, aspect_crop, resize_for_display};

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]))
}

#[test]
fn wide_image_to_square_keeps_center_columns() {
    let img = gradient(1000, 500);
    let out = aspect_crop(&img, AspectRatio::SQUARE).unwrap();
    assert_eq!(out.dimensions(), (500, 500));
    assert_eq!(out.get_pixel(0, 0), img.get_pixel(250, 0));
    assert_eq!(out.get_pixel(499, 499), img.get_pixel(749, 499));
}

#[test]
fn crop_never_grows_and_is_idempotent() {
    let ratios = [
        AspectRatio::SQUARE,
        AspectRatio::PORTRAIT_9_16,
        AspectRatio::LANDSCAPE_16_9,
        AspectRatio::new(4, 5).unwrap(),
        AspectRatio::new(7, 3).unwrap(),
    ];
    for (w, h) in [(1920, 1080), (1080, 1920), (333, 777), (1001, 999), (64, 64)] {
        let img = gradient(w, h);
        for ratio in ratios {
            let once = aspect_crop(&img, ratio).unwrap();
            let (cw, ch) = once.dimensions();
            assert!(cw <= w && ch <= h, "{w}x{h} @ {ratio}");
            assert!(cw == w || ch == h, "{w}x{h} @ {ratio} cropped both axes");
            let twice = aspect_crop(&once, ratio).unwrap();
            assert_eq!(once, twice, "{w}x{h} @ {ratio}");
        }
    }
}

#[test]
fn story_crop_from_landscape() {
    let out = aspect_crop(&gradient(1920, 1080), AspectRatio::PORTRAIT_9_16).unwrap();
    assert_eq!(out.dimensions(), (607, 1080));
}

#[test]
fn display_resize_caps_longest_side() {
    let out = resize_for_display(&gradient(1600, 900), 800).unwrap();
    assert_eq!(out.dimensions(), (800, 450));
    let small = gradient(300, 200);
    assert_eq!(resize_for_display(&small, 800).unwrap(), small);
}
