use std::path::{Path, PathBuf};
use std::process::Command;

use image::Rgba;
use platelock::RgbaImage;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_platelock")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "platelock.exe"
            } else {
                "platelock"
            });
            p
        })
}

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(path: &Path, img: &RgbaImage) {
    platelock::encode::write_png(path, img).unwrap();
}

fn arg(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

#[test]
fn cli_crop_writes_png() {
    let dir = scratch("crop");
    let input = dir.join("in.png");
    let out = dir.join("out.png");
    write(&input, &RgbaImage::from_pixel(64, 64, Rgba([1, 2, 3, 255])));

    let status = Command::new(exe())
        .args(["crop", "--in", arg(&input).as_str(), "--aspect", "1:2"])
        .args(["--out", arg(&out).as_str()])
        .status()
        .unwrap();

    assert!(status.success());
    let img = platelock::encode::read_image(&out).unwrap();
    assert_eq!(img.dimensions(), (32, 64));
}

#[test]
fn cli_composite_keeps_plate_size() {
    let dir = scratch("composite");
    let plate = dir.join("plate.png");
    let product = dir.join("product.png");
    let out = dir.join("out.png");
    write(&plate, &RgbaImage::from_pixel(240, 160, Rgba([220, 220, 220, 255])));
    write(&product, &RgbaImage::from_pixel(80, 120, Rgba([200, 0, 0, 255])));

    let status = Command::new(exe())
        .args(["composite", "--plate", arg(&plate).as_str()])
        .args(["--product", arg(&product).as_str()])
        .args(["--scale", "0.5", "--out", arg(&out).as_str()])
        .status()
        .unwrap();

    assert!(status.success());
    let img = platelock::encode::read_image(&out).unwrap();
    assert_eq!(img.dimensions(), (240, 160));
}

#[test]
fn cli_campaign_exports_and_fails_only_when_everything_fails() {
    let dir = scratch("campaign");
    let plates = dir.join("plates");
    std::fs::create_dir_all(&plates).unwrap();
    write(
        &dir.join("product.png"),
        &RgbaImage::from_pixel(320, 320, Rgba([9, 99, 199, 255])),
    );
    write(
        &plates.join("instagram_post.png"),
        &RgbaImage::from_pixel(200, 200, Rgba([240, 240, 240, 255])),
    );

    let config = dir.join("campaign.json");
    std::fs::write(
        &config,
        r#"{
            "product": "product.png",
            "plates_dir": "plates",
            "out_dir": "out",
            "assets": [
                {"assetType": "Instagram Post"},
                {"assetType": "Ad Creative"}
            ]
        }"#,
    )
    .unwrap();

    let output = Command::new(exe())
        .args(["campaign", "--config", arg(&config).as_str()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Ad Creative"));
    assert!(dir.join("out").join("instagram_post.png").is_file());

    std::fs::remove_file(plates.join("instagram_post.png")).unwrap();
    let status = Command::new(exe())
        .args(["campaign", "--config", arg(&config).as_str()])
        .status()
        .unwrap();
    assert!(!status.success());
}
