//! Boundary to the external plate generator.
//!
//! The generator is an opaque, possibly failing call; it has no retry logic here.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::asset::{AssetKind, AssetStyle};
use crate::encode::read_image;
use crate::foundation::error::{PlateError, PlateResult};

/// What the generator is asked to produce.
#[derive(Clone, Copy, Debug)]
pub struct PlateRequest<'a> {
    pub style: &'a AssetStyle,
    /// Background edit instruction. `None` for a fresh plate.
    pub edit: Option<&'a str>,
    /// Current plate an edit applies to.
    pub reference: Option<&'a RgbaImage>,
}

impl<'a> PlateRequest<'a> {
    pub fn fresh(style: &'a AssetStyle) -> Self {
        Self {
            style,
            edit: None,
            reference: None,
        }
    }

    pub fn edit(style: &'a AssetStyle, instruction: &'a str, reference: &'a RgbaImage) -> Self {
        Self {
            style,
            edit: Some(instruction),
            reference: Some(reference),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.style.asset_type
    }
}

/// Produces exactly one background plate or fails with
/// [`PlateError::UpstreamGeneration`].
pub trait ImageGenerator: Send + Sync {
    fn generate_plate(&self, request: &PlateRequest<'_>) -> PlateResult<RgbaImage>;
}

impl<F> ImageGenerator for F
where
    F: Fn(&PlateRequest<'_>) -> PlateResult<RgbaImage> + Send + Sync,
{
    fn generate_plate(&self, request: &PlateRequest<'_>) -> PlateResult<RgbaImage> {
        self(request)
    }
}

/// Serves pre-generated plates from a directory.
///
/// Fresh plates are read from `<dir>/<asset_slug>.png`, edited plates from
/// `<dir>/<asset_slug>_edit.png`. A missing or unreadable file is a generation failure.
#[derive(Clone, Debug)]
pub struct PlateDirGenerator {
    dir: PathBuf,
}

impl PlateDirGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plate_path(&self, request: &PlateRequest<'_>) -> PathBuf {
        let slug = request.kind().slug();
        let name = if request.edit.is_some() {
            format!("{slug}_edit.png")
        } else {
            format!("{slug}.png")
        };
        self.dir.join(name)
    }
}

impl ImageGenerator for PlateDirGenerator {
    fn generate_plate(&self, request: &PlateRequest<'_>) -> PlateResult<RgbaImage> {
        let path = self.plate_path(request);
        if !path.is_file() {
            return Err(PlateError::upstream_generation(format!(
                "no plate for {} at '{}'",
                request.kind(),
                path.display()
            )));
        }
        read_image(&path).map_err(|e| {
            PlateError::upstream_generation(format!(
                "plate for {} at '{}' is unreadable: {e}",
                request.kind(),
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::default_styles;

    fn sized_by_kind(req: &PlateRequest<'_>) -> PlateResult<RgbaImage> {
        let (w, h) = match req.kind() {
            AssetKind::InstagramStory => (9, 16),
            _ => (4, 4),
        };
        Ok(RgbaImage::new(w, h))
    }

    #[test]
    fn plain_functions_are_generators() {
        let styles = default_styles();
        let generator: &dyn ImageGenerator = &sized_by_kind;
        let plate = generator
            .generate_plate(&PlateRequest::fresh(&styles[1]))
            .unwrap();
        assert_eq!(plate.dimensions(), (9, 16));
    }

    #[test]
    fn plate_dir_paths_follow_slug_convention() {
        let styles = default_styles();
        let g = PlateDirGenerator::new("plates");
        let fresh = PlateRequest::fresh(&styles[2]);
        assert_eq!(g.plate_path(&fresh), Path::new("plates/website_banner.png"));

        let reference = RgbaImage::new(1, 1);
        let edit = PlateRequest::edit(&styles[2], "warmer light", &reference);
        assert_eq!(
            g.plate_path(&edit),
            Path::new("plates/website_banner_edit.png")
        );
    }

    #[test]
    fn missing_plate_is_upstream_failure() {
        let styles = default_styles();
        let g = PlateDirGenerator::new("/nonexistent/platelock/plates");
        let err = g
            .generate_plate(&PlateRequest::fresh(&styles[0]))
            .unwrap_err();
        assert!(matches!(err, PlateError::UpstreamGeneration(_)));
    }
}
