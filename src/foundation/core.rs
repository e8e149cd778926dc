use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{PlateError, PlateResult};

/// Straight-alpha RGBA8 raster used at every pipeline boundary.
pub use image::RgbaImage;

/// Target width:height ratio for center cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    /// Width term, must be non-zero.
    pub w: u32,
    /// Height term, must be non-zero.
    pub h: u32,
}

impl AspectRatio {
    pub const SQUARE: Self = Self { w: 1, h: 1 };
    pub const PORTRAIT_9_16: Self = Self { w: 9, h: 16 };
    pub const LANDSCAPE_16_9: Self = Self { w: 16, h: 9 };

    /// Create a validated ratio with both terms non-zero.
    pub fn new(w: u32, h: u32) -> PlateResult<Self> {
        if w == 0 || h == 0 {
            return Err(PlateError::invalid_argument(format!(
                "aspect ratio terms must be > 0 (got {w}:{h})"
            )));
        }
        Ok(Self { w, h })
    }

    /// Ratio as `w / h`.
    pub fn as_f64(self) -> f64 {
        f64::from(self.w) / f64::from(self.h)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.w, self.h)
    }
}

impl FromStr for AspectRatio {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| PlateError::invalid_argument(format!("aspect '{s}' must be W:H")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| PlateError::invalid_argument(format!("aspect '{s}' must be W:H")))
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = PlateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

/// Signed pixel offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Offset {
    /// Horizontal shift, positive to the right.
    pub dx: i32,
    /// Vertical shift, positive downward.
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Overlay text color. Resolved from a name so no free-form color string reaches the rasterizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayColor {
    #[default]
    Black,
    White,
}

impl OverlayColor {
    /// Opaque straight-alpha RGBA.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Self::Black => [0, 0, 0, 255],
            Self::White => [255, 255, 255, 255],
        }
    }
}

impl FromStr for OverlayColor {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(Self::Black),
            "white" => Ok(Self::White),
            other => Err(PlateError::invalid_argument(format!(
                "overlay color must be 'black' or 'white' (got '{other}')"
            ))),
        }
    }
}

/// Reject zero-area rasters.
pub(crate) fn ensure_non_empty(img: &RgbaImage, what: &str) -> PlateResult<()> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(PlateError::invalid_argument(format!(
            "{what} must have non-zero size (got {w}x{h})"
        )));
    }
    Ok(())
}
