use std::fmt;

use crate::foundation::core::AspectRatio;

/// Marketing asset formats the campaign produces.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum AssetKind {
    #[serde(rename = "Instagram Post")]
    InstagramPost,
    #[serde(rename = "Instagram Story")]
    InstagramStory,
    #[serde(rename = "Website Banner")]
    WebsiteBanner,
    #[serde(rename = "Ad Creative")]
    AdCreative,
    #[serde(rename = "Testimonial Graphic")]
    TestimonialGraphic,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        Self::InstagramPost,
        Self::InstagramStory,
        Self::WebsiteBanner,
        Self::AdCreative,
        Self::TestimonialGraphic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::InstagramPost => "Instagram Post",
            Self::InstagramStory => "Instagram Story",
            Self::WebsiteBanner => "Website Banner",
            Self::AdCreative => "Ad Creative",
            Self::TestimonialGraphic => "Testimonial Graphic",
        }
    }

    /// Native aspect ratio of the format.
    pub fn aspect(self) -> AspectRatio {
        match self {
            Self::InstagramStory => AspectRatio::PORTRAIT_9_16,
            Self::WebsiteBanner => AspectRatio::LANDSCAPE_16_9,
            Self::InstagramPost | Self::AdCreative | Self::TestimonialGraphic => {
                AspectRatio::SQUARE
            }
        }
    }

    /// Lowercase label with spaces replaced by underscores, e.g. `instagram_story`.
    pub fn slug(self) -> String {
        self.label().to_lowercase().replace(' ', "_")
    }

    pub fn export_file_name(self) -> String {
        format!("{}.png", self.slug())
    }

    /// Only testimonials carry the quote overlay unless asked otherwise.
    pub fn overlay_by_default(self) -> bool {
        matches!(self, Self::TestimonialGraphic)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scene description for one asset's background plate.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStyle {
    pub asset_type: AssetKind,
    #[serde(default)]
    pub background_tone: String,
    #[serde(default)]
    pub surface_type: String,
    #[serde(default)]
    pub accent_prop: String,
    #[serde(default)]
    pub lighting: String,
    #[serde(default)]
    pub camera_angle: String,
    #[serde(default)]
    pub overlay_text: String,
}

/// Wrapper for style JSON of the form `{"assets": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleSheet {
    #[serde(default)]
    pub assets: Vec<AssetStyle>,
}

fn style(
    asset_type: AssetKind,
    background_tone: &str,
    surface_type: &str,
    accent_prop: &str,
    lighting: &str,
    camera_angle: &str,
    overlay_text: &str,
) -> AssetStyle {
    AssetStyle {
        asset_type,
        background_tone: background_tone.to_string(),
        surface_type: surface_type.to_string(),
        accent_prop: accent_prop.to_string(),
        lighting: lighting.to_string(),
        camera_angle: camera_angle.to_string(),
        overlay_text: overlay_text.to_string(),
    }
}

/// Built-in style set, one per asset kind.
pub fn default_styles() -> Vec<AssetStyle> {
    vec![
        style(
            AssetKind::InstagramPost,
            "soft blush gradient",
            "satin draped cloth",
            "gold-trimmed ribbon",
            "warm side spotlight",
            "45-degree angle",
            "Glow deeper. Shine brighter.",
        ),
        style(
            AssetKind::InstagramStory,
            "pale lavender",
            "ceramic tray",
            "rose petals",
            "diffused top-down",
            "overhead close-up",
            "Hydration you can feel.",
        ),
        style(
            AssetKind::WebsiteBanner,
            "muted green stone",
            "concrete slab",
            "eucalyptus branch",
            "soft morning light",
            "side-profile landscape",
            "Glow like never before!",
        ),
        style(
            AssetKind::AdCreative,
            "deep emerald gradient",
            "reflective glass",
            "crystal orb",
            "dramatic backlight",
            "elevated 3/4",
            "10% Off Today Only",
        ),
        style(
            AssetKind::TestimonialGraphic,
            "cream linen",
            "polished marble",
            "single white tulip",
            "natural side light",
            "straight-on clean",
            "My skin has never felt this good.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_native_aspects() {
        assert_eq!(AssetKind::InstagramStory.aspect(), AspectRatio::PORTRAIT_9_16);
        assert_eq!(AssetKind::WebsiteBanner.aspect(), AspectRatio::LANDSCAPE_16_9);
        assert_eq!(AssetKind::AdCreative.aspect(), AspectRatio::SQUARE);
    }

    #[test]
    fn export_names_are_slugged_labels() {
        assert_eq!(
            AssetKind::TestimonialGraphic.export_file_name(),
            "testimonial_graphic.png"
        );
        assert_eq!(AssetKind::InstagramPost.slug(), "instagram_post");
    }

    #[test]
    fn only_testimonial_overlays_by_default() {
        let with_overlay: Vec<_> = AssetKind::ALL
            .into_iter()
            .filter(|k| k.overlay_by_default())
            .collect();
        assert_eq!(with_overlay, vec![AssetKind::TestimonialGraphic]);
    }

    #[test]
    fn style_sheet_parses_camel_case_json() {
        let json = r#"{"assets":[{"assetType":"Website Banner","backgroundTone":"stone","lighting":"soft"}]}"#;
        let sheet: StyleSheet = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.assets.len(), 1);
        assert_eq!(sheet.assets[0].asset_type, AssetKind::WebsiteBanner);
        assert_eq!(sheet.assets[0].background_tone, "stone");
        assert!(sheet.assets[0].camera_angle.is_empty());

        let unknown = r#"{"assets":[{"assetType":"Poster"}]}"#;
        assert!(serde_json::from_str::<StyleSheet>(unknown).is_err());
    }

    #[test]
    fn default_styles_cover_every_kind_once() {
        let kinds: Vec<_> = default_styles().iter().map(|s| s.asset_type).collect();
        assert_eq!(kinds, AssetKind::ALL.to_vec());
    }
}
