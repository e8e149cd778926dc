//! JSON campaign configuration.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::asset::{AssetKind, AssetStyle, default_styles};
use crate::campaign::PreviewOpts;
use crate::compositor::CompositeOpts;
use crate::foundation::error::{PlateError, PlateResult};
use crate::text::font::FONT_ENV;
use crate::text::layout::{OverlayOpts, OverlayText};

/// Environment variable overriding [`CampaignConfig::threads`].
pub const THREADS_ENV: &str = "PLATELOCK_THREADS";

/// Everything `platelock campaign` needs to run a batch offline.
///
/// Relative paths are resolved against the directory holding the config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CampaignConfig {
    /// Product photo.
    pub product: PathBuf,
    /// Directory of pre-generated plates, `<asset_slug>.png`.
    pub plates_dir: PathBuf,
    pub out_dir: PathBuf,
    pub font: Option<PathBuf>,
    pub overlay: OverlayText,
    pub overlay_opts: OverlayOpts,
    pub composite: CompositeOpts,
    /// Background remover argv, with optional `{input}`/`{output}` placeholders.
    pub cutout_command: Option<Vec<String>>,
    pub threads: Option<usize>,
    /// Crop each preview to its asset kind's native aspect ratio.
    pub crop_to_native: bool,
    /// Enforce the product photo size bounds before compositing.
    pub validate_product: bool,
    pub assets: Vec<AssetStyle>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            product: PathBuf::from("product.png"),
            plates_dir: PathBuf::from("plates"),
            out_dir: PathBuf::from("out"),
            font: None,
            overlay: OverlayText::default(),
            overlay_opts: OverlayOpts::default(),
            composite: CompositeOpts::default(),
            cutout_command: None,
            threads: None,
            crop_to_native: true,
            validate_product: true,
            assets: default_styles(),
        }
    }
}

impl CampaignConfig {
    /// Parse from JSON text without touching the filesystem or environment.
    pub fn from_json_str(s: &str) -> PlateResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PlateError::config(format!("invalid campaign config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a config file, resolve its relative paths, and apply environment overrides.
    pub fn load(path: &Path) -> PlateResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read campaign config '{}'", path.display()))?;
        let mut cfg = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            cfg.resolve_relative_to(base);
        }
        cfg.apply_overrides(
            std::env::var(THREADS_ENV).ok().as_deref(),
            std::env::var_os(FONT_ENV).map(PathBuf::from),
        )?;
        tracing::debug!(
            config = %path.display(),
            assets = cfg.assets.len(),
            threads = ?cfg.threads,
            "campaign config loaded"
        );
        Ok(cfg)
    }

    pub fn validate(&self) -> PlateResult<()> {
        self.composite
            .validate()
            .map_err(|e| PlateError::config(format!("composite: {e}")))?;
        self.overlay_opts
            .validate()
            .map_err(|e| PlateError::config(format!("overlay_opts: {e}")))?;
        if self.threads == Some(0) {
            return Err(PlateError::config("'threads' must be >= 1 when set"));
        }
        if let Some(cmd) = &self.cutout_command
            && cmd.first().is_none_or(|p| p.trim().is_empty())
        {
            return Err(PlateError::config("'cutout_command' must name a program"));
        }
        if self.assets.is_empty() {
            return Err(PlateError::config("'assets' must list at least one asset"));
        }
        Ok(())
    }

    /// Apply `PLATELOCK_THREADS` and `PLATELOCK_FONT` values. Empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        threads: Option<&str>,
        font: Option<PathBuf>,
    ) -> PlateResult<()> {
        if let Some(raw) = threads.map(str::trim).filter(|v| !v.is_empty()) {
            let n = raw
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    PlateError::config(format!(
                        "{THREADS_ENV} must be a positive integer (got '{raw}')"
                    ))
                })?;
            self.threads = Some(n);
        }
        if let Some(font) = font.filter(|p| !p.as_os_str().is_empty()) {
            self.font = Some(font);
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.product);
        resolve(&mut self.plates_dir);
        resolve(&mut self.out_dir);
        if let Some(font) = &mut self.font {
            resolve(font);
        }
    }

    /// Preview settings for one asset kind.
    pub fn preview_for(&self, kind: AssetKind) -> PreviewOpts {
        let overlay = (kind.overlay_by_default() && !self.overlay.is_empty())
            .then(|| self.overlay.clone());
        PreviewOpts {
            aspect: self.crop_to_native.then(|| kind.aspect()),
            overlay,
            overlay_opts: self.overlay_opts,
        }
    }

    /// `true` when any asset will need the text renderer.
    pub fn needs_font(&self) -> bool {
        self.assets
            .iter()
            .any(|s| self.preview_for(s.asset_type).overlay.is_some())
    }
}
