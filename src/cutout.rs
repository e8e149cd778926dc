//! Optional background removal ("cutout").
//!
//! The remover is chosen once at startup. A missing or failing remover never surfaces as an
//! error to pipeline callers: [`cutout_or_original`] falls back to the original image.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

use crate::encode::{read_image, write_png};
use crate::foundation::error::{PlateError, PlateResult};

/// Image in, image with a transparent background out.
pub trait BackgroundRemover: Send + Sync {
    fn name(&self) -> &str;

    fn remove_background(&self, img: &RgbaImage) -> PlateResult<RgbaImage>;
}

/// Returns the input unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughRemover;

impl BackgroundRemover for PassthroughRemover {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn remove_background(&self, img: &RgbaImage) -> PlateResult<RgbaImage> {
        Ok(img.clone())
    }
}

/// Runs an external cutout tool (for example `rembg i {input} {output}`) on temp PNG files.
///
/// `{input}` and `{output}` in the arguments are replaced by the temp file paths; when neither
/// placeholder appears the two paths are appended in that order.
#[derive(Clone, Debug)]
pub struct CommandRemover {
    program: String,
    args: Vec<String>,
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl CommandRemover {
    pub fn new(argv: &[String]) -> PlateResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| PlateError::invalid_argument("cutout command must not be empty"))?;
        if program.trim().is_empty() {
            return Err(PlateError::invalid_argument(
                "cutout command program must not be blank",
            ));
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// `true` when the program can be spawned and exits successfully for `--help`.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn resolved_args(&self, input: &str, output: &str) -> Vec<String> {
        let has_placeholder = self
            .args
            .iter()
            .any(|a| a.contains("{input}") || a.contains("{output}"));
        let mut out: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{input}", input).replace("{output}", output))
            .collect();
        if !has_placeholder {
            out.push(input.to_string());
            out.push(output.to_string());
        }
        out
    }
}

impl BackgroundRemover for CommandRemover {
    fn name(&self) -> &str {
        &self.program
    }

    fn remove_background(&self, img: &RgbaImage) -> PlateResult<RgbaImage> {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let stem = format!("platelock-cutout-{}-{seq}", std::process::id());
        let input = std::env::temp_dir().join(format!("{stem}-in.png"));
        let output = std::env::temp_dir().join(format!("{stem}-out.png"));
        let _in_guard = TempFileGuard(Some(input.clone()));
        let _out_guard = TempFileGuard(Some(output.clone()));

        write_png(&input, img)?;

        let args = self.resolved_args(&input.to_string_lossy(), &output.to_string_lossy());
        let out = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                PlateError::transform_unavailable(format!("spawn '{}': {e}", self.program))
            })?;
        if !out.status.success() {
            return Err(PlateError::transform_unavailable(format!(
                "'{}' exited with {}: {}",
                self.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let cut = read_image(&output).map_err(|e| {
            PlateError::transform_unavailable(format!("'{}' produced no image: {e}", self.program))
        })?;
        if cut.dimensions() != img.dimensions() {
            return Err(PlateError::transform_unavailable(format!(
                "'{}' changed image size from {:?} to {:?}",
                self.program,
                img.dimensions(),
                cut.dimensions()
            )));
        }
        Ok(cut)
    }
}

/// Pick the remover once: a working external command if configured, otherwise passthrough.
pub fn select_remover(command: Option<&[String]>) -> Box<dyn BackgroundRemover> {
    let Some(argv) = command else {
        tracing::info!("no cutout command configured; product images used as-is");
        return Box::new(PassthroughRemover);
    };
    match CommandRemover::new(argv) {
        Ok(remover) if remover.is_available() => {
            tracing::info!(program = %remover.program, "using external cutout command");
            Box::new(remover)
        }
        Ok(remover) => {
            tracing::warn!(
                program = %remover.program,
                "cutout command unavailable; falling back to passthrough"
            );
            Box::new(PassthroughRemover)
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid cutout command; falling back to passthrough");
            Box::new(PassthroughRemover)
        }
    }
}

/// `true` when any pixel is not fully opaque.
pub fn has_transparency(img: &RgbaImage) -> bool {
    img.pixels().any(|p| p.0[3] < 255)
}

/// Cut out the product, or hand back a copy of the original on any remover failure.
///
/// Images that already carry transparency are treated as cutouts and skip the remover.
pub fn cutout_or_original(remover: &dyn BackgroundRemover, img: &RgbaImage) -> RgbaImage {
    if has_transparency(img) {
        tracing::debug!("product already has transparency; skipping cutout");
        return img.clone();
    }
    match remover.remove_background(img) {
        Ok(cut) => cut,
        Err(e) => {
            tracing::warn!(
                remover = remover.name(),
                error = %e,
                "cutout failed; using original image"
            );
            img.clone()
        }
    }
}
