use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use platelock::{
    AspectRatio, Campaign, CampaignConfig, CompositeOpts, OverlayColor, OverlayOpts, OverlayText,
    PlateDirGenerator, TextRenderer,
};

#[derive(Parser, Debug)]
#[command(name = "platelock", version)]
struct Cli {
    /// Log at DEBUG level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Center-crop an image to an aspect ratio.
    Crop(CropArgs),
    /// Composite a product photo onto a background plate.
    Composite(CompositeArgs),
    /// Draw quote, attribution, and product label onto an image.
    Overlay(OverlayArgs),
    /// Run a whole campaign from a JSON config, reading plates from disk.
    Campaign(CampaignArgs),
}

#[derive(Parser, Debug)]
struct CropArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Target ratio as W:H, e.g. 9:16.
    #[arg(long)]
    aspect: AspectRatio,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Background plate image.
    #[arg(long)]
    plate: PathBuf,

    /// Product photo. Used as-is if it already has transparency.
    #[arg(long)]
    product: PathBuf,

    #[arg(long)]
    out: PathBuf,

    /// Product width as a fraction of the plate width.
    #[arg(long)]
    scale: Option<f64>,

    /// Upward shift of the product's top edge, as a fraction of plate height.
    #[arg(long)]
    y_bias: Option<f64>,

    /// Background remover command; `{input}` and `{output}` are replaced with PNG paths.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    cutout_cmd: Vec<String>,
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value = "")]
    quote: String,

    #[arg(long, default_value = "")]
    attribution: String,

    #[arg(long, default_value = "")]
    product_label: String,

    #[arg(long, value_enum, default_value_t = ColorChoice::Black)]
    color: ColorChoice,

    /// Disable the soft text shadow.
    #[arg(long)]
    no_shadow: bool,

    /// Font file. Defaults to $PLATELOCK_FONT, then common system fonts.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CampaignArgs {
    /// Campaign config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Override the config's output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    Black,
    White,
}

impl From<ColorChoice> for OverlayColor {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Black => OverlayColor::Black,
            ColorChoice::White => OverlayColor::White,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Crop(args) => cmd_crop(args),
        Command::Composite(args) => cmd_composite(args),
        Command::Overlay(args) => cmd_overlay(args),
        Command::Campaign(args) => cmd_campaign(args),
    }
}

fn cmd_crop(args: CropArgs) -> anyhow::Result<()> {
    let img = platelock::encode::read_image(&args.in_path)?;
    let cropped = platelock::aspect_crop(&img, args.aspect)?;
    platelock::encode::write_png(&args.out, &cropped)?;
    report_written(&args.out, &cropped);
    Ok(())
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let plate = platelock::encode::read_image(&args.plate)?;
    let product = platelock::encode::read_image(&args.product)?;

    let mut opts = CompositeOpts::default();
    if let Some(scale) = args.scale {
        opts.scale = scale;
    }
    if let Some(y_bias) = args.y_bias {
        opts.y_bias = y_bias;
    }
    opts.validate()?;

    let command = (!args.cutout_cmd.is_empty()).then_some(args.cutout_cmd.as_slice());
    let remover = platelock::select_remover(command);
    let cutout = platelock::cutout_or_original(remover.as_ref(), &product);

    let out = platelock::composite_on_plate(&plate, &cutout, &opts)?;
    platelock::encode::write_png(&args.out, &out)?;
    report_written(&args.out, &out);
    Ok(())
}

fn cmd_overlay(args: OverlayArgs) -> anyhow::Result<()> {
    let base = platelock::encode::read_image(&args.in_path)?;
    let text = OverlayText::new(args.quote, args.attribution, args.product_label);
    let opts = OverlayOpts {
        color: args.color.into(),
        shadow: !args.no_shadow,
        ..OverlayOpts::default()
    };

    let out = if text.is_empty() {
        base
    } else {
        let mut renderer = TextRenderer::discover(args.font.as_deref())?;
        tracing::debug!(family = renderer.family_name(), "overlay font loaded");
        platelock::render_overlay(&base, &text, &opts, &mut renderer)?
    };
    platelock::encode::write_png(&args.out, &out)?;
    report_written(&args.out, &out);
    Ok(())
}

fn cmd_campaign(args: CampaignArgs) -> anyhow::Result<()> {
    let mut cfg = CampaignConfig::load(&args.config)?;
    if let Some(out_dir) = args.out_dir {
        cfg.out_dir = out_dir;
    }

    let product = platelock::encode::read_image(&cfg.product)?;
    if cfg.validate_product {
        platelock::encode::validate_product_image(&product)
            .with_context(|| format!("product image '{}'", cfg.product.display()))?;
    }

    let remover = platelock::select_remover(cfg.cutout_command.as_deref());
    let generator = PlateDirGenerator::new(&cfg.plates_dir);
    let mut campaign = Campaign::new(
        Box::new(generator),
        remover.as_ref(),
        &product,
        cfg.composite,
    )?
    .with_threads(cfg.threads);

    let report = campaign.generate_all(&cfg.assets)?;
    for failure in &report.failed {
        eprintln!(
            "asset {} ({}) failed: {}",
            failure.slot, failure.kind, failure.error
        );
    }
    if report.all_failed() {
        anyhow::bail!("every asset failed; nothing to export");
    }

    let mut renderer = load_renderer(&cfg);
    let ids: Vec<_> = campaign.slots().map(|(id, _)| id).collect();
    for id in ids {
        let Some(kind) = campaign.slot(id).map(|s| s.kind()) else {
            continue;
        };
        let mut preview = cfg.preview_for(kind);
        if renderer.is_none() {
            preview.overlay = None;
        }
        campaign.render_preview(id, &preview, renderer.as_mut())?;
    }

    let written = campaign.export_all(&cfg.out_dir)?;
    for path in &written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// Overlay font for the campaign, if any asset needs one. A missing font skips overlays.
fn load_renderer(cfg: &CampaignConfig) -> Option<TextRenderer> {
    if !cfg.needs_font() {
        return None;
    }
    match TextRenderer::discover(cfg.font.as_deref()) {
        Ok(renderer) => Some(renderer),
        Err(err) => {
            tracing::warn!(%err, "no usable overlay font; previews are written without text");
            None
        }
    }
}

fn report_written(path: &Path, img: &platelock::RgbaImage) {
    let (w, h) = img.dimensions();
    println!("wrote {} ({w}x{h})", path.display());
}
