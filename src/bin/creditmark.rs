use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use creditmark::{
    CreditmarkResult, CreditsOverlay, CreditsOverride, DrawFn, FontAsset, ImageRef,
    OverlayDefaults, OverlayOutcome, ParleyTextMetrics, VariantStore, VelloSurface,
};

#[derive(Parser, Debug)]
#[command(name = "creditmark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overlay a credits caption onto a PNG image.
    Apply(ApplyArgs),
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input PNG path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Credits caption text. Empty means pass-through.
    #[arg(long, default_value = "")]
    caption: String,

    /// Caption font file (TTF/OTF).
    #[arg(long)]
    font: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Overlay defaults JSON file; built-in defaults when omitted.
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Per-image override blob (JSON, e.g. '{"Position":"bottom_left"}').
    #[arg(long = "override")]
    override_blob: Option<String>,

    /// Variant cache directory.
    #[arg(long, default_value = ".creditmark-cache")]
    cache_dir: PathBuf,

    /// Append a timestamp to the variant name, defeating the cache (debug).
    #[arg(long)]
    force_rebuild: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
    }
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let mut defaults = match &args.defaults {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read defaults '{}'", path.display()))?;
            OverlayDefaults::from_json(&raw)?
        }
        None => OverlayDefaults::default(),
    };
    if args.force_rebuild {
        defaults.force_rebuild = true;
    }

    let font = FontAsset::load(&args.font)?;

    let override_ = args.override_blob.as_deref().and_then(|raw| {
        let parsed = CreditsOverride::from_json(raw);
        if parsed.is_none() {
            eprintln!("warning: malformed override blob ignored, using defaults");
        }
        parsed
    });

    let image = image_ref_for(&args.in_path)?;
    let mut store = DirVariantStore {
        source: args.in_path.clone(),
        cache_dir: args.cache_dir.clone(),
    };

    let mut overlay = CreditsOverlay::new(defaults, font, ParleyTextMetrics::new());
    let outcome = overlay.apply(
        &mut store,
        &image,
        Some(args.caption.as_str()),
        override_.as_ref(),
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    match outcome {
        OverlayOutcome::Unchanged(_) => {
            std::fs::copy(&args.in_path, &args.out)
                .with_context(|| format!("copy original to '{}'", args.out.display()))?;
            eprintln!("no credits applied, copied original to {}", args.out.display());
        }
        OverlayOutcome::Variant(variant) => {
            std::fs::copy(&variant.key, &args.out)
                .with_context(|| format!("copy variant to '{}'", args.out.display()))?;
            eprintln!("wrote {}", args.out.display());
        }
        OverlayOutcome::Unavailable => {
            anyhow::bail!("no drawable raster for '{}'", args.in_path.display());
        }
    }

    Ok(())
}

fn image_ref_for(path: &Path) -> anyhow::Result<ImageRef> {
    if !path.exists() {
        return Ok(ImageRef {
            key: path.display().to_string(),
            width: 0,
            height: 0,
            exists: false,
        });
    }
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("probe image '{}'", path.display()))?;
    Ok(ImageRef {
        key: path.display().to_string(),
        width,
        height,
        exists: true,
    })
}

/// Directory-backed variant store: one PNG per variant name.
struct DirVariantStore {
    source: PathBuf,
    cache_dir: PathBuf,
}

impl DirVariantStore {
    fn cached_path(&self, variant: &str) -> PathBuf {
        // Variant names carry free-form caption text; key the file by a
        // filesystem-safe prefix plus a hash of the full name.
        let safe: String = variant
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(48)
            .collect();
        self.cache_dir
            .join(format!("{safe}-{:016x}.png", fnv1a64(variant.as_bytes())))
    }
}

impl VariantStore for DirVariantStore {
    fn manipulate(
        &mut self,
        _image: &ImageRef,
        variant: &str,
        draw: &mut DrawFn<'_>,
    ) -> CreditmarkResult<Option<ImageRef>> {
        let cached = self.cached_path(variant);
        if !cached.exists() {
            let Ok(source) = image::open(&self.source) else {
                return Ok(None);
            };
            let rgba = source.to_rgba8();
            let (width, height) = rgba.dimensions();

            let mut surface = VelloSurface::from_rgba8(width, height, rgba.as_raw())?;
            draw(&mut surface)?;
            let frame = surface.finish()?;

            std::fs::create_dir_all(&self.cache_dir)
                .with_context(|| format!("create cache dir '{}'", self.cache_dir.display()))
                .map_err(creditmark::CreditmarkError::Other)?;
            image::save_buffer_with_format(
                &cached,
                &frame.data,
                frame.width,
                frame.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .with_context(|| format!("write variant '{}'", cached.display()))
            .map_err(creditmark::CreditmarkError::Other)?;
        }

        let (width, height) = image::image_dimensions(&cached)
            .with_context(|| format!("probe variant '{}'", cached.display()))
            .map_err(creditmark::CreditmarkError::Other)?;
        Ok(Some(ImageRef {
            key: cached.display().to_string(),
            width,
            height,
            exists: true,
        }))
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = 0xcbf29ce484222325u64;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}
