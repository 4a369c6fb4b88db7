use crate::{
    error::CreditmarkResult,
    fingerprint::variant_name,
    font::FontAsset,
    layout::compute_layout,
    metrics::TextMetrics,
    settings::{CreditsOverride, OverlayDefaults, resolve_settings},
    surface::CanvasSurface,
};

/// Operation tag in variant names; changing it invalidates every cached variant.
pub const CREDITS_OPERATION: &str = "add_credits";

/// Reference to a host-persisted image record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// Opaque host key (asset path, record id, ...).
    pub key: String,
    pub width: u32,
    pub height: u32,
    /// Whether the underlying file is persisted and readable.
    pub exists: bool,
}

/// Result of one overlay request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// Short-circuit: the original image, untouched.
    Unchanged(ImageRef),
    /// The rendered (or cache-served) credits variant.
    Variant(ImageRef),
    /// The store could not provide a drawable raster; no variant produced.
    Unavailable,
}

/// Draw callback handed to the variant store on a cache miss.
pub type DrawFn<'a> = dyn FnMut(&mut dyn CanvasSurface) -> CreditmarkResult<()> + 'a;

/// External variant/asset store.
///
/// The store owns caching: if `variant` is already persisted for `image` it
/// returns that reference without invoking `draw`, which is what makes the
/// overlay at-most-once per fingerprint. `Ok(None)` means the store could not
/// obtain a drawable raster for the source image.
pub trait VariantStore {
    fn manipulate(
        &mut self,
        image: &ImageRef,
        variant: &str,
        draw: &mut DrawFn<'_>,
    ) -> CreditmarkResult<Option<ImageRef>>;
}

/// Top-level overlay entry point.
///
/// Stateless apart from its configuration; safe to call for different images
/// from independent instances without shared state.
pub struct CreditsOverlay<M> {
    defaults: OverlayDefaults,
    font: FontAsset,
    metrics: M,
}

impl<M: TextMetrics> CreditsOverlay<M> {
    pub fn new(defaults: OverlayDefaults, font: FontAsset, metrics: M) -> Self {
        Self {
            defaults,
            font,
            metrics,
        }
    }

    /// Overlay `caption` onto `image`, returning the cached variant.
    ///
    /// A missing image or empty caption passes the original reference through
    /// without touching the metrics provider or the store.
    #[tracing::instrument(skip_all, fields(image = %image.key))]
    pub fn apply(
        &mut self,
        store: &mut dyn VariantStore,
        image: &ImageRef,
        caption: Option<&str>,
        override_: Option<&CreditsOverride>,
    ) -> CreditmarkResult<OverlayOutcome> {
        let caption = caption.unwrap_or("");
        if !image.exists || caption.is_empty() {
            tracing::debug!("credits overlay skipped (missing image or empty caption)");
            return Ok(OverlayOutcome::Unchanged(image.clone()));
        }

        let settings = resolve_settings(override_, &self.defaults, &self.font);
        let bbox = self
            .metrics
            .measure(caption, &self.font, settings.font_size)?;
        let layout = compute_layout(&settings, image.width, image.height, bbox);
        let variant = variant_name(
            CREDITS_OPERATION,
            caption,
            &settings,
            self.defaults.force_rebuild,
        );
        tracing::debug!(variant = %variant, "requesting credits variant");

        let font = &self.font;
        let rendered = store.manipulate(image, &variant, &mut |surface| {
            if !bbox.is_degenerate() {
                surface.fill_rect(layout.background, settings.box_background)?;
            }
            surface.draw_text(
                caption,
                layout.x,
                layout.y,
                layout.align,
                font,
                settings.font_size,
                settings.font_color,
            )
        })?;

        Ok(match rendered {
            Some(variant_ref) => OverlayOutcome::Variant(variant_ref),
            None => OverlayOutcome::Unavailable,
        })
    }
}
