use std::collections::HashMap;

use crate::{
    error::{CreditmarkError, CreditmarkResult},
    font::FontAsset,
};

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Stateful helper for building Parley text layouts from a font asset.
///
/// One engine type serves both the metrics provider and the canvas so that
/// measured and drawn text boxes share the same shaping semantics. Mixing
/// rasterizer implementations between measurement and drawing produces
/// inconsistent heights; keeping a single stack rules that out by
/// construction.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    // Registered family names keyed by font path; registration clones the
    // font bytes into the collection, so it must happen once per font, not
    // once per caption.
    family_cache: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family_cache: HashMap::new(),
        }
    }

    /// Shape and lay out a single-line caption in the given font.
    pub fn layout_caption(
        &mut self,
        text: &str,
        font: &FontAsset,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CreditmarkResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CreditmarkError::validation(
                "caption size_px must be finite and > 0",
            ));
        }

        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        // Captions are single line; no wrap width.
        layout.break_all_lines(None);

        Ok(layout)
    }

    fn family_for(&mut self, font: &FontAsset) -> CreditmarkResult<String> {
        let key = font.path_str().into_owned();
        if let Some(name) = self.family_cache.get(&key) {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CreditmarkError::config("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CreditmarkError::config("registered font family has no name"))?
            .to_string();

        self.family_cache.insert(key, family_name.clone());
        Ok(family_name)
    }
}
