use crate::{
    error::CreditmarkResult,
    font::FontAsset,
    layout::BoundingBox,
    text::{TextBrushRgba8, TextLayoutEngine},
};

/// Capability seam for measuring a caption's rendered extent.
///
/// Whatever implements this must share text-box semantics with the canvas
/// that later draws the caption, or box and text drift apart.
pub trait TextMetrics {
    fn measure(
        &mut self,
        caption: &str,
        font: &FontAsset,
        size_px: u32,
    ) -> CreditmarkResult<BoundingBox>;
}

/// Parley-backed metrics provider; the same stack the canvas rasterizes with.
#[derive(Default)]
pub struct ParleyTextMetrics {
    engine: TextLayoutEngine,
}

impl ParleyTextMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextMetrics for ParleyTextMetrics {
    fn measure(
        &mut self,
        caption: &str,
        font: &FontAsset,
        size_px: u32,
    ) -> CreditmarkResult<BoundingBox> {
        if caption.is_empty() {
            return Ok(BoundingBox::default());
        }

        let layout =
            self.engine
                .layout_caption(caption, font, size_px as f32, TextBrushRgba8::default())?;

        Ok(BoundingBox {
            width: layout.width().ceil().max(0.0) as u32,
            height: layout.height().ceil().max(0.0) as u32,
        })
    }
}
