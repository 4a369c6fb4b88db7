use std::sync::Arc;

use crate::{
    color::ColorDef,
    error::{CreditmarkError, CreditmarkResult},
    font::FontAsset,
    layout::{Rect, TextAlign},
    text::{TextBrushRgba8, TextLayoutEngine},
};

/// Finished overlay raster in straight-alpha RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Mutable raster handle the variant store passes into the draw callback.
///
/// The drawer only ever needs a filled rectangle and a bottom-anchored caption;
/// everything else about the raster stays with the store.
pub trait CanvasSurface {
    fn fill_rect(&mut self, rect: Rect, color: ColorDef) -> CreditmarkResult<()>;

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        caption: &str,
        x: i32,
        y: i32,
        align: TextAlign,
        font: &FontAsset,
        size_px: u32,
        color: ColorDef,
    ) -> CreditmarkResult<()>;
}

/// CPU canvas backed by `vello_cpu`, seeded from the source image pixels.
///
/// Text is shaped through the same [`TextLayoutEngine`] the metrics provider
/// uses, so the drawn caption occupies exactly the measured box.
pub struct VelloSurface {
    ctx: vello_cpu::RenderContext,
    engine: TextLayoutEngine,
    width: u16,
    height: u16,
}

impl VelloSurface {
    /// Build a surface over straight-alpha RGBA8 source pixels.
    pub fn from_rgba8(width: u32, height: u32, rgba8: &[u8]) -> CreditmarkResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| CreditmarkError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| CreditmarkError::render("surface height exceeds u16"))?;
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8.len() != expected {
            return Err(CreditmarkError::render(format!(
                "surface byte len mismatch: expected {expected}, got {}",
                rgba8.len()
            )));
        }

        let mut premul = rgba8.to_vec();
        premultiply_rgba8_in_place(&mut premul);
        let pixmap = pixmap_from_premul_bytes(&premul, width, height)?;
        let base = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(base);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));

        Ok(Self {
            ctx,
            engine: TextLayoutEngine::new(),
            width: w,
            height: h,
        })
    }

    /// Rasterize and hand back the mutated pixels for persistence.
    pub fn finish(mut self) -> CreditmarkResult<Frame> {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        Ok(Frame {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data,
        })
    }
}

impl CanvasSurface for VelloSurface {
    fn fill_rect(&mut self, rect: Rect, color: ColorDef) -> CreditmarkResult<()> {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            f64::from(rect.x1),
            f64::from(rect.y1),
            f64::from(rect.x2),
            f64::from(rect.y2),
        ));
        Ok(())
    }

    fn draw_text(
        &mut self,
        caption: &str,
        x: i32,
        y: i32,
        align: TextAlign,
        font: &FontAsset,
        size_px: u32,
        color: ColorDef,
    ) -> CreditmarkResult<()> {
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let layout = self
            .engine
            .layout_caption(caption, font, size_px as f32, brush)?;

        let w = f64::from(layout.width());
        let h = f64::from(layout.height());
        let left = match align {
            TextAlign::Left => f64::from(x),
            TextAlign::Center => f64::from(x) - w / 2.0,
            TextAlign::Right => f64::from(x) - w,
        };
        // Vertical alignment is always bottom.
        let top = f64::from(y) - h;

        let font_data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font.bytes().to_vec()), 0);

        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((left, top)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font_data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        Ok(())
    }
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CreditmarkResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CreditmarkError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CreditmarkError::render("pixmap height exceeds u16"))?;

    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
