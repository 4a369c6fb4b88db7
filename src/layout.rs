use crate::settings::{EffectiveSettings, PositionPreset};

/// Measured pixel extent of a caption rendered in a given font and size.
///
/// A zero width or height means "no visible caption" and suppresses the
/// background box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Horizontal alignment of the caption relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Pixel rectangle with `x1 <= x2` and `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Resolved caption placement: text anchor plus background-box rectangle.
///
/// Vertical alignment is always bottom; the anchor `y` sits at
/// `image_height - text_margin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorLayout {
    pub x: i32,
    pub y: i32,
    pub align: TextAlign,
    pub background: Rect,
}

/// Map effective settings, image dimensions and a caption bounding box onto
/// pixel-exact anchor and background-box coordinates.
///
/// All arithmetic happens in f64 and is truncated toward zero at the end,
/// matching float-to-int truncation semantics rather than rounding.
pub fn compute_layout(
    settings: &EffectiveSettings,
    image_width: u32,
    image_height: u32,
    bbox: BoundingBox,
) -> AnchorLayout {
    let margin = f64::from(settings.text_margin);
    let pad = f64::from(settings.box_padding);
    let w = f64::from(bbox.width);
    let h = f64::from(bbox.height);

    let y = f64::from(image_height) - margin;

    let (x, align, box_x1, box_x2) = match settings.position {
        PositionPreset::BottomLeft => {
            let x = margin;
            (x, TextAlign::Left, x - pad, x + w + pad)
        }
        PositionPreset::BottomCenter => {
            let x = f64::from(image_width) / 2.0;
            (x, TextAlign::Center, x - w / 2.0 - pad, x + w / 2.0 + pad)
        }
        PositionPreset::BottomRight => {
            let x = f64::from(image_width) - margin;
            (x, TextAlign::Right, x - w - pad, x + pad)
        }
    };

    AnchorLayout {
        x: x as i32,
        y: y as i32,
        align,
        background: Rect {
            x1: box_x1 as i32,
            y1: (y - h - pad) as i32,
            x2: box_x2 as i32,
            y2: (y + pad) as i32,
        },
    }
}
