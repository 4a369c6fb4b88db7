#![forbid(unsafe_code)]

pub mod color;
pub mod error;
pub mod fingerprint;
pub mod font;
pub mod layout;
pub mod metrics;
pub mod overlay;
pub mod settings;
pub mod surface;
pub mod text;

pub use color::{ColorDef, Rgba8Premul};
pub use error::{CreditmarkError, CreditmarkResult};
pub use fingerprint::variant_name;
pub use font::FontAsset;
pub use layout::{AnchorLayout, BoundingBox, Rect, TextAlign, compute_layout};
pub use metrics::{ParleyTextMetrics, TextMetrics};
pub use overlay::{
    CREDITS_OPERATION, CreditsOverlay, DrawFn, ImageRef, OverlayOutcome, VariantStore,
};
pub use settings::{
    CreditsOverride, EffectiveSettings, OverlayDefaults, PositionPreset, resolve_settings,
};
pub use surface::{CanvasSurface, Frame, VelloSurface};
pub use text::{TextBrushRgba8, TextLayoutEngine};
