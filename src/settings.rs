use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    color::ColorDef,
    error::{CreditmarkError, CreditmarkResult},
    font::FontAsset,
};

/// Anchor preset for caption placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPreset {
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl PositionPreset {
    /// Parse the wire string; anything outside the enumeration is invalid.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bottom_left" => Some(Self::BottomLeft),
            "bottom_center" => Some(Self::BottomCenter),
            "bottom_right" => Some(Self::BottomRight),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }
}

/// Per-image override settings. Every field is optional; absent fields fall
/// back to [`OverlayDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CreditsOverride {
    #[serde(rename = "TextMargin", skip_serializing_if = "Option::is_none")]
    pub text_margin: Option<u32>,
    #[serde(rename = "BoxPadding", skip_serializing_if = "Option::is_none")]
    pub box_padding: Option<u32>,
    #[serde(rename = "FontSize", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(rename = "Position", skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionPreset>,
    #[serde(rename = "FontColor", skip_serializing_if = "Option::is_none")]
    pub font_color: Option<ColorDef>,
    #[serde(rename = "BoxBackgroundColor", skip_serializing_if = "Option::is_none")]
    pub box_background: Option<ColorDef>,
}

impl CreditsOverride {
    /// Parse the serialized override blob stored on the image record.
    ///
    /// Malformed JSON or a non-object root yields `None` (no override).
    /// Within a valid object every field is validated independently: unknown
    /// keys are ignored and type errors drop that field only.
    pub fn from_json(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        value.as_object()?;
        Some(Self::from_value(&value))
    }

    fn from_value(value: &Value) -> Self {
        fn uint(v: Option<&Value>) -> Option<u32> {
            v?.as_u64()?.try_into().ok()
        }
        fn color(v: Option<&Value>) -> Option<ColorDef> {
            ColorDef::parse(v?.as_str()?).ok()
        }

        Self {
            text_margin: uint(value.get("TextMargin")),
            box_padding: uint(value.get("BoxPadding")),
            font_size: uint(value.get("FontSize")),
            position: value
                .get("Position")
                .and_then(Value::as_str)
                .and_then(PositionPreset::parse),
            font_color: color(value.get("FontColor")),
            box_background: color(value.get("BoxBackgroundColor")),
        }
    }

    /// Serialize to the wire blob, skipping absent fields.
    pub fn to_json(&self) -> CreditmarkResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CreditmarkError::validation(format!("serialize override: {e}")))
    }
}

/// System-wide overlay defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayDefaults {
    pub text_margin: u32,
    pub box_padding: u32,
    pub font_size: u32,
    pub font_color: ColorDef,
    pub box_background: ColorDef,
    #[serde(deserialize_with = "lenient_preset")]
    pub position: PositionPreset,
    pub force_rebuild: bool,
}

impl Default for OverlayDefaults {
    fn default() -> Self {
        Self {
            text_margin: 10,
            box_padding: 10,
            font_size: 30,
            font_color: ColorDef::rgba(0, 0, 0, 255),
            box_background: ColorDef::rgba(255, 255, 255, 179),
            position: PositionPreset::BottomRight,
            force_rebuild: false,
        }
    }
}

impl OverlayDefaults {
    /// Load defaults from a JSON config document.
    ///
    /// A malformed document is a configuration error and must be surfaced at
    /// startup, never per overlay request. An invalid `position` string is the
    /// one lenient exception and falls back to `bottom_right`.
    pub fn from_json(raw: &str) -> CreditmarkResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| CreditmarkError::config(format!("parse overlay defaults: {e}")))
    }
}

// Invalid or absent position strings resolve to the fixed fallback instead of
// failing the whole config document.
fn lenient_preset<'de, D>(deserializer: D) -> Result<PositionPreset, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(PositionPreset::parse)
        .unwrap_or_default())
}

/// Fully resolved settings; every field has a concrete value.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveSettings {
    pub text_margin: u32,
    pub box_padding: u32,
    pub font_path: String,
    pub font_size: u32,
    pub font_color: ColorDef,
    pub box_background: ColorDef,
    pub position: PositionPreset,
}

/// Merge a per-image override with system defaults.
///
/// Each field takes the override's value when present, else the default. The
/// font path is not overridable; it comes from the startup-resolved font
/// asset.
pub fn resolve_settings(
    override_: Option<&CreditsOverride>,
    defaults: &OverlayDefaults,
    font: &FontAsset,
) -> EffectiveSettings {
    let o = override_.cloned().unwrap_or_default();

    EffectiveSettings {
        text_margin: o.text_margin.unwrap_or(defaults.text_margin),
        box_padding: o.box_padding.unwrap_or(defaults.box_padding),
        font_path: font.path_str().into_owned(),
        font_size: o.font_size.unwrap_or(defaults.font_size),
        font_color: o.font_color.unwrap_or(defaults.font_color),
        box_background: o.box_background.unwrap_or(defaults.box_background),
        position: o.position.unwrap_or(defaults.position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_font() -> FontAsset {
        FontAsset::from_bytes("fonts/test.ttf", vec![0u8; 4])
    }

    #[test]
    fn resolve_without_override_uses_defaults() {
        let defaults = OverlayDefaults::default();
        let s = resolve_settings(None, &defaults, &test_font());
        assert_eq!(s.text_margin, 10);
        assert_eq!(s.box_padding, 10);
        assert_eq!(s.font_size, 30);
        assert_eq!(s.font_color, ColorDef::rgba(0, 0, 0, 255));
        assert_eq!(s.box_background, ColorDef::rgba(255, 255, 255, 179));
        assert_eq!(s.position, PositionPreset::BottomRight);
        assert_eq!(s.font_path, "fonts/test.ttf");
    }

    #[test]
    fn resolve_prefers_override_fields() {
        let defaults = OverlayDefaults::default();
        let o = CreditsOverride {
            text_margin: Some(4),
            position: Some(PositionPreset::BottomLeft),
            ..Default::default()
        };
        let s = resolve_settings(Some(&o), &defaults, &test_font());
        assert_eq!(s.text_margin, 4);
        assert_eq!(s.position, PositionPreset::BottomLeft);
        // Untouched fields still come from defaults.
        assert_eq!(s.box_padding, 10);
    }

    #[test]
    fn override_blob_parses_leniently() {
        let o = CreditsOverride::from_json(
            r##"{"TextMargin": 5, "BoxPadding": "oops", "Position": "bottom_center",
                "FontColor": "#ffffff", "BoxBackgroundColor": "not-a-color",
                "SomethingElse": 1}"##,
        )
        .unwrap();
        assert_eq!(o.text_margin, Some(5));
        assert_eq!(o.box_padding, None);
        assert_eq!(o.position, Some(PositionPreset::BottomCenter));
        assert_eq!(o.font_color, Some(ColorDef::rgba(255, 255, 255, 255)));
        assert_eq!(o.box_background, None);
    }

    #[test]
    fn multibyte_color_string_degrades_to_default() {
        let o = CreditsOverride::from_json(
            r#"{"FontColor": "ab崔d", "BoxBackgroundColor": "rgba(0,0,0,0.5)"}"#,
        )
        .unwrap();
        assert_eq!(o.font_color, None);
        assert_eq!(o.box_background, Some(ColorDef::rgba(0, 0, 0, 128)));
    }

    #[test]
    fn malformed_blob_is_no_override() {
        assert_eq!(CreditsOverride::from_json("{not json"), None);
        assert_eq!(CreditsOverride::from_json("[1,2,3]"), None);
    }

    #[test]
    fn unknown_position_falls_back_through_the_chain() {
        let o = CreditsOverride::from_json(r#"{"Position": "top_left"}"#).unwrap();
        assert_eq!(o.position, None);

        let defaults = OverlayDefaults::from_json(r#"{"position": "sideways"}"#).unwrap();
        assert_eq!(defaults.position, PositionPreset::BottomRight);

        let s = resolve_settings(Some(&o), &defaults, &test_font());
        assert_eq!(s.position, PositionPreset::BottomRight);
    }

    #[test]
    fn defaults_config_parses_wire_colors() {
        let d = OverlayDefaults::from_json(
            r#"{"text_margin": 20, "box_background": "rgba(0,0,0,0.5)"}"#,
        )
        .unwrap();
        assert_eq!(d.text_margin, 20);
        assert_eq!(d.box_background, ColorDef::rgba(0, 0, 0, 128));
        // Unset keys keep their documented defaults.
        assert_eq!(d.font_size, 30);
        assert!(!d.force_rebuild);
    }

    #[test]
    fn malformed_defaults_are_a_config_error() {
        let err = OverlayDefaults::from_json(r#"{"text_margin": "ten"}"#).unwrap_err();
        assert!(err.to_string().contains("configuration error:"));
    }

    #[test]
    fn override_round_trips_through_wire_format() {
        let o = CreditsOverride {
            text_margin: Some(12),
            font_size: Some(24),
            position: Some(PositionPreset::BottomLeft),
            font_color: Some(ColorDef::parse("#aabbcc").unwrap()),
            ..Default::default()
        };
        let raw = o.to_json().unwrap();
        assert!(!raw.contains("BoxPadding"));
        let parsed = CreditsOverride::from_json(&raw).unwrap();
        assert_eq!(parsed, o);

        let defaults = OverlayDefaults::default();
        let font = test_font();
        assert_eq!(
            resolve_settings(Some(&parsed), &defaults, &font),
            resolve_settings(Some(&o), &defaults, &font)
        );
    }
}
