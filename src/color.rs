use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 color parsed from the settings wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDef {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorDef {
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB`, `#RRGGBBAA`, `rgb(r,g,b)` or `rgba(r,g,b,a)`.
    ///
    /// Functional forms take 0-255 channels and a 0..=1 alpha, matching the
    /// settings wire contract (e.g. `rgba(255,255,255,0.7)`).
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Some(body) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
        {
            return parse_functional(body, s.starts_with("rgba("));
        }
        parse_hex(s)
    }

    /// Canonical `#rrggbbaa` form used for fingerprinting.
    pub fn to_hex_rgba(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Rgba8Premul {
            r: premul(self.r, self.a),
            g: premul(self.g, self.a),
            b: premul(self.b, self.a),
            a: self.a,
        }
    }
}

impl Serialize for ColorDef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_rgba())
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_hex(s: &str) -> Result<ColorDef, String> {
    let s = s.strip_prefix('#').unwrap_or(s);
    // Byte-indexed slicing below; multibyte input must fail, not panic. The
    // blob this comes from is untrusted.
    if !s.is_ascii() {
        return Err(format!("hex color must be ascii, got \"{s}\""));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match s.len() {
        6 => Ok(ColorDef::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        )),
        8 => Ok(ColorDef::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

fn parse_functional(body: &str, has_alpha: bool) -> Result<ColorDef, String> {
    let body = body
        .strip_suffix(')')
        .ok_or_else(|| "functional color must end with ')'".to_owned())?;
    let parts = body.split(',').map(str::trim).collect::<Vec<_>>();
    let expected = if has_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return Err(format!(
            "functional color expects {expected} components, got {}",
            parts.len()
        ));
    }

    fn channel(s: &str) -> Result<u8, String> {
        s.parse::<u16>()
            .ok()
            .filter(|v| *v <= 255)
            .map(|v| v as u8)
            .ok_or_else(|| format!("color channel must be an integer in 0..=255, got \"{s}\""))
    }

    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = if has_alpha {
        let a = parts[3]
            .parse::<f64>()
            .map_err(|_| format!("alpha must be a number in 0..=1, got \"{}\"", parts[3]))?;
        if !(0.0..=1.0).contains(&a) {
            return Err(format!("alpha must be in 0..=1, got {a}"));
        }
        (a * 255.0).round() as u8
    } else {
        255
    };

    Ok(ColorDef::rgba(r, g, b, a))
}
