use crate::settings::EffectiveSettings;

/// Build the variant name for one overlay rendering.
///
/// The name is the ordered join of the operation tag, the caption text and a
/// digest of the effective settings values. It is the opaque key handed to the
/// external variant store, so it must stay stable across process restarts for
/// identical logical input.
///
/// `force_rebuild` appends the current unix second, which defeats caching on
/// every invocation while the flag is set. That is a debugging escape hatch,
/// not a correctness feature.
pub fn variant_name(
    operation: &str,
    caption: &str,
    settings: &EffectiveSettings,
    force_rebuild: bool,
) -> String {
    let mut parts = vec![
        operation.to_owned(),
        caption.to_owned(),
        settings_digest(settings),
    ];

    if force_rebuild {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        parts.push(now.to_string());
    }

    parts.join("_")
}

/// 128-bit digest of the settings values in fixed declared order.
///
/// The field order is spelled out explicitly so the digest never depends on
/// the iteration order of any dynamic structure.
fn settings_digest(settings: &EffectiveSettings) -> String {
    let joined = [
        settings.text_margin.to_string(),
        settings.box_padding.to_string(),
        settings.font_path.clone(),
        settings.font_size.to_string(),
        settings.font_color.to_hex_rgba(),
        settings.box_background.to_hex_rgba(),
        settings.position.as_wire().to_owned(),
    ]
    .join("::");

    let mut a = Fnv1a64::new(0xcbf29ce484222325);
    let mut b = Fnv1a64::new(0x9ae16a3b2f90404f);
    a.write_bytes(joined.as_bytes());
    b.write_bytes(joined.as_bytes());

    format!("{:016x}{:016x}", a.finish(), b.finish())
}

#[derive(Clone, Copy)]
struct Fnv1a64(u64);

impl Fnv1a64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.0 = h;
    }

    fn finish(self) -> u64 {
        self.0
    }
}
