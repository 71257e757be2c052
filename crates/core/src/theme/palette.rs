use crate::render::Color;

/// Immutable low/high colour pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub id: &'static str,
    pub name: &'static str,
    low: [u8; 3],
    high: [u8; 3],
}

impl Palette {
    const fn new(id: &'static str, name: &'static str, low: [u8; 3], high: [u8; 3]) -> Self {
        Self {
            id,
            name,
            low,
            high,
        }
    }

    pub fn low(&self) -> Color {
        let [r, g, b] = self.low;
        Color::rgb8(r, g, b)
    }

    pub fn high(&self) -> Color {
        let [r, g, b] = self.high;
        Color::rgb8(r, g, b)
    }
}

pub const PALETTES: [Palette; 5] = [
    Palette::new("classic", "Classic", [0x66, 0xE3, 0xD5], [0xFF, 0x7A, 0xC8]),
    Palette::new("mono", "Monochrome", [0xFF, 0xFF, 0xFF], [0xBF, 0xBF, 0xBF]),
    Palette::new("neon", "Neon Cyan/Magenta", [0x7E, 0xF9, 0xFF], [0xFF, 0x5A, 0xCD]),
    Palette::new("sunset", "Sunset", [0xFF, 0xB8, 0x6B], [0xFF, 0xE8, 0xAA]),
    Palette::new("ice", "Ice Blue", [0xA5, 0xC7, 0xFF], [0xE0, 0xEC, 0xFF]),
];

/// Returned for missing or unknown ids.
pub const DEFAULT_PALETTE: Palette = PALETTES[0];

pub fn find(id: &str) -> Option<&'static Palette> {
    PALETTES.iter().find(|palette| palette.id == id)
}

/// Looks up a palette, falling back to [`DEFAULT_PALETTE`].
pub fn lookup(id: Option<&str>) -> Palette {
    id.and_then(find).copied().unwrap_or(DEFAULT_PALETTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_matches_missing_id() {
        assert_eq!(lookup(Some("no-such-palette")), lookup(None));
        assert_eq!(lookup(None).id, "classic");
    }

    #[test]
    fn resolves_known_ids() {
        let neon = lookup(Some("neon"));
        assert_eq!(neon.low(), Color::from_hex("#7EF9FF").unwrap());
        assert_eq!(neon.high(), Color::from_hex("#FF5ACD").unwrap());
        assert!(PALETTES.iter().all(|palette| find(palette.id).is_some()));
    }
}
