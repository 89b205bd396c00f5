//! Style palettes used by the generator.
//!
//! Every style carries exactly eight `#RRGGBB` codes. Index 0 is the
//! background, index 2 the heart accent and index 3 the star accent.

pub const PALETTE_LEN: usize = 8;

pub type Palette = [&'static str; PALETTE_LEN];

pub const DEFAULT_STYLE: &str = "pixel";

pub const PIXEL: Palette = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
];

pub const RETRO: Palette = [
    "#2D1B69", "#11A3E2", "#F2E863", "#E23838", "#7A2048", "#553C9A", "#B14156", "#6F2DA8",
];

pub const MODERN: Palette = [
    "#264653", "#2A9D8F", "#E9C46A", "#F4A261", "#E76F51", "#E63946", "#F77F00", "#FCBF49",
];

pub const BACKGROUND: usize = 0;
pub const HEART_ACCENT: usize = 2;
pub const STAR_ACCENT: usize = 3;

/// A named style with the description shown in the styles catalogue.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub name: &'static str,
    pub description: &'static str,
    pub palette: &'static Palette,
}

pub const STYLES: [Style; 3] = [
    Style {
        name: "pixel",
        description: "Classic pixel art style",
        palette: &PIXEL,
    },
    Style {
        name: "retro",
        description: "Retro gaming inspired colors",
        palette: &RETRO,
    },
    Style {
        name: "modern",
        description: "Modern color palette",
        palette: &MODERN,
    },
];

/// Look up the palette for a style, falling back to `pixel` for anything unknown.
pub fn resolve(style: &str) -> &'static Palette {
    STYLES
        .iter()
        .find(|s| s.name == style)
        .map(|s| s.palette)
        .unwrap_or(&PIXEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_styles() {
        assert_eq!(resolve("pixel"), &PIXEL);
        assert_eq!(resolve("modern"), &MODERN);
        assert_eq!(
            resolve("retro"),
            &[
                "#2D1B69", "#11A3E2", "#F2E863", "#E23838", "#7A2048", "#553C9A", "#B14156",
                "#6F2DA8"
            ]
        );
    }

    #[test]
    fn test_resolve_falls_back_to_pixel() {
        assert_eq!(resolve("unknown-style"), resolve("pixel"));
        assert_eq!(resolve(""), &PIXEL);
        // Lookup is case-sensitive.
        assert_eq!(resolve("Retro"), &PIXEL);
    }

    #[test]
    fn test_every_style_has_eight_hex_colors() {
        for style in STYLES {
            assert_eq!(style.palette.len(), PALETTE_LEN);
            for color in style.palette {
                assert_eq!(color.len(), 7, "{color}");
                assert!(color.starts_with('#'));
                assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
            }
        }
    }
}
