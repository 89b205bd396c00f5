//! Placeholder "AI" pixel-art generation.
//!
//! This module provides:
//! - the style palette registry
//! - `WxH` size validation
//! - the keyword pattern generator

pub mod palette;
pub mod pattern;
pub mod size;

pub use size::SizeError;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

pub const EXAMPLE_SIZES: [&str; 4] = ["16x16", "32x32", "64x64", "128x128"];
pub const MAX_COLORS: u32 = 64;

/// Body of a generation request. An explicit `null` for `size` or `style` means the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_size", deserialize_with = "size_or_default")]
    pub size: String,
    #[serde(default = "default_style", deserialize_with = "style_or_default")]
    pub style: String,
    /// Accepted for compatibility, any integer or `null`; the generator does not consult it.
    #[serde(default = "default_colors")]
    pub colors: Option<i64>,
}

fn default_size() -> String {
    "32x32".to_string()
}

fn default_style() -> String {
    palette::DEFAULT_STYLE.to_string()
}

fn default_colors() -> Option<i64> {
    Some(16)
}

fn size_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_size))
}

fn style_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_style))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelData {
    pub pixels: Vec<Vec<String>>,
    pub palette: Vec<String>,
    pub prompt: String,
    pub style: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    pub pixel_data: PixelData,
    pub width: u32,
    pub height: u32,
    pub message: String,
}

/// Validate the size, pick the palette and render the grid.
///
/// The reported `style` is the one requested, even when it fell back to `pixel`.
pub fn generate<R: Rng>(req: &GenerationRequest, rng: &mut R) -> Result<GenerationResult, SizeError> {
    let (width, height) = size::parse_size(&req.size)?;
    let palette = palette::resolve(&req.style);
    let pixels = pattern::render(width, height, &req.prompt, palette, rng);

    Ok(GenerationResult {
        success: true,
        pixel_data: PixelData {
            pixels,
            palette: palette.iter().map(|c| c.to_string()).collect(),
            prompt: req.prompt.clone(),
            style: req.style.clone(),
        },
        width,
        height,
        message: format!(
            "Generated {width}x{height} pixel art for prompt: '{}'",
            req.prompt
        ),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleInfo {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StylesCatalogue {
    pub styles: Vec<StyleInfo>,
    pub sizes: Vec<&'static str>,
    pub max_colors: u32,
}

pub fn catalogue() -> StylesCatalogue {
    StylesCatalogue {
        styles: palette::STYLES
            .iter()
            .map(|s| StyleInfo {
                name: s.name,
                description: s.description,
            })
            .collect(),
        sizes: EXAMPLE_SIZES.to_vec(),
        max_colors: MAX_COLORS,
    }
}
