//! Keyword-driven pattern fill.

use super::palette::{BACKGROUND, HEART_ACCENT, PALETTE_LEN, Palette, STAR_ACCENT};
use rand::Rng;

/// Which fill a prompt selects. `heart` wins over `star` when both appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Heart,
    Star,
    Random,
}

impl Pattern {
    pub fn for_prompt(prompt: &str) -> Self {
        let prompt_lower = prompt.to_lowercase();
        if prompt_lower.contains("heart") {
            Pattern::Heart
        } else if prompt_lower.contains("star") {
            Pattern::Star
        } else {
            Pattern::Random
        }
    }
}

/// Render a `height` x `width` grid of palette colors for `prompt`.
///
/// Only the random branch touches `rng`; heart and star grids are fully
/// determined by their inputs.
pub fn render<R: Rng>(
    width: u32,
    height: u32,
    prompt: &str,
    palette: &Palette,
    rng: &mut R,
) -> Vec<Vec<String>> {
    let pattern = Pattern::for_prompt(prompt);
    let (w, h) = (i64::from(width), i64::from(height));
    let (cx, cy) = (w / 2, h / 2);
    let radius = w.min(h) / 4;

    (0..h)
        .map(|y| {
            (0..w)
                .map(|x| {
                    let dx = (x - cx).abs();
                    let dy = (y - cy).abs();
                    let index = match pattern {
                        Pattern::Heart if dx + dy <= radius => HEART_ACCENT,
                        Pattern::Star if (dx <= 2 && dy <= 6) || (dx <= 6 && dy <= 2) => {
                            STAR_ACCENT
                        }
                        Pattern::Heart | Pattern::Star => BACKGROUND,
                        Pattern::Random => rng.random_range(0..PALETTE_LEN),
                    };
                    palette[index].to_string()
                })
                .collect()
        })
        .collect()
}
