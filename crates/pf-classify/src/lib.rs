//! Filename parsing and prompt classification heuristics for Promptfolio.

use pf_core::{Category, FAILURE_PLACEHOLDER};
use pf_utils::{contains_cjk, contains_double_space, parse_digit_run};

/// Length of the epoch-millisecond stamp embedded in asset filenames.
pub const TIMESTAMP_DIGITS: usize = 13;

/// Model label used when no known marker appears in the filename.
pub const DEFAULT_MODEL: &str = "AI Generated";

/// Command flags that only Midjourney prompts carry.
pub const MIDJOURNEY_MARKERS: [&str; 2] = ["--ar", "--v"];

/// Opening phrase of Stable Diffusion prompts.
pub const STABLE_DIFFUSION_PREAMBLE: &str = "masterpiece, best quality";

/// Filename markers of known generators and their labels, first match wins.
const KNOWN_MODELS: &[(&str, &str)] = &[
    ("imagen_3_0_generate_002", "Imagen 3.0"),
    ("imagen", "Imagen"),
    ("dall_e", "DALL-E"),
];

/// Filename markers for the naive category guess, in precedence order.
const CATEGORY_MARKERS: &[(&str, Category)] = &[
    ("midjourney", Category::Midjourney),
    ("stableDiffusion", Category::StableDiffusion),
    ("imagePrompt", Category::ImagePrompt),
    ("yaml", Category::Yaml),
];

/// Metadata recovered from an asset filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFilename {
    /// Epoch milliseconds, 0 when the filename carries none.
    pub timestamp: u64,
    /// Generator label.
    pub model: String,
    /// Best guess from filename tokens; refined later by [`classify_prompt`].
    pub naive_category: Category,
}

/// Extract timestamp, model, and a naive category from an asset filename.
pub fn parse_filename(filename: &str) -> ParsedFilename {
    let timestamp = parse_digit_run(filename, TIMESTAMP_DIGITS).unwrap_or(0);

    let model = KNOWN_MODELS
        .iter()
        .find(|(marker, _)| filename.contains(marker))
        .map_or(DEFAULT_MODEL, |(_, label)| *label)
        .to_string();

    let naive_category = CATEGORY_MARKERS
        .iter()
        .find(|(marker, _)| filename.contains(marker))
        .map_or(Category::Unclassified, |(_, category)| *category);

    ParsedFilename {
        timestamp,
        model,
        naive_category,
    }
}

/// Map prompt text to a definitive category. Never returns `Unclassified`.
pub fn classify_prompt(text: &str) -> Category {
    let trimmed = text.trim();
    if trimmed.is_empty() || text == FAILURE_PLACEHOLDER {
        return Category::ImagePrompt;
    }
    if MIDJOURNEY_MARKERS.iter().any(|marker| text.contains(marker)) {
        return Category::Midjourney;
    }
    if trimmed.starts_with(STABLE_DIFFUSION_PREAMBLE) {
        return Category::StableDiffusion;
    }
    if contains_double_space(text) && contains_cjk(text) {
        return Category::Yaml;
    }
    Category::ImagePrompt
}
