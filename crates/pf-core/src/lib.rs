//! Core domain entities, preferences, and collaborator traits for Promptfolio.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Text shown in place of a prompt that could not be loaded.
pub const FAILURE_PLACEHOLDER: &str = "プロンプトの読み込みに失敗しました。";

/// Errors returned by core parsing and collaborator calls.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Returned when user input cannot be parsed into a domain value.
    #[error("validation error: {0}")]
    Validation(String),
    /// Returned when an asset cannot be retrieved or decoded.
    #[error("asset error: {0}")]
    Asset(String),
    /// Returned when configuration cannot be read or written.
    #[error("config error: {0}")]
    Config(String),
    /// Returned when the host clipboard rejects a write.
    #[error("clipboard error: {0}")]
    Clipboard(String),
    /// Returned when an id does not name any catalog entry.
    #[error("unknown entry: {0}")]
    UnknownEntry(EntryId),
}

/// The closed set of prompt categories.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Prompts carrying Midjourney command flags.
    Midjourney,
    /// Prompts written for Stable Diffusion.
    StableDiffusion,
    /// Plain image prompts; also the fallback bucket.
    ImagePrompt,
    /// Indented, localized structured prompts.
    Yaml,
    /// Not yet resolved by the classifier.
    Unclassified,
}

impl Category {
    /// Every category, in filter-menu order.
    pub const ALL: [Category; 5] = [
        Category::Midjourney,
        Category::StableDiffusion,
        Category::ImagePrompt,
        Category::Yaml,
        Category::Unclassified,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Midjourney => "Midjourney",
            Category::StableDiffusion => "Stable Diffusion",
            Category::ImagePrompt => "Image Prompt",
            Category::Yaml => "YAML",
            Category::Unclassified => "Unclassified",
        }
    }

    /// Whether the category is final, i.e. anything but `Unclassified`.
    pub fn is_definitive(self) -> bool {
        self != Category::Unclassified
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(value: &str) -> CoreResult<Self> {
        let normalized: String = value
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "midjourney" => Ok(Category::Midjourney),
            "stablediffusion" => Ok(Category::StableDiffusion),
            "imageprompt" => Ok(Category::ImagePrompt),
            "yaml" => Ok(Category::Yaml),
            "unclassified" => Ok(Category::Unclassified),
            _ => Err(CoreError::Validation(format!("unknown category: {value}"))),
        }
    }
}

/// Stable identifier of a catalog entry, rendered as `image-{index}`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntryId(usize);

impl EntryId {
    /// Build the id for the entry at `index` in the asset manifest.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Manifest position the id was assigned from.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image-{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = CoreError;

    fn from_str(value: &str) -> CoreResult<Self> {
        value
            .strip_prefix("image-")
            .and_then(|index| index.parse().ok())
            .map(Self)
            .ok_or_else(|| CoreError::Validation(format!("invalid entry id: {value}")))
    }
}

/// One image and prompt pairing with its derived metadata.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PortfolioEntry {
    /// Unique identifier for the entry.
    pub id: EntryId,
    /// Path of the image asset.
    pub image_path: String,
    /// File name of the sibling prompt asset.
    pub prompt_file: String,
    /// Display label.
    pub title: String,
    /// Current category; only moves away from `Unclassified`, once.
    pub category: Category,
    /// Epoch milliseconds from the filename, 0 when unknown.
    pub timestamp: u64,
    /// Local date derived from `timestamp`.
    pub date: String,
    /// Local time of day derived from `timestamp`.
    pub time: String,
    /// Generator model label.
    pub model: String,
}

/// Keys the view can be ordered by.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Timestamp,
    Time,
    Model,
    Title,
    Category,
}

impl SortKey {
    /// Every key, in menu order.
    pub const ALL: [SortKey; 5] = [
        SortKey::Timestamp,
        SortKey::Time,
        SortKey::Model,
        SortKey::Title,
        SortKey::Category,
    ];

    /// Display name, also accepted when parsing.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Timestamp => "Timestamp",
            SortKey::Time => "Time",
            SortKey::Model => "Model",
            SortKey::Title => "Title",
            SortKey::Category => "Category",
        }
    }

    /// The key after this one in menu order, wrapping around.
    pub fn next(self) -> Self {
        let position = Self::ALL.iter().position(|key| *key == self).unwrap_or(0);
        Self::ALL[(position + 1) % Self::ALL.len()]
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(value: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| CoreError::Validation(format!("unknown sort key: {value}")))
    }
}

/// Sort order of the view.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// Display name of the direction.
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "Ascending",
            SortDirection::Descending => "Descending",
        }
    }

    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(value: &str) -> CoreResult<Self> {
        match value.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(CoreError::Validation(format!("unknown sort direction: {value}"))),
        }
    }
}

/// Which categories the view shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Whether an entry with `category` passes the filter.
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }

    /// The next filter in menu order: all, then each category, wrapping around.
    pub fn next(self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::ALL[0]),
            CategoryFilter::Only(current) => {
                let position = Category::ALL
                    .iter()
                    .position(|category| *category == current)
                    .unwrap_or(0);
                Category::ALL
                    .get(position + 1)
                    .map_or(CategoryFilter::All, |category| CategoryFilter::Only(*category))
            }
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(category) => f.write_str(category.label()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CoreError;

    fn from_str(value: &str) -> CoreResult<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        value.parse().map(CategoryFilter::Only)
    }
}

/// Session-wide sort and filter choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ViewPreferences {
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub category_filter: CategoryFilter,
}

/// Asynchronous retrieval of prompt text assets.
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// Return the source name, used in logs.
    fn name(&self) -> &'static str;
    /// Fetch and decode the prompt file.
    async fn fetch(&self, prompt_file: &str) -> CoreResult<String>;
}

/// Write-only access to the host clipboard.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> CoreResult<()>;
}
