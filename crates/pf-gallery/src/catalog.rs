//! The canonical, fixed-size list of portfolio entries.

use chrono::{Local, TimeZone};
use tracing::debug;

use pf_classify::parse_filename;
use pf_core::{Category, EntryId, PortfolioEntry};

/// Rendered in place of date and time when the filename carried no timestamp.
pub const UNKNOWN_STAMP: &str = "-";

/// Format epoch milliseconds as display date and time in `tz`.
pub fn format_timestamp<Tz>(timestamp: u64, tz: &Tz) -> (String, String)
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let local = i64::try_from(timestamp)
        .ok()
        .filter(|millis| *millis > 0)
        .and_then(|millis| tz.timestamp_millis_opt(millis).single());
    match local {
        Some(moment) => (
            moment.format("%Y/%m/%d").to_string(),
            moment.format("%H:%M:%S").to_string(),
        ),
        None => (UNKNOWN_STAMP.to_string(), UNKNOWN_STAMP.to_string()),
    }
}

/// Build the entry for the asset at `index` in the manifest.
pub fn entry_from_filename<Tz>(
    index: usize,
    filename: &str,
    image_base: &str,
    prompt_file: String,
    tz: &Tz,
) -> PortfolioEntry
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let parsed = parse_filename(filename);
    let (date, time) = format_timestamp(parsed.timestamp, tz);
    PortfolioEntry {
        id: EntryId::from_index(index),
        image_path: format!("{}/{filename}", image_base.trim_end_matches('/')),
        prompt_file,
        title: format!("AI Generated Art {}", index + 1),
        category: parsed.naive_category,
        timestamp: parsed.timestamp,
        date,
        time,
        model: parsed.model,
    }
}

/// Single-writer store of portfolio entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<PortfolioEntry>,
}

impl Catalog {
    /// Build the catalog from asset filenames; `prompt_file` maps an image name to
    /// its prompt file name.
    pub fn initialize<S, F>(filenames: &[S], image_base: &str, prompt_file: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&str) -> String,
    {
        let entries = filenames
            .iter()
            .enumerate()
            .map(|(index, filename)| {
                let filename = filename.as_ref();
                entry_from_filename(index, filename, image_base, prompt_file(filename), &Local)
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PortfolioEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&PortfolioEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries still waiting for the classifier, in catalog order.
    pub fn unclassified(&self) -> impl Iterator<Item = &PortfolioEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.category == Category::Unclassified)
    }

    /// Resolve an unclassified entry. Returns whether the category changed; entries
    /// that already hold a definitive category are left alone.
    pub fn update_category(&mut self, id: EntryId, category: Category) -> bool {
        if !category.is_definitive() {
            return false;
        }
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) else {
            return false;
        };
        if entry.category.is_definitive() {
            return false;
        }
        debug!(%id, %category, "category resolved");
        entry.category = category;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn prompt_name(filename: &str) -> String {
        filename.replace(".jpg", "_prompt.txt")
    }

    fn sample() -> Catalog {
        Catalog::initialize(
            &[
                "generated_image_1750667345592.jpg",
                "midjourney_imagen_3_0_generate_002_1750749093535.jpg",
                "cover.jpg",
            ],
            "/images/",
            prompt_name,
        )
    }

    #[test]
    fn initialize_derives_entries_from_filenames() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);

        let first = &catalog.entries()[0];
        assert_eq!(first.id.to_string(), "image-0");
        assert_eq!(first.image_path, "/images/generated_image_1750667345592.jpg");
        assert_eq!(first.prompt_file, "generated_image_1750667345592_prompt.txt");
        assert_eq!(first.title, "AI Generated Art 1");
        assert_eq!(first.category, Category::Unclassified);
        assert_eq!(first.timestamp, 1_750_667_345_592);

        let second = &catalog.entries()[1];
        assert_eq!(second.category, Category::Midjourney);
        assert_eq!(second.model, "Imagen 3.0");

        let third = &catalog.entries()[2];
        assert_eq!(third.timestamp, 0);
        assert_eq!(third.date, UNKNOWN_STAMP);
        assert_eq!(third.time, UNKNOWN_STAMP);
    }

    #[test]
    fn ids_are_unique() {
        let catalog = sample();
        let ids: HashSet<_> = catalog.entries().iter().map(|entry| entry.id).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn timestamps_format_in_the_given_zone() {
        let (date, time) = format_timestamp(1_750_667_345_592, &Utc);
        assert_eq!(date, "2025/06/23");
        assert_eq!(time, "08:29:05");
    }

    #[test]
    fn update_category_only_resolves_unclassified_entries() {
        let mut catalog = sample();
        let id = EntryId::from_index(0);

        assert!(catalog.update_category(id, Category::Yaml));
        assert!(!catalog.update_category(id, Category::Midjourney));
        assert_eq!(catalog.get(id).map(|entry| entry.category), Some(Category::Yaml));
    }

    #[test]
    fn update_category_never_reverts_or_touches_unknown_ids() {
        let mut catalog = sample();
        let id = EntryId::from_index(1);

        assert!(!catalog.update_category(id, Category::Unclassified));
        assert!(!catalog.update_category(id, Category::Yaml));
        assert_eq!(catalog.get(id).map(|entry| entry.category), Some(Category::Midjourney));
        assert!(!catalog.update_category(EntryId::from_index(99), Category::Yaml));
        assert!(!catalog.update_category(EntryId::from_index(0), Category::Unclassified));
        assert_eq!(catalog.unclassified().count(), 2);
    }
}
