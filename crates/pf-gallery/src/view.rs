//! Filtered and sorted projections of the catalog.

use std::cmp::Ordering;

use pf_core::{CategoryFilter, PortfolioEntry, SortDirection, SortKey, ViewPreferences};

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare(a: &PortfolioEntry, b: &PortfolioEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
        SortKey::Time => compare_text(&a.time, &b.time),
        SortKey::Model => compare_text(&a.model, &b.model),
        SortKey::Title => compare_text(&a.title, &b.title),
        SortKey::Category => compare_text(a.category.label(), b.category.label()),
    }
}

/// Project `entries` through a category filter and a sort.
///
/// Equal keys keep their catalog order in either direction. The input is only
/// borrowed; the returned view is a fresh sequence of references into it.
pub fn derive_view(
    entries: &[PortfolioEntry],
    filter: CategoryFilter,
    key: SortKey,
    direction: SortDirection,
) -> Vec<&PortfolioEntry> {
    let mut view: Vec<&PortfolioEntry> = entries
        .iter()
        .filter(|entry| filter.matches(entry.category))
        .collect();
    view.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    view
}

/// [`derive_view`] driven by the session preferences.
pub fn derive_view_with<'a>(
    entries: &'a [PortfolioEntry],
    preferences: &ViewPreferences,
) -> Vec<&'a PortfolioEntry> {
    derive_view(
        entries,
        preferences.category_filter,
        preferences.sort_key,
        preferences.sort_direction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::{Category, EntryId};

    fn entry(index: usize, title: &str, category: Category, timestamp: u64, model: &str) -> PortfolioEntry {
        PortfolioEntry {
            id: EntryId::from_index(index),
            image_path: format!("/images/{index}.jpg"),
            prompt_file: format!("{index}_prompt.txt"),
            title: title.into(),
            category,
            timestamp,
            date: "2025/06/23".into(),
            time: format!("0{index}:00:00"),
            model: model.into(),
        }
    }

    fn sample() -> Vec<PortfolioEntry> {
        vec![
            entry(0, "beta", Category::Midjourney, 30, "Imagen 3.0"),
            entry(1, "Alpha", Category::Yaml, 10, "AI Generated"),
            entry(2, "gamma", Category::Midjourney, 20, "imagen 3.0"),
        ]
    }

    fn ids(view: &[&PortfolioEntry]) -> Vec<usize> {
        view.iter().map(|entry| entry.id.index()).collect()
    }

    #[test]
    fn all_passes_every_entry_through() {
        let entries = sample();
        let view = derive_view(&entries, CategoryFilter::All, SortKey::Timestamp, SortDirection::Ascending);
        assert_eq!(ids(&view), vec![1, 2, 0]);
    }

    #[test]
    fn filter_keeps_exact_category_matches() {
        let entries = sample();
        let view = derive_view(
            &entries,
            CategoryFilter::Only(Category::Midjourney),
            SortKey::Timestamp,
            SortDirection::Ascending,
        );
        assert_eq!(ids(&view), vec![2, 0]);

        let empty = derive_view(
            &entries,
            CategoryFilter::Only(Category::StableDiffusion),
            SortKey::Timestamp,
            SortDirection::Ascending,
        );
        assert!(empty.is_empty());
    }

    #[test]
    fn timestamp_directions_are_exact_reversals() {
        let entries = sample();
        let desc = derive_view(&entries, CategoryFilter::All, SortKey::Timestamp, SortDirection::Descending);
        let asc = derive_view(&entries, CategoryFilter::All, SortKey::Timestamp, SortDirection::Ascending);
        let mut reversed = ids(&desc);
        reversed.reverse();
        assert_eq!(reversed, ids(&asc));
    }

    #[test]
    fn text_keys_compare_case_insensitively() {
        let entries = sample();
        let view = derive_view(&entries, CategoryFilter::All, SortKey::Title, SortDirection::Ascending);
        assert_eq!(ids(&view), vec![1, 0, 2]);
    }

    #[test]
    fn ties_keep_catalog_order_in_both_directions() {
        let entries = sample();
        let asc = derive_view(&entries, CategoryFilter::All, SortKey::Model, SortDirection::Ascending);
        assert_eq!(ids(&asc), vec![1, 0, 2]);
        let desc = derive_view(&entries, CategoryFilter::All, SortKey::Model, SortDirection::Descending);
        assert_eq!(ids(&desc), vec![0, 2, 1]);
    }

    #[test]
    fn input_is_left_untouched() {
        let entries = sample();
        let before = entries.clone();
        let preferences = ViewPreferences {
            sort_key: SortKey::Category,
            sort_direction: SortDirection::Descending,
            category_filter: CategoryFilter::All,
        };
        let view = derive_view_with(&entries, &preferences);
        assert_eq!(view.len(), 3);
        assert_eq!(entries, before);
    }
}
