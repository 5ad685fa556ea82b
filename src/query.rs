// ==============================================================================
// query.rs - Variant Query Engine
// ==============================================================================
// Description: ID selection and pagination over the loaded variant table
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use crate::models::{PageMeta, VariantRecord};

/// Requested page window (1-based page number)
///
/// Both values are validated as >= 1 before a `Page` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub per_page: usize,
}

/// All rows whose ID equals `id`, in table order
pub fn select<'a>(rows: &'a [VariantRecord], id: &str) -> Vec<&'a VariantRecord> {
    rows.iter().filter(|row| row.matches_id(id)).collect()
}

/// Window the matches to `page` and describe the result set
///
/// Pages past the end yield an empty window rather than an error.
pub fn paginate<'m, 'a>(
    matches: &'m [&'a VariantRecord],
    page: Page,
) -> (&'m [&'a VariantRecord], PageMeta) {
    let total = matches.len();

    let start = (page.number - 1).saturating_mul(page.per_page).min(total);
    let end = start.saturating_add(page.per_page).min(total);

    // Always floor + 1, so an exact multiple reports one trailing empty page
    let pages = total / page.per_page + 1;

    let meta = PageMeta {
        entries_per_page: page.per_page,
        displayed_page: page.number,
        has_prev_page: page.number != 1,
        has_next_page: page.number < pages,
        pages,
        entries: total,
    };

    (&matches[start..end], meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use indexmap::IndexMap;

    fn rows(ids: &[&str]) -> Vec<VariantRecord> {
        ids.iter()
            .enumerate()
            .map(|(index, id)| {
                let mut fields = IndexMap::new();
                fields.insert("ID".to_string(), FieldValue::Text(id.to_string()));
                VariantRecord {
                    index: index as u64,
                    fields,
                }
            })
            .collect()
    }

    fn page(number: usize, per_page: usize) -> Page {
        Page { number, per_page }
    }

    #[test]
    fn test_select_preserves_order() {
        let table = rows(&["rs1", "rs2", "rs1", "rs3", "rs1"]);
        let matches = select(&table, "rs1");
        let indices: Vec<u64> = matches.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2, 4]);

        assert!(select(&table, "rs9").is_empty());
    }

    #[test]
    fn test_paginate_25_by_10() {
        let table = rows(&["rs1"; 25]);
        let matches = select(&table, "rs1");

        let (first, meta) = paginate(&matches, page(1, 10));
        assert_eq!(first.len(), 10);
        assert_eq!(meta.pages, 3);
        assert_eq!(meta.entries, 25);
        assert!(!meta.has_prev_page);
        assert!(meta.has_next_page);

        let (last, meta) = paginate(&matches, page(3, 10));
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].index, 20);
        assert!(meta.has_prev_page);
        assert!(!meta.has_next_page);

        let (beyond, meta) = paginate(&matches, page(7, 10));
        assert!(beyond.is_empty());
        assert_eq!(meta.displayed_page, 7);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_page_count_on_exact_multiple() {
        let table = rows(&["rs1"; 20]);
        let matches = select(&table, "rs1");

        let (_, meta) = paginate(&matches, page(2, 10));
        assert_eq!(meta.pages, 3);
        assert!(meta.has_next_page);
    }

    #[test]
    fn test_paginate_empty_matches() {
        let (window, meta) = paginate(&[], page(1, 10));
        assert!(window.is_empty());
        assert_eq!(meta.pages, 1);
        assert_eq!(meta.entries, 0);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let table = rows(&["rs1"; 3]);
        let matches = select(&table, "rs1");
        let (window, _) = paginate(&matches, page(usize::MAX, usize::MAX));
        assert!(window.is_empty());
    }
}
