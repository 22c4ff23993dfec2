//! Article counts per section.

use crate::models::{Record, SectionCount};
use std::collections::HashMap;

/// Bucket for article records without a section.
pub const UNKNOWN_SECTION: &str = "unknown";

/// Count article records per section, most frequent first.
///
/// Ties keep the order in which the sections were first seen. Records with
/// a missing or blank section are counted under [`UNKNOWN_SECTION`].
pub fn top_sections(records: &[Record]) -> Vec<SectionCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sections: Vec<SectionCount> = Vec::new();

    for record in records.iter().filter(|r| r.is_article()) {
        let category = record
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_SECTION);

        match index.get(category) {
            Some(&i) => sections[i].count += 1,
            None => {
                index.insert(category, sections.len());
                sections.push(SectionCount {
                    category: category.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable: equal counts stay in first-seen order
    sections.sort_by(|a, b| b.count.cmp(&a.count));
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::record;

    fn rows(sections: &[SectionCount]) -> Vec<(&str, u64)> {
        sections.iter().map(|s| (s.category.as_str(), s.count)).collect()
    }

    #[test]
    fn test_ranked_by_count() {
        let records = vec![
            record("a", "article", "2018-01-01T00:00:00Z", Some("World")),
            record("b", "article", "2018-01-01T00:00:00Z", Some("World")),
            record("c", "article", "2018-01-01T00:00:00Z", Some("Politics")),
        ];
        assert_eq!(rows(&top_sections(&records)), vec![("World", 2), ("Politics", 1)]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            record("a", "article", "2018-01-01T00:00:00Z", Some("Sport")),
            record("b", "article", "2018-01-01T00:00:00Z", Some("Opinion")),
            record("c", "article", "2018-01-01T00:00:00Z", Some("World")),
            record("d", "article", "2018-01-01T00:00:00Z", Some("World")),
        ];
        assert_eq!(
            rows(&top_sections(&records)),
            vec![("World", 2), ("Sport", 1), ("Opinion", 1)]
        );
    }

    #[test]
    fn test_missing_section_goes_to_unknown_and_non_articles_skipped() {
        let records = vec![
            record("a", "article", "2018-01-01T00:00:00Z", None),
            record("b", "article", "2018-01-01T00:00:00Z", Some("  ")),
            record("c", "liveblog", "2018-01-01T00:00:00Z", Some("World")),
        ];
        assert_eq!(rows(&top_sections(&records)), vec![(UNKNOWN_SECTION, 2)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(top_sections(&[]).is_empty());
    }
}
