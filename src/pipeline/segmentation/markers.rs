use std::sync::LazyLock;

use regex::Regex;

use super::types::PageRange;

/// Header phrases that open a new repair order. Case-insensitive.
static HEADER_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\brepair\s+order\b").unwrap(),
        Regex::new(r"(?i)\bR\.?\s?O\.?\s*#\s*\d+").unwrap(),
        Regex::new(r"(?i)\bservice\s+invoice\b").unwrap(),
        Regex::new(r"(?i)\bwork\s+order\b").unwrap(),
        Regex::new(r"(?i)\binvoice\s*#\s*\d+").unwrap(),
    ]
});

/// True if the page text carries any repair-order header marker.
pub fn has_header_marker(page_text: &str) -> bool {
    HEADER_MARKERS.iter().any(|re| re.is_match(page_text))
}

/// Partition pages into contiguous repair-order ranges.
///
/// Page 0 always opens the first range. A marker on page `i > 0` closes the
/// open range at `i - 1` and opens a new one at `i`; the last range closes
/// on the final page. The result is sorted, gap-free, non-overlapping and
/// covers every page exactly once. An empty input is treated as a single
/// blank page so there is always at least one range.
pub fn detect_segments<S: AsRef<str>>(page_texts: &[S]) -> Vec<PageRange> {
    let page_count = page_texts.len().max(1);

    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, text) in page_texts.iter().enumerate().skip(1) {
        if has_header_marker(text.as_ref()) {
            ranges.push(PageRange::new(start, i - 1));
            start = i;
        }
    }
    ranges.push(PageRange::new(start, page_count - 1));

    tracing::debug!(pages = page_count, segments = ranges.len(), "Detected segment boundaries");
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[PageRange], page_count: usize) {
        assert!(!ranges.is_empty());
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges.last().unwrap().end, page_count - 1);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start, "gap or overlap in {ranges:?}");
        }
        let covered: usize = ranges.iter().map(PageRange::len).sum();
        assert_eq!(covered, page_count);
    }

    #[test]
    fn marker_on_third_page_splits_in_two() {
        let pages = ["Customer copy", "continued", "REPAIR ORDER 5521", "Parts list"];
        let ranges = detect_segments(&pages);
        assert_eq!(ranges, vec![PageRange::new(0, 1), PageRange::new(2, 3)]);
    }

    #[test]
    fn no_markers_gives_single_segment() {
        let pages = ["a", "b", "c"];
        assert_eq!(detect_segments(&pages), vec![PageRange::new(0, 2)]);
    }

    #[test]
    fn marker_on_first_page_does_not_add_segment() {
        let pages = ["Repair Order 1", "page two"];
        assert_eq!(detect_segments(&pages), vec![PageRange::new(0, 1)]);
    }

    #[test]
    fn every_page_marked_gives_one_segment_per_page() {
        let pages = ["Work Order 1", "work order 2", "WORK ORDER 3"];
        let ranges = detect_segments(&pages);
        assert_eq!(
            ranges,
            vec![PageRange::new(0, 0), PageRange::new(1, 1), PageRange::new(2, 2)]
        );
    }

    #[test]
    fn empty_input_yields_one_range() {
        let pages: [&str; 0] = [];
        assert_eq!(detect_segments(&pages), vec![PageRange::new(0, 0)]);
    }

    #[test]
    fn recognizes_all_marker_forms() {
        assert!(has_header_marker("REPAIR ORDER"));
        assert!(has_header_marker("R.O. #10442"));
        assert!(has_header_marker("ro #7"));
        assert!(has_header_marker("Service Invoice"));
        assert!(has_header_marker("work   order"));
        assert!(has_header_marker("Invoice #88120"));
        assert!(has_header_marker("INVOICE# 3"));
    }

    #[test]
    fn ignores_near_misses() {
        assert!(!has_header_marker("Invoice total due"));
        assert!(!has_header_marker("repaired the order"));
        assert!(!has_header_marker("Micro #12"));
        assert!(!has_header_marker(""));
    }

    #[test]
    fn coverage_holds_for_mixed_layouts() {
        let layouts: Vec<Vec<&str>> = vec![
            vec!["x"],
            vec!["Repair Order", "x", "x", "Invoice #1", "Work Order", "x"],
            vec!["x", "Service Invoice", "x", "", "R.O. #5"],
            vec!["", "", "", ""],
            vec!["x", "work order", "work order", "work order"],
        ];
        for pages in layouts {
            let ranges = detect_segments(&pages);
            assert_covers(&ranges, pages.len());
        }
    }

    #[test]
    fn coverage_holds_for_every_marker_pattern_up_to_eight_pages() {
        for page_count in 1..=8usize {
            for mask in 0u32..(1 << page_count) {
                let pages: Vec<&str> = (0..page_count)
                    .map(|i| if mask & (1 << i) != 0 { "Repair Order" } else { "body" })
                    .collect();
                let ranges = detect_segments(&pages);
                assert_covers(&ranges, page_count);
                let expected = 1 + (1..page_count).filter(|i| mask & (1 << i) != 0).count();
                assert_eq!(ranges.len(), expected);
            }
        }
    }
}
