use serde::{Deserialize, Serialize};

/// Inclusive, zero-based page range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "page range start {start} after end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, page: usize) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "p{}", self.start + 1)
        } else {
            write!(f, "p{}-{}", self.start + 1, self.end + 1)
        }
    }
}

/// One repair-order candidate cut from an uploaded document.
#[derive(Debug, Clone)]
pub struct Segment {
    pub range: PageRange,
    /// Page texts of the range joined with newlines. May be empty.
    pub text: String,
    /// Standalone PDF holding exactly the pages of `range`.
    pub pdf_bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_is_inclusive() {
        assert_eq!(PageRange::new(0, 0).len(), 1);
        assert_eq!(PageRange::new(2, 5).len(), 4);
    }

    #[test]
    fn contains_both_ends() {
        let range = PageRange::new(2, 3);
        assert!(range.contains(2));
        assert!(range.contains(3));
        assert!(!range.contains(1));
        assert!(!range.contains(4));
    }

    #[test]
    fn display_is_one_based() {
        assert_eq!(PageRange::new(0, 0).to_string(), "p1");
        assert_eq!(PageRange::new(2, 3).to_string(), "p3-4");
    }
}
