/// One slot in a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Zero-based page numbers to offer around `current`, with the first and last
/// page always reachable. Empty when there is nothing to paginate.
pub fn visible_pages(current: u32, total: u32) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }

    let current = current.min(total - 1);
    let start = current.saturating_sub(1);
    let end = (current + 1).min(total - 1);

    let mut items = Vec::with_capacity(7);
    if start > 0 {
        items.push(PageItem::Page(0));
        if start > 1 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total - 1 {
        if end < total - 2 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(total - 1));
    }
    items
}

pub fn prev_enabled(current: u32) -> bool {
    current > 0
}

pub fn next_enabled(current: u32, total: u32) -> bool {
    current.saturating_add(1) < total
}

#[cfg(test)]
mod tests {
    use super::PageItem::{Ellipsis, Page};
    use super::*;

    #[test]
    fn test_first_page_of_ten() {
        assert_eq!(visible_pages(0, 10), vec![Page(0), Page(1), Ellipsis, Page(9)]);
    }

    #[test]
    fn test_middle_page_of_ten() {
        assert_eq!(
            visible_pages(5, 10),
            vec![Page(0), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(9)]
        );
    }

    #[test]
    fn test_single_page_renders_nothing() {
        assert!(visible_pages(0, 1).is_empty());
        assert!(visible_pages(0, 0).is_empty());
    }

    #[test]
    fn test_no_ellipsis_next_to_edges() {
        assert_eq!(visible_pages(2, 5), vec![Page(0), Page(1), Page(2), Page(3), Page(4)]);
        assert_eq!(visible_pages(9, 10), vec![Page(0), Ellipsis, Page(8), Page(9)]);
        assert_eq!(visible_pages(1, 2), vec![Page(0), Page(1)]);
    }

    #[test]
    fn test_out_of_range_current_is_clamped() {
        assert_eq!(visible_pages(50, 3), vec![Page(0), Page(1), Page(2)]);
    }

    #[test]
    fn test_affordances() {
        assert!(!prev_enabled(0));
        assert!(prev_enabled(1));
        assert!(next_enabled(0, 2));
        assert!(!next_enabled(1, 2));
        assert!(!next_enabled(0, 0));
    }

    #[test]
    fn test_next_disabled_at_largest_index() {
        assert!(!next_enabled(u32::MAX, 3));
        assert!(!next_enabled(u32::MAX, u32::MAX));
    }
}
