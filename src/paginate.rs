use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 100;
const WINDOW_SIZE: usize = 5;

/// Page buttons to show around the current page.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
  pub pages: Vec<usize>,
  pub show_first: bool,
  pub leading_ellipsis: bool,
  pub show_last: bool,
  pub trailing_ellipsis: bool,
  pub has_prev: bool,
  pub has_next: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
  pub items: &'a [T],
  pub page: usize,
  pub total_items: usize,
  pub total_pages: usize,
  pub window: PageWindow,
}

impl<T> Page<'_, T> {
  /// Pagination controls are only worth showing past a single page.
  pub fn controls_visible(&self) -> bool {
    self.total_pages > 1
  }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
  if page_size == 0 {
    return 0;
  }
  total_items.div_ceil(page_size)
}

/// Slices out 1-based `page`. Pages outside `1..=total_pages` are empty.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
  let total_pages = total_pages(items.len(), page_size);
  let slice = if page == 0 || page > total_pages {
    &items[0..0]
  } else {
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    &items[start..end]
  };

  Page {
    items: slice,
    page,
    total_items: items.len(),
    total_pages,
    window: page_window(page, total_pages),
  }
}

pub fn page_window(current: usize, total_pages: usize) -> PageWindow {
  if total_pages == 0 {
    return PageWindow::default();
  }
  let current = current.clamp(1, total_pages);
  let half = WINDOW_SIZE / 2;
  let mut start = current.saturating_sub(half).max(1);
  let end = (start + WINDOW_SIZE - 1).min(total_pages);
  start = end.saturating_sub(WINDOW_SIZE - 1).max(1);

  PageWindow {
    pages: (start..=end).collect(),
    show_first: start > 1,
    leading_ellipsis: start > 2,
    show_last: end < total_pages,
    trailing_ellipsis: end + 1 < total_pages,
    has_prev: current > 1,
    has_next: current < total_pages,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn two_hundred_fifty_items_make_three_pages() {
    let items: Vec<u32> = (0..250).collect();
    assert_eq!(paginate(&items, 100, 1).items.len(), 100);
    assert_eq!(paginate(&items, 100, 2).items.len(), 100);

    let last = paginate(&items, 100, 3);
    assert_eq!(last.total_pages, 3);
    assert_eq!(last.items, &items[200..]);

    assert!(paginate(&items, 100, 4).items.is_empty());
    assert!(paginate(&items, 100, 0).items.is_empty());
  }

  #[test]
  fn pages_cover_every_item_once() {
    let items: Vec<u32> = (0..1234).collect();
    let page_count = total_pages(items.len(), 100);
    let joined: Vec<u32> = (1..=page_count)
      .flat_map(|page| paginate(&items, 100, page).items.to_vec())
      .collect();
    assert_eq!(joined, items);
  }

  #[test]
  fn controls_hidden_for_single_or_empty_result() {
    let empty: Vec<u32> = Vec::new();
    let page = paginate(&empty, 100, 1);
    assert_eq!(page.total_pages, 0);
    assert!(!page.controls_visible());
    assert_eq!(page.window, PageWindow::default());

    let one: Vec<u32> = (0..100).collect();
    assert!(!paginate(&one, 100, 1).controls_visible());
    let two: Vec<u32> = (0..101).collect();
    assert!(paginate(&two, 100, 1).controls_visible());
  }

  #[test]
  fn window_is_centred_and_clamped() {
    let start = page_window(1, 10);
    assert_eq!(start.pages, vec![1, 2, 3, 4, 5]);
    assert!(!start.show_first && !start.leading_ellipsis);
    assert!(start.show_last && start.trailing_ellipsis);
    assert!(!start.has_prev && start.has_next);

    let middle = page_window(6, 10);
    assert_eq!(middle.pages, vec![4, 5, 6, 7, 8]);
    assert!(middle.show_first && middle.leading_ellipsis);
    assert!(middle.show_last && middle.trailing_ellipsis);

    let end = page_window(10, 10);
    assert_eq!(end.pages, vec![6, 7, 8, 9, 10]);
    assert!(end.show_first && !end.show_last);
    assert!(!end.has_next);
  }

  #[test]
  fn adjacent_edges_skip_the_ellipsis() {
    let window = page_window(4, 7);
    assert_eq!(window.pages, vec![2, 3, 4, 5, 6]);
    assert!(window.show_first && !window.leading_ellipsis);
    assert!(window.show_last && !window.trailing_ellipsis);
  }

  #[test]
  fn short_ranges_show_every_page() {
    assert_eq!(page_window(2, 3).pages, vec![1, 2, 3]);
    assert_eq!(page_window(9, 3).pages, vec![1, 2, 3]);
  }
}
