use serde::{Deserialize, Serialize};

/// Pagination envelope used by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
  pub items: Vec<T>,
  pub total: u32,
  pub page: u32,
  pub page_size: u32,
  pub total_pages: u32,
  pub has_next: bool,
  pub has_previous: bool,
}

/// Slice a fully loaded list into the same envelope. Pages are 1-based;
/// out-of-range pages are clamped to the last one.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> Paged<T> {
  let page_size = page_size.max(1);
  let total = items.len() as u32;
  let total_pages = total.div_ceil(page_size).max(1);
  let page = page.clamp(1, total_pages);
  let start = ((page - 1) * page_size) as usize;
  let end = (start + page_size as usize).min(items.len());

  Paged {
    items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
    total,
    page,
    page_size,
    total_pages,
    has_next: page < total_pages,
    has_previous: page > 1,
  }
}
