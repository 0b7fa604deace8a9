/// Number of filtered items shown for `pages` pages of `page_size`.
pub fn displayed_len(filtered_len: usize, pages: usize, page_size: usize) -> usize {
    pages.saturating_mul(page_size).min(filtered_len)
}

/// True while the shown prefix is shorter than the filtered set.
pub fn has_more(filtered_len: usize, pages: usize, page_size: usize) -> bool {
    pages.saturating_mul(page_size) < filtered_len
}

/// The first `pages * page_size` items of `filtered`.
pub fn page_prefix<T>(filtered: &[T], pages: usize, page_size: usize) -> &[T] {
    &filtered[..displayed_len(filtered.len(), pages, page_size)]
}
