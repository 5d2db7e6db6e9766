/// Number of pages needed for `total_count` rows.
pub fn page_count(total_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size)
}

/// The pagination footer only renders once there is more than one page.
pub fn shows_footer(total_count: usize, page_size: usize) -> bool {
    total_count > page_size
}
