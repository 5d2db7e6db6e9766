pub mod client_sort;
pub mod conflicts;
pub mod filters;
pub mod pagination;
pub mod sort_filter;

pub use client_sort::sort_files;
pub use conflicts::{partition_uploads, ConflictSet, UploadPartition};
pub use filters::{checked_filters, filter_options, process_filters, CheckedFilter, FilterChoice, FilterColumn};
pub use sort_filter::{
    filter_api_params, get_sort_state, set_sort_state, sort_api_params, AssetQuery, SortBy,
    SortKey, TableFilter, ViewQuery, DEFAULT_SORT_KEY,
};
