//! Translation between table sort/filter state and the asset list query.
//!
//! Every function here is pure. Values outside the known vocabulary are
//! passed through unchanged so newer server options keep working.

use std::fmt;

use serde::Serialize;

pub const DEFAULT_SORT_KEY: &str = "dateAdded,desc";
/// Column whose text filter drives `text_search`.
pub const TEXT_FILTER_COLUMN: &str = "displayName";
/// Column whose choices drive `asset_type`.
pub const TYPE_FILTER_COLUMN: &str = "wrapperType";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SortField {
    DateAdded,
    DisplayName,
    FileType,
    FileSize,
    LockStatus,
    UsageCount,
    ActiveStatus,
    Other(String),
}

impl SortField {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "dateAdded" => Self::DateAdded,
            "displayName" => Self::DisplayName,
            "fileType" => Self::FileType,
            "fileSize" => Self::FileSize,
            "lockStatus" => Self::LockStatus,
            "usageCount" => Self::UsageCount,
            "activeStatus" => Self::ActiveStatus,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DateAdded => "dateAdded",
            Self::DisplayName => "displayName",
            Self::FileType => "fileType",
            Self::FileSize => "fileSize",
            Self::LockStatus => "lockStatus",
            Self::UsageCount => "usageCount",
            Self::ActiveStatus => "activeStatus",
            Self::Other(value) => value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Anything but `desc` sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn is_desc(self) -> bool {
        matches!(self, Self::Desc)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn parse(key: &str) -> Self {
        let mut parts = key.splitn(2, ',');
        let field = SortField::parse(parts.next().unwrap_or_default());
        let direction = SortDirection::parse(parts.next());
        Self { field, direction }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::parse(DEFAULT_SORT_KEY)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field.as_str(), self.direction.as_str())
    }
}

/// One entry of the table's `sortBy` state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortBy {
    pub id: String,
    pub desc: bool,
}

/// `"dateAdded,desc"` becomes `("dateAdded", "desc")`.
pub fn sort_api_params(sort_key: &str) -> (String, String) {
    let key = SortKey::parse(sort_key);
    (
        key.field.as_str().to_string(),
        key.direction.as_str().to_string(),
    )
}

pub fn set_sort_state(sort_key: &str) -> Vec<SortBy> {
    let key = SortKey::parse(sort_key);
    vec![SortBy {
        id: key.field.as_str().to_string(),
        desc: key.direction.is_desc(),
    }]
}

pub fn get_sort_state(sort_by: &[SortBy]) -> String {
    match sort_by.first() {
        None => DEFAULT_SORT_KEY.to_string(),
        Some(SortBy { id, desc }) => {
            let direction = if *desc { "desc" } else { "asc" };
            format!("{id},{direction}")
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Choices(Vec<String>),
}

/// One entry of the table's `filters` state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableFilter {
    pub id: String,
    pub value: FilterValue,
}

impl TableFilter {
    pub fn text(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: FilterValue::Text(value.into()),
        }
    }

    pub fn choices<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            value: FilterValue::Choices(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// Typed query parameters derived from the table filters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterParams {
    pub asset_types: Vec<String>,
    pub text_search: Option<String>,
}

impl FilterParams {
    pub fn asset_type_param(&self) -> Option<String> {
        if self.asset_types.is_empty() {
            None
        } else {
            Some(self.asset_types.join(","))
        }
    }
}

pub fn asset_type_to_api(value: &str) -> String {
    match value {
        "image" => "Images".to_string(),
        "document" => "Documents".to_string(),
        "code" => "Code".to_string(),
        "audio" => "Audio".to_string(),
        "other" => "OTHER".to_string(),
        other => other.to_string(),
    }
}

pub fn asset_type_from_api(value: &str) -> String {
    match value {
        "Images" => "image".to_string(),
        "Documents" => "document".to_string(),
        "Code" => "code".to_string(),
        "Audio" => "audio".to_string(),
        "OTHER" => "other".to_string(),
        other => other.to_string(),
    }
}

pub fn filter_api_params(filters: &[TableFilter]) -> FilterParams {
    let mut params = FilterParams::default();
    for filter in filters {
        match &filter.value {
            FilterValue::Text(text) => {
                let trimmed = text.trim();
                if params.text_search.is_none() && !trimmed.is_empty() {
                    params.text_search = Some(trimmed.to_string());
                }
            }
            FilterValue::Choices(values) => {
                for value in values {
                    let mapped = asset_type_to_api(value);
                    if !params.asset_types.contains(&mapped) {
                        params.asset_types.push(mapped);
                    }
                }
            }
        }
    }
    params
}

/// Rebuilds table filters from query parameters.
pub fn filters_from_api(params: &FilterParams) -> Vec<TableFilter> {
    let mut filters = Vec::new();
    if let Some(text) = params.text_search.as_deref() {
        filters.push(TableFilter::text(TEXT_FILTER_COLUMN, text));
    }
    if !params.asset_types.is_empty() {
        filters.push(TableFilter::choices(
            TYPE_FILTER_COLUMN,
            params.asset_types.iter().map(|value| asset_type_from_api(value)),
        ));
    }
    filters
}

/// The `(filters, sort)` pair a view was fetched under.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewQuery {
    pub sort: SortKey,
    pub filters: FilterParams,
}

impl ViewQuery {
    pub fn new(sort_key: &str, filters: &[TableFilter]) -> Self {
        Self {
            sort: SortKey::parse(sort_key),
            filters: filter_api_params(filters),
        }
    }

    pub fn to_api(&self, page: usize, page_size: usize) -> AssetQuery {
        AssetQuery {
            page,
            page_size,
            sort: self.sort.field.as_str().to_string(),
            direction: self.sort.direction.as_str().to_string(),
            asset_type: self.filters.asset_type_param(),
            text_search: self.filters.text_search.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssetQuery {
    pub page: usize,
    pub page_size: usize,
    pub sort: String,
    pub direction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_added_desc_round_trips() {
        assert_eq!(
            sort_api_params("dateAdded,desc"),
            ("dateAdded".to_string(), "desc".to_string())
        );
        let state = set_sort_state("dateAdded,desc");
        assert_eq!(
            state,
            vec![SortBy {
                id: "dateAdded".into(),
                desc: true
            }]
        );
        assert_eq!(get_sort_state(&state), "dateAdded,desc");
    }

    #[test]
    fn every_known_key_round_trips() {
        for field in [
            "dateAdded",
            "displayName",
            "fileType",
            "fileSize",
            "lockStatus",
            "usageCount",
            "activeStatus",
            "transcriptStatus",
        ] {
            for direction in ["asc", "desc"] {
                let key = format!("{field},{direction}");
                assert_eq!(get_sort_state(&set_sort_state(&key)), key);
                assert_eq!(SortKey::parse(&key).to_string(), key);
            }
        }
    }

    #[test]
    fn empty_sort_state_falls_back_to_default() {
        assert_eq!(get_sort_state(&[]), DEFAULT_SORT_KEY);
        assert_eq!(SortKey::default().direction, SortDirection::Desc);
    }

    #[test]
    fn missing_or_unknown_direction_is_ascending() {
        assert_eq!(SortKey::parse("displayName").direction, SortDirection::Asc);
        assert_eq!(
            SortKey::parse("displayName,sideways").direction,
            SortDirection::Asc
        );
    }

    #[test]
    fn unknown_sort_field_passes_through() {
        assert_eq!(
            sort_api_params("duration,asc"),
            ("duration".to_string(), "asc".to_string())
        );
    }

    #[test]
    fn filters_map_to_typed_params() {
        let filters = vec![
            TableFilter::text(TEXT_FILTER_COLUMN, "  syllabus "),
            TableFilter::choices(TYPE_FILTER_COLUMN, ["image", "document", "image", "slides"]),
        ];
        let params = filter_api_params(&filters);
        assert_eq!(params.text_search.as_deref(), Some("syllabus"));
        assert_eq!(params.asset_types, vec!["Images", "Documents", "slides"]);
        assert_eq!(
            params.asset_type_param().as_deref(),
            Some("Images,Documents,slides")
        );
    }

    #[test]
    fn blank_text_filter_is_ignored() {
        let params = filter_api_params(&[TableFilter::text(TEXT_FILTER_COLUMN, "   ")]);
        assert_eq!(params, FilterParams::default());
    }

    #[test]
    fn params_map_back_to_table_filters() {
        let filters = vec![
            TableFilter::text(TEXT_FILTER_COLUMN, "lab"),
            TableFilter::choices(TYPE_FILTER_COLUMN, ["code", "audio", "3d-model"]),
        ];
        assert_eq!(filters_from_api(&filter_api_params(&filters)), filters);
    }

    #[test]
    fn view_query_builds_remote_query() {
        let query = ViewQuery::new(
            "displayName,asc",
            &[TableFilter::choices(TYPE_FILTER_COLUMN, ["audio"])],
        )
        .to_api(2, 50);
        assert_eq!(
            query,
            AssetQuery {
                page: 2,
                page_size: 50,
                sort: "displayName".into(),
                direction: "asc".into(),
                asset_type: Some("Audio".into()),
                text_search: None,
            }
        );
    }

    #[test]
    fn equivalent_selections_share_a_view_query() {
        let a = ViewQuery::new(
            "dateAdded,desc",
            &[TableFilter::choices(TYPE_FILTER_COLUMN, ["image"])],
        );
        let b = ViewQuery::new(
            "dateAdded,desc",
            &[TableFilter::choices("fileType", ["image", "image"])],
        );
        assert_eq!(a, b);
    }
}
