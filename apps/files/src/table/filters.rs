use super::sort_filter::{FilterValue, TableFilter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterChoice {
    pub name: String,
    pub value: String,
}

impl FilterChoice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A table column. Only columns with choices take part in choice filtering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterColumn {
    pub id: String,
    pub filter_choices: Vec<FilterChoice>,
}

impl FilterColumn {
    pub fn is_filterable(&self) -> bool {
        !self.filter_choices.is_empty()
    }
}

/// A flattened entry of the sort-and-filter modal's checkbox state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckedFilter {
    Choice(String),
    Text { column: String, value: String },
}

pub fn filter_options(columns: &[FilterColumn]) -> Vec<FilterChoice> {
    columns
        .iter()
        .filter(|column| column.is_filterable())
        .flat_map(|column| column.filter_choices.iter().cloned())
        .collect()
}

pub fn checked_filters(filters: &[TableFilter]) -> Vec<CheckedFilter> {
    let mut checked = Vec::new();
    for filter in filters {
        match &filter.value {
            FilterValue::Choices(values) => {
                checked.extend(values.iter().cloned().map(CheckedFilter::Choice));
            }
            FilterValue::Text(value) => checked.push(CheckedFilter::Text {
                column: filter.id.clone(),
                value: value.clone(),
            }),
        }
    }
    checked
}

/// Rebuilds table filter state from the modal's checked entries.
///
/// At most one text filter survives (the first). Each filterable column
/// gets the checked subset of its choices, in the column's own order.
pub fn process_filters(checked: &[CheckedFilter], columns: &[FilterColumn]) -> Vec<TableFilter> {
    let mut filters = Vec::new();

    let text = checked.iter().find_map(|entry| match entry {
        CheckedFilter::Text { column, value } => Some((column, value)),
        CheckedFilter::Choice(_) => None,
    });
    if let Some((column, value)) = text {
        filters.push(TableFilter::text(column.clone(), value.clone()));
    }

    for column in columns.iter().filter(|column| column.is_filterable()) {
        let matching: Vec<String> = column
            .filter_choices
            .iter()
            .filter(|choice| {
                checked
                    .iter()
                    .any(|entry| matches!(entry, CheckedFilter::Choice(value) if *value == choice.value))
            })
            .map(|choice| choice.value.clone())
            .collect();

        if !matching.is_empty() {
            filters.push(TableFilter::choices(column.id.clone(), matching));
        }
    }

    filters
}
