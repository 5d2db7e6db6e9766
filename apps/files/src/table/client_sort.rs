use std::cmp::Ordering;

use time::OffsetDateTime;

use super::sort_filter::{SortBy, SortField};
use crate::models::AssetRecord;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Missing,
    Flag(bool),
    Number(u64),
    Date(OffsetDateTime),
    Text(String),
}

fn sort_value(record: &AssetRecord, field: &SortField) -> SortValue {
    match field {
        SortField::DisplayName => SortValue::Text(record.display_name.to_lowercase()),
        SortField::FileType => SortValue::Text(record.file_type.to_lowercase()),
        SortField::ActiveStatus => record
            .active_status
            .map(|status| SortValue::Text(status.as_str().to_string()))
            .unwrap_or(SortValue::Missing),
        SortField::DateAdded => record
            .date_added
            .map(SortValue::Date)
            .unwrap_or(SortValue::Missing),
        SortField::FileSize => record
            .file_size
            .map(SortValue::Number)
            .unwrap_or(SortValue::Missing),
        SortField::UsageCount => record
            .usage_count()
            .map(|count| SortValue::Number(count as u64))
            .unwrap_or(SortValue::Missing),
        SortField::LockStatus => SortValue::Flag(record.lock_status),
        SortField::Other(_) => SortValue::Missing,
    }
}

/// Sorts a fully-loaded collection and returns the ordered ids.
///
/// Text fields compare case-insensitively. Ties keep their input order in
/// both directions.
pub fn sort_files(files: &[AssetRecord], sort: &SortBy) -> Vec<String> {
    let field = SortField::parse(&sort.id);
    let mut keyed: Vec<(SortValue, &str)> = files
        .iter()
        .map(|record| (sort_value(record, &field), record.id.as_str()))
        .collect();

    keyed.sort_by(|left, right| {
        let ordering: Ordering = left.0.cmp(&right.0);
        if sort.desc {
            ordering.reverse()
        } else {
            ordering
        }
    });

    keyed.into_iter().map(|(_, id)| id.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(id: &str, name: &str) -> AssetRecord {
        AssetRecord::new(id, name)
    }

    fn by(id: &str, desc: bool) -> SortBy {
        SortBy {
            id: id.into(),
            desc,
        }
    }

    #[test]
    fn display_name_ignores_case() {
        let files = vec![record("1", "beta"), record("2", "Alpha"), record("3", "gamma")];
        assert_eq!(sort_files(&files, &by("displayName", false)), ["2", "1", "3"]);
        assert_eq!(sort_files(&files, &by("displayName", true)), ["3", "1", "2"]);
    }

    #[test]
    fn ties_keep_original_order_in_both_directions() {
        let mut files = vec![
            record("a", "Same"),
            record("b", "other"),
            record("c", "same"),
            record("d", "SAME"),
        ];
        files[1].file_type = "image".into();
        for file in files.iter_mut().filter(|f| f.id != "b") {
            file.file_type = "document".into();
        }

        assert_eq!(
            sort_files(&files, &by("displayName", false)),
            ["b", "a", "c", "d"]
        );
        assert_eq!(
            sort_files(&files, &by("displayName", true)),
            ["a", "c", "d", "b"]
        );
        assert_eq!(sort_files(&files, &by("fileType", true)), ["b", "a", "c", "d"]);
    }

    #[test]
    fn dates_sort_naturally_with_missing_first() {
        let mut files = vec![record("new", "n"), record("none", "x"), record("old", "o")];
        files[0].date_added = Some(datetime!(2024-05-01 12:00 UTC));
        files[2].date_added = Some(datetime!(2021-01-01 08:00 UTC));

        assert_eq!(
            sort_files(&files, &by("dateAdded", false)),
            ["none", "old", "new"]
        );
        assert_eq!(
            sort_files(&files, &by("dateAdded", true)),
            ["new", "old", "none"]
        );
    }

    #[test]
    fn lock_status_sorts_unlocked_first() {
        let mut files = vec![record("l", "l"), record("u", "u")];
        files[0].lock_status = true;
        assert_eq!(sort_files(&files, &by("lockStatus", false)), ["u", "l"]);
    }

    #[test]
    fn unknown_field_keeps_order() {
        let files = vec![record("3", "c"), record("1", "a"), record("2", "b")];
        assert_eq!(sort_files(&files, &by("transcripts", true)), ["3", "1", "2"]);
    }
}
