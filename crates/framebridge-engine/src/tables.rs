//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Result table builders for metric and object listing queries

use chrono::DateTime;
use framebridge_core::types::{Column, DisplayHints, Table, TableMeta, TypedValue, ValueKind};
use framebridge_core::BridgeResult;

use crate::sources::{MetricMetadata, ObjectListing, Series};

/// Name given to every result table
pub const RESPONSE_TABLE: &str = "response";

/// Delimiter used to group object keys into folders
pub const KEY_DELIMITER: &str = "/";

pub const TIME_FORMAT_UNIT: &str = "time:YYYY-MM-DD HH:mm:ss";

/// One `name` column listing every metric
pub fn metric_names_table(metrics: &[MetricMetadata]) -> BridgeResult<Table> {
    let mut names = Column::empty("name", ValueKind::String);
    for metric in metrics {
        names.push(TypedValue::from(metric.name.as_str()));
    }
    Table::from_columns(RESPONSE_TABLE, vec![names])
}

/// `time`/`value`/`series` rows, series after series in backend order.
/// `alias` replaces the series identifier as label.
pub fn datapoints_table(series: &[Series], alias: Option<&str>) -> BridgeResult<Table> {
    let mut time = Column::empty("time", ValueKind::Timestamp);
    let mut value = Column::empty("value", ValueKind::Float64);
    let mut label = Column::empty("series", ValueKind::String);

    let alias = alias.map(str::trim).filter(|a| !a.is_empty());
    for s in series {
        let name = alias.unwrap_or(s.id.as_str());
        for point in &s.points {
            time.push(DateTime::from_timestamp_millis(point.timestamp_ms).into());
            value.push(point.value.into());
            label.push(TypedValue::from(name));
        }
    }

    Table::from_columns(RESPONSE_TABLE, vec![time, value, label])
}

/// Folders first, then files, one row each.
///
/// Formatted mode annotates each name as `<name>,type=<folder|file>,key=<key>`
/// and adds an empty `Delete` column. Folder names are collected into
/// `meta.folders`.
pub fn object_listing_table(listing: &ObjectListing, formatted: bool) -> BridgeResult<Table> {
    let mut name = Column::empty("Name", ValueKind::String);
    let mut modified = Column::empty("Last Modified", ValueKind::Timestamp).with_hints(
        DisplayHints::new()
            .with_width(200)
            .with_unit(TIME_FORMAT_UNIT),
    );
    let mut size = Column::empty("Size", ValueKind::Int64).with_hints(
        DisplayHints::new()
            .with_width(100)
            .with_align("left")
            .with_unit("bytes"),
    );

    let mut folders = Vec::with_capacity(listing.common_prefixes.len());
    for prefix in &listing.common_prefixes {
        let folder = folder_name(prefix);
        name.push(display_name(folder, "folder", prefix, formatted).into());
        modified.push(TypedValue::Null);
        size.push(TypedValue::Null);
        folders.push(folder.to_string());
    }

    for object in &listing.objects {
        let file = file_name(&object.key);
        name.push(display_name(file, "file", &object.key, formatted).into());
        modified.push(object.last_modified.into());
        size.push(object.size.into());
    }

    let rows = name.len();
    let mut columns = vec![name, modified, size];
    if formatted {
        let mut delete = Column::empty("Delete", ValueKind::String)
            .with_hints(DisplayHints::new().with_width(100));
        for _ in 0..rows {
            delete.push(TypedValue::from(""));
        }
        columns.push(delete);
    }

    let mut meta = TableMeta {
        folders,
        ..Default::default()
    };
    if listing.is_truncated {
        meta.custom
            .insert("truncated".to_string(), serde_json::Value::Bool(true));
    }
    Ok(Table::from_columns(RESPONSE_TABLE, columns)?.with_meta(meta))
}

/// Last non-trailing segment of a folder prefix: `a/b/` is `b`
fn folder_name(prefix: &str) -> &str {
    let parts: Vec<&str> = prefix.split(KEY_DELIMITER).collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        prefix
    }
}

/// Last segment of an object key: `a/file.txt` is `file.txt`
fn file_name(key: &str) -> &str {
    key.rsplit_once(KEY_DELIMITER)
        .map(|(_, name)| name)
        .unwrap_or(key)
}

fn display_name(name: &str, kind: &str, key: &str, formatted: bool) -> String {
    if formatted {
        format!("{},type={},key={}", name, kind, key)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ObjectEntry, SeriesPoint};
    use chrono::{TimeZone, Utc};

    fn listing() -> ObjectListing {
        ObjectListing {
            common_prefixes: vec!["a/b/".to_string()],
            objects: vec![ObjectEntry {
                key: "a/file.txt".to_string(),
                last_modified: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()),
                size: Some(2048),
            }],
            is_truncated: false,
        }
    }

    #[test]
    fn test_segment_names() {
        assert_eq!(folder_name("a/b/"), "b");
        assert_eq!(folder_name("top/"), "top");
        assert_eq!(folder_name("plain"), "plain");
        assert_eq!(file_name("a/file.txt"), "file.txt");
        assert_eq!(file_name("root.txt"), "root.txt");
    }

    #[test]
    fn test_unformatted_listing() {
        let table = object_listing_table(&listing(), false).unwrap();
        assert_eq!(table.column_names(), vec!["Name", "Last Modified", "Size"]);
        assert_eq!(table.row_count(), 2);

        let name = table.column("Name").unwrap();
        assert_eq!(name.get(0), Some(TypedValue::from("b")));
        assert_eq!(name.get(1), Some(TypedValue::from("file.txt")));

        let modified = table.column("Last Modified").unwrap();
        assert_eq!(modified.get(0), Some(TypedValue::Null));
        assert_eq!(
            modified.hints.as_ref().and_then(|h| h.unit.as_deref()),
            Some(TIME_FORMAT_UNIT)
        );

        let size = table.column("Size").unwrap();
        assert_eq!(size.get(0), Some(TypedValue::Null));
        assert_eq!(size.get(1), Some(TypedValue::Int64(2048)));
        let hints = size.hints.as_ref().unwrap();
        assert_eq!(hints.width, Some(100));
        assert_eq!(hints.align.as_deref(), Some("left"));
        assert_eq!(hints.unit.as_deref(), Some("bytes"));

        assert_eq!(table.meta.folders, vec!["b"]);
    }

    #[test]
    fn test_formatted_listing() {
        let table = object_listing_table(&listing(), true).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["Name", "Last Modified", "Size", "Delete"]
        );

        let name = table.column("Name").unwrap();
        assert_eq!(name.get(0), Some(TypedValue::from("b,type=folder,key=a/b/")));
        assert_eq!(
            name.get(1),
            Some(TypedValue::from("file.txt,type=file,key=a/file.txt"))
        );

        let delete = table.column("Delete").unwrap();
        assert_eq!(delete.len(), 2);
        assert_eq!(delete.get(1), Some(TypedValue::from("")));
    }

    #[test]
    fn test_truncated_listing_is_flagged() {
        let mut listing = listing();
        listing.is_truncated = true;
        let table = object_listing_table(&listing, false).unwrap();
        assert_eq!(table.meta.custom["truncated"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_metric_names_table() {
        let table = metric_names_table(&[
            MetricMetadata::new("cpu.utilization"),
            MetricMetadata::new("memory.free"),
        ])
        .unwrap();
        assert_eq!(table.column_names(), vec!["name"]);
        assert_eq!(
            table.column("name").unwrap().get(1),
            Some(TypedValue::from("memory.free"))
        );
    }

    #[test]
    fn test_datapoints_table_with_alias() {
        let series = vec![
            Series {
                id: "AAA".to_string(),
                points: vec![SeriesPoint::new(1_000, Some(1.5)), SeriesPoint::new(2_000, None)],
            },
            Series {
                id: "BBB".to_string(),
                points: vec![SeriesPoint::new(1_000, Some(7.0))],
            },
        ];

        let table = datapoints_table(&series, None).unwrap();
        assert_eq!(table.column_names(), vec!["time", "value", "series"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("value").unwrap().get(1), Some(TypedValue::Null));
        assert_eq!(
            table.column("series").unwrap().get(2),
            Some(TypedValue::from("BBB"))
        );
        assert_eq!(
            table.column("time").unwrap().get(0),
            Some(TypedValue::Timestamp(Utc.timestamp_millis_opt(1_000).unwrap()))
        );

        let aliased = datapoints_table(&series, Some("cpu")).unwrap();
        assert_eq!(
            aliased.column("series").unwrap().get(2),
            Some(TypedValue::from("cpu"))
        );
    }
}
