//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Column materialization
//!
//! Turns backend rows into typed columns. Each column's buffer kind comes
//! from its declared type and every cell goes through the coercer, so values
//! and buffers always pair up.

use framebridge_core::types::{Column, ColumnValues, DeclaredType, Table};
use framebridge_core::BridgeResult;
use tracing::debug;

use crate::coercion::{coerce, NativeValue};
use crate::sources::RowSet;

/// Empty buffer matching a declared column type
pub fn new_column_buffer(declared: &DeclaredType) -> ColumnValues {
    new_column_buffer_with_capacity(declared, 0)
}

pub fn new_column_buffer_with_capacity(declared: &DeclaredType, capacity: usize) -> ColumnValues {
    ColumnValues::with_capacity(declared.value_kind(), capacity)
}

/// Build one column by coercing every cell against its declared type
pub fn materialize_column<'a>(
    name: impl Into<String>,
    declared: &DeclaredType,
    cells: impl IntoIterator<Item = &'a NativeValue>,
) -> Column {
    let mut values = new_column_buffer(declared);
    for cell in cells {
        values.push(coerce(cell, declared));
    }
    Column::new(name, values)
}

/// Build a table with one column per result column, rows in backend order.
/// Short rows are padded with nulls.
pub fn materialize_row_set(table_name: &str, rows: &RowSet) -> BridgeResult<Table> {
    let declared: Vec<DeclaredType> = rows.columns.iter().map(|c| c.declared()).collect();
    let null = NativeValue::Null;

    let mut columns = Vec::with_capacity(rows.columns.len());
    for (index, (column_spec, declared)) in rows.columns.iter().zip(&declared).enumerate() {
        let cells = rows.rows.iter().map(|row| row.get(index).unwrap_or(&null));
        columns.push(materialize_column(column_spec.name.clone(), declared, cells));
    }

    debug!(
        "Materialized {} rows into {} columns",
        rows.row_count(),
        columns.len()
    );
    Table::from_columns(table_name, columns)
}
