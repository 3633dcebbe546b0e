//! Shaping raw result tables into frames.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::error::{FormatError, ShapeResult};
use super::frame::{Field, FieldValues, Frame, Label, Notice, RawColumn, RawTable, ShapedResult};
use crate::catalog::PropertyType;
use crate::query::ResultFormat;

/// Column every `make-series` result must carry.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Shape every result set.
///
/// The first set that does not fit `format` fails the whole call.
pub fn shape(tables: &[RawTable], format: ResultFormat) -> ShapeResult<ShapedResult> {
    let mut frames = Vec::new();
    for table in tables {
        frames.extend(shape_table(table, format)?);
    }
    Ok(ShapedResult { format, frames })
}

/// Shape a single result set into its frames.
pub fn shape_table(table: &RawTable, format: ResultFormat) -> ShapeResult<Vec<Frame>> {
    check_lengths(table)?;
    match format {
        ResultFormat::Table => table_frame(table).map(|frame| vec![frame]),
        ResultFormat::TimeSeries => time_series(table),
        ResultFormat::AdxTimeSeries => adx_time_series(table),
    }
}

/// Series name: the value column, suffixed with its labels when present.
pub fn series_name(value_column: &str, labels: &[Label]) -> String {
    if labels.is_empty() {
        return value_column.to_string();
    }
    let tags: Vec<String> = labels
        .iter()
        .map(|l| format!("{}={}", l.name, l.value))
        .collect();
    format!("{} {{ {} }}", value_column, tags.join(", "))
}

/// Whether the non-null times never go backwards.
pub fn is_non_decreasing(times: &[Option<DateTime<Utc>>]) -> bool {
    let mut present = times.iter().flatten();
    let Some(mut previous) = present.next() else {
        return true;
    };
    for time in present {
        if time < previous {
            return false;
        }
        previous = time;
    }
    true
}

// ============================================================================
// table
// ============================================================================

fn table_frame(table: &RawTable) -> ShapeResult<Frame> {
    let fields = table
        .columns
        .iter()
        .map(|column| Ok(Field::new(&column.name, typed_values(column)?)))
        .collect::<ShapeResult<Vec<_>>>()?;

    let mut notices = Vec::new();
    let times: Vec<&Field> = fields
        .iter()
        .filter(|f| matches!(f.values, FieldValues::Time(_)))
        .collect();
    if let [field] = times.as_slice() {
        if let FieldValues::Time(values) = &field.values {
            notice_if_unsorted(&mut notices, &field.name, values);
        }
    }

    Ok(Frame {
        name: table.name.clone(),
        fields,
        notices,
    })
}

fn typed_values(column: &RawColumn) -> ShapeResult<FieldValues> {
    let values = &column.values;
    let typed = match column.kind() {
        PropertyType::DateTime => FieldValues::Time(
            values
                .iter()
                .enumerate()
                .map(|(row, v)| parse_time(column, row, v))
                .collect::<ShapeResult<_>>()?,
        ),
        PropertyType::Number => FieldValues::Number(
            values
                .iter()
                .enumerate()
                .map(|(row, v)| parse_number(column, row, v))
                .collect::<ShapeResult<_>>()?,
        ),
        PropertyType::Boolean => FieldValues::Boolean(values.iter().map(Value::as_bool).collect()),
        _ => FieldValues::String(values.iter().map(display_value).collect()),
    };
    Ok(typed)
}

// ============================================================================
// time_series
// ============================================================================

fn time_series(table: &RawTable) -> ShapeResult<Vec<Frame>> {
    let time_columns: Vec<&RawColumn> = table
        .columns
        .iter()
        .filter(|c| c.kind() == PropertyType::DateTime)
        .collect();
    let time_column = match time_columns.as_slice() {
        [] => return Err(FormatError::NoTimeColumn),
        [column] => *column,
        many => {
            return Err(FormatError::MultipleTimeColumns(
                many.iter().map(|c| c.name.clone()).collect(),
            ))
        }
    };

    let value_columns: Vec<&RawColumn> = table
        .columns
        .iter()
        .filter(|c| c.kind() == PropertyType::Number)
        .collect();
    if value_columns.is_empty() {
        return Err(FormatError::NoValueColumn);
    }

    let label_columns: Vec<&RawColumn> = table
        .columns
        .iter()
        .filter(|c| c.kind() == PropertyType::String && !c.is_dynamic())
        .collect();

    let times = parse_times(time_column, &time_column.values)?;
    let numbers = value_columns
        .iter()
        .map(|c| parse_numbers(c, &c.values))
        .collect::<ShapeResult<Vec<_>>>()?;

    // Rows grouped by label combination, in first-appearance order.
    let mut groups: Vec<(Vec<Label>, Vec<usize>)> = Vec::new();
    let mut index: HashMap<Vec<Label>, usize> = HashMap::new();
    for row in 0..table.row_count() {
        let labels: Vec<Label> = label_columns
            .iter()
            .map(|c| Label {
                name: c.name.clone(),
                value: c.values.get(row).and_then(display_value).unwrap_or_default(),
            })
            .collect();
        match index.get(&labels) {
            Some(&group) => groups[group].1.push(row),
            None => {
                index.insert(labels.clone(), groups.len());
                groups.push((labels, vec![row]));
            }
        }
    }

    let mut frames = Vec::new();
    for (labels, rows) in &groups {
        let series_times: Vec<_> = rows.iter().map(|&r| times[r]).collect();
        for (column, values) in value_columns.iter().zip(&numbers) {
            let series_values: Vec<_> = rows.iter().map(|&r| values[r]).collect();
            frames.push(series_frame(
                &time_column.name,
                series_times.clone(),
                column,
                series_values,
                labels,
            ));
        }
    }

    debug!(
        table = %table.name,
        series = frames.len(),
        "shaped time series"
    );
    Ok(frames)
}

// ============================================================================
// adx_time_series
// ============================================================================

fn adx_time_series(table: &RawTable) -> ShapeResult<Vec<Frame>> {
    let timestamps = table
        .column(TIMESTAMP_COLUMN)
        .ok_or(FormatError::MissingTimestampColumn)?;

    // make-series returns one dynamic array per value column; the `by` keys
    // stay scalar whatever their type.
    let value_columns: Vec<&RawColumn> = table
        .columns
        .iter()
        .filter(|c| c.name != TIMESTAMP_COLUMN)
        .filter(|c| c.is_dynamic() && holds_number_array(c))
        .collect();
    if value_columns.is_empty() {
        return Err(FormatError::NoValueColumn);
    }

    let label_columns: Vec<&RawColumn> = table
        .columns
        .iter()
        .filter(|c| c.name != TIMESTAMP_COLUMN)
        .filter(|c| !c.is_dynamic() || c.values.iter().all(|v| !v.is_array()))
        .collect();

    let mut frames = Vec::new();
    for row in 0..table.row_count() {
        let times = parse_times(timestamps, &array_at(&timestamps.values, row))?;
        let labels: Vec<Label> = label_columns
            .iter()
            .map(|c| Label {
                name: c.name.clone(),
                value: c.values.get(row).and_then(display_value).unwrap_or_default(),
            })
            .collect();

        for column in &value_columns {
            let values = parse_numbers(column, &array_at(&column.values, row))?;
            if values.len() != times.len() {
                return Err(FormatError::LengthMismatch {
                    column: column.name.clone(),
                    expected: times.len(),
                    found: values.len(),
                });
            }
            frames.push(series_frame(TIMESTAMP_COLUMN, times.clone(), column, values, &labels));
        }
    }
    Ok(frames)
}

fn holds_number_array(column: &RawColumn) -> bool {
    column
        .values
        .iter()
        .find_map(|v| array_or_json(v).map(|items| items.iter().all(|i| i.is_null() || i.is_number())))
        .unwrap_or(false)
}

/// The array stored in `values[row]`; dynamic cells may arrive as JSON text.
fn array_at(values: &[Value], row: usize) -> Vec<Value> {
    values.get(row).and_then(array_or_json).unwrap_or_default()
}

fn array_or_json(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

// ============================================================================
// Shared
// ============================================================================

fn series_frame(
    time_name: &str,
    times: Vec<Option<DateTime<Utc>>>,
    value_column: &RawColumn,
    values: Vec<Option<f64>>,
    labels: &[Label],
) -> Frame {
    let mut notices = Vec::new();
    notice_if_unsorted(&mut notices, time_name, &times);

    let mut value_field = Field::new(&value_column.name, FieldValues::Number(values));
    value_field.labels = labels.to_vec();

    Frame {
        name: series_name(&value_column.name, labels),
        fields: vec![Field::new(time_name, FieldValues::Time(times)), value_field],
        notices,
    }
}

fn notice_if_unsorted(notices: &mut Vec<Notice>, field: &str, times: &[Option<DateTime<Utc>>]) {
    if !is_non_decreasing(times) {
        debug!(field, "time field is not ascending");
        notices.push(Notice::TimeNotAsc {
            field: field.to_string(),
        });
    }
}

fn check_lengths(table: &RawTable) -> ShapeResult<()> {
    let expected = table.row_count();
    for column in &table.columns {
        if column.values.len() != expected {
            return Err(FormatError::LengthMismatch {
                column: column.name.clone(),
                expected,
                found: column.values.len(),
            });
        }
    }
    Ok(())
}

fn parse_times(column: &RawColumn, values: &[Value]) -> ShapeResult<Vec<Option<DateTime<Utc>>>> {
    values
        .iter()
        .enumerate()
        .map(|(row, v)| parse_time(column, row, v))
        .collect()
}

fn parse_numbers(column: &RawColumn, values: &[Value]) -> ShapeResult<Vec<Option<f64>>> {
    values
        .iter()
        .enumerate()
        .map(|(row, v)| parse_number(column, row, v))
        .collect()
}

fn parse_time(column: &RawColumn, row: usize, value: &Value) -> ShapeResult<Option<DateTime<Utc>>> {
    let invalid = || FormatError::InvalidTimestamp {
        column: column.name.clone(),
        row,
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc()))
            .map(Some)
            .map_err(|_| invalid()),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Some)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_number(column: &RawColumn, row: usize, value: &Value) -> ShapeResult<Option<f64>> {
    let invalid = || FormatError::InvalidNumber {
        column: column.name.clone(),
        row,
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(invalid),
        // Kusto serializes NaN and infinities as strings.
        Value::String(text) => text.parse::<f64>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
