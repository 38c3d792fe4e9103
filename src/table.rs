/// Table implementation for tidyframe.
///
/// A Table is an ordered collection of equal-length typed columns described
/// by a schema. Tables are built once (from row literals, CSV text, or JSON
/// text) and then treated as immutable: every pipeline verb produces a new
/// table rather than modifying its input.
///
/// # Examples
///
/// ```
/// use tidyframe::{Table, Schema, ColumnType, ColumnValue};
/// use std::collections::HashMap;
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int64, false),
///     ("name".to_string(), ColumnType::String, false),
/// ]);
///
/// let mut table = Table::new("users".to_string(), schema);
///
/// let mut row = HashMap::new();
/// row.insert("id".to_string(), ColumnValue::Int64(1));
/// row.insert("name".to_string(), ColumnValue::String("Alice".to_string()));
/// table.append_row(row).unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.get_value(0, "name").unwrap().as_string(), Some("Alice"));
/// ```

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{FrameError, Result};
use std::collections::HashMap;
use std::fmt;

/// Schema definition with column names, types, and nullability.
///
/// # Examples
///
/// ```
/// use tidyframe::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int64, false),
///     ("score".to_string(), ColumnType::Float64, true),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get_column_index("score"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    /// (name, type, nullable) for the column at `index`.
    pub fn get_column_info(&self, index: usize) -> Option<(&str, ColumnType, bool)> {
        self.columns
            .get(index)
            .map(|(name, ty, nullable)| (name.as_str(), *ty, *nullable))
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }

    pub fn is_column_nullable(&self, name: &str) -> Option<bool> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, nullable)| *nullable)
    }
}

/// In-memory table: a schema plus one column per schema entry, all the same
/// length.
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let columns: Vec<Column> = schema
            .columns
            .iter()
            .map(|(col_name, col_type, nullable)| {
                Column::new(col_name.clone(), *col_type, *nullable)
            })
            .collect();

        Table {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Build a table directly from pre-assembled columns. All columns must
    /// have the same length and names must be unique.
    pub(crate) fn from_columns(name: String, columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, |c| c.len());
        let mut seen: Vec<&str> = Vec::with_capacity(columns.len());
        for col in &columns {
            if col.len() != row_count {
                return Err(FrameError::LengthMismatch {
                    name: col.name().to_string(),
                    expected: row_count,
                    actual: col.len(),
                });
            }
            if seen.contains(&col.name()) {
                return Err(FrameError::DuplicateColumn(col.name().to_string()));
            }
            seen.push(col.name());
        }

        let schema = Schema::new(
            columns
                .iter()
                .map(|c| (c.name().to_string(), c.column_type(), c.is_nullable()))
                .collect(),
        );

        Ok(Table {
            name,
            schema,
            columns,
            row_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub(crate) fn column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub(crate) fn column_by_name(&self, name: &str) -> Result<&Column> {
        let idx = self
            .schema
            .get_column_index(name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
        Ok(&self.columns[idx])
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<ColumnValue> {
        self.column_by_name(column)?.get(row)
    }

    pub fn get_row(&self, row: usize) -> Result<HashMap<String, ColumnValue>> {
        if row >= self.row_count {
            return Err(FrameError::RowOutOfRange {
                row,
                len: self.row_count,
            });
        }

        let mut result = HashMap::new();
        for col in &self.columns {
            result.insert(col.name().to_string(), col.get(row)?);
        }
        Ok(result)
    }

    pub fn append_row(&mut self, row: HashMap<String, ColumnValue>) -> Result<()> {
        // Validate all columns are present before touching storage
        for col_name in self.schema.get_column_names() {
            if !row.contains_key(col_name) {
                return Err(FrameError::MissingValue(col_name.to_string()));
            }
        }

        for col in self.columns.iter_mut() {
            let value = row.get(col.name()).unwrap().clone();
            col.append(value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    /// Append multiple rows at once. All rows are validated for completeness
    /// up front; no rows are inserted on error.
    pub fn append_rows(&mut self, rows: Vec<HashMap<String, ColumnValue>>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let col_names: Vec<&str> = self.schema.get_column_names();
        for row in rows.iter() {
            for col_name in &col_names {
                if !row.contains_key(*col_name) {
                    return Err(FrameError::MissingValue(col_name.to_string()));
                }
            }
        }

        let num_rows = rows.len();
        for row in rows {
            for col in self.columns.iter_mut() {
                let value = row.get(col.name()).unwrap().clone();
                col.append(value)?;
            }
            self.row_count += 1;
        }

        Ok(num_rows)
    }

    /// New table containing the given rows, in the given order.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Result<Table> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let mut new_col = Column::with_capacity(
                col.name().to_string(),
                col.column_type(),
                col.is_nullable(),
                rows.len(),
            );
            for &row in rows {
                new_col.append(col.get(row)?)?;
            }
            columns.push(new_col);
        }
        Table::from_columns(self.name.clone(), columns)
    }

    pub fn iter_rows(&self) -> TableRowIterator<'_> {
        TableRowIterator {
            table: self,
            index: 0,
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Export table to CSV format. NULL values become empty fields; strings
    /// containing commas, quotes, or newlines are escaped.
    pub fn to_csv(&self) -> String {
        let mut result = String::new();
        let column_names = self.schema.get_column_names();

        result.push_str(&column_names.join(","));
        result.push('\n');

        for row_idx in 0..self.row_count {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| match col.get_ref(row_idx) {
                    Some(ColumnValue::String(s)) => {
                        if s.contains(',') || s.contains('"') || s.contains('\n') {
                            format!("\"{}\"", s.replace('"', "\"\""))
                        } else {
                            s.clone()
                        }
                    }
                    Some(v) => v.render(),
                    None => String::new(),
                })
                .collect();
            result.push_str(&values.join(","));
            result.push('\n');
        }
        result
    }

    /// Export table to JSON format (array of objects, pretty-printed).
    pub fn to_json(&self) -> Result<String> {
        let column_names = self.schema.get_column_names();
        let rows: Vec<serde_json::Value> = (0..self.row_count)
            .map(|row_idx| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        let json_val = match col.get_ref(row_idx) {
                            Some(ColumnValue::Int64(n)) => serde_json::Value::Number((*n).into()),
                            Some(ColumnValue::Float64(f)) => serde_json::Number::from_f64(*f)
                                .map(serde_json::Value::Number)
                                .unwrap_or(serde_json::Value::Null),
                            Some(ColumnValue::String(s)) => serde_json::Value::String(s.clone()),
                            Some(ColumnValue::Bool(b)) => serde_json::Value::Bool(*b),
                            Some(ColumnValue::Null) | None => serde_json::Value::Null,
                        };
                        (column_names[i].to_string(), json_val)
                    })
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();

        serde_json::to_string_pretty(&rows)
            .map_err(|e| FrameError::Parse(format!("JSON serialization error: {}", e)))
    }

    /// Create a table from a CSV string.
    ///
    /// The first line is the header. Column types are inferred from the
    /// first data row (integer, float, bool, string); all columns are
    /// created nullable so empty fields become nulls.
    ///
    /// # Example
    ///
    /// ```
    /// use tidyframe::Table;
    ///
    /// let csv = "id,name,score\n1,Alice,95.5\n2,Bob,87.0";
    /// let table = Table::from_csv("students", csv).unwrap();
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn from_csv(name: &str, csv: &str) -> Result<Table> {
        let mut all_rows = parse_csv_rows(csv);

        if all_rows.is_empty() {
            return Err(FrameError::Parse("CSV is empty".to_string()));
        }

        let column_names = all_rows.remove(0);
        if column_names.is_empty() {
            return Err(FrameError::Parse("CSV header is empty".to_string()));
        }
        for (i, name_a) in column_names.iter().enumerate() {
            if column_names[..i].contains(name_a) {
                return Err(FrameError::DuplicateColumn(name_a.clone()));
            }
        }

        let rows: Vec<Vec<String>> = all_rows
            .into_iter()
            .filter(|row| !row.iter().all(|f| f.is_empty()))
            .collect();

        let types = if rows.is_empty() {
            vec![ColumnType::String; column_names.len()]
        } else {
            let inferred: Vec<ColumnType> = rows[0]
                .iter()
                .map(|v| infer_type_from_csv_value(v))
                .collect();
            if inferred.len() != column_names.len() {
                return Err(FrameError::Parse(format!(
                    "column count mismatch: header has {}, but data row has {} values",
                    column_names.len(),
                    inferred.len()
                )));
            }
            inferred
        };

        let schema_cols: Vec<(String, ColumnType, bool)> = column_names
            .iter()
            .zip(types.iter())
            .map(|(name, typ)| (name.clone(), *typ, true))
            .collect();

        let mut table = Table::new(name.to_string(), Schema::new(schema_cols));

        for row_values in rows {
            let mut row = HashMap::new();
            for (i, col_name) in column_names.iter().enumerate() {
                let value_str = row_values.get(i).map(|s| s.as_str()).unwrap_or("");
                let value = parse_csv_value(value_str, types[i])?;
                row.insert(col_name.clone(), value);
            }
            table.append_row(row)?;
        }

        Ok(table)
    }

    /// Create a table from a JSON string (array of objects). Column types
    /// are inferred from the first object; all columns are nullable.
    ///
    /// # Example
    ///
    /// ```
    /// use tidyframe::Table;
    ///
    /// let json = r#"[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]"#;
    /// let table = Table::from_json("users", json).unwrap();
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn from_json(name: &str, json: &str) -> Result<Table> {
        let parsed: Vec<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| FrameError::Parse(format!("JSON parse error: {}", e)))?;

        if parsed.is_empty() {
            return Err(FrameError::Parse("JSON array is empty".to_string()));
        }

        let first = parsed[0]
            .as_object()
            .ok_or_else(|| FrameError::Parse("expected array of objects".to_string()))?;

        let mut columns = Vec::new();
        for (key, value) in first {
            let col_type = match value {
                serde_json::Value::Number(n) => {
                    if n.is_i64() {
                        ColumnType::Int64
                    } else {
                        ColumnType::Float64
                    }
                }
                serde_json::Value::String(_) => ColumnType::String,
                serde_json::Value::Bool(_) => ColumnType::Bool,
                serde_json::Value::Null => ColumnType::String,
                _ => {
                    return Err(FrameError::Parse(format!(
                        "unsupported JSON value type for column '{}'",
                        key
                    )))
                }
            };
            columns.push((key.clone(), col_type, true));
        }

        let mut table = Table::new(name.to_string(), Schema::new(columns));

        for item in &parsed {
            let obj = item
                .as_object()
                .ok_or_else(|| FrameError::Parse("expected object in array".to_string()))?;
            let mut row = HashMap::new();
            for (key, value) in obj {
                let col_value = match value {
                    serde_json::Value::Number(n) => {
                        if let Some(v) = n.as_i64() {
                            // Match the inferred column type: integers in a
                            // float column widen on ingestion.
                            if table.schema.get_column_type(key) == Some(ColumnType::Float64) {
                                ColumnValue::Float64(v as f64)
                            } else {
                                ColumnValue::Int64(v)
                            }
                        } else {
                            ColumnValue::Float64(n.as_f64().unwrap_or(f64::NAN))
                        }
                    }
                    serde_json::Value::String(s) => ColumnValue::String(s.clone()),
                    serde_json::Value::Bool(b) => ColumnValue::Bool(*b),
                    serde_json::Value::Null => ColumnValue::Null,
                    _ => {
                        return Err(FrameError::Parse(format!(
                            "unsupported JSON value type for key '{}'",
                            key
                        )))
                    }
                };
                row.insert(key.clone(), col_value);
            }
            table.append_row(row)?;
        }

        Ok(table)
    }
}

// ============================================================================
// CSV helpers
// ============================================================================

/// Parse a CSV string into rows, handling quoted fields with embedded
/// newlines and doubled-quote escapes.
fn parse_csv_rows(csv: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut current_row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current_field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if !in_quotes => {
                in_quotes = true;
            }
            ',' if !in_quotes => {
                current_row.push(current_field.clone());
                current_field.clear();
            }
            '\n' if !in_quotes => {
                current_row.push(current_field.clone());
                current_field.clear();
                rows.push(current_row);
                current_row = Vec::new();
            }
            '\r' if !in_quotes => {
                // part of \r\n, the \n branch handles the row break
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    if !current_field.is_empty() || !current_row.is_empty() {
        current_row.push(current_field);
        rows.push(current_row);
    }

    rows
}

fn infer_type_from_csv_value(value: &str) -> ColumnType {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return ColumnType::String;
    }
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return ColumnType::Bool;
    }
    if trimmed.parse::<i64>().is_ok() {
        return ColumnType::Int64;
    }
    if trimmed.parse::<f64>().is_ok() {
        return ColumnType::Float64;
    }
    ColumnType::String
}

fn parse_csv_value(value: &str, col_type: ColumnType) -> Result<ColumnValue> {
    let trimmed = value.trim();

    // Empty field is null for any type
    if trimmed.is_empty() {
        return Ok(ColumnValue::Null);
    }

    match col_type {
        ColumnType::Int64 => trimmed
            .parse::<i64>()
            .map(ColumnValue::Int64)
            .map_err(|_| FrameError::Parse(format!("cannot parse '{}' as INT64", trimmed))),
        ColumnType::Float64 => trimmed
            .parse::<f64>()
            .map(ColumnValue::Float64)
            .map_err(|_| FrameError::Parse(format!("cannot parse '{}' as FLOAT64", trimmed))),
        ColumnType::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(ColumnValue::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(ColumnValue::Bool(false))
            } else {
                Err(FrameError::Parse(format!(
                    "cannot parse '{}' as BOOL",
                    trimmed
                )))
            }
        }
        ColumnType::String => Ok(ColumnValue::String(trimmed.to_string())),
    }
}

pub struct TableRowIterator<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Iterator for TableRowIterator<'a> {
    type Item = HashMap<String, ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.row_count {
            None
        } else {
            let result = self.table.get_row(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.schema.len(),
            self.row_count
        )
    }
}

/// Plain-text tabular rendering: aligned columns, a header row, and a dash
/// separator. This is the only display surface the crate exposes.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.schema.get_column_names();
        let mut widths: Vec<usize> = names.iter().map(|n| n.len()).collect();

        let mut rendered: Vec<Vec<String>> = Vec::with_capacity(self.row_count);
        for row_idx in 0..self.row_count {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|col| col.get_ref(row_idx).map(|v| v.render()).unwrap_or_default())
                .collect();
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
            rendered.push(row);
        }

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{:width$}", name, width = widths[i])?;
        }
        writeln!(f)?;
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{}", "-".repeat(*width))?;
        }
        writeln!(f)?;
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:width$}", cell, width = widths[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
