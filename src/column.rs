/// Column implementation for tidyframe.
///
/// A Column is an ordered sequence of scalar values of a uniform declared
/// type, indexed by row number. Nulls are stored inline; whether a column
/// accepts them is part of its declaration. Columns are append-only: the
/// verb pipeline never mutates a column in place, it builds new ones.

use crate::error::{FrameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Bool,
}

impl ColumnType {
    /// The type a scalar value would be stored as, or None for null.
    pub fn of(value: &ColumnValue) -> Option<ColumnType> {
        match value {
            ColumnValue::Int64(_) => Some(ColumnType::Int64),
            ColumnValue::Float64(_) => Some(ColumnType::Float64),
            ColumnValue::String(_) => Some(ColumnType::String),
            ColumnValue::Bool(_) => Some(ColumnType::Bool),
            ColumnValue::Null => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "INT64",
            ColumnType::Float64 => "FLOAT64",
            ColumnType::String => "STRING",
            ColumnType::Bool => "BOOL",
        }
    }
}

/// Scalar value enum covering every column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value: integers widen to f64, floats pass
    /// through, everything else (including null) is None. Used by the
    /// aggregate reducers.
    #[inline]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            ColumnValue::Int64(n) => Some(*n as f64),
            ColumnValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Human-readable rendering used by the plain-text table display.
    /// Nulls render as empty.
    pub fn render(&self) -> String {
        match self {
            ColumnValue::Int64(n) => n.to_string(),
            ColumnValue::Float64(f) => f.to_string(),
            ColumnValue::String(s) => s.clone(),
            ColumnValue::Bool(b) => b.to_string(),
            ColumnValue::Null => String::new(),
        }
    }
}

/// A typed, optionally nullable column of values.
#[derive(Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        Column {
            name,
            column_type,
            nullable,
            values: Vec::new(),
        }
    }

    pub fn with_capacity(
        name: String,
        column_type: ColumnType,
        nullable: bool,
        capacity: usize,
    ) -> Self {
        Column {
            name,
            column_type,
            nullable,
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate a value against this column's type and nullability.
    fn validate_value(&self, value: ColumnValue) -> Result<ColumnValue> {
        match ColumnType::of(&value) {
            None => {
                if !self.nullable {
                    return Err(FrameError::NotNullable(self.name.clone()));
                }
                Ok(ColumnValue::Null)
            }
            Some(t) if t == self.column_type => Ok(value),
            Some(t) => Err(FrameError::ColumnTypeMismatch {
                name: self.name.clone(),
                expected: self.column_type.name().to_string(),
                actual: t.name().to_string(),
            }),
        }
    }

    pub fn get(&self, index: usize) -> Result<ColumnValue> {
        self.values
            .get(index)
            .cloned()
            .ok_or(FrameError::RowOutOfRange {
                row: index,
                len: self.values.len(),
            })
    }

    /// Borrowing access for hot loops; None past the end.
    #[inline]
    pub fn get_ref(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Fast numeric access without cloning. None if the value is null,
    /// non-numeric, or the index is out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|v| v.as_numeric())
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(ColumnValue::Null))
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<()> {
        let value = self.validate_value(value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnValue> {
        self.values.iter()
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, nullable: {}, len: {} }}",
            self.name,
            self.column_type,
            self.nullable,
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_basic() {
        let mut col = Column::new("test".to_string(), ColumnType::Int64, false);
        col.append(ColumnValue::Int64(10)).unwrap();
        col.append(ColumnValue::Int64(20)).unwrap();
        col.append(ColumnValue::Int64(30)).unwrap();

        assert_eq!(col.len(), 3);
        assert_eq!(col.get(0).unwrap().as_i64(), Some(10));
        assert_eq!(col.get(1).unwrap().as_i64(), Some(20));
        assert_eq!(col.get(2).unwrap().as_i64(), Some(30));
    }

    #[test]
    fn test_column_nullable() {
        let mut col = Column::new("test".to_string(), ColumnType::Float64, true);
        col.append(ColumnValue::Float64(1.5)).unwrap();
        col.append(ColumnValue::Null).unwrap();

        assert_eq!(col.get(0).unwrap().as_f64(), Some(1.5));
        assert!(col.get(1).unwrap().is_null());
        assert!(col.is_null_at(1));
        assert!(!col.is_null_at(0));
    }

    #[test]
    fn test_column_rejects_null_when_not_nullable() {
        let mut col = Column::new("test".to_string(), ColumnType::Int64, false);
        let err = col.append(ColumnValue::Null).unwrap_err();
        assert_eq!(err, FrameError::NotNullable("test".to_string()));
    }

    #[test]
    fn test_column_rejects_wrong_type() {
        let mut col = Column::new("score".to_string(), ColumnType::Float64, false);
        let err = col
            .append(ColumnValue::String("oops".to_string()))
            .unwrap_err();
        assert!(matches!(err, FrameError::ColumnTypeMismatch { .. }));
    }

    #[test]
    fn test_column_numeric_access() {
        let mut col = Column::new("n".to_string(), ColumnType::Int64, true);
        col.append(ColumnValue::Int64(7)).unwrap();
        col.append(ColumnValue::Null).unwrap();

        assert_eq!(col.get_f64(0), Some(7.0));
        assert_eq!(col.get_f64(1), None);
        assert_eq!(col.get_f64(99), None);
    }

    #[test]
    fn test_column_value_serde_round_trip() {
        let values = vec![
            ColumnValue::Int64(7),
            ColumnValue::Float64(1.5),
            ColumnValue::String("setosa".to_string()),
            ColumnValue::Bool(true),
            ColumnValue::Null,
        ];
        let json = serde_json::to_string(&values).unwrap();
        let back: Vec<ColumnValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(values, back);
    }

    #[test]
    fn test_column_out_of_range() {
        let col = Column::new("empty".to_string(), ColumnType::Bool, false);
        assert_eq!(
            col.get(0).unwrap_err(),
            FrameError::RowOutOfRange { row: 0, len: 0 }
        );
    }
}
