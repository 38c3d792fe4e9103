//! Table verbs: filter, mutate, select, summarize.
//!
//! Every verb consumes captures by reference, evaluates them through the
//! deferred evaluator, and produces a brand-new table; inputs are never
//! modified. Grouped variants regroup their result by the same keys so a
//! grouping survives filtering and mutation until a summarize consumes it.

use crate::capture::Capture;
use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{FrameError, Result};
use crate::eval::{eval_at_row, eval_grouped, Scope};
use crate::group::GroupedTable;
use crate::table::Table;

impl Table {
    /// Keep rows for which every predicate evaluates to true (conjunction).
    ///
    /// A null predicate value drops the row; a non-boolean value is a type
    /// error that aborts the verb.
    ///
    /// # Example
    ///
    /// ```
    /// use tidyframe::{Capture, Table};
    ///
    /// let table = Table::from_csv("t", "x,y\n1,10\n5,20\n9,30").unwrap();
    /// let kept = table.filter(&[Capture::parse("x > 2").unwrap()]).unwrap();
    /// assert_eq!(kept.len(), 2);
    /// ```
    pub fn filter(&self, predicates: &[Capture]) -> Result<Table> {
        let mut keep = Vec::new();

        'rows: for row in 0..self.len() {
            for predicate in predicates {
                let scope = Scope::table(self, predicate.env());
                match eval_at_row(predicate, &scope, row)? {
                    ColumnValue::Bool(true) => {}
                    ColumnValue::Bool(false) | ColumnValue::Null => continue 'rows,
                    other => {
                        return Err(FrameError::TypeMismatch(format!(
                            "filter predicate '{}' evaluated to {}",
                            predicate.source(),
                            ColumnType::of(&other).map(|t| t.name()).unwrap_or("NULL")
                        )))
                    }
                }
            }
            keep.push(row);
        }

        self.take_rows(&keep)
    }

    /// Add a column computed per row, or replace an existing column of the
    /// same name in place. All other columns pass through unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use tidyframe::{Capture, Table};
    ///
    /// let table = Table::from_csv("t", "mass,height\n60.0,2.0\n81.0,1.8").unwrap();
    /// let with_bmi = table
    ///     .mutate("bmi", &Capture::parse("mass / (height * height)").unwrap())
    ///     .unwrap();
    /// assert_eq!(with_bmi.schema().len(), 3);
    /// assert_eq!(with_bmi.get_value(0, "bmi").unwrap().as_f64(), Some(15.0));
    /// ```
    pub fn mutate(&self, name: &str, capture: &Capture) -> Result<Table> {
        let scope = Scope::table(self, capture.env());
        let mut values = Vec::with_capacity(self.len());
        for row in 0..self.len() {
            values.push(eval_at_row(capture, &scope, row)?);
        }
        let new_col = column_from_values(name, values)?;

        let mut columns: Vec<Column> = Vec::with_capacity(self.schema().len() + 1);
        let mut replaced = false;
        for idx in 0..self.schema().len() {
            let col = self.column(idx);
            if col.name() == name {
                columns.push(new_col.clone());
                replaced = true;
            } else {
                columns.push(col.clone());
            }
        }
        if !replaced {
            columns.push(new_col);
        }

        Table::from_columns(self.name().to_string(), columns)
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<Table> {
        let mut selected = Vec::with_capacity(columns.len());
        for name in columns {
            selected.push(self.column_by_name(name)?.clone());
        }
        Table::from_columns(self.name().to_string(), selected)
    }

    /// Reduce the whole table to one row: an ungrouped summarize treats the
    /// table as a single implicit group.
    pub fn summarize(&self, aggregates: &[(String, Capture)]) -> Result<Table> {
        let mut columns = Vec::with_capacity(aggregates.len());
        for (name, capture) in aggregates {
            let scope = Scope::table(self, capture.env());
            let value = eval_grouped(capture, &scope)?;
            columns.push(column_from_values(name, vec![value])?);
        }
        Table::from_columns(self.name().to_string(), columns)
    }
}

impl GroupedTable {
    /// Reduce each group to exactly one row. Output columns are the group
    /// keys, in grouping order, followed by one column per aggregate.
    ///
    /// # Example
    ///
    /// ```
    /// use tidyframe::{Capture, Table};
    ///
    /// let csv = "species,len\nsetosa,1.4\nvirginica,6.0\nsetosa,1.3";
    /// let summary = Table::from_csv("iris", csv)
    ///     .unwrap()
    ///     .group_by(&["species"])
    ///     .unwrap()
    ///     .summarize(&[("count".to_string(), Capture::parse("n()").unwrap())])
    ///     .unwrap();
    /// assert_eq!(summary.len(), 2);
    /// assert_eq!(summary.get_value(0, "count").unwrap().as_i64(), Some(2));
    /// ```
    pub fn summarize(&self, aggregates: &[(String, Capture)]) -> Result<Table> {
        let table = self.table();
        let mut columns: Vec<Column> = Vec::with_capacity(self.keys().len() + aggregates.len());

        for (key_idx, key) in self.keys().iter().enumerate() {
            let col_type = table
                .schema()
                .get_column_type(key)
                .ok_or_else(|| FrameError::ColumnNotFound(key.clone()))?;
            let nullable = table.schema().is_column_nullable(key).unwrap_or(true);
            let mut col =
                Column::with_capacity(key.clone(), col_type, nullable, self.num_groups());
            for group in self.groups() {
                col.append(group.key_values[key_idx].clone())?;
            }
            columns.push(col);
        }

        for (name, capture) in aggregates {
            let mut values = Vec::with_capacity(self.num_groups());
            for group in self.groups() {
                let scope = Scope::group(table, &group.rows, capture.env());
                values.push(eval_grouped(capture, &scope)?);
            }
            columns.push(column_from_values(name, values)?);
        }

        Table::from_columns(table.name().to_string(), columns)
    }

    /// Filter rows, then regroup the survivors by the same keys.
    pub fn filter(&self, predicates: &[Capture]) -> Result<GroupedTable> {
        let filtered = self.table().filter(predicates)?;
        let keys: Vec<&str> = self.keys().iter().map(|k| k.as_str()).collect();
        filtered.group_by(&keys)
    }

    /// Mutate, then regroup by the same keys (a replaced key column changes
    /// group membership).
    pub fn mutate(&self, name: &str, capture: &Capture) -> Result<GroupedTable> {
        let mutated = self.table().mutate(name, capture)?;
        let keys: Vec<&str> = self.keys().iter().map(|k| k.as_str()).collect();
        mutated.group_by(&keys)
    }
}

/// Build a column from computed values. The type is inferred from the
/// non-null values, with int/float mixes promoted to float; other mixes are
/// type errors. All-null value sets default to FLOAT64. Computed columns
/// are always nullable.
fn column_from_values(name: &str, values: Vec<ColumnValue>) -> Result<Column> {
    let mut inferred: Option<ColumnType> = None;
    for value in &values {
        let Some(t) = ColumnType::of(value) else {
            continue;
        };
        inferred = Some(match inferred {
            None => t,
            Some(prev) if prev == t => prev,
            Some(ColumnType::Int64) if t == ColumnType::Float64 => ColumnType::Float64,
            Some(ColumnType::Float64) if t == ColumnType::Int64 => ColumnType::Float64,
            Some(prev) => {
                return Err(FrameError::TypeMismatch(format!(
                    "column '{}' mixes {} and {}",
                    name,
                    prev.name(),
                    t.name()
                )))
            }
        });
    }

    let col_type = inferred.unwrap_or(ColumnType::Float64);
    let mut col = Column::with_capacity(name.to_string(), col_type, true, values.len());
    for value in values {
        let value = match (col_type, value) {
            (ColumnType::Float64, ColumnValue::Int64(n)) => ColumnValue::Float64(n as f64),
            (_, v) => v,
        };
        col.append(value)?;
    }
    Ok(col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Env;

    fn scores() -> Table {
        Table::from_csv(
            "scores",
            "name,score,passed\nAlice,95.0,true\nBob,62.0,false\nCarol,88.0,true\nDave,45.0,false",
        )
        .unwrap()
    }

    #[test]
    fn test_filter_conjunction() {
        let table = scores();
        let kept = table
            .filter(&[
                Capture::parse("score > 50").unwrap(),
                Capture::parse("passed").unwrap(),
            ])
            .unwrap();

        assert_eq!(kept.len(), 2);
        assert_eq!(kept.get_value(0, "name").unwrap().as_string(), Some("Alice"));
        assert_eq!(kept.get_value(1, "name").unwrap().as_string(), Some("Carol"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let table = scores();
        let predicate = [Capture::parse("score > 80").unwrap()];

        let once = table.filter(&predicate).unwrap();
        let twice = once.filter(&predicate).unwrap();

        assert_eq!(once.len(), twice.len());
        for row in 0..once.len() {
            assert_eq!(once.get_row(row).unwrap(), twice.get_row(row).unwrap());
        }
    }

    #[test]
    fn test_filter_non_boolean_predicate() {
        let table = scores();
        let err = table.filter(&[Capture::parse("score + 1").unwrap()]).unwrap_err();
        assert!(matches!(err, FrameError::TypeMismatch(_)));
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let table = scores();
        let _ = table.filter(&[Capture::parse("score > 80").unwrap()]).unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_mutate_appends_ratio_column() {
        let table = Table::from_csv("t", "var1,var2\n10.0,4.0\n9.0,3.0").unwrap();
        let result = table
            .mutate("ratio", &Capture::parse("var1 / var2").unwrap())
            .unwrap();

        // existing columns preserved, one new column, same row count
        assert_eq!(result.schema().len(), 3);
        assert_eq!(result.len(), table.len());
        assert_eq!(result.schema().get_column_names(), vec!["var1", "var2", "ratio"]);
        assert_eq!(result.get_value(0, "ratio").unwrap().as_f64(), Some(2.5));
        assert_eq!(result.get_value(1, "ratio").unwrap().as_f64(), Some(3.0));
    }

    #[test]
    fn test_mutate_replaces_in_place() {
        let table = scores();
        let result = table
            .mutate("score", &Capture::parse("score / 100").unwrap())
            .unwrap();

        assert_eq!(result.schema().len(), 4);
        assert_eq!(
            result.schema().get_column_index("score"),
            table.schema().get_column_index("score")
        );
        assert_eq!(result.get_value(0, "score").unwrap().as_f64(), Some(0.95));
    }

    #[test]
    fn test_mutate_with_env_binding() {
        let table = scores();
        let env = Env::new().bind("bonus", ColumnValue::Float64(5.0));
        let capture = Capture::with_env("score + bonus", env).unwrap();
        let result = table.mutate("adjusted", &capture).unwrap();

        assert_eq!(result.get_value(1, "adjusted").unwrap().as_f64(), Some(67.0));
    }

    #[test]
    fn test_select_order_and_errors() {
        let table = scores();
        let narrow = table.select(&["score", "name"]).unwrap();
        assert_eq!(narrow.schema().get_column_names(), vec!["score", "name"]);

        assert_eq!(
            table.select(&["nope"]).unwrap_err(),
            FrameError::ColumnNotFound("nope".to_string())
        );
    }

    #[test]
    fn test_grouped_summarize_one_row_per_group() {
        let table = scores();
        let summary = table
            .group_by(&["passed"])
            .unwrap()
            .summarize(&[
                ("count".to_string(), Capture::parse("n()").unwrap()),
                ("best".to_string(), Capture::parse("max(score)").unwrap()),
            ])
            .unwrap();

        assert_eq!(summary.len(), 2);
        assert!(summary.len() <= table.len());
        assert_eq!(summary.schema().get_column_names(), vec!["passed", "count", "best"]);

        // first-seen key order: true before false
        assert_eq!(summary.get_value(0, "passed").unwrap().as_bool(), Some(true));
        assert_eq!(summary.get_value(0, "count").unwrap().as_i64(), Some(2));
        assert_eq!(summary.get_value(0, "best").unwrap().as_f64(), Some(95.0));
        assert_eq!(summary.get_value(1, "best").unwrap().as_f64(), Some(62.0));
    }

    #[test]
    fn test_ungrouped_summarize_single_row() {
        let table = scores();
        let summary = table
            .summarize(&[
                ("n".to_string(), Capture::parse("n()").unwrap()),
                ("avg".to_string(), Capture::parse("mean(score)").unwrap()),
            ])
            .unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.get_value(0, "n").unwrap().as_i64(), Some(4));
        assert_eq!(summary.get_value(0, "avg").unwrap().as_f64(), Some(72.5));
    }

    #[test]
    fn test_summarize_name_collision_with_key() {
        let table = scores();
        let err = table
            .group_by(&["passed"])
            .unwrap()
            .summarize(&[("passed".to_string(), Capture::parse("n()").unwrap())])
            .unwrap_err();
        assert_eq!(err, FrameError::DuplicateColumn("passed".to_string()));
    }

    #[test]
    fn test_grouped_filter_regroups() {
        let table = scores();
        let grouped = table.group_by(&["passed"]).unwrap();
        let filtered = grouped
            .filter(&[Capture::parse("score > 50").unwrap()])
            .unwrap();

        // Dave's group member count drops; the false group keeps only Bob
        assert_eq!(filtered.table().len(), 3);
        assert_eq!(filtered.num_groups(), 2);
    }

    #[test]
    fn test_mutate_type_inference_with_nulls() {
        // a null row contributes nothing to inference; the column stays INT64
        let table = Table::from_csv("t", "a,b\n2,4\n3,").unwrap();
        let result = table
            .mutate("product", &Capture::parse("a * b").unwrap())
            .unwrap();
        assert_eq!(
            result.schema().get_column_type("product"),
            Some(ColumnType::Int64)
        );
        assert_eq!(result.get_value(0, "product").unwrap().as_i64(), Some(8));
        assert!(result.get_value(1, "product").unwrap().is_null());
    }
}
