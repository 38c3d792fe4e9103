/// Grouping implementation for tidyframe.
///
/// A GroupedTable partitions a table's rows into disjoint groups keyed by
/// the values of one or more columns. Groups keep the order in which their
/// key first appears in the table, and every row belongs to exactly one
/// group, so per-group row counts always sum to the parent row count.

use crate::column::ColumnValue;
use crate::error::{FrameError, Result};
use crate::table::Table;
use std::collections::HashMap;

/// Hashable stand-in for a key value. Floats key by bit pattern, which
/// keeps NaN keys stable and groups -0.0 apart from 0.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyScalar {
    Int(i64),
    Float(u64),
    Str(String),
    Bool(bool),
    Null,
}

impl KeyScalar {
    fn from_value(value: &ColumnValue) -> KeyScalar {
        match value {
            ColumnValue::Int64(n) => KeyScalar::Int(*n),
            ColumnValue::Float64(f) => KeyScalar::Float(f.to_bits()),
            ColumnValue::String(s) => KeyScalar::Str(s.clone()),
            ColumnValue::Bool(b) => KeyScalar::Bool(*b),
            ColumnValue::Null => KeyScalar::Null,
        }
    }
}

/// One partition: the key values that define it and the absolute row
/// indices of its members, in table order.
pub(crate) struct Group {
    pub(crate) key_values: Vec<ColumnValue>,
    pub(crate) rows: Vec<usize>,
}

/// A table plus a row partition over it.
pub struct GroupedTable {
    table: Table,
    keys: Vec<String>,
    groups: Vec<Group>,
}

impl Table {
    /// Partition rows by the values of the given key columns.
    ///
    /// # Example
    ///
    /// ```
    /// use tidyframe::Table;
    ///
    /// let csv = "species,size\nsetosa,1.4\nvirginica,6.0\nsetosa,1.3";
    /// let table = Table::from_csv("iris", csv).unwrap();
    /// let grouped = table.group_by(&["species"]).unwrap();
    /// assert_eq!(grouped.num_groups(), 2);
    /// ```
    pub fn group_by(&self, keys: &[&str]) -> Result<GroupedTable> {
        if keys.is_empty() {
            return Err(FrameError::Parse("group_by requires at least one key".to_string()));
        }
        let mut key_indices = Vec::with_capacity(keys.len());
        for key in keys {
            let idx = self
                .schema()
                .get_column_index(key)
                .ok_or_else(|| FrameError::ColumnNotFound(key.to_string()))?;
            key_indices.push(idx);
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut seen: HashMap<Vec<KeyScalar>, usize> = HashMap::new();

        for row in 0..self.len() {
            let mut hash_key = Vec::with_capacity(key_indices.len());
            let mut key_values = Vec::with_capacity(key_indices.len());
            for &col_idx in &key_indices {
                let value = self.column(col_idx).get(row)?;
                hash_key.push(KeyScalar::from_value(&value));
                key_values.push(value);
            }

            match seen.get(&hash_key) {
                Some(&group_idx) => groups[group_idx].rows.push(row),
                None => {
                    seen.insert(hash_key, groups.len());
                    groups.push(Group {
                        key_values,
                        rows: vec![row],
                    });
                }
            }
        }

        Ok(GroupedTable {
            table: self.clone(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            groups,
        })
    }
}

impl GroupedTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Row indices of the group at `index`, in table order.
    pub fn group_rows(&self, index: usize) -> Option<&[usize]> {
        self.groups.get(index).map(|g| g.rows.as_slice())
    }

    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Drop the grouping, keeping the underlying table.
    pub fn into_table(self) -> Table {
        self.table
    }
}

impl std::fmt::Debug for GroupedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GroupedTable {{ table: '{}', keys: {:?}, groups: {} }}",
            self.table.name(),
            self.keys,
            self.groups.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species_table() -> Table {
        Table::from_csv(
            "iris",
            "species,size\nsetosa,1.4\nvirginica,6.0\nsetosa,1.3\nversicolor,4.7\nvirginica,5.1",
        )
        .unwrap()
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let grouped = species_table().group_by(&["species"]).unwrap();
        assert_eq!(grouped.num_groups(), 3);

        let first_keys: Vec<&str> = grouped
            .groups()
            .iter()
            .map(|g| g.key_values[0].as_string().unwrap())
            .collect();
        assert_eq!(first_keys, vec!["setosa", "virginica", "versicolor"]);
    }

    #[test]
    fn test_group_sizes_sum_to_row_count() {
        let table = species_table();
        let grouped = table.group_by(&["species"]).unwrap();

        let total: usize = grouped.groups().iter().map(|g| g.rows.len()).sum();
        assert_eq!(total, table.len());

        // groups are disjoint
        let mut all_rows: Vec<usize> = grouped
            .groups()
            .iter()
            .flat_map(|g| g.rows.iter().copied())
            .collect();
        all_rows.sort();
        all_rows.dedup();
        assert_eq!(all_rows.len(), table.len());
    }

    #[test]
    fn test_group_by_unknown_column() {
        let err = species_table().group_by(&["color"]).unwrap_err();
        assert_eq!(err, FrameError::ColumnNotFound("color".to_string()));
    }

    #[test]
    fn test_group_by_multiple_keys() {
        let csv = "a,b\n1,x\n1,y\n2,x\n1,x";
        let table = Table::from_csv("t", csv).unwrap();
        let grouped = table.group_by(&["a", "b"]).unwrap();

        assert_eq!(grouped.num_groups(), 3);
        assert_eq!(grouped.group_rows(0), Some(&[0usize, 3][..]));
    }

    #[test]
    fn test_group_by_null_is_its_own_key() {
        let csv = "k,v\nred,1\n,2\nred,3\n,4";
        let table = Table::from_csv("t", csv).unwrap();
        let grouped = table.group_by(&["k"]).unwrap();

        assert_eq!(grouped.num_groups(), 2);
        assert_eq!(grouped.group_rows(1), Some(&[1usize, 3][..]));
    }

    #[test]
    fn test_group_by_no_keys() {
        assert!(species_table().group_by(&[]).is_err());
    }
}
