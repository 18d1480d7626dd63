//! Column-oriented in-memory tables.
//!
//! A [`Table`] is an ordered list of equal-length, uniquely named [`Column`]s.
//! Every operation returns a new table; inputs are never mutated, so tables can
//! be shared freely between concurrently running verbs.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{DocGraphError, Result};
use crate::value::{JoinKey, Value};

/// Label used in [`DocGraphError::MissingColumn`] raised by table operations.
const TABLE_LABEL: &str = "table";

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Serialized shape of a [`Table`]; re-validated on the way in.
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for Table {
    type Error = DocGraphError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::from_columns(raw.columns)
    }
}

/// An immutable, column-oriented table.
///
/// Serializes as `{"columns": [{"name": "...", "values": [...]}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// An empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking that names are unique and lengths agree.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DocGraphError::validation(format!(
                    "duplicate column name \"{}\"",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            if let Some(ragged) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(DocGraphError::validation(format!(
                    "column \"{}\" has {} rows, expected {}",
                    ragged.name,
                    ragged.len(),
                    first.len()
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Build a table from row-major data.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        if names.is_empty() && !rows.is_empty() {
            return Err(DocGraphError::validation(format!(
                "{} rows given without any column names",
                rows.len()
            )));
        }

        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column::new(*name, Vec::with_capacity(rows.len())))
            .collect();

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(DocGraphError::validation(format!(
                    "row {i} has {} cells, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Self::from_columns(columns)
    }

    // -- schema queries ----------------------------------------------------

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Table::column`], but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| DocGraphError::missing_column(TABLE_LABEL, name))
    }

    /// The cell at `row` in column `name`, if both exist.
    pub fn value(&self, name: &str, row: usize) -> Option<&Value> {
        self.column(name).and_then(|c| c.values.get(row))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    // -- projections -------------------------------------------------------

    /// Keep only `names`, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.require_column(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Self::from_columns(columns)
    }

    /// Remove the named columns. Names that do not exist are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Table {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Rename columns by `(from, to)` pairs. Every `from` must exist.
    pub fn rename(&self, mapping: &[(&str, &str)]) -> Result<Table> {
        for (from, _) in mapping {
            self.require_column(from)?;
        }

        let columns = self
            .columns
            .iter()
            .map(|c| {
                let name = mapping
                    .iter()
                    .find(|(from, _)| *from == c.name)
                    .map_or(c.name.as_str(), |(_, to)| *to);
                Column::new(name, c.values.clone())
            })
            .collect();

        Self::from_columns(columns)
    }

    /// Add `column`, replacing an existing column of the same name in place.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        let mut out = self.clone();
        out.upsert(column)?;
        Ok(out)
    }

    /// Replace every null cell in `name` with `fill`.
    pub fn fill_null(&self, name: &str, fill: &Value) -> Result<Table> {
        let column = self.require_column(name)?;
        let values = column
            .values
            .iter()
            .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
            .collect();
        self.with_column(Column::new(name, values))
    }

    fn upsert(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.num_rows() {
            return Err(DocGraphError::validation(format!(
                "column \"{}\" has {} rows, table has {}",
                column.name,
                column.len(),
                self.num_rows()
            )));
        }

        match self.position(&column.name) {
            Some(i) => self.columns[i] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    // -- relational operations ---------------------------------------------

    /// Left join `right` onto `self`, matching `left_on` against `right_on`.
    ///
    /// Every left row appears exactly once and in its original order. The
    /// right side is looked up by the first row carrying each key, so
    /// duplicate right keys never fan out. Unmatched rows get `Null`.
    ///
    /// All right columns except `right_on` are appended; one whose name is
    /// already on the left replaces that column in place.
    pub fn left_join(&self, right: &Table, left_on: &str, right_on: &str) -> Result<Table> {
        let left_keys = self.require_column(left_on)?;
        let right_keys = right.require_column(right_on)?;

        let mut index: HashMap<JoinKey, usize> = HashMap::with_capacity(right_keys.len());
        for (row, value) in right_keys.values.iter().enumerate() {
            if let Some(key) = value.join_key() {
                index.entry(key).or_insert(row);
            }
        }

        let matches: Vec<Option<usize>> = left_keys
            .values
            .iter()
            .map(|v| v.join_key().and_then(|k| index.get(&k).copied()))
            .collect();

        let mut out = self.clone();
        for column in right.columns.iter().filter(|c| c.name != right_on) {
            let values = matches
                .iter()
                .map(|m| m.map_or(Value::Null, |row| column.values[row].clone()))
                .collect();
            out.upsert(Column::new(column.name.clone(), values))?;
        }

        Ok(out)
    }

    /// Expand list cells in `name` into one row per element.
    ///
    /// Scalars pass through unchanged; an empty list becomes a single row
    /// holding `Null`, so no row disappears.
    pub fn explode(&self, name: &str) -> Result<Table> {
        let target = self.require_column(name)?;

        let mut sources: Vec<usize> = Vec::with_capacity(target.len());
        let mut exploded: Vec<Value> = Vec::with_capacity(target.len());
        for (row, value) in target.values.iter().enumerate() {
            match value {
                Value::List(items) if !items.is_empty() => {
                    for item in items {
                        sources.push(row);
                        exploded.push(item.clone());
                    }
                }
                Value::List(_) => {
                    sources.push(row);
                    exploded.push(Value::Null);
                }
                other => {
                    sources.push(row);
                    exploded.push(other.clone());
                }
            }
        }

        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.name == name {
                    Column::new(name, exploded.clone())
                } else {
                    Column::new(
                        c.name.clone(),
                        sources.iter().map(|&row| c.values[row].clone()).collect(),
                    )
                }
            })
            .collect();

        Ok(Self { columns })
    }

    /// Group rows by `key`, collecting `value` cells into a list per group.
    ///
    /// Groups appear in order of first appearance and each list keeps table
    /// order. Rows whose key is not joinable (e.g. `Null`) are skipped. The
    /// result has two columns: `key` and `value` (now list-valued).
    pub fn group_collect(&self, key: &str, value: &str) -> Result<Table> {
        let keys = self.require_column(key)?;
        let values = self.require_column(value)?;

        let mut slots: HashMap<JoinKey, usize> = HashMap::new();
        let mut group_keys: Vec<Value> = Vec::new();
        let mut group_values: Vec<Vec<Value>> = Vec::new();

        for (k, v) in keys.values.iter().zip(&values.values) {
            let Some(join_key) = k.join_key() else {
                continue;
            };
            let slot = *slots.entry(join_key).or_insert_with(|| {
                group_keys.push(k.clone());
                group_values.push(Vec::new());
                group_keys.len() - 1
            });
            group_values[slot].push(v.clone());
        }

        let value_name = if key == value {
            format!("{value}_list")
        } else {
            value.to_string()
        };

        Self::from_columns(vec![
            Column::new(key, group_keys),
            Column::new(value_name, group_values.into_iter().map(Value::List).collect()),
        ])
    }

    /// Number of rows whose joinable `name` value already appeared earlier.
    pub fn duplicate_keys(&self, name: &str) -> Result<usize> {
        let column = self.require_column(name)?;
        let mut seen = HashSet::new();
        Ok(column
            .values
            .iter()
            .filter_map(Value::join_key)
            .filter(|k| !seen.insert(k.clone()))
            .count())
    }
}
