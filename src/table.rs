// Flat input table: the tabular data the engine aggregates.
//
// Upstream collaborators (topic models, classifiers, CSV loaders) produce one
// row per verbatim with a string value per column. Missing cells are kept as
// None so the hierarchy builder can skip them the way a group-by drops
// missing keys.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{EngineError, Result};

/// An immutable-once-built table of string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Which level to report when a label occurs in several level columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSearch {
    /// First (least granular) level containing the label
    Highest,
    /// Last (most granular) level containing the label
    Lowest,
}

/// Restricts a table to the rows whose `column` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    pub column: String,
    pub value: String,
}

impl ClassFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Build an optional filter from a possibly-partial pair.
    ///
    /// Both unset means "no filter". Exactly one set is a caller error and
    /// fails before any computation happens.
    pub fn from_parts(column: Option<String>, value: Option<String>) -> Result<Option<Self>> {
        match (column, value) {
            (Some(column), Some(value)) => Ok(Some(Self { column, value })),
            (None, None) => Ok(None),
            (column, value) => Err(EngineError::InvalidClassFilter { column, value }),
        }
    }
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor from string slices. Every cell is present.
    pub fn from_rows(columns: &[&str], rows: &[Vec<&str>]) -> Result<Self> {
        let mut table = Self::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|c| Some(c.to_string())).collect())?;
        }
        Ok(table)
    }

    /// Parse a JSON array of flat objects (one object per row).
    ///
    /// Columns are collected in first-seen order across all records (keys
    /// within one record come out of serde_json sorted). Numbers
    /// and booleans are stringified; `null` and absent keys become missing
    /// cells. Nested arrays or objects are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| EngineError::MalformedInput(format!("invalid JSON: {e}")))?;

        let records = match value {
            Value::Array(records) => records,
            _ => {
                return Err(EngineError::MalformedInput(
                    "expected a JSON array of objects".to_string(),
                ))
            }
        };

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut parsed: Vec<HashMap<usize, String>> = Vec::with_capacity(records.len());

        for (i, record) in records.into_iter().enumerate() {
            let Value::Object(map) = record else {
                return Err(EngineError::MalformedInput(format!(
                    "record {i} is not a JSON object"
                )));
            };

            let mut cells = HashMap::new();
            for (key, cell) in map {
                let col = *index.entry(key.clone()).or_insert_with(|| {
                    columns.push(key.clone());
                    columns.len() - 1
                });
                match cell {
                    Value::Null => {}
                    Value::String(s) => {
                        cells.insert(col, s);
                    }
                    Value::Number(n) => {
                        cells.insert(col, n.to_string());
                    }
                    Value::Bool(b) => {
                        cells.insert(col, b.to_string());
                    }
                    Value::Array(_) | Value::Object(_) => {
                        return Err(EngineError::MalformedInput(format!(
                            "record {i}, column {key:?}: nested values are not supported"
                        )));
                    }
                }
            }
            parsed.push(cells);
        }

        let width = columns.len();
        let rows = parsed
            .into_iter()
            .map(|mut cells| (0..width).map(|col| cells.remove(&col)).collect())
            .collect();

        Ok(Self { columns, rows })
    }

    /// Append a row. Its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EngineError::MalformedInput(format!(
                "row has {} cells but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Total number of rows, including rows with missing cells.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Iterate the non-missing values of one column.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().filter_map(move |row| row[col].as_deref())
    }

    /// Values of the given columns for every row, missing cells included.
    pub fn tuples(&self, cols: &[usize]) -> Vec<Vec<Option<&str>>> {
        self.rows
            .iter()
            .map(|row| cols.iter().map(|&c| row[c].as_deref()).collect())
            .collect()
    }

    /// Values of the given columns for each row that has all of them present.
    pub fn complete_tuples(&self, cols: &[usize]) -> Vec<Vec<&str>> {
        self.tuples(cols)
            .into_iter()
            .filter_map(|tuple| tuple.into_iter().collect())
            .collect()
    }

    /// Occurrence count of each distinct value in a column.
    pub fn value_counts(&self, col: usize) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for value in self.column_values(col) {
            *counts.entry(value).or_insert(0) += 1;
        }
        counts
    }

    /// A new table holding only the rows that match the filter.
    pub fn filter(&self, filter: &ClassFilter) -> Result<Self> {
        let col = self.column_index(&filter.column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row[col].as_deref() == Some(filter.value.as_str()))
            .cloned()
            .collect();
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Find which of `levels` contains `label` as a value.
    ///
    /// Returns `None` when no level column contains it. Level names that are
    /// not columns of this table are skipped.
    pub fn find_level<'a>(
        &self,
        label: &str,
        levels: &'a [String],
        search: LevelSearch,
    ) -> Option<&'a str> {
        let mut found = levels.iter().filter(|level| {
            self.column_index(level)
                .map(|col| self.column_values(col).any(|v| v == label))
                .unwrap_or(false)
        });
        let level = match search {
            LevelSearch::Highest => found.next(),
            LevelSearch::Lowest => found.last(),
        };
        level.map(String::as_str)
    }
}
