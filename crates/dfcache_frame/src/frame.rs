//! In-memory tabular datasets: ordered, named, typed columns.

use std::collections::HashSet;
use std::fmt;

use dfcache_common::{ContentHash, ContentHasher};
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// The element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 64-bit signed integers.
    Int64,
    /// 64-bit floats.
    Float64,
    /// Booleans.
    Bool,
    /// UTF-8 strings.
    Utf8,
}

impl DType {
    /// Returns the lowercase type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Utf8 => "utf8",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            DType::Int64 => 0,
            DType::Float64 => 1,
            DType::Bool => 2,
            DType::Utf8 => 3,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cells of one column. Every cell is nullable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    /// Integer cells.
    Int64(Vec<Option<i64>>),
    /// Float cells.
    Float64(Vec<Option<f64>>),
    /// Boolean cells.
    Bool(Vec<Option<bool>>),
    /// String cells.
    Utf8(Vec<Option<String>>),
}

impl ColumnData {
    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
        }
    }

    /// Returns `true` if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element type.
    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Int64(_) => DType::Int64,
            ColumnData::Float64(_) => DType::Float64,
            ColumnData::Bool(_) => DType::Bool,
            ColumnData::Utf8(_) => DType::Utf8,
        }
    }

    /// Feeds every cell into `hasher` as `presence byte + fixed encoding`.
    fn hash_cells(&self, hasher: &mut ContentHasher) {
        match self {
            ColumnData::Int64(v) => {
                for x in v {
                    match x {
                        Some(i) => {
                            hasher.update(&[1]);
                            hasher.update(&i.to_le_bytes());
                        }
                        None => hasher.update(&[0]),
                    }
                }
            }
            ColumnData::Float64(v) => {
                for x in v {
                    match x {
                        Some(f) => {
                            hasher.update(&[1]);
                            hasher.update(&f.to_bits().to_le_bytes());
                        }
                        None => hasher.update(&[0]),
                    }
                }
            }
            ColumnData::Bool(v) => {
                for x in v {
                    match x {
                        Some(b) => hasher.update(&[1, *b as u8]),
                        None => hasher.update(&[0]),
                    }
                }
            }
            ColumnData::Utf8(v) => {
                for x in v {
                    match x {
                        Some(s) => {
                            hasher.update(&[1]);
                            hasher.update(&(s.len() as u64).to_le_bytes());
                            hasher.update(s.as_bytes());
                        }
                        None => hasher.update(&[0]),
                    }
                }
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Creates a column from raw (nullable) cell data.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Creates a non-null integer column.
    pub fn int64(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, ColumnData::Int64(values.into_iter().map(Some).collect()))
    }

    /// Creates a non-null float column.
    pub fn float64(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, ColumnData::Float64(values.into_iter().map(Some).collect()))
    }

    /// Creates a non-null boolean column.
    pub fn boolean(name: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self::new(name, ColumnData::Bool(values.into_iter().map(Some).collect()))
    }

    /// Creates a non-null string column.
    pub fn utf8<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            ColumnData::Utf8(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cells.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Returns the element type.
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A table of equally long, uniquely named columns in a fixed order.
///
/// Equality compares column order, names, types and cells. Float cells
/// compare with IEEE semantics, so a frame containing `NaN` is not equal to
/// itself; [`content_hash`](Self::content_hash) compares bit patterns and is
/// the right tool for identity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    /// Assembles a frame, checking column lengths and name uniqueness.
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        Self::validate(&columns)?;
        Ok(Self { columns })
    }

    /// Re-checks invariants on a frame built by deserialization.
    pub(crate) fn validated(self) -> Result<Self, FrameError> {
        Self::validate(&self.columns)?;
        Ok(self)
    }

    fn validate(columns: &[Column]) -> Result<(), FrameError> {
        let mut seen = HashSet::with_capacity(columns.len());
        let expected = columns.first().map_or(0, Column::len);
        for col in columns {
            if !seen.insert(col.name.as_str()) {
                return Err(FrameError::DuplicateColumn(col.name.clone()));
            }
            if col.len() != expected {
                return Err(FrameError::LengthMismatch {
                    column: col.name.clone(),
                    expected,
                    actual: col.len(),
                });
            }
        }
        Ok(())
    }

    /// Creates a frame with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Returns `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.columns.len())
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns all columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Returns the column types in order.
    pub fn dtypes(&self) -> Vec<DType> {
        self.columns.iter().map(Column::dtype).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Hashes the cell data of every column.
    ///
    /// Two frames with the same cells in the same column layout hash equal,
    /// wherever they live in memory. Column names are not part of this hash.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        for col in &self.columns {
            hasher.update(&[col.dtype().tag()]);
            hasher.update(&(col.len() as u64).to_le_bytes());
            col.data.hash_cells(&mut hasher);
        }
        hasher.finish()
    }
}
