//! Raw, partially-typed record batches as handed over by a record source.

use std::fmt;
use std::hash::{Hash, Hasher};

/// One raw cell. `Missing` stands in for an absent or empty value.
#[derive(Debug, Clone, Default)]
pub enum RawValue {
    #[default]
    Missing,
    Text(String),
    Number(f64),
}

impl RawValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Numeric reading of the cell. Text is trimmed and parsed; anything that
    /// is not a finite number yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            RawValue::Missing => return None,
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// Numbers compare by bit pattern so that identical rows always collapse,
// NaN included.
impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RawValue::Missing, RawValue::Missing) => true,
            (RawValue::Text(a), RawValue::Text(b)) => a == b,
            (RawValue::Number(a), RawValue::Number(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for RawValue {}

impl Hash for RawValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RawValue::Missing => state.write_u8(0),
            RawValue::Text(s) => {
                state.write_u8(1);
                s.hash(state);
            }
            RawValue::Number(n) => {
                state.write_u8(2);
                n.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Missing => Ok(()),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

/// The columns a price batch may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Symbol,
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub const COUNT: usize = 7;

    pub const ALL: [Column; Column::COUNT] = [
        Column::Symbol,
        Column::Date,
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    /// Columns without which a batch is rejected outright.
    pub const REQUIRED: [Column; 5] = [
        Column::Symbol,
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Symbol => "symbol",
            Column::Date => "date",
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }

    /// Case-insensitive lookup of a header name.
    pub fn from_name(name: &str) -> Option<Column> {
        let name = name.trim().to_ascii_lowercase();
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One raw row. Cells of columns the batch does not carry stay `Missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawRecord {
    cells: [RawValue; Column::COUNT],
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: Column, value: impl Into<RawValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: Column) -> &RawValue {
        &self.cells[column.index()]
    }

    pub fn set(&mut self, column: Column, value: impl Into<RawValue>) {
        self.cells[column.index()] = value.into();
    }
}

/// Columns present plus rows in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    columns: Vec<Column>,
    rows: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut present: Vec<Column> = Vec::new();
        for column in columns {
            if !present.contains(&column) {
                present.push(column);
            }
        }
        Self {
            columns: present,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = RawRecord>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn push(&mut self, row: RawRecord) {
        self.rows.push(row);
    }

    pub fn add_column(&mut self, column: Column) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends another batch, unioning the column sets.
    pub fn extend(&mut self, other: RawBatch) {
        for column in other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
    }
}
