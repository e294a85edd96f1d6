//! Extracted output data.

use serde::{Deserialize, Serialize};

/// The marker used for a bit whose value could not be read.
pub const UNKNOWN_BIT: char = 'U';

/// One column of extracted output data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Real values: crossing times, sampled voltages or trace samples.
    Real(Vec<f64>),
    /// Bus words of `width` characters, most significant position first.
    ///
    /// Unreadable bits are [`UNKNOWN_BIT`].
    Words {
        /// Characters per word.
        width: usize,
        /// The words.
        words: Vec<String>,
    },
    /// Bus words converted to unsigned integers.
    ///
    /// `None` marks a word with unreadable bits.
    Unsigned(Vec<Option<u64>>),
}

impl Column {
    /// The number of rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Real(v) => v.len(),
            Self::Words { words, .. } => words.len(),
            Self::Unsigned(v) => v.len(),
        }
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pads the column to `len` rows with its fill value.
    ///
    /// Real columns are padded with `NaN`, words with a word of unknown bits
    /// and integers with `None`.
    pub fn pad(&mut self, len: usize) {
        match self {
            Self::Real(v) => v.resize(len.max(v.len()), f64::NAN),
            Self::Words { width, words } => {
                let filler: String = std::iter::repeat_n(UNKNOWN_BIT, *width).collect();
                words.resize(len.max(words.len()), filler);
            }
            Self::Unsigned(v) => v.resize(len.max(v.len()), None),
        }
    }

    /// Returns the real values, if this is a real column.
    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            Self::Real(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the words, if this is a word column.
    pub fn as_words(&self) -> Option<&[String]> {
        match self {
            Self::Words { words, .. } => Some(words),
            _ => None,
        }
    }

    /// Returns the integers, if this is an integer column.
    pub fn as_unsigned(&self) -> Option<&[Option<u64>]> {
        match self {
            Self::Unsigned(v) => Some(v),
            _ => None,
        }
    }
}

/// Columns of extracted data of equal length.
///
/// Appending a column of a different length pads the shorter side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    columns: Vec<Column>,
}

impl OutputData {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// The columns, in the order they were appended.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns `true` if no column has been appended.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Appends a column, padding either side to the longer length.
    pub fn append(&mut self, mut column: Column) {
        let rows = self.rows().max(column.len());
        for existing in self.columns.iter_mut() {
            existing.pad(rows);
        }
        column.pad(rows);
        self.columns.push(column);
    }
}

impl FromIterator<Column> for OutputData {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        let mut data = Self::new();
        for column in iter {
            data.append(column);
        }
        data
    }
}
