//! Named derived columns aligned with a price series

use crate::{Result, SeriesError};
use serde::Serialize;
use std::collections::BTreeMap;

/// One derived column; `None` marks positions without enough history
pub type Column = Vec<Option<f64>>;

/// Named mapping of derived columns, all of the same length
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IndicatorSet {
    len: usize,
    columns: BTreeMap<String, Column>,
}

impl IndicatorSet {
    /// Empty set for a series of `len` bars
    pub fn new(len: usize) -> Self {
        Self {
            len,
            columns: BTreeMap::new(),
        }
    }

    /// Add or replace a column, enforcing alignment with the series
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.len {
            return Err(SeriesError::Misaligned {
                name,
                expected: self.len,
                actual: column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Length of the source series
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value at the last position, if defined
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.columns.get(name).and_then(|c| c.last().copied().flatten())
    }

    /// Value at the second to last position, if defined
    pub fn previous(&self, name: &str) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|c| c.len().checked_sub(2).and_then(|i| c[i]))
    }

    /// Whether the column exists and has at least one defined value
    pub fn has_values(&self, name: &str) -> bool {
        self.columns
            .get(name)
            .is_some_and(|c| c.iter().any(Option::is_some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_enforces_alignment() {
        let mut set = IndicatorSet::new(3);
        set.insert("ma_2", vec![None, Some(1.5), Some(2.5)]).unwrap();
        let err = set.insert("ma_3", vec![None, None]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::Misaligned {
                name: "ma_3".to_string(),
                expected: 3,
                actual: 2,
            }
        );
        assert!(!set.contains("ma_3"));
    }

    #[test]
    fn test_latest_and_previous() {
        let mut set = IndicatorSet::new(3);
        set.insert("x", vec![None, Some(1.0), Some(2.0)]).unwrap();
        set.insert("y", vec![None, None, None]).unwrap();

        assert_eq!(set.latest("x"), Some(2.0));
        assert_eq!(set.previous("x"), Some(1.0));
        assert_eq!(set.latest("y"), None);
        assert!(set.has_values("x"));
        assert!(!set.has_values("y"));
        assert!(set.contains("y"));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_previous_on_short_columns() {
        let mut set = IndicatorSet::new(1);
        set.insert("x", vec![Some(1.0)]).unwrap();
        assert_eq!(set.previous("x"), None);
    }
}
