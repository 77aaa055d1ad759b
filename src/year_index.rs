use crate::models::{ResourcePoint, SeriesPoint, Year};
use std::collections::BTreeMap;

pub trait Yearly {
    fn year(&self) -> Year;
}

impl Yearly for SeriesPoint {
    fn year(&self) -> Year {
        self.year
    }
}

impl Yearly for ResourcePoint {
    fn year(&self) -> Year {
        self.year
    }
}

/// Rows grouped by year. Every input row lands in exactly one bucket and
/// keeps its relative order within that bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct YearIndex<T> {
    buckets: BTreeMap<Year, Vec<T>>,
}

impl<T> Default for YearIndex<T> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }
}

impl<T: Yearly> YearIndex<T> {
    pub fn build(rows: impl IntoIterator<Item = T>) -> Self {
        let mut buckets: BTreeMap<Year, Vec<T>> = BTreeMap::new();
        for row in rows {
            buckets.entry(row.year()).or_default().push(row);
        }
        Self { buckets }
    }
}

impl<T> YearIndex<T> {
    pub fn get(&self, year: Year) -> &[T] {
        self.buckets.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
impl<T> YearIndex<T> {
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All rows, year-ascending.
    pub fn rows(&self) -> impl Iterator<Item = &T> + '_ {
        self.buckets.values().flatten()
    }
}
