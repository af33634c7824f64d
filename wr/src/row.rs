//! Row - an ordered record of named column values

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::Value;

/// One record of named, dynamically typed column values
///
/// Column order is preserved. Names are unique within a row at any instant:
/// `add_or_set` overwrites an existing column instead of appending a second one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and readers
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_or_set(name, value);
        self
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the first column with the given name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    /// Value of the named column
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.find(name).map(|idx| &self.columns[idx].1)
    }

    pub fn value_mut(&mut self, name: &str) -> Option<&mut Value> {
        let idx = self.find(name)?;
        Some(&mut self.columns[idx].1)
    }

    /// Append a new column, or overwrite the first column with this name
    pub fn add_or_set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.find(&name) {
            Some(idx) => self.columns[idx].1 = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Rename the column at a position
    ///
    /// Fails (returning false) when another column already holds `new_name`.
    pub fn rename(&mut self, idx: usize, new_name: impl Into<String>) -> bool {
        let new_name = new_name.into();
        if idx >= self.columns.len() {
            return false;
        }
        if let Some(existing) = self.find(&new_name)
            && existing != idx
        {
            return false;
        }
        self.columns[idx].0 = new_name;
        true
    }

    /// Remove the column at a position, returning its value
    pub fn remove(&mut self, idx: usize) -> Option<(String, Value)> {
        if idx < self.columns.len() {
            Some(self.columns.remove(idx))
        } else {
            None
        }
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of column names to values")
    }

    // Entries are visited in input order, which keeps column order intact.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Row, A::Error> {
        let mut row = Row::new();
        while let Some((name, value)) = map.next_entry::<String, Value>()? {
            row.add_or_set(name, value);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}
