//! Case-insensitive, order-preserving header storage shared by both adapters.
//!
//! # Design
//! Names are matched with ASCII case folding but stored with the casing they
//! were first seen with, so enumeration reproduces what the caller wrote.
//! Entries live in a `Vec` to keep insertion order without pulling in an
//! ordered map; header counts are small enough that a linear scan wins.
//!
//! The stored value type is generic. Requests keep one list of strings per
//! name. Responses keep whatever the host handed over: either a single
//! comma-joined line or a list. `HeaderStorage` lets both render the same
//! logical list of values.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Separator used to join values into a header line and to split a line back.
pub const LINE_SEPARATOR: &str = ", ";

/// A value representation that can stand for a list of header values.
pub trait HeaderStorage: Clone {
    /// Build a stored value from a list of values.
    fn from_values(values: Vec<String>) -> Self;

    /// The logical list of values.
    fn values(&self) -> Vec<String>;

    /// Append one value, without de-duplication.
    fn append(&mut self, value: String);

    /// The values joined into one line.
    fn line(&self) -> String {
        self.values().join(LINE_SEPARATOR)
    }
}

impl HeaderStorage for Vec<String> {
    fn from_values(values: Vec<String>) -> Self {
        values
    }

    fn values(&self) -> Vec<String> {
        self.clone()
    }

    fn append(&mut self, value: String) {
        self.push(value);
    }
}

/// A native response header value: a single line or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// One string, possibly holding several values joined with `", "`.
    Line(String),
    /// Distinct values.
    List(Vec<String>),
}

impl HeaderStorage for HeaderValue {
    fn from_values(values: Vec<String>) -> Self {
        HeaderValue::Line(values.join(LINE_SEPARATOR))
    }

    fn values(&self) -> Vec<String> {
        match self {
            HeaderValue::Line(line) if line.is_empty() => Vec::new(),
            HeaderValue::Line(line) => line.split(LINE_SEPARATOR).map(String::from).collect(),
            HeaderValue::List(values) => values.clone(),
        }
    }

    fn append(&mut self, value: String) {
        match self {
            HeaderValue::Line(line) if line.is_empty() => *line = value,
            HeaderValue::Line(line) => {
                line.push_str(LINE_SEPARATOR);
                line.push_str(&value);
            }
            HeaderValue::List(values) => values.push(value),
        }
    }

    fn line(&self) -> String {
        match self {
            HeaderValue::Line(line) => line.clone(),
            HeaderValue::List(values) => values.join(LINE_SEPARATOR),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(line: &str) -> Self {
        HeaderValue::Line(line.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(line: String) -> Self {
        HeaderValue::Line(line)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::List(values)
    }
}

/// Anything accepted where a header value is expected: one value or several.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(String::from).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl IntoHeaderValues for &[String] {
    fn into_header_values(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

/// Ordered header entries with case-insensitive name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCollection<V = Vec<String>> {
    entries: Vec<(String, V)>,
}

/// Request-side headers: one list of values per name.
pub type Headers = HeaderCollection<Vec<String>>;

/// Response-side headers in their native representation.
pub type NativeHeaders = HeaderCollection<HeaderValue>;

impl<V> Default for HeaderCollection<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V: HeaderStorage> HeaderCollection<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Replace every value of `name`. An existing entry keeps its casing and
    /// position.
    pub fn set(&mut self, name: &str, values: impl IntoHeaderValues) {
        self.set_value(name, V::from_values(values.into_header_values()));
    }

    /// Store `value` under `name` as-is.
    pub fn set_value(&mut self, name: &str, value: V) {
        match self.position(name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Store `value` under `name` as the first entry, reusing the casing of an
    /// existing entry for the same name.
    pub fn set_first(&mut self, name: &str, value: V) {
        let name = match self.position(name) {
            Some(i) => self.entries.remove(i).0,
            None => name.to_string(),
        };
        self.entries.insert(0, (name, value));
    }

    /// Append one value to `name`, creating the entry if needed.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(i) => self.entries[i].1.append(value),
            None => self
                .entries
                .push((name.to_string(), V::from_values(vec![value]))),
        }
    }

    /// Delete `name` entirely and return what was stored.
    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// The stored value for `name`.
    pub fn value(&self, name: &str) -> Option<&V> {
        self.position(name).map(|i| &self.entries[i].1)
    }

    /// The values of `name`; empty when absent.
    pub fn get(&self, name: &str) -> Vec<String> {
        self.value(name).map(HeaderStorage::values).unwrap_or_default()
    }

    /// The values of `name` joined with `", "`; empty when absent.
    pub fn get_line(&self, name: &str) -> String {
        self.value(name).map(HeaderStorage::line).unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The stored casing of `name`, if present.
    pub fn original_name(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].0.as_str())
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry rendered as a list of values.
    pub fn to_lists(&self) -> Headers {
        HeaderCollection {
            entries: self
                .entries
                .iter()
                .map(|(n, v)| (n.clone(), v.values()))
                .collect(),
        }
    }
}

impl<V: HeaderStorage, K: AsRef<str>, I: IntoHeaderValues> FromIterator<(K, I)>
    for HeaderCollection<V>
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, values) in iter {
            headers.set(name.as_ref(), values);
        }
        headers
    }
}

impl<V: Serialize> Serialize for HeaderCollection<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct HeaderVisitor<V>(PhantomData<V>);

impl<'de, V: HeaderStorage + Deserialize<'de>> Visitor<'de> for HeaderVisitor<V> {
    type Value = HeaderCollection<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of header names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut headers = HeaderCollection::new();
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            headers.set_value(&name, value);
        }
        Ok(headers)
    }
}

impl<'de, V: HeaderStorage + Deserialize<'de>> Deserialize<'de> for HeaderCollection<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderVisitor(PhantomData))
    }
}
