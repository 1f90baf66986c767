//! Scalar-or-list values
//!
//! CWL writes many list-valued fields as a bare scalar when they hold a
//! single element (`source: reads` vs `source: [reads, more]`). Both forms
//! are accepted on input; the scalar form is emitted for one element.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Handles string OR array for glob, secondaryFiles, baseCommand, scatter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v.as_slice(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl<T: Serialize> Serialize for OneOrMany<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_slice() {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

/// Deduplicated, insertion-ordered set of connection sources.
///
/// Equality is order-independent: `{a, b} == {b, a}`.
#[derive(Debug, Clone, Default, Eq)]
pub struct SourceSet(Vec<String>);

impl SourceSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a source; returns false when it was already present.
    pub fn insert(&mut self, source: impl Into<String>) -> bool {
        let source = source.into();
        if self.0.contains(&source) {
            return false;
        }
        self.0.push(source);
        true
    }

    pub fn contains(&self, source: &str) -> bool {
        self.0.iter().any(|s| s == source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The only source, when the set holds exactly one.
    pub fn single(&self) -> Option<&str> {
        match self.0.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for SourceSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|s| other.contains(s))
    }
}

impl<S: Into<String>> FromIterator<S> for SourceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SourceSet::new();
        for source in iter {
            set.insert(source);
        }
        set
    }
}

impl Serialize for SourceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SourceSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = OneOrMany::<String>::deserialize(deserializer)?;
        Ok(raw.into_vec().into_iter().collect())
    }
}
