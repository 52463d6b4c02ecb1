//! Nested key/value documents exchanged with the solver
//!
//! A [Group] is the in-memory form of the settings and output files. Every settings entity has an
//! explicit encoder and decoder to and from a [Group]; decoding goes through the typed accessors
//! here, so that absent keys always surface as [SettingsError::MissingField] and keys holding
//! the wrong kind of value as [SettingsError::Consistency].

use std::collections::{btree_map, BTreeMap};

use ndarray::ArrayD;

use crate::error::SettingsError;

/// HDF5 backed persistence of documents
#[cfg(feature = "hdf5")]
pub mod hdf5;

/// A single entry in a [Group]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer scalar, used for discriminants, counts and flags
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Array of any dimension
    Array(ArrayD<f64>),
    /// Nested group
    Group(Group),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Int(_) => "an integer",
            Value::Float(_) => "a float",
            Value::Array(_) => "an array",
            Value::Group(_) => "a group",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(value: ArrayD<f64>) -> Self {
        Value::Array(value)
    }
}

impl From<Group> for Value {
    fn from(value: Group) -> Self {
        Value::Group(value)
    }
}

/// Ordered map from names to [Value]s.
///
/// A group remembers the path it was decoded from, which is prefixed to the names in errors.
#[derive(Debug, Clone, Default)]
pub struct Group {
    path: String,
    entries: BTreeMap<String, Value>,
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Group {
    /// Empty root group
    pub fn new() -> Group {
        Group::default()
    }

    /// Set `name` to `value`, replacing any previous entry
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        let mut value = value.into();
        if let Value::Group(group) = &mut value {
            group.rebase(&self.child_path(name));
        }
        self.entries.insert(name.to_owned(), value);
    }

    /// Builder style variant of [Group::insert]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Group {
        self.insert(name, value);
        self
    }

    /// Whether an entry called `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Raw access to an entry
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Iterate over the entries in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the group has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of this group from the document root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of an entry in this group
    pub fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_owned()
        } else {
            format!("{}/{}", self.path, name)
        }
    }

    fn rebase(&mut self, path: &str) {
        self.path = path.to_owned();
        for (name, value) in self.entries.iter_mut() {
            if let Value::Group(group) = value {
                group.rebase(&format!("{path}/{name}"));
            }
        }
    }

    fn require(&self, name: &str) -> Result<&Value, SettingsError> {
        self.entries
            .get(name)
            .ok_or_else(|| SettingsError::MissingField(self.child_path(name)))
    }

    fn mistyped(&self, name: &str, expected: &str, got: &Value) -> SettingsError {
        SettingsError::consistency(
            self.child_path(name),
            format!("expected {expected}, found {}", got.describe()),
        )
    }

    /// Integer entry. Single element arrays are accepted as long as they hold an integral value.
    pub fn int(&self, name: &str) -> Result<i64, SettingsError> {
        match self.require(name)? {
            Value::Int(value) => Ok(*value),
            Value::Array(array) if array.len() == 1 => {
                let value = array.iter().next().copied().unwrap_or(f64::NAN);
                if value.fract() == 0. && value.is_finite() {
                    Ok(value as i64)
                } else {
                    Err(self.mistyped(name, "an integer", &Value::Float(value)))
                }
            }
            other => Err(self.mistyped(name, "an integer", other)),
        }
    }

    /// Floating point entry. Integers and single element arrays are widened.
    pub fn float(&self, name: &str) -> Result<f64, SettingsError> {
        match self.require(name)? {
            Value::Float(value) => Ok(*value),
            Value::Int(value) => Ok(*value as f64),
            Value::Array(array) if array.len() == 1 => {
                Ok(array.iter().next().copied().unwrap_or(f64::NAN))
            }
            other => Err(self.mistyped(name, "a float", other)),
        }
    }

    /// Array entry. Scalars are promoted to zero-dimensional arrays.
    pub fn array(&self, name: &str) -> Result<ArrayD<f64>, SettingsError> {
        match self.require(name)? {
            Value::Array(array) => Ok(array.clone()),
            Value::Float(value) => Ok(ndarray::arr0(*value).into_dyn()),
            Value::Int(value) => Ok(ndarray::arr0(*value as f64).into_dyn()),
            other => Err(self.mistyped(name, "an array", other)),
        }
    }

    /// Nested group entry
    pub fn group(&self, name: &str) -> Result<&Group, SettingsError> {
        match self.require(name)? {
            Value::Group(group) => Ok(group),
            other => Err(self.mistyped(name, "a group", other)),
        }
    }

    /// Like [Group::int], but absent entries are `None`
    pub fn optional_int(&self, name: &str) -> Result<Option<i64>, SettingsError> {
        self.contains(name).then(|| self.int(name)).transpose()
    }

    /// Like [Group::float], but absent entries are `None`
    pub fn optional_float(&self, name: &str) -> Result<Option<f64>, SettingsError> {
        self.contains(name).then(|| self.float(name)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, ArrayD};

    use super::{Group, Value};
    use crate::error::SettingsError;

    fn sample() -> Group {
        Group::new().with("type", 1i64).with(
            "data",
            Group::new()
                .with("x", arr1(&[1., 2.]).into_dyn())
                .with("t", 0.5),
        )
    }

    #[test]
    fn nested_paths_are_tracked() {
        let root = Group::new().with("eqsys", Group::new().with("E_field", sample()));
        let data = root
            .group("eqsys")
            .and_then(|g| g.group("E_field"))
            .and_then(|g| g.group("data"))
            .unwrap();

        assert_eq!(data.path(), "eqsys/E_field/data");
        assert_eq!(
            data.array("r"),
            Err(SettingsError::MissingField("eqsys/E_field/data/r".into()))
        );
    }

    #[test]
    fn scalars_are_widened() {
        let group = sample();

        assert_eq!(group.float("type"), Ok(1.));
        assert_eq!(
            group.group("data").unwrap().array("t"),
            Ok(ndarray::arr0(0.5).into_dyn())
        );
    }

    #[test]
    fn wrong_kind_is_a_consistency_error() {
        let group = sample();

        assert!(matches!(group.int("data"), Err(SettingsError::Consistency(..))));
        assert!(matches!(group.group("type"), Err(SettingsError::Consistency(..))));
    }

    #[test]
    fn single_element_arrays_read_as_integers() {
        let group = Group::new()
            .with("nt", ArrayD::from_elem(vec![1], 20.))
            .with("dt", ArrayD::from_elem(vec![1], 0.5));

        assert_eq!(group.int("nt"), Ok(20));
        assert!(matches!(group.int("dt"), Err(SettingsError::Consistency(..))));
    }

    #[test]
    fn optional_entries() {
        let group = sample();

        assert_eq!(group.optional_int("type"), Ok(Some(1)));
        assert_eq!(group.optional_float("reltol"), Ok(None));
        assert_eq!(group.get("type"), Some(&Value::Int(1)));
    }
}
