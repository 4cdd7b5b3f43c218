//! Beans: named types carrying an ordered table of properties.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// How two distinct bean instances decide whether they are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeanEquality {
    /// Equal only to itself.
    #[default]
    Identity,
    /// Equal when the named properties are equal (an id, a natural key).
    Properties(Vec<String>),
    /// Equal when the type and every property are equal.
    AllProperties,
}

impl BeanEquality {
    pub fn properties<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Properties(names.into_iter().map(Into::into).collect())
    }
}

/// An instance of a named bean type.
#[derive(Clone, Debug)]
pub struct Bean {
    type_name: String,
    properties: Vec<(String, Value)>,
    equality: BeanEquality,
}

impl Bean {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
            equality: BeanEquality::default(),
        }
    }

    /// Builder-style property assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_equality(mut self, equality: BeanEquality) -> Self {
        self.equality = equality;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn equality(&self) -> &BeanEquality {
        &self.equality
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Insert or replace a property. Properties keep their first insertion
    /// position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.properties.iter().position(|(n, _)| n == name)?;
        Some(self.properties.remove(idx).1)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(n, _)| n.as_str())
    }

    pub fn properties(&self) -> &[(String, Value)] {
        &self.properties
    }

    /// Value equality for two distinct instances. Identity beans are never
    /// equal to another instance.
    pub(crate) fn equals(&self, other: &Bean) -> bool {
        if self.type_name != other.type_name {
            return false;
        }
        match &self.equality {
            BeanEquality::Identity => false,
            BeanEquality::Properties(names) => names
                .iter()
                .all(|name| self.value_of(name) == other.value_of(name)),
            BeanEquality::AllProperties => {
                let names: BTreeSet<&str> =
                    self.property_names().chain(other.property_names()).collect();
                names
                    .into_iter()
                    .all(|name| self.value_of(name) == other.value_of(name))
            }
        }
    }

    /// Hashes the properties that take part in equality. Identity beans are
    /// hashed by address in [`Value`]'s `Hash` impl.
    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        match &self.equality {
            BeanEquality::Identity => {}
            BeanEquality::Properties(names) => {
                for name in names {
                    self.value_of(name).hash(state);
                }
            }
            BeanEquality::AllProperties => {
                let mut sorted: Vec<&(String, Value)> = self
                    .properties
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                for (name, value) in sorted {
                    name.hash(state);
                    value.hash(state);
                }
            }
        }
    }

    fn value_of(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.type_name)?;
        let shown: Vec<&(String, Value)> = match &self.equality {
            BeanEquality::Properties(names) => self
                .properties
                .iter()
                .filter(|(n, _)| names.contains(n))
                .collect(),
            _ => self.properties.iter().collect(),
        };
        for (i, (name, value)) in shown.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut bean = Bean::new("Point").with("x", 1).with("y", 2);
        bean.set("x", 5);
        assert_eq!(bean.property_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(bean.get("x"), Some(&Value::from(5)));
    }

    #[test]
    fn remove_property() {
        let mut bean = Bean::new("Point").with("x", 1);
        assert_eq!(bean.remove("x"), Some(Value::from(1)));
        assert!(bean.get("x").is_none());
        assert!(bean.remove("x").is_none());
    }

    #[test]
    fn all_properties_equality_ignores_missing_nulls() {
        let a = Bean::new("Point")
            .with("x", 1)
            .with_equality(BeanEquality::AllProperties);
        let b = Bean::new("Point")
            .with("x", 1)
            .with("label", Value::Null)
            .with_equality(BeanEquality::AllProperties);
        assert!(a.equals(&b));
    }

    #[test]
    fn different_types_never_equal() {
        let a = Bean::new("A").with_equality(BeanEquality::AllProperties);
        let b = Bean::new("B").with_equality(BeanEquality::AllProperties);
        assert!(!a.equals(&b));
    }

    #[test]
    fn keyed_display_shows_keys_only() {
        let bean = Bean::new("Item")
            .with("id", "foo")
            .with("value", "1")
            .with_equality(BeanEquality::properties(["id"]));
        assert_eq!(bean.to_string(), "Item{id=foo}");
    }
}
