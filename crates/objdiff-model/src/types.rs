//! Runtime type classification for [`Value`](crate::Value)s.
//!
//! A [`ValueType`] is what the diff engine dispatches on. Types are compared
//! structurally; bean types are identified by name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bean::Bean;
use crate::container::{Array, Collection, Map};
use crate::value::{Primitive, Value};

/// The kind of a true primitive (a type with a zero value that can never be
/// null).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// The zero value of this kind (`false`, `'\0'`, `0`, `0.0`).
    pub fn default_value(self) -> Primitive {
        match self {
            Self::Bool => Primitive::Bool(false),
            Self::Char => Primitive::Char('\0'),
            Self::I8 => Primitive::I8(0),
            Self::I16 => Primitive::I16(0),
            Self::I32 => Primitive::I32(0),
            Self::I64 => Primitive::I64(0),
            Self::F32 => Primitive::F32(0.0),
            Self::F64 => Primitive::F64(0.0),
        }
    }

    /// Returns `true` for the integer and floating point kinds.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

/// Component type of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayKind {
    Primitive(PrimitiveKind),
    Object,
}

/// Concrete flavour of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// The common supertype of all collections.
    Any,
    /// Ordered, duplicates allowed.
    List,
    /// Unordered, no duplicates (insertion order is kept for iteration).
    Set,
    /// Naturally ordered, no duplicates.
    SortedSet,
}

/// Concrete flavour of a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// The common supertype of all maps.
    Any,
    Hash,
    /// Entries kept in natural key order.
    Sorted,
    /// Entries kept in insertion order.
    Linked,
}

/// Runtime type of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Unknown or shared-by-nothing type. Compared by equality only.
    Object,
    Primitive(PrimitiveKind),
    /// Wrapper object around a primitive value. Nullable.
    Boxed(PrimitiveKind),
    Text,
    Array(ArrayKind),
    Collection(CollectionKind),
    Map(MapKind),
    /// A bean type, identified by name.
    Bean(String),
}

impl ValueType {
    /// Shorthand for a bean type.
    pub fn bean(name: impl Into<String>) -> Self {
        Self::Bean(name.into())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Simple types hold a single scalar value and have no properties.
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Primitive(_) | Self::Boxed(_) | Self::Text)
    }

    /// The bean type name, if this is a bean type.
    pub fn bean_name(&self) -> Option<&str> {
        match self {
            Self::Bean(name) => Some(name),
            _ => None,
        }
    }

    /// The most specific type shared by `a` and `b`.
    ///
    /// Identical types share themselves. Two collection types share
    /// `Collection(Any)` and two map types share `Map(Any)`. Anything else
    /// has no common supertype.
    pub fn common_supertype(a: &ValueType, b: &ValueType) -> Option<ValueType> {
        match (a, b) {
            (a, b) if a == b => Some(a.clone()),
            (Self::Collection(_), Self::Collection(_)) => {
                Some(Self::Collection(CollectionKind::Any))
            }
            (Self::Map(_), Self::Map(_)) => Some(Self::Map(MapKind::Any)),
            _ => None,
        }
    }

    /// A new, empty instance of this type.
    ///
    /// Primitives yield their zero value, containers and beans an empty
    /// instance. Types without a sensible empty instance yield `None`.
    pub fn new_instance(&self) -> Option<Value> {
        match self {
            Self::Primitive(kind) => Some(Value::Primitive(kind.default_value())),
            Self::Text => Some(Value::Text(String::new())),
            Self::Array(kind) => Some(Value::from_array(Array::empty(*kind))),
            Self::Collection(kind) => {
                let kind = if *kind == CollectionKind::Any {
                    CollectionKind::List
                } else {
                    *kind
                };
                Some(Value::from_collection(Collection::new(kind)))
            }
            Self::Map(kind) => {
                let kind = if *kind == MapKind::Any {
                    MapKind::Linked
                } else {
                    *kind
                };
                Some(Value::from_map(Map::new(kind)))
            }
            Self::Bean(name) => Some(Value::from_bean(Bean::new(name.clone()))),
            Self::Object | Self::Boxed(_) => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::Boxed(kind) => write!(f, "Box<{}>", kind.name()),
            Self::Text => f.write_str("text"),
            Self::Array(ArrayKind::Primitive(kind)) => write!(f, "[{}]", kind.name()),
            Self::Array(ArrayKind::Object) => f.write_str("[object]"),
            Self::Collection(kind) => write!(f, "collection<{kind:?}>"),
            Self::Map(kind) => write!(f, "map<{kind:?}>"),
            Self::Bean(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_types_share_themselves() {
        let t = ValueType::bean("Person");
        assert_eq!(ValueType::common_supertype(&t, &t), Some(t.clone()));
    }

    #[test]
    fn distinct_maps_share_any_map() {
        let shared = ValueType::common_supertype(
            &ValueType::Map(MapKind::Sorted),
            &ValueType::Map(MapKind::Hash),
        );
        assert_eq!(shared, Some(ValueType::Map(MapKind::Any)));
    }

    #[test]
    fn distinct_collections_share_any_collection() {
        let shared = ValueType::common_supertype(
            &ValueType::Collection(CollectionKind::List),
            &ValueType::Collection(CollectionKind::Set),
        );
        assert_eq!(shared, Some(ValueType::Collection(CollectionKind::Any)));
    }

    #[test]
    fn unrelated_types_share_nothing() {
        assert_eq!(
            ValueType::common_supertype(&ValueType::Text, &ValueType::bean("Person")),
            None
        );
        assert_eq!(
            ValueType::common_supertype(
                &ValueType::Collection(CollectionKind::List),
                &ValueType::Map(MapKind::Hash)
            ),
            None
        );
    }

    #[test]
    fn primitive_defaults() {
        assert_eq!(PrimitiveKind::I32.default_value(), Primitive::I32(0));
        assert_eq!(PrimitiveKind::Bool.default_value(), Primitive::Bool(false));
        assert!(PrimitiveKind::F64.is_numeric());
        assert!(!PrimitiveKind::Char.is_numeric());
    }

    #[test]
    fn new_instance_of_abstract_collection_is_a_list() {
        let value = ValueType::Collection(CollectionKind::Any)
            .new_instance()
            .unwrap();
        assert_eq!(
            value.value_type(),
            Some(ValueType::Collection(CollectionKind::List))
        );
    }

    #[test]
    fn serde_roundtrip() {
        let t = ValueType::Map(MapKind::Sorted);
        let json = serde_json::to_string(&t).unwrap();
        let parsed: ValueType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);
    }
}
