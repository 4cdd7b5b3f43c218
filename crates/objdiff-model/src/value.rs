//! The dynamic [`Value`] every compared object graph is made of.
//!
//! Scalars (`Primitive`, `Boxed`, `Text`) are plain values. Arrays,
//! collections, maps and beans live behind a [`Shared`] cell so that graphs
//! can alias and form cycles, and so that reference identity exists.
//!
//! # Equality
//!
//! `Value` equality is the engine's notion of `equals`:
//!
//! - scalars compare by value; floats by bit pattern, so `NaN == NaN`
//! - a primitive and a boxed value of the same kind and value are equal
//! - arrays compare by reference identity (use an array comparison strategy
//!   for content equality)
//! - lists compare element-wise in order, sets ignore order, maps compare
//!   entry-wise
//! - beans follow their [`BeanEquality`](crate::BeanEquality)
//!
//! Hashing is consistent with equality. Containers that reach themselves
//! again are handled by treating the inner occurrence as already equal (and
//! hashing it to a fixed marker), so cyclic graphs compare and hash in finite
//! time.

use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use crate::bean::{Bean, BeanEquality};
use crate::container::{Array, Collection, Map};
use crate::reentry;
use crate::types::{CollectionKind, MapKind, PrimitiveKind, ValueType};

// ---------------------------------------------------------------------------
// Primitive
// ---------------------------------------------------------------------------

/// A primitive scalar.
#[derive(Clone, Copy, Debug)]
pub enum Primitive {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Char(_) => PrimitiveKind::Char,
            Self::I8(_) => PrimitiveKind::I8,
            Self::I16(_) => PrimitiveKind::I16,
            Self::I32(_) => PrimitiveKind::I32,
            Self::I64(_) => PrimitiveKind::I64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
        }
    }

    /// Returns `true` if this is the zero value of its kind.
    pub fn is_default(&self) -> bool {
        *self == self.kind().default_value()
    }

    /// Bit pattern used for equality and hashing.
    fn bits(&self) -> u64 {
        match *self {
            Self::Bool(v) => v as u64,
            Self::Char(v) => v as u64,
            Self::I8(v) => v as u64,
            Self::I16(v) => v as u64,
            Self::I32(v) => v as u64,
            Self::I64(v) => v as u64,
            Self::F32(v) => v.to_bits() as u64,
            Self::F64(v) => v.to_bits(),
        }
    }

    /// Natural ordering between primitives of the same kind.
    pub fn natural_cmp(&self, other: &Primitive) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Char(a), Self::Char(b)) => Some(a.cmp(b)),
            (Self::I8(a), Self::I8(b)) => Some(a.cmp(b)),
            (Self::I16(a), Self::I16(b)) => Some(a.cmp(b)),
            (Self::I32(a), Self::I32(b)) => Some(a.cmp(b)),
            (Self::I64(a), Self::I64(b)) => Some(a.cmp(b)),
            (Self::F32(a), Self::F32(b)) => Some(a.total_cmp(b)),
            (Self::F64(a), Self::F64(b)) => Some(a.total_cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.bits() == other.bits()
    }
}

impl Eq for Primitive {}

impl Hash for Primitive {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.bits().hash(state);
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// A shared, mutable cell with reference identity.
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    pub fn new(inner: T) -> Self {
        Self(Rc::new(RefCell::new(inner)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Returns `true` if both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the cell; stable for the lifetime of the value.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:#x})", self.addr())
    }
}

pub type ArrayRef = Shared<Array>;
pub type CollectionRef = Shared<Collection>;
pub type MapRef = Shared<Map>;
pub type BeanRef = Shared<Bean>;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Any node of an object graph.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    /// A true primitive. Never absent; its type has a zero value.
    Primitive(Primitive),
    /// A nullable wrapper around a primitive value.
    Boxed(Primitive),
    Text(String),
    Array(ArrayRef),
    Collection(CollectionRef),
    Map(MapRef),
    Bean(BeanRef),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn from_bean(bean: Bean) -> Self {
        Self::Bean(Shared::new(bean))
    }

    pub fn from_collection(collection: Collection) -> Self {
        Self::Collection(Shared::new(collection))
    }

    pub fn from_map(map: Map) -> Self {
        Self::Map(Shared::new(map))
    }

    pub fn from_array(array: Array) -> Self {
        Self::Array(Shared::new(array))
    }

    /// A list holding `items` in order.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::from_collection(Collection::from_items(CollectionKind::List, items))
    }

    /// A set holding the distinct `items`.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::from_collection(Collection::from_items(CollectionKind::Set, items))
    }

    /// A naturally ordered set holding the distinct `items`.
    pub fn sorted_set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::from_collection(Collection::from_items(CollectionKind::SortedSet, items))
    }

    pub fn hash_map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::from_map(Map::from_entries(MapKind::Hash, entries))
    }

    pub fn sorted_map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::from_map(Map::from_entries(MapKind::Sorted, entries))
    }

    pub fn linked_map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::from_map(Map::from_entries(MapKind::Linked, entries))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for values with reference identity (arrays,
    /// collections, maps and beans).
    pub fn is_reference(&self) -> bool {
        self.identity().is_some()
    }

    /// Reference identity of this value, if it has one.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Self::Array(a) => Some(a.addr()),
            Self::Collection(c) => Some(c.addr()),
            Self::Map(m) => Some(m.addr()),
            Self::Bean(b) => Some(b.addr()),
            _ => None,
        }
    }

    /// Runtime type, or `None` for `Null`.
    pub fn value_type(&self) -> Option<ValueType> {
        let ty = match self {
            Self::Null => return None,
            Self::Primitive(p) => ValueType::Primitive(p.kind()),
            Self::Boxed(p) => ValueType::Boxed(p.kind()),
            Self::Text(_) => ValueType::Text,
            Self::Array(a) => ValueType::Array(a.borrow().kind()),
            Self::Collection(c) => ValueType::Collection(c.borrow().kind()),
            Self::Map(m) => ValueType::Map(m.borrow().kind()),
            Self::Bean(b) => ValueType::Bean(b.borrow().type_name().to_string()),
        };
        Some(ty)
    }

    /// Reference identity for reference values, equality for scalars.
    ///
    /// Scalars are immutable, so two equal scalars are indistinguishable
    /// from one instance.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }

    /// Natural ordering for primitive, boxed and text values.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Primitive(a) | Self::Boxed(a), Self::Primitive(b) | Self::Boxed(b)) => {
                a.natural_cmp(b)
            }
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns `true` if this value has a natural ordering.
    pub fn is_comparable(&self) -> bool {
        matches!(self, Self::Primitive(_) | Self::Boxed(_) | Self::Text(_))
    }

    /// Reads a bean property by name. `None` if this is not a bean or the
    /// bean has no such property.
    pub fn property(&self, name: &str) -> Option<Value> {
        match self {
            Self::Bean(b) => b.borrow().get(name).cloned(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(p) | Self::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_bean(&self) -> Option<&BeanRef> {
        match self {
            Self::Bean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// A 64-bit hash consistent with equality.
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Hashed in place of a container that is already being hashed.
const CYCLE_HASH: u64 = 0x9e37_79b9_7f4a_7c15;

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Primitive(a) | Self::Boxed(a), Self::Primitive(b) | Self::Boxed(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Collection(a), Self::Collection(b)) => {
                a.ptr_eq(b)
                    || match reentry::comparing(a.addr(), b.addr()) {
                        Some(_entered) => *a.borrow() == *b.borrow(),
                        None => true,
                    }
            }
            (Self::Map(a), Self::Map(b)) => {
                a.ptr_eq(b)
                    || match reentry::comparing(a.addr(), b.addr()) {
                        Some(_entered) => *a.borrow() == *b.borrow(),
                        None => true,
                    }
            }
            (Self::Bean(a), Self::Bean(b)) => {
                a.ptr_eq(b)
                    || match reentry::comparing(a.addr(), b.addr()) {
                        Some(_entered) => a.borrow().equals(&b.borrow()),
                        None => true,
                    }
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Primitive(p) | Self::Boxed(p) => {
                1u8.hash(state);
                p.hash(state);
            }
            Self::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Self::Array(a) => {
                3u8.hash(state);
                a.addr().hash(state);
            }
            Self::Collection(c) => {
                4u8.hash(state);
                match reentry::hashing(c.addr()) {
                    Some(_entered) => c.borrow().hash_into(state),
                    None => CYCLE_HASH.hash(state),
                }
            }
            Self::Map(m) => {
                5u8.hash(state);
                match reentry::hashing(m.addr()) {
                    Some(_entered) => m.borrow().hash_into(state),
                    None => CYCLE_HASH.hash(state),
                }
            }
            Self::Bean(b) => {
                6u8.hash(state);
                let bean = b.borrow();
                match bean.equality() {
                    BeanEquality::Identity => b.addr().hash(state),
                    _ => match reentry::hashing(b.addr()) {
                        Some(_entered) => bean.hash_into(state),
                        None => CYCLE_HASH.hash(state),
                    },
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Primitive(p) | Self::Boxed(p) => write!(f, "{p}"),
            Self::Text(s) => f.write_str(s),
            Self::Array(a) => fmt::Display::fmt(&*a.borrow(), f),
            Self::Collection(c) => match reentry::formatting(c.addr()) {
                Some(_entered) => c.borrow().fmt_with_self(f, c.addr()),
                None => f.write_str("(cycle)"),
            },
            Self::Map(m) => match reentry::formatting(m.addr()) {
                Some(_entered) => m.borrow().fmt_with_self(f, m.addr()),
                None => f.write_str("(cycle)"),
            },
            Self::Bean(b) => {
                let bean = b.borrow();
                match bean.equality() {
                    BeanEquality::Identity => write!(f, "{}@{:x}", bean.type_name(), b.addr()),
                    _ => match reentry::formatting(b.addr()) {
                        Some(_entered) => fmt::Display::fmt(&*bean, f),
                        None => write!(f, "{}@{:x}", bean.type_name(), b.addr()),
                    },
                }
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Boxed(p) => write!(f, "Box({p})"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Primitive(Primitive::Bool(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Primitive(Primitive::I32(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Primitive(Primitive::I64(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Primitive(Primitive::F64(v))
    }
}

impl From<Bean> for Value {
    fn from(bean: Bean) -> Self {
        Self::from_bean(bean)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn primitive_and_boxed_are_equal() {
        let p = Value::Primitive(Primitive::I32(7));
        let b = Value::Boxed(Primitive::I32(7));
        assert_eq!(p, b);
        assert_eq!(p.hash_code(), b.hash_code());
        assert_ne!(p.value_type(), b.value_type());
    }

    #[test]
    fn floats_compare_by_bits() {
        let nan = Value::from(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(Value::from(0.0), Value::from(-0.0));
    }

    #[test]
    fn different_kinds_are_not_equal() {
        assert_ne!(
            Value::Primitive(Primitive::I32(1)),
            Value::Primitive(Primitive::I64(1))
        );
    }

    #[test]
    fn lists_are_ordered_sets_are_not() {
        let a = Value::list(["x".into(), "y".into()]);
        let b = Value::list(["y".into(), "x".into()]);
        assert_ne!(a, b);

        let s1 = Value::set(["x".into(), "y".into()]);
        let s2 = Value::set(["y".into(), "x".into()]);
        assert_eq!(s1, s2);
        assert_eq!(s1.hash_code(), s2.hash_code());
        assert_ne!(a, s1);
    }

    #[test]
    fn arrays_compare_by_identity() {
        let a = Value::from_array(Array::I32(vec![1, 2]));
        let b = Value::from_array(Array::I32(vec![1, 2]));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn identity_beans_compare_by_reference() {
        let a = Value::from(Bean::new("Person").with("name", "ada"));
        let b = Value::from(Bean::new("Person").with("name", "ada"));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.is_same(&a.clone()));
        assert!(!a.is_same(&b));
    }

    #[test]
    fn keyed_beans_compare_by_keys() {
        let a = Value::from(
            Bean::new("Item")
                .with("id", "foo")
                .with("value", "1")
                .with_equality(BeanEquality::properties(["id"])),
        );
        let b = Value::from(
            Bean::new("Item")
                .with("id", "foo")
                .with("value", "2")
                .with_equality(BeanEquality::properties(["id"])),
        );
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    fn self_containing_list() -> Value {
        let list = Value::list([]);
        list.as_collection().unwrap().borrow_mut().add(list.clone());
        list
    }

    #[test]
    fn cyclic_lists_compare_and_hash() {
        let l1 = self_containing_list();
        let l2 = self_containing_list();
        assert_eq!(l1, l2);
        assert_eq!(l1.hash_code(), l2.hash_code());
        assert_eq!(l1.to_string(), "[(this collection)]");

        let longer = self_containing_list();
        longer.as_collection().unwrap().borrow_mut().add("x".into());
        assert_ne!(l1, longer);
    }

    #[test]
    fn indirect_cycles_terminate() {
        let outer = Value::hash_map([]);
        let inner = Value::list([outer.clone()]);
        outer
            .as_map()
            .unwrap()
            .borrow_mut()
            .insert("inner".into(), inner.clone());

        let other_outer = Value::hash_map([]);
        let other_inner = Value::list([other_outer.clone()]);
        other_outer
            .as_map()
            .unwrap()
            .borrow_mut()
            .insert("inner".into(), other_inner);

        assert_eq!(outer, other_outer);
        assert_eq!(outer.hash_code(), other_outer.hash_code());
        assert_eq!(outer.to_string(), "{inner=[(cycle)]}");
    }

    #[test]
    fn scalars_are_same_when_equal() {
        assert!(Value::text("a").is_same(&Value::text("a")));
        assert!(!Value::text("a").is_same(&Value::text("b")));
        assert!(Value::Null.is_same(&Value::Null));
    }

    #[test]
    fn natural_ordering() {
        assert_eq!(
            Value::text("a").natural_cmp(&Value::text("b")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from(2).natural_cmp(&Value::Boxed(Primitive::I32(2))),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::from(2).natural_cmp(&Value::text("2")), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::text("foo").to_string(), "foo");
        assert_eq!(Value::list(["a".into(), "b".into()]).to_string(), "[a, b]");
        assert_eq!(
            Value::linked_map([("k".into(), "v".into())]).to_string(),
            "{k=v}"
        );
    }

    #[test]
    fn self_containing_list_displays() {
        let list = Value::list([]);
        list.as_collection().unwrap().borrow_mut().add(list.clone());
        assert_eq!(list.to_string(), "[(this collection)]");
    }
}
