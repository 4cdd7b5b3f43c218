//! Arrays, collections and maps.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::{ArrayKind, CollectionKind, MapKind, PrimitiveKind};
use crate::value::{Primitive, Value};

// ---------------------------------------------------------------------------
// Array
// ---------------------------------------------------------------------------

/// A fixed-component-type array. Primitive arrays store their elements
/// unboxed.
#[derive(Clone, Debug)]
pub enum Array {
    Bool(Vec<bool>),
    Char(Vec<char>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Object(Vec<Value>),
}

impl Array {
    pub fn empty(kind: ArrayKind) -> Self {
        match kind {
            ArrayKind::Primitive(PrimitiveKind::Bool) => Self::Bool(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::Char) => Self::Char(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::I8) => Self::I8(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::I16) => Self::I16(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::I32) => Self::I32(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::I64) => Self::I64(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::F32) => Self::F32(Vec::new()),
            ArrayKind::Primitive(PrimitiveKind::F64) => Self::F64(Vec::new()),
            ArrayKind::Object => Self::Object(Vec::new()),
        }
    }

    pub fn kind(&self) -> ArrayKind {
        match self {
            Self::Bool(_) => ArrayKind::Primitive(PrimitiveKind::Bool),
            Self::Char(_) => ArrayKind::Primitive(PrimitiveKind::Char),
            Self::I8(_) => ArrayKind::Primitive(PrimitiveKind::I8),
            Self::I16(_) => ArrayKind::Primitive(PrimitiveKind::I16),
            Self::I32(_) => ArrayKind::Primitive(PrimitiveKind::I32),
            Self::I64(_) => ArrayKind::Primitive(PrimitiveKind::I64),
            Self::F32(_) => ArrayKind::Primitive(PrimitiveKind::F32),
            Self::F64(_) => ArrayKind::Primitive(PrimitiveKind::F64),
            Self::Object(_) => ArrayKind::Object,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, primitive elements wrapped as [`Value::Primitive`].
    pub fn get(&self, index: usize) -> Option<Value> {
        let value = match self {
            Self::Bool(v) => Value::Primitive(Primitive::Bool(*v.get(index)?)),
            Self::Char(v) => Value::Primitive(Primitive::Char(*v.get(index)?)),
            Self::I8(v) => Value::Primitive(Primitive::I8(*v.get(index)?)),
            Self::I16(v) => Value::Primitive(Primitive::I16(*v.get(index)?)),
            Self::I32(v) => Value::Primitive(Primitive::I32(*v.get(index)?)),
            Self::I64(v) => Value::Primitive(Primitive::I64(*v.get(index)?)),
            Self::F32(v) => Value::Primitive(Primitive::F32(*v.get(index)?)),
            Self::F64(v) => Value::Primitive(Primitive::F64(*v.get(index)?)),
            Self::Object(v) => v.get(index)?.clone(),
        };
        Some(value)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for i in 0..self.len() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(item) = self.get(i) {
                write!(f, "{item}")?;
            }
        }
        f.write_str("]")
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A list or set of values.
#[derive(Clone, Debug)]
pub struct Collection {
    kind: CollectionKind,
    items: Vec<Value>,
}

impl Collection {
    /// An empty collection. `CollectionKind::Any` is materialized as a list.
    pub fn new(kind: CollectionKind) -> Self {
        let kind = match kind {
            CollectionKind::Any => CollectionKind::List,
            other => other,
        };
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn from_items(kind: CollectionKind, items: impl IntoIterator<Item = Value>) -> Self {
        let mut collection = Self::new(kind);
        for item in items {
            collection.add(item);
        }
        collection
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Returns `true` for lists, where position is meaningful.
    pub fn is_ordered(&self) -> bool {
        self.kind == CollectionKind::List
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn contains(&self, item: &Value) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Add an item. Sets reject duplicates; sorted sets insert in natural
    /// order (incomparable items go last). Returns `false` if rejected.
    pub fn add(&mut self, item: Value) -> bool {
        match self.kind {
            CollectionKind::List | CollectionKind::Any => {
                self.items.push(item);
                true
            }
            CollectionKind::Set => {
                if self.contains(&item) {
                    return false;
                }
                self.items.push(item);
                true
            }
            CollectionKind::SortedSet => {
                if self.contains(&item) {
                    return false;
                }
                let pos = self
                    .items
                    .iter()
                    .position(|existing| {
                        existing.natural_cmp(&item) == Some(std::cmp::Ordering::Greater)
                    })
                    .unwrap_or(self.items.len());
                self.items.insert(pos, item);
                true
            }
        }
    }

    /// Remove the first item equal to `item`.
    pub fn remove(&mut self, item: &Value) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Replace the item at `index`, or append when `index == len`.
    pub fn set_at(&mut self, index: usize, item: Value) -> bool {
        if index < self.items.len() {
            self.items[index] = item;
            true
        } else if index == self.items.len() {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    fn is_set_like(&self) -> bool {
        matches!(self.kind, CollectionKind::Set | CollectionKind::SortedSet)
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        if self.is_set_like() {
            let sum = self
                .items
                .iter()
                .fold(0u64, |acc, item| acc.wrapping_add(item.hash_code()));
            sum.hash(state);
        } else {
            for item in &self.items {
                item.hash(state);
            }
        }
    }

    pub(crate) fn fmt_with_self(&self, f: &mut fmt::Formatter<'_>, own: usize) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if item.identity() == Some(own) {
                f.write_str("(this collection)")?;
            } else {
                write!(f, "{item}")?;
            }
        }
        f.write_str("]")
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_set_like(), other.is_set_like()) {
            (false, false) => self.items == other.items,
            (true, true) => {
                if self.items.len() != other.items.len() {
                    return false;
                }
                let theirs: HashSet<&Value> = other.items.iter().collect();
                self.items.iter().all(|item| theirs.contains(item))
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// A map of keys to values. Keys are unique by value equality.
#[derive(Clone, Debug)]
pub struct Map {
    kind: MapKind,
    entries: Vec<(Value, Value)>,
}

impl Map {
    /// An empty map. `MapKind::Any` is materialized as a linked map.
    pub fn new(kind: MapKind) -> Self {
        let kind = match kind {
            MapKind::Any => MapKind::Linked,
            other => other,
        };
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn from_entries(kind: MapKind, entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map = Self::new(kind);
        for (k, v) in entries {
            map.insert(k, v);
        }
        map
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. Returns the previous value for the key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(slot, value));
        }
        let pos = match self.kind {
            MapKind::Sorted => self
                .entries
                .iter()
                .position(|(k, _)| k.natural_cmp(&key) == Some(std::cmp::Ordering::Greater))
                .unwrap_or(self.entries.len()),
            _ => self.entries.len(),
        };
        self.entries.insert(pos, (key, value));
        None
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        let sum = self.entries.iter().fold(0u64, |acc, (k, v)| {
            acc.wrapping_add(k.hash_code() ^ v.hash_code())
        });
        sum.hash(state);
    }

    pub(crate) fn fmt_with_self(&self, f: &mut fmt::Formatter<'_>, own: usize) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if value.identity() == Some(own) {
                write!(f, "{key}=(this map)")?;
            } else {
                write!(f, "{key}={value}")?;
            }
        }
        f.write_str("}")
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k) == Some(v))
    }
}
