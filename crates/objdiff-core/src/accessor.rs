//! Accessors: how a child value is read from, written to, and removed from
//! its parent object.
//!
//! Every [`DiffNode`](crate::DiffNode) is reached through exactly one
//! accessor. The chain of accessors from the root is what makes
//! `canonical_get` / `canonical_set` possible on arbitrary target graphs.

use std::fmt;
use std::rc::Rc;

use objdiff_model::{AccessError, PropertyDescriptor, Value, ValueType};
use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::identity::IdentityStrategyRef;
use crate::selector::ElementSelector;

/// Which of the compared graphs a read is performed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Working,
    Base,
    Fresh,
}

pub trait Accessor: fmt::Debug {
    /// The selector that addresses the accessed child within its parent.
    fn element_selector(&self) -> ElementSelector;

    /// Reads the child from `target`. A null target yields null.
    fn get(&self, target: &Value) -> DiffResult<Value>;

    /// Reads the child from a target on a specific side of the comparison.
    fn get_from(&self, target: &Value, side: Side) -> DiffResult<Value> {
        let _ = side;
        self.get(target)
    }

    /// Writes `value` as the child of `target`.
    fn set(&self, target: &Value, value: Value) -> DiffResult<()>;

    /// Removes the child from `target`.
    fn unset(&self, target: &Value) -> DiffResult<()>;

    /// The property descriptor, for bean property accessors.
    fn property(&self) -> Option<&PropertyDescriptor> {
        None
    }

    /// Statically declared type of the accessed value, if known.
    fn declared_type(&self) -> Option<&ValueType> {
        self.property().and_then(PropertyDescriptor::declared_type)
    }
}

pub type AccessorRef = Rc<dyn Accessor>;

fn type_label(value: &Value) -> String {
    value
        .value_type()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "null".to_string())
}

fn unsupported(operation: &str, target: &Value) -> DiffError {
    AccessError::Unsupported {
        operation: operation.to_string(),
        target_type: type_label(target),
    }
    .into()
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Accesses the compared objects themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct RootAccessor;

impl Accessor for RootAccessor {
    fn element_selector(&self) -> ElementSelector {
        ElementSelector::Root
    }

    fn get(&self, target: &Value) -> DiffResult<Value> {
        Ok(target.clone())
    }

    fn set(&self, _target: &Value, _value: Value) -> DiffResult<()> {
        Err(DiffError::InvalidArgument(
            "the root object cannot be replaced through its accessor".into(),
        ))
    }

    fn unset(&self, _target: &Value) -> DiffResult<()> {
        Err(DiffError::InvalidArgument(
            "the root object cannot be removed through its accessor".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Bean properties
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct BeanPropertyAccessor {
    property: PropertyDescriptor,
}

impl BeanPropertyAccessor {
    pub fn new(property: PropertyDescriptor) -> Self {
        Self { property }
    }

    pub fn property_name(&self) -> &str {
        self.property.name()
    }
}

impl Accessor for BeanPropertyAccessor {
    fn element_selector(&self) -> ElementSelector {
        ElementSelector::property(self.property.name())
    }

    fn get(&self, target: &Value) -> DiffResult<Value> {
        Ok(self.property.read(target)?)
    }

    fn set(&self, target: &Value, value: Value) -> DiffResult<()> {
        if target.is_null() {
            debug!(property = self.property.name(), "skipping write to null target");
            return Ok(());
        }
        Ok(self.property.write(target, value)?)
    }

    fn unset(&self, target: &Value) -> DiffResult<()> {
        self.set(target, Value::Null)
    }

    fn property(&self) -> Option<&PropertyDescriptor> {
        Some(&self.property)
    }
}

// ---------------------------------------------------------------------------
// Collection items
// ---------------------------------------------------------------------------

/// Accesses the item of a collection that the identity strategy matches
/// with the reference item.
#[derive(Clone, Debug)]
pub struct CollectionItemAccessor {
    item: Value,
    identity: IdentityStrategyRef,
}

impl CollectionItemAccessor {
    pub fn new(item: Value, identity: IdentityStrategyRef) -> Self {
        Self { item, identity }
    }

    fn position(&self, target: &Value) -> DiffResult<Option<usize>> {
        match target {
            Value::Collection(collection) => Ok(collection
                .borrow()
                .iter()
                .position(|candidate| self.identity.equals(candidate, &self.item))),
            other => Err(unsupported("access collection items", other)),
        }
    }
}

impl Accessor for CollectionItemAccessor {
    fn element_selector(&self) -> ElementSelector {
        ElementSelector::collection_item_with(self.item.clone(), self.identity.clone())
    }

    fn get(&self, target: &Value) -> DiffResult<Value> {
        if target.is_null() {
            return Ok(Value::Null);
        }
        let Some(index) = self.position(target)? else {
            return Ok(Value::Null);
        };
        Ok(target
            .as_collection()
            .and_then(|c| c.borrow().get(index).cloned())
            .unwrap_or_default())
    }

    fn set(&self, target: &Value, value: Value) -> DiffResult<()> {
        if target.is_null() {
            return Ok(());
        }
        let position = self.position(target)?;
        if let Some(collection) = target.as_collection() {
            let mut collection = collection.borrow_mut();
            match position {
                Some(index) => {
                    collection.set_at(index, value);
                }
                None => {
                    collection.add(value);
                }
            }
        }
        Ok(())
    }

    fn unset(&self, target: &Value) -> DiffResult<()> {
        if target.is_null() {
            return Ok(());
        }
        if let Some(index) = self.position(target)? {
            if let Some(collection) = target.as_collection() {
                collection.borrow_mut().remove_at(index);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sequence items
// ---------------------------------------------------------------------------

/// Accesses an item of an ordered list by its ordinal on each side.
#[derive(Clone, Debug)]
pub struct SequenceItemAccessor {
    item: Value,
    identity: IdentityStrategyRef,
    working_index: Option<usize>,
    base_index: Option<usize>,
}

impl SequenceItemAccessor {
    pub fn new(
        item: Value,
        identity: IdentityStrategyRef,
        working_index: Option<usize>,
        base_index: Option<usize>,
    ) -> Self {
        Self {
            item,
            identity,
            working_index,
            base_index,
        }
    }

    fn canonical_index(&self) -> Option<usize> {
        self.working_index.or(self.base_index)
    }

    fn item_at(target: &Value, index: Option<usize>) -> DiffResult<Value> {
        let Some(index) = index else {
            return Ok(Value::Null);
        };
        match target {
            Value::Null => Ok(Value::Null),
            Value::Collection(collection) => {
                Ok(collection.borrow().get(index).cloned().unwrap_or_default())
            }
            other => Err(unsupported("access sequence items", other)),
        }
    }
}

impl Accessor for SequenceItemAccessor {
    fn element_selector(&self) -> ElementSelector {
        ElementSelector::SequenceItem {
            item: self.item.clone(),
            identity: self.identity.clone(),
            working_index: self.working_index,
            base_index: self.base_index,
        }
    }

    fn get(&self, target: &Value) -> DiffResult<Value> {
        Self::item_at(target, self.canonical_index())
    }

    fn get_from(&self, target: &Value, side: Side) -> DiffResult<Value> {
        let index = match side {
            Side::Working => self.working_index,
            Side::Base => self.base_index,
            Side::Fresh => None,
        };
        Self::item_at(target, index)
    }

    fn set(&self, target: &Value, value: Value) -> DiffResult<()> {
        match target {
            Value::Null => Ok(()),
            Value::Collection(collection) => {
                let mut collection = collection.borrow_mut();
                match self.canonical_index() {
                    Some(index) if index < collection.len() => {
                        collection.set_at(index, value);
                    }
                    _ => {
                        collection.add(value);
                    }
                }
                Ok(())
            }
            other => Err(unsupported("access sequence items", other)),
        }
    }

    fn unset(&self, target: &Value) -> DiffResult<()> {
        match target {
            Value::Null => Ok(()),
            Value::Collection(collection) => {
                let mut collection = collection.borrow_mut();
                let matches = self.canonical_index().filter(|&index| {
                    collection
                        .get(index)
                        .is_some_and(|current| self.identity.equals(current, &self.item))
                });
                if let Some(index) = matches {
                    collection.remove_at(index);
                }
                Ok(())
            }
            other => Err(unsupported("access sequence items", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Map entries
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct MapEntryAccessor {
    key: Value,
}

impl MapEntryAccessor {
    pub fn new(key: Value) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }
}

impl Accessor for MapEntryAccessor {
    fn element_selector(&self) -> ElementSelector {
        ElementSelector::map_key(self.key.clone())
    }

    fn get(&self, target: &Value) -> DiffResult<Value> {
        match target {
            Value::Null => Ok(Value::Null),
            Value::Map(map) => Ok(map.borrow().get(&self.key).cloned().unwrap_or_default()),
            other => Err(unsupported("access map entries", other)),
        }
    }

    fn set(&self, target: &Value, value: Value) -> DiffResult<()> {
        match target {
            Value::Null => Ok(()),
            Value::Map(map) => {
                map.borrow_mut().insert(self.key.clone(), value);
                Ok(())
            }
            other => Err(unsupported("access map entries", other)),
        }
    }

    fn unset(&self, target: &Value) -> DiffResult<()> {
        match target {
            Value::Null => Ok(()),
            Value::Map(map) => {
                map.borrow_mut().remove(&self.key);
                Ok(())
            }
            other => Err(unsupported("access map entries", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{EqualsIdentityStrategy, PropertyIdentityStrategy};
    use objdiff_model::{Bean, PrimitiveKind};
    use std::sync::Arc;

    #[test]
    fn root_accessor_returns_target_and_refuses_writes() {
        let value = Value::text("x");
        assert_eq!(RootAccessor.get(&value).unwrap(), value);
        assert!(matches!(
            RootAccessor.set(&value, Value::Null),
            Err(DiffError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bean_property_accessor_round_trip() {
        let accessor = BeanPropertyAccessor::new(PropertyDescriptor::bean_field("name"));
        let bean = Value::from(Bean::new("Person").with("name", "ada"));
        assert_eq!(accessor.get(&bean).unwrap(), Value::text("ada"));

        accessor.set(&bean, "grace".into()).unwrap();
        assert_eq!(bean.property("name"), Some(Value::text("grace")));

        accessor.unset(&bean).unwrap();
        assert_eq!(bean.property("name"), Some(Value::Null));
        assert_eq!(accessor.element_selector(), ElementSelector::property("name"));
    }

    #[test]
    fn bean_property_accessor_reports_declared_type() {
        let accessor = BeanPropertyAccessor::new(
            PropertyDescriptor::bean_field("age")
                .with_declared_type(ValueType::Primitive(PrimitiveKind::I32)),
        );
        assert_eq!(
            accessor.declared_type(),
            Some(&ValueType::Primitive(PrimitiveKind::I32))
        );
    }

    #[test]
    fn collection_item_accessor_matches_by_identity() {
        let identity: IdentityStrategyRef = Arc::new(PropertyIdentityStrategy::new(["id"]));
        let stored = Value::from(Bean::new("Item").with("id", 1).with("v", "old"));
        let list = Value::list([stored.clone()]);
        let replacement = Value::from(Bean::new("Item").with("id", 1).with("v", "new"));
        let accessor = CollectionItemAccessor::new(replacement.clone(), identity);

        assert!(accessor.get(&list).unwrap().is_same(&stored));

        accessor.set(&list, replacement.clone()).unwrap();
        let items = list.as_collection().unwrap().borrow().items().to_vec();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_same(&replacement));

        accessor.unset(&list).unwrap();
        assert!(list.as_collection().unwrap().borrow().is_empty());
    }

    #[test]
    fn collection_item_accessor_missing_item_is_null() {
        let accessor =
            CollectionItemAccessor::new("x".into(), EqualsIdentityStrategy::shared());
        assert_eq!(accessor.get(&Value::list([])).unwrap(), Value::Null);
        assert_eq!(accessor.get(&Value::Null).unwrap(), Value::Null);
        assert!(accessor.get(&Value::text("not a collection")).is_err());
    }

    #[test]
    fn sequence_item_accessor_reads_per_side() {
        let accessor = SequenceItemAccessor::new(
            "b".into(),
            EqualsIdentityStrategy::shared(),
            Some(1),
            Some(0),
        );
        let working = Value::list(["a".into(), "b".into()]);
        let base = Value::list(["b".into()]);
        assert_eq!(
            accessor.get_from(&working, Side::Working).unwrap(),
            Value::text("b")
        );
        assert_eq!(accessor.get_from(&base, Side::Base).unwrap(), Value::text("b"));
        assert_eq!(accessor.get_from(&base, Side::Fresh).unwrap(), Value::Null);
    }

    #[test]
    fn map_entry_accessor_round_trip() {
        let accessor = MapEntryAccessor::new("k".into());
        let map = Value::linked_map([]);
        assert_eq!(accessor.get(&map).unwrap(), Value::Null);

        accessor.set(&map, "v".into()).unwrap();
        assert_eq!(accessor.get(&map).unwrap(), Value::text("v"));

        accessor.unset(&map).unwrap();
        assert!(map.as_map().unwrap().borrow().is_empty());
    }
}
