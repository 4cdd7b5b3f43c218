//! Element selectors: one addressing step in an object graph.
//!
//! A selector identifies a child relative to its parent: the root itself, a
//! named bean property, a collection item, a positioned sequence item, or a
//! map key. Selectors are immutable and compared structurally.
//!
//! Collection and sequence item selectors compare their items through the
//! identity strategy they were built with, and hash through that strategy's
//! [`identity_hash`](crate::IdentityStrategy::identity_hash).

use std::fmt;
use std::hash::{Hash, Hasher};

use objdiff_model::Value;

use crate::identity::{EqualsIdentityStrategy, IdentityStrategyRef};

#[derive(Clone)]
pub enum ElementSelector {
    Root,
    BeanProperty(String),
    CollectionItem {
        item: Value,
        identity: IdentityStrategyRef,
    },
    /// An item of an ordered sequence, addressed by its ordinal on each side
    /// where it is present.
    SequenceItem {
        item: Value,
        identity: IdentityStrategyRef,
        working_index: Option<usize>,
        base_index: Option<usize>,
    },
    MapKey(Value),
}

impl ElementSelector {
    pub fn property(name: impl Into<String>) -> Self {
        Self::BeanProperty(name.into())
    }

    /// A collection item matched by value equality.
    pub fn collection_item(item: impl Into<Value>) -> Self {
        Self::CollectionItem {
            item: item.into(),
            identity: EqualsIdentityStrategy::shared(),
        }
    }

    pub fn collection_item_with(item: impl Into<Value>, identity: IdentityStrategyRef) -> Self {
        Self::CollectionItem {
            item: item.into(),
            identity,
        }
    }

    pub fn map_key(key: impl Into<Value>) -> Self {
        Self::MapKey(key.into())
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn property_name(&self) -> Option<&str> {
        match self {
            Self::BeanProperty(name) => Some(name),
            _ => None,
        }
    }

    /// The referenced item or key for item and key selectors.
    pub fn referenced_value(&self) -> Option<&Value> {
        match self {
            Self::CollectionItem { item, .. } | Self::SequenceItem { item, .. } => Some(item),
            Self::MapKey(key) => Some(key),
            Self::Root | Self::BeanProperty(_) => None,
        }
    }
}

impl PartialEq for ElementSelector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Root, Self::Root) => true,
            (Self::BeanProperty(a), Self::BeanProperty(b)) => a == b,
            (
                Self::CollectionItem { item, identity },
                Self::CollectionItem { item: other_item, .. },
            ) => identity.equals(item, other_item),
            (
                Self::SequenceItem {
                    item,
                    identity,
                    working_index,
                    base_index,
                },
                Self::SequenceItem {
                    item: other_item,
                    working_index: other_working,
                    base_index: other_base,
                    ..
                },
            ) => {
                working_index == other_working
                    && base_index == other_base
                    && identity.equals(item, other_item)
            }
            (Self::MapKey(a), Self::MapKey(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ElementSelector {}

impl Hash for ElementSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Root => 0u8.hash(state),
            Self::BeanProperty(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Self::CollectionItem { item, identity } => {
                2u8.hash(state);
                identity.identity_hash(item).hash(state);
            }
            Self::SequenceItem {
                item,
                identity,
                working_index,
                base_index,
            } => {
                3u8.hash(state);
                identity.identity_hash(item).hash(state);
                working_index.hash(state);
                base_index.hash(state);
            }
            Self::MapKey(key) => {
                4u8.hash(state);
                key.hash(state);
            }
        }
    }
}

impl fmt::Display for ElementSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => Ok(()),
            Self::BeanProperty(name) => f.write_str(name),
            Self::CollectionItem { item, .. } => write!(f, "[{item}]"),
            Self::SequenceItem {
                item,
                working_index,
                base_index,
                ..
            } => {
                let side = |index: &Option<usize>| index.map_or("-".to_string(), |i| i.to_string());
                write!(f, "[{item}@{}/{}]", side(working_index), side(base_index))
            }
            Self::MapKey(key) => write!(f, "{{{key}}}"),
        }
    }
}

impl fmt::Debug for ElementSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            other => write!(f, "ElementSelector({other})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PropertyIdentityStrategy;
    use objdiff_model::Bean;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn display_forms() {
        assert_eq!(ElementSelector::Root.to_string(), "");
        assert_eq!(ElementSelector::property("name").to_string(), "name");
        assert_eq!(ElementSelector::collection_item("a").to_string(), "[a]");
        assert_eq!(ElementSelector::map_key("k").to_string(), "{k}");
        let seq = ElementSelector::SequenceItem {
            item: "a".into(),
            identity: EqualsIdentityStrategy::shared(),
            working_index: Some(2),
            base_index: None,
        };
        assert_eq!(seq.to_string(), "[a@2/-]");
    }

    #[test]
    fn collection_items_compare_through_identity_strategy() {
        let by_id = Arc::new(PropertyIdentityStrategy::new(["id"]));
        let a = ElementSelector::collection_item_with(
            Bean::new("Item").with("id", "x").with("v", 1),
            by_id.clone(),
        );
        let b = ElementSelector::collection_item_with(
            Bean::new("Item").with("id", "x").with("v", 2),
            by_id,
        );
        assert_eq!(a, b);

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn different_variants_differ() {
        assert_ne!(ElementSelector::property("a"), ElementSelector::map_key("a"));
        assert_ne!(
            ElementSelector::collection_item("a"),
            ElementSelector::map_key("a")
        );
    }

    #[test]
    fn sequence_items_include_positions() {
        let at = |w, b| ElementSelector::SequenceItem {
            item: "a".into(),
            identity: EqualsIdentityStrategy::shared(),
            working_index: w,
            base_index: b,
        };
        assert_eq!(at(Some(1), None), at(Some(1), None));
        assert_ne!(at(Some(1), None), at(None, Some(1)));
    }

    #[test]
    fn property_name_only_for_bean_properties() {
        assert_eq!(ElementSelector::property("x").property_name(), Some("x"));
        assert_eq!(ElementSelector::map_key("x").property_name(), None);
        assert!(ElementSelector::Root.is_root());
    }
}
