//! Node paths: the address of a node from the root of the compared graphs.
//!
//! A [`NodePath`] always starts with exactly one [`ElementSelector::Root`].
//! Paths are built with a [`NodePathBuilder`] and are immutable afterwards.

use std::fmt;

use objdiff_model::Value;

use crate::identity::IdentityStrategyRef;
use crate::selector::ElementSelector;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    selectors: Vec<ElementSelector>,
}

impl NodePath {
    /// The root path (`/`).
    pub fn with_root() -> Self {
        Self {
            selectors: vec![ElementSelector::Root],
        }
    }

    /// Start building a path below the root.
    pub fn start_building() -> NodePathBuilder {
        NodePathBuilder {
            selectors: vec![ElementSelector::Root],
        }
    }

    /// Start building a path below an existing one.
    pub fn start_building_from(path: &NodePath) -> NodePathBuilder {
        NodePathBuilder {
            selectors: path.selectors.clone(),
        }
    }

    /// The path of `self` extended by one selector.
    pub fn child(&self, selector: ElementSelector) -> NodePath {
        Self::start_building_from(self).element(selector).build()
    }

    pub fn element_selectors(&self) -> &[ElementSelector] {
        &self.selectors
    }

    pub fn last_element_selector(&self) -> &ElementSelector {
        // A path is never empty; the root selector is always present.
        self.selectors.last().unwrap_or(&ElementSelector::Root)
    }

    /// The parent path, or `None` for the root path.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            selectors: self.selectors[..self.selectors.len() - 1].to_vec(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.selectors.len() == 1
    }

    /// Number of selectors, including the root.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Always `false`: every path holds at least the root selector.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `self` is a strict prefix of `other`.
    pub fn is_parent_of(&self, other: &NodePath) -> bool {
        self.selectors.len() < other.selectors.len()
            && other.selectors[..self.selectors.len()] == self.selectors[..]
    }

    /// Returns `true` if `other` is a strict prefix of `self`.
    pub fn is_child_of(&self, other: &NodePath) -> bool {
        other.is_parent_of(self)
    }

    /// Returns `true` if `self` equals `other` or lies below it.
    pub fn matches_or_is_child_of(&self, other: &NodePath) -> bool {
        self == other || self.is_child_of(other)
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::with_root()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for (depth, selector) in self.selectors.iter().enumerate().skip(1) {
            match selector {
                ElementSelector::Root => {}
                ElementSelector::BeanProperty(_) => write!(f, "/{selector}")?,
                // Item and key selectors attach to the previous segment,
                // except directly below the root.
                _ if depth == 1 => write!(f, "/{selector}")?,
                _ => write!(f, "{selector}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePath({self})")
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Append-only builder for [`NodePath`]s.
#[derive(Clone, Debug)]
pub struct NodePathBuilder {
    selectors: Vec<ElementSelector>,
}

impl NodePathBuilder {
    pub fn property_name(mut self, name: impl Into<String>) -> Self {
        self.selectors.push(ElementSelector::property(name));
        self
    }

    pub fn property_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectors
            .extend(names.into_iter().map(ElementSelector::property));
        self
    }

    pub fn collection_item(mut self, item: impl Into<Value>) -> Self {
        self.selectors.push(ElementSelector::collection_item(item));
        self
    }

    pub fn collection_item_with(
        mut self,
        item: impl Into<Value>,
        identity: IdentityStrategyRef,
    ) -> Self {
        self.selectors
            .push(ElementSelector::collection_item_with(item, identity));
        self
    }

    pub fn map_key(mut self, key: impl Into<Value>) -> Self {
        self.selectors.push(ElementSelector::map_key(key));
        self
    }

    /// Append an arbitrary selector. A root selector is ignored, since a path
    /// holds exactly one.
    pub fn element(mut self, selector: ElementSelector) -> Self {
        if !selector.is_root() {
            self.selectors.push(selector);
        }
        self
    }

    pub fn build(self) -> NodePath {
        NodePath {
            selectors: self.selectors,
        }
    }
}
