//! The difference tree.
//!
//! Every location visited during a comparison produces one [`DiffNode`].
//! A node records what happened at its location ([`State`]), where the
//! location is ([`NodePath`]), and the child nodes below it. Nodes are built
//! by the differ that owns the comparison step and are immutable once
//! returned from [`ObjectDiffer::compare`](crate::ObjectDiffer::compare).
//!
//! Each node also keeps the chain of accessors that leads to it from the
//! root, so a node can read or write its location on any object graph of the
//! compared type (`canonical_get` / `canonical_set`).

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use objdiff_model::{PropertyDescriptor, Value, ValueType};

use crate::accessor::{AccessorRef, RootAccessor};
use crate::error::{DiffError, DiffResult};
use crate::path::NodePath;
use crate::selector::ElementSelector;

/// What happened at a node's location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Present in both graphs and equal, or not compared.
    #[default]
    Untouched,
    /// Present in the working graph only.
    Added,
    /// Present in the base graph only.
    Removed,
    /// Present in both graphs with differing values.
    Changed,
    /// The location closes a cycle and was not descended into.
    Circular,
    /// Excluded by the inclusion rules. Its values were never read.
    Ignored,
    /// Its values could not be read.
    Inaccessible,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untouched => "untouched",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Circular => "circular",
            Self::Ignored => "ignored",
            Self::Inaccessible => "inaccessible",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link of the accessor chain from the root to a node.
#[derive(Debug)]
struct Lineage {
    accessor: AccessorRef,
    value_type: Option<ValueType>,
    parent: Option<Rc<Lineage>>,
}

impl Lineage {
    /// Links from the root down to `self`, root first.
    fn chain(self: &Rc<Self>) -> Vec<Rc<Lineage>> {
        let mut links = Vec::new();
        let mut current = Some(Rc::clone(self));
        while let Some(link) = current {
            current = link.parent.clone();
            links.push(link);
        }
        links.reverse();
        links
    }
}

// ---------------------------------------------------------------------------
// Traversal control
// ---------------------------------------------------------------------------

/// Traversal control handed to a [`NodeVisitor`] for each node.
#[derive(Debug, Default)]
pub struct Visit {
    stopped: bool,
    skip_children: bool,
}

impl Visit {
    /// End the traversal after the current node.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Do not visit the children of the current node.
    pub fn dont_go_deeper(&mut self) {
        self.skip_children = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

pub trait NodeVisitor {
    fn node(&mut self, node: &DiffNode, visit: &mut Visit);
}

impl<F> NodeVisitor for F
where
    F: FnMut(&DiffNode, &mut Visit),
{
    fn node(&mut self, node: &DiffNode, visit: &mut Visit) {
        self(node, visit)
    }
}

// ---------------------------------------------------------------------------
// DiffNode
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct DiffNode {
    lineage: Rc<Lineage>,
    path: NodePath,
    state: State,
    children: Vec<DiffNode>,
    index: HashMap<ElementSelector, usize>,
    circle_start_path: Option<NodePath>,
    categories: BTreeSet<String>,
}

impl DiffNode {
    /// A root node for a comparison of `value_type` instances.
    pub fn root(value_type: Option<ValueType>) -> Self {
        Self {
            lineage: Rc::new(Lineage {
                accessor: Rc::new(RootAccessor),
                value_type,
                parent: None,
            }),
            path: NodePath::with_root(),
            state: State::Untouched,
            children: Vec::new(),
            index: HashMap::new(),
            circle_start_path: None,
            categories: BTreeSet::new(),
        }
    }

    /// A node reached from `parent` through `accessor`.
    pub(crate) fn child_of(parent: &DiffNode, accessor: AccessorRef) -> Self {
        let path = parent.path.child(accessor.element_selector());
        Self {
            lineage: Rc::new(Lineage {
                accessor,
                value_type: None,
                parent: Some(Rc::clone(&parent.lineage)),
            }),
            path,
            state: State::Untouched,
            children: Vec::new(),
            index: HashMap::new(),
            circle_start_path: None,
            categories: BTreeSet::new(),
        }
    }

    // -- identity -----------------------------------------------------------

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn element_selector(&self) -> &ElementSelector {
        self.path.last_element_selector()
    }

    pub fn accessor(&self) -> &AccessorRef {
        &self.lineage.accessor
    }

    pub fn property_name(&self) -> Option<&str> {
        self.element_selector().property_name()
    }

    /// Descriptor of the bean property this node was reached through.
    pub fn property(&self) -> Option<&PropertyDescriptor> {
        self.lineage.accessor.property()
    }

    /// Tags declared on the bean property this node was reached through.
    pub fn property_tags(&self) -> BTreeSet<String> {
        self.property()
            .map(|p| p.tags().clone())
            .unwrap_or_default()
    }

    pub fn value_type(&self) -> Option<&ValueType> {
        self.lineage.value_type.as_ref()
    }

    pub fn is_root_node(&self) -> bool {
        self.path.is_root()
    }

    // -- state --------------------------------------------------------------

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_untouched(&self) -> bool {
        self.state == State::Untouched
    }

    pub fn is_added(&self) -> bool {
        self.state == State::Added
    }

    pub fn is_removed(&self) -> bool {
        self.state == State::Removed
    }

    pub fn is_changed(&self) -> bool {
        self.state == State::Changed
    }

    pub fn is_circular(&self) -> bool {
        self.state == State::Circular
    }

    pub fn is_ignored(&self) -> bool {
        self.state == State::Ignored
    }

    pub fn is_inaccessible(&self) -> bool {
        self.state == State::Inaccessible
    }

    /// Returns `true` if this node or any node below it was added, removed
    /// or changed.
    pub fn has_changes(&self) -> bool {
        matches!(self.state, State::Added | State::Removed | State::Changed)
            || self.children.iter().any(DiffNode::has_changes)
    }

    /// The path where the cycle closed by this node started.
    pub fn circle_start_path(&self) -> Option<&NodePath> {
        self.circle_start_path.as_ref()
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    // -- children -----------------------------------------------------------

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[DiffNode] {
        &self.children
    }

    pub fn child(&self, selector: &ElementSelector) -> Option<&DiffNode> {
        self.index.get(selector).map(|&i| &self.children[i])
    }

    pub fn child_by_property(&self, name: &str) -> Option<&DiffNode> {
        self.child(&ElementSelector::property(name))
    }

    /// The descendant at `path`, or `self` if `path` is this node's path.
    pub fn child_at(&self, path: &NodePath) -> Option<&DiffNode> {
        if *path == self.path {
            return Some(self);
        }
        if !self.path.is_parent_of(path) {
            return None;
        }
        let selector = &path.element_selectors()[self.path.len()];
        self.child(selector)?.child_at(path)
    }

    // -- traversal ----------------------------------------------------------

    /// Visit this node and its descendants, depth first.
    pub fn visit<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) {
        self.visit_node(visitor);
    }

    /// Visit the descendants of this node, depth first.
    pub fn visit_children<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) {
        for child in &self.children {
            if !child.visit_node(visitor) {
                return;
            }
        }
    }

    /// Returns `false` once the visitor asked to stop.
    fn visit_node<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) -> bool {
        let mut visit = Visit::default();
        visitor.node(self, &mut visit);
        if visit.stopped {
            return false;
        }
        if visit.skip_children {
            return true;
        }
        self.children.iter().all(|child| child.visit_node(visitor))
    }

    // -- value access -------------------------------------------------------

    /// Read this node's location from an object graph rooted at `target`.
    pub fn canonical_get(&self, target: &Value) -> DiffResult<Value> {
        let mut current = target.clone();
        for link in self.lineage.chain() {
            current = link.accessor.get(&current)?;
        }
        Ok(current)
    }

    /// Write `value` at this node's location in the graph rooted at
    /// `target`. Missing intermediate objects are created.
    pub fn canonical_set(&self, target: &Value, value: Value) -> DiffResult<()> {
        let chain = self.lineage.chain();
        let Some((own, ancestors)) = chain.split_last() else {
            return Ok(());
        };
        let mut current = target.clone();
        for link in ancestors {
            let next = link.accessor.get(&current)?;
            current = if next.is_null() {
                let created = link
                    .value_type
                    .as_ref()
                    .and_then(ValueType::new_instance)
                    .ok_or_else(|| {
                        DiffError::InvalidArgument(format!(
                            "cannot create a missing intermediate value of type {} below {}",
                            link.value_type
                                .as_ref()
                                .map_or_else(|| "unknown".to_string(), |t| t.to_string()),
                            self.path
                        ))
                    })?;
                link.accessor.set(&current, created.clone())?;
                created
            } else {
                next
            };
        }
        own.accessor.set(&current, value)
    }

    /// Remove this node's location from the graph rooted at `target`.
    pub fn canonical_unset(&self, target: &Value) -> DiffResult<()> {
        let Some(parent) = &self.lineage.parent else {
            return self.lineage.accessor.unset(target);
        };
        let mut current = target.clone();
        for link in parent.chain() {
            current = link.accessor.get(&current)?;
            if current.is_null() {
                return Ok(());
            }
        }
        self.lineage.accessor.unset(&current)
    }

    /// Read this node's value from its parent object.
    pub fn get(&self, parent_object: &Value) -> DiffResult<Value> {
        self.lineage.accessor.get(parent_object)
    }

    /// Write this node's value on its parent object.
    pub fn set(&self, parent_object: &Value, value: Value) -> DiffResult<()> {
        self.lineage.accessor.set(parent_object, value)
    }

    /// Remove this node's value from its parent object.
    pub fn unset(&self, parent_object: &Value) -> DiffResult<()> {
        self.lineage.accessor.unset(parent_object)
    }

    // -- construction -------------------------------------------------------

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub(crate) fn set_value_type(&mut self, value_type: Option<ValueType>) {
        self.lineage = Rc::new(Lineage {
            accessor: Rc::clone(&self.lineage.accessor),
            value_type,
            parent: self.lineage.parent.clone(),
        });
    }

    pub(crate) fn mark_circular(&mut self, start: NodePath) {
        self.state = State::Circular;
        self.circle_start_path = Some(start);
    }

    pub(crate) fn add_categories(&mut self, categories: impl IntoIterator<Item = String>) {
        self.categories.extend(categories);
    }

    /// Attach `child`, replacing any previous child with the same selector.
    /// An untouched node becomes changed when the child carries changes.
    pub(crate) fn add_child(&mut self, child: DiffNode) {
        debug_assert!(child.path.is_child_of(&self.path));
        if self.state == State::Untouched && child.has_changes() {
            self.state = State::Changed;
        }
        let selector = child.element_selector().clone();
        match self.index.get(&selector) {
            Some(&i) => self.children[i] = child,
            None => {
                self.index.insert(selector, self.children.len());
                self.children.push(child);
            }
        }
    }
}

impl fmt::Display for DiffNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiffNode(state={}", self.state)?;
        if let Some(ty) = self.value_type() {
            write!(f, ", type={ty}")?;
        }
        match self.children.len() {
            0 => {}
            1 => f.write_str(", 1 child")?,
            n => write!(f, ", {n} children")?,
        }
        match self.element_selector() {
            ElementSelector::Root => f.write_str(", root")?,
            ElementSelector::BeanProperty(name) => {
                write!(f, ", accessed via property '{name}'")?
            }
            other => write!(f, ", accessed via {other}")?,
        }
        if let Some(start) = &self.circle_start_path {
            write!(f, ", circle starts at {start}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for DiffNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffNode")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("value_type", &self.value_type())
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{BeanPropertyAccessor, MapEntryAccessor};
    use objdiff_model::{Bean, MapKind, PropertyDescriptor};

    fn property(parent: &DiffNode, name: &str) -> DiffNode {
        DiffNode::child_of(
            parent,
            Rc::new(BeanPropertyAccessor::new(PropertyDescriptor::bean_field(name))),
        )
    }

    #[test]
    fn child_path_extends_parent_path() {
        let root = DiffNode::root(None);
        let child = property(&root, "name");
        assert_eq!(
            child.path(),
            &NodePath::start_building().property_name("name").build()
        );
        assert_eq!(child.property_name(), Some("name"));
    }

    #[test]
    fn adding_changed_child_marks_parent_changed() {
        let mut root = DiffNode::root(None);
        let mut child = property(&root, "a");
        child.set_state(State::Added);
        root.add_child(child);
        assert!(root.is_changed());
        assert!(root.has_changes());
        assert!(root.child_by_property("a").is_some_and(DiffNode::is_added));
    }

    #[test]
    fn re_adding_a_selector_replaces_the_child() {
        let mut root = DiffNode::root(None);
        root.add_child(property(&root, "a"));
        let mut replacement = property(&root, "a");
        replacement.set_state(State::Removed);
        root.add_child(replacement);
        assert_eq!(root.child_count(), 1);
        assert!(root.child_by_property("a").is_some_and(DiffNode::is_removed));
    }

    #[test]
    fn child_at_walks_the_tree() {
        let mut root = DiffNode::root(None);
        let mut a = property(&root, "a");
        a.add_child(property(&a, "b"));
        root.add_child(a);

        let path = NodePath::start_building().property_names(["a", "b"]).build();
        assert_eq!(root.child_at(&path).map(DiffNode::path), Some(&path));
        assert!(root
            .child_at(&NodePath::start_building().property_name("x").build())
            .is_none());
        assert!(root.child_at(&NodePath::with_root()).is_some());
    }

    #[test]
    fn visit_honours_stop_and_dont_go_deeper() {
        let mut root = DiffNode::root(None);
        let mut a = property(&root, "a");
        a.add_child(property(&a, "deep"));
        root.add_child(a);
        root.add_child(property(&root, "b"));

        let mut seen = Vec::new();
        root.visit(&mut |node: &DiffNode, visit: &mut Visit| {
            seen.push(node.path().to_string());
            if node.property_name() == Some("a") {
                visit.dont_go_deeper();
            }
        });
        assert_eq!(seen, vec!["/", "/a", "/b"]);

        let mut count = 0;
        root.visit(&mut |_: &DiffNode, visit: &mut Visit| {
            count += 1;
            if count == 2 {
                visit.stop();
            }
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn canonical_get_and_set_follow_the_accessor_chain() {
        let root = DiffNode::root(Some(ValueType::bean("Person")));
        let mut address = property(&root, "address");
        address.set_value_type(Some(ValueType::bean("Address")));
        let street = property(&address, "street");

        let person = Value::from(
            Bean::new("Person").with("address", Bean::new("Address").with("street", "Main")),
        );
        assert_eq!(street.canonical_get(&person).unwrap(), Value::text("Main"));

        let empty = Value::from(Bean::new("Person"));
        street.canonical_set(&empty, "Elm".into()).unwrap();
        assert_eq!(street.canonical_get(&empty).unwrap(), Value::text("Elm"));

        street.canonical_unset(&empty).unwrap();
        assert_eq!(street.canonical_get(&empty).unwrap(), Value::Null);
    }

    #[test]
    fn canonical_set_through_map_entries() {
        let root = DiffNode::root(Some(ValueType::Map(MapKind::Linked)));
        let entry = DiffNode::child_of(&root, Rc::new(MapEntryAccessor::new("k".into())));
        let map = Value::linked_map([]);
        entry.canonical_set(&map, "v".into()).unwrap();
        assert_eq!(entry.canonical_get(&map).unwrap(), Value::text("v"));
    }

    #[test]
    fn root_cannot_be_set() {
        let root = DiffNode::root(None);
        assert!(root.canonical_set(&Value::Null, Value::text("x")).is_err());
    }

    #[test]
    fn display_mentions_state_and_property() {
        let root = DiffNode::root(None);
        let mut child = property(&root, "name");
        child.set_state(State::Changed);
        assert_eq!(
            child.to_string(),
            "DiffNode(state=changed, accessed via property 'name')"
        );
    }

    #[test]
    fn state_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&State::Inaccessible).unwrap(),
            "\"inaccessible\""
        );
    }
}
