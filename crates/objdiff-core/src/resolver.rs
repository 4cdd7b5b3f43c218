//! Policy resolvers consulted by the dispatcher and the differs.
//!
//! Each resolver is a pure function of the node it is asked about. The
//! engine ships a default implementation for each of them, driven by
//! [`DifferConfig`](crate::DifferConfig) and the registrations made on
//! [`ObjectDifferBuilder`](crate::ObjectDifferBuilder); any of them can be
//! replaced.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use objdiff_model::{AccessError, Introspector, TypeInfo, ValueType};
use tracing::warn;

use crate::comparison::{
    ArrayComparisonStrategy, ComparableComparisonStrategy, ComparisonStrategyRef,
    EqualsOnlyComparisonStrategy,
};
use crate::config::{DifferConfig, PrimitiveDefaultValueMode, ReturnableStates};
use crate::error::DiffResult;
use crate::identity::{EqualsIdentityStrategy, IdentityStrategyRef};
use crate::instances::Instances;
use crate::node::DiffNode;
use crate::path::NodePath;

// ---------------------------------------------------------------------------
// Resolver contracts
// ---------------------------------------------------------------------------

/// Decides whether a node is excluded. Ignored nodes are never read.
pub trait IsIgnoredResolver: Send + Sync {
    fn is_ignored(&self, node: &DiffNode) -> bool;
}

/// Decides whether a finished node is attached to its parent.
pub trait IsReturnableResolver: Send + Sync {
    fn is_returnable(&self, node: &DiffNode) -> bool;
}

pub trait ComparisonStrategyResolver: Send + Sync {
    /// A terminal comparison for the node, or `None` to introspect it.
    fn resolve_comparison_strategy(&self, node: &DiffNode) -> Option<ComparisonStrategyRef>;
}

pub trait IdentityStrategyResolver: Send + Sync {
    /// How the items of the collection at `node` are matched.
    fn resolve_identity_strategy(&self, node: &DiffNode) -> IdentityStrategyRef;
}

pub trait TypeInfoResolver: Send + Sync {
    fn type_info_for_node(&self, node: &DiffNode, instances: &Instances) -> DiffResult<TypeInfo>;
}

pub trait CategoryResolver: Send + Sync {
    fn resolve_categories(&self, node: &DiffNode) -> BTreeSet<String>;
}

pub trait PrimitiveDefaultValueModeResolver: Send + Sync {
    fn resolve_primitive_default_value_mode(&self, node: &DiffNode) -> PrimitiveDefaultValueMode;
}

/// Notified when a node closes a cycle. Must not fail.
pub trait CircularReferenceExceptionHandler: Send + Sync {
    fn on_circular_reference(&self, node: &DiffNode);
}

/// Decides what happens when a property cannot be read. Returning `Ok`
/// marks the node inaccessible; returning an error aborts the comparison.
pub trait PropertyAccessExceptionHandler: Send + Sync {
    fn on_property_read_error(&self, error: AccessError, node: &DiffNode) -> DiffResult<()>;
}

// ---------------------------------------------------------------------------
// Inclusion
// ---------------------------------------------------------------------------

/// Excludes nodes by property name, path or category.
#[derive(Clone, Debug, Default)]
pub struct InclusionRules {
    property_names: HashSet<String>,
    paths: HashSet<String>,
    categories: HashSet<String>,
}

impl InclusionRules {
    pub fn from_config(config: &DifferConfig) -> Self {
        Self {
            property_names: config.ignored_property_names.iter().cloned().collect(),
            paths: config.ignored_paths.iter().cloned().collect(),
            categories: config.ignored_categories.iter().cloned().collect(),
        }
    }

    pub fn ignore_property_name(&mut self, name: impl Into<String>) {
        self.property_names.insert(name.into());
    }

    pub fn ignore_path(&mut self, path: &NodePath) {
        self.paths.insert(path.to_string());
    }

    pub fn ignore_category(&mut self, category: impl Into<String>) {
        self.categories.insert(category.into());
    }
}

impl IsIgnoredResolver for InclusionRules {
    fn is_ignored(&self, node: &DiffNode) -> bool {
        if node.property_name().is_some_and(|name| self.property_names.contains(name)) {
            return true;
        }
        if !self.paths.is_empty() && self.paths.contains(&node.path().to_string()) {
            return true;
        }
        node.categories()
            .iter()
            .any(|category| self.categories.contains(category))
    }
}

// ---------------------------------------------------------------------------
// Returnability
// ---------------------------------------------------------------------------

impl IsReturnableResolver for ReturnableStates {
    fn is_returnable(&self, node: &DiffNode) -> bool {
        if node.is_root_node() || (node.is_untouched() && node.has_children()) {
            return true;
        }
        self.includes(node.state())
    }
}

// ---------------------------------------------------------------------------
// Comparison strategies
// ---------------------------------------------------------------------------

/// Path registrations first, then type registrations, then the configured
/// equals-only bean types, then the built-in strategies for simple types,
/// arrays and unresolved types.
///
/// Paths are keyed by their string form; compared values are confined to
/// one thread, registrations are not.
#[derive(Clone, Debug, Default)]
pub struct ComparisonStrategies {
    by_path: HashMap<String, ComparisonStrategyRef>,
    by_type: HashMap<ValueType, ComparisonStrategyRef>,
}

impl ComparisonStrategies {
    pub fn from_config(config: &DifferConfig) -> Self {
        let mut strategies = Self::default();
        for equals_only in &config.equals_only_types {
            let strategy = match &equals_only.value_provider {
                Some(provider) => EqualsOnlyComparisonStrategy::with_value_provider(provider),
                None => EqualsOnlyComparisonStrategy::new(),
            };
            strategies.register_type(ValueType::bean(&equals_only.type_name), Arc::new(strategy));
        }
        strategies
    }

    pub fn register_path(&mut self, path: &NodePath, strategy: ComparisonStrategyRef) {
        self.by_path.insert(path.to_string(), strategy);
    }

    pub fn register_type(&mut self, value_type: ValueType, strategy: ComparisonStrategyRef) {
        self.by_type.insert(value_type, strategy);
    }

    fn built_in(value_type: &ValueType) -> Option<ComparisonStrategyRef> {
        match value_type {
            ValueType::Boxed(_) | ValueType::Text => Some(Arc::new(ComparableComparisonStrategy)),
            ValueType::Array(_) => Some(Arc::new(ArrayComparisonStrategy)),
            ValueType::Object => Some(Arc::new(EqualsOnlyComparisonStrategy::new())),
            _ => None,
        }
    }
}

impl ComparisonStrategyResolver for ComparisonStrategies {
    fn resolve_comparison_strategy(&self, node: &DiffNode) -> Option<ComparisonStrategyRef> {
        if let Some(strategy) = lookup_path(&self.by_path, node) {
            return Some(Arc::clone(strategy));
        }
        let value_type = node.value_type()?;
        if let Some(strategy) = self.by_type.get(value_type) {
            return Some(Arc::clone(strategy));
        }
        Self::built_in(value_type)
    }
}

// ---------------------------------------------------------------------------
// Identity strategies
// ---------------------------------------------------------------------------

/// Path registrations, falling back to value equality.
#[derive(Clone, Debug)]
pub struct IdentityStrategies {
    by_path: HashMap<String, IdentityStrategyRef>,
    fallback: IdentityStrategyRef,
}

impl Default for IdentityStrategies {
    fn default() -> Self {
        Self {
            by_path: HashMap::new(),
            fallback: EqualsIdentityStrategy::shared(),
        }
    }
}

impl IdentityStrategies {
    /// Match the items of the collection at `path` with `strategy`.
    pub fn register_path(&mut self, path: &NodePath, strategy: IdentityStrategyRef) {
        self.by_path.insert(path.to_string(), strategy);
    }
}

impl IdentityStrategyResolver for IdentityStrategies {
    fn resolve_identity_strategy(&self, node: &DiffNode) -> IdentityStrategyRef {
        lookup_path(&self.by_path, node)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

// ---------------------------------------------------------------------------
// Type info
// ---------------------------------------------------------------------------

/// Delegates to an [`Introspector`], sampling the non-null compared values.
#[derive(Clone)]
pub struct IntrospectionTypeInfoResolver {
    introspector: Arc<dyn Introspector>,
}

impl IntrospectionTypeInfoResolver {
    pub fn new(introspector: Arc<dyn Introspector>) -> Self {
        Self { introspector }
    }
}

impl TypeInfoResolver for IntrospectionTypeInfoResolver {
    fn type_info_for_node(&self, node: &DiffNode, instances: &Instances) -> DiffResult<TypeInfo> {
        let value_type = node.value_type().cloned().unwrap_or(ValueType::Object);
        let samples: Vec<_> = [instances.working(), instances.base()]
            .into_iter()
            .filter(|value| !value.is_null())
            .collect();
        Ok(self.introspector.introspect(&value_type, &samples)?)
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Property tags plus categories registered for specific paths.
#[derive(Clone, Debug, Default)]
pub struct TagCategoryResolver {
    by_path: HashMap<String, BTreeSet<String>>,
}

impl TagCategoryResolver {
    pub fn register_path<I, S>(&mut self, path: &NodePath, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_path
            .entry(path.to_string())
            .or_default()
            .extend(categories.into_iter().map(Into::into));
    }
}

impl CategoryResolver for TagCategoryResolver {
    fn resolve_categories(&self, node: &DiffNode) -> BTreeSet<String> {
        let mut categories = node.property_tags();
        if let Some(registered) = lookup_path(&self.by_path, node) {
            categories.extend(registered.iter().cloned());
        }
        categories
    }
}

fn lookup_path<'m, T>(by_path: &'m HashMap<String, T>, node: &DiffNode) -> Option<&'m T> {
    if by_path.is_empty() {
        return None;
    }
    by_path.get(&node.path().to_string())
}

// ---------------------------------------------------------------------------
// Primitive default values
// ---------------------------------------------------------------------------

impl PrimitiveDefaultValueModeResolver for PrimitiveDefaultValueMode {
    fn resolve_primitive_default_value_mode(&self, _node: &DiffNode) -> PrimitiveDefaultValueMode {
        *self
    }
}

// ---------------------------------------------------------------------------
// Exception handlers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingCircularReferenceHandler;

impl CircularReferenceExceptionHandler for LoggingCircularReferenceHandler {
    fn on_circular_reference(&self, node: &DiffNode) {
        warn!(
            path = %node.path(),
            circle_start = %node.circle_start_path().map_or_else(String::new, |p| p.to_string()),
            "detected circular reference; not descending further"
        );
    }
}

/// Aborts the comparison on the first property read failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropagatingPropertyAccessHandler;

impl PropertyAccessExceptionHandler for PropagatingPropertyAccessHandler {
    fn on_property_read_error(&self, error: AccessError, _node: &DiffNode) -> DiffResult<()> {
        Err(error.into())
    }
}

/// Logs property read failures and marks the node inaccessible.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingPropertyAccessHandler;

impl PropertyAccessExceptionHandler for LoggingPropertyAccessHandler {
    fn on_property_read_error(&self, error: AccessError, node: &DiffNode) -> DiffResult<()> {
        warn!(path = %node.path(), %error, "property is inaccessible");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::BeanPropertyAccessor;
    use crate::node::State;
    use crate::identity::PropertyIdentityStrategy;
    use objdiff_model::{CollectionKind, PrimitiveKind, PropertyDescriptor};
    use std::rc::Rc;

    fn property_node(parent: &DiffNode, property: PropertyDescriptor) -> DiffNode {
        DiffNode::child_of(parent, Rc::new(BeanPropertyAccessor::new(property)))
    }

    #[test]
    fn inclusion_by_name_path_and_category() {
        let root = DiffNode::root(None);
        let config = DifferConfig {
            ignored_property_names: vec!["secret".into()],
            ignored_paths: vec!["/internal".into()],
            ignored_categories: vec!["audit".into()],
            ..Default::default()
        };
        let rules = InclusionRules::from_config(&config);

        let secret = property_node(&root, PropertyDescriptor::bean_field("secret"));
        let internal = property_node(&root, PropertyDescriptor::bean_field("internal"));
        let mut audited =
            property_node(&root, PropertyDescriptor::bean_field("stamp").with_tag("audit"));
        let plain = property_node(&root, PropertyDescriptor::bean_field("name"));

        assert!(rules.is_ignored(&secret));
        assert!(rules.is_ignored(&internal));
        assert!(!rules.is_ignored(&audited));
        audited.add_categories(TagCategoryResolver::default().resolve_categories(&audited));
        assert!(rules.is_ignored(&audited));
        assert!(!rules.is_ignored(&plain));
    }

    #[test]
    fn returnability_follows_state_filter() {
        let states = ReturnableStates::default();
        let mut root = DiffNode::root(None);
        assert!(states.is_returnable(&root));

        let untouched = property_node(&root, PropertyDescriptor::bean_field("a"));
        assert!(!states.is_returnable(&untouched));

        let mut with_children = property_node(&root, PropertyDescriptor::bean_field("b"));
        let grandchild = property_node(&with_children, PropertyDescriptor::bean_field("c"));
        with_children.add_child(grandchild);
        assert!(states.is_returnable(&with_children));

        let mut ignored = property_node(&root, PropertyDescriptor::bean_field("d"));
        ignored.set_state(State::Ignored);
        assert!(!states.is_returnable(&ignored));
        root.add_child(ignored);
    }

    #[test]
    fn comparison_strategy_resolution_order() {
        let mut strategies = ComparisonStrategies::from_config(&DifferConfig {
            equals_only_types: vec![crate::config::EqualsOnlyType::new("Money")],
            ..Default::default()
        });
        let path = NodePath::start_building().property_name("custom").build();
        strategies.register_path(&path, Arc::new(ArrayComparisonStrategy));

        let root = DiffNode::root(None);
        let mut money = property_node(&root, PropertyDescriptor::bean_field("price"));
        money.set_value_type(Some(ValueType::bean("Money")));
        assert!(strategies.resolve_comparison_strategy(&money).is_some());

        let mut text = property_node(&root, PropertyDescriptor::bean_field("name"));
        text.set_value_type(Some(ValueType::Text));
        assert!(format!("{:?}", strategies.resolve_comparison_strategy(&text))
            .contains("Comparable"));

        let mut custom = property_node(&root, PropertyDescriptor::bean_field("custom"));
        custom.set_value_type(Some(ValueType::Text));
        assert!(format!("{:?}", strategies.resolve_comparison_strategy(&custom))
            .contains("Array"));

        let mut list = property_node(&root, PropertyDescriptor::bean_field("items"));
        list.set_value_type(Some(ValueType::Collection(CollectionKind::List)));
        assert!(strategies.resolve_comparison_strategy(&list).is_none());

        let mut primitive = property_node(&root, PropertyDescriptor::bean_field("n"));
        primitive.set_value_type(Some(ValueType::Primitive(PrimitiveKind::I32)));
        assert!(strategies.resolve_comparison_strategy(&primitive).is_none());
    }

    #[test]
    fn identity_strategy_by_path() {
        let mut strategies = IdentityStrategies::default();
        let path = NodePath::start_building().property_name("items").build();
        strategies.register_path(&path, Arc::new(PropertyIdentityStrategy::new(["id"])));

        let root = DiffNode::root(None);
        let items = property_node(&root, PropertyDescriptor::bean_field("items"));
        let other = property_node(&root, PropertyDescriptor::bean_field("other"));
        assert!(format!("{:?}", strategies.resolve_identity_strategy(&items))
            .contains("PropertyIdentityStrategy"));
        assert!(format!("{:?}", strategies.resolve_identity_strategy(&other))
            .contains("EqualsIdentityStrategy"));
    }

    #[test]
    fn registries_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ComparisonStrategies>();
        assert_send_sync::<IdentityStrategies>();
        assert_send_sync::<TagCategoryResolver>();
        assert_send_sync::<InclusionRules>();
    }

    #[test]
    fn item_path_registrations_match_by_rendered_path() {
        let mut strategies = IdentityStrategies::default();
        let registered = NodePath::start_building()
            .property_name("groups")
            .collection_item("admins")
            .property_name("members")
            .build();
        strategies.register_path(&registered, Arc::new(PropertyIdentityStrategy::new(["id"])));

        let root = DiffNode::root(None);
        let groups = property_node(&root, PropertyDescriptor::bean_field("groups"));
        let item = DiffNode::child_of(
            &groups,
            Rc::new(crate::accessor::CollectionItemAccessor::new(
                "admins".into(),
                EqualsIdentityStrategy::shared(),
            )),
        );
        let members = property_node(&item, PropertyDescriptor::bean_field("members"));
        assert_eq!(members.path().to_string(), "/groups[admins]/members");
        assert!(format!("{:?}", strategies.resolve_identity_strategy(&members))
            .contains("PropertyIdentityStrategy"));
    }

    #[test]
    fn categories_merge_tags_and_paths() {
        let mut resolver = TagCategoryResolver::default();
        let path = NodePath::start_building().property_name("a").build();
        resolver.register_path(&path, ["pii"]);

        let root = DiffNode::root(None);
        let node = property_node(&root, PropertyDescriptor::bean_field("a").with_tag("audit"));
        let categories: Vec<String> = resolver.resolve_categories(&node).into_iter().collect();
        assert_eq!(categories, vec!["audit".to_string(), "pii".to_string()]);
    }

    #[test]
    fn access_handlers() {
        let root = DiffNode::root(None);
        let error = AccessError::PropertyRead {
            property: "x".into(),
            target_type: "P".into(),
            reason: "boom".into(),
        };
        assert!(PropagatingPropertyAccessHandler
            .on_property_read_error(error.clone(), &root)
            .is_err());
        assert!(LoggingPropertyAccessHandler
            .on_property_read_error(error, &root)
            .is_ok());
    }
}
