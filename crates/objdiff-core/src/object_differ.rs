use std::sync::Arc;

use objdiff_model::{DefaultIntrospector, Introspector, Value, ValueType};
use tracing::debug;

use crate::circular::CircularReferenceMatchingMode;
use crate::comparison::ComparisonStrategyRef;
use crate::config::{DifferConfig, EqualsOnlyType, PrimitiveDefaultValueMode, ReturnableStates};
use crate::dispatcher::{DifferDispatcher, Policies};
use crate::error::{DiffError, DiffResult};
use crate::identity::IdentityStrategyRef;
use crate::instances::Instances;
use crate::node::DiffNode;
use crate::path::NodePath;
use crate::resolver::{
    CategoryResolver, CircularReferenceExceptionHandler, ComparisonStrategies,
    ComparisonStrategyResolver, IdentityStrategies, IdentityStrategyResolver, InclusionRules,
    IntrospectionTypeInfoResolver, IsIgnoredResolver, IsReturnableResolver,
    LoggingCircularReferenceHandler, PrimitiveDefaultValueModeResolver,
    PropagatingPropertyAccessHandler, PropertyAccessExceptionHandler, TagCategoryResolver,
    TypeInfoResolver,
};

// ---------------------------------------------------------------------------
// ObjectDiffer
// ---------------------------------------------------------------------------

/// Compares two object graphs and produces a tree of [`DiffNode`]s.
///
/// A differ holds only configuration and resolvers; each call to
/// [`compare`](Self::compare) runs with its own traversal state, so one
/// differ can serve any number of comparisons.
#[derive(Clone)]
pub struct ObjectDiffer {
    config: DifferConfig,
    pub(crate) policies: Policies,
}

impl ObjectDiffer {
    /// A differ with the default configuration.
    pub fn new() -> Self {
        ObjectDifferBuilder::new().build()
    }

    pub fn builder() -> ObjectDifferBuilder {
        ObjectDifferBuilder::new()
    }

    /// The declarative part of the active configuration.
    pub fn config(&self) -> &DifferConfig {
        &self.config
    }

    /// Compare `working` against `base`.
    ///
    /// The returned root node is untouched when the graphs are equal, added
    /// when only `working` exists, removed when only `base` exists and
    /// changed when any node below it carries a change.
    ///
    /// Both values must be of the same type (or share a collection or map
    /// supertype); anything else is rejected with
    /// [`DiffError::InvalidArgument`].
    pub fn compare(&self, working: &Value, base: &Value) -> DiffResult<DiffNode> {
        if let (Some(w), Some(b)) = (working.value_type(), base.value_type()) {
            if ValueType::common_supertype(&w, &b).is_none() {
                return Err(DiffError::InvalidArgument(format!(
                    "working and base must be of the same type, got {w} and {b}"
                )));
            }
        }

        let instances = Instances::root(working.clone(), base.clone());
        let mut dispatcher = DifferDispatcher::new(&self.policies);
        let root = dispatcher.dispatch_root(&instances)?;
        debug!(
            state = %root.state(),
            children = root.child_count(),
            "comparison finished"
        );
        Ok(root)
    }
}

impl Default for ObjectDiffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ObjectDifferBuilder
// ---------------------------------------------------------------------------

/// Configures an [`ObjectDiffer`].
///
/// Declarative settings live in a [`DifferConfig`]; strategies, categories
/// and replacement resolvers are registered programmatically. A replaced
/// resolver takes precedence over the configuration it would otherwise be
/// derived from.
#[derive(Default)]
pub struct ObjectDifferBuilder {
    config: DifferConfig,
    comparison_strategies: Vec<(Registration, ComparisonStrategyRef)>,
    identity_strategies: IdentityStrategies,
    categories: TagCategoryResolver,
    introspector: Option<Arc<dyn Introspector>>,
    is_ignored: Option<Arc<dyn IsIgnoredResolver>>,
    is_returnable: Option<Arc<dyn IsReturnableResolver>>,
    comparison: Option<Arc<dyn ComparisonStrategyResolver>>,
    identity: Option<Arc<dyn IdentityStrategyResolver>>,
    type_info: Option<Arc<dyn TypeInfoResolver>>,
    category: Option<Arc<dyn CategoryResolver>>,
    primitive_default_value_mode: Option<Arc<dyn PrimitiveDefaultValueModeResolver>>,
    circular_reference_handler: Option<Arc<dyn CircularReferenceExceptionHandler>>,
    property_access_handler: Option<Arc<dyn PropertyAccessExceptionHandler>>,
}

enum Registration {
    Path(NodePath),
    Type(ValueType),
}

impl ObjectDifferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a declarative configuration.
    pub fn with_config(config: DifferConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // -- inclusion ----------------------------------------------------------

    /// Exclude every bean property with this name.
    pub fn ignore_property(mut self, name: impl Into<String>) -> Self {
        self.config.ignored_property_names.push(name.into());
        self
    }

    pub fn ignore_path(mut self, path: &NodePath) -> Self {
        self.config.ignored_paths.push(path.to_string());
        self
    }

    /// Exclude every node carrying this category.
    pub fn ignore_category(mut self, category: impl Into<String>) -> Self {
        self.config.ignored_categories.push(category.into());
        self
    }

    // -- behaviour ----------------------------------------------------------

    pub fn returnable_states(mut self, states: ReturnableStates) -> Self {
        self.config.returnable_states = states;
        self
    }

    pub fn primitive_default_value_mode(mut self, mode: PrimitiveDefaultValueMode) -> Self {
        self.config.primitive_default_value_mode = mode;
        self
    }

    pub fn circular_reference_matching_mode(mut self, mode: CircularReferenceMatchingMode) -> Self {
        self.config.circular_reference_matching_mode = mode;
        self
    }

    pub fn introspect_added_and_removed(mut self, enabled: bool) -> Self {
        self.config.introspect_added_and_removed = enabled;
        self
    }

    pub fn sequence_alignment(mut self, enabled: bool) -> Self {
        self.config.sequence_alignment = enabled;
        self
    }

    // -- strategies ---------------------------------------------------------

    /// Compare beans of the given type by equality only.
    pub fn equals_only_type(mut self, equals_only: EqualsOnlyType) -> Self {
        self.config.equals_only_types.push(equals_only);
        self
    }

    pub fn comparison_strategy_for_path(
        mut self,
        path: NodePath,
        strategy: ComparisonStrategyRef,
    ) -> Self {
        self.comparison_strategies
            .push((Registration::Path(path), strategy));
        self
    }

    pub fn comparison_strategy_for_type(
        mut self,
        value_type: ValueType,
        strategy: ComparisonStrategyRef,
    ) -> Self {
        self.comparison_strategies
            .push((Registration::Type(value_type), strategy));
        self
    }

    /// Match the items of the collection at `path` with `strategy`.
    pub fn identity_strategy_for_path(mut self, path: NodePath, strategy: IdentityStrategyRef) -> Self {
        self.identity_strategies.register_path(&path, strategy);
        self
    }

    pub fn categories_for_path<I, S>(mut self, path: NodePath, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.register_path(&path, categories);
        self
    }

    pub fn introspector(mut self, introspector: Arc<dyn Introspector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    // -- replacement resolvers ----------------------------------------------

    pub fn is_ignored_resolver(mut self, resolver: Arc<dyn IsIgnoredResolver>) -> Self {
        self.is_ignored = Some(resolver);
        self
    }

    pub fn is_returnable_resolver(mut self, resolver: Arc<dyn IsReturnableResolver>) -> Self {
        self.is_returnable = Some(resolver);
        self
    }

    pub fn comparison_strategy_resolver(
        mut self,
        resolver: Arc<dyn ComparisonStrategyResolver>,
    ) -> Self {
        self.comparison = Some(resolver);
        self
    }

    pub fn identity_strategy_resolver(mut self, resolver: Arc<dyn IdentityStrategyResolver>) -> Self {
        self.identity = Some(resolver);
        self
    }

    pub fn type_info_resolver(mut self, resolver: Arc<dyn TypeInfoResolver>) -> Self {
        self.type_info = Some(resolver);
        self
    }

    pub fn category_resolver(mut self, resolver: Arc<dyn CategoryResolver>) -> Self {
        self.category = Some(resolver);
        self
    }

    pub fn primitive_default_value_mode_resolver(
        mut self,
        resolver: Arc<dyn PrimitiveDefaultValueModeResolver>,
    ) -> Self {
        self.primitive_default_value_mode = Some(resolver);
        self
    }

    pub fn circular_reference_handler(
        mut self,
        handler: Arc<dyn CircularReferenceExceptionHandler>,
    ) -> Self {
        self.circular_reference_handler = Some(handler);
        self
    }

    pub fn property_access_handler(mut self, handler: Arc<dyn PropertyAccessExceptionHandler>) -> Self {
        self.property_access_handler = Some(handler);
        self
    }

    pub fn build(self) -> ObjectDiffer {
        let config = self.config;

        let comparison = self.comparison.unwrap_or_else(|| {
            let mut strategies = ComparisonStrategies::from_config(&config);
            for (registration, strategy) in self.comparison_strategies {
                match registration {
                    Registration::Path(path) => strategies.register_path(&path, strategy),
                    Registration::Type(value_type) => strategies.register_type(value_type, strategy),
                }
            }
            Arc::new(strategies)
        });
        let introspector = self
            .introspector
            .unwrap_or_else(|| Arc::new(DefaultIntrospector::new()));

        let policies = Policies {
            is_ignored: self
                .is_ignored
                .unwrap_or_else(|| Arc::new(InclusionRules::from_config(&config))),
            is_returnable: self
                .is_returnable
                .unwrap_or_else(|| Arc::new(config.returnable_states.clone())),
            comparison,
            identity: self
                .identity
                .unwrap_or_else(|| Arc::new(self.identity_strategies)),
            type_info: self
                .type_info
                .unwrap_or_else(|| Arc::new(IntrospectionTypeInfoResolver::new(introspector))),
            categories: self.category.unwrap_or_else(|| Arc::new(self.categories)),
            primitive_default_value_mode: self
                .primitive_default_value_mode
                .unwrap_or_else(|| Arc::new(config.primitive_default_value_mode)),
            circular_reference_handler: self
                .circular_reference_handler
                .unwrap_or_else(|| Arc::new(LoggingCircularReferenceHandler)),
            property_access_handler: self
                .property_access_handler
                .unwrap_or_else(|| Arc::new(PropagatingPropertyAccessHandler)),
            circular_reference_matching_mode: config.circular_reference_matching_mode,
            introspect_added_and_removed: config.introspect_added_and_removed,
            sequence_alignment: config.sequence_alignment,
        };

        ObjectDiffer { config, policies }
    }
}
