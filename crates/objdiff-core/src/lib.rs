//! Object-graph differencing engine.
//!
//! [`ObjectDiffer::compare`] walks a working and a base object graph in
//! lockstep and returns a tree of [`DiffNode`]s describing every location
//! that was added, removed, changed or that closes a cycle. Each node knows
//! how to read, write and remove its value in any graph of the same shape,
//! so a result can be applied to a third object.
//!
//! What is compared and how is decided per node by a set of resolvers:
//! inclusion rules, comparison strategies, identity strategies for
//! collection items, categories and handlers for circular references and
//! unreadable properties. The defaults are configured through
//! [`DifferConfig`] (loadable from TOML) and [`ObjectDifferBuilder`].
//!
//! # Key Types
//!
//! - [`ObjectDiffer`] / [`ObjectDifferBuilder`] -- Entry point and its configuration
//! - [`DiffNode`] / [`State`] -- The result tree
//! - [`NodePath`] / [`ElementSelector`] -- Addressing locations in a graph
//! - [`Accessor`] -- Reading and writing one step of a path
//! - [`IdentityStrategy`] / [`ComparisonStrategy`] -- Pluggable matching and comparison
//! - [`CircularReferenceDetector`] -- Cycle detection along the traversal stack
//! - [`ChangeSummary`] -- Flat, serializable list of changes

pub mod accessor;
pub mod circular;
pub mod comparison;
pub mod config;
mod differ;
mod dispatcher;
pub mod error;
pub mod identity;
pub mod instances;
pub mod node;
pub mod object_differ;
pub mod path;
pub mod resolver;
pub mod selector;
pub mod sequence;
pub mod summary;

pub use accessor::{
    Accessor, AccessorRef, BeanPropertyAccessor, CollectionItemAccessor, MapEntryAccessor,
    RootAccessor, SequenceItemAccessor, Side,
};
pub use circular::{CircularReference, CircularReferenceDetector, CircularReferenceMatchingMode};
pub use comparison::{
    ArrayComparisonStrategy, ComparableComparisonStrategy, ComparisonStrategy,
    ComparisonStrategyRef, EqualsOnlyComparisonStrategy,
};
pub use config::{DifferConfig, EqualsOnlyType, PrimitiveDefaultValueMode, ReturnableStates};
pub use error::{DiffError, DiffResult};
pub use identity::{
    EqualsIdentityStrategy, IdentityStrategy, IdentityStrategyRef, PropertyIdentityStrategy,
    CONSTANT_IDENTITY_HASH,
};
pub use instances::Instances;
pub use node::{DiffNode, NodeVisitor, State, Visit};
pub use object_differ::{ObjectDiffer, ObjectDifferBuilder};
pub use path::{NodePath, NodePathBuilder};
pub use resolver::{
    CategoryResolver, CircularReferenceExceptionHandler, ComparisonStrategies,
    ComparisonStrategyResolver, IdentityStrategies, IdentityStrategyResolver, InclusionRules,
    IntrospectionTypeInfoResolver, IsIgnoredResolver, IsReturnableResolver,
    LoggingCircularReferenceHandler, LoggingPropertyAccessHandler,
    PrimitiveDefaultValueModeResolver, PropagatingPropertyAccessHandler,
    PropertyAccessExceptionHandler, TagCategoryResolver, TypeInfoResolver,
};
pub use selector::ElementSelector;
pub use sequence::{longest_common_sequences, Sequence};
pub use summary::{ChangeSummary, NodeChange};

pub use objdiff_model as model;
