use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::accessor::AccessorRef;
use crate::circular::{CircularReferenceDetector, CircularReferenceMatchingMode};
use crate::differ::DifferKind;
use crate::error::{DiffError, DiffResult};
use crate::instances::Instances;
use crate::node::{DiffNode, State};
use crate::path::NodePath;
use crate::resolver::{
    CategoryResolver, CircularReferenceExceptionHandler, ComparisonStrategyResolver,
    IdentityStrategyResolver, IsIgnoredResolver, IsReturnableResolver,
    PrimitiveDefaultValueModeResolver, PropertyAccessExceptionHandler, TypeInfoResolver,
};

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// The resolved policy set of an [`ObjectDiffer`](crate::ObjectDiffer).
/// Read-only during a comparison.
#[derive(Clone)]
pub(crate) struct Policies {
    pub is_ignored: Arc<dyn IsIgnoredResolver>,
    pub is_returnable: Arc<dyn IsReturnableResolver>,
    pub comparison: Arc<dyn ComparisonStrategyResolver>,
    pub identity: Arc<dyn IdentityStrategyResolver>,
    pub type_info: Arc<dyn TypeInfoResolver>,
    pub categories: Arc<dyn CategoryResolver>,
    pub primitive_default_value_mode: Arc<dyn PrimitiveDefaultValueModeResolver>,
    pub circular_reference_handler: Arc<dyn CircularReferenceExceptionHandler>,
    pub property_access_handler: Arc<dyn PropertyAccessExceptionHandler>,
    pub circular_reference_matching_mode: CircularReferenceMatchingMode,
    pub introspect_added_and_removed: bool,
    pub sequence_alignment: bool,
}

// ---------------------------------------------------------------------------
// DifferDispatcher
// ---------------------------------------------------------------------------

/// Orchestrates the comparison steps of one top-level comparison.
///
/// A dispatcher owns the traversal state (the circular reference stacks of
/// both sides) and is created afresh for every call to
/// [`ObjectDiffer::compare`](crate::ObjectDiffer::compare).
pub(crate) struct DifferDispatcher<'a> {
    policies: &'a Policies,
    working_detector: CircularReferenceDetector,
    base_detector: CircularReferenceDetector,
}

impl<'a> DifferDispatcher<'a> {
    pub fn new(policies: &'a Policies) -> Self {
        Self {
            policies,
            working_detector: CircularReferenceDetector::new(
                policies.circular_reference_matching_mode,
            ),
            base_detector: CircularReferenceDetector::new(
                policies.circular_reference_matching_mode,
            ),
        }
    }

    pub fn policies(&self) -> &'a Policies {
        self.policies
    }

    /// Compare the top-level instances. The traversal state is reset
    /// afterwards, whether the comparison succeeded or not.
    pub fn dispatch_root(&mut self, instances: &Instances) -> DiffResult<DiffNode> {
        let mut node = DiffNode::root(instances.value_type());
        let categories = self.policies.categories.resolve_categories(&node);
        node.add_categories(categories);

        let result = if instances.are_null() {
            Ok(node)
        } else {
            self.compare_tracked(node, instances)
        };
        self.working_detector.reset();
        self.base_detector.reset();
        result
    }

    /// Compare the child of `parent` reached through `accessor` and attach
    /// it to `parent` if it is returnable.
    pub fn dispatch(
        &mut self,
        parent: &mut DiffNode,
        parent_instances: &Instances,
        accessor: AccessorRef,
    ) -> DiffResult<()> {
        let child = self.compare_child(parent, parent_instances, accessor)?;
        if self.policies.is_returnable.is_returnable(&child) {
            parent.add_child(child);
        }
        Ok(())
    }

    fn compare_child(
        &mut self,
        parent: &DiffNode,
        parent_instances: &Instances,
        accessor: AccessorRef,
    ) -> DiffResult<DiffNode> {
        let mut node = DiffNode::child_of(parent, Rc::clone(&accessor));
        node.add_categories(parent.categories().iter().cloned());
        let categories = self.policies.categories.resolve_categories(&node);
        node.add_categories(categories);

        // Must be decided before anything is read.
        if self.policies.is_ignored.is_ignored(&node) {
            node.set_state(State::Ignored);
            return Ok(node);
        }

        let instances = match parent_instances.access(accessor) {
            Ok(instances) => instances,
            Err(DiffError::Access(error)) => {
                self.policies
                    .property_access_handler
                    .on_property_read_error(error, &node)?;
                node.set_state(State::Inaccessible);
                return Ok(node);
            }
            Err(other) => return Err(other),
        };
        node.set_value_type(instances.value_type());

        if instances.are_null() {
            return Ok(node);
        }
        self.compare_tracked(node, &instances)
    }

    /// Run the differ for `node` with both sides pushed onto the circular
    /// reference stacks.
    fn compare_tracked(&mut self, node: DiffNode, instances: &Instances) -> DiffResult<DiffNode> {
        let path = node.path().clone();

        if let Err(circle) = self.working_detector.push(instances.working(), &path) {
            return Ok(self.circular(node, circle.start_path));
        }
        if let Err(circle) = self.base_detector.push(instances.base(), &path) {
            self.working_detector.remove(instances.working())?;
            return Ok(self.circular(node, circle.start_path));
        }

        let differ = DifferKind::for_type(node.value_type());
        debug!(path = %path, ?differ, "comparing");
        let node = differ.compare(self, node, instances)?;

        self.base_detector.remove(instances.base())?;
        self.working_detector.remove(instances.working())?;
        debug!(path = %path, state = %node.state(), children = node.child_count(), "compared");
        Ok(node)
    }

    fn circular(&self, mut node: DiffNode, start: NodePath) -> DiffNode {
        node.mark_circular(start);
        self.policies
            .circular_reference_handler
            .on_circular_reference(&node);
        node
    }
}
