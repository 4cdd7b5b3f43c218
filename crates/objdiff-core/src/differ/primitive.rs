//! Differ for true primitives.

use objdiff_model::ValueType;

use crate::config::PrimitiveDefaultValueMode;
use crate::dispatcher::DifferDispatcher;
use crate::error::{DiffError, DiffResult};
use crate::instances::Instances;
use crate::node::{DiffNode, State};

pub(crate) fn compare(
    dispatcher: &mut DifferDispatcher<'_>,
    mut node: DiffNode,
    instances: &Instances,
) -> DiffResult<DiffNode> {
    match instances.value_type() {
        Some(ValueType::Primitive(_)) => {}
        Some(other) => return Err(DiffError::NotPrimitive(other.to_string())),
        None => return Err(DiffError::NotPrimitive("unknown".into())),
    }

    let unassigned = dispatcher
        .policies()
        .primitive_default_value_mode
        .resolve_primitive_default_value_mode(&node)
        == PrimitiveDefaultValueMode::Unassigned;

    if unassigned && was_assigned(instances) {
        node.set_state(State::Added);
    } else if unassigned && was_unassigned(instances) {
        node.set_state(State::Removed);
    } else if instances.has_been_added() {
        node.set_state(State::Added);
    } else if instances.has_been_removed() {
        node.set_state(State::Removed);
    } else if !instances.are_equal() {
        node.set_state(State::Changed);
    }
    Ok(node)
}

/// Zero (or absent) in the base, non-zero in the working graph.
fn was_assigned(instances: &Instances) -> bool {
    !instances.working_is_default() && (instances.base().is_null() || instances.base_is_default())
}

/// Non-zero in the base, zero (or absent) in the working graph.
fn was_unassigned(instances: &Instances) -> bool {
    (instances.working().is_null() || instances.working_is_default()) && !instances.base_is_default()
}
