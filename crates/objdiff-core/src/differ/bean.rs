//! The catch-all differ: beans, simple values and anything of unknown type.

use std::rc::Rc;

use objdiff_model::ValueType;

use crate::accessor::{AccessorRef, BeanPropertyAccessor};
use crate::dispatcher::DifferDispatcher;
use crate::error::DiffResult;
use crate::instances::Instances;
use crate::node::{DiffNode, State};

pub(crate) fn compare(
    dispatcher: &mut DifferDispatcher<'_>,
    mut node: DiffNode,
    instances: &Instances,
) -> DiffResult<DiffNode> {
    let introspect_added_and_removed = dispatcher.policies().introspect_added_and_removed;

    if instances.are_null() || instances.are_same() {
        node.set_state(State::Untouched);
    } else if instances.has_been_added() {
        if introspect_added_and_removed {
            compare_using_appropriate_method(dispatcher, &mut node, instances)?;
        }
        node.set_state(State::Added);
    } else if instances.has_been_removed() {
        if introspect_added_and_removed {
            compare_using_appropriate_method(dispatcher, &mut node, instances)?;
        }
        node.set_state(State::Removed);
    } else {
        compare_using_appropriate_method(dispatcher, &mut node, instances)?;
    }
    Ok(node)
}

fn compare_using_appropriate_method(
    dispatcher: &mut DifferDispatcher<'_>,
    node: &mut DiffNode,
    instances: &Instances,
) -> DiffResult<()> {
    let policies = dispatcher.policies();
    if let Some(strategy) = policies.comparison.resolve_comparison_strategy(node) {
        let value_type = node.value_type().cloned().unwrap_or(ValueType::Object);
        return strategy.compare(node, &value_type, instances.working(), instances.base());
    }

    let type_info = policies.type_info.type_info_for_node(node, instances)?;
    for property in type_info.properties() {
        let accessor: AccessorRef = Rc::new(BeanPropertyAccessor::new(property.clone()));
        dispatcher.dispatch(node, instances, accessor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use objdiff_model::{Bean, Value};

    use crate::object_differ::ObjectDiffer;

    #[test]
    fn beans_without_properties_are_untouched() {
        let node = ObjectDiffer::new()
            .compare(&Value::from(Bean::new("Marker")), &Value::from(Bean::new("Marker")))
            .unwrap();
        assert!(node.is_untouched());
        assert!(!node.has_children());
    }

    #[test]
    fn simple_values_use_their_comparison_strategy() {
        let differ = ObjectDiffer::new();
        assert!(differ.compare(&Value::text("a"), &Value::text("b")).unwrap().is_changed());
        assert!(differ.compare(&Value::text("a"), &Value::text("a")).unwrap().is_untouched());
    }

    #[test]
    fn nested_change_marks_every_ancestor() {
        let working = Value::from(
            Bean::new("Order").with("line", Bean::new("Line").with("sku", "a").with("qty", 1)),
        );
        let base = Value::from(
            Bean::new("Order").with("line", Bean::new("Line").with("sku", "a").with("qty", 2)),
        );

        let node = ObjectDiffer::new().compare(&working, &base).unwrap();
        assert!(node.is_changed());
        let line = node.child_by_property("line").unwrap();
        assert!(line.is_changed());
        assert_eq!(line.child_count(), 1);
        assert_eq!(line.children()[0].path().to_string(), "/line/qty");
    }
}
