//! Differ for maps: one child per key.

use std::rc::Rc;

use objdiff_model::{Map, Value, ValueType};

use crate::accessor::{AccessorRef, MapEntryAccessor};
use crate::dispatcher::DifferDispatcher;
use crate::error::DiffResult;
use crate::instances::Instances;
use crate::node::{DiffNode, State};

pub(crate) fn compare(
    dispatcher: &mut DifferDispatcher<'_>,
    mut node: DiffNode,
    instances: &Instances,
) -> DiffResult<DiffNode> {
    if instances.has_been_added() {
        compare_entries(dispatcher, &mut node, instances, &keys(instances.working()))?;
        node.set_state(State::Added);
    } else if instances.has_been_removed() {
        compare_entries(dispatcher, &mut node, instances, &keys(instances.base()))?;
        node.set_state(State::Removed);
    } else if instances.are_same() {
        node.set_state(State::Untouched);
    } else if let Some(strategy) = dispatcher
        .policies()
        .comparison
        .resolve_comparison_strategy(&node)
    {
        let value_type = node.value_type().cloned().unwrap_or(ValueType::Object);
        strategy.compare(&mut node, &value_type, instances.working(), instances.base())?;
    } else {
        compare_internally(dispatcher, &mut node, instances)?;
    }
    Ok(node)
}

fn keys(value: &Value) -> Vec<Value> {
    value
        .as_map()
        .map(|m| m.borrow().keys().cloned().collect())
        .unwrap_or_default()
}

fn compare_internally(
    dispatcher: &mut DifferDispatcher<'_>,
    node: &mut DiffNode,
    instances: &Instances,
) -> DiffResult<()> {
    let (added, removed, known) = match (instances.working().as_map(), instances.base().as_map()) {
        (Some(working), Some(base)) => {
            let (working, base) = (working.borrow(), base.borrow());
            partition(&working, &base)
        }
        _ => (keys(instances.working()), keys(instances.base()), Vec::new()),
    };

    compare_entries(dispatcher, node, instances, &added)?;
    compare_entries(dispatcher, node, instances, &removed)?;
    compare_entries(dispatcher, node, instances, &known)
}

/// Keys only in `working`, keys only in `base`, and keys in both.
fn partition(working: &Map, base: &Map) -> (Vec<Value>, Vec<Value>, Vec<Value>) {
    let mut added = Vec::new();
    let mut known = Vec::new();
    for key in working.keys() {
        if base.contains_key(key) {
            known.push(key.clone());
        } else {
            added.push(key.clone());
        }
    }
    let removed = base
        .keys()
        .filter(|key| !working.contains_key(key))
        .cloned()
        .collect();
    (added, removed, known)
}

fn compare_entries(
    dispatcher: &mut DifferDispatcher<'_>,
    node: &mut DiffNode,
    instances: &Instances,
    keys: &[Value],
) -> DiffResult<()> {
    for key in keys {
        let accessor: AccessorRef = Rc::new(MapEntryAccessor::new(key.clone()));
        dispatcher.dispatch(node, instances, accessor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use objdiff_model::Value;

    use crate::config::ReturnableStates;
    use crate::node::State;
    use crate::object_differ::ObjectDiffer;
    use crate::path::NodePath;

    #[test]
    fn null_entries_on_both_sides_are_untouched() {
        let working = Value::hash_map([("k".into(), Value::Null)]);
        let base = Value::hash_map([("k".into(), Value::Null)]);

        let node = ObjectDiffer::new().compare(&working, &base).unwrap();
        assert!(node.is_untouched());
        assert!(!node.has_children());

        let differ = ObjectDiffer::builder()
            .returnable_states(ReturnableStates::all())
            .build();
        let node = differ.compare(&working, &base).unwrap();
        let entry = node
            .child_at(&NodePath::start_building().map_key("k").build())
            .unwrap();
        assert_eq!(entry.state(), State::Untouched);
    }

    #[test]
    fn changed_entry_value() {
        let working = Value::linked_map([("a".into(), 1.into()), ("b".into(), 2.into())]);
        let base = Value::linked_map([("a".into(), 1.into()), ("b".into(), 3.into())]);

        let node = ObjectDiffer::new().compare(&working, &base).unwrap();
        assert!(node.is_changed());
        assert_eq!(node.child_count(), 1);
        assert_eq!(node.children()[0].path().to_string(), "/{b}");
        assert!(node.children()[0].is_changed());
    }

    #[test]
    fn self_containing_maps_terminate() {
        let m1 = Value::hash_map([]);
        m1.as_map()
            .unwrap()
            .borrow_mut()
            .insert("self".into(), m1.clone());
        let m2 = Value::hash_map([]);
        m2.as_map()
            .unwrap()
            .borrow_mut()
            .insert("self".into(), m2.clone());

        let node = ObjectDiffer::new().compare(&m1, &m2).unwrap();
        let entry = node
            .child_at(&NodePath::start_building().map_key("self").build())
            .unwrap();
        assert!(entry.is_circular());
        assert_eq!(entry.circle_start_path(), Some(&NodePath::with_root()));
    }
}
