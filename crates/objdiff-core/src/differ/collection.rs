//! Differ for collections.
//!
//! Items are matched across the two collections with the node's identity
//! strategy and partitioned into added, removed and known items; one child is
//! dispatched per item. With sequence alignment enabled, two lists are
//! instead aligned by their longest common runs and items are addressed by
//! position.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use objdiff_model::{CollectionKind, Value, ValueType};

use crate::accessor::{AccessorRef, CollectionItemAccessor, SequenceItemAccessor};
use crate::dispatcher::DifferDispatcher;
use crate::error::DiffResult;
use crate::identity::{IdentityStrategy, IdentityStrategyRef};
use crate::instances::Instances;
use crate::node::{DiffNode, State};
use crate::sequence::longest_common_sequences;

pub(crate) fn compare(
    dispatcher: &mut DifferDispatcher<'_>,
    mut node: DiffNode,
    instances: &Instances,
) -> DiffResult<DiffNode> {
    let identity = dispatcher.policies().identity.resolve_identity_strategy(&node);

    if instances.has_been_added() {
        compare_items(dispatcher, &mut node, instances, &items(instances.working()), &identity)?;
        node.set_state(State::Added);
    } else if instances.has_been_removed() {
        compare_items(dispatcher, &mut node, instances, &items(instances.base()), &identity)?;
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
    } else if dispatcher.policies().sequence_alignment && both_lists(instances) {
        compare_sequences(dispatcher, &mut node, instances, &identity)?;
    } else {
        compare_internally(dispatcher, &mut node, instances, &identity)?;
    }
    Ok(node)
}

fn items(value: &Value) -> Vec<Value> {
    value
        .as_collection()
        .map(|c| c.borrow().items().to_vec())
        .unwrap_or_default()
}

fn both_lists(instances: &Instances) -> bool {
    let is_list = |value: &Value| {
        value
            .as_collection()
            .is_some_and(|c| c.borrow().kind() == CollectionKind::List)
    };
    is_list(instances.working()) && is_list(instances.base())
}

fn compare_items(
    dispatcher: &mut DifferDispatcher<'_>,
    node: &mut DiffNode,
    instances: &Instances,
    items: &[Value],
    identity: &IdentityStrategyRef,
) -> DiffResult<()> {
    for item in items {
        let accessor: AccessorRef =
            Rc::new(CollectionItemAccessor::new(item.clone(), Arc::clone(identity)));
        dispatcher.dispatch(node, instances, accessor)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unordered
// ---------------------------------------------------------------------------

/// Items bucketed by identity hash for matching against the other side.
struct IdentityIndex<'a> {
    identity: &'a dyn IdentityStrategy,
    buckets: HashMap<u64, Vec<&'a Value>>,
}

impl<'a> IdentityIndex<'a> {
    fn new(identity: &'a dyn IdentityStrategy, items: &'a [Value]) -> Self {
        let mut buckets: HashMap<u64, Vec<&'a Value>> = HashMap::new();
        for item in items {
            buckets
                .entry(identity.identity_hash(item))
                .or_default()
                .push(item);
        }
        Self { identity, buckets }
    }

    fn contains(&self, item: &Value) -> bool {
        self.buckets
            .get(&self.identity.identity_hash(item))
            .is_some_and(|bucket| {
                bucket
                    .iter()
                    .any(|candidate| self.identity.equals(item, candidate))
            })
    }
}

fn compare_internally(
    dispatcher: &mut DifferDispatcher<'_>,
    node: &mut DiffNode,
    instances: &Instances,
    identity: &IdentityStrategyRef,
) -> DiffResult<()> {
    let working = items(instances.working());
    let base = items(instances.base());

    let (added, removed, known) = {
        let working_index = IdentityIndex::new(identity.as_ref(), &working);
        let base_index = IdentityIndex::new(identity.as_ref(), &base);

        let mut added = Vec::new();
        let mut known = Vec::new();
        for item in &working {
            if base_index.contains(item) {
                known.push(item.clone());
            } else {
                added.push(item.clone());
            }
        }
        let removed: Vec<Value> = base
            .iter()
            .filter(|item| !working_index.contains(item))
            .cloned()
            .collect();
        (added, removed, known)
    };

    compare_items(dispatcher, node, instances, &added, identity)?;
    compare_items(dispatcher, node, instances, &removed, identity)?;
    compare_items(dispatcher, node, instances, &known, identity)
}

// ---------------------------------------------------------------------------
// Ordered
// ---------------------------------------------------------------------------

fn compare_sequences(
    dispatcher: &mut DifferDispatcher<'_>,
    node: &mut DiffNode,
    instances: &Instances,
    identity: &IdentityStrategyRef,
) -> DiffResult<()> {
    let working = items(instances.working());
    let base = items(instances.base());
    let runs = longest_common_sequences(&working, &base, |w, b| identity.equals(w, b));

    let mut at = |item: &Value, working_index: Option<usize>, base_index: Option<usize>| {
        let accessor: AccessorRef = Rc::new(SequenceItemAccessor::new(
            item.clone(),
            Arc::clone(identity),
            working_index,
            base_index,
        ));
        dispatcher.dispatch(node, instances, accessor)
    };

    let (mut next_working, mut next_base) = (0, 0);
    for run in &runs {
        for (i, item) in working.iter().enumerate().take(run.working_offset).skip(next_working) {
            at(item, Some(i), None)?;
        }
        for (i, item) in base.iter().enumerate().take(run.base_offset).skip(next_base) {
            at(item, None, Some(i))?;
        }
        for k in 0..run.length {
            let (w, b) = (run.working_offset + k, run.base_offset + k);
            at(&working[w], Some(w), Some(b))?;
        }
        next_working = run.working_end();
        next_base = run.base_end();
    }
    for (i, item) in working.iter().enumerate().skip(next_working) {
        at(item, Some(i), None)?;
    }
    for (i, item) in base.iter().enumerate().skip(next_base) {
        at(item, None, Some(i))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use objdiff_model::Value;

    use crate::node::DiffNode;
    use crate::object_differ::ObjectDiffer;
    use crate::path::NodePath;

    fn self_containing_list() -> Value {
        let list = Value::list([]);
        list.as_collection().unwrap().borrow_mut().add(list.clone());
        list
    }

    fn paths(node: &DiffNode) -> Vec<String> {
        node.children().iter().map(|c| c.path().to_string()).collect()
    }

    #[test]
    fn item_closing_a_cycle_is_circular() {
        let node = ObjectDiffer::new()
            .compare(&self_containing_list(), &self_containing_list())
            .unwrap();
        assert_eq!(node.child_count(), 1);
        let item = &node.children()[0];
        assert!(item.is_circular());
        assert_eq!(item.circle_start_path(), Some(&NodePath::with_root()));
        assert!(!item.has_children());
    }

    #[test]
    fn unordered_items_ignore_position() {
        let working = Value::list(["a".into(), "b".into(), "c".into()]);
        let base = Value::list(["b".into(), "c".into(), "a".into()]);

        let node = ObjectDiffer::new().compare(&working, &base).unwrap();
        assert!(node.is_untouched());
        assert!(!node.has_children());
    }

    #[test]
    fn aligned_reorder_is_positioned() {
        let working = Value::list(["a".into(), "b".into(), "c".into()]);
        let base = Value::list(["b".into(), "c".into(), "a".into()]);

        let differ = ObjectDiffer::builder().sequence_alignment(true).build();
        let node = differ.compare(&working, &base).unwrap();
        assert!(node.is_changed());
        assert_eq!(paths(&node), vec!["/[a@0/-]", "/[a@-/2]"]);
        assert!(node.children()[0].is_added());
        assert!(node.children()[1].is_removed());
    }

    #[test]
    fn items_matched_across_sets() {
        let working = Value::set(["x".into(), "y".into()]);
        let base = Value::set(["y".into(), "z".into()]);

        let node = ObjectDiffer::new().compare(&working, &base).unwrap();
        assert_eq!(paths(&node), vec!["/[x]", "/[z]"]);
        assert!(node.children()[0].is_added());
        assert!(node.children()[1].is_removed());
    }
}
