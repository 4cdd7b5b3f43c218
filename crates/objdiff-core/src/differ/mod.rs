//! Type-specific differs.
//!
//! The differ for a node is chosen from its resolved type in a fixed
//! priority order: primitives, collections, maps, and finally beans, which
//! accept every remaining type (including unknown ones).

mod bean;
mod collection;
mod map;
mod primitive;

use objdiff_model::ValueType;

use crate::dispatcher::DifferDispatcher;
use crate::error::DiffResult;
use crate::instances::Instances;
use crate::node::DiffNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DifferKind {
    Primitive,
    Collection,
    Map,
    Bean,
}

impl DifferKind {
    pub fn for_type(value_type: Option<&ValueType>) -> Self {
        match value_type {
            Some(ValueType::Primitive(_)) => Self::Primitive,
            Some(ValueType::Collection(_)) => Self::Collection,
            Some(ValueType::Map(_)) => Self::Map,
            _ => Self::Bean,
        }
    }

    /// Fill `node` from `instances` and return it.
    pub fn compare(
        self,
        dispatcher: &mut DifferDispatcher<'_>,
        node: DiffNode,
        instances: &Instances,
    ) -> DiffResult<DiffNode> {
        match self {
            Self::Primitive => primitive::compare(dispatcher, node, instances),
            Self::Collection => collection::compare(dispatcher, node, instances),
            Self::Map => map::compare(dispatcher, node, instances),
            Self::Bean => bean::compare(dispatcher, node, instances),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objdiff_model::{CollectionKind, MapKind, PrimitiveKind};

    #[test]
    fn selection_priority() {
        assert_eq!(
            DifferKind::for_type(Some(&ValueType::Primitive(PrimitiveKind::I32))),
            DifferKind::Primitive
        );
        assert_eq!(
            DifferKind::for_type(Some(&ValueType::Collection(CollectionKind::Set))),
            DifferKind::Collection
        );
        assert_eq!(
            DifferKind::for_type(Some(&ValueType::Map(MapKind::Any))),
            DifferKind::Map
        );
    }

    #[test]
    fn beans_catch_everything_else() {
        for ty in [
            ValueType::bean("Person"),
            ValueType::Text,
            ValueType::Boxed(PrimitiveKind::I32),
            ValueType::Object,
        ] {
            assert_eq!(DifferKind::for_type(Some(&ty)), DifferKind::Bean);
        }
        assert_eq!(DifferKind::for_type(None), DifferKind::Bean);
    }
}
