//! The working, base and fresh values at one location of the compared
//! graphs, and the accessor that produced them.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use objdiff_model::{Value, ValueType};
use tracing::warn;

use crate::accessor::{AccessorRef, RootAccessor, Side};
use crate::error::DiffResult;

pub struct Instances {
    source: AccessorRef,
    working: Value,
    base: Value,
    fresh: Value,
    resolved_type: OnceCell<Option<ValueType>>,
}

impl Instances {
    pub fn new(source: AccessorRef, working: Value, base: Value, fresh: Value) -> Self {
        Self {
            source,
            working,
            base,
            fresh,
            resolved_type: OnceCell::new(),
        }
    }

    /// The instances of a top-level comparison.
    pub fn root(working: Value, base: Value) -> Self {
        Self::new(Rc::new(RootAccessor), working, base, Value::Null)
    }

    /// The child instances reached through `accessor`.
    pub fn access(&self, accessor: AccessorRef) -> DiffResult<Instances> {
        let working = accessor.get_from(&self.working, Side::Working)?;
        let base = accessor.get_from(&self.base, Side::Base)?;
        let fresh = accessor.get_from(&self.fresh, Side::Fresh)?;
        Ok(Self::new(accessor, working, base, fresh))
    }

    pub fn source_accessor(&self) -> &AccessorRef {
        &self.source
    }

    pub fn working(&self) -> &Value {
        &self.working
    }

    pub fn base(&self) -> &Value {
        &self.base
    }

    /// The value a freshly created parent would hold here. For primitive
    /// types without an explicit fresh value this is the zero value.
    pub fn fresh(&self) -> Value {
        if self.fresh.is_null() {
            if let Some(ValueType::Primitive(kind)) = self.value_type() {
                return Value::Primitive(kind.default_value());
            }
        }
        self.fresh.clone()
    }

    /// The resolved type of the compared values, or `None` if it cannot be
    /// determined (all values null and nothing declared).
    pub fn value_type(&self) -> Option<ValueType> {
        self.resolved_type
            .get_or_init(|| self.resolve_type())
            .clone()
    }

    fn resolve_type(&self) -> Option<ValueType> {
        let declared = self.source.declared_type();
        if let Some(declared @ ValueType::Primitive(_)) = declared {
            return Some(declared.clone());
        }

        let mut types = Vec::new();
        for value in [&self.working, &self.base, &self.fresh] {
            if let Some(ty) = value.value_type() {
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
        }

        match types.as_slice() {
            [] => declared.cloned(),
            [single] => Some(single.clone()),
            [first, rest @ ..] => {
                let common = rest.iter().try_fold(first.clone(), |acc, ty| {
                    ValueType::common_supertype(&acc, ty)
                });
                if common.is_none() {
                    let names: BTreeSet<String> = types.iter().map(|t| t.to_string()).collect();
                    warn!(
                        types = ?names,
                        "instances have different types; falling back to equals-only comparison"
                    );
                }
                Some(common.unwrap_or(ValueType::Object))
            }
        }
    }

    pub fn is_primitive_type(&self) -> bool {
        matches!(self.value_type(), Some(ValueType::Primitive(_)))
    }

    pub fn are_null(&self) -> bool {
        self.working.is_null() && self.base.is_null()
    }

    pub fn are_same(&self) -> bool {
        self.working.is_same(&self.base)
    }

    pub fn are_equal(&self) -> bool {
        self.working == self.base
    }

    pub fn has_been_added(&self) -> bool {
        !self.working.is_null() && self.base.is_null()
    }

    pub fn has_been_removed(&self) -> bool {
        self.working.is_null() && !self.base.is_null()
    }

    /// Returns `true` if the working value equals the fresh (zero) value.
    pub fn working_is_default(&self) -> bool {
        self.working == self.fresh()
    }

    /// Returns `true` if the base value equals the fresh (zero) value.
    pub fn base_is_default(&self) -> bool {
        self.base == self.fresh()
    }
}

impl fmt::Debug for Instances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instances")
            .field("source", &self.source.element_selector())
            .field("working", &self.working)
            .field("base", &self.base)
            .field("fresh", &self.fresh)
            .finish()
    }
}
