//! Comparison strategies: terminal comparisons that decide a node's state
//! without introspecting its children.

use std::fmt;
use std::sync::Arc;

use objdiff_model::{Array, Value, ValueType};

use crate::error::{DiffError, DiffResult};
use crate::node::{DiffNode, State};

pub trait ComparisonStrategy: fmt::Debug + Send + Sync {
    /// Compare `working` and `base` of type `value_type` and record the
    /// outcome on `node`.
    fn compare(
        &self,
        node: &mut DiffNode,
        value_type: &ValueType,
        working: &Value,
        base: &Value,
    ) -> DiffResult<()>;
}

pub type ComparisonStrategyRef = Arc<dyn ComparisonStrategy>;

fn record(node: &mut DiffNode, equal: bool) {
    node.set_state(if equal { State::Untouched } else { State::Changed });
}

// ---------------------------------------------------------------------------
// Equals only
// ---------------------------------------------------------------------------

/// Value equality, optionally on a single derived value instead of the
/// objects themselves.
#[derive(Clone, Debug, Default)]
pub struct EqualsOnlyComparisonStrategy {
    value_provider: Option<String>,
}

impl EqualsOnlyComparisonStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the values of the named property instead of the objects.
    pub fn with_value_provider(property: impl Into<String>) -> Self {
        Self {
            value_provider: Some(property.into()),
        }
    }

    pub fn value_provider(&self) -> Option<&str> {
        self.value_provider.as_deref()
    }

    fn provided_value(&self, provider: &str, target: &Value) -> DiffResult<Value> {
        if target.is_null() {
            return Ok(Value::Null);
        }
        target.property(provider).ok_or_else(|| DiffError::ValueProvider {
            method: provider.to_string(),
            type_name: target
                .value_type()
                .map_or_else(|| "null".to_string(), |t| t.to_string()),
        })
    }
}

impl ComparisonStrategy for EqualsOnlyComparisonStrategy {
    fn compare(
        &self,
        node: &mut DiffNode,
        _value_type: &ValueType,
        working: &Value,
        base: &Value,
    ) -> DiffResult<()> {
        let equal = match &self.value_provider {
            Some(provider) => {
                self.provided_value(provider, working)? == self.provided_value(provider, base)?
            }
            None => working == base,
        };
        record(node, equal);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Comparable
// ---------------------------------------------------------------------------

/// Natural ordering: values comparing as equal are untouched. Values without
/// a natural ordering fall back to equality.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComparableComparisonStrategy;

impl ComparisonStrategy for ComparableComparisonStrategy {
    fn compare(
        &self,
        node: &mut DiffNode,
        _value_type: &ValueType,
        working: &Value,
        base: &Value,
    ) -> DiffResult<()> {
        let equal = match working.natural_cmp(base) {
            Some(ordering) => ordering.is_eq(),
            None => working == base,
        };
        record(node, equal);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

/// Element-wise array comparison. Floating point elements compare by bit
/// pattern.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArrayComparisonStrategy;

impl ArrayComparisonStrategy {
    fn arrays_equal(working: &Array, base: &Array) -> bool {
        match (working, base) {
            (Array::Bool(a), Array::Bool(b)) => a == b,
            (Array::Char(a), Array::Char(b)) => a == b,
            (Array::I8(a), Array::I8(b)) => a == b,
            (Array::I16(a), Array::I16(b)) => a == b,
            (Array::I32(a), Array::I32(b)) => a == b,
            (Array::I64(a), Array::I64(b)) => a == b,
            (Array::F32(a), Array::F32(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Array::F64(a), Array::F64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Array::Object(a), Array::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl ComparisonStrategy for ArrayComparisonStrategy {
    fn compare(
        &self,
        node: &mut DiffNode,
        _value_type: &ValueType,
        working: &Value,
        base: &Value,
    ) -> DiffResult<()> {
        let equal = match (working, base) {
            (Value::Array(a), Value::Array(b)) => {
                a.ptr_eq(b) || Self::arrays_equal(&a.borrow(), &b.borrow())
            }
            _ => working == base,
        };
        record(node, equal);
        Ok(())
    }
}
