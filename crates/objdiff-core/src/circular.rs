//! Circular reference detection for one traversal.
//!
//! The dispatcher keeps one detector per side. Before descending into a
//! value it is pushed together with the path it was reached at; if the same
//! instance is already on the stack, the traversal has closed a cycle and
//! the detector reports the path where the cycle started.

use serde::{Deserialize, Serialize};

use objdiff_model::Value;

use crate::error::{DiffError, DiffResult};
use crate::path::NodePath;

/// How a pushed value is matched against the values already on the stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircularReferenceMatchingMode {
    /// Reference identity.
    #[default]
    EqualityOperator,
    /// Reference identity or value equality.
    EqualsMethod,
}

/// Raised by [`CircularReferenceDetector::push`] when a value is already on
/// the stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircularReference {
    pub start_path: NodePath,
}

#[derive(Debug, Default)]
pub struct CircularReferenceDetector {
    stack: Vec<(NodePath, Value)>,
    mode: CircularReferenceMatchingMode,
}

impl CircularReferenceDetector {
    pub fn new(mode: CircularReferenceMatchingMode) -> Self {
        Self {
            stack: Vec::new(),
            mode,
        }
    }

    fn matches(&self, a: &Value, b: &Value) -> bool {
        match self.mode {
            CircularReferenceMatchingMode::EqualityOperator => a.is_same(b),
            CircularReferenceMatchingMode::EqualsMethod => a.is_same(b) || a == b,
        }
    }

    /// Returns the path at which `value` was first pushed, if it is on the
    /// stack.
    pub fn known_path(&self, value: &Value) -> Option<&NodePath> {
        self.stack
            .iter()
            .find(|(_, known)| self.matches(known, value))
            .map(|(path, _)| path)
    }

    pub fn knows(&self, value: &Value) -> bool {
        self.known_path(value).is_some()
    }

    /// Push `value`, reached at `path`. Only reference values are tracked;
    /// nulls and scalars are accepted without being recorded.
    pub fn push(&mut self, value: &Value, path: &NodePath) -> Result<(), CircularReference> {
        if !value.is_reference() {
            return Ok(());
        }
        if let Some(start) = self.known_path(value) {
            return Err(CircularReference {
                start_path: start.clone(),
            });
        }
        self.stack.push((path.clone(), value.clone()));
        Ok(())
    }

    /// Pop `value`. It must be the most recently pushed value.
    pub fn remove(&mut self, value: &Value) -> DiffResult<()> {
        if !value.is_reference() {
            return Ok(());
        }
        match self.stack.last() {
            Some((_, top)) if top.is_same(value) => {
                self.stack.pop();
                Ok(())
            }
            Some((path, _)) => Err(DiffError::StackInconsistency {
                path: path.to_string(),
            }),
            None => Err(DiffError::StackInconsistency {
                path: "<empty stack>".to_string(),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.stack.len()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }
}
