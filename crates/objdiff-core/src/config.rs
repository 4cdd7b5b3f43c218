use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::circular::CircularReferenceMatchingMode;
use crate::error::{DiffError, DiffResult};
use crate::node::State;

/// How primitive values equal to their type's zero value are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveDefaultValueMode {
    /// Zero is an ordinary value: any difference is a change.
    #[default]
    Default,
    /// Zero means "not assigned": zero to non-zero is an addition and
    /// non-zero to zero is a removal.
    Unassigned,
}

/// Which node states are attached to the result tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnableStates {
    pub added: bool,
    pub removed: bool,
    pub changed: bool,
    pub circular: bool,
    pub untouched: bool,
    pub ignored: bool,
    pub inaccessible: bool,
}

impl Default for ReturnableStates {
    fn default() -> Self {
        Self {
            added: true,
            removed: true,
            changed: true,
            circular: true,
            untouched: false,
            ignored: false,
            inaccessible: false,
        }
    }
}

impl ReturnableStates {
    /// Every state is returned.
    pub fn all() -> Self {
        Self {
            untouched: true,
            ignored: true,
            inaccessible: true,
            ..Default::default()
        }
    }

    pub fn includes(&self, state: State) -> bool {
        match state {
            State::Added => self.added,
            State::Removed => self.removed,
            State::Changed => self.changed,
            State::Circular => self.circular,
            State::Untouched => self.untouched,
            State::Ignored => self.ignored,
            State::Inaccessible => self.inaccessible,
        }
    }
}

/// A bean type compared by equality instead of by its properties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualsOnlyType {
    pub type_name: String,
    /// Property whose value is compared instead of the bean itself.
    #[serde(default)]
    pub value_provider: Option<String>,
}

impl EqualsOnlyType {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value_provider: None,
        }
    }

    pub fn with_value_provider(mut self, property: impl Into<String>) -> Self {
        self.value_provider = Some(property.into());
        self
    }
}

/// Declarative configuration of an [`ObjectDiffer`](crate::ObjectDiffer).
///
/// Everything here can also be set programmatically through
/// [`ObjectDifferBuilder`](crate::ObjectDifferBuilder), which additionally
/// accepts strategies and resolvers that cannot be expressed as data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
    pub primitive_default_value_mode: PrimitiveDefaultValueMode,
    pub circular_reference_matching_mode: CircularReferenceMatchingMode,
    pub returnable_states: ReturnableStates,
    /// Compare the properties of added and removed beans against null.
    pub introspect_added_and_removed: bool,
    /// Align lists by their longest common runs instead of by identity only.
    pub sequence_alignment: bool,
    /// Bean properties excluded from every type.
    pub ignored_property_names: Vec<String>,
    /// Paths excluded from the comparison, in display form (`/a/b`).
    pub ignored_paths: Vec<String>,
    /// Property tags excluded from the comparison.
    pub ignored_categories: Vec<String>,
    pub equals_only_types: Vec<EqualsOnlyType>,
}

impl DifferConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> DiffResult<Self> {
        toml::from_str(content).map_err(|e| DiffError::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> DiffResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiffError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> DiffResult<String> {
        toml::to_string(self).map_err(|e| DiffError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DifferConfig::default();
        assert_eq!(c.primitive_default_value_mode, PrimitiveDefaultValueMode::Default);
        assert_eq!(
            c.circular_reference_matching_mode,
            CircularReferenceMatchingMode::EqualityOperator
        );
        assert!(!c.introspect_added_and_removed);
        assert!(!c.sequence_alignment);
        assert!(c.ignored_paths.is_empty());
    }

    #[test]
    fn default_returnable_states() {
        let states = ReturnableStates::default();
        assert!(states.includes(State::Added));
        assert!(states.includes(State::Removed));
        assert!(states.includes(State::Changed));
        assert!(states.includes(State::Circular));
        assert!(!states.includes(State::Untouched));
        assert!(!states.includes(State::Ignored));
        assert!(!states.includes(State::Inaccessible));
        assert!(ReturnableStates::all().includes(State::Ignored));
    }

    #[test]
    fn parses_partial_toml() {
        let c = DifferConfig::from_toml_str(
            r#"
            primitive_default_value_mode = "unassigned"
            sequence_alignment = true
            ignored_paths = ["/secret"]

            [returnable_states]
            untouched = true

            [[equals_only_types]]
            type_name = "Money"
            value_provider = "amount"
            "#,
        )
        .unwrap();
        assert_eq!(c.primitive_default_value_mode, PrimitiveDefaultValueMode::Unassigned);
        assert!(c.sequence_alignment);
        assert_eq!(c.ignored_paths, vec!["/secret".to_string()]);
        assert!(c.returnable_states.untouched);
        assert!(c.returnable_states.added);
        assert_eq!(
            c.equals_only_types,
            vec![EqualsOnlyType::new("Money").with_value_provider("amount")]
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = DifferConfig::from_toml_str("sequence_alignment = \"maybe\"").unwrap_err();
        assert!(matches!(err, DiffError::Config(_)));
    }

    #[test]
    fn toml_round_trip() {
        let mut c = DifferConfig::default();
        c.ignored_property_names.push("version".into());
        c.circular_reference_matching_mode = CircularReferenceMatchingMode::EqualsMethod;
        let text = c.to_toml_string().unwrap();
        assert_eq!(DifferConfig::from_toml_str(&text).unwrap(), c);
    }
}
