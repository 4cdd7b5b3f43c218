//! Flat, serializable view of a diff result.

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};
use crate::node::{DiffNode, State, Visit};

/// One changed location of a comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeChange {
    pub path: String,
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// For circular nodes: where the cycle started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle_start: Option<String>,
}

/// Every added, removed, changed and circular node of a result tree, in
/// depth-first order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub changes: Vec<NodeChange>,
}

impl ChangeSummary {
    pub fn from_node(root: &DiffNode) -> Self {
        let mut changes = Vec::new();
        root.visit(&mut |node: &DiffNode, _: &mut Visit| {
            if matches!(
                node.state(),
                State::Added | State::Removed | State::Changed | State::Circular
            ) {
                changes.push(NodeChange {
                    path: node.path().to_string(),
                    state: node.state(),
                    value_type: node.value_type().map(ToString::to_string),
                    circle_start: node.circle_start_path().map(ToString::to_string),
                });
            }
        });
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn to_json(&self) -> DiffResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DiffError::Serialization(e.to_string()))
    }
}

impl DiffNode {
    /// Summarize this node and its descendants.
    pub fn changes(&self) -> ChangeSummary {
        ChangeSummary::from_node(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_root_has_no_changes() {
        let summary = DiffNode::root(None).changes();
        assert!(summary.is_empty());
        assert!(summary.to_json().unwrap().contains("\"changes\": []"));
    }

    #[test]
    fn json_shape() {
        let summary = ChangeSummary {
            changes: vec![NodeChange {
                path: "/name".into(),
                state: State::Changed,
                value_type: Some("text".into()),
                circle_start: None,
            }],
        };
        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["changes"][0]["path"], "/name");
        assert_eq!(json["changes"][0]["state"], "changed");
        assert_eq!(json["changes"][0]["value_type"], "text");
        assert!(json["changes"][0].get("circle_start").is_none());
    }
}
