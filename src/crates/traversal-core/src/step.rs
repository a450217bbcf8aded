//! Traversal steps
//!
//! A [`Step`] is one instruction of a traversal as it is sent to the engine.
//! The JSON form is internally tagged by `step`:
//!
//! ```json
//! {"step": "traverse", "direction": "both", "edgeLabels": ["Knows"], "target": "vertices"}
//! ```

use crate::predicate::Predicate;
use crate::schema::{ElementId, ElementKind, Property};
use crate::sequence::StepSequence;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Edge direction relative to the current vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Outgoing edges / source vertex
    Out,
    /// Incoming edges / target vertex
    In,
    /// Either direction
    Both,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Out => f.write_str("out"),
            Self::In => f.write_str("in"),
            Self::Both => f.write_str("both"),
        }
    }
}

/// What a traverse step lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkTarget {
    /// The adjacent vertices
    Vertices,
    /// The incident edges
    Edges,
}

/// Projection of the current element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "of", rename_all = "camelCase")]
pub enum Projection {
    /// Engine-assigned identifier
    Id,
    /// Element label
    Label,
    /// Value of one property
    Values {
        /// Property name
        key: String,
    },
    /// Number of incoming traversers
    Count,
}

/// One traversal instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    /// Every element of a kind
    SelectAll {
        /// Vertex or edge
        kind: ElementKind,
    },
    /// Elements of a kind with one of the given identifiers
    SelectById {
        /// Vertex or edge
        kind: ElementKind,
        /// Identifiers to select
        ids: Vec<ElementId>,
    },
    /// Keep elements whose label is in `labels`
    TypeFilter {
        /// Accepted labels
        labels: Vec<String>,
    },
    /// Create one vertex per incoming traverser
    #[serde(rename_all = "camelCase")]
    AddVertex {
        /// Vertex label
        label: String,
        /// Creation payload
        properties: Vec<Property>,
    },
    /// Create one edge per incoming traverser
    ///
    /// A missing endpoint selector stands for the current vertex.
    #[serde(rename_all = "camelCase")]
    AddEdge {
        /// Edge label
        label: String,
        /// Creation payload
        properties: Vec<Property>,
        /// Source vertex selector
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<StepSequence>,
        /// Target vertex selector
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<StepSequence>,
    },
    /// Overwrite properties of the current element
    Update {
        /// Update payload
        properties: Vec<Property>,
    },
    /// Walk from the current vertex along edges
    #[serde(rename_all = "camelCase")]
    Traverse {
        /// Walk direction
        direction: Direction,
        /// Edge labels to follow; empty means any
        edge_labels: Vec<String>,
        /// Whether to land on edges or on adjacent vertices
        target: WalkTarget,
    },
    /// Move from the current edge to its endpoint(s)
    EdgeVertex {
        /// `Out` is the source, `In` the target
        direction: Direction,
    },
    /// Keep traversers satisfying the predicate
    Where {
        /// Filter expression
        predicate: Predicate,
    },
    /// Emit constant values
    Inject {
        /// Values in emission order
        values: Vec<Value>,
    },
    /// Gather every incoming traverser into one list
    Fold,
    /// Bind the current value and evaluate a continuation under that name
    Bind {
        /// Binding name
        name: String,
        /// Steps evaluated with the binding in scope
        continuation: StepSequence,
    },
    /// Replace the current element by a projection
    Project {
        /// What to project
        projection: Projection,
    },
    /// Keep the first `count` traversers
    Limit {
        /// Maximum number of traversers
        count: u64,
    },
    /// Remove the current elements from the graph
    Drop,
}

impl Step {
    /// Short name used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectAll { .. } => "selectAll",
            Self::SelectById { .. } => "selectById",
            Self::TypeFilter { .. } => "typeFilter",
            Self::AddVertex { .. } => "addVertex",
            Self::AddEdge { .. } => "addEdge",
            Self::Update { .. } => "update",
            Self::Traverse { .. } => "traverse",
            Self::EdgeVertex { .. } => "edgeVertex",
            Self::Where { .. } => "where",
            Self::Inject { .. } => "inject",
            Self::Fold => "fold",
            Self::Bind { .. } => "bind",
            Self::Project { .. } => "project",
            Self::Limit { .. } => "limit",
            Self::Drop => "drop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_traverse_wire_form() {
        let step = Step::Traverse {
            direction: Direction::Both,
            edge_labels: vec!["Knows".into()],
            target: WalkTarget::Vertices,
        };
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"step": "traverse", "direction": "both", "edgeLabels": ["Knows"], "target": "vertices"})
        );
        assert_eq!(step.name(), "traverse");
    }

    #[test]
    fn test_add_edge_omits_missing_selectors() {
        let step = Step::AddEdge {
            label: "Knows".into(),
            properties: vec![],
            from: None,
            to: Some(
                StepSequence::new().append(Step::SelectById {
                    kind: ElementKind::Vertex,
                    ids: vec![ElementId::from(2)],
                }),
            ),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert!(json.get("from").is_none());
        assert_eq!(json["to"][0]["ids"], json!([2]));
        let back: Step = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_projection_wire_form() {
        let step = Step::Project {
            projection: Projection::Values { key: "age".into() },
        };
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"step": "project", "projection": {"of": "values", "key": "age"}})
        );
    }
}
