//! Compilation of a built traversal into its wire form

use crate::error::{Result, TraversalError};
use crate::sequence::StepSequence;
use crate::step::Step;
use serde::{Deserialize, Serialize};

/// A validated step sequence, ready to be sent to an engine
///
/// Validation re-checks every bound reference by name against the bindings
/// lexically enclosing it, so sequences assembled by hand (or received over
/// the wire) get the same guarantees as builder output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StepSequence", into = "StepSequence")]
pub struct CompiledTraversal {
    steps: StepSequence,
}

impl CompiledTraversal {
    /// Validate `steps` with no enclosing bindings
    pub fn new(steps: StepSequence) -> Result<Self> {
        Self::in_scope(steps, Vec::new())
    }

    /// Validate `steps` with `names` already bound, outermost first
    pub(crate) fn in_scope(steps: StepSequence, mut names: Vec<String>) -> Result<Self> {
        validate(&steps, &mut names)?;
        Ok(Self { steps })
    }

    /// The compiled steps
    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    /// Number of top-level steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the traversal has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Compact JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.steps)?)
    }

    /// Indented JSON rendering
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.steps)?)
    }
}

impl TryFrom<StepSequence> for CompiledTraversal {
    type Error = TraversalError;

    fn try_from(steps: StepSequence) -> Result<Self> {
        Self::new(steps)
    }
}

impl From<CompiledTraversal> for StepSequence {
    fn from(compiled: CompiledTraversal) -> Self {
        compiled.steps
    }
}

fn validate(steps: &StepSequence, names: &mut Vec<String>) -> Result<()> {
    for step in steps.iter() {
        match step {
            Step::Where { predicate } => {
                for reference in predicate.bound_refs() {
                    if !names.contains(&reference.name) {
                        return Err(TraversalError::unbound(&reference.name));
                    }
                }
            }
            Step::Bind { name, continuation } => {
                names.push(name.clone());
                let nested = validate(continuation, names);
                names.pop();
                nested?;
            }
            Step::AddEdge { from, to, .. } => {
                for selector in [from, to].into_iter().flatten() {
                    validate(selector, names)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{BoundRef, Operand, Predicate, Test};
    use crate::schema::ElementKind;

    fn filter_on(name: &str) -> Step {
        Step::Where {
            predicate: Predicate::has(
                "zip_code",
                Test::Within(Operand::Bound(BoundRef::named(name))),
            ),
        }
    }

    fn bind(name: &str, continuation: Vec<Step>) -> Step {
        Step::Bind {
            name: name.into(),
            continuation: continuation.into_iter().collect(),
        }
    }

    #[test]
    fn test_reference_before_binding_is_rejected() {
        let steps: StepSequence = vec![
            Step::Inject { values: vec![] },
            filter_on("_a"),
            Step::Fold,
            bind("_a", vec![]),
        ]
        .into_iter()
        .collect();
        let err = CompiledTraversal::new(steps).unwrap_err();
        assert!(matches!(err, TraversalError::UnboundReference { ref name } if name == "_a"));
    }

    #[test]
    fn test_reference_after_scope_closes_is_rejected() {
        let steps: StepSequence = vec![Step::Fold, bind("_a", vec![]), filter_on("_a")]
            .into_iter()
            .collect();
        assert!(CompiledTraversal::new(steps).is_err());
    }

    #[test]
    fn test_nested_reference_is_accepted() {
        let steps: StepSequence = vec![
            Step::Fold,
            bind(
                "_a",
                vec![
                    Step::SelectAll {
                        kind: ElementKind::Vertex,
                    },
                    filter_on("_a"),
                ],
            ),
        ]
        .into_iter()
        .collect();
        let compiled = CompiledTraversal::new(steps).unwrap();
        assert_eq!(compiled.len(), 2);

        let json = compiled.to_json().unwrap();
        let back: CompiledTraversal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, compiled);
    }

    #[test]
    fn test_deserialising_validates() {
        let json = r#"[{"step":"where","predicate":{"op":"is","test":{"test":"eq","operand":{"bound":{"name":"_x"}}}}}]"#;
        assert!(serde_json::from_str::<CompiledTraversal>(json).is_err());
    }
}
