//! Edge creation and endpoint cardinality
//!
//! `add_e` creates one edge per current vertex. The other endpoint is chosen
//! by a nested selector that must resolve to exactly one vertex; selectors
//! that provably resolve to none, or may resolve to several, are rejected
//! before anything is sent.

use super::Traversal;
use crate::error::{Result, TraversalError};
use crate::schema::{Edge, ElementKind, Property, VertexKind};
use crate::sequence::StepSequence;
use crate::shape::{Shape, ShapeInfo};
use crate::step::{Direction, Projection, Step};
use std::marker::PhantomData;

/// Upper bound on how many traversers a step sequence yields for one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cardinality {
    Zero,
    AtMostOne,
    One,
    Many,
}

impl Cardinality {
    /// Outputs of a step yielding `per_input` for each of `self` inputs
    fn then(self, per_input: Cardinality) -> Cardinality {
        use Cardinality::*;
        match (self, per_input) {
            (Zero, _) | (_, Zero) => Zero,
            (One, One) => One,
            (One | AtMostOne, One | AtMostOne) => AtMostOne,
            _ => Many,
        }
    }

    /// Statically analyse `steps` starting from a single traverser
    pub(crate) fn of(steps: &StepSequence) -> Cardinality {
        steps.iter().fold(Cardinality::One, |acc, step| match step {
            Step::SelectAll { .. } | Step::Traverse { .. } => acc.then(Cardinality::Many),
            Step::SelectById { ids, .. } => acc.then(match ids.len() {
                0 => Cardinality::Zero,
                1 => Cardinality::AtMostOne,
                _ => Cardinality::Many,
            }),
            Step::TypeFilter { .. } | Step::Where { .. } => acc.then(Cardinality::AtMostOne),
            Step::EdgeVertex {
                direction: Direction::Both,
            } => acc.then(Cardinality::Many),
            Step::EdgeVertex { .. }
            | Step::AddVertex { .. }
            | Step::AddEdge { .. }
            | Step::Update { .. } => acc,
            Step::Project { projection } => match projection {
                Projection::Count => Cardinality::One,
                _ => acc,
            },
            Step::Fold => Cardinality::One,
            Step::Inject { values } => match (acc, values.len()) {
                (c, 0) => c,
                (Cardinality::Zero, 1) => Cardinality::One,
                _ => Cardinality::Many,
            },
            Step::Bind { continuation, .. } => acc.then(Cardinality::of(continuation)),
            Step::Limit { count: 0 } => Cardinality::Zero,
            Step::Limit { count: 1 } => match acc {
                Cardinality::Many => Cardinality::AtMostOne,
                c => c,
            },
            Step::Limit { .. } => acc,
            Step::Drop => Cardinality::Zero,
        })
    }
}

/// Pending edge creation, completed by [`to`](Self::to) or [`from`](Self::from)
pub struct EdgeBuilder<S, E> {
    source: Traversal<S>,
    label: String,
    properties: Vec<Property>,
    _edge: PhantomData<fn() -> E>,
}

impl<S, E> EdgeBuilder<S, E>
where
    S: Shape<Kind = VertexKind>,
    E: Edge,
{
    pub(super) fn new(source: Traversal<S>, label: String, properties: Vec<Property>) -> Self {
        Self {
            source,
            label,
            properties,
            _edge: PhantomData,
        }
    }

    /// Edge from the current vertex to the vertex chosen by `selector`
    ///
    /// The selector starts on the current vertex.
    pub fn to<V, F>(self, selector: F) -> Result<Traversal<E>>
    where
        V: Shape<Kind = VertexKind>,
        F: FnOnce(Traversal<S>) -> Result<Traversal<V>>,
    {
        let target = self.endpoint("to", selector)?;
        Ok(self.finish(None, Some(target)))
    }

    /// Edge from the vertex chosen by `selector` to the current vertex
    pub fn from<V, F>(self, selector: F) -> Result<Traversal<E>>
    where
        V: Shape<Kind = VertexKind>,
        F: FnOnce(Traversal<S>) -> Result<Traversal<V>>,
    {
        let source = self.endpoint("from", selector)?;
        Ok(self.finish(Some(source), None))
    }

    fn endpoint<V, F>(&self, which: &str, selector: F) -> Result<StepSequence>
    where
        V: Shape<Kind = VertexKind>,
        F: FnOnce(Traversal<S>) -> Result<Traversal<V>>,
    {
        let steps = selector(self.source.anonymous())?.steps;
        match Cardinality::of(&steps) {
            Cardinality::One | Cardinality::AtMostOne => Ok(steps),
            Cardinality::Zero => Err(TraversalError::Cardinality(format!(
                "'{}' selector of edge '{}' resolves to no vertex",
                which, self.label
            ))),
            Cardinality::Many => Err(TraversalError::Cardinality(format!(
                "'{}' selector of edge '{}' may resolve to more than one vertex",
                which, self.label
            ))),
        }
    }

    fn finish(self, from: Option<StepSequence>, to: Option<StepSequence>) -> Traversal<E> {
        let shape = ShapeInfo::exactly(ElementKind::Edge, self.label.clone());
        self.source.push(
            Step::AddEdge {
                label: self.label,
                properties: self.properties,
                from,
                to,
            },
            shape,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Predicate, Test};
    use crate::schema::ElementId;
    use crate::step::WalkTarget;

    fn seq(steps: Vec<Step>) -> StepSequence {
        steps.into_iter().collect()
    }

    fn by_id(ids: Vec<i64>) -> Step {
        Step::SelectById {
            kind: ElementKind::Vertex,
            ids: ids.into_iter().map(ElementId::from).collect(),
        }
    }

    #[test]
    fn test_identity_selector_is_one() {
        assert_eq!(Cardinality::of(&StepSequence::new()), Cardinality::One);
    }

    #[test]
    fn test_select_by_id_cardinality() {
        assert_eq!(Cardinality::of(&seq(vec![by_id(vec![1])])), Cardinality::AtMostOne);
        assert_eq!(Cardinality::of(&seq(vec![by_id(vec![])])), Cardinality::Zero);
        assert_eq!(Cardinality::of(&seq(vec![by_id(vec![1, 2])])), Cardinality::Many);
    }

    #[test]
    fn test_filters_and_limits() {
        let all = Step::SelectAll {
            kind: ElementKind::Vertex,
        };
        assert_eq!(Cardinality::of(&seq(vec![all.clone()])), Cardinality::Many);
        assert_eq!(
            Cardinality::of(&seq(vec![all.clone(), Step::Limit { count: 1 }])),
            Cardinality::AtMostOne
        );
        assert_eq!(
            Cardinality::of(&seq(vec![
                by_id(vec![1]),
                Step::Where {
                    predicate: Predicate::has("age", Test::gt(30)),
                },
            ])),
            Cardinality::AtMostOne
        );
        assert_eq!(
            Cardinality::of(&seq(vec![
                by_id(vec![1]),
                Step::Traverse {
                    direction: Direction::Out,
                    edge_labels: vec![],
                    target: WalkTarget::Vertices,
                },
            ])),
            Cardinality::Many
        );
        assert_eq!(Cardinality::of(&seq(vec![all, Step::Drop])), Cardinality::Zero);
    }
}
