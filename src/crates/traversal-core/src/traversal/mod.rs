//! The fluent traversal builder
//!
//! A [`Traversal<S>`] is an immutable step sequence plus the shape `S` it is
//! positioned on. Every builder call consumes the traversal and returns a new
//! one; clone a traversal to branch from it. Building is synchronous and
//! never touches the network: validation errors (unregistered types, type
//! mismatches, unknown properties, unbound references, endpoint cardinality)
//! are returned right away.
//!
//! ```rust,ignore
//! let g = environment.g();
//! let friends: Vec<Person> = g
//!     .v_of::<Person>(marko_id)?
//!     .both::<Knows>()?
//!     .of_type::<Person>()?
//!     .to_list()
//!     .await?;
//! ```
//!
//! Which steps are available depends on the shape's kind: `out`/`in_`/`both`
//! and `add_e` need a vertex shape, `out_v`/`in_v` need an edge shape, `id`,
//! `label`, `values` and `of_type` need an element shape.

mod binding;
mod compile;
mod edge;

pub use binding::Bound;
pub use compile::CompiledTraversal;
pub use edge::EdgeBuilder;

use crate::environment::GraphEnvironment;
use crate::error::Result;
use crate::executor::Execution;
use crate::predicate::Predicate;
use crate::schema::{
    creation_payload, update_payload, Edge, EdgeKind, Element, ElementId, ElementKind,
    KindMarker, Vertex, VertexKind,
};
use crate::sequence::StepSequence;
use crate::shape::{AnyEdge, AnyVertex, Folded, Shape, ShapeInfo, Start, Val};
use crate::step::{Direction, Projection, Step, WalkTarget};
use binding::Scope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// A traversal that has not selected anything yet
pub type GraphSource = Traversal<Start>;

/// Immutable traversal positioned on shape `S`
pub struct Traversal<S> {
    env: GraphEnvironment,
    steps: StepSequence,
    shape: ShapeInfo,
    scope: Scope,
    _shape: PhantomData<fn() -> S>,
}

impl<S> Clone for Traversal<S> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            steps: self.steps.clone(),
            shape: self.shape.clone(),
            scope: self.scope.clone(),
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Traversal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("steps", &self.steps)
            .field("shape", &self.shape.describe())
            .field("scope", &self.scope)
            .finish()
    }
}

impl GraphSource {
    pub(crate) fn source(env: GraphEnvironment) -> Self {
        Self {
            env,
            steps: StepSequence::new(),
            shape: ShapeInfo::Start,
            scope: Scope::default(),
            _shape: PhantomData,
        }
    }
}

impl<S> Traversal<S> {
    fn push<R>(self, step: Step, shape: ShapeInfo) -> Traversal<R> {
        Traversal {
            env: self.env,
            steps: self.steps.append(step),
            shape,
            scope: self.scope,
            _shape: PhantomData,
        }
    }

    /// Empty sub-traversal positioned where this one is
    fn anonymous(&self) -> Traversal<S> {
        Traversal {
            env: self.env.clone(),
            steps: StepSequence::new(),
            shape: self.shape.clone(),
            scope: self.scope.clone(),
            _shape: PhantomData,
        }
    }

    /// Steps appended so far
    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    /// Environment this traversal executes in
    pub fn environment(&self) -> &GraphEnvironment {
        &self.env
    }
}

impl<S: Shape> Traversal<S> {
    /// Every vertex
    pub fn v_all(self) -> Traversal<AnyVertex> {
        self.push(
            Step::SelectAll {
                kind: ElementKind::Vertex,
            },
            ShapeInfo::any(ElementKind::Vertex),
        )
    }

    /// Every vertex of type `T`
    pub fn v<T: Vertex>(self) -> Result<Traversal<T>> {
        self.v_all().of_type::<T>()
    }

    /// Vertices with the given identifiers
    pub fn v_ids<I>(self, ids: I) -> Traversal<AnyVertex>
    where
        I: IntoIterator,
        I::Item: Into<ElementId>,
    {
        self.push(
            Step::SelectById {
                kind: ElementKind::Vertex,
                ids: ids.into_iter().map(Into::into).collect(),
            },
            ShapeInfo::any(ElementKind::Vertex),
        )
    }

    /// The vertex `id`, if it is a `T`
    pub fn v_of<T: Vertex>(self, id: impl Into<ElementId>) -> Result<Traversal<T>> {
        self.v_ids([id.into()]).of_type::<T>()
    }

    /// Every edge
    pub fn e_all(self) -> Traversal<AnyEdge> {
        self.push(
            Step::SelectAll {
                kind: ElementKind::Edge,
            },
            ShapeInfo::any(ElementKind::Edge),
        )
    }

    /// Every edge of type `T`
    pub fn e<T: Edge>(self) -> Result<Traversal<T>> {
        self.e_all().of_type::<T>()
    }

    /// Create a vertex from `value`, once per current traverser
    pub fn add_v<T: Vertex>(self, value: &T) -> Result<Traversal<T>> {
        let model = self.env.model();
        let label = model.label_of::<T>()?.label.clone();
        let properties = creation_payload(model, value)?;
        let shape = ShapeInfo::exactly(ElementKind::Vertex, label.clone());
        Ok(self.push(Step::AddVertex { label, properties }, shape))
    }

    /// Emit constant values
    pub fn inject<V, I>(self, values: I) -> Result<Traversal<Val<V>>>
    where
        V: Serialize + DeserializeOwned + Send + 'static,
        I: IntoIterator<Item = V>,
    {
        let values = values
            .into_iter()
            .map(|v| serde_json::to_value(&v))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self.push(Step::Inject { values }, ShapeInfo::Value))
    }

    /// Keep traversers satisfying `predicate`
    ///
    /// Property names are checked against the current candidates and bound
    /// references against the enclosing bindings.
    pub fn where_(self, predicate: Predicate) -> Result<Self> {
        let model = self.env.model();
        for key in predicate.property_keys() {
            self.shape.check_property(model, key)?;
        }
        for reference in predicate.bound_refs() {
            self.scope.resolve(reference)?;
        }
        let shape = self.shape.clone();
        Ok(self.push(Step::Where { predicate }, shape))
    }

    /// Gather every result into one list
    pub fn fold(self) -> Traversal<Folded<S>> {
        let shape = ShapeInfo::Folded(Box::new(self.shape.clone()));
        self.push(Step::Fold, shape)
    }

    /// Keep the first `count` results
    pub fn limit(self, count: u64) -> Self {
        let shape = self.shape.clone();
        self.push(Step::Limit { count }, shape)
    }

    /// Number of results
    pub fn count(self) -> Traversal<Val<u64>> {
        self.push(
            Step::Project {
                projection: Projection::Count,
            },
            ShapeInfo::Value,
        )
    }

    /// Remove the current elements from the graph
    pub fn drop(self) -> GraphSource {
        self.push(Step::Drop, ShapeInfo::Start)
    }

    /// Validate and freeze the step sequence
    pub fn compile(&self) -> Result<CompiledTraversal> {
        CompiledTraversal::in_scope(self.steps.clone(), self.scope.names())
    }

    /// Start executing; results stream as the engine emits them
    pub fn execute(&self) -> Result<Execution<S>> {
        let compiled = self.compile()?;
        Ok(self.env.execute::<S>(compiled))
    }

    /// Execute and collect every result
    pub async fn to_list(&self) -> Result<Vec<S::Output>> {
        self.execute()?.to_list().await
    }

    /// Execute with a limit of one and return the result, if any
    pub async fn first(&self) -> Result<Option<S::Output>> {
        let results = self.clone().limit(1).to_list().await?;
        Ok(results.into_iter().next())
    }
}

impl<S: Shape> Traversal<S>
where
    S::Kind: KindMarker,
{
    /// Narrow to elements of type `U`
    ///
    /// Elements of other labels are filtered out. Narrowing to a label
    /// outside the current candidates is a type mismatch.
    pub fn of_type<U: Element<Kind = S::Kind>>(self) -> Result<Traversal<U>> {
        let descriptor = self.env.model().label_of::<U>()?;
        let shape = self.shape.narrow(descriptor.kind, &descriptor.label)?;
        let labels = vec![descriptor.label.clone()];
        Ok(self.push(Step::TypeFilter { labels }, shape))
    }

    /// Engine-assigned identifiers
    pub fn id(self) -> Traversal<Val<ElementId>> {
        self.push(
            Step::Project {
                projection: Projection::Id,
            },
            ShapeInfo::Value,
        )
    }

    /// Element labels
    pub fn label(self) -> Traversal<Val<String>> {
        self.push(
            Step::Project {
                projection: Projection::Label,
            },
            ShapeInfo::Value,
        )
    }

    /// Values of the property `key`
    pub fn values<V>(self, key: &str) -> Result<Traversal<Val<V>>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        self.shape.check_property(self.env.model(), key)?;
        Ok(self.push(
            Step::Project {
                projection: Projection::Values {
                    key: key.to_string(),
                },
            },
            ShapeInfo::Value,
        ))
    }
}

impl<T: Element> Traversal<T> {
    /// Overwrite the current elements' properties from `value`
    ///
    /// Properties configured as ignored on update are left untouched.
    pub fn update(self, value: &T) -> Result<Self> {
        let properties = update_payload(self.env.model(), value)?;
        let shape = self.shape.clone();
        Ok(self.push(Step::Update { properties }, shape))
    }
}

impl<S: Shape<Kind = VertexKind>> Traversal<S> {
    fn walk<R>(
        self,
        direction: Direction,
        edge_labels: Vec<String>,
        target: WalkTarget,
        shape: ShapeInfo,
    ) -> Traversal<R> {
        self.push(
            Step::Traverse {
                direction,
                edge_labels,
                target,
            },
            shape,
        )
    }

    fn walk_vertices<E: Edge>(self, direction: Direction) -> Result<Traversal<AnyVertex>> {
        let label = self.env.model().label_of::<E>()?.label.clone();
        Ok(self.walk(
            direction,
            vec![label],
            WalkTarget::Vertices,
            ShapeInfo::any(ElementKind::Vertex),
        ))
    }

    fn walk_edges<E: Edge>(self, direction: Direction) -> Result<Traversal<E>> {
        let label = self.env.model().label_of::<E>()?.label.clone();
        let shape = ShapeInfo::exactly(ElementKind::Edge, label.clone());
        Ok(self.walk(direction, vec![label], WalkTarget::Edges, shape))
    }

    /// Vertices reached over outgoing `E` edges
    pub fn out<E: Edge>(self) -> Result<Traversal<AnyVertex>> {
        self.walk_vertices::<E>(Direction::Out)
    }

    /// Vertices reached over incoming `E` edges
    pub fn in_<E: Edge>(self) -> Result<Traversal<AnyVertex>> {
        self.walk_vertices::<E>(Direction::In)
    }

    /// Vertices reached over `E` edges in either direction
    pub fn both<E: Edge>(self) -> Result<Traversal<AnyVertex>> {
        self.walk_vertices::<E>(Direction::Both)
    }

    /// Vertices reached over any outgoing edge
    pub fn out_any(self) -> Traversal<AnyVertex> {
        self.walk(
            Direction::Out,
            Vec::new(),
            WalkTarget::Vertices,
            ShapeInfo::any(ElementKind::Vertex),
        )
    }

    /// Vertices reached over any incoming edge
    pub fn in_any(self) -> Traversal<AnyVertex> {
        self.walk(
            Direction::In,
            Vec::new(),
            WalkTarget::Vertices,
            ShapeInfo::any(ElementKind::Vertex),
        )
    }

    /// Vertices reached over any edge
    pub fn both_any(self) -> Traversal<AnyVertex> {
        self.walk(
            Direction::Both,
            Vec::new(),
            WalkTarget::Vertices,
            ShapeInfo::any(ElementKind::Vertex),
        )
    }

    /// Outgoing `E` edges
    pub fn out_e<E: Edge>(self) -> Result<Traversal<E>> {
        self.walk_edges::<E>(Direction::Out)
    }

    /// Incoming `E` edges
    pub fn in_e<E: Edge>(self) -> Result<Traversal<E>> {
        self.walk_edges::<E>(Direction::In)
    }

    /// `E` edges in either direction
    pub fn both_e<E: Edge>(self) -> Result<Traversal<E>> {
        self.walk_edges::<E>(Direction::Both)
    }

    /// Start creating an `E` edge incident to each current vertex
    ///
    /// ```rust,ignore
    /// g.v_of::<Person>(marko)?
    ///     .add_e(&Knows::default())?
    ///     .to(|t| t.v_of::<Person>(vadas))?
    ///     .first()
    ///     .await?;
    /// ```
    pub fn add_e<E: Edge>(self, value: &E) -> Result<EdgeBuilder<S, E>> {
        let model = self.env.model();
        let label = model.label_of::<E>()?.label.clone();
        let properties = creation_payload(model, value)?;
        Ok(EdgeBuilder::new(self, label, properties))
    }
}

impl<S: Shape<Kind = EdgeKind>> Traversal<S> {
    fn endpoint(self, direction: Direction) -> Traversal<AnyVertex> {
        self.push(Step::EdgeVertex { direction }, ShapeInfo::any(ElementKind::Vertex))
    }

    /// Source vertex of each edge
    pub fn out_v(self) -> Traversal<AnyVertex> {
        self.endpoint(Direction::Out)
    }

    /// Target vertex of each edge
    pub fn in_v(self) -> Traversal<AnyVertex> {
        self.endpoint(Direction::In)
    }

    /// Both endpoints of each edge
    pub fn both_v(self) -> Traversal<AnyVertex> {
        self.endpoint(Direction::Both)
    }
}
