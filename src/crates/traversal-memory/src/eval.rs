//! Step evaluation
//!
//! A traversal is evaluated breadth-first: every step maps the full list of
//! traversers to the next one. A traverser is the current item plus the
//! bindings visible to it. `bind` evaluates its continuation once per
//! incoming traverser with the binding added; `fold` and `count` are
//! barriers that always produce exactly one traverser carrying the bindings
//! of the enclosing scope.

use crate::error::{EngineError, Result};
use crate::store::GraphData;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use traversal_core::schema::{ID_KEY, LABEL_KEY};
use traversal_core::{
    Direction, ElementKind, Operand, Predicate, Projection, RawResult, Step, StepSequence, Test,
    WalkTarget,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    /// Position before any selection
    Root,
    Element(ElementKind, i64),
    Value(Value),
    List(Vec<Item>),
}

impl Item {
    fn describe(&self) -> String {
        match self {
            Self::Root => "the traversal source".to_string(),
            Self::Element(kind, id) => format!("{} {}", kind, id),
            Self::Value(value) => format!("value {}", value),
            Self::List(items) => format!("a list of {}", items.len()),
        }
    }

    fn members(self) -> Vec<Item> {
        match self {
            Self::List(items) => items,
            Self::Value(Value::Array(values)) => values.into_iter().map(Item::Value).collect(),
            other => vec![other],
        }
    }
}

struct Binding {
    name: String,
    value: Item,
    parent: Bindings,
}

/// Names bound around a traverser, innermost first
#[derive(Clone, Default)]
pub(crate) struct Bindings(Option<Arc<Binding>>);

impl Bindings {
    fn with(&self, name: &str, value: Item) -> Self {
        Self(Some(Arc::new(Binding {
            name: name.to_string(),
            value,
            parent: self.clone(),
        })))
    }

    fn get(&self, name: &str) -> Option<&Item> {
        let mut current = self.0.as_deref();
        while let Some(binding) = current {
            if binding.name == name {
                return Some(&binding.value);
            }
            current = binding.parent.0.as_deref();
        }
        None
    }
}

#[derive(Clone)]
struct Traverser {
    item: Item,
    bindings: Bindings,
}

impl Traverser {
    fn with_item(&self, item: Item) -> Self {
        Self {
            item,
            bindings: self.bindings.clone(),
        }
    }
}

/// Read or write access to the graph for one evaluation
pub(crate) enum Access<'a> {
    Read(&'a GraphData),
    Write(&'a mut GraphData),
}

impl Access<'_> {
    fn data(&self) -> &GraphData {
        match self {
            Self::Read(data) => *data,
            Self::Write(data) => &**data,
        }
    }

    fn data_mut(&mut self) -> Result<&mut GraphData> {
        match self {
            Self::Read(_) => Err(EngineError::InvalidRequest(
                "mutation during a read-only evaluation".to_string(),
            )),
            Self::Write(data) => Ok(&mut **data),
        }
    }
}

/// Whether evaluating `steps` changes the graph
pub(crate) fn mutates(steps: &StepSequence) -> bool {
    steps.iter().any(|step| match step {
        Step::AddVertex { .. } | Step::AddEdge { .. } | Step::Update { .. } | Step::Drop => true,
        Step::Bind { continuation, .. } => mutates(continuation),
        _ => false,
    })
}

pub(crate) struct Evaluator<'a> {
    graph: Access<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(graph: Access<'a>) -> Self {
        Self { graph }
    }

    /// Evaluate a whole traversal from the source
    pub fn run(&mut self, steps: &StepSequence) -> Result<Vec<RawResult>> {
        let root = Traverser {
            item: Item::Root,
            bindings: Bindings::default(),
        };
        let results = self.evaluate(steps, vec![root], &Bindings::default())?;
        Ok(results
            .into_iter()
            .filter_map(|t| self.raw(t.item))
            .collect())
    }

    fn evaluate(
        &mut self,
        steps: &StepSequence,
        mut traversers: Vec<Traverser>,
        scope: &Bindings,
    ) -> Result<Vec<Traverser>> {
        for step in steps.iter() {
            traversers = self.apply(step, traversers, scope)?;
        }
        Ok(traversers)
    }

    fn apply(&mut self, step: &Step, input: Vec<Traverser>, scope: &Bindings) -> Result<Vec<Traverser>> {
        Ok(match step {
            Step::SelectAll { kind } => {
                let ids = self.graph.data().ids(*kind);
                expand(&input, |_| Ok(ids.iter().map(|id| Item::Element(*kind, *id)).collect()))?
            }
            Step::SelectById { kind, ids } => {
                let data = self.graph.data();
                let found: Vec<i64> = ids.iter().filter_map(|id| data.contains(*kind, id)).collect();
                expand(&input, |_| Ok(found.iter().map(|id| Item::Element(*kind, *id)).collect()))?
            }
            Step::TypeFilter { labels } => {
                let data = self.graph.data();
                input
                    .into_iter()
                    .filter(|t| match t.item {
                        Item::Element(kind, id) => data
                            .label(kind, id)
                            .is_some_and(|label| labels.iter().any(|l| l == label)),
                        _ => false,
                    })
                    .collect()
            }
            Step::AddVertex { label, properties } => {
                let mut out = Vec::with_capacity(input.len());
                for t in input {
                    let id = self.graph.data_mut()?.add_vertex(label, properties);
                    out.push(t.with_item(Item::Element(ElementKind::Vertex, id)));
                }
                out
            }
            Step::AddEdge {
                label,
                properties,
                from,
                to,
            } => {
                let mut out = Vec::with_capacity(input.len());
                for t in input {
                    let current = vertex_of("addEdge", &t.item)?;
                    let (out_v, in_v) = match (from, to) {
                        (Some(selector), None) => (self.endpoint(label, selector, &t)?, current),
                        (None, Some(selector)) => (current, self.endpoint(label, selector, &t)?),
                        _ => {
                            return Err(EngineError::InvalidRequest(format!(
                                "edge '{}' needs exactly one endpoint selector",
                                label
                            )))
                        }
                    };
                    let id = self.graph.data_mut()?.add_edge(label, properties, out_v, in_v);
                    out.push(t.with_item(Item::Element(ElementKind::Edge, id)));
                }
                out
            }
            Step::Update { properties } => {
                for t in &input {
                    match t.item {
                        Item::Element(kind, id) => self.graph.data_mut()?.update(kind, id, properties),
                        ref other => return Err(EngineError::unsupported("update", other.describe())),
                    }
                }
                input
            }
            Step::Traverse {
                direction,
                edge_labels,
                target,
            } => {
                let data = self.graph.data();
                expand(&input, |item| {
                    let vertex = vertex_of("traverse", item)?;
                    let edges = data.incident(vertex, *direction, edge_labels);
                    Ok(edges
                        .into_iter()
                        .filter_map(|edge| match target {
                            WalkTarget::Edges => Some(Item::Element(ElementKind::Edge, edge)),
                            WalkTarget::Vertices => data.edge(edge).map(|record| {
                                let other = match direction {
                                    Direction::Out => record.in_v,
                                    Direction::In => record.out_v,
                                    Direction::Both if record.out_v == vertex => record.in_v,
                                    Direction::Both => record.out_v,
                                };
                                Item::Element(ElementKind::Vertex, other)
                            }),
                        })
                        .collect())
                })?
            }
            Step::EdgeVertex { direction } => {
                let data = self.graph.data();
                expand(&input, |item| {
                    let record = match item {
                        Item::Element(ElementKind::Edge, id) => data.edge(*id),
                        other => return Err(EngineError::unsupported("edgeVertex", other.describe())),
                    };
                    let Some(record) = record else {
                        return Ok(Vec::new());
                    };
                    let ends = match direction {
                        Direction::Out => vec![record.out_v],
                        Direction::In => vec![record.in_v],
                        Direction::Both => vec![record.out_v, record.in_v],
                    };
                    Ok(ends
                        .into_iter()
                        .map(|id| Item::Element(ElementKind::Vertex, id))
                        .collect())
                })?
            }
            Step::Where { predicate } => {
                let mut out = Vec::with_capacity(input.len());
                for t in input {
                    if self.holds(predicate, &t)? {
                        out.push(t);
                    }
                }
                out
            }
            Step::Inject { values } => inject(input, values, scope),
            Step::Fold => {
                let items = input
                    .into_iter()
                    .map(|t| t.item)
                    .filter(|item| *item != Item::Root)
                    .collect();
                vec![Traverser {
                    item: Item::List(items),
                    bindings: scope.clone(),
                }]
            }
            Step::Bind { name, continuation } => {
                let mut out = Vec::new();
                for t in input {
                    let inner = t.bindings.with(name, t.item.clone());
                    let start = Traverser {
                        item: t.item.clone(),
                        bindings: inner.clone(),
                    };
                    for result in self.evaluate(continuation, vec![start], &inner)? {
                        out.push(t.with_item(result.item));
                    }
                }
                out
            }
            Step::Project { projection } => self.project(projection, input, scope)?,
            Step::Limit { count } => {
                let count = usize::try_from(*count).unwrap_or(usize::MAX);
                input.into_iter().take(count).collect()
            }
            Step::Drop => {
                for t in input {
                    if let Item::Element(kind, id) = t.item {
                        self.graph.data_mut()?.remove(kind, id);
                    }
                }
                Vec::new()
            }
        })
    }

    fn endpoint(&mut self, label: &str, selector: &StepSequence, t: &Traverser) -> Result<i64> {
        let found = self.evaluate(selector, vec![t.clone()], &t.bindings)?;
        match found.as_slice() {
            [only] => match only.item {
                Item::Element(ElementKind::Vertex, id) => Ok(id),
                ref other => Err(EngineError::unsupported("addEdge", other.describe())),
            },
            _ => Err(EngineError::Endpoint {
                label: label.to_string(),
                found: found.len(),
            }),
        }
    }

    fn project(
        &self,
        projection: &Projection,
        input: Vec<Traverser>,
        scope: &Bindings,
    ) -> Result<Vec<Traverser>> {
        let data = self.graph.data();
        match projection {
            Projection::Count => {
                let count = input.iter().filter(|t| t.item != Item::Root).count();
                Ok(vec![Traverser {
                    item: Item::Value(json!(count)),
                    bindings: scope.clone(),
                }])
            }
            Projection::Id => expand(&input, |item| match item {
                Item::Element(_, id) => Ok(vec![Item::Value(json!(id))]),
                other => Err(EngineError::unsupported("id", other.describe())),
            }),
            Projection::Label => expand(&input, |item| match item {
                Item::Element(kind, id) => Ok(data
                    .label(*kind, *id)
                    .map(|label| Item::Value(json!(label)))
                    .into_iter()
                    .collect()),
                other => Err(EngineError::unsupported("label", other.describe())),
            }),
            Projection::Values { key } => expand(&input, |item| match item {
                Item::Element(..) => Ok(self.property(item, key).map(Item::Value).into_iter().collect()),
                other => Err(EngineError::unsupported("values", other.describe())),
            }),
        }
    }

    fn property(&self, item: &Item, key: &str) -> Option<Value> {
        let Item::Element(kind, id) = item else {
            return None;
        };
        let data = self.graph.data();
        match key {
            ID_KEY => Some(json!(id)),
            LABEL_KEY => data.label(*kind, *id).map(|label| json!(label)),
            _ => data.properties(*kind, *id)?.get(key).cloned(),
        }
    }

    fn holds(&self, predicate: &Predicate, t: &Traverser) -> Result<bool> {
        match predicate {
            Predicate::Has { key, test } => match self.property(&t.item, key) {
                Some(value) => check(test, &Item::Value(value), &t.bindings),
                None => Ok(false),
            },
            Predicate::Is { test } => check(test, &t.item, &t.bindings),
            Predicate::And { operands } => {
                for operand in operands {
                    if !self.holds(operand, t)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or { operands } => {
                for operand in operands {
                    if self.holds(operand, t)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { operand } => Ok(!self.holds(operand, t)?),
        }
    }

    fn raw(&self, item: Item) -> Option<RawResult> {
        match item {
            Item::Root => None,
            Item::Element(kind, id) => self.graph.data().raw(kind, id).map(RawResult::Element),
            Item::Value(value) => Some(RawResult::Value(value)),
            Item::List(items) => Some(RawResult::List(
                items.into_iter().filter_map(|item| self.raw(item)).collect(),
            )),
        }
    }
}

/// Replace every traverser by the items `f` derives from it
fn expand<F>(input: &[Traverser], mut f: F) -> Result<Vec<Traverser>>
where
    F: FnMut(&Item) -> Result<Vec<Item>>,
{
    let mut out = Vec::with_capacity(input.len());
    for t in input {
        out.extend(f(&t.item)?.into_iter().map(|item| t.with_item(item)));
    }
    Ok(out)
}

fn vertex_of(step: &'static str, item: &Item) -> Result<i64> {
    match item {
        Item::Element(ElementKind::Vertex, id) => Ok(*id),
        other => Err(EngineError::unsupported(step, other.describe())),
    }
}

// The source traverser is replaced by the values; after a selection they
// are emitted once, behind the existing traversers.
fn inject(input: Vec<Traverser>, values: &[Value], scope: &Bindings) -> Vec<Traverser> {
    let emit = |bindings: &Bindings| {
        values
            .iter()
            .map(|value| Traverser {
                item: Item::Value(value.clone()),
                bindings: bindings.clone(),
            })
            .collect::<Vec<_>>()
    };
    let tail = input
        .first()
        .map(|t| t.bindings.clone())
        .unwrap_or_else(|| scope.clone());

    let mut out = Vec::with_capacity(input.len() + values.len());
    let mut rooted = false;
    for t in input {
        if t.item == Item::Root {
            rooted = true;
            out.extend(emit(&t.bindings));
        } else {
            out.push(t);
        }
    }
    if !rooted {
        out.extend(emit(&tail));
    }
    out
}

fn resolve(operand: &Operand, bindings: &Bindings) -> Result<Item> {
    match operand {
        Operand::Constant(value) => Ok(Item::Value(value.clone())),
        Operand::Bound(reference) => bindings
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownBinding(reference.name.clone())),
    }
}

fn check(test: &Test, subject: &Item, bindings: &Bindings) -> Result<bool> {
    let ordered = |operand: &Operand, accept: fn(Ordering) -> bool| -> Result<bool> {
        Ok(compare(subject, &resolve(operand, bindings)?).is_some_and(accept))
    };
    match test {
        Test::Eq(operand) => Ok(same(subject, &resolve(operand, bindings)?)),
        Test::Neq(operand) => Ok(!same(subject, &resolve(operand, bindings)?)),
        Test::Lt(operand) => ordered(operand, Ordering::is_lt),
        Test::Lte(operand) => ordered(operand, Ordering::is_le),
        Test::Gt(operand) => ordered(operand, Ordering::is_gt),
        Test::Gte(operand) => ordered(operand, Ordering::is_ge),
        Test::Within(operand) => Ok(resolve(operand, bindings)?
            .members()
            .iter()
            .any(|member| same(subject, member))),
        Test::Without(operand) => Ok(!resolve(operand, bindings)?
            .members()
            .iter()
            .any(|member| same(subject, member))),
    }
}

/// Equality; elements compare by identifier, numbers by value
fn same(a: &Item, b: &Item) -> bool {
    match (a, b) {
        (Item::Value(x), Item::Value(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Item::Element(_, id), Item::Value(v)) | (Item::Value(v), Item::Element(_, id)) => {
            v.as_i64() == Some(*id)
        }
        _ => a == b,
    }
}

fn compare(a: &Item, b: &Item) -> Option<Ordering> {
    match (a, b) {
        (Item::Value(Value::String(x)), Item::Value(Value::String(y))) => Some(x.cmp(y)),
        (Item::Value(x), Item::Value(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        _ => None,
    }
}
