//! Correlation binding
//!
//! `bind` names the value the traversal is positioned on and hands a
//! continuation two things: a sub-builder starting from that value and a
//! [`Bound`] handle. Predicates built inside the continuation may reference
//! the handle; its contents are only ever resolved by the engine.
//!
//! On the wire the continuation is nested inside the `bind` step, so the
//! binding is lexically scoped: steps appended after `bind` returns cannot
//! see it, and two binds of the same name in disjoint scopes never collide.
//!
//! ```rust,ignore
//! let peter = g
//!     .v_of::<Person>(marko)?
//!     .both::<Knows>()?
//!     .of_type::<Person>()?
//!     .fold()
//!     .bind(|t, known| {
//!         t.v::<Person>()?.where_(
//!             (!Predicate::is(Test::within_bound(&known)))
//!                 .and(Predicate::has("zip_code", Test::within(nearby))),
//!         )
//!     })?
//!     .to_list()
//!     .await?;
//! ```

use super::Traversal;
use crate::error::{Result, TraversalError};
use crate::predicate::BoundRef;
use crate::sequence::StepSequence;
use crate::shape::Shape;
use crate::step::Step;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a value bound by [`Traversal::bind`]
///
/// Only usable inside predicates of the continuation it was handed to.
pub struct Bound<S> {
    name: String,
    scope_id: u64,
    _shape: PhantomData<fn() -> S>,
}

impl<S> Bound<S> {
    /// Name the value is bound under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn reference(&self) -> BoundRef {
        BoundRef {
            name: self.name.clone(),
            scope_id: Some(self.scope_id),
        }
    }
}

impl<S> Clone for Bound<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            scope_id: self.scope_id,
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Bound<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("name", &self.name)
            .field("scope_id", &self.scope_id)
            .finish()
    }
}

struct Frame {
    name: String,
    id: u64,
    parent: Option<Arc<Frame>>,
}

/// Chain of bindings visible to a builder, innermost first
#[derive(Clone, Default)]
pub(crate) struct Scope {
    head: Option<Arc<Frame>>,
}

impl Scope {
    pub(crate) fn depth(&self) -> usize {
        self.frames().count()
    }

    fn push(&self, name: String, id: u64) -> Self {
        Self {
            head: Some(Arc::new(Frame {
                name,
                id,
                parent: self.head.clone(),
            })),
        }
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.head.as_deref(), |frame| frame.parent.as_deref())
    }

    /// Visible names, outermost first
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.frames().map(|f| f.name.clone()).collect();
        names.reverse();
        names
    }

    /// Resolve a reference against the innermost binding of its name
    pub(crate) fn resolve(&self, reference: &BoundRef) -> Result<()> {
        let frame = self
            .frames()
            .find(|frame| frame.name == reference.name)
            .ok_or_else(|| TraversalError::unbound(&reference.name))?;
        match reference.scope_id {
            Some(id) if id != frame.id => Err(TraversalError::unbound(&reference.name)),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// `_a` for the outermost binding, `_b` one level in, and so on
pub(crate) fn binding_name(depth: usize) -> String {
    match u8::try_from(depth) {
        Ok(d) if d < 26 => format!("_{}", char::from(b'a' + d)),
        _ => format!("_{}", depth),
    }
}

impl<S: Shape> Traversal<S> {
    /// Bind the current value under a generated name and continue in its scope
    pub fn bind<R, F>(self, continuation: F) -> Result<Traversal<R>>
    where
        R: Shape,
        F: FnOnce(Traversal<S>, Bound<S>) -> Result<Traversal<R>>,
    {
        let name = binding_name(self.scope.depth());
        self.bind_as(name, continuation)
    }

    /// Bind the current value under `name`
    ///
    /// An outer binding of the same name is shadowed inside the continuation
    /// and visible again afterwards.
    pub fn bind_as<R, F>(self, name: impl Into<String>, continuation: F) -> Result<Traversal<R>>
    where
        R: Shape,
        F: FnOnce(Traversal<S>, Bound<S>) -> Result<Traversal<R>>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(TraversalError::unbound(name));
        }

        let scope_id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        trace!(name = %name, depth = self.scope.depth(), "Opening binding scope");

        let inner = Traversal {
            env: self.env.clone(),
            steps: StepSequence::new(),
            shape: self.shape.clone(),
            scope: self.scope.push(name.clone(), scope_id),
            _shape: PhantomData,
        };
        let handle = Bound {
            name: name.clone(),
            scope_id,
            _shape: PhantomData,
        };

        let result = continuation(inner, handle)?;
        Ok(Traversal {
            env: self.env,
            steps: self.steps.append(Step::Bind {
                name,
                continuation: result.steps,
            }),
            shape: result.shape,
            scope: self.scope,
            _shape: PhantomData,
        })
    }
}
