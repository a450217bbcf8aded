//! Filter predicates
//!
//! Predicates are data, not closures: they are evaluated per element by the
//! engine. An operand is either a constant or a reference to a value bound
//! earlier in the same traversal (see [`Bound`]).
//!
//! ```rust,ignore
//! let nearby = Predicate::has("zip_code", Test::within(["10001", "10122"]));
//! let unknown = !Predicate::is(Test::within_bound(&known));
//! traversal.where_(unknown.and(nearby))?;
//! ```

use crate::shape::{Folded, Shape};
use crate::traversal::Bound;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Not;

/// Reference to a bound value, resolved by the engine at execution time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundRef {
    /// Binding name
    pub name: String,
    #[serde(skip)]
    pub(crate) scope_id: Option<u64>,
}

impl BoundRef {
    /// Reference a binding by name only
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope_id: None,
        }
    }
}

impl PartialEq for BoundRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Right-hand side of a [`Test`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operand {
    /// Literal value
    Constant(Value),
    /// Value bound earlier in the traversal
    Bound(BoundRef),
}

/// Comparison applied to a property or to the current element
///
/// Elements compare by identifier. `Within` and `Without` expect a list
/// operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", content = "operand", rename_all = "camelCase")]
pub enum Test {
    /// Equal to the operand
    Eq(Operand),
    /// Not equal to the operand
    Neq(Operand),
    /// Less than the operand
    Lt(Operand),
    /// Less than or equal to the operand
    Lte(Operand),
    /// Greater than the operand
    Gt(Operand),
    /// Greater than or equal to the operand
    Gte(Operand),
    /// Member of the operand list
    Within(Operand),
    /// Not a member of the operand list
    Without(Operand),
}

impl Test {
    /// Equality with a constant
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::Eq(Operand::Constant(value.into()))
    }

    /// Inequality with a constant
    pub fn neq(value: impl Into<Value>) -> Self {
        Self::Neq(Operand::Constant(value.into()))
    }

    /// Strictly below a constant
    pub fn lt(value: impl Into<Value>) -> Self {
        Self::Lt(Operand::Constant(value.into()))
    }

    /// At most a constant
    pub fn lte(value: impl Into<Value>) -> Self {
        Self::Lte(Operand::Constant(value.into()))
    }

    /// Strictly above a constant
    pub fn gt(value: impl Into<Value>) -> Self {
        Self::Gt(Operand::Constant(value.into()))
    }

    /// At least a constant
    pub fn gte(value: impl Into<Value>) -> Self {
        Self::Gte(Operand::Constant(value.into()))
    }

    /// Membership in a constant list
    pub fn within<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Within(Operand::Constant(Value::Array(
            values.into_iter().map(Into::into).collect(),
        )))
    }

    /// Non-membership in a constant list
    pub fn without<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Without(Operand::Constant(Value::Array(
            values.into_iter().map(Into::into).collect(),
        )))
    }

    /// Equality with a bound value
    pub fn eq_bound<S: Shape>(handle: &Bound<S>) -> Self {
        Self::Eq(Operand::Bound(handle.reference()))
    }

    /// Inequality with a bound value
    pub fn neq_bound<S: Shape>(handle: &Bound<S>) -> Self {
        Self::Neq(Operand::Bound(handle.reference()))
    }

    /// Membership in a bound, folded list
    pub fn within_bound<S: Shape>(handle: &Bound<Folded<S>>) -> Self {
        Self::Within(Operand::Bound(handle.reference()))
    }

    /// Non-membership in a bound, folded list
    pub fn without_bound<S: Shape>(handle: &Bound<Folded<S>>) -> Self {
        Self::Without(Operand::Bound(handle.reference()))
    }

    /// Operand of this test
    pub fn operand(&self) -> &Operand {
        match self {
            Self::Eq(o)
            | Self::Neq(o)
            | Self::Lt(o)
            | Self::Lte(o)
            | Self::Gt(o)
            | Self::Gte(o)
            | Self::Within(o)
            | Self::Without(o) => o,
        }
    }
}

/// Boolean filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Predicate {
    /// Test a property of the current element
    Has {
        /// Property name
        key: String,
        /// Test applied to the property value
        test: Test,
    },
    /// Test the current element or value itself
    Is {
        /// Test applied to the current element
        test: Test,
    },
    /// Every operand holds
    And {
        /// Conjuncts
        operands: Vec<Predicate>,
    },
    /// At least one operand holds
    Or {
        /// Disjuncts
        operands: Vec<Predicate>,
    },
    /// The operand does not hold
    Not {
        /// Negated predicate
        operand: Box<Predicate>,
    },
}

impl Predicate {
    /// Test the property `key`
    pub fn has(key: impl Into<String>, test: Test) -> Self {
        Self::Has {
            key: key.into(),
            test,
        }
    }

    /// Test the current element or value
    pub fn is(test: Test) -> Self {
        Self::Is { test }
    }

    /// Conjunction, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Self {
        let mut operands = match self {
            Self::And { operands } => operands,
            single => vec![single],
        };
        match other {
            Self::And { operands: rest } => operands.extend(rest),
            single => operands.push(single),
        }
        Self::And { operands }
    }

    /// Disjunction, flattening nested `Or`s
    pub fn or(self, other: Predicate) -> Self {
        let mut operands = match self {
            Self::Or { operands } => operands,
            single => vec![single],
        };
        match other {
            Self::Or { operands: rest } => operands.extend(rest),
            single => operands.push(single),
        }
        Self::Or { operands }
    }

    /// Property names this predicate reads
    pub fn property_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.visit(&mut |p| {
            if let Self::Has { key, .. } = p {
                keys.push(key.as_str());
            }
        });
        keys
    }

    /// Bound values this predicate references
    pub fn bound_refs(&self) -> Vec<&BoundRef> {
        let mut refs = Vec::new();
        self.visit(&mut |p| match p {
            Self::Has { test, .. } | Self::Is { test } => {
                if let Operand::Bound(r) = test.operand() {
                    refs.push(r);
                }
            }
            _ => {}
        });
        refs
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Predicate)) {
        f(self);
        match self {
            Self::And { operands } | Self::Or { operands } => {
                for operand in operands {
                    operand.visit(f);
                }
            }
            Self::Not { operand } => operand.visit(f),
            Self::Has { .. } | Self::Is { .. } => {}
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Self::Not { operand } => *operand,
            other => Self::Not {
                operand: Box::new(other),
            },
        }
    }
}
