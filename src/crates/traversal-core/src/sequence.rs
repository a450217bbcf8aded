//! Persistent step sequence
//!
//! A [`StepSequence`] is an immutable singly linked list of [`Step`]s whose
//! nodes are shared through `Arc`. Appending allocates one node that points
//! at the existing tail, so the receiver is left untouched and every
//! builder derived from a common prefix shares that prefix in memory.

use crate::step::Step;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

struct Node {
    step: Step,
    prev: Option<Arc<Node>>,
}

/// Ordered, immutable list of traversal steps
#[derive(Clone, Default)]
pub struct StepSequence {
    head: Option<Arc<Node>>,
    len: usize,
}

impl StepSequence {
    /// The empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// A new sequence with `step` appended; `self` is unchanged
    pub fn append(&self, step: Step) -> Self {
        Self {
            head: Some(Arc::new(Node {
                step,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence has no steps
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most recently appended step
    pub fn last(&self) -> Option<&Step> {
        self.head.as_ref().map(|node| &node.step)
    }

    /// Steps in execution order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Step> + ExactSizeIterator {
        let mut steps = Vec::with_capacity(self.len);
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            steps.push(&node.step);
            cursor = node.prev.as_deref();
        }
        steps.into_iter().rev()
    }

    /// Owned copy of the steps in execution order
    pub fn to_vec(&self) -> Vec<Step> {
        self.iter().cloned().collect()
    }

    /// Whether `self` is physically shared as the prefix of `other`
    pub fn is_prefix_of(&self, other: &StepSequence) -> bool {
        let Some(head) = &self.head else {
            return true;
        };
        let mut cursor = other.head.as_ref();
        while let Some(node) = cursor {
            if Arc::ptr_eq(node, head) {
                return true;
            }
            cursor = node.prev.as_ref();
        }
        false
    }
}

impl Drop for StepSequence {
    fn drop(&mut self) {
        // Unlink iteratively so very long sequences do not recurse on drop.
        let mut cursor = self.head.take();
        while let Some(node) = cursor {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cursor = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl FromIterator<Step> for StepSequence {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StepSequence::new(), |seq, step| seq.append(step))
    }
}

impl PartialEq for StepSequence {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for StepSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for StepSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for StepSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Step>::deserialize(deserializer).map(|steps| steps.into_iter().collect())
    }
}
