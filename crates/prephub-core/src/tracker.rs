//! Per-question answer bookkeeping.

use std::collections::BTreeMap;

use crate::model::OptionLabel;

/// Maps question index to the chosen option label.
///
/// Bound to a sequence length so that every key stays inside
/// `0..len`. Selections are independent of navigation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerTracker {
    len: usize,
    answers: BTreeMap<usize, OptionLabel>,
}

impl AnswerTracker {
    /// Empty tracker for a sequence of `len` questions.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            answers: BTreeMap::new(),
        }
    }

    /// Record or overwrite the answer for `index`.
    ///
    /// Returns `false` (and records nothing) if `index` is out of range.
    pub fn select(&mut self, index: usize, label: OptionLabel) -> bool {
        if index >= self.len {
            return false;
        }
        self.answers.insert(index, label);
        true
    }

    pub fn get(&self, index: usize) -> Option<OptionLabel> {
        self.answers.get(&index).copied()
    }

    /// Number of answered questions.
    pub fn count(&self) -> usize {
        self.answers.len()
    }

    /// Length of the sequence this tracker is bound to.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answered entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, OptionLabel)> + '_ {
        self.answers.iter().map(|(&i, &l)| (i, l))
    }
}
