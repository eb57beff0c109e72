//! Linear undo/redo over committed storage writes.
//!
//! The client records, for every key it is about to write, the value the key
//! held before the write (or its absence). One commit becomes one undo step.
//! Multi-object commits are wrapped in `begin_batch` / `end_batch` so they undo
//! together; this groups history only and does not make the writes atomic on
//! the wire.
//!
//! Undoing a step hands back the writes that restore the earlier state and
//! pushes the inverse onto the redo stack. A fresh commit clears redo.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use serde_json::Value;

/// Default number of undo steps retained.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A single storage write. `value: None` is a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub key: String,
    pub value: Option<Value>,
}

type Step = Vec<Write>;

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Step>,
    redo: Vec<Step>,
    pending: Step,
    depth: u32,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { undo: VecDeque::new(), redo: Vec::new(), pending: Vec::new(), depth: 0, limit: limit.max(1) }
    }

    /// Open a batch. Batches nest; only the outermost `end_batch` closes the step.
    pub fn begin_batch(&mut self) {
        self.depth += 1;
    }

    /// Close a batch opened with [`Self::begin_batch`].
    pub fn end_batch(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.flush();
        }
    }

    /// Record that `key` held `previous` before the write about to happen.
    ///
    /// Within one batch only the first write to a key is remembered, so undo
    /// restores the state from before the batch began.
    pub fn record(&mut self, key: &str, previous: Option<Value>) {
        if !self.pending.iter().any(|w| w.key == key) {
            self.pending.push(Write { key: key.to_string(), value: previous });
        }
        if self.depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let step = std::mem::take(&mut self.pending);
        self.undo.push_back(step);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Pop the latest step. `current` reads the present value of a key so the
    /// redo inverse can be captured before the caller applies the writes.
    pub fn undo<F>(&mut self, current: F) -> Option<Vec<Write>>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let step = self.undo.pop_back()?;
        self.redo.push(invert(&step, &current));
        Some(step)
    }

    /// Re-apply the most recently undone step.
    pub fn redo<F>(&mut self, current: F) -> Option<Vec<Write>>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let step = self.redo.pop()?;
        self.undo.push_back(invert(&step, &current));
        Some(step)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo steps currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    /// Drop all recorded steps.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.pending.clear();
        self.depth = 0;
    }
}

fn invert<F>(step: &[Write], current: &F) -> Step
where
    F: Fn(&str) -> Option<Value>,
{
    step.iter()
        .map(|w| Write { key: w.key.clone(), value: current(&w.key) })
        .collect()
}
