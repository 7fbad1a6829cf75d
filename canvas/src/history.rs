//! Linear undo/redo over full-scene snapshots.
//!
//! The undo stack's bottom entry is the scene the editor started with and is
//! never popped. `commit` pushes a snapshot and clears the redo stack; `undo`
//! and `redo` only move entries between the stacks and hand back the snapshot
//! the caller should reload. Reloading is wrapped in a [`ReplayGuard`], and
//! commits are ignored for as long as one is alive.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::doc::PoseDocument;

/// Undo/redo stacks of scene snapshots.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<PoseDocument>,
    redo: Vec<PoseDocument>,
    replaying: Rc<Cell<bool>>,
}

/// Suppresses [`History::commit`] until dropped.
#[must_use = "commits are only suppressed while the guard is alive"]
#[derive(Debug)]
pub struct ReplayGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

impl History {
    /// History whose permanent floor is `initial`.
    #[must_use]
    pub fn new(initial: PoseDocument) -> Self {
        Self { undo: vec![initial], redo: Vec::new(), replaying: Rc::default() }
    }

    /// Record a completed edit. Returns `false` (and records nothing) while a
    /// replay is in progress.
    pub fn commit(&mut self, snapshot: PoseDocument) -> bool {
        if self.replaying.get() {
            return false;
        }
        self.undo.push(snapshot);
        self.redo.clear();
        true
    }

    /// Step back one entry and return the snapshot to reload.
    ///
    /// With only the floor entry left nothing moves, but the floor is still
    /// returned so the caller can restore it. `None` only for an empty history.
    pub fn undo(&mut self) -> Option<PoseDocument> {
        if self.undo.len() > 1 {
            if let Some(top) = self.undo.pop() {
                self.redo.push(top);
            }
        }
        self.undo.last().cloned()
    }

    /// Re-apply the most recently undone entry and return it.
    pub fn redo(&mut self) -> Option<PoseDocument> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        Some(entry)
    }

    /// Mark a programmatic reload; commits are ignored until the guard drops.
    pub fn replay_scope(&self) -> ReplayGuard {
        self.replaying.set(true);
        ReplayGuard { flag: Rc::clone(&self.replaying) }
    }

    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.replaying.get()
    }

    /// The snapshot at the top of the undo stack.
    #[must_use]
    pub fn current(&self) -> Option<&PoseDocument> {
        self.undo.last()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
