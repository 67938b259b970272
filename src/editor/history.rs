//! Bounded undo/redo history of whole-state snapshots.

use std::collections::VecDeque;

/// Maximum number of undo steps kept.
pub const HISTORY_LIMIT: usize = 50;

/// Undo and redo stacks of snapshots.
///
/// `past` is capped; recording a snapshot when full drops the oldest one.
/// Any new record clears `future`.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state as it was before a mutation.
    pub fn record(&mut self, snapshot: T) {
        self.push_past(snapshot);
        self.future.clear();
    }

    fn push_past(&mut self, snapshot: T) {
        if self.past.len() >= self.limit {
            self.past.pop_front();
        }
        self.past.push_back(snapshot);
    }

    /// Step back: `current` becomes the last recorded state and the state it
    /// replaces goes onto the redo stack. Returns `false` with nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let replaced = std::mem::replace(current, previous);
        self.future.push(replaced);
        true
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let replaced = std::mem::replace(current, next);
        self.push_past(replaced);
        true
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::default();
        let mut state = 1;
        history.record(state);
        state = 2;

        assert!(history.undo(&mut state));
        assert_eq!(state, 1);
        assert!(!history.undo(&mut state));
        assert!(history.redo(&mut state));
        assert_eq!(state, 2);
        assert!(!history.redo(&mut state));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::default();
        let mut state = 'a';
        history.record(state);
        state = 'b';
        history.undo(&mut state);
        assert!(history.can_redo());
        history.record(state);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(i);
        }
        assert_eq!(history.undo_depth(), 3);
        let mut state = 5;
        while history.undo(&mut state) {}
        // 0 and 1 were evicted.
        assert_eq!(state, 2);
    }

    #[test]
    fn test_default_limit() {
        let mut history = History::default();
        for i in 0..(HISTORY_LIMIT + 10) {
            history.record(i);
        }
        assert_eq!(history.undo_depth(), HISTORY_LIMIT);
    }
}
