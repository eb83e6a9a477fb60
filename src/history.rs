/// Linear undo/redo log over full state snapshots.
///
/// The log is append-only except for commit-after-undo, which discards the
/// redone future: this is a linear history, branches are not kept. Undo and
/// redo only move the cursor, they never touch entries.
#[derive(Debug, Clone)]
pub struct HistoryStore<T: Clone> {
    log: Vec<T>,
    cursor: Option<usize>,
    // edit key of the entry at the cursor, when it is still coalescable
    coalesce_key: Option<String>,
}

impl<T: Clone> Default for HistoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> HistoryStore<T> {
    pub fn new() -> Self {
        Self { log: Vec::new(), cursor: None, coalesce_key: None }
    }

    /// A store holding a single restored snapshot as its current entry.
    pub fn seeded(initial: T) -> Self {
        Self { log: vec![initial], cursor: Some(0), coalesce_key: None }
    }

    /// Appends `snapshot` and makes it current. Any entries after the cursor
    /// (an undone future) are discarded first.
    pub fn commit(&mut self, snapshot: T) {
        let keep = self.cursor.map_or(0, |i| i + 1);
        self.log.truncate(keep);
        self.log.push(snapshot);
        self.cursor = Some(self.log.len() - 1);
        self.coalesce_key = None;
    }

    /// Like [`commit`](Self::commit), but if the current entry was itself
    /// committed with the same `key` (and the cursor has not moved since),
    /// the entry is replaced in place. A burst of edits to one control then
    /// occupies a single history step.
    pub fn commit_coalesced(&mut self, key: &str, snapshot: T) {
        if let (Some(i), Some(k)) = (self.cursor, self.coalesce_key.as_deref()) {
            if i + 1 == self.log.len() && k == key {
                self.log[i] = snapshot;
                return;
            }
        }
        self.commit(snapshot);
        self.coalesce_key = Some(key.to_owned());
    }

    /// Moves the cursor one step back. No-op at the first entry or on an
    /// empty log; returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                self.coalesce_key = None;
                true
            }
            _ => false,
        }
    }

    /// Moves the cursor one step forward. No-op at the last entry; returns
    /// whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(i) if i + 1 < self.log.len() => {
                self.cursor = Some(i + 1);
                self.coalesce_key = None;
                true
            }
            _ => false,
        }
    }

    /// The snapshot at the cursor, or `None` before any commit.
    pub fn current(&self) -> Option<&T> {
        self.cursor.map(|i| &self.log[i])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.map_or(false, |i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(false, |i| i + 1 < self.log.len())
    }

    /// Cursor position for clients: -1 while the log is empty.
    pub fn cursor_index(&self) -> i64 {
        self.cursor.map_or(-1, |i| i as i64)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
