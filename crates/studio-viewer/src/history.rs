//! Linear undo/redo over scene snapshots
//!
//! Entries are lightweight descriptions of a scene configuration (catalog
//! entries and slider levels), never GPU resources.

use studio_catalog::{Backdrop, Catalog, Outfit, Tint};

/// The undoable part of the scene
#[derive(Debug, Clone)]
pub struct SceneState {
    pub backdrop: Backdrop,
    pub outfit: Option<Outfit>,
    pub tint: Tint,
    /// 0..1
    pub reflection: f32,
    /// 0..1
    pub grid: f32,
}

/// Structural equality: backdrop and outfit by id, tint by hex, levels by value
impl PartialEq for SceneState {
    fn eq(&self, other: &Self) -> bool {
        self.backdrop == other.backdrop
            && self.outfit == other.outfit
            && self.tint == other.tint
            && self.reflection == other.reflection
            && self.grid == other.grid
    }
}

impl SceneState {
    /// First backdrop, no outfit, default tint
    pub fn initial(catalog: &Catalog, reflection: f32, grid: f32) -> Self {
        Self {
            backdrop: catalog.default_backdrop().clone(),
            outfit: None,
            tint: catalog.default_tint().clone(),
            reflection,
            grid,
        }
    }

    /// Whether moving between the two states changes what the subject wears
    pub fn appearance_differs(&self, other: &SceneState) -> bool {
        self.outfit.as_ref().map(|o| &o.id) != other.outfit.as_ref().map(|o| &o.id)
            || self.tint != other.tint
    }
}

/// Result of an undo or redo
#[derive(Debug, Clone)]
pub struct HistoryStep {
    /// Entry now under the cursor
    pub state: SceneState,
    /// Outfit or tint changed relative to the entry the cursor left
    pub appearance_changed: bool,
}

/// Scene history with a cursor. The cursor is -1 only before the first commit.
#[derive(Debug, Default)]
pub struct SceneHistory {
    entries: Vec<SceneState>,
    cursor: Option<usize>,
}

impl SceneHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History holding a single committed entry
    pub fn with_initial(state: SceneState) -> Self {
        let mut history = Self::new();
        history.commit(state);
        history
    }

    /// Record `state`. Returns false when it equals the current entry.
    /// Anything after the cursor is discarded.
    pub fn commit(&mut self, state: SceneState) -> bool {
        if self.current() == Some(&state) {
            return false;
        }
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(state);
        self.cursor = Some(self.entries.len() - 1);
        log::debug!("History commit: {} entries", self.entries.len());
        true
    }

    pub fn undo(&mut self) -> Option<HistoryStep> {
        if !self.can_undo() {
            return None;
        }
        let from = self.cursor?;
        self.move_to(from, from - 1)
    }

    pub fn redo(&mut self) -> Option<HistoryStep> {
        if !self.can_redo() {
            return None;
        }
        let from = self.cursor?;
        self.move_to(from, from + 1)
    }

    fn move_to(&mut self, from: usize, to: usize) -> Option<HistoryStep> {
        let left = self.entries.get(from)?;
        let state = self.entries.get(to)?.clone();
        let appearance_changed = left.appearance_differs(&state);
        self.cursor = Some(to);
        log::debug!("History cursor {} -> {}", from, to);
        Some(HistoryStep {
            state,
            appearance_changed,
        })
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&SceneState> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Cursor index, -1 before the first commit
    pub fn cursor(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    fn base() -> SceneState {
        SceneState::initial(&catalog(), 0.5, 0.3)
    }

    fn with_backdrop(state: &SceneState, index: usize) -> SceneState {
        SceneState {
            backdrop: catalog().backdrops()[index].clone(),
            ..state.clone()
        }
    }

    fn with_outfit(state: &SceneState, id: &str, tint: &str) -> SceneState {
        let catalog = catalog();
        SceneState {
            outfit: catalog.outfit(id).cloned(),
            tint: catalog.tint(tint).unwrap().clone(),
            ..state.clone()
        }
    }

    /// A run of distinct states, each differing from the previous in one field
    fn distinct_states(n: usize) -> Vec<SceneState> {
        let mut states = Vec::new();
        let mut s = base();
        for i in 0..n {
            s = match i % 3 {
                0 => with_backdrop(&s, (i / 3 + 1) % catalog().backdrops().len()),
                1 => SceneState {
                    reflection: (i as f32 * 0.07) % 1.0,
                    ..s.clone()
                },
                _ => SceneState {
                    grid: (i as f32 * 0.11) % 1.0,
                    ..s.clone()
                },
            };
            states.push(s.clone());
        }
        states
    }

    #[test]
    fn starts_empty_with_cursor_minus_one() {
        let h = SceneHistory::new();
        assert_eq!(h.cursor(), -1);
        assert!(h.current().is_none());
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn initial_entry_cannot_be_undone() {
        let mut h = SceneHistory::with_initial(base());
        assert_eq!(h.cursor(), 0);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.current(), Some(&base()));
    }

    #[test]
    fn full_undo_round_trips_to_the_start() {
        for n in 1..8 {
            let mut h = SceneHistory::with_initial(base());
            let before = h.current().cloned().unwrap();
            for s in distinct_states(n) {
                h.commit(s);
            }
            for _ in 0..n {
                h.undo();
            }
            assert_eq!(h.current(), Some(&before), "n = {}", n);
        }
    }

    #[test]
    fn redo_restores_exactly_what_was_undone() {
        let mut h = SceneHistory::with_initial(base());
        for s in distinct_states(4) {
            h.commit(s);
        }
        let head = h.current().cloned().unwrap();
        h.undo();
        let step = h.redo().unwrap();
        assert_eq!(step.state, head);
        assert_eq!(h.current(), Some(&head));
    }

    #[test]
    fn duplicate_commit_does_not_grow() {
        let mut h = SceneHistory::with_initial(base());
        assert!(!h.commit(base()));
        assert_eq!(h.len(), 1);

        let next = with_backdrop(&base(), 1);
        assert!(h.commit(next.clone()));
        assert!(!h.commit(next));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn slider_levels_are_part_of_equality() {
        let a = base();
        let b = SceneState {
            reflection: 0.9,
            ..a.clone()
        };
        let c = SceneState {
            grid: 0.0,
            ..a.clone()
        };
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn divergent_commit_discards_redo() {
        let mut h = SceneHistory::with_initial(base());
        for s in distinct_states(3) {
            h.commit(s);
        }
        h.undo();
        assert!(h.can_redo());
        h.commit(with_outfit(&base(), "exec-suit", "Crimson"));
        assert!(!h.can_redo());
        assert!(h.redo().is_none());
    }

    #[test]
    fn three_commits_undo_twice_then_branch() {
        let states = distinct_states(3);
        let mut h = SceneHistory::new();
        for s in states.clone() {
            h.commit(s);
        }
        assert_eq!(h.cursor(), 2);
        h.undo();
        h.undo();
        assert_eq!(h.cursor(), 0);

        let branch = with_outfit(&states[0], "slim-suit", "Navy");
        assert!(h.commit(branch.clone()));
        assert_eq!(h.len(), 2);
        assert_eq!(h.current(), Some(&branch));
        assert!(h.redo().is_none());
        assert_eq!(h.cursor(), 1);
    }

    #[test]
    fn appearance_change_is_reported() {
        let mut h = SceneHistory::with_initial(base());
        h.commit(with_outfit(&base(), "exec-suit", "Crimson"));
        h.commit(SceneState {
            reflection: 0.1,
            ..h.current().cloned().unwrap()
        });

        // Only reflection differs
        let step = h.undo().unwrap();
        assert!(!step.appearance_changed);
        // Outfit and tint differ
        let step = h.undo().unwrap();
        assert!(step.appearance_changed);
        let step = h.redo().unwrap();
        assert!(step.appearance_changed);
    }
}
