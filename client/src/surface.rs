//! Pointer-interaction state for the map surface.
//!
//! One feature at most carries the hover flag and one the selected flag.
//! Every transition clears the previous holder before setting the next,
//! so the flag store never shows two features highlighted the same way,
//! not even transiently.

use crate::feature_state::{FeatureId, FeatureStateStore, FlagKind};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InteractionState {
    hovered: Option<FeatureId>,
    selected: Option<FeatureId>,
}

impl InteractionState {
    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<FeatureId> {
        self.selected
    }

    /// Pointer entered `id`. Re-entering the feature already hovered is a
    /// complete no-op; returns whether anything changed.
    pub fn hover(&mut self, store: &mut impl FeatureStateStore, id: FeatureId) -> bool {
        if self.hovered == Some(id) {
            return false;
        }
        if let Some(prev) = self.hovered.take() {
            store.clear_flag(prev, FlagKind::Hover);
        }
        store.set_flag(id, FlagKind::Hover, true);
        self.hovered = Some(id);
        true
    }

    /// Pointer left the boundary layer (or the canvas).
    pub fn leave(&mut self, store: &mut impl FeatureStateStore) -> bool {
        match self.hovered.take() {
            Some(prev) => {
                store.clear_flag(prev, FlagKind::Hover);
                true
            }
            None => false,
        }
    }

    /// Move the selected flag to `id`. Re-selecting the current feature
    /// still runs the clear-then-set cycle; callers rely on that to
    /// re-announce the selection.
    pub fn select(&mut self, store: &mut impl FeatureStateStore, id: FeatureId) {
        if let Some(prev) = self.selected.take() {
            store.clear_flag(prev, FlagKind::Selected);
        }
        store.set_flag(id, FlagKind::Selected, true);
        self.selected = Some(id);
    }

    pub fn clear_selection(&mut self, store: &mut impl FeatureStateStore) {
        if let Some(prev) = self.selected.take() {
            store.clear_flag(prev, FlagKind::Selected);
        }
    }

    /// Search-driven selection over the features currently on screen.
    /// `None` when nothing matches; state and store stay untouched then.
    pub fn select_by_name<'a>(
        &mut self,
        store: &mut impl FeatureStateStore,
        rendered: impl IntoIterator<Item = (FeatureId, &'a str)>,
        name: &str,
    ) -> Option<FeatureId> {
        let id = find_rendered_by_name(rendered, name)?;
        self.select(store, id);
        Some(id)
    }
}

/// First on-screen feature whose trimmed display name equals `name`
/// exactly (case-sensitive). Features scrolled out of the viewport are
/// not candidates.
pub fn find_rendered_by_name<'a>(
    rendered: impl IntoIterator<Item = (FeatureId, &'a str)>,
    name: &str,
) -> Option<FeatureId> {
    rendered
        .into_iter()
        .find(|(_, display)| display.trim() == name)
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_state::{FeatureFlags, RecordingStore, StoreCall};

    #[test]
    fn hover_clears_previous_before_setting_next() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        assert!(state.hover(&mut store, 1));
        assert!(state.hover(&mut store, 2));

        assert_eq!(
            store.calls,
            vec![
                StoreCall::Set(1, FlagKind::Hover, true),
                StoreCall::Clear(1, FlagKind::Hover),
                StoreCall::Set(2, FlagKind::Hover, true),
            ]
        );
        assert_eq!(store.live.count(FlagKind::Hover), 1);
        assert!(store.live.is_set(2, FlagKind::Hover));
    }

    #[test]
    fn hovering_the_same_feature_again_touches_nothing() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        state.hover(&mut store, 7);
        let calls_before = store.calls.len();
        assert!(!state.hover(&mut store, 7));

        assert_eq!(store.calls.len(), calls_before);
        assert_eq!(state.hovered(), Some(7));
    }

    #[test]
    fn leave_clears_hover_and_is_idempotent() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        state.hover(&mut store, 4);
        assert!(state.leave(&mut store));
        assert!(!state.leave(&mut store));

        assert_eq!(store.live, FeatureFlags::default());
        assert_eq!(store.calls.len(), 2);
    }

    #[test]
    fn at_most_one_hover_flag_across_a_pointer_sweep() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        for id in [3, 3, 8, 1, 1, 8] {
            state.hover(&mut store, id);
            assert!(store.live.count(FlagKind::Hover) <= 1);
        }
        state.leave(&mut store);
        assert_eq!(store.live.count(FlagKind::Hover), 0);
    }

    #[test]
    fn select_moves_the_flag_between_features() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        state.select(&mut store, 10);
        state.select(&mut store, 11);

        assert_eq!(store.live.count(FlagKind::Selected), 1);
        assert!(store.live.is_set(11, FlagKind::Selected));
        assert_eq!(state.selected(), Some(11));
    }

    #[test]
    fn reselecting_the_same_feature_reapplies_the_flag() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        state.select(&mut store, 6);
        state.select(&mut store, 6);

        assert_eq!(
            store.calls,
            vec![
                StoreCall::Set(6, FlagKind::Selected, true),
                StoreCall::Clear(6, FlagKind::Selected),
                StoreCall::Set(6, FlagKind::Selected, true),
            ]
        );
        assert!(store.live.is_set(6, FlagKind::Selected));
    }

    #[test]
    fn clear_selection_empties_the_store_and_repeats_safely() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        state.select(&mut store, 2);
        state.clear_selection(&mut store);
        let calls_before = store.calls.len();
        state.clear_selection(&mut store);

        assert_eq!(store.live.count(FlagKind::Selected), 0);
        assert_eq!(store.calls.len(), calls_before);
    }

    #[test]
    fn hover_and_selection_do_not_disturb_each_other() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();

        state.hover(&mut store, 3);
        state.select(&mut store, 3);
        state.leave(&mut store);

        assert!(!store.live.is_set(3, FlagKind::Hover));
        assert!(store.live.is_set(3, FlagKind::Selected));
    }

    #[test]
    fn search_matches_the_first_trimmed_exact_name() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();
        let rendered = [(1, "Astoria "), (2, "Astoria"), (3, "Astoria Heights")];

        let found = state.select_by_name(&mut store, rendered, "Astoria");

        assert_eq!(found, Some(1));
        assert!(store.live.is_set(1, FlagKind::Selected));
    }

    #[test]
    fn search_is_case_sensitive_and_misses_leave_state_alone() {
        let mut state = InteractionState::default();
        let mut store = RecordingStore::default();
        state.select(&mut store, 9);
        let calls_before = store.calls.len();

        let rendered = [(1, "Astoria")];
        assert_eq!(state.select_by_name(&mut store, rendered, "astoria"), None);

        assert_eq!(state.selected(), Some(9));
        assert_eq!(store.calls.len(), calls_before);
    }

    #[test]
    fn search_ignores_features_outside_the_given_set() {
        let rendered: [(FeatureId, &str); 2] = [(4, "Flushing"), (5, "Corona")];

        assert_eq!(find_rendered_by_name(rendered, "Astoria"), None);
        assert_eq!(find_rendered_by_name(rendered, "Corona"), Some(5));
    }
}
