//! The page-level selection: which neighborhood popup or crime-type
//! ranking panel is open. Exactly one thing can be selected at a time;
//! all mutations funnel through [`SelectionCore`] behind one signal.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use boromap_shared::{NeighborhoodId, RankedNeighborhood};

use crate::api;
use crate::config::RANKING_LIMIT;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    Neighborhood(NeighborhoodId),
    CrimeTypeRanking {
        crime_type: String,
        rows: Vec<RankedNeighborhood>,
    },
}

impl Selection {
    pub fn neighborhood(&self) -> Option<NeighborhoodId> {
        match self {
            Selection::Neighborhood(id) => Some(*id),
            _ => None,
        }
    }
}

/// Mutual-exclusion and staleness rules, kept apart from signal wiring.
///
/// Ranking fetches are tagged with a nonce taken at request time. Any
/// later selection change bumps the nonce, so a slow response that was
/// superseded while in flight can never overwrite the current selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCore {
    current: Selection,
    ranking_nonce: u64,
}

impl SelectionCore {
    pub fn current(&self) -> &Selection {
        &self.current
    }

    /// A neighborhood was clicked or found by search. Replaces whatever
    /// was selected and invalidates any ranking fetch still in flight.
    pub fn choose_neighborhood(&mut self, id: NeighborhoodId) {
        self.ranking_nonce += 1;
        self.current = Selection::Neighborhood(id);
    }

    /// A crime type was picked. Returns the nonce to tag the ranking
    /// fetch with, or `None` when the type is empty and the selection
    /// simply collapses. A neighborhood popup closes immediately; an
    /// already-open ranking panel keeps its rows until the new fetch
    /// lands.
    pub fn begin_ranking(&mut self, crime_type: &str) -> Option<u64> {
        self.ranking_nonce += 1;
        if matches!(self.current, Selection::Neighborhood(_)) {
            self.current = Selection::None;
        }
        if crime_type.trim().is_empty() {
            self.current = Selection::None;
            return None;
        }
        Some(self.ranking_nonce)
    }

    /// Apply a resolved ranking fetch; `false` means it was stale and
    /// nothing changed.
    pub fn apply_ranking(
        &mut self,
        nonce: u64,
        crime_type: String,
        rows: Vec<RankedNeighborhood>,
    ) -> bool {
        if nonce != self.ranking_nonce {
            return false;
        }
        self.current = Selection::CrimeTypeRanking { crime_type, rows };
        true
    }

    /// Whether a fetch tagged with `nonce` still speaks for the current
    /// selection.
    pub fn is_current(&self, nonce: u64) -> bool {
        nonce == self.ranking_nonce
    }

    pub fn clear(&mut self) {
        self.ranking_nonce += 1;
        self.current = Selection::None;
    }
}

/// Search submissions carry a sequence number so resubmitting identical
/// text still re-triggers the surface-side lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub name: String,
}

pub fn choose_neighborhood(
    core: RwSignal<SelectionCore>,
    search_query: RwSignal<String>,
    id: NeighborhoodId,
) {
    core.update(|c| c.choose_neighborhood(id));
    if !search_query.get_untracked().is_empty() {
        search_query.set(String::new());
    }
}

/// Crime-type dropdown changed. Kicks off the ranking fetch and applies
/// it only if no other selection landed in the meantime.
pub fn choose_crime_type(core: RwSignal<SelectionCore>, crime_type: String) {
    let mut nonce = None;
    core.update(|c| nonce = c.begin_ranking(&crime_type));
    let Some(nonce) = nonce else {
        return;
    };

    spawn_local(async move {
        let outcome = api::fetch_top_neighborhoods(&crime_type, RANKING_LIMIT).await;
        // Superseded while in flight: drop the response without waking
        // any subscriber.
        if !core.with_untracked(|c| c.is_current(nonce)) {
            return;
        }
        match outcome {
            Ok(rows) => core.update(|c| {
                c.apply_ranking(nonce, crime_type, rows);
            }),
            Err(e) => {
                web_sys::console::warn_1(&format!("ranking fetch failed: {e}").into());
            }
        }
    });
}

/// Close button or Escape: drop whatever panel is open.
pub fn close_panels(core: RwSignal<SelectionCore>, search_query: RwSignal<String>) {
    if core.with_untracked(|c| *c.current() != Selection::None) {
        core.update(|c| c.clear());
    }
    if !search_query.get_untracked().is_empty() {
        search_query.set(String::new());
    }
}

pub fn submit_search(requests: RwSignal<Option<SearchRequest>>, text: &str) {
    let name = text.trim();
    if name.is_empty() {
        return;
    }
    let seq = requests.get_untracked().map_or(0, |r| r.seq) + 1;
    requests.set(Some(SearchRequest {
        seq,
        name: name.to_string(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: NeighborhoodId, name: &str, count: i64) -> RankedNeighborhood {
        RankedNeighborhood {
            neighborhood_id: id,
            name: name.to_string(),
            borough: String::new(),
            count,
        }
    }

    #[test]
    fn slower_superseded_ranking_response_is_discarded() {
        let mut core = SelectionCore::default();
        let theft = core.begin_ranking("THEFT").unwrap();
        let assault = core.begin_ranking("ASSAULT").unwrap();

        assert!(core.apply_ranking(assault, "ASSAULT".into(), vec![row(1, "Astoria", 40)]));
        assert!(!core.apply_ranking(theft, "THEFT".into(), vec![row(2, "Corona", 90)]));

        match core.current() {
            Selection::CrimeTypeRanking { crime_type, rows } => {
                assert_eq!(crime_type, "ASSAULT");
                assert_eq!(rows.len(), 1);
            }
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn neighborhood_click_invalidates_an_in_flight_ranking() {
        let mut core = SelectionCore::default();
        let theft = core.begin_ranking("THEFT").unwrap();
        core.choose_neighborhood(2);

        assert!(!core.apply_ranking(theft, "THEFT".into(), vec![row(5, "Corona", 12)]));
        assert_eq!(core.current().neighborhood(), Some(2));
    }

    #[test]
    fn neighborhood_click_replaces_resolved_ranking_rows() {
        let mut core = SelectionCore::default();
        let n = core.begin_ranking("THEFT").unwrap();
        assert!(core.apply_ranking(n, "THEFT".into(), vec![row(1, "Astoria", 7)]));

        core.choose_neighborhood(2);

        assert_eq!(*core.current(), Selection::Neighborhood(2));
    }

    #[test]
    fn empty_crime_type_collapses_the_selection() {
        let mut core = SelectionCore::default();
        let n = core.begin_ranking("THEFT").unwrap();
        core.apply_ranking(n, "THEFT".into(), vec![row(1, "Astoria", 7)]);

        assert_eq!(core.begin_ranking("  "), None);
        assert_eq!(*core.current(), Selection::None);
    }

    #[test]
    fn new_ranking_request_keeps_old_rows_until_it_resolves() {
        let mut core = SelectionCore::default();
        let theft = core.begin_ranking("THEFT").unwrap();
        core.apply_ranking(theft, "THEFT".into(), vec![row(1, "Astoria", 7)]);

        let assault = core.begin_ranking("ASSAULT").unwrap();
        match core.current() {
            Selection::CrimeTypeRanking { crime_type, .. } => assert_eq!(crime_type, "THEFT"),
            other => panic!("unexpected selection: {other:?}"),
        }

        core.apply_ranking(assault, "ASSAULT".into(), vec![]);
        match core.current() {
            Selection::CrimeTypeRanking { crime_type, rows } => {
                assert_eq!(crime_type, "ASSAULT");
                assert!(rows.is_empty());
            }
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn ranking_request_closes_a_neighborhood_popup_immediately() {
        let mut core = SelectionCore::default();
        core.choose_neighborhood(9);

        let _n = core.begin_ranking("THEFT").unwrap();

        assert_eq!(*core.current(), Selection::None);
    }

    #[test]
    fn clear_invalidates_pending_fetches() {
        let mut core = SelectionCore::default();
        let n = core.begin_ranking("THEFT").unwrap();
        core.clear();

        assert!(!core.is_current(n));
        assert!(!core.apply_ranking(n, "THEFT".into(), vec![]));
        assert_eq!(*core.current(), Selection::None);
    }
}
