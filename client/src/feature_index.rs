use std::collections::HashMap;

use boromap_shared::{NeighborhoodId, NeighborhoodSummary};

/// Trimmed display name -> backend row id, built once from the
/// neighborhoods listing. Source data occasionally carries padded names;
/// lookups trim both sides. On duplicate trimmed names the later row wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureIndex {
    by_name: HashMap<String, NeighborhoodId>,
}

impl FeatureIndex {
    pub fn build(rows: &[NeighborhoodSummary]) -> Self {
        let mut by_name = HashMap::with_capacity(rows.len());
        for row in rows {
            by_name.insert(row.name.trim().to_string(), row.id);
        }
        Self { by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<NeighborhoodId> {
        self.by_name.get(name.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: NeighborhoodId, name: &str) -> NeighborhoodSummary {
        NeighborhoodSummary {
            id,
            name: name.to_string(),
            borough: String::new(),
        }
    }

    #[test]
    fn lookup_trims_both_stored_and_queried_names() {
        let index = FeatureIndex::build(&[row(7, "  Astoria ")]);

        assert_eq!(index.lookup("Astoria"), Some(7));
        assert_eq!(index.lookup("  Astoria  "), Some(7));
    }

    #[test]
    fn duplicate_names_resolve_to_the_later_row() {
        let index = FeatureIndex::build(&[row(1, "Astoria"), row(2, " Astoria ")]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("Astoria"), Some(2));
    }

    #[test]
    fn unknown_name_is_a_miss() {
        let index = FeatureIndex::build(&[row(1, "Astoria")]);

        assert_eq!(index.lookup("astoria"), None);
        assert_eq!(index.lookup("Flushing"), None);
    }

    #[test]
    fn empty_listing_builds_an_empty_index() {
        let index = FeatureIndex::build(&[]);

        assert!(index.is_empty());
        assert_eq!(index.lookup("anything"), None);
    }
}
