use serde::{Deserialize, Serialize};

/// Stable backend identifier for a neighborhood, distinct from the
/// per-session feature id the map surface assigns at load time.
pub type NeighborhoodId = i64;

/// Row from the neighborhoods listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodSummary {
    pub id: NeighborhoodId,
    pub name: String,
    #[serde(default)]
    pub borough: String,
}

/// Full record from the single-neighborhood endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodDetail {
    pub id: NeighborhoodId,
    pub name: String,
    #[serde(default)]
    pub borough: String,
    #[serde(default)]
    pub code: String,
}

/// One (crime type, incident count) pair for a single neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeTypeCount {
    #[serde(rename = "type")]
    pub crime_type: String,
    pub count: i64,
}

/// Row of the top-neighborhoods ranking for one crime type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNeighborhood {
    pub neighborhood_id: NeighborhoodId,
    pub name: String,
    #[serde(default, rename = "boro")]
    pub borough: String,
    pub count: i64,
}

/// Total incident count for a neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrimeCount {
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_parses_without_borough() {
        let row: NeighborhoodSummary =
            serde_json::from_value(serde_json::json!({"id": 17, "name": "Astoria"})).unwrap();
        assert_eq!(row.id, 17);
        assert_eq!(row.name, "Astoria");
        assert_eq!(row.borough, "");
    }

    #[test]
    fn type_count_uses_wire_name_type() {
        let tc: CrimeTypeCount =
            serde_json::from_value(serde_json::json!({"type": "ROBBERY", "count": 41})).unwrap();
        assert_eq!(tc.crime_type, "ROBBERY");
        assert_eq!(tc.count, 41);
    }

    #[test]
    fn ranked_row_reads_boro_field() {
        let row: RankedNeighborhood = serde_json::from_value(serde_json::json!({
            "neighborhood_id": 3,
            "name": "Bushwick",
            "boro": "Brooklyn",
            "count": 120
        }))
        .unwrap();
        assert_eq!(row.neighborhood_id, 3);
        assert_eq!(row.borough, "Brooklyn");
    }
}
