//! Thin gateway over the dashboard's HTTP API. Every call returns a
//! displayable error string; callers decide whether to log or surface it.

use boromap_shared::{
    BoundaryCollection, CrimeCount, CrimeFilter, CrimeRecord, CrimeTypeCount, NeighborhoodDetail,
    NeighborhoodId, NeighborhoodSummary, RankedNeighborhood,
};

use crate::config::BOUNDARY_URL;

/// Fetch the id/name listing used to join boundary names to backend rows.
pub async fn fetch_neighborhoods() -> Result<Vec<NeighborhoodSummary>, String> {
    let resp = gloo_net::http::Request::get("/api/neighborhoods")
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<NeighborhoodSummary>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

pub async fn fetch_neighborhood(id: NeighborhoodId) -> Result<NeighborhoodDetail, String> {
    let resp = gloo_net::http::Request::get(&format!("/api/neighborhoods/{id}"))
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<NeighborhoodDetail>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Total complaint count for one neighborhood, for the crime index bar.
pub async fn fetch_crime_count(id: NeighborhoodId) -> Result<CrimeCount, String> {
    let resp = gloo_net::http::Request::get(&format!("/api/neighborhoods/{id}/crime_count"))
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<CrimeCount>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Distinct complaint categories, for the crime-type filter dropdown.
pub async fn fetch_crime_types() -> Result<Vec<String>, String> {
    let resp = gloo_net::http::Request::get("/api/complaints/types")
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<String>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Per-category complaint counts for one neighborhood.
pub async fn fetch_type_counts(id: NeighborhoodId) -> Result<Vec<CrimeTypeCount>, String> {
    let id_param = id.to_string();
    let resp = gloo_net::http::Request::get("/api/complaints/type_counts")
        .query([("neighborhood_id", id_param.as_str())])
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<CrimeTypeCount>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Neighborhoods ranked by complaint count for one category. Categories
/// contain spaces and ampersands, so the query builder does the encoding.
pub async fn fetch_top_neighborhoods(
    crime_type: &str,
    limit: usize,
) -> Result<Vec<RankedNeighborhood>, String> {
    let limit_param = limit.to_string();
    let resp = gloo_net::http::Request::get("/api/complaints/top_neighborhoods")
        .query([("crime_type", crime_type), ("limit", limit_param.as_str())])
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<RankedNeighborhood>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Incident points for the heat and cluster layers, optionally filtered.
pub async fn fetch_crimes(filter: &CrimeFilter) -> Result<Vec<CrimeRecord>, String> {
    let pairs = filter.query_pairs();
    let resp = gloo_net::http::Request::get("/api/crimes")
        .query(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<CrimeRecord>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Fetch and parse the boundary polygons. Served as a static asset, so
/// the body is read as text and parsed with the tolerant boundary parser.
pub async fn fetch_boundaries() -> Result<BoundaryCollection, String> {
    let resp = gloo_net::http::Request::get(BOUNDARY_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let raw = resp
        .text()
        .await
        .map_err(|e| format!("read error: {e}"))?;
    BoundaryCollection::parse(&raw)
}
