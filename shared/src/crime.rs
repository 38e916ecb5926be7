use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geometry::LngLat;

/// Raw incident row as the crimes endpoint returns it. Coordinates are
/// nullable in the source data and must be validated before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub id: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub borough: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Incident with a validated coordinate, ready for the cluster source.
#[derive(Debug, Clone, PartialEq)]
pub struct CrimePoint {
    pub id: i64,
    pub at: LngLat,
    pub category: String,
}

impl CrimePoint {
    /// `None` when the record has no usable coordinate.
    pub fn from_record(record: &CrimeRecord) -> Option<Self> {
        let lat = record.latitude?;
        let lng = record.longitude?;
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self {
            id: record.id,
            at: LngLat::new(lng, lat),
            category: record.category.clone(),
        })
    }
}

/// Keep only records with usable coordinates, in input order.
pub fn valid_points(records: &[CrimeRecord]) -> Vec<CrimePoint> {
    records.iter().filter_map(CrimePoint::from_record).collect()
}

/// Optional server-side filters for the crimes listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrimeFilter {
    pub borough: Option<String>,
    pub crime_type: Option<String>,
    pub date: Option<NaiveDate>,
}

impl CrimeFilter {
    pub fn is_empty(&self) -> bool {
        self.borough.is_none() && self.crime_type.is_none() && self.date.is_none()
    }

    /// Query parameters in wire order. Percent-encoding is left to the
    /// request builder; values here are raw.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(borough) = &self.borough {
            pairs.push(("borough", borough.clone()));
        }
        if let Some(crime_type) = &self.crime_type {
            pairs.push(("type", crime_type.clone()));
        }
        if let Some(date) = &self.date {
            pairs.push(("date", date.to_string()));
        }
        pairs
    }
}
