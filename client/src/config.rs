//! Fixed dashboard configuration: camera limits, layer paints, cluster
//! thresholds and the base-map tile provider.

use boromap_shared::{BoundingBox, LngLat};

/// Geographic box the camera may not leave.
pub const CITY_BOUNDS: BoundingBox = BoundingBox::new(-74.25909, 40.477399, -73.700272, 40.917577);

/// Initial camera position (lower Manhattan).
pub const START_CENTER: LngLat = LngLat::new(-74.0060, 40.7128);
pub const START_ZOOM: f64 = 10.0;
pub const MIN_ZOOM: f64 = 9.0;
pub const MAX_ZOOM: f64 = 15.0;

/// Neighborhood name labels switch on at this zoom.
pub const LABEL_MIN_ZOOM: f64 = 12.0;

/// The boundary file ships as a static asset next to the bundle.
pub const BOUNDARY_URL: &str = "/neighborhoods.geojson";

// Boundary fill paint per feature state. Base is a faint wash so the
// street tiles stay readable underneath.
pub const FILL_BASE: (u8, u8, u8) = (0x00, 0x7c, 0xbf);
pub const FILL_BASE_OPACITY: f64 = 0.1;
pub const FILL_HOVER: (u8, u8, u8) = (0x00, 0xb0, 0xff);
pub const FILL_HOVER_OPACITY: f64 = 0.3;
pub const FILL_SELECTED: (u8, u8, u8) = (0x00, 0x5b, 0x99);
pub const FILL_SELECTED_OPACITY: f64 = 1.0;
pub const OUTLINE_COLOR: (u8, u8, u8) = FILL_BASE;
pub const OUTLINE_WIDTH: f64 = 2.0;

/// Total-count ceiling for the popup's crime index bar; totals above this
/// render as a full bar.
pub const CRIME_INDEX_MAX: i64 = 1200;

/// Rows requested for the per-crime-type neighborhood ranking.
pub const RANKING_LIMIT: usize = 5;

/// Incident points wait this long after the boundaries are painted, so
/// first paint is never blocked on the heavy fetch.
pub const INCIDENT_FETCH_DELAY_MS: u32 = 400;

/// Clustering knobs for the incident layer. These are presentation
/// thresholds; `Default` matches the production dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// At and above this zoom, incidents render as individual points.
    pub cluster_max_zoom: f64,
    /// Cluster gather radius in screen pixels.
    pub cluster_radius: f64,
    /// Ascending by `min_count`; a cluster takes the last bucket it reaches.
    pub buckets: Vec<ClusterBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterBucket {
    pub min_count: usize,
    pub color: (u8, u8, u8),
    pub radius: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            cluster_max_zoom: 14.0,
            cluster_radius: 50.0,
            buckets: vec![
                ClusterBucket { min_count: 1, color: (0x51, 0xbb, 0xd6), radius: 20.0 },
                ClusterBucket { min_count: 50, color: (0xf1, 0xf0, 0x75), radius: 30.0 },
                ClusterBucket { min_count: 200, color: (0xf2, 0x8c, 0xb1), radius: 40.0 },
            ],
        }
    }
}

impl MapOptions {
    /// Step-function lookup: the last bucket whose `min_count` the cluster
    /// reaches. Falls back to the first bucket for undersized clusters.
    pub fn bucket_for(&self, count: usize) -> ClusterBucket {
        self.buckets
            .iter()
            .rev()
            .find(|b| count >= b.min_count)
            .or_else(|| self.buckets.first())
            .copied()
            .unwrap_or(ClusterBucket { min_count: 1, color: (0x51, 0xbb, 0xd6), radius: 20.0 })
    }
}

/// Street-tile URL for one slippy address. A keyed provider is baked in at
/// build time when `BOROMAP_MAPTILER_KEY` is set; otherwise the public OSM
/// servers carry the base map.
pub fn tile_url(z: u8, x: u32, y: u32) -> String {
    match option_env!("BOROMAP_MAPTILER_KEY") {
        Some(key) if !key.is_empty() => {
            format!("https://api.maptiler.com/maps/streets/256/{z}/{x}/{y}.png?key={key}")
        }
        _ => format!("https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_for_steps_at_each_threshold() {
        let opts = MapOptions::default();

        assert_eq!(opts.bucket_for(1).min_count, 1);
        assert_eq!(opts.bucket_for(49).min_count, 1);
        assert_eq!(opts.bucket_for(50).min_count, 50);
        assert_eq!(opts.bucket_for(199).min_count, 50);
        assert_eq!(opts.bucket_for(200).min_count, 200);
        assert_eq!(opts.bucket_for(5000).min_count, 200);
    }

    #[test]
    fn bucket_for_zero_count_uses_first_bucket() {
        let opts = MapOptions::default();
        assert_eq!(opts.bucket_for(0).min_count, 1);
    }

    #[test]
    fn tile_url_addresses_are_distinct() {
        let a = tile_url(10, 301, 385);
        let b = tile_url(10, 302, 385);
        assert_ne!(a, b);
        assert!(a.contains("/10/301/385"));
    }

    #[test]
    fn city_bounds_contain_start_center() {
        assert!(CITY_BOUNDS.contains(START_CENTER));
    }
}
