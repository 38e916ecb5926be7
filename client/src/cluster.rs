use std::collections::HashMap;

use boromap_shared::CrimePoint;

use crate::config::MapOptions;
use crate::viewport::{TILE_SIZE, project};

/// One merged blob of incident points at a given zoom. Coordinates are
/// the unit-world centroid of its members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub x: f64,
    pub y: f64,
    pub count: usize,
}

/// Incident points projected once into unit-world space. Each zoom level
/// re-buckets the same projection; the points themselves never move.
#[derive(Debug, Default)]
pub struct ClusterIndex {
    unit: Vec<(f64, f64)>,
}

impl ClusterIndex {
    pub fn build(points: &[CrimePoint]) -> Self {
        Self {
            unit: points.iter().map(|p| project(p.at)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unit.is_empty()
    }

    /// Grid-bucket clustering: the gather radius in screen pixels maps to
    /// a unit-space cell edge at this zoom, and points sharing a cell
    /// merge into one blob. Output is ordered smallest count first so the
    /// paint pass draws big clusters on top.
    pub fn clusters_for_zoom(&self, zoom: f64, opts: &MapOptions) -> Vec<Cluster> {
        let cell = (opts.cluster_radius / (TILE_SIZE * zoom.exp2())).max(1e-12);

        let mut buckets: HashMap<(i64, i64), (f64, f64, usize)> = HashMap::new();
        for &(x, y) in &self.unit {
            let key = ((x / cell).floor() as i64, (y / cell).floor() as i64);
            let entry = buckets.entry(key).or_insert((0.0, 0.0, 0));
            entry.0 += x;
            entry.1 += y;
            entry.2 += 1;
        }

        let mut out: Vec<Cluster> = buckets
            .into_values()
            .map(|(sx, sy, n)| Cluster {
                x: sx / n as f64,
                y: sy / n as f64,
                count: n,
            })
            .collect();
        out.sort_by(|a, b| {
            a.count
                .cmp(&b.count)
                .then(a.x.total_cmp(&b.x))
                .then(a.y.total_cmp(&b.y))
        });
        out
    }
}

/// Largest member count across clusters, for heat normalization.
pub fn peak_count(clusters: &[Cluster]) -> usize {
    clusters.iter().map(|c| c.count).max().unwrap_or(0)
}

// Cold-to-hot ramp for the density layer.
const HEAT_STOPS: &[(f64, (u8, u8, u8))] = &[
    (0.0, (33, 102, 172)),
    (0.2, (103, 169, 207)),
    (0.4, (209, 229, 240)),
    (0.6, (253, 219, 199)),
    (0.8, (239, 138, 98)),
    (1.0, (178, 24, 43)),
];

fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Color for a normalized density in 0..1, clamped outside that range.
pub fn heat_color(intensity: f64) -> (u8, u8, u8) {
    let t = intensity.clamp(0.0, 1.0);
    for pair in HEAT_STOPS.windows(2) {
        let (lo, lo_color) = pair[0];
        let (hi, hi_color) = pair[1];
        if t <= hi {
            let f = if hi > lo { (t - lo) / (hi - lo) } else { 0.0 };
            return (
                lerp_u8(lo_color.0, hi_color.0, f),
                lerp_u8(lo_color.1, hi_color.1, f),
                lerp_u8(lo_color.2, hi_color.2, f),
            );
        }
    }
    HEAT_STOPS[HEAT_STOPS.len() - 1].1
}

/// CSS `linear-gradient` over the same stops, so the legend swatch always
/// matches the painted ramp.
pub fn heat_css_gradient() -> String {
    let stops: Vec<String> = HEAT_STOPS
        .iter()
        .map(|(at, (r, g, b))| format!("rgb({r},{g},{b}) {:.0}%", at * 100.0))
        .collect();
    format!("linear-gradient(to right, {})", stops.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::unproject;

    fn point(at: boromap_shared::LngLat) -> CrimePoint {
        CrimePoint {
            id: 0,
            at,
            category: "THEFT".to_string(),
        }
    }

    #[test]
    fn points_in_one_cell_merge_and_split_when_zoomed_in() {
        // Place two points inside the same zoom-10 cell, far enough apart
        // to land in different cells at zoom 15.
        let cell = 50.0 / (TILE_SIZE * 10f64.exp2());
        let a = unproject(10.2 * cell, 10.2 * cell);
        let b = unproject(10.7 * cell, 10.7 * cell);
        let index = ClusterIndex::build(&[point(a), point(b)]);
        let opts = MapOptions::default();

        let coarse = index.clusters_for_zoom(10.0, &opts);
        assert_eq!(coarse.len(), 1);
        assert_eq!(coarse[0].count, 2);

        let fine = index.clusters_for_zoom(15.0, &opts);
        assert_eq!(fine.len(), 2);
    }

    #[test]
    fn member_counts_are_preserved_across_merging() {
        let near = unproject(0.3, 0.37);
        let far = unproject(0.31, 0.37);
        let index = ClusterIndex::build(&[point(near), point(near), point(far)]);

        let clusters = index.clusters_for_zoom(10.0, &MapOptions::default());
        let total: usize = clusters.iter().map(|c| c.count).sum();

        assert_eq!(total, 3);
        assert_eq!(peak_count(&clusters), 2);
    }

    #[test]
    fn centroid_is_the_mean_of_members() {
        let cell = 50.0 / (TILE_SIZE * 10f64.exp2());
        let a = unproject(20.25 * cell, 20.25 * cell);
        let b = unproject(20.75 * cell, 20.75 * cell);
        let index = ClusterIndex::build(&[point(a), point(b)]);

        let clusters = index.clusters_for_zoom(10.0, &MapOptions::default());

        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].x - 20.5 * cell).abs() < 1e-12);
        assert!((clusters[0].y - 20.5 * cell).abs() < 1e-12);
    }

    #[test]
    fn empty_index_produces_no_clusters() {
        let index = ClusterIndex::build(&[]);

        assert!(index.is_empty());
        assert!(index.clusters_for_zoom(10.0, &MapOptions::default()).is_empty());
        assert_eq!(peak_count(&[]), 0);
    }

    #[test]
    fn heat_ramp_hits_its_endpoints_and_clamps() {
        assert_eq!(heat_color(0.0), (33, 102, 172));
        assert_eq!(heat_color(1.0), (178, 24, 43));
        assert_eq!(heat_color(-5.0), (33, 102, 172));
        assert_eq!(heat_color(7.0), (178, 24, 43));
    }

    #[test]
    fn heat_ramp_interpolates_between_stops() {
        assert_eq!(heat_color(0.5), (231, 224, 220));
    }

    #[test]
    fn css_gradient_carries_every_stop() {
        let css = heat_css_gradient();

        assert!(css.starts_with("linear-gradient(to right, rgb(33,102,172) 0%"));
        assert!(css.ends_with("rgb(178,24,43) 100%)"));
    }
}
