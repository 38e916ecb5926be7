use boromap_shared::{BoundaryCollection, BoundaryGeometry, BoundingBox, CrimePoint, LngLat};

use crate::cluster::ClusterIndex;
use crate::feature_state::FeatureId;
use crate::spatial::SpatialGrid;

/// One boundary polygon with its display metadata. `id` is the feature's
/// position in file order and doubles as its flag-store key.
pub struct SceneFeature {
    pub id: FeatureId,
    pub name: String,
    pub borough: String,
    pub code: String,
    pub geometry: BoundaryGeometry,
    pub bbox: BoundingBox,
}

/// Everything the paint pass draws: the boundary polygons with their hit
/// grid, and the incident points once their fetch lands.
pub struct MapScene {
    features: Vec<SceneFeature>,
    grid: SpatialGrid,
    points: Vec<CrimePoint>,
    clusters: ClusterIndex,
}

impl MapScene {
    /// Build the scene from a parsed boundary file. Features whose
    /// geometry has no extent are dropped; ids stay dense.
    pub fn from_boundaries(collection: BoundaryCollection) -> Self {
        let mut features = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let Some(bbox) = feature.geometry.bbox() else {
                continue;
            };
            features.push(SceneFeature {
                id: features.len() as FeatureId,
                name: feature.properties.name,
                borough: feature.properties.borough,
                code: feature.properties.code,
                geometry: feature.geometry,
                bbox,
            });
        }
        let bboxes: Vec<BoundingBox> = features.iter().map(|f| f.bbox).collect();
        Self {
            grid: SpatialGrid::build(&bboxes),
            features,
            points: Vec::new(),
            clusters: ClusterIndex::default(),
        }
    }

    pub fn features(&self) -> &[SceneFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn display_name(&self, id: FeatureId) -> Option<&str> {
        self.features.get(id as usize).map(|f| f.name.as_str())
    }

    /// Feature under a geographic point. Grid candidates first, then ring
    /// containment; ties go to the earliest feature in file order.
    pub fn feature_at(&self, p: LngLat) -> Option<FeatureId> {
        self.grid
            .candidates_at(p)
            .find(|&idx| self.features[idx].geometry.contains(p))
            .map(|idx| self.features[idx].id)
    }

    /// `(id, name)` of the features whose extent intersects the view, in
    /// file order. This is the candidate set for search.
    pub fn rendered_features<'a>(
        &'a self,
        view: &'a BoundingBox,
    ) -> impl Iterator<Item = (FeatureId, &'a str)> {
        self.features
            .iter()
            .filter(move |f| f.bbox.intersects(view))
            .map(|f| (f.id, f.name.as_str()))
    }

    pub fn set_points(&mut self, points: Vec<CrimePoint>) {
        self.clusters = ClusterIndex::build(&points);
        self.points = points;
    }

    pub fn points(&self) -> &[CrimePoint] {
        &self.points
    }

    pub fn clusters(&self) -> &ClusterIndex {
        &self.clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_square_scene() -> MapScene {
        let raw = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "NTAName": "West Square", "BoroName": "Queens", "NTA2020": "QN01" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-74.0, 40.6], [-73.9, 40.6], [-73.9, 40.7], [-74.0, 40.7], [-74.0, 40.6]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "NTAName": "East Square", "BoroName": "Queens", "NTA2020": "QN02" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-73.9, 40.6], [-73.8, 40.6], [-73.8, 40.7], [-73.9, 40.7], [-73.9, 40.6]]]
                    }
                }
            ]
        });
        MapScene::from_boundaries(BoundaryCollection::parse(&raw.to_string()).unwrap())
    }

    #[test]
    fn ids_follow_file_order() {
        let scene = two_square_scene();

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.display_name(0), Some("West Square"));
        assert_eq!(scene.display_name(1), Some("East Square"));
        assert_eq!(scene.display_name(2), None);
    }

    #[test]
    fn hit_test_confirms_ring_containment() {
        let scene = two_square_scene();

        assert_eq!(scene.feature_at(LngLat::new(-73.95, 40.65)), Some(0));
        assert_eq!(scene.feature_at(LngLat::new(-73.85, 40.65)), Some(1));
        assert_eq!(scene.feature_at(LngLat::new(-73.85, 40.75)), None);
    }

    #[test]
    fn rendered_features_follow_the_view_box() {
        let scene = two_square_scene();

        let west_only = BoundingBox::new(-74.05, 40.62, -73.93, 40.68);
        let names: Vec<&str> = scene.rendered_features(&west_only).map(|(_, n)| n).collect();
        assert_eq!(names, vec!["West Square"]);

        let both = BoundingBox::new(-74.05, 40.55, -73.75, 40.75);
        assert_eq!(scene.rendered_features(&both).count(), 2);
    }

    #[test]
    fn incident_points_rebuild_the_cluster_index() {
        let mut scene = two_square_scene();
        assert!(scene.clusters().is_empty());

        scene.set_points(vec![CrimePoint {
            id: 1,
            at: LngLat::new(-73.95, 40.65),
            category: "THEFT".to_string(),
        }]);

        assert_eq!(scene.points().len(), 1);
        assert!(!scene.clusters().is_empty());
    }
}
