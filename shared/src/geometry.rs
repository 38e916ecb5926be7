use serde::Deserialize;

/// Geographic coordinate, degrees. Longitude east-positive, latitude north-positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Axis-aligned rectangle in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub const fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    pub fn from_ring(ring: &[[f64; 2]]) -> Option<Self> {
        let first = ring.first()?;
        let mut bbox = Self::new(first[0], first[1], first[0], first[1]);
        for p in &ring[1..] {
            bbox.min_lng = bbox.min_lng.min(p[0]);
            bbox.min_lat = bbox.min_lat.min(p[1]);
            bbox.max_lng = bbox.max_lng.max(p[0]);
            bbox.max_lat = bbox.max_lat.max(p[1]);
        }
        Some(bbox)
    }

    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.min_lng && p.lng <= self.max_lng && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

/// Even-odd crossing test against one ring.
pub fn point_in_ring(p: LngLat, ring: &[[f64; 2]]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > p.lat) != (yj > p.lat) && p.lng < (xj - xi) * (p.lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Even-odd test across a polygon's rings; interior rings punch holes.
pub fn point_in_polygon(p: LngLat, rings: &[Vec<[f64; 2]>]) -> bool {
    let mut inside = false;
    for ring in rings {
        if point_in_ring(p, ring) {
            inside = !inside;
        }
    }
    inside
}

/// Neighborhood boundary file: the Polygon/MultiPolygon subset of GeoJSON the
/// map surface can draw, with the NTA property names the city data ships.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCollection {
    pub features: Vec<BoundaryFeature>,
    /// Features present in the file but skipped (unsupported geometry).
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoundaryFeature {
    #[serde(default)]
    pub properties: BoundaryProperties,
    pub geometry: BoundaryGeometry,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BoundaryProperties {
    #[serde(default, rename = "NTAName")]
    pub name: String,
    #[serde(default, rename = "BoroName")]
    pub borough: String,
    #[serde(default, rename = "NTA2020")]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum BoundaryGeometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl BoundaryCollection {
    /// Parse a FeatureCollection, dropping features this renderer cannot draw
    /// instead of failing the whole load.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let doc: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("boundary parse error: {e}"))?;
        let raw_features = doc
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or("boundary file has no features array")?;

        let mut features = Vec::with_capacity(raw_features.len());
        let mut skipped = 0usize;
        for feature in raw_features {
            match serde_json::from_value::<BoundaryFeature>(feature.clone()) {
                Ok(f) => features.push(f),
                Err(_) => skipped += 1,
            }
        }
        Ok(Self { features, skipped })
    }
}

impl BoundaryGeometry {
    /// Iterate polygons; each item is that polygon's rings (exterior first).
    pub fn polygons(&self) -> impl Iterator<Item = &Vec<Vec<[f64; 2]>>> {
        match self {
            BoundaryGeometry::Polygon { coordinates } => std::slice::from_ref(coordinates).iter(),
            BoundaryGeometry::MultiPolygon { coordinates } => coordinates.iter(),
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        let mut acc: Option<BoundingBox> = None;
        for rings in self.polygons() {
            for ring in rings {
                if let Some(b) = BoundingBox::from_ring(ring) {
                    acc = Some(match acc {
                        Some(prev) => prev.union(&b),
                        None => b,
                    });
                }
            }
        }
        acc
    }

    pub fn contains(&self, p: LngLat) -> bool {
        self.polygons().any(|rings| point_in_polygon(p, rings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
    }

    #[test]
    fn ring_contains_center_excludes_outside() {
        let ring = unit_square();
        assert!(point_in_ring(LngLat::new(0.5, 0.5), &ring));
        assert!(!point_in_ring(LngLat::new(1.5, 0.5), &ring));
        assert!(!point_in_ring(LngLat::new(0.5, -0.1), &ring));
    }

    #[test]
    fn hole_ring_punches_out_interior() {
        let outer = unit_square();
        let hole = vec![[0.4, 0.4], [0.6, 0.4], [0.6, 0.6], [0.4, 0.6], [0.4, 0.4]];
        let rings = vec![outer, hole];
        assert!(point_in_polygon(LngLat::new(0.2, 0.2), &rings));
        assert!(!point_in_polygon(LngLat::new(0.5, 0.5), &rings));
    }

    #[test]
    fn bbox_from_ring_spans_extremes() {
        let bbox = BoundingBox::from_ring(&unit_square()).unwrap();
        assert_eq!(bbox.min_lng, 0.0);
        assert_eq!(bbox.max_lat, 1.0);
        assert!(bbox.contains(LngLat::new(0.5, 0.5)));
        assert!(!bbox.contains(LngLat::new(2.0, 0.5)));
    }

    #[test]
    fn parse_keeps_polygons_and_skips_points() {
        let raw = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"NTAName": "Astoria", "BoroName": "Queens", "NTA2020": "QN0103"},
                    "geometry": {"type": "Polygon", "coordinates": [unit_square()]}
                },
                {
                    "type": "Feature",
                    "properties": {"NTAName": "Subway Stop"},
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
                }
            ]
        })
        .to_string();

        let collection = BoundaryCollection::parse(&raw).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.skipped, 1);
        let feature = &collection.features[0];
        assert_eq!(feature.properties.name, "Astoria");
        assert_eq!(feature.properties.borough, "Queens");
        assert_eq!(feature.properties.code, "QN0103");
        assert!(feature.geometry.contains(LngLat::new(0.5, 0.5)));
    }

    #[test]
    fn multipolygon_bbox_unions_parts() {
        let geom = BoundaryGeometry::MultiPolygon {
            coordinates: vec![
                vec![unit_square()],
                vec![vec![[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 3.0], [2.0, 2.0]]],
            ],
        };
        let bbox = geom.bbox().unwrap();
        assert_eq!(bbox.min_lng, 0.0);
        assert_eq!(bbox.max_lng, 3.0);
        assert!(geom.contains(LngLat::new(2.5, 2.5)));
        assert!(!geom.contains(LngLat::new(1.5, 1.5)));
    }

    #[test]
    fn parse_without_features_array_is_an_error() {
        assert!(BoundaryCollection::parse("{\"type\":\"FeatureCollection\"}").is_err());
        assert!(BoundaryCollection::parse("not json").is_err());
    }
}
