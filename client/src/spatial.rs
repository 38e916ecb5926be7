use boromap_shared::{BoundingBox, LngLat};

const GRID_COLS: usize = 50;
const GRID_ROWS: usize = 50;

/// Flat 2D grid over the boundary set's geographic extent for fast
/// hit-test candidate lookup. Cells hold entry indices whose bounding
/// boxes overlap the cell; ring containment is confirmed by the caller.
/// Rebuilt only when the boundary file loads.
pub struct SpatialGrid {
    cells: Vec<Vec<u32>>,
    bboxes: Vec<BoundingBox>,
    min_lng: f64,
    min_lat: f64,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    pub fn build(bboxes: &[BoundingBox]) -> Self {
        if bboxes.is_empty() {
            return Self {
                cells: Vec::new(),
                bboxes: Vec::new(),
                min_lng: 0.0,
                min_lat: 0.0,
                cell_w: 1.0,
                cell_h: 1.0,
            };
        }

        let mut extent = bboxes[0];
        for bbox in &bboxes[1..] {
            extent = extent.union(bbox);
        }

        // Small degree padding so boundary-edge points still land in a cell.
        let min_lng = extent.min_lng - 0.001;
        let min_lat = extent.min_lat - 0.001;
        let max_lng = extent.max_lng + 0.001;
        let max_lat = extent.max_lat + 0.001;

        let cell_w = (max_lng - min_lng) / GRID_COLS as f64;
        let cell_h = (max_lat - min_lat) / GRID_ROWS as f64;

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, bbox) in bboxes.iter().enumerate() {
            let col_start = ((bbox.min_lng - min_lng) / cell_w).floor().max(0.0) as usize;
            let col_end = ((bbox.max_lng - min_lng) / cell_w).ceil().min(GRID_COLS as f64) as usize;
            let row_start = ((bbox.min_lat - min_lat) / cell_h).floor().max(0.0) as usize;
            let row_end = ((bbox.max_lat - min_lat) / cell_h).ceil().min(GRID_ROWS as f64) as usize;

            for row in row_start..row_end {
                for col in col_start..col_end {
                    cells[row * GRID_COLS + col].push(idx as u32);
                }
            }
        }

        Self {
            cells,
            bboxes: bboxes.to_vec(),
            min_lng,
            min_lat,
            cell_w,
            cell_h,
        }
    }

    /// Entry indices whose bounding box contains `p`, in insertion order.
    pub fn candidates_at(&self, p: LngLat) -> impl Iterator<Item = usize> + '_ {
        let cell = if self.cells.is_empty() {
            None
        } else {
            let col = ((p.lng - self.min_lng) / self.cell_w).floor() as isize;
            let row = ((p.lat - self.min_lat) / self.cell_h).floor() as isize;
            if col < 0 || row < 0 || col >= GRID_COLS as isize || row >= GRID_ROWS as isize {
                None
            } else {
                Some(&self.cells[row as usize * GRID_COLS + col as usize])
            }
        };

        cell.into_iter()
            .flatten()
            .map(|&idx| idx as usize)
            .filter(move |&idx| self.bboxes[idx].contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<BoundingBox> {
        vec![
            BoundingBox::new(-74.05, 40.60, -73.95, 40.70),
            BoundingBox::new(-73.95, 40.70, -73.85, 40.80),
            BoundingBox::new(-74.00, 40.65, -73.90, 40.75),
        ]
    }

    #[test]
    fn point_inside_one_box_yields_that_entry() {
        let grid = SpatialGrid::build(&boxes());
        let hits: Vec<usize> = grid.candidates_at(LngLat::new(-74.04, 40.61)).collect();

        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn overlap_region_yields_candidates_in_insertion_order() {
        let grid = SpatialGrid::build(&boxes());
        let hits: Vec<usize> = grid.candidates_at(LngLat::new(-73.94, 40.71)).collect();

        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn point_outside_the_extent_has_no_candidates() {
        let grid = SpatialGrid::build(&boxes());

        assert_eq!(grid.candidates_at(LngLat::new(-75.5, 41.5)).count(), 0);
        assert_eq!(grid.candidates_at(LngLat::new(0.0, 0.0)).count(), 0);
    }

    #[test]
    fn empty_build_never_matches() {
        let grid = SpatialGrid::build(&[]);

        assert_eq!(grid.candidates_at(LngLat::new(-74.0, 40.7)).count(), 0);
    }
}
