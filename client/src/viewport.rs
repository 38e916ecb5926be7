use boromap_shared::{BoundingBox, LngLat};

use crate::config::{CITY_BOUNDS, MAX_ZOOM, MIN_ZOOM, START_CENTER, START_ZOOM};

pub const TILE_SIZE: f64 = 256.0;
const WHEEL_ZOOM_RATE: f64 = 0.002;

/// Project a geographic coordinate onto the unit-square Web Mercator
/// world. x grows east, y grows south.
pub fn project(p: LngLat) -> (f64, f64) {
    let x = (p.lng + 180.0) / 360.0;
    let lat = p.lat.to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0;
    (x, y)
}

pub fn unproject(x: f64, y: f64) -> LngLat {
    let lng = x * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y);
    LngLat::new(lng, n.sinh().atan().to_degrees())
}

/// Camera over the mercator world. The center is kept in unit-world
/// coordinates so pan math stays linear; zoom is log2 of the world scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    center: (f64, f64),
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: project(START_CENTER),
            zoom: START_ZOOM,
        }
    }
}

impl Viewport {
    /// Width of the full mercator world in screen pixels at this zoom.
    pub fn world_px(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    pub fn center(&self) -> LngLat {
        unproject(self.center.0, self.center.1)
    }

    pub fn unit_to_screen(&self, ux: f64, uy: f64, w: f64, h: f64) -> (f64, f64) {
        let scale = self.world_px();
        (
            (ux - self.center.0) * scale + w / 2.0,
            (uy - self.center.1) * scale + h / 2.0,
        )
    }

    pub fn to_screen(&self, p: LngLat, w: f64, h: f64) -> (f64, f64) {
        let (ux, uy) = project(p);
        self.unit_to_screen(ux, uy, w, h)
    }

    pub fn to_lnglat(&self, sx: f64, sy: f64, w: f64, h: f64) -> LngLat {
        let scale = self.world_px();
        unproject(
            self.center.0 + (sx - w / 2.0) / scale,
            self.center.1 + (sy - h / 2.0) / scale,
        )
    }

    /// Drag by a screen-pixel delta; the world follows the pointer.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let scale = self.world_px();
        self.center.0 -= dx / scale;
        self.center.1 -= dy / scale;
        self.clamp_center();
    }

    /// Wheel zoom anchored at a screen point: the location under the
    /// cursor stays put.
    pub fn zoom_at(&mut self, delta: f64, sx: f64, sy: f64, w: f64, h: f64) {
        let scale = self.world_px();
        let anchor = (
            self.center.0 + (sx - w / 2.0) / scale,
            self.center.1 + (sy - h / 2.0) / scale,
        );
        self.zoom = (self.zoom - delta * WHEEL_ZOOM_RATE).clamp(MIN_ZOOM, MAX_ZOOM);
        let scale = self.world_px();
        self.center.0 = anchor.0 - (sx - w / 2.0) / scale;
        self.center.1 = anchor.1 - (sy - h / 2.0) / scale;
        self.clamp_center();
    }

    /// Unit-world rectangle currently on screen: (min_x, min_y, max_x, max_y),
    /// y growing south.
    pub fn visible_unit_rect(&self, w: f64, h: f64) -> (f64, f64, f64, f64) {
        let scale = self.world_px();
        let hw = w / (2.0 * scale);
        let hh = h / (2.0 * scale);
        (
            self.center.0 - hw,
            self.center.1 - hh,
            self.center.0 + hw,
            self.center.1 + hh,
        )
    }

    /// Geographic box currently on screen, for culling and hit candidates.
    pub fn visible_bounds(&self, w: f64, h: f64) -> BoundingBox {
        let tl = self.to_lnglat(0.0, 0.0, w, h);
        let br = self.to_lnglat(w, h, w, h);
        BoundingBox::new(tl.lng, br.lat, br.lng, tl.lat)
    }

    // The camera center may not leave the configured city box.
    fn clamp_center(&mut self) {
        let (min_x, min_y) = project(LngLat::new(CITY_BOUNDS.min_lng, CITY_BOUNDS.max_lat));
        let (max_x, max_y) = project(LngLat::new(CITY_BOUNDS.max_lng, CITY_BOUNDS.min_lat));
        self.center.0 = self.center.0.clamp(min_x, max_x);
        self.center.1 = self.center.1.clamp(min_y, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} vs {b}");
    }

    #[test]
    fn project_unproject_round_trip() {
        let p = unproject(project(START_CENTER).0, project(START_CENTER).1);
        assert_close(p.lng, START_CENTER.lng, 1e-9);
        assert_close(p.lat, START_CENTER.lat, 1e-9);
    }

    #[test]
    fn equator_prime_meridian_is_world_midpoint() {
        let (x, y) = project(LngLat::new(0.0, 0.0));
        assert_close(x, 0.5, 1e-12);
        assert_close(y, 0.5, 1e-12);
    }

    #[test]
    fn camera_center_lands_mid_screen() {
        let vp = Viewport::default();
        let (sx, sy) = vp.to_screen(vp.center(), 800.0, 600.0);
        assert_close(sx, 400.0, 1e-6);
        assert_close(sy, 300.0, 1e-6);
    }

    #[test]
    fn pan_moves_world_with_the_pointer() {
        let mut vp = Viewport::default();
        let before = vp.center();
        vp.pan(25.0, -10.0);
        let (sx, sy) = vp.to_screen(before, 800.0, 600.0);
        assert_close(sx, 425.0, 1e-6);
        assert_close(sy, 290.0, 1e-6);
    }

    #[test]
    fn zoom_at_keeps_cursor_location_fixed() {
        let mut vp = Viewport::default();
        let under_cursor = vp.to_lnglat(200.0, 150.0, 800.0, 600.0);
        vp.zoom_at(-500.0, 200.0, 150.0, 800.0, 600.0);
        assert!(vp.zoom > START_ZOOM);
        let (sx, sy) = vp.to_screen(under_cursor, 800.0, 600.0);
        assert_close(sx, 200.0, 1e-6);
        assert_close(sy, 150.0, 1e-6);
    }

    #[test]
    fn zoom_clamps_to_configured_range() {
        let mut vp = Viewport::default();
        vp.zoom_at(-1_000_000.0, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_at(1_000_000.0, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn pan_cannot_leave_the_city_box() {
        let mut vp = Viewport::default();
        for _ in 0..200 {
            vp.pan(5000.0, 0.0);
        }
        let c = vp.center();
        assert!(c.lng >= CITY_BOUNDS.min_lng - 1e-9);
        assert!(CITY_BOUNDS.contains(LngLat::new(c.lng, c.lat)));
    }

    #[test]
    fn visible_bounds_contain_the_center() {
        let vp = Viewport::default();
        let bounds = vp.visible_bounds(800.0, 600.0);
        assert!(bounds.contains(vp.center()));
    }
}
