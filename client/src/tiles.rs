#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use js_sys::Reflect;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use crate::config;
use crate::viewport::Viewport;

const MAX_CONCURRENT_LOADS: usize = 6;
const MAX_CACHED_TILES: usize = 300;
const ONLOAD_HANDLE_KEY: &str = "__boromapTileOnload";
const ONERROR_HANDLE_KEY: &str = "__boromapTileOnerror";

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Unit-world rectangle this tile covers: (min_x, min_y, max_x, max_y).
    pub fn unit_rect(&self) -> (f64, f64, f64, f64) {
        let n = (1u32 << self.z) as f64;
        (
            self.x as f64 / n,
            self.y as f64 / n,
            (self.x as f64 + 1.0) / n,
            (self.y as f64 + 1.0) / n,
        )
    }
}

/// A decoded base-map tile. `loaded_at` orders cache eviction.
#[derive(Clone)]
pub struct LoadedTile {
    pub id: TileId,
    pub image: HtmlImageElement,
    pub loaded_at: f64,
}

/// Integer tile zoom backing a fractional camera zoom; tiles render
/// scaled by the fractional remainder.
pub fn tile_zoom(zoom: f64) -> u8 {
    zoom.floor().clamp(0.0, 19.0) as u8
}

/// Tile addresses covering the viewport, nearest to the view center
/// first so the middle of the screen fills in before the edges.
pub fn cover(vp: &Viewport, w: f64, h: f64) -> Vec<TileId> {
    let z = tile_zoom(vp.zoom);
    let n = 1u32 << z;
    let nf = n as f64;
    let (min_x, min_y, max_x, max_y) = vp.visible_unit_rect(w, h);

    let x0 = ((min_x * nf).floor().max(0.0) as u32).min(n - 1);
    let x1 = ((max_x * nf).floor().max(0.0) as u32).min(n - 1);
    let y0 = ((min_y * nf).floor().max(0.0) as u32).min(n - 1);
    let y1 = ((max_y * nf).floor().max(0.0) as u32).min(n - 1);

    let cx = (min_x + max_x) / 2.0 * nf;
    let cy = (min_y + max_y) / 2.0 * nf;

    let mut ids = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            ids.push(TileId { z, x, y });
        }
    }
    ids.sort_by(|a, b| {
        let da = (a.x as f64 + 0.5 - cx).powi(2) + (a.y as f64 + 0.5 - cy).powi(2);
        let db = (b.x as f64 + 0.5 - cx).powi(2) + (b.y as f64 + 0.5 - cy).powi(2);
        da.total_cmp(&db)
    });
    ids
}

/// Pulls street tiles for whatever the camera shows, a few at a time.
/// Loaded images land in the shared signal; the canvas repaints on each
/// arrival. Failed addresses may be requested again on a later pass.
pub struct TileLoader {
    tiles: RwSignal<Vec<LoadedTile>>,
    queue: Rc<RefCell<VecDeque<TileId>>>,
    requested: Rc<RefCell<HashSet<TileId>>>,
    in_flight: Rc<Cell<usize>>,
}

impl TileLoader {
    pub fn new(tiles: RwSignal<Vec<LoadedTile>>) -> Self {
        Self {
            tiles,
            queue: Rc::new(RefCell::new(VecDeque::new())),
            requested: Rc::new(RefCell::new(HashSet::new())),
            in_flight: Rc::new(Cell::new(0)),
        }
    }

    /// Queue every listed address not already loaded or in flight.
    pub fn request(&self, wanted: &[TileId]) {
        {
            let mut requested = self.requested.borrow_mut();
            let mut queue = self.queue.borrow_mut();
            for &id in wanted {
                if requested.insert(id) {
                    queue.push_back(id);
                }
            }
        }
        pump_queue(
            self.tiles,
            self.queue.clone(),
            self.requested.clone(),
            self.in_flight.clone(),
        );
    }
}

fn pump_queue(
    tiles: RwSignal<Vec<LoadedTile>>,
    queue: Rc<RefCell<VecDeque<TileId>>>,
    requested: Rc<RefCell<HashSet<TileId>>>,
    in_flight: Rc<Cell<usize>>,
) {
    while in_flight.get() < MAX_CONCURRENT_LOADS {
        let Some(id) = queue.borrow_mut().pop_front() else {
            break;
        };
        in_flight.set(in_flight.get() + 1);

        let queue_next = queue.clone();
        let requested_next = requested.clone();
        let in_flight_next = in_flight.clone();
        let on_done: Rc<dyn Fn()> = Rc::new(move || {
            in_flight_next.set(in_flight_next.get().saturating_sub(1));
            pump_queue(
                tiles,
                queue_next.clone(),
                requested_next.clone(),
                in_flight_next.clone(),
            );
        });

        load_tile(tiles, requested.clone(), id, on_done);
    }
}

fn load_tile(
    tiles: RwSignal<Vec<LoadedTile>>,
    requested: Rc<RefCell<HashSet<TileId>>>,
    id: TileId,
    on_done: Rc<dyn Fn()>,
) {
    let img = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(_) => {
            requested.borrow_mut().remove(&id);
            on_done();
            return;
        }
    };

    let img_for_load = img.clone();
    let on_done_load = on_done.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);

        let img_for_decode = img_for_load.clone();
        let on_done_load = on_done_load.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let _ = JsFuture::from(img_for_decode.decode()).await;
            insert_tile(
                tiles,
                LoadedTile {
                    id,
                    image: img_for_decode,
                    loaded_at: js_sys::Date::now(),
                },
            );
            on_done_load();
        });
    });

    let img_for_error = img.clone();
    let requested_for_error = requested.clone();
    let on_done_error = on_done.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        // Forget the address so a later viewport pass can retry it.
        requested_for_error.borrow_mut().remove(&id);
        on_done_error();
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONLOAD_HANDLE_KEY),
        &onload_js,
    );
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONERROR_HANDLE_KEY),
        &onerror_js,
    );
    img.set_src(&config::tile_url(id.z, id.x, id.y));
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

fn insert_tile(tiles: RwSignal<Vec<LoadedTile>>, incoming: LoadedTile) {
    tiles.update(|loaded| {
        if loaded.iter().any(|tile| tile.id == incoming.id) {
            return;
        }
        loaded.push(incoming);
        if loaded.len() > MAX_CACHED_TILES {
            loaded.sort_by(|a, b| b.loaded_at.total_cmp(&a.loaded_at));
            loaded.truncate(MAX_CACHED_TILES);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_uses_the_floored_camera_zoom() {
        let mut vp = Viewport::default();
        vp.zoom = 12.7;

        let ids = cover(&vp, 800.0, 600.0);

        assert!(!ids.is_empty());
        assert!(ids.iter().all(|id| id.z == 12));
    }

    #[test]
    fn cover_includes_the_tiles_under_every_corner() {
        let vp = Viewport::default();
        let (min_x, min_y, max_x, max_y) = vp.visible_unit_rect(800.0, 600.0);
        let ids = cover(&vp, 800.0, 600.0);

        let z = tile_zoom(vp.zoom);
        let n = (1u32 << z) as f64;
        for (ux, uy) in [(min_x, min_y), (max_x, min_y), (min_x, max_y), (max_x, max_y)] {
            let corner = TileId {
                z,
                x: (ux * n).floor() as u32,
                y: (uy * n).floor() as u32,
            };
            assert!(ids.contains(&corner), "missing {corner:?}");
        }
    }

    #[test]
    fn cover_orders_center_tiles_first() {
        let vp = Viewport::default();
        let ids = cover(&vp, 800.0, 600.0);
        let (min_x, min_y, max_x, max_y) = vp.visible_unit_rect(800.0, 600.0);
        let n = (1u32 << tile_zoom(vp.zoom)) as f64;
        let cx = (min_x + max_x) / 2.0 * n;
        let cy = (min_y + max_y) / 2.0 * n;

        let dist = |id: &TileId| {
            (id.x as f64 + 0.5 - cx).powi(2) + (id.y as f64 + 0.5 - cy).powi(2)
        };

        for pair in ids.windows(2) {
            assert!(dist(&pair[0]) <= dist(&pair[1]));
        }
    }

    #[test]
    fn tile_rect_subdivides_the_parent() {
        let parent = TileId { z: 1, x: 0, y: 0 };
        let (min_x, min_y, max_x, max_y) = parent.unit_rect();

        assert_eq!((min_x, min_y), (0.0, 0.0));
        assert_eq!((max_x, max_y), (0.5, 0.5));
    }
}
