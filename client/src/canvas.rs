use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, MouseEvent, PointerEvent, WheelEvent};

use boromap_shared::{valid_points, CrimeFilter};

use crate::api;
use crate::app::{Hovered, RetryLoad};
use crate::config::{MapOptions, INCIDENT_FETCH_DELAY_MS};
use crate::feature_index::FeatureIndex;
use crate::feature_state::FeatureFlags;
use crate::render;
use crate::render_loop::FrameScheduler;
use crate::scene::MapScene;
use crate::selection::{self, SearchRequest, Selection, SelectionCore};
use crate::surface::InteractionState;
use crate::tiles::{self, TileLoader};
use crate::viewport::Viewport;

/// Drag distance below which a pointerup still counts as a click.
const CLICK_SLOP_PX: f64 = 5.0;
/// How long the camera must sit still before newly visible street tiles
/// are requested.
const TILE_SETTLE_MS: u32 = 120;

/// Progress of the initial boundary load. Incident data arrives later and
/// is allowed to fail without leaving this state.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

async fn load_incidents(
    scene: Rc<RefCell<Option<MapScene>>>,
    nonce: Rc<Cell<u64>>,
    filter: CrimeFilter,
    scheduler: Rc<FrameScheduler>,
) {
    let request_nonce = nonce.get() + 1;
    nonce.set(request_nonce);
    match api::fetch_crimes(&filter).await {
        Ok(records) => {
            if nonce.get() != request_nonce {
                // A newer filter superseded this request while it was in
                // flight. Drop the records without touching the scene.
                return;
            }
            let points = valid_points(&records);
            let dropped = records.len() - points.len();
            if dropped > 0 {
                web_sys::console::info_1(
                    &format!("dropped {dropped} incidents without usable coordinates").into(),
                );
            }
            if let Some(scene) = scene.borrow_mut().as_mut() {
                scene.set_points(points);
            }
            scheduler.mark_dirty();
        }
        Err(e) => {
            if nonce.get() == request_nonce {
                // Boundaries stay interactive even when incidents fail.
                web_sys::console::warn_1(&format!("incident fetch failed: {e}").into());
            }
        }
    }
}

#[component]
pub fn MapSurface() -> impl IntoView {
    let viewport: RwSignal<Viewport> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let selection_core: RwSignal<SelectionCore> = expect_context();
    let search_query: RwSignal<String> = expect_context();
    let search_requests: RwSignal<Option<SearchRequest>> = expect_context();
    let incident_filter: RwSignal<CrimeFilter> = expect_context();
    let load_status: RwSignal<LoadStatus> = expect_context();
    let options: StoredValue<MapOptions> = expect_context();
    let feature_index: RwSignal<FeatureIndex> = expect_context();
    let Hovered(hovered) = expect_context::<Hovered>();
    let RetryLoad(retry_ticks) = expect_context::<RetryLoad>();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let loaded_tiles = expect_context::<RwSignal<Vec<tiles::LoadedTile>>>();

    // Scene, flag store and interaction state live outside the reactive
    // graph. Handlers mutate them directly and poke the scheduler; signals
    // only carry what other components need to observe.
    let scene: Rc<RefCell<Option<MapScene>>> = Rc::new(RefCell::new(None));
    let flags: Rc<RefCell<FeatureFlags>> = Rc::new(RefCell::new(FeatureFlags::default()));
    let interaction: Rc<RefCell<InteractionState>> =
        Rc::new(RefCell::new(InteractionState::default()));
    let incident_nonce: Rc<Cell<u64>> = Rc::new(Cell::new(0));

    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0_f64));
    let drag_start_y = Rc::new(Cell::new(0.0_f64));
    let last_x = Rc::new(Cell::new(0.0_f64));
    let last_y = Rc::new(Cell::new(0.0_f64));

    // 2d context survives across frames; a resize invalidates it because
    // the backing store reset also drops our DPR transform.
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    let scene_render = scene.clone();
    let flags_render = flags.clone();
    let cached_ctx_render = cached_ctx.clone();
    let scheduler = FrameScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let Some(parent) = canvas.parent_element() else {
            return;
        };
        let w = parent.client_width().max(0) as u32;
        let h = parent.client_height().max(0) as u32;
        if w == 0 || h == 0 {
            return;
        }

        let dpr = web_sys::window()
            .map(|win| win.device_pixel_ratio())
            .unwrap_or(1.0)
            .max(1.0);
        let pw = (w as f64 * dpr).round() as u32;
        let ph = (h as f64 * dpr).round() as u32;
        if canvas.width() != pw || canvas.height() != ph {
            canvas.set_width(pw);
            canvas.set_height(ph);
            *cached_ctx_render.borrow_mut() = None;
        }

        let mut ctx_slot = cached_ctx_render.borrow_mut();
        if ctx_slot.is_none() {
            let ctx = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|obj| obj.dyn_into::<CanvasRenderingContext2d>().ok());
            let Some(ctx) = ctx else {
                return;
            };
            let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
            *ctx_slot = Some(ctx);
        }
        let Some(ctx) = ctx_slot.as_ref() else {
            return;
        };

        let vp = viewport.get_untracked();
        let scene_ref = scene_render.borrow();
        let flags_ref = flags_render.borrow();
        let opts = options.get_value();
        loaded_tiles.with_untracked(|tiles| {
            render::paint(
                ctx,
                &render::Frame {
                    vp: &vp,
                    w: w as f64,
                    h: h as f64,
                    scene: scene_ref.as_ref(),
                    flags: &flags_ref,
                    tiles,
                    options: &opts,
                },
            );
        });
    });
    let scheduler = Rc::new(scheduler);

    // Boundary load, with a deferred incident fetch once the outlines are
    // on screen. Re-runnable from the Failed state via the retry signal.
    let boot_started = Rc::new(Cell::new(false));
    let run_initialize = {
        let scene = scene.clone();
        let scheduler = scheduler.clone();
        let incident_nonce = incident_nonce.clone();
        let boot_started = boot_started.clone();
        Rc::new(move || {
            if boot_started.get()
                && !matches!(load_status.get_untracked(), LoadStatus::Failed(_))
            {
                return;
            }
            boot_started.set(true);
            load_status.set(LoadStatus::Loading);
            let scene = scene.clone();
            let scheduler = scheduler.clone();
            let incident_nonce = incident_nonce.clone();
            spawn_local(async move {
                match api::fetch_boundaries().await {
                    Ok(collection) => {
                        if collection.skipped > 0 {
                            web_sys::console::warn_1(
                                &format!(
                                    "skipped {} boundary features with unsupported geometry",
                                    collection.skipped
                                )
                                .into(),
                            );
                        }
                        let built = MapScene::from_boundaries(collection);
                        web_sys::console::info_1(
                            &format!("loaded {} neighborhood boundaries", built.len()).into(),
                        );
                        *scene.borrow_mut() = Some(built);
                        load_status.set(LoadStatus::Ready);
                        scheduler.mark_dirty();

                        // Let the first boundary frame land before the much
                        // heavier incident payload is requested.
                        TimeoutFuture::new(INCIDENT_FETCH_DELAY_MS).await;
                        let filter = incident_filter.get_untracked();
                        load_incidents(scene, incident_nonce, filter, scheduler).await;
                    }
                    Err(e) => {
                        web_sys::console::warn_1(
                            &format!("boundary load failed: {e}").into(),
                        );
                        load_status.set(LoadStatus::Failed(e));
                    }
                }
            });
        })
    };

    let init_on_retry = run_initialize.clone();
    Effect::new(move || {
        retry_ticks.track();
        init_on_retry();
    });

    // Filter changes refetch incidents against the already loaded scene.
    // Before boundaries arrive the boot path owns the first fetch.
    let scene_filter = scene.clone();
    let nonce_filter = incident_nonce.clone();
    let sched_filter = scheduler.clone();
    Effect::new(move || {
        let filter = incident_filter.get();
        if scene_filter.borrow().is_none() {
            return;
        }
        let scene = scene_filter.clone();
        let nonce = nonce_filter.clone();
        let scheduler = sched_filter.clone();
        spawn_local(async move {
            load_incidents(scene, nonce, filter, scheduler).await;
        });
    });

    // Repaint whenever the camera moves or a street tile arrives.
    let sched_camera = scheduler.clone();
    Effect::new(move || {
        viewport.track();
        loaded_tiles.track();
        sched_camera.mark_dirty();
    });

    // Street tiles follow the camera after it settles; cancel-and-replace
    // so only the final viewport of a pan or zoom gesture fetches.
    let tile_loader = Rc::new(TileLoader::new(loaded_tiles));
    let tile_debounce: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
    let loader_camera = tile_loader.clone();
    let debounce_camera = tile_debounce.clone();
    Effect::new(move || {
        let vp = viewport.get();
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let w = canvas.client_width() as f64;
        let h = canvas.client_height() as f64;
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let wanted = tiles::cover(&vp, w, h);
        let loader = loader_camera.clone();
        let timeout = Timeout::new(TILE_SETTLE_MS, move || {
            loader.request(&wanted);
        });
        if let Some(old) = debounce_camera.borrow_mut().replace(timeout) {
            old.cancel();
        }
    });

    // When the active selection stops being a neighborhood (ranking panel
    // opened, Escape, popup closed) the highlighted polygon must drop too.
    let interaction_sel = interaction.clone();
    let flags_sel = flags.clone();
    let sched_sel = scheduler.clone();
    Effect::new(move || {
        let is_neighborhood =
            selection_core.with(|core| matches!(core.current(), Selection::Neighborhood(_)));
        if !is_neighborhood && interaction_sel.borrow().selected().is_some() {
            interaction_sel
                .borrow_mut()
                .clear_selection(&mut *flags_sel.borrow_mut());
            sched_sel.mark_dirty();
        }
    });

    // Search requests resolve against the names currently in view.
    let scene_search = scene.clone();
    let flags_search = flags.clone();
    let interaction_search = interaction.clone();
    let sched_search = scheduler.clone();
    Effect::new(move || {
        let Some(request) = search_requests.get() else {
            return;
        };
        let scene_ref = scene_search.borrow();
        let Some(scene_data) = scene_ref.as_ref() else {
            web_sys::console::warn_1(&"search ignored: boundaries not loaded yet".into());
            return;
        };
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let w = canvas.client_width() as f64;
        let h = canvas.client_height() as f64;
        let view = viewport.get_untracked().visible_bounds(w, h);
        let found = interaction_search.borrow_mut().select_by_name(
            &mut *flags_search.borrow_mut(),
            scene_data.rendered_features(&view),
            &request.name,
        );
        match found {
            Some(id) => {
                sched_search.mark_dirty();
                let name = scene_data.display_name(id).unwrap_or_default();
                match feature_index.with_untracked(|index| index.lookup(name)) {
                    Some(backend_id) => {
                        selection::choose_neighborhood(selection_core, search_query, backend_id);
                    }
                    None => web_sys::console::warn_1(
                        &format!("no backend id for neighborhood {name:?}").into(),
                    ),
                }
            }
            None => web_sys::console::info_1(
                &format!("no neighborhood named {:?} in view", request.name).into(),
            ),
        }
    });

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let w = canvas.client_width() as f64;
        let h = canvas.client_height() as f64;
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(e.delta_y(), x, y, w, h));
    };

    let dragging_down = is_dragging.clone();
    let start_x_down = drag_start_x.clone();
    let start_y_down = drag_start_y.clone();
    let last_x_down = last_x.clone();
    let last_y_down = last_y.clone();
    let on_pointer_down = move |e: PointerEvent| {
        dragging_down.set(true);
        start_x_down.set(e.client_x() as f64);
        start_y_down.set(e.client_y() as f64);
        last_x_down.set(e.client_x() as f64);
        last_y_down.set(e.client_y() as f64);
        if let Some(target) = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
        {
            let _ = target.set_pointer_capture(e.pointer_id());
            let _ = target.style().set_property("cursor", "grabbing");
        }
    };

    let dragging_move = is_dragging.clone();
    let last_x_move = last_x.clone();
    let last_y_move = last_y.clone();
    let scene_move = scene.clone();
    let flags_move = flags.clone();
    let interaction_move = interaction.clone();
    let sched_move = scheduler.clone();
    let on_pointer_move = move |e: PointerEvent| {
        if dragging_move.get() {
            let dx = e.client_x() as f64 - last_x_move.get();
            let dy = e.client_y() as f64 - last_y_move.get();
            last_x_move.set(e.client_x() as f64);
            last_y_move.set(e.client_y() as f64);
            viewport.update(|vp| vp.pan(dx, dy));
            // The polygon under the cursor changes as the map slides, so
            // hover is meaningless mid-pan.
            if interaction_move.borrow().hovered().is_some() {
                interaction_move
                    .borrow_mut()
                    .leave(&mut *flags_move.borrow_mut());
                hovered.set(None);
            }
            return;
        }

        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let rect = canvas.get_bounding_client_rect();
        let local_x = e.client_x() as f64 - rect.left();
        let local_y = e.client_y() as f64 - rect.top();
        let w = canvas.client_width() as f64;
        let h = canvas.client_height() as f64;
        let p = viewport.get_untracked().to_lnglat(local_x, local_y, w, h);

        let scene_ref = scene_move.borrow();
        let Some(scene_data) = scene_ref.as_ref() else {
            return;
        };
        let hit = scene_data.feature_at(p);
        let mut state = interaction_move.borrow_mut();
        let changed = match hit {
            Some(id) => {
                let changed = state.hover(&mut *flags_move.borrow_mut(), id);
                if changed {
                    hovered.set(scene_data.display_name(id).map(str::to_string));
                }
                changed
            }
            None => {
                let changed = state.leave(&mut *flags_move.borrow_mut());
                if changed {
                    hovered.set(None);
                }
                changed
            }
        };
        if state.hovered().is_some() {
            mouse_pos.set((e.client_x() as f64, e.client_y() as f64));
        }
        if changed {
            sched_move.mark_dirty();
        }
    };

    let dragging_up = is_dragging.clone();
    let on_pointer_up = move |e: PointerEvent| {
        dragging_up.set(false);
        if let Some(target) = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
        {
            let _ = target.style().set_property("cursor", "grab");
        }
    };

    let dragging_leave = is_dragging.clone();
    let flags_leave = flags.clone();
    let interaction_leave = interaction.clone();
    let sched_leave = scheduler.clone();
    let on_pointer_leave = move |_e: PointerEvent| {
        dragging_leave.set(false);
        if interaction_leave
            .borrow_mut()
            .leave(&mut *flags_leave.borrow_mut())
        {
            hovered.set(None);
            sched_leave.mark_dirty();
        }
    };

    let start_x_click = drag_start_x.clone();
    let start_y_click = drag_start_y.clone();
    let scene_click = scene.clone();
    let flags_click = flags.clone();
    let interaction_click = interaction.clone();
    let sched_click = scheduler.clone();
    let on_click = move |e: MouseEvent| {
        let dx = (e.client_x() as f64 - start_x_click.get()).abs();
        let dy = (e.client_y() as f64 - start_y_click.get()).abs();
        if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
            return;
        }
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let rect = canvas.get_bounding_client_rect();
        let local_x = e.client_x() as f64 - rect.left();
        let local_y = e.client_y() as f64 - rect.top();
        let w = canvas.client_width() as f64;
        let h = canvas.client_height() as f64;
        let p = viewport.get_untracked().to_lnglat(local_x, local_y, w, h);

        let scene_ref = scene_click.borrow();
        let Some(scene_data) = scene_ref.as_ref() else {
            return;
        };
        // Clicking open water or a borough gap keeps whatever is selected.
        let Some(id) = scene_data.feature_at(p) else {
            return;
        };
        interaction_click
            .borrow_mut()
            .select(&mut *flags_click.borrow_mut(), id);
        sched_click.mark_dirty();

        let name = scene_data.display_name(id).unwrap_or_default();
        match feature_index.with_untracked(|index| index.lookup(name)) {
            Some(backend_id) => {
                selection::choose_neighborhood(selection_core, search_query, backend_id);
            }
            None => web_sys::console::warn_1(
                &format!("no backend id for neighborhood {name:?}").into(),
            ),
        }
    };

    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}
