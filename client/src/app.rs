use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use boromap_shared::CrimeFilter;

use crate::api;
use crate::canvas::{LoadStatus, MapSurface};
use crate::config::MapOptions;
use crate::controls::ControlBar;
use crate::feature_index::FeatureIndex;
use crate::legend::Legend;
use crate::popup::NeighborhoodPopup;
use crate::ranking::RankingPanel;
use crate::selection::{self, SearchRequest, SelectionCore};
use crate::tiles::LoadedTile;
use crate::viewport::Viewport;

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Newtype wrappers so contexts with overlapping inner types stay distinct
/// under `provide_context`.
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct RetryLoad(pub RwSignal<u64>);
#[derive(Clone, Copy)]
pub(crate) struct CrimeTypes(pub RwSignal<Vec<String>>);

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let hovered: RwSignal<Option<String>> = RwSignal::new(None);
    let mouse_pos: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));
    let selection_core: RwSignal<SelectionCore> = RwSignal::new(SelectionCore::default());
    let search_query: RwSignal<String> = RwSignal::new(String::new());
    let search_requests: RwSignal<Option<SearchRequest>> = RwSignal::new(None);
    let incident_filter: RwSignal<CrimeFilter> = RwSignal::new(CrimeFilter::default());
    let load_status: RwSignal<LoadStatus> = RwSignal::new(LoadStatus::Loading);
    let retry_ticks: RwSignal<u64> = RwSignal::new(0);
    let crime_types: RwSignal<Vec<String>> = RwSignal::new(Vec::new());
    let feature_index: RwSignal<FeatureIndex> = RwSignal::new(FeatureIndex::default());
    let loaded_tiles: RwSignal<Vec<LoadedTile>> = RwSignal::new(Vec::new());
    let options: StoredValue<MapOptions> = StoredValue::new(MapOptions::default());

    provide_context(viewport);
    provide_context(Hovered(hovered));
    provide_context(mouse_pos);
    provide_context(selection_core);
    provide_context(search_query);
    provide_context(search_requests);
    provide_context(incident_filter);
    provide_context(load_status);
    provide_context(RetryLoad(retry_ticks));
    provide_context(CrimeTypes(crime_types));
    provide_context(feature_index);
    provide_context(loaded_tiles);
    provide_context(options);

    // The name -> backend id index and the crime-type list load once at
    // mount. Both are small and independent of the boundary file, so a
    // failure here degrades search and the ranking select without taking
    // the map down.
    Effect::new(move || {
        spawn_local(async move {
            match api::fetch_neighborhoods().await {
                Ok(rows) => feature_index.set(FeatureIndex::build(&rows)),
                Err(e) => web_sys::console::warn_1(
                    &format!("neighborhood list fetch failed: {e}").into(),
                ),
            }
        });
        spawn_local(async move {
            match api::fetch_crime_types().await {
                Ok(types) => crime_types.set(types),
                Err(e) => web_sys::console::warn_1(
                    &format!("crime type list fetch failed: {e}").into(),
                ),
            }
        });
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();

                // Don't intercept while a form control has focus
                if target_tag == "INPUT" || target_tag == "TEXTAREA" || target_tag == "SELECT" {
                    if key == "Escape"
                        && let Some(el) = e
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        el.blur().ok();
                    }
                    return;
                }

                match key.as_str() {
                    "Escape" => {
                        selection::close_panels(selection_core, search_query);
                    }
                    "/" => {
                        e.prevent_default();
                        let Some(window) = web_sys::window() else {
                            return;
                        };
                        let Some(doc) = window.document() else {
                            return;
                        };
                        if let Some(el) = doc.query_selector("[data-search-input]").ok().flatten()
                            && let Ok(input) = el.dyn_into::<web_sys::HtmlElement>()
                        {
                            input.focus().ok();
                        }
                    }
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
            <MapSurface />
            <ControlBar />
            <RankingPanel />
            <NeighborhoodPopup />
            <Legend />
            <StatusOverlay />
        </div>
        <Tooltip />
    }
}

/// Full-surface overlay while boundaries load, with a retry path on failure.
#[component]
fn StatusOverlay() -> impl IntoView {
    let load_status: RwSignal<LoadStatus> = expect_context();
    let RetryLoad(retry_ticks) = expect_context::<RetryLoad>();

    view! {
        {move || {
            match load_status.get() {
                LoadStatus::Ready => view! { <div style="display:none;" /> }.into_any(),
                LoadStatus::Loading => view! {
                    <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(12, 14, 23, 0.72); z-index: 50;">
                        <div style="font-family: 'Silkscreen', monospace; font-size: 0.8rem; letter-spacing: 0.14em; color: #9a9590; text-transform: uppercase;">
                            "Loading boundaries..."
                        </div>
                    </div>
                }.into_any(),
                LoadStatus::Failed(err) => view! {
                    <div style="position: absolute; inset: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 12px; background: rgba(12, 14, 23, 0.82); z-index: 50;">
                        <div style="font-family: 'Silkscreen', monospace; font-size: 0.8rem; letter-spacing: 0.14em; color: #e25b5b; text-transform: uppercase;">
                            "Boundary load failed"
                        </div>
                        <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.7rem; color: #9a9590; max-width: 420px; text-align: center;">
                            {err}
                        </div>
                        <button
                            style="padding: 6px 22px; border-radius: 4px; border: 1px solid #282c3e; background: #1a1d2a; color: #9f9a95; font-family: 'Silkscreen', monospace; font-size: 0.62rem; cursor: pointer; text-transform: uppercase; letter-spacing: 0.1em; transition: border-color 0.15s, color 0.15s;"
                            on:click=move |_| retry_ticks.update(|n| *n += 1)
                            on:mouseenter=|e| {
                                if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                                    el.style().set_property("border-color", "rgba(245, 197, 66, 0.35)").ok();
                                    el.style().set_property("color", "#f5c542").ok();
                                }
                            }
                            on:mouseleave=|e| {
                                if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                                    el.style().set_property("border-color", "#282c3e").ok();
                                    el.style().set_property("color", "#9f9a95").ok();
                                }
                            }
                        >"Retry"</button>
                    </div>
                }.into_any(),
            }
        }}
    }
}

/// Tooltip that follows the cursor while a neighborhood is hovered.
#[component]
fn Tooltip() -> impl IntoView {
    let Hovered(hovered) = expect_context::<Hovered>();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();

    view! {
        {move || {
            let Some(name) = hovered.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            let (x, y) = mouse_pos.get();
            view! {
                <div
                    style:left=format!("{}px", x + 16.0)
                    style:top=format!("{}px", y - 8.0)
                    style="position: fixed; pointer-events: none; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.5); padding: 6px 10px; max-width: 240px;"
                >
                    <div style="font-size: 0.78rem; font-weight: 700; color: #e2e0d8; font-family: 'Silkscreen', monospace; line-height: 1.3; white-space: nowrap; overflow: hidden; text-overflow: ellipsis;">
                        {name}
                    </div>
                </div>
            }.into_any()
        }}
    }
}
