use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use boromap_shared::{CrimeTypeCount, NeighborhoodDetail};

use crate::api;
use crate::config::{CRIME_INDEX_MAX, RANKING_LIMIT};
use crate::selection::{self, SelectionCore};

/// Floating card with the stats of the selected neighborhood.
#[component]
pub fn NeighborhoodPopup() -> impl IntoView {
    let selection_core: RwSignal<SelectionCore> = expect_context();
    let search_query: RwSignal<String> = expect_context();

    let detail: RwSignal<Option<NeighborhoodDetail>> = RwSignal::new(None);
    let total: RwSignal<Option<i64>> = RwSignal::new(None);
    let type_counts: RwSignal<Option<Vec<CrimeTypeCount>>> = RwSignal::new(None);
    let show_all_types = RwSignal::new(false);

    let selected_id = Memo::new(move |_| selection_core.with(|core| core.current().neighborhood()));

    // Each selection change resets the card and starts three fetches. The
    // guard at every resolve keeps a slow response for neighborhood A from
    // landing in a card that now shows neighborhood B.
    Effect::new(move || {
        detail.set(None);
        total.set(None);
        type_counts.set(None);
        show_all_types.set(false);
        let Some(id) = selected_id.get() else {
            return;
        };

        let still_selected =
            move || selection_core.with_untracked(|core| core.current().neighborhood()) == Some(id);

        spawn_local(async move {
            match api::fetch_neighborhood(id).await {
                Ok(row) if still_selected() => detail.set(Some(row)),
                Ok(_) => {}
                Err(e) => {
                    web_sys::console::warn_1(&format!("neighborhood fetch failed: {e}").into())
                }
            }
        });
        spawn_local(async move {
            match api::fetch_crime_count(id).await {
                Ok(row) if still_selected() => total.set(Some(row.count)),
                Ok(_) => {}
                Err(e) => {
                    web_sys::console::warn_1(&format!("crime count fetch failed: {e}").into())
                }
            }
        });
        spawn_local(async move {
            match api::fetch_type_counts(id).await {
                Ok(rows) if still_selected() => type_counts.set(Some(rows)),
                Ok(_) => {}
                Err(e) => {
                    web_sys::console::warn_1(&format!("type breakdown fetch failed: {e}").into())
                }
            }
        });
    });

    let on_close = move |_| selection::close_panels(selection_core, search_query);

    view! {
        {move || {
            if selected_id.get().is_none() {
                return view! { <div style="display: none;" /> }.into_any();
            }
            view! {
                <div style="position: absolute; top: 16px; right: 16px; width: 300px; max-height: calc(100% - 32px); overflow-y: auto; background: #101320; border: 1px solid #282c3e; border-radius: 8px; padding: 14px 16px; box-shadow: 0 8px 24px rgba(0, 0, 0, 0.45); z-index: 30;">
                    <div style="display: flex; align-items: flex-start; justify-content: space-between; margin-bottom: 10px;">
                        <div style="min-width: 0;">
                            <div style="font-family: 'Silkscreen', monospace; font-size: 0.9rem; color: #e2e0d8; letter-spacing: 0.06em; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">
                                {move || detail.get().map(|d| d.name).unwrap_or_else(|| "Loading...".to_string())}
                            </div>
                            <div style="font-family: 'Inter', system-ui, sans-serif; font-size: 0.7rem; color: #5a5860; margin-top: 2px;">
                                {move || detail.get().map(|d| {
                                    if d.code.is_empty() {
                                        d.borough
                                    } else {
                                        format!("{} \u{00B7} {}", d.borough, d.code)
                                    }
                                }).unwrap_or_default()}
                            </div>
                        </div>
                        <button
                            style="background: none; border: none; color: #5a5860; font-size: 1rem; cursor: pointer; padding: 0 2px; line-height: 1; flex-shrink: 0; transition: color 0.15s;"
                            on:click=on_close
                            on:mouseenter=|e| {
                                if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                                    el.style().set_property("color", "#e2e0d8").ok();
                                }
                            }
                            on:mouseleave=|e| {
                                if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                                    el.style().set_property("color", "#5a5860").ok();
                                }
                            }
                        >{"\u{00D7}"}</button>
                    </div>

                    // Crime index bar, scaled against the citywide reference count.
                    {move || {
                        let Some(count) = total.get() else {
                            return view! {
                                <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #5a5860; margin-bottom: 12px;">
                                    "Counting incidents..."
                                </div>
                            }.into_any();
                        };
                        let width = (count as f64 / CRIME_INDEX_MAX as f64).min(1.0) * 100.0;
                        view! {
                            <div style="margin-bottom: 12px;">
                                <div style="display: flex; justify-content: space-between; align-items: baseline; margin-bottom: 4px;">
                                    <span style="font-family: 'Silkscreen', monospace; font-size: 0.6rem; text-transform: uppercase; letter-spacing: 0.12em; color: #5a5860;">"Crime Index"</span>
                                    <span style="font-family: 'JetBrains Mono', monospace; font-size: 0.82rem; color: #e25b5b; font-weight: 700;">{count}</span>
                                </div>
                                <div style="height: 6px; border-radius: 3px; background: #1a1d2a; overflow: hidden;">
                                    <div style=format!("height: 100%; width: {width:.1}%; background: linear-gradient(to right, #f5c542, #e25b5b); border-radius: 3px;") />
                                </div>
                            </div>
                        }.into_any()
                    }}

                    {move || {
                        let Some(counts) = type_counts.get() else {
                            return view! { <div /> }.into_any();
                        };
                        if counts.is_empty() {
                            return view! {
                                <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #5a5860;">
                                    "No recorded incidents"
                                </div>
                            }.into_any();
                        }
                        let overflow = counts.len() > RANKING_LIMIT;
                        let shown: Vec<CrimeTypeCount> = if show_all_types.get() {
                            counts
                        } else {
                            counts.into_iter().take(RANKING_LIMIT).collect()
                        };
                        view! {
                            <div>
                                <div style="font-family: 'Silkscreen', monospace; font-size: 0.6rem; text-transform: uppercase; letter-spacing: 0.12em; color: #5a5860; margin-bottom: 6px;">
                                    <span style="color: #f5c542; margin-right: 5px; font-size: 0.55rem;">{"\u{25C6}"}</span>"Top Offenses"
                                </div>
                                <div style="display: flex; flex-direction: column; gap: 3px;">
                                    {shown.into_iter().map(|row| view! {
                                        <div style="display: flex; justify-content: space-between; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem; padding: 2px 0;">
                                            <span style="color: #9a9590; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; margin-right: 10px;">{row.crime_type}</span>
                                            <span style="color: #e2e0d8; flex-shrink: 0;">{row.count}</span>
                                        </div>
                                    }).collect::<Vec<_>>()}
                                </div>
                                {overflow.then(|| view! {
                                    <button
                                        style="margin-top: 8px; width: 100%; padding: 4px 0; border-radius: 4px; border: 1px solid #282c3e; background: #1a1d2a; color: #9f9a95; font-family: 'Silkscreen', monospace; font-size: 0.56rem; cursor: pointer; text-transform: uppercase; letter-spacing: 0.1em; transition: border-color 0.15s, color 0.15s;"
                                        on:click=move |_| show_all_types.update(|v| *v = !*v)
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
                                    >
                                        {move || if show_all_types.get() { "Show less" } else { "Show all" }}
                                    </button>
                                })}
                            </div>
                        }.into_any()
                    }}
                </div>
            }.into_any()
        }}
    }
}
