use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::selection::{self, Selection, SelectionCore};

/// Panel listing the neighborhoods with the most incidents of the chosen
/// crime type. Content comes straight from the selection; the fetch that
/// fills it lives in [`selection::choose_crime_type`].
#[component]
pub fn RankingPanel() -> impl IntoView {
    let selection_core: RwSignal<SelectionCore> = expect_context();
    let search_query: RwSignal<String> = expect_context();

    let ranking = Memo::new(move |_| {
        selection_core.with(|core| match core.current() {
            Selection::CrimeTypeRanking { crime_type, rows } => {
                Some((crime_type.clone(), rows.clone()))
            }
            _ => None,
        })
    });

    let on_close = move |_| selection::close_panels(selection_core, search_query);

    view! {
        {move || {
            let Some((crime_type, rows)) = ranking.get() else {
                return view! { <div style="display: none;" /> }.into_any();
            };
            view! {
                <div style="position: absolute; top: 72px; left: 16px; width: 280px; background: #101320; border: 1px solid #282c3e; border-radius: 8px; padding: 14px 16px; box-shadow: 0 8px 24px rgba(0, 0, 0, 0.45); z-index: 30;">
                    <div style="display: flex; align-items: flex-start; justify-content: space-between; margin-bottom: 10px;">
                        <div style="min-width: 0;">
                            <div style="font-family: 'Silkscreen', monospace; font-size: 0.68rem; text-transform: uppercase; letter-spacing: 0.12em; color: #5a5860;">
                                <span style="color: #f5c542; margin-right: 5px; font-size: 0.55rem;">{"\u{25C6}"}</span>
                                {format!("Top {}", rows.len().max(1))}
                            </div>
                            <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.8rem; color: #e2e0d8; margin-top: 3px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">
                                {crime_type}
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

                    {if rows.is_empty() {
                        view! {
                            <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #5a5860;">
                                "No neighborhoods recorded for this type"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <div style="display: flex; flex-direction: column; gap: 4px;">
                                {rows.into_iter().enumerate().map(|(rank, row)| view! {
                                    <div style="display: flex; align-items: baseline; gap: 8px; padding: 3px 0; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem;">
                                        <span style="color: #f5c542; font-size: 0.68rem; width: 14px; flex-shrink: 0;">
                                            {format!("{}.", rank + 1)}
                                        </span>
                                        <span style="color: #e2e0d8; flex: 1; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">
                                            {row.name}
                                        </span>
                                        <span style="color: #5a5860; font-size: 0.68rem; flex-shrink: 0;">
                                            {row.borough}
                                        </span>
                                        <span style="color: #6ab6ff; font-weight: 700; flex-shrink: 0;">
                                            {row.count}
                                        </span>
                                    </div>
                                }).collect::<Vec<_>>()}
                            </div>
                        }.into_any()
                    }}
                </div>
            }.into_any()
        }}
    }
}
