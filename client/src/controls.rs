use chrono::NaiveDate;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use boromap_shared::CrimeFilter;

use crate::app::CrimeTypes;
use crate::selection::{self, SearchRequest, Selection, SelectionCore};

const BOROUGHS: [&str; 5] = ["Bronx", "Brooklyn", "Manhattan", "Queens", "Staten Island"];

/// Top control bar: brand, neighborhood search, crime-type ranking select
/// and the borough and date filters for the incident layer.
#[component]
pub fn ControlBar() -> impl IntoView {
    view! {
        <div style="position: absolute; top: 16px; left: 16px; right: 16px; display: flex; align-items: center; gap: 10px; flex-wrap: wrap; z-index: 40; pointer-events: none;">
            <div style="pointer-events: auto; background: #101320; border: 1px solid #282c3e; border-radius: 6px; padding: 7px 12px; display: flex; align-items: baseline; gap: 8px; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.35);">
                <span style="font-family: 'Silkscreen', monospace; font-size: 0.95rem; font-weight: 700; letter-spacing: 0.16em; text-transform: uppercase; color: #f5c542;">"BOROMAP"</span>
                <span style="font-family: 'Inter', system-ui, sans-serif; font-size: 0.62rem; color: #5a5860; letter-spacing: 0.08em;">"NYC incidents"</span>
            </div>
            <SearchBar />
            <CrimeTypeSelect />
            <BoroughSelect />
            <DateFilter />
        </div>
    }
}

#[component]
fn SearchBar() -> impl IntoView {
    let search_query: RwSignal<String> = expect_context();
    let search_requests: RwSignal<Option<SearchRequest>> = expect_context();

    let on_input = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(input) = target.dyn_into::<web_sys::HtmlInputElement>() else {
            return;
        };
        search_query.set(input.value());
    };

    let on_keydown = move |e: web_sys::KeyboardEvent| {
        if e.key() == "Enter" {
            selection::submit_search(search_requests, &search_query.get_untracked());
        }
    };

    view! {
        <div style="pointer-events: auto; position: relative; width: 260px;">
            // Magnifying glass
            <div style="position: absolute; left: 11px; top: 50%; transform: translateY(-50%); pointer-events: none; color: #5a5860; width: 13px; height: 13px;">
                <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 20" fill="currentColor" width="13" height="13">
                    <path fill-rule="evenodd" d="M9 3.5a5.5 5.5 0 100 11 5.5 5.5 0 000-11zM2 9a7 7 0 1112.452 4.391l3.328 3.329a.75.75 0 11-1.06 1.06l-3.329-3.328A7 7 0 012 9z" clip-rule="evenodd" />
                </svg>
            </div>
            <input
                data-search-input=""
                style="width: 100%; padding: 8px 28px 8px 31px; background: #101320; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; font-size: 0.82rem; outline: none; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.35); transition: border-color 0.2s ease, box-shadow 0.3s ease;"
                type="text"
                placeholder="Search neighborhoods..."
                prop:value=move || search_query.get()
                on:input=on_input
                on:keydown=on_keydown
                on:focus=|e| {
                    if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                        el.style().set_property("border-color", "#f5c542").ok();
                        el.style().set_property("box-shadow", "0 0 12px rgba(245, 197, 66, 0.08)").ok();
                    }
                }
                on:blur=|e| {
                    if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                        el.style().set_property("border-color", "#282c3e").ok();
                        el.style().set_property("box-shadow", "0 4px 16px rgba(0, 0, 0, 0.35)").ok();
                    }
                }
            />
            // Keyboard hint
            <div style="position: absolute; right: 9px; top: 50%; transform: translateY(-50%); font-family: 'JetBrains Mono', monospace; font-size: 0.6rem; color: #3a3f5c; background: #13161f; padding: 1px 5px; border-radius: 3px; border: 1px solid #282c3e; pointer-events: none;">"/"</div>
        </div>
    }
}

#[component]
fn CrimeTypeSelect() -> impl IntoView {
    let selection_core: RwSignal<SelectionCore> = expect_context();
    let CrimeTypes(crime_types) = expect_context::<CrimeTypes>();

    // The select mirrors the active ranking so a neighborhood click or
    // Escape visibly resets it to the placeholder.
    let active_type = Memo::new(move |_| {
        selection_core.with(|core| match core.current() {
            Selection::CrimeTypeRanking { crime_type, .. } => crime_type.clone(),
            _ => String::new(),
        })
    });

    let on_change = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(select) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        selection::choose_crime_type(selection_core, select.value());
    };

    view! {
        <select
            prop:value=move || active_type.get()
            on:change=on_change
            style="pointer-events: auto; min-width: 150px; background: #101320; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; padding: 8px 6px; cursor: pointer; outline: none; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.35); transition: border-color 0.15s ease;"
        >
            <option value="">"Crime type..."</option>
            {move || crime_types.get().into_iter().map(|name| {
                let value = name.clone();
                view! { <option value=value>{name}</option> }
            }).collect::<Vec<_>>()}
        </select>
    }
}

#[component]
fn BoroughSelect() -> impl IntoView {
    let incident_filter: RwSignal<CrimeFilter> = expect_context();

    let on_change = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(select) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        let value = select.value();
        incident_filter.update(|f| {
            f.borough = if value.is_empty() { None } else { Some(value) };
        });
    };

    view! {
        <select
            on:change=on_change
            style="pointer-events: auto; min-width: 120px; background: #101320; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; padding: 8px 6px; cursor: pointer; outline: none; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.35); transition: border-color 0.15s ease;"
        >
            <option value="">"All boroughs"</option>
            {BOROUGHS.into_iter().map(|borough| view! {
                <option value=borough>{borough}</option>
            }).collect::<Vec<_>>()}
        </select>
    }
}

/// Single-day incident filter. The browser's date input emits ISO dates;
/// anything unparseable (including clearing the field) lifts the filter.
#[component]
fn DateFilter() -> impl IntoView {
    let incident_filter: RwSignal<CrimeFilter> = expect_context();

    let on_change = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(input) = target.dyn_into::<web_sys::HtmlInputElement>() else {
            return;
        };
        let parsed = input.value().parse::<NaiveDate>().ok();
        incident_filter.update(|f| f.date = parsed);
    };

    view! {
        <input
            type="date"
            on:change=on_change
            style="pointer-events: auto; background: #101320; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; padding: 7px 6px; cursor: pointer; outline: none; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.35); color-scheme: dark;"
        />
    }
}
