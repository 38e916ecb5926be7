use leptos::prelude::*;

use crate::cluster::heat_css_gradient;
use crate::config::MapOptions;
use crate::render::rgba_css;

/// Static legend for the density gradient and the cluster size buckets.
#[component]
pub fn Legend() -> impl IntoView {
    let options: StoredValue<MapOptions> = expect_context();

    let buckets = options.with_value(|opts| {
        let mut rows = Vec::with_capacity(opts.buckets.len());
        for (i, bucket) in opts.buckets.iter().enumerate() {
            let label = match opts.buckets.get(i + 1) {
                Some(next) => format!("{}-{}", bucket.min_count, next.min_count - 1),
                None => format!("{}+", bucket.min_count),
            };
            rows.push((label, bucket.color));
        }
        rows
    });

    view! {
        <div style="position: absolute; bottom: 16px; left: 16px; background: #101320; border: 1px solid #282c3e; border-radius: 8px; padding: 10px 14px; z-index: 20; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.35);">
            <div style="font-family: 'Silkscreen', monospace; font-size: 0.56rem; text-transform: uppercase; letter-spacing: 0.12em; color: #5a5860; margin-bottom: 6px;">"Incident density"</div>
            <div style=format!("height: 8px; width: 150px; border-radius: 4px; background: {};", heat_css_gradient()) />
            <div style="display: flex; justify-content: space-between; font-family: 'JetBrains Mono', monospace; font-size: 0.56rem; color: #5a5860; margin-top: 3px;">
                <span>"low"</span>
                <span>"high"</span>
            </div>
            <div style="display: flex; gap: 10px; margin-top: 8px;">
                {buckets.into_iter().map(|(label, color)| view! {
                    <div style="display: flex; align-items: center; gap: 4px;">
                        <span style=format!("width: 10px; height: 10px; border-radius: 50%; background: {}; flex-shrink: 0;", rgba_css(color, 1.0)) />
                        <span style="font-family: 'JetBrains Mono', monospace; font-size: 0.6rem; color: #9a9590;">{label}</span>
                    </div>
                }).collect::<Vec<_>>()}
            </div>
        </div>
    }
}
