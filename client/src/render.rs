//! Canvas2D paint pass. One call draws the whole frame: street tiles,
//! boundary fills with their state-driven paints, incident layers, then
//! name labels on top.

use web_sys::{CanvasRenderingContext2d, CanvasWindingRule};

use boromap_shared::category_color;

use crate::cluster::{heat_color, peak_count};
use crate::config::{
    self, FILL_BASE, FILL_BASE_OPACITY, FILL_HOVER, FILL_HOVER_OPACITY, FILL_SELECTED,
    FILL_SELECTED_OPACITY, MapOptions, OUTLINE_COLOR, OUTLINE_WIDTH,
};
use crate::feature_state::{FeatureFlags, FlagKind};
use crate::scene::{MapScene, SceneFeature};
use crate::tiles::{LoadedTile, tile_zoom};
use crate::viewport::Viewport;

/// CSS rgba() string from channels and alpha.
pub fn rgba_css((r, g, b): (u8, u8, u8), a: f64) -> String {
    format!("rgba({r}, {g}, {b}, {a})")
}

/// Scale channels toward white for stroke highlights.
pub fn brighten((r, g, b): (u8, u8, u8), factor: f64) -> (u8, u8, u8) {
    let scale = |c: u8| (c as f64 * factor).min(255.0) as u8;
    (scale(r), scale(g), scale(b))
}

/// Everything one frame needs, borrowed from the canvas component's state.
pub struct Frame<'a> {
    pub vp: &'a Viewport,
    pub w: f64,
    pub h: f64,
    pub scene: Option<&'a MapScene>,
    pub flags: &'a FeatureFlags,
    pub tiles: &'a [LoadedTile],
    pub options: &'a MapOptions,
}

pub fn paint(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
    // Flat backdrop where no tile has arrived yet.
    ctx.set_fill_style_str("#dfe8ef");
    ctx.fill_rect(0.0, 0.0, frame.w, frame.h);

    draw_tiles(ctx, frame);

    let Some(scene) = frame.scene else {
        return;
    };

    draw_boundaries(ctx, frame, scene);
    if frame.vp.zoom < frame.options.cluster_max_zoom {
        draw_clusters(ctx, frame, scene);
    } else {
        draw_points(ctx, frame, scene);
    }
    if frame.vp.zoom >= config::LABEL_MIN_ZOOM {
        draw_labels(ctx, frame, scene);
    }
}

fn draw_tiles(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
    let z = tile_zoom(frame.vp.zoom);
    for tile in frame.tiles.iter().filter(|t| t.id.z == z) {
        let (min_x, min_y, max_x, max_y) = tile.id.unit_rect();
        let (sx0, sy0) = frame.vp.unit_to_screen(min_x, min_y, frame.w, frame.h);
        let (sx1, sy1) = frame.vp.unit_to_screen(max_x, max_y, frame.w, frame.h);
        if sx1 < 0.0 || sy1 < 0.0 || sx0 > frame.w || sy0 > frame.h {
            continue;
        }
        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &tile.image,
            sx0,
            sy0,
            sx1 - sx0,
            sy1 - sy0,
        );
    }
}

fn trace_feature(
    ctx: &CanvasRenderingContext2d,
    frame: &Frame<'_>,
    feature: &SceneFeature,
) {
    ctx.begin_path();
    for polygon in feature.geometry.polygons() {
        for ring in polygon {
            let mut first = true;
            for point in ring {
                let (sx, sy) = frame.vp.to_screen(
                    boromap_shared::LngLat::new(point[0], point[1]),
                    frame.w,
                    frame.h,
                );
                if first {
                    ctx.move_to(sx, sy);
                    first = false;
                } else {
                    ctx.line_to(sx, sy);
                }
            }
            ctx.close_path();
        }
    }
}

fn draw_boundaries(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>, scene: &MapScene) {
    let view = frame.vp.visible_bounds(frame.w, frame.h);

    for feature in scene.features() {
        if !feature.bbox.intersects(&view) {
            continue;
        }
        trace_feature(ctx, frame, feature);

        let fill = if frame.flags.is_set(feature.id, FlagKind::Selected) {
            rgba_css(FILL_SELECTED, FILL_SELECTED_OPACITY)
        } else if frame.flags.is_set(feature.id, FlagKind::Hover) {
            rgba_css(FILL_HOVER, FILL_HOVER_OPACITY)
        } else {
            rgba_css(FILL_BASE, FILL_BASE_OPACITY)
        };
        ctx.set_fill_style_str(&fill);
        ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);

        ctx.set_stroke_style_str(&rgba_css(OUTLINE_COLOR, 0.9));
        ctx.set_line_width(OUTLINE_WIDTH);
        ctx.stroke();
    }
}

fn draw_clusters(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>, scene: &MapScene) {
    let clusters = scene
        .clusters()
        .clusters_for_zoom(frame.vp.zoom, frame.options);
    if clusters.is_empty() {
        return;
    }
    let peak = peak_count(&clusters).max(1) as f64;

    // Soft density blobs underneath the circles.
    for cluster in &clusters {
        let (sx, sy) = frame
            .vp
            .unit_to_screen(cluster.x, cluster.y, frame.w, frame.h);
        if sx < -80.0 || sy < -80.0 || sx > frame.w + 80.0 || sy > frame.h + 80.0 {
            continue;
        }
        let bucket = frame.options.bucket_for(cluster.count);
        let radius = bucket.radius * 1.8;
        let color = heat_color(cluster.count as f64 / peak);
        if let Ok(gradient) = ctx.create_radial_gradient(sx, sy, 0.0, sx, sy, radius) {
            let _ = gradient.add_color_stop(0.0, &rgba_css(color, 0.35));
            let _ = gradient.add_color_stop(1.0, &rgba_css(color, 0.0));
            ctx.set_fill_style_canvas_gradient(&gradient);
            ctx.begin_path();
            ctx.arc(sx, sy, radius, 0.0, std::f64::consts::TAU).ok();
            ctx.fill();
        }
    }

    ctx.set_font("11px 'Inter', system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for cluster in &clusters {
        let (sx, sy) = frame
            .vp
            .unit_to_screen(cluster.x, cluster.y, frame.w, frame.h);
        if sx < -50.0 || sy < -50.0 || sx > frame.w + 50.0 || sy > frame.h + 50.0 {
            continue;
        }
        let bucket = frame.options.bucket_for(cluster.count);

        ctx.set_fill_style_str(&rgba_css(bucket.color, 0.85));
        ctx.begin_path();
        ctx.arc(sx, sy, bucket.radius, 0.0, std::f64::consts::TAU).ok();
        ctx.fill();
        ctx.set_stroke_style_str(&rgba_css(brighten(bucket.color, 1.2), 0.9));
        ctx.set_line_width(1.5);
        ctx.stroke();

        if cluster.count > 1 {
            ctx.set_fill_style_str("#1d2733");
            let _ = ctx.fill_text(&cluster.count.to_string(), sx, sy);
        }
    }
}

fn draw_points(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>, scene: &MapScene) {
    for point in scene.points() {
        let (sx, sy) = frame.vp.to_screen(point.at, frame.w, frame.h);
        if sx < -10.0 || sy < -10.0 || sx > frame.w + 10.0 || sy > frame.h + 10.0 {
            continue;
        }
        ctx.set_fill_style_str(&rgba_css(category_color(&point.category), 0.85));
        ctx.begin_path();
        ctx.arc(sx, sy, 5.0, 0.0, std::f64::consts::TAU).ok();
        ctx.fill();
        ctx.set_stroke_style_str("rgba(255, 255, 255, 0.9)");
        ctx.set_line_width(1.0);
        ctx.stroke();
    }
}

fn draw_labels(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>, scene: &MapScene) {
    let view = frame.vp.visible_bounds(frame.w, frame.h);

    ctx.set_font("12px 'Inter', system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for feature in scene.features() {
        if !feature.bbox.intersects(&view) {
            continue;
        }
        let center = boromap_shared::LngLat::new(
            (feature.bbox.min_lng + feature.bbox.max_lng) / 2.0,
            (feature.bbox.min_lat + feature.bbox.max_lat) / 2.0,
        );
        let (sx, sy) = frame.vp.to_screen(center, frame.w, frame.h);

        ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
        ctx.set_line_width(3.0);
        let _ = ctx.stroke_text(&feature.name, sx, sy);
        ctx.set_fill_style_str("#33302c");
        let _ = ctx.fill_text(&feature.name, sx, sy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_css_formats_channels_and_alpha() {
        assert_eq!(rgba_css((0, 124, 191), 0.1), "rgba(0, 124, 191, 0.1)");
    }

    #[test]
    fn brighten_scales_and_saturates() {
        assert_eq!(brighten((100, 200, 250), 1.2), (120, 240, 255));
        assert_eq!(brighten((10, 10, 10), 1.0), (10, 10, 10));
    }
}
