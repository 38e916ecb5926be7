/// Deterministic marker color for a crime category.
///
/// CRC32 of the normalized category name picks a hue; saturation and
/// lightness are fixed so every category reads against the base map.
pub fn category_color(category: &str) -> (u8, u8, u8) {
    let normalized = category.trim().to_uppercase();
    let hash = crc32fast::hash(normalized.as_bytes());
    let hue = (hash % 360) as f64;
    hsl_to_rgb(hue, 0.65, 0.5)
}

/// Convert HSL (h: 0..360, s: 0..1, l: 0..1) to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    let h = h / 360.0;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::{category_color, hsl_to_rgb};

    #[test]
    fn hsl_to_rgb_pure_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }

    #[test]
    fn hsl_to_rgb_zero_saturation_is_gray() {
        assert_eq!(hsl_to_rgb(123.0, 0.0, 0.5), (128, 128, 128));
    }

    #[test]
    fn category_color_is_deterministic() {
        assert_eq!(category_color("ROBBERY"), category_color("ROBBERY"));
    }

    #[test]
    fn category_color_normalizes_case_and_whitespace() {
        assert_eq!(category_color("Robbery"), category_color(" ROBBERY "));
    }

    #[test]
    fn category_color_varies_for_different_categories() {
        assert_ne!(category_color("ROBBERY"), category_color("GRAND LARCENY"));
    }

    #[test]
    fn category_color_is_never_gray() {
        let (r, g, b) = category_color("FELONY ASSAULT");
        assert!(r != g || g != b);
    }
}
