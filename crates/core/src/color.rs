//! Category color allocation.
//!
//! Categories get colors from a fixed palette chosen for visual separation.
//! Once the palette is used up, new colors are generated on the HSL wheel as
//! far as possible from every hue already in use.

// Hue geometry is f64.
#![allow(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::many_single_char_names
)]

/// Palette handed out in order before any color is generated.
pub const PALETTE: [&str; 20] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9", "#F8B500", "#00CED1", "#FF8C94", "#A8E6CF", "#FFD3B6", "#6C5CE7",
    "#FD79A8", "#00B894", "#E17055", "#0984E3",
];

/// Default minimum hue separation for [`is_distinct`], in degrees.
pub const DEFAULT_MIN_HUE_DIFF: f64 = 30.0;

/// Step between candidate hues for generated colors, in degrees.
pub const HUE_STEP: u32 = 15;

const GENERATED_SATURATION: f64 = 65.0;
const GENERATED_LIGHTNESS: f64 = 55.0;

/// A color in HSL space. Hue in degrees `[0, 360)`, saturation and lightness
/// in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue in degrees.
    pub h: f64,
    /// Saturation in percent.
    pub s: f64,
    /// Lightness in percent.
    pub l: f64,
}

/// Picks the color for a new category.
///
/// Returns the first palette entry not present in `used` (compared
/// case-insensitively), or a generated color once all 20 are taken.
#[must_use]
pub fn next_color<S: AsRef<str>>(used: &[S]) -> String {
    PALETTE
        .iter()
        .find(|candidate| {
            !used
                .iter()
                .any(|u| u.as_ref().trim().eq_ignore_ascii_case(candidate))
        })
        .map_or_else(|| generate_distinct_color(used), |c| (*c).to_string())
}

/// Generates a color whose hue is as far as possible from every used hue.
///
/// Candidate hues are scanned in [`HUE_STEP`] increments; the one with the
/// largest minimum circular distance wins, ties going to the lowest hue.
/// Unparseable entries in `used` are ignored.
#[must_use]
pub fn generate_distinct_color<S: AsRef<str>>(used: &[S]) -> String {
    let used_hues: Vec<f64> = used.iter().filter_map(|c| hue_of(c.as_ref())).collect();

    let mut best_hue = 0.0;
    let mut best_distance = f64::NEG_INFINITY;
    for step in 0..(360 / HUE_STEP) {
        let hue = f64::from(step * HUE_STEP);
        let distance = used_hues
            .iter()
            .map(|h| hue_distance(hue, *h))
            .fold(f64::INFINITY, f64::min);
        if distance > best_distance {
            best_distance = distance;
            best_hue = hue;
        }
    }

    hsl_to_hex(Hsl {
        h: best_hue,
        s: GENERATED_SATURATION,
        l: GENERATED_LIGHTNESS,
    })
}

/// Returns false if any color in `existing` has a hue within `min_hue_diff`
/// degrees of `color`.
///
/// An unparseable `color` is never distinct; unparseable entries in
/// `existing` are skipped.
#[must_use]
pub fn is_distinct<S: AsRef<str>>(color: &str, existing: &[S], min_hue_diff: f64) -> bool {
    let Some(hue) = hue_of(color) else {
        return false;
    };
    existing
        .iter()
        .filter_map(|c| hue_of(c.as_ref()))
        .all(|other| hue_distance(hue, other) >= min_hue_diff)
}

/// Circular distance between two hues, in degrees.
#[must_use]
pub fn hue_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    diff.min(360.0 - diff)
}

/// Hue of a `#RRGGBB` (or `RRGGBB`) color.
#[must_use]
pub fn hue_of(hex: &str) -> Option<f64> {
    hex_to_hsl(hex).map(|c| c.h)
}

/// Parses a `#RRGGBB` color into HSL.
#[must_use]
pub fn hex_to_hsl(hex: &str) -> Option<Hsl> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    let (r, g, b) = (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    );

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;

    if delta.abs() < f64::EPSILON {
        return Some(Hsl {
            h: 0.0,
            s: 0.0,
            l: l * 100.0,
        });
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let sector = if (max - r).abs() < f64::EPSILON {
        ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    let h = sector * 60.0;

    Some(Hsl {
        h: h.rem_euclid(360.0),
        s: s * 100.0,
        l: l * 100.0,
    })
}

/// Renders an HSL color as uppercase `#RRGGBB`.
#[must_use]
pub fn hsl_to_hex(color: Hsl) -> String {
    let h = color.h.rem_euclid(360.0);
    let s = (color.s / 100.0).clamp(0.0, 1.0);
    let l = (color.l / 100.0).clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02X}{:02X}{:02X}", to_byte(r), to_byte(g), to_byte(b))
}
