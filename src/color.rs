use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Category colours
// ---------------------------------------------------------------------------

/// Hue step between consecutive categories, in degrees (golden angle).
const HUE_STEP: f32 = 137.508;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

/// Colour for the `i`-th category. Earlier colours do not change when more
/// categories are added.
pub fn category_colour(i: usize) -> Color32 {
    let hue = (i as f32 * HUE_STEP) % 360.0;
    // Alternate lightness so neighbouring hues stay apart on long lists.
    let lightness = if i % 2 == 0 { 0.55 } else { 0.45 };
    hsl_to_color32(hue, 0.65, lightness)
}

/// Assigns each category value a colour by its sorted position.
pub fn category_colours<'a>(
    values: impl IntoIterator<Item = &'a CellValue>,
) -> BTreeMap<CellValue, Color32> {
    let mut sorted: Vec<&CellValue> = values.into_iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), category_colour(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_are_distinct_for_a_typical_category_count() {
        let unique: std::collections::BTreeSet<_> =
            (0..12).map(|i| category_colour(i).to_array()).collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn mapping_is_keyed_by_sorted_value() {
        let a = CellValue::text("商船學系");
        let b = CellValue::text("航運管理學系");
        let colours = category_colours([&b, &a, &b]);
        assert_eq!(colours.len(), 2);
        let lowest = a.clone().min(b.clone());
        let highest = a.max(b);
        assert_eq!(colours[&lowest], category_colour(0));
        assert_eq!(colours[&highest], category_colour(1));
    }
}
