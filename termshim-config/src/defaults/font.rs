//! Default values for font metrics.

pub fn font_size() -> f32 {
    15.0
}

pub fn font_family() -> String {
    "monospace".to_string()
}

pub fn line_height() -> f32 {
    1.0
}

pub fn letter_spacing() -> f32 {
    0.0
}
