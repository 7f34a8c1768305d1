use bevy::prelude::*;

/// Warm off-white text for dark backgrounds
pub const LABEL_TEXT: Color = Color::srgb(0.867, 0.847, 0.780);

/// #f2c94c
pub const HEADER_TEXT: Color = Color::srgb(0.949, 0.788, 0.298);

/// Near-white text for buttons
pub const BUTTON_TEXT: Color = Color::srgb(0.925, 0.925, 0.925);
/// #3d2e59
pub const BUTTON_BACKGROUND: Color = Color::srgb(0.239, 0.180, 0.349);
/// #5c4687
pub const BUTTON_HOVERED_BACKGROUND: Color = Color::srgb(0.361, 0.275, 0.529);
/// #241b36
pub const BUTTON_PRESSED_BACKGROUND: Color = Color::srgb(0.141, 0.106, 0.212);
