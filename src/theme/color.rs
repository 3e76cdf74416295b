use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Colour palette used by the loader overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    // Base colors
    pub background: Color,

    // Text colors
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    pub border: Color,

    // Indicator colors
    pub success: Color,
    pub accent: Color,
}

impl ColorPalette {
    pub fn professional_dark() -> Self {
        Self {
            background: Color::Rgb(16, 16, 20),

            text_primary: Color::Rgb(224, 224, 230),
            text_secondary: Color::Rgb(160, 160, 168),
            text_muted: Color::Rgb(112, 112, 120),

            border: Color::Rgb(64, 64, 72),

            success: Color::Rgb(76, 175, 80),

            accent: Color::Rgb(88, 166, 255),
        }
    }

    pub fn professional_light() -> Self {
        Self {
            background: Color::Rgb(250, 250, 252),

            text_primary: Color::Rgb(32, 32, 40),
            text_secondary: Color::Rgb(96, 96, 104),
            text_muted: Color::Rgb(144, 144, 152),

            border: Color::Rgb(208, 208, 216),

            success: Color::Rgb(52, 199, 89),

            accent: Color::Rgb(0, 122, 255),
        }
    }

    pub fn gruvbox_dark() -> Self {
        Self {
            background: Color::Rgb(40, 40, 40),  // #282828 - dark0

            text_primary: Color::Rgb(235, 219, 178),   // #ebdbb2 - light1
            text_secondary: Color::Rgb(213, 196, 161), // #d5c4a1 - light2
            text_muted: Color::Rgb(189, 174, 147),     // #bdae93 - light3

            border: Color::Rgb(102, 92, 84), // #665c54 - dark4

            success: Color::Rgb(152, 151, 26), // #98971a - bright_green

            accent: Color::Rgb(250, 189, 47), // #fabd2f
        }
    }

    pub fn high_contrast() -> Self {
        Self {
            background: Color::Black,

            text_primary: Color::White,
            text_secondary: Color::Rgb(200, 200, 200),
            text_muted: Color::Rgb(160, 160, 160),

            border: Color::Rgb(128, 128, 128),

            success: Color::Green,

            accent: Color::Yellow,
        }
    }
}

/// Blend `color` toward `background` for a fade at the given opacity.
///
/// Only RGB colours can be interpolated; named colours snap to the
/// background once the opacity drops below one half.
pub fn fade(color: Color, background: Color, opacity: f64) -> Color {
    let opacity = opacity.clamp(0.0, 1.0);
    match (color, background) {
        (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => Color::Rgb(
            mix(br, r, opacity),
            mix(bg, g, opacity),
            mix(bb, b, opacity),
        ),
        _ if opacity < 0.5 => background,
        _ => color,
    }
}

fn mix(from: u8, to: u8, amount: f64) -> u8 {
    let value = from as f64 + (to as f64 - from as f64) * amount;
    value.round().clamp(0.0, 255.0) as u8
}
