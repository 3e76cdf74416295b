pub mod color;

use ratatui::style::Style;
use serde::{Deserialize, Serialize};

pub use color::{fade, ColorPalette};

/// Named colour theme for the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub palette: ColorPalette,
}

impl Theme {
    /// Clean, minimalistic dark theme
    pub fn professional_dark() -> Self {
        Self {
            name: "professional-dark".to_string(),
            palette: ColorPalette::professional_dark(),
        }
    }

    /// Clean, minimalistic light theme
    pub fn professional_light() -> Self {
        Self {
            name: "professional-light".to_string(),
            palette: ColorPalette::professional_light(),
        }
    }

    /// Retro groove dark theme with warm, earthy colors
    pub fn gruvbox_dark() -> Self {
        Self {
            name: "gruvbox-dark".to_string(),
            palette: ColorPalette::gruvbox_dark(),
        }
    }

    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast".to_string(),
            palette: ColorPalette::high_contrast(),
        }
    }

    pub fn available() -> Vec<Theme> {
        vec![
            Self::gruvbox_dark(),
            Self::professional_dark(),
            Self::professional_light(),
            Self::high_contrast(),
        ]
    }

    /// Look up a theme by name, case-insensitively
    pub fn by_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase().replace([' ', '_'], "-");
        Self::available().into_iter().find(|theme| theme.name == wanted)
    }

    /// Foreground style faded toward the background
    pub fn faded(&self, color: ratatui::style::Color, opacity: f64) -> Style {
        Style::default().fg(fade(color, self.palette.background, opacity))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::gruvbox_dark()
    }
}
