use serde::{Deserialize, Serialize};

use crate::config;

/// Small value object, replaced wholesale on selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub bg_color: String,
    pub ui_color: String,
    pub is_dark: bool,
    pub text_color: String,
    pub accent_color: String,
}

impl ThemeConfig {
    /// Theme for a picked background color. Pastel backgrounds get dark
    /// chrome and black text; dark backgrounds the inverse.
    pub fn for_color(color: &str, is_pastel: bool) -> Self {
        if is_pastel {
            Self {
                bg_color: color.to_string(),
                ui_color: config::UI_COLOR_FOR_PASTEL.to_string(),
                is_dark: false,
                text_color: "#000000".to_string(),
                accent_color: color.to_string(),
            }
        } else {
            Self {
                bg_color: color.to_string(),
                ui_color: config::UI_COLOR_FOR_DARK.to_string(),
                is_dark: true,
                text_color: "#FFFFFF".to_string(),
                accent_color: "#FFFFFF".to_string(),
            }
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            bg_color: config::DARK_COLORS[0].to_string(),
            ui_color: config::UI_COLOR_FOR_DARK.to_string(),
            is_dark: true,
            text_color: "#FFFFFF".to_string(),
            accent_color: config::DEFAULT_ACCENT.to_string(),
        }
    }
}
