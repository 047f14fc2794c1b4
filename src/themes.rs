//! Color themes for the rendered page.
//!
//! Each theme is a display name plus the CSS custom properties emitted into
//! the page's `:root` block. Every theme defines the same 17 variables, so the
//! stylesheet can rely on all of them being present.

use tracing::warn;

/// A named palette.
#[derive(Debug, PartialEq, Eq)]
pub struct Theme {
    /// Lookup key used in configuration.
    pub key: &'static str,
    /// Human-readable name shown in the title and footer.
    pub name: &'static str,
    /// `(variable, value)` pairs without the leading `--`.
    pub vars: [(&'static str, &'static str); 17],
}

pub const DEFAULT_THEME: &str = "default";

pub static THEMES: [Theme; 4] = [
    Theme {
        key: "default",
        name: "浅蓝色调的烂大街配色",
        vars: [
            ("primary-color", "#1e90ff"),
            ("primary-light", "rgba(30, 144, 255, 0.2)"),
            ("primary-dark", "#0066cc"),
            ("secondary-color", "#ffffff"),
            ("bg-color", "#e6f2ff"),
            ("card-bg", "rgba(255, 255, 255, 0.9)"),
            ("text-color", "#333"),
            ("text-light", "#666"),
            ("border-color", "rgba(30, 144, 255, 0.3)"),
            ("highlight-color", "#ffcc00"),
            ("success-color", "#2ecc71"),
            ("danger-color", "#ff4757"),
            ("warning-color", "#f39c12"),
            ("shadow", "0 4px 12px rgba(30, 144, 255, 0.2)"),
            ("transition", "all 0.3s ease"),
            ("bg-image", "none"),
            ("header-bg", "transparent"),
        ],
    },
    Theme {
        key: "dark",
        name: "Do U like van 游戏",
        vars: [
            ("primary-color", "#8a2be2"),
            ("primary-light", "rgba(138, 43, 226, 0.2)"),
            ("primary-dark", "#5f1e9e"),
            ("secondary-color", "#ffffff"),
            ("bg-color", "#121212"),
            ("card-bg", "#1e1e1e"),
            ("text-color", "#e0e0e0"),
            ("text-light", "#b0b0b0"),
            ("border-color", "#333"),
            ("highlight-color", "#ff9f1c"),
            ("success-color", "#2ecc71"),
            ("danger-color", "#ff4757"),
            ("warning-color", "#f39c12"),
            ("shadow", "0 4px 12px rgba(0, 0, 0, 0.4)"),
            ("transition", "all 0.3s ease"),
            ("bg-image", "linear-gradient(135deg, #121212 0%, #2d2d2d 100%)"),
            ("header-bg", "rgba(30, 30, 30, 0.7)"),
        ],
    },
    Theme {
        key: "green",
        name: "原谅绿",
        vars: [
            ("primary-color", "#2e8b57"),
            ("primary-light", "rgba(46, 139, 87, 0.2)"),
            ("primary-dark", "#1f6f42"),
            ("secondary-color", "#ffffff"),
            ("bg-color", "#f5fef5"),
            ("card-bg", "rgba(255, 255, 255, 0.95)"),
            ("text-color", "#2d3748"),
            ("text-light", "#4a5568"),
            ("border-color", "rgba(46, 139, 87, 0.3)"),
            ("highlight-color", "#f6ad55"),
            ("success-color", "#38a169"),
            ("danger-color", "#e53e3e"),
            ("warning-color", "#dd6b20"),
            ("shadow", "0 4px 12px rgba(46, 139, 87, 0.1)"),
            ("transition", "all 0.3s ease"),
            ("bg-image", "linear-gradient(135deg, #f5fef5 0%, #e6ffed 100%)"),
            ("header-bg", "rgba(245, 254, 245, 0.9)"),
        ],
    },
    Theme {
        key: "classic",
        name: "苦来兮苦（经典咖啡色）",
        vars: [
            ("primary-color", "#6d4c41"),
            ("primary-light", "rgba(109, 76, 65, 0.2)"),
            ("primary-dark", "#4e342e"),
            ("secondary-color", "#ffffff"),
            ("bg-color", "#f5f5f5"),
            ("card-bg", "rgba(255, 255, 255, 0.95)"),
            ("text-color", "#3e2723"),
            ("text-light", "#5d4037"),
            ("border-color", "rgba(109, 76, 65, 0.3)"),
            ("highlight-color", "#8d6e63"),
            ("success-color", "#689f38"),
            ("danger-color", "#d32f2f"),
            ("warning-color", "#f57c00"),
            ("shadow", "0 4px 12px rgba(109, 76, 65, 0.1)"),
            ("transition", "all 0.3s ease"),
            ("bg-image", "linear-gradient(135deg, #f5f5f5 0%, #efebe9 100%)"),
            ("header-bg", "rgba(245, 245, 245, 0.9)"),
        ],
    },
];

/// Look up a theme by key, falling back to the default palette.
pub fn get_theme(key: &str) -> &'static Theme {
    match THEMES.iter().find(|t| t.key == key) {
        Some(theme) => theme,
        None => {
            warn!(requested = key, fallback = DEFAULT_THEME, "Unknown theme; using default");
            &THEMES[0]
        }
    }
}
