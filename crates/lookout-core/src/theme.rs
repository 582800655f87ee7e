//! Theme resolution.
//!
//! A theme maps the semantic color roles used by every widget to concrete
//! terminal colors. Widgets only read the theme; the host swaps it as a whole
//! on a theme-switch event and forces a re-render.

use ratatui::style::Color;
use serde_json::{Map, Value};
use tracing::warn;

/// Names of the built-in presets, in cycle order.
pub const PRESETS: [&str; 4] = ["default", "dark", "light", "ocean"];

/// Semantic color roles shared by all widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Preset or user-supplied theme name.
    pub name: String,
    /// Accent color for primary content.
    pub primary: Color,
    /// Accent color for secondary content.
    pub secondary: Color,
    /// Widget border color.
    pub border: Color,
    /// Default foreground.
    pub fg: Color,
    /// Default background.
    pub bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            primary: Color::Cyan,
            secondary: Color::Yellow,
            border: Color::DarkGray,
            fg: Color::White,
            bg: Color::Reset,
        }
    }
}

impl Theme {
    /// Look up a built-in preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "dark" => Some(Self {
                name: "dark".to_string(),
                primary: Color::Blue,
                secondary: Color::Magenta,
                border: Color::Gray,
                fg: Color::Gray,
                bg: Color::Reset,
            }),
            "light" => Some(Self {
                name: "light".to_string(),
                primary: Color::Blue,
                secondary: Color::Red,
                border: Color::Black,
                fg: Color::Black,
                bg: Color::White,
            }),
            "ocean" => Some(Self {
                name: "ocean".to_string(),
                primary: Color::Cyan,
                secondary: Color::LightBlue,
                border: Color::Blue,
                fg: Color::White,
                bg: Color::Reset,
            }),
            _ => None,
        }
    }

    /// Preset lookup that warns and falls back to the default theme.
    #[must_use]
    pub fn preset_or_default(name: &str) -> Self {
        Self::preset(name).unwrap_or_else(|| {
            warn!(theme = name, "unknown theme preset, using default");
            Self::default()
        })
    }

    /// Build a theme from an inline role -> color-name mapping.
    ///
    /// Unknown roles are ignored; unknown color names keep the role's
    /// default with a warning.
    #[must_use]
    pub fn from_roles(name: impl Into<String>, roles: &Map<String, Value>) -> Self {
        let mut theme = Self {
            name: name.into(),
            ..Self::default()
        };
        for (role, value) in roles {
            let Some(text) = value.as_str() else {
                warn!(role = %role, "theme role value is not a string, keeping default");
                continue;
            };
            let Some(color) = parse_color(text) else {
                warn!(role = %role, color = text, "unknown color name, keeping default");
                continue;
            };
            match role.as_str() {
                "primary" => theme.primary = color,
                "secondary" => theme.secondary = color,
                "border" => theme.border = color,
                "fg" => theme.fg = color,
                "bg" => theme.bg = color,
                _ => warn!(role = %role, "unknown theme role, ignoring"),
            }
        }
        theme
    }
}

/// Parse a color name or `#rrggbb` literal.
#[must_use]
pub fn parse_color(name: &str) -> Option<Color> {
    let lower = name.trim().to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix('#') {
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Color::Rgb(r, g, b));
        }
        return None;
    }
    match lower.as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "white" => Some(Color::White),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        "reset" => Some(Color::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_presets_resolve() {
        for name in PRESETS {
            let theme = Theme::preset(name).expect("preset");
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let theme = Theme::preset_or_default("solarized-disco");
        assert_eq!(theme.name, "default");
    }

    #[test]
    fn test_inline_roles() {
        let roles = match json!({ "primary": "green", "border": "#336699", "bg": "reset" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let theme = Theme::from_roles("custom", &roles);
        assert_eq!(theme.primary, Color::Green);
        assert_eq!(theme.border, Color::Rgb(0x33, 0x66, 0x99));
        // unspecified roles keep defaults
        assert_eq!(theme.secondary, Theme::default().secondary);
    }

    #[test]
    fn test_bad_color_name_keeps_default() {
        let roles = match json!({ "primary": "chartreuse-ish" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let theme = Theme::from_roles("custom", &roles);
        assert_eq!(theme.primary, Theme::default().primary);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("Cyan"), Some(Color::Cyan));
        assert_eq!(parse_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_color("#ff00"), None);
        assert_eq!(parse_color("mauve"), None);
    }
}
