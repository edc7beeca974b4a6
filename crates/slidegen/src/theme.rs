//! Built-in presentation themes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::SlidegenError;

pub const DEFAULT_THEME_ID: &str = "corporate_blue";

/// 24-bit sRGB color. Serializes as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hex digits without a leading `#`, as DrawingML expects.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeColors {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub background: Color,
    pub text: Color,
}

/// Font sizes are in points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Typography {
    pub font_family: String,
    pub title_size: u32,
    pub subtitle_size: u32,
    pub heading_size: u32,
    pub body_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub description: String,
    pub colors: ThemeColors,
    pub typography: Typography,
}

struct ThemeDef {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    colors: [Color; 5],
    font_family: &'static str,
    sizes: [u32; 4],
}

const BUILTIN_THEMES: &[ThemeDef] = &[
    ThemeDef {
        id: "corporate_blue",
        name: "Corporate Blue",
        description: "Professional navy and sky blue on white",
        colors: [
            Color::rgb(0x1F, 0x4E, 0x79),
            Color::rgb(0x2E, 0x75, 0xB6),
            Color::rgb(0xF4, 0xB1, 0x83),
            Color::rgb(0xFF, 0xFF, 0xFF),
            Color::rgb(0x26, 0x26, 0x26),
        ],
        font_family: "Calibri",
        sizes: [44, 24, 32, 20],
    },
    ThemeDef {
        id: "modern_dark",
        name: "Modern Dark",
        description: "High-contrast light text on charcoal",
        colors: [
            Color::rgb(0x00, 0xD4, 0xFF),
            Color::rgb(0x9C, 0xA3, 0xAF),
            Color::rgb(0xFF, 0x6B, 0x6B),
            Color::rgb(0x1E, 0x1E, 0x2E),
            Color::rgb(0xF5, 0xF5, 0xF5),
        ],
        font_family: "Segoe UI",
        sizes: [44, 24, 32, 20],
    },
    ThemeDef {
        id: "minimal_light",
        name: "Minimal Light",
        description: "Understated greys with generous whitespace",
        colors: [
            Color::rgb(0x33, 0x33, 0x33),
            Color::rgb(0x75, 0x75, 0x75),
            Color::rgb(0x00, 0x96, 0x88),
            Color::rgb(0xFA, 0xFA, 0xFA),
            Color::rgb(0x42, 0x42, 0x42),
        ],
        font_family: "Helvetica Neue",
        sizes: [40, 22, 30, 18],
    },
    ThemeDef {
        id: "vibrant_creative",
        name: "Vibrant Creative",
        description: "Bold magenta and orange for creative talks",
        colors: [
            Color::rgb(0xC2, 0x18, 0x5B),
            Color::rgb(0xFF, 0x6F, 0x00),
            Color::rgb(0xFF, 0xD6, 0x00),
            Color::rgb(0xFF, 0xF8, 0xF0),
            Color::rgb(0x21, 0x21, 0x21),
        ],
        font_family: "Montserrat",
        sizes: [46, 24, 34, 20],
    },
    ThemeDef {
        id: "nature_green",
        name: "Nature Green",
        description: "Forest and leaf greens on a warm background",
        colors: [
            Color::rgb(0x2E, 0x7D, 0x32),
            Color::rgb(0x66, 0xBB, 0x6A),
            Color::rgb(0x8D, 0x6E, 0x63),
            Color::rgb(0xF1, 0xF8, 0xE9),
            Color::rgb(0x1B, 0x33, 0x1C),
        ],
        font_family: "Georgia",
        sizes: [42, 24, 32, 20],
    },
    ThemeDef {
        id: "elegant_purple",
        name: "Elegant Purple",
        description: "Deep purple with gold accents",
        colors: [
            Color::rgb(0x4A, 0x14, 0x8C),
            Color::rgb(0x7B, 0x1F, 0xA2),
            Color::rgb(0xD4, 0xAF, 0x37),
            Color::rgb(0xFD, 0xFB, 0xFF),
            Color::rgb(0x2D, 0x2D, 0x2D),
        ],
        font_family: "Garamond",
        sizes: [44, 24, 32, 20],
    },
];

impl From<&ThemeDef> for Theme {
    fn from(def: &ThemeDef) -> Self {
        let [primary, secondary, accent, background, text] = def.colors;
        let [title_size, subtitle_size, heading_size, body_size] = def.sizes;
        Self {
            id: def.id.to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            colors: ThemeColors {
                primary,
                secondary,
                accent,
                background,
                text,
            },
            typography: Typography {
                font_family: def.font_family.to_string(),
                title_size,
                subtitle_size,
                heading_size,
                body_size,
            },
        }
    }
}

/// Read-only theme lookup, built once at startup.
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: BTreeMap<String, Theme>,
    default_id: String,
}

impl ThemeRegistry {
    pub fn builtin() -> Self {
        let themes = BUILTIN_THEMES
            .iter()
            .map(|def| (def.id.to_string(), Theme::from(def)))
            .collect();
        Self {
            themes,
            default_id: DEFAULT_THEME_ID.to_string(),
        }
    }

    /// Built-in themes with a different fallback for requests that name no
    /// theme.
    pub fn with_default(default_id: &str) -> Result<Self, SlidegenError> {
        let mut registry = Self::builtin();
        if !registry.contains(default_id) {
            return Err(SlidegenError::UnknownTheme(default_id.to_string()));
        }
        registry.default_id = default_id.to_string();
        Ok(registry)
    }

    pub fn list(&self) -> &BTreeMap<String, Theme> {
        &self.themes
    }

    pub fn get(&self, id: &str) -> Result<&Theme, SlidegenError> {
        self.themes
            .get(id)
            .ok_or_else(|| SlidegenError::UnknownTheme(id.to_string()))
    }

    /// Looks up `id`, or the default theme when none is given. An explicit
    /// but unknown id is an error, never a silent fallback.
    pub fn resolve(&self, id: Option<&str>) -> Result<&Theme, SlidegenError> {
        self.get(id.unwrap_or(&self.default_id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.themes.contains_key(id)
    }

    pub fn default_theme_id(&self) -> &str {
        &self.default_id
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
