//! Named chart styles and color lookup

use plotters::style::RGBColor;

/// Plain RGB triple, converted to a plotters color when drawing
pub type Rgb = (u8, u8, u8);

pub fn to_rgb_color((r, g, b): Rgb) -> RGBColor {
    RGBColor(r, g, b)
}

/// Colors of a built-in chart style
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub name: String,
    pub background: Rgb,
    pub up: Rgb,
    pub down: Rgb,
    pub axis_label: Rgb,
    /// Opacity of the volume bars
    pub volume_alpha: f64,
}

impl ChartStyle {
    pub fn yahoo() -> Self {
        Self {
            name: "yahoo".to_string(),
            background: (255, 255, 255),
            up: (0, 176, 96),
            down: (254, 48, 50),
            axis_label: (60, 60, 60),
            volume_alpha: 0.7,
        }
    }

    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            background: (255, 255, 255),
            up: (255, 255, 255),
            down: (0, 0, 0),
            axis_label: (0, 0, 0),
            volume_alpha: 1.0,
        }
    }

    /// Look up a built-in style by name
    pub fn named(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "yahoo" => Some(Self::yahoo()),
            "classic" => Some(Self::classic()),
            _ => None,
        }
    }
}

/// Resolve a color name, single-letter shorthand, or `#rrggbb` hex string
pub fn parse_color(name: &str) -> Option<Rgb> {
    let name = name.trim().to_lowercase();

    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some((channel(0)?, channel(2)?, channel(4)?));
    }

    let rgb = match name.as_str() {
        "red" | "r" => (255, 0, 0),
        "green" | "g" => (0, 128, 0),
        "blue" | "b" => (0, 0, 255),
        "black" | "k" => (0, 0, 0),
        "white" | "w" => (255, 255, 255),
        "cyan" | "c" => (0, 191, 191),
        "magenta" | "m" => (191, 0, 191),
        "yellow" | "y" => (191, 191, 0),
        "gray" | "grey" => (128, 128, 128),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        "brown" => (165, 42, 42),
        "pink" => (255, 192, 203),
        "olive" => (128, 128, 0),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "lime" => (0, 255, 0),
        "gold" => (255, 215, 0),
        _ => return None,
    };
    Some(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_shorthand_colors() {
        assert_eq!(parse_color("purple"), Some((128, 0, 128)));
        assert_eq!(parse_color(" Blue "), Some((0, 0, 255)));
        assert_eq!(parse_color("k"), Some((0, 0, 0)));
        assert_eq!(parse_color("gray"), parse_color("grey"));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_color("#00b060"), Some((0, 176, 96)));
        assert_eq!(parse_color("#FFF"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("#aéaaa"), None);
        assert_eq!(parse_color("#+1+1+1"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_style_lookup() {
        assert_eq!(ChartStyle::named("Yahoo").map(|s| s.name), Some("yahoo".to_string()));
        assert!(ChartStyle::named("nightclouds").is_none());
    }
}
