//! Highlight colours
//!
//! Colours are stored and compared in one canonical form: the CSS serialized
//! `rgb(r, g, b)` / `rgba(r, g, b, a)` string. Hex tokens from the palette or
//! from imported data are normalized on the way in.

use std::fmt;
use std::str::FromStr;

/// The five selectable highlight colours, in cycling order
pub const PALETTE: [&str; 5] = ["#87CEEB80", "#98FB9880", "#FFFF0080", "#FFA50080", "#FF69B480"];

#[derive(Debug, thiserror::Error)]
#[error("Unrecognized color: {0}")]
pub struct ColorError(String);

/// An 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let parsed = if let Some(hex) = input.strip_prefix('#') {
            parse_hex(hex)
        } else if let Some(body) = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))
        {
            body.strip_suffix(')').and_then(parse_functional)
        } else {
            None
        };
        parsed.ok_or_else(|| ColorError(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match hex.len() {
        3 | 4 => {
            let expand = |v: u8| v * 17;
            Some(Rgba {
                r: expand(nibble(0)?),
                g: expand(nibble(1)?),
                b: expand(nibble(2)?),
                a: if hex.len() == 4 { expand(nibble(3)?) } else { 255 },
            })
        }
        6 | 8 => Some(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { byte(6)? } else { 255 },
        }),
        _ => None,
    }
}

/// `r, g, b[, a]` or `r g b[ / a]`
fn parse_functional(body: &str) -> Option<Rgba> {
    let parts: Vec<&str> = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |part: &str| -> Option<u8> {
        let value: f64 = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? * 255.0 / 100.0,
            None => part.parse().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = |part: &str| -> Option<u8> {
        let value: f64 = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? / 100.0,
            None => part.parse().ok()?,
        };
        Some((value.clamp(0.0, 1.0) * 255.0).round() as u8)
    };

    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: match parts.get(3) {
            Some(part) => alpha(part)?,
            None => 255,
        },
    })
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            return write!(f, "rgb({}, {}, {})", self.r, self.g, self.b);
        }
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            format_alpha(self.a)
        )
    }
}

/// Shortest decimal (two places, else three) that maps back to the same byte
fn format_alpha(a: u8) -> String {
    let value = a as f64 / 255.0;
    let two = (value * 100.0).round() / 100.0;
    let chosen = if (two * 255.0).round() as u8 == a {
        format!("{:.2}", two)
    } else {
        format!("{:.3}", value)
    };
    let trimmed = chosen.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Canonical form of a colour token; unparseable input is kept trimmed but
/// otherwise verbatim
pub fn normalize_color(color: &str) -> String {
    match color.parse::<Rgba>() {
        Ok(rgba) => rgba.to_string(),
        Err(_) => color.trim().to_string(),
    }
}

/// Whether two tokens denote the same colour
pub fn same_color(a: &str, b: &str) -> bool {
    normalize_color(a) == normalize_color(b)
}

/// Palette position of a colour, compared in canonical form
pub fn palette_index(color: &str) -> Option<usize> {
    let wanted = normalize_color(color);
    PALETTE
        .iter()
        .position(|entry| normalize_color(entry) == wanted)
}

/// Canonical palette colour at `index`, wrapping around
pub fn palette_color(index: usize) -> String {
    normalize_color(PALETTE[index % PALETTE.len()])
}

/// Canonical form of the first palette entry
pub fn default_color() -> String {
    palette_color(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_normalizes_to_rgba() {
        assert_eq!(normalize_color("#87CEEB80"), "rgba(135, 206, 235, 0.5)");
        assert_eq!(normalize_color("#FFFF0080"), "rgba(255, 255, 0, 0.5)");
    }

    #[test]
    fn test_equivalent_spellings_compare_equal() {
        assert!(same_color("#87ceeb80", "rgba(135, 206, 235, 0.5)"));
        assert!(same_color("rgb(255 165 0 / 50%)", "#FFA50080"));
        assert!(same_color("#fff", "rgb(255, 255, 255)"));
        assert!(!same_color("#fff", "#000"));
    }

    #[test]
    fn test_alpha_uses_three_places_when_needed() {
        let rgba = Rgba { r: 0, g: 0, b: 0, a: 1 };
        assert_eq!(rgba.to_string(), "rgba(0, 0, 0, 0.004)");
        let rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };
        assert_eq!(rgba.to_string(), "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn test_palette_lookup() {
        assert_eq!(palette_index("rgba(152, 251, 152, 0.5)"), Some(1));
        assert_eq!(palette_index("#FF69B480"), Some(4));
        assert_eq!(palette_index("hotpink"), None);
        assert_eq!(palette_color(5), default_color());
    }

    #[test]
    fn test_unparseable_colors_kept_verbatim() {
        assert_eq!(normalize_color("  yellow "), "yellow");
        assert!("#12345".parse::<Rgba>().is_err());
    }
}
