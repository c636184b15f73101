//! Color quadrants and angle normalization

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LockError;

/// One of the six 60° arcs of the dial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl Color {
    /// All colors in arc order, starting at red
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
    ];

    /// Lowercase name, as serialized
    pub fn name(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Orange => "orange",
        }
    }

    /// Arc bounds in degrees, inclusive start, exclusive end.
    /// Red wraps: (330, 30).
    pub fn arc(&self) -> (u32, u32) {
        match self {
            Color::Red => (330, 30),
            Color::Blue => (30, 90),
            Color::Green => (90, 150),
            Color::Yellow => (150, 210),
            Color::Purple => (210, 270),
            Color::Orange => (270, 330),
        }
    }

    /// Center of the arc, handy for simulated input
    pub fn center(&self) -> f64 {
        match self {
            Color::Red => 0.0,
            other => {
                let (start, end) = other.arc();
                (start + end) as f64 / 2.0
            }
        }
    }

    /// ANSI color code for terminal display
    pub fn ansi_code(&self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Blue => "\x1b[34m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Purple => "\x1b[35m",
            Color::Orange => "\x1b[38;5;208m",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Color {
    type Err = LockError;

    /// Exact, case-sensitive match on the lowercase name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| LockError::UnknownColor(s.to_string()))
    }
}

/// Fold any finite angle into [0, 360). Non-finite input yields `None`.
pub fn normalize_angle(angle: f64) -> Option<f64> {
    if !angle.is_finite() {
        return None;
    }
    let normalized = ((angle % 360.0) + 360.0) % 360.0;
    // Tiny negative values can round up to exactly 360.0
    if normalized >= 360.0 {
        Some(0.0)
    } else {
        Some(normalized)
    }
}

/// Map an angle to its color quadrant
pub fn quadrant_of(angle: f64) -> Option<Color> {
    let a = normalize_angle(angle)?;
    let color = if a >= 330.0 || a < 30.0 {
        Color::Red
    } else if a < 90.0 {
        Color::Blue
    } else if a < 150.0 {
        Color::Green
    } else if a < 210.0 {
        Color::Yellow
    } else if a < 270.0 {
        Color::Purple
    } else {
        Color::Orange
    };
    Some(color)
}

/// Render a sequence as `red, blue, ...`
pub fn format_sequence(colors: &[Color]) -> String {
    colors
        .iter()
        .map(Color::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seam_boundaries() {
        assert_eq!(quadrant_of(329.0), Some(Color::Orange));
        assert_eq!(quadrant_of(330.0), Some(Color::Red));
        assert_eq!(quadrant_of(29.0), Some(Color::Red));
        assert_eq!(quadrant_of(30.0), Some(Color::Blue));
        assert_eq!(quadrant_of(89.0), Some(Color::Blue));
        assert_eq!(quadrant_of(90.0), Some(Color::Green));
        assert_eq!(quadrant_of(150.0), Some(Color::Yellow));
        assert_eq!(quadrant_of(210.0), Some(Color::Purple));
        assert_eq!(quadrant_of(270.0), Some(Color::Orange));
    }

    #[test]
    fn test_out_of_range_angles_wrap() {
        assert_eq!(quadrant_of(360.0), Some(Color::Red));
        assert_eq!(quadrant_of(-30.0), Some(Color::Orange));
        assert_eq!(quadrant_of(-1.0), Some(Color::Red));
        assert_eq!(quadrant_of(750.0), Some(Color::Blue));
    }

    #[test]
    fn test_non_finite_has_no_quadrant() {
        assert_eq!(quadrant_of(f64::NAN), None);
        assert_eq!(quadrant_of(f64::INFINITY), None);
        assert_eq!(quadrant_of(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_tiny_negative_normalizes_into_range() {
        let a = normalize_angle(-1e-14).unwrap();
        assert!((0.0..360.0).contains(&a));
    }

    #[test]
    fn test_center_lies_in_own_arc() {
        for color in Color::ALL {
            assert_eq!(quadrant_of(color.center()), Some(color));
        }
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::Red);
        assert!("Red".parse::<Color>().is_err());
        assert!("pink".parse::<Color>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Color::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
    }
}
