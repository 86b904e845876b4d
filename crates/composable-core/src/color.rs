use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Vec2;

/// Four normalized channels. Immutable: a change is a new `Color`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

    const fn rgba(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Clamps each channel into `[0, 1]`; NaN becomes 0. The named constants
    /// and `random_opaque` are already in range and skip this.
    pub fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        fn clamp(v: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
        }
        Self::rgba(clamp(red), clamp(green), clamp(blue), clamp(alpha))
    }

    pub fn from_rgb(red: f32, green: f32, blue: f32) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// `#RRGGBB` or `#RRGGBBAA`. Malformed input yields opaque black.
    pub fn from_hex(hex: &str) -> Self {
        let s = hex.trim_start_matches('#');
        let byte = |i: usize| {
            s.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
        };
        match s.len() {
            6 => match (byte(0), byte(2), byte(4)) {
                (Some(r), Some(g), Some(b)) => Self::from_rgba8(r, g, b, 255),
                _ => Self::BLACK,
            },
            8 => match (byte(0), byte(2), byte(4), byte(6)) {
                (Some(r), Some(g), Some(b), Some(a)) => Self::from_rgba8(r, g, b, a),
                _ => Self::BLACK,
            },
            _ => Self::BLACK,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self::new(self.red, self.green, self.blue, alpha)
    }

    /// Uniformly random red, green and blue; alpha is 1.
    pub fn random_opaque<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::rgba(rng.r#gen::<f32>(), rng.r#gen::<f32>(), rng.r#gen::<f32>(), 1.0)
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.red), q(self.green), q(self.blue), q(self.alpha)]
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Self::rgba(
            self.red + (other.red - self.red) * t,
            self.green + (other.green - self.green) * t,
            self.blue + (other.blue - self.blue) * t,
            self.alpha + (other.alpha - self.alpha) * t,
        )
    }
}

/// Shortest round-trip text for a channel, always with a decimal point
/// (`1.0`, `0.25`, `5.0E-5`).
pub fn channel_string(v: f32) -> String {
    let s = format!("{v:?}");
    match s.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => format!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}.0E{exp}"),
        None => s,
    }
}

/// Brush for filling shapes.
///
/// Gradients are defined in the local space of the node being drawn, with
/// `start`/`end` normalized to its size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Brush {
    Solid(Color),
    Linear {
        start: Vec2,
        end: Vec2,
        start_color: Color,
        end_color: Color,
    },
}

impl From<Color> for Brush {
    fn from(c: Color) -> Self {
        Brush::Solid(c)
    }
}

impl Brush {
    /// Color at the normalized position `t` along the brush.
    pub fn sample(&self, t: f32) -> Color {
        match *self {
            Brush::Solid(c) => c,
            Brush::Linear {
                start_color,
                end_color,
                ..
            } => start_color.lerp(end_color, t),
        }
    }
}

pub struct LinearGradient;

impl LinearGradient {
    pub fn vertical(top: Color, bottom: Color) -> Brush {
        Brush::Linear {
            start: Vec2 { x: 0.0, y: 0.0 },
            end: Vec2 { x: 0.0, y: 1.0 },
            start_color: top,
            end_color: bottom,
        }
    }
}
