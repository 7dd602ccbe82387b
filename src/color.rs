// Colors: hex parsing, HSL lightening, and the depth-cascading palette.
//
// Top-level nodes take palette colors in order (cycling when the palette is
// shorter than the top level). Every deeper node takes its parent's color
// with the HSL lightness raised by a fixed step, so shade encodes depth and
// siblings below the top level share one shade.

use std::fmt;

use crate::error::EngineError;
use crate::hierarchy::tree::Tree;

/// Color of the virtual root.
pub const ROOT_COLOR: &str = "#ffffff";

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// HSL color with every channel in [0.0, 1.0] (hue as a fraction of a turn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    /// Parse `#rrggbb`, `rrggbb`, or `#rgb` (case-insensitive).
    pub fn from_hex(hex: &str) -> Result<Self, EngineError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || EngineError::InvalidConfig(format!("invalid hex color: {hex:?}"));

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match digits.len() {
            6 => Ok(Self {
                r: channel(&digits[0..2])?,
                g: channel(&digits[2..4])?,
                b: channel(&digits[4..6])?,
            }),
            3 => {
                // #abc is shorthand for #aabbcc
                let r = channel(&digits[0..1])?;
                let g = channel(&digits[1..2])?;
                let b = channel(&digits[2..3])?;
                Ok(Self {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let sector = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        let h = sector / 6.0;

        Hsl { h, s, l }
    }

    /// Raise the HSL lightness by `amount`, saturating at white.
    pub fn lighten(self, amount: f64) -> Self {
        let mut hsl = self.to_hsl();
        hsl.l = (hsl.l + amount).clamp(0.0, 1.0);
        hsl.to_rgb()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        let l = self.l.clamp(0.0, 1.0);
        let s = self.s.clamp(0.0, 1.0);

        if s == 0.0 {
            let v = to_channel(l);
            return Rgb { r: v, g: v, b: v };
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Rgb {
            r: to_channel(hue_to_rgb(p, q, self.h + 1.0 / 3.0)),
            g: to_channel(hue_to_rgb(p, q, self.h)),
            b: to_channel(hue_to_rgb(p, q, self.h - 1.0 / 3.0)),
        }
    }
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_channel(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Assigns a color to every node of a tree.
pub struct ColorAssigner {
    palette: Vec<Rgb>,
    lighten_step: f64,
}

impl ColorAssigner {
    /// An empty palette falls back to the virtual root's white.
    pub fn new(palette: Vec<Rgb>, lighten_step: f64) -> Self {
        Self {
            palette,
            lighten_step,
        }
    }

    /// Parse a palette of hex strings.
    pub fn from_hex_palette(palette: &[String], lighten_step: f64) -> Result<Self, EngineError> {
        let palette = palette
            .iter()
            .map(|c| Rgb::from_hex(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(palette, lighten_step))
    }

    /// Base color of the i-th top-level node.
    pub fn base_color(&self, i: usize) -> Rgb {
        if self.palette.is_empty() {
            Rgb {
                r: 255,
                g: 255,
                b: 255,
            }
        } else {
            self.palette[i % self.palette.len()]
        }
    }

    /// Fill `color` on every node. Runs before root injection.
    pub fn apply(&self, tree: &mut Tree) {
        let mut colors: Vec<Option<Rgb>> = vec![None; tree.len()];
        let top = tree.top_level();

        for (i, &idx) in top.iter().enumerate() {
            colors[idx] = Some(self.base_color(i));
        }

        // Breadth-first, so a parent's color is set before its children
        let mut queue = std::collections::VecDeque::from(top);
        while let Some(idx) = queue.pop_front() {
            let Some(parent_color) = colors[idx] else {
                continue;
            };
            let shade = parent_color.lighten(self.lighten_step);
            for &child in &tree.nodes[idx].children {
                colors[child] = Some(shade);
                queue.push_back(child);
            }
        }

        for (node, color) in tree.nodes.iter_mut().zip(colors) {
            node.color = color.map(Rgb::to_hex).unwrap_or_else(|| ROOT_COLOR.to_string());
        }
    }
}
