/// HSV color thresholding
///
/// Hue uses the 0-180 half-degree scale common in vision tooling, so a
/// configured orange band of `[5, 15]` means 10-30 degrees.
use image::Rgba;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    /// 0-179
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn from_rgba(pixel: &Rgba<u8>) -> Self {
        let r = pixel[0] as i32;
        let g = pixel[1] as i32;
        let b = pixel[2] as i32;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let v = max as u8;
        let s = if max == 0 {
            0
        } else {
            ((255 * delta + max / 2) / max) as u8
        };

        if delta == 0 {
            return Self { h: 0, s, v };
        }

        let delta = delta as f32;
        let degrees = if max == r {
            60.0 * (g - b) as f32 / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) as f32 / delta
        } else {
            240.0 + 60.0 * (r - g) as f32 / delta
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

        // Half-degree scale; 359.x rounds back to 0
        let h = ((degrees / 2.0).round() as u32 % 180) as u8;

        Self { h, s, v }
    }
}

/// Inclusive HSV band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        let values = [hsv.h, hsv.s, hsv.v];
        values
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&value, (&lo, &hi))| (lo..=hi).contains(&value))
    }

    pub fn contains_rgba(&self, pixel: &Rgba<u8>) -> bool {
        self.contains(Hsv::from_rgba(pixel))
    }

    /// Every lower bound must not exceed its upper bound, and hue stays below 180
    pub fn is_valid(&self) -> bool {
        self.lower.iter().zip(self.upper.iter()).all(|(lo, hi)| lo <= hi) && self.upper[0] < 180
    }
}

impl Default for HsvRange {
    /// Orange ball
    fn default() -> Self {
        Self::new([5, 100, 100], [15, 255, 255])
    }
}
