/// Detection module
///
/// Locates the ball in each half of a frame.
///
/// ## Architecture
///
/// ```text
/// Frame (RgbaImage)
///   └── split_frame ─> HalfFrame (left) ─┐
///                   └> HalfFrame (right) ─┤
///                                         └── ObjectLocator::locate
///                                               └── ColorBlobLocator
///                                                     ├── HSV mask
///                                                     ├── open / close
///                                                     └── largest blob centroid
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use detection::{split_frame, ColorBlobLocator, ObjectLocator};
///
/// let locator = ColorBlobLocator::from_config(&config.tracking);
/// let halves = split_frame(&frame);
/// let left = locator.locate(&halves[Side::Left]);
/// ```

pub mod color_blob;
pub mod hsv;
pub mod morphology;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::game::{Side, SideMap};

pub use color_blob::ColorBlobLocator;
pub use hsv::{Hsv, HsvRange};

/// Ball position in full-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    /// Blob area in pixels, used as the confidence signal
    pub area: f32,
}

impl Detection {
    /// Whether the blob is large enough to trust
    pub fn is_confident(&self, min_area: f32) -> bool {
        self.area >= min_area
    }
}

/// One half of a frame, cropped out of the original
#[derive(Debug, Clone)]
pub struct HalfFrame {
    pub side: Side,
    /// Column of the original frame where this half starts
    pub x_offset: u32,
    pub image: RgbaImage,
}

/// Cut a frame down the middle. The right half gets the odd column.
pub fn split_frame(frame: &RgbaImage) -> SideMap<HalfFrame> {
    let (width, height) = frame.dimensions();
    let mid = width / 2;

    SideMap::from_fn(|side| {
        let (x_offset, half_width) = match side {
            Side::Left => (0, mid),
            Side::Right => (mid, width - mid),
        };
        let image = image::imageops::crop_imm(frame, x_offset, 0, half_width, height).to_image();
        HalfFrame {
            side,
            x_offset,
            image,
        }
    })
}

/// Ball locator trait
///
/// Implement this trait to plug in a different tracking technique.
pub trait ObjectLocator: Send + Sync {
    /// Find the ball in `half`. Coordinates are full-frame.
    fn locate(&self, half: &HalfFrame) -> Option<Detection>;

    /// Get locator name (for logging)
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_split_frame_even_width() {
        let frame = RgbaImage::from_pixel(640, 480, Rgba([0, 0, 0, 255]));
        let halves = split_frame(&frame);

        assert_eq!(halves[Side::Left].x_offset, 0);
        assert_eq!(halves[Side::Left].image.dimensions(), (320, 480));
        assert_eq!(halves[Side::Right].x_offset, 320);
        assert_eq!(halves[Side::Right].image.dimensions(), (320, 480));
    }

    #[test]
    fn test_split_frame_keeps_pixels() {
        let mut frame = RgbaImage::from_pixel(5, 2, Rgba([0, 0, 0, 255]));
        frame.put_pixel(3, 1, Rgba([255, 0, 0, 255]));

        let halves = split_frame(&frame);
        let right = &halves[Side::Right];

        assert_eq!(right.image.dimensions(), (3, 2));
        assert_eq!(right.image.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_detection_confidence_threshold() {
        let detection = Detection { x: 0.0, y: 0.0, area: 300.0 };
        assert!(detection.is_confident(300.0));
        assert!(!detection.is_confident(300.5));
    }
}
