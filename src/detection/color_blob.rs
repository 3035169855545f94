/// Color blob locator
///
/// Finds the ball as the largest connected region of ball-colored pixels
/// and reports its centroid.
use image::{GrayImage, RgbaImage};
use rayon::prelude::*;

use super::hsv::HsvRange;
use super::morphology;
use super::{Detection, HalfFrame, ObjectLocator};
use crate::config::TrackingConfig;

/// Connected region statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Blob {
    area: u32,
    sum_x: u64,
    sum_y: u64,
}

impl Blob {
    fn centroid(&self) -> (f32, f32) {
        let area = self.area.max(1) as f64;
        ((self.sum_x as f64 / area) as f32, (self.sum_y as f64 / area) as f32)
    }
}

pub struct ColorBlobLocator {
    range: HsvRange,
    kernel_size: u32,
    morph_open: bool,
    morph_close: bool,
}

impl ColorBlobLocator {
    pub fn new(range: HsvRange, kernel_size: u32) -> Self {
        Self {
            range,
            kernel_size,
            morph_open: true,
            morph_close: true,
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self {
            range: HsvRange::new(config.hsv_lower, config.hsv_upper),
            kernel_size: config.kernel_size,
            morph_open: config.morph_open,
            morph_close: config.morph_close,
        }
    }

    /// Binary mask of in-range pixels, cleaned up by opening then closing
    pub fn mask(&self, image: &RgbaImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut mask = GrayImage::new(width, height);
        let row_size = width as usize;
        if row_size == 0 || height == 0 {
            return mask;
        }

        let range = self.range;
        mask.par_chunks_mut(row_size)
            .enumerate()
            .for_each(|(y, row_buffer)| {
                for (x, value) in row_buffer.iter_mut().enumerate() {
                    let pixel = image.get_pixel(x as u32, y as u32);
                    *value = if range.contains_rgba(pixel) { 255 } else { 0 };
                }
            });

        if self.morph_open {
            mask = morphology::open(&mask, self.kernel_size);
        }
        if self.morph_close {
            mask = morphology::close(&mask, self.kernel_size);
        }

        mask
    }
}

/// Largest 8-connected white region of `mask`
fn largest_blob(mask: &GrayImage) -> Option<Blob> {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    let raw = mask.as_raw();
    let mut visited = vec![false; w * h];
    let mut stack = Vec::new();
    let mut best: Option<Blob> = None;

    for start in 0..w * h {
        if visited[start] || raw[start] <= 127 {
            continue;
        }

        let mut blob = Blob::default();
        visited[start] = true;
        stack.push(start);

        while let Some(index) = stack.pop() {
            let (x, y) = (index % w, index / w);
            blob.area += 1;
            blob.sum_x += x as u64;
            blob.sum_y += y as u64;

            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let neighbor = ny * w + nx;
                    if !visited[neighbor] && raw[neighbor] > 127 {
                        visited[neighbor] = true;
                        stack.push(neighbor);
                    }
                }
            }
        }

        if best.map_or(true, |b| blob.area > b.area) {
            best = Some(blob);
        }
    }

    best
}

impl ObjectLocator for ColorBlobLocator {
    fn locate(&self, half: &HalfFrame) -> Option<Detection> {
        let mask = self.mask(&half.image);
        let blob = largest_blob(&mask)?;
        let (cx, cy) = blob.centroid();

        tracing::trace!(
            "{} half: blob area={} centroid=({:.1}, {:.1})",
            half.side,
            blob.area,
            cx + half.x_offset as f32,
            cy
        );

        Some(Detection {
            x: cx + half.x_offset as f32,
            y: cy,
            area: blob.area as f32,
        })
    }

    fn name(&self) -> &'static str {
        "ColorBlobLocator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::split_frame;
    use crate::game::Side;
    use crate::overlay::fill_disc;
    use image::{Luma, Rgba};

    const ORANGE: Rgba<u8> = Rgba([255, 100, 0, 255]);
    const BACKGROUND: Rgba<u8> = Rgba([20, 60, 20, 255]);

    fn locator() -> ColorBlobLocator {
        ColorBlobLocator::new(HsvRange::default(), 5)
    }

    #[test]
    fn test_locates_ball_centroid() {
        let mut frame = RgbaImage::from_pixel(640, 480, BACKGROUND);
        fill_disc(&mut frame, 100, 420, 15, ORANGE);

        let halves = split_frame(&frame);
        let detection = locator().locate(&halves[Side::Left]).unwrap();

        assert!((detection.x - 100.0).abs() < 1.0);
        assert!((detection.y - 420.0).abs() < 1.0);
        assert!(detection.area > 600.0 && detection.area < 800.0);
        assert!(locator().locate(&halves[Side::Right]).is_none());
    }

    #[test]
    fn test_right_half_uses_frame_coordinates() {
        let mut frame = RgbaImage::from_pixel(640, 480, BACKGROUND);
        fill_disc(&mut frame, 500, 100, 12, ORANGE);

        let halves = split_frame(&frame);
        let detection = locator().locate(&halves[Side::Right]).unwrap();

        assert!((detection.x - 500.0).abs() < 1.0);
        assert!((detection.y - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_picks_largest_blob() {
        let mut frame = RgbaImage::from_pixel(320, 480, BACKGROUND);
        fill_disc(&mut frame, 60, 60, 8, ORANGE);
        fill_disc(&mut frame, 100, 300, 20, ORANGE);

        let halves = split_frame(&frame);
        let detection = locator().locate(&halves[Side::Left]).unwrap();

        assert!((detection.x - 100.0).abs() < 1.0);
        assert!((detection.y - 300.0).abs() < 1.0);
    }

    #[test]
    fn test_speckle_noise_is_filtered() {
        let mut frame = RgbaImage::from_pixel(100, 100, BACKGROUND);
        for i in 0..10 {
            frame.put_pixel(i * 9, i * 7, ORANGE);
        }

        let halves = split_frame(&frame);
        assert!(locator().locate(&halves[Side::Left]).is_none());
        assert!(locator().locate(&halves[Side::Right]).is_none());
    }

    #[test]
    fn test_largest_blob_connectivity() {
        let mut mask = GrayImage::new(10, 10);
        // Diagonal chain is one 8-connected blob
        for i in 0..5 {
            mask.put_pixel(i, i, Luma([255]));
        }
        mask.put_pixel(9, 0, Luma([255]));

        let blob = largest_blob(&mask).unwrap();
        assert_eq!(blob.area, 5);
        assert_eq!(blob.centroid(), (2.0, 2.0));
    }

    #[test]
    fn test_empty_mask_has_no_blob() {
        assert!(largest_blob(&GrayImage::new(8, 8)).is_none());
    }
}
