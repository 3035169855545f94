/// Binary morphology on color masks
///
/// Square structuring elements, applied as two separable passes (rows then
/// columns). Window edges are clamped to the image, so borders neither erode
/// nor grow from outside pixels.
use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    #[inline]
    fn pick(self, window: impl Iterator<Item = u8>) -> u8 {
        match self {
            Extremum::Min => window.min().unwrap_or(0),
            Extremum::Max => window.max().unwrap_or(0),
        }
    }
}

/// Horizontal pass, parallel by row
fn filter_rows(mask: &GrayImage, radius: usize, op: Extremum) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    let row_size = width as usize;
    if row_size == 0 || height == 0 {
        return out;
    }

    let src = mask.as_raw();
    out.par_chunks_mut(row_size)
        .enumerate()
        .for_each(|(y, row_buffer)| {
            let line = &src[y * row_size..(y + 1) * row_size];
            for (x, value) in row_buffer.iter_mut().enumerate() {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(row_size - 1);
                *value = op.pick(line[lo..=hi].iter().copied());
            }
        });

    out
}

/// Vertical pass, parallel by output row
fn filter_columns(mask: &GrayImage, radius: usize, op: Extremum) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    let row_size = width as usize;
    let rows = height as usize;
    if row_size == 0 || rows == 0 {
        return out;
    }

    let src = mask.as_raw();
    out.par_chunks_mut(row_size)
        .enumerate()
        .for_each(|(y, row_buffer)| {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(rows - 1);
            for (x, value) in row_buffer.iter_mut().enumerate() {
                *value = op.pick((lo..=hi).map(|yy| src[yy * row_size + x]));
            }
        });

    out
}

fn apply(mask: &GrayImage, kernel_size: u32, op: Extremum) -> GrayImage {
    let radius = (kernel_size / 2) as usize;
    if radius == 0 {
        return mask.clone();
    }
    let horizontal = filter_rows(mask, radius, op);
    filter_columns(&horizontal, radius, op)
}

/// Shrink white regions
pub fn erode(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    apply(mask, kernel_size, Extremum::Min)
}

/// Grow white regions
pub fn dilate(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    apply(mask, kernel_size, Extremum::Max)
}

/// Erosion followed by dilation: removes specks smaller than the kernel
pub fn open(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    dilate(&erode(mask, kernel_size), kernel_size)
}

/// Dilation followed by erosion: fills pinholes smaller than the kernel
pub fn close(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    erode(&dilate(mask, kernel_size), kernel_size)
}
