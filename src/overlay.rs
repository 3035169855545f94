/// Debug overlay
///
/// Draws the referee's view of a frame: field divider, scoring zone, ball
/// markers, one score pip per point, progress bars for the dwell, pause and
/// restart countdowns, and a border around the winner's half once the match
/// is over.
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::game::{Observations, Scorekeeper, Side};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const ORANGE: Rgba<u8> = Rgba([255, 165, 0, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);
pub const CYAN: Rgba<u8> = Rgba([0, 255, 255, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 200, 0, 255]);
const BAR_BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);

const MARKER_RADIUS: i32 = 5;
const INDICATOR_RADIUS: i32 = 8;
const BAR_HEIGHT: i32 = 8;
const MARGIN: i32 = 10;
const PIP_SIZE: i32 = 6;
const PIP_GAP: i32 = 2;
const WINNER_BORDER: i32 = 4;

/// Fill the axis-aligned rectangle, clipped to the image
pub fn fill_rect(image: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: Rgba<u8>) {
    let (img_w, img_h) = (image.width() as i32, image.height() as i32);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width).min(img_w);
    let y1 = (y + height).min(img_h);

    for py in y0..y1 {
        for px in x0..x1 {
            image.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Fill a disc centered at (`cx`, `cy`), clipped to the image
pub fn fill_disc(image: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    let (img_w, img_h) = (image.width() as i32, image.height() as i32);
    let r2 = radius * radius;

    for py in (cy - radius).max(0)..=(cy + radius).min(img_h - 1) {
        for px in (cx - radius).max(0)..=(cx + radius).min(img_w - 1) {
            let (dx, dy) = (px - cx, py - cy);
            if dx * dx + dy * dy <= r2 {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Horizontal progress bar, `fraction` clamped to 0..=1
pub fn progress_bar(
    image: &mut RgbaImage,
    x: i32,
    y: i32,
    width: i32,
    fraction: f32,
    color: Rgba<u8>,
) {
    let filled = (width as f32 * fraction.clamp(0.0, 1.0)).round() as i32;
    fill_rect(image, x, y, width, BAR_HEIGHT, BAR_BACKGROUND);
    fill_rect(image, x, y, filled, BAR_HEIGHT, color);
}

/// Outline of the rectangle, `thickness` pixels wide on the inside
pub fn stroke_rect(
    image: &mut RgbaImage,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    thickness: i32,
    color: Rgba<u8>,
) {
    fill_rect(image, x, y, width, thickness, color);
    fill_rect(image, x, y + height - thickness, width, thickness, color);
    fill_rect(image, x, y, thickness, height, color);
    fill_rect(image, x + width - thickness, y, thickness, height, color);
}

/// A row of `points` square pips starting at (`x`, `y`), cut off at `max_width`
fn score_pips(image: &mut RgbaImage, x: i32, y: i32, max_width: i32, points: u32) {
    let pitch = PIP_SIZE + PIP_GAP;
    let room = ((max_width + PIP_GAP) / pitch).max(0) as u32;
    for i in 0..points.min(room) as i32 {
        fill_rect(image, x + i * pitch, y, PIP_SIZE, PIP_SIZE, WHITE);
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0)
}

/// Copy of `frame` with the game state drawn on top
pub fn annotate(
    frame: &RgbaImage,
    keeper: &Scorekeeper,
    observations: &Observations,
    now: Instant,
) -> RgbaImage {
    let mut canvas = frame.clone();
    let (width, height) = (frame.width() as i32, frame.height() as i32);
    let mid = width / 2;
    let state = keeper.state();
    let rules = state.rules();

    fill_rect(&mut canvas, mid - 1, 0, 2, height, WHITE);
    fill_rect(&mut canvas, 0, rules.bottom_threshold.round() as i32, width, 2, RED);

    let (left_score, right_score) = state.scores();
    for side in Side::ALL {
        let half_x = match side {
            Side::Left => 0,
            Side::Right => mid,
        };
        let half_width = match side {
            Side::Left => mid,
            Side::Right => width - mid,
        };

        let detection = observations[side].filter(|d| d.is_confident(keeper.min_area()));
        if let Some(d) = detection {
            fill_disc(&mut canvas, d.x.round() as i32, d.y.round() as i32, MARKER_RADIUS, RED);
        }

        let indicator = if detection.is_some() { ORANGE } else { RED };
        fill_disc(
            &mut canvas,
            half_x + MARGIN + INDICATOR_RADIUS,
            MARGIN + INDICATOR_RADIUS,
            INDICATOR_RADIUS,
            indicator,
        );

        let points = match side {
            Side::Left => left_score,
            Side::Right => right_score,
        };
        let pips_x = half_x + 2 * MARGIN + 2 * INDICATOR_RADIUS;
        score_pips(
            &mut canvas,
            pips_x,
            MARGIN + INDICATOR_RADIUS - PIP_SIZE / 2,
            half_x + half_width - MARGIN - pips_x,
            points,
        );

        if state.winner() == Some(side) {
            stroke_rect(&mut canvas, half_x, 0, half_width, height, WINNER_BORDER, GREEN);
        }

        if let Some(elapsed) = keeper.dwell().elapsed(side, now) {
            progress_bar(
                &mut canvas,
                half_x + MARGIN,
                height - MARGIN - BAR_HEIGHT,
                half_width - 2 * MARGIN,
                fraction(elapsed, rules.dwell_threshold()),
                YELLOW,
            );
        }
    }

    let countdown = state
        .pause_remaining(now)
        .map(|left| (left, rules.point_delay()))
        .or_else(|| state.restart_remaining(now).map(|left| (left, rules.restart_delay())));
    if let Some((remaining, total)) = countdown {
        progress_bar(
            &mut canvas,
            MARGIN,
            2 * MARGIN + 2 * INDICATOR_RADIUS,
            width - 2 * MARGIN,
            fraction(total.saturating_sub(remaining), total),
            CYAN,
        );
    }

    canvas
}

/// Write an annotated frame as `frame_NNNNNN.png` under `dir`
pub fn save_frame(image: &RgbaImage, dir: &Path, index: u64) -> Result<PathBuf, image::ImageError> {
    let path = dir.join(format!("frame_{:06}.png", index));
    image.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;
    use crate::game::{GameRules, SideMap};

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_fill_disc_clips_to_image() {
        let mut image = RgbaImage::from_pixel(10, 10, BLACK);
        fill_disc(&mut image, 0, 0, 3, RED);

        assert_eq!(image.get_pixel(0, 0), &RED);
        assert_eq!(image.get_pixel(3, 0), &RED);
        assert_eq!(image.get_pixel(3, 3), &BLACK);
    }

    #[test]
    fn test_fill_rect_outside_is_noop() {
        let mut image = RgbaImage::from_pixel(4, 4, BLACK);
        fill_rect(&mut image, 10, 10, 5, 5, RED);
        fill_rect(&mut image, -5, -5, 3, 3, RED);

        assert!(image.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_progress_bar_fill() {
        let mut image = RgbaImage::from_pixel(20, 10, BLACK);
        progress_bar(&mut image, 0, 0, 10, 0.5, YELLOW);

        assert_eq!(image.get_pixel(4, 0), &YELLOW);
        assert_eq!(image.get_pixel(5, 0), &BAR_BACKGROUND);
        assert_eq!(image.get_pixel(15, 0), &BLACK);
    }

    #[test]
    fn test_annotate_draws_divider_and_zone() {
        let frame = RgbaImage::from_pixel(640, 480, BLACK);
        let keeper = Scorekeeper::new(GameRules::default(), 300.0);
        let observations: Observations = SideMap::default();

        let annotated = annotate(&frame, &keeper, &observations, Instant::now());

        assert_eq!(annotated.get_pixel(320, 240), &WHITE);
        assert_eq!(annotated.get_pixel(100, 400), &RED);
        assert_eq!(annotated.get_pixel(100, 200), &BLACK);
        // Input frame is untouched
        assert_eq!(frame.get_pixel(320, 240), &BLACK);
    }

    #[test]
    fn test_annotate_marks_tracked_ball() {
        let frame = RgbaImage::from_pixel(640, 480, BLACK);
        let now = Instant::now();
        let mut keeper = Scorekeeper::new(GameRules::default(), 300.0);
        let ball = Detection { x: 100.0, y: 450.0, area: 500.0 };
        let observations = SideMap::new(Some(ball), None);
        keeper.tick(now, &observations);

        let annotated = annotate(&frame, &keeper, &observations, now + Duration::from_millis(750));

        assert_eq!(annotated.get_pixel(100, 450), &RED);
        // Left indicator tracking, right indicator not
        assert_eq!(annotated.get_pixel(18, 18), &ORANGE);
        assert_eq!(annotated.get_pixel(338, 18), &RED);
        // Dwell bar half full on the left
        let bar_y = 480 - 10 - 8;
        assert_eq!(annotated.get_pixel(20, bar_y), &YELLOW);
        assert_eq!(annotated.get_pixel(300, bar_y), &BAR_BACKGROUND);
    }

    /// Award points one at a time, letting each pause run out
    fn award(keeper: &mut Scorekeeper, side: Side, points: u32, now: &mut Instant) {
        let empty: Observations = SideMap::default();
        for _ in 0..points {
            keeper.award_point(side, *now).unwrap();
            *now += Duration::from_millis(2000);
            keeper.tick(*now, &empty);
        }
    }

    #[test]
    fn test_stroke_rect_leaves_inside_empty() {
        let mut image = RgbaImage::from_pixel(10, 10, BLACK);
        stroke_rect(&mut image, 0, 0, 10, 10, 2, GREEN);

        assert_eq!(image.get_pixel(0, 5), &GREEN);
        assert_eq!(image.get_pixel(8, 9), &GREEN);
        assert_eq!(image.get_pixel(5, 5), &BLACK);
    }

    #[test]
    fn test_annotate_draws_score_pips() {
        let frame = RgbaImage::from_pixel(640, 480, BLACK);
        let mut now = Instant::now();
        let mut keeper = Scorekeeper::new(GameRules::default(), 300.0);
        award(&mut keeper, Side::Left, 2, &mut now);
        award(&mut keeper, Side::Right, 1, &mut now);

        let annotated = annotate(&frame, &keeper, &SideMap::default(), now);

        // Pips start at x=36 in each half, 8px apart
        assert_eq!(annotated.get_pixel(38, 18), &WHITE);
        assert_eq!(annotated.get_pixel(46, 18), &WHITE);
        assert_eq!(annotated.get_pixel(54, 18), &BLACK);
        assert_eq!(annotated.get_pixel(358, 18), &WHITE);
        assert_eq!(annotated.get_pixel(366, 18), &BLACK);
        // No winner yet
        assert_eq!(annotated.get_pixel(1, 240), &BLACK);
    }

    #[test]
    fn test_annotate_highlights_winner_half() {
        let frame = RgbaImage::from_pixel(640, 480, BLACK);
        let mut now = Instant::now();
        let mut keeper = Scorekeeper::new(GameRules::default(), 300.0);
        award(&mut keeper, Side::Right, 10, &mut now);
        keeper.award_point(Side::Right, now).unwrap();
        assert_eq!(keeper.state().winner(), Some(Side::Right));

        let annotated = annotate(&frame, &keeper, &SideMap::default(), now);

        assert_eq!(annotated.get_pixel(322, 240), &GREEN);
        assert_eq!(annotated.get_pixel(638, 240), &GREEN);
        assert_eq!(annotated.get_pixel(480, 1), &GREEN);
        assert_eq!(annotated.get_pixel(1, 240), &BLACK);
        assert_eq!(annotated.get_pixel(160, 1), &BLACK);
        // Eleven pips on the winning side
        assert_eq!(annotated.get_pixel(320 + 36 + 10 * 8 + 2, 18), &WHITE);
    }

    #[test]
    fn test_save_frame() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbaImage::from_pixel(4, 4, CYAN);

        let path = save_frame(&image, dir.path(), 7).unwrap();

        assert!(path.ends_with("frame_000007.png"));
        assert!(path.exists());
    }
}
