//! Overlay composition
//!
//! Tick values are drawn one per row onto a copy of the held frame; the
//! held frame itself is never mutated.

use contracts::OverlayStyle;
use image::{Rgb, RgbImage};

use crate::font::{self, draw_text, fill_rect};

const STALE_BORDER: Rgb<u8> = Rgb([255, 0, 0]);

/// Compose the overlay for one result vector
///
/// Row `i` shows `ticks[i]` left-aligned at `style.origin_x` with its
/// baseline at `(i + 1) * style.row_height`. A stale frame gets a red
/// border. Text outside the image is clipped.
pub fn compose_overlay(
    held: &RgbImage,
    ticks: &[u64],
    style: &OverlayStyle,
    stale: bool,
) -> RgbImage {
    let mut canvas = held.clone();
    let color = Rgb(style.color);
    let glyph_height = i64::from(font::text_height(style.scale));

    for (i, value) in ticks.iter().enumerate() {
        let baseline = (i as i64 + 1) * i64::from(style.row_height);
        draw_text(
            &mut canvas,
            i64::from(style.origin_x),
            baseline - glyph_height,
            &value.to_string(),
            color,
            style.scale,
        );
    }

    if stale {
        draw_border(&mut canvas, i64::from(style.scale.max(1)));
    }

    canvas
}

fn draw_border(canvas: &mut RgbImage, thickness: i64) {
    let (w, h) = (i64::from(canvas.width()), i64::from(canvas.height()));
    fill_rect(canvas, 0, 0, w, thickness, STALE_BORDER);
    fill_rect(canvas, 0, h - thickness, w, thickness, STALE_BORDER);
    fill_rect(canvas, 0, 0, thickness, h, STALE_BORDER);
    fill_rect(canvas, w - thickness, 0, thickness, h, STALE_BORDER);
}
