//! 5x7 bitmap font for overlay text
//!
//! Covers the characters tick values and short labels need: digits,
//! a few punctuation marks and space. Unknown characters render as a
//! hollow box.

use image::{Rgb, RgbImage};

/// Glyph width in font pixels
pub const GLYPH_WIDTH: u32 = 5;

/// Glyph height in font pixels
pub const GLYPH_HEIGHT: u32 = 7;

/// Horizontal gap between glyphs in font pixels
pub const GLYPH_SPACING: u32 = 1;

type Glyph = [u8; GLYPH_HEIGHT as usize];

const DIGITS: [Glyph; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
];

const SPACE: Glyph = [0; 7];
const MINUS: Glyph = [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00];
const DOT: Glyph = [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C];
const COLON: Glyph = [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00];
const UNKNOWN: Glyph = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

fn glyph(c: char) -> &'static Glyph {
    match c {
        '0'..='9' => &DIGITS[(c as u8 - b'0') as usize],
        ' ' => &SPACE,
        '-' => &MINUS,
        '.' => &DOT,
        ':' => &COLON,
        _ => &UNKNOWN,
    }
}

/// Width in pixels of `text` rendered at `scale`
pub fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    (count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * scale
}

/// Height in pixels of one text line at `scale`
pub fn text_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale
}

/// Draw `text` with its top-left corner at (x, y)
///
/// Pixels falling outside the image are clipped.
pub fn draw_text(image: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = i64::from(scale.max(1));
    let advance = i64::from(GLYPH_WIDTH + GLYPH_SPACING) * scale;

    for (n, c) in text.chars().enumerate() {
        let gx = x + n as i64 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = gx + i64::from(col) * scale;
                let py = y + row as i64 * scale;
                fill_rect(image, px, py, scale, scale, color);
            }
        }
    }
}

/// Fill a rectangle, clipped to the image
pub fn fill_rect(image: &mut RgbImage, x: i64, y: i64, w: i64, h: i64, color: Rgb<u8>) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let x0 = x.clamp(0, width);
    let y0 = y.clamp(0, height);
    let x1 = (x + w).clamp(0, width);
    let y1 = (y + h).clamp(0, height);

    for py in y0..y1 {
        for px in x0..x1 {
            image.put_pixel(px as u32, py as u32, color);
        }
    }
}
