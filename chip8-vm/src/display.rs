//! Monochrome display buffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// 64x32 grid of one bit pixels, stored row major.
///
/// The buffer is only mutated by [`DisplayBuffer::clear`] and
/// [`DisplayBuffer::draw_sprite`]. Renderers get read access.
pub struct DisplayBuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Pixel state at the given coordinate. Coordinates wrap around both axes.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[index(x, y)]
    }

    /// Draw a sprite at coordinate `(x0, y0)`, one byte per row, most significant bit leftmost.
    ///
    /// Pixels are XORed onto the buffer. If the sprite is drawn outside of the display area,
    /// it is wrapped around to the other side.
    ///
    /// Returns `true` when any pixel was erased, which is a collision.
    pub fn draw_sprite(&mut self, x0: usize, y0: usize, rows: &[u8]) -> bool {
        let mut is_erased = false;

        for (r, row) in rows.iter().enumerate() {
            for c in 0..SPRITE_WIDTH {
                let d = index(x0 + c, y0 + r);

                let old_px = self.pixels[d];
                let new_px = (row >> (7 - c) & 1) != 0;

                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= old_px && new_px;

                self.pixels[d] = old_px ^ new_px;
            }
        }

        is_erased
    }

    /// Pixels in row major order, suitable for blitting.
    pub fn as_slice(&self) -> &[bool] {
        &self.pixels[..]
    }

    /// Iterate over the rows of the display, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    /// Number of pixels that are switched on.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|px| **px).count()
    }

    /// Render the buffer as text, `#` for a lit pixel and `.` otherwise.
    pub fn dump<W: Write>(&self, w: &mut W) -> fmt::Result {
        for row in self.rows() {
            for px in row {
                w.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Buffer index of a wrapped coordinate.
#[inline(always)]
fn index(x: usize, y: usize) -> usize {
    (x & DISPLAY_WIDTH_MASK) + (y & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH
}
