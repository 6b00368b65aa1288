use crate::config::Rgb;
use crate::render::{begin_frame, finish_frame, raster_fits, write_color, Frame, Renderer};
use std::io::Write;

/// Unicode braille bit for each dot of a 2x4 cell, row-major.
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

/// One cell = 2x4 raster pixels. Pixels brighter than the cell's mid luma
/// become dots in their average colour; the rest average into the background.
pub struct BrailleRenderer {
    last_fg: Option<Rgb>,
    last_bg: Option<Rgb>,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (2, 4)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if !raster_fits(&*self, frame) {
            return Ok(());
        }

        let raster = frame.raster;
        let w = raster.width();
        let px = raster.pixels();

        begin_frame(out, frame.sync_updates)?;
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..frame.visual_rows as usize {
            for col in 0..frame.term_cols as usize {
                let mut cell = [Rgb::default(); 8];
                for (i, c) in cell.iter_mut().enumerate() {
                    let x = col * 2 + i % 2;
                    let y = row * 4 + i / 2;
                    *c = px[y * w + x];
                }
                let (fg, bg, ch) = braille_cell(&cell);

                if self.last_fg != Some(fg) {
                    write_color(out, true, fg)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write_color(out, false, bg)?;
                    self.last_bg = Some(bg);
                }
                write!(out, "{ch}")?;
            }
            out.write_all(b"\r\n")?;
        }

        finish_frame(frame, out)
    }
}

/// Foreground, background and glyph for one 2x4 block.
pub fn braille_cell(cell: &[Rgb; 8]) -> (Rgb, Rgb, char) {
    let lum = cell.map(luma);
    let min_l = lum.iter().copied().min().unwrap_or(0);
    let max_l = lum.iter().copied().max().unwrap_or(0);
    let thr = (min_l + max_l) / 2;

    let mut bits = 0u8;
    let mut on = Average::default();
    let mut off = Average::default();
    for (i, c) in cell.iter().enumerate() {
        if lum[i] > thr {
            bits |= DOT_BITS[i];
            on.add(*c);
        } else {
            off.add(*c);
        }
    }

    if bits == 0 {
        let bg = off.get().unwrap_or_default();
        return (bg, bg, ' ');
    }
    let fg = on.get().unwrap_or_default();
    let bg = off.get().unwrap_or(fg);
    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
    (fg, bg, ch)
}

#[derive(Default)]
struct Average {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl Average {
    fn add(&mut self, c: Rgb) {
        self.r += c.r as u32;
        self.g += c.g as u32;
        self.b += c.b as u32;
        self.n += 1;
    }

    fn get(&self) -> Option<Rgb> {
        (self.n > 0).then(|| {
            Rgb::new(
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

#[inline]
fn luma(c: Rgb) -> u16 {
    // Approx Rec.709 luma using integer math (0..255).
    ((c.r as u32 * 54 + c.g as u32 * 183 + c.b as u32 * 19) >> 8) as u16
}
