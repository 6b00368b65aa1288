use crate::config::Rgb;
use crate::render::{begin_frame, finish_frame, raster_fits, write_color, Frame, Renderer};
use std::io::Write;

const HALF_BLOCK: char = '\u{2580}';

/// One cell = two vertically stacked raster pixels (fg top, bg bottom).
pub struct HalfBlockRenderer {
    last_fg: Option<Rgb>,
    last_bg: Option<Rgb>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "half-block"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (1, 2)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if !raster_fits(&*self, frame) {
            // Size changed between raster and render; skip this frame.
            return Ok(());
        }

        let raster = frame.raster;
        let w = raster.width();
        let px = raster.pixels();

        begin_frame(out, frame.sync_updates)?;
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..frame.visual_rows as usize {
            let top = row * 2 * w;
            let bottom = top + w;
            for x in 0..w {
                let fg = px[top + x];
                let bg = px[bottom + x];
                if self.last_fg != Some(fg) {
                    write_color(out, true, fg)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write_color(out, false, bg)?;
                    self.last_bg = Some(bg);
                }
                write!(out, "{HALF_BLOCK}")?;
            }
            out.write_all(b"\r\n")?;
        }

        finish_frame(frame, out)
    }
}
