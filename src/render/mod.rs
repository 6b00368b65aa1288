mod braille;
mod halfblock;

pub use braille::{braille_cell, BrailleRenderer};
pub use halfblock::HalfBlockRenderer;

use crate::config::{RendererMode, Rgb};
use crate::visual::SceneRaster;
use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub raster: &'a SceneRaster,
    pub hud: &'a str,
    pub hud_rows: u16,
    /// Colour of the first HUD line; follows the current gesture.
    pub hud_accent: Option<Rgb>,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    /// Raster pixels per terminal cell, (horizontal, vertical).
    fn cell_pixels(&self) -> (usize, usize);
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    }
}

/// Whether the raster matches the cell grid this renderer expects.
pub(crate) fn raster_fits(renderer: &dyn Renderer, frame: &Frame<'_>) -> bool {
    let (mx, my) = renderer.cell_pixels();
    let cols = frame.term_cols as usize;
    let rows = frame.visual_rows as usize;
    cols > 0
        && rows > 0
        && frame.raster.width() == cols * mx
        && frame.raster.height() == rows * my
        && frame.raster.pixels().len() >= frame.raster.width() * frame.raster.height()
}

pub(crate) fn begin_frame(out: &mut dyn Write, sync_updates: bool) -> anyhow::Result<()> {
    if sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    // Home, reset, and disable autowrap (DECAWM) while painting full-width rows;
    // otherwise some terminals wrap on the last column.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
    Ok(())
}

/// HUD, popup, autowrap restore, end of synchronized update, flush.
pub(crate) fn finish_frame(frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
    let cols = frame.term_cols as usize;
    let mut hud_lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        let accent = if i == 0 { frame.hud_accent } else { None };
        write_hud_line(
            out,
            frame.visual_rows as usize + i + 1,
            cols,
            hud_lines.next(),
            accent,
        )?;
    }

    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }

    out.write_all(b"\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn write_color(out: &mut dyn Write, fg: bool, c: Rgb) -> std::io::Result<()> {
    write!(out, "\x1b[{};2;{};{};{}m", if fg { 38 } else { 48 }, c.r, c.g, c.b)
}

pub fn write_hud_line(
    out: &mut dyn Write,
    row: usize,
    cols: usize,
    line: Option<&str>,
    accent: Option<Rgb>,
) -> anyhow::Result<()> {
    write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", row)?;
    let Some(line) = line else {
        return Ok(());
    };
    let clipped: String = line.chars().take(cols).collect();
    if let Some(c) = accent {
        write_color(out, true, c)?;
        write!(out, "\x1b[1m{clipped}\x1b[0m")?;
    } else {
        write!(out, "{clipped}")?;
    }
    Ok(())
}

/// Wraps every logical line at `cols` characters.
pub fn wrap_lines(cols: usize, lines: &[String]) -> Vec<String> {
    let width = cols.max(1);
    let mut out = Vec::new();
    for line in lines {
        if line.is_empty() {
            out.push(String::new());
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        out.extend(chars.chunks(width).map(|c| c.iter().collect::<String>()));
    }
    out
}

pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner_w = cols.saturating_sub(6).max(1);
    let raw: Vec<String> = text.lines().map(str::to_string).collect();
    let lines = wrap_lines(max_inner_w, &raw);
    if lines.is_empty() {
        return Ok(());
    }

    let inner_w = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(1, max_inner_w);
    let box_w = (inner_w + 4).min(cols.saturating_sub(2)).max(4);
    let inner_w = box_w.saturating_sub(4);
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = (body_h + 2).min(rows.saturating_sub(1)).max(3);

    let start_col = (cols.saturating_sub(box_w)) / 2 + 1;
    let start_row = (rows.saturating_sub(box_h)) / 2 + 1;
    let horiz = "=".repeat(box_w.saturating_sub(2));
    let blank = " ".repeat(inner_w);

    // Dim the scene behind the box; EL2 avoids edge-wrap artifacts.
    out.write_all(b"\x1b[0m\x1b[38;2;210;220;235m\x1b[48;2;3;3;6m")?;
    for row in 1..=rows {
        write!(out, "\x1b[{};1H\x1b[2K", row)?;
    }

    out.write_all(b"\x1b[0m\x1b[38;2;0;243;255m\x1b[48;2;0;16;32m")?;
    write!(out, "\x1b[{};{}H+{}+", start_row, start_col, horiz)?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = start_row + 1 + i;
        write!(out, "\x1b[{};{}H| {} |", row, start_col, blank)?;
        if i == 0 {
            // Title in frame gold.
            write!(
                out,
                "\x1b[{};{}H\x1b[1m\x1b[38;2;255;215;0m{}\x1b[22m\x1b[38;2;0;243;255m",
                row,
                start_col + 2,
                line
            )?;
        } else {
            write!(out, "\x1b[{};{}H{}", row, start_col + 2, line)?;
        }
    }
    write!(out, "\x1b[{};{}H+{}+", start_row + box_h - 1, start_col, horiz)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
