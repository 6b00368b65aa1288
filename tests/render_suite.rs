use holo_tree::config::{RendererMode, Rgb, SceneConfig, SceneMode};
use holo_tree::render::{
    braille_cell, make_renderer, wrap_lines, BrailleRenderer, Frame, HalfBlockRenderer, Renderer,
};
use holo_tree::scene::Scene;
use holo_tree::signal::{Gesture, HandSignal};
use holo_tree::visual::{SceneRaster, BACKGROUND, CURSOR_IDLE, CURSOR_PINCH};

fn make_frame<'a>(cols: u16, visual_rows: u16, raster: &'a SceneRaster, sync: bool) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 2,
        visual_rows,
        raster,
        hud: "Mode: Formed | Gesture: hover",
        hud_rows: 1,
        hud_accent: Some(CURSOR_IDLE),
        overlay: None,
        sync_updates: sync,
    }
}

fn bare_scene() -> Scene {
    let cfg = SceneConfig::default()
        .with_particle_count(0)
        .with_ornament_counts(0, 0)
        .with_panel_count(0);
    Scene::new(cfg, SceneMode::Formed, Some(1))
}

fn drawn(scene: &Scene, w: usize, h: usize) -> SceneRaster {
    let mut r = SceneRaster::new(w, h);
    r.draw(scene);
    r
}

// ── rasteriser ──────────────────────────────────────────────────────────────

#[test]
fn default_scene_draws_something() {
    let scene = Scene::new(SceneConfig::default().with_particle_count(2_000), SceneMode::Formed, Some(3));
    let r = drawn(&scene, 80, 60);
    let lit = r.pixels().iter().filter(|&&p| p != BACKGROUND).count();
    assert!(lit > 100, "only {lit} pixels drawn");
}

#[test]
fn empty_raster_is_harmless() {
    let scene = bare_scene();
    let r = drawn(&scene, 0, 0);
    assert!(r.pixels().is_empty());
    assert_eq!(r.aspect(), 1.0);
}

#[test]
fn cursor_ring_follows_gesture() {
    let mut scene = bare_scene();
    let r = drawn(&scene, 40, 40);
    assert!(!r.pixels().contains(&CURSOR_IDLE), "no hand, no cursor");

    let hover = HandSignal {
        x: 0.5,
        y: 0.5,
        gesture: Gesture::Hover,
        present: true,
    };
    scene.step(0.0, hover, 0.0);
    let r = drawn(&scene, 40, 40);
    assert!(r.pixels().contains(&CURSOR_IDLE));
    assert!(!r.pixels().contains(&CURSOR_PINCH));

    scene.step(0.0, HandSignal { gesture: Gesture::Pinch, ..hover }, 0.0);
    let r = drawn(&scene, 40, 40);
    assert!(r.pixels().contains(&CURSOR_PINCH));
}

#[test]
fn resize_clears_to_background() {
    let scene = Scene::new(SceneConfig::default(), SceneMode::Formed, Some(4));
    let mut r = drawn(&scene, 20, 20);
    r.resize(10, 6);
    assert_eq!((r.width(), r.height()), (10, 6));
    assert_eq!(r.pixels().len(), 60);
    assert!(r.pixels().iter().all(|&p| p == BACKGROUND));
}

// ── half-block ──────────────────────────────────────────────────────────────

#[test]
fn halfblock_renders_scene_raster() {
    let scene = Scene::new(SceneConfig::default().with_particle_count(500), SceneMode::Formed, Some(5));
    let (cols, rows) = (20u16, 8u16);
    let raster = drawn(&scene, cols as usize, rows as usize * 2);
    let frame = make_frame(cols, rows, &raster, true);

    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).expect("render");
    let s = String::from_utf8_lossy(&out);

    assert!(s.starts_with("\x1b[?2026h"), "missing sync begin");
    assert!(s.ends_with("\x1b[?2026l"), "missing sync end");
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l") && s.contains("\x1b[?7h"), "autowrap not toggled");
    assert_eq!(s.matches('▀').count(), cols as usize * rows as usize);
    assert!(s.contains("Mode: Formed"), "HUD text missing");
    assert!(s.contains("38;2;0;243;255m\x1b[1m"), "HUD accent missing");
}

#[test]
fn halfblock_skips_mismatched_raster() {
    let raster = SceneRaster::new(10, 10);
    let frame = make_frame(20, 8, &raster, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).expect("render");
    assert!(out.is_empty(), "size mismatch must skip the frame");
}

#[test]
fn no_sync_escapes_when_disabled() {
    let raster = SceneRaster::new(4, 4);
    let frame = make_frame(4, 2, &raster, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).expect("render");
    let s = String::from_utf8_lossy(&out);
    assert!(!s.contains("2026"));
}

#[test]
fn overlay_popup_is_drawn() {
    let raster = SceneRaster::new(40, 20);
    let mut frame = make_frame(40, 10, &raster, false);
    frame.overlay = Some("Holo Tree Hotkeys\nm  toggle");
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).expect("render");
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Holo Tree Hotkeys"));
    assert!(s.contains("m  toggle"));
}

// ── braille ─────────────────────────────────────────────────────────────────

#[test]
fn braille_renders_scene_raster() {
    let scene = Scene::new(SceneConfig::default().with_particle_count(500), SceneMode::Formed, Some(6));
    let (cols, rows) = (16u16, 6u16);
    let raster = drawn(&scene, cols as usize * 2, rows as usize * 4);
    let frame = make_frame(cols, rows, &raster, false);

    let mut out = Vec::new();
    let mut r = BrailleRenderer::new();
    assert_eq!(r.cell_pixels(), (2, 4));
    r.render(&frame, &mut out).expect("render");
    let s = String::from_utf8_lossy(&out);
    let glyphs = s
        .chars()
        .filter(|&c| c == ' ' || ('\u{2800}'..='\u{28ff}').contains(&c))
        .count();
    assert!(glyphs >= cols as usize * rows as usize);
    assert!(s.contains("\x1b[H"));
}

#[test]
fn braille_cell_splits_bright_and_dark() {
    let on = Rgb::new(250, 250, 250);
    let off = Rgb::new(10, 10, 10);
    let mut cell = [off; 8];
    cell[0] = on; // top-left dot
    cell[7] = on; // bottom-right dot
    let (fg, bg, ch) = braille_cell(&cell);
    assert_eq!(fg, on);
    assert_eq!(bg, off);
    assert_eq!(ch, '\u{2881}');

    let (fg, bg, ch) = braille_cell(&[off; 8]);
    assert_eq!((fg, bg, ch), (off, off, ' '));
}

#[test]
fn renderer_factory_matches_mode() {
    assert_eq!(make_renderer(RendererMode::HalfBlock).name(), "half-block");
    assert_eq!(make_renderer(RendererMode::HalfBlock).cell_pixels(), (1, 2));
    assert_eq!(make_renderer(RendererMode::Braille).name(), "braille");
}

#[test]
fn wrap_lines_hard_wraps() {
    let lines = vec!["abcdef".to_string(), String::new(), "xy".to_string()];
    assert_eq!(wrap_lines(4, &lines), vec!["abcd", "ef", "", "xy"]);
}
