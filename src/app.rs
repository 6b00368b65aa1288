use crate::audio::AudioEngine;
use crate::config::{Config, Rgb, SceneConfig, PALETTES};
use crate::hand::{select_hand, HandTracker, PointerFallback};
use crate::render::{make_renderer, wrap_lines, Frame, Renderer};
use crate::scene::Scene;
use crate::signal::{Gesture, HandSignal};
use crate::terminal::TerminalGuard;
use crate::visual::{SceneRaster, CURSOR_IDLE, CURSOR_PINCH, FRAME_GOLD};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

const PARTICLE_STEP: usize = 500;
const ORNAMENT_STEP: usize = 25;

/// What a key press asked the loop to do beyond mutating `Controls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    ToggleMode,
    TogglePlayback,
    Reconfigure,
}

/// Runtime-adjustable state driven by the keyboard.
struct Controls {
    scene: SceneConfig,
    palette: usize,
    show_hud: bool,
    show_help: bool,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer = make_renderer(cfg.renderer);
    let (px_w_mul, px_h_mul) = renderer.cell_pixels();

    let mut controls = Controls {
        scene: cfg.scene_config(),
        palette: 0,
        show_hud: true,
        show_help: false,
    };
    let mut scene = Scene::new(controls.scene, cfg.mode, cfg.seed);

    let mut audio = AudioEngine::new(cfg.audio_source, cfg.audio_file.clone(), cfg.device.clone());
    if cfg.autoplay && !audio.play() {
        tracing::warn!("autoplay blocked; press space to retry");
    }
    let audio_signal = audio.signal();

    let tracker = match cfg.landmarks.as_deref() {
        Some(addr) => HandTracker::connect(addr),
        None => HandTracker::disabled(),
    };
    let hand_signal = tracker.signal();

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut hud_rows = hud_rows_for_size(last_size, controls.show_hud);
    let mut pointer = PointerFallback::new(last_size.0, visual_rows_for(last_size, hud_rows));
    let mut raster = SceneRaster::new(0, 0);
    resize_viewport(&mut raster, &mut scene, &mut pointer, last_size, px_w_mul, px_h_mul, hud_rows);

    let mut last_frame = Instant::now();
    let mut fps = FpsCounter::new();
    tracing::info!(
        "holo_tree running: renderer={} mode={} landmarks={}",
        renderer.name(),
        scene.mode().label(),
        if tracker.is_active() { "udp" } else { "off" }
    );

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let old_hud = controls.show_hud;
                    match handle_key(k.code, k.modifiers, &mut controls) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::ToggleMode => {
                            let mode = scene.toggle_mode();
                            tracing::info!("scene mode -> {}", mode.label());
                        }
                        KeyAction::TogglePlayback => {
                            audio.toggle();
                        }
                        KeyAction::Reconfigure => scene.apply_config(controls.scene),
                        KeyAction::None => {}
                    }
                    if controls.show_hud != old_hud {
                        hud_rows = hud_rows_for_size(last_size, controls.show_hud);
                        resize_viewport(
                            &mut raster, &mut scene, &mut pointer, last_size, px_w_mul, px_h_mul, hud_rows,
                        );
                    }
                }
                Event::Mouse(m) => pointer.handle_mouse(&m),
                Event::FocusLost => pointer.focus_lost(),
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    hud_rows = hud_rows_for_size(last_size, controls.show_hud);
                    resize_viewport(
                        &mut raster, &mut scene, &mut pointer, last_size, px_w_mul, px_h_mul, hud_rows,
                    );
                }
                _ => {}
            }
        }

        // Size check once per frame (resize events can be missed in some terminals).
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
            hud_rows = hud_rows_for_size(last_size, controls.show_hud);
            resize_viewport(&mut raster, &mut scene, &mut pointer, last_size, px_w_mul, px_h_mul, hud_rows);
        }

        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let hand = select_hand(hand_signal.load(), pointer.signal());
        let beat = audio_signal.load().level();
        scene.step(dt, hand, beat);

        let (term_cols, term_rows) = last_size;
        let audio_status = audio_status(&audio, audio_signal.age_ms());
        let hud = if controls.show_hud {
            build_wrapped_hud(
                term_cols as usize,
                &scene,
                PALETTES[controls.palette].name,
                &audio_status,
                &tracker.status(),
                fps.fps(),
                renderer.name(),
            )
        } else {
            String::new()
        };

        let target_hud_rows = hud_rows_for_text(term_rows, controls.show_hud, &hud);
        if target_hud_rows != hud_rows {
            hud_rows = target_hud_rows;
            resize_viewport(&mut raster, &mut scene, &mut pointer, last_size, px_w_mul, px_h_mul, hud_rows);
        }
        let visual_rows = visual_rows_for(last_size, hud_rows);

        raster.draw(&scene);

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            raster: &raster,
            hud: &hud,
            hud_rows,
            hud_accent: Some(gesture_accent(&hand, scene.interaction().grabbed.is_some())),
            overlay: controls.show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn visual_rows_for(size: (u16, u16), hud_rows: u16) -> u16 {
    size.1.saturating_sub(hud_rows).max(1)
}

fn resize_viewport(
    raster: &mut SceneRaster,
    scene: &mut Scene,
    pointer: &mut PointerFallback,
    size: (u16, u16),
    px_w_mul: usize,
    px_h_mul: usize,
    hud_rows: u16,
) {
    let (cols, _) = size;
    let visual_rows = visual_rows_for(size, hud_rows);
    let w = (cols as usize).saturating_mul(px_w_mul);
    let h = (visual_rows as usize).saturating_mul(px_h_mul);
    raster.resize(w, h);
    scene.set_aspect(raster.aspect());
    pointer.set_viewport(cols, visual_rows);
}

fn handle_key(code: KeyCode, mods: KeyModifiers, controls: &mut Controls) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }

    let cfg = controls.scene;
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char('m') | KeyCode::Char('M') => KeyAction::ToggleMode,
        KeyCode::Char(' ') => KeyAction::TogglePlayback,
        KeyCode::Char('+') | KeyCode::Char('=') => {
            controls.scene = cfg.with_particle_count(cfg.particle_count + PARTICLE_STEP);
            KeyAction::Reconfigure
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            controls.scene = cfg.with_particle_count(cfg.particle_count.saturating_sub(PARTICLE_STEP));
            KeyAction::Reconfigure
        }
        KeyCode::Char(']') => {
            controls.scene =
                cfg.with_ornament_counts(cfg.box_count + ORNAMENT_STEP, cfg.bell_count + ORNAMENT_STEP);
            KeyAction::Reconfigure
        }
        KeyCode::Char('[') => {
            controls.scene = cfg.with_ornament_counts(
                cfg.box_count.saturating_sub(ORNAMENT_STEP),
                cfg.bell_count.saturating_sub(ORNAMENT_STEP),
            );
            KeyAction::Reconfigure
        }
        KeyCode::Char('c') | KeyCode::Char('C') => {
            controls.palette = (controls.palette + 1) % PALETTES.len();
            controls.scene = cfg.with_palette(PALETTES[controls.palette]);
            KeyAction::Reconfigure
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            controls.scene = cfg.with_panel_count(cfg.panel_count + 1);
            KeyAction::Reconfigure
        }
        KeyCode::Char('x') | KeyCode::Char('X') => {
            controls.scene = cfg.with_panel_count(cfg.panel_count.saturating_sub(1));
            KeyAction::Reconfigure
        }
        KeyCode::Char('i') | KeyCode::Char('I') => {
            controls.show_hud = !controls.show_hud;
            KeyAction::None
        }
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => {
            controls.show_help = !controls.show_help;
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

fn audio_status(audio: &AudioEngine, age_ms: f32) -> String {
    if audio.is_playing() {
        let device = audio.device_name().unwrap_or("?");
        format!("playing ({device}, {age_ms:.0}ms)")
    } else if let Some(err) = audio.last_error() {
        format!("unavailable ({err})")
    } else if audio.is_started() {
        "paused".to_string()
    } else {
        "stopped".to_string()
    }
}

fn gesture_accent(hand: &HandSignal, grabbing: bool) -> Rgb {
    if grabbing {
        return FRAME_GOLD;
    }
    match hand.gesture {
        Gesture::Pinch | Gesture::Open if hand.present => CURSOR_PINCH,
        _ => CURSOR_IDLE,
    }
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud {
        return 0;
    }
    let rows = size.1;
    if rows <= 1 {
        return 0;
    }
    (rows - 1).min(3)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    let wanted = hud.lines().count() as u16;
    wanted.min(max_rows)
}

fn build_wrapped_hud(
    cols: usize,
    scene: &Scene,
    palette: &str,
    audio_status: &str,
    hand_status: &str,
    fps: f32,
    renderer_name: &str,
) -> String {
    let hand = scene.hand();
    let interaction = scene.interaction();
    let cfg = scene.config();
    let grabbed = interaction.grabbed.map_or_else(|| "-".to_string(), |i| i.to_string());

    let logical_lines = vec![
        format!(
            "Mode: {} | Gesture: {}{} | Grab: {} | Hover: {} | Beat: {:>4.2} | FPS: {:>4.1}",
            scene.mode().label(),
            hand.gesture.label(),
            if hand.present { "" } else { " (no hand)" },
            grabbed,
            if interaction.hovered { "yes" } else { "no" },
            scene.beat(),
            fps,
        ),
        format!(
            "Particles: {} | Boxes: {} | Bells: {} | Panels: {} | Palette: {} | Audio: {} | Hand: {} | Renderer: {}",
            cfg.particle_count,
            cfg.box_count,
            cfg.bell_count,
            cfg.panel_count,
            palette,
            audio_status,
            hand_status,
            renderer_name,
        ),
        "Keys: m mode | space play | +/- particles | [/] ornaments | c palette | n/x panels | i HUD | ?/h help | q quit"
            .to_string(),
    ];

    wrap_lines(cols, &logical_lines).join("\n")
}

fn help_popup_text() -> &'static str {
    "Holo Tree Hotkeys\n\
m  toggle formed tree / scattered cloud\n\
space  play / pause audio\n\
+ / -  more / fewer particles\n\
] / [  more / fewer gift boxes and bells\n\
c  cycle colour palette\n\
n / x  add / remove a photo panel\n\
Mouse:\n\
  move  hover (cursor ring)\n\
  hold left button  pinch: shatter and grab a panel\n\
  release  drop the panel\n\
i  show/hide HUD\n\
? or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
