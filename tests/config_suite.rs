use clap::Parser;
use holo_tree::config::{
    AudioSource, ColorParseError, Config, RendererMode, Rgb, SceneConfig, SceneMode, MAX_ORNAMENTS,
    MAX_PANELS, MAX_PARTICLES, PALETTES,
};
use holo_tree::logging::parse_level;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[test]
fn defaults_match_documented_flags() {
    let cfg = Config::try_parse_from(["holo_tree"]).expect("defaults parse");
    assert_eq!(cfg.fps, 60);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.mode, SceneMode::Formed);
    assert_eq!((cfg.particles, cfg.boxes, cfg.bells, cfg.panels), (5000, 250, 250, 8));
    assert_eq!(cfg.particle_color1, Rgb::new(0x00, 0xf3, 0xff));
    assert_eq!(cfg.particle_color2, Rgb::new(0xff, 0x00, 0xaa));
    assert_eq!(cfg.box_color1, Rgb::new(0xff, 0x00, 0x00));
    assert_eq!(cfg.box_color2, Rgb::new(0x00, 0xff, 0x00));
    assert_eq!(cfg.bell_color, Rgb::new(0xff, 0xd7, 0x00));
    assert_eq!(cfg.audio_source, AudioSource::File);
    assert_eq!(cfg.audio_file, None);
    assert!(!cfg.autoplay);
    assert_eq!(cfg.landmarks, None);
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.sync_updates);
    assert!(!cfg.list_devices);
    assert_eq!(cfg.log_path(), std::env::temp_dir().join("holo_tree.log"));

    assert_eq!(cfg.scene_config(), SceneConfig::default());
}

#[test]
fn overrides_parse() {
    let cfg = Config::try_parse_from([
        "holo_tree",
        "--renderer",
        "braille",
        "--mode",
        "float",
        "--particles",
        "1200",
        "--particle-color1",
        "112233",
        "--bell-color",
        "#ABCDEF",
        "--audio-source",
        "mic",
        "--audio-file",
        "song.wav",
        "--landmarks",
        "127.0.0.1:7070",
        "--seed",
        "99",
        "--log-file",
        "logs/run.log",
        "--sync-updates",
        "false",
    ])
    .expect("parse should succeed");

    assert_eq!(cfg.renderer, RendererMode::Braille);
    assert_eq!(cfg.mode, SceneMode::Scattered);
    assert_eq!(cfg.particles, 1200);
    assert_eq!(cfg.particle_color1, Rgb::new(0x11, 0x22, 0x33));
    assert_eq!(cfg.bell_color, Rgb::new(0xab, 0xcd, 0xef));
    assert_eq!(cfg.audio_source, AudioSource::Mic);
    assert_eq!(cfg.audio_file, Some(PathBuf::from("song.wav")));
    assert_eq!(cfg.landmarks.as_deref(), Some("127.0.0.1:7070"));
    assert_eq!(cfg.seed, Some(99));
    assert_eq!(cfg.log_path(), PathBuf::from("logs/run.log"));
    assert!(!cfg.sync_updates);

    let scene = cfg.scene_config();
    assert_eq!(scene.particle_count, 1200);
    assert_eq!(scene.particle_colors.0, Rgb::new(0x11, 0x22, 0x33));
}

#[test]
fn bad_colour_is_rejected_by_the_parser() {
    assert!(Config::try_parse_from(["holo_tree", "--box-color1", "red"]).is_err());
}

#[test]
fn scene_config_clamps_counts() {
    let cfg = Config::try_parse_from(["holo_tree", "--particles", "999999", "--panels", "1000"])
        .expect("parse");
    let scene = cfg.scene_config();
    assert_eq!(scene.particle_count, MAX_PARTICLES);
    assert_eq!(scene.panel_count, MAX_PANELS);

    let s = SceneConfig::default()
        .with_particle_count(usize::MAX)
        .with_ornament_counts(MAX_ORNAMENTS + 1, 3)
        .with_panel_count(0);
    assert_eq!(s.particle_count, MAX_PARTICLES);
    assert_eq!((s.box_count, s.bell_count), (MAX_ORNAMENTS, 3));
    assert_eq!(s.panel_count, 0);
}

#[test]
fn palette_replaces_every_colour() {
    let p = PALETTES[2];
    let s = SceneConfig::default().with_palette(p);
    assert_eq!(s.particle_colors, p.particles);
    assert_eq!(s.box_colors, p.boxes);
    assert_eq!(s.bell_color, p.bell);
    assert_eq!(SceneConfig::default().with_palette(PALETTES[0]), SceneConfig::default());
}

#[test]
fn scene_mode_toggles() {
    assert_eq!(SceneMode::Formed.toggled(), SceneMode::Scattered);
    assert_eq!(SceneMode::Scattered.toggled(), SceneMode::Formed);
    assert_eq!(SceneMode::default(), SceneMode::Formed);
}

// ── Rgb ─────────────────────────────────────────────────────────────────────

#[test]
fn rgb_parses_with_and_without_hash() {
    assert_eq!("#ff00aa".parse::<Rgb>(), Ok(Rgb::new(0xff, 0x00, 0xaa)));
    assert_eq!(" 00F3FF ".parse::<Rgb>(), Ok(Rgb::new(0x00, 0xf3, 0xff)));
    assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
}

#[test]
fn rgb_reports_what_went_wrong() {
    assert!(matches!("#fff".parse::<Rgb>(), Err(ColorParseError::Length(_))));
    assert!(matches!("#1234567".parse::<Rgb>(), Err(ColorParseError::Length(_))));
    assert!(matches!("#12345g".parse::<Rgb>(), Err(ColorParseError::Digit(_))));
    assert!(matches!("".parse::<Rgb>(), Err(ColorParseError::Length(_))));
}

#[test]
fn rgb_mix_and_scale() {
    let a = Rgb::new(0, 100, 200);
    let b = Rgb::new(200, 100, 0);
    assert_eq!(a.mix(b, 0.0), a);
    assert_eq!(a.mix(b, 1.0), b);
    assert_eq!(a.mix(b, 0.5), Rgb::new(100, 100, 100));
    assert_eq!(a.scaled(0.5), Rgb::new(0, 50, 100));
    assert_eq!(a.scaled(10.0), Rgb::new(0, 255, 255));
    assert_eq!(a.scaled(-1.0), Rgb::new(0, 0, 0));
}

// ── logging ─────────────────────────────────────────────────────────────────

#[test]
fn log_level_parsing_falls_back_to_info() {
    assert_eq!(parse_level("debug"), LevelFilter::DEBUG);
    assert_eq!(parse_level(" WARN "), LevelFilter::WARN);
    assert_eq!(parse_level("off"), LevelFilter::OFF);
    assert_eq!(parse_level("chatty"), LevelFilter::INFO);
}
