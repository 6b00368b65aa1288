use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PARTICLES: usize = 5000;
pub const DEFAULT_BOXES: usize = 250;
pub const DEFAULT_BELLS: usize = 250;
pub const DEFAULT_PANELS: usize = 8;

pub const MAX_PARTICLES: usize = 20_000;
pub const MAX_ORNAMENTS: usize = 2_000;
pub const MAX_PANELS: usize = 32;

#[derive(Parser, Debug, Clone)]
#[command(name = "holo_tree", version, about = "Gesture- and audio-reactive particle tree for the terminal")]
pub struct Config {
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, value_enum, default_value_t = SceneMode::Formed)]
    pub mode: SceneMode,

    #[arg(long, default_value_t = DEFAULT_PARTICLES)]
    pub particles: usize,

    #[arg(long, default_value_t = DEFAULT_BOXES)]
    pub boxes: usize,

    #[arg(long, default_value_t = DEFAULT_BELLS)]
    pub bells: usize,

    #[arg(long, default_value_t = DEFAULT_PANELS)]
    pub panels: usize,

    #[arg(long, default_value = "#00f3ff")]
    pub particle_color1: Rgb,

    #[arg(long, default_value = "#ff00aa")]
    pub particle_color2: Rgb,

    #[arg(long, default_value = "#ff0000")]
    pub box_color1: Rgb,

    #[arg(long, default_value = "#00ff00")]
    pub box_color2: Rgb,

    #[arg(long, default_value = "#ffd700")]
    pub bell_color: Rgb,

    #[arg(long, value_enum, default_value_t = AudioSource::File)]
    pub audio_source: AudioSource,

    #[arg(long)]
    pub audio_file: Option<PathBuf>,

    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub autoplay: bool,

    /// UDP address to receive hand landmark frames on, e.g. 127.0.0.1:7070.
    #[arg(long)]
    pub landmarks: Option<String>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,
}

impl Config {
    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            particle_count: self.particles.min(MAX_PARTICLES),
            box_count: self.boxes.min(MAX_ORNAMENTS),
            bell_count: self.bells.min(MAX_ORNAMENTS),
            panel_count: self.panels.min(MAX_PANELS),
            particle_colors: (self.particle_color1, self.particle_color2),
            box_colors: (self.box_color1, self.box_color2),
            bell_color: self.bell_color,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("holo_tree.log"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    File,
    Mic,
}

/// Which static layout every animated object blends toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SceneMode {
    #[default]
    #[value(alias = "tree")]
    Formed,
    #[value(alias = "float")]
    Scattered,
}

impl SceneMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Formed => Self::Scattered,
            Self::Scattered => Self::Formed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Formed => "Formed",
            Self::Scattered => "Scattered",
        }
    }
}

/// Counts and colours of every generated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneConfig {
    pub particle_count: usize,
    pub box_count: usize,
    pub bell_count: usize,
    pub panel_count: usize,
    pub particle_colors: (Rgb, Rgb),
    pub box_colors: (Rgb, Rgb),
    pub bell_color: Rgb,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let palette = PALETTES[0];
        Self {
            particle_count: DEFAULT_PARTICLES,
            box_count: DEFAULT_BOXES,
            bell_count: DEFAULT_BELLS,
            panel_count: DEFAULT_PANELS,
            particle_colors: palette.particles,
            box_colors: palette.boxes,
            bell_color: palette.bell,
        }
    }
}

impl SceneConfig {
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count.min(MAX_PARTICLES);
        self
    }

    pub fn with_ornament_counts(mut self, boxes: usize, bells: usize) -> Self {
        self.box_count = boxes.min(MAX_ORNAMENTS);
        self.bell_count = bells.min(MAX_ORNAMENTS);
        self
    }

    pub fn with_panel_count(mut self, count: usize) -> Self {
        self.panel_count = count.min(MAX_PANELS);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.particle_colors = palette.particles;
        self.box_colors = palette.boxes;
        self.bell_color = palette.bell;
        self
    }
}

/// A named set of collection colours, cycled at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub particles: (Rgb, Rgb),
    pub boxes: (Rgb, Rgb),
    pub bell: Rgb,
}

pub const PALETTES: [Palette; 3] = [
    Palette {
        name: "Hologram",
        particles: (Rgb::new(0x00, 0xf3, 0xff), Rgb::new(0xff, 0x00, 0xaa)),
        boxes: (Rgb::new(0xff, 0x00, 0x00), Rgb::new(0x00, 0xff, 0x00)),
        bell: Rgb::new(0xff, 0xd7, 0x00),
    },
    Palette {
        name: "Evergreen",
        particles: (Rgb::new(0x1f, 0xc2, 0x5a), Rgb::new(0xf5, 0xf5, 0xdc)),
        boxes: (Rgb::new(0xc0, 0x1c, 0x28), Rgb::new(0xf6, 0xd3, 0x2d)),
        bell: Rgb::new(0xe0, 0xe0, 0xe8),
    },
    Palette {
        name: "Frost",
        particles: (Rgb::new(0xb8, 0xe6, 0xff), Rgb::new(0x6a, 0x5a, 0xff)),
        boxes: (Rgb::new(0xff, 0xff, 0xff), Rgb::new(0x3a, 0x9b, 0xdc)),
        bell: Rgb::new(0xc0, 0xc8, 0xd8),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn scaled(self, k: f32) -> Self {
        let k = k.max(0.0);
        let ch = |v: u8| ((v as f32) * k).round().clamp(0.0, 255.0) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    pub fn mix(self, other: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(ch(self.r, other.r), ch(self.g, other.g), ch(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("expected 6 hex digits (#rrggbb), got {0:?}")]
    Length(String),
    #[error("invalid hex digit in {0:?}")]
    Digit(String),
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorParseError::Length(raw.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError::Digit(raw.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}
