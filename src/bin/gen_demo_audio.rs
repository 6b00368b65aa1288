use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Writes a loopable bell melody over a soft kick, for `holo_tree --audio-file`.
#[derive(Parser, Debug, Clone)]
#[command(name = "gen_demo_audio")]
pub struct Cli {
    #[arg(long, default_value = "assets/demo/bells.wav")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 44_100, value_parser = clap::value_parser!(u32).range(8_000..=192_000))]
    pub sample_rate: u32,

    #[arg(long, default_value_t = 112.0)]
    pub bpm: f32,

    /// Number of times the eight-bar phrase repeats.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub loops: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(parent) = cli.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }

    let samples = render_demo(cli.sample_rate, cli.bpm, cli.loops);
    write_wav(&cli.out, cli.sample_rate, &samples)
        .with_context(|| format!("write {}", cli.out.display()))?;

    println!("generated: {}", cli.out.display());
    println!(
        "sample_rate={}Hz duration={:.2}s samples={}",
        cli.sample_rate,
        samples.len() as f32 / cli.sample_rate as f32,
        samples.len()
    );
    Ok(())
}

const REST: i32 = -99;

/// Semitones above A4 for each beat of the eight-bar phrase.
const PHRASE: [i32; 32] = [
    7, 7, 7, REST, 7, 7, 7, REST, 7, 10, 3, 5, 7, REST, REST, REST, //
    8, 8, 8, 8, 8, 7, 7, 7, 7, 5, 5, 7, 5, REST, 10, REST,
];

pub fn render_demo(sr: u32, bpm: f32, loops: u32) -> Vec<f32> {
    let beat_s = 60.0 / bpm.clamp(40.0, 240.0);
    let beat_n = (beat_s * sr as f32).round() as usize;
    let total = beat_n * PHRASE.len() * loops as usize;
    let mut out = vec![0.0f32; total];

    for rep in 0..loops as usize {
        for (k, &degree) in PHRASE.iter().enumerate() {
            let start = (rep * PHRASE.len() + k) * beat_n;
            add_kick(&mut out, sr, start);
            if degree != REST {
                let freq = 440.0 * 2f32.powf(degree as f32 / 12.0);
                add_bell(&mut out, sr, start, freq, beat_s * 2.5);
            }
        }
    }

    // Fade the last few milliseconds so the loop point does not click.
    let fade = (sr as usize / 200).min(out.len());
    let len = out.len();
    for (i, s) in out[len - fade..].iter_mut().enumerate() {
        *s *= 1.0 - i as f32 / fade.max(1) as f32;
    }

    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        let gain = 0.9 / peak;
        for s in &mut out {
            *s *= gain;
        }
    }
    out
}

/// Inharmonic partials with exponential decay; wraps past the end so the loop is seamless.
fn add_bell(out: &mut [f32], sr: u32, start: usize, freq: f32, seconds: f32) {
    const PARTIALS: [(f32, f32); 4] = [(1.0, 0.6), (2.76, 0.25), (5.4, 0.12), (8.93, 0.06)];
    let n = (seconds * sr as f32) as usize;
    let len = out.len();
    for i in 0..n {
        let t = i as f32 / sr as f32;
        let env = (-t * 3.2).exp();
        let v: f32 = PARTIALS
            .iter()
            .map(|&(ratio, amp)| (2.0 * PI * freq * ratio * t).sin() * amp)
            .sum();
        out[(start + i) % len] += v * env * 0.5;
    }
}

fn add_kick(out: &mut [f32], sr: u32, start: usize) {
    let n = (0.18 * sr as f32) as usize;
    let len = out.len();
    for i in 0..n {
        let t = i as f32 / sr as f32;
        let freq = 50.0 + 90.0 * (-t * 30.0).exp();
        let env = (-t * 18.0).exp();
        out[(start + i) % len] += (2.0 * PI * freq * t).sin() * env * 0.7;
    }
}

pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
