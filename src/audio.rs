use crate::config::AudioSource;
use crate::signal::{AudioSignal, SharedAudioSignal, SPECTRUM_BINS};
use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const FFT_SIZE: usize = 512;
const HOP: usize = FFT_SIZE / 2;

pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio file given (use --audio-file)")]
    MissingFile,
    #[error("read wav: {0}")]
    Wav(#[from] hound::Error),
    #[error("wav file contains no samples")]
    EmptyWav,
    #[error("no {0} device found")]
    NoDevice(&'static str),
    #[error("no {kind} device matching {query:?}")]
    NoMatchingDevice { kind: &'static str, query: String },
    #[error("enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[error("query device config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("build stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),
}

/// Magnitude spectrum of the most recent `FFT_SIZE` samples, as bytes.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buf: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let n = FFT_SIZE;
        let window = (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * t).cos() + 0.08 * (4.0 * PI * t).cos()
            })
            .collect();
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(n),
            window,
            buf: vec![Complex { re: 0.0, im: 0.0 }; n],
        }
    }

    /// Uses the last `FFT_SIZE` samples; shorter input is zero-padded at the front.
    pub fn analyze(&mut self, samples: &[f32]) -> AudioSignal {
        let n = FFT_SIZE;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, c) in self.buf.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { tail[i - pad] };
            c.re = s * self.window[i];
            c.im = 0.0;
        }
        self.fft.process(&mut self.buf);

        let mut spectrum = [0u8; SPECTRUM_BINS];
        for (dst, c) in spectrum.iter_mut().zip(&self.buf) {
            *dst = magnitude_to_byte(c.norm() / n as f32);
        }
        AudioSignal {
            average: average_level(&spectrum),
            spectrum,
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a linear magnitude onto 0..255 across the [MIN_DECIBELS, MAX_DECIBELS] range.
pub fn magnitude_to_byte(mag: f32) -> u8 {
    if !(mag > 0.0) {
        return 0;
    }
    let db = 20.0 * mag.log10();
    let t = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    (t * 255.0).clamp(0.0, 255.0) as u8
}

pub fn average_level(spectrum: &[u8]) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }
    spectrum.iter().map(|&b| b as f32).sum::<f32>() / spectrum.len() as f32
}

/// Mono samples of a decoded WAV file.
#[derive(Debug, Clone)]
pub struct WavClip {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

pub fn load_wav(path: &Path) -> Result<WavClip, AudioError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    if samples.is_empty() {
        return Err(AudioError::EmptyWav);
    }
    Ok(WavClip {
        samples,
        sample_rate_hz: spec.sample_rate,
    })
}

/// Endless playback position over a clip, stepping fractionally when the
/// device rate differs from the clip rate.
#[derive(Debug, Clone)]
pub struct LoopCursor {
    samples: Vec<f32>,
    pos: f64,
    step: f64,
}

impl LoopCursor {
    pub fn new(clip: WavClip, output_rate_hz: u32) -> Self {
        let step = clip.sample_rate_hz as f64 / output_rate_hz.max(1) as f64;
        Self {
            samples: clip.samples,
            pos: 0.0,
            step,
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let len = self.samples.len();
        if len == 0 {
            return 0.0;
        }
        let i = self.pos as usize % len;
        let frac = (self.pos - self.pos.floor()) as f32;
        let a = self.samples[i];
        let b = self.samples[(i + 1) % len];
        self.pos = (self.pos + self.step) % len as f64;
        a + (b - a) * frac
    }
}

pub fn list_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let mut out = io::stdout();

    writeln!(out, "Output devices:")?;
    for dev in host.output_devices().context("enumerate output devices")? {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }

    writeln!(out, "Input devices:")?;
    for dev in host.input_devices().context("enumerate input devices")? {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// A running device stream feeding the analyser thread.
pub struct AudioSystem {
    stream: cpal::Stream,
    stop: Arc<AtomicBool>,
    playing: Arc<AtomicBool>,
    analyzer_handle: Option<thread::JoinHandle<()>>,
    pub device_name: String,
    pub sample_rate_hz: u32,
}

impl AudioSystem {
    pub fn new(
        source: AudioSource,
        file: Option<&Path>,
        device_query: Option<&str>,
        signal: Arc<SharedAudioSignal>,
    ) -> Result<Self, AudioError> {
        match source {
            AudioSource::File => {
                let path = file.ok_or(AudioError::MissingFile)?;
                let clip = load_wav(path)?;
                Self::new_file(clip, device_query, signal)
            }
            AudioSource::Mic => Self::new_mic(device_query, signal),
        }
    }

    fn new_file(
        clip: WavClip,
        device_query: Option<&str>,
        signal: Arc<SharedAudioSignal>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let devices = host.output_devices()?.collect::<Vec<_>>();
        let device = select_device(devices, host.default_output_device(), device_query, "output")?;
        let supported = device.default_output_config()?;
        let sample_rate_hz = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.clone().into();

        let (prod, cons) = HeapRb::<f32>::new(ring_capacity(sample_rate_hz)).split();
        let playing = Arc::new(AtomicBool::new(true));
        let cursor = LoopCursor::new(clip, sample_rate_hz);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_output::<f32>(&device, &config, cursor, prod, Arc::clone(&playing))?,
            SampleFormat::I16 => build_output::<i16>(&device, &config, cursor, prod, Arc::clone(&playing))?,
            SampleFormat::U16 => build_output::<u16>(&device, &config, cursor, prod, Arc::clone(&playing))?,
            fmt => return Err(AudioError::UnsupportedFormat(fmt)),
        };
        stream.play()?;

        Ok(Self::start(stream, cons, playing, signal, &device, sample_rate_hz))
    }

    fn new_mic(device_query: Option<&str>, signal: Arc<SharedAudioSignal>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let devices = host.input_devices()?.collect::<Vec<_>>();
        let device = select_device(devices, host.default_input_device(), device_query, "input")?;
        let supported = device.default_input_config()?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let (mut prod, cons) = HeapRb::<f32>::new(ring_capacity(sample_rate_hz)).split();
        let playing = Arc::new(AtomicBool::new(true));
        let err_fn = |err: cpal::StreamError| tracing::error!("audio input stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(AudioError::UnsupportedFormat(fmt)),
        };
        stream.play()?;

        Ok(Self::start(stream, cons, playing, signal, &device, sample_rate_hz))
    }

    fn start(
        stream: cpal::Stream,
        mut cons: ringbuf::HeapCons<f32>,
        playing: Arc<AtomicBool>,
        signal: Arc<SharedAudioSignal>,
        device: &cpal::Device,
        sample_rate_hz: u32,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let playing_for_thread = Arc::clone(&playing);

        let analyzer_handle = thread::spawn(move || {
            analyze_loop(&mut cons, &stop_for_thread, &playing_for_thread, &signal)
        });

        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        tracing::info!("audio started on {device_name} @ {sample_rate_hz} Hz");

        Self {
            stream,
            stop,
            playing,
            analyzer_handle: Some(analyzer_handle),
            device_name,
            sample_rate_hz,
        }
    }

    pub fn set_playing(&self, on: bool) {
        self.playing.store(on, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer_handle.take() {
            let _ = h.join();
        }
        // The stream field is released after this body, once the analyser has exited.
        if let Err(err) = self.stream.pause() {
            tracing::debug!("pause stream on teardown: {err}");
        }
    }
}

/// Play/pause front end. The device stream is only opened on the first `play`.
pub struct AudioEngine {
    source: AudioSource,
    file: Option<PathBuf>,
    device_query: Option<String>,
    system: Option<AudioSystem>,
    signal: Arc<SharedAudioSignal>,
    last_error: Option<String>,
}

impl AudioEngine {
    pub fn new(source: AudioSource, file: Option<PathBuf>, device_query: Option<String>) -> Self {
        Self {
            source,
            file,
            device_query,
            system: None,
            signal: Arc::new(SharedAudioSignal::new()),
            last_error: None,
        }
    }

    /// Starts or resumes playback. Failures are logged and retried on the next call.
    pub fn play(&mut self) -> bool {
        if self.system.is_none() {
            match AudioSystem::new(
                self.source,
                self.file.as_deref(),
                self.device_query.as_deref(),
                Arc::clone(&self.signal),
            ) {
                Ok(system) => {
                    self.last_error = None;
                    self.system = Some(system);
                }
                Err(err) => {
                    tracing::warn!("audio playback unavailable: {err}");
                    self.last_error = Some(err.to_string());
                    return false;
                }
            }
        }

        if let Some(system) = &self.system {
            system.set_playing(true);
        }
        true
    }

    pub fn pause(&mut self) {
        if let Some(system) = &self.system {
            system.set_playing(false);
        }
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.system.as_ref().is_some_and(AudioSystem::is_playing)
    }

    pub fn is_started(&self) -> bool {
        self.system.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.system.as_ref().map(|s| s.device_name.as_str())
    }

    pub fn signal(&self) -> Arc<SharedAudioSignal> {
        Arc::clone(&self.signal)
    }
}

fn ring_capacity(sample_rate_hz: u32) -> usize {
    (sample_rate_hz as usize).saturating_mul(4)
}

fn select_device(
    devices: Vec<cpal::Device>,
    default: Option<cpal::Device>,
    device_query: Option<&str>,
    kind: &'static str,
) -> Result<cpal::Device, AudioError> {
    if let Some(query) = device_query {
        let want = query.to_lowercase();
        return devices
            .into_iter()
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&want))
                    .unwrap_or(false)
            })
            .ok_or_else(|| AudioError::NoMatchingDevice {
                kind,
                query: query.to_string(),
            });
    }
    default.ok_or(AudioError::NoDevice(kind))
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut cursor: LoopCursor,
    mut prod: ringbuf::HeapProd<f32>,
    playing: Arc<AtomicBool>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = (config.channels as usize).max(1);
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let live = playing.load(Ordering::Relaxed);
            for frame in data.chunks_mut(channels) {
                let s = if live {
                    let s = cursor.next_sample();
                    let _ = prod.try_push(s);
                    s
                } else {
                    0.0
                };
                let v = T::from_sample(s);
                for out in frame.iter_mut() {
                    *out = v;
                }
            }
        },
        |err| tracing::error!("audio output stream error: {err}"),
        None,
    )
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / channels as f32;
        let _ = prod.try_push(mono);
    }
}

fn analyze_loop(
    cons: &mut ringbuf::HeapCons<f32>,
    stop: &AtomicBool,
    playing: &AtomicBool,
    signal: &SharedAudioSignal,
) {
    let n = FFT_SIZE;
    let mut ring = vec![0.0f32; n];
    let mut frame = vec![0.0f32; n];
    let mut write_pos = 0usize;
    let mut filled = 0usize;
    let mut since_last = 0usize;
    let mut analyzer = SpectrumAnalyzer::new();

    while !stop.load(Ordering::Relaxed) {
        let mut got_any = false;
        while let Some(s) = cons.try_pop() {
            got_any = true;
            if !playing.load(Ordering::Relaxed) {
                continue;
            }
            ring[write_pos] = s;
            write_pos = (write_pos + 1) % n;
            if filled < n {
                filled += 1;
            }
            since_last += 1;
            if filled == n && since_last >= HOP {
                since_last = 0;
                for (i, dst) in frame.iter_mut().enumerate() {
                    *dst = ring[(write_pos + i) % n];
                }
                signal.store(&analyzer.analyze(&frame));
            }
        }

        if !got_any {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
