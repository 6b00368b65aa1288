use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const SPECTRUM_BINS: usize = 256;
const SPECTRUM_WORDS: usize = SPECTRUM_BINS / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Hover,
    Pinch,
    Open,
}

impl Gesture {
    /// Open or pinching hands push every object out along its explosion direction.
    pub fn is_shattering(self) -> bool {
        matches!(self, Self::Open | Self::Pinch)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Hover => "hover",
            Self::Pinch => "pinch",
            Self::Open => "open",
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::Hover => 1,
            Self::Pinch => 2,
            Self::Open => 3,
        }
    }

    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::Hover,
            2 => Self::Pinch,
            3 => Self::Open,
            _ => Self::Idle,
        }
    }
}

/// Normalized pointer position (0..1, origin top-left) plus the classified gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSignal {
    pub x: f32,
    pub y: f32,
    pub gesture: Gesture,
    pub present: bool,
}

impl HandSignal {
    pub fn absent() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            gesture: Gesture::Idle,
            present: false,
        }
    }

    /// Pointer position in normalized device coordinates (-1..1, +y up).
    pub fn ndc(&self) -> (f32, f32) {
        (self.x * 2.0 - 1.0, -(self.y * 2.0 - 1.0))
    }
}

impl Default for HandSignal {
    fn default() -> Self {
        Self::absent()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSignal {
    /// Mean of the spectrum bytes, 0..255.
    pub average: f32,
    pub spectrum: [u8; SPECTRUM_BINS],
}

impl AudioSignal {
    pub fn silent() -> Self {
        Self {
            average: 0.0,
            spectrum: [0; SPECTRUM_BINS],
        }
    }

    /// Beat intensity in 0..1.
    pub fn level(&self) -> f32 {
        (self.average / 255.0).clamp(0.0, 1.0)
    }
}

impl Default for AudioSignal {
    fn default() -> Self {
        Self::silent()
    }
}

pub struct SharedHandSignal {
    seq: AtomicU64,
    x: AtomicU32,
    y: AtomicU32,
    gesture: AtomicU32,
    present: AtomicU32,
    updated_ms: AtomicU64,
}

impl SharedHandSignal {
    pub fn new() -> Self {
        let absent = HandSignal::absent();
        Self {
            seq: AtomicU64::new(0),
            x: AtomicU32::new(absent.x.to_bits()),
            y: AtomicU32::new(absent.y.to_bits()),
            gesture: AtomicU32::new(absent.gesture.to_bits()),
            present: AtomicU32::new(0),
            updated_ms: AtomicU64::new(0),
        }
    }

    pub fn store(&self, s: HandSignal) {
        self.seq.fetch_add(1, Ordering::Relaxed); // odd => write in progress
        fence(Ordering::Release);
        self.x.store(s.x.to_bits(), Ordering::Relaxed);
        self.y.store(s.y.to_bits(), Ordering::Relaxed);
        self.gesture.store(s.gesture.to_bits(), Ordering::Relaxed);
        self.present
            .store(if s.present { 1 } else { 0 }, Ordering::Relaxed);
        self.updated_ms.store(now_ms(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    pub fn load(&self) -> HandSignal {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let x = f32::from_bits(self.x.load(Ordering::Relaxed));
            let y = f32::from_bits(self.y.load(Ordering::Relaxed));
            let gesture = Gesture::from_bits(self.gesture.load(Ordering::Relaxed));
            let present = self.present.load(Ordering::Relaxed) != 0;

            fence(Ordering::Acquire);
            let v2 = self.seq.load(Ordering::Relaxed);
            if v1 == v2 {
                return HandSignal {
                    x,
                    y,
                    gesture,
                    present,
                };
            }
        }
    }

    pub fn age_ms(&self) -> f32 {
        age_since(self.updated_ms.load(Ordering::Relaxed))
    }
}

impl Default for SharedHandSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SharedAudioSignal {
    seq: AtomicU64,
    average: AtomicU32,
    // Four spectrum bytes per word, little-endian within the word.
    spectrum: [AtomicU32; SPECTRUM_WORDS],
    updated_ms: AtomicU64,
}

impl SharedAudioSignal {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            average: AtomicU32::new(0.0f32.to_bits()),
            spectrum: std::array::from_fn(|_| AtomicU32::new(0)),
            updated_ms: AtomicU64::new(0),
        }
    }

    pub fn store(&self, s: &AudioSignal) {
        self.seq.fetch_add(1, Ordering::Relaxed);
        fence(Ordering::Release);
        self.average.store(s.average.to_bits(), Ordering::Relaxed);
        for (dst, chunk) in self.spectrum.iter().zip(s.spectrum.chunks_exact(4)) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            dst.store(word, Ordering::Relaxed);
        }
        self.updated_ms.store(now_ms(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release);
    }

    pub fn load(&self) -> AudioSignal {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let average = f32::from_bits(self.average.load(Ordering::Relaxed));
            let mut spectrum = [0u8; SPECTRUM_BINS];
            for (src, chunk) in self.spectrum.iter().zip(spectrum.chunks_exact_mut(4)) {
                chunk.copy_from_slice(&src.load(Ordering::Relaxed).to_le_bytes());
            }

            fence(Ordering::Acquire);
            let v2 = self.seq.load(Ordering::Relaxed);
            if v1 == v2 {
                return AudioSignal { average, spectrum };
            }
        }
    }

    pub fn age_ms(&self) -> f32 {
        age_since(self.updated_ms.load(Ordering::Relaxed))
    }
}

impl Default for SharedAudioSignal {
    fn default() -> Self {
        Self::new()
    }
}

fn age_since(t: u64) -> f32 {
    if t == 0 {
        return 0.0;
    }
    now_ms().saturating_sub(t) as f32
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_millis(0))
        .as_millis() as u64
}
