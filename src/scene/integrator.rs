//! Per-frame advance of every animated object toward its blended target.
//!
//! Convergence is `current += (target - current) * clamp(dt * rate, 0, 1)`.
//! This scales with the frame delta rather than being an exact continuous-time
//! decay: larger frames converge a little faster. The clamp keeps one very long
//! frame from overshooting the target.

use crate::config::{Rgb, SceneMode};
use crate::signal::HandSignal;
use glam::Vec3;

pub const DIFFUSION: f32 = 10.0;
pub const CALM_RATE: f32 = 2.0;
pub const SHATTER_RATE: f32 = 4.0;
/// Formation yaw speed in rad/s, applied only while formed.
pub const FORMATION_SPIN_RATE: f32 = 0.1;
pub const BEAT_GAIN: f32 = 0.5;
pub const DRIFT_AMPLITUDE: f32 = 0.02;
/// Every periodic motion (ornament spin, drift, bob, panel artwork) repeats
/// after this many seconds, so phase time can wrap here without a visible jump.
pub const PHASE_PERIOD: f64 = 20.0 * std::f64::consts::PI;

/// Uptime folded into `[0, PHASE_PERIOD)`, small enough to stay precise as f32.
pub fn phase_time(uptime: f64) -> f32 {
    uptime.rem_euclid(PHASE_PERIOD) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Particle,
    GiftBox,
    Bell,
}

impl ObjectKind {
    /// Euler angular velocity (rad/s) added on top of the initial phase.
    pub fn spin(self) -> Vec3 {
        match self {
            Self::Particle => Vec3::ZERO,
            Self::GiftBox => Vec3::new(0.2, 0.2, 0.0),
            Self::Bell => Vec3::new(0.0, 0.5, 0.0),
        }
    }
}

/// Everything the integrator needs to know about the current frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Phase time in seconds, see [`phase_time`].
    pub elapsed: f32,
    pub mode: SceneMode,
    pub hand: HandSignal,
    /// Audio level in 0..1.
    pub beat: f32,
}

impl FrameInput {
    pub fn is_shattering(&self) -> bool {
        self.hand.gesture.is_shattering()
    }

    pub fn convergence_rate(&self) -> f32 {
        if self.is_shattering() { SHATTER_RATE } else { CALM_RATE }
    }
}

/// A homogeneous set of animated objects, stored column-wise.
///
/// Collections are regenerated whole; nothing ever inserts into or removes
/// from a live collection.
#[derive(Debug, Clone)]
pub struct Collection {
    kind: ObjectKind,
    formed: Vec<Vec3>,
    scattered: Vec<Vec3>,
    explosion: Vec<Vec3>,
    current: Vec<Vec3>,
    base_scale: Vec<f32>,
    rotation_phase: Vec<Vec3>,
    colors: Vec<Rgb>,
    scale: Vec<f32>,
    orientation: Vec<Vec3>,
}

impl Collection {
    pub fn with_capacity(kind: ObjectKind, n: usize) -> Self {
        Self {
            kind,
            formed: Vec::with_capacity(n),
            scattered: Vec::with_capacity(n),
            explosion: Vec::with_capacity(n),
            current: Vec::with_capacity(n),
            base_scale: Vec::with_capacity(n),
            rotation_phase: Vec::with_capacity(n),
            colors: Vec::with_capacity(n),
            scale: Vec::with_capacity(n),
            orientation: Vec::with_capacity(n),
        }
    }

    pub fn empty(kind: ObjectKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    /// Adds one object, starting at its formed position.
    pub(crate) fn push(
        &mut self,
        formed: Vec3,
        scattered: Vec3,
        explosion: Vec3,
        base_scale: f32,
        rotation_phase: Vec3,
        color: Rgb,
    ) {
        self.formed.push(formed);
        self.scattered.push(scattered);
        self.explosion.push(explosion);
        self.current.push(formed);
        self.base_scale.push(base_scale);
        self.rotation_phase.push(rotation_phase);
        self.colors.push(color);
        self.scale.push(base_scale);
        self.orientation.push(rotation_phase);
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn formed(&self) -> &[Vec3] {
        &self.formed
    }

    pub fn scattered(&self) -> &[Vec3] {
        &self.scattered
    }

    pub fn explosion(&self) -> &[Vec3] {
        &self.explosion
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.current
    }

    pub fn base_scales(&self) -> &[f32] {
        &self.base_scale
    }

    pub fn rotation_phases(&self) -> &[Vec3] {
        &self.rotation_phase
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn scales(&self) -> &[f32] {
        &self.scale
    }

    pub fn orientations(&self) -> &[Vec3] {
        &self.orientation
    }

    /// Where to draw object `i`. Scattered particles drift a little while calm;
    /// the drift is never written back into the animated position.
    pub fn display_position(&self, i: usize, mode: SceneMode, shattering: bool, elapsed: f32) -> Vec3 {
        let p = self.current[i];
        if self.kind != ObjectKind::Particle || mode != SceneMode::Scattered || shattering {
            return p;
        }
        let phase = i as f32;
        p + Vec3::new(
            (elapsed * 0.5 + phase).cos() * DRIFT_AMPLITUDE,
            (elapsed + phase).sin() * DRIFT_AMPLITUDE,
            0.0,
        )
    }
}

/// Fraction of the remaining distance covered this frame.
pub fn smoothing_factor(dt: f32, rate: f32) -> f32 {
    let a = dt * rate;
    if a > 0.0 { a.min(1.0) } else { 0.0 }
}

pub fn blend_target(
    formed: Vec3,
    scattered: Vec3,
    explosion: Vec3,
    mode: SceneMode,
    shattering: bool,
    beat: f32,
) -> Vec3 {
    let base = match mode {
        SceneMode::Formed => formed,
        SceneMode::Scattered => scattered,
    };
    if shattering {
        base + explosion * DIFFUSION * (1.0 + BEAT_GAIN * beat)
    } else {
        base
    }
}

pub fn advance_collection(c: &mut Collection, input: &FrameInput) {
    let shattering = input.is_shattering();
    let alpha = smoothing_factor(input.dt, input.convergence_rate());
    let pulse = 1.0 + BEAT_GAIN * input.beat;
    let spin = c.kind.spin() * input.elapsed;

    for i in 0..c.current.len() {
        let target = blend_target(
            c.formed[i],
            c.scattered[i],
            c.explosion[i],
            input.mode,
            shattering,
            input.beat,
        );
        let current = c.current[i];
        c.current[i] += (target - current) * alpha;
        c.orientation[i] = c.rotation_phase[i] + spin;
        c.scale[i] = c.base_scale[i] * pulse;
    }
}

/// Advances the yaw of the parent frame that carries every collection.
pub fn advance_formation(spin: &mut f32, input: &FrameInput) {
    if input.mode == SceneMode::Formed && input.dt > 0.0 {
        *spin += input.dt * FORMATION_SPIN_RATE;
    }
}
