pub mod camera;
pub mod gallery;
pub mod grab;
pub mod integrator;
pub mod layout;

pub use crate::config::SceneMode;

use crate::config::SceneConfig;
use crate::signal::HandSignal;
use camera::Camera;
use fastrand::Rng;
use gallery::Gallery;
use glam::Mat4;
use grab::{GrabResolver, InteractionState};
use integrator::{advance_collection, advance_formation, phase_time, Collection, FrameInput};

/// All animated state, advanced once per rendered frame.
pub struct Scene {
    config: SceneConfig,
    rng: Rng,
    mode: SceneMode,
    particles: Collection,
    boxes: Collection,
    bells: Collection,
    gallery: Gallery,
    resolver: GrabResolver,
    camera: Camera,
    spin: f32,
    uptime: f64,
    beat: f32,
    hand: HandSignal,
}

impl Scene {
    pub fn new(config: SceneConfig, mode: SceneMode, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => Rng::with_seed(s),
            None => Rng::new(),
        };
        let (pc1, pc2) = config.particle_colors;
        let (bc1, bc2) = config.box_colors;
        let particles = layout::particles(&mut rng, config.particle_count, pc1, pc2);
        let boxes = layout::gift_boxes(&mut rng, config.box_count, bc1, bc2);
        let bells = layout::bells(&mut rng, config.bell_count, config.bell_color);
        let gallery = Gallery::generate(&mut rng, config.panel_count);

        Self {
            config,
            rng,
            mode,
            particles,
            boxes,
            bells,
            gallery,
            resolver: GrabResolver::new(),
            camera: Camera::default(),
            spin: 0.0,
            uptime: 0.0,
            beat: 0.0,
            hand: HandSignal::absent(),
        }
    }

    /// Regenerates every collection whose count or colours changed. Mode and
    /// animation state are left alone.
    pub fn apply_config(&mut self, next: SceneConfig) {
        let prev = self.config;
        if next == prev {
            return;
        }

        if next.particle_count != prev.particle_count || next.particle_colors != prev.particle_colors {
            let (c1, c2) = next.particle_colors;
            self.particles = layout::particles(&mut self.rng, next.particle_count, c1, c2);
            tracing::info!("regenerated {} particles", next.particle_count);
        }
        if next.box_count != prev.box_count || next.box_colors != prev.box_colors {
            let (c1, c2) = next.box_colors;
            self.boxes = layout::gift_boxes(&mut self.rng, next.box_count, c1, c2);
            tracing::info!("regenerated {} gift boxes", next.box_count);
        }
        if next.bell_count != prev.bell_count || next.bell_color != prev.bell_color {
            self.bells = layout::bells(&mut self.rng, next.bell_count, next.bell_color);
            tracing::info!("regenerated {} bells", next.bell_count);
        }
        if next.panel_count != prev.panel_count {
            self.gallery = Gallery::generate(&mut self.rng, next.panel_count);
            self.resolver.validate(self.gallery.len());
            tracing::info!("regenerated gallery with {} panels", next.panel_count);
        }

        self.config = next;
    }

    pub fn set_mode(&mut self, mode: SceneMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> SceneMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera = Camera::with_aspect(aspect);
    }

    /// One frame: formation spin, then every collection, then the panels.
    pub fn step(&mut self, dt: f32, hand: HandSignal, beat: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let beat = if beat.is_finite() { beat.clamp(0.0, 1.0) } else { 0.0 };
        self.uptime += f64::from(dt);
        let elapsed = self.elapsed();
        self.hand = hand;
        self.beat = beat;

        let input = FrameInput {
            dt,
            elapsed,
            mode: self.mode,
            hand,
            beat,
        };

        advance_formation(&mut self.spin, &input);
        advance_collection(&mut self.particles, &input);
        advance_collection(&mut self.boxes, &input);
        advance_collection(&mut self.bells, &input);

        self.resolver.update(
            &self.camera,
            &hand,
            &mut self.gallery,
            self.spin,
            dt,
            elapsed,
        );
    }

    pub fn config(&self) -> SceneConfig {
        self.config
    }

    pub fn mode(&self) -> SceneMode {
        self.mode
    }

    pub fn particles(&self) -> &Collection {
        &self.particles
    }

    pub fn boxes(&self) -> &Collection {
        &self.boxes
    }

    pub fn bells(&self) -> &Collection {
        &self.bells
    }

    pub fn collections(&self) -> [&Collection; 3] {
        [&self.particles, &self.boxes, &self.bells]
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn interaction(&self) -> InteractionState {
        self.resolver.state()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    /// World transform of the spinning formation frame.
    pub fn formation_matrix(&self) -> Mat4 {
        grab::parent_matrix(self.spin)
    }

    /// Phase time driving every periodic motion; wraps, see [`phase_time`].
    pub fn elapsed(&self) -> f32 {
        phase_time(self.uptime)
    }

    /// Seconds of simulated time since the scene started.
    pub fn uptime(&self) -> f64 {
        self.uptime
    }

    pub fn beat(&self) -> f32 {
        self.beat
    }

    pub fn hand(&self) -> HandSignal {
        self.hand
    }

    pub fn is_shattering(&self) -> bool {
        self.hand.gesture.is_shattering()
    }
}
