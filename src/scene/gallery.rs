use crate::config::Rgb;
use crate::scene::layout::gallery_ring;
use fastrand::Rng;
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// Half-size of the framed square, in panel-local units before scaling.
pub const PANEL_HALF_EXTENT: f32 = 0.6;
pub const IDLE_SCALE: f32 = 1.0;
pub const GRAB_SCALE: f32 = 2.5;
pub const BOB_AMPLITUDE: f32 = 0.01;

/// Alternating (background, ink) placeholder colours.
pub const PANEL_ACCENTS: [(Rgb, Rgb); 2] = [
    (Rgb::new(0x00, 0x10, 0x20), Rgb::new(0x00, 0xf3, 0xff)),
    (Rgb::new(0x20, 0x00, 0x20), Rgb::new(0xff, 0x00, 0xaa)),
];

pub fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

pub fn quat_to_euler(q: Quat) -> Vec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Layout position in the rotating formation frame.
    pub home: Vec3,
    /// Layout orientation as XYZ Euler angles.
    pub home_rotation: Vec3,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub background: Rgb,
    pub ink: Rgb,
}

impl Panel {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            euler_to_quat(self.rotation),
            self.position,
        )
    }

    pub fn hit_half_extent() -> Vec2 {
        Vec2::splat(PANEL_HALF_EXTENT)
    }
}

/// The photo panels. Regenerated whole whenever the panel count changes.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    panels: Vec<Panel>,
}

impl Gallery {
    pub fn generate(rng: &mut Rng, count: usize) -> Self {
        let panels = gallery_ring(rng, count)
            .into_iter()
            .enumerate()
            .map(|(i, seed)| {
                let (background, ink) = PANEL_ACCENTS[i % PANEL_ACCENTS.len()];
                Panel {
                    home: seed.position,
                    home_rotation: seed.rotation,
                    position: seed.position,
                    rotation: seed.rotation,
                    scale: IDLE_SCALE,
                    background,
                    ink,
                }
            })
            .collect();
        Self { panels }
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn get(&self, i: usize) -> Option<&Panel> {
        self.panels.get(i)
    }

    pub(crate) fn panels_mut(&mut self) -> &mut [Panel] {
        &mut self.panels
    }
}
