//! Picking and grabbing photo panels inside the rotating formation frame.

use crate::scene::camera::{look_at_rotation, Camera};
use crate::scene::gallery::{quat_to_euler, Gallery, Panel, BOB_AMPLITUDE, GRAB_SCALE, IDLE_SCALE};
use crate::scene::integrator::smoothing_factor;
use crate::signal::{Gesture, HandSignal};
use glam::{Mat4, Quat, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_4, PI, TAU};

/// Distance in front of the camera a grabbed panel is held at.
pub const GRAB_DISTANCE: f32 = 5.0;
pub const PANEL_RATE: f32 = 5.0;
/// Fixed yaw of the scene root under the spinning formation.
pub const ROOT_YAW: f32 = -FRAC_PI_4;

/// Interaction state owned by the resolver and read by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub grabbed: Option<usize>,
    /// Whether the pointer ray hit any panel this frame.
    pub hovered: bool,
}

/// World orientation of the formation frame for a given spin.
pub fn parent_rotation(spin: f32) -> Quat {
    Quat::from_rotation_y(ROOT_YAW) * Quat::from_rotation_y(spin)
}

pub fn parent_matrix(spin: f32) -> Mat4 {
    Mat4::from_quat(parent_rotation(spin))
}

/// Grab transition for one frame.
///
/// A grab is only acquired while nothing is held, and is dropped the moment
/// the gesture stops being a pinch.
pub fn decide_grab(
    current: Option<usize>,
    gesture: Gesture,
    hit: Option<usize>,
    count: usize,
) -> Option<usize> {
    if gesture != Gesture::Pinch {
        return None;
    }
    match current {
        Some(i) if i < count => Some(i),
        _ => hit.filter(|&i| i < count),
    }
}

/// Index of the nearest panel under the pointer, if any.
pub fn pick(camera: &Camera, hand: &HandSignal, gallery: &Gallery, parent: &Mat4) -> Option<usize> {
    if !hand.present {
        return None;
    }
    let (nx, ny) = hand.ndc();
    let ray = camera.ray_from_ndc(Vec2::new(nx, ny));
    let half = Panel::hit_half_extent();

    gallery
        .panels()
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            ray.intersect_quad(&(*parent * p.local_matrix()), half)
                .map(|t| (i, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Target pose that holds a panel in front of the camera, expressed in the
/// formation frame. Recomputed every frame because the frame keeps turning.
pub fn held_pose(camera: &Camera, spin: f32) -> (Vec3, Vec3) {
    let parent_rot = parent_rotation(spin);
    let world_target = camera.point_in_front(GRAB_DISTANCE);
    let local = parent_rot.inverse() * world_target;

    let desired = look_at_rotation(parent_rot * local, camera.position);
    let relative = parent_rot.inverse() * desired;
    (local, quat_to_euler(relative))
}

/// Moves `target` by whole turns so it sits within half a turn of `current`.
pub fn nearest_turn(current: f32, mut target: f32) -> f32 {
    while target - current > PI {
        target -= TAU;
    }
    while target - current < -PI {
        target += TAU;
    }
    target
}

#[derive(Debug, Clone, Default)]
pub struct GrabResolver {
    state: InteractionState,
}

impl GrabResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn release(&mut self) {
        self.state.grabbed = None;
    }

    /// Drops a grab that points past the end of the gallery.
    pub fn validate(&mut self, count: usize) {
        if let Some(i) = self.state.grabbed {
            if i >= count {
                tracing::warn!("grabbed panel {i} no longer exists ({count} panels); releasing");
                self.state.grabbed = None;
            }
        }
    }

    pub fn update(
        &mut self,
        camera: &Camera,
        hand: &HandSignal,
        gallery: &mut Gallery,
        spin: f32,
        dt: f32,
        elapsed: f32,
    ) {
        self.validate(gallery.len());

        let parent = parent_matrix(spin);
        let hit = pick(camera, hand, gallery, &parent);
        self.state.hovered = hit.is_some();

        let next = decide_grab(self.state.grabbed, hand.gesture, hit, gallery.len());
        if next != self.state.grabbed {
            match next {
                Some(i) => tracing::debug!("grabbed panel {i}"),
                None => tracing::debug!("released panel"),
            }
        }
        self.state.grabbed = next;

        let held = self.state.grabbed.map(|_| held_pose(camera, spin));
        let alpha = smoothing_factor(dt, PANEL_RATE);

        for (i, panel) in gallery.panels_mut().iter_mut().enumerate() {
            let (target_pos, target_rot, target_scale) = match held {
                Some((pos, rot)) if self.state.grabbed == Some(i) => (pos, rot, GRAB_SCALE),
                _ => {
                    let bob = (elapsed + i as f32).sin() * BOB_AMPLITUDE;
                    (panel.home + Vec3::new(0.0, bob, 0.0), panel.home_rotation, IDLE_SCALE)
                }
            };

            let target_rot = Vec3::new(
                target_rot.x,
                nearest_turn(panel.rotation.y, target_rot.y),
                target_rot.z,
            );
            panel.position = panel.position.lerp(target_pos, alpha);
            panel.rotation = panel.rotation.lerp(target_rot, alpha);
            panel.scale += (target_scale - panel.scale) * alpha;
        }
    }
}
