//! Static target layouts, computed once per (re)generation of a collection.

use crate::config::Rgb;
use crate::scene::integrator::{Collection, ObjectKind};
use fastrand::Rng;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

pub const TREE_HEIGHT: f32 = 15.0;
pub const TREE_RADIUS: f32 = 6.0;
pub const SCATTER_EXTENT: Vec3 = Vec3::new(25.0, 20.0, 20.0);
pub const PARTICLE_SIZE: f32 = 0.06;

pub const GALLERY_RADIUS: f32 = 8.0;
pub const GALLERY_HEIGHT_SPREAD: f32 = 8.0;

/// Probability that a particle takes its second colour.
pub const PARTICLE_ACCENT_SHARE: f32 = 0.2;

/// How formed positions spread between the axis and the cone surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialFill {
    /// Uniform area density, filling the whole cone.
    Volume,
    /// A band from 0.6 to 1.2 of the cone radius, hugging the surface.
    Shell,
}

/// Cone radius at height `y` (centred on the origin, apex at +H/2).
pub fn cone_radius_at(y: f32) -> f32 {
    let ratio = (y + TREE_HEIGHT / 2.0) / TREE_HEIGHT;
    (1.0 - ratio) * TREE_RADIUS
}

pub fn cone_point(rng: &mut Rng, fill: RadialFill) -> Vec3 {
    let y = rng.f32() * TREE_HEIGHT - TREE_HEIGHT / 2.0;
    let max_r = cone_radius_at(y);
    let u = rng.f32();
    let r = match fill {
        RadialFill::Volume => max_r * u.sqrt(),
        RadialFill::Shell => max_r * (0.6 + 0.6 * u),
    };
    let angle = rng.f32() * TAU;
    Vec3::new(angle.cos() * r, y, angle.sin() * r)
}

pub fn scatter_point(rng: &mut Rng) -> Vec3 {
    Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5) * SCATTER_EXTENT
}

/// Unit vector; a zero-length draw is redrawn, then falls back to +Y.
pub fn explosion_direction(rng: &mut Rng) -> Vec3 {
    for _ in 0..8 {
        let v = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5);
        if let Some(dir) = v.try_normalize() {
            return dir;
        }
    }
    Vec3::Y
}

fn random_phase(rng: &mut Rng) -> Vec3 {
    Vec3::new(rng.f32() * PI, rng.f32() * PI, rng.f32() * PI)
}

pub fn particles(rng: &mut Rng, count: usize, color1: Rgb, color2: Rgb) -> Collection {
    let mut c = Collection::with_capacity(ObjectKind::Particle, count);
    for _ in 0..count {
        // Categorical pick: a particle is either colour, never a blend.
        let color = if rng.f32() < PARTICLE_ACCENT_SHARE { color2 } else { color1 };
        c.push(
            cone_point(rng, RadialFill::Volume),
            scatter_point(rng),
            explosion_direction(rng),
            PARTICLE_SIZE,
            Vec3::ZERO,
            color,
        );
    }
    c
}

pub fn gift_boxes(rng: &mut Rng, count: usize, color1: Rgb, color2: Rgb) -> Collection {
    let mut c = Collection::with_capacity(ObjectKind::GiftBox, count);
    for _ in 0..count {
        let formed = cone_point(rng, RadialFill::Shell);
        let scattered = scatter_point(rng);
        let explosion = explosion_direction(rng);
        let color = if rng.bool() { color1 } else { color2 };
        let base_scale = 0.2 + rng.f32() * 0.3;
        let phase = random_phase(rng);
        c.push(formed, scattered, explosion, base_scale, phase, color);
    }
    c
}

pub fn bells(rng: &mut Rng, count: usize, color: Rgb) -> Collection {
    let mut c = Collection::with_capacity(ObjectKind::Bell, count);
    for _ in 0..count {
        let formed = cone_point(rng, RadialFill::Shell);
        let scattered = scatter_point(rng);
        let explosion = explosion_direction(rng);
        let base_scale = 0.2 + rng.f32() * 0.2;
        let phase = random_phase(rng);
        c.push(formed, scattered, explosion, base_scale, phase, color);
    }
    c
}

/// Home position and Euler orientation of one gallery panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSeed {
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Panels evenly spaced by index around a ring, each turned to face the axis.
pub fn gallery_ring(rng: &mut Rng, count: usize) -> Vec<PanelSeed> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            let y = (rng.f32() - 0.5) * GALLERY_HEIGHT_SPREAD;
            PanelSeed {
                position: Vec3::new(angle.sin() * GALLERY_RADIUS, y, angle.cos() * GALLERY_RADIUS),
                rotation: Vec3::new(0.0, angle + PI, 0.0),
            }
        })
        .collect()
}
