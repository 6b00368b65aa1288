//! Software rasteriser: turns the scene state into a small RGB pixel grid
//! for the terminal renderers.

use crate::config::Rgb;
use crate::scene::camera::Camera;
use crate::scene::gallery::{Panel, PANEL_HALF_EXTENT};
use crate::scene::integrator::{Collection, ObjectKind};
use crate::scene::layout::TREE_HEIGHT;
use crate::scene::Scene;
use crate::signal::Gesture;
use glam::{Mat4, Vec2, Vec3};

pub const BACKGROUND: Rgb = Rgb::new(5, 5, 5);
pub const FRAME_GOLD: Rgb = Rgb::new(0xff, 0xd7, 0x00);
pub const CURSOR_PINCH: Rgb = Rgb::new(0xff, 0x00, 0xaa);
pub const CURSOR_IDLE: Rgb = Rgb::new(0x00, 0xf3, 0xff);

const FOG_NEAR: f32 = 10.0;
const FOG_FAR: f32 = 50.0;
const STAR_SIZE: f32 = 0.5;
const PANEL_OPACITY: f32 = 0.9;
/// Image area inside the gold frame, in panel-local units.
const IMAGE_HALF: f32 = 0.5;

pub struct SceneRaster {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    depth: Vec<f32>,
}

impl SceneRaster {
    pub fn new(width: usize, height: usize) -> Self {
        let mut r = Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
            depth: Vec::new(),
        };
        r.resize(width, height);
        r
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let n = width.saturating_mul(height);
        self.pixels.clear();
        self.pixels.resize(n, BACKGROUND);
        self.depth.clear();
        self.depth.resize(n, f32::INFINITY);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(BACKGROUND);
        self.depth.fill(f32::INFINITY);
    }

    /// Draws one frame. Reads the scene, never mutates it.
    pub fn draw(&mut self, scene: &Scene) {
        self.clear();
        if self.width == 0 || self.height == 0 {
            return;
        }

        let camera = scene.camera();
        let view_proj = camera.projection_matrix() * camera.view_matrix();
        let formation = scene.formation_matrix();
        // World units to pixels at unit depth.
        let px_per_unit = self.height as f32 / (2.0 * (camera.fov_y / 2.0).tan());

        let star = formation.transform_point3(Vec3::new(0.0, TREE_HEIGHT / 2.0 + 0.5, 0.0));
        let star_color = scene
            .config()
            .particle_colors
            .0
            .scaled((2.0 + 10.0 * scene.beat()) / 4.0);
        self.splat(&view_proj, camera, star, STAR_SIZE, px_per_unit, star_color, Shape::Diamond);

        for collection in scene.collections() {
            self.draw_collection(scene, collection, &view_proj, &formation, px_per_unit);
        }

        for panel in scene.gallery().panels() {
            self.draw_panel(scene, panel, &formation);
        }

        self.draw_cursor(scene, &view_proj);
    }

    fn draw_collection(
        &mut self,
        scene: &Scene,
        c: &Collection,
        view_proj: &Mat4,
        formation: &Mat4,
        px_per_unit: f32,
    ) {
        let camera = scene.camera();
        let shattering = scene.is_shattering();
        let (shape, size_mul) = match c.kind() {
            ObjectKind::Particle => (Shape::Disc, 1.0),
            ObjectKind::GiftBox => (Shape::Square, 0.5),
            ObjectKind::Bell => (Shape::Disc, 0.6),
        };

        for i in 0..c.len() {
            let local = c.display_position(i, scene.mode(), shattering, scene.elapsed());
            let world = formation.transform_point3(local);
            let color = match c.kind() {
                ObjectKind::Particle => c.colors()[i],
                // Spin shows up as a slow shimmer on ornaments.
                _ => {
                    let o = c.orientations()[i];
                    c.colors()[i].scaled(0.65 + 0.35 * (o.x.cos() * o.y.cos()).abs())
                }
            };
            self.splat(
                view_proj,
                camera,
                world,
                c.scales()[i] * size_mul,
                px_per_unit,
                color,
                shape,
            );
        }
    }

    fn splat(
        &mut self,
        view_proj: &Mat4,
        camera: &Camera,
        world: Vec3,
        radius: f32,
        px_per_unit: f32,
        color: Rgb,
        shape: Shape,
    ) {
        let Some(p) = camera.project_with(view_proj, world) else {
            return;
        };
        let depth = p.z;
        let (cx, cy) = self.ndc_to_pixel(p.x, p.y);
        let r = (radius * px_per_unit / depth).max(0.5);
        let color = fog(color, depth);

        let x0 = (cx - r).floor().max(0.0) as isize;
        let x1 = (cx + r).ceil().min(self.width as f32 - 1.0) as isize;
        let y0 = (cy - r).floor().max(0.0) as isize;
        let y1 = (cy + r).ceil().min(self.height as f32 - 1.0) as isize;
        if x1 < x0 || y1 < y0 {
            return;
        }

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let inside = match shape {
                    Shape::Disc => dx * dx + dy * dy <= r * r,
                    Shape::Square => dx.abs() <= r && dy.abs() <= r,
                    Shape::Diamond => dx.abs() + dy.abs() <= r,
                };
                if inside {
                    self.plot(x as usize, y as usize, depth, color);
                }
            }
        }
    }

    fn draw_panel(&mut self, scene: &Scene, panel: &Panel, formation: &Mat4) {
        let camera = scene.camera();
        let world_from_local = *formation * panel.local_matrix();
        if world_from_local.determinant().abs() < 1e-12 {
            return;
        }
        let local_from_world = world_from_local.inverse();

        // Screen-space bounds of the four corners.
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = world_from_local.transform_point3(Vec3::new(
                sx * PANEL_HALF_EXTENT,
                sy * PANEL_HALF_EXTENT,
                0.0,
            ));
            let Some(p) = camera.project(corner) else {
                return;
            };
            let (x, y) = self.ndc_to_pixel(p.x, p.y);
            min = min.min(Vec2::new(x, y));
            max = max.max(Vec2::new(x, y));
        }

        let x0 = min.x.floor().max(0.0) as usize;
        let y0 = min.y.floor().max(0.0) as usize;
        let x1 = (max.x.ceil().max(0.0) as usize).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as usize).min(self.height);
        let forward = camera.forward();
        // Dashed ring turns at 0.5 rad/s, a divisor of the phase period.
        let spin = scene.elapsed() * 0.5;

        for y in y0..y1 {
            for x in x0..x1 {
                let ndc_x = (x as f32 + 0.5) / self.width as f32 * 2.0 - 1.0;
                let ndc_y = 1.0 - (y as f32 + 0.5) / self.height as f32 * 2.0;
                let ray = camera.ray_from_ndc(Vec2::new(ndc_x, ndc_y));
                let o = local_from_world.transform_point3(ray.origin);
                let d = local_from_world.transform_vector3(ray.direction);
                if d.z.abs() < 1e-6 {
                    continue;
                }
                let t = -o.z / d.z;
                if !(t > 0.0) {
                    continue;
                }
                let hit = o + d * t;
                let (u, v) = (hit.x, hit.y);
                if u.abs() > PANEL_HALF_EXTENT || v.abs() > PANEL_HALF_EXTENT {
                    continue;
                }

                let depth = t * ray.direction.dot(forward);
                let color = if u.abs() > IMAGE_HALF || v.abs() > IMAGE_HALF {
                    FRAME_GOLD
                } else {
                    let under = self.pixels[y * self.width + x];
                    panel_image(panel, u, v, spin).mix(under, 1.0 - PANEL_OPACITY)
                };
                self.plot(x, y, depth, fog(color, depth));
            }
        }
    }

    fn draw_cursor(&mut self, scene: &Scene, view_proj: &Mat4) {
        let hand = scene.hand();
        if !hand.present {
            return;
        }
        let (nx, ny) = hand.ndc();
        let Some(p) = scene
            .camera()
            .project_with(view_proj, Vec3::new(nx * 10.0, ny * 10.0, 5.0))
        else {
            return;
        };
        let (cx, cy) = self.ndc_to_pixel(p.x, p.y);
        let color = if hand.gesture == Gesture::Pinch {
            CURSOR_PINCH
        } else {
            CURSOR_IDLE
        };
        let outer: f32 = if scene.interaction().hovered { 3.5 } else { 2.5 };
        let inner = outer - 1.0;

        let r = outer.ceil() as isize;
        for dy in -r..=r {
            for dx in -r..=r {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d < inner || d > outer {
                    continue;
                }
                let x = cx.floor() as isize + dx;
                let y = cy.floor() as isize + dy;
                if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                    // Drawn over everything.
                    self.pixels[y as usize * self.width + x as usize] = color;
                }
            }
        }
    }

    fn ndc_to_pixel(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x * 0.5 + 0.5) * self.width as f32,
            (0.5 - y * 0.5) * self.height as f32,
        )
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, color: Rgb) {
        let i = y * self.width + x;
        if depth < self.depth[i] {
            self.depth[i] = depth;
            self.pixels[i] = color;
        }
    }
}

#[derive(Clone, Copy)]
enum Shape {
    Disc,
    Square,
    Diamond,
}

fn fog(color: Rgb, depth: f32) -> Rgb {
    let f = ((depth - FOG_NEAR) / (FOG_FAR - FOG_NEAR)).clamp(0.0, 1.0);
    color.mix(BACKGROUND, f)
}

/// Placeholder artwork: tinted card, inner border and a rotating dashed ring.
fn panel_image(panel: &Panel, u: f32, v: f32, spin: f32) -> Rgb {
    let edge = IMAGE_HALF - u.abs().max(v.abs());
    if edge < 0.0125 {
        return panel.ink.mix(panel.background, 0.5);
    }
    let r = (u * u + v * v).sqrt();
    if (r - 0.125).abs() < 0.012 {
        let a = v.atan2(u) + spin;
        if (a * 8.0).sin() > 0.0 {
            return panel.ink;
        }
    }
    panel.background
}
