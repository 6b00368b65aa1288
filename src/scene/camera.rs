use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

pub const CAMERA_DISTANCE: f32 = 20.0;
pub const CAMERA_FOV_DEG: f32 = 45.0;

/// Perspective camera looking down its local -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            rotation: Quat::IDENTITY,
            fov_y: CAMERA_FOV_DEG.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn with_aspect(aspect: f32) -> Self {
        Self {
            aspect: if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 },
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// World point `distance` units straight ahead of the camera.
    pub fn point_in_front(&self, distance: f32) -> Vec3 {
        self.position + self.rotation * Vec3::new(0.0, 0.0, -distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let tan_half_fov = (self.fov_y / 2.0).tan();
        let ray_view = Vec3::new(
            ndc.x * self.aspect * tan_half_fov,
            ndc.y * tan_half_fov,
            -1.0,
        )
        .normalize();

        Ray {
            origin: self.position,
            direction: self.rotation * ray_view,
        }
    }

    /// Projects a world point to `(ndc.x, ndc.y, view depth)`. `None` behind the near plane.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        self.project_with(&(self.projection_matrix() * self.view_matrix()), world)
    }

    /// Same as [`Camera::project`] with a precomputed view-projection matrix.
    pub fn project_with(&self, view_proj: &Mat4, world: Vec3) -> Option<Vec3> {
        let clip = *view_proj * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        Some(Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.w))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Hit distance against the rectangle `|x| <= half.x, |y| <= half.y` in the
    /// local XY plane of `world_from_local`. Both faces count.
    pub fn intersect_quad(&self, world_from_local: &Mat4, half: Vec2) -> Option<f32> {
        if world_from_local.determinant().abs() < 1e-12 {
            return None;
        }
        let local_from_world = world_from_local.inverse();
        let o = local_from_world.transform_point3(self.origin);
        let d = local_from_world.transform_vector3(self.direction);
        if d.z.abs() < 1e-6 {
            return None;
        }

        // Affine transform: `t` is the same parameter along the world ray.
        let t = -o.z / d.z;
        if !(t > 0.0) {
            return None;
        }
        let hit = o + d * t;
        (hit.x.abs() <= half.x && hit.y.abs() <= half.y).then_some(t)
    }
}

/// Rotation that turns an object's +Z axis toward `target`, keeping +Y up.
pub fn look_at_rotation(from: Vec3, target: Vec3) -> Quat {
    let Some(z) = (target - from).try_normalize() else {
        return Quat::IDENTITY;
    };
    let up = if z.cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let x = up.cross(z).normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}
