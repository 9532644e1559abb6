use glam::{Mat4, Vec3};

/// Camera surface the session drives on resize: a settable aspect ratio
/// plus an explicit projection-recompute step.
pub trait CameraProjection {
    fn set_aspect(&mut self, aspect: f32);
    fn update_projection(&mut self);
}

/// Perspective camera with an explicit projection-recompute step.
///
/// Changing `set_aspect` (or any of the public fields) takes effect only
/// after `update_projection`, mirroring how renderers expect the projection
/// matrix to change at well-defined points rather than on every field write.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    aspect: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y_degrees,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            aspect,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// View matrix looking from `position` toward `target`.
    pub fn view(&self) -> Mat4 {
        let forward = self.target - self.position;
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            // Looking straight up or down; Y is no longer a usable up axis.
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

impl CameraProjection for PerspectiveCamera {
    fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        );
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 1.0, 0.1, 100.0)
    }
}
