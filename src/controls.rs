use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::pointer::PointerState;

/// Damped pointer-follow orbit.
///
/// Maps the normalized pointer onto a circular orbit around a target: the
/// horizontal axis picks the angle on the circle, the vertical axis the
/// camera height. With damping enabled the orbit trails the pointer with an
/// exponential ease instead of snapping, so the view settles smoothly after
/// the pointer stops.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerOrbit {
    pub radius: f32,
    pub height_scale: f32,
    pub target: Vec3,
    /// Damping rate in 1/seconds; larger values settle faster.
    pub damping: f32,
    pub enable_damping: bool,
    smoothed: Vec2,
}

impl PointerOrbit {
    pub fn new(radius: f32, height_scale: f32) -> Self {
        Self {
            radius,
            height_scale,
            target: Vec3::ZERO,
            damping: 6.0,
            enable_damping: true,
            smoothed: Vec2::ZERO,
        }
    }

    /// The damped pointer value the camera currently follows.
    pub fn smoothed(&self) -> Vec2 {
        self.smoothed
    }

    /// Moves the smoothed value toward the tracked pointer state.
    pub fn update(&mut self, pointer: PointerState, delta_seconds: f64) {
        let goal = Vec2::new(pointer.x, pointer.y);
        if self.enable_damping {
            let blend = 1.0 - (-self.damping * delta_seconds as f32).exp();
            self.smoothed += (goal - self.smoothed) * blend;
        } else {
            self.smoothed = goal;
        }
    }

    /// Positions `camera` on the orbit circle and aims it at the target.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        let angle = self.smoothed.x * std::f32::consts::TAU;
        camera.position = Vec3::new(
            angle.sin() * self.radius,
            self.smoothed.y * self.height_scale,
            angle.cos() * self.radius,
        ) + self.target;
        camera.look_at(self.target);
    }
}

impl Default for PointerOrbit {
    fn default() -> Self {
        Self::new(3.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f64 = 1.0 / 60.0;

    #[test]
    fn undamped_orbit_snaps_to_the_pointer() {
        let mut orbit = PointerOrbit::default();
        orbit.enable_damping = false;
        orbit.update(PointerState { x: 0.25, y: -0.1 }, STEP);
        assert_eq!(orbit.smoothed(), Vec2::new(0.25, -0.1));
    }

    #[test]
    fn damped_orbit_converges_monotonically() {
        let mut orbit = PointerOrbit::default();
        let goal = PointerState { x: 0.5, y: 0.5 };
        let mut previous = 1.0_f32;
        for _ in 0..120 {
            orbit.update(goal, STEP);
            let distance = (Vec2::new(goal.x, goal.y) - orbit.smoothed()).length();
            assert!(distance <= previous + 1e-6);
            previous = distance;
        }
        assert!(previous < 1e-2);
    }

    #[test]
    fn apply_places_the_camera_on_the_orbit_circle() {
        let mut orbit = PointerOrbit::new(3.0, 5.0);
        orbit.enable_damping = false;
        orbit.update(PointerState { x: 0.25, y: 0.2 }, STEP);

        let mut camera = PerspectiveCamera::default();
        orbit.apply(&mut camera);

        // A quarter turn lands on the +X side of the circle.
        assert!((camera.position.x - 3.0).abs() < 1e-4);
        assert!(camera.position.z.abs() < 1e-4);
        assert!((camera.position.y - 1.0).abs() < 1e-5);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn zero_delta_leaves_the_orbit_in_place() {
        let mut orbit = PointerOrbit::default();
        orbit.update(PointerState { x: 0.5, y: 0.0 }, 0.0);
        assert_eq!(orbit.smoothed(), Vec2::ZERO);
    }
}
