use glam::{Quat, Vec3};
use crate::model::Camera;

/// Chase camera tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChaseCameraConfig {
    /// Eye offset in car-local space (behind and above)
    pub offset: Vec3,
    /// Fraction of the remaining distance covered each frame
    pub blend: f32,
    /// Look-at point height above the car origin
    pub look_height: f32,
}

impl Default for ChaseCameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 2.2, -6.0),
            blend: 0.12,
            look_height: 0.9,
        }
    }
}

/// Smoothed third-person follow camera
pub struct CameraController {
    pub config: ChaseCameraConfig,
}

impl CameraController {
    pub fn new() -> Self {
        Self::with_config(ChaseCameraConfig::default())
    }

    pub fn with_config(config: ChaseCameraConfig) -> Self {
        Self { config }
    }

    /// Where the eye would sit with a rigid follow
    pub fn desired_eye(&self, car_position: Vec3, heading: f32) -> Vec3 {
        car_position + Quat::from_rotation_y(heading) * self.config.offset
    }

    pub fn look_target(&self, car_position: Vec3) -> Vec3 {
        car_position + Vec3::new(0.0, self.config.look_height, 0.0)
    }

    /// Move the eye part of the way toward the chase position and aim at the car
    pub fn follow(&self, camera: &mut Camera, car_position: Vec3, heading: f32) {
        let desired = self.desired_eye(car_position, heading);
        camera.eye = camera.eye.lerp(desired, self.config.blend);
        camera.set_look_at(self.look_target(car_position));
    }
}
