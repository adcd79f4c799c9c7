use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Quat, Vec3};

use crate::model::VehicleState;
use crate::utils::{rgb, Mesh};

pub const WHEEL_RADIUS: f32 = 0.28;

/// Place a part: translation * rotation (XYZ euler) * scale
fn place(mesh: Mesh, position: Vec3, rotation: Vec3, scale: Vec3) -> Mesh {
    let rotation = Quat::from_euler(glam::EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    mesh.transformed(Mat4::from_scale_rotation_translation(scale, rotation, position))
}

/// Car body in car-local space (+Z forward, +Y up), without wheels
pub fn body_mesh() -> Mesh {
    let body = rgb(0xff0000);
    let black = rgb(0x111111);
    let carbon = rgb(0x333333);
    let canopy = rgb(0x0e0e0e);

    let mut mesh = Mesh::empty();

    // long tapered nose and its tip
    mesh.append(&place(Mesh::cylinder(0.18, 0.6, 2.6, 12, body), Vec3::new(0.0, 0.13, 2.5), Vec3::new(FRAC_PI_2, 0.0, 0.0), Vec3::ONE));
    mesh.append(&place(Mesh::cylinder(0.0, 0.14, 0.5, 12, body), Vec3::new(0.0, 0.1, 3.6), Vec3::new(PI, 0.0, 0.0), Vec3::new(0.8, 1.0, 0.8)));

    // sidepods
    for side in [-1.0_f32, 1.0] {
        mesh.append(&place(Mesh::cuboid(0.5, 0.22, 1.2, body), Vec3::new(0.95 * side, 0.17, 0.25), Vec3::new(0.0, -0.05 * side, 0.0), Vec3::ONE));
    }

    // engine cover
    mesh.append(&place(Mesh::cylinder(0.6, 0.5, 1.6, 12, body), Vec3::new(0.0, 0.25, -0.4), Vec3::new(FRAC_PI_2, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.7)));

    // cockpit
    mesh.append(&place(Mesh::cuboid(0.7, 0.26, 0.9, canopy), Vec3::new(0.0, 0.33, 0.6), Vec3::ZERO, Vec3::new(1.0, 0.6, 1.0)));

    // wings
    mesh.append(&place(Mesh::cuboid(2.4, 0.05, 0.12, carbon), Vec3::new(0.0, 0.04, 3.05), Vec3::ZERO, Vec3::ONE));
    mesh.append(&place(Mesh::cuboid(1.6, 0.04, 0.08, black), Vec3::new(0.0, 0.02, 3.25), Vec3::ZERO, Vec3::ONE));
    mesh.append(&place(Mesh::cuboid(1.6, 0.06, 0.12, carbon), Vec3::new(0.0, 0.36, -1.6), Vec3::ZERO, Vec3::ONE));

    // front suspension struts
    for side in [-1.0_f32, 1.0] {
        mesh.append(&place(Mesh::cylinder(0.03, 0.03, 0.5, 8, carbon), Vec3::new(0.6 * side, 0.12, 1.0), Vec3::new(FRAC_PI_2, 0.0, -0.35 * side), Vec3::ONE));
    }

    mesh
}

/// Tyre and hub centred on the origin, axle along X
pub fn wheel_mesh() -> Mesh {
    let axle = Vec3::new(0.0, 0.0, FRAC_PI_2);
    let mut mesh = place(Mesh::cylinder(WHEEL_RADIUS, WHEEL_RADIUS, 0.32, 18, rgb(0x111111)), Vec3::ZERO, axle, Vec3::ONE);
    mesh.append(&place(Mesh::cylinder(0.08, 0.08, 0.18, 12, rgb(0x666666)), Vec3::ZERO, axle, Vec3::ONE));
    mesh
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wheel {
    pub position: WheelPosition,
    /// Hub (or steering pivot) location in car-local space
    pub mount: Vec3,
    pub steers: bool,
}

/// The four wheels and their accumulated roll angle.
pub struct WheelVisuals {
    pub wheels: [Wheel; 4],
    pub spin: f32,
}

impl WheelVisuals {
    pub fn new() -> Self {
        let wheel = |position, mount, steers| Wheel { position, mount, steers };
        Self {
            wheels: [
                wheel(WheelPosition::FrontLeft, Vec3::new(-0.95, 0.15, 1.1), true),
                wheel(WheelPosition::FrontRight, Vec3::new(0.95, 0.15, 1.1), true),
                wheel(WheelPosition::RearLeft, Vec3::new(-0.95, 0.15, -1.05), false),
                wheel(WheelPosition::RearRight, Vec3::new(0.95, 0.15, -1.05), false),
            ],
            spin: 0.0,
        }
    }

    /// Roll the wheels by the distance travelled this frame
    pub fn advance(&mut self, speed: f32, dt: f32) {
        let travel = speed.abs() * dt;
        let direction = if speed >= 0.0 { -1.0 } else { 1.0 };
        self.spin = (self.spin + direction * travel / WHEEL_RADIUS).rem_euclid(std::f32::consts::TAU);
    }

    /// World transforms for the body and every wheel
    pub fn pose(&self, state: &VehicleState) -> CarPose {
        let body = Mat4::from_translation(state.world_position()) * Mat4::from_rotation_y(state.heading);
        let wheels = self.wheels.map(|w| {
            let steer = if w.steers { state.steer_angle } else { 0.0 };
            body * Mat4::from_translation(w.mount) * Mat4::from_rotation_y(steer) * Mat4::from_rotation_x(self.spin)
        });
        CarPose { body, wheels }
    }
}

/// What the renderer needs from the simulation each frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarPose {
    pub body: Mat4,
    pub wheels: [Mat4; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_body_points_forward() {
        let mesh = body_mesh();
        let max_z = mesh.vertices.iter().map(|v| v.pos[2]).fold(f32::MIN, f32::max);
        let min_z = mesh.vertices.iter().map(|v| v.pos[2]).fold(f32::MAX, f32::min);
        // nose tip at +Z, rear wing at -Z
        assert!(max_z > 3.5 && max_z < 4.0, "max_z {max_z}");
        assert!(min_z < -1.5, "min_z {min_z}");
    }

    #[test]
    fn test_wheel_axle_along_x() {
        let mesh = wheel_mesh();
        for v in &mesh.vertices {
            assert!(v.pos[0].abs() <= 0.16 + 1e-5);
            assert!((v.pos[1] * v.pos[1] + v.pos[2] * v.pos[2]).sqrt() <= WHEEL_RADIUS + 1e-5);
        }
    }

    #[test]
    fn test_spin_direction() {
        let mut visuals = WheelVisuals::new();
        visuals.advance(WHEEL_RADIUS, 0.5);
        assert!((visuals.spin - (std::f32::consts::TAU - 0.5)).abs() < 1e-5);

        let mut visuals = WheelVisuals::new();
        visuals.advance(-WHEEL_RADIUS, 0.5);
        assert!((visuals.spin - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_front_wheels_steer_rear_do_not() {
        let visuals = WheelVisuals::new();
        let state = VehicleState {
            speed: 0.0,
            heading: 0.0,
            steer_angle: 0.3,
            position: Vec2::new(5.0, -2.0),
        };
        let pose = visuals.pose(&state);
        assert_eq!(pose.body.w_axis.truncate(), Vec3::new(5.0, 0.0, -2.0));

        for (wheel, transform) in visuals.wheels.iter().zip(pose.wheels.iter()) {
            let axle = transform.transform_vector3(Vec3::X);
            if wheel.steers {
                assert!(axle.z.abs() > 0.2, "{:?} should be steered", wheel.position);
            } else {
                assert!(axle.z.abs() < 1e-6, "{:?} should be straight", wheel.position);
            }
            let hub = transform.transform_point3(Vec3::ZERO);
            assert!((hub - (Vec3::new(5.0, 0.0, -2.0) + wheel.mount)).length() < 1e-5);
        }
    }

    #[test]
    fn test_pose_follows_heading() {
        let visuals = WheelVisuals::new();
        let state = VehicleState {
            heading: FRAC_PI_2,
            ..VehicleState::at_rest(Vec2::ZERO)
        };
        let nose = visuals.pose(&state).body.transform_vector3(Vec3::Z);
        // heading π/2 drives along +X
        assert!((nose - Vec3::X).length() < 1e-5);
        assert_eq!(state.forward(), Vec2::new(FRAC_PI_2.sin(), FRAC_PI_2.cos()));
    }
}
