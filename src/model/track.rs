use glam::{Mat4, Vec2, Vec3};

use crate::model::VehicleParams;
use crate::model::vehicle::clamp_speed;
use crate::utils::{rgb, Mesh};

const GROUND_SIZE: f32 = 200.0;
const TRACK_SEGMENTS: usize = 128;
const KERB_SPACING: usize = 12;

/// Elliptical track centred on the origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackGeometry {
    pub radius_x: f32,
    pub radius_z: f32,
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self { radius_x: 30.0, radius_z: 18.0 }
    }
}

/// Off-track penalty tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryConfig {
    /// Normalised ellipse value above which the car counts as off track
    pub margin: f32,
    /// Deceleration gain per unit of excess radius
    pub gain: f32,
    /// Fixed step the penalty is scaled by, independent of the frame dt
    pub penalty_step: f32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self { margin: 1.1, gain: 200.0, penalty_step: 0.016 }
    }
}

impl TrackGeometry {
    /// Grid spot on the bottom straight, 2 m inside the centre line
    pub fn start_point(&self) -> Vec2 {
        Vec2::new(0.0, self.radius_z - 2.0)
    }

    /// x²/Rx² + z²/Rz²: below 1 inside the ellipse, 1 on it, above 1 outside
    pub fn normalized_radius_sq(&self, position: Vec2) -> f32 {
        (position.x * position.x) / (self.radius_x * self.radius_x)
            + (position.y * position.y) / (self.radius_z * self.radius_z)
    }

    pub fn is_off_track(&self, position: Vec2, cfg: &BoundaryConfig) -> bool {
        self.normalized_radius_sq(position) > cfg.margin
    }

    /// Speed after the soft boundary penalty.
    ///
    /// The penalty opposes the direction of travel and saturates at standstill.
    pub fn apply_boundary(
        &self,
        position: Vec2,
        speed: f32,
        cfg: &BoundaryConfig,
        params: &VehicleParams,
    ) -> f32 {
        let value = self.normalized_radius_sq(position);
        if value <= cfg.margin || speed == 0.0 {
            return speed;
        }
        let penalty = cfg.gain * (value.sqrt() - 1.0) * cfg.penalty_step;
        let slowed = if penalty >= speed.abs() {
            0.0
        } else {
            speed - speed.signum() * penalty
        };
        clamp_speed(slowed, params)
    }

    /// Point on the centre ellipse at parameter `t` (radians), as (x, z)
    pub fn point_at(&self, t: f32) -> Vec2 {
        Vec2::new(self.radius_x * t.cos(), self.radius_z * t.sin())
    }

    pub fn sample_points(&self, segments: usize) -> Vec<Vec2> {
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32 * std::f32::consts::TAU))
            .collect()
    }

    /// Static world geometry: ground, asphalt and kerbs, in world space
    pub fn get_mesh(&self) -> Mesh {
        let mut mesh = Mesh::empty();

        let ground = Mesh::cuboid(GROUND_SIZE, 0.02, GROUND_SIZE, rgb(0x2b8c3e))
            .transformed(Mat4::from_translation(Vec3::new(0.0, -0.01, 0.0)));
        mesh.append(&ground);

        let asphalt = Mesh::ellipse_disc(self.radius_x, self.radius_z, TRACK_SEGMENTS as u32, rgb(0x444444))
            .transformed(Mat4::from_translation(Vec3::new(0.0, 0.01, 0.0)));
        mesh.append(&asphalt);

        let kerb = Mesh::cuboid(2.0, 0.2, 0.6, rgb(0xffcc00));
        for p in self.sample_points(TRACK_SEGMENTS).iter().step_by(KERB_SPACING) {
            let transform = Mat4::from_translation(Vec3::new(p.x, 0.11, p.y))
                * Mat4::from_rotation_y(p.y.atan2(p.x));
            mesh.append(&kerb.transformed(transform));
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_radius() {
        let track = TrackGeometry::default();
        assert_eq!(track.normalized_radius_sq(Vec2::ZERO), 0.0);
        assert!((track.normalized_radius_sq(Vec2::new(30.0, 0.0)) - 1.0).abs() < 1e-6);
        assert!((track.normalized_radius_sq(Vec2::new(0.0, -18.0)) - 1.0).abs() < 1e-6);
        assert!(!track.is_off_track(track.start_point(), &BoundaryConfig::default()));
        assert!(track.is_off_track(Vec2::new(40.0, 0.0), &BoundaryConfig::default()));
    }

    #[test]
    fn test_no_penalty_inside_margin() {
        let track = TrackGeometry::default();
        let params = VehicleParams::default();
        let cfg = BoundaryConfig::default();
        // value 1.05: outside the painted line but within the margin
        let p = Vec2::new(30.0 * 1.05_f32.sqrt(), 0.0);
        assert_eq!(track.apply_boundary(p, 20.0, &cfg, &params), 20.0);
    }

    #[test]
    fn test_penalty_opposes_motion() {
        let track = TrackGeometry::default();
        let params = VehicleParams::default();
        let cfg = BoundaryConfig::default();
        let p = Vec2::new(36.0, 0.0); // sqrt(value) = 1.2
        let expected = 200.0 * 0.2 * 0.016;

        let forward = track.apply_boundary(p, 20.0, &cfg, &params);
        assert!((forward - (20.0 - expected)).abs() < 1e-4);

        let reverse = track.apply_boundary(p, -6.0, &cfg, &params);
        assert!((reverse - (-6.0 + expected)).abs() < 1e-4);
    }

    #[test]
    fn test_penalty_never_reverses_or_moves_parked_car() {
        let track = TrackGeometry::default();
        let params = VehicleParams::default();
        let cfg = BoundaryConfig::default();
        let far = Vec2::new(90.0, 60.0);
        assert_eq!(track.apply_boundary(far, 0.0, &cfg, &params), 0.0);
        assert_eq!(track.apply_boundary(far, 0.3, &cfg, &params), 0.0);
        assert_eq!(track.apply_boundary(far, -0.3, &cfg, &params), 0.0);
    }

    #[test]
    fn test_track_mesh_has_kerbs() {
        let track = TrackGeometry::default();
        let mesh = track.get_mesh();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        let kerbs = track.sample_points(TRACK_SEGMENTS).iter().step_by(KERB_SPACING).count();
        assert_eq!(kerbs, 11);
        let kerb_color = rgb(0xffcc00);
        let kerb_vertices = mesh.vertices.iter().filter(|v| v.color == kerb_color).count();
        assert_eq!(kerb_vertices, kerbs * 24);
        // asphalt: centre plus one rim vertex per segment
        let asphalt = mesh.vertices.iter().filter(|v| v.color == rgb(0x444444)).count();
        assert_eq!(asphalt, TRACK_SEGMENTS + 1);
    }
}
